//! Ledger access traits
//!
//! The services, the engine and the assistant only see storage through
//! these two traits. `Storage` implements both over the JSON
//! repositories; tests wrap it to inject failures.

use crate::audit::AuditEntry;
use crate::error::{ContasError, ContasResult};
use crate::models::{
    BusinessEntity, BusinessId, CardAccount, CardCharge, CardId, Context, DateRange, Money,
    Movement, MovementId, MovementKind, Transfer, TransferId, UserId,
};

/// Read side of the ledger
pub trait LedgerReader {
    /// Movements of a user, newest first, optionally narrowed to a context
    /// and an inclusive date range
    fn list_movements(
        &self,
        user_id: UserId,
        context: Option<Context>,
        range: Option<DateRange>,
    ) -> ContasResult<Vec<Movement>>;

    fn get_movement(&self, user_id: UserId, id: MovementId) -> ContasResult<Option<Movement>>;

    /// Both legs of a transfer
    fn list_transfer_movements(
        &self,
        user_id: UserId,
        transfer_id: TransferId,
    ) -> ContasResult<Vec<Movement>>;

    fn list_cards(&self, user_id: UserId) -> ContasResult<Vec<CardAccount>>;

    fn get_card(&self, user_id: UserId, id: CardId) -> ContasResult<Option<CardAccount>>;

    /// Card of a user by name, ignoring case and surrounding whitespace
    fn find_card_by_name(&self, user_id: UserId, name: &str) -> ContasResult<Option<CardAccount>> {
        let name = name.trim().to_lowercase();
        Ok(self
            .list_cards(user_id)?
            .into_iter()
            .find(|c| c.name.to_lowercase() == name))
    }

    /// Charges on a card, newest first, optionally narrowed to a purchase
    /// date range
    fn list_card_charges(
        &self,
        card_id: CardId,
        range: Option<DateRange>,
    ) -> ContasResult<Vec<CardCharge>>;

    fn count_card_charges(&self, card_id: CardId) -> ContasResult<usize> {
        Ok(self.list_card_charges(card_id, None)?.len())
    }

    fn list_businesses(&self, user_id: UserId) -> ContasResult<Vec<BusinessEntity>>;

    fn get_business(&self, user_id: UserId, id: BusinessId)
        -> ContasResult<Option<BusinessEntity>>;

    /// Business of a user by name, ignoring case and surrounding whitespace
    fn find_business_by_name(
        &self,
        user_id: UserId,
        name: &str,
    ) -> ContasResult<Option<BusinessEntity>> {
        let name = name.trim().to_lowercase();
        Ok(self
            .list_businesses(user_id)?
            .into_iter()
            .find(|b| b.name.to_lowercase() == name))
    }

    /// Transfers of a user, newest first
    fn list_transfers(&self, user_id: UserId) -> ContasResult<Vec<Transfer>>;

    fn get_transfer(&self, user_id: UserId, id: TransferId) -> ContasResult<Option<Transfer>>;

    /// Total of one kind of movement in a context over an inclusive range
    ///
    /// Fails with `AmountOverflow` when the total leaves the money range.
    fn sum_movements(
        &self,
        user_id: UserId,
        context: Context,
        kind: MovementKind,
        range: DateRange,
    ) -> ContasResult<Money> {
        let movements = self.list_movements(user_id, Some(context), Some(range))?;
        Money::checked_sum(
            movements
                .into_iter()
                .filter(|m| m.kind == kind)
                .map(|m| m.amount),
        )
        .ok_or_else(|| ContasError::amount_overflow(format!("{} total for {}", kind, context)))
    }
}

/// Write side of the ledger
///
/// Movement and transfer inserts and removals change in-memory state only;
/// `flush` persists them. Card, charge and business writes are saved to
/// disk before they return.
pub trait LedgerWriter {
    /// Insert a movement, replacing any movement with the same id
    fn insert_movement(&self, movement: Movement) -> ContasResult<()>;

    fn remove_movement(&self, id: MovementId) -> ContasResult<Option<Movement>>;

    fn insert_transfer(&self, transfer: Transfer) -> ContasResult<()>;

    fn remove_transfer(&self, id: TransferId) -> ContasResult<Option<Transfer>>;

    /// Persist movements and transfers
    fn flush(&self) -> ContasResult<()>;

    /// Insert or replace a card and save the card file
    fn save_card(&self, card: CardAccount) -> ContasResult<()>;

    fn delete_card(&self, id: CardId) -> ContasResult<Option<CardAccount>>;

    fn save_card_charge(&self, charge: CardCharge) -> ContasResult<()>;

    /// Insert or replace a business and save the business file
    fn save_business(&self, business: BusinessEntity) -> ContasResult<()>;

    fn delete_business(&self, id: BusinessId) -> ContasResult<Option<BusinessEntity>>;

    fn record_audit(&self, entry: &AuditEntry) -> ContasResult<()>;
}
