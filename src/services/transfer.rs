//! Transfer service
//!
//! Moves money from a business context into Personal. A transfer is stored
//! as three records (the transfer itself, an expense in the business, and
//! an income in Personal) written through one unit of work, so either all
//! three exist or none do.

use chrono::NaiveDate;

use crate::error::{ContasError, ContasResult};
use crate::models::transfer::TRANSFER_LIST_LIMIT;
use crate::models::{
    Context, IncomeType, Money, Movement, PaymentMethod, Transfer, TransferId, UserId,
    TRANSFER_CATEGORY,
};
use crate::storage::{LedgerReader, LedgerWriter};

use super::unit_of_work::UnitOfWork;

/// Service for transfers between contexts
pub struct TransferService<'a, S: LedgerReader + LedgerWriter> {
    ledger: &'a S,
}

/// Records created by a transfer
#[derive(Debug, Clone)]
pub struct TransferResult {
    pub transfer: Transfer,
    /// Outflow in the source business
    pub expense: Movement,
    /// Inflow in Personal
    pub income: Movement,
}

impl<'a, S: LedgerReader + LedgerWriter> TransferService<'a, S> {
    pub fn new(ledger: &'a S) -> Self {
        Self { ledger }
    }

    /// Transfer `amount` from a business into Personal
    ///
    /// Fails with `InvalidTransfer` before writing anything when the amount
    /// is not positive or the source is not one of the user's businesses.
    pub fn execute_transfer(
        &self,
        user_id: UserId,
        amount: Money,
        date: NaiveDate,
        source: Context,
    ) -> ContasResult<TransferResult> {
        if !amount.is_positive() {
            return Err(ContasError::InvalidTransfer(
                "Transfer amount must be positive".into(),
            ));
        }

        let business_id = source.business_id().ok_or_else(|| {
            ContasError::InvalidTransfer("Transfers must come from a business context".into())
        })?;

        let business = self
            .ledger
            .get_business(user_id, business_id)?
            .ok_or_else(|| {
                ContasError::InvalidTransfer(format!("Business {} does not exist", business_id))
            })?;

        let transfer = Transfer::new(user_id, amount, date, source);

        let mut expense = Movement::expense(
            user_id,
            amount,
            date,
            source,
            format!("Transfer to personal ({})", date),
        );
        expense.category = TRANSFER_CATEGORY.to_string();
        expense.payment_method = Some(PaymentMethod::Pix);
        expense.transfer_id = Some(transfer.id);

        let mut income = Movement::income(
            user_id,
            amount,
            date,
            Context::Personal,
            format!("Transfer from {} ({})", business.name, date),
        );
        income.income_type = Some(IncomeType::Transfer);
        income.transfer_id = Some(transfer.id);

        let mut uow = UnitOfWork::begin(self.ledger);
        uow.insert_transfer(&transfer)?;
        uow.insert_movement(&expense)?;
        uow.insert_movement(&income)?;
        uow.commit()?;

        tracing::info!(
            transfer = %transfer.id,
            business = %business.name,
            amount = %amount,
            "transfer recorded"
        );

        Ok(TransferResult {
            transfer,
            expense,
            income,
        })
    }

    /// Most recent transfers first, at most 50
    pub fn list_transfers(&self, user_id: UserId) -> ContasResult<Vec<Transfer>> {
        let mut transfers = self.ledger.list_transfers(user_id)?;
        transfers.truncate(TRANSFER_LIST_LIMIT);
        Ok(transfers)
    }

    /// Find a transfer by full or short id
    pub fn find(&self, user_id: UserId, identifier: &str) -> ContasResult<Option<Transfer>> {
        Ok(self
            .ledger
            .list_transfers(user_id)?
            .into_iter()
            .find(|t| t.id.matches(identifier)))
    }

    /// Remove a transfer together with both of its movements
    pub fn delete_transfer(
        &self,
        user_id: UserId,
        transfer_id: TransferId,
    ) -> ContasResult<Transfer> {
        self.ledger
            .get_transfer(user_id, transfer_id)?
            .ok_or_else(|| ContasError::transfer_not_found(transfer_id.to_string()))?;

        let legs = self.ledger.list_transfer_movements(user_id, transfer_id)?;

        let mut uow = UnitOfWork::begin(self.ledger);
        for leg in &legs {
            uow.remove_movement(leg.id)?;
        }
        let removed = uow.remove_transfer(transfer_id)?;
        uow.commit()?;

        tracing::info!(transfer = %transfer_id, legs = legs.len(), "transfer deleted");

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditEntry;
    use crate::config::paths::ContasPaths;
    use crate::models::{
        BusinessEntity, BusinessId, CardAccount, CardCharge, CardId, DateRange, MovementId,
        MovementKind,
    };
    use crate::storage::Storage;
    use std::cell::Cell;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = ContasPaths::with_base_dir(temp_dir.path().to_path_buf());
        let mut storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    fn add_business(storage: &Storage, user: UserId, name: &str) -> BusinessEntity {
        let business = BusinessEntity::new(user, name, 0);
        storage.businesses.upsert(business.clone()).unwrap();
        business
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Delegates to `Storage` but fails the n-th staged write or the flush
    struct FailingStore<'a> {
        inner: &'a Storage,
        writes: Cell<usize>,
        fail_on_write: Option<usize>,
        fail_flush: bool,
    }

    impl<'a> FailingStore<'a> {
        fn failing_write(inner: &'a Storage, n: usize) -> Self {
            Self {
                inner,
                writes: Cell::new(0),
                fail_on_write: Some(n),
                fail_flush: false,
            }
        }

        fn failing_flush(inner: &'a Storage) -> Self {
            Self {
                inner,
                writes: Cell::new(0),
                fail_on_write: None,
                fail_flush: true,
            }
        }

        fn count_write(&self) -> ContasResult<()> {
            let n = self.writes.get() + 1;
            self.writes.set(n);
            if self.fail_on_write == Some(n) {
                return Err(ContasError::Storage(format!("simulated failure on write {}", n)));
            }
            Ok(())
        }
    }

    impl LedgerReader for FailingStore<'_> {
        fn list_movements(
            &self,
            user_id: UserId,
            context: Option<Context>,
            range: Option<DateRange>,
        ) -> ContasResult<Vec<Movement>> {
            self.inner.list_movements(user_id, context, range)
        }
        fn get_movement(&self, user_id: UserId, id: MovementId) -> ContasResult<Option<Movement>> {
            self.inner.get_movement(user_id, id)
        }
        fn list_transfer_movements(
            &self,
            user_id: UserId,
            transfer_id: TransferId,
        ) -> ContasResult<Vec<Movement>> {
            self.inner.list_transfer_movements(user_id, transfer_id)
        }
        fn list_cards(&self, user_id: UserId) -> ContasResult<Vec<CardAccount>> {
            self.inner.list_cards(user_id)
        }
        fn get_card(&self, user_id: UserId, id: CardId) -> ContasResult<Option<CardAccount>> {
            self.inner.get_card(user_id, id)
        }
        fn list_card_charges(
            &self,
            card_id: CardId,
            range: Option<DateRange>,
        ) -> ContasResult<Vec<CardCharge>> {
            self.inner.list_card_charges(card_id, range)
        }
        fn list_businesses(&self, user_id: UserId) -> ContasResult<Vec<BusinessEntity>> {
            self.inner.list_businesses(user_id)
        }
        fn get_business(
            &self,
            user_id: UserId,
            id: BusinessId,
        ) -> ContasResult<Option<BusinessEntity>> {
            self.inner.get_business(user_id, id)
        }
        fn list_transfers(&self, user_id: UserId) -> ContasResult<Vec<Transfer>> {
            self.inner.list_transfers(user_id)
        }
        fn get_transfer(&self, user_id: UserId, id: TransferId) -> ContasResult<Option<Transfer>> {
            self.inner.get_transfer(user_id, id)
        }
    }

    impl LedgerWriter for FailingStore<'_> {
        fn insert_movement(&self, movement: Movement) -> ContasResult<()> {
            self.count_write()?;
            self.inner.insert_movement(movement)
        }
        fn remove_movement(&self, id: MovementId) -> ContasResult<Option<Movement>> {
            self.count_write()?;
            self.inner.remove_movement(id)
        }
        fn insert_transfer(&self, transfer: Transfer) -> ContasResult<()> {
            self.count_write()?;
            self.inner.insert_transfer(transfer)
        }
        fn remove_transfer(&self, id: TransferId) -> ContasResult<Option<Transfer>> {
            self.count_write()?;
            self.inner.remove_transfer(id)
        }
        fn flush(&self) -> ContasResult<()> {
            if self.fail_flush {
                return Err(ContasError::Storage("simulated flush failure".into()));
            }
            self.inner.flush()
        }
        fn save_card(&self, card: CardAccount) -> ContasResult<()> {
            self.inner.save_card(card)
        }
        fn delete_card(&self, id: CardId) -> ContasResult<Option<CardAccount>> {
            self.inner.delete_card(id)
        }
        fn save_card_charge(&self, charge: CardCharge) -> ContasResult<()> {
            self.inner.save_card_charge(charge)
        }
        fn save_business(&self, business: BusinessEntity) -> ContasResult<()> {
            self.inner.save_business(business)
        }
        fn delete_business(&self, id: BusinessId) -> ContasResult<Option<BusinessEntity>> {
            self.inner.delete_business(id)
        }
        fn record_audit(&self, entry: &AuditEntry) -> ContasResult<()> {
            self.inner.record_audit(entry)
        }
    }

    #[test]
    fn test_transfer_creates_paired_records() {
        let (_temp, storage) = create_test_storage();
        let user = UserId::new();
        let arcade = add_business(&storage, user, "Arcade");
        let service = TransferService::new(&storage);

        let result = service
            .execute_transfer(user, Money::from_cents(50000), date(2025, 1, 10), arcade.context())
            .unwrap();

        assert_eq!(result.expense.context, arcade.context());
        assert_eq!(result.expense.kind, MovementKind::Expense);
        assert_eq!(result.expense.category, TRANSFER_CATEGORY);
        assert_eq!(result.expense.payment_method, Some(PaymentMethod::Pix));
        assert_eq!(result.expense.description, "Transfer to personal (2025-01-10)");

        assert_eq!(result.income.context, Context::Personal);
        assert_eq!(result.income.income_type, Some(IncomeType::Transfer));
        assert_eq!(result.income.description, "Transfer from Arcade (2025-01-10)");

        assert_eq!(result.expense.amount, result.income.amount);
        assert_eq!(result.expense.transfer_id, Some(result.transfer.id));
        assert_eq!(result.income.transfer_id, Some(result.transfer.id));

        assert_eq!(storage.list_movements(user, None, None).unwrap().len(), 2);
        assert_eq!(storage.audit().read_all().unwrap().len(), 3);
    }

    #[test]
    fn test_rejects_non_positive_amount() {
        let (_temp, storage) = create_test_storage();
        let user = UserId::new();
        let arcade = add_business(&storage, user, "Arcade");
        let service = TransferService::new(&storage);

        let err = service
            .execute_transfer(user, Money::zero(), date(2025, 1, 10), arcade.context())
            .unwrap_err();
        assert!(matches!(err, ContasError::InvalidTransfer(_)));
        assert!(storage.list_transfers(user).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_personal_and_unknown_sources() {
        let (_temp, storage) = create_test_storage();
        let user = UserId::new();
        let service = TransferService::new(&storage);
        let amount = Money::from_cents(100);

        let err = service
            .execute_transfer(user, amount, date(2025, 1, 10), Context::Personal)
            .unwrap_err();
        assert!(matches!(err, ContasError::InvalidTransfer(_)));

        let err = service
            .execute_transfer(
                user,
                amount,
                date(2025, 1, 10),
                Context::Business(BusinessId::new()),
            )
            .unwrap_err();
        assert!(matches!(err, ContasError::InvalidTransfer(_)));

        // Another user's business is not a valid source
        let foreign = add_business(&storage, UserId::new(), "Foreign");
        let err = service
            .execute_transfer(user, amount, date(2025, 1, 10), foreign.context())
            .unwrap_err();
        assert!(matches!(err, ContasError::InvalidTransfer(_)));
    }

    #[test]
    fn test_failure_on_third_write_leaves_nothing() {
        let (_temp, storage) = create_test_storage();
        let user = UserId::new();
        let arcade = add_business(&storage, user, "Arcade");

        let failing = FailingStore::failing_write(&storage, 3);
        let service = TransferService::new(&failing);

        let result = service.execute_transfer(
            user,
            Money::from_cents(50000),
            date(2025, 1, 10),
            arcade.context(),
        );

        assert!(result.is_err());
        assert!(storage.list_movements(user, None, None).unwrap().is_empty());
        assert!(storage.list_transfers(user).unwrap().is_empty());
        assert!(storage.audit().read_all().unwrap().is_empty());
    }

    #[test]
    fn test_flush_failure_rolls_back_memory() {
        let (_temp, storage) = create_test_storage();
        let user = UserId::new();
        let arcade = add_business(&storage, user, "Arcade");

        let failing = FailingStore::failing_flush(&storage);
        let service = TransferService::new(&failing);

        let result = service.execute_transfer(
            user,
            Money::from_cents(50000),
            date(2025, 1, 10),
            arcade.context(),
        );

        assert!(matches!(result, Err(ContasError::Storage(_))));
        assert!(storage.list_movements(user, None, None).unwrap().is_empty());
        assert!(storage.list_transfers(user).unwrap().is_empty());
    }

    #[test]
    fn test_delete_transfer_removes_both_legs() {
        let (_temp, storage) = create_test_storage();
        let user = UserId::new();
        let arcade = add_business(&storage, user, "Arcade");
        let service = TransferService::new(&storage);

        let result = service
            .execute_transfer(user, Money::from_cents(50000), date(2025, 1, 10), arcade.context())
            .unwrap();
        service.delete_transfer(user, result.transfer.id).unwrap();

        assert!(storage.list_movements(user, None, None).unwrap().is_empty());
        assert!(storage.list_transfers(user).unwrap().is_empty());

        let err = service.delete_transfer(user, result.transfer.id).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_failed_delete_keeps_transfer_intact() {
        let (_temp, storage) = create_test_storage();
        let user = UserId::new();
        let arcade = add_business(&storage, user, "Arcade");

        let result = TransferService::new(&storage)
            .execute_transfer(user, Money::from_cents(50000), date(2025, 1, 10), arcade.context())
            .unwrap();

        let failing = FailingStore::failing_write(&storage, 3);
        assert!(TransferService::new(&failing)
            .delete_transfer(user, result.transfer.id)
            .is_err());

        assert_eq!(storage.list_movements(user, None, None).unwrap().len(), 2);
        assert_eq!(storage.list_transfers(user).unwrap().len(), 1);
    }

    #[test]
    fn test_list_is_capped() {
        let (_temp, storage) = create_test_storage();
        let user = UserId::new();
        let arcade = add_business(&storage, user, "Arcade");
        let service = TransferService::new(&storage);

        for day in 0..55 {
            let when = date(2024, 1, 1) + chrono::Duration::days(day);
            service
                .execute_transfer(user, Money::from_cents(100), when, arcade.context())
                .unwrap();
        }

        let listed = service.list_transfers(user).unwrap();
        assert_eq!(listed.len(), TRANSFER_LIST_LIMIT);
        assert_eq!(listed[0].date, date(2024, 1, 1) + chrono::Duration::days(54));
    }
}
