//! Storage layer for MendozaContas
//!
//! JSON file storage with atomic writes. `Storage` coordinates the
//! repositories and the audit log, and implements the ledger traits.

pub mod businesses;
pub mod cards;
pub mod charges;
pub mod file_io;
pub mod init;
pub mod ledger;
pub mod movements;
pub mod transfers;

pub use businesses::BusinessRepository;
pub use cards::CardRepository;
pub use charges::ChargeRepository;
pub use file_io::{read_json, write_json_atomic};
pub use init::initialize_storage;
pub use ledger::{LedgerReader, LedgerWriter};
pub use movements::MovementRepository;
pub use transfers::TransferRepository;

use crate::audit::{AuditEntry, AuditLogger};
use crate::config::paths::ContasPaths;
use crate::error::ContasResult;
use crate::models::{
    BusinessEntity, BusinessId, CardAccount, CardCharge, CardId, Context, DateRange, Movement,
    MovementId, Transfer, TransferId, UserId,
};

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: ContasPaths,
    pub movements: MovementRepository,
    pub cards: CardRepository,
    pub charges: ChargeRepository,
    pub businesses: BusinessRepository,
    pub transfers: TransferRepository,
    audit: AuditLogger,
}

impl Storage {
    /// Create a new Storage instance, creating directories as needed
    pub fn new(paths: ContasPaths) -> ContasResult<Self> {
        paths.ensure_directories()?;

        Ok(Self {
            movements: MovementRepository::new(paths.movements_file()),
            cards: CardRepository::new(paths.cards_file()),
            charges: ChargeRepository::new(paths.charges_file()),
            businesses: BusinessRepository::new(paths.businesses_file()),
            transfers: TransferRepository::new(paths.transfers_file()),
            audit: AuditLogger::new(paths.audit_log()),
            paths,
        })
    }

    pub fn paths(&self) -> &ContasPaths {
        &self.paths
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// Load all data from disk
    pub fn load_all(&mut self) -> ContasResult<()> {
        self.movements.load()?;
        self.cards.load()?;
        self.charges.load()?;
        self.businesses.load()?;
        self.transfers.load()?;
        Ok(())
    }

    /// Save all data to disk
    pub fn save_all(&self) -> ContasResult<()> {
        self.movements.save()?;
        self.cards.save()?;
        self.charges.save()?;
        self.businesses.save()?;
        self.transfers.save()?;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.paths.is_initialized()
    }
}

impl LedgerReader for Storage {
    fn list_movements(
        &self,
        user_id: UserId,
        context: Option<Context>,
        range: Option<DateRange>,
    ) -> ContasResult<Vec<Movement>> {
        Ok(self
            .movements
            .get_by_user(user_id)?
            .into_iter()
            .filter(|m| context.map_or(true, |c| m.context == c))
            .filter(|m| range.map_or(true, |r| r.contains(m.date)))
            .collect())
    }

    fn get_movement(&self, user_id: UserId, id: MovementId) -> ContasResult<Option<Movement>> {
        Ok(self.movements.get(id)?.filter(|m| m.user_id == user_id))
    }

    fn list_transfer_movements(
        &self,
        user_id: UserId,
        transfer_id: TransferId,
    ) -> ContasResult<Vec<Movement>> {
        Ok(self
            .movements
            .get_by_transfer(transfer_id)?
            .into_iter()
            .filter(|m| m.user_id == user_id)
            .collect())
    }

    fn list_cards(&self, user_id: UserId) -> ContasResult<Vec<CardAccount>> {
        self.cards.get_by_user(user_id)
    }

    fn get_card(&self, user_id: UserId, id: CardId) -> ContasResult<Option<CardAccount>> {
        Ok(self.cards.get(id)?.filter(|c| c.user_id == user_id))
    }

    fn find_card_by_name(&self, user_id: UserId, name: &str) -> ContasResult<Option<CardAccount>> {
        self.cards.get_by_name(user_id, name)
    }

    fn list_card_charges(
        &self,
        card_id: CardId,
        range: Option<DateRange>,
    ) -> ContasResult<Vec<CardCharge>> {
        Ok(self
            .charges
            .get_by_card(card_id)?
            .into_iter()
            .filter(|c| range.map_or(true, |r| r.contains(c.purchase_date)))
            .collect())
    }

    fn count_card_charges(&self, card_id: CardId) -> ContasResult<usize> {
        self.charges.count_by_card(card_id)
    }

    fn list_businesses(&self, user_id: UserId) -> ContasResult<Vec<BusinessEntity>> {
        self.businesses.get_by_user(user_id)
    }

    fn get_business(
        &self,
        user_id: UserId,
        id: BusinessId,
    ) -> ContasResult<Option<BusinessEntity>> {
        Ok(self.businesses.get(id)?.filter(|b| b.user_id == user_id))
    }

    fn find_business_by_name(
        &self,
        user_id: UserId,
        name: &str,
    ) -> ContasResult<Option<BusinessEntity>> {
        self.businesses.get_by_name(user_id, name)
    }

    fn list_transfers(&self, user_id: UserId) -> ContasResult<Vec<Transfer>> {
        self.transfers.get_by_user(user_id)
    }

    fn get_transfer(&self, user_id: UserId, id: TransferId) -> ContasResult<Option<Transfer>> {
        Ok(self.transfers.get(id)?.filter(|t| t.user_id == user_id))
    }
}

impl LedgerWriter for Storage {
    fn insert_movement(&self, movement: Movement) -> ContasResult<()> {
        self.movements.upsert(movement)
    }

    fn remove_movement(&self, id: MovementId) -> ContasResult<Option<Movement>> {
        self.movements.delete(id)
    }

    fn insert_transfer(&self, transfer: Transfer) -> ContasResult<()> {
        self.transfers.upsert(transfer)
    }

    fn remove_transfer(&self, id: TransferId) -> ContasResult<Option<Transfer>> {
        self.transfers.delete(id)
    }

    fn flush(&self) -> ContasResult<()> {
        self.movements.save()?;
        self.transfers.save()
    }

    fn save_card(&self, card: CardAccount) -> ContasResult<()> {
        self.cards.upsert(card)?;
        self.cards.save()
    }

    fn delete_card(&self, id: CardId) -> ContasResult<Option<CardAccount>> {
        let removed = self.cards.delete(id)?;
        self.cards.save()?;
        Ok(removed)
    }

    fn save_card_charge(&self, charge: CardCharge) -> ContasResult<()> {
        self.charges.upsert(charge)?;
        self.charges.save()
    }

    fn save_business(&self, business: BusinessEntity) -> ContasResult<()> {
        self.businesses.upsert(business)?;
        self.businesses.save()
    }

    fn delete_business(&self, id: BusinessId) -> ContasResult<Option<BusinessEntity>> {
        let removed = self.businesses.delete(id)?;
        self.businesses.save()?;
        Ok(removed)
    }

    fn record_audit(&self, entry: &AuditEntry) -> ContasResult<()> {
        self.audit.log(entry)
    }
}
