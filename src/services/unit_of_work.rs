//! Compensating unit of work over a `LedgerWriter`
//!
//! Staged writes change in-memory state right away and push an undo action.
//! `commit` persists everything with a single flush and then appends the
//! audit entries. A failed step, a failed flush, or dropping the unit
//! without committing replays the undo actions in reverse order.

use crate::audit::{AuditEntry, EntityType};
use crate::error::{ContasError, ContasResult};
use crate::models::{Movement, MovementId, Transfer, TransferId};
use crate::storage::LedgerWriter;

enum Undo {
    RemoveMovement(MovementId),
    RestoreMovement(Box<Movement>),
    RemoveTransfer(TransferId),
    RestoreTransfer(Transfer),
}

/// Append an audit entry for a write that is already durable
///
/// A lost audit line is logged and otherwise ignored.
pub(crate) fn record_audit<W: LedgerWriter + ?Sized>(writer: &W, entry: &AuditEntry) {
    if let Err(err) = writer.record_audit(entry) {
        tracing::warn!(error = %err, entity = %entry.entity_id, "failed to write audit entry");
    }
}

pub struct UnitOfWork<'a, W: LedgerWriter + ?Sized> {
    writer: &'a W,
    undo: Vec<Undo>,
    audit: Vec<AuditEntry>,
    finished: bool,
}

impl<'a, W: LedgerWriter + ?Sized> UnitOfWork<'a, W> {
    pub fn begin(writer: &'a W) -> Self {
        Self {
            writer,
            undo: Vec::new(),
            audit: Vec::new(),
            finished: false,
        }
    }

    /// Stage a new movement
    pub fn insert_movement(&mut self, movement: &Movement) -> ContasResult<()> {
        self.writer.insert_movement(movement.clone())?;
        self.undo.push(Undo::RemoveMovement(movement.id));
        self.audit.push(AuditEntry::create(
            EntityType::Movement,
            movement.id.to_string(),
            Some(movement.description.clone()),
            movement,
        ));
        Ok(())
    }

    /// Stage an in-place edit of an existing movement
    pub fn replace_movement(&mut self, before: &Movement, after: &Movement) -> ContasResult<()> {
        self.writer.insert_movement(after.clone())?;
        self.undo
            .push(Undo::RestoreMovement(Box::new(before.clone())));
        self.audit.push(AuditEntry::update(
            EntityType::Movement,
            after.id.to_string(),
            Some(after.description.clone()),
            before,
            after,
        ));
        Ok(())
    }

    /// Stage the removal of a movement
    pub fn remove_movement(&mut self, id: MovementId) -> ContasResult<Movement> {
        let removed = self
            .writer
            .remove_movement(id)?
            .ok_or_else(|| ContasError::movement_not_found(id.to_string()))?;
        self.audit.push(AuditEntry::delete(
            EntityType::Movement,
            id.to_string(),
            Some(removed.description.clone()),
            &removed,
        ));
        self.undo
            .push(Undo::RestoreMovement(Box::new(removed.clone())));
        Ok(removed)
    }

    pub fn insert_transfer(&mut self, transfer: &Transfer) -> ContasResult<()> {
        self.writer.insert_transfer(transfer.clone())?;
        self.undo.push(Undo::RemoveTransfer(transfer.id));
        self.audit.push(AuditEntry::create(
            EntityType::Transfer,
            transfer.id.to_string(),
            None,
            transfer,
        ));
        Ok(())
    }

    pub fn remove_transfer(&mut self, id: TransferId) -> ContasResult<Transfer> {
        let removed = self
            .writer
            .remove_transfer(id)?
            .ok_or_else(|| ContasError::transfer_not_found(id.to_string()))?;
        self.audit.push(AuditEntry::delete(
            EntityType::Transfer,
            id.to_string(),
            None,
            &removed,
        ));
        self.undo.push(Undo::RestoreTransfer(removed.clone()));
        Ok(removed)
    }

    /// Persist all staged writes, then record their audit entries
    ///
    /// If the flush fails the in-memory state is rolled back and flushed
    /// again so disk and memory agree on the pre-unit state.
    pub fn commit(mut self) -> ContasResult<()> {
        self.finished = true;

        if let Err(err) = self.writer.flush() {
            tracing::warn!(error = %err, "flush failed, rolling back unit of work");
            self.rollback();
            if let Err(restore_err) = self.writer.flush() {
                tracing::warn!(
                    error = %restore_err,
                    "could not restore ledger files after rollback"
                );
            }
            return Err(err);
        }

        for entry in &self.audit {
            record_audit(self.writer, entry);
        }

        Ok(())
    }

    fn rollback(&mut self) {
        while let Some(action) = self.undo.pop() {
            let result = match action {
                Undo::RemoveMovement(id) => self.writer.remove_movement(id).map(|_| ()),
                Undo::RestoreMovement(movement) => self.writer.insert_movement(*movement),
                Undo::RemoveTransfer(id) => self.writer.remove_transfer(id).map(|_| ()),
                Undo::RestoreTransfer(transfer) => self.writer.insert_transfer(transfer),
            };
            if let Err(err) = result {
                tracing::warn!(error = %err, "undo step failed during rollback");
            }
        }
        self.audit.clear();
    }
}

impl<'a, W: LedgerWriter + ?Sized> Drop for UnitOfWork<'a, W> {
    fn drop(&mut self) {
        if !self.finished && !self.undo.is_empty() {
            tracing::debug!(steps = self.undo.len(), "unit of work abandoned, rolling back");
            self.rollback();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::ContasPaths;
    use crate::models::{Context, Money, UserId};
    use crate::storage::{LedgerReader, Storage};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = ContasPaths::with_base_dir(temp_dir.path().to_path_buf());
        let mut storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    fn lunch(user: UserId) -> Movement {
        Movement::expense(
            user,
            Money::from_cents(1500),
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            Context::Personal,
            "Lunch",
        )
    }

    #[test]
    fn test_commit_persists_and_audits() {
        let (_temp, storage) = create_test_storage();
        let user = UserId::new();

        let mut uow = UnitOfWork::begin(&storage);
        uow.insert_movement(&lunch(user)).unwrap();
        uow.commit().unwrap();

        assert_eq!(storage.list_movements(user, None, None).unwrap().len(), 1);
        assert_eq!(storage.audit().read_all().unwrap().len(), 1);
    }

    #[test]
    fn test_drop_without_commit_rolls_back() {
        let (_temp, storage) = create_test_storage();
        let user = UserId::new();
        let existing = lunch(user);
        storage.insert_movement(existing.clone()).unwrap();

        {
            let mut uow = UnitOfWork::begin(&storage);
            uow.insert_movement(&lunch(user)).unwrap();
            let mut edited = existing.clone();
            edited.amount = Money::from_cents(9999);
            uow.replace_movement(&existing, &edited).unwrap();
        }

        let movements = storage.list_movements(user, None, None).unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].amount.cents(), 1500);
        assert!(storage.audit().read_all().unwrap().is_empty());
    }

    #[test]
    fn test_remove_missing_is_not_found() {
        let (_temp, storage) = create_test_storage();
        let mut uow = UnitOfWork::begin(&storage);
        let err = uow.remove_movement(MovementId::new()).unwrap_err();
        assert!(err.is_not_found());
    }
}
