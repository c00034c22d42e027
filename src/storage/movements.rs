//! Movement repository for JSON storage
//!
//! Manages loading and saving incomes and expenses to movements.json

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::ContasError;
use crate::models::{Movement, MovementId, TransferId, UserId};

use super::file_io::{read_json, write_json_atomic};

/// Serializable movement data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct MovementData {
    movements: Vec<Movement>,
}

/// Newest first: by date, then by creation time
pub(crate) fn sort_newest_first(movements: &mut [Movement]) {
    movements.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
}

/// Repository for movement persistence with a transfer index
pub struct MovementRepository {
    path: PathBuf,
    data: RwLock<HashMap<MovementId, Movement>>,
    /// Index: transfer_id -> movement_ids
    by_transfer: RwLock<HashMap<TransferId, Vec<MovementId>>>,
}

impl MovementRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
            by_transfer: RwLock::new(HashMap::new()),
        }
    }

    /// Load movements from disk and build the transfer index
    pub fn load(&self) -> Result<(), ContasError> {
        let file_data: MovementData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(|e| {
            ContasError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        let mut by_transfer = self.by_transfer.write().map_err(|e| {
            ContasError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        data.clear();
        by_transfer.clear();

        for movement in file_data.movements {
            if let Some(transfer_id) = movement.transfer_id {
                by_transfer.entry(transfer_id).or_default().push(movement.id);
            }
            data.insert(movement.id, movement);
        }

        Ok(())
    }

    /// Save movements to disk
    pub fn save(&self) -> Result<(), ContasError> {
        let data = self.data.read().map_err(|e| {
            ContasError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut movements: Vec<_> = data.values().cloned().collect();
        sort_newest_first(&mut movements);

        write_json_atomic(&self.path, &MovementData { movements })
    }

    pub fn get(&self, id: MovementId) -> Result<Option<Movement>, ContasError> {
        let data = self.data.read().map_err(|e| {
            ContasError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.get(&id).cloned())
    }

    /// Get all movements of a user, newest first
    pub fn get_by_user(&self, user_id: UserId) -> Result<Vec<Movement>, ContasError> {
        let data = self.data.read().map_err(|e| {
            ContasError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut movements: Vec<_> = data
            .values()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect();
        sort_newest_first(&mut movements);
        Ok(movements)
    }

    /// Get both legs of a transfer
    pub fn get_by_transfer(&self, transfer_id: TransferId) -> Result<Vec<Movement>, ContasError> {
        let data = self.data.read().map_err(|e| {
            ContasError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        let by_transfer = self.by_transfer.read().map_err(|e| {
            ContasError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let ids = by_transfer
            .get(&transfer_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[]);
        Ok(ids.iter().filter_map(|id| data.get(id).cloned()).collect())
    }

    /// Insert or update a movement
    pub fn upsert(&self, movement: Movement) -> Result<(), ContasError> {
        let mut data = self.data.write().map_err(|e| {
            ContasError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        let mut by_transfer = self.by_transfer.write().map_err(|e| {
            ContasError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        if let Some(old) = data.get(&movement.id) {
            if let Some(old_transfer) = old.transfer_id {
                if let Some(ids) = by_transfer.get_mut(&old_transfer) {
                    ids.retain(|&id| id != movement.id);
                }
            }
        }

        if let Some(transfer_id) = movement.transfer_id {
            by_transfer.entry(transfer_id).or_default().push(movement.id);
        }

        data.insert(movement.id, movement);
        Ok(())
    }

    /// Delete a movement, returning it if it existed
    pub fn delete(&self, id: MovementId) -> Result<Option<Movement>, ContasError> {
        let mut data = self.data.write().map_err(|e| {
            ContasError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        let mut by_transfer = self.by_transfer.write().map_err(|e| {
            ContasError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        let removed = data.remove(&id);
        if let Some(transfer_id) = removed.as_ref().and_then(|m| m.transfer_id) {
            if let Some(ids) = by_transfer.get_mut(&transfer_id) {
                ids.retain(|&mid| mid != id);
            }
        }
        Ok(removed)
    }

    pub fn count(&self) -> Result<usize, ContasError> {
        let data = self.data.read().map_err(|e| {
            ContasError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.len())
    }
}
