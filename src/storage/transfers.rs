//! Transfer repository for JSON storage
//!
//! Manages loading and saving transfers to transfers.json

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::ContasError;
use crate::models::{Transfer, TransferId, UserId};

use super::file_io::{read_json, write_json_atomic};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct TransferData {
    transfers: Vec<Transfer>,
}

fn sort_newest_first(transfers: &mut [Transfer]) {
    transfers.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
}

/// Repository for transfer persistence
pub struct TransferRepository {
    path: PathBuf,
    data: RwLock<HashMap<TransferId, Transfer>>,
}

impl TransferRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    pub fn load(&self) -> Result<(), ContasError> {
        let file_data: TransferData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(|e| {
            ContasError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        data.clear();
        for transfer in file_data.transfers {
            data.insert(transfer.id, transfer);
        }

        Ok(())
    }

    pub fn save(&self) -> Result<(), ContasError> {
        let data = self.data.read().map_err(|e| {
            ContasError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut transfers: Vec<_> = data.values().cloned().collect();
        sort_newest_first(&mut transfers);

        write_json_atomic(&self.path, &TransferData { transfers })
    }

    pub fn get(&self, id: TransferId) -> Result<Option<Transfer>, ContasError> {
        let data = self.data.read().map_err(|e| {
            ContasError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.get(&id).cloned())
    }

    /// Get all transfers of a user, newest first
    pub fn get_by_user(&self, user_id: UserId) -> Result<Vec<Transfer>, ContasError> {
        let data = self.data.read().map_err(|e| {
            ContasError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut transfers: Vec<_> = data
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        sort_newest_first(&mut transfers);
        Ok(transfers)
    }

    pub fn upsert(&self, transfer: Transfer) -> Result<(), ContasError> {
        let mut data = self.data.write().map_err(|e| {
            ContasError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        data.insert(transfer.id, transfer);
        Ok(())
    }

    pub fn delete(&self, id: TransferId) -> Result<Option<Transfer>, ContasError> {
        let mut data = self.data.write().map_err(|e| {
            ContasError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        Ok(data.remove(&id))
    }

    pub fn count(&self) -> Result<usize, ContasError> {
        let data = self.data.read().map_err(|e| {
            ContasError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.len())
    }
}
