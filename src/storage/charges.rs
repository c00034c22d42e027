//! Card charge repository for JSON storage
//!
//! Manages loading and saving card charges to charges.json. Charges are
//! indexed by card; the index survives the card's deletion.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::ContasError;
use crate::models::{CardCharge, CardId, ChargeId};

use super::file_io::{read_json, write_json_atomic};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct ChargeData {
    charges: Vec<CardCharge>,
}

/// Repository for card charge persistence
pub struct ChargeRepository {
    path: PathBuf,
    data: RwLock<HashMap<ChargeId, CardCharge>>,
    /// Index: card_id -> charge_ids
    by_card: RwLock<HashMap<CardId, Vec<ChargeId>>>,
}

impl ChargeRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
            by_card: RwLock::new(HashMap::new()),
        }
    }

    pub fn load(&self) -> Result<(), ContasError> {
        let file_data: ChargeData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(|e| {
            ContasError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        let mut by_card = self.by_card.write().map_err(|e| {
            ContasError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        data.clear();
        by_card.clear();

        for charge in file_data.charges {
            by_card.entry(charge.card_id).or_default().push(charge.id);
            data.insert(charge.id, charge);
        }

        Ok(())
    }

    pub fn save(&self) -> Result<(), ContasError> {
        let data = self.data.read().map_err(|e| {
            ContasError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut charges: Vec<_> = data.values().cloned().collect();
        charges.sort_by(|a, b| {
            b.purchase_date
                .cmp(&a.purchase_date)
                .then(b.created_at.cmp(&a.created_at))
        });

        write_json_atomic(&self.path, &ChargeData { charges })
    }

    /// Get the charges of a card, newest first
    pub fn get_by_card(&self, card_id: CardId) -> Result<Vec<CardCharge>, ContasError> {
        let data = self.data.read().map_err(|e| {
            ContasError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        let by_card = self.by_card.read().map_err(|e| {
            ContasError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let ids = by_card.get(&card_id).map(|v| v.as_slice()).unwrap_or(&[]);
        let mut charges: Vec<_> = ids.iter().filter_map(|id| data.get(id).cloned()).collect();
        charges.sort_by(|a, b| {
            b.purchase_date
                .cmp(&a.purchase_date)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(charges)
    }

    pub fn count_by_card(&self, card_id: CardId) -> Result<usize, ContasError> {
        let by_card = self.by_card.read().map_err(|e| {
            ContasError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(by_card.get(&card_id).map(|v| v.len()).unwrap_or(0))
    }

    pub fn upsert(&self, charge: CardCharge) -> Result<(), ContasError> {
        let mut data = self.data.write().map_err(|e| {
            ContasError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        let mut by_card = self.by_card.write().map_err(|e| {
            ContasError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        if !data.contains_key(&charge.id) {
            by_card.entry(charge.card_id).or_default().push(charge.id);
        }
        data.insert(charge.id, charge);
        Ok(())
    }
}
