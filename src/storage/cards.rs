//! Card repository for JSON storage
//!
//! Manages loading and saving card accounts to cards.json

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::ContasError;
use crate::models::{CardAccount, CardId, UserId};

use super::file_io::{read_json, write_json_atomic};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct CardData {
    cards: Vec<CardAccount>,
}

/// Repository for card persistence
pub struct CardRepository {
    path: PathBuf,
    data: RwLock<HashMap<CardId, CardAccount>>,
}

impl CardRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Load cards from disk
    pub fn load(&self) -> Result<(), ContasError> {
        let file_data: CardData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(|e| {
            ContasError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        data.clear();
        for card in file_data.cards {
            data.insert(card.id, card);
        }

        Ok(())
    }

    /// Save cards to disk
    pub fn save(&self) -> Result<(), ContasError> {
        let data = self.data.read().map_err(|e| {
            ContasError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut cards: Vec<_> = data.values().cloned().collect();
        cards.sort_by(|a, b| a.name.cmp(&b.name));

        write_json_atomic(&self.path, &CardData { cards })
    }

    pub fn get(&self, id: CardId) -> Result<Option<CardAccount>, ContasError> {
        let data = self.data.read().map_err(|e| {
            ContasError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.get(&id).cloned())
    }

    /// Get all cards of a user, ordered by name
    pub fn get_by_user(&self, user_id: UserId) -> Result<Vec<CardAccount>, ContasError> {
        let data = self.data.read().map_err(|e| {
            ContasError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut cards: Vec<_> = data
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        cards.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(cards)
    }

    /// Get a card by name (case-insensitive)
    pub fn get_by_name(
        &self,
        user_id: UserId,
        name: &str,
    ) -> Result<Option<CardAccount>, ContasError> {
        let data = self.data.read().map_err(|e| {
            ContasError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let name_lower = name.trim().to_lowercase();
        Ok(data
            .values()
            .find(|c| c.user_id == user_id && c.name.to_lowercase() == name_lower)
            .cloned())
    }

    pub fn upsert(&self, card: CardAccount) -> Result<(), ContasError> {
        let mut data = self.data.write().map_err(|e| {
            ContasError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        data.insert(card.id, card);
        Ok(())
    }

    pub fn delete(&self, id: CardId) -> Result<Option<CardAccount>, ContasError> {
        let mut data = self.data.write().map_err(|e| {
            ContasError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        Ok(data.remove(&id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Context;
    use tempfile::TempDir;

    #[test]
    fn test_get_by_name_case_insensitive() {
        let temp_dir = TempDir::new().unwrap();
        let repo = CardRepository::new(temp_dir.path().join("cards.json"));
        let user = UserId::new();

        repo.upsert(CardAccount::new(user, "Nubank", 10, 17, Context::Personal))
            .unwrap();

        assert!(repo.get_by_name(user, "NUBANK").unwrap().is_some());
        assert!(repo.get_by_name(UserId::new(), "Nubank").unwrap().is_none());
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cards.json");
        let repo = CardRepository::new(path.clone());
        let user = UserId::new();

        let card = CardAccount::new(user, "Inter", 5, 12, Context::Personal);
        let id = card.id;
        repo.upsert(card).unwrap();
        repo.save().unwrap();

        let repo2 = CardRepository::new(path);
        repo2.load().unwrap();
        assert_eq!(repo2.get(id).unwrap().unwrap().closing_day, 5);
    }
}
