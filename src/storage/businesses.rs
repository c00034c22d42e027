//! Business entity repository for JSON storage
//!
//! Manages loading and saving business entities to businesses.json

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::ContasError;
use crate::models::{BusinessEntity, BusinessId, UserId};

use super::file_io::{read_json, write_json_atomic};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct BusinessData {
    businesses: Vec<BusinessEntity>,
}

fn sort_for_display(businesses: &mut [BusinessEntity]) {
    businesses.sort_by(|a, b| a.order.cmp(&b.order).then(a.name.cmp(&b.name)));
}

/// Repository for business entity persistence
pub struct BusinessRepository {
    path: PathBuf,
    data: RwLock<HashMap<BusinessId, BusinessEntity>>,
}

impl BusinessRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    pub fn load(&self) -> Result<(), ContasError> {
        let file_data: BusinessData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(|e| {
            ContasError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        data.clear();
        for business in file_data.businesses {
            data.insert(business.id, business);
        }

        Ok(())
    }

    pub fn save(&self) -> Result<(), ContasError> {
        let data = self.data.read().map_err(|e| {
            ContasError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut businesses: Vec<_> = data.values().cloned().collect();
        sort_for_display(&mut businesses);

        write_json_atomic(&self.path, &BusinessData { businesses })
    }

    pub fn get(&self, id: BusinessId) -> Result<Option<BusinessEntity>, ContasError> {
        let data = self.data.read().map_err(|e| {
            ContasError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.get(&id).cloned())
    }

    /// Get all businesses of a user, ordered by (order, name)
    pub fn get_by_user(&self, user_id: UserId) -> Result<Vec<BusinessEntity>, ContasError> {
        let data = self.data.read().map_err(|e| {
            ContasError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut businesses: Vec<_> = data
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        sort_for_display(&mut businesses);
        Ok(businesses)
    }

    /// Get a business by name (case-insensitive)
    pub fn get_by_name(
        &self,
        user_id: UserId,
        name: &str,
    ) -> Result<Option<BusinessEntity>, ContasError> {
        let name_lower = name.trim().to_lowercase();
        Ok(self
            .get_by_user(user_id)?
            .into_iter()
            .find(|b| b.name.to_lowercase() == name_lower))
    }

    pub fn upsert(&self, business: BusinessEntity) -> Result<(), ContasError> {
        let mut data = self.data.write().map_err(|e| {
            ContasError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        data.insert(business.id, business);
        Ok(())
    }

    pub fn delete(&self, id: BusinessId) -> Result<Option<BusinessEntity>, ContasError> {
        let mut data = self.data.write().map_err(|e| {
            ContasError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        Ok(data.remove(&id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ordered_by_order_then_name() {
        let temp_dir = TempDir::new().unwrap();
        let repo = BusinessRepository::new(temp_dir.path().join("businesses.json"));
        let user = UserId::new();

        repo.upsert(BusinessEntity::new(user, "Padaria", 1)).unwrap();
        repo.upsert(BusinessEntity::new(user, "Lanchonete", 1)).unwrap();
        repo.upsert(BusinessEntity::new(user, "Arcade", 0)).unwrap();

        let names: Vec<_> = repo
            .get_by_user(user)
            .unwrap()
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(names, vec!["Arcade", "Lanchonete", "Padaria"]);
    }

    #[test]
    fn test_get_by_name() {
        let temp_dir = TempDir::new().unwrap();
        let repo = BusinessRepository::new(temp_dir.path().join("businesses.json"));
        let user = UserId::new();
        repo.upsert(BusinessEntity::new(user, "Arcade", 0)).unwrap();

        assert!(repo.get_by_name(user, " arcade ").unwrap().is_some());
        assert!(repo.get_by_name(user, "Bakery").unwrap().is_none());
    }
}
