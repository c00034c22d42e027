//! Business entity model
//!
//! Each business entity is its own accounting context, separate from
//! Personal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::context::Context;
use super::ids::{BusinessId, UserId};

/// Maximum length of a business name
pub const MAX_BUSINESS_NAME_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessEntity {
    pub id: BusinessId,

    pub user_id: UserId,

    /// Display name (e.g., "Arcade")
    pub name: String,

    /// Sort order for display
    #[serde(default)]
    pub order: i32,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl BusinessEntity {
    /// Create a business, trimming the name and cutting it to the maximum length
    pub fn new(user_id: UserId, name: &str, order: i32) -> Self {
        let now = Utc::now();
        Self {
            id: BusinessId::new(),
            user_id,
            name: normalize_name(name),
            order,
            created_at: now,
            updated_at: now,
        }
    }

    /// The context that movements of this business belong to
    pub fn context(&self) -> Context {
        Context::Business(self.id)
    }

    pub fn rename(&mut self, name: &str) {
        self.name = normalize_name(name);
        self.updated_at = Utc::now();
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("Business name cannot be empty".into());
        }
        Ok(())
    }
}

/// Trim and truncate a business name
pub fn normalize_name(name: &str) -> String {
    name.trim().chars().take(MAX_BUSINESS_NAME_LEN).collect()
}

impl fmt::Display for BusinessEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_normalized() {
        let b = BusinessEntity::new(UserId::new(), "  Arcade  ", 0);
        assert_eq!(b.name, "Arcade");
        assert_eq!(b.context(), Context::Business(b.id));

        let long = "x".repeat(150);
        let b = BusinessEntity::new(UserId::new(), &long, 0);
        assert_eq!(b.name.chars().count(), MAX_BUSINESS_NAME_LEN);
    }

    #[test]
    fn test_empty_name_invalid() {
        let b = BusinessEntity::new(UserId::new(), "   ", 0);
        assert!(b.validate().is_err());
    }
}
