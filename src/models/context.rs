//! Accounting contexts
//!
//! Every money movement belongs to exactly one context: the fixed Personal
//! context or a user-defined business entity. Money only crosses contexts
//! through a transfer.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::BusinessId;

/// An accounting partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum Context {
    #[default]
    Personal,
    Business(BusinessId),
}

impl Context {
    pub fn is_personal(&self) -> bool {
        matches!(self, Self::Personal)
    }

    /// The business id, if this is a business context
    pub fn business_id(&self) -> Option<BusinessId> {
        match self {
            Self::Personal => None,
            Self::Business(id) => Some(*id),
        }
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Personal => write!(f, "Personal"),
            Self::Business(id) => write!(f, "{}", id),
        }
    }
}
