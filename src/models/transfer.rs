//! Transfer model
//!
//! A transfer moves money from a business context into Personal. It owns a
//! pair of movements (an expense in the source, an income in Personal) that
//! both carry its id.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::context::Context;
use super::ids::{TransferId, UserId};
use super::money::Money;

/// Maximum number of transfers returned by a listing
pub const TRANSFER_LIST_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: TransferId,
    pub user_id: UserId,
    pub amount: Money,
    pub date: NaiveDate,
    /// Where the money came from
    pub source: Context,
    pub created_at: DateTime<Utc>,
}

impl Transfer {
    pub fn new(user_id: UserId, amount: Money, date: NaiveDate, source: Context) -> Self {
        Self {
            id: TransferId::new(),
            user_id,
            amount,
            date,
            source,
            created_at: Utc::now(),
        }
    }
}

impl fmt::Display for Transfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} from {}", self.date, self.amount, self.source)
    }
}
