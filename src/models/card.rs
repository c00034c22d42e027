//! Credit card model
//!
//! A card account closes its invoice on a fixed day each month. Charges made
//! on the card are always expenses in the card's context.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::context::Context;
use super::ids::{CardId, ChargeId, UserId};
use super::money::{Money, MAX_AMOUNT};
use super::movement::DEFAULT_CATEGORY;

/// Maximum number of installments on a card charge
pub const MAX_CARD_INSTALLMENTS: u32 = 24;

/// A credit card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardAccount {
    pub id: CardId,

    pub user_id: UserId,

    /// Card name (e.g., "Nubank")
    pub name: String,

    pub credit_limit: Money,

    /// Day of month the invoice closes (1-31)
    pub closing_day: u32,

    /// Day of month the invoice is due (1-31)
    pub due_day: u32,

    #[serde(default)]
    pub context: Context,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl CardAccount {
    pub fn new(
        user_id: UserId,
        name: impl Into<String>,
        closing_day: u32,
        due_day: u32,
        context: Context,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: CardId::new(),
            user_id,
            name: name.into(),
            credit_limit: Money::zero(),
            closing_day,
            due_day,
            context,
            created_at: now,
            updated_at: now,
        }
    }

    /// Validate the card
    pub fn validate(&self) -> Result<(), CardValidationError> {
        if self.name.trim().is_empty() {
            return Err(CardValidationError::EmptyName);
        }

        if self.name.len() > 100 {
            return Err(CardValidationError::NameTooLong(self.name.len()));
        }

        if self.credit_limit.is_negative() {
            return Err(CardValidationError::NegativeLimit);
        }

        if !self.credit_limit.is_within_limit() {
            return Err(CardValidationError::LimitTooLarge);
        }

        if !(1..=31).contains(&self.closing_day) {
            return Err(CardValidationError::ClosingDayOutOfRange(self.closing_day));
        }

        if !(1..=31).contains(&self.due_day) {
            return Err(CardValidationError::DueDayOutOfRange(self.due_day));
        }

        Ok(())
    }
}

impl fmt::Display for CardAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (closes {}, due {})",
            self.name, self.closing_day, self.due_day
        )
    }
}

/// Validation errors for cards
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardValidationError {
    EmptyName,
    NameTooLong(usize),
    NegativeLimit,
    LimitTooLarge,
    ClosingDayOutOfRange(u32),
    DueDayOutOfRange(u32),
}

impl CardValidationError {
    /// Day-of-month problems are configuration errors rather than plain validation
    pub fn is_day_error(&self) -> bool {
        matches!(
            self,
            Self::ClosingDayOutOfRange(_) | Self::DueDayOutOfRange(_)
        )
    }
}

impl fmt::Display for CardValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Card name cannot be empty"),
            Self::NameTooLong(len) => write!(f, "Card name too long ({} chars, max 100)", len),
            Self::NegativeLimit => write!(f, "Credit limit cannot be negative"),
            Self::LimitTooLarge => write!(f, "Credit limit cannot exceed {}", MAX_AMOUNT),
            Self::ClosingDayOutOfRange(d) => {
                write!(f, "Closing day must be between 1 and 31, got {}", d)
            }
            Self::DueDayOutOfRange(d) => write!(f, "Due day must be between 1 and 31, got {}", d),
        }
    }
}

impl std::error::Error for CardValidationError {}

/// A purchase made on a card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardCharge {
    pub id: ChargeId,

    pub user_id: UserId,

    /// The card this charge was made on; may point to a deleted card
    pub card_id: CardId,

    pub description: String,

    /// Always positive
    pub amount: Money,

    pub installment_total: u32,

    pub installment_index: u32,

    pub category: String,

    pub purchase_date: NaiveDate,

    /// Copied from the card at creation
    #[serde(default)]
    pub context: Context,

    pub created_at: DateTime<Utc>,
}

impl CardCharge {
    /// Create a charge on a card, inheriting its context
    pub fn new(
        card: &CardAccount,
        description: impl Into<String>,
        amount: Money,
        purchase_date: NaiveDate,
    ) -> Self {
        Self {
            id: ChargeId::new(),
            user_id: card.user_id,
            card_id: card.id,
            description: description.into(),
            amount,
            installment_total: 1,
            installment_index: 1,
            category: DEFAULT_CATEGORY.to_string(),
            purchase_date,
            context: card.context,
            created_at: Utc::now(),
        }
    }

    /// Set the installment count, clamped to 1..=24; the index restarts at 1
    pub fn with_installments(mut self, total: u32) -> Self {
        self.installment_total = total.clamp(1, MAX_CARD_INSTALLMENTS);
        self.installment_index = 1;
        self
    }

    /// Set the category, falling back to the default when blank
    pub fn with_category(mut self, category: &str) -> Self {
        let category = category.trim();
        self.category = if category.is_empty() {
            DEFAULT_CATEGORY.to_string()
        } else {
            category.to_string()
        };
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.amount.is_positive() {
            return Err("Charge amount must be positive".into());
        }
        if !self.amount.is_within_limit() {
            return Err(format!("Charge amount cannot exceed {}", MAX_AMOUNT));
        }
        if self.description.trim().is_empty() {
            return Err("Charge description cannot be empty".into());
        }
        if self.installment_index == 0 || self.installment_index > self.installment_total {
            return Err(format!(
                "Installment {} of {} is out of range",
                self.installment_index, self.installment_total
            ));
        }
        Ok(())
    }
}

impl fmt::Display for CardCharge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.purchase_date, self.description, self.amount)
    }
}
