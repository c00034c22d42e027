//! Money movement model
//!
//! A movement is one dated income or expense inside a single context. The
//! sign lives in `kind`; amounts are always positive.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::context::Context;
use super::ids::{MovementId, TransferId, UserId};
use super::money::{Money, MAX_AMOUNT};

/// Maximum number of installments on a manually entered expense
pub const MAX_EXPENSE_INSTALLMENTS: u32 = 99;

/// Category assigned to the expense leg of a transfer
pub const TRANSFER_CATEGORY: &str = "Transfer";

/// Category used when none is given
pub const DEFAULT_CATEGORY: &str = "Other";

/// Suggested expense categories
pub const EXPENSE_CATEGORIES: &[&str] = &[
    "Food",
    "Transport",
    "Home",
    "Health",
    "Education",
    "Leisure",
    "Shopping",
    "Services",
    "Payroll",
    "Suppliers",
    "Other",
];

/// Direction of a movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    Income,
    Expense,
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Income => write!(f, "Income"),
            Self::Expense => write!(f, "Expense"),
        }
    }
}

/// How an expense was paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Pix,
    Cash,
    Card,
}

impl PaymentMethod {
    /// Parse a payment method name (English or Portuguese)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pix" => Some(Self::Pix),
            "cash" | "dinheiro" => Some(Self::Cash),
            "card" | "cartao" | "cartão" => Some(Self::Card),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pix => write!(f, "Pix"),
            Self::Cash => write!(f, "Cash"),
            Self::Card => write!(f, "Card"),
        }
    }
}

/// Kind of income
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IncomeType {
    /// Salary or other recurring income
    Fixed,
    /// One-off income
    #[default]
    Extra,
    /// Daily takings of a business
    BusinessDaily,
    /// Personal leg of a transfer; only created by the transfer operation
    Transfer,
}

impl IncomeType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "fixed" => Some(Self::Fixed),
            "extra" => Some(Self::Extra),
            "business_daily" | "business-daily" | "daily" => Some(Self::BusinessDaily),
            "transfer" => Some(Self::Transfer),
            _ => None,
        }
    }
}

impl fmt::Display for IncomeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed => write!(f, "Fixed"),
            Self::Extra => write!(f, "Extra"),
            Self::BusinessDaily => write!(f, "Business daily"),
            Self::Transfer => write!(f, "Transfer"),
        }
    }
}

/// A dated income or expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementId,

    pub user_id: UserId,

    pub kind: MovementKind,

    /// Always positive
    pub amount: Money,

    pub date: NaiveDate,

    #[serde(default)]
    pub context: Context,

    pub description: String,

    #[serde(default)]
    pub category: String,

    /// Expenses only
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,

    /// Incomes only
    #[serde(default)]
    pub income_type: Option<IncomeType>,

    #[serde(default)]
    pub recurring: bool,

    /// Number of installments (expenses only, 1 for a single payment)
    #[serde(default = "default_installments")]
    pub installment_total: u32,

    /// Which installment this is, 1-based
    #[serde(default = "default_installments")]
    pub installment_index: u32,

    #[serde(default)]
    pub notes: String,

    /// Set on both legs of a transfer
    #[serde(default)]
    pub transfer_id: Option<TransferId>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

fn default_installments() -> u32 {
    1
}

impl Movement {
    fn new(
        user_id: UserId,
        kind: MovementKind,
        amount: Money,
        date: NaiveDate,
        context: Context,
        description: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: MovementId::new(),
            user_id,
            kind,
            amount,
            date,
            context,
            description: description.into(),
            category: String::new(),
            payment_method: None,
            income_type: None,
            recurring: false,
            installment_total: 1,
            installment_index: 1,
            notes: String::new(),
            transfer_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create an expense paid by Pix in the default category
    pub fn expense(
        user_id: UserId,
        amount: Money,
        date: NaiveDate,
        context: Context,
        description: impl Into<String>,
    ) -> Self {
        let mut movement = Self::new(
            user_id,
            MovementKind::Expense,
            amount,
            date,
            context,
            description,
        );
        movement.category = DEFAULT_CATEGORY.to_string();
        movement.payment_method = Some(PaymentMethod::default());
        movement
    }

    /// Create an income of type Extra
    pub fn income(
        user_id: UserId,
        amount: Money,
        date: NaiveDate,
        context: Context,
        description: impl Into<String>,
    ) -> Self {
        let mut movement = Self::new(
            user_id,
            MovementKind::Income,
            amount,
            date,
            context,
            description,
        );
        movement.income_type = Some(IncomeType::default());
        movement
    }

    pub fn is_income(&self) -> bool {
        self.kind == MovementKind::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind == MovementKind::Expense
    }

    /// Check if this movement is one leg of a transfer
    pub fn is_transfer(&self) -> bool {
        self.transfer_id.is_some()
    }

    /// Clamp installment fields into their allowed ranges
    pub fn normalize_installments(&mut self) {
        self.installment_total = self.installment_total.clamp(1, MAX_EXPENSE_INSTALLMENTS);
        self.installment_index = self.installment_index.clamp(1, self.installment_total);
    }

    /// Validate the movement
    pub fn validate(&self) -> Result<(), MovementValidationError> {
        if !self.amount.is_positive() {
            return Err(MovementValidationError::NonPositiveAmount);
        }

        if !self.amount.is_within_limit() {
            return Err(MovementValidationError::AmountTooLarge);
        }

        if self.description.trim().is_empty() {
            return Err(MovementValidationError::EmptyDescription);
        }

        if self.installment_total == 0 || self.installment_total > MAX_EXPENSE_INSTALLMENTS {
            return Err(MovementValidationError::InvalidInstallments(
                self.installment_total,
            ));
        }

        if self.installment_index == 0 || self.installment_index > self.installment_total {
            return Err(MovementValidationError::InvalidInstallments(
                self.installment_index,
            ));
        }

        match self.kind {
            MovementKind::Income if self.payment_method.is_some() => {
                Err(MovementValidationError::PaymentMethodOnIncome)
            }
            MovementKind::Expense if self.income_type.is_some() => {
                Err(MovementValidationError::IncomeTypeOnExpense)
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Movement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} ({})",
            self.date, self.kind, self.amount, self.description
        )
    }
}

/// Validation errors for movements
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovementValidationError {
    NonPositiveAmount,
    AmountTooLarge,
    EmptyDescription,
    InvalidInstallments(u32),
    PaymentMethodOnIncome,
    IncomeTypeOnExpense,
}

impl fmt::Display for MovementValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveAmount => write!(f, "Amount must be positive"),
            Self::AmountTooLarge => write!(f, "Amount cannot exceed {}", MAX_AMOUNT),
            Self::EmptyDescription => write!(f, "Description cannot be empty"),
            Self::InvalidInstallments(n) => write!(
                f,
                "Invalid installment value {} (allowed 1-{})",
                n, MAX_EXPENSE_INSTALLMENTS
            ),
            Self::PaymentMethodOnIncome => write!(f, "Incomes do not have a payment method"),
            Self::IncomeTypeOnExpense => write!(f, "Expenses do not have an income type"),
        }
    }
}

impl std::error::Error for MovementValidationError {}
