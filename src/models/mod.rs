//! Core data models for MendozaContas
//!
//! This module contains the data structures of the ledger: contexts, money
//! movements, cards and their charges, transfers, and billing cycles.

pub mod business;
pub mod card;
pub mod context;
pub mod cycle;
pub mod ids;
pub mod money;
pub mod movement;
pub mod period;
pub mod transfer;

pub use business::BusinessEntity;
pub use card::{CardAccount, CardCharge, MAX_CARD_INSTALLMENTS};
pub use context::Context;
pub use cycle::BillingCycle;
pub use ids::{BusinessId, CardId, ChargeId, MovementId, TransferId, UserId};
pub use money::{Money, MAX_AMOUNT};
pub use movement::{
    IncomeType, Movement, MovementKind, PaymentMethod, DEFAULT_CATEGORY, EXPENSE_CATEGORIES,
    TRANSFER_CATEGORY,
};
pub use period::{DateRange, MonthPeriod};
pub use transfer::Transfer;
