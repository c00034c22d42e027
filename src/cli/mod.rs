//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod assistant;
pub mod business;
pub mod card;
pub mod movement;
pub mod report;
pub mod summary;
pub mod transfer;

pub use assistant::{handle_assistant_command, AssistantCommands};
pub use business::{handle_business_command, BusinessCommands};
pub use card::{handle_card_command, CardCommands};
pub use movement::{handle_expense_command, handle_income_command, ExpenseCommands, IncomeCommands};
pub use report::{handle_report_command, ReportCommands};
pub use summary::handle_summary_command;
pub use transfer::{handle_transfer_command, TransferCommands};

use chrono::NaiveDate;

use crate::error::{ContasError, ContasResult};
use crate::models::{Money, MonthPeriod};

/// Today's date in local time
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Parse a positive amount such as "12.50", "R$ 12,50" or "12"
pub fn parse_amount(text: &str) -> ContasResult<Money> {
    let amount = Money::parse(text).map_err(|e| {
        ContasError::Validation(format!(
            "Invalid amount: '{}'. Use a format like '100.00' or '100'. Error: {}",
            text, e
        ))
    })?;
    if !amount.is_positive() {
        return Err(ContasError::Validation(format!(
            "Amount must be positive, got {}",
            amount
        )));
    }
    Ok(amount)
}

/// Parse a YYYY-MM-DD date, defaulting to today
pub fn parse_date(text: Option<&str>) -> ContasResult<NaiveDate> {
    match text {
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            ContasError::Validation(format!("Invalid date format: '{}'. Use YYYY-MM-DD", s))
        }),
        None => Ok(today()),
    }
}

pub fn parse_month(text: Option<&str>) -> ContasResult<Option<MonthPeriod>> {
    text.map(|s| {
        MonthPeriod::parse(s).map_err(|e| {
            ContasError::Validation(format!("Invalid month: {}. Use YYYY-MM (e.g., 2025-01)", e))
        })
    })
    .transpose()
}
