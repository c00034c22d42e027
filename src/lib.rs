//! MendozaContas - personal and small-business finance tracker
//!
//! This library records incomes and expenses under separate accounting
//! contexts (Personal plus user-defined businesses), tracks credit cards and
//! their billing cycles, moves money from businesses into Personal through
//! transfers, and computes a monthly snapshot with projections and a safe
//! spending margin.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Data directory resolution and user settings
//! - `error`: Custom error types
//! - `models`: Core data models (movements, cards, cycles, contexts, etc.)
//! - `storage`: JSON file storage and the ledger traits
//! - `services`: Business logic, transfers and the assistant processor
//! - `reports`: Financial snapshot, chart aggregates and invoices
//! - `audit`: Audit logging system
//! - `display`: Terminal tables
//! - `cli`: Command handlers for the `contas` binary
//!
//! # Example
//!
//! ```rust,ignore
//! use mendoza_contas::config::{paths::ContasPaths, settings::Settings};
//! use mendoza_contas::reports::FinancialSnapshot;
//! use mendoza_contas::storage::Storage;
//!
//! let paths = ContasPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let mut storage = Storage::new(paths)?;
//! storage.load_all()?;
//! let snapshot = FinancialSnapshot::generate(&storage, settings.user_id, today)?;
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod models;
pub mod reports;
pub mod services;
pub mod storage;

pub use error::{ContasError, ContasResult};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "mendoza_contas=warn";

/// Initializes the global tracing subscriber, writing to stderr
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_tracing_twice_does_not_panic() {
        super::init_tracing();
        super::init_tracing();
    }
}
