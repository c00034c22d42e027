//! Custom error types for MendozaContas
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// The main error type for MendozaContas operations
#[derive(Error, Debug)]
pub enum ContasError {
    /// Card closing/due day or other configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Transfer precondition violated (amount or source context)
    #[error("Invalid transfer: {0}")]
    InvalidTransfer(String),

    /// A read from the ledger failed
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    /// A total or amount outside the supported range
    #[error("Amount out of range: {0}")]
    AmountOverflow(String),

    /// Structurally invalid item or response from the assistant
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for data models
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Report export errors
    #[error("Export error: {0}")]
    Export(String),
}

impl ContasError {
    /// Create a "not found" error for movements
    pub fn movement_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Movement",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for cards
    pub fn card_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Card",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for business entities
    pub fn business_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Business",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for transfers
    pub fn transfer_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Transfer",
            identifier: identifier.into(),
        }
    }

    /// Create an error for a total that no longer fits in the money range
    pub fn amount_overflow(what: impl Into<String>) -> Self {
        Self::AmountOverflow(what.into())
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this error came from a failed ledger read
    pub fn is_data_unavailable(&self) -> bool {
        matches!(self, Self::DataUnavailable(_))
    }

    /// Message shown to the user for this error
    ///
    /// Read failures collapse into a generic message; precondition failures
    /// keep their specific text.
    pub fn user_message(&self) -> String {
        match self {
            Self::DataUnavailable(_) => "Could not load summary".to_string(),
            other => other.to_string(),
        }
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for ContasError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ContasError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for MendozaContas operations
pub type ContasResult<T> = Result<T, ContasError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ContasError::InvalidConfiguration("closing day 32".into());
        assert_eq!(err.to_string(), "Invalid configuration: closing day 32");
    }

    #[test]
    fn test_not_found_error() {
        let err = ContasError::card_not_found("Nubank");
        assert_eq!(err.to_string(), "Card not found: Nubank");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_user_message_hides_read_failures() {
        let err = ContasError::DataUnavailable("movements.json locked".into());
        assert!(err.is_data_unavailable());
        assert_eq!(err.user_message(), "Could not load summary");

        let err = ContasError::InvalidTransfer("Transfer amount must be positive".into());
        assert_eq!(
            err.user_message(),
            "Invalid transfer: Transfer amount must be positive"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let contas_err: ContasError = io_err.into();
        assert!(matches!(contas_err, ContasError::Io(_)));
    }
}
