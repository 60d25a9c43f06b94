//! services/app/src/error.rs
//!
//! Defines the primary error type for the app service.

use crate::config::ConfigError;
use questlog_core::LedgerError;

/// The primary error type for the `app` service.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A typed failure from the ledgers or the engine (validation, credentials, not found...).
    #[error("{0}")]
    Ledger(#[from] LedgerError),

    /// Represents a standard Input/Output error (e.g., creating the storage directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl AppError {
    /// The message shown to the end user as a transient notification.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Ledger(LedgerError::Storage(_)) | AppError::Io(_) => {
                "Your changes could not be saved.".to_string()
            }
            AppError::Ledger(inner) => inner.to_string(),
            AppError::Config(_) | AppError::Internal(_) => "Something went wrong.".to_string(),
        }
    }
}
