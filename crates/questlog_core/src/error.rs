//! crates/questlog_core/src/error.rs
//!
//! Typed failures of the ledgers and the engine. All of them are recoverable and
//! local to the call that produced them.

use crate::ports::PortError;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Username '{0}' is already taken")]
    UsernameTaken(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Task {0} not found")]
    NotFound(Uuid),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// A task was addressed to an owner that is not registered.
    #[error("Identity {0} is not registered")]
    UnknownIdentity(Uuid),

    #[error("No active session")]
    NotAuthenticated,

    /// The in-memory change was applied but the snapshot could not be written.
    #[error("Storage error: {0}")]
    Storage(#[from] PortError),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
