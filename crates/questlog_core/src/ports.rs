//! crates/questlog_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the storage substrate and the credential scheme.

use crate::domain::{Identity, TaskSnapshot};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., filesystem, hashing).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Snapshot storage for the identity collection.
///
/// Read once when the ledger opens, rewritten in full on every mutation.
pub trait IdentityRepository: Send + Sync {
    fn load_identities(&self) -> PortResult<Vec<Identity>>;

    fn save_identities(&self, identities: &[Identity]) -> PortResult<()>;
}

/// Snapshot storage for the flat task collection and the daily assignment markers.
pub trait TaskRepository: Send + Sync {
    fn load_tasks(&self) -> PortResult<TaskSnapshot>;

    fn save_tasks(&self, snapshot: &TaskSnapshot) -> PortResult<()>;
}

pub trait SecretHasher: Send + Sync {
    /// Produces the value stored in `Identity::secret_hash`.
    fn hash(&self, secret: &str) -> PortResult<String>;

    /// Checks a candidate secret against a stored hash.
    fn verify(&self, secret: &str, stored_hash: &str) -> bool;
}
