//! crates/questlog_core/src/memory.rs
//!
//! In-memory implementations of the repository ports. Nothing survives the process;
//! useful for ephemeral sessions and as the storage behind unit tests.

use crate::domain::{Identity, TaskSnapshot};
use crate::ports::{IdentityRepository, PortResult, TaskRepository};
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Default)]
pub struct MemoryIdentityRepository {
    identities: Mutex<Vec<Identity>>,
}

impl MemoryIdentityRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of the last saved collection.
    pub fn saved(&self) -> Vec<Identity> {
        self.identities
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl IdentityRepository for MemoryIdentityRepository {
    fn load_identities(&self) -> PortResult<Vec<Identity>> {
        Ok(self.saved())
    }

    fn save_identities(&self, identities: &[Identity]) -> PortResult<()> {
        *self.identities.lock().unwrap_or_else(PoisonError::into_inner) = identities.to_vec();
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryTaskRepository {
    snapshot: Mutex<TaskSnapshot>,
}

impl MemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved(&self) -> TaskSnapshot {
        self.snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl TaskRepository for MemoryTaskRepository {
    fn load_tasks(&self) -> PortResult<TaskSnapshot> {
        Ok(self.saved())
    }

    fn save_tasks(&self, snapshot: &TaskSnapshot) -> PortResult<()> {
        *self.snapshot.lock().unwrap_or_else(PoisonError::into_inner) = snapshot.clone();
        Ok(())
    }
}
