//! crates/questlog_core/src/identity.rs
//!
//! The identity ledger: registered accounts, the active session, and XP awards.

use crate::domain::{Identity, LevelChange};
use crate::error::{LedgerError, LedgerResult};
use crate::ports::{IdentityRepository, SecretHasher};
use crate::progression::apply_xp;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub struct IdentityLedger {
    identities: Vec<Identity>,
    active: Option<Uuid>,
    repository: Arc<dyn IdentityRepository>,
    hasher: Arc<dyn SecretHasher>,
}

impl IdentityLedger {
    /// Loads the persisted identities. The session always starts anonymous.
    pub fn open(
        repository: Arc<dyn IdentityRepository>,
        hasher: Arc<dyn SecretHasher>,
    ) -> LedgerResult<Self> {
        let identities = repository.load_identities()?;
        info!("Loaded {} identities.", identities.len());
        Ok(Self {
            identities,
            active: None,
            repository,
            hasher,
        })
    }

    /// Saves `staged` and adopts it only if the save succeeded.
    fn commit(&mut self, staged: Vec<Identity>) -> LedgerResult<()> {
        self.repository.save_identities(&staged)?;
        self.identities = staged;
        Ok(())
    }

    pub fn get(&self, id: Uuid) -> Option<&Identity> {
        self.identities.iter().find(|identity| identity.id == id)
    }

    pub fn find_by_username(&self, username: &str) -> Option<&Identity> {
        self.identities
            .iter()
            .find(|identity| identity.username == username)
    }

    pub fn active_id(&self) -> Option<Uuid> {
        self.active
    }

    pub fn active(&self) -> Option<&Identity> {
        self.active.and_then(|id| self.get(id))
    }

    pub fn is_registered(&self, id: Uuid) -> bool {
        self.get(id).is_some()
    }

    /// Creates a level 0 identity and makes it the active session.
    pub fn register(
        &mut self,
        username: &str,
        secret: &str,
        now: DateTime<Utc>,
    ) -> LedgerResult<Identity> {
        if self.find_by_username(username).is_some() {
            return Err(LedgerError::UsernameTaken(username.to_string()));
        }

        let identity = Identity {
            id: Uuid::new_v4(),
            username: username.to_string(),
            secret_hash: self.hasher.hash(secret)?,
            level: 0,
            xp: 0,
            created_at: now,
        };

        let mut staged = self.identities.clone();
        staged.push(identity.clone());
        self.commit(staged)?;

        self.active = Some(identity.id);
        info!("Registered identity {} ({}).", identity.id, identity.username);
        Ok(identity)
    }

    /// Exact username match plus a verified secret; establishes the session.
    pub fn authenticate(&mut self, username: &str, secret: &str) -> LedgerResult<Identity> {
        let identity = self
            .find_by_username(username)
            .filter(|identity| self.hasher.verify(secret, &identity.secret_hash))
            .cloned()
            .ok_or(LedgerError::InvalidCredentials)?;

        self.active = Some(identity.id);
        info!("Identity {} logged in.", identity.id);
        Ok(identity)
    }

    pub fn end_session(&mut self) {
        if let Some(id) = self.active.take() {
            info!("Identity {} logged out.", id);
        }
    }

    /// Adds XP and converts every full threshold into a level.
    ///
    /// Returns `Ok(None)` when the identity is unknown; that case is only logged.
    pub fn award_xp(&mut self, id: Uuid, amount: u64) -> LedgerResult<Option<LevelChange>> {
        let mut staged = self.identities.clone();
        let Some(identity) = staged.iter_mut().find(|identity| identity.id == id) else {
            warn!("Ignoring award of {} XP to unknown identity {}.", amount, id);
            return Ok(None);
        };

        let previous_level = identity.level;
        let (level, xp) = apply_xp(identity.level, identity.xp, amount);
        identity.level = level;
        identity.xp = xp;

        self.commit(staged)?;
        let change = LevelChange {
            previous_level,
            new_level: level,
            xp,
        };
        if change.leveled_up() {
            info!("Identity {} reached level {}.", id, level);
        }
        Ok(Some(change))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryIdentityRepository;
    use crate::progression::xp_to_reach_level;
    use crate::test_support::{FlakyStorage, PlainHasher};

    fn ledger() -> (IdentityLedger, Arc<MemoryIdentityRepository>) {
        let repository = Arc::new(MemoryIdentityRepository::new());
        let ledger = IdentityLedger::open(repository.clone(), Arc::new(PlainHasher)).unwrap();
        (ledger, repository)
    }

    #[test]
    fn register_then_authenticate_scenario() {
        let (mut ledger, _) = ledger();

        let alice = ledger.register("alice", "secret1", Utc::now()).unwrap();
        assert_eq!(alice.level, 0);
        assert_eq!(alice.xp, 0);
        assert_eq!(ledger.active_id(), Some(alice.id));

        assert!(matches!(
            ledger.register("alice", "anything", Utc::now()),
            Err(LedgerError::UsernameTaken(name)) if name == "alice"
        ));
        assert!(matches!(
            ledger.authenticate("alice", "wrongpass"),
            Err(LedgerError::InvalidCredentials)
        ));

        let again = ledger.authenticate("alice", "secret1").unwrap();
        assert_eq!(again.id, alice.id);
    }

    #[test]
    fn usernames_are_case_sensitive() {
        let (mut ledger, _) = ledger();
        ledger.register("alice", "secret1", Utc::now()).unwrap();

        assert!(ledger.register("Alice", "secret1", Utc::now()).is_ok());
        assert!(matches!(
            ledger.authenticate("ALICE", "secret1"),
            Err(LedgerError::InvalidCredentials)
        ));
    }

    #[test]
    fn secrets_are_stored_through_the_hasher() {
        let (mut ledger, repository) = ledger();
        ledger.register("bob", "hunter22", Utc::now()).unwrap();

        let saved = repository.saved();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].secret_hash, "plain:hunter22");
    }

    #[test]
    fn end_session_is_idempotent() {
        let (mut ledger, _) = ledger();
        ledger.register("carol", "secret1", Utc::now()).unwrap();

        ledger.end_session();
        ledger.end_session();
        assert!(ledger.active().is_none());
    }

    #[test]
    fn award_carries_over_into_multiple_levels() {
        let (mut ledger, repository) = ledger();
        let id = ledger.register("dave", "secret1", Utc::now()).unwrap().id;

        let change = ledger.award_xp(id, 250).unwrap().unwrap();
        assert_eq!(change.previous_level, 0);
        assert_eq!(change.new_level, 2);
        assert_eq!(change.levels_gained(), 2);

        let identity = ledger.get(id).unwrap();
        assert_eq!((identity.level, identity.xp), (2, 0));
        assert!(identity.xp < xp_to_reach_level(identity.level));
        assert_eq!(repository.saved()[0].level, 2);
    }

    #[test]
    fn award_to_unknown_identity_is_a_no_op() {
        let (mut ledger, repository) = ledger();
        ledger.register("erin", "secret1", Utc::now()).unwrap();

        assert!(ledger.award_xp(Uuid::new_v4(), 500).unwrap().is_none());
        assert_eq!(repository.saved()[0].xp, 0);
    }

    #[test]
    fn open_restores_identities_but_not_the_session() {
        let (mut ledger, repository) = ledger();
        let id = ledger.register("frank", "secret1", Utc::now()).unwrap().id;

        let reopened = IdentityLedger::open(repository, Arc::new(PlainHasher)).unwrap();
        assert!(reopened.is_registered(id));
        assert!(reopened.active().is_none());
    }

    #[test]
    fn failed_award_keeps_the_previous_progress() {
        let storage = Arc::new(FlakyStorage::default());
        let mut ledger = IdentityLedger::open(storage.clone(), Arc::new(PlainHasher)).unwrap();
        let id = ledger.register("gina", "secret1", Utc::now()).unwrap().id;

        storage.fail_saves(true);
        assert!(matches!(ledger.award_xp(id, 250), Err(LedgerError::Storage(_))));
        let identity = ledger.get(id).unwrap();
        assert_eq!((identity.level, identity.xp), (0, 0));

        storage.fail_saves(false);
        assert_eq!(ledger.award_xp(id, 250).unwrap().unwrap().new_level, 2);
    }
}
