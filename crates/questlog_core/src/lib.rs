pub mod clock;
pub mod domain;
pub mod engine;
pub mod error;
pub mod identity;
pub mod memory;
pub mod ports;
pub mod progression;
pub mod quests;
pub mod tasks;
pub mod views;

pub use clock::{Clock, FixedClock, SystemClock};
pub use domain::{
    DailyQuest, ExerciseType, Identity, LevelChange, Priority, Task, TaskDraft, TaskSnapshot,
    TaskUpdate,
};
pub use engine::{Completion, Engine, Rollover};
pub use error::{LedgerError, LedgerResult};
pub use ports::{IdentityRepository, PortError, PortResult, SecretHasher, TaskRepository};
pub use progression::{level_progress, xp_to_reach_level, LevelProgress};
pub use quests::{QuestGenerator, QuestSettings};
pub use tasks::TaskView;
pub use views::{Dashboard, History, HistoryDay};

#[cfg(test)]
pub(crate) mod test_support {
    use crate::clock::FixedClock;
    use crate::domain::{Identity, Priority, TaskDraft, TaskSnapshot};
    use crate::engine::Engine;
    use crate::identity::IdentityLedger;
    use crate::memory::{MemoryIdentityRepository, MemoryTaskRepository};
    use crate::ports::{IdentityRepository, PortError, PortResult, SecretHasher, TaskRepository};
    use crate::quests::{QuestGenerator, QuestSettings};
    use crate::tasks::TaskLedger;
    use chrono::{DateTime, Utc};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// Stores secrets with a visible prefix so tests can see the hasher was used.
    pub struct PlainHasher;

    impl SecretHasher for PlainHasher {
        fn hash(&self, secret: &str) -> PortResult<String> {
            Ok(format!("plain:{secret}"))
        }

        fn verify(&self, secret: &str, stored_hash: &str) -> bool {
            stored_hash.strip_prefix("plain:") == Some(secret)
        }
    }

    /// In-memory storage whose saves can be switched to fail.
    #[derive(Default)]
    pub struct FlakyStorage {
        identities: MemoryIdentityRepository,
        tasks: MemoryTaskRepository,
        failing: AtomicBool,
    }

    impl FlakyStorage {
        pub fn fail_saves(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        fn check(&self) -> PortResult<()> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(PortError::Unexpected("disk full".to_string()));
            }
            Ok(())
        }

        pub fn saved_tasks(&self) -> TaskSnapshot {
            self.tasks.saved()
        }

        pub fn saved_identities(&self) -> Vec<Identity> {
            self.identities.saved()
        }
    }

    impl IdentityRepository for FlakyStorage {
        fn load_identities(&self) -> PortResult<Vec<Identity>> {
            self.identities.load_identities()
        }

        fn save_identities(&self, identities: &[Identity]) -> PortResult<()> {
            self.check()?;
            self.identities.save_identities(identities)
        }
    }

    impl TaskRepository for FlakyStorage {
        fn load_tasks(&self) -> PortResult<TaskSnapshot> {
            self.tasks.load_tasks()
        }

        fn save_tasks(&self, snapshot: &TaskSnapshot) -> PortResult<()> {
            self.check()?;
            self.tasks.save_tasks(snapshot)
        }
    }

    /// An engine over in-memory storage with bonus tasks switched off.
    pub fn engine_at(now: DateTime<Utc>) -> (Engine, Arc<FixedClock>) {
        let (engine, clock, _) = flaky_engine_at(now);
        (engine, clock)
    }

    /// Like `engine_at`, but hands back the storage so a test can make saves fail.
    pub fn flaky_engine_at(now: DateTime<Utc>) -> (Engine, Arc<FixedClock>, Arc<FlakyStorage>) {
        let clock = Arc::new(FixedClock::utc(now));
        let storage = Arc::new(FlakyStorage::default());
        let identities = IdentityLedger::open(storage.clone(), Arc::new(PlainHasher)).unwrap();
        let tasks = TaskLedger::open(storage.clone()).unwrap();
        let generator = QuestGenerator::new(QuestSettings {
            bonus_probability: 0.0,
            ..QuestSettings::default()
        });
        let engine = Engine::new(
            identities,
            tasks,
            clock.clone(),
            generator,
            StdRng::seed_from_u64(42),
        );
        (engine, clock, storage)
    }

    pub fn manual_draft(title: &str, deadline: DateTime<Utc>, xp_reward: u64) -> TaskDraft {
        TaskDraft {
            title: title.to_string(),
            description: None,
            priority: Priority::Medium,
            deadline,
            xp_reward,
            daily_quest: None,
        }
    }
}
