//! crates/questlog_core/src/engine.rs
//!
//! The progression orchestrator. It owns both ledgers and is the only place that
//! writes across them: completing a task awards its XP, and a new calendar day
//! replaces the owner's lapsed daily quests with freshly generated ones.

use crate::clock::Clock;
use crate::domain::{Identity, LevelChange, Task, TaskDraft, TaskUpdate};
use crate::error::{LedgerError, LedgerResult};
use crate::identity::IdentityLedger;
use crate::ports::{IdentityRepository, SecretHasher, TaskRepository};
use crate::quests::{QuestGenerator, QuestSettings};
use crate::tasks::{TaskLedger, TaskView};
use crate::views::{Dashboard, History};
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// What completing a task produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub task: Task,
    pub xp_awarded: u64,
    /// `None` if the owner no longer resolves to an identity.
    pub level_change: Option<LevelChange>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rollover {
    /// Quests were already generated for this identity today.
    AlreadyAssigned { date: NaiveDate },
    Assigned {
        date: NaiveDate,
        /// Incomplete quests from earlier days that lapsed unrewarded.
        retired: usize,
        created: Vec<Task>,
    },
}

pub struct Engine {
    identities: IdentityLedger,
    tasks: TaskLedger,
    clock: Arc<dyn Clock>,
    generator: QuestGenerator,
    rng: StdRng,
}

impl Engine {
    pub fn new(
        identities: IdentityLedger,
        tasks: TaskLedger,
        clock: Arc<dyn Clock>,
        generator: QuestGenerator,
        rng: StdRng,
    ) -> Self {
        Self {
            identities,
            tasks,
            clock,
            generator,
            rng,
        }
    }

    /// Loads both ledgers from their repositories and seeds the bonus draw from the OS.
    pub fn open(
        identity_repository: Arc<dyn IdentityRepository>,
        task_repository: Arc<dyn TaskRepository>,
        hasher: Arc<dyn SecretHasher>,
        clock: Arc<dyn Clock>,
        settings: QuestSettings,
    ) -> LedgerResult<Self> {
        Ok(Self::new(
            IdentityLedger::open(identity_repository, hasher)?,
            TaskLedger::open(task_repository)?,
            clock,
            QuestGenerator::new(settings),
            StdRng::from_os_rng(),
        ))
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    pub fn identities(&self) -> &IdentityLedger {
        &self.identities
    }

    pub fn tasks(&self) -> &TaskLedger {
        &self.tasks
    }

    //=====================================================================================
    // Session
    //=====================================================================================

    pub fn register(&mut self, username: &str, secret: &str) -> LedgerResult<Identity> {
        self.identities.register(username, secret, self.clock.now())
    }

    pub fn authenticate(&mut self, username: &str, secret: &str) -> LedgerResult<Identity> {
        self.identities.authenticate(username, secret)
    }

    pub fn end_session(&mut self) {
        self.identities.end_session();
    }

    pub fn active_identity(&self) -> Option<&Identity> {
        self.identities.active()
    }

    //=====================================================================================
    // Tasks
    //=====================================================================================

    pub fn add_task(&mut self, owner_id: Uuid, draft: TaskDraft) -> LedgerResult<Task> {
        if !self.identities.is_registered(owner_id) {
            return Err(LedgerError::UnknownIdentity(owner_id));
        }
        self.tasks.insert(owner_id, draft, self.clock.now())
    }

    pub fn update_task(&mut self, id: Uuid, update: TaskUpdate) -> LedgerResult<Task> {
        self.tasks.update(id, update)
    }

    pub fn delete_task(&mut self, id: Uuid) -> LedgerResult<bool> {
        self.tasks.delete(id)
    }

    /// Marks the task completed and credits its XP to the owner in one call.
    ///
    /// Completing an already completed task is a no-op and returns `Ok(None)`.
    pub fn complete_task(&mut self, id: Uuid) -> LedgerResult<Option<Completion>> {
        let before = self
            .tasks
            .mark_completed(id)?
            .ok_or(LedgerError::NotFound(id))?;
        if before.completed {
            debug!("Task {} was already completed.", id);
            return Ok(None);
        }

        // No rollback past this point: if the award cannot be saved, the task stays
        // completed without its XP.
        let level_change = self.identities.award_xp(before.owner_id, before.xp_reward)?;
        info!(
            "Task {} completed; {} XP to {}.",
            id, before.xp_reward, before.owner_id
        );

        Ok(Some(Completion {
            xp_awarded: before.xp_reward,
            level_change,
            task: Task {
                completed: true,
                ..before
            },
        }))
    }

    /// Generates today's quests for the identity unless that already happened today.
    ///
    /// Incomplete quests from earlier days are dropped; completed ones stay as history.
    pub fn rollover_daily_quests(&mut self, identity_id: Uuid) -> LedgerResult<Rollover> {
        let level = self
            .identities
            .get(identity_id)
            .map(|identity| identity.level)
            .ok_or(LedgerError::UnknownIdentity(identity_id))?;

        let today = self.clock.today();
        if self.tasks.last_assigned(identity_id) == Some(today) {
            return Ok(Rollover::AlreadyAssigned { date: today });
        }

        let drafts = self
            .generator
            .generate(level, today, self.clock.as_ref(), &mut self.rng);
        let (retired, created) =
            self.tasks
                .replace_daily_quests(identity_id, drafts, today, self.clock.now())?;
        info!(
            "Assigned {} daily tasks to {} for {} ({} lapsed).",
            created.len(),
            identity_id,
            today,
            retired
        );

        Ok(Rollover::Assigned {
            date: today,
            retired,
            created,
        })
    }

    //=====================================================================================
    // Views
    //=====================================================================================

    pub fn view(&self, owner_id: Uuid, view: TaskView) -> Vec<Task> {
        self.tasks.query(owner_id, view, self.clock.as_ref())
    }

    pub fn dashboard(&self, owner_id: Uuid) -> Option<Dashboard> {
        let identity = self.identities.get(owner_id)?;
        Some(Dashboard::build(identity, &self.tasks, self.clock.as_ref()))
    }

    pub fn history(&self, owner_id: Uuid) -> Option<History> {
        let identity = self.identities.get(owner_id)?;
        Some(History::build(identity, &self.tasks, self.clock.as_ref()))
    }
}
