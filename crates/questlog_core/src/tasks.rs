//! crates/questlog_core/src/tasks.rs
//!
//! The task ledger: one flat, insertion-ordered collection of manual and generated
//! tasks for every identity, plus the per-identity daily assignment markers.
//!
//! Every view is scoped to an owner and recomputed from the collection and the clock
//! on each call, so elapsing deadlines show up without any write.

use crate::clock::Clock;
use crate::domain::{Task, TaskDraft, TaskSnapshot, TaskUpdate};
use crate::error::{LedgerError, LedgerResult};
use crate::ports::TaskRepository;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// The derived views the presentation layer can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskView {
    All,
    Pending,
    Completed,
    Expired,
    DueToday,
    ActiveDailyQuests,
}

impl TaskView {
    fn matches(&self, task: &Task, now: DateTime<Utc>, clock: &dyn Clock) -> bool {
        match self {
            TaskView::All => true,
            TaskView::Pending => !task.completed && task.deadline >= now,
            TaskView::Completed => task.completed,
            TaskView::Expired => task.is_expired_at(now),
            TaskView::DueToday => clock.to_local_date(task.deadline) == clock.to_local_date(now),
            TaskView::ActiveDailyQuests => {
                task.is_daily_quest() && !task.completed && task.deadline >= now
            }
        }
    }
}

pub struct TaskLedger {
    state: TaskSnapshot,
    repository: Arc<dyn TaskRepository>,
}

impl TaskLedger {
    pub fn open(repository: Arc<dyn TaskRepository>) -> LedgerResult<Self> {
        let state = repository.load_tasks()?;
        info!(
            "Loaded {} tasks and {} daily assignment markers.",
            state.tasks.len(),
            state.daily_assignments.len()
        );
        Ok(Self { state, repository })
    }

    /// Applies `change` to a copy of the snapshot and keeps the copy only once it is
    /// saved. A failed save leaves the ledger as it was.
    fn commit<T>(
        &mut self,
        change: impl FnOnce(&mut TaskSnapshot) -> LedgerResult<T>,
    ) -> LedgerResult<T> {
        let mut staged = self.state.clone();
        let outcome = change(&mut staged)?;
        self.repository.save_tasks(&staged)?;
        self.state = staged;
        Ok(outcome)
    }

    //=====================================================================================
    // CRUD
    //=====================================================================================

    pub fn get(&self, id: Uuid) -> Option<&Task> {
        self.state.tasks.iter().find(|task| task.id == id)
    }

    /// Stores a new, incomplete task. Owner and field policy are checked by the caller.
    pub fn insert(&mut self, owner_id: Uuid, draft: TaskDraft, now: DateTime<Utc>) -> LedgerResult<Task> {
        let task = Self::materialize(owner_id, draft, now);
        self.commit(|state| {
            state.tasks.push(task.clone());
            Ok(())
        })?;
        debug!("Added task {} for {}.", task.id, owner_id);
        Ok(task)
    }

    fn materialize(owner_id: Uuid, draft: TaskDraft, now: DateTime<Utc>) -> Task {
        Task {
            id: Uuid::new_v4(),
            owner_id,
            title: draft.title,
            description: draft.description,
            priority: draft.priority,
            deadline: draft.deadline,
            completed: false,
            created_at: now,
            xp_reward: draft.xp_reward,
            daily_quest: draft.daily_quest,
        }
    }

    /// Merges the provided fields. `id`, owner, completion and quest marker are kept.
    pub fn update(&mut self, id: Uuid, update: TaskUpdate) -> LedgerResult<Task> {
        let updated = self.commit(|state| {
            let task = state
                .tasks
                .iter_mut()
                .find(|task| task.id == id)
                .ok_or(LedgerError::NotFound(id))?;

            if let Some(title) = update.title {
                task.title = title;
            }
            if let Some(description) = update.description {
                task.description = description;
            }
            if let Some(priority) = update.priority {
                task.priority = priority;
            }
            if let Some(deadline) = update.deadline {
                task.deadline = deadline;
            }
            if let Some(xp_reward) = update.xp_reward {
                task.xp_reward = xp_reward;
            }
            Ok(task.clone())
        })?;
        debug!("Updated task {}.", id);
        Ok(updated)
    }

    /// Removes the task if present. Returns whether anything was removed.
    pub fn delete(&mut self, id: Uuid) -> LedgerResult<bool> {
        if self.get(id).is_none() {
            return Ok(false);
        }
        self.commit(|state| {
            state.tasks.retain(|task| task.id != id);
            Ok(())
        })?;
        debug!("Deleted task {}.", id);
        Ok(true)
    }

    /// Flips the completion flag. Only the engine calls this, paired with the XP award.
    ///
    /// Returns the task as it was before the call, or `None` if it does not exist.
    pub(crate) fn mark_completed(&mut self, id: Uuid) -> LedgerResult<Option<Task>> {
        let Some(before) = self.get(id).cloned() else {
            return Ok(None);
        };
        if !before.completed {
            self.commit(|state| {
                if let Some(task) = state.tasks.iter_mut().find(|task| task.id == id) {
                    task.completed = true;
                }
                Ok(())
            })?;
        }
        Ok(Some(before))
    }

    //=====================================================================================
    // Daily Quests
    //=====================================================================================

    pub fn last_assigned(&self, owner_id: Uuid) -> Option<NaiveDate> {
        self.state.daily_assignments.get(&owner_id).copied()
    }

    /// Drops the owner's incomplete daily quests, inserts the new drafts and records
    /// `today`, all in one snapshot write. Completed quests are kept as history.
    pub(crate) fn replace_daily_quests(
        &mut self,
        owner_id: Uuid,
        drafts: Vec<TaskDraft>,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> LedgerResult<(usize, Vec<Task>)> {
        let created: Vec<Task> = drafts
            .into_iter()
            .map(|draft| Self::materialize(owner_id, draft, now))
            .collect();

        let retired = self.commit(|state| {
            let before = state.tasks.len();
            state
                .tasks
                .retain(|task| !(task.owner_id == owner_id && task.is_daily_quest() && !task.completed));
            let retired = before - state.tasks.len();
            state.tasks.extend(created.iter().cloned());
            state.daily_assignments.insert(owner_id, today);
            Ok(retired)
        })?;
        Ok((retired, created))
    }

    //=====================================================================================
    // Views
    //=====================================================================================

    pub fn query(&self, owner_id: Uuid, view: TaskView, clock: &dyn Clock) -> Vec<Task> {
        let now = clock.now();
        self.state
            .tasks
            .iter()
            .filter(|task| task.owner_id == owner_id && view.matches(task, now, clock))
            .cloned()
            .collect()
    }

    pub fn all(&self, owner_id: Uuid, clock: &dyn Clock) -> Vec<Task> {
        self.query(owner_id, TaskView::All, clock)
    }

    pub fn pending(&self, owner_id: Uuid, clock: &dyn Clock) -> Vec<Task> {
        self.query(owner_id, TaskView::Pending, clock)
    }

    pub fn expired(&self, owner_id: Uuid, clock: &dyn Clock) -> Vec<Task> {
        self.query(owner_id, TaskView::Expired, clock)
    }

    pub fn completed(&self, owner_id: Uuid, clock: &dyn Clock) -> Vec<Task> {
        self.query(owner_id, TaskView::Completed, clock)
    }

    pub fn due_today(&self, owner_id: Uuid, clock: &dyn Clock) -> Vec<Task> {
        self.query(owner_id, TaskView::DueToday, clock)
    }

    pub fn active_daily_quests(&self, owner_id: Uuid, clock: &dyn Clock) -> Vec<Task> {
        self.query(owner_id, TaskView::ActiveDailyQuests, clock)
    }
}
