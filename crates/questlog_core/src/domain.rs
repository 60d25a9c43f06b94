//! crates/questlog_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any storage or serialization format.

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;
use uuid::Uuid;

/// A registered account and its progression state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub username: String,
    /// Output of the configured `SecretHasher`, never the raw secret.
    pub secret_hash: String,
    pub level: u32,
    /// XP collected within the current level. Always below the next threshold.
    pub xp: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// The fixed set of exercise archetypes a daily quest can be built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExerciseType {
    Pushups,
    Plank,
    Run,
}

impl ExerciseType {
    pub const ALL: [ExerciseType; 3] = [ExerciseType::Pushups, ExerciseType::Plank, ExerciseType::Run];

    /// The tag used when the quest marker is persisted.
    pub fn tag(&self) -> &'static str {
        match self {
            ExerciseType::Pushups => "pushups",
            ExerciseType::Plank => "plank",
            ExerciseType::Run => "run",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|exercise| exercise.tag() == tag)
    }
}

/// Marks a task as a generated daily quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyQuest {
    pub exercise: ExerciseType,
    pub required_amount: u32,
}

/// A unit of work owned by exactly one identity, manual or generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub deadline: DateTime<Utc>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub xp_reward: u64,
    pub daily_quest: Option<DailyQuest>,
}

impl Task {
    pub fn is_daily_quest(&self) -> bool {
        self.daily_quest.is_some()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.deadline < now
    }
}

/// The caller-supplied fields of a task that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub deadline: DateTime<Utc>,
    pub xp_reward: u64,
    pub daily_quest: Option<DailyQuest>,
}

/// A partial edit. Fields left as `None` keep their current value.
///
/// Has no `completed` field. Completion only happens through `Engine::complete_task`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    pub title: Option<String>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub deadline: Option<DateTime<Utc>>,
    pub xp_reward: Option<u64>,
}

/// Everything the task ledger persists as one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskSnapshot {
    pub tasks: Vec<Task>,
    /// Last calendar date daily quests were generated, per identity.
    pub daily_assignments: BTreeMap<Uuid, NaiveDate>,
}

/// Level and XP of an identity before and after one XP award.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelChange {
    pub previous_level: u32,
    pub new_level: u32,
    pub xp: u64,
}

impl LevelChange {
    pub fn levels_gained(&self) -> u32 {
        self.new_level - self.previous_level
    }

    pub fn leveled_up(&self) -> bool {
        self.new_level > self.previous_level
    }
}
