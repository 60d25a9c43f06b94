//! services/app/src/adapters/json_store.rs
//!
//! This module contains the snapshot storage adapter, the concrete implementation
//! of the `IdentityRepository` and `TaskRepository` ports from the `core` crate.
//! Each port maps to one named JSON document inside the storage directory.

use chrono::{DateTime, NaiveDate, Utc};
use questlog_core::domain::{DailyQuest, ExerciseType, Identity, Priority, Task, TaskSnapshot};
use questlog_core::ports::{IdentityRepository, PortError, PortResult, TaskRepository};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;
use uuid::Uuid;

const IDENTITY_SNAPSHOT: &str = "users.json";
const TASK_SNAPSHOT: &str = "tasks-storage.json";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A file-backed adapter that implements both repository ports.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Creates the storage directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Reads one snapshot. A missing file is an empty snapshot.
    fn read<T: DeserializeOwned + Default>(&self, name: &str) -> PortResult<T> {
        let path = self.dir.join(name);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(T::default()),
            Err(e) => return Err(PortError::Unexpected(e.to_string())),
        };
        serde_json::from_str(&contents)
            .map_err(|e| PortError::Unexpected(format!("{} is malformed: {}", path.display(), e)))
    }

    /// Replaces one snapshot, writing to a sibling file first and renaming over it.
    fn write<T: Serialize>(&self, name: &str, value: &T) -> PortResult<()> {
        let path = self.dir.join(name);
        let staging = path.with_extension("json.tmp");
        let json =
            serde_json::to_string_pretty(value).map_err(|e| PortError::Unexpected(e.to_string()))?;
        fs::write(&staging, json).map_err(|e| PortError::Unexpected(e.to_string()))?;
        fs::rename(&staging, &path).map_err(|e| PortError::Unexpected(e.to_string()))?;
        debug!("Wrote snapshot {}.", path.display());
        Ok(())
    }
}

//=========================================================================================
// Serialized Record Structs
//=========================================================================================

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentityRecord {
    id: Uuid,
    username: String,
    secret_hash: String,
    level: u32,
    xp: u64,
    created_at: DateTime<Utc>,
}
impl IdentityRecord {
    fn from_domain(identity: &Identity) -> Self {
        Self {
            id: identity.id,
            username: identity.username.clone(),
            secret_hash: identity.secret_hash.clone(),
            level: identity.level,
            xp: identity.xp,
            created_at: identity.created_at,
        }
    }

    fn to_domain(self) -> Identity {
        Identity {
            id: self.id,
            username: self.username,
            secret_hash: self.secret_hash,
            level: self.level,
            xp: self.xp,
            created_at: self.created_at,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy)]
#[serde(rename_all = "lowercase")]
enum PriorityRecord {
    Low,
    Medium,
    High,
}
impl From<Priority> for PriorityRecord {
    fn from(priority: Priority) -> Self {
        match priority {
            Priority::Low => PriorityRecord::Low,
            Priority::Medium => PriorityRecord::Medium,
            Priority::High => PriorityRecord::High,
        }
    }
}
impl From<PriorityRecord> for Priority {
    fn from(record: PriorityRecord) -> Self {
        match record {
            PriorityRecord::Low => Priority::Low,
            PriorityRecord::Medium => Priority::Medium,
            PriorityRecord::High => Priority::High,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskRecord {
    id: Uuid,
    user_id: Uuid,
    title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    deadline: DateTime<Utc>,
    completed: bool,
    created_at: DateTime<Utc>,
    xp_reward: u64,
    priority: PriorityRecord,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    is_daily_quest: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exercise_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    required_count: Option<u32>,
}
impl TaskRecord {
    fn from_domain(task: &Task) -> Self {
        Self {
            id: task.id,
            user_id: task.owner_id,
            title: task.title.clone(),
            description: task.description.clone(),
            deadline: task.deadline,
            completed: task.completed,
            created_at: task.created_at,
            xp_reward: task.xp_reward,
            priority: task.priority.into(),
            is_daily_quest: task.daily_quest.is_some(),
            exercise_type: task.daily_quest.map(|quest| quest.exercise.tag().to_string()),
            required_count: task.daily_quest.map(|quest| quest.required_amount),
        }
    }

    fn to_domain(self) -> PortResult<Task> {
        let daily_quest = if self.is_daily_quest {
            let tag = self.exercise_type.as_deref().unwrap_or_default();
            let exercise = ExerciseType::from_tag(tag).ok_or_else(|| {
                PortError::Unexpected(format!("Task {} has unknown exercise type '{}'", self.id, tag))
            })?;
            Some(DailyQuest {
                exercise,
                required_amount: self.required_count.unwrap_or(1),
            })
        } else {
            None
        };

        Ok(Task {
            id: self.id,
            owner_id: self.user_id,
            title: self.title,
            description: self.description,
            priority: self.priority.into(),
            deadline: self.deadline,
            completed: self.completed,
            created_at: self.created_at,
            xp_reward: self.xp_reward,
            daily_quest,
        })
    }
}

#[derive(Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct TaskSnapshotRecord {
    tasks: Vec<TaskRecord>,
    #[serde(default)]
    daily_assignments: BTreeMap<Uuid, NaiveDate>,
}

//=========================================================================================
// Port Implementations
//=========================================================================================

impl IdentityRepository for JsonFileStore {
    fn load_identities(&self) -> PortResult<Vec<Identity>> {
        let records: Vec<IdentityRecord> = self.read(IDENTITY_SNAPSHOT)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    fn save_identities(&self, identities: &[Identity]) -> PortResult<()> {
        let records: Vec<IdentityRecord> = identities.iter().map(IdentityRecord::from_domain).collect();
        self.write(IDENTITY_SNAPSHOT, &records)
    }
}

impl TaskRepository for JsonFileStore {
    fn load_tasks(&self) -> PortResult<TaskSnapshot> {
        let record: TaskSnapshotRecord = self.read(TASK_SNAPSHOT)?;
        let tasks = record
            .tasks
            .into_iter()
            .map(|r| r.to_domain())
            .collect::<PortResult<Vec<_>>>()?;
        Ok(TaskSnapshot {
            tasks,
            daily_assignments: record.daily_assignments,
        })
    }

    fn save_tasks(&self, snapshot: &TaskSnapshot) -> PortResult<()> {
        let record = TaskSnapshotRecord {
            tasks: snapshot.tasks.iter().map(TaskRecord::from_domain).collect(),
            daily_assignments: snapshot.daily_assignments.clone(),
        };
        self.write(TASK_SNAPSHOT, &record)
    }
}
