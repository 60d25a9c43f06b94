//! services/app/src/validation.rs
//!
//! Boundary policy for form input. The ledgers accept whatever they are given; these
//! checks run in the facade before anything reaches them.

use chrono::{DateTime, Utc};
use questlog_core::{LedgerError, Priority, TaskDraft, TaskUpdate};
use std::ops::RangeInclusive;

/// XP a user may put on a manual task.
pub const TASK_XP_RANGE: RangeInclusive<u64> = 10..=100;

#[derive(Debug, Clone)]
pub struct SignupForm {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

/// The fields a user can set when adding or editing a task.
#[derive(Debug, Clone)]
pub struct TaskForm {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub deadline: DateTime<Utc>,
    pub xp_reward: u64,
}

fn invalid(message: &str) -> LedgerError {
    LedgerError::ValidationFailed(message.to_string())
}

pub fn validate_signup(form: &SignupForm, min_password_length: usize) -> Result<(), LedgerError> {
    if form.username.trim().is_empty()
        || form.password.trim().is_empty()
        || form.confirm_password.trim().is_empty()
    {
        return Err(invalid("Please fill in all fields"));
    }
    if form.password != form.confirm_password {
        return Err(invalid("Passwords do not match"));
    }
    if form.password.chars().count() < min_password_length {
        return Err(LedgerError::ValidationFailed(format!(
            "Password must be at least {} characters",
            min_password_length
        )));
    }
    Ok(())
}

pub fn validate_login(username: &str, password: &str) -> Result<(), LedgerError> {
    if username.trim().is_empty() || password.trim().is_empty() {
        return Err(invalid("Please enter username and password"));
    }
    Ok(())
}

/// Checks a task form against `now` and normalizes it: the title is trimmed and a
/// blank description becomes `None`.
pub fn validate_task_form(form: TaskForm, now: DateTime<Utc>) -> Result<TaskForm, LedgerError> {
    let title = form.title.trim();
    if title.is_empty() {
        return Err(invalid("Task title cannot be empty"));
    }
    if form.deadline <= now {
        return Err(invalid("Deadline must be set in the future"));
    }
    if !TASK_XP_RANGE.contains(&form.xp_reward) {
        return Err(LedgerError::ValidationFailed(format!(
            "XP reward must be between {} and {}",
            TASK_XP_RANGE.start(),
            TASK_XP_RANGE.end()
        )));
    }

    Ok(TaskForm {
        title: title.to_string(),
        description: form
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
        ..form
    })
}

impl TaskForm {
    pub fn into_draft(self) -> TaskDraft {
        TaskDraft {
            title: self.title,
            description: self.description,
            priority: self.priority,
            deadline: self.deadline,
            xp_reward: self.xp_reward,
            daily_quest: None,
        }
    }

    pub fn into_update(self) -> TaskUpdate {
        TaskUpdate {
            title: Some(self.title),
            description: Some(self.description),
            priority: Some(self.priority),
            deadline: Some(self.deadline),
            xp_reward: Some(self.xp_reward),
        }
    }
}
