//! crates/questlog_core/src/views.rs
//!
//! Summaries built on top of the task views: the dashboard and the completion history.

use crate::clock::Clock;
use crate::domain::{Identity, Task};
use crate::progression::{level_progress, LevelProgress};
use crate::tasks::TaskLedger;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Sum of the rewards, saturating at `u64::MAX`.
fn total_xp<'a>(tasks: impl Iterator<Item = &'a Task>) -> u64 {
    tasks.fold(0, |sum, task| sum.saturating_add(task.xp_reward))
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub progress: LevelProgress,
    pub due_today: Vec<Task>,
    /// XP still on the table from today's incomplete tasks.
    pub xp_available_today: u64,
    pub expired: Vec<Task>,
    /// XP forfeited by tasks that ran past their deadline.
    pub xp_lost: u64,
    pub active_quests: Vec<Task>,
}

impl Dashboard {
    pub fn build(identity: &Identity, tasks: &TaskLedger, clock: &dyn Clock) -> Self {
        let due_today = tasks.due_today(identity.id, clock);
        let expired = tasks.expired(identity.id, clock);
        let xp_available_today = total_xp(due_today.iter().filter(|task| !task.completed));
        let xp_lost = total_xp(expired.iter());

        Self {
            progress: level_progress(identity),
            due_today,
            xp_available_today,
            expired,
            xp_lost,
            active_quests: tasks.active_daily_quests(identity.id, clock),
        }
    }
}

/// Completed tasks on one local calendar date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryDay {
    pub date: NaiveDate,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    /// Newest date first, grouped by each task's deadline.
    pub days: Vec<HistoryDay>,
    pub total_xp_earned: u64,
}

impl History {
    pub fn build(owner: &Identity, tasks: &TaskLedger, clock: &dyn Clock) -> Self {
        let completed = tasks.completed(owner.id, clock);
        let total_xp_earned = total_xp(completed.iter());

        let mut grouped: BTreeMap<NaiveDate, Vec<Task>> = BTreeMap::new();
        for task in completed {
            grouped
                .entry(clock.to_local_date(task.deadline))
                .or_default()
                .push(task);
        }

        Self {
            days: grouped
                .into_iter()
                .rev()
                .map(|(date, tasks)| HistoryDay { date, tasks })
                .collect(),
            total_xp_earned,
        }
    }
}
