//! crates/questlog_core/src/quests.rs
//!
//! Daily quest generation. One quest per exercise archetype, scaled to the owner's
//! level, plus an occasional bonus task drawn from a fixed catalog.

use crate::clock::Clock;
use crate::domain::{DailyQuest, ExerciseType, Priority, TaskDraft};
use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;

//=========================================================================================
// Fixed Catalogs
//=========================================================================================

/// Per-exercise scaling constants.
#[derive(Debug, Clone, Copy)]
pub struct Archetype {
    pub exercise: ExerciseType,
    pub name: &'static str,
    pub base: f64,
    pub scale_per_level: f64,
    pub unit: &'static str,
}

pub const ARCHETYPES: [Archetype; 3] = [
    Archetype {
        exercise: ExerciseType::Pushups,
        name: "Push-ups",
        base: 10.0,
        scale_per_level: 2.0,
        unit: "reps",
    },
    Archetype {
        exercise: ExerciseType::Plank,
        name: "Plank Hold",
        base: 30.0,
        scale_per_level: 10.0,
        unit: "seconds",
    },
    Archetype {
        exercise: ExerciseType::Run,
        name: "Run",
        base: 1000.0,
        scale_per_level: 250.0,
        unit: "meters",
    },
];

/// A flavor task that may be handed out alongside the daily quests.
#[derive(Debug, Clone, Copy)]
pub struct BonusTask {
    pub title: &'static str,
    pub description: &'static str,
    pub xp_reward: u64,
}

pub const BONUS_CATALOG: [BonusTask; 5] = [
    BonusTask {
        title: "Hydration Hero",
        description: "Drink eight glasses of water before the day ends.",
        xp_reward: 15,
    },
    BonusTask {
        title: "Digital Sunset",
        description: "No screens for the last hour before bed.",
        xp_reward: 25,
    },
    BonusTask {
        title: "Kindness Quest",
        description: "Do one unprompted favour for someone today.",
        xp_reward: 20,
    },
    BonusTask {
        title: "Reset Your Space",
        description: "Spend fifteen minutes tidying your desk or room.",
        xp_reward: 15,
    },
    BonusTask {
        title: "Page Turner",
        description: "Read twenty pages of a book.",
        xp_reward: 20,
    },
];

//=========================================================================================
// Generator
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuestSettings {
    /// Chance, within [0, 1], that a bonus task is added to a day's quests.
    pub bonus_probability: f64,
    pub base_quest_xp: u64,
    pub level_xp_factor: u64,
}

impl Default for QuestSettings {
    fn default() -> Self {
        Self {
            bonus_probability: 0.10,
            base_quest_xp: 25,
            level_xp_factor: 5,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct QuestGenerator {
    settings: QuestSettings,
}

impl QuestGenerator {
    pub fn new(settings: QuestSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &QuestSettings {
        &self.settings
    }

    /// `max(1, floor(base + (level - 1) × scale))`. Levels below 1 scale as level 1.
    pub fn required_amount(archetype: &Archetype, level: u32) -> u32 {
        let steps = f64::from(level.max(1) - 1);
        let amount = (archetype.base + steps * archetype.scale_per_level).floor();
        (amount as u32).max(1)
    }

    pub fn quest_xp(&self, level: u32) -> u64 {
        self.settings
            .base_quest_xp
            .saturating_add(u64::from(level.max(1)).saturating_mul(self.settings.level_xp_factor))
    }

    /// The deterministic part of a day's generation: one quest per archetype.
    pub fn daily_quests(&self, level: u32, deadline: DateTime<Utc>) -> Vec<TaskDraft> {
        let xp_reward = self.quest_xp(level);
        ARCHETYPES
            .iter()
            .map(|archetype| {
                let required_amount = Self::required_amount(archetype, level);
                TaskDraft {
                    title: format!("Daily Quest: {}", archetype.name),
                    description: Some(format!(
                        "Complete {} {} of {} before midnight.",
                        required_amount,
                        archetype.unit,
                        archetype.name.to_lowercase()
                    )),
                    priority: Priority::High,
                    deadline,
                    xp_reward,
                    daily_quest: Some(DailyQuest {
                        exercise: archetype.exercise,
                        required_amount,
                    }),
                }
            })
            .collect()
    }

    /// Rolls for a bonus task and, on success, draws one uniformly from the catalog.
    pub fn bonus_task<R: Rng>(&self, deadline: DateTime<Utc>, rng: &mut R) -> Option<TaskDraft> {
        let probability = if self.settings.bonus_probability.is_nan() {
            0.0
        } else {
            self.settings.bonus_probability.clamp(0.0, 1.0)
        };
        if !rng.random_bool(probability) {
            return None;
        }

        let bonus = BONUS_CATALOG[rng.random_range(0..BONUS_CATALOG.len())];
        Some(TaskDraft {
            title: bonus.title.to_string(),
            description: Some(bonus.description.to_string()),
            priority: Priority::Medium,
            deadline,
            xp_reward: bonus.xp_reward,
            daily_quest: None,
        })
    }

    /// Everything handed out for `today`, due at the local midnight that ends it.
    pub fn generate<R: Rng>(
        &self,
        level: u32,
        today: NaiveDate,
        clock: &dyn Clock,
        rng: &mut R,
    ) -> Vec<TaskDraft> {
        let deadline = clock.midnight_after(today);
        let mut drafts = self.daily_quests(level, deadline);
        drafts.extend(self.bonus_task(deadline, rng));
        drafts
    }
}
