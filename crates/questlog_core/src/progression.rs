//! crates/questlog_core/src/progression.rs
//!
//! The progression function. Level-up math and quest scaling both go through
//! `xp_to_reach_level`, so progress bars always match the real thresholds.

use crate::domain::Identity;

const BASE_LEVEL_XP: f64 = 100.0;
const LEVEL_GROWTH: f64 = 1.5;

/// XP needed to advance from `level` to `level + 1`: `floor(100 × 1.5^level)`.
pub fn xp_to_reach_level(level: u32) -> u64 {
    let exponent = i32::try_from(level).unwrap_or(i32::MAX);
    // `as` saturates, so very high levels clamp to u64::MAX instead of wrapping.
    (BASE_LEVEL_XP * LEVEL_GROWTH.powi(exponent)).floor() as u64
}

/// Adds `amount` to (`level`, `xp`) and converts every full threshold into a level.
pub fn apply_xp(level: u32, xp: u64, amount: u64) -> (u32, u64) {
    let mut level = level;
    let mut remaining = xp.saturating_add(amount);
    while remaining >= xp_to_reach_level(level) {
        remaining -= xp_to_reach_level(level);
        level = level.saturating_add(1);
        if level == u32::MAX {
            break;
        }
    }
    (level, remaining)
}

/// How far an identity is through its current level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelProgress {
    pub level: u32,
    pub xp: u64,
    pub next_level_xp: u64,
    /// Completion of the current level, 0 to 100.
    pub percent: f64,
}

pub fn level_progress(identity: &Identity) -> LevelProgress {
    let next_level_xp = xp_to_reach_level(identity.level);
    let percent = (identity.xp as f64 / next_level_xp as f64 * 100.0).min(100.0);
    LevelProgress {
        level: identity.level,
        xp: identity.xp,
        next_level_xp,
        percent,
    }
}
