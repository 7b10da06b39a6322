//! # Level/XP Progression
//!
//! The single implementation of the experience curve. Profile, results and
//! leaderboard displays all go through [`LevelProgress`] so they can never
//! disagree about a player's level.
//!
//! The cumulative XP needed to reach `level` is
//! `floor(sum_{i=1}^{level-1} floor(i + 300 * 2^(i/7)) / 4)`.

use serde::{Deserialize, Serialize};

/// Highest reachable level
pub const MAX_LEVEL: u32 = 99;

fn curve_points(i: u32) -> u64 {
    (f64::from(i) + 300.0 * 2f64.powf(f64::from(i) / 7.0)).floor() as u64
}

/// Cumulative XP required to reach `level`. Levels 0 and 1 need no XP.
pub fn xp_for_level(level: u32) -> u64 {
    let points: u64 = (1..level).map(curve_points).sum();
    points / 4
}

/// Largest level whose threshold does not exceed `xp`, capped at [`MAX_LEVEL`]
pub fn level_for_xp(xp: u64) -> u32 {
    let mut level = 1;
    let mut points = 0u64;
    while level < MAX_LEVEL {
        points += curve_points(level);
        if points / 4 > xp {
            break;
        }
        level += 1;
    }
    level
}

/// Position of a player inside their current level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelProgress {
    pub level: u32,
    pub xp: u64,
    /// XP earned since reaching `level`
    pub xp_into_level: u64,
    /// XP span between `level` and the next one; zero at the cap
    pub xp_for_next_level: u64,
    /// 0.0 to 100.0
    pub percent: f64,
}

impl LevelProgress {
    pub fn from_xp(xp: u64) -> Self {
        let level = level_for_xp(xp);
        let floor = xp_for_level(level);
        let xp_into_level = xp - floor;

        if level >= MAX_LEVEL {
            return Self {
                level,
                xp,
                xp_into_level,
                xp_for_next_level: 0,
                percent: 100.0,
            };
        }

        let xp_for_next_level = xp_for_level(level + 1) - floor;
        let percent = xp_into_level as f64 / xp_for_next_level as f64 * 100.0;
        Self {
            level,
            xp,
            xp_into_level,
            xp_for_next_level,
            percent,
        }
    }

    pub fn is_max_level(&self) -> bool {
        self.level >= MAX_LEVEL
    }

    /// One-line summary, e.g. `Level 3 - 91 / 101 XP to level 4`
    pub fn summary(&self) -> String {
        if self.is_max_level() {
            format!("Level {} - {} XP", self.level, self.xp)
        } else {
            format!(
                "Level {} - {} / {} XP to level {}",
                self.level,
                self.xp_into_level,
                self.xp_for_next_level,
                self.level + 1
            )
        }
    }
}
