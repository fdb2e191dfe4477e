//! Adventure progress
//!
//! Adventure levels are numbered from 1. Each level has one objective; a
//! level unlocks once the previous one has been cleared.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::persistence::{self, Storage};

/// What a level asks of the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "target")]
pub enum Objective {
    ReachScore(u64),
    ClearLines(u32),
    ReachCombo(u32),
}

impl Objective {
    pub fn is_met(&self, score: u64, lines_cleared: u32, max_combo: u32) -> bool {
        match *self {
            Objective::ReachScore(target) => score >= target,
            Objective::ClearLines(target) => lines_cleared >= target,
            Objective::ReachCombo(target) => max_combo >= target,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Objective::ReachScore(n) => format!("Score {n} points"),
            Objective::ClearLines(n) => format!("Clear {n} lines"),
            Objective::ReachCombo(n) => format!("Reach a {n}x combo"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdventureLevel {
    pub level: u32,
    pub objective: Objective,
}

impl AdventureLevel {
    /// Built-in objective for a level; cycles score, lines, combo with rising targets
    pub fn new(level: u32) -> Self {
        let level = level.max(1);
        let tier = (level - 1) / 3;
        let objective = match (level - 1) % 3 {
            0 => Objective::ReachScore(500 + 500 * tier as u64),
            1 => Objective::ClearLines(5 + 3 * tier),
            _ => Objective::ReachCombo(2 + tier),
        };
        Self { level, objective }
    }
}

/// Persisted adventure record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Progress {
    pub cleared: BTreeSet<u32>,
    pub best_scores: BTreeMap<u32, u64>,
}

impl Progress {
    pub const STORAGE_KEY: &'static str = "blockfit_progress";

    pub fn load(store: &dyn Storage) -> Self {
        persistence::load(store, Self::STORAGE_KEY)
    }

    pub fn save(&self, store: &mut dyn Storage) -> bool {
        persistence::save(store, Self::STORAGE_KEY, self)
    }

    /// Highest level the player may start
    pub fn unlocked_level(&self) -> u32 {
        self.cleared.iter().next_back().map(|l| l + 1).unwrap_or(1)
    }

    pub fn is_unlocked(&self, level: u32) -> bool {
        level >= 1 && level <= self.unlocked_level()
    }

    pub fn is_cleared(&self, level: u32) -> bool {
        self.cleared.contains(&level)
    }

    /// Record a finished attempt; returns true when the level was newly cleared
    pub fn record(&mut self, level: u32, score: u64, objective_met: bool) -> bool {
        let best = self.best_scores.entry(level).or_insert(0);
        *best = (*best).max(score);
        if objective_met && self.cleared.insert(level) {
            log::info!("Adventure level {} cleared", level);
            return true;
        }
        false
    }
}
