//! High score leaderboards
//!
//! One table per mode × difficulty, each keeping the top 10 scores.
//! Persisted through the storage collaborator.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::persistence::{self, Storage};
use crate::sim::{Difficulty, GameMode};

/// Maximum number of high scores to keep per table
pub const MAX_HIGH_SCORES: usize = 10;

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    /// Final score
    pub score: u64,
    /// Unix timestamp (ms) when achieved
    pub timestamp: u64,
}

/// All leaderboards, keyed `"<mode>_<difficulty>"`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighScores {
    pub tables: BTreeMap<String, Vec<HighScoreEntry>>,
}

impl HighScores {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "blockfit_highscores";

    /// Create empty leaderboards
    pub fn new() -> Self {
        Self::default()
    }

    fn key(mode: GameMode, difficulty: Difficulty) -> String {
        format!("{}_{}", mode.as_str(), difficulty.as_str())
    }

    /// Entries for one table, best first
    pub fn entries(&self, mode: GameMode, difficulty: Difficulty) -> &[HighScoreEntry] {
        self.tables
            .get(&Self::key(mode, difficulty))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Best score for a table (0 when empty)
    pub fn best(&self, mode: GameMode, difficulty: Difficulty) -> u64 {
        self.entries(mode, difficulty)
            .first()
            .map(|e| e.score)
            .unwrap_or(0)
    }

    /// Get the rank a score would achieve (1-indexed, None if doesn't qualify)
    pub fn potential_rank(&self, mode: GameMode, difficulty: Difficulty, score: u64) -> Option<usize> {
        if score == 0 {
            return None;
        }
        let entries = self.entries(mode, difficulty);
        match entries.iter().position(|e| score > e.score) {
            Some(i) => Some(i + 1),
            None if entries.len() < MAX_HIGH_SCORES => Some(entries.len() + 1),
            None => None,
        }
    }

    /// Record a finished game's score.
    /// Returns true only when it strictly beats the table's previous best.
    pub fn submit(&mut self, mode: GameMode, difficulty: Difficulty, score: u64, timestamp: u64) -> bool {
        let is_new_best = score > self.best(mode, difficulty);

        if let Some(rank) = self.potential_rank(mode, difficulty, score) {
            let table = self.tables.entry(Self::key(mode, difficulty)).or_default();
            table.insert(rank - 1, HighScoreEntry { score, timestamp });
            table.truncate(MAX_HIGH_SCORES);
        }

        if is_new_best {
            log::info!(
                "New {} {} high score: {}",
                mode.as_str(),
                difficulty.as_str(),
                score
            );
        }
        is_new_best
    }

    /// Load from storage (defaults when missing or unreadable)
    pub fn load(store: &dyn Storage) -> Self {
        persistence::load(store, Self::STORAGE_KEY)
    }

    /// Save to storage
    pub fn save(&self, store: &mut dyn Storage) -> bool {
        persistence::save(store, Self::STORAGE_KEY, self)
    }
}
