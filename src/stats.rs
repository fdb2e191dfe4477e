//! Lifetime statistics
//!
//! Totals, per-mode figures, personal records and milestones all live in one
//! record. A finished game is merged in memory and written back with a
//! single `save`, so no part of the update can overwrite another.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::persistence::{self, Storage};
use crate::sim::{Difficulty, GameMode};

/// One finished game, as reported by the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub mode: GameMode,
    pub difficulty: Difficulty,
    pub score: u64,
    pub lines_cleared: u32,
    pub max_combo: u32,
    pub placements: u32,
    pub power_ups_used: u32,
    pub coins_earned: u64,
    pub duration_ms: u64,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeStats {
    pub games: u32,
    pub total_score: u64,
    pub best_score: u64,
    pub best_combo: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalRecords {
    pub best_score: u64,
    pub most_lines: u32,
    pub best_combo: u32,
    pub longest_game_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Milestone {
    FirstGame,
    TenGames,
    HundredGames,
    Score1k,
    Score10k,
    Lines100,
    Lines1k,
    Combo5,
    Combo10,
}

impl Milestone {
    pub const ALL: [Milestone; 9] = [
        Milestone::FirstGame,
        Milestone::TenGames,
        Milestone::HundredGames,
        Milestone::Score1k,
        Milestone::Score10k,
        Milestone::Lines100,
        Milestone::Lines1k,
        Milestone::Combo5,
        Milestone::Combo10,
    ];

    fn reached(&self, stats: &Statistics) -> bool {
        match self {
            Milestone::FirstGame => stats.games_played >= 1,
            Milestone::TenGames => stats.games_played >= 10,
            Milestone::HundredGames => stats.games_played >= 100,
            Milestone::Score1k => stats.records.best_score >= 1_000,
            Milestone::Score10k => stats.records.best_score >= 10_000,
            Milestone::Lines100 => stats.total_lines >= 100,
            Milestone::Lines1k => stats.total_lines >= 1_000,
            Milestone::Combo5 => stats.records.best_combo >= 5,
            Milestone::Combo10 => stats.records.best_combo >= 10,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Statistics {
    pub games_played: u32,
    pub total_score: u64,
    pub total_lines: u64,
    pub total_placements: u64,
    pub total_play_ms: u64,
    pub power_ups_used: u64,
    pub coins_earned: u64,
    pub per_mode: BTreeMap<GameMode, ModeStats>,
    pub records: PersonalRecords,
    pub milestones: BTreeSet<Milestone>,
    pub last_played: u64,
}

impl Statistics {
    pub const STORAGE_KEY: &'static str = "blockfit_stats";

    pub fn load(store: &dyn Storage) -> Self {
        persistence::load(store, Self::STORAGE_KEY)
    }

    pub fn save(&self, store: &mut dyn Storage) -> bool {
        persistence::save(store, Self::STORAGE_KEY, self)
    }

    pub fn mode(&self, mode: GameMode) -> Option<&ModeStats> {
        self.per_mode.get(&mode)
    }

    pub fn average_score(&self) -> f64 {
        if self.games_played == 0 {
            0.0
        } else {
            self.total_score as f64 / self.games_played as f64
        }
    }

    /// Merge a finished game; returns milestones unlocked by it
    pub fn record_game(&mut self, game: &GameRecord) -> Vec<Milestone> {
        self.games_played += 1;
        self.total_score += game.score;
        self.total_lines += game.lines_cleared as u64;
        self.total_placements += game.placements as u64;
        self.total_play_ms += game.duration_ms;
        self.power_ups_used += game.power_ups_used as u64;
        self.coins_earned += game.coins_earned;
        self.last_played = self.last_played.max(game.timestamp);

        let mode = self.per_mode.entry(game.mode).or_default();
        mode.games += 1;
        mode.total_score += game.score;
        mode.best_score = mode.best_score.max(game.score);
        mode.best_combo = mode.best_combo.max(game.max_combo);

        let records = &mut self.records;
        records.best_score = records.best_score.max(game.score);
        records.most_lines = records.most_lines.max(game.lines_cleared);
        records.best_combo = records.best_combo.max(game.max_combo);
        records.longest_game_ms = records.longest_game_ms.max(game.duration_ms);

        let unlocked: Vec<Milestone> = Milestone::ALL
            .into_iter()
            .filter(|m| !self.milestones.contains(m) && m.reached(self))
            .collect();
        for m in &unlocked {
            log::info!("Milestone reached: {:?}", m);
            self.milestones.insert(*m);
        }
        unlocked
    }
}

/// Load, merge one game and write back once
pub fn record_game(store: &mut dyn Storage, game: &GameRecord) -> (Statistics, Vec<Milestone>) {
    let mut stats = Statistics::load(store);
    let unlocked = stats.record_game(game);
    stats.save(store);
    (stats, unlocked)
}
