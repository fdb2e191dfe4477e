//! Scoring engine
//!
//! Turns line-clear events into points and coins, tracks the combo streak and
//! cumulative totals. Score only grows, except through `set_score` (undo) and
//! `spend` (endless-mode power-up costs).

use serde::{Deserialize, Serialize};

use super::catalog::Difficulty;
use super::grid::CompletedLines;
use crate::consts::*;
use crate::highscores::HighScores;

/// Game mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum GameMode {
    #[default]
    Classic,
    Endless,
    Daily,
    Adventure,
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Classic => "classic",
            GameMode::Endless => "endless",
            GameMode::Daily => "daily",
            GameMode::Adventure => "adventure",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "classic" | "normal" => Some(GameMode::Classic),
            "endless" => Some(GameMode::Endless),
            "daily" => Some(GameMode::Daily),
            "adventure" => Some(GameMode::Adventure),
            _ => None,
        }
    }

    /// Score scaling on top of the difficulty multiplier
    pub fn score_scale(&self) -> f64 {
        match self {
            GameMode::Classic => 1.0,
            GameMode::Endless => 1.1,
            GameMode::Daily => 1.2,
            GameMode::Adventure => 0.9,
        }
    }

    /// Coin scaling applied after the combo bonus
    pub fn coin_scale(&self) -> f64 {
        match self {
            GameMode::Daily => 1.5,
            GameMode::Endless => 0.8,
            GameMode::Classic | GameMode::Adventure => 1.0,
        }
    }
}

/// Combined multiplier for a difficulty/mode pair
pub fn mode_multiplier(difficulty: Difficulty, mode: GameMode) -> f64 {
    let base = match difficulty {
        Difficulty::Easy => 1.0,
        Difficulty::Hard => 1.5,
    };
    base * mode.score_scale()
}

/// Result of one placement's line clears
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearReward {
    pub score: u64,
    pub coins: u64,
    /// Combo after this event (0 = streak broken)
    pub combo: u32,
}

/// Running score state for one game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEngine {
    difficulty: Difficulty,
    mode: GameMode,
    multiplier: f64,
    score: u64,
    coins: u64,
    lines_cleared: u32,
    combo: u32,
    max_combo: u32,
}

impl ScoreEngine {
    pub fn new(difficulty: Difficulty, mode: GameMode) -> Self {
        Self {
            difficulty,
            mode,
            multiplier: mode_multiplier(difficulty, mode),
            score: 0,
            coins: 0,
            lines_cleared: 0,
            combo: 0,
            max_combo: 0,
        }
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    /// Coins earned this game
    pub fn coins(&self) -> u64 {
        self.coins
    }

    pub fn lines_cleared(&self) -> u32 {
        self.lines_cleared
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn max_combo(&self) -> u32 {
        self.max_combo
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Change mode and/or difficulty; recomputes the multiplier
    pub fn set_mode(&mut self, difficulty: Difficulty, mode: GameMode) {
        self.difficulty = difficulty;
        self.mode = mode;
        self.multiplier = mode_multiplier(difficulty, mode);
    }

    /// Score a placement's clears
    pub fn on_lines_cleared(&mut self, lines: &CompletedLines) -> ClearReward {
        self.on_lines_cleared_scaled(lines, 1.0)
    }

    /// Score a placement's clears with an extra multiplier (daily challenges)
    pub fn on_lines_cleared_scaled(&mut self, lines: &CompletedLines, extra: f64) -> ClearReward {
        let total = lines.total();
        if total == 0 {
            self.combo = 0;
            return ClearReward::default();
        }

        let mut base = total as f64 * BASE_LINE_SCORE;
        if total > 1 {
            base *= 1.0 + MULTI_LINE_BONUS * (total - 1) as f64;
        }
        if lines.is_cross() {
            base *= CROSS_CLEAR_BONUS;
        }

        self.combo += 1;
        self.max_combo = self.max_combo.max(self.combo);
        let combo_multiplier = 1.0 + COMBO_STEP * self.combo as f64;

        let score = (base * self.multiplier * combo_multiplier * extra).floor() as u64;

        let mut coins = (score as f64 * COINS_PER_SCORE).floor() as u64;
        if self.combo >= COMBO_COIN_THRESHOLD {
            coins += COINS_PER_COMBO_LEVEL * self.combo as u64;
        }
        let coins = (coins as f64 * self.mode.coin_scale()).floor() as u64;

        self.score += score;
        self.coins += coins;
        self.lines_cleared += total as u32;

        log::debug!(
            "Cleared {} line(s): +{} points, +{} coins, combo {}",
            total,
            score,
            coins,
            self.combo
        );

        ClearReward {
            score,
            coins,
            combo: self.combo,
        }
    }

    /// Restore a snapshot value (undo); may lower the score
    pub fn set_score(&mut self, value: u64) {
        self.score = value;
    }

    /// Restore combo, lines and earned coins alongside score (undo)
    pub fn restore(&mut self, score: u64, combo: u32, lines_cleared: u32, coins: u64) {
        self.score = score;
        self.combo = combo;
        self.lines_cleared = lines_cleared;
        self.coins = coins;
    }

    /// Deduct a score-priced cost; false when the score is too low
    pub fn spend(&mut self, amount: u64) -> bool {
        if self.score < amount {
            return false;
        }
        self.score -= amount;
        true
    }

    /// Refund a previously spent amount
    pub fn refund(&mut self, amount: u64) {
        self.score += amount;
    }

    /// Submit to the per mode/difficulty table; true only for a strictly higher score
    pub fn save_high_score(&self, scores: &mut HighScores, timestamp: u64) -> bool {
        scores.submit(self.mode, self.difficulty, self.score, timestamp)
    }
}
