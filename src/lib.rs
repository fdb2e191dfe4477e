//! Blockfit - A block-placement puzzle on a 10x10 grid
//!
//! Core modules:
//! - `sim`: Deterministic gameplay (grid, shapes, scoring, power-ups, daily challenges)
//! - `persistence`: Key-value storage collaborator (LocalStorage on web, memory elsewhere)
//! - `platform`: Browser/native clock and calendar
//! - `settings`, `highscores`, `stats`, `progress`: Persisted player records

pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod progress;
pub mod settings;
pub mod sim;
pub mod stats;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use highscores::HighScores;
pub use persistence::{MemoryStorage, Storage};
pub use settings::Settings;
pub use sim::{GameSession, SessionConfig};

/// Game configuration constants
pub mod consts {
    /// Board dimensions (square)
    pub const GRID_SIZE: usize = 10;
    /// Shapes offered per tray batch
    pub const TRAY_SIZE: usize = 3;

    /// Points per cleared line before multipliers
    pub const BASE_LINE_SCORE: f64 = 100.0;
    /// Extra multiplier per line beyond the first
    pub const MULTI_LINE_BONUS: f64 = 0.3;
    /// Rows and columns cleared by the same placement
    pub const CROSS_CLEAR_BONUS: f64 = 1.5;
    /// Combo multiplier step (applied to the post-increment combo)
    pub const COMBO_STEP: f64 = 0.1;
    /// Coins earned per point scored
    pub const COINS_PER_SCORE: f64 = 0.1;
    /// Combo level from which bonus coins are paid
    pub const COMBO_COIN_THRESHOLD: u32 = 3;
    /// Bonus coins per combo level once past the threshold
    pub const COINS_PER_COMBO_LEVEL: u64 = 2;

    /// Colour ids handed out by the generator (1..=PALETTE_SIZE)
    pub const PALETTE_SIZE: u32 = 8;
    /// Draws remembered for repeat avoidance
    pub const RECENT_SHAPE_WINDOW: usize = 10;
    /// Resample attempts before a repeat is accepted
    pub const MAX_RESAMPLE_ATTEMPTS: u32 = 8;

    /// Undo snapshots kept (oldest evicted first)
    pub const HISTORY_DEPTH: usize = 5;
}
