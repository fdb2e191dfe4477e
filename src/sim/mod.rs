//! Deterministic gameplay module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time is passed in (`now_ms`), never read
//! - Seeded RNG when a seed is given
//! - Storage only through the injected `Storage` collaborator
//! - No rendering or platform dependencies

pub mod catalog;
pub mod daily;
pub mod events;
pub mod generator;
pub mod grid;
pub mod history;
pub mod powerups;
pub mod scoring;
pub mod session;
pub mod shape;
pub mod tray;

pub use catalog::{Catalog, Difficulty};
pub use daily::{ChallengeKind, ChallengeState, ChallengeStatus, DailyChallenge, DailyError, DailyRewards};
pub use events::{EventHooks, GameEvent};
pub use generator::{Lcg, ShapeGenerator};
pub use grid::{Cell, CompletedLines, EMPTY, Grid, LineKind, PlaceError};
pub use history::{History, Snapshot};
pub use powerups::{Activation, Effect, Inventory, Payment, PowerUpClass, PowerUpError, PowerUpKind, PowerUpSystem};
pub use scoring::{ClearReward, GameMode, ScoreEngine};
pub use session::{DailyOutcome, GamePhase, GameSession, GameSummary, PlacementOutcome, SessionConfig, best_origin};
pub use shape::{Pattern, PatternError, Shape};
pub use tray::Tray;
