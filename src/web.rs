//! Browser bridge
//!
//! Thin `wasm_bindgen` facade over `GameSession` for the JavaScript scene
//! layer. Inputs are plain numbers and strings; state goes back as JSON.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::consts::{GRID_SIZE, TRAY_SIZE};
use crate::persistence::LocalStorage;
use crate::platform;
use crate::sim::{
    Cell, DailyChallenge, Difficulty, GameMode, GamePhase, GameSession, PowerUpKind, SessionConfig, Shape,
};

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        // Already initialized by an earlier module instance
        return;
    }
    log::info!("Blockfit starting...");
}

/// Everything the scene needs to draw a frame
#[derive(Serialize)]
struct View<'a> {
    grid: &'a [[Cell; GRID_SIZE]; GRID_SIZE],
    tray: &'a [Option<Shape>; TRAY_SIZE],
    score: u64,
    coins: u64,
    combo: u32,
    lines_cleared: u32,
    phase: GamePhase,
    pending: Option<PowerUpKind>,
    daily: Option<&'a DailyChallenge>,
    daily_multiplier: Option<f64>,
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn power_up(kind: &str) -> Result<PowerUpKind, JsValue> {
    PowerUpKind::from_str(kind).ok_or_else(|| JsValue::from_str("unknown_power_up"))
}

#[wasm_bindgen]
pub struct WebGame {
    session: GameSession,
}

impl WebGame {
    fn start(config: SessionConfig) -> Result<WebGame, JsValue> {
        let session = GameSession::new(config, Box::new(LocalStorage::new()), platform::now_ms())
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(WebGame { session })
    }
}

#[wasm_bindgen]
impl WebGame {
    #[wasm_bindgen(constructor)]
    pub fn new(mode: &str, difficulty: &str) -> Result<WebGame, JsValue> {
        let mode = GameMode::from_str(mode).unwrap_or_default();
        let difficulty = Difficulty::from_str(difficulty).unwrap_or_default();
        Self::start(SessionConfig::new(mode, difficulty))
    }

    /// Today's challenge; errors with a message when it was already completed
    pub fn daily(difficulty: &str) -> Result<WebGame, JsValue> {
        let difficulty = Difficulty::from_str(difficulty).unwrap_or_default();
        Self::start(SessionConfig::daily(platform::today(), difficulty))
    }

    pub fn adventure(level: u32, difficulty: &str) -> Result<WebGame, JsValue> {
        let difficulty = Difficulty::from_str(difficulty).unwrap_or_default();
        Self::start(SessionConfig::adventure(level, difficulty))
    }

    /// Place a tray shape; JSON `PlacementOutcome`, or the failure reason
    pub fn place(&mut self, slot: usize, row: i32, col: i32) -> Result<String, JsValue> {
        let outcome = self
            .session
            .place_shape(slot, row, col, platform::now_ms())
            .map_err(|e| JsValue::from_str(e.reason()))?;
        to_json(&outcome)
    }

    pub fn rotate(&mut self, slot: usize) -> bool {
        self.session.rotate_shape(slot)
    }

    pub fn purchase(&mut self, kind: &str) -> Result<(), JsValue> {
        self.session
            .purchase_power_up(power_up(kind)?)
            .map_err(|e| JsValue::from_str(e.reason()))
    }

    /// Activate a power-up; JSON `Activation`
    pub fn activate(&mut self, kind: &str) -> Result<String, JsValue> {
        let activation = self
            .session
            .activate_power_up(power_up(kind)?, platform::now_ms())
            .map_err(|e| JsValue::from_str(e.reason()))?;
        to_json(&activation)
    }

    /// Target cell for the pending power-up; returns blocks removed
    pub fn select_target(&mut self, row: usize, col: usize) -> Result<usize, JsValue> {
        self.session
            .select_target(row, col, platform::now_ms())
            .map_err(|e| JsValue::from_str(e.reason()))
    }

    pub fn cancel_power_up(&mut self) -> Option<String> {
        self.session.cancel_power_up().map(|k| k.as_str().to_string())
    }

    /// Per-frame clock advance; JSON list of power-ups that expired
    pub fn tick(&mut self, delta_ms: f64) -> Result<String, JsValue> {
        let expired = self
            .session
            .advance_clock(delta_ms.max(0.0) as u64, platform::now_ms());
        to_json(&expired)
    }

    /// Next batch while FutureSight runs
    pub fn preview(&mut self) -> Result<Option<String>, JsValue> {
        match self.session.preview_next_batch(platform::now_ms()) {
            Some(batch) => to_json(&batch).map(Some),
            None => Ok(None),
        }
    }

    /// `[row, col]` while SmartPlacement runs
    pub fn hint(&mut self, slot: usize) -> Option<Vec<i32>> {
        self.session
            .placement_hint(slot, platform::now_ms())
            .map(|(r, c)| vec![r, c])
    }

    pub fn snapshot(&self) -> Result<String, JsValue> {
        let session = &self.session;
        let view = View {
            grid: session.grid().rows(),
            tray: session.tray().slots(),
            score: session.score(),
            coins: session.powerups().coins(),
            combo: session.scoring().combo(),
            lines_cleared: session.scoring().lines_cleared(),
            phase: session.phase(),
            pending: session.powerups().pending(),
            daily: session.daily(),
            daily_multiplier: session.daily().map(DailyChallenge::score_multiplier),
        };
        to_json(&view)
    }

    /// JSON list of events since the last call
    pub fn take_events(&mut self) -> Result<String, JsValue> {
        to_json(&self.session.take_events())
    }

    /// JSON `GameSummary`
    pub fn end_game(&mut self) -> Result<String, JsValue> {
        to_json(&self.session.end_game(platform::now_ms()))
    }
}
