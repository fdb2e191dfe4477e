//! One game from first tray to game over
//!
//! `GameSession` owns the board, tray, generator, score, power-ups, undo
//! history and the optional daily challenge of a single game, together with
//! the storage collaborator it was given. The caller (a scene, the web
//! bridge, a test) serializes every call and passes the current time in.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::catalog::Difficulty;
use super::daily::{self, DailyChallenge, DailyError, DailyRewards, DailyStats, PlacementEvent};
use super::events::{EventHooks, GameEvent};
use super::generator::ShapeGenerator;
use super::grid::{Cell, CompletedLines, EMPTY, Grid, LineKind, PlaceError};
use super::history::{History, Snapshot};
use super::powerups::{Activation, Effect, Payment, PowerUpError, PowerUpKind, PowerUpSystem};
use super::scoring::{ClearReward, GameMode, ScoreEngine};
use super::shape::{Pattern, Shape};
use super::tray::Tray;
use crate::consts::GRID_SIZE;
use crate::highscores::HighScores;
use crate::persistence::Storage;
use crate::progress::{AdventureLevel, Progress};
use crate::stats::{self, GameRecord, Milestone};

/// Bomb clears the 3×3 square around its target
pub const BOMB_RADIUS: usize = 1;
/// Rows a phoenix revive clears
pub const PHOENIX_ROWS: usize = 3;

/// How a game is set up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub mode: GameMode,
    pub difficulty: Difficulty,
    /// Fixed shape sequence (ignored for daily games, which use the date seed)
    pub seed: Option<u64>,
    pub daily: Option<NaiveDate>,
    pub adventure: Option<AdventureLevel>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(GameMode::Classic, Difficulty::Easy)
    }
}

impl SessionConfig {
    pub fn new(mode: GameMode, difficulty: Difficulty) -> Self {
        Self {
            mode,
            difficulty,
            seed: None,
            daily: None,
            adventure: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// The daily challenge for `date`
    pub fn daily(date: NaiveDate, difficulty: Difficulty) -> Self {
        Self {
            daily: Some(date),
            ..Self::new(GameMode::Daily, difficulty)
        }
    }

    pub fn adventure(level: u32, difficulty: Difficulty) -> Self {
        Self {
            adventure: Some(AdventureLevel::new(level)),
            ..Self::new(GameMode::Adventure, difficulty)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Playing,
    /// A selection power-up waits for its target cell
    AwaitingTarget,
    GameOver,
}

/// Result of a successful placement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementOutcome {
    pub lines: CompletedLines,
    pub reward: ClearReward,
    pub tray_refilled: bool,
    pub revived: bool,
    pub game_over: bool,
}

/// What happened to the day's challenge when the game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DailyOutcome {
    Completed(DailyRewards),
    /// Time ran out below target; the day can be retried
    Failed,
    /// Already recorded (another session finished it first)
    AlreadyCompleted,
    /// Won, but the completion could not be saved; nothing was paid
    NotRecorded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    pub mode: GameMode,
    pub difficulty: Difficulty,
    pub score: u64,
    pub lines_cleared: u32,
    pub max_combo: u32,
    pub placements: u32,
    pub coins_earned: u64,
    pub new_high_score: bool,
    pub milestones: Vec<Milestone>,
    pub daily: Option<DailyOutcome>,
    pub objective_met: bool,
}

pub struct GameSession {
    config: SessionConfig,
    grid: Grid,
    tray: Tray,
    generator: ShapeGenerator,
    scoring: ScoreEngine,
    powerups: PowerUpSystem,
    history: History,
    daily: Option<DailyChallenge>,
    store: Box<dyn Storage>,
    hooks: EventHooks,
    events: Vec<GameEvent>,
    /// Colour shared by new shapes while ColorMatch runs
    match_color: Cell,
    placements: u32,
    power_ups_used: u32,
    started_ms: u64,
    over: bool,
    objective_reached: bool,
    summary: Option<GameSummary>,
}

impl GameSession {
    /// Start a game. Fails only when the config names a daily challenge that
    /// was already completed.
    pub fn new(config: SessionConfig, store: Box<dyn Storage>, now_ms: u64) -> Result<Self, DailyError> {
        let daily = match config.daily {
            Some(date) => Some(daily::start(store.as_ref(), date, config.difficulty)?),
            None => None,
        };

        let mut generator = match (&daily, config.seed) {
            (Some(challenge), _) => ShapeGenerator::seeded(config.difficulty, challenge.seed()),
            (None, Some(seed)) => ShapeGenerator::seeded(config.difficulty, seed),
            (None, None) => ShapeGenerator::new(config.difficulty),
        };
        if let Some(kinds) = daily.as_ref().and_then(DailyChallenge::allowed_kinds) {
            generator.restrict_to(kinds);
        }
        let tray = generator.generate_batch(None);
        let powerups = PowerUpSystem::load(store.as_ref(), config.mode);

        log::info!(
            "New {} game ({}), seed {:?}",
            config.mode.as_str(),
            config.difficulty.as_str(),
            generator.seed()
        );

        Ok(Self {
            scoring: ScoreEngine::new(config.difficulty, config.mode),
            config,
            grid: Grid::new(),
            tray,
            generator,
            powerups,
            history: History::new(),
            daily,
            store,
            hooks: EventHooks::new(),
            events: Vec::new(),
            match_color: 1,
            placements: 0,
            power_ups_used: 0,
            started_ms: now_ms,
            over: false,
            objective_reached: false,
            summary: None,
        })
    }

    // === Accessors ===

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn tray(&self) -> &Tray {
        &self.tray
    }

    pub fn scoring(&self) -> &ScoreEngine {
        &self.scoring
    }

    pub fn score(&self) -> u64 {
        self.scoring.score()
    }

    pub fn powerups(&self) -> &PowerUpSystem {
        &self.powerups
    }

    pub fn daily(&self) -> Option<&DailyChallenge> {
        self.daily.as_ref()
    }

    pub fn undo_depth(&self) -> usize {
        self.history.len()
    }

    pub fn placements(&self) -> u32 {
        self.placements
    }

    pub fn is_over(&self) -> bool {
        self.over
    }

    pub fn phase(&self) -> GamePhase {
        if self.over {
            GamePhase::GameOver
        } else if self.powerups.pending().is_some() {
            GamePhase::AwaitingTarget
        } else {
            GamePhase::Playing
        }
    }

    pub fn storage(&self) -> &dyn Storage {
        self.store.as_ref()
    }

    /// Hand the storage back (e.g. to start the next game with it)
    pub fn into_storage(self) -> Box<dyn Storage> {
        self.store
    }

    // === Events ===

    pub fn subscribe(&mut self, listener: impl FnMut(&GameEvent) + 'static) {
        self.hooks.subscribe(listener);
    }

    /// Events since the last call
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn emit(&mut self, event: GameEvent) {
        self.hooks.emit(&event);
        self.events.push(event);
    }

    // === Placement ===

    /// Place the shape in `slot` with its top-left block cell area at (row, col).
    /// On error nothing changes.
    pub fn place_shape(&mut self, slot: usize, row: i32, col: i32, now_ms: u64) -> Result<PlacementOutcome, PlaceError> {
        if self.over {
            return Err(PlaceError::GameOver);
        }
        self.tick_timers(now_ms);

        let shape = self.tray.get(slot).cloned().ok_or(PlaceError::EmptySlot(slot))?;
        self.grid.check_placement(shape.pattern(), row, col)?;

        self.push_snapshot();
        self.grid.place(shape.pattern(), row, col, shape.color())?;
        self.tray.take(slot);
        self.placements += 1;
        self.emit(GameEvent::ShapePlaced {
            shape_id: shape.id(),
            kind: shape.kind(),
            row,
            col,
        });

        let lines = self.grid.completed_lines();
        self.grid.clear_lines(&lines.rows, &lines.cols);

        if let Some(challenge) = &mut self.daily {
            challenge.on_placement(&PlacementEvent {
                shape: &shape,
                row,
                col,
                lines: &lines,
                grid: &self.grid,
                now_ms,
            });
        }
        let extra = self
            .daily
            .as_ref()
            .map(DailyChallenge::score_multiplier)
            .unwrap_or(1.0);

        let previous_combo = self.scoring.combo();
        let reward = self.scoring.on_lines_cleared_scaled(&lines, extra);
        self.powerups.add_coins(reward.coins);
        if !lines.is_empty() {
            self.emit(GameEvent::LinesCleared {
                rows: lines.rows.clone(),
                cols: lines.cols.clone(),
                score: reward.score,
                coins: reward.coins,
                combo: reward.combo,
            });
        } else if previous_combo > 0 {
            self.emit(GameEvent::ComboBroken {
                combo: previous_combo,
            });
        }

        let tray_refilled = self.tray.is_exhausted();
        if tray_refilled {
            self.refill_tray(now_ms);
        }

        self.check_objective();
        let mut revived = false;
        if self.daily.as_ref().is_some_and(DailyChallenge::is_finished) {
            self.finish();
        } else if !self.over {
            revived = self.check_game_over(now_ms);
        }

        Ok(PlacementOutcome {
            lines,
            reward,
            tray_refilled,
            revived,
            game_over: self.over,
        })
    }

    /// Rotate the shape in a tray slot clockwise
    pub fn rotate_shape(&mut self, slot: usize) -> bool {
        if self.over {
            return false;
        }
        match self.tray.get(slot).map(Shape::rotated) {
            Some(rotated) => self.tray.replace(slot, rotated),
            None => false,
        }
    }

    fn refill_tray(&mut self, now_ms: u64) {
        let color = self.color_override(now_ms);
        self.tray = self.generator.generate_batch(color);
        log::info!("Tray refilled");
        self.emit(GameEvent::TrayRefilled);
    }

    fn color_override(&mut self, now_ms: u64) -> Option<Cell> {
        self.powerups
            .is_active(PowerUpKind::ColorMatch, now_ms)
            .then_some(self.match_color)
    }

    fn fits_somewhere(&self, shape: &Shape) -> bool {
        let mut pattern = shape.pattern().clone();
        for _ in 0..4 {
            if self.grid.has_any_placement(&pattern) {
                return true;
            }
            pattern = pattern.rotate_cw();
        }
        false
    }

    fn can_continue(&self) -> bool {
        self.tray.shapes().any(|(_, shape)| self.fits_somewhere(shape))
    }

    /// End the game if nothing fits, unless phoenix is armed. True on revive.
    fn check_game_over(&mut self, now_ms: u64) -> bool {
        if self.can_continue() {
            return false;
        }
        if !self.powerups.consume_on_game_over() {
            self.finish();
            return false;
        }

        let rows = self.grid.fullest_rows(PHOENIX_ROWS);
        self.grid.clear_lines(&rows, &[]);
        log::info!("Phoenix revive, cleared rows {:?}", rows);
        self.emit(GameEvent::Revived { rows });
        self.refill_tray(now_ms);
        if !self.can_continue() {
            self.finish();
        }
        true
    }

    fn check_objective(&mut self) {
        let Some(adventure) = self.config.adventure else {
            return;
        };
        if self.objective_reached {
            return;
        }
        let met = adventure.objective.is_met(
            self.scoring.score(),
            self.scoring.lines_cleared(),
            self.scoring.max_combo(),
        );
        if met {
            self.objective_reached = true;
            log::info!("Objective reached: {}", adventure.objective.describe());
            self.emit(GameEvent::ObjectiveReached {
                level: adventure.level,
            });
            self.finish();
        }
    }

    fn finish(&mut self) {
        if self.over {
            return;
        }
        self.over = true;
        let score = self.scoring.score();
        log::info!("Game over, score {}", score);
        self.emit(GameEvent::GameOver { score });
    }

    // === Clock ===

    fn tick_timers(&mut self, now_ms: u64) -> Vec<PowerUpKind> {
        let ended = self.powerups.expire(now_ms);
        for &kind in &ended {
            self.emit(GameEvent::PowerUpExpired { kind });
        }
        ended
    }

    /// Advance game time by `delta_ms` (daily countdown, power-up timers).
    /// Returns power-ups that expired.
    pub fn advance_clock(&mut self, delta_ms: u64, now_ms: u64) -> Vec<PowerUpKind> {
        if self.over {
            return Vec::new();
        }
        let expired = self.tick_timers(now_ms);
        let slowed = self.powerups.is_active(PowerUpKind::TimeSlow, now_ms);
        if let Some(challenge) = &mut self.daily {
            challenge.advance(if slowed { delta_ms / 2 } else { delta_ms });
            if challenge.is_finished() {
                self.finish();
            }
        }
        expired
    }

    // === Power-ups ===

    /// Buy one power-up with wallet coins; the inventory is saved right away
    pub fn purchase_power_up(&mut self, kind: PowerUpKind) -> Result<(), PowerUpError> {
        self.powerups.purchase(kind)?;
        self.powerups.save(self.store.as_mut());
        Ok(())
    }

    /// Pay for and start a power-up. Instant and timed effects apply
    /// immediately; selection power-ups wait for `select_target`.
    pub fn activate_power_up(&mut self, kind: PowerUpKind, now_ms: u64) -> Result<Activation, PowerUpError> {
        if self.over {
            return Err(PowerUpError::GameOver);
        }
        self.tick_timers(now_ms);

        if self.powerups.pending() == Some(kind) {
            // Already waiting for a target; nothing more to charge
            return self.powerups.activate(kind, self.scoring.score(), now_ms);
        }
        if kind == PowerUpKind::Undo && self.history.is_empty() {
            return Err(PowerUpError::NothingToUndo);
        }

        let activation = self.powerups.activate(kind, self.scoring.score(), now_ms)?;

        if kind == PowerUpKind::Undo {
            self.restore_latest();
            // The restored score pays, so the cost is not undone with it
            if let Payment::Score(cost) = activation.payment {
                let score = self.scoring.score();
                self.scoring.set_score(score.saturating_sub(cost));
            }
        } else {
            if let Payment::Score(cost) = activation.payment {
                if !self.scoring.spend(cost) {
                    self.powerups.refund(&activation);
                    return Err(PowerUpError::InsufficientScore);
                }
            }
            match kind {
                PowerUpKind::SwapTray => {
                    self.push_snapshot();
                    self.refill_tray(now_ms);
                }
                PowerUpKind::ColorMatch => {
                    self.match_color = self.tray.shapes().next().map(|(_, s)| s.color()).unwrap_or(1);
                }
                _ => {}
            }
        }

        if activation.effect != Effect::AwaitingSelection {
            self.power_ups_used += 1;
            self.emit(GameEvent::PowerUpUsed { kind });
        }
        Ok(activation)
    }

    /// Apply the pending selection power-up at (row, col).
    /// Returns the number of blocks removed.
    pub fn select_target(&mut self, row: usize, col: usize, now_ms: u64) -> Result<usize, PowerUpError> {
        if self.over {
            return Err(PowerUpError::GameOver);
        }
        self.tick_timers(now_ms);
        let kind = self.powerups.pending().ok_or(PowerUpError::NothingPending)?;
        if row >= GRID_SIZE || col >= GRID_SIZE {
            return Err(PowerUpError::InvalidTarget);
        }

        self.push_snapshot();
        let before = self.grid.filled_count();
        match kind {
            PowerUpKind::ClearRow => self.grid.clear_line(row, LineKind::Row),
            PowerUpKind::ClearColumn => self.grid.clear_line(col, LineKind::Column),
            PowerUpKind::LineBlast => {
                self.grid.clear_line(row, LineKind::Row);
                self.grid.clear_line(col, LineKind::Column);
            }
            PowerUpKind::Bomb => {
                self.grid.clear_area(row, col, BOMB_RADIUS);
            }
            _ => {}
        }
        let removed = before - self.grid.filled_count();

        self.powerups.resolve_pending()?;
        self.power_ups_used += 1;
        log::debug!("{} at ({}, {}) removed {} blocks", kind.as_str(), row, col, removed);
        self.emit(GameEvent::PowerUpUsed { kind });
        Ok(removed)
    }

    /// Abandon the pending selection and refund it
    pub fn cancel_power_up(&mut self) -> Option<PowerUpKind> {
        let (kind, payment) = self.powerups.cancel_pending()?;
        if let Payment::Score(cost) = payment {
            self.scoring.refund(cost);
        }
        Some(kind)
    }

    /// Switch a timed power-up off early (no refund)
    pub fn stop_power_up(&mut self, kind: PowerUpKind) -> bool {
        self.powerups.cancel_timed(kind)
    }

    /// Next tray batch while FutureSight runs
    pub fn preview_next_batch(&mut self, now_ms: u64) -> Option<Vec<Shape>> {
        if !self.powerups.is_active(PowerUpKind::FutureSight, now_ms) {
            return None;
        }
        let color = self.color_override(now_ms);
        let next = self.generator.peek_batch(color);
        Some(next.shapes().map(|(_, s)| s.clone()).collect())
    }

    /// Suggested origin for a slot while SmartPlacement runs
    pub fn placement_hint(&mut self, slot: usize, now_ms: u64) -> Option<(i32, i32)> {
        if !self.powerups.is_active(PowerUpKind::SmartPlacement, now_ms) {
            return None;
        }
        let shape = self.tray.get(slot)?;
        best_origin(&self.grid, shape.pattern())
    }

    // === Undo ===

    fn push_snapshot(&mut self) {
        self.history.push(Snapshot {
            grid: self.grid.clone(),
            tray: self.tray.clone(),
            score: self.scoring.score(),
            combo: self.scoring.combo(),
            lines_cleared: self.scoring.lines_cleared(),
            coins: self.scoring.coins(),
        });
    }

    fn restore_latest(&mut self) -> bool {
        let Some(snapshot) = self.history.pop() else {
            return false;
        };
        self.grid = snapshot.grid;
        self.tray = snapshot.tray;
        // Wallet keeps purchases made since; only the undone payouts go
        let paid_since = self.scoring.coins().saturating_sub(snapshot.coins);
        self.powerups.remove_coins(paid_since);
        self.scoring
            .restore(snapshot.score, snapshot.combo, snapshot.lines_cleared, snapshot.coins);
        true
    }

    /// Restore the latest snapshot without charging (the Undo power-up
    /// charges and then does the same)
    pub fn undo(&mut self) -> Result<(), PowerUpError> {
        if self.over {
            return Err(PowerUpError::GameOver);
        }
        if self.restore_latest() {
            Ok(())
        } else {
            Err(PowerUpError::NothingToUndo)
        }
    }

    // === End of game ===

    /// Finish the game and write every persisted record it touches. Safe to
    /// call more than once; later calls return the first summary unchanged.
    pub fn end_game(&mut self, now_ms: u64) -> GameSummary {
        if let Some(summary) = &self.summary {
            return summary.clone();
        }
        self.finish();

        let score = self.scoring.score();
        let mut coins_earned = self.scoring.coins();

        let daily = self.daily.as_ref().map(|challenge| {
            let stats = DailyStats {
                lines_cleared: self.scoring.lines_cleared(),
                max_combo: self.scoring.max_combo(),
                placements: self.placements,
            };
            match daily::complete(self.store.as_mut(), challenge, score, stats, now_ms) {
                Ok(rewards) => DailyOutcome::Completed(rewards),
                Err(DailyError::NotWon) => DailyOutcome::Failed,
                Err(DailyError::AlreadyCompleted(_)) => DailyOutcome::AlreadyCompleted,
                Err(DailyError::NotRecorded(_)) => DailyOutcome::NotRecorded,
            }
        });
        if let Some(seed) = self.daily.as_ref().map(DailyChallenge::seed) {
            match daily {
                Some(DailyOutcome::Completed(rewards)) => {
                    coins_earned += rewards.total;
                    self.powerups.add_coins(rewards.total);
                    self.emit(GameEvent::DailyCompleted { seed, rewards });
                }
                Some(DailyOutcome::Failed) => self.emit(GameEvent::DailyFailed { seed }),
                _ => {}
            }
        }

        let mut highscores = HighScores::load(self.store.as_ref());
        let new_high_score = self.scoring.save_high_score(&mut highscores, now_ms);
        highscores.save(self.store.as_mut());

        let objective_met = self.objective_reached;
        if let Some(adventure) = self.config.adventure {
            let mut progress = Progress::load(self.store.as_ref());
            progress.record(adventure.level, score, objective_met);
            progress.save(self.store.as_mut());
        }

        let record = GameRecord {
            mode: self.config.mode,
            difficulty: self.config.difficulty,
            score,
            lines_cleared: self.scoring.lines_cleared(),
            max_combo: self.scoring.max_combo(),
            placements: self.placements,
            power_ups_used: self.power_ups_used,
            coins_earned,
            duration_ms: now_ms.saturating_sub(self.started_ms),
            timestamp: now_ms,
        };
        let (_, milestones) = stats::record_game(self.store.as_mut(), &record);

        self.powerups.save(self.store.as_mut());

        let summary = GameSummary {
            mode: self.config.mode,
            difficulty: self.config.difficulty,
            score,
            lines_cleared: record.lines_cleared,
            max_combo: record.max_combo,
            placements: self.placements,
            coins_earned,
            new_high_score,
            milestones,
            daily,
            objective_met,
        };
        self.summary = Some(summary.clone());
        summary
    }
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("config", &self.config)
            .field("score", &self.scoring.score())
            .field("placements", &self.placements)
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}

/// Best origin for a pattern: most lines completed, then most edges touching
/// blocks or walls, then the first in row-major order.
pub fn best_origin(grid: &Grid, pattern: &Pattern) -> Option<(i32, i32)> {
    grid.valid_origins(pattern)
        .into_iter()
        .map(|(r, c)| {
            let mut trial = grid.clone();
            let lines = match trial.place(pattern, r, c, 1) {
                Ok(()) => trial.completed_lines().total(),
                Err(_) => 0,
            };
            (lines, contact(grid, pattern, r, c), r, c)
        })
        .min_by_key(|&(lines, touching, r, c)| (std::cmp::Reverse((lines, touching)), r, c))
        .map(|(_, _, r, c)| (r, c))
}

/// Block edges of the placed pattern that touch a wall or an occupied cell
fn contact(grid: &Grid, pattern: &Pattern, row: i32, col: i32) -> usize {
    let mut touching = 0;
    for (dr, dc) in pattern.blocks() {
        for (nr, nc) in [(-1i32, 0i32), (1, 0), (0, -1), (0, 1)] {
            let pr = dr as i32 + nr;
            let pc = dc as i32 + nc;
            let inside_shape = pr >= 0 && pc >= 0 && pattern.is_block(pr as usize, pc as usize);
            if inside_shape {
                continue;
            }
            let (r, c) = (row + pr, col + pc);
            let blocked = r < 0
                || c < 0
                || grid
                    .get(r as usize, c as usize)
                    .is_none_or(|cell| cell != EMPTY);
            if blocked {
                touching += 1;
            }
        }
    }
    touching
}
