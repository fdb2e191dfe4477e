//! Power-up state machine
//!
//! Owns affordability, inventory and activation state. The actual effect on
//! the grid or tray is applied by the session once activation succeeds.
//!
//! Lifecycles:
//! - selection: Inactive → PendingSelection → Inactive (resolved or cancelled)
//! - timed:     Inactive → Active(until) → Inactive (lazily, on query)
//! - one-shot:  Inactive → Armed → Consumed (on game over)
//! - instant:   applied immediately

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::scoring::GameMode;
use crate::persistence::{self, Storage};

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PowerUpKind {
    ClearRow,
    ClearColumn,
    LineBlast,
    Bomb,
    SwapTray,
    Undo,
    TimeSlow,
    FutureSight,
    ColorMatch,
    SmartPlacement,
    Phoenix,
}

/// How a power-up plays out once paid for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerUpClass {
    /// Needs a follow-up grid target
    Selection,
    /// Takes effect at once
    Instant,
    /// Active until an absolute end time
    Timed { duration_ms: u64 },
    /// Armed until consumed by a game over
    OneShot,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 11] = [
        PowerUpKind::ClearRow,
        PowerUpKind::ClearColumn,
        PowerUpKind::LineBlast,
        PowerUpKind::Bomb,
        PowerUpKind::SwapTray,
        PowerUpKind::Undo,
        PowerUpKind::TimeSlow,
        PowerUpKind::FutureSight,
        PowerUpKind::ColorMatch,
        PowerUpKind::SmartPlacement,
        PowerUpKind::Phoenix,
    ];

    pub fn class(&self) -> PowerUpClass {
        match self {
            PowerUpKind::ClearRow
            | PowerUpKind::ClearColumn
            | PowerUpKind::LineBlast
            | PowerUpKind::Bomb => PowerUpClass::Selection,
            PowerUpKind::SwapTray | PowerUpKind::Undo => PowerUpClass::Instant,
            PowerUpKind::TimeSlow => PowerUpClass::Timed { duration_ms: 30_000 },
            PowerUpKind::FutureSight => PowerUpClass::Timed { duration_ms: 60_000 },
            PowerUpKind::ColorMatch => PowerUpClass::Timed { duration_ms: 45_000 },
            PowerUpKind::SmartPlacement => PowerUpClass::Timed { duration_ms: 30_000 },
            PowerUpKind::Phoenix => PowerUpClass::OneShot,
        }
    }

    /// Coin price in the shop; score cost in endless mode
    pub fn price(&self) -> u64 {
        match self {
            PowerUpKind::ClearRow => 50,
            PowerUpKind::ClearColumn => 50,
            PowerUpKind::LineBlast => 120,
            PowerUpKind::Bomb => 100,
            PowerUpKind::SwapTray => 40,
            PowerUpKind::Undo => 60,
            PowerUpKind::TimeSlow => 80,
            PowerUpKind::FutureSight => 70,
            PowerUpKind::ColorMatch => 90,
            PowerUpKind::SmartPlacement => 75,
            PowerUpKind::Phoenix => 200,
        }
    }

    pub fn requires_selection(&self) -> bool {
        self.class() == PowerUpClass::Selection
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PowerUpKind::ClearRow => "clear_row",
            PowerUpKind::ClearColumn => "clear_column",
            PowerUpKind::LineBlast => "line_blast",
            PowerUpKind::Bomb => "bomb",
            PowerUpKind::SwapTray => "swap_tray",
            PowerUpKind::Undo => "undo",
            PowerUpKind::TimeSlow => "time_slow",
            PowerUpKind::FutureSight => "future_sight",
            PowerUpKind::ColorMatch => "color_match",
            PowerUpKind::SmartPlacement => "smart_placement",
            PowerUpKind::Phoenix => "phoenix",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

/// Why a power-up could not be bought or used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum PowerUpError {
    #[error("not enough coins")]
    InsufficientFunds,
    #[error("not enough score")]
    InsufficientScore,
    #[error("power-up not owned")]
    NotOwned,
    #[error("another power-up is waiting for a target")]
    PowerUpActive,
    #[error("no power-up is waiting for a target")]
    NothingPending,
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("target outside the grid")]
    InvalidTarget,
    #[error("game is over")]
    GameOver,
}

impl PowerUpError {
    /// Stable code for UI/analytics
    pub fn reason(&self) -> &'static str {
        match self {
            PowerUpError::InsufficientFunds => "insufficient_funds",
            PowerUpError::InsufficientScore => "insufficient_score",
            PowerUpError::NotOwned => "not_owned",
            PowerUpError::PowerUpActive => "power_up_active",
            PowerUpError::NothingPending => "nothing_pending",
            PowerUpError::NothingToUndo => "nothing_to_undo",
            PowerUpError::InvalidTarget => "invalid_target",
            PowerUpError::GameOver => "game_over",
        }
    }
}

/// What was charged for an activation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payment {
    /// One owned item consumed
    Inventory,
    /// Score deducted (endless mode); the caller owns the score
    Score(u64),
}

/// State reached by a successful activation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    AwaitingSelection,
    Instant,
    Timed { until_ms: u64 },
    Armed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activation {
    pub kind: PowerUpKind,
    pub effect: Effect,
    pub payment: Payment,
}

/// Persisted wallet and owned counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Inventory {
    pub coins: u64,
    pub owned: BTreeMap<PowerUpKind, u32>,
}

impl Inventory {
    pub const STORAGE_KEY: &'static str = "blockfit_powerups";

    pub fn count(&self, kind: PowerUpKind) -> u32 {
        self.owned.get(&kind).copied().unwrap_or(0)
    }

    fn add(&mut self, kind: PowerUpKind, n: u32) {
        *self.owned.entry(kind).or_insert(0) += n;
    }

    fn take_one(&mut self, kind: PowerUpKind) -> bool {
        match self.owned.get_mut(&kind) {
            Some(n) if *n > 0 => {
                *n -= 1;
                true
            }
            _ => false,
        }
    }
}

/// Activation state for one game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerUpSystem {
    mode: GameMode,
    inventory: Inventory,
    pending: Option<(PowerUpKind, Payment)>,
    /// Absolute end time (ms) per running timed power-up
    timers: BTreeMap<PowerUpKind, u64>,
    phoenix_armed: bool,
}

impl PowerUpSystem {
    pub fn new(mode: GameMode, inventory: Inventory) -> Self {
        Self {
            mode,
            inventory,
            pending: None,
            timers: BTreeMap::new(),
            phoenix_armed: false,
        }
    }

    /// Load the persisted inventory
    pub fn load(store: &dyn Storage, mode: GameMode) -> Self {
        Self::new(mode, persistence::load(store, Inventory::STORAGE_KEY))
    }

    /// Persist the inventory (activation state is per game and not saved)
    pub fn save(&self, store: &mut dyn Storage) -> bool {
        persistence::save(store, Inventory::STORAGE_KEY, &self.inventory)
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn coins(&self) -> u64 {
        self.inventory.coins
    }

    pub fn add_coins(&mut self, coins: u64) {
        self.inventory.coins += coins;
    }

    /// Take back coins paid out earlier (undo); stops at an empty wallet
    pub fn remove_coins(&mut self, coins: u64) {
        self.inventory.coins = self.inventory.coins.saturating_sub(coins);
    }

    pub fn owned(&self, kind: PowerUpKind) -> u32 {
        self.inventory.count(kind)
    }

    /// Give items without payment (rewards)
    pub fn grant(&mut self, kind: PowerUpKind, n: u32) {
        self.inventory.add(kind, n);
    }

    /// Buy one item with coins
    pub fn purchase(&mut self, kind: PowerUpKind) -> Result<(), PowerUpError> {
        let price = kind.price();
        if self.inventory.coins < price {
            return Err(PowerUpError::InsufficientFunds);
        }
        self.inventory.coins -= price;
        self.inventory.add(kind, 1);
        log::info!("Purchased {} for {} coins", kind.as_str(), price);
        Ok(())
    }

    fn check_affordable(&self, kind: PowerUpKind, score: u64) -> Result<Payment, PowerUpError> {
        if self.mode == GameMode::Endless {
            if score >= kind.price() {
                Ok(Payment::Score(kind.price()))
            } else {
                Err(PowerUpError::InsufficientScore)
            }
        } else if self.inventory.count(kind) > 0 {
            Ok(Payment::Inventory)
        } else {
            Err(PowerUpError::NotOwned)
        }
    }

    /// Endless: score covers the cost. Other modes: at least one owned.
    pub fn can_afford(&self, kind: PowerUpKind, score: u64) -> bool {
        self.check_affordable(kind, score).is_ok()
    }

    /// Pay for and activate a power-up.
    ///
    /// Re-activating the selection already pending is a no-op that returns the
    /// existing activation without charging again.
    pub fn activate(&mut self, kind: PowerUpKind, score: u64, now_ms: u64) -> Result<Activation, PowerUpError> {
        if let Some((pending, payment)) = self.pending {
            if pending == kind {
                return Ok(Activation {
                    kind,
                    effect: Effect::AwaitingSelection,
                    payment,
                });
            }
        }

        let payment = self.check_affordable(kind, score)?;

        let effect = match kind.class() {
            PowerUpClass::Selection => {
                if self.pending.is_some() {
                    return Err(PowerUpError::PowerUpActive);
                }
                Effect::AwaitingSelection
            }
            PowerUpClass::OneShot => {
                if self.phoenix_armed {
                    return Err(PowerUpError::PowerUpActive);
                }
                Effect::Armed
            }
            PowerUpClass::Timed { duration_ms } => Effect::Timed {
                until_ms: now_ms + duration_ms,
            },
            PowerUpClass::Instant => Effect::Instant,
        };

        if payment == Payment::Inventory {
            self.inventory.take_one(kind);
        }

        match effect {
            Effect::AwaitingSelection => self.pending = Some((kind, payment)),
            Effect::Armed => self.phoenix_armed = true,
            Effect::Timed { until_ms } => {
                self.timers.insert(kind, until_ms);
            }
            Effect::Instant => {}
        }

        log::info!("Activated {} ({:?})", kind.as_str(), effect);
        Ok(Activation {
            kind,
            effect,
            payment,
        })
    }

    /// Selection power-up waiting for a target
    pub fn pending(&self) -> Option<PowerUpKind> {
        self.pending.map(|(k, _)| k)
    }

    /// Target chosen: the pending power-up is spent
    pub fn resolve_pending(&mut self) -> Result<PowerUpKind, PowerUpError> {
        self.pending
            .take()
            .map(|(k, _)| k)
            .ok_or(PowerUpError::NothingPending)
    }

    /// Abandon the pending selection. Inventory is refunded here; a score
    /// payment is returned for the caller to refund.
    pub fn cancel_pending(&mut self) -> Option<(PowerUpKind, Payment)> {
        let (kind, payment) = self.pending.take()?;
        if payment == Payment::Inventory {
            self.inventory.add(kind, 1);
        }
        log::info!("Cancelled {}", kind.as_str());
        Some((kind, payment))
    }

    /// Undo an activation whose effect could not be applied
    pub fn refund(&mut self, activation: &Activation) {
        if activation.payment == Payment::Inventory {
            self.inventory.add(activation.kind, 1);
        }
        match activation.effect {
            Effect::AwaitingSelection => self.pending = None,
            Effect::Armed => self.phoenix_armed = false,
            Effect::Timed { .. } => {
                self.timers.remove(&activation.kind);
            }
            Effect::Instant => {}
        }
    }

    /// Whether a timed power-up is running; expires it once its end time passed
    pub fn is_active(&mut self, kind: PowerUpKind, now_ms: u64) -> bool {
        match self.timers.get(&kind) {
            Some(&until) if now_ms < until => true,
            Some(_) => {
                self.timers.remove(&kind);
                log::debug!("{} expired", kind.as_str());
                false
            }
            None => false,
        }
    }

    /// Milliseconds left on a timed power-up (0 when inactive)
    pub fn remaining_ms(&mut self, kind: PowerUpKind, now_ms: u64) -> u64 {
        if self.is_active(kind, now_ms) {
            self.timers.get(&kind).map(|&until| until - now_ms).unwrap_or(0)
        } else {
            0
        }
    }

    /// Expire every elapsed timer; returns the kinds that just ended
    pub fn expire(&mut self, now_ms: u64) -> Vec<PowerUpKind> {
        let ended: Vec<PowerUpKind> = self
            .timers
            .iter()
            .filter(|&(_, &until)| now_ms >= until)
            .map(|(&k, _)| k)
            .collect();
        for kind in &ended {
            self.timers.remove(kind);
        }
        ended
    }

    /// Stop a timed power-up early
    pub fn cancel_timed(&mut self, kind: PowerUpKind) -> bool {
        self.timers.remove(&kind).is_some()
    }

    pub fn arm_phoenix(&mut self) {
        self.phoenix_armed = true;
    }

    pub fn phoenix_armed(&self) -> bool {
        self.phoenix_armed
    }

    /// True exactly once per arming
    pub fn consume_on_game_over(&mut self) -> bool {
        std::mem::replace(&mut self.phoenix_armed, false)
    }
}
