//! Game events and listener hooks
//!
//! The session reports what happened through `GameEvent`s. Listeners
//! (audio, animation, analytics) subscribe and are called synchronously;
//! they cannot affect gameplay.

use serde::{Deserialize, Serialize};

use super::daily::DailyRewards;
use super::powerups::PowerUpKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    ShapePlaced {
        shape_id: u64,
        kind: usize,
        row: i32,
        col: i32,
    },
    LinesCleared {
        rows: Vec<usize>,
        cols: Vec<usize>,
        score: u64,
        coins: u64,
        combo: u32,
    },
    /// A placement without clears ended a running combo
    ComboBroken { combo: u32 },
    TrayRefilled,
    PowerUpUsed { kind: PowerUpKind },
    PowerUpExpired { kind: PowerUpKind },
    /// Phoenix cleared rows instead of ending the game
    Revived { rows: Vec<usize> },
    ObjectiveReached { level: u32 },
    GameOver { score: u64 },
    DailyCompleted { seed: u64, rewards: DailyRewards },
    DailyFailed { seed: u64 },
}

pub type Listener = Box<dyn FnMut(&GameEvent)>;

/// Registered listeners, called in subscription order
#[derive(Default)]
pub struct EventHooks {
    listeners: Vec<Listener>,
}

impl EventHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&GameEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn emit(&mut self, event: &GameEvent) {
        for listener in &mut self.listeners {
            listener(event);
        }
    }
}

impl std::fmt::Debug for EventHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHooks")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_listeners_called_in_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut hooks = EventHooks::new();
        for tag in ["a", "b"] {
            let seen = Rc::clone(&seen);
            hooks.subscribe(move |e| seen.borrow_mut().push((tag, e.clone())));
        }
        hooks.emit(&GameEvent::TrayRefilled);
        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], ("a", GameEvent::TrayRefilled));
        assert_eq!(seen[1].0, "b");
    }
}
