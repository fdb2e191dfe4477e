//! Undo history
//!
//! Bounded stack of full game snapshots. Pushing past the depth evicts the
//! oldest entry; restoring pops the newest.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::grid::Grid;
use super::tray::Tray;
use crate::consts::HISTORY_DEPTH;

/// Everything an undo puts back
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub grid: Grid,
    pub tray: Tray,
    pub score: u64,
    pub combo: u32,
    pub lines_cleared: u32,
    /// Coins earned so far this game
    pub coins: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    entries: VecDeque<Snapshot>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, snapshot: Snapshot) {
        if self.entries.len() == HISTORY_DEPTH {
            self.entries.pop_front();
        }
        self.entries.push_back(snapshot);
    }

    /// Most recent snapshot, removed from the history
    pub fn pop(&mut self) -> Option<Snapshot> {
        self.entries.pop_back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(score: u64) -> Snapshot {
        Snapshot {
            grid: Grid::new(),
            tray: Tray::new(),
            score,
            combo: 0,
            lines_cleared: 0,
            coins: 0,
        }
    }

    #[test]
    fn test_oldest_evicted_past_depth() {
        let mut history = History::new();
        for s in 0..7 {
            history.push(snap(s));
        }
        assert_eq!(history.len(), HISTORY_DEPTH);
        let popped: Vec<u64> = std::iter::from_fn(|| history.pop()).map(|s| s.score).collect();
        assert_eq!(popped, vec![6, 5, 4, 3, 2]);
        assert!(history.is_empty());
    }
}
