//! Pattern catalogs
//!
//! Easy play draws from the first `EASY_COUNT` patterns; difficult play from
//! the whole table. A shape's `kind` is always its index in the full table,
//! so kinds stay comparable across catalogs and restrictions.

use serde::{Deserialize, Serialize};

use super::shape::Pattern;

/// Difficulty flag driving catalog choice and score multiplier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Difficulty {
    #[default]
    Easy,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Hard => "hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" | "normal" => Some(Difficulty::Easy),
            "hard" | "difficult" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

/// Number of leading entries in `PATTERNS` that form the easy catalog
pub const EASY_COUNT: usize = 12;

/// Every base pattern; easy ones first
pub const PATTERNS: &[&[&[u8]]] = &[
    // --- easy ---
    &[&[1]],
    &[&[1, 1]],
    &[&[1], &[1]],
    &[&[1, 1, 1]],
    &[&[1], &[1], &[1]],
    &[&[1, 1], &[1, 0]],
    &[&[1, 1], &[0, 1]],
    &[&[1, 0], &[1, 1]],
    &[&[0, 1], &[1, 1]],
    &[&[1, 1], &[1, 1]],
    &[&[1, 1, 1], &[0, 1, 0]],
    &[&[1, 0], &[1, 0], &[1, 1]],
    // --- difficult only ---
    &[&[1, 1, 1, 1]],
    &[&[1], &[1], &[1], &[1]],
    &[&[1, 1, 1, 1, 1]],
    &[&[1], &[1], &[1], &[1], &[1]],
    &[&[1, 0, 0], &[1, 0, 0], &[1, 1, 1]],
    &[&[0, 0, 1], &[0, 0, 1], &[1, 1, 1]],
    &[&[1, 1, 1], &[1, 1, 1], &[1, 1, 1]],
    &[&[0, 1, 0], &[1, 1, 1], &[0, 1, 0]],
    &[&[0, 1, 1], &[1, 1, 0]],
    &[&[1, 1, 0], &[0, 1, 1]],
    &[&[1, 0, 1], &[1, 1, 1]],
    &[&[1, 1, 1], &[1, 1, 1]],
];

/// Pattern for a base kind
///
/// # Panics
/// Panics if `kind` is not an index into `PATTERNS`.
pub fn pattern(kind: usize) -> Pattern {
    Pattern::literal(PATTERNS[kind])
}

/// Total number of base kinds
pub fn kind_count() -> usize {
    PATTERNS.len()
}

/// The set of kinds a generator may draw from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    entries: Vec<(usize, Pattern)>,
}

impl Catalog {
    /// Catalog selected by difficulty
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        let count = match difficulty {
            Difficulty::Easy => EASY_COUNT,
            Difficulty::Hard => PATTERNS.len(),
        };
        Self::from_kinds(0..count)
    }

    /// Catalog holding exactly these kinds (unknown kinds and duplicates skipped)
    pub fn from_kinds(kinds: impl IntoIterator<Item = usize>) -> Self {
        let mut entries: Vec<(usize, Pattern)> = Vec::new();
        for kind in kinds {
            if kind < PATTERNS.len() && !entries.iter().any(|(k, _)| *k == kind) {
                entries.push((kind, pattern(kind)));
            }
        }
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (kind, pattern) at a catalog position
    pub fn get(&self, index: usize) -> Option<(usize, &Pattern)> {
        self.entries.get(index).map(|(k, p)| (*k, p))
    }

    pub fn kinds(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().map(|(k, _)| *k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_literals_valid() {
        for kind in 0..kind_count() {
            let p = pattern(kind);
            assert!(p.block_count() > 0);
        }
    }

    #[test]
    fn test_difficult_is_superset_of_easy() {
        let easy = Catalog::for_difficulty(Difficulty::Easy);
        let hard = Catalog::for_difficulty(Difficulty::Hard);
        assert_eq!(easy.len(), EASY_COUNT);
        assert!(hard.len() > easy.len());
        for kind in easy.kinds() {
            assert!(hard.kinds().any(|k| k == kind));
        }
        // Easy patterns stay small
        for i in 0..easy.len() {
            let (_, p) = easy.get(i).unwrap();
            assert!(p.width() <= 3 && p.height() <= 3 && p.block_count() <= 4);
        }
    }

    #[test]
    fn test_from_kinds_dedups_and_skips_unknown() {
        let c = Catalog::from_kinds([3, 3, 999, 14]);
        assert_eq!(c.kinds().collect::<Vec<_>>(), vec![3, 14]);
    }

    #[test]
    fn test_difficulty_parse() {
        assert_eq!(Difficulty::from_str("HARD"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::from_str("easy"), Some(Difficulty::Easy));
        assert_eq!(Difficulty::from_str("nightmare"), None);
    }
}
