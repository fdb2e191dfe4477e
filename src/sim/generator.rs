//! Shape generation
//!
//! Shapes come from the active catalog, drawn either from a seeded
//! linear-congruential sequence (daily play: every player sees the same
//! pieces) or from an entropy-seeded PCG stream.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::catalog::{Catalog, Difficulty};
use super::grid::Cell;
use super::shape::Shape;
use super::tray::Tray;
use crate::consts::{MAX_RESAMPLE_ATTEMPTS, PALETTE_SIZE, RECENT_SHAPE_WINDOW, TRAY_SIZE};

/// Linear-congruential generator: `state = (a * state + c) mod m`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lcg {
    state: u64,
}

impl Lcg {
    const A: u64 = 9301;
    const C: u64 = 49297;
    const M: u64 = 233_280;

    pub fn new(seed: u64) -> Self {
        Self {
            state: seed % Self::M,
        }
    }

    /// Next value in [0, 1)
    pub fn next_f64(&mut self) -> f64 {
        self.state = (Self::A * self.state + Self::C) % Self::M;
        self.state as f64 / Self::M as f64
    }

    /// Next index in [0, n)
    pub fn next_index(&mut self, n: usize) -> usize {
        ((self.next_f64() * n as f64) as usize).min(n.saturating_sub(1))
    }
}

/// Random source behind a generator
#[derive(Debug, Clone)]
enum Source {
    Seeded(Lcg),
    Entropy(Pcg32),
}

impl Source {
    fn next_f64(&mut self) -> f64 {
        match self {
            Source::Seeded(lcg) => lcg.next_f64(),
            Source::Entropy(rng) => rng.random::<f64>(),
        }
    }

    fn next_index(&mut self, n: usize) -> usize {
        ((self.next_f64() * n as f64) as usize).min(n.saturating_sub(1))
    }
}

/// Produces shapes for the tray and previews
#[derive(Debug, Clone)]
pub struct ShapeGenerator {
    difficulty: Difficulty,
    catalog: Catalog,
    /// Set while a daily challenge overrides the catalog
    restricted: bool,
    source: Source,
    seed: Option<u64>,
    recent: VecDeque<usize>,
    next_id: u64,
}

impl ShapeGenerator {
    /// Nondeterministic generator
    pub fn new(difficulty: Difficulty) -> Self {
        let rng = Pcg32::from_rng(&mut rand::rng());
        Self::with_source(difficulty, Source::Entropy(rng), None)
    }

    /// Deterministic generator; same seed, same sequence
    pub fn seeded(difficulty: Difficulty, seed: u64) -> Self {
        Self::with_source(difficulty, Source::Seeded(Lcg::new(seed)), Some(seed))
    }

    fn with_source(difficulty: Difficulty, source: Source, seed: Option<u64>) -> Self {
        Self {
            difficulty,
            catalog: Catalog::for_difficulty(difficulty),
            restricted: false,
            source,
            seed,
            recent: VecDeque::with_capacity(RECENT_SHAPE_WINDOW),
            next_id: 1,
        }
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Switch difficulty; a daily restriction stays in force
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
        if !self.restricted {
            self.catalog = Catalog::for_difficulty(difficulty);
        }
    }

    /// Override the catalog with a fixed set of kinds
    pub fn restrict_to(&mut self, kinds: &[usize]) {
        let catalog = Catalog::from_kinds(kinds.iter().copied());
        if catalog.is_empty() {
            log::warn!("Ignoring empty shape restriction {:?}", kinds);
            return;
        }
        self.catalog = catalog;
        self.restricted = true;
        self.recent.clear();
    }

    /// Drop any override and return to the difficulty catalog
    pub fn clear_restriction(&mut self) {
        self.catalog = Catalog::for_difficulty(self.difficulty);
        self.restricted = false;
    }

    /// Draw one shape
    pub fn generate(&mut self, color_override: Option<Cell>) -> Shape {
        let count = self.catalog.len();
        let mut index = self.source.next_index(count);

        // Repeat avoidance only makes sense when the catalog can supply a full window
        if count >= RECENT_SHAPE_WINDOW {
            let mut attempts = 0;
            while attempts < MAX_RESAMPLE_ATTEMPTS && self.is_recent(index) {
                index = self.source.next_index(count);
                attempts += 1;
            }
        }

        let color = match color_override {
            Some(c) if c > 0 => c,
            _ => 1 + self.source.next_index(PALETTE_SIZE as usize) as Cell,
        };

        let (kind, pattern) = match self.catalog.get(index) {
            Some((kind, pattern)) => (kind, pattern.clone()),
            None => unreachable!("catalog index {index} out of {count}"),
        };

        self.recent.push_back(kind);
        while self.recent.len() > RECENT_SHAPE_WINDOW {
            self.recent.pop_front();
        }

        let id = self.next_id;
        self.next_id += 1;
        Shape::new(id, kind, pattern, color)
    }

    fn is_recent(&self, index: usize) -> bool {
        self.catalog
            .get(index)
            .map(|(kind, _)| self.recent.contains(&kind))
            .unwrap_or(false)
    }

    /// A full tray's worth of shapes
    pub fn generate_batch(&mut self, color_override: Option<Cell>) -> Tray {
        let mut tray = Tray::new();
        let shapes: Vec<Shape> = (0..TRAY_SIZE).map(|_| self.generate(color_override)).collect();
        tray.fill(shapes);
        tray
    }

    /// The batch the next `generate_batch` call would return, without consuming it
    pub fn peek_batch(&self, color_override: Option<Cell>) -> Tray {
        self.clone().generate_batch(color_override)
    }
}
