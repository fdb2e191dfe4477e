//! Piece geometry
//!
//! A `Pattern` is a rectangular block mask; a `Shape` is a pattern plus the
//! identity and colour it carries while sitting in the tray. Both are plain
//! values: rotating or cloning always produces an independent copy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::grid::Cell;

/// Malformed pattern literal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("pattern has no rows or columns")]
    Empty,
    #[error("pattern row {row} has {found} cells, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("pattern contains no blocks")]
    NoBlocks,
}

/// Rectangular block mask (row-major, `true` = block present)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pattern {
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

impl Pattern {
    /// Build from rows of 0/1 values
    pub fn from_rows<R: AsRef<[u8]>>(rows: &[R]) -> Result<Self, PatternError> {
        let height = rows.len();
        let width = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        if height == 0 || width == 0 {
            return Err(PatternError::Empty);
        }

        let mut cells = Vec::with_capacity(width * height);
        for (row, values) in rows.iter().enumerate() {
            let values = values.as_ref();
            if values.len() != width {
                return Err(PatternError::Ragged {
                    row,
                    expected: width,
                    found: values.len(),
                });
            }
            cells.extend(values.iter().map(|&v| v != 0));
        }

        if !cells.iter().any(|&c| c) {
            return Err(PatternError::NoBlocks);
        }

        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Build from a known-good literal (catalog tables)
    ///
    /// # Panics
    /// Panics if the literal is empty, ragged or has no blocks.
    pub fn literal(rows: &[&[u8]]) -> Self {
        match Self::from_rows(rows) {
            Ok(pattern) => pattern,
            Err(e) => panic!("invalid pattern literal: {e}"),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Block at (row, col); false outside the bounding box
    pub fn is_block(&self, row: usize, col: usize) -> bool {
        row < self.height && col < self.width && self.cells[row * self.width + col]
    }

    /// Offsets (row, col) of every block, row-major
    pub fn blocks(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, b)| **b)
            .map(move |(i, _)| (i / self.width, i % self.width))
    }

    pub fn block_count(&self) -> usize {
        self.cells.iter().filter(|&&b| b).count()
    }

    /// Rotate 90° clockwise (transpose, then reverse each row)
    pub fn rotate_cw(&self) -> Self {
        let (w, h) = (self.width, self.height);
        let mut cells = vec![false; w * h];
        // new[r][c] = old[h - 1 - c][r], new dims: h columns, w rows
        for r in 0..w {
            for c in 0..h {
                cells[r * h + c] = self.cells[(h - 1 - c) * w + r];
            }
        }
        Self {
            width: h,
            height: w,
            cells,
        }
    }

    /// Rows as 0/1 vectors (rendering / JSON)
    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        self.cells
            .chunks(self.width)
            .map(|row| row.iter().map(|&b| b as u8).collect())
            .collect()
    }
}

/// A piece offered in the tray
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shape {
    id: u64,
    kind: usize,
    pattern: Pattern,
    color: Cell,
}

impl Shape {
    pub fn new(id: u64, kind: usize, pattern: Pattern, color: Cell) -> Self {
        debug_assert!(color > 0, "shape colour must be a positive cell value");
        Self {
            id,
            kind,
            pattern,
            color,
        }
    }

    /// Generator-assigned unique id
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Index of the base pattern in the full catalog
    pub fn kind(&self) -> usize {
        self.kind
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn color(&self) -> Cell {
        self.color
    }

    pub fn width(&self) -> usize {
        self.pattern.width()
    }

    pub fn height(&self) -> usize {
        self.pattern.height()
    }

    /// Same piece turned 90° clockwise
    pub fn rotated(&self) -> Self {
        Self {
            pattern: self.pattern.rotate_cw(),
            ..self.clone()
        }
    }

    /// Same piece painted another colour
    pub fn recolored(&self, color: Cell) -> Self {
        Self {
            color,
            ..self.clone()
        }
    }
}
