//! Board occupancy and line-clear mechanics
//!
//! The board is a fixed 10x10 matrix. A cell value of 0 is empty; any
//! positive value is the colour id of the block occupying it. Cells change
//! only through placement and clearing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::shape::Pattern;
use crate::consts::GRID_SIZE;

/// Cell value (0 = empty, >0 = colour id)
pub type Cell = u32;

/// Empty cell marker
pub const EMPTY: Cell = 0;

/// Why a placement was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum PlaceError {
    #[error("shape extends outside the grid")]
    OutOfBounds,
    #[error("target cell is already occupied")]
    Occupied,
    #[error("tray slot {0} is empty")]
    EmptySlot(usize),
    #[error("game is over")]
    GameOver,
}

impl PlaceError {
    /// Stable code for UI/analytics
    pub fn reason(&self) -> &'static str {
        match self {
            PlaceError::OutOfBounds => "out_of_bounds",
            PlaceError::Occupied => "occupied",
            PlaceError::EmptySlot(_) => "empty_slot",
            PlaceError::GameOver => "game_over",
        }
    }
}

/// Row or column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineKind {
    Row,
    Column,
}

/// Completed rows and columns (ascending indices)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedLines {
    pub rows: Vec<usize>,
    pub cols: Vec<usize>,
}

impl CompletedLines {
    /// No line completed
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.cols.is_empty()
    }

    pub fn total(&self) -> usize {
        self.rows.len() + self.cols.len()
    }

    /// Both rows and columns present
    pub fn is_cross(&self) -> bool {
        !self.rows.is_empty() && !self.cols.is_empty()
    }
}

/// The 10x10 board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    cells: [[Cell; GRID_SIZE]; GRID_SIZE],
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

impl Grid {
    /// Empty board
    pub fn new() -> Self {
        Self {
            cells: [[EMPTY; GRID_SIZE]; GRID_SIZE],
        }
    }

    /// Board from explicit rows (tests, restored saves)
    pub fn from_cells(cells: [[Cell; GRID_SIZE]; GRID_SIZE]) -> Self {
        Self { cells }
    }

    /// Cell at (row, col); None when out of bounds
    pub fn get(&self, row: usize, col: usize) -> Option<Cell> {
        self.cells.get(row).and_then(|r| r.get(col)).copied()
    }

    pub fn rows(&self) -> &[[Cell; GRID_SIZE]; GRID_SIZE] {
        &self.cells
    }

    pub fn is_empty(&self) -> bool {
        self.filled_count() == 0
    }

    pub fn filled_count(&self) -> usize {
        self.cells.iter().flatten().filter(|&&c| c != EMPTY).count()
    }

    /// Board target of a pattern block, if in bounds
    fn target(row: i32, col: i32, dr: usize, dc: usize) -> Option<(usize, usize)> {
        let r = row + dr as i32;
        let c = col + dc as i32;
        let size = GRID_SIZE as i32;
        if (0..size).contains(&r) && (0..size).contains(&c) {
            Some((r as usize, c as usize))
        } else {
            None
        }
    }

    /// Check a placement without touching the board
    pub fn check_placement(&self, pattern: &Pattern, row: i32, col: i32) -> Result<(), PlaceError> {
        for (dr, dc) in pattern.blocks() {
            let (r, c) = Self::target(row, col, dr, dc).ok_or(PlaceError::OutOfBounds)?;
            if self.cells[r][c] != EMPTY {
                return Err(PlaceError::Occupied);
            }
        }
        Ok(())
    }

    /// Every block lands in bounds on an empty cell
    pub fn can_place(&self, pattern: &Pattern, row: i32, col: i32) -> bool {
        self.check_placement(pattern, row, col).is_ok()
    }

    /// Write `color` into every block cell; all-or-nothing
    pub fn place(&mut self, pattern: &Pattern, row: i32, col: i32, color: Cell) -> Result<(), PlaceError> {
        debug_assert!(color != EMPTY, "placed blocks need a colour");
        self.check_placement(pattern, row, col)?;
        for (dr, dc) in pattern.blocks() {
            // Validated above
            let r = (row + dr as i32) as usize;
            let c = (col + dc as i32) as usize;
            self.cells[r][c] = color;
        }
        Ok(())
    }

    pub fn is_row_full(&self, row: usize) -> bool {
        self.cells[row].iter().all(|&c| c != EMPTY)
    }

    pub fn is_col_full(&self, col: usize) -> bool {
        self.cells.iter().all(|r| r[col] != EMPTY)
    }

    /// Rows and columns with every cell filled (checked independently)
    pub fn completed_lines(&self) -> CompletedLines {
        CompletedLines {
            rows: (0..GRID_SIZE).filter(|&r| self.is_row_full(r)).collect(),
            cols: (0..GRID_SIZE).filter(|&c| self.is_col_full(c)).collect(),
        }
    }

    /// Zero every listed row and column
    pub fn clear_lines(&mut self, rows: &[usize], cols: &[usize]) {
        for &r in rows {
            self.clear_line(r, LineKind::Row);
        }
        for &c in cols {
            self.clear_line(c, LineKind::Column);
        }
    }

    /// Zero a single row or column; out-of-range index is ignored
    pub fn clear_line(&mut self, index: usize, kind: LineKind) {
        if index >= GRID_SIZE {
            return;
        }
        match kind {
            LineKind::Row => self.cells[index] = [EMPTY; GRID_SIZE],
            LineKind::Column => {
                for row in &mut self.cells {
                    row[index] = EMPTY;
                }
            }
        }
    }

    /// Zero the square of cells within `radius` of (row, col), clipped to the board.
    /// Returns how many occupied cells were removed.
    pub fn clear_area(&mut self, row: usize, col: usize, radius: usize) -> usize {
        let mut removed = 0;
        let r0 = row.saturating_sub(radius);
        let c0 = col.saturating_sub(radius);
        let r1 = (row + radius).min(GRID_SIZE - 1);
        let c1 = (col + radius).min(GRID_SIZE - 1);
        for r in r0..=r1 {
            for c in c0..=c1 {
                if self.cells[r][c] != EMPTY {
                    self.cells[r][c] = EMPTY;
                    removed += 1;
                }
            }
        }
        removed
    }

    /// Indices of the `n` rows holding the most blocks (ties → lower index first)
    pub fn fullest_rows(&self, n: usize) -> Vec<usize> {
        let mut rows: Vec<(usize, usize)> = (0..GRID_SIZE)
            .map(|r| (r, self.cells[r].iter().filter(|&&c| c != EMPTY).count()))
            .filter(|&(_, count)| count > 0)
            .collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        rows.into_iter().take(n).map(|(r, _)| r).collect()
    }

    /// Every origin where the pattern fits
    pub fn valid_origins(&self, pattern: &Pattern) -> Vec<(i32, i32)> {
        let max_r = GRID_SIZE.saturating_sub(pattern.height()) as i32;
        let max_c = GRID_SIZE.saturating_sub(pattern.width()) as i32;
        let mut out = Vec::new();
        for r in 0..=max_r {
            for c in 0..=max_c {
                if self.can_place(pattern, r, c) {
                    out.push((r, c));
                }
            }
        }
        out
    }

    /// Whether the pattern fits anywhere
    pub fn has_any_placement(&self, pattern: &Pattern) -> bool {
        let max_r = GRID_SIZE.saturating_sub(pattern.height()) as i32;
        let max_c = GRID_SIZE.saturating_sub(pattern.width()) as i32;
        (0..=max_r).any(|r| (0..=max_c).any(|c| self.can_place(pattern, r, c)))
    }

    /// Occupancy mask (true = filled)
    pub fn occupancy(&self) -> [[bool; GRID_SIZE]; GRID_SIZE] {
        let mut mask = [[false; GRID_SIZE]; GRID_SIZE];
        for (r, row) in self.cells.iter().enumerate() {
            for (c, &cell) in row.iter().enumerate() {
                mask[r][c] = cell != EMPTY;
            }
        }
        mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn single() -> Pattern {
        Pattern::literal(&[&[1]])
    }

    #[test]
    fn test_placement_bounds_and_overlap() {
        let mut grid = Grid::new();
        let bar = Pattern::literal(&[&[1, 1, 1]]);

        assert!(grid.can_place(&bar, 0, 7));
        assert!(!grid.can_place(&bar, 0, 8));
        assert!(!grid.can_place(&bar, -1, 0));
        assert_eq!(grid.place(&bar, 9, 8, 1), Err(PlaceError::OutOfBounds));
        assert!(grid.is_empty(), "failed placement must not write anything");

        grid.place(&bar, 4, 2, 3).unwrap();
        assert_eq!(grid.get(4, 2), Some(3));
        assert_eq!(grid.get(4, 4), Some(3));
        assert_eq!(grid.filled_count(), 3);

        let vertical = Pattern::literal(&[&[1], &[1]]);
        assert_eq!(grid.place(&vertical, 3, 3, 5), Err(PlaceError::Occupied));
        assert_eq!(grid.get(3, 3), Some(EMPTY));
    }

    #[test]
    fn test_holes_in_pattern_may_cover_filled_cells() {
        let mut grid = Grid::new();
        grid.place(&single(), 1, 1, 2).unwrap();
        // X.
        // .X
        let diag = Pattern::literal(&[&[1, 0], &[0, 1]]);
        assert!(grid.can_place(&diag, 0, 1));
        assert!(!grid.can_place(&diag, 0, 0));
    }

    #[test]
    fn test_row_completed_by_single_blocks() {
        let mut grid = Grid::new();
        for c in 0..GRID_SIZE {
            assert!(grid.completed_lines().is_empty());
            grid.place(&single(), 5, c as i32, 1).unwrap();
        }
        let lines = grid.completed_lines();
        assert_eq!(lines.rows, vec![5]);
        assert!(lines.cols.is_empty());

        grid.place(&single(), 0, 0, 2).unwrap();
        grid.clear_lines(&lines.rows, &lines.cols);
        assert_eq!(grid.filled_count(), 1);
        assert_eq!(grid.get(0, 0), Some(2));
    }

    #[test]
    fn test_cross_clear_shares_corner() {
        let mut grid = Grid::new();
        for i in 0..GRID_SIZE {
            grid.place(&single(), 2, i as i32, 1).unwrap();
            if i != 2 {
                grid.place(&single(), i as i32, 7, 1).unwrap();
            }
        }
        let lines = grid.completed_lines();
        assert_eq!(lines.rows, vec![2]);
        assert_eq!(lines.cols, vec![7]);
        assert!(lines.is_cross());
        assert_eq!(lines.total(), 2);

        grid.clear_lines(&lines.rows, &lines.cols);
        assert!(grid.is_empty());
    }

    #[test]
    fn test_clear_area_clips_to_board() {
        let mut grid = Grid::from_cells([[4; GRID_SIZE]; GRID_SIZE]);
        assert_eq!(grid.clear_area(0, 0, 1), 4);
        assert_eq!(grid.clear_area(5, 5, 1), 9);
        assert_eq!(grid.clear_area(5, 5, 1), 0);
        assert_eq!(grid.filled_count(), 100 - 13);
    }

    #[test]
    fn test_fullest_rows_ordering() {
        let mut grid = Grid::new();
        let bar = Pattern::literal(&[&[1, 1, 1]]);
        grid.place(&bar, 6, 0, 1).unwrap();
        grid.place(&bar, 6, 3, 1).unwrap();
        grid.place(&bar, 2, 0, 1).unwrap();
        grid.place(&bar, 8, 0, 1).unwrap();
        grid.place(&single(), 0, 0, 1).unwrap();
        assert_eq!(grid.fullest_rows(3), vec![6, 2, 8]);
        assert_eq!(grid.fullest_rows(10).len(), 4);
    }

    #[test]
    fn test_has_any_placement_on_full_board() {
        let mut cells = [[1; GRID_SIZE]; GRID_SIZE];
        cells[9][9] = EMPTY;
        let grid = Grid::from_cells(cells);
        assert!(grid.has_any_placement(&single()));
        assert_eq!(grid.valid_origins(&single()), vec![(9, 9)]);
        assert!(!grid.has_any_placement(&Pattern::literal(&[&[1, 1]])));
    }

    fn arb_grid() -> impl Strategy<Value = Grid> {
        proptest::collection::vec(0u32..3, GRID_SIZE * GRID_SIZE).prop_map(|v| {
            let mut cells = [[EMPTY; GRID_SIZE]; GRID_SIZE];
            for (i, value) in v.into_iter().enumerate() {
                cells[i / GRID_SIZE][i % GRID_SIZE] = value;
            }
            Grid::from_cells(cells)
        })
    }

    fn arb_pattern() -> impl Strategy<Value = Pattern> {
        proptest::collection::vec(proptest::collection::vec(0u8..2, 3), 1..4)
            .prop_filter_map("needs a block", |rows| Pattern::from_rows(&rows).ok())
    }

    proptest! {
        #[test]
        fn prop_placement_soundness(grid in arb_grid(), p in arb_pattern(), r in -3i32..12, c in -3i32..12) {
            let expected = p.blocks().all(|(dr, dc)| {
                let (tr, tc) = (r + dr as i32, c + dc as i32);
                (0..10).contains(&tr) && (0..10).contains(&tc) && grid.get(tr as usize, tc as usize) == Some(EMPTY)
            });
            prop_assert_eq!(grid.can_place(&p, r, c), expected);

            let mut after = grid.clone();
            let result = after.place(&p, r, c, 9);
            prop_assert_eq!(result.is_ok(), expected);
            for row in 0..GRID_SIZE {
                for col in 0..GRID_SIZE {
                    let covered = expected
                        && row as i32 >= r && col as i32 >= c
                        && p.is_block((row as i32 - r) as usize, (col as i32 - c) as usize);
                    let want = if covered { 9 } else { grid.get(row, col).unwrap() };
                    prop_assert_eq!(after.get(row, col), Some(want));
                }
            }
        }

        #[test]
        fn prop_line_detection_and_clear(grid in arb_grid()) {
            let lines = grid.completed_lines();
            for r in 0..GRID_SIZE {
                let full = (0..GRID_SIZE).all(|c| grid.get(r, c) != Some(EMPTY));
                prop_assert_eq!(lines.rows.contains(&r), full);
            }
            for c in 0..GRID_SIZE {
                let full = (0..GRID_SIZE).all(|r| grid.get(r, c) != Some(EMPTY));
                prop_assert_eq!(lines.cols.contains(&c), full);
            }

            let mut cleared = grid.clone();
            cleared.clear_lines(&lines.rows, &lines.cols);
            for r in 0..GRID_SIZE {
                for c in 0..GRID_SIZE {
                    let in_line = lines.rows.contains(&r) || lines.cols.contains(&c);
                    let want = if in_line { EMPTY } else { grid.get(r, c).unwrap() };
                    prop_assert_eq!(cleared.get(r, c), Some(want));
                }
            }

            let mut again = cleared.clone();
            again.clear_lines(&lines.rows, &lines.cols);
            prop_assert_eq!(again, cleared);
        }
    }
}
