use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// How grid columns map onto the displayed table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridLayout {
    /// Column 0 holds the player label; cues live in columns `1..columns`.
    #[default]
    Labeled,
    /// Every column is a cue column.
    Plain,
}

impl GridLayout {
    /// Index of the first column that carries cues.
    pub fn first_data_column(self) -> usize {
        match self {
            Self::Labeled => 1,
            Self::Plain => 0,
        }
    }
}

/// Rectangular on/off table with one row per player and one column per slot.
///
/// Cells are stored row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CueGrid {
    rows: usize,
    columns: usize,
    layout: GridLayout,
    cells: Vec<bool>,
}

impl CueGrid {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn layout(&self) -> GridLayout {
        self.layout
    }

    /// Range of column indices that hold cues.
    pub fn data_columns(&self) -> std::ops::Range<usize> {
        self.layout.first_data_column().min(self.columns)..self.columns
    }

    pub fn is_active(&self, row: usize, column: usize) -> bool {
        self.index(row, column)
            .map(|index| self.cells[index])
            .unwrap_or(false)
    }

    /// Number of active cells in `column`.
    pub fn active_in_column(&self, column: usize) -> usize {
        (0..self.rows)
            .filter(|row| self.is_active(*row, column))
            .count()
    }

    /// Copies the table into nested rows for snapshots.
    pub fn to_rows(&self) -> Vec<Vec<bool>> {
        if self.columns == 0 {
            return vec![Vec::new(); self.rows];
        }
        self.cells
            .chunks(self.columns)
            .map(<[bool]>::to_vec)
            .collect()
    }

    pub(crate) fn set(&mut self, row: usize, column: usize, active: bool) {
        if let Some(index) = self.index(row, column) {
            self.cells[index] = active;
        }
    }

    fn index(&self, row: usize, column: usize) -> Option<usize> {
        (row < self.rows && column < self.columns).then(|| row * self.columns + column)
    }
}

/// Builds an all-empty `rows x columns` table.
///
/// # Example
/// ```
/// use engine::grid::{GridLayout, initialize};
///
/// let grid = initialize(3, 4, GridLayout::Labeled);
/// assert_eq!(grid.rows(), 3);
/// assert_eq!(grid.data_columns(), 1..4);
/// assert!(!grid.is_active(2, 3));
/// ```
pub fn initialize(rows: usize, columns: usize, layout: GridLayout) -> CueGrid {
    CueGrid {
        rows,
        columns,
        layout,
        cells: vec![false; rows * columns],
    }
}

/// Returns a copy of `grid` with one cell flipped.
///
/// Only cue columns can be toggled; the label column of a labeled grid is
/// reported as out of range.
pub fn toggle_cell(grid: &CueGrid, row: usize, column: usize) -> Result<CueGrid> {
    let index = grid
        .data_columns()
        .contains(&column)
        .then(|| grid.index(row, column))
        .flatten()
        .ok_or(EngineError::CellOutOfRange {
            row,
            column,
            rows: grid.rows,
            columns: grid.columns,
        })?;

    let mut next = grid.clone();
    next.cells[index] = !next.cells[index];
    Ok(next)
}

/// Returns an empty table with the same shape as `grid`.
pub fn clear_all(grid: &CueGrid) -> CueGrid {
    initialize(grid.rows, grid.columns, grid.layout)
}
