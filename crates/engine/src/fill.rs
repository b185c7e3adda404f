use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::grid::CueGrid;

/// How rows are chosen when a column is filled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillStrategy {
    /// Prefer players with the fewest activations so far in this fill.
    #[default]
    Balanced,
    /// Take a fresh uniform shuffle of all players per column.
    Shuffled,
}

/// Per-column activation bounds for [`random_fill`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillParams {
    pub min_active: usize,
    pub max_extra: usize,
    pub strategy: FillStrategy,
}

/// Returns a copy of `grid` where every data column holds a fresh random
/// selection of active players.
///
/// Each column draws `extra` from `0..=max_extra` and activates
/// `min(min_active + extra, rows)` distinct rows. Columns are cleared before
/// assignment and the label column of a labeled grid is left alone.
///
/// # Example
/// ```
/// use engine::fill::{FillParams, FillStrategy, random_fill};
/// use engine::grid::{GridLayout, initialize};
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
///
/// let grid = initialize(3, 3, GridLayout::Labeled);
/// let params = FillParams { min_active: 1, max_extra: 0, strategy: FillStrategy::Balanced };
/// let filled = random_fill(&grid, params, &mut StdRng::seed_from_u64(7));
/// assert_eq!(filled.active_in_column(1), 1);
/// assert_eq!(filled.active_in_column(2), 1);
/// assert_eq!(filled.active_in_column(0), 0);
/// ```
pub fn random_fill<R: Rng + ?Sized>(grid: &CueGrid, params: FillParams, rng: &mut R) -> CueGrid {
    let mut next = grid.clone();
    let rows = grid.rows();
    let mut activations = vec![0_usize; rows];

    for column in grid.data_columns() {
        let extra = rng.random_range(0..=params.max_extra);
        let active_count = params.min_active.saturating_add(extra).min(rows);

        let order = match params.strategy {
            FillStrategy::Balanced => least_used_first(&activations),
            FillStrategy::Shuffled => shuffled_rows(rows, rng),
        };

        for row in 0..rows {
            next.set(row, column, false);
        }
        for &row in order.iter().take(active_count) {
            next.set(row, column, true);
            activations[row] += 1;
        }
    }

    debug!(
        rows,
        columns = grid.columns(),
        min_active = params.min_active,
        max_extra = params.max_extra,
        strategy = ?params.strategy,
        "table filled"
    );
    next
}

/// Row indices ordered by ascending activation count, ties kept in row order.
fn least_used_first(activations: &[usize]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..activations.len()).collect();
    order.sort_by_key(|row| activations[*row]);
    order
}

fn shuffled_rows<R: Rng + ?Sized>(rows: usize, rng: &mut R) -> Vec<usize> {
    let mut order: Vec<usize> = (0..rows).collect();
    order.shuffle(rng);
    order
}
