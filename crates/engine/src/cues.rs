use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::grid::CueGrid;

/// Annotation shown on top of the table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CueMode {
    #[default]
    None,
    /// Mark one changing player per column.
    Player,
    /// Show the timed playhead.
    Timed,
}

/// One performer expected to initiate the change into `column`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cue {
    pub row: usize,
    pub column: usize,
}

/// Picks one transition performer for every column whose on/off pattern
/// differs from the previous column.
///
/// Cues come back ordered by column, at most one per column.
///
/// # Example
/// ```
/// use engine::cues::derive_cues;
/// use engine::grid::{GridLayout, initialize, toggle_cell};
///
/// let grid = toggle_cell(&initialize(2, 3, GridLayout::Labeled), 1, 1).unwrap();
/// let cues = derive_cues(&grid, &mut rand::rng());
/// // Row 1 turns on in column 1 and off again in column 2.
/// assert_eq!(cues.len(), 2);
/// assert!(cues.iter().all(|cue| cue.row == 1));
/// ```
pub fn derive_cues<R: Rng + ?Sized>(grid: &CueGrid, rng: &mut R) -> Vec<Cue> {
    let mut cues = Vec::new();

    for column in 1..grid.columns() {
        let changed: Vec<usize> = (0..grid.rows())
            .filter(|row| grid.is_active(*row, column) != grid.is_active(*row, column - 1))
            .collect();

        if let Some(&row) = changed.choose(rng) {
            cues.push(Cue { row, column });
        }
    }

    cues
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::derive_cues;
    use crate::fill::{FillParams, FillStrategy, random_fill};
    use crate::grid::{GridLayout, initialize, toggle_cell};

    #[test]
    fn identical_adjacent_columns_produce_no_cue() {
        let grid = initialize(3, 4, GridLayout::Plain);
        let grid = toggle_cell(&grid, 0, 1).expect("toggle");
        let grid = toggle_cell(&grid, 0, 2).expect("toggle");
        let mut rng = StdRng::seed_from_u64(2);

        let cues = derive_cues(&grid, &mut rng);
        let columns: Vec<usize> = cues.iter().map(|cue| cue.column).collect();
        assert_eq!(columns, vec![1, 3]);
    }

    #[test]
    fn at_most_one_cue_per_column_and_only_on_changed_rows() {
        let grid = initialize(6, 10, GridLayout::Labeled);
        for seed in 0..30 {
            let mut rng = StdRng::seed_from_u64(seed);
            let params = FillParams {
                min_active: 1,
                max_extra: 3,
                strategy: FillStrategy::Shuffled,
            };
            let filled = random_fill(&grid, params, &mut rng);
            let cues = derive_cues(&filled, &mut rng);

            let columns: HashSet<usize> = cues.iter().map(|cue| cue.column).collect();
            assert_eq!(columns.len(), cues.len());
            for cue in cues {
                assert_ne!(
                    filled.is_active(cue.row, cue.column),
                    filled.is_active(cue.row, cue.column - 1)
                );
            }
        }
    }

    #[test]
    fn choice_is_spread_across_changed_rows() {
        let mut grid = initialize(3, 2, GridLayout::Plain);
        for row in 0..3 {
            grid = toggle_cell(&grid, row, 1).expect("toggle");
        }

        let mut rng = StdRng::seed_from_u64(9);
        let chosen: HashSet<usize> = (0..100)
            .map(|_| derive_cues(&grid, &mut rng)[0].row)
            .collect();
        assert_eq!(chosen.len(), 3);
    }

    #[test]
    fn empty_grid_has_no_cues() {
        let grid = initialize(4, 6, GridLayout::Labeled);
        assert!(derive_cues(&grid, &mut StdRng::seed_from_u64(0)).is_empty());
    }
}
