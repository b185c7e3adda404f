use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Lower bound of the uneven-pacing multiplier.
const UNEVEN_MIN_FACTOR: f64 = 0.2;
/// Upper bound of the uneven-pacing multiplier.
const UNEVEN_MAX_FACTOR: f64 = 2.0;

/// How the piece duration is spread over the cue columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pacing {
    #[default]
    Even,
    Uneven,
}

/// Per-column durations in seconds, one entry per cue column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationPlan {
    durations: Vec<f64>,
    total_seconds: f64,
}

impl DurationPlan {
    /// Wraps explicit durations. The total is their sum.
    pub fn from_durations(durations: Vec<f64>) -> Self {
        let total_seconds: f64 = durations.iter().sum();
        Self {
            durations,
            total_seconds,
        }
    }

    pub fn durations(&self) -> &[f64] {
        &self.durations
    }

    pub fn total_seconds(&self) -> f64 {
        self.total_seconds
    }

    pub fn len(&self) -> usize {
        self.durations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }

    /// Start offset of every column plus the end of the last one.
    pub fn cumulative(&self) -> Vec<f64> {
        let mut sum = 0.0;
        let mut out = Vec::with_capacity(self.durations.len() + 1);
        out.push(sum);
        for duration in &self.durations {
            sum += duration;
            out.push(sum);
        }
        out
    }

    /// Progress through the plan at `elapsed_seconds`, in `[0, 1]`.
    pub fn position_at(&self, elapsed_seconds: f64) -> f64 {
        position_in(elapsed_seconds, &self.durations, self.total_seconds)
    }

    /// Index of the column the playhead is in at `elapsed_seconds`.
    ///
    /// Returns `None` once the plan has finished.
    pub fn column_at(&self, elapsed_seconds: f64) -> Option<usize> {
        if elapsed_seconds >= self.total_seconds {
            return None;
        }
        locate(elapsed_seconds.max(0.0), &self.durations).map(|(index, _)| index)
    }
}

/// Generates the per-column duration plan for `columns` table columns.
///
/// The label column is excluded, so the plan has `columns - 1` entries and is
/// empty for a single column.
///
/// Uneven pacing draws each column from `[0.2, 2.0]` times the average of
/// what remains and hands the remainder to the last column. Each draw is
/// clamped to the remaining total so no column goes negative.
///
/// # Example
/// ```
/// use engine::plan::{Pacing, generate_plan};
///
/// let plan = generate_plan(4, 90.0, Pacing::Even, &mut rand::rng());
/// assert_eq!(plan.durations(), &[30.0, 30.0, 30.0]);
/// ```
pub fn generate_plan<R: Rng + ?Sized>(
    columns: usize,
    total_seconds: f64,
    pacing: Pacing,
    rng: &mut R,
) -> DurationPlan {
    plan_for_slots(columns.saturating_sub(1), total_seconds, pacing, rng)
}

/// Generates a plan with exactly `count` entries, one per cue column.
pub fn plan_for_slots<R: Rng + ?Sized>(
    count: usize,
    total_seconds: f64,
    pacing: Pacing,
    rng: &mut R,
) -> DurationPlan {
    if count == 0 {
        return DurationPlan {
            durations: Vec::new(),
            total_seconds,
        };
    }

    let durations = match pacing {
        Pacing::Even => vec![total_seconds / count as f64; count],
        Pacing::Uneven => {
            let mut durations = Vec::with_capacity(count);
            let mut remaining = total_seconds;
            for index in 0..count - 1 {
                let average = remaining / (count - index) as f64;
                let factor = rng.random_range(UNEVEN_MIN_FACTOR..=UNEVEN_MAX_FACTOR);
                let duration = (average * factor).min(remaining);
                durations.push(duration);
                remaining -= duration;
            }
            durations.push(remaining.max(0.0));
            durations
        }
    };

    debug!(count, total_seconds, ?pacing, ?durations, "duration plan generated");
    DurationPlan {
        durations,
        total_seconds,
    }
}

/// Maps elapsed seconds onto overall progress through `plan`.
///
/// Returns exactly `1.0` once `elapsed_seconds` reaches the plan total.
///
/// # Example
/// ```
/// use engine::plan::position_at;
///
/// assert_eq!(position_at(45.0, &[30.0, 30.0, 30.0]), 0.5);
/// assert_eq!(position_at(90.0, &[30.0, 30.0, 30.0]), 1.0);
/// ```
pub fn position_at(elapsed_seconds: f64, plan: &[f64]) -> f64 {
    position_in(elapsed_seconds, plan, plan.iter().sum())
}

fn position_in(elapsed_seconds: f64, plan: &[f64], total_seconds: f64) -> f64 {
    if elapsed_seconds >= total_seconds {
        return 1.0;
    }
    let elapsed = elapsed_seconds.max(0.0);
    if plan.is_empty() {
        return (elapsed / total_seconds).clamp(0.0, 1.0);
    }

    match locate(elapsed, plan) {
        Some((index, start)) => {
            let within = (elapsed - start) / plan[index];
            ((index as f64 + within) / plan.len() as f64).clamp(0.0, 1.0)
        }
        // Float drift between the configured total and the plan sum.
        None => 1.0,
    }
}

/// Finds the entry containing `elapsed` and its start offset. Zero-length
/// entries never match.
fn locate(elapsed: f64, plan: &[f64]) -> Option<(usize, f64)> {
    let mut start = 0.0;
    for (index, duration) in plan.iter().enumerate() {
        let end = start + duration;
        if start <= elapsed && elapsed < end {
            return Some((index, start));
        }
        start = end;
    }
    None
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::{DurationPlan, Pacing, generate_plan, position_at};

    #[test]
    fn even_plan_splits_total_across_data_columns() {
        let mut rng = StdRng::seed_from_u64(0);
        let plan = generate_plan(4, 90.0, Pacing::Even, &mut rng);

        assert_eq!(plan.durations(), &[30.0, 30.0, 30.0]);
        assert_eq!(plan.cumulative(), vec![0.0, 30.0, 60.0, 90.0]);
    }

    #[test]
    fn plans_sum_to_requested_total() {
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            for columns in 2..=20 {
                for pacing in [Pacing::Even, Pacing::Uneven] {
                    let plan = generate_plan(columns, 317.0, pacing, &mut rng);
                    let sum: f64 = plan.durations().iter().sum();
                    assert_eq!(plan.len(), columns - 1);
                    assert!((sum - 317.0).abs() < 1e-9, "sum {sum} for {columns} columns");
                    assert!(plan.durations().iter().all(|duration| *duration >= 0.0));
                }
            }
        }
    }

    #[test]
    fn uneven_plan_draws_within_multiplier_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        let plan = generate_plan(5, 400.0, Pacing::Uneven, &mut rng);

        let first = plan.durations()[0];
        assert!((20.0..=200.0).contains(&first), "first column {first}");
    }

    #[test]
    fn single_column_has_empty_plan() {
        let mut rng = StdRng::seed_from_u64(0);
        let plan = generate_plan(1, 60.0, Pacing::Uneven, &mut rng);

        assert!(plan.is_empty());
        assert_eq!(plan.position_at(30.0), 0.5);
        assert_eq!(plan.position_at(60.0), 1.0);
    }

    #[test]
    fn position_is_halfway_through_second_segment() {
        assert_eq!(position_at(45.0, &[30.0, 30.0, 30.0]), 0.5);
    }

    #[test]
    fn position_at_total_is_exactly_one() {
        let mut rng = StdRng::seed_from_u64(8);
        for pacing in [Pacing::Even, Pacing::Uneven] {
            let plan = generate_plan(9, 123.0, pacing, &mut rng);
            assert_eq!(plan.position_at(123.0), 1.0);
            assert_eq!(plan.position_at(500.0), 1.0);
        }
        assert_eq!(position_at(90.0, &[30.0, 30.0, 30.0]), 1.0);
    }

    #[test]
    fn uneven_segments_map_to_equal_column_widths() {
        let plan = DurationPlan::from_durations(vec![10.0, 30.0]);

        assert_eq!(plan.position_at(10.0), 0.5);
        assert_eq!(plan.position_at(25.0), 0.75);
        assert_eq!(plan.column_at(5.0), Some(0));
        assert_eq!(plan.column_at(39.0), Some(1));
        assert_eq!(plan.column_at(40.0), None);
    }

    #[test]
    fn zero_length_segments_are_skipped() {
        let plan = DurationPlan::from_durations(vec![10.0, 0.0, 10.0]);

        assert_eq!(plan.column_at(10.0), Some(2));
        assert!((plan.position_at(15.0) - (2.5 / 3.0)).abs() < 1e-12);
    }

    #[test]
    fn negative_elapsed_is_rest_position() {
        assert_eq!(position_at(-5.0, &[30.0, 30.0]), 0.0);
    }
}
