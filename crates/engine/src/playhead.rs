use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::plan::DurationPlan;

/// Refresh interval of the continuous playhead (about 30 updates per second).
pub const CONTINUOUS_TICK_INTERVAL: Duration = Duration::from_millis(33);

/// Lifecycle of one playback run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    #[default]
    Idle,
    Running,
    Paused,
    Completed,
}

/// How the playhead is presented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayheadStyle {
    /// A bar sweeping smoothly across the plan.
    #[default]
    Continuous,
    /// A highlighted column that jumps once per equal time slot.
    Stepped,
}

/// Read-only playhead view consumed by renderers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayheadSnapshot {
    pub status: PlaybackStatus,
    pub style: PlayheadStyle,
    pub generation: u64,
    pub elapsed_seconds: f64,
    pub total_seconds: f64,
    /// Overall progress in `[0, 1]`.
    pub progress: f64,
    /// Cue column ordinal (0 is the first cue column) under the playhead.
    pub column: Option<usize>,
}

impl PlayheadSnapshot {
    pub fn percent(&self) -> f64 {
        self.progress * 100.0
    }
}

/// Playhead state machine.
///
/// Elapsed time is accumulated across pauses, so resuming continues from the
/// paused position. Position is always derived from elapsed time, never from
/// the number of ticks seen.
#[derive(Debug, Clone)]
pub struct Playhead {
    style: PlayheadStyle,
    status: PlaybackStatus,
    plan: DurationPlan,
    accumulated: Duration,
    running_since: Option<Instant>,
    generation: u64,
}

impl Playhead {
    pub fn new(style: PlayheadStyle) -> Self {
        Self {
            style,
            status: PlaybackStatus::Idle,
            plan: DurationPlan::from_durations(Vec::new()),
            accumulated: Duration::ZERO,
            running_since: None,
            generation: 0,
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn style(&self) -> PlayheadStyle {
        self.style
    }

    pub fn plan(&self) -> &DurationPlan {
        &self.plan
    }

    /// Identifies the current running stretch. Bumped by every start, resume
    /// and reset so ticks scheduled for an earlier stretch can be told apart.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Changing the style resets playback.
    pub fn set_style(&mut self, style: PlayheadStyle) {
        if self.style != style {
            self.style = style;
            self.reset();
        }
    }

    /// Interval at which renderers should be refreshed while running.
    ///
    /// The stepped playhead only changes once per slot.
    pub fn tick_interval(&self) -> Duration {
        match self.style {
            PlayheadStyle::Continuous => CONTINUOUS_TICK_INTERVAL,
            PlayheadStyle::Stepped => {
                let slots = self.plan.len().max(1) as f64;
                Duration::from_secs_f64(self.plan.total_seconds() / slots)
                    .max(Duration::from_millis(1))
            }
        }
    }

    /// Restarts from zero with `plan`. Returns the new generation.
    pub fn start(&mut self, plan: DurationPlan, now: Instant) -> u64 {
        self.plan = plan;
        self.accumulated = Duration::ZERO;
        self.running_since = Some(now);
        self.status = PlaybackStatus::Running;
        self.generation += 1;
        info!(
            generation = self.generation,
            columns = self.plan.len(),
            total_seconds = self.plan.total_seconds(),
            "playback started"
        );
        self.generation
    }

    /// Freezes elapsed time. Returns `false` unless the playhead was running.
    pub fn pause(&mut self, now: Instant) -> bool {
        if self.status != PlaybackStatus::Running {
            return false;
        }
        self.accumulated = self.elapsed(now);
        self.running_since = None;
        self.status = PlaybackStatus::Paused;
        debug!(
            generation = self.generation,
            elapsed_seconds = self.accumulated.as_secs_f64(),
            "playback paused"
        );
        true
    }

    /// Continues a paused run. Returns the new generation.
    pub fn resume(&mut self, now: Instant) -> Option<u64> {
        if self.status != PlaybackStatus::Paused {
            return None;
        }
        self.running_since = Some(now);
        self.status = PlaybackStatus::Running;
        self.generation += 1;
        debug!(
            generation = self.generation,
            elapsed_seconds = self.accumulated.as_secs_f64(),
            "playback resumed"
        );
        Some(self.generation)
    }

    /// Returns to idle from any state.
    pub fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
        self.running_since = None;
        self.status = PlaybackStatus::Idle;
        self.generation += 1;
    }

    /// Total elapsed playback time at `now`.
    pub fn elapsed(&self, now: Instant) -> Duration {
        match self.running_since {
            Some(since) => self.accumulated + now.saturating_duration_since(since),
            None => self.accumulated,
        }
    }

    /// Recomputes the position and completes the run once the plan total is
    /// reached. Returns `true` on the call that completes it.
    pub fn advance(&mut self, now: Instant) -> bool {
        if self.status != PlaybackStatus::Running {
            return false;
        }
        let total = Duration::from_secs_f64(self.plan.total_seconds().max(0.0));
        if self.elapsed(now) < total {
            return false;
        }

        self.accumulated = total;
        self.running_since = None;
        self.status = PlaybackStatus::Completed;
        info!(generation = self.generation, "playback completed");
        true
    }

    pub fn snapshot(&self, now: Instant) -> PlayheadSnapshot {
        let total_seconds = self.plan.total_seconds();
        let elapsed_seconds = self.elapsed(now).as_secs_f64();

        let (progress, column) = match self.status {
            PlaybackStatus::Idle => (0.0, None),
            PlaybackStatus::Completed => (1.0, None),
            PlaybackStatus::Running | PlaybackStatus::Paused => match self.style {
                PlayheadStyle::Continuous => (
                    self.plan.position_at(elapsed_seconds),
                    self.plan.column_at(elapsed_seconds),
                ),
                PlayheadStyle::Stepped => (
                    linear_progress(elapsed_seconds, total_seconds),
                    stepped_column(elapsed_seconds, total_seconds, self.plan.len()),
                ),
            },
        };

        PlayheadSnapshot {
            status: self.status,
            style: self.style,
            generation: self.generation,
            elapsed_seconds,
            total_seconds,
            progress,
            column,
        }
    }
}

/// Column highlighted by the stepped playhead: equal slots of
/// `total / slots` seconds each, no column once time runs out.
///
/// # Example
/// ```
/// use engine::playhead::stepped_column;
///
/// assert_eq!(stepped_column(0.0, 30.0, 3), Some(0));
/// assert_eq!(stepped_column(25.0, 30.0, 3), Some(2));
/// assert_eq!(stepped_column(30.0, 30.0, 3), None);
/// ```
pub fn stepped_column(elapsed_seconds: f64, total_seconds: f64, slots: usize) -> Option<usize> {
    if slots == 0 || total_seconds <= 0.0 || elapsed_seconds >= total_seconds {
        return None;
    }
    let slot_seconds = total_seconds / slots as f64;
    let index = (elapsed_seconds.max(0.0) / slot_seconds).floor() as usize;
    Some(index.min(slots - 1))
}

fn linear_progress(elapsed_seconds: f64, total_seconds: f64) -> f64 {
    if total_seconds <= 0.0 {
        return 1.0;
    }
    (elapsed_seconds / total_seconds).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::{PlaybackStatus, Playhead, PlayheadStyle};
    use crate::plan::DurationPlan;

    fn plan() -> DurationPlan {
        DurationPlan::from_durations(vec![30.0, 30.0, 30.0])
    }

    #[test]
    fn idle_playhead_rests_at_zero() {
        let playhead = Playhead::new(PlayheadStyle::Continuous);
        let snapshot = playhead.snapshot(Instant::now());

        assert_eq!(snapshot.status, PlaybackStatus::Idle);
        assert_eq!(snapshot.progress, 0.0);
        assert_eq!(snapshot.column, None);
    }

    #[test]
    fn running_position_follows_elapsed_time() {
        let t0 = Instant::now();
        let mut playhead = Playhead::new(PlayheadStyle::Continuous);
        playhead.start(plan(), t0);

        let snapshot = playhead.snapshot(t0 + Duration::from_secs(45));
        assert_eq!(snapshot.progress, 0.5);
        assert_eq!(snapshot.column, Some(1));
        assert_eq!(snapshot.percent(), 50.0);
    }

    #[test]
    fn pause_preserves_progress_across_resume() {
        let t0 = Instant::now();
        let mut playhead = Playhead::new(PlayheadStyle::Continuous);
        playhead.start(plan(), t0);

        assert!(playhead.pause(t0 + Duration::from_secs(30)));
        let paused = playhead.snapshot(t0 + Duration::from_secs(500));
        assert_eq!(paused.elapsed_seconds, 30.0);
        assert_eq!(paused.status, PlaybackStatus::Paused);

        playhead
            .resume(t0 + Duration::from_secs(500))
            .expect("resume from pause");
        let resumed = playhead.snapshot(t0 + Duration::from_secs(515));
        assert_eq!(resumed.elapsed_seconds, 45.0);
        assert_eq!(resumed.progress, 0.5);
    }

    #[test]
    fn reaching_total_completes_and_pins_progress() {
        let t0 = Instant::now();
        let mut playhead = Playhead::new(PlayheadStyle::Continuous);
        playhead.start(plan(), t0);

        assert!(!playhead.advance(t0 + Duration::from_secs(89)));
        assert!(playhead.advance(t0 + Duration::from_secs(91)));
        assert!(!playhead.advance(t0 + Duration::from_secs(92)));

        let snapshot = playhead.snapshot(t0 + Duration::from_secs(200));
        assert_eq!(snapshot.status, PlaybackStatus::Completed);
        assert_eq!(snapshot.progress, 1.0);
        assert_eq!(snapshot.elapsed_seconds, 90.0);
    }

    #[test]
    fn reset_returns_to_idle_and_bumps_generation() {
        let t0 = Instant::now();
        let mut playhead = Playhead::new(PlayheadStyle::Continuous);
        let started = playhead.start(plan(), t0);
        playhead.advance(t0 + Duration::from_secs(100));

        playhead.reset();
        assert_eq!(playhead.status(), PlaybackStatus::Idle);
        assert!(playhead.generation() > started);
        assert_eq!(playhead.elapsed(t0 + Duration::from_secs(300)), Duration::ZERO);
    }

    #[test]
    fn pause_and_resume_only_apply_in_matching_states() {
        let t0 = Instant::now();
        let mut playhead = Playhead::new(PlayheadStyle::Continuous);

        assert!(!playhead.pause(t0));
        assert_eq!(playhead.resume(t0), None);
        playhead.start(plan(), t0);
        assert_eq!(playhead.resume(t0), None);
    }

    #[test]
    fn stepped_playhead_jumps_per_equal_slot() {
        let t0 = Instant::now();
        let mut playhead = Playhead::new(PlayheadStyle::Stepped);
        playhead.start(DurationPlan::from_durations(vec![5.0, 20.0, 5.0]), t0);

        assert_eq!(playhead.tick_interval(), Duration::from_secs(10));
        assert_eq!(playhead.snapshot(t0 + Duration::from_secs(9)).column, Some(0));
        assert_eq!(playhead.snapshot(t0 + Duration::from_secs(10)).column, Some(1));
        assert_eq!(playhead.snapshot(t0 + Duration::from_secs(29)).column, Some(2));
    }

    #[test]
    fn changing_style_resets_playback() {
        let t0 = Instant::now();
        let mut playhead = Playhead::new(PlayheadStyle::Continuous);
        playhead.start(plan(), t0);

        playhead.set_style(PlayheadStyle::Stepped);
        assert_eq!(playhead.status(), PlaybackStatus::Idle);
    }
}
