use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Shortest piece length accepted by the duration slider, in seconds.
pub const MIN_PIECE_SECONDS: u32 = 30;
/// Longest piece length accepted by the duration slider, in seconds.
pub const MAX_PIECE_SECONDS: u32 = 5_400;
/// Upper bound of the minutes field.
pub const MAX_MINUTES: u32 = 90;
/// Upper bound of the seconds field.
pub const MAX_SECONDS_FIELD: u32 = 59;

/// Total length of a performance in whole seconds.
///
/// Built either from the slider range or from separate minute and second
/// fields; both paths clamp instead of failing.
///
/// # Example
/// ```
/// use engine::PieceDuration;
///
/// let duration = PieceDuration::from_seconds(10);
/// assert_eq!(duration.total_seconds(), 30);
///
/// let parts = PieceDuration::from_parts(2, 75);
/// assert_eq!(parts.total_seconds(), 2 * 60 + 59);
/// assert_eq!(parts.minutes_and_seconds(), (2, 59));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PieceDuration(u32);

impl PieceDuration {
    /// Clamps `seconds` to the slider range `[30, 5400]`.
    pub fn from_seconds(seconds: u32) -> Self {
        Self(seconds.clamp(MIN_PIECE_SECONDS, MAX_PIECE_SECONDS))
    }

    /// Clamps minutes to `[0, 90]` and seconds to `[0, 59]`.
    ///
    /// The fields bypass the slider minimum, so only a zero total is lifted
    /// to one second.
    pub fn from_parts(minutes: u32, seconds: u32) -> Self {
        let minutes = minutes.min(MAX_MINUTES);
        let seconds = seconds.min(MAX_SECONDS_FIELD);
        Self((minutes * 60 + seconds).max(1))
    }

    pub fn total_seconds(self) -> u32 {
        self.0
    }

    pub fn as_secs_f64(self) -> f64 {
        f64::from(self.0)
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_secs(u64::from(self.0))
    }

    /// Splits the total back into the minute and second fields.
    pub fn minutes_and_seconds(self) -> (u32, u32) {
        (self.0 / 60, self.0 % 60)
    }
}

impl Default for PieceDuration {
    fn default() -> Self {
        Self(MIN_PIECE_SECONDS)
    }
}

/// Formats seconds as `m:ss` for status lines.
pub fn format_clock(seconds: f64) -> String {
    let whole = seconds.max(0.0).floor() as u64;
    format!("{}:{:02}", whole / 60, whole % 60)
}
