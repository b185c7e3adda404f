//! UI-agnostic cue table and playhead engine for OpenGrid.

pub mod api;
pub mod clock;
pub mod config;
pub mod cues;
pub mod error;
pub mod fill;
pub mod grid;
pub mod import;
pub mod plan;
pub mod playhead;
pub mod roster;
pub mod scheduler;
pub mod time;

pub use api::{
    Command, Engine, EngineErrorEvent, EngineErrorKind, Event, TableSnapshot, TickSink,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{GridConfig, TableSettings};
pub use cues::{Cue, CueMode};
pub use error::{EngineError, Result};
pub use fill::FillStrategy;
pub use grid::{CueGrid, GridLayout};
pub use plan::{DurationPlan, Pacing};
pub use playhead::{PlaybackStatus, PlayheadSnapshot, PlayheadStyle};
pub use roster::{MoveDirection, Roster};
pub use scheduler::{ManualScheduler, Scheduler, ThreadScheduler, TickCallback, TimerHandle};
pub use time::{PieceDuration, format_clock};
