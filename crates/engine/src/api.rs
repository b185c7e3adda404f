use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::{GridConfig, TableSettings, clamp_columns};
use crate::cues::{Cue, CueMode, derive_cues};
use crate::error::{EngineError, Result};
use crate::fill::{FillStrategy, random_fill};
use crate::grid::{CueGrid, GridLayout, clear_all, initialize, toggle_cell};
use crate::plan::{DurationPlan, Pacing, plan_for_slots};
use crate::playhead::{PlaybackStatus, Playhead, PlayheadSnapshot, PlayheadStyle};
use crate::roster::{MoveDirection, Roster};
use crate::scheduler::{Scheduler, ThreadScheduler, TimerHandle};
use crate::time::PieceDuration;

/// Commands accepted by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Appends comma-separated names.
    AddPlayers {
        text: String,
    },
    RemovePlayer {
        index: usize,
    },
    MovePlayer {
        index: usize,
        direction: MoveDirection,
    },
    ClearPlayers,
    /// Replaces the roster with names parsed from file text. Text without
    /// usable names leaves the roster as it is and emits nothing.
    ImportNames {
        text: String,
    },
    SetColumns {
        columns: usize,
    },
    SetMinActive {
        count: usize,
    },
    SetMaxExtra {
        count: usize,
    },
    /// Sets the piece length from the slider, clamped to `[30, 5400]` seconds.
    SetDuration {
        seconds: u32,
    },
    /// Sets the piece length from the minute and second fields.
    SetDurationParts {
        minutes: u32,
        seconds: u32,
    },
    SetPacing(Pacing),
    SetCueMode(CueMode),
    SetFillStrategy(FillStrategy),
    SetLayout(GridLayout),
    SetPlayheadStyle(PlayheadStyle),
    FillTable,
    ToggleCell {
        row: usize,
        column: usize,
    },
    ClearTable,
    /// Starts timed playback from zero with a fresh duration plan.
    ///
    /// Ignored unless the cue mode is [`CueMode::Timed`].
    StartPlayback,
    PausePlayback,
    ResumePlayback,
    ResetPlayback,
    /// Timer tick for the running stretch identified by `generation`.
    ///
    /// Ticks from an earlier stretch are dropped, so a tick queued before a
    /// pause or reset cannot move the playhead.
    Tick {
        generation: u64,
    },
}

/// Events emitted by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    TableChanged(TableSnapshot),
    PlayheadChanged(PlayheadSnapshot),
    PlaybackCompleted,
    Error(EngineErrorEvent),
}

/// User-facing error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineErrorKind {
    CellOutOfRange,
    PlayerOutOfRange,
    Other,
}

impl From<&EngineError> for EngineErrorKind {
    fn from(value: &EngineError) -> Self {
        match value {
            EngineError::CellOutOfRange { .. } => Self::CellOutOfRange,
            EngineError::PlayerOutOfRange { .. } => Self::PlayerOutOfRange,
            _ => Self::Other,
        }
    }
}

/// User-facing error payload emitted as an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineErrorEvent {
    pub kind: EngineErrorKind,
    pub message: String,
}

impl EngineErrorEvent {
    pub fn from_error(error: &EngineError) -> Self {
        Self {
            kind: EngineErrorKind::from(error),
            message: error.to_string(),
        }
    }
}

/// Immutable table snapshot consumed by renderers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSnapshot {
    pub players: Vec<String>,
    pub columns: usize,
    pub first_data_column: usize,
    /// `cells[row][column]`, including the label column when present.
    pub cells: Vec<Vec<bool>>,
    /// Transition marks; empty unless the cue mode is `player`.
    pub cues: Vec<Cue>,
    /// Seconds per cue column.
    pub plan: Vec<f64>,
    pub settings: TableSettings,
}

impl TableSnapshot {
    pub fn is_cue(&self, row: usize, column: usize) -> bool {
        self.cues
            .iter()
            .any(|cue| cue.row == row && cue.column == column)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Receives the generation of every timer tick. Production wiring forwards
/// it as [`Command::Tick`] to the thread that owns the engine.
#[derive(Clone)]
pub struct TickSink(Arc<dyn Fn(u64) + Send + Sync>);

impl TickSink {
    pub fn new(sink: impl Fn(u64) + Send + Sync + 'static) -> Self {
        Self(Arc::new(sink))
    }
}

impl std::fmt::Debug for TickSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TickSink")
    }
}

/// Cue table engine: roster, table, cue annotations and timed playback.
///
/// All state changes go through [`Engine::handle_command`]. The engine holds
/// at most one scheduler timer at a time.
#[derive(Debug)]
pub struct Engine<C, S> {
    clock: C,
    scheduler: S,
    rng: StdRng,
    roster: Roster,
    settings: TableSettings,
    grid: CueGrid,
    cues: Vec<Cue>,
    plan: DurationPlan,
    playhead: Playhead,
    timer: Option<TimerHandle>,
    tick_sink: Option<TickSink>,
}

impl<C, S> Engine<C, S>
where
    C: Clock,
    S: Scheduler,
{
    /// Creates an engine with the default roster and settings.
    ///
    /// # Example
    /// ```
    /// use engine::{Engine, ManualClock, ManualScheduler};
    ///
    /// let engine = Engine::new(ManualClock::new(), ManualScheduler::new());
    /// assert_eq!(engine.snapshot().players.len(), 5);
    /// assert_eq!(engine.snapshot().columns, 8);
    /// ```
    pub fn new(clock: C, scheduler: S) -> Self {
        Self::from_config(GridConfig::default(), clock, scheduler)
    }

    /// Creates an engine from clamped startup configuration. A configured
    /// seed makes fills, cues and uneven plans reproducible.
    pub fn from_config(config: GridConfig, clock: C, scheduler: S) -> Self {
        let (roster, settings, seed) = config.into_parts();
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let grid = initialize(roster.len(), settings.columns, settings.layout);
        let plan = plan_for_slots(
            grid.data_columns().len(),
            settings.duration.as_secs_f64(),
            settings.pacing,
            &mut rng,
        );

        Self {
            clock,
            scheduler,
            rng,
            roster,
            settings,
            grid,
            cues: Vec::new(),
            plan,
            playhead: Playhead::new(settings.playhead_style),
            timer: None,
            tick_sink: None,
        }
    }

    /// Installs the receiver for timer ticks. Without a sink no timer is
    /// started and the caller drives [`Command::Tick`] itself.
    pub fn set_tick_sink(&mut self, sink: TickSink) {
        self.tick_sink = Some(sink);
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn settings(&self) -> &TableSettings {
        &self.settings
    }

    pub fn grid(&self) -> &CueGrid {
        &self.grid
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn plan(&self) -> &DurationPlan {
        &self.plan
    }

    pub fn playback_status(&self) -> PlaybackStatus {
        self.playhead.status()
    }

    /// Creates an immutable snapshot of the table.
    pub fn snapshot(&self) -> TableSnapshot {
        TableSnapshot {
            players: self.roster.names().to_vec(),
            columns: self.grid.columns(),
            first_data_column: self.grid.data_columns().start,
            cells: self.grid.to_rows(),
            cues: self.cues.clone(),
            plan: self.plan.durations().to_vec(),
            settings: self.settings,
        }
    }

    pub fn playhead_snapshot(&self) -> PlayheadSnapshot {
        self.playhead.snapshot(self.clock.now())
    }

    /// Applies one command and returns emitted events.
    pub fn handle_command(&mut self, command: Command) -> Result<Vec<Event>> {
        match command {
            Command::AddPlayers { text } => {
                if self.roster.add_from_text(&text) == 0 {
                    return Ok(Vec::new());
                }
                Ok(self.roster_changed())
            }
            Command::RemovePlayer { index } => {
                let removed = self.roster.remove(index)?;
                debug!(index, name = %removed, "player removed");
                Ok(self.roster_changed())
            }
            Command::MovePlayer { index, direction } => {
                if !self.roster.move_player(index, direction)? {
                    return Ok(Vec::new());
                }
                Ok(self.roster_changed())
            }
            Command::ClearPlayers => {
                self.roster.clear();
                Ok(self.roster_changed())
            }
            Command::ImportNames { text } => {
                if !self.roster.replace_from_text(&text) {
                    return Ok(Vec::new());
                }
                Ok(self.roster_changed())
            }
            Command::SetColumns { columns } => {
                let columns = clamp_columns(columns);
                if columns == self.settings.columns {
                    return Ok(Vec::new());
                }
                self.settings.columns = columns;
                Ok(self.shape_changed())
            }
            Command::SetMinActive { count } => {
                self.settings.min_active = count.min(self.roster.len());
                Ok(vec![self.table_changed()])
            }
            Command::SetMaxExtra { count } => {
                self.settings.max_extra = count.min(self.roster.len());
                Ok(vec![self.table_changed()])
            }
            Command::SetDuration { seconds } => {
                Ok(self.timing_changed(|settings| {
                    settings.duration = PieceDuration::from_seconds(seconds);
                }))
            }
            Command::SetDurationParts { minutes, seconds } => {
                Ok(self.timing_changed(|settings| {
                    settings.duration = PieceDuration::from_parts(minutes, seconds);
                }))
            }
            Command::SetPacing(pacing) => {
                Ok(self.timing_changed(|settings| settings.pacing = pacing))
            }
            Command::SetCueMode(mode) => Ok(self.set_cue_mode(mode)),
            Command::SetFillStrategy(strategy) => {
                self.settings.fill_strategy = strategy;
                Ok(vec![self.table_changed()])
            }
            Command::SetLayout(layout) => {
                if layout == self.settings.layout {
                    return Ok(Vec::new());
                }
                self.settings.layout = layout;
                Ok(self.shape_changed())
            }
            Command::SetPlayheadStyle(style) => {
                if style == self.settings.playhead_style {
                    return Ok(Vec::new());
                }
                self.cancel_timer();
                self.settings.playhead_style = style;
                self.playhead.set_style(style);
                Ok(vec![Event::PlayheadChanged(self.playhead_snapshot())])
            }
            Command::FillTable => {
                self.grid = random_fill(&self.grid, self.settings.fill_params(), &mut self.rng);
                Ok(vec![self.grid_changed()])
            }
            Command::ToggleCell { row, column } => {
                self.grid = toggle_cell(&self.grid, row, column)?;
                Ok(vec![self.grid_changed()])
            }
            Command::ClearTable => {
                self.grid = clear_all(&self.grid);
                Ok(vec![self.grid_changed()])
            }
            Command::StartPlayback => Ok(self.start_playback()),
            Command::PausePlayback => Ok(self.pause_playback()),
            Command::ResumePlayback => Ok(self.resume_playback()),
            Command::ResetPlayback => {
                self.cancel_timer();
                self.playhead.reset();
                Ok(vec![Event::PlayheadChanged(self.playhead_snapshot())])
            }
            Command::Tick { generation } => Ok(self.tick(generation)),
        }
    }

    fn roster_changed(&mut self) -> Vec<Event> {
        self.settings = self.settings.clamped_to_players(self.roster.len());
        self.grid = initialize(self.roster.len(), self.settings.columns, self.settings.layout);
        info!(
            players = self.roster.len(),
            min_active = self.settings.min_active,
            max_extra = self.settings.max_extra,
            "roster changed"
        );
        vec![self.grid_changed()]
    }

    /// Column count or layout changed: new empty table, new plan.
    fn shape_changed(&mut self) -> Vec<Event> {
        self.grid = initialize(self.roster.len(), self.settings.columns, self.settings.layout);
        self.regenerate_plan();
        info!(
            columns = self.settings.columns,
            layout = ?self.settings.layout,
            "table reshaped"
        );

        let mut events = vec![self.grid_changed()];
        events.extend(self.halt_playback());
        events
    }

    fn timing_changed(&mut self, apply: impl FnOnce(&mut TableSettings)) -> Vec<Event> {
        apply(&mut self.settings);
        self.regenerate_plan();

        let mut events = vec![self.table_changed()];
        events.extend(self.halt_playback());
        events
    }

    fn set_cue_mode(&mut self, mode: CueMode) -> Vec<Event> {
        self.settings.cue_mode = mode;
        let mut events = vec![self.grid_changed()];
        if mode != CueMode::Timed {
            events.extend(self.halt_playback());
        }
        events
    }

    /// Recomputes derived cues after the grid or the cue mode changed.
    fn grid_changed(&mut self) -> Event {
        self.cues = match self.settings.cue_mode {
            CueMode::Player => derive_cues(&self.grid, &mut self.rng),
            CueMode::None | CueMode::Timed => Vec::new(),
        };
        self.table_changed()
    }

    /// Snapshots the table with the current cues.
    fn table_changed(&self) -> Event {
        Event::TableChanged(self.snapshot())
    }

    fn regenerate_plan(&mut self) {
        self.plan = plan_for_slots(
            self.grid.data_columns().len(),
            self.settings.duration.as_secs_f64(),
            self.settings.pacing,
            &mut self.rng,
        );
    }

    fn start_playback(&mut self) -> Vec<Event> {
        if self.settings.cue_mode != CueMode::Timed {
            warn!(cue_mode = ?self.settings.cue_mode, "start ignored: timed cues are off");
            return Vec::new();
        }

        self.regenerate_plan();
        let generation = self.playhead.start(self.plan.clone(), self.clock.now());
        self.restart_timer(generation);

        vec![
            self.table_changed(),
            Event::PlayheadChanged(self.playhead_snapshot()),
        ]
    }

    fn pause_playback(&mut self) -> Vec<Event> {
        if !self.playhead.pause(self.clock.now()) {
            return Vec::new();
        }
        self.cancel_timer();
        vec![Event::PlayheadChanged(self.playhead_snapshot())]
    }

    fn resume_playback(&mut self) -> Vec<Event> {
        let Some(generation) = self.playhead.resume(self.clock.now()) else {
            return Vec::new();
        };
        self.restart_timer(generation);
        vec![Event::PlayheadChanged(self.playhead_snapshot())]
    }

    fn tick(&mut self, generation: u64) -> Vec<Event> {
        if generation != self.playhead.generation()
            || self.playhead.status() != PlaybackStatus::Running
        {
            debug!(
                generation,
                current = self.playhead.generation(),
                status = ?self.playhead.status(),
                "stale tick dropped"
            );
            return Vec::new();
        }

        let completed = self.playhead.advance(self.clock.now());
        let mut events = vec![Event::PlayheadChanged(self.playhead_snapshot())];
        if completed {
            self.cancel_timer();
            events.push(Event::PlaybackCompleted);
        }
        events
    }

    /// Stops any active playback. Returns the resulting playhead event, or
    /// `None` when the playhead was already idle.
    fn halt_playback(&mut self) -> Option<Event> {
        self.cancel_timer();
        if self.playhead.status() == PlaybackStatus::Idle {
            return None;
        }
        self.playhead.reset();
        Some(Event::PlayheadChanged(self.playhead_snapshot()))
    }

    fn restart_timer(&mut self, generation: u64) {
        self.cancel_timer();
        let Some(sink) = self.tick_sink.clone() else {
            return;
        };
        let interval = self.playhead.tick_interval();
        let handle = self
            .scheduler
            .start(interval, Box::new(move || (sink.0)(generation)));
        self.timer = Some(handle);
    }

    fn cancel_timer(&mut self) {
        if let Some(handle) = self.timer.take() {
            self.scheduler.cancel(handle);
        }
    }
}

impl Engine<SystemClock, ThreadScheduler> {
    /// Creates an engine driven by the wall clock and a timer thread.
    pub fn with_system_timer(config: GridConfig) -> Self {
        Self::from_config(config, SystemClock, ThreadScheduler::new())
    }
}
