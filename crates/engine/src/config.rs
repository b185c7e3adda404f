use serde::{Deserialize, Serialize};

use crate::cues::CueMode;
use crate::fill::{FillParams, FillStrategy};
use crate::grid::GridLayout;
use crate::plan::Pacing;
use crate::playhead::PlayheadStyle;
use crate::roster::Roster;
use crate::time::PieceDuration;

pub const MIN_COLUMNS: usize = 1;
pub const MAX_COLUMNS: usize = 20;

/// Live table settings held by the engine. Always stored clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableSettings {
    pub columns: usize,
    pub min_active: usize,
    pub max_extra: usize,
    pub duration: PieceDuration,
    pub pacing: Pacing,
    pub cue_mode: CueMode,
    pub fill_strategy: FillStrategy,
    pub layout: GridLayout,
    pub playhead_style: PlayheadStyle,
}

impl TableSettings {
    /// Re-clamps player-dependent bounds after the roster changed size.
    pub fn clamped_to_players(self, players: usize) -> Self {
        Self {
            columns: clamp_columns(self.columns),
            min_active: self.min_active.min(players),
            max_extra: self.max_extra.min(players),
            ..self
        }
    }

    pub fn fill_params(&self) -> FillParams {
        FillParams {
            min_active: self.min_active,
            max_extra: self.max_extra,
            strategy: self.fill_strategy,
        }
    }
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            columns: 8,
            min_active: 1,
            max_extra: 1,
            duration: PieceDuration::default(),
            pacing: Pacing::Even,
            cue_mode: CueMode::None,
            fill_strategy: FillStrategy::Balanced,
            layout: GridLayout::Labeled,
            playhead_style: PlayheadStyle::Continuous,
        }
    }
}

/// Clamps a requested column count to `[1, 20]`.
pub fn clamp_columns(columns: usize) -> usize {
    columns.clamp(MIN_COLUMNS, MAX_COLUMNS)
}

/// Startup configuration as read from a file or flags.
///
/// Every field is optional in the source; missing values take the defaults
/// and out-of-range values are clamped by [`GridConfig::into_parts`].
///
/// # Example
/// ```
/// use engine::GridConfig;
///
/// let config = GridConfig {
///     players: Some(vec!["Ana".into(), "Bo".into()]),
///     columns: Some(40),
///     min_active: Some(5),
///     ..GridConfig::default()
/// };
/// let (roster, settings, _seed) = config.into_parts();
/// assert_eq!(roster.len(), 2);
/// assert_eq!(settings.columns, 20);
/// assert_eq!(settings.min_active, 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    pub players: Option<Vec<String>>,
    pub columns: Option<usize>,
    pub min_active: Option<usize>,
    pub max_extra: Option<usize>,
    pub duration_seconds: Option<u32>,
    pub pacing: Option<Pacing>,
    pub cue_mode: Option<CueMode>,
    pub fill_strategy: Option<FillStrategy>,
    pub layout: Option<GridLayout>,
    pub playhead_style: Option<PlayheadStyle>,
    pub seed: Option<u64>,
}

impl GridConfig {
    /// Fills unset fields of `self` from `fallback`.
    pub fn or(self, fallback: GridConfig) -> GridConfig {
        GridConfig {
            players: self.players.or(fallback.players),
            columns: self.columns.or(fallback.columns),
            min_active: self.min_active.or(fallback.min_active),
            max_extra: self.max_extra.or(fallback.max_extra),
            duration_seconds: self.duration_seconds.or(fallback.duration_seconds),
            pacing: self.pacing.or(fallback.pacing),
            cue_mode: self.cue_mode.or(fallback.cue_mode),
            fill_strategy: self.fill_strategy.or(fallback.fill_strategy),
            layout: self.layout.or(fallback.layout),
            playhead_style: self.playhead_style.or(fallback.playhead_style),
            seed: self.seed.or(fallback.seed),
        }
    }

    /// Resolves defaults and clamps every value.
    pub fn into_parts(self) -> (Roster, TableSettings, Option<u64>) {
        let roster = self.players.map(Roster::new).unwrap_or_default();
        let defaults = TableSettings::default();
        let settings = TableSettings {
            columns: self.columns.unwrap_or(defaults.columns),
            min_active: self.min_active.unwrap_or(defaults.min_active),
            max_extra: self.max_extra.unwrap_or(defaults.max_extra),
            duration: self
                .duration_seconds
                .map(PieceDuration::from_seconds)
                .unwrap_or(defaults.duration),
            pacing: self.pacing.unwrap_or(defaults.pacing),
            cue_mode: self.cue_mode.unwrap_or(defaults.cue_mode),
            fill_strategy: self.fill_strategy.unwrap_or(defaults.fill_strategy),
            layout: self.layout.unwrap_or(defaults.layout),
            playhead_style: self.playhead_style.unwrap_or(defaults.playhead_style),
        }
        .clamped_to_players(roster.len());

        (roster, settings, self.seed)
    }
}
