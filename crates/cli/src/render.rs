use std::fmt::Write as _;

use engine::{PlaybackStatus, PlayheadSnapshot, TableSnapshot, format_clock};

const ACTIVE: char = '#';
const INACTIVE: char = '.';
const CUE_ACTIVE: char = '@';
const CUE_INACTIVE: char = 'o';

/// Renders the table as one line per player with a column header.
///
/// The label column is the player name; with the plain layout every column
/// is printed as a cell.
pub fn table(snapshot: &TableSnapshot) -> String {
    let name_width = snapshot
        .players
        .iter()
        .map(|name| name.chars().count())
        .max()
        .unwrap_or(0)
        .max(6);
    let first = snapshot.first_data_column;

    let mut out = String::new();
    let _ = write!(out, "{:name_width$}", "player");
    for column in first..snapshot.columns {
        let _ = write!(out, " {:>2}", column);
    }
    out.push('\n');

    for (row, name) in snapshot.players.iter().enumerate() {
        let _ = write!(out, "{name:name_width$}");
        for column in first..snapshot.columns {
            let active = snapshot.cells[row][column];
            let mark = match (snapshot.is_cue(row, column), active) {
                (true, true) => CUE_ACTIVE,
                (true, false) => CUE_INACTIVE,
                (false, true) => ACTIVE,
                (false, false) => INACTIVE,
            };
            let _ = write!(out, "  {mark}");
        }
        out.push('\n');
    }

    out
}

/// Lists every cue column with its start offset and length.
pub fn plan(durations: &[f64]) -> String {
    let mut out = String::new();
    let mut start = 0.0;
    for (index, duration) in durations.iter().enumerate() {
        let _ = writeln!(
            out,
            "column {:>2}  at {:>5}  for {:>6.1}s",
            index + 1,
            format_clock(start),
            duration
        );
        start += duration;
    }
    let _ = writeln!(out, "total      {}", format_clock(start));
    out
}

/// One-line progress bar for a playhead snapshot.
pub fn progress_line(playhead: &PlayheadSnapshot, width: usize) -> String {
    let filled = ((playhead.progress * width as f64).round() as usize).min(width);
    let bar: String = std::iter::repeat_n('=', filled)
        .chain(std::iter::repeat_n(' ', width - filled))
        .collect();
    let column = match playhead.column {
        Some(column) => format!("column {}", column + 1),
        None => "-".to_string(),
    };
    let status = match playhead.status {
        PlaybackStatus::Idle => "idle",
        PlaybackStatus::Running => "running",
        PlaybackStatus::Paused => "paused",
        PlaybackStatus::Completed => "done",
    };

    format!(
        "[{bar}] {:>3.0}%  {} / {}  {column}  {status}",
        playhead.percent(),
        format_clock(playhead.elapsed_seconds),
        format_clock(playhead.total_seconds),
    )
}
