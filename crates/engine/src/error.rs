use std::fmt::{Display, Formatter};

/// Result type used by the engine crate.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors produced by engine commands and grid operations.
///
/// Numeric configuration is clamped rather than rejected, so these only cover
/// coordinates and indices that point outside the current table.
#[derive(Debug)]
pub enum EngineError {
    CellOutOfRange {
        row: usize,
        column: usize,
        rows: usize,
        columns: usize,
    },
    PlayerOutOfRange {
        index: usize,
        len: usize,
    },
    Serialization(serde_json::Error),
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CellOutOfRange {
                row,
                column,
                rows,
                columns,
            } => write!(
                f,
                "cell ({row}, {column}) is outside the {rows}x{columns} table"
            ),
            Self::PlayerOutOfRange { index, len } => {
                write!(f, "player index {index} is out of range (roster has {len})")
            }
            Self::Serialization(err) => write!(f, "snapshot serialization failed ({err})"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}
