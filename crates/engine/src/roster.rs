use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::import::{parse_names, split_comma_names};

/// Direction for reordering one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}

/// Ordered list of performer names. Index `i` is table row `i`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    names: Vec<String>,
}

impl Roster {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Appends comma-separated names. Returns how many were added.
    pub fn add_from_text(&mut self, text: &str) -> usize {
        let added = split_comma_names(text);
        let count = added.len();
        self.names.extend(added);
        count
    }

    /// Replaces the roster with names parsed from imported text.
    ///
    /// Returns `false` and leaves the roster untouched when the text holds no
    /// usable names.
    pub fn replace_from_text(&mut self, text: &str) -> bool {
        let parsed = parse_names(text);
        if parsed.names.is_empty() {
            debug!(bytes = text.len(), "import ignored: no names found");
            return false;
        }

        debug!(
            format = ?parsed.format,
            count = parsed.names.len(),
            "roster replaced from import"
        );
        self.names = parsed.names;
        true
    }

    pub fn remove(&mut self, index: usize) -> Result<String> {
        if index >= self.names.len() {
            return Err(EngineError::PlayerOutOfRange {
                index,
                len: self.names.len(),
            });
        }
        Ok(self.names.remove(index))
    }

    /// Swaps the player at `index` with its neighbour.
    ///
    /// Moving the first player up or the last player down is a no-op and
    /// returns `Ok(false)`.
    pub fn move_player(&mut self, index: usize, direction: MoveDirection) -> Result<bool> {
        let len = self.names.len();
        if index >= len {
            return Err(EngineError::PlayerOutOfRange { index, len });
        }

        let target = match direction {
            MoveDirection::Up if index == 0 => return Ok(false),
            MoveDirection::Down if index + 1 == len => return Ok(false),
            MoveDirection::Up => index - 1,
            MoveDirection::Down => index + 1,
        };
        self.names.swap(index, target);
        Ok(true)
    }

    pub fn clear(&mut self) {
        self.names.clear();
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self {
            names: (1..=5).map(|n| format!("Player {n}")).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MoveDirection, Roster};
    use crate::error::EngineError;

    fn roster(names: &[&str]) -> Roster {
        Roster::new(names.iter().map(|name| (*name).to_owned()).collect())
    }

    #[test]
    fn default_roster_has_five_numbered_players() {
        let roster = Roster::default();
        assert_eq!(roster.len(), 5);
        assert_eq!(roster.names()[0], "Player 1");
        assert_eq!(roster.names()[4], "Player 5");
    }

    #[test]
    fn failed_import_keeps_existing_names() {
        let mut roster = roster(&["A", "B"]);

        assert!(!roster.replace_from_text(" , \n "));
        assert_eq!(roster.names(), ["A", "B"]);
    }

    #[test]
    fn import_replaces_names_in_order() {
        let mut roster = roster(&["A"]);

        assert!(roster.replace_from_text("1, 2 Alice; 3, 4 Bob;"));
        assert_eq!(roster.names(), ["Alice", "Bob"]);
    }

    #[test]
    fn add_appends_comma_separated_names() {
        let mut roster = roster(&["A"]);

        assert_eq!(roster.add_from_text("B, C"), 2);
        assert_eq!(roster.names(), ["A", "B", "C"]);
    }

    #[test]
    fn move_swaps_neighbours_and_ignores_edges() {
        let mut roster = roster(&["A", "B", "C"]);

        assert!(roster.move_player(1, MoveDirection::Up).expect("move up"));
        assert_eq!(roster.names(), ["B", "A", "C"]);
        assert!(!roster.move_player(0, MoveDirection::Up).expect("edge move"));
        assert!(!roster.move_player(2, MoveDirection::Down).expect("edge move"));
        assert_eq!(roster.names(), ["B", "A", "C"]);
    }

    #[test]
    fn remove_out_of_range_is_reported() {
        let mut roster = roster(&["A"]);

        let result = roster.remove(3);
        assert!(matches!(
            result,
            Err(EngineError::PlayerOutOfRange { index: 3, len: 1 })
        ));
    }
}
