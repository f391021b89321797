//! Editor-facing positions in the 2-D line array.

use serde::{Deserialize, Serialize};

/// A `(line, char)` coordinate. Both indices are non-negative by construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub line_index: usize,
    pub char_index: usize,
}

impl Position {
    pub fn new(line_index: usize, char_index: usize) -> Self {
        Self {
            line_index,
            char_index,
        }
    }

    /// Start of the given line.
    pub fn line_start(line_index: usize) -> Self {
        Self::new(line_index, 0)
    }
}

impl From<(usize, usize)> for Position {
    fn from((line_index, char_index): (usize, usize)) -> Self {
        Self::new(line_index, char_index)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line_index, self.char_index)
    }
}
