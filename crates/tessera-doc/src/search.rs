//! Positional lookups over the line array.
//!
//! Lines are internally ordered and the order across lines is monotonic, so
//! the last character of each line works as a separator key for a binary
//! search over lines, followed by a binary search within the chosen line.

use crate::position::Position;
use tessera_core::{Char, Identifier};

/// One line of the document.
pub type Line = Vec<Char>;

pub(crate) fn ends_with_newline(line: &[Char]) -> bool {
    line.last().is_some_and(Char::is_newline)
}

/// Path of the character just before `position`, or `[]` at the document start.
///
/// Expects `position` to be in range for an insert.
pub(crate) fn path_before(lines: &[Line], position: Position) -> &[Identifier] {
    let Position {
        line_index,
        char_index,
    } = position;

    if char_index > 0 {
        return lines[line_index][char_index - 1].path();
    }
    if line_index == 0 {
        return &[];
    }
    lines[line_index - 1].last().map(Char::path).unwrap_or(&[])
}

/// Path of the character at `position`, or `[]` past the document end.
///
/// A position at a line's end maps to the start of the next line.
pub(crate) fn path_at(lines: &[Line], position: Position) -> &[Identifier] {
    let Some(line) = lines.get(position.line_index) else {
        return &[];
    };
    if let Some(ch) = line.get(position.char_index) {
        return ch.path();
    }
    lines
        .get(position.line_index + 1)
        .and_then(|next| next.first())
        .map(Char::path)
        .unwrap_or(&[])
}

/// Where `target` belongs (or sits) in the document by total order.
pub fn find_position(lines: &[Line], target: &Char) -> Position {
    if lines.is_empty() {
        return Position::default();
    }

    let line_index = lines.partition_point(|line| line.last().is_some_and(|last| last < target));

    // Greater than everything in the document.
    if line_index == lines.len() {
        let last_index = lines.len() - 1;
        let last_line = &lines[last_index];
        return if ends_with_newline(last_line) {
            Position::line_start(lines.len())
        } else {
            Position::new(last_index, last_line.len())
        };
    }

    let line = &lines[line_index];
    let char_index = line.partition_point(|ch| ch < target);

    if char_index == 0 && line_index > 0 {
        let prev = &lines[line_index - 1];
        if !ends_with_newline(prev) {
            return Position::new(line_index - 1, prev.len());
        }
    }
    if char_index == line.len() && ends_with_newline(line) {
        return Position::line_start(line_index + 1);
    }

    Position::new(line_index, char_index)
}
