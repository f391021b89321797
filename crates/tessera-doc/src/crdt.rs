//! Line-structured CRDT document store.
//!
//! The document is a 2-D array: lines of [`Char`]s. Every public operation
//! leaves the array in a state where
//! - flattening the lines yields the text in `Char` order
//! - only the last line may lack a terminating newline
//! - no line is empty (no phantom lines)
//!
//! Intermediate steps of an operation break these invariants, so each
//! operation must run to completion before the next one starts. Hosts that
//! share a document across threads wrap the whole store in one lock.

use crate::allocator::Allocator;
use crate::config::CrdtConfig;
use crate::error::{DocError, Result};
use crate::position::Position;
use crate::search::{self, ends_with_newline, Line};
use std::collections::HashSet;
use tessera_core::{Char, Identifier, SiteId};
use tracing::{debug, warn};

#[derive(Clone, Debug)]
pub struct Crdt {
    lines: Vec<Line>,
    config: CrdtConfig,
    allocator: Allocator,
    /// Paths of deleted characters allocated by this site. Never reissued, so
    /// a late remote delete cannot hit a newer character.
    ///
    /// This is the one tombstone the store keeps. It holds only paths ending
    /// in this site's identifier, since no other path can come out of the
    /// allocator here, and it lives as long as the document.
    retired: HashSet<Vec<Identifier>>,
}

impl Crdt {
    /// Create an empty document with default settings.
    pub fn new(site_id: impl Into<SiteId>) -> Self {
        Self::with_config(CrdtConfig::new(site_id))
    }

    pub fn with_config(config: CrdtConfig) -> Self {
        let allocator = Allocator::new(&config);
        Self {
            lines: Vec::new(),
            config,
            allocator,
            retired: HashSet::new(),
        }
    }

    pub fn site_id(&self) -> SiteId {
        self.config.site_id
    }

    pub fn config(&self) -> &CrdtConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Insertion / deletion handlers
    // ------------------------------------------------------------------

    /// Insert `value` at `position` and return the new character for broadcast.
    pub fn handle_local_insert(&mut self, value: char, position: Position) -> Result<Char> {
        self.local_insert(value, position).map(|(ch, _)| ch)
    }

    /// Insert a string one character at a time, starting at `position`.
    ///
    /// Returns the created characters in document order.
    pub fn handle_local_insert_str(&mut self, text: &str, position: Position) -> Result<Vec<Char>> {
        let mut chars = Vec::with_capacity(text.len());
        let mut position = position;

        for value in text.chars() {
            let (ch, placed) = self.local_insert(value, position)?;
            position = if ch.is_newline() {
                Position::line_start(placed.line_index + 1)
            } else {
                Position::new(placed.line_index, placed.char_index + 1)
            };
            chars.push(ch);
        }

        Ok(chars)
    }

    /// Insert a character received from another site.
    ///
    /// Returns the character unchanged together with the position it landed
    /// at. Remote characters are assumed to arrive exactly once.
    pub fn handle_remote_insert(&mut self, ch: Char) -> Result<(Char, Position)> {
        if self.config.validate_site_ids {
            Char::new_validated(ch.value(), ch.path().to_vec())?;
        }
        let position = search::find_position(&self.lines, &ch);
        let placed = self.insert_char(ch.clone(), position)?;
        Ok((ch, placed))
    }

    /// Delete the half-open range `[start, end)` and return the removed characters.
    pub fn handle_local_delete(&mut self, start: Position, end: Position) -> Result<Vec<Char>> {
        if end <= start {
            return Err(DocError::InvalidRange { start, end });
        }

        let start = self.normalize_boundary(start)?;
        let end = self.normalize_boundary(end)?;
        if end <= start {
            return Ok(Vec::new());
        }

        let removed = if start.line_index == end.line_index {
            self.lines[start.line_index]
                .drain(start.char_index..end.char_index)
                .collect()
        } else {
            self.delete_multiple_lines(start, end)
        };
        self.retire(&removed);

        self.remove_phantom_lines();
        if self
            .lines
            .get(start.line_index)
            .is_some_and(|line| !ends_with_newline(line))
        {
            self.merge_with_next(start.line_index);
        }

        Ok(removed)
    }

    /// Delete a character received from another site and return where it was.
    ///
    /// Fails with [`DocError::CharacterNotFound`] when the character is not in
    /// the document, which callers may treat as a no-op.
    pub fn handle_remote_delete(&mut self, ch: &Char) -> Result<Position> {
        let position = search::find_position(&self.lines, ch);
        let present = self
            .lines
            .get(position.line_index)
            .and_then(|line| line.get(position.char_index))
            .is_some_and(|found| found == ch);
        if !present {
            return Err(DocError::CharacterNotFound(ch.to_string()));
        }

        let removed = self.lines[position.line_index].remove(position.char_index);
        self.retire(std::slice::from_ref(&removed));
        if removed.is_newline() {
            self.merge_with_next(position.line_index);
        }
        self.remove_phantom_lines();

        Ok(position)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Total number of characters, newlines included.
    pub fn len(&self) -> usize {
        self.lines.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// All characters in document order.
    pub fn chars(&self) -> impl Iterator<Item = &Char> + '_ {
        self.lines.iter().flatten()
    }

    pub fn char_at(&self, position: Position) -> Option<&Char> {
        self.lines
            .get(position.line_index)
            .and_then(|line| line.get(position.char_index))
    }

    /// Current position of `ch`, if it is in the document.
    pub fn position_of(&self, ch: &Char) -> Option<Position> {
        let position = search::find_position(&self.lines, ch);
        (self.char_at(position) == Some(ch)).then_some(position)
    }

    pub fn text(&self) -> String {
        self.chars().map(Char::value).collect()
    }

    /// Check the document invariants.
    pub fn is_well_formed(&self) -> bool {
        let last = self.lines.len().saturating_sub(1);
        let lines_ok = self.lines.iter().enumerate().all(|(i, line)| {
            let newlines = line.iter().filter(|ch| ch.is_newline()).count();
            !line.is_empty()
                && newlines <= 1
                && (ends_with_newline(line) || (i == last && newlines == 0))
        });
        let chars: Vec<&Char> = self.chars().collect();
        lines_ok && chars.windows(2).all(|pair| pair[0] < pair[1])
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn local_insert(&mut self, value: char, position: Position) -> Result<(Char, Position)> {
        self.check_insert_position(position)?;

        let mut lo = search::path_before(&self.lines, position).to_vec();
        let hi = search::path_at(&self.lines, position);
        let path = loop {
            let path = self.allocator.generate_between(&lo, hi)?;
            if !self.retired.contains(&path) {
                break path;
            }
            // Narrow the gap past the retired path and draw again.
            lo = path;
        };

        let ch = Char::new(value, path)?;
        let placed = self.insert_char(ch.clone(), position)?;
        Ok((ch, placed))
    }

    fn check_insert_position(&self, position: Position) -> Result<()> {
        let in_range = match self.lines.get(position.line_index) {
            Some(line) => position.char_index <= line.len(),
            None => position.line_index == self.lines.len() && position.char_index == 0,
        };
        if in_range {
            Ok(())
        } else {
            Err(self.invalid_position(position))
        }
    }

    /// Place `ch` at `position`, splitting the line when `ch` is a newline.
    /// Returns the position actually used.
    fn insert_char(&mut self, ch: Char, position: Position) -> Result<Position> {
        let position = self.resolve_insert_position(position, &ch)?;
        if position.line_index == self.lines.len() {
            self.lines.push(Vec::new());
        }

        let line_index = position.line_index;
        let line = &mut self.lines[line_index];
        if ch.is_newline() {
            let rest = line.split_off(position.char_index);
            line.push(ch);
            if !rest.is_empty() {
                self.lines.insert(line_index + 1, rest);
            }
        } else {
            line.insert(position.char_index, ch);
        }

        Ok(position)
    }

    /// Keep at most one newline per line, always at its end.
    fn resolve_insert_position(&self, position: Position, ch: &Char) -> Result<Position> {
        self.check_insert_position(position)?;

        let Some(line) = self.lines.get(position.line_index) else {
            // Appending past the end: stay on the last line unless it is closed.
            return Ok(match self.lines.last() {
                Some(last) if !ends_with_newline(last) => {
                    Position::new(self.lines.len() - 1, last.len())
                }
                _ => position,
            });
        };

        let after_newline = position.char_index > 0 && line[position.char_index - 1].is_newline();
        if !after_newline {
            return Ok(position);
        }

        let redirected = Position::line_start(position.line_index + 1);
        if ch.is_newline() {
            debug!(%position, %redirected, "newline after newline moved to next line");
        } else {
            warn!(
                %position,
                %redirected,
                "CRDT: insert after a newline on the same line; moving to start of next line"
            );
        }
        Ok(redirected)
    }

    /// Map a deletion endpoint onto a canonical boundary.
    ///
    /// The end of a newline-terminated line is the start of the next one, and
    /// `(line_count, 0)` is the document end.
    fn normalize_boundary(&self, position: Position) -> Result<Position> {
        match self.lines.get(position.line_index) {
            Some(line) if position.char_index < line.len() => Ok(position),
            Some(line) if position.char_index == line.len() => {
                if ends_with_newline(line) {
                    Ok(Position::line_start(position.line_index + 1))
                } else {
                    Ok(position)
                }
            }
            None if position.line_index == self.lines.len() && position.char_index == 0 => {
                Ok(position)
            }
            _ => Err(self.invalid_position(position)),
        }
    }

    /// Remove the tail of the start line, every enclosed line and the head of
    /// the end line, in document order.
    fn delete_multiple_lines(&mut self, start: Position, end: Position) -> Vec<Char> {
        let mut removed: Vec<Char> = self.lines[start.line_index]
            .drain(start.char_index..)
            .collect();

        for line in &mut self.lines[start.line_index + 1..end.line_index] {
            removed.append(line);
        }

        if let Some(line) = self.lines.get_mut(end.line_index) {
            removed.extend(line.drain(..end.char_index));
        }

        removed
    }

    fn retire(&mut self, removed: &[Char]) {
        let site_id = self.config.site_id;
        self.retired.extend(
            removed
                .iter()
                .filter(|ch| ch.path().last().map(Identifier::site_id) == Some(site_id))
                .map(|ch| ch.path().to_vec()),
        );
    }

    fn remove_phantom_lines(&mut self) {
        self.lines.retain(|line| !line.is_empty());
    }

    fn merge_with_next(&mut self, line_index: usize) {
        if line_index + 1 < self.lines.len() {
            let next = self.lines.remove(line_index + 1);
            self.lines[line_index].extend(next);
        }
    }

    fn invalid_position(&self, position: Position) -> DocError {
        DocError::InvalidPosition {
            position,
            line_count: self.lines.len(),
        }
    }
}

impl std::fmt::Display for Crdt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text())
    }
}
