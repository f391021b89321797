//! Char - a character value addressed by a path of identifiers.
//!
//! The path is the character's address in a virtual exponential tree and
//! defines the document's total order:
//! - paths compare element-wise using [`Identifier`] order
//! - a strict prefix sorts before the longer path
//!
//! A `Char` is immutable once built. Its value and path can only be read,
//! which keeps the order of every replica stable for the life of a document.

use crate::error::PathError;
use crate::identifier::Identifier;
use crate::site::SiteId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// Marker value for line breaks.
pub const NEWLINE: char = '\n';

/// Wire form of a character: `{ value, idArray }`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharPayload {
    pub value: char,
    pub id_array: Vec<Identifier>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "CharPayload", into = "CharPayload")]
pub struct Char {
    value: char,
    path: Vec<Identifier>,
    site_id: SiteId,
}

impl Char {
    /// Build a character from its value and identifier path.
    pub fn new(value: char, path: Vec<Identifier>) -> Result<Self, PathError> {
        let site_id = path
            .first()
            .map(Identifier::site_id)
            .ok_or(PathError::EmptyIdentifierPath)?;
        Ok(Self {
            value,
            path,
            site_id,
        })
    }

    /// Like [`Char::new`], but also checks that every identifier shares the
    /// first identifier's site. This walks the whole path.
    pub fn new_validated(value: char, path: Vec<Identifier>) -> Result<Self, PathError> {
        let ch = Self::new(value, path)?;
        if ch.path.iter().any(|id| id.site_id() != ch.site_id) {
            return Err(PathError::InconsistentSiteIds(ch.path_string()));
        }
        Ok(ch)
    }

    pub fn value(&self) -> char {
        self.value
    }

    pub fn site_id(&self) -> SiteId {
        self.site_id
    }

    /// The identifier path. Callers that need to extend or trim it get a copy.
    pub fn path(&self) -> &[Identifier] {
        &self.path
    }

    pub fn depth(&self) -> usize {
        self.path.len()
    }

    pub fn is_newline(&self) -> bool {
        self.value == NEWLINE
    }

    /// Lexicographic path comparison; a strict prefix sorts first.
    pub fn compare_to(&self, other: &Char) -> Ordering {
        self.path.as_slice().cmp(other.path.as_slice())
    }

    pub fn to_payload(&self) -> CharPayload {
        CharPayload {
            value: self.value,
            id_array: self.path.clone(),
        }
    }

    fn path_string(&self) -> String {
        let parts: Vec<String> = self.path.iter().map(|id| id.to_string()).collect();
        format!("[{}]", parts.join(", "))
    }
}

impl TryFrom<CharPayload> for Char {
    type Error = PathError;

    fn try_from(payload: CharPayload) -> Result<Self, Self::Error> {
        Char::new(payload.value, payload.id_array)
    }
}

impl From<Char> for CharPayload {
    fn from(ch: Char) -> Self {
        CharPayload {
            value: ch.value,
            id_array: ch.path,
        }
    }
}

impl PartialEq for Char {
    fn eq(&self, other: &Self) -> bool {
        self.compare_to(other) == Ordering::Equal
    }
}

impl Eq for Char {}

impl Hash for Char {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

impl PartialOrd for Char {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Char {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare_to(other)
    }
}

impl std::fmt::Display for Char {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}{}", self.value, self.path_string())
    }
}
