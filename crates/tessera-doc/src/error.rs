//! Error types for the document store.

use crate::position::Position;
use tessera_core::PathError;
use thiserror::Error;

/// Errors that can occur in document operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocError {
    #[error("Identifier path cannot be empty")]
    EmptyIdentifierPath,

    #[error("Inconsistent site ids in identifier path: {0}")]
    InconsistentSiteIds(String),

    #[error("Invalid position {position} (line count: {line_count})")]
    InvalidPosition {
        position: Position,
        line_count: usize,
    },

    #[error("Invalid range: end {end} does not follow start {start}")]
    InvalidRange { start: Position, end: Position },

    #[error("Character not found: {0}")]
    CharacterNotFound(String),

    #[error("Invalid identifier ordering: {0}")]
    InvalidOrdering(String),

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl DocError {
    /// Whether the caller may safely treat the error as a no-op.
    ///
    /// Remote deletes race with each other, so a missing character is expected.
    pub fn is_benign(&self) -> bool {
        matches!(self, DocError::CharacterNotFound(_))
    }
}

impl From<PathError> for DocError {
    fn from(err: PathError) -> Self {
        match err {
            PathError::EmptyIdentifierPath => DocError::EmptyIdentifierPath,
            PathError::InconsistentSiteIds(path) => DocError::InconsistentSiteIds(path),
        }
    }
}

impl From<serde_json::Error> for DocError {
    fn from(err: serde_json::Error) -> Self {
        DocError::SerializationError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DocError>;
