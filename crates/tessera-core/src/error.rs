//! Errors raised while building identifier paths.

use std::fmt;

/// Error type for malformed identifier paths.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathError {
    /// A character must carry at least one identifier.
    EmptyIdentifierPath,
    /// Not every identifier in the path belongs to the first identifier's site.
    InconsistentSiteIds(String),
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::EmptyIdentifierPath => write!(f, "Identifier path cannot be empty"),
            PathError::InconsistentSiteIds(path) => {
                write!(f, "Inconsistent site ids in identifier path: {}", path)
            }
        }
    }
}

impl std::error::Error for PathError {}
