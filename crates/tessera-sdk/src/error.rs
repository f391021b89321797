//! Error types for the Tessera SDK.

use crate::network::NetworkError;
use std::fmt;
use tessera_doc::DocError;

/// Error type for SDK operations.
#[derive(Debug)]
pub enum SdkError {
    /// Document not found.
    DocumentNotFound(String),
    /// Peer not found.
    PeerNotFound(String),
    /// Connection failed.
    ConnectionFailed(String),
    /// Network error.
    NetworkError(String),
    /// The document store rejected an operation.
    Document(DocError),
    /// Internal error.
    Internal(String),
}

impl SdkError {
    /// Whether the error can be dropped without affecting convergence.
    pub fn is_benign(&self) -> bool {
        matches!(self, SdkError::Document(err) if err.is_benign())
    }
}

impl fmt::Display for SdkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SdkError::DocumentNotFound(id) => write!(f, "Document not found: {}", id),
            SdkError::PeerNotFound(id) => write!(f, "Peer not found: {}", id),
            SdkError::ConnectionFailed(e) => write!(f, "Connection failed: {}", e),
            SdkError::NetworkError(e) => write!(f, "Network error: {}", e),
            SdkError::Document(e) => write!(f, "Document error: {}", e),
            SdkError::Internal(e) => write!(f, "Internal error: {}", e),
        }
    }
}

impl std::error::Error for SdkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SdkError::Document(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DocError> for SdkError {
    fn from(err: DocError) -> Self {
        SdkError::Document(err)
    }
}

impl From<NetworkError> for SdkError {
    fn from(err: NetworkError) -> Self {
        match err {
            NetworkError::PeerNotFound(id) => SdkError::PeerNotFound(id),
            NetworkError::ConnectionFailed(e) => SdkError::ConnectionFailed(e),
            other => SdkError::NetworkError(other.to_string()),
        }
    }
}

/// Result type for SDK operations.
pub type Result<T> = std::result::Result<T, SdkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_benign_errors() {
        let missing = SdkError::from(DocError::CharacterNotFound("'a'[1@1]".into()));
        assert!(missing.is_benign());

        let ordering = SdkError::from(DocError::InvalidOrdering("bounds".into()));
        assert!(!ordering.is_benign());
        assert!(!SdkError::Internal("x".into()).is_benign());
    }

    #[test]
    fn test_network_error_mapping() {
        let err = SdkError::from(NetworkError::PeerNotFound("peer-9".into()));
        assert_eq!(err.to_string(), "Peer not found: peer-9");

        let err = SdkError::from(NetworkError::SendFailed("closed".into()));
        assert_eq!(err.to_string(), "Network error: Send failed: closed");
    }
}
