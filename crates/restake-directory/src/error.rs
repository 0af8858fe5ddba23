//! Error types for directory and query client calls

use std::time::Duration;
use thiserror::Error;

/// Result type alias for directory calls
pub type Result<T> = std::result::Result<T, DirectoryError>;

/// Directory errors
#[derive(Error, Debug)]
pub enum DirectoryError {
    /// Transport failure talking to the directory
    #[error("Directory request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Directory answered with a non-success status
    #[error("Directory returned {status} for {url}")]
    Status { url: String, status: u16 },

    /// Response body did not have the expected shape
    #[error("Failed to decode directory response from {url}: {reason}")]
    Decode { url: String, reason: String },

    /// Base URL could not be joined with a path
    #[error("Invalid directory URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl DirectoryError {
    /// Transport failures and 5xx answers may succeed on a later attempt
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Decode { .. } | Self::InvalidUrl(_) => false,
        }
    }
}

/// Query client errors
#[derive(Error, Debug)]
pub enum QueryError {
    // === Construction ===
    /// Client construction did not finish in time
    #[error("Query client timed out after {0:?}")]
    Timeout(Duration),

    /// No candidate REST URL answered
    #[error("No REST endpoint reachable: {0}")]
    Unreachable(String),

    /// Endpoint serves a different chain
    #[error("Chain id mismatch: expected {expected}, found {found}")]
    ChainIdMismatch { expected: String, found: String },

    // === Requests ===
    #[error("Query request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Query returned {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to decode query response: {0}")]
    Decode(String),
}

impl QueryError {
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Unreachable(_) | Self::Http(_) => true,
            Self::Status { status, .. } => *status >= 500,
            Self::ChainIdMismatch { .. } | Self::Decode(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_recoverability() {
        let server_error = DirectoryError::Status {
            url: "https://chains.cosmos.directory/osmosis".to_string(),
            status: 503,
        };
        let not_found = DirectoryError::Status {
            url: "https://chains.cosmos.directory/nope".to_string(),
            status: 404,
        };

        assert!(server_error.is_recoverable());
        assert!(!not_found.is_recoverable());
    }

    #[test]
    fn test_query_error_display() {
        let err = QueryError::ChainIdMismatch {
            expected: "cosmoshub-4".to_string(),
            found: "theta-testnet-001".to_string(),
        };

        assert!(err.to_string().contains("expected cosmoshub-4"));
        assert!(!err.is_recoverable());
        assert!(QueryError::Timeout(Duration::from_millis(1)).is_recoverable());
    }
}
