//! Error types for the network aggregate

use restake_core::ConfigError;
use restake_directory::DirectoryError;
use thiserror::Error;

/// Result type alias for network operations
pub type Result<T> = std::result::Result<T, NetworkError>;

/// Network errors.
///
/// Connectivity failures are not errors here; they surface through
/// [`ConnectivityStatus`](restake_directory::ConnectivityStatus).
#[derive(Error, Debug)]
pub enum NetworkError {
    /// Profile or gas schedule could not be derived
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Directory fetch failed during load
    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),
}

impl NetworkError {
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Config(e) => e.is_recoverable(),
            Self::Directory(e) => e.is_recoverable(),
        }
    }
}
