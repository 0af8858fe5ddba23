//! Error types for chain profile and gas schedule derivation

use thiserror::Error;

/// Result type alias for core derivation
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration errors.
///
/// Any of these aborts derivation: no partially valid profile or schedule is
/// ever produced alongside one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    // === Chain Resolution ===
    /// Neither the local config nor the remote chain data names a denom
    #[error("No denom could be determined for network: {network}")]
    MissingDenom { network: String },

    /// Neither the local config nor the remote chain data gives decimals
    #[error("No decimals could be determined for network: {network}")]
    MissingDecimals { network: String },

    /// Decimals outside the range gas math supports
    #[error("Unsupported decimals {decimals}, expected at most {max}")]
    UnsupportedDecimals { decimals: u32, max: u32 },

    // === Gas Prices ===
    /// Gas price string is not `<decimal><denom>`
    #[error("Invalid gas price: {0}")]
    InvalidGasPrice(String),

    /// Explicit gas price names a different denom than the chain
    #[error("Gas price denom mismatch: expected {expected}, found {found}")]
    GasPriceDenomMismatch { expected: String, found: String },

    /// Explicit gas price step violates low <= average <= high
    #[error("Invalid gas price step: {0}")]
    InvalidGasPriceStep(String),

    // === General ===
    /// Malformed configuration
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl ConfigError {
    /// Config errors only go away when the config changes
    pub fn is_recoverable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConfigError::GasPriceDenomMismatch {
            expected: "uatom".to_string(),
            found: "uosmo".to_string(),
        };

        let msg = format!("{}", err);
        assert!(msg.contains("expected uatom"));
        assert!(msg.contains("found uosmo"));
    }

    #[test]
    fn test_not_recoverable() {
        assert!(!ConfigError::InvalidGasPrice("x".to_string()).is_recoverable());
    }
}
