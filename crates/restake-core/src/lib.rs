//! # REStake Core
//!
//! Pure derivation logic for a REStake network profile:
//!
//! - [`NetworkConfig`] - static, partially specified network configuration
//! - [`resolve`] - merges local and directory chain data into a [`ChainProfile`]
//! - [`derive_schedule`] - low/average/high [`GasPriceSchedule`] for a profile
//! - [`ValidatorRecord`] / [`OperatorRecord`] - directory validators and the
//!   restake bots they run
//!
//! ```text
//!   NetworkConfig ──┐
//!                   ├──► resolve ──► ChainProfile ──► derive_schedule ──► GasPriceSchedule
//!   ChainData ──────┘   (remote wins)               (exact decimals)
//! ```
//!
//! Nothing here performs I/O.

pub mod chain;
pub mod config;
pub mod error;
pub mod gas;
pub mod validator;

pub use chain::*;
pub use config::*;
pub use error::*;
pub use gas::*;
pub use validator::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::chain::{resolve, ChainData, ChainProfile};
    pub use crate::config::NetworkConfig;
    pub use crate::error::{ConfigError, Result};
    pub use crate::gas::{derive_schedule, GasOverrides, GasPrice, GasPriceSchedule};
    pub use crate::validator::{OperatorRecord, ValidatorRecord};
}
