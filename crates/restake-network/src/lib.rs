//! # REStake Network
//!
//! The [`Network`] aggregate ties a chain profile, its gas schedule, the
//! restake operators and connectivity together behind atomic snapshots.
//!
//! ```text
//!   NetworkConfig ──► Network::new ──► snapshot #0 (local profile, schedule)
//!                          │
//!          load ───────────┼──► snapshot #n (directory data, validators, operators)
//!          connect ────────┘──► snapshot #n+1 (query client, status)
//! ```

pub mod apy;
pub mod error;
pub mod network;
pub mod selector;

pub use apy::{compute_apy, validator_apy};
pub use error::{NetworkError, Result};
pub use network::{Network, NetworkSnapshot};
pub use selector::{estimate_operator_count, select_operators, sort_operators, OperatorPolicy};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{NetworkError, Result};
    pub use crate::network::{Network, NetworkSnapshot};
    pub use crate::selector::OperatorPolicy;
    pub use restake_core::prelude::*;
    pub use restake_directory::{ConnectivityStatus, Directory, QueryClient, QueryClientFactory};
}
