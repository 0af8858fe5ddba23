//! # REStake Directory
//!
//! Remote collaborators of a REStake network:
//!
//! - **Directory**: chain registry data, validators and restake operators
//!   from cosmos.directory
//! - **Query client**: REST reads against a chain, bound to a verified endpoint
//! - **Connectivity**: builds query clients under a timeout and reports
//!   whether the network is online, absorbing failures

pub mod connectivity;
pub mod directory;
pub mod error;
pub mod query_client;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use connectivity::{
    is_directory_url, uses_directory, ConnectRequest, Connection, ConnectivityManager,
    ConnectivityStatus,
};
pub use directory::{
    CosmosDirectory, Directory, DirectoryConfig, OperatorAddresses, DIRECTORY_DOMAIN,
    TESTNET_DIRECTORY_DOMAIN,
};
pub use error::{DirectoryError, QueryError, Result};
pub use query_client::{
    ConnectOptions, ProposalVote, QueryClient, QueryClientFactory, RestQueryClient,
    RestQueryClientFactory, WeightedVoteOption,
};
