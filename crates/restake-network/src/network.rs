//! # Network Aggregate
//!
//! One [`Network`] owns everything known about a chain: the resolved profile,
//! its gas schedule, validators, operators and connectivity.
//!
//! State lives in an immutable [`NetworkSnapshot`]. Every mutation builds a
//! new snapshot and swaps it in under a write lock, bumping the generation.
//! Readers clone the current `Arc` and never see a half-applied update.
//!
//! | Operation | Effect |
//! |-----------|--------|
//! | [`Network::new`] | resolves the local profile and schedule eagerly |
//! | [`Network::load`] | fetches chain data and validators, re-resolves |
//! | [`Network::connect`] | builds a query client, never fails |
//! | [`Network::reconfigure`] / [`Network::set_chain_data`] | re-resolves from new inputs |
//!
//! Mutating operations run one at a time; a `load` started while a
//! `connect` is in flight waits for it.

use crate::apy::compute_apy;
use crate::error::Result;
use crate::selector::{estimate_operator_count, select_operators, sort_operators};
use parking_lot::RwLock;
use rand::Rng;
use restake_core::{
    derive_schedule, resolve, ChainData, ChainProfile, GasOverrides, GasPrice, GasPriceSchedule,
    NetworkConfig, OperatorRecord, ValidatorRecord,
};
use restake_directory::{
    uses_directory, ConnectOptions, ConnectRequest, Connection, ConnectivityManager,
    ConnectivityStatus, CosmosDirectory, Directory, QueryClient, QueryClientFactory,
    RestQueryClientFactory,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Consistent view of a network at one generation
#[derive(Clone, Debug)]
pub struct NetworkSnapshot {
    /// Incremented on every committed change
    pub generation: u64,

    pub config: NetworkConfig,

    /// Chain data last fetched from the directory
    pub remote: Option<ChainData>,

    pub profile: ChainProfile,
    pub schedule: GasPriceSchedule,

    /// Whether validators have been fetched
    pub loaded: bool,
    pub validators: Vec<ValidatorRecord>,
    pub operators: Vec<OperatorRecord>,
    pub operator_count: usize,

    /// Candidate REST URLs, configured or the directory proxy
    pub rest_urls: Vec<String>,

    pub connection: Connection,
}

impl NetworkSnapshot {
    /// REST URLs go through the directory proxy
    pub fn using_directory(&self) -> bool {
        uses_directory(&self.rest_urls)
    }

    /// Online unless served by an unhealthy directory proxy
    pub fn online(&self) -> bool {
        !self.using_directory() || self.profile.directory_rest_healthy()
    }

    pub fn connected(&self) -> bool {
        self.connection.connected()
    }
}

/// A REStake network and its live state
pub struct Network {
    directory: Arc<dyn Directory>,
    connectivity: ConnectivityManager,
    operator_addresses: Option<BTreeMap<String, String>>,
    snapshot: RwLock<Arc<NetworkSnapshot>>,
    guard: tokio::sync::Mutex<()>,
}

impl Network {
    /// Build a network, resolving its profile from local data.
    ///
    /// # Errors
    ///
    /// Fails when the config alone cannot produce a profile or gas schedule.
    pub fn new(
        config: NetworkConfig,
        directory: Arc<dyn Directory>,
        factory: Arc<dyn QueryClientFactory>,
    ) -> Result<Self> {
        Self::with_operator_addresses(config, None, directory, factory)
    }

    /// Build a network against cosmos.directory and plain REST clients
    pub fn from_config(config: NetworkConfig) -> Result<Self> {
        let directory = Arc::new(CosmosDirectory::for_network(config.is_testnet()));
        Self::new(config, directory, Arc::new(RestQueryClientFactory::new()))
    }

    /// Build a network that knows the directory's operator addresses for
    /// its chain, used to estimate the operator count before loading
    pub fn with_operator_addresses(
        config: NetworkConfig,
        operator_addresses: Option<BTreeMap<String, String>>,
        directory: Arc<dyn Directory>,
        factory: Arc<dyn QueryClientFactory>,
    ) -> Result<Self> {
        config.validate()?;
        let profile = resolve(&config, None)?;
        let schedule = derive_schedule(&profile, &GasOverrides::from_config(&config))?;
        let rest_urls = rest_urls(&config, directory.as_ref());

        let snapshot = NetworkSnapshot {
            generation: 0,
            operator_count: estimate_operator_count(&config, operator_addresses.as_ref()),
            config,
            remote: None,
            profile,
            schedule,
            loaded: false,
            validators: Vec::new(),
            operators: Vec::new(),
            rest_urls,
            connection: Connection::disconnected(),
        };

        Ok(Self {
            directory,
            connectivity: ConnectivityManager::new(factory),
            operator_addresses,
            snapshot: RwLock::new(Arc::new(snapshot)),
            guard: tokio::sync::Mutex::new(()),
        })
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<NetworkSnapshot> {
        self.snapshot.read().clone()
    }

    pub fn generation(&self) -> u64 {
        self.snapshot.read().generation
    }

    fn commit(&self, mut next: NetworkSnapshot) -> Arc<NetworkSnapshot> {
        let mut slot = self.snapshot.write();
        next.generation = slot.generation + 1;
        let next = Arc::new(next);
        *slot = next.clone();
        next
    }

    /// Fetch chain data and validators from the directory and re-resolve.
    ///
    /// # Errors
    ///
    /// Directory failures and resolution failures propagate. The previous
    /// snapshot stays in place on error.
    pub async fn load(&self) -> Result<Arc<NetworkSnapshot>> {
        let _guard = self.guard.lock().await;
        let current = self.snapshot();
        let name = current.config.network_name().to_string();

        let chain_data = self.directory.get_chain_data(&name).await?;
        let validators = self.directory.get_validators(&name).await?;

        let next = self.rebuild(&current, current.config.clone(), Some(chain_data), Some(validators))?;
        let next = self.commit(next);

        tracing::info!(
            network = %name,
            validators = next.validators.len(),
            operators = next.operators.len(),
            "Loaded network"
        );
        Ok(next)
    }

    /// Re-resolve with replacement chain data
    pub async fn set_chain_data(&self, chain_data: ChainData) -> Result<Arc<NetworkSnapshot>> {
        let _guard = self.guard.lock().await;
        let current = self.snapshot();
        let next = self.rebuild(&current, current.config.clone(), Some(chain_data), None)?;
        Ok(self.commit(next))
    }

    /// Re-resolve with a replacement config
    pub async fn reconfigure(&self, config: NetworkConfig) -> Result<Arc<NetworkSnapshot>> {
        let _guard = self.guard.lock().await;
        config.validate()?;
        let current = self.snapshot();
        let next = self.rebuild(&current, config, current.remote.clone(), None)?;
        Ok(self.commit(next))
    }

    /// Re-resolve from the current inputs
    pub async fn reresolve(&self) -> Result<Arc<NetworkSnapshot>> {
        let _guard = self.guard.lock().await;
        let current = self.snapshot();
        let next = self.rebuild(&current, current.config.clone(), current.remote.clone(), None)?;
        Ok(self.commit(next))
    }

    /// Next snapshot from new inputs, keeping connectivity and, when
    /// `validators` is `None`, the current validators
    fn rebuild(
        &self,
        current: &NetworkSnapshot,
        config: NetworkConfig,
        remote: Option<ChainData>,
        validators: Option<Vec<ValidatorRecord>>,
    ) -> Result<NetworkSnapshot> {
        let profile = resolve(&config, remote.as_ref())?;
        let schedule = derive_schedule(&profile, &GasOverrides::from_config(&config))?;

        let loaded = current.loaded || validators.is_some();
        let validators = validators.unwrap_or_else(|| current.validators.clone());
        let (operators, operator_count) = if loaded {
            let operators = select_operators(&validators, &config);
            let count = operators.len();
            (operators, count)
        } else {
            let count = estimate_operator_count(&config, self.operator_addresses.as_ref());
            (Vec::new(), count)
        };

        Ok(NetworkSnapshot {
            generation: current.generation,
            rest_urls: rest_urls(&config, self.directory.as_ref()),
            config,
            remote,
            profile,
            schedule,
            loaded,
            validators,
            operators,
            operator_count,
            connection: current.connection.clone(),
        })
    }

    /// Build a query client and record connectivity.
    ///
    /// Never fails: an unreachable endpoint yields a non-connected status and
    /// keeps the previous query client.
    pub async fn connect(&self, timeout: Option<Duration>) -> ConnectivityStatus {
        let _guard = self.guard.lock().await;
        let current = self.snapshot();

        let options = ConnectOptions {
            timeout,
            api_versions: current.profile.api_versions.clone(),
        };
        let request = ConnectRequest {
            chain_id: current.profile.chain_id.as_deref(),
            rest_urls: &current.rest_urls,
            directory_healthy: current.profile.directory_rest_healthy(),
        };

        let connection = self
            .connectivity
            .connect(&request, &options, &current.connection)
            .await;
        let status = connection.status.clone();

        self.commit(NetworkSnapshot {
            connection,
            ..(*current).clone()
        });
        status
    }

    // === Reads ===

    pub fn name(&self) -> String {
        self.snapshot().config.network_name().to_string()
    }

    pub fn profile(&self) -> ChainProfile {
        self.snapshot().profile.clone()
    }

    pub fn schedule(&self) -> GasPriceSchedule {
        self.snapshot().schedule.clone()
    }

    /// Base gas price in wire format
    pub fn gas_price(&self) -> GasPrice {
        self.snapshot().schedule.gas_price()
    }

    pub fn connected(&self) -> bool {
        self.snapshot().connected()
    }

    pub fn online(&self) -> bool {
        self.snapshot().online()
    }

    pub fn status(&self) -> ConnectivityStatus {
        self.snapshot().connection.status.clone()
    }

    pub fn query_client(&self) -> Option<Arc<dyn QueryClient>> {
        self.snapshot().connection.query_client.clone()
    }

    /// REST URL in use, else the first candidate
    pub fn rest_url(&self) -> Option<String> {
        let snapshot = self.snapshot();
        snapshot
            .connection
            .rest_url
            .clone()
            .or_else(|| snapshot.rest_urls.first().cloned())
    }

    pub fn rpc_url(&self) -> String {
        self.directory.rpc_url(&self.name())
    }

    pub fn operator_count(&self) -> usize {
        self.snapshot().operator_count
    }

    pub fn keywords(&self) -> Vec<String> {
        self.snapshot().profile.keywords.clone()
    }

    /// Operators in display order, shuffled with the owner first
    pub fn get_operators(&self) -> Vec<OperatorRecord> {
        self.get_operators_with(&mut rand::thread_rng())
    }

    /// [`get_operators`](Self::get_operators) with a caller supplied RNG
    pub fn get_operators_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<OperatorRecord> {
        let snapshot = self.snapshot();
        sort_operators(
            &snapshot.operators,
            snapshot.config.owner_address.as_deref(),
            rng,
        )
    }

    pub fn get_operator(&self, operator_address: &str) -> Option<OperatorRecord> {
        self.snapshot()
            .operators
            .iter()
            .find(|operator| operator.address == operator_address)
            .cloned()
    }

    pub fn get_operator_by_bot_address(&self, bot_address: &str) -> Option<OperatorRecord> {
        self.snapshot()
            .operators
            .iter()
            .find(|operator| operator.bot_address == bot_address)
            .cloned()
    }

    /// Validators keyed by operator address, optionally of one status
    pub fn get_validators(&self, status: Option<&str>) -> BTreeMap<String, ValidatorRecord> {
        self.snapshot()
            .validators
            .iter()
            .filter(|validator| status.map_or(true, |wanted| validator.status.as_deref() == Some(wanted)))
            .map(|validator| (validator.operator_address.clone(), validator.clone()))
            .collect()
    }

    /// Yield of each validator, empty when APY is disabled for the chain
    pub fn get_apy(&self) -> BTreeMap<String, f64> {
        let snapshot = self.snapshot();
        match snapshot.profile.estimated_apr {
            Some(apr) if snapshot.profile.apy_enabled => {
                compute_apy(&self.get_validators(None), &snapshot.operators, apr)
            }
            _ => BTreeMap::new(),
        }
    }
}

/// Configured REST URLs, else the directory proxy
fn rest_urls(config: &NetworkConfig, directory: &dyn Directory) -> Vec<String> {
    match &config.rest_url {
        Some(url) if !url.urls().is_empty() => url.urls(),
        _ => vec![directory.rest_url(config.network_name())],
    }
}
