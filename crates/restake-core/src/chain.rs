//! # Chain Resolution
//!
//! Turns raw chain registry data into a canonical [`ChainProfile`].
//!
//! Local config and remote directory data share the [`ChainData`] shape.
//! Remote values win field by field; local-only switches such as
//! `apyEnabled: false` are applied after the merge. Resolution is a pure
//! function of its inputs and can be repeated whenever either side changes.

use crate::config::{NetworkConfig, DEFAULT_TX_TIMEOUT_MS};
use crate::error::{ConfigError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Largest number of decimals the gas math accepts
pub const MAX_DECIMALS: u32 = 18;

/// Coin type used when the registry gives none
pub const DEFAULT_SLIP44: u32 = 118;

/// Partial chain data, from a networks file or the directory
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainData {
    #[serde(default, alias = "chainId", skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<String>,

    #[serde(default, alias = "prettyName", skip_serializing_if = "Option::is_none")]
    pub pretty_name: Option<String>,

    /// Bech32 address prefix
    #[serde(default, alias = "prefix", skip_serializing_if = "Option::is_none")]
    pub bech32_prefix: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slip44: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub denom: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, alias = "coinGeckoId", skip_serializing_if = "Option::is_none")]
    pub coingecko_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<Vec<AssetData>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fees: Option<FeeConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<ChainParams>,

    #[serde(default, alias = "ledgerSupport", skip_serializing_if = "Option::is_none")]
    pub ledger_support: Option<bool>,

    #[serde(default, alias = "authzSupport", skip_serializing_if = "Option::is_none")]
    pub authz_support: Option<bool>,

    #[serde(default, alias = "authzAminoSupport", skip_serializing_if = "Option::is_none")]
    pub authz_amino_support: Option<bool>,

    #[serde(default, alias = "authzAminoGenericOnly", skip_serializing_if = "Option::is_none")]
    pub authz_amino_generic_only: Option<bool>,

    #[serde(default, alias = "authzAminoLiftedValues", skip_serializing_if = "Option::is_none")]
    pub authz_amino_lifted_values: Option<bool>,

    #[serde(
        default,
        alias = "authzAminoExecPreventTypes",
        skip_serializing_if = "Option::is_none"
    )]
    pub authz_amino_exec_prevent_types: Option<Vec<String>>,

    /// Module name to API version, e.g. `gov` -> `v1`
    #[serde(default, alias = "apiVersions", skip_serializing_if = "Option::is_none")]
    pub api_versions: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,

    /// Directory proxy health per capability
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_status: Option<ProxyStatus>,
}

/// Registry asset entry
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub denom: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<DenomUnit>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<DenomUnit>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coingecko_id: Option<String>,
}

impl AssetData {
    /// On-chain base denom
    pub fn base_denom(&self) -> Option<&str> {
        self.base
            .as_ref()
            .map(|unit| unit.denom.as_str())
            .or(self.denom.as_deref())
    }

    /// Human facing denom
    pub fn display_denom(&self) -> Option<&str> {
        self.display.as_ref().map(|unit| unit.denom.as_str())
    }
}

/// Denomination unit of an asset
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenomUnit {
    pub denom: String,

    #[serde(default)]
    pub exponent: u32,
}

/// Fee section of the registry
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FeeConfig {
    #[serde(default)]
    pub fee_tokens: Vec<FeeToken>,
}

/// Gas price hints for one fee denom
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeToken {
    pub denom: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_min_gas_price: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_gas_price: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_gas_price: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_gas_price: Option<Decimal>,
}

/// Chain parameters published by the directory
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculated_apr: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authz: Option<bool>,
}

/// Health of the directory proxies for a chain
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyStatus {
    #[serde(default)]
    pub rest: bool,

    #[serde(default)]
    pub rpc: bool,
}

macro_rules! overlay {
    ($local:expr, $remote:expr, [$($field:ident),* $(,)?]) => {
        ChainData {
            $($field: $remote.$field.clone().or_else(|| $local.$field.clone()),)*
        }
    };
}

impl ChainData {
    /// Merge remote data over this one, remote wins where present
    pub fn merged_with(&self, remote: &ChainData) -> ChainData {
        overlay!(
            self,
            remote,
            [
                chain_id,
                pretty_name,
                bech32_prefix,
                slip44,
                denom,
                display,
                symbol,
                decimals,
                image,
                coingecko_id,
                assets,
                fees,
                params,
                ledger_support,
                authz_support,
                authz_amino_support,
                authz_amino_generic_only,
                authz_amino_lifted_values,
                authz_amino_exec_prevent_types,
                api_versions,
                keywords,
                proxy_status,
            ]
        )
    }
}

/// Canonical, fully resolved chain metadata
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChainProfile {
    /// Directory name of the network
    pub name: String,
    pub pretty_name: String,
    pub chain_id: Option<String>,
    pub prefix: Option<String>,
    pub slip44: u32,
    pub assets: Vec<AssetData>,
    pub base_asset: Option<AssetData>,
    pub denom: String,
    pub display: Option<String>,
    pub decimals: u32,
    pub symbol: Option<String>,
    pub image: Option<String>,
    pub coingecko_id: Option<String>,
    pub estimated_apr: Option<f64>,
    pub apy_enabled: bool,
    pub ledger_support: bool,
    pub authz_support: bool,
    pub authz_amino_support: bool,
    pub authz_amino_generic_only: bool,
    pub authz_amino_lifted_values: bool,
    pub authz_amino_exec_prevent_types: Vec<String>,
    pub fee_tokens: Vec<FeeToken>,
    pub api_versions: BTreeMap<String, String>,
    pub keywords: Vec<String>,
    pub proxy_status: Option<ProxyStatus>,
    pub tx_timeout_ms: u64,
}

impl ChainProfile {
    /// Fee token whose denom is the chain denom
    pub fn fee_token(&self) -> Option<&FeeToken> {
        self.fee_tokens.iter().find(|token| token.denom == self.denom)
    }

    /// API version of a module, if the chain declares one
    pub fn api_version(&self, module: &str) -> Option<&str> {
        self.api_versions.get(module).map(String::as_str)
    }

    /// Directory proxy health for the REST capability
    pub fn directory_rest_healthy(&self) -> bool {
        self.proxy_status.as_ref().map_or(false, |status| status.rest)
    }
}

/// Resolve a network's chain profile from its config and optional remote data.
///
/// # Errors
///
/// Returns [`ConfigError::MissingDenom`] or [`ConfigError::MissingDecimals`]
/// when neither source provides them, and [`ConfigError::UnsupportedDecimals`]
/// above [`MAX_DECIMALS`].
pub fn resolve(config: &NetworkConfig, remote: Option<&ChainData>) -> Result<ChainProfile> {
    let data = match remote {
        Some(remote) => config.chain.merged_with(remote),
        None => config.chain.clone(),
    };
    let network = config.network_name().to_string();

    let assets = data.assets.clone().unwrap_or_default();
    let denom = data
        .denom
        .clone()
        .or_else(|| {
            assets
                .first()
                .and_then(|asset| asset.base_denom())
                .map(str::to_string)
        })
        .ok_or_else(|| ConfigError::MissingDenom {
            network: network.clone(),
        })?;
    let base_asset = assets
        .iter()
        .find(|asset| asset.base_denom() == Some(denom.as_str()))
        .or_else(|| assets.first())
        .cloned();

    let decimals = data
        .decimals
        .or_else(|| base_asset.as_ref().and_then(|asset| asset.decimals))
        .ok_or_else(|| ConfigError::MissingDecimals {
            network: network.clone(),
        })?;
    if decimals > MAX_DECIMALS {
        return Err(ConfigError::UnsupportedDecimals {
            decimals,
            max: MAX_DECIMALS,
        });
    }

    let from_asset = |pick: fn(&AssetData) -> Option<String>| base_asset.as_ref().and_then(pick);

    let estimated_apr = data.params.as_ref().and_then(|params| params.calculated_apr);
    let apy_enabled =
        config.apy_enabled != Some(false) && estimated_apr.map_or(false, |apr| apr > 0.0);

    let authz_support = data
        .authz_support
        .or_else(|| data.params.as_ref().and_then(|params| params.authz))
        .unwrap_or(false);
    let authz_amino_support = data.authz_amino_support.unwrap_or(false);

    let mut api_versions = BTreeMap::from([("gov".to_string(), "v1beta1".to_string())]);
    api_versions.extend(data.api_versions.clone().unwrap_or_default());

    let mut keywords = data.keywords.clone().unwrap_or_default();
    if authz_support {
        keywords.push("authz".to_string());
    }
    if authz_amino_support {
        keywords.push("full authz ledger".to_string());
    }

    let profile = ChainProfile {
        pretty_name: data.pretty_name.clone().unwrap_or_else(|| network.clone()),
        chain_id: data.chain_id.clone(),
        prefix: data.bech32_prefix.clone(),
        slip44: data.slip44.unwrap_or(DEFAULT_SLIP44),
        display: data
            .display
            .clone()
            .or_else(|| from_asset(|asset| asset.display_denom().map(str::to_string))),
        symbol: data
            .symbol
            .clone()
            .or_else(|| from_asset(|asset| asset.symbol.clone())),
        image: data
            .image
            .clone()
            .or_else(|| from_asset(|asset| asset.image.clone())),
        coingecko_id: data
            .coingecko_id
            .clone()
            .or_else(|| from_asset(|asset| asset.coingecko_id.clone())),
        estimated_apr,
        apy_enabled,
        ledger_support: data.ledger_support.unwrap_or(true),
        authz_support,
        authz_amino_support,
        authz_amino_generic_only: data.authz_amino_generic_only.unwrap_or(false),
        authz_amino_lifted_values: data.authz_amino_lifted_values.unwrap_or(false),
        authz_amino_exec_prevent_types: data
            .authz_amino_exec_prevent_types
            .clone()
            .unwrap_or_default(),
        fee_tokens: data
            .fees
            .as_ref()
            .map(|fees| fees.fee_tokens.clone())
            .unwrap_or_default(),
        api_versions,
        keywords,
        proxy_status: data.proxy_status.clone(),
        tx_timeout_ms: config.tx_timeout.unwrap_or(DEFAULT_TX_TIMEOUT_MS),
        name: network,
        assets,
        base_asset,
        denom,
        decimals,
    };

    tracing::debug!(
        network = %profile.name,
        denom = %profile.denom,
        decimals = profile.decimals,
        "Resolved chain profile"
    );

    Ok(profile)
}
