//! Network configuration types
//!
//! A [`NetworkConfig`] is the static, partially specified description of one
//! network as it appears in a networks file. Chain registry fields may be
//! given inline; they are flattened into [`ChainData`] and later merged with
//! whatever the directory returns.

use crate::chain::ChainData;
use crate::error::{ConfigError, Result};
use crate::gas::GasPriceStep;
use crate::validator::OperatorRecord;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default transaction timeout in milliseconds
pub const DEFAULT_TX_TIMEOUT_MS: u64 = 60_000;

/// Default multiplier applied to estimated gas
pub const DEFAULT_GAS_MODIFIER: f64 = 1.5;

/// Static configuration for one network
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfig {
    /// Registry name of the network
    #[serde(default)]
    pub name: String,

    /// Directory path, preferred over `name` when present
    #[serde(default)]
    pub path: Option<String>,

    /// Listed in the UI
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Flagged as experimental
    #[serde(default)]
    pub experimental: bool,

    /// Selected when no network is specified
    #[serde(default)]
    pub default: bool,

    /// Validator operated by the owner of this deployment
    #[serde(default)]
    pub owner_address: Option<String>,

    /// Explicit operator list, used verbatim when present
    #[serde(default)]
    pub operators: Option<Vec<OperatorRecord>>,

    /// Only these operator addresses are eligible
    #[serde(default)]
    pub allow_operators: Option<Vec<String>>,

    /// These operator addresses are never eligible
    #[serde(default)]
    pub block_operators: Option<Vec<String>>,

    /// Explicit gas price, `<decimal><denom>`
    #[serde(default)]
    pub gas_price: Option<String>,

    /// Explicit low/average/high override
    #[serde(default)]
    pub gas_price_step: Option<GasPriceStep>,

    /// Multiplier applied to estimated gas
    #[serde(default)]
    pub gas_modifier: Option<f64>,

    /// `Some(false)` disables APY regardless of chain data
    #[serde(default)]
    pub apy_enabled: Option<bool>,

    /// Transaction timeout in milliseconds
    #[serde(default)]
    pub tx_timeout: Option<u64>,

    #[serde(default)]
    pub testnet: bool,

    /// Registry network type, `"testnet"` marks a testnet
    #[serde(default, alias = "network_type")]
    pub network_type: Option<String>,

    /// REST endpoint override, one URL or a list
    #[serde(default)]
    pub rest_url: Option<RestUrl>,

    /// Inline chain registry data
    #[serde(flatten)]
    pub chain: ChainData,
}

/// One REST URL or a list of candidates
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RestUrl {
    Single(String),
    Multiple(Vec<String>),
}

impl RestUrl {
    /// All candidate URLs in order
    pub fn urls(&self) -> Vec<String> {
        match self {
            Self::Single(url) => vec![url.clone()],
            Self::Multiple(urls) => urls.clone(),
        }
    }
}

impl From<&str> for RestUrl {
    fn from(url: &str) -> Self {
        Self::Single(url.to_string())
    }
}

impl NetworkConfig {
    /// Parse a single network from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configs that cannot identify their network
    pub fn validate(&self) -> Result<()> {
        if self.network_name().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "network has neither name nor path".to_string(),
            ));
        }
        if let Some(modifier) = self.gas_modifier {
            if !modifier.is_finite() || modifier < 0.0 {
                return Err(ConfigError::InvalidConfig(format!(
                    "gasModifier must be a non-negative number, got {}",
                    modifier
                )));
            }
        }
        Ok(())
    }

    /// Directory name of the network
    pub fn network_name(&self) -> &str {
        match self.path.as_deref() {
            Some(path) if !path.is_empty() => path,
            _ => &self.name,
        }
    }

    pub fn is_testnet(&self) -> bool {
        self.testnet || self.network_type.as_deref() == Some("testnet")
    }

    pub fn tx_timeout(&self) -> Duration {
        Duration::from_millis(self.tx_timeout.unwrap_or(DEFAULT_TX_TIMEOUT_MS))
    }

    /// Zero counts as unset
    pub fn gas_modifier(&self) -> f64 {
        match self.gas_modifier {
            Some(modifier) if modifier > 0.0 => modifier,
            _ => DEFAULT_GAS_MODIFIER,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_original_keys() {
        let config = NetworkConfig::from_json(
            r#"{
                "name": "cosmoshub",
                "ownerAddress": "cosmosvaloper1owner",
                "gasPrice": "0.0025uatom",
                "allowOperators": ["cosmosvaloper1a"],
                "restUrl": ["https://a.example", "https://b.example"],
                "txTimeout": 30000,
                "chain_id": "cosmoshub-4",
                "denom": "uatom",
                "decimals": 6
            }"#,
        )
        .unwrap();

        assert_eq!(config.network_name(), "cosmoshub");
        assert_eq!(config.owner_address.as_deref(), Some("cosmosvaloper1owner"));
        assert_eq!(config.gas_price.as_deref(), Some("0.0025uatom"));
        assert_eq!(config.tx_timeout(), Duration::from_millis(30_000));
        assert_eq!(config.chain.chain_id.as_deref(), Some("cosmoshub-4"));
        assert_eq!(config.chain.decimals, Some(6));
        assert_eq!(
            config.rest_url.unwrap().urls(),
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
    }

    #[test]
    fn test_defaults() {
        let config = NetworkConfig {
            name: "osmosis".to_string(),
            ..Default::default()
        };

        assert_eq!(config.tx_timeout(), Duration::from_millis(DEFAULT_TX_TIMEOUT_MS));
        assert_eq!(config.gas_modifier(), DEFAULT_GAS_MODIFIER);
        assert!(!config.is_testnet());
    }

    #[test]
    fn test_path_preferred_over_name() {
        let config = NetworkConfig {
            name: "Cosmos Hub".to_string(),
            path: Some("cosmoshub".to_string()),
            ..Default::default()
        };

        assert_eq!(config.network_name(), "cosmoshub");
    }

    #[test]
    fn test_testnet_from_network_type() {
        let config = NetworkConfig::from_json(
            r#"{"name": "theta", "network_type": "testnet"}"#,
        )
        .unwrap();

        assert!(config.is_testnet());
    }

    #[test]
    fn test_missing_name_rejected() {
        let result = NetworkConfig::from_json(r#"{"denom": "uatom"}"#);
        assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_gas_modifier_uses_default() {
        let config = NetworkConfig {
            name: "juno".to_string(),
            gas_modifier: Some(0.0),
            ..Default::default()
        };

        assert_eq!(config.gas_modifier(), DEFAULT_GAS_MODIFIER);
    }
}
