//! # Chain Directory
//!
//! Client for the cosmos.directory aggregation service.
//!
//! | Endpoint | Returns |
//! |----------|---------|
//! | `chains.<domain>/<name>` | chain registry data under `.chain` |
//! | `validators.<domain>/chains/<name>` | validator list under `.validators` |
//! | `validators.<domain>` | every validator with the chains it validates |
//! | `rest.<domain>/<name>` | REST proxy for the chain |
//! | `rpc.<domain>/<name>` | RPC proxy for the chain |

use crate::error::{DirectoryError, Result};
use async_trait::async_trait;
use restake_core::{ChainData, ValidatorRecord};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

/// Mainnet directory domain
pub const DIRECTORY_DOMAIN: &str = "cosmos.directory";

/// Testnet directory domain
pub const TESTNET_DIRECTORY_DOMAIN: &str = "testcosmos.directory";

/// Chain name -> operator address -> bot address
pub type OperatorAddresses = BTreeMap<String, BTreeMap<String, String>>;

/// Source of chain and validator metadata
#[async_trait]
pub trait Directory: Send + Sync {
    /// REST proxy URL for a chain
    fn rest_url(&self, name: &str) -> String;

    /// RPC proxy URL for a chain
    fn rpc_url(&self, name: &str) -> String;

    /// Partial chain data for a chain
    async fn get_chain_data(&self, name: &str) -> Result<ChainData>;

    /// All validators of a chain
    async fn get_validators(&self, name: &str) -> Result<Vec<ValidatorRecord>>;

    /// Restake bot addresses of every restake-enabled validator, per chain
    async fn get_operator_addresses(&self) -> Result<OperatorAddresses>;
}

/// Base URLs of the directory services
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryConfig {
    pub chains_url: String,
    pub validators_url: String,
    pub rest_url: String,
    pub rpc_url: String,
}

impl DirectoryConfig {
    /// Services as subdomains of `domain`
    pub fn for_domain(domain: &str) -> Self {
        Self {
            chains_url: format!("https://chains.{}", domain),
            validators_url: format!("https://validators.{}", domain),
            rest_url: format!("https://rest.{}", domain),
            rpc_url: format!("https://rpc.{}", domain),
        }
    }

    pub fn mainnet() -> Self {
        Self::for_domain(DIRECTORY_DOMAIN)
    }

    pub fn testnet() -> Self {
        Self::for_domain(TESTNET_DIRECTORY_DOMAIN)
    }

    pub fn for_network(testnet: bool) -> Self {
        if testnet {
            Self::testnet()
        } else {
            Self::mainnet()
        }
    }

    /// All services as paths under one base URL, e.g. a local mirror
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            chains_url: format!("{}/chains", base),
            validators_url: format!("{}/validators", base),
            rest_url: format!("{}/rest", base),
            rpc_url: format!("{}/rpc", base),
        }
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self::mainnet()
    }
}

#[derive(Deserialize)]
struct ChainResponse {
    chain: ChainData,
}

#[derive(Deserialize)]
struct ValidatorsResponse {
    #[serde(default)]
    validators: Vec<ValidatorRecord>,
}

#[derive(Deserialize)]
struct RegistryResponse {
    #[serde(default)]
    validators: Vec<RegistryValidator>,
}

#[derive(Deserialize)]
struct RegistryValidator {
    #[serde(default)]
    chains: Vec<RegistryChain>,
}

#[derive(Deserialize)]
struct RegistryChain {
    name: String,
    address: String,
    #[serde(default)]
    restake: Option<RestakeField>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RestakeField {
    Bot { address: String },
    Flag(bool),
}

/// HTTP client for cosmos.directory
#[derive(Clone, Debug)]
pub struct CosmosDirectory {
    client: reqwest::Client,
    config: DirectoryConfig,
}

impl CosmosDirectory {
    pub fn new(config: DirectoryConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Mainnet or testnet directory
    pub fn for_network(testnet: bool) -> Self {
        Self::new(DirectoryConfig::for_network(testnet))
    }

    pub fn with_client(client: reqwest::Client, config: DirectoryConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &DirectoryConfig {
        &self.config
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        tracing::debug!(%url, "Fetching from directory");

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DirectoryError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| DirectoryError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

fn join(base: &str, path: &str) -> Result<Url> {
    Ok(Url::parse(&format!("{}/{}", base.trim_end_matches('/'), path))?)
}

#[async_trait]
impl Directory for CosmosDirectory {
    fn rest_url(&self, name: &str) -> String {
        format!("{}/{}", self.config.rest_url.trim_end_matches('/'), name)
    }

    fn rpc_url(&self, name: &str) -> String {
        format!("{}/{}", self.config.rpc_url.trim_end_matches('/'), name)
    }

    async fn get_chain_data(&self, name: &str) -> Result<ChainData> {
        let url = join(&self.config.chains_url, name)?;
        let response: ChainResponse = self.get_json(url).await?;
        Ok(response.chain)
    }

    async fn get_validators(&self, name: &str) -> Result<Vec<ValidatorRecord>> {
        let url = join(&self.config.validators_url, &format!("chains/{}", name))?;
        let response: ValidatorsResponse = self.get_json(url).await?;
        Ok(response.validators)
    }

    async fn get_operator_addresses(&self) -> Result<OperatorAddresses> {
        let url = Url::parse(&self.config.validators_url)?;
        let response: RegistryResponse = self.get_json(url).await?;

        let mut addresses = OperatorAddresses::new();
        for chain in response.validators.into_iter().flat_map(|v| v.chains) {
            if let Some(RestakeField::Bot { address: bot }) = chain.restake {
                addresses
                    .entry(chain.name)
                    .or_default()
                    .insert(chain.address, bot);
            }
        }
        Ok(addresses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_directory_urls() {
        let directory = CosmosDirectory::for_network(false);

        assert_eq!(directory.rest_url("osmosis"), "https://rest.cosmos.directory/osmosis");
        assert_eq!(directory.rpc_url("osmosis"), "https://rpc.cosmos.directory/osmosis");
    }

    #[test]
    fn test_testnet_domain() {
        let directory = CosmosDirectory::for_network(true);

        assert_eq!(
            directory.rest_url("theta"),
            "https://rest.testcosmos.directory/theta"
        );
    }

    #[tokio::test]
    async fn test_get_chain_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/chains/cosmoshub"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "repository": {"url": "https://github.com/cosmos/chain-registry"},
                "chain": {
                    "chain_id": "cosmoshub-4",
                    "pretty_name": "Cosmos Hub",
                    "denom": "uatom",
                    "decimals": 6,
                    "params": {"calculated_apr": 0.19, "authz": true},
                    "proxy_status": {"rest": true, "rpc": false}
                }
            })))
            .mount(&server)
            .await;

        let directory = CosmosDirectory::new(DirectoryConfig::with_base(&server.uri()));
        let chain = directory.get_chain_data("cosmoshub").await.unwrap();

        assert_eq!(chain.chain_id.as_deref(), Some("cosmoshub-4"));
        assert_eq!(chain.decimals, Some(6));
        assert!(chain.proxy_status.unwrap().rest);
    }

    #[tokio::test]
    async fn test_get_validators() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/validators/chains/osmosis"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "osmosis",
                "validators": [
                    {
                        "operator_address": "osmovaloper1a",
                        "moniker": "A",
                        "status": "BOND_STATUS_BONDED",
                        "restake": {"address": "osmo1bota", "run_time": "21:00"}
                    },
                    {
                        "operator_address": "osmovaloper1b",
                        "moniker": "B",
                        "restake": false
                    }
                ]
            })))
            .mount(&server)
            .await;

        let directory = CosmosDirectory::new(DirectoryConfig::with_base(&server.uri()));
        let validators = directory.get_validators("osmosis").await.unwrap();

        assert_eq!(validators.len(), 2);
        assert_eq!(validators[0].bot_address(), Some("osmo1bota"));
        assert!(!validators[1].is_restake());
    }

    #[tokio::test]
    async fn test_get_operator_addresses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/validators"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "validators": [
                    {
                        "path": "ecostake",
                        "chains": [
                            {"name": "osmosis", "address": "osmovaloper1eco", "restake": {"address": "osmo1bot"}},
                            {"name": "juno", "address": "junovaloper1eco", "restake": false}
                        ]
                    },
                    {
                        "path": "other",
                        "chains": [
                            {"name": "osmosis", "address": "osmovaloper1other", "restake": {"address": "osmo1bot2"}}
                        ]
                    }
                ]
            })))
            .mount(&server)
            .await;

        let directory = CosmosDirectory::new(DirectoryConfig::with_base(&server.uri()));
        let addresses = directory.get_operator_addresses().await.unwrap();

        let osmosis = addresses.get("osmosis").unwrap();
        assert_eq!(osmosis.len(), 2);
        assert_eq!(osmosis.get("osmovaloper1eco").map(String::as_str), Some("osmo1bot"));
        assert!(!addresses.contains_key("juno"));
    }

    #[tokio::test]
    async fn test_not_found_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/chains/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let directory = CosmosDirectory::new(DirectoryConfig::with_base(&server.uri()));
        let result = directory.get_chain_data("missing").await;

        assert!(matches!(
            result,
            Err(DirectoryError::Status { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/chains/broken"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let directory = CosmosDirectory::new(DirectoryConfig::with_base(&server.uri()));
        let result = directory.get_chain_data("broken").await;

        assert!(matches!(result, Err(DirectoryError::Decode { .. })));
    }
}
