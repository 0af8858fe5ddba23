//! REST query client
//!
//! A [`QueryClient`] is bound to one chain and one REST endpoint. Construction
//! goes through a [`QueryClientFactory`], which picks the first candidate URL
//! that serves the expected chain.

use crate::error::QueryError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Module API version used when the chain declares none
pub const DEFAULT_API_VERSION: &str = "v1beta1";

const LATEST_BLOCK_PATH: &str = "cosmos/base/tendermint/v1beta1/blocks/latest";

/// Options for query client construction
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Upper bound on construction time, unbounded when `None`
    pub timeout: Option<Duration>,

    /// Module name to API version
    pub api_versions: BTreeMap<String, String>,
}

/// A vote option and its weight
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedVoteOption {
    pub option: String,

    #[serde(default)]
    pub weight: Option<String>,
}

/// Vote cast by a voter on a proposal
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalVote {
    pub proposal_id: String,
    pub voter: String,

    #[serde(default)]
    pub options: Vec<WeightedVoteOption>,

    /// Single option of legacy v1beta1 responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option: Option<String>,
}

impl ProposalVote {
    /// First weighted option, else the legacy single option
    pub fn primary_option(&self) -> Option<&str> {
        self.options
            .first()
            .map(|option| option.option.as_str())
            .or(self.option.as_deref())
    }
}

#[derive(Deserialize)]
struct VoteResponse {
    vote: ProposalVote,
}

#[derive(Deserialize)]
struct LatestBlock {
    block: Block,
}

#[derive(Deserialize)]
struct Block {
    header: BlockHeader,
}

#[derive(Deserialize)]
struct BlockHeader {
    chain_id: String,
}

/// Read access to a chain over REST
#[async_trait]
pub trait QueryClient: Send + Sync + fmt::Debug {
    /// REST URL actually in use
    fn rest_url(&self) -> &str;

    fn connected(&self) -> bool;

    /// Vote of `voter` on a proposal, `None` when no vote was cast
    async fn get_proposal_vote(
        &self,
        proposal_id: u64,
        voter: &str,
    ) -> Result<Option<ProposalVote>, QueryError>;
}

/// Builds query clients for a chain
#[async_trait]
pub trait QueryClientFactory: Send + Sync {
    async fn connect(
        &self,
        chain_id: Option<&str>,
        rest_urls: &[String],
        options: &ConnectOptions,
    ) -> Result<Arc<dyn QueryClient>, QueryError>;
}

/// Query client backed by a Cosmos SDK REST endpoint
#[derive(Clone, Debug)]
pub struct RestQueryClient {
    client: reqwest::Client,
    rest_url: String,
    chain_id: String,
    api_versions: BTreeMap<String, String>,
}

impl RestQueryClient {
    /// Connect to the first candidate URL serving `chain_id`.
    ///
    /// Each URL is tried once, in order.
    pub async fn connect(
        client: reqwest::Client,
        chain_id: Option<&str>,
        rest_urls: &[String],
        api_versions: BTreeMap<String, String>,
    ) -> Result<Self, QueryError> {
        let mut failures = Vec::new();

        for url in rest_urls {
            let url = url.trim_end_matches('/');
            match latest_chain_id(&client, url).await {
                Ok(found) => match chain_id {
                    Some(expected) if expected != found => {
                        tracing::warn!(
                            %url,
                            %found,
                            %expected,
                            "REST endpoint serves another chain"
                        );
                        failures.push(
                            QueryError::ChainIdMismatch {
                                expected: expected.to_string(),
                                found,
                            }
                            .to_string(),
                        );
                    }
                    _ => {
                        tracing::debug!(%url, "Using REST endpoint");
                        return Ok(Self {
                            client,
                            rest_url: url.to_string(),
                            chain_id: found,
                            api_versions,
                        });
                    }
                },
                Err(e) => {
                    tracing::debug!(%url, error = %e, "REST endpoint unavailable");
                    failures.push(format!("{}: {}", url, e));
                }
            }
        }

        if failures.is_empty() {
            failures.push("no REST URL configured".to_string());
        }
        Err(QueryError::Unreachable(failures.join("; ")))
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    /// API version of a module, `v1beta1` when undeclared
    pub fn api_version(&self, module: &str) -> &str {
        self.api_versions
            .get(module)
            .map(String::as_str)
            .unwrap_or(DEFAULT_API_VERSION)
    }
}

async fn latest_chain_id(client: &reqwest::Client, url: &str) -> Result<String, QueryError> {
    let block: LatestBlock = get_json(client, &format!("{}/{}", url, LATEST_BLOCK_PATH)).await?;
    Ok(block.block.header.chain_id)
}

async fn get_json<T: serde::de::DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
) -> Result<T, QueryError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(QueryError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| QueryError::Decode(e.to_string()))
}

#[async_trait]
impl QueryClient for RestQueryClient {
    fn rest_url(&self) -> &str {
        &self.rest_url
    }

    fn connected(&self) -> bool {
        true
    }

    async fn get_proposal_vote(
        &self,
        proposal_id: u64,
        voter: &str,
    ) -> Result<Option<ProposalVote>, QueryError> {
        let url = format!(
            "{}/cosmos/gov/{}/proposals/{}/votes/{}",
            self.rest_url,
            self.api_version("gov"),
            proposal_id,
            voter
        );

        match get_json::<VoteResponse>(&self.client, &url).await {
            Ok(response) => Ok(Some(response.vote)),
            // The gov module answers 400 or 404 when the voter has not voted
            Err(QueryError::Status { status, .. }) if status == 400 || status == 404 => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Factory producing [`RestQueryClient`]s
#[derive(Clone, Debug, Default)]
pub struct RestQueryClientFactory {
    client: reqwest::Client,
}

impl RestQueryClientFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl QueryClientFactory for RestQueryClientFactory {
    async fn connect(
        &self,
        chain_id: Option<&str>,
        rest_urls: &[String],
        options: &ConnectOptions,
    ) -> Result<Arc<dyn QueryClient>, QueryError> {
        let client = RestQueryClient::connect(
            self.client.clone(),
            chain_id,
            rest_urls,
            options.api_versions.clone(),
        )
        .await?;
        Ok(Arc::new(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn chain_server(chain_id: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/{}", LATEST_BLOCK_PATH)))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "block": {"header": {"chain_id": chain_id, "height": "100"}}
            })))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_connect_checks_chain_id() {
        let server = chain_server("cosmoshub-4").await;

        let client = RestQueryClient::connect(
            reqwest::Client::new(),
            Some("cosmoshub-4"),
            &[server.uri()],
            BTreeMap::new(),
        )
        .await
        .unwrap();

        assert_eq!(client.rest_url(), server.uri());
        assert_eq!(client.chain_id(), "cosmoshub-4");
        assert!(client.connected());
    }

    #[tokio::test]
    async fn test_connect_skips_wrong_chain() {
        let wrong = chain_server("theta-testnet-001").await;
        let right = chain_server("cosmoshub-4").await;

        let client = RestQueryClient::connect(
            reqwest::Client::new(),
            Some("cosmoshub-4"),
            &[wrong.uri(), right.uri()],
            BTreeMap::new(),
        )
        .await
        .unwrap();

        assert_eq!(client.rest_url(), right.uri());
    }

    #[tokio::test]
    async fn test_connect_fails_when_nothing_answers() {
        let wrong = chain_server("theta-testnet-001").await;

        let result = RestQueryClient::connect(
            reqwest::Client::new(),
            Some("cosmoshub-4"),
            &[wrong.uri()],
            BTreeMap::new(),
        )
        .await;

        assert!(matches!(result, Err(QueryError::Unreachable(_))));
    }

    #[tokio::test]
    async fn test_connect_without_urls() {
        let result =
            RestQueryClient::connect(reqwest::Client::new(), None, &[], BTreeMap::new()).await;

        assert!(matches!(result, Err(QueryError::Unreachable(_))));
    }

    #[tokio::test]
    async fn test_proposal_vote_uses_gov_version() {
        let server = chain_server("cosmoshub-4").await;
        Mock::given(method("GET"))
            .and(path("/cosmos/gov/v1/proposals/42/votes/cosmos1voter"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "vote": {
                    "proposal_id": "42",
                    "voter": "cosmos1voter",
                    "options": [{"option": "VOTE_OPTION_YES", "weight": "1.000000000000000000"}],
                    "metadata": ""
                }
            })))
            .mount(&server)
            .await;

        let versions = BTreeMap::from([("gov".to_string(), "v1".to_string())]);
        let client = RestQueryClient::connect(
            reqwest::Client::new(),
            Some("cosmoshub-4"),
            &[server.uri()],
            versions,
        )
        .await
        .unwrap();

        let vote = client
            .get_proposal_vote(42, "cosmos1voter")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(vote.primary_option(), Some("VOTE_OPTION_YES"));
    }

    #[tokio::test]
    async fn test_missing_vote_is_none() {
        let server = chain_server("cosmoshub-4").await;
        Mock::given(method("GET"))
            .and(path("/cosmos/gov/v1beta1/proposals/7/votes/cosmos1voter"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = RestQueryClient::connect(
            reqwest::Client::new(),
            Some("cosmoshub-4"),
            &[server.uri()],
            BTreeMap::new(),
        )
        .await
        .unwrap();

        let vote = client.get_proposal_vote(7, "cosmos1voter").await.unwrap();
        assert!(vote.is_none());
    }

    #[test]
    fn test_legacy_vote_option() {
        let vote: ProposalVote = serde_json::from_str(
            r#"{"proposal_id": "1", "voter": "cosmos1v", "option": "VOTE_OPTION_NO"}"#,
        )
        .unwrap();

        assert_eq!(vote.primary_option(), Some("VOTE_OPTION_NO"));
    }
}
