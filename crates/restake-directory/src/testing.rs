//! In-memory query clients for tests

use crate::error::QueryError;
use crate::query_client::{ConnectOptions, ProposalVote, QueryClient, QueryClientFactory};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Query client bound to a URL that never holds votes
#[derive(Debug)]
pub struct StubQueryClient {
    url: String,
}

impl StubQueryClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl QueryClient for StubQueryClient {
    fn rest_url(&self) -> &str {
        &self.url
    }

    fn connected(&self) -> bool {
        true
    }

    async fn get_proposal_vote(
        &self,
        _proposal_id: u64,
        _voter: &str,
    ) -> Result<Option<ProposalVote>, QueryError> {
        Ok(None)
    }
}

/// Connects to the first candidate URL after an optional delay
#[derive(Debug, Default)]
pub struct StubQueryClientFactory {
    delay: Duration,
}

impl StubQueryClientFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl QueryClientFactory for StubQueryClientFactory {
    async fn connect(
        &self,
        _chain_id: Option<&str>,
        rest_urls: &[String],
        _options: &ConnectOptions,
    ) -> Result<Arc<dyn QueryClient>, QueryError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let url = rest_urls
            .first()
            .cloned()
            .ok_or_else(|| QueryError::Unreachable("no REST URL configured".to_string()))?;
        Ok(Arc::new(StubQueryClient::new(url)))
    }
}
