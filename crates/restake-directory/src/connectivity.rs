//! # Connectivity Manager
//!
//! Builds a query client for a network and reports whether the network is
//! usable. Failures never reach the caller: they are logged and folded into a
//! [`ConnectivityStatus`], and whatever client was in place before is kept.
//!
//! A network whose REST URL points at the directory proxy additionally needs
//! the directory to report its REST proxy healthy.

use crate::directory::DIRECTORY_DOMAIN;
use crate::error::QueryError;
use crate::query_client::{ConnectOptions, QueryClient, QueryClientFactory};
use std::fmt;
use std::sync::Arc;

/// Outcome of a connection attempt
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectivityStatus {
    /// Never attempted
    NotConnected,

    Connected,

    /// No query client could be built
    Unreachable(String),

    /// Client is up but the directory proxy reports the chain unhealthy
    DirectoryUnhealthy,
}

impl ConnectivityStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ConnectivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "not connected"),
            Self::Connected => write!(f, "connected"),
            Self::Unreachable(cause) => write!(f, "unreachable: {}", cause),
            Self::DirectoryUnhealthy => write!(f, "directory proxy unhealthy"),
        }
    }
}

/// Whether a URL is served by the public directory proxy
pub fn is_directory_url(url: &str) -> bool {
    url.contains(DIRECTORY_DOMAIN)
}

/// Whether any candidate URL is served by the directory proxy
pub fn uses_directory<S: AsRef<str>>(urls: &[S]) -> bool {
    urls.iter().any(|url| is_directory_url(url.as_ref()))
}

/// Query client, REST URL and status of a network
#[derive(Clone, Debug)]
pub struct Connection {
    pub query_client: Option<Arc<dyn QueryClient>>,

    /// URL the query client resolved to, else the last requested one
    pub rest_url: Option<String>,

    pub status: ConnectivityStatus,
}

impl Connection {
    pub fn disconnected() -> Self {
        Self {
            query_client: None,
            rest_url: None,
            status: ConnectivityStatus::NotConnected,
        }
    }

    pub fn connected(&self) -> bool {
        self.status.is_connected()
    }
}

impl Default for Connection {
    fn default() -> Self {
        Self::disconnected()
    }
}

/// Target of a connection attempt
#[derive(Clone, Debug, Default)]
pub struct ConnectRequest<'a> {
    pub chain_id: Option<&'a str>,
    pub rest_urls: &'a [String],

    /// Directory proxy health for the REST capability
    pub directory_healthy: bool,
}

/// Establishes query clients through a [`QueryClientFactory`]
#[derive(Clone)]
pub struct ConnectivityManager {
    factory: Arc<dyn QueryClientFactory>,
}

impl ConnectivityManager {
    pub fn new(factory: Arc<dyn QueryClientFactory>) -> Self {
        Self { factory }
    }

    /// Attempt a connection; never fails.
    ///
    /// The timeout in `options` bounds client construction only.
    pub async fn connect(
        &self,
        request: &ConnectRequest<'_>,
        options: &ConnectOptions,
        previous: &Connection,
    ) -> Connection {
        let attempt = self
            .factory
            .connect(request.chain_id, request.rest_urls, options);

        let result = match options.timeout {
            Some(limit) => match tokio::time::timeout(limit, attempt).await {
                Ok(result) => result,
                Err(_) => Err(QueryError::Timeout(limit)),
            },
            None => attempt.await,
        };

        match result {
            Ok(client) => {
                let rest_url = client.rest_url().to_string();
                let status = if !client.connected() {
                    ConnectivityStatus::Unreachable(format!("{} reports disconnected", rest_url))
                } else if uses_directory(request.rest_urls) && !request.directory_healthy {
                    tracing::warn!(
                        %rest_url,
                        "Directory proxy is unhealthy, marking network offline"
                    );
                    ConnectivityStatus::DirectoryUnhealthy
                } else {
                    tracing::info!(%rest_url, "Connected to REST endpoint");
                    ConnectivityStatus::Connected
                };

                Connection {
                    query_client: Some(client),
                    rest_url: Some(rest_url),
                    status,
                }
            }
            Err(e) => {
                tracing::warn!(
                    rest_urls = ?request.rest_urls,
                    error = %e,
                    "Failed to connect"
                );

                Connection {
                    query_client: previous.query_client.clone(),
                    rest_url: previous
                        .rest_url
                        .clone()
                        .or_else(|| request.rest_urls.first().cloned()),
                    status: ConnectivityStatus::Unreachable(e.to_string()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{StubQueryClient, StubQueryClientFactory};
    use std::time::Duration;

    fn manager(delay: Duration) -> ConnectivityManager {
        ConnectivityManager::new(Arc::new(StubQueryClientFactory::with_delay(delay)))
    }

    #[test]
    fn test_directory_url_detection() {
        assert!(is_directory_url("https://rest.cosmos.directory/osmosis"));
        assert!(is_directory_url("https://rest.testcosmos.directory/theta"));
        assert!(!is_directory_url("https://lcd.osmosis.zone"));
        assert!(uses_directory(&["https://a.example", "https://rest.cosmos.directory/a"]));
    }

    #[tokio::test]
    async fn test_connected() {
        let urls = vec!["https://lcd.example".to_string()];
        let request = ConnectRequest {
            chain_id: Some("osmosis-1"),
            rest_urls: &urls,
            directory_healthy: false,
        };

        let connection = manager(Duration::ZERO)
            .connect(&request, &ConnectOptions::default(), &Connection::disconnected())
            .await;

        assert!(connection.connected());
        assert_eq!(connection.rest_url.as_deref(), Some("https://lcd.example"));
    }

    #[tokio::test]
    async fn test_directory_unhealthy() {
        let urls = vec!["https://rest.cosmos.directory/osmosis".to_string()];
        let request = ConnectRequest {
            chain_id: Some("osmosis-1"),
            rest_urls: &urls,
            directory_healthy: false,
        };

        let connection = manager(Duration::ZERO)
            .connect(&request, &ConnectOptions::default(), &Connection::disconnected())
            .await;

        assert_eq!(connection.status, ConnectivityStatus::DirectoryUnhealthy);
        assert!(!connection.connected());
        assert!(connection.query_client.is_some());
    }

    #[tokio::test]
    async fn test_directory_healthy() {
        let urls = vec!["https://rest.cosmos.directory/osmosis".to_string()];
        let request = ConnectRequest {
            chain_id: Some("osmosis-1"),
            rest_urls: &urls,
            directory_healthy: true,
        };

        let connection = manager(Duration::ZERO)
            .connect(&request, &ConnectOptions::default(), &Connection::disconnected())
            .await;

        assert!(connection.connected());
    }

    #[tokio::test]
    async fn test_timeout_is_absorbed_and_prior_client_kept() {
        let urls = vec!["https://slow.example".to_string()];
        let request = ConnectRequest {
            chain_id: None,
            rest_urls: &urls,
            directory_healthy: false,
        };
        let previous = Connection {
            query_client: Some(Arc::new(StubQueryClient::new("https://old.example"))),
            rest_url: Some("https://old.example".to_string()),
            status: ConnectivityStatus::Connected,
        };
        let options = ConnectOptions {
            timeout: Some(Duration::from_millis(1)),
            ..Default::default()
        };

        let connection = manager(Duration::from_secs(5))
            .connect(&request, &options, &previous)
            .await;

        assert!(matches!(connection.status, ConnectivityStatus::Unreachable(_)));
        assert!(!connection.connected());
        assert_eq!(connection.rest_url.as_deref(), Some("https://old.example"));
        assert_eq!(
            connection.query_client.map(|client| client.rest_url().to_string()),
            Some("https://old.example".to_string())
        );
    }
}
