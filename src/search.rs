//! Search backend client
//!
//! Thin HTTP client for an Elasticsearch-compatible search service. The
//! query DSL itself belongs to callers; this client only knows how to reach
//! the service and ship JSON bodies to it.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value as JsonValue;
use tokio::time::{sleep, Instant};
use url::Url;

use crate::error::SearchClientError;

/// How long startup waits for the search backend to answer
pub const STARTUP_HEALTHCHECK_TIMEOUT: Duration = Duration::from_secs(30);

/// Pause between health check attempts
const HEALTHCHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Search client bound to one `http://<host>` base URL
#[derive(Debug, Clone)]
pub struct SearchClient {
    base_url: Url,
    client: Client,
    healthcheck_timeout: Duration,
}

impl SearchClient {
    /// Create a client for `host` (optionally `host:port`), gzip enabled
    pub fn new(host: &str) -> Result<Self, SearchClientError> {
        let raw = format!("http://{}", host);
        let base_url = Url::parse(&raw).map_err(|source| SearchClientError::InvalidUrl {
            url: raw.clone(),
            source,
        })?;
        if base_url.host_str().map_or(true, str::is_empty) {
            return Err(SearchClientError::MissingHost { url: raw });
        }

        let client = Client::builder().gzip(true).build()?;

        tracing::debug!(url = %base_url, "Created search client");
        Ok(Self {
            base_url,
            client,
            healthcheck_timeout: STARTUP_HEALTHCHECK_TIMEOUT,
        })
    }

    /// Create a client and wait for the backend to report healthy within
    /// `healthcheck_timeout`
    pub async fn connect(host: &str, healthcheck_timeout: Duration) -> Result<Self, SearchClientError> {
        let client = Self::new(host)?.with_healthcheck_timeout(healthcheck_timeout);
        client.wait_until_healthy().await?;
        Ok(client)
    }

    pub fn with_healthcheck_timeout(mut self, timeout: Duration) -> Self {
        self.healthcheck_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn healthcheck_timeout(&self) -> Duration {
        self.healthcheck_timeout
    }

    /// Poll the service root until it answers with success or the startup
    /// timeout elapses
    pub async fn wait_until_healthy(&self) -> Result<(), SearchClientError> {
        let deadline = Instant::now() + self.healthcheck_timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let attempt = self
                .client
                .get(self.base_url.clone())
                .timeout(remaining.max(HEALTHCHECK_INTERVAL))
                .send()
                .await;

            match attempt {
                Ok(response) if response.status().is_success() => {
                    tracing::info!(url = %self.base_url, "Search backend healthy");
                    return Ok(());
                }
                Ok(response) => {
                    tracing::warn!(url = %self.base_url, status = %response.status(), "Search backend not ready");
                }
                Err(e) => {
                    tracing::warn!(url = %self.base_url, error = %e, "Search backend unreachable");
                }
            }

            if Instant::now() + HEALTHCHECK_INTERVAL > deadline {
                return Err(SearchClientError::Unhealthy {
                    url: self.base_url.to_string(),
                    timeout: self.healthcheck_timeout,
                });
            }
            sleep(HEALTHCHECK_INTERVAL).await;
        }
    }

    /// Run a search request body against `index`
    pub async fn search(&self, index: &str, body: &JsonValue) -> Result<JsonValue, SearchClientError> {
        let url = self.index_url(index, "_search")?;
        let response = self.client.post(url).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::debug!(error = %e, status = %status, "Failed to read error response body");
                    String::new()
                }
            };
            return Err(SearchClientError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }

    fn index_url(&self, index: &str, endpoint: &str) -> Result<Url, SearchClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SearchClientError::MissingHost {
                url: self.base_url.to_string(),
            })?
            .pop_if_empty()
            .push(index)
            .push(endpoint);
        Ok(url)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve every request with the same raw HTTP response; returns `host:port`
    pub(crate) async fn fixed_response_backend(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 4096];
                    let _ = socket.read(&mut buf).await;
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });
        address
    }

    pub(crate) const HEALTHY_RESPONSE: &str = "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 2\r\nconnection: close\r\n\r\n{}";

    #[test]
    fn test_binds_http_base_url() {
        let client = SearchClient::new("es.internal:9200").unwrap();
        assert_eq!(client.base_url().as_str(), "http://es.internal:9200/");
        assert_eq!(client.healthcheck_timeout(), STARTUP_HEALTHCHECK_TIMEOUT);
    }

    #[test]
    fn test_index_url() {
        let client = SearchClient::new("localhost:9200").unwrap();
        let url = client.index_url("buildings", "_search").unwrap();
        assert_eq!(url.as_str(), "http://localhost:9200/buildings/_search");
    }

    #[test]
    fn test_rejects_empty_host() {
        assert!(SearchClient::new("").is_err());
    }

    #[test]
    fn test_rejects_invalid_port() {
        let err = SearchClient::new("localhost:notaport").unwrap_err();
        assert!(matches!(err, SearchClientError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn test_connect_to_healthy_backend() {
        let host = fixed_response_backend(HEALTHY_RESPONSE).await;
        let client = SearchClient::connect(&host, Duration::from_secs(5)).await.unwrap();
        assert_eq!(client.healthcheck_timeout(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_connect_to_dead_backend_is_unhealthy() {
        let err = SearchClient::connect("127.0.0.1:1", Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(matches!(err, SearchClientError::Unhealthy { .. }));
    }

    #[tokio::test]
    async fn test_search_error_status_keeps_body() {
        let host = fixed_response_backend(
            "HTTP/1.1 404 Not Found\r\ncontent-length: 15\r\nconnection: close\r\n\r\nindex not found",
        )
        .await;
        let client = SearchClient::new(&host).unwrap();
        let err = client
            .search("missing", &serde_json::json!({"query": {"match_all": {}}}))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SearchClientError::Status { status: 404, ref body } if body == "index not found"
        ));
    }
}
