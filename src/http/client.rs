// src/http/client.rs
//
// Thin reqwest wrapper for the replay service: one GET per call, no retries,
// every failure mapped onto FetchError.

use std::time::Duration;

use reqwest::ClientBuilder;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::constants::{DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use crate::error::FetchError;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Whole-request timeout (connect + headers + body)
    pub request_timeout: Duration,
    /// Maximum idle connections kept per host
    pub max_idle_per_host: usize,
    /// Value of the `User-Agent` header
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_idle_per_host: 32,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Shared, cheaply clonable client for all three service endpoints.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    client: reqwest::Client,
    config: HttpClientConfig,
}

impl ServiceClient {
    pub fn new(config: HttpClientConfig) -> Result<Self, FetchError> {
        let client = ClientBuilder::new()
            .pool_max_idle_per_host(config.max_idle_per_host)
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .tcp_nodelay(true)
            .build()
            .map_err(|e| FetchError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// GET `url` and return the body as text. Non-2xx is an error.
    pub async fn get_text(&self, url: &str, query: &[(&str, &str)]) -> Result<String, FetchError> {
        debug!("GET {} {:?}", url, query);
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|source| FetchError::Transport { url: url.to_string(), source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus { url: url.to_string(), status: status.as_u16() });
        }

        response
            .text()
            .await
            .map_err(|source| FetchError::Transport { url: url.to_string(), source })
    }

    /// GET `url` and decode the body as JSON.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        let body = self.get_text(url, query).await?;
        decode(url, &body)
    }
}

/// Decode a JSON body received from `url`.
pub fn decode<T: DeserializeOwned>(url: &str, body: &str) -> Result<T, FetchError> {
    serde_json::from_str(body).map_err(|source| FetchError::Decode { url: url.to_string(), source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Ladder;

    #[test]
    fn decode_reports_url() {
        let err = decode::<Ladder>("https://host/ladder/x.json", "<html>").unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }));
        assert!(err.to_string().contains("https://host/ladder/x.json"));
    }

    #[test]
    fn client_builds_with_defaults() {
        let client = ServiceClient::new(HttpClientConfig::default()).unwrap();
        assert_eq!(client.config().connect_timeout, Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS));
        assert!(client.config().user_agent.starts_with("replaydl/"));
    }
}
