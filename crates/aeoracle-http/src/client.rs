//! HTTP height client backed by `reqwest`.
//!
//! Issues `GET {base}/v2/top` and returns the `height` field. No retry is
//! performed here; callers poll on a fixed interval.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use aeoracle_core::error::TransportError;
use aeoracle_core::transport::HeightSource;

/// Configuration for `HttpHeightClient`.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub request_timeout: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Body of `GET /v2/top`. Only the height is read.
#[derive(Debug, Clone, Deserialize)]
pub struct TopResponse {
    pub height: u64,
}

/// Chain height source over the node's HTTP API.
pub struct HttpHeightClient {
    url: String,
    http: reqwest::Client,
}

impl HttpHeightClient {
    /// Create a client for the node at `base_url` (e.g. `http://localhost:3023`).
    pub fn new(base_url: impl AsRef<str>, config: HttpClientConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| TransportError::Http(e.to_string()))?;

        Ok(Self {
            url: format!("{}/v2/top", base_url.as_ref().trim_end_matches('/')),
            http,
        })
    }

    /// Create with default configuration.
    pub fn default_for(base_url: impl AsRef<str>) -> Result<Self, TransportError> {
        Self::new(base_url, HttpClientConfig::default())
    }

    /// Fetch the full `/v2/top` body.
    pub async fn top(&self) -> Result<TopResponse, TransportError> {
        let resp = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Http(format!("HTTP {status}: {body}")));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl HeightSource for HttpHeightClient {
    async fn block_height(&self) -> Result<u64, TransportError> {
        let top = self.top().await?;
        tracing::trace!(height = top.height, url = %self.url, "fetched chain height");
        Ok(top.height)
    }

    fn url(&self) -> &str {
        &self.url
    }
}
