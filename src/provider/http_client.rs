use crate::config::ProviderConfig;
use crate::error::{FetchError, FetchResult};
use anyhow::{Context, Result};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { inner })
    }

    /// Fetch a URL as text. Single attempt; failures are classified for `symbol`.
    pub async fn get_text(&self, url: &Url, symbol: &str) -> FetchResult<String> {
        debug!("GET {}", url);

        let resp = self
            .inner
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::network(symbol, format!("request failed: {}", e)))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::UnknownSymbol { symbol: symbol.to_string() });
        }
        if !status.is_success() {
            warn!("{}: HTTP {}", symbol, status);
            return Err(FetchError::network(symbol, format!("HTTP {}", status)));
        }

        resp.text()
            .await
            .map_err(|e| FetchError::network(symbol, format!("failed to read body: {}", e)))
    }
}
