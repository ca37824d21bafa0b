pub mod http_client;
pub mod parsers;

use crate::config::ProviderConfig;
use crate::error::{FetchError, FetchResult};
use crate::models::DailyClose;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;
use url::Url;

use self::http_client::HttpClient;
use self::parsers::parse_chart_response;

// ── Source trait ──────────────────────────────────────────────────────────────

/// Swappable market data source.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Daily closes for the most recent `days` days of `symbol`, oldest first.
    async fn fetch_daily_closes(&self, symbol: &str, days: u32) -> FetchResult<Vec<DailyClose>>;
}

// ── Yahoo Finance chart endpoint ─────────────────────────────────────────────

pub struct YahooChartSource {
    client: HttpClient,
    base_url: String,
}

impl YahooChartSource {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url).with_context(|| format!("Invalid provider URL {:?}", base_url))?;

        Ok(Self {
            client: HttpClient::new(config)?,
            base_url,
        })
    }

    /// e.g. 7203.T, 20 days → /v8/finance/chart/7203.T?range=20d&interval=1d
    fn chart_url(&self, symbol: &str, days: u32) -> FetchResult<Url> {
        let mut url = Url::parse(&format!("{}/v8/finance/chart/{}", self.base_url, symbol))
            .map_err(|e| FetchError::InvalidInput(format!("bad symbol {:?}: {}", symbol, e)))?;
        url.query_pairs_mut()
            .append_pair("range", &format!("{}d", days))
            .append_pair("interval", "1d");
        Ok(url)
    }
}

#[async_trait]
impl MarketDataSource for YahooChartSource {
    async fn fetch_daily_closes(&self, symbol: &str, days: u32) -> FetchResult<Vec<DailyClose>> {
        let url = self.chart_url(symbol, days)?;
        debug!("Fetching {} days for {}", days, symbol);

        let body = self.client.get_text(&url, symbol).await?;
        parse_chart_response(symbol, &body)
    }
}
