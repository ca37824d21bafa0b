//! Price fetcher: ties the market data source, reshaping and the cache together.
//!
//! `fetch_prices()`:
//!   1. Validate the lookback window and ticker map
//!   2. Return the memoized table when the same (days, tickers) was fetched before
//!   3. Otherwise fetch every symbol, in ticker-map order, and build the table
//!
//! Any single symbol failing fails the whole table. With `concurrency > 1`
//! symbols are fetched by a bounded pool and the remaining tasks are aborted
//! on the first error.

use crate::cache::{CacheKey, PriceCache};
use crate::config::FetchConfig;
use crate::error::{FetchError, FetchResult};
use crate::models::{PriceTable, TickerMap};
use crate::provider::MarketDataSource;
use crate::reshape::{build_price_table, reindexed, CompanySeries};
use crate::utils::BatchTimer;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info};

/// Upper bound on the lookback window accepted by the fetcher.
pub const MAX_LOOKBACK_DAYS: u32 = 365;

pub struct PriceFetcher {
    source: Arc<dyn MarketDataSource>,
    concurrency: usize,
}

impl PriceFetcher {
    pub fn new(source: Arc<dyn MarketDataSource>, config: &FetchConfig) -> Self {
        Self {
            source,
            concurrency: config.concurrency.max(1),
        }
    }

    pub async fn fetch_prices(
        &self,
        days: u32,
        tickers: &TickerMap,
        cache: &mut PriceCache,
    ) -> FetchResult<Arc<PriceTable>> {
        validate(days, tickers)?;

        let key = CacheKey::new(days, tickers);
        if let Some(cached) = cache.get(&key) {
            if cached.row_names().into_iter().eq(tickers.names()) {
                return Ok(cached);
            }
            if let Some(table) = reindexed(&cached, tickers) {
                return Ok(Arc::new(table));
            }
        }

        let table = Arc::new(self.fetch_uncached(days, tickers).await?);
        cache.insert(key, Arc::clone(&table));
        Ok(table)
    }

    /// Fetch and reshape without consulting any cache.
    pub async fn fetch_uncached(&self, days: u32, tickers: &TickerMap) -> FetchResult<PriceTable> {
        validate(days, tickers)?;
        let _t = BatchTimer::start(days, tickers.len());

        let series = if self.concurrency <= 1 || tickers.len() <= 1 {
            self.fetch_sequential(days, tickers).await?
        } else {
            self.fetch_pooled(days, tickers).await?
        };

        Ok(build_price_table(series))
    }

    async fn fetch_sequential(&self, days: u32, tickers: &TickerMap) -> FetchResult<Vec<CompanySeries>> {
        let mut series = Vec::with_capacity(tickers.len());
        for (name, symbol) in tickers.iter() {
            let closes = self.source.fetch_daily_closes(symbol, days).await?;
            info!("{} ({}): {} closes", name, symbol, closes.len());
            series.push(CompanySeries {
                name: name.to_string(),
                symbol: symbol.to_string(),
                closes,
            });
        }
        Ok(series)
    }

    async fn fetch_pooled(&self, days: u32, tickers: &TickerMap) -> FetchResult<Vec<CompanySeries>> {
        let sem = Arc::new(Semaphore::new(self.concurrency));
        let mut set = JoinSet::new();

        for (idx, (name, symbol)) in tickers.iter().enumerate() {
            let name = name.to_string();
            let symbol = symbol.to_string();
            let source = Arc::clone(&self.source);
            let sem = Arc::clone(&sem);

            set.spawn(async move {
                let _permit = sem
                    .acquire()
                    .await
                    .map_err(|e| FetchError::network(&symbol, format!("worker pool closed: {}", e)))?;

                let closes = source.fetch_daily_closes(&symbol, days).await?;
                info!("{} ({}): {} closes", name, symbol, closes.len());

                Ok::<_, FetchError>((idx, CompanySeries { name, symbol, closes }))
            });
        }

        let mut slots: Vec<Option<CompanySeries>> = (0..tickers.len()).map(|_| None).collect();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(Ok((idx, series))) => slots[idx] = Some(series),
                Ok(Err(e)) => {
                    set.abort_all();
                    return Err(e);
                }
                Err(e) => {
                    error!("Fetch task failed: {}", e);
                    set.abort_all();
                    return Err(FetchError::network("*", format!("fetch task failed: {}", e)));
                }
            }
        }

        slots
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| FetchError::network("*", "fetch task produced no result"))
    }
}

fn validate(days: u32, tickers: &TickerMap) -> FetchResult<()> {
    if days == 0 || days > MAX_LOOKBACK_DAYS {
        return Err(FetchError::InvalidInput(format!(
            "days must be in 1..={}, got {}",
            MAX_LOOKBACK_DAYS, days
        )));
    }
    if tickers.is_empty() {
        return Err(FetchError::InvalidInput("no tickers requested".into()));
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::DailyClose;
    use async_trait::async_trait;
    use chrono::{Duration, NaiveDate};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-process source: `days` consecutive closes ending 2026-10-16 for any
    /// symbol, except those listed as failing.
    pub(crate) struct MockSource {
        pub calls: AtomicUsize,
        pub failing: Vec<(String, ErrorKind)>,
    }

    impl MockSource {
        pub(crate) fn new() -> Self {
            Self { calls: AtomicUsize::new(0), failing: Vec::new() }
        }

        pub(crate) fn failing(symbol: &str, kind: ErrorKind) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                failing: vec![(symbol.to_string(), kind)],
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MarketDataSource for MockSource {
        async fn fetch_daily_closes(&self, symbol: &str, days: u32) -> FetchResult<Vec<DailyClose>> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            if let Some((_, kind)) = self.failing.iter().find(|(s, _)| s == symbol) {
                let symbol = symbol.to_string();
                return Err(match kind {
                    ErrorKind::Network => FetchError::network(&symbol, "connection refused"),
                    ErrorKind::UnknownSymbol => FetchError::UnknownSymbol { symbol },
                    ErrorKind::EmptyData => FetchError::EmptyData { symbol },
                    ErrorKind::Malformed => FetchError::malformed(&symbol, "garbage"),
                    ErrorKind::InvalidInput => FetchError::InvalidInput(symbol),
                });
            }

            let last = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
            let base = symbol.len() as f64 * 100.0;
            Ok((0..days)
                .rev()
                .map(|back| DailyClose {
                    date: last - Duration::days(back as i64),
                    close: base + back as f64,
                })
                .collect())
        }
    }

    fn fetcher(source: Arc<MockSource>, concurrency: usize) -> PriceFetcher {
        PriceFetcher::new(source, &FetchConfig { concurrency })
    }

    fn ab_map() -> TickerMap {
        TickerMap::from_pairs([("A", "AAA.T"), ("B", "BBB.T")]).unwrap()
    }

    #[tokio::test]
    async fn test_rows_follow_ticker_map_for_all_ui_days() {
        let source = Arc::new(MockSource::new());
        let fetcher = fetcher(Arc::clone(&source), 1);
        let tickers = TickerMap::builtin();

        for days in 1..=50 {
            let mut cache = PriceCache::new();
            let table = fetcher.fetch_prices(days, &tickers, &mut cache).await.unwrap();
            assert!(table.row_names().into_iter().eq(tickers.names()));
            assert_eq!(table.dates.len(), days as usize);
        }
    }

    #[tokio::test]
    async fn test_two_companies_two_days() {
        let source = Arc::new(MockSource::new());
        let fetcher = fetcher(Arc::clone(&source), 1);
        let mut cache = PriceCache::new();

        let table = fetcher.fetch_prices(2, &ab_map(), &mut cache).await.unwrap();
        assert_eq!(table.row_names(), vec!["A", "B"]);
        assert_eq!(table.column_labels(), vec!["15 October 2026", "16 October 2026"]);
        assert!(table.rows.iter().all(|r| r.closes.iter().all(Option::is_some)));
        assert_eq!(source.calls(), 2);
    }

    #[test]
    fn test_memoized_second_call() {
        let source = Arc::new(MockSource::new());
        let fetcher = fetcher(Arc::clone(&source), 1);
        let mut cache = PriceCache::new();

        let first = tokio_test::block_on(fetcher.fetch_prices(5, &ab_map(), &mut cache)).unwrap();
        let second = tokio_test::block_on(fetcher.fetch_prices(5, &ab_map(), &mut cache)).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.calls(), 2);
        assert_eq!(cache.hits(), 1);

        tokio_test::block_on(fetcher.fetch_prices(6, &ab_map(), &mut cache)).unwrap();
        assert_eq!(source.calls(), 4);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_cache_hit_in_requested_order() {
        let source = Arc::new(MockSource::new());
        let fetcher = fetcher(Arc::clone(&source), 1);
        let mut cache = PriceCache::new();

        fetcher.fetch_prices(3, &ab_map(), &mut cache).await.unwrap();
        let flipped = TickerMap::from_pairs([("B", "BBB.T"), ("A", "AAA.T")]).unwrap();
        let table = fetcher.fetch_prices(3, &flipped, &mut cache).await.unwrap();

        assert_eq!(table.row_names(), vec!["B", "A"]);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_single_failure_fails_whole_table() {
        let source = Arc::new(MockSource::failing("BBB.T", ErrorKind::UnknownSymbol));
        let fetcher = fetcher(Arc::clone(&source), 1);
        let mut cache = PriceCache::new();

        let err = fetcher.fetch_prices(5, &ab_map(), &mut cache).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownSymbol);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_sequential_stops_at_first_failure() {
        let source = Arc::new(MockSource::failing("AAA.T", ErrorKind::Network));
        let fetcher = fetcher(Arc::clone(&source), 1);

        let err = fetcher.fetch_uncached(5, &ab_map()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_pooled_keeps_order() {
        let source = Arc::new(MockSource::new());
        let fetcher = fetcher(Arc::clone(&source), 4);
        let tickers = TickerMap::builtin();

        let table = fetcher.fetch_uncached(10, &tickers).await.unwrap();
        assert!(table.row_names().into_iter().eq(tickers.names()));
        assert_eq!(source.calls(), tickers.len());
    }

    #[tokio::test]
    async fn test_pooled_failure_fails_batch() {
        let source = Arc::new(MockSource::failing("7974.T", ErrorKind::EmptyData));
        let fetcher = fetcher(Arc::clone(&source), 4);

        let err = fetcher.fetch_uncached(10, &TickerMap::builtin()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyData);
    }

    #[tokio::test]
    async fn test_invalid_inputs_rejected_without_calls() {
        let source = Arc::new(MockSource::new());
        let fetcher = fetcher(Arc::clone(&source), 1);
        let mut cache = PriceCache::new();
        let empty = TickerMap::from_pairs(Vec::<(String, String)>::new()).unwrap();

        for (days, tickers) in [(0, ab_map()), (MAX_LOOKBACK_DAYS + 1, ab_map()), (5, empty)] {
            let err = fetcher.fetch_prices(days, &tickers, &mut cache).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
        assert_eq!(source.calls(), 0);
    }
}
