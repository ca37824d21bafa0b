//! Dashboard controls, the empty-selection guard and the mapping from fetch
//! outcomes to user-facing messages.

use crate::cache::PriceCache;
use crate::error::ErrorKind;
use crate::fetcher::PriceFetcher;
use crate::models::{AxisRange, ChartRow, PriceTable, TickerMap};
use crate::reshape::{select_rows, sorted_by_name, to_chart_rows};
use chrono::NaiveDate;
use tracing::{debug, warn};

pub const DAYS_MIN: u32 = 1;
pub const DAYS_MAX: u32 = 50;
pub const YMIN_UPPER: f64 = 14999.9;
pub const YMAX_UPPER: f64 = 15000.0;

pub const TITLE: &str = "日本企業株価可視化アプリ";
pub const NO_SELECTION_MESSAGE: &str = "少なくとも1社は選んでください。";
pub const GENERIC_ERROR_MESSAGE: &str = "おっと！なにかエラーが起きているようです！";
pub const INVALID_RANGE_MESSAGE: &str = "最小値は最大値より小さい値を指定してください。";

// ── Controls ──────────────────────────────────────────────────────────────────

/// Raw control values as entered by the user, before clamping.
#[derive(Debug, Clone, PartialEq)]
pub struct Controls {
    pub days: i64,
    pub companies: Vec<String>,
    pub ymin: f64,
    pub ymax: f64,
}

pub fn clamp_days(days: i64) -> u32 {
    days.clamp(DAYS_MIN as i64, DAYS_MAX as i64) as u32
}

fn clamp_bound(v: f64, upper: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, upper) }
}

/// Clamp both bounds independently. Ordering is checked separately.
pub fn clamp_axis(ymin: f64, ymax: f64) -> AxisRange {
    AxisRange {
        ymin: clamp_bound(ymin, YMIN_UPPER),
        ymax: clamp_bound(ymax, YMAX_UPPER),
    }
}

pub fn title_line(today: NaiveDate) -> String {
    format!("{}  {}", TITLE, today.format("%Y-%m-%d"))
}

pub fn header_line(days: u32) -> String {
    format!("過去 {}日間の株価", days)
}

// ── Outcome ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub days: u32,
    /// Selected rows, sorted by display name.
    pub table: PriceTable,
    /// Long-format series in selection order.
    pub chart_rows: Vec<ChartRow>,
    pub axis: AxisRange,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Rendered(View),
    NoSelection,
    InvalidRange(AxisRange),
    Failed { kind: ErrorKind, detail: String },
}

impl Outcome {
    /// Message to show instead of the view, if any.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Outcome::Rendered(_) => None,
            Outcome::NoSelection => Some(NO_SELECTION_MESSAGE),
            Outcome::InvalidRange(_) => Some(INVALID_RANGE_MESSAGE),
            Outcome::Failed { kind, .. } => Some(error_message(*kind)),
        }
    }
}

pub fn error_message(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Network => "株価データを取得できませんでした。通信環境を確認してください。",
        ErrorKind::UnknownSymbol => "銘柄が見つかりませんでした。",
        ErrorKind::EmptyData => "指定した期間の株価データがありません。",
        ErrorKind::InvalidInput => "入力内容が正しくありません。",
        ErrorKind::Malformed => GENERIC_ERROR_MESSAGE,
    }
}

// ── Dashboard ─────────────────────────────────────────────────────────────────

/// One interactive session: a fixed ticker map and the session's price cache.
pub struct Dashboard {
    fetcher: PriceFetcher,
    tickers: TickerMap,
    cache: PriceCache,
}

impl Dashboard {
    pub fn new(fetcher: PriceFetcher, tickers: TickerMap) -> Self {
        Self {
            fetcher,
            tickers,
            cache: PriceCache::new(),
        }
    }

    pub fn tickers(&self) -> &TickerMap {
        &self.tickers
    }

    pub fn cache(&self) -> &PriceCache {
        &self.cache
    }

    pub async fn render(&mut self, controls: &Controls) -> Outcome {
        let days = clamp_days(controls.days);
        let axis = clamp_axis(controls.ymin, controls.ymax);

        if controls.companies.is_empty() {
            debug!("Empty selection, skipping fetch");
            return Outcome::NoSelection;
        }
        if axis.ymin >= axis.ymax {
            return Outcome::InvalidRange(axis);
        }

        let table = match self
            .fetcher
            .fetch_prices(days, &self.tickers, &mut self.cache)
            .await
        {
            Ok(t) => t,
            Err(e) => {
                warn!("Fetch failed: {}", e);
                return Outcome::Failed { kind: e.kind(), detail: e.to_string() };
            }
        };

        let selected = match select_rows(&table, &controls.companies) {
            Ok(t) => t,
            Err(e) => {
                warn!("Selection rejected: {}", e);
                return Outcome::Failed { kind: e.kind(), detail: e.to_string() };
            }
        };

        Outcome::Rendered(View {
            days,
            chart_rows: to_chart_rows(&selected),
            table: sorted_by_name(&selected),
            axis,
        })
    }
}
