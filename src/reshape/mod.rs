//! Reshaping between per-symbol close series, the wide price table and the
//! long-format chart series.

use crate::error::{FetchError, FetchResult};
use crate::models::{ChartRow, DailyClose, PriceRow, PriceTable, TickerMap};
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// One company's fetched history.
#[derive(Debug, Clone)]
pub struct CompanySeries {
    pub name: String,
    pub symbol: String,
    pub closes: Vec<DailyClose>,
}

/// Assemble the wide table. Rows keep input order; columns are the
/// chronological union of all trading dates.
pub fn build_price_table(series: Vec<CompanySeries>) -> PriceTable {
    let dates: Vec<NaiveDate> = series
        .iter()
        .flat_map(|s| s.closes.iter().map(|c| c.date))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let rows = series
        .into_iter()
        .map(|s| {
            let closes = dates
                .iter()
                .map(|d| s.closes.iter().rev().find(|c| c.date == *d).map(|c| c.close))
                .collect();
            PriceRow { name: s.name, symbol: s.symbol, closes }
        })
        .collect();

    PriceTable { dates, rows }
}

/// Rows for `companies`, in the given order. Every name must be present.
pub fn select_rows(table: &PriceTable, companies: &[String]) -> FetchResult<PriceTable> {
    let rows = companies
        .iter()
        .map(|name| {
            table
                .row(name)
                .cloned()
                .ok_or_else(|| FetchError::InvalidInput(format!("unknown company {:?}", name)))
        })
        .collect::<FetchResult<Vec<_>>>()?;

    Ok(PriceTable { dates: table.dates.clone(), rows })
}

/// Same table with rows ordered by display name.
pub fn sorted_by_name(table: &PriceTable) -> PriceTable {
    let mut sorted = table.clone();
    sorted.rows.sort_by(|a, b| a.name.cmp(&b.name));
    sorted
}

/// Reorder rows to follow `tickers`. `None` if the row set differs.
pub fn reindexed(table: &PriceTable, tickers: &TickerMap) -> Option<PriceTable> {
    if table.rows.len() != tickers.len() {
        return None;
    }
    let rows = tickers
        .iter()
        .map(|(name, symbol)| {
            table
                .rows
                .iter()
                .find(|r| r.name == name && r.symbol == symbol)
                .cloned()
        })
        .collect::<Option<Vec<_>>>()?;

    Some(PriceTable { dates: table.dates.clone(), rows })
}

/// Flatten to (company, date, price), row-major, skipping absent cells.
pub fn to_chart_rows(table: &PriceTable) -> Vec<ChartRow> {
    table
        .rows
        .iter()
        .flat_map(|row| {
            table
                .dates
                .iter()
                .zip(row.closes.iter())
                .filter_map(move |(date, close)| {
                    close.map(|price| ChartRow {
                        company: row.name.clone(),
                        date: *date,
                        price,
                    })
                })
        })
        .collect()
}
