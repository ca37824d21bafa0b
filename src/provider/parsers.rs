//! Decoding of the chart endpoint payload into daily closes.
//!
//! Shape of a successful response (trimmed):
//!
//! ```text
//! {"chart": {"result": [{"meta": {"symbol": "7203.T", "gmtoffset": 32400, ...},
//!                        "timestamp": [1760486400, ...],
//!                        "indicators": {"quote": [{"close": [2810.5, null, ...], ...}]}}],
//!            "error": null}}
//! ```

use crate::error::{FetchError, FetchResult};
use crate::models::DailyClose;
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i32,
}

#[derive(Debug, Default, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Parse a chart payload into closes ordered by exchange-local trading date.
///
/// Null closes are dropped. When the provider repeats the last trading date
/// (a live bar appended to the daily series) the value with the later
/// timestamp wins, whatever order the timestamps arrive in.
pub fn parse_chart_response(symbol: &str, body: &str) -> FetchResult<Vec<DailyClose>> {
    let envelope: ChartEnvelope = serde_json::from_str(body)
        .map_err(|e| FetchError::malformed(symbol, format!("invalid JSON: {}", e)))?;

    if let Some(err) = envelope.chart.error {
        if err.code == "Not Found" {
            return Err(FetchError::UnknownSymbol { symbol: symbol.to_string() });
        }
        return Err(FetchError::malformed(
            symbol,
            format!("{}: {}", err.code, err.description.unwrap_or_default()),
        ));
    }

    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        return Err(FetchError::EmptyData { symbol: symbol.to_string() });
    };

    if result.timestamp.is_empty() {
        return Err(FetchError::EmptyData { symbol: symbol.to_string() });
    }

    let Some(quote) = result.indicators.quote.into_iter().next() else {
        return Err(FetchError::malformed(symbol, "missing quote indicators"));
    };

    if quote.close.len() != result.timestamp.len() {
        return Err(FetchError::malformed(
            symbol,
            format!(
                "{} timestamps but {} closes",
                result.timestamp.len(),
                quote.close.len()
            ),
        ));
    }

    let offset = FixedOffset::east_opt(result.meta.gmtoffset).ok_or_else(|| {
        FetchError::malformed(symbol, format!("bad gmtoffset {}", result.meta.gmtoffset))
    })?;

    let mut points: Vec<(i64, f64)> = result
        .timestamp
        .iter()
        .zip(quote.close)
        .filter_map(|(ts, close)| close.map(|c| (*ts, c)))
        .collect();
    points.sort_by_key(|(ts, _)| *ts);

    let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for (ts, close) in points {
        let date = DateTime::from_timestamp(ts, 0)
            .ok_or_else(|| FetchError::malformed(symbol, format!("bad timestamp {}", ts)))?
            .with_timezone(&offset)
            .date_naive();
        by_date.insert(date, close);
    }

    if by_date.is_empty() {
        return Err(FetchError::EmptyData { symbol: symbol.to_string() });
    }

    let closes: Vec<DailyClose> = by_date
        .into_iter()
        .map(|(date, close)| DailyClose { date, close })
        .collect();
    debug!("{}: {} closes decoded", symbol, closes.len());
    Ok(closes)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    // 2025-10-15 / 16 00:00 UTC, i.e. 09:00 JST on the same dates.
    const OK_BODY: &str = r#"{"chart":{"result":[{"meta":{"currency":"JPY","symbol":"7203.T","gmtoffset":32400},
        "timestamp":[1760486400,1760572800],
        "indicators":{"quote":[{"open":[2800.0,2815.0],"close":[2810.5,2822.0]}]}}],"error":null}}"#;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_ok_body() {
        let closes = parse_chart_response("7203.T", OK_BODY).unwrap();
        assert_eq!(
            closes,
            vec![
                DailyClose { date: ymd(2025, 10, 15), close: 2810.5 },
                DailyClose { date: ymd(2025, 10, 16), close: 2822.0 },
            ]
        );
    }

    #[test]
    fn test_local_date_uses_gmtoffset() {
        // 2025-10-15 20:00 UTC is already the 16th in Tokyo.
        let body = r#"{"chart":{"result":[{"meta":{"gmtoffset":32400},
            "timestamp":[1760558400],"indicators":{"quote":[{"close":[100.0]}]}}],"error":null}}"#;
        let closes = parse_chart_response("X.T", body).unwrap();
        assert_eq!(closes[0].date, ymd(2025, 10, 16));
    }

    #[test]
    fn test_null_closes_dropped() {
        let body = r#"{"chart":{"result":[{"meta":{"gmtoffset":32400},
            "timestamp":[1760486400,1760572800],"indicators":{"quote":[{"close":[null,2822.0]}]}}],"error":null}}"#;
        let closes = parse_chart_response("7203.T", body).unwrap();
        assert_eq!(closes.len(), 1);
        assert_eq!(closes[0].close, 2822.0);
    }

    #[test]
    fn test_repeated_date_keeps_latest() {
        let body = r#"{"chart":{"result":[{"meta":{"gmtoffset":32400},
            "timestamp":[1760486400,1760500000],"indicators":{"quote":[{"close":[2810.5,2799.0]}]}}],"error":null}}"#;
        let closes = parse_chart_response("7203.T", body).unwrap();
        assert_eq!(closes, vec![DailyClose { date: ymd(2025, 10, 15), close: 2799.0 }]);
    }

    #[test]
    fn test_out_of_order_duplicates_merge() {
        // 16th close, then a 15th 12:46 JST bar, then a 15th 09:00 JST bar.
        let body = r#"{"chart":{"result":[{"meta":{"gmtoffset":32400},
            "timestamp":[1760572800,1760500000,1760486400],
            "indicators":{"quote":[{"close":[2822.0,2799.0,2810.5]}]}}],"error":null}}"#;
        let closes = parse_chart_response("7203.T", body).unwrap();
        assert_eq!(
            closes,
            vec![
                DailyClose { date: ymd(2025, 10, 15), close: 2799.0 },
                DailyClose { date: ymd(2025, 10, 16), close: 2822.0 },
            ]
        );
    }

    #[test]
    fn test_not_found_is_unknown_symbol() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let err = parse_chart_response("0000.T", body).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownSymbol);
    }

    #[test]
    fn test_no_timestamps_is_empty_data() {
        let body = r#"{"chart":{"result":[{"meta":{"gmtoffset":32400},"indicators":{"quote":[{}]}}],"error":null}}"#;
        let err = parse_chart_response("7203.T", body).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyData);
    }

    #[test]
    fn test_all_null_is_empty_data() {
        let body = r#"{"chart":{"result":[{"meta":{"gmtoffset":32400},
            "timestamp":[1760486400],"indicators":{"quote":[{"close":[null]}]}}],"error":null}}"#;
        let err = parse_chart_response("7203.T", body).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyData);
    }

    #[test]
    fn test_malformed_payloads() {
        assert_eq!(
            parse_chart_response("7203.T", "<html>").unwrap_err().kind(),
            ErrorKind::Malformed
        );
        let mismatched = r#"{"chart":{"result":[{"meta":{"gmtoffset":32400},
            "timestamp":[1760486400,1760572800],"indicators":{"quote":[{"close":[1.0]}]}}],"error":null}}"#;
        assert_eq!(
            parse_chart_response("7203.T", mismatched).unwrap_err().kind(),
            ErrorKind::Malformed
        );
    }
}
