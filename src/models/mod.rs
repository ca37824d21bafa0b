use chrono::NaiveDate;
use serde::{Serialize, Serializer};

/// Column label format for trading dates, e.g. "07 October 2026".
pub const DATE_LABEL_FORMAT: &str = "%d %B %Y";

/// Name of the row index in the price table.
pub const INDEX_NAME: &str = "Name";

/// Value column name of the long-format chart series.
pub const PRICE_COLUMN: &str = "Stock Prices(JPY)";

pub fn date_label(date: NaiveDate) -> String {
    date.format(DATE_LABEL_FORMAT).to_string()
}

// ── Ticker map ────────────────────────────────────────────────────────────────

const BUILTIN_TICKERS: &[(&str, &str)] = &[
    ("トヨタ", "7203.T"),
    ("ZOZO", "3092.T"),
    ("sony", "6758.T"),
    ("東日本旅客鉄道", "9020.T"),
    ("三越伊勢丹ホールディングス", "3099.T"),
    ("パナソニック　ホールディングス", "6752.T"),
    ("日清食品ホールディングス", "2897.T"),
    ("ミクシィ", "2121.T"),
    ("KADOKAWA", "9468.T"),
    ("任天堂", "7974.T"),
    ("サントリー食品インターナショナル", "2587.T"),
    ("キャノン", "7751.T"),
    ("楽天", "4755.T"),
];

/// Ordered display name → exchange symbol mapping.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TickerMap {
    entries: Vec<(String, String)>,
}

impl TickerMap {
    /// The fixed set of companies offered by the dashboard.
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN_TICKERS
                .iter()
                .map(|(name, symbol)| (name.to_string(), symbol.to_string()))
                .collect(),
        }
    }

    /// Build a map from pairs, keeping their order. Display names must be unique.
    #[cfg(test)]
    pub fn from_pairs<I, N, S>(pairs: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = (N, S)>,
        N: Into<String>,
        S: Into<String>,
    {
        let mut entries: Vec<(String, String)> = Vec::new();
        for (name, symbol) in pairs {
            let name = name.into();
            if entries.iter().any(|(n, _)| *n == name) {
                return Err(format!("duplicate company name {:?}", name));
            }
            entries.push((name, symbol.into()));
        }
        Ok(Self { entries })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, s)| (n.as_str(), s.as_str()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by (name, symbol); order-independent identity of the map.
    pub fn sorted_entries(&self) -> Vec<(String, String)> {
        let mut sorted = self.entries.clone();
        sorted.sort();
        sorted
    }
}

// ── Provider data ─────────────────────────────────────────────────────────────

/// One trading day's close for a single symbol, dated in exchange-local time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyClose {
    pub date: NaiveDate,
    pub close: f64,
}

// ── Price table ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct PriceRow {
    pub name: String,
    pub symbol: String,
    /// One cell per table column; `None` when the symbol did not trade that day.
    pub closes: Vec<Option<f64>>,
}

/// Wide table: one row per company, one column per trading date.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceTable {
    pub dates: Vec<NaiveDate>,
    pub rows: Vec<PriceRow>,
}

impl PriceTable {
    pub fn row_names(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.name.as_str()).collect()
    }

    pub fn column_labels(&self) -> Vec<String> {
        self.dates.iter().copied().map(date_label).collect()
    }

    pub fn row(&self, name: &str) -> Option<&PriceRow> {
        self.rows.iter().find(|r| r.name == name)
    }

    #[cfg(test)]
    pub fn cell(&self, name: &str, date: NaiveDate) -> Option<f64> {
        let col = self.dates.iter().position(|d| *d == date)?;
        self.row(name)?.closes.get(col).copied().flatten()
    }
}

// ── Chart rows ────────────────────────────────────────────────────────────────

/// Long-format (company, date, price) triple for plotting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartRow {
    #[serde(rename = "Name")]
    pub company: String,
    #[serde(rename = "Date", serialize_with = "serialize_date_label")]
    pub date: NaiveDate,
    #[serde(rename = "Stock Prices(JPY)")]
    pub price: f64,
}

fn serialize_date_label<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&date_label(*date))
}

// ── Axis range ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRange {
    pub ymin: f64,
    pub ymax: f64,
}
