use std::time::{Duration, Instant};
use tracing::info;

/// Logs the start and wall-clock duration of one fetch batch.
pub struct BatchTimer {
    days: u32,
    tickers: usize,
    start: Instant,
}

impl BatchTimer {
    pub fn start(days: u32, tickers: usize) -> Self {
        info!("⏱  Fetching {} days for {} tickers", days, tickers);
        Self { days, tickers, start: Instant::now() }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for BatchTimer {
    fn drop(&mut self) {
        info!(
            "⏱  Fetch batch done: {} days x {} tickers in {:.2?}",
            self.days,
            self.tickers,
            self.elapsed()
        );
    }
}

/// Format a price with thousands separators and two decimals.
/// 12345.5 → "12,345.50"
pub fn fmt_price(p: f64) -> String {
    let fixed = format!("{:.2}", p.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::new();
    for (i, ch) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if p < 0.0 {
        grouped.push('-');
    }
    let int_grouped: String = grouped.chars().rev().collect();
    format!("{}.{}", int_grouped, frac_part)
}

/// Display width of a string, counting East Asian wide characters as two columns.
pub fn display_width(s: &str) -> usize {
    s.chars().map(|c| if is_wide(c) { 2 } else { 1 }).sum()
}

fn is_wide(c: char) -> bool {
    matches!(c as u32,
        0x1100..=0x115F
        | 0x2E80..=0x303E
        | 0x3040..=0x33FF
        | 0x3400..=0x4DBF
        | 0x4E00..=0x9FFF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFE30..=0xFE4F
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6)
}

/// Right-pad `s` with spaces to `width` display columns.
pub fn pad_right(s: &str, width: usize) -> String {
    let w = display_width(s);
    format!("{}{}", s, " ".repeat(width.saturating_sub(w)))
}

/// Left-pad `s` with spaces to `width` display columns.
pub fn pad_left(s: &str, width: usize) -> String {
    let w = display_width(s);
    format!("{}{}", " ".repeat(width.saturating_sub(w)), s)
}
