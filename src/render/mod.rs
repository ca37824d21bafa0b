//! Text, CSV, JSON and Vega-Lite renderings of a dashboard view.

use crate::dashboard::{header_line, View};
use crate::models::{ChartRow, PriceTable, INDEX_NAME, PRICE_COLUMN};
use crate::utils::{display_width, fmt_price, pad_left, pad_right};
use anyhow::{Context, Result};
use clap::ValueEnum;
use serde_json::{json, Value};
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned price table (JPY)
    Table,
    /// Chart series as CSV
    Csv,
    /// Chart series as JSON
    Json,
    /// Vega-Lite line chart specification
    Vega,
}

// ── Table ─────────────────────────────────────────────────────────────────────

pub fn render_table(table: &PriceTable) -> String {
    let labels = table.column_labels();
    let cells: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|r| {
            r.closes
                .iter()
                .map(|c| c.map(fmt_price).unwrap_or_else(|| "—".to_string()))
                .collect()
        })
        .collect();

    let name_width = table
        .rows
        .iter()
        .map(|r| display_width(&r.name))
        .chain(std::iter::once(display_width(INDEX_NAME)))
        .max()
        .unwrap_or(0);

    let col_widths: Vec<usize> = labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            cells
                .iter()
                .map(|row| display_width(&row[i]))
                .chain(std::iter::once(display_width(label)))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    out.push_str(&pad_right(INDEX_NAME, name_width));
    for (label, w) in labels.iter().zip(&col_widths) {
        out.push_str("  ");
        out.push_str(&pad_left(label, *w));
    }
    out.push('\n');

    for (row, row_cells) in table.rows.iter().zip(&cells) {
        out.push_str(&pad_right(&row.name, name_width));
        for (cell, w) in row_cells.iter().zip(&col_widths) {
            out.push_str("  ");
            out.push_str(&pad_left(cell, *w));
        }
        out.push('\n');
    }
    out
}

// ── Chart series ──────────────────────────────────────────────────────────────

pub fn write_chart_csv<W: Write>(rows: &[ChartRow], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row).context("Failed to write CSV row")?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn chart_json(rows: &[ChartRow]) -> Result<String> {
    serde_json::to_string_pretty(rows).context("Failed to serialize chart rows")
}

/// Line chart: one line per company, y scale fixed to the view's axis range.
pub fn vega_lite_spec(view: &View) -> Value {
    json!({
        "$schema": "https://vega.github.io/schema/vega-lite/v5.json",
        "title": header_line(view.days),
        "width": "container",
        "data": { "values": view.chart_rows },
        "mark": { "type": "line", "opacity": 0.8, "clip": true },
        "encoding": {
            "x": { "field": "Date", "type": "temporal" },
            "y": {
                "field": PRICE_COLUMN,
                "type": "quantitative",
                "stack": null,
                "scale": { "domain": [view.axis.ymin, view.axis.ymax] }
            },
            "color": { "field": INDEX_NAME, "type": "nominal" }
        }
    })
}

/// Write the view to `out` in the requested format.
pub fn write_view<W: Write>(view: &View, format: OutputFormat, mut out: W) -> Result<()> {
    match format {
        OutputFormat::Table => {
            writeln!(out, "{}  (JPY)", header_line(view.days))?;
            write!(out, "{}", render_table(&view.table))?;
        }
        OutputFormat::Csv => write_chart_csv(&view.chart_rows, out)?,
        OutputFormat::Json => writeln!(out, "{}", chart_json(&view.chart_rows)?)?,
        OutputFormat::Vega => {
            let spec = serde_json::to_string_pretty(&vega_lite_spec(view))?;
            writeln!(out, "{}", spec)?;
        }
    }
    Ok(())
}
