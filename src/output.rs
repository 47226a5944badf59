use crate::error::DashboardError;
use crate::types::{CardRow, CategoryCard, Trend};
use serde::Serialize;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};
use tracing::info;

/// Write `rows` as a headed CSV file, one record per row.
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), DashboardError> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    info!("wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

/// Pretty-printed JSON, used for the full dataset export.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), DashboardError> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    info!("wrote {}", path.display());
    Ok(())
}

/// Markdown table of at most `max_rows` rows, or `(no rows)`.
pub fn render_table<T: Tabled + Clone>(rows: &[T], max_rows: usize) -> String {
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(slice).with(Style::markdown()).to_string()
}

/// Print [`render_table`] followed by a blank line.
pub fn preview_table_rows<T: Tabled + Clone>(rows: &[T], max_rows: usize) {
    println!("{}\n", render_table(rows, max_rows));
}

fn trend_marker(trend: Trend) -> &'static str {
    match trend {
        Trend::Improved => "▲ good",
        Trend::Worsened => "▼ bad",
        Trend::Flat => "-",
    }
}

/// Flatten the summary cards into one table, one line per metric.
pub fn card_rows(cards: &[CategoryCard]) -> Vec<CardRow> {
    cards
        .iter()
        .flat_map(|card| {
            card.metrics.iter().map(move |m| CardRow {
                category: card.title.clone(),
                metric: m.label.clone(),
                yesterday: m.previous_day.clone(),
                today: m.today.clone(),
                dod: m.dod.clone(),
                trend: trend_marker(m.trend).to_string(),
            })
        })
        .collect()
}
