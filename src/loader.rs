use crate::decode::decode_metrics_row;
use crate::delta::{DeltaOrigin, DeltaSource};
use crate::error::DashboardError;
use crate::segment::{segment_tables, RawRow};
use crate::types::{Dataset, MetricsRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadReport {
    pub header_markers: usize,
    pub previous_day_rows: usize,
    pub today_rows: usize,
    pub day_over_day_rows: usize,
    pub delta_origin: DeltaOrigin,
    /// Today rows with no previous-day match, only counted for computed deltas.
    pub unmatched_today_rows: usize,
}

fn decode_all(rows: &[RawRow]) -> Vec<MetricsRecord> {
    rows.iter().map(|r| decode_metrics_row(r)).collect()
}

/// Build a dataset from the full text of an export, stamped with `now`.
///
/// Identical text and timestamp always give an identical dataset.
pub fn assemble_at(text: &str, marker: &str, now: DateTime<Utc>) -> (Dataset, LoadReport) {
    let tables = segment_tables(text, marker);
    if tables.marker_count > 3 {
        warn!(
            "found {} header rows; tables after the third are ignored",
            tables.marker_count
        );
    }

    let previous_day = decode_all(&tables.previous_day);
    let today = decode_all(&tables.today);

    let source = DeltaSource::from_table(tables.day_over_day);
    let delta_origin = source.origin();
    let day_over_day = source.resolve(&previous_day, &today);

    let unmatched_today_rows = match delta_origin {
        DeltaOrigin::Computed => today.len() - day_over_day.len(),
        DeltaOrigin::Parsed => 0,
    };
    if unmatched_today_rows > 0 {
        debug!("{} today rows had no previous-day match", unmatched_today_rows);
    }

    let report = LoadReport {
        header_markers: tables.marker_count,
        previous_day_rows: previous_day.len(),
        today_rows: today.len(),
        day_over_day_rows: day_over_day.len(),
        delta_origin,
        unmatched_today_rows,
    };
    let dataset = Dataset {
        previous_day,
        today,
        day_over_day,
        last_updated: now,
    };
    (dataset, report)
}

pub fn assemble(text: &str, marker: &str) -> (Dataset, LoadReport) {
    assemble_at(text, marker, Utc::now())
}

/// Read the export at `path` and assemble it. Each call re-reads the file.
pub fn load_dataset(path: &Path, marker: &str) -> Result<(Dataset, LoadReport), DashboardError> {
    if !path.exists() {
        return Err(DashboardError::SourceNotFound {
            path: path.display().to_string(),
        });
    }
    let text = std::fs::read_to_string(path)?;
    let (dataset, report) = assemble(&text, marker);
    info!(
        "loaded {}: {} previous-day, {} today, {} day-over-day rows ({:?})",
        path.display(),
        report.previous_day_rows,
        report.today_rows,
        report.day_over_day_rows,
        report.delta_origin
    );
    Ok((dataset, report))
}
