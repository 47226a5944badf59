// Positional row decoding. Decoding never fails: missing or malformed cells
// degrade to zero counts and neutral percentage strings.
use crate::types::{DeltaRecord, Field, FieldKind, MetricsRecord};
use crate::util::parse_count_safe;

pub const RATE_DEFAULT: &str = "0.00%";
pub const DELTA_COUNT_DEFAULT: &str = "0.0%";

fn cell(row: &[String], idx: usize) -> Option<&str> {
    row.get(idx).map(String::as_str)
}

fn text(row: &[String], idx: usize) -> String {
    cell(row, idx).map(str::trim).unwrap_or_default().to_string()
}

/// Trimmed verbatim, `default` when empty or absent.
fn percentage(row: &[String], idx: usize, default: &str) -> String {
    match cell(row, idx).map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => default.to_string(),
    }
}

/// Decode a 14 or 15 column metrics row. A short row gets defaults for the
/// missing trailing columns.
pub fn decode_metrics_row(row: &[String]) -> MetricsRecord {
    let count = |f: Field| parse_count_safe(cell(row, f.column()));
    let rate = |f: Field| percentage(row, f.column(), RATE_DEFAULT);
    MetricsRecord {
        city_id: text(row, 0),
        city_name: text(row, 1),
        manager: text(row, 2),
        sequence_more3: count(Field::SequenceMore3),
        sequence_more3_pct: rate(Field::SequenceMore3Pct),
        sequence_more9: count(Field::SequenceMore9),
        cheating_couriers: count(Field::CheatingCouriers),
        active_driver_card: count(Field::ActiveDriverCard),
        expired_driver_card: count(Field::ExpiredDriverCard),
        active_driver_card_pct: rate(Field::ActiveDriverCardPct),
        total_triggers: count(Field::TotalTriggers),
        passed_rate: rate(Field::PassedRate),
        failed_rate: rate(Field::FailedRate),
        skipped_rate: rate(Field::SkippedRate),
        sponsorship_rate: rate(Field::SponsorshipRate),
    }
}

/// Decode a row of a precomputed day-over-day table. Cells are kept as
/// signed percentage strings.
pub fn decode_delta_row(row: &[String]) -> DeltaRecord {
    let mut rec = DeltaRecord::keyed(&text(row, 0), &text(row, 1), &text(row, 2));
    for field in Field::ALL {
        let default = match field.kind() {
            FieldKind::Count => DELTA_COUNT_DEFAULT,
            FieldKind::Rate => RATE_DEFAULT,
        };
        rec.set(field, percentage(row, field.column(), default));
    }
    rec
}
