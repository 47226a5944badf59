// Day-over-day deltas, either computed from the two metrics tables or taken
// verbatim from a third table in the export.
use crate::decode::decode_delta_row;
use crate::segment::RawRow;
use crate::types::{DeltaRecord, Field, FieldKind, MetricsRecord};
use crate::util::Percent;
use serde::Serialize;
use std::collections::HashMap;

/// Relative change of a count, `(current - previous) / previous * 100`.
///
/// A zero baseline saturates: `0 -> 0` is `"0.00%"` and `0 -> n` is
/// `"100.00%"` for any non-zero `n`. Computed in `f64` so extreme counts
/// cannot overflow.
pub fn relative_change(previous: i64, current: i64) -> String {
    if previous == 0 {
        return if current == 0 {
            "0.00%".to_string()
        } else {
            "100.00%".to_string()
        };
    }
    let change = (current as f64 - previous as f64) / previous as f64 * 100.0;
    Percent(change).to_string()
}

/// Point change between two percentage strings. No forced `+` sign.
pub fn point_change(previous: &str, current: &str) -> String {
    let change = Percent::parse(current).value() - Percent::parse(previous).value();
    Percent(change).to_string()
}

fn field_change(prev: &MetricsRecord, today: &MetricsRecord, field: Field) -> String {
    match field.kind() {
        FieldKind::Count => relative_change(
            prev.count(field).unwrap_or_default(),
            today.count(field).unwrap_or_default(),
        ),
        FieldKind::Rate => point_change(
            prev.rate(field).unwrap_or_default(),
            today.rate(field).unwrap_or_default(),
        ),
    }
}

/// Delta for every today row with a previous-day row of the same
/// `(cityId, manager)`. Unmatched today rows are dropped; output follows
/// today's order.
pub fn compute_day_over_day(previous_day: &[MetricsRecord], today: &[MetricsRecord]) -> Vec<DeltaRecord> {
    // First occurrence wins when a key is duplicated.
    let mut by_key: HashMap<(&str, &str), &MetricsRecord> = HashMap::new();
    for rec in previous_day {
        by_key
            .entry((rec.city_id.as_str(), rec.manager.as_str()))
            .or_insert(rec);
    }

    today
        .iter()
        .filter_map(|cur| {
            let prev = by_key.get(&(cur.city_id.as_str(), cur.manager.as_str()))?;
            let mut rec = DeltaRecord::keyed(&cur.city_id, &cur.city_name, &cur.manager);
            for field in Field::ALL {
                rec.set(field, field_change(prev, cur, field));
            }
            Some(rec)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeltaOrigin {
    Computed,
    Parsed,
}

/// Where the day-over-day table comes from for one export.
#[derive(Debug, Clone, PartialEq)]
pub enum DeltaSource {
    /// Synthesize from previous-day and today tables.
    Compute,
    /// Decode the export's own third table.
    Parse(Vec<RawRow>),
}

impl DeltaSource {
    pub fn from_table(table: Option<Vec<RawRow>>) -> Self {
        match table {
            Some(rows) => DeltaSource::Parse(rows),
            None => DeltaSource::Compute,
        }
    }

    pub fn origin(&self) -> DeltaOrigin {
        match self {
            DeltaSource::Compute => DeltaOrigin::Computed,
            DeltaSource::Parse(_) => DeltaOrigin::Parsed,
        }
    }

    pub fn resolve(self, previous_day: &[MetricsRecord], today: &[MetricsRecord]) -> Vec<DeltaRecord> {
        match self {
            DeltaSource::Compute => compute_day_over_day(previous_day, today),
            DeltaSource::Parse(rows) => rows.iter().map(|r| decode_delta_row(r)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(city_id: &str, manager: &str) -> MetricsRecord {
        MetricsRecord {
            city_id: city_id.into(),
            city_name: "Riyadh".into(),
            manager: manager.into(),
            sequence_more3_pct: "0.00%".into(),
            active_driver_card_pct: "0.00%".into(),
            passed_rate: "0.00%".into(),
            failed_rate: "0.00%".into(),
            skipped_rate: "0.00%".into(),
            sponsorship_rate: "0.00%".into(),
            ..Default::default()
        }
    }

    #[test]
    fn relative_change_saturates_on_zero_baseline() {
        assert_eq!(relative_change(0, 0), "0.00%");
        assert_eq!(relative_change(0, 5), "100.00%");
        assert_eq!(relative_change(0, -5), "100.00%");
        assert_eq!(relative_change(10, 15), "50.00%");
        assert_eq!(relative_change(10, 0), "-100.00%");
        assert_eq!(relative_change(3, 4), "33.33%");
    }

    #[test]
    fn relative_change_handles_extreme_counts() {
        assert_eq!(relative_change(i64::MIN, i64::MAX), "-200.00%");
        assert_eq!(relative_change(i64::MAX, i64::MIN), "-200.00%");
    }

    #[test]
    fn point_change_is_plain_difference() {
        assert_eq!(point_change("80.00%", "85.50%"), "5.50%");
        assert_eq!(point_change("90.00%", "85.00%"), "-5.00%");
        assert_eq!(point_change("", "12%"), "12.00%");
        assert_eq!(point_change("bad", "bad"), "0.00%");
    }

    #[test]
    fn driver_card_deltas() {
        let mut prev = rec("1", "A");
        prev.sequence_more3 = 5;
        prev.active_driver_card = 90;
        prev.expired_driver_card = 10;
        let mut today = prev.clone();
        today.active_driver_card = 95;
        today.expired_driver_card = 5;

        let out = compute_day_over_day(&[prev], &[today]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].active_driver_card, "5.56%");
        assert_eq!(out[0].expired_driver_card, "-50.00%");
        assert_eq!(out[0].sequence_more3, "0.00%");
        assert_eq!(out[0].passed_rate, "0.00%");
    }

    #[test]
    fn unmatched_rows_are_dropped_and_order_follows_today() {
        let previous = vec![rec("1", "A"), rec("2", "B"), rec("3", "C")];
        let today = vec![rec("3", "C"), rec("9", "Z"), rec("1", "A"), rec("2", "X")];
        let out = compute_day_over_day(&previous, &today);
        let keys: Vec<_> = out.iter().map(|d| (d.city_id.as_str(), d.manager.as_str())).collect();
        assert_eq!(keys, vec![("3", "C"), ("1", "A")]);
    }

    #[test]
    fn first_previous_row_wins_on_duplicate_key() {
        let mut first = rec("1", "A");
        first.cheating_couriers = 2;
        let mut second = rec("1", "A");
        second.cheating_couriers = 4;
        let mut today = rec("1", "A");
        today.cheating_couriers = 4;
        let out = compute_day_over_day(&[first, second], &[today]);
        assert_eq!(out[0].cheating_couriers, "100.00%");
    }

    #[test]
    fn source_selection() {
        assert_eq!(DeltaSource::from_table(None).origin(), DeltaOrigin::Computed);
        let rows = vec![vec!["1".to_string(), "Jeddah".to_string(), "A".to_string(), "+4.0%".to_string()]];
        let source = DeltaSource::from_table(Some(rows));
        assert_eq!(source.origin(), DeltaOrigin::Parsed);
        // The parsed table is trusted as-is, regardless of the metrics tables.
        let out = source.resolve(&[], &[]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].sequence_more3, "+4.0%");
    }
}
