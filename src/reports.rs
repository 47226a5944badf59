use crate::regions::{RegionMap, UNKNOWN_REGION};
use crate::types::{
    AggregatedMetrics, CardMetric, CategoryCard, CityHealth, CityOverviewRow, DeltaRecord, Field,
    FieldKind, GroupSummaryRow, HealthStatus, Issue, MetricRow, MetricsRecord, Severity, Trend,
};
use crate::util::{average, format_int, format_number, Percent};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Sum count fields and average rate fields over `records`.
///
/// Rates are a plain mean of the per-row percentages, not weighted by each
/// row's population. Delta rows (`ADDITIVE_COUNTS == false`) average every
/// field. An empty slice gives all zeros.
pub fn aggregate<R: MetricRow>(records: &[R]) -> AggregatedMetrics {
    let mut out = AggregatedMetrics::default();
    if records.is_empty() {
        return out;
    }
    for field in Field::ALL {
        let values: Vec<f64> = records.iter().map(|r| r.value(field)).collect();
        let v = if R::ADDITIVE_COUNTS && field.kind() == FieldKind::Count {
            values.iter().sum()
        } else {
            average(&values)
        };
        out.set(field, v);
    }
    out
}

/// Records sharing one grouping key, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct Group<'a, R> {
    pub key: String,
    pub records: Vec<&'a R>,
}

impl<R: MetricRow> Group<'_, R> {
    pub fn aggregate(&self) -> AggregatedMetrics {
        aggregate(&self.records)
    }
}

/// Partition `records` by `key_fn`, keeping first-seen group order. A `None`
/// key lands in the `"Unknown"` group.
pub fn group_by<'a, R, F>(records: &'a [R], key_fn: F) -> Vec<Group<'a, R>>
where
    F: Fn(&R) -> Option<String>,
{
    let mut groups: Vec<Group<'a, R>> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for r in records {
        let key = key_fn(r).unwrap_or_else(|| UNKNOWN_REGION.to_string());
        let idx = *index.entry(key.clone()).or_insert_with(|| {
            groups.push(Group { key, records: Vec::new() });
            groups.len() - 1
        });
        groups[idx].records.push(r);
    }
    groups
}

pub fn group_by_city<R: MetricRow>(records: &[R]) -> Vec<Group<'_, R>> {
    group_by(records, |r| Some(r.city_name().to_string()))
}

/// Group by region in the map's canonical order, `"Unknown"` last. Regions
/// without records are omitted.
pub fn group_by_region<'a, R: MetricRow>(records: &'a [R], regions: &RegionMap) -> Vec<Group<'a, R>> {
    let mut groups = group_by(records, |r| regions.region_of(r.city_name()).map(str::to_string));
    // Stable, so ties (only possible for unmapped keys) keep first-seen order.
    groups.sort_by_key(|g| regions.rank(&g.key));
    groups
}

fn count_cell(v: f64) -> String {
    format_number(v, 0)
}

/// Table rows for grouped metrics. Rates render as `xx.xx%`.
pub fn summarize_groups<R: MetricRow>(groups: &[Group<'_, R>]) -> Vec<GroupSummaryRow> {
    groups
        .iter()
        .map(|g| {
            let agg = g.aggregate();
            let cell = |f: Field| match (f.kind(), R::ADDITIVE_COUNTS) {
                (FieldKind::Count, true) => count_cell(agg.get(f)),
                _ => Percent(agg.get(f)).to_string(),
            };
            GroupSummaryRow {
                group: g.key.clone(),
                rows: g.records.len(),
                sequence_more3: cell(Field::SequenceMore3),
                sequence_more3_pct: cell(Field::SequenceMore3Pct),
                sequence_more9: cell(Field::SequenceMore9),
                cheating_couriers: cell(Field::CheatingCouriers),
                active_driver_card: cell(Field::ActiveDriverCard),
                expired_driver_card: cell(Field::ExpiredDriverCard),
                active_driver_card_pct: cell(Field::ActiveDriverCardPct),
                total_triggers: cell(Field::TotalTriggers),
                passed_rate: cell(Field::PassedRate),
                failed_rate: cell(Field::FailedRate),
                skipped_rate: cell(Field::SkippedRate),
                sponsorship_rate: cell(Field::SponsorshipRate),
            }
        })
        .collect()
}

// Thresholds apply to the two-decimal rate the overview shows.
fn displayed_rate(v: f64) -> f64 {
    Percent(v).rounded().value()
}

/// Weighted compliance heuristic for one aggregated group.
pub fn problem_score(agg: &AggregatedMetrics) -> f64 {
    let mut score = 0.0;
    if agg.cheating_couriers > 0.0 {
        score += agg.cheating_couriers * 10.0;
    }
    if agg.expired_driver_card > 5.0 {
        score += agg.expired_driver_card * 2.0;
    }
    if agg.sequence_more9 > 0.0 {
        score += agg.sequence_more9 * 3.0;
    }
    let sponsorship = displayed_rate(agg.sponsorship_rate);
    if sponsorship < 90.0 {
        score += (90.0 - sponsorship) * 2.0;
    }
    if agg.sequence_more3 > 10.0 {
        score += agg.sequence_more3;
    }
    score
}

pub fn health_status(score: f64) -> HealthStatus {
    if score == 0.0 {
        HealthStatus::Excellent
    } else if score < 20.0 {
        HealthStatus::Good
    } else if score < 50.0 {
        HealthStatus::NeedsAttention
    } else {
        HealthStatus::Critical
    }
}

fn issue(kind: &str, severity: Severity, description: &str, value: String) -> Issue {
    Issue {
        kind: kind.to_string(),
        severity,
        description: description.to_string(),
        value,
    }
}

fn detect_issues(agg: &AggregatedMetrics, sponsorship: &str) -> Vec<Issue> {
    let mut issues = Vec::new();
    if agg.cheating_couriers > 0.0 {
        issues.push(issue("Cheating Detected", Severity::High, "Active cheating cases", count_cell(agg.cheating_couriers)));
    }
    if agg.expired_driver_card > 5.0 {
        issues.push(issue("Expired Driver Cards", Severity::High, "Cards need renewal", count_cell(agg.expired_driver_card)));
    }
    if agg.sequence_more9 > 0.0 {
        issues.push(issue("High Sequence Numbers", Severity::Medium, "Sequences > 9", count_cell(agg.sequence_more9)));
    }
    let rate = displayed_rate(agg.sponsorship_rate);
    if rate < 90.0 {
        let severity = if rate < 80.0 { Severity::High } else { Severity::Medium };
        issues.push(issue("Low Sponsorship", severity, "Below 90% target", sponsorship.to_string()));
    }
    if agg.sequence_more3 > 10.0 {
        issues.push(issue("Sequence Violations", Severity::Medium, "Sequences > 3", count_cell(agg.sequence_more3)));
    }
    issues.sort_by_key(|i| i.severity);
    issues
}

/// Per-city problem analysis, ranked by descending problem score.
///
/// Ties keep the cities' first-seen order.
pub fn city_overview(records: &[MetricsRecord]) -> Vec<CityHealth> {
    let mut out: Vec<CityHealth> = group_by_city(records)
        .iter()
        .map(|g| {
            let agg = g.aggregate();
            let active = agg.active_driver_card as i64;
            let total = active.saturating_add(agg.expired_driver_card as i64);
            let active_pct = if total > 0 {
                Percent(active as f64 / total as f64 * 100.0).to_string()
            } else {
                "0%".to_string()
            };
            let sponsorship = Percent(agg.sponsorship_rate).to_string();
            let score = problem_score(&agg);
            CityHealth {
                city_id: g.records.first().map(|r| r.city_id.clone()).unwrap_or_default(),
                city_name: g.key.clone(),
                managers: g.records.iter().map(|r| r.manager.as_str()).collect::<Vec<_>>().join(", "),
                total_couriers: total,
                active_driver_card: active,
                active_driver_card_pct: active_pct,
                issues: detect_issues(&agg, &sponsorship),
                sponsorship_rate: sponsorship,
                problem_score: score,
                health: health_status(score),
                metrics: agg,
            }
        })
        .collect();
    out.sort_by(|a, b| b.problem_score.partial_cmp(&a.problem_score).unwrap_or(Ordering::Equal));
    out
}

pub fn overview_rows(overview: &[CityHealth]) -> Vec<CityOverviewRow> {
    overview
        .iter()
        .enumerate()
        .map(|(idx, c)| CityOverviewRow {
            rank: idx + 1,
            city: c.city_name.clone(),
            total_couriers: format_int(c.total_couriers),
            problem_score: format_number(c.problem_score, 2),
            health: c.health.label().to_string(),
            issues: if c.issues.is_empty() {
                "-".to_string()
            } else {
                c.issues
                    .iter()
                    .map(|i| format!("{} ({})", i.kind, i.value))
                    .collect::<Vec<_>>()
                    .join("; ")
            },
        })
        .collect()
}

/// Zero or unparseable DoD is flat; otherwise a rise is good unless the
/// metric is inverse.
pub fn trend(dod: f64, inverse: bool) -> Trend {
    if dod == 0.0 || !dod.is_finite() {
        return Trend::Flat;
    }
    if (dod > 0.0) != inverse {
        Trend::Improved
    } else {
        Trend::Worsened
    }
}

const CARD_LAYOUT: [(&str, &[(Field, bool)]); 4] = [
    (
        "Sequence Number",
        &[
            (Field::SequenceMore3, true),
            (Field::SequenceMore3Pct, true),
            (Field::SequenceMore9, true),
        ],
    ),
    ("Cheating Couriers", &[(Field::CheatingCouriers, true)]),
    (
        "Driver Card",
        &[
            (Field::ActiveDriverCard, false),
            (Field::ExpiredDriverCard, true),
            (Field::ActiveDriverCardPct, false),
        ],
    ),
    (
        "Face ID Recognition",
        &[
            (Field::TotalTriggers, false),
            (Field::PassedRate, false),
            (Field::FailedRate, true),
            (Field::SkippedRate, true),
        ],
    ),
];

fn card_value(field: Field, v: f64) -> String {
    match field.kind() {
        FieldKind::Count => format_int(v.round() as i64),
        FieldKind::Rate => Percent(v).to_string(),
    }
}

/// Summary cards comparing yesterday and today for already-filtered lists.
pub fn build_category_cards(
    previous_day: &[MetricsRecord],
    today: &[MetricsRecord],
    day_over_day: &[DeltaRecord],
) -> Vec<CategoryCard> {
    let prev = aggregate(previous_day);
    let cur = aggregate(today);
    let dod = aggregate(day_over_day);

    CARD_LAYOUT
        .iter()
        .map(|(title, fields)| CategoryCard {
            title: title.to_string(),
            metrics: fields
                .iter()
                .map(|&(field, inverse)| {
                    let decimals = match field.kind() {
                        FieldKind::Count => 1,
                        FieldKind::Rate => 2,
                    };
                    let change = dod.get(field);
                    CardMetric {
                        label: field.label().to_string(),
                        previous_day: card_value(field, prev.get(field)),
                        today: card_value(field, cur.get(field)),
                        dod: Percent(change).signed(decimals),
                        inverse,
                        trend: trend(change, inverse),
                    }
                })
                .collect(),
        })
        .collect()
}
