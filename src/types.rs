use crate::util::{serialize_iso_millis, Percent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// Whether a numeric column holds an additive count or an already-computed
/// percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Count,
    Rate,
}

/// The twelve numeric columns shared by metrics and delta tables, in
/// positional order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    SequenceMore3,
    SequenceMore3Pct,
    SequenceMore9,
    CheatingCouriers,
    ActiveDriverCard,
    ExpiredDriverCard,
    ActiveDriverCardPct,
    TotalTriggers,
    PassedRate,
    FailedRate,
    SkippedRate,
    SponsorshipRate,
}

impl Field {
    pub const ALL: [Field; 12] = [
        Field::SequenceMore3,
        Field::SequenceMore3Pct,
        Field::SequenceMore9,
        Field::CheatingCouriers,
        Field::ActiveDriverCard,
        Field::ExpiredDriverCard,
        Field::ActiveDriverCardPct,
        Field::TotalTriggers,
        Field::PassedRate,
        Field::FailedRate,
        Field::SkippedRate,
        Field::SponsorshipRate,
    ];

    pub fn kind(self) -> FieldKind {
        match self {
            Field::SequenceMore3
            | Field::SequenceMore9
            | Field::CheatingCouriers
            | Field::ActiveDriverCard
            | Field::ExpiredDriverCard
            | Field::TotalTriggers => FieldKind::Count,
            _ => FieldKind::Rate,
        }
    }

    /// Zero-based column in the source table. Columns 0..=2 hold the key.
    pub fn column(self) -> usize {
        3 + Field::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn label(self) -> &'static str {
        match self {
            Field::SequenceMore3 => "More than 3",
            Field::SequenceMore3Pct => "More than 3 %",
            Field::SequenceMore9 => "More than 9",
            Field::CheatingCouriers => "Total Cheating",
            Field::ActiveDriverCard => "Active",
            Field::ExpiredDriverCard => "Expired",
            Field::ActiveDriverCardPct => "Active %",
            Field::TotalTriggers => "Total Triggers",
            Field::PassedRate => "Pass Rate",
            Field::FailedRate => "Fail Rate",
            Field::SkippedRate => "Skip Rate",
            Field::SponsorshipRate => "Sponsorship Rate",
        }
    }
}

/// Common read access to metrics and delta rows so filters and aggregation
/// can run over either table.
pub trait MetricRow {
    /// Count fields are summed when true; otherwise every field is averaged.
    const ADDITIVE_COUNTS: bool;

    fn city_id(&self) -> &str;
    fn city_name(&self) -> &str;
    fn manager(&self) -> &str;
    fn value(&self, field: Field) -> f64;
}

impl<R: MetricRow> MetricRow for &R {
    const ADDITIVE_COUNTS: bool = R::ADDITIVE_COUNTS;

    fn city_id(&self) -> &str {
        (**self).city_id()
    }
    fn city_name(&self) -> &str {
        (**self).city_name()
    }
    fn manager(&self) -> &str {
        (**self).manager()
    }
    fn value(&self, field: Field) -> f64 {
        (**self).value(field)
    }
}

/// One city/manager snapshot for a single day.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsRecord {
    pub city_id: String,
    pub city_name: String,
    pub manager: String,
    pub sequence_more3: i64,
    pub sequence_more3_pct: String,
    pub sequence_more9: i64,
    pub cheating_couriers: i64,
    pub active_driver_card: i64,
    pub expired_driver_card: i64,
    pub active_driver_card_pct: String,
    pub total_triggers: i64,
    pub passed_rate: String,
    pub failed_rate: String,
    pub skipped_rate: String,
    pub sponsorship_rate: String,
}

impl MetricsRecord {
    /// Count value for a `FieldKind::Count` field, `None` for rate fields.
    pub fn count(&self, field: Field) -> Option<i64> {
        match field {
            Field::SequenceMore3 => Some(self.sequence_more3),
            Field::SequenceMore9 => Some(self.sequence_more9),
            Field::CheatingCouriers => Some(self.cheating_couriers),
            Field::ActiveDriverCard => Some(self.active_driver_card),
            Field::ExpiredDriverCard => Some(self.expired_driver_card),
            Field::TotalTriggers => Some(self.total_triggers),
            _ => None,
        }
    }

    /// Verbatim text of a rate field, `None` for count fields.
    pub fn rate(&self, field: Field) -> Option<&str> {
        match field {
            Field::SequenceMore3Pct => Some(&self.sequence_more3_pct),
            Field::ActiveDriverCardPct => Some(&self.active_driver_card_pct),
            Field::PassedRate => Some(&self.passed_rate),
            Field::FailedRate => Some(&self.failed_rate),
            Field::SkippedRate => Some(&self.skipped_rate),
            Field::SponsorshipRate => Some(&self.sponsorship_rate),
            _ => None,
        }
    }
}

impl MetricRow for MetricsRecord {
    const ADDITIVE_COUNTS: bool = true;

    fn city_id(&self) -> &str {
        &self.city_id
    }
    fn city_name(&self) -> &str {
        &self.city_name
    }
    fn manager(&self) -> &str {
        &self.manager
    }
    fn value(&self, field: Field) -> f64 {
        match self.count(field) {
            Some(c) => c as f64,
            None => Percent::parse(self.rate(field).unwrap_or_default()).value(),
        }
    }
}

/// Day-over-day change for one city/manager. Every numeric column is a
/// signed percentage string: relative change for counts, point change for
/// rates.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeltaRecord {
    pub city_id: String,
    pub city_name: String,
    pub manager: String,
    pub sequence_more3: String,
    pub sequence_more3_pct: String,
    pub sequence_more9: String,
    pub cheating_couriers: String,
    pub active_driver_card: String,
    pub expired_driver_card: String,
    pub active_driver_card_pct: String,
    pub total_triggers: String,
    pub passed_rate: String,
    pub failed_rate: String,
    pub skipped_rate: String,
    pub sponsorship_rate: String,
}

impl DeltaRecord {
    pub fn keyed(city_id: &str, city_name: &str, manager: &str) -> Self {
        DeltaRecord {
            city_id: city_id.to_string(),
            city_name: city_name.to_string(),
            manager: manager.to_string(),
            ..Default::default()
        }
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::SequenceMore3 => &self.sequence_more3,
            Field::SequenceMore3Pct => &self.sequence_more3_pct,
            Field::SequenceMore9 => &self.sequence_more9,
            Field::CheatingCouriers => &self.cheating_couriers,
            Field::ActiveDriverCard => &self.active_driver_card,
            Field::ExpiredDriverCard => &self.expired_driver_card,
            Field::ActiveDriverCardPct => &self.active_driver_card_pct,
            Field::TotalTriggers => &self.total_triggers,
            Field::PassedRate => &self.passed_rate,
            Field::FailedRate => &self.failed_rate,
            Field::SkippedRate => &self.skipped_rate,
            Field::SponsorshipRate => &self.sponsorship_rate,
        }
    }

    pub fn set(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::SequenceMore3 => &mut self.sequence_more3,
            Field::SequenceMore3Pct => &mut self.sequence_more3_pct,
            Field::SequenceMore9 => &mut self.sequence_more9,
            Field::CheatingCouriers => &mut self.cheating_couriers,
            Field::ActiveDriverCard => &mut self.active_driver_card,
            Field::ExpiredDriverCard => &mut self.expired_driver_card,
            Field::ActiveDriverCardPct => &mut self.active_driver_card_pct,
            Field::TotalTriggers => &mut self.total_triggers,
            Field::PassedRate => &mut self.passed_rate,
            Field::FailedRate => &mut self.failed_rate,
            Field::SkippedRate => &mut self.skipped_rate,
            Field::SponsorshipRate => &mut self.sponsorship_rate,
        };
        *slot = value;
    }
}

impl MetricRow for DeltaRecord {
    const ADDITIVE_COUNTS: bool = false;

    fn city_id(&self) -> &str {
        &self.city_id
    }
    fn city_name(&self) -> &str {
        &self.city_name
    }
    fn manager(&self) -> &str {
        &self.manager
    }
    fn value(&self, field: Field) -> f64 {
        Percent::parse(self.get(field)).value()
    }
}

/// The reconciled content of one source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub previous_day: Vec<MetricsRecord>,
    pub today: Vec<MetricsRecord>,
    pub day_over_day: Vec<DeltaRecord>,
    #[serde(serialize_with = "serialize_iso_millis")]
    pub last_updated: DateTime<Utc>,
}

/// Sums of count fields and plain means of rate fields over a record list.
/// Delta aggregates hold means for every field.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedMetrics {
    pub sequence_more3: f64,
    pub sequence_more3_pct: f64,
    pub sequence_more9: f64,
    pub cheating_couriers: f64,
    pub active_driver_card: f64,
    pub expired_driver_card: f64,
    pub active_driver_card_pct: f64,
    pub total_triggers: f64,
    pub passed_rate: f64,
    pub failed_rate: f64,
    pub skipped_rate: f64,
    pub sponsorship_rate: f64,
}

impl AggregatedMetrics {
    pub fn get(&self, field: Field) -> f64 {
        match field {
            Field::SequenceMore3 => self.sequence_more3,
            Field::SequenceMore3Pct => self.sequence_more3_pct,
            Field::SequenceMore9 => self.sequence_more9,
            Field::CheatingCouriers => self.cheating_couriers,
            Field::ActiveDriverCard => self.active_driver_card,
            Field::ExpiredDriverCard => self.expired_driver_card,
            Field::ActiveDriverCardPct => self.active_driver_card_pct,
            Field::TotalTriggers => self.total_triggers,
            Field::PassedRate => self.passed_rate,
            Field::FailedRate => self.failed_rate,
            Field::SkippedRate => self.skipped_rate,
            Field::SponsorshipRate => self.sponsorship_rate,
        }
    }

    pub fn set(&mut self, field: Field, value: f64) {
        let slot = match field {
            Field::SequenceMore3 => &mut self.sequence_more3,
            Field::SequenceMore3Pct => &mut self.sequence_more3_pct,
            Field::SequenceMore9 => &mut self.sequence_more9,
            Field::CheatingCouriers => &mut self.cheating_couriers,
            Field::ActiveDriverCard => &mut self.active_driver_card,
            Field::ExpiredDriverCard => &mut self.expired_driver_card,
            Field::ActiveDriverCardPct => &mut self.active_driver_card_pct,
            Field::TotalTriggers => &mut self.total_triggers,
            Field::PassedRate => &mut self.passed_rate,
            Field::FailedRate => &mut self.failed_rate,
            Field::SkippedRate => &mut self.skipped_rate,
            Field::SponsorshipRate => &mut self.sponsorship_rate,
        };
        *slot = value;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub kind: String,
    pub severity: Severity,
    pub description: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthStatus {
    Excellent,
    Good,
    NeedsAttention,
    Critical,
}

impl HealthStatus {
    pub fn label(self) -> &'static str {
        match self {
            HealthStatus::Excellent => "Excellent",
            HealthStatus::Good => "Good",
            HealthStatus::NeedsAttention => "Needs Attention",
            HealthStatus::Critical => "Critical",
        }
    }
}

/// One city's row in the problem-analysis overview.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CityHealth {
    pub city_id: String,
    pub city_name: String,
    pub managers: String,
    pub total_couriers: i64,
    pub active_driver_card: i64,
    pub active_driver_card_pct: String,
    pub sponsorship_rate: String,
    pub problem_score: f64,
    pub health: HealthStatus,
    pub issues: Vec<Issue>,
    pub metrics: AggregatedMetrics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trend {
    Improved,
    Worsened,
    Flat,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardMetric {
    pub label: String,
    pub previous_day: String,
    pub today: String,
    pub dod: String,
    pub inverse: bool,
    pub trend: Trend,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCard {
    pub title: String,
    pub metrics: Vec<CardMetric>,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct GroupSummaryRow {
    #[serde(rename = "Group")]
    #[tabled(rename = "Group")]
    pub group: String,
    #[serde(rename = "Rows")]
    #[tabled(rename = "Rows")]
    pub rows: usize,
    #[serde(rename = "SequenceMore3")]
    #[tabled(rename = "Seq>3")]
    pub sequence_more3: String,
    #[serde(rename = "SequenceMore3Pct")]
    #[tabled(rename = "Seq>3 %")]
    pub sequence_more3_pct: String,
    #[serde(rename = "SequenceMore9")]
    #[tabled(rename = "Seq>9")]
    pub sequence_more9: String,
    #[serde(rename = "CheatingCouriers")]
    #[tabled(rename = "Cheating")]
    pub cheating_couriers: String,
    #[serde(rename = "ActiveDriverCard")]
    #[tabled(rename = "Active")]
    pub active_driver_card: String,
    #[serde(rename = "ExpiredDriverCard")]
    #[tabled(rename = "Expired")]
    pub expired_driver_card: String,
    #[serde(rename = "ActiveDriverCardPct")]
    #[tabled(rename = "Active %")]
    pub active_driver_card_pct: String,
    #[serde(rename = "TotalTriggers")]
    #[tabled(rename = "Triggers")]
    pub total_triggers: String,
    #[serde(rename = "PassedRate")]
    #[tabled(rename = "Pass %")]
    pub passed_rate: String,
    #[serde(rename = "FailedRate")]
    #[tabled(rename = "Fail %")]
    pub failed_rate: String,
    #[serde(rename = "SkippedRate")]
    #[tabled(rename = "Skip %")]
    pub skipped_rate: String,
    #[serde(rename = "SponsorshipRate")]
    #[tabled(rename = "Sponsorship %")]
    pub sponsorship_rate: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct CityOverviewRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "City")]
    #[tabled(rename = "City")]
    pub city: String,
    #[serde(rename = "TotalCouriers")]
    #[tabled(rename = "TotalCouriers")]
    pub total_couriers: String,
    #[serde(rename = "ProblemScore")]
    #[tabled(rename = "ProblemScore")]
    pub problem_score: String,
    #[serde(rename = "Health")]
    #[tabled(rename = "Health")]
    pub health: String,
    #[serde(rename = "Issues")]
    #[tabled(rename = "Issues")]
    pub issues: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct CardRow {
    #[tabled(rename = "Category")]
    pub category: String,
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Yesterday")]
    pub yesterday: String,
    #[tabled(rename = "Today")]
    pub today: String,
    #[tabled(rename = "DoD")]
    pub dod: String,
    #[tabled(rename = "Trend")]
    pub trend: String,
}
