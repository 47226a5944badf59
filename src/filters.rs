// Selection filters for the dashboard. `"all"` (or an empty selection)
// means no filtering; filters touch disjoint fields so order is irrelevant.
use crate::regions::RegionMap;
use crate::types::MetricRow;
use serde::Serialize;
use std::collections::BTreeSet;

pub const ALL: &str = "all";

fn is_all(selection: &str) -> bool {
    let s = selection.trim();
    s.is_empty() || s == ALL
}

pub fn filter_by_city<R: MetricRow + Clone>(records: &[R], city: &str) -> Vec<R> {
    if is_all(city) {
        return records.to_vec();
    }
    records.iter().filter(|r| r.city_name() == city).cloned().collect()
}

pub fn filter_by_manager<R: MetricRow + Clone>(records: &[R], manager: &str) -> Vec<R> {
    if is_all(manager) {
        return records.to_vec();
    }
    records.iter().filter(|r| r.manager() == manager).cloned().collect()
}

/// Keep records whose city maps to `region`. `"Unknown"` selects cities
/// missing from the map.
pub fn filter_by_region<R: MetricRow + Clone>(records: &[R], region: &str, regions: &RegionMap) -> Vec<R> {
    if is_all(region) {
        return records.to_vec();
    }
    records
        .iter()
        .filter(|r| regions.region_or_unknown(r.city_name()) == region)
        .cloned()
        .collect()
}

/// Sorted unique non-empty city names.
pub fn get_cities<R: MetricRow>(records: &[R]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.city_name())
        .filter(|c| !c.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Sorted unique non-empty manager names, optionally limited to one city.
pub fn get_managers<R: MetricRow>(records: &[R], city: Option<&str>) -> Vec<String> {
    records
        .iter()
        .filter(|r| city.map_or(true, |c| r.city_name() == c))
        .map(|r| r.manager())
        .filter(|m| !m.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Current dashboard selection. Narrowing a wider selection resets the
/// narrower ones: region resets city and manager, city resets manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterState {
    pub region: String,
    pub city: String,
    pub manager: String,
}

impl Default for FilterState {
    fn default() -> Self {
        FilterState {
            region: ALL.to_string(),
            city: ALL.to_string(),
            manager: ALL.to_string(),
        }
    }
}

impl FilterState {
    pub fn set_region(&mut self, region: &str) {
        self.region = region.to_string();
        self.city = ALL.to_string();
        self.manager = ALL.to_string();
    }

    pub fn set_city(&mut self, city: &str) {
        self.city = city.to_string();
        self.manager = ALL.to_string();
    }

    pub fn set_manager(&mut self, manager: &str) {
        self.manager = manager.to_string();
    }

    pub fn apply<R: MetricRow + Clone>(&self, records: &[R], regions: &RegionMap) -> Vec<R> {
        let out = filter_by_region(records, &self.region, regions);
        let out = filter_by_city(&out, &self.city);
        filter_by_manager(&out, &self.manager)
    }

    /// City scope for the manager picker.
    pub fn city_scope(&self) -> Option<&str> {
        if is_all(&self.city) {
            None
        } else {
            Some(self.city.as_str())
        }
    }
}
