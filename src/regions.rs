// Static city -> region configuration.
use crate::error::DashboardError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

pub const UNKNOWN_REGION: &str = "Unknown";

/// Built-in West-region layout.
pub static DEFAULT_REGIONS: Lazy<RegionMap> = Lazy::new(|| {
    RegionMap::new(vec![
        RegionDef::new("Jeddah", &["Jeddah"]),
        RegionDef::new("North", &["Madinah", "Yanbu", "Tabuk"]),
        RegionDef::new("South", &["Abha", "Jazan", "Najran", "Makkah", "Taif"]),
    ])
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionDef {
    pub name: String,
    pub cities: Vec<String>,
}

impl RegionDef {
    pub fn new(name: &str, cities: &[&str]) -> Self {
        RegionDef {
            name: name.to_string(),
            cities: cities.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Read-only region lookup. The order of `regions` is the canonical display
/// order; a city listed under several regions belongs to the first.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionMap {
    regions: Vec<RegionDef>,
    city_region: HashMap<String, usize>,
}

impl RegionMap {
    pub fn new(regions: Vec<RegionDef>) -> Self {
        let mut city_region = HashMap::new();
        for (idx, region) in regions.iter().enumerate() {
            for city in &region.cities {
                city_region.entry(city.clone()).or_insert(idx);
            }
        }
        RegionMap { regions, city_region }
    }

    /// Load a `[{"name": ..., "cities": [...]}, ...]` JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, DashboardError> {
        let text = std::fs::read_to_string(path)?;
        let regions: Vec<RegionDef> = serde_json::from_str(&text)?;
        if regions.is_empty() {
            return Err(DashboardError::RegionConfig(format!(
                "{} defines no regions",
                path.display()
            )));
        }
        if let Some(bad) = regions.iter().find(|r| r.name.trim().is_empty()) {
            return Err(DashboardError::RegionConfig(format!(
                "region with empty name (cities: {:?})",
                bad.cities
            )));
        }
        info!("loaded {} regions from {}", regions.len(), path.display());
        Ok(RegionMap::new(regions))
    }

    pub fn region_of(&self, city: &str) -> Option<&str> {
        self.city_region
            .get(city)
            .map(|idx| self.regions[*idx].name.as_str())
    }

    /// Region name, or `"Unknown"` for cities missing from the map.
    pub fn region_or_unknown(&self, city: &str) -> &str {
        self.region_of(city).unwrap_or(UNKNOWN_REGION)
    }

    pub fn cities_in(&self, region: &str) -> &[String] {
        self.regions
            .iter()
            .find(|r| r.name == region)
            .map(|r| r.cities.as_slice())
            .unwrap_or(&[])
    }

    pub fn all_regions(&self) -> Vec<&str> {
        self.regions.iter().map(|r| r.name.as_str()).collect()
    }

    /// Sort rank for region grouping: configured order, then `"Unknown"`
    /// and anything else last.
    pub fn rank(&self, region: &str) -> usize {
        self.regions
            .iter()
            .position(|r| r.name == region)
            .unwrap_or(self.regions.len())
    }
}

impl Default for RegionMap {
    fn default() -> Self {
        DEFAULT_REGIONS.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn default_lookup() {
        let map = RegionMap::default();
        assert_eq!(map.region_of("Tabuk"), Some("North"));
        assert_eq!(map.region_of("Taif"), Some("South"));
        assert_eq!(map.region_of("Riyadh"), None);
        assert_eq!(map.region_or_unknown("Riyadh"), "Unknown");
        assert_eq!(map.all_regions(), vec!["Jeddah", "North", "South"]);
        assert_eq!(map.cities_in("North"), ["Madinah", "Yanbu", "Tabuk"]);
        assert!(map.cities_in("East").is_empty());
        assert_eq!(map.rank("South"), 2);
        assert_eq!(map.rank(UNKNOWN_REGION), 3);
    }

    #[test]
    fn loads_from_json() -> Result<(), DashboardError> {
        let mut file = NamedTempFile::new()?;
        write!(
            file,
            r#"[{{"name": "Central", "cities": ["Riyadh"]}}, {{"name": "East", "cities": ["Dammam", "Khobar"]}}]"#
        )?;
        let map = RegionMap::from_json_file(file.path())?;
        assert_eq!(map.all_regions(), vec!["Central", "East"]);
        assert_eq!(map.region_of("Khobar"), Some("East"));
        assert_eq!(map.region_of("Jeddah"), None);
        Ok(())
    }

    #[test]
    fn rejects_empty_config() -> Result<(), DashboardError> {
        let mut file = NamedTempFile::new()?;
        write!(file, "[]")?;
        assert!(matches!(
            RegionMap::from_json_file(file.path()),
            Err(DashboardError::RegionConfig(_))
        ));
        Ok(())
    }
}
