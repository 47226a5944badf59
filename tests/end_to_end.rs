use chrono::{TimeZone, Utc};
use compliance_dashboard::delta::DeltaOrigin;
use compliance_dashboard::filters::{get_managers, FilterState};
use compliance_dashboard::regions::RegionMap;
use compliance_dashboard::reports::{
    aggregate, build_category_cards, city_overview, group_by_region,
};
use compliance_dashboard::segment::DEFAULT_HEADER_MARKER;
use compliance_dashboard::types::HealthStatus;
use compliance_dashboard::{assemble_at, Dataset};

const SAMPLE: &str = include_str!("data/sample_report.csv");

fn load() -> Dataset {
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 6, 0, 0).unwrap();
    assemble_at(SAMPLE, DEFAULT_HEADER_MARKER, now).0
}

#[test]
fn sample_export_reconciles() {
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 6, 0, 0).unwrap();
    let (ds, report) = assemble_at(SAMPLE, DEFAULT_HEADER_MARKER, now);
    assert_eq!(ds.previous_day.len(), 4);
    assert_eq!(ds.today.len(), 5);
    assert_eq!(ds.day_over_day.len(), 4);
    assert_eq!(report.delta_origin, DeltaOrigin::Computed);
    assert_eq!(report.unmatched_today_rows, 1);

    let riyadh = &ds.day_over_day[0];
    assert_eq!(riyadh.city_name, "Riyadh");
    assert_eq!(riyadh.active_driver_card, "5.56%");
    assert_eq!(riyadh.expired_driver_card, "-50.00%");
    assert_eq!(riyadh.total_triggers, "10.00%");
    assert_eq!(riyadh.passed_rate, "1.00%");

    // Tabuk went to zero everywhere; empty rate cells decode as 0.00%.
    let tabuk = &ds.day_over_day[3];
    assert_eq!(tabuk.active_driver_card, "-100.00%");
    assert_eq!(tabuk.sequence_more3, "0.00%");
    assert_eq!(tabuk.passed_rate, "-95.00%");
    assert_eq!(ds.today[3].sponsorship_rate, "0.00%");
}

#[test]
fn appended_delta_table_is_used_verbatim() {
    let text = format!(
        "{SAMPLE}Day over Day,,,\ncity_id,city_name,manager,seq3\n1,Riyadh,A,+20.0%,+1.00%\n2,Jeddah,Ali,+25.0%,+1.50%\n2,Jeddah,Omar,0.0%,0.00%\n"
    );
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 6, 0, 0).unwrap();
    let (ds, report) = assemble_at(&text, DEFAULT_HEADER_MARKER, now);
    assert_eq!(report.delta_origin, DeltaOrigin::Parsed);
    // The "Day over Day" title line belongs to the today table's range but
    // is a data row by shape; it decodes leniently.
    assert_eq!(ds.today.len(), 6);
    assert_eq!(ds.day_over_day.len(), 3);
    assert_eq!(ds.day_over_day[0].sequence_more3, "+20.0%");
    assert_eq!(ds.day_over_day[0].total_triggers, "0.0%");
}

#[test]
fn filtered_summary_for_one_region() {
    let ds = load();
    let regions = RegionMap::default();
    let mut state = FilterState::default();
    state.set_region("Jeddah");

    let prev = state.apply(&ds.previous_day, &regions);
    let today = state.apply(&ds.today, &regions);
    let dod = state.apply(&ds.day_over_day, &regions);
    assert_eq!(today.len(), 2);
    assert_eq!(get_managers(&today, None), vec!["Ali", "Omar"]);

    let agg = aggregate(&today);
    assert_eq!(agg.cheating_couriers, 3.0);
    assert_eq!(agg.total_triggers, 3600.0);
    assert_eq!(agg.sponsorship_rate, 86.0);

    let cards = build_category_cards(&prev, &today, &dod);
    let cheating = &cards[1].metrics[0];
    assert_eq!(cheating.previous_day, "1");
    assert_eq!(cheating.today, "3");
    // Mean of +200% (Ali) and 0% (Omar).
    assert_eq!(cheating.dod, "+100.0%");
}

#[test]
fn regions_and_overview() {
    let ds = load();
    let regions = RegionMap::default();

    let groups = group_by_region(&ds.today, &regions);
    let keys: Vec<&str> = groups.iter().map(|g| g.key.as_str()).collect();
    assert_eq!(keys, vec!["Jeddah", "North", "South", "Unknown"]);
    let grouped: usize = groups.iter().map(|g| g.records.len()).sum();
    assert_eq!(grouped, ds.today.len());

    let overview = city_overview(&ds.today);
    assert_eq!(overview[0].city_name, "Tabuk");
    assert_eq!(overview[0].problem_score, 180.0);
    assert_eq!(overview[0].health, HealthStatus::Critical);
    assert_eq!(overview[1].city_name, "Jeddah");
    assert_eq!(overview[1].managers, "Ali, Omar");
    assert_eq!(overview.last().map(|c| c.health), Some(HealthStatus::Excellent));
}

#[test]
fn dataset_json_contract() {
    let ds = load();
    let json = serde_json::to_value(&ds).unwrap();
    let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
    for key in ["previousDay", "today", "dayOverDay", "lastUpdated"] {
        assert!(keys.contains(&key), "missing {key}");
    }
    assert_eq!(json["lastUpdated"], "2024-05-01T06:00:00.000Z");
    assert_eq!(json["today"][1]["totalTriggers"], 2650);
}
