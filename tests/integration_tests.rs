use chrono::NaiveDate;
use f6_builder::config::LetterCase;
use f6_builder::render::TemplateRenderer;
use f6_builder::report::{BuildRequest, build_all, build_station_dataset};
use f6_builder::store::{ClimateStore, DirectoryStore};

fn fixture_store() -> DirectoryStore {
    DirectoryStore::new(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/data"))
}

fn renderer() -> TemplateRenderer {
    TemplateRenderer::new(concat!(env!("CARGO_MANIFEST_DIR"), "/templates"))
}

fn request(letter_case: LetterCase) -> BuildRequest {
    BuildRequest {
        target: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
        today: NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
        remarks: "SENSOR MAINTENANCE ON THE 4TH".to_string(),
        letter_case,
    }
}

#[tokio::test]
async fn test_dataset_from_fixture_store() {
    let store = fixture_store();
    let stations = store.stations().await.expect("stations");
    let omaha = stations.iter().find(|s| s.id == "KOAX").expect("KOAX");

    let data = build_station_dataset(&store, omaha, &request(LetterCase::Upper))
        .await
        .expect("dataset");

    assert_eq!(data.days.len(), 5);
    assert_eq!(data.get("month"), Some("MARCH"));
    assert_eq!(data.get("lat_min"), Some(" 19"));
    assert_eq!(data.get("lon_min"), Some(" 22"));

    assert_eq!(data.get("sum_max"), Some("  177"));
    assert_eq!(data.get("avg_max"), Some(" 44.3"));
    assert_eq!(data.get("avg_min"), Some(" 26.4"));
    assert_eq!(data.get("sum_hdd"), Some(" 122"));
    assert_eq!(data.get("sum_wtr"), Some("  0.53"));
    assert_eq!(data.get("sum_snw"), Some("  2.0"));

    assert_eq!(data.get("max_temp"), Some("  55"));
    assert_eq!(data.get("max_temp_day"), Some(" 2"));
    assert_eq!(data.get("max_temp_day2"), Some("  "));
    assert_eq!(data.get("precip_24h_dates"), Some(" 3- 3"));
    assert_eq!(data.get("snow_depth"), Some("  2 ON  4   "));
    assert_eq!(data.get("snow_total"), Some("   2.0 INCHES"));
    assert_eq!(data.get("max_flag"), Some("#"));
    assert_eq!(data.get("gust_flag"), Some(" "));

    // month-to-date degree days come from the store's cumulative fields
    assert_eq!(data.get("heating_month"), Some("   122"));
    assert_eq!(data.get("heating_month_departure"), Some("   -23"));
    assert_eq!(data.get("heating_season_departure"), Some("  -140"));
    assert_eq!(data.get("cooling_month"), Some("     0"));
    assert_eq!(data.get("precip_departure"), Some("    0.15"));

    assert_eq!(data.days[1].ws, " 1   ");
    assert_eq!(data.days[2].ws, " 13  ");
    assert_eq!(data.days[3].ws, "     ");
    assert_eq!(data.days[4].ws, " M   ");
    assert_eq!(data.days[4].wtr, "    M");

    assert_eq!(
        data.get("remarks"),
        Some("#FINAL-03-24#\nSENSOR MAINTENANCE ON THE 4TH")
    );
}

#[tokio::test]
async fn test_full_batch_renders_and_reports_failures() {
    let store = fixture_store();
    let outcome = build_all(&store, &renderer(), &request(LetterCase::Upper))
        .await
        .expect("batch");

    assert!(!outcome.success);
    assert_eq!(outcome.reports.len(), 1);
    let report = outcome.reports.get("OAXLCDMAR").expect("OAX report");

    assert!(report.contains("STATION:   OMAHA/VALLEY"));
    assert!(report.contains("MONTH:     MARCH"));
    assert!(report.contains(" 1  48  30  39   4  26   0 0.00  0.0    0  8.4 17 200   M    M   3      25 210\n"));
    assert!(report.contains(" 3   M  33   M   M   M   0 0.41    T    0 12.6 24 170   M    M  10 13   33 160\n"));
    assert!(report.contains("HIGHEST SLP 30.41 ON  5"));
    assert!(report.ends_with("#FINAL-03-24#\nSENSOR MAINTENANCE ON THE 4TH\n"));

    let lines: Vec<&str> = outcome.message.lines().collect();
    assert_eq!(lines[0], "Successfully created report for Station OMAHA/VALLEY.");
    assert!(lines[1].starts_with("Something went wrong during creation of F6 report for station DES MOINES."));
}

#[tokio::test]
async fn test_mixed_case_template() {
    let store = fixture_store();
    let outcome = build_all(&store, &renderer(), &request(LetterCase::Mixed))
        .await
        .expect("batch");

    let report = outcome.reports.get("OAXLCDMAR").expect("OAX report");
    assert!(report.starts_with("Preliminary Local Climatological Data"));
    assert!(report.contains("Month:     March"));
}
