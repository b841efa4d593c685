use chrono::{NaiveDate, TimeZone, Utc};
use sched_examples::config::toml_config::{IdStrategy, SourceKind};
use sched_examples::domain::model::Manifest;
use sched_examples::{EtlEngine, GeneratorConfig, GeneratorPipeline, LocalStorage, SchedError};
use std::collections::HashMap;
use std::path::Path;
use tempfile::TempDir;

const AVAILABILITY: &str = r#"[
  {
    "id": "MA-0001",
    "name": "Corner Pharmacy",
    "location": {"street": "1 Main St", "city": "Amherst", "state": "MA", "zipcode": "01002", "county": "Hampshire"},
    "contact": {"booking_url": "https://pharmacy.example.com/book", "booking_phone": "555-0100", "info_phone": "555-0101"},
    "availability": [
      {"date": "2021-03-02", "available_slots": 5, "total_slots": 20},
      {"date": "2021-03-03", "available_slots": 0, "total_slots": 20},
      {"date": "2021-03-04", "available_slots": 20, "total_slots": 20}
    ]
  },
  {
    "id": "MA-0002",
    "name": "Town Hall Clinic",
    "location": {"street": "2 Elm St", "street_line_2": "Room 4", "city": "Hadley", "state": "MA", "zipcode": "01035"},
    "contact": {"info_url": "https://hadley.example.gov"},
    "availability": [
      {"date": "2021-03-02", "available_slots": 7, "total_slots": 9},
      {"date": "2021-03-03", "available_slots": 8, "total_slots": 9},
      {"date": "2021-03-04", "available_slots": 9, "total_slots": 9}
    ]
  }
]"#;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn read_ndjson(path: &Path) -> Vec<serde_json::Value> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

async fn run(config: GeneratorConfig, outdir: &Path) -> Manifest {
    let storage = LocalStorage::new(outdir.to_str().unwrap().to_string());
    let time = Utc.with_ymd_and_hms(2021, 3, 1, 12, 0, 0).unwrap();
    let pipeline = GeneratorPipeline::new(storage, config).with_transaction_time(time);
    EtlEngine::new(pipeline).run().await.unwrap()
}

#[tokio::test]
async fn test_two_locations_three_days_coarse() {
    let temp_dir = TempDir::new().unwrap();

    let mut config = GeneratorConfig::default();
    config.generator.start_date = date(2021, 3, 2);
    config.generator.end_date = date(2021, 3, 4);
    config.source.limit = Some(2);

    let manifest = run(config, temp_dir.path()).await;

    let locations = read_ndjson(&temp_dir.path().join("locations.ndjson"));
    let schedules = read_ndjson(&temp_dir.path().join("schedules.ndjson"));
    let slots = read_ndjson(&temp_dir.path().join("slots-2021-W09.ndjson"));
    assert_eq!(locations.len(), 2);
    assert_eq!(schedules.len(), 2);
    assert_eq!(slots.len(), 6);

    for slot in &slots {
        assert_eq!(slot["resourceType"], "Slot");
        assert_eq!(slot["status"], "free");
        assert_eq!(slot["extension"][1]["valueInteger"], 100);
    }
    // Every schedule points at a written location, every slot at a written schedule.
    let location_refs: Vec<String> = locations
        .iter()
        .map(|l| format!("Location/{}", l["id"].as_str().unwrap()))
        .collect();
    for schedule in &schedules {
        let actor = schedule["actor"][0]["reference"].as_str().unwrap();
        assert!(location_refs.iter().any(|r| r == actor));
    }
    let schedule_refs: Vec<String> = schedules
        .iter()
        .map(|s| format!("Schedule/{}", s["id"].as_str().unwrap()))
        .collect();
    for slot in &slots {
        let reference = slot["schedule"]["reference"].as_str().unwrap();
        assert!(schedule_refs.iter().any(|r| r == reference));
    }

    assert_eq!(manifest.output.len(), 3);
    let written: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(temp_dir.path().join("$bulk-publish")).unwrap(),
    )
    .unwrap();
    assert_eq!(written["transactionTime"], "2021-03-01T12:00:00Z");
    assert_eq!(
        written["request"],
        "https://raw.githubusercontent.com/smart-on-fhir/smart-scheduling-links/master/examples/$bulk-publish"
    );
    assert_eq!(written["output"][2]["type"], "Slot");
    assert!(written["output"][2]["url"]
        .as_str()
        .unwrap()
        .ends_with("slots-2021-W09.ndjson"));
}

#[tokio::test]
async fn test_availability_file_produces_free_busy_pairs() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("availability.json");
    std::fs::write(&input, AVAILABILITY).unwrap();
    let outdir = temp_dir.path().join("out");

    let mut config = GeneratorConfig::default();
    config.source.kind = SourceKind::Availability;
    config.source.path = Some(input.to_str().unwrap().to_string());
    config.ids.strategy = IdStrategy::Derived;
    config.slots.close_offset_minutes = 17 * 60;

    let manifest = run(config, &outdir).await;
    assert_eq!(manifest.output.len(), 3);

    let locations = read_ndjson(&outdir.join("locations.ndjson"));
    let schedules = read_ndjson(&outdir.join("schedules.ndjson"));
    let slots = read_ndjson(&outdir.join("slots-2021-W09.ndjson"));
    assert_eq!(locations.len(), 2);
    assert_eq!(schedules.len(), 2);
    assert_eq!(slots.len(), 12);

    let location_id = locations[0]["id"].as_str().unwrap();
    assert_eq!(location_id.len(), 32);
    assert_eq!(locations[0]["identifier"][0]["value"], "MA-0001");
    assert_eq!(locations[1]["address"]["line"][1], "Room 4");
    assert_eq!(schedules[0]["id"], format!("c19-{}", location_id));

    let by_id: HashMap<&str, &serde_json::Value> =
        slots.iter().map(|s| (s["id"].as_str().unwrap(), s)).collect();
    let free = by_id[format!("c19-{}-2021-03-02f", location_id).as_str()];
    let busy = by_id[format!("c19-{}-2021-03-02b", location_id).as_str()];

    assert_eq!(free["start"], "2021-03-02T09:00:00-05:00");
    assert_eq!(free["end"], "2021-03-02T17:00:00-05:00");
    assert_eq!((&free["start"], &free["end"]), (&busy["start"], &busy["end"]));
    assert_eq!(free["extension"][0]["valueUrl"], "https://pharmacy.example.com/book");
    assert_eq!(free["extension"][1]["valueString"], "555-0100");
    assert_eq!(free["extension"][2]["valueInteger"], 5);
    assert_eq!(busy["extension"][0]["valueInteger"], 15);

    // Every pair splits its day's total.
    for slot in slots.iter().filter(|s| s["status"] == "free") {
        let id = slot["id"].as_str().unwrap();
        let partner = by_id[format!("{}b", id.trim_end_matches('f')).as_str()];
        let free_count = slot["extension"]
            .as_array()
            .unwrap()
            .iter()
            .find_map(|e| e["valueInteger"].as_u64())
            .unwrap();
        let busy_count = partner["extension"][0]["valueInteger"].as_u64().unwrap();
        assert!(free_count + busy_count == 20 || free_count + busy_count == 9);
    }
}

fn availability_config(dir: &Path, content: &str) -> GeneratorConfig {
    let input = dir.join("availability.json");
    std::fs::write(&input, content).unwrap();

    let mut config = GeneratorConfig::default();
    config.source.kind = SourceKind::Availability;
    config.source.path = Some(input.to_str().unwrap().to_string());
    config.ids.strategy = IdStrategy::Derived;
    config
}

#[tokio::test]
async fn test_availability_location_without_days_has_no_slots() {
    let temp_dir = TempDir::new().unwrap();
    let content = r#"[{
        "name": "Quiet Clinic",
        "location": {"street": "3 Oak St", "city": "Lee", "state": "MA", "zipcode": "01238"},
        "availability": []
    }]"#;
    let config = availability_config(temp_dir.path(), content);
    let outdir = temp_dir.path().join("out");

    let manifest = run(config, &outdir).await;

    assert_eq!(manifest.output.len(), 2);
    assert_eq!(read_ndjson(&outdir.join("locations.ndjson")).len(), 1);
    assert_eq!(read_ndjson(&outdir.join("schedules.ndjson")).len(), 1);
    let slot_files: Vec<_> = std::fs::read_dir(&outdir)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().starts_with("slots"))
        .collect();
    assert!(slot_files.is_empty());
}

#[tokio::test]
async fn test_availability_repeated_date_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let content = r#"[{
        "name": "Busy Clinic",
        "location": {"street": "4 Pine St", "city": "Lee", "state": "MA", "zipcode": "01238"},
        "availability": [
            {"date": "2021-03-02", "available_slots": 1, "total_slots": 5},
            {"date": "2021-03-02", "available_slots": 2, "total_slots": 5}
        ]
    }]"#;
    let config = availability_config(temp_dir.path(), content);
    let outdir = temp_dir.path().join("out");

    let storage = LocalStorage::new(outdir.to_str().unwrap().to_string());
    let pipeline = GeneratorPipeline::new(storage, config);
    let err = EtlEngine::new(pipeline).run().await.unwrap_err();

    assert!(matches!(err, SchedError::SourceRecordError { index: 0, .. }));
    assert!(!outdir.join("$bulk-publish").exists());
}

#[tokio::test]
async fn test_range_across_week_boundary() {
    let temp_dir = TempDir::new().unwrap();

    let mut config = GeneratorConfig::default();
    config.generator.start_date = date(2021, 3, 6);
    config.generator.end_date = date(2021, 3, 8);
    config.source.limit = Some(2);

    let manifest = run(config, temp_dir.path()).await;

    assert_eq!(manifest.output.len(), 4);
    let week_9 = read_ndjson(&temp_dir.path().join("slots-2021-W09.ndjson"));
    let week_10 = read_ndjson(&temp_dir.path().join("slots-2021-W10.ndjson"));
    assert_eq!(week_9.len(), 4);
    assert_eq!(week_10.len(), 2);
}

#[tokio::test]
async fn test_derived_ids_are_stable_across_runs() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();

    let mut config = GeneratorConfig::default();
    config.ids.strategy = IdStrategy::Derived;
    config.generator.end_date = date(2021, 3, 3);

    run(config.clone(), first.path()).await;
    run(config, second.path()).await;

    for file in ["locations.ndjson", "schedules.ndjson"] {
        let a = std::fs::read_to_string(first.path().join(file)).unwrap();
        let b = std::fs::read_to_string(second.path().join(file)).unwrap();
        assert_eq!(a, b, "{} differs between runs", file);
    }
}

#[test]
fn test_generator_binary_requires_outdir() {
    let bin = env!("CARGO_BIN_EXE_generate-examples");

    let output = std::process::Command::new(bin).output().unwrap();
    assert!(!output.status.success());

    let output = std::process::Command::new(bin).arg("--dry-run").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Slots: 310"));
}

#[test]
fn test_generator_binary_writes_outdir() {
    let temp_dir = TempDir::new().unwrap();
    let output = std::process::Command::new(env!("CARGO_BIN_EXE_generate-examples"))
        .arg("-o")
        .arg(temp_dir.path())
        .args(["--start-date", "2021-03-01", "--end-date", "2021-03-14"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let manifest: Manifest = serde_json::from_str(
        &std::fs::read_to_string(temp_dir.path().join("$bulk-publish")).unwrap(),
    )
    .unwrap();
    assert_eq!(manifest.output.len(), 4);
    assert_eq!(read_ndjson(&temp_dir.path().join("locations.ndjson")).len(), 10);
}
