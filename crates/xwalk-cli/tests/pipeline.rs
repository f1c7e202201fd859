//! Integration tests for the load/validate/run pipeline.

use std::fs;
use std::path::Path;

use xwalk_cli::config::parse_config;
use xwalk_cli::pipeline::{InputPaths, OutputRequest, load_inputs, run, validate};
use xwalk_model::{EngineConfig, ErrorKind, OutputFormat, StrictPolicy};
use xwalk_transform::CancellationHandle;

const SCHEMA: &str = r#"{
    "name": "contacts",
    "fields": [
        {"name": "id", "type": "integer", "constraints": [{"required": true}, {"unique": true}]},
        {"name": "name", "type": "string"},
        {"name": "balance", "type": "number"},
        {"name": "active", "type": "boolean"}
    ]
}"#;

const CROSSWALK: &str = r#"{
    "name": "contacts-v1",
    "steps": [
        {"action": "ORDER", "target": "id", "sources": ["id"]},
        {"action": "JOIN", "target": "name", "sources": ["first", "last"]},
        {"action": "CALCULATE", "target": "balance",
         "sources": [{"column": "credit", "modifier": "+"}, {"column": "debit", "modifier": "-"}]},
        {"action": "CATEGORISE", "target": "active",
         "sources": [{"column": "status", "modifier": "BOOL"}]}
    ]
}"#;

const SOURCE: &str = "\
id,first,last,credit,debit,status
1,Ada,Lovelace,100,25,x
2,Alan,,50,,
3,,Hopper,,10,x
";

fn write_inputs(dir: &Path, crosswalk: &str) -> InputPaths {
    fs::write(dir.join("schema.json"), SCHEMA).unwrap();
    fs::write(dir.join("crosswalk.json"), crosswalk).unwrap();
    fs::write(dir.join("source.csv"), SOURCE).unwrap();
    InputPaths {
        schema: "schema.json".into(),
        crosswalk: "crosswalk.json".into(),
        source: "source.csv".into(),
    }
}

fn config_in(dir: &Path) -> EngineConfig {
    EngineConfig {
        working_dir: Some(dir.to_path_buf()),
        workers: 2,
        batch_size: 2,
        ..EngineConfig::default()
    }
}

#[test]
fn validates_files_from_the_working_dir() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_inputs(dir.path(), CROSSWALK);
    let loaded = load_inputs(&paths, &config_in(dir.path())).unwrap();
    let report = validate(&loaded, &StrictPolicy::lenient());
    assert!(report.ok(), "{report}");
    assert_eq!(report.error_count(), 0);
}

#[test]
fn missing_source_is_reported_with_its_path() {
    let dir = tempfile::tempdir().unwrap();
    let mut paths = write_inputs(dir.path(), CROSSWALK);
    paths.source = "nope.csv".into();
    let err = load_inputs(&paths, &config_in(dir.path()))
        .err()
        .expect("load fails");
    assert!(format!("{err:#}").contains("nope.csv"));
}

#[test]
fn run_writes_csv_and_fingerprint() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_inputs(dir.path(), CROSSWALK);
    let config = config_in(dir.path());
    let output = OutputRequest {
        path: "out/contacts.csv".into(),
        format: OutputFormat::Csv,
    };

    let first = run(
        load_inputs(&paths, &config).unwrap(),
        &config,
        &StrictPolicy::lenient(),
        &output,
        &CancellationHandle::new(),
    )
    .unwrap();
    let written = first.written.expect("output written");
    assert_eq!(first.rows, 3);
    assert_eq!(written.path, dir.path().join("out/contacts.csv"));
    let csv = fs::read_to_string(&written.path).unwrap();
    assert!(csv.starts_with("id,name,balance,active\n"));
    assert_eq!(csv.lines().count(), 4);
    assert_eq!(written.fingerprint.len(), 64);

    let second = run(
        load_inputs(&paths, &config).unwrap(),
        &config,
        &StrictPolicy::lenient(),
        &output,
        &CancellationHandle::new(),
    )
    .unwrap();
    assert_eq!(second.written.unwrap().fingerprint, written.fingerprint);
}

#[test]
fn spilling_run_matches_in_memory_run() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_inputs(dir.path(), CROSSWALK);
    let config = config_in(dir.path());
    let spilling = parse_config("memory_budget_bytes = 64\nworkers = 2\n").unwrap();
    let spilling = EngineConfig {
        working_dir: config.working_dir.clone(),
        spill_dir: Some(dir.path().to_path_buf()),
        ..spilling
    };
    let json = |path: &str| OutputRequest {
        path: path.into(),
        format: OutputFormat::Json,
    };

    let direct = run(
        load_inputs(&paths, &config).unwrap(),
        &config,
        &StrictPolicy::lenient(),
        &json("direct.json"),
        &CancellationHandle::new(),
    )
    .unwrap()
    .written
    .unwrap();
    let spilled = run(
        load_inputs(&paths, &spilling).unwrap(),
        &spilling,
        &StrictPolicy::lenient(),
        &json("spilled.json"),
        &CancellationHandle::new(),
    )
    .unwrap()
    .written
    .unwrap();
    assert_eq!(direct.fingerprint, spilled.fingerprint);

    let records: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&direct.path).unwrap()).unwrap();
    assert_eq!(
        records[0],
        serde_json::json!({"id": 1, "name": "Ada Lovelace", "balance": 75.0, "active": true})
    );
    assert_eq!(records[2]["name"], "Hopper");
    assert_eq!(records[2]["balance"], -10.0);
}

#[test]
fn structural_errors_stop_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let broken = r#"{"name": "broken", "steps": [
        {"action": "ORDER", "target": "id", "sources": ["identifier"]}
    ]}"#;
    let paths = write_inputs(dir.path(), broken);
    let config = config_in(dir.path());
    let outcome = run(
        load_inputs(&paths, &config).unwrap(),
        &config,
        &StrictPolicy::lenient(),
        &OutputRequest {
            path: "out.csv".into(),
            format: OutputFormat::Csv,
        },
        &CancellationHandle::new(),
    )
    .unwrap();
    assert!(outcome.written.is_none());
    assert!(outcome.report.contains(ErrorKind::UnknownColumn));
    assert!(!dir.path().join("out.csv").exists());
}

#[test]
fn strict_run_fails_on_constraint_warnings() {
    let dir = tempfile::tempdir().unwrap();
    let duplicated = r#"{"name": "dup", "steps": [
        {"action": "NEW", "target": "id", "constant": 1}
    ]}"#;
    let paths = write_inputs(dir.path(), duplicated);
    let config = config_in(dir.path());
    let request = OutputRequest {
        path: "out.csv".into(),
        format: OutputFormat::Csv,
    };

    let lenient = run(
        load_inputs(&paths, &config).unwrap(),
        &config,
        &StrictPolicy::lenient(),
        &request,
        &CancellationHandle::new(),
    )
    .unwrap();
    assert!(lenient.written.is_some());
    assert!(lenient.report.contains(ErrorKind::UniqueViolation));

    let strict = run(
        load_inputs(&paths, &config).unwrap(),
        &config,
        &StrictPolicy::strict(),
        &request,
        &CancellationHandle::new(),
    )
    .unwrap();
    assert!(strict.written.is_none());
    assert!(strict.report.has_errors());
}

#[test]
fn cancelled_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_inputs(dir.path(), CROSSWALK);
    let config = config_in(dir.path());
    let cancel = CancellationHandle::new();
    cancel.cancel();

    let err = run(
        load_inputs(&paths, &config).unwrap(),
        &config,
        &StrictPolicy::lenient(),
        &OutputRequest {
            path: "out.csv".into(),
            format: OutputFormat::Csv,
        },
        &cancel,
    )
    .unwrap_err();
    assert!(format!("{err:#}").contains("cancelled"), "{err:#}");
    assert!(!dir.path().join("out.csv").exists());
}
