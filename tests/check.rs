//! End-to-end gate evaluation through the public API.

use std::fs;
use std::path::{Path, PathBuf};

use covgate::cli::{self, Style};
use covgate::config;
use covgate::evaluate;
use covgate::verdict::Status;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

#[test]
fn gate_scenario_component_fails_despite_floor_pass() {
    // bitcoin_adapter matches both the "bitcoin" and "adapter" patterns;
    // priority 1 wins, so it is gated as critical and passes at 95%.
    // cosmos_adapter lands in "adapters" at 70% and fails the 80% bar.
    // Overall 260/300 = 86.7% clears the floor, yet the gate fails.
    let (out, verdict) = cli::cmd_check(
        &fixture("summary.json"),
        None,
        &fixture("covgate.toml"),
        &Style::Text,
    )
    .unwrap();

    assert_eq!(verdict.overall_status, Status::Fail);
    assert_eq!(verdict.floor_status, Status::Pass);
    assert_eq!(verdict.exit_code(), 1);
    assert!((verdict.overall_percent - 86.6667).abs() < 0.001);

    let bitcoin = verdict
        .components
        .iter()
        .find(|c| c.name == "bitcoin")
        .unwrap();
    assert_eq!(bitcoin.percent, 95.0);
    assert_eq!(bitcoin.status, Status::Pass);

    let adapters = verdict
        .components
        .iter()
        .find(|c| c.name == "adapters")
        .unwrap();
    assert_eq!(adapters.percent, 70.0);
    assert_eq!(adapters.status, Status::Fail);

    assert_eq!(verdict.recommendations, vec!["adapters"]);
    assert!(out.contains("Coverage gate: FAIL"));
}

#[test]
fn malformed_entry_skipped_rest_evaluated() {
    let dir = tempfile::tempdir().unwrap();

    // Ten valid entries plus one where covered exceeds valid.
    let mut files: Vec<String> = (0..10)
        .map(|i| {
            format!(
                r#"{{"filename": "src/f{i}.rs", "lines_valid": 10, "lines_covered": 9}}"#
            )
        })
        .collect();
    files.push(r#"{"filename": "src/broken.rs", "lines_valid": 2, "lines_covered": 5}"#.to_string());
    let report_path = dir.path().join("report.json");
    fs::write(&report_path, format!("[{}]", files.join(","))).unwrap();

    let config_path = dir.path().join("covgate.toml");
    fs::write(&config_path, "overall_min = 80.0\n").unwrap();

    let (_, verdict) =
        cli::cmd_check(&report_path, None, &config_path, &Style::Text).unwrap();

    assert_eq!(verdict.components.len(), 1); // everything unclassified
    assert_eq!(verdict.overall_lines_valid, 100);
    assert_eq!(verdict.overall_lines_covered, 90);
    assert_eq!(verdict.skipped_entries.len(), 1);
    assert_eq!(verdict.skipped_entries[0].filename, "src/broken.rs");
    assert_eq!(verdict.overall_status, Status::Pass);
}

#[test]
fn empty_report_is_an_internal_error() {
    let dir = tempfile::tempdir().unwrap();
    let report_path = dir.path().join("report.json");
    fs::write(&report_path, r#"{"files": []}"#).unwrap();
    let config_path = dir.path().join("covgate.toml");
    fs::write(&config_path, "").unwrap();

    let result = cli::cmd_check(&report_path, None, &config_path, &Style::Text);
    assert!(result.is_err());
}

#[test]
fn invalid_config_is_an_internal_error() {
    let dir = tempfile::tempdir().unwrap();
    let report_path = dir.path().join("report.json");
    fs::write(
        &report_path,
        r#"[{"filename": "a.rs", "lines_valid": 1, "lines_covered": 1}]"#,
    )
    .unwrap();
    let config_path = dir.path().join("covgate.toml");
    fs::write(&config_path, "overall_min = 200.0\n").unwrap();

    let result = cli::cmd_check(&report_path, None, &config_path, &Style::Text);
    assert!(result.is_err());
}

#[test]
fn verdict_json_document_shape() {
    let (out, _) = cli::cmd_check(
        &fixture("summary.json"),
        None,
        &fixture("covgate.toml"),
        &Style::Json,
    )
    .unwrap();

    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(json["overall_status"], "fail");
    assert_eq!(json["floor_status"], "pass");
    assert_eq!(json["recommendations"], serde_json::json!(["adapters"]));
    assert!(json["components"].as_array().unwrap().len() >= 2);
    assert!(json["skipped_entries"].as_array().unwrap().is_empty());
}

#[test]
fn evaluate_is_pure_across_repeat_runs() {
    let config = config::parse(&fs::read_to_string(fixture("covgate.toml")).unwrap()).unwrap();

    let (outcome_a, _) = evaluate::load_report(&fixture("summary.json"), None).unwrap();
    let (outcome_b, _) = evaluate::load_report(&fixture("summary.json"), None).unwrap();

    let verdict_a = evaluate::evaluate(outcome_a, &config).unwrap();
    let verdict_b = evaluate::evaluate(outcome_b, &config).unwrap();

    assert_eq!(verdict_a.overall_percent, verdict_b.overall_percent);
    assert_eq!(verdict_a.recommendations, verdict_b.recommendations);
    assert_eq!(verdict_a.components.len(), verdict_b.components.len());
}
