//! CLI integration tests

use chrono::{Duration, TimeZone, Utc};
use serde_json::{json, Value};
use std::io::Write;
use std::process::{Command, Output};

fn rsidle(args: &[&str]) -> Output {
    let mut full = vec!["run", "-q", "-p", "rsidle-cli", "--"];
    full.extend_from_slice(args);
    Command::new("cargo")
        .args(full)
        .env_remove("RUST_LOG")
        .env_remove("RSIDLE_CONFIG")
        .output()
        .expect("Failed to execute command")
}

fn stdout_json(output: &Output) -> Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).expect("stdout should be JSON")
}

fn write_temp(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(file, "{}", contents).unwrap();
    file
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = rsidle(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("Redshift idle time"), "Should show app description");
    assert!(stdout.contains("analyze"), "Should show analyze command");
    assert!(stdout.contains("queries"), "Should show queries command");
    assert!(stdout.contains("cost"), "Should show cost command");
    assert!(stdout.contains("simulate"), "Should show simulate command");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = rsidle(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("rsidle"), "Should show binary name");
}

/// Test format option
#[test]
fn test_format_option() {
    let output = rsidle(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.contains("--format"), "Should show format option");
    assert!(stdout.contains("table"), "Should show table format");
    assert!(stdout.contains("json"), "Should show json format");
    assert!(stdout.contains("RSIDLE_CONFIG"), "Should show config env var");
}

/// Test analyze command help
#[test]
fn test_analyze_help() {
    let output = rsidle(&["analyze", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Analyze help should succeed");
    assert!(stdout.contains("--cluster-id"), "Should show cluster-id option");
    assert!(stdout.contains("--metrics"), "Should show metrics option");
    assert!(stdout.contains("--price-list"), "Should show price-list option");
}

/// Test missing required argument error handling
#[test]
fn test_analyze_requires_cluster_id() {
    let output = rsidle(&["analyze", "--metrics", "read.json"]);
    assert!(!output.status.success(), "Missing argument should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("required") || stderr.contains("error"),
        "Should show error about missing argument"
    );
}

/// Test validation of the lookback period
#[test]
fn test_analyze_rejects_long_lookback() {
    let output = rsidle(&["analyze", "-c", "etl", "--days", "45", "--metrics", "read.json"]);
    assert!(!output.status.success(), "Lookback beyond 30 days should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("30"), "Should mention the retention limit");
}

/// Test analyze over an exported ReadIOPS stream
#[test]
fn test_analyze_metric_export() {
    let start = Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap();
    let datapoints: Vec<Value> = (0..1440)
        .map(|minute| {
            let ts = start + Duration::minutes(minute);
            let value = if minute < 360 { 5.0 } else { 0.0 };
            json!({ "Timestamp": ts.to_rfc3339(), "Average": value, "Unit": "Count/Second" })
        })
        .collect();
    let metrics = write_temp(&json!({ "Label": "ReadIOPS", "Datapoints": datapoints }).to_string());

    let output = rsidle(&[
        "--format",
        "json",
        "analyze",
        "-c",
        "etl",
        "--days",
        "1",
        "--node-type",
        "ra3.4xlarge",
        "--nodes",
        "2",
        "--metrics",
        metrics.path().to_str().unwrap(),
    ]);
    assert!(output.status.success(), "Analyze should succeed");

    let report = stdout_json(&output);
    assert_eq!(report["activity"]["status"], "computed");
    assert_eq!(report["activity"]["total_buckets"], 1440);
    assert!((report["activity"]["idle_percentage"].as_f64().unwrap() - 75.0).abs() < 1e-9);
    assert_eq!(report["activity_basis"], "io_metrics");
    assert_eq!(report["cost"]["rpu_count"], 16);
    assert_eq!(report["cost"]["node_hourly_rate"]["source"], "hardcoded");
    let notes = report["notes"].as_array().unwrap();
    assert!(notes.iter().any(|n| n.as_str().unwrap().contains("WriteIOPS")));
}

/// Test query-gap idle time over the worked example
#[test]
fn test_queries_worked_example() {
    let first = Utc.with_ymd_and_hms(2024, 6, 1, 9, 16, 0).unwrap();
    let rows: Vec<Value> = (0..12)
        .map(|i| {
            let start = first + Duration::minutes(75 * i);
            let end = start + Duration::seconds(5);
            json!({
                "start_time": start.format("%Y-%m-%d %H:%M:%S").to_string(),
                "end_time": end.format("%Y-%m-%d %H:%M:%S").to_string(),
                "status": "success"
            })
        })
        .collect();
    let log = write_temp(&Value::Array(rows).to_string());

    let output = rsidle(&[
        "queries",
        log.path().to_str().unwrap(),
        "--end",
        "2024-06-02T00:00:00Z",
        "--format",
        "json",
    ]);
    assert!(output.status.success(), "Queries should succeed");

    let report = stdout_json(&output);
    assert_eq!(report["counts"]["total"], 12);
    assert_eq!(report["gap_based"]["idle_seconds"].as_f64().unwrap(), 86_340.0);
    assert!((report["gap_based"]["idle_percentage"].as_f64().unwrap() - 99.930_555_555).abs() < 1e-6);
    assert!(report["span_based"]["idle_percentage"].as_f64().unwrap() < 99.0);
}

/// Test cost estimate with default fallback prices
#[test]
fn test_cost_estimate() {
    let output = rsidle(&[
        "cost",
        "--nodes",
        "2",
        "--active-pct",
        "25",
        "--format",
        "json",
    ]);
    assert!(output.status.success(), "Cost should succeed");

    let cost = stdout_json(&output);
    assert_eq!(cost["rpu_count"], 8);
    assert!((cost["current_monthly_cost"].as_f64().unwrap() - 1585.56).abs() < 1e-6);
    assert!((cost["serverless_monthly_cost"].as_f64().unwrap() - 547.5).abs() < 1e-6);
    assert_eq!(cost["recommendation"], "strongly_recommend");
}

/// Test cost rejects an out-of-range activity share
#[test]
fn test_cost_rejects_bad_percentage() {
    let output = rsidle(&["cost", "--active-pct", "140"]);
    assert!(!output.status.success(), "Activity above 100% should fail");
}

/// Test cost rejects node counts Redshift cannot provision
#[test]
fn test_cost_rejects_oversized_cluster() {
    let output = rsidle(&["cost", "--nodes", "4294967295", "--node-type", "ra3.16xlarge", "--active-pct", "10"]);
    assert!(!output.status.success(), "More than 128 nodes should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("128"), "Should mention the node limit");
}

/// Test simulate table output
#[test]
fn test_simulate_table() {
    let output = rsidle(&["simulate", "--days", "2", "--end", "2024-03-11T00:00:00Z"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Simulate should succeed");
    assert!(stdout.contains("Redshift Idle Analysis"), "Should show report heading");
    assert!(stdout.contains("Recommendation"), "Should show recommendation");
}

/// Test simulate JSON output for a business-hours day
#[test]
fn test_simulate_business_hours_json() {
    let output = rsidle(&[
        "--format",
        "json",
        "simulate",
        "--days",
        "1",
        "--end",
        "2024-03-11T00:00:00Z",
        "--query-every-mins",
        "60",
    ]);
    assert!(output.status.success(), "Simulate should succeed");

    let report = stdout_json(&output);
    let idle = report["activity"]["idle_percentage"].as_f64().unwrap();
    assert!((idle - 200.0 / 3.0).abs() < 1e-6);
    assert_eq!(report["queries"]["counts"]["total"], 24);
    assert_eq!(report["cluster"]["cluster_id"], "simulated");
    assert_eq!(report["cost"]["rpu_hourly_rate"]["currency"], "USD");
}

/// Test invalid command error handling
#[test]
fn test_invalid_command() {
    let output = rsidle(&["invalid-command"]);
    assert!(!output.status.success(), "Invalid command should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("error") || stderr.contains("invalid"),
        "Should show error message"
    );
}
