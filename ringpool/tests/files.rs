//! Scripts, trace files and configuration loaded from disk.

mod common;

use std::fs;

use ringpool::{
    ElectionError, NetworkConfig, NodeId, RingNetwork, Scenario, ScenarioError, WriterTrace,
};
use tempfile::TempDir;

const SCRIPT: &str = "\
Node_id Neighbours
1 2 4
2 3 1
3 4 2
4 1 3

ELECT 1 2
FAIL 4
";

#[test]
fn script_run_writes_trace_file() {
    common::init_tracing();
    let dir = TempDir::new().expect("temp dir");
    let script = dir.path().join("ring.txt");
    let log = dir.path().join("log.txt");
    fs::write(&script, SCRIPT).expect("write script");

    let scenario = Scenario::from_file(&script).expect("valid script");
    let trace = WriterTrace::create(&log).expect("create trace file");
    let mut network = RingNetwork::new(&scenario, NetworkConfig::fast(), trace);
    let report = network.run_blocking().expect("run completes");

    assert_eq!(report.leaders(), vec![NodeId(3)]);

    let text = fs::read_to_string(&log).expect("read trace file");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "-- Round 1 starting");
    assert!(lines.contains(&"Node 3 received election message with id 2. Initiator: 2"));
    assert!(lines.contains(&"Node 4 is ELECTED as leader. Initiator: 2"));
    assert!(lines.contains(&"Node 4 FAILED"));
    assert!(lines.contains(&"Node 3 is ELECTED as leader. Initiator: 3"));
    assert_eq!(
        lines.iter().filter(|l| l.starts_with("-- Round")).count() as u64,
        report.rounds
    );
}

#[test]
fn missing_script_is_an_io_error() {
    let dir = TempDir::new().expect("temp dir");
    let err = Scenario::from_file(dir.path().join("absent.txt")).expect_err("no such file");
    assert!(matches!(err, ScenarioError::Io(_)));
}

#[test]
fn config_file_limits_rounds() {
    common::init_tracing();
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{ "max_rounds": 2, "trace_messages": false }"#).expect("write config");

    let config = NetworkConfig::from_json_file(&path).expect("valid config");
    assert_eq!(config.max_rounds, Some(2));
    assert!(config.round_period.is_zero());

    let scenario = Scenario::parse(SCRIPT).expect("valid script");
    let mut network = RingNetwork::new(&scenario, config, ringpool::NullTrace);
    let err = network.run_blocking().expect_err("two rounds are not enough");
    assert_eq!(err, ElectionError::RoundLimitExceeded { limit: 2 });
}

#[test]
fn malformed_config_is_rejected() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{ "max_rounds": "many" }"#).expect("write config");

    let err = NetworkConfig::from_json_file(&path).expect_err("not a number");
    assert!(matches!(err, ScenarioError::InvalidConfig(_)));
}

#[test]
fn report_serializes_to_json() {
    common::init_tracing();
    let scenario = Scenario::parse(SCRIPT).expect("valid script");
    let mut network = RingNetwork::new(&scenario, NetworkConfig::fast(), ringpool::NullTrace);
    let report = network.run_blocking().expect("run completes");

    let json: serde_json::Value = serde_json::to_value(&report).expect("serialize report");
    assert_eq!(json["rounds"], report.rounds);
    assert_eq!(json["elections"][0]["leader"], 4);
    assert_eq!(json["failures"][0]["node"], 4);
    assert_eq!(json["ring"], serde_json::json!([1, 2, 3]));

    let text = report.to_string();
    assert!(text.starts_with("=== Ring Election Report ==="));
    assert!(text.contains("Ring: 1 -> 2 -> 3 -> 1"));
    assert!(text.ends_with("Leader: 3"));
}
