//! Shared helpers for ring election integration tests.

#![allow(dead_code)]

use ringpool::{
    ElectionResult, MemoryTrace, NetworkConfig, NodeId, RingNetwork, RunReport, Scenario,
    TraceEvent,
};

/// Install a test subscriber once per test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::WARN)
        .try_init();
}

/// Run a scenario to completion inside a `LocalSet`.
pub async fn run(scenario: &Scenario, config: NetworkConfig) -> (ElectionResult<RunReport>, MemoryTrace) {
    init_tracing();
    let trace = MemoryTrace::new();
    let mut network = RingNetwork::new(scenario, config, trace.clone());
    let local = tokio::task::LocalSet::new();
    let result = local.run_until(network.run()).await;
    (result, trace)
}

/// Run with the fast preset and fail the test on error.
pub async fn run_ok(scenario: &Scenario) -> (RunReport, MemoryTrace) {
    let (result, trace) = run(scenario, NetworkConfig::fast()).await;
    let report = result.expect("run completes");
    (report, trace)
}

/// Shorthand for a list of ids.
pub fn ids(raw: &[u64]) -> Vec<NodeId> {
    raw.iter().copied().map(NodeId).collect()
}

/// Trace events recorded after the failure of `node`.
pub fn events_after_failure(trace: &MemoryTrace, node: u64) -> Vec<TraceEvent> {
    trace
        .events()
        .into_iter()
        .skip_while(|e| !matches!(e, TraceEvent::NodeFailed { node: n, .. } if *n == NodeId(node)))
        .skip(1)
        .collect()
}
