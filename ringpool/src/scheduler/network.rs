//! The round scheduler.
//!
//! Each call to [`RingNetwork::tick`] runs one round:
//!
//! ```text
//! round += 1
//!   │
//!   ├─ apply actions scheduled for this round
//!   │     StartElection  → node.start_election()
//!   │     ScheduleFailure → failure queue
//!   │
//!   ├─ delivery pass: one outbound message per active node → successor inbox
//!   │
//!   ├─ barrier: every active node drains its inbox, the network waits
//!   │
//!   └─ quiescent?
//!         no                      → next round
//!         yes, failure pending    → fail one node, notify its neighbors
//!         yes, nothing pending    → shut down, run complete
//! ```
//!
//! Node tasks are spawned with `spawn_local`, so `tick` and `run` must be
//! polled inside a `LocalSet`. [`RingNetwork::run_blocking`] sets one up.

use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::{debug, info, instrument, warn};

use crate::config::NetworkConfig;
use crate::error::{ElectionError, ElectionResult};
use crate::message::{Message, MessageKind, NodeId};
use crate::node::actor::NodeHandle;
use crate::node::NodeState;
use crate::report::{DeliveryStats, ElectionRecord, FailureRecord, RunReport};
use crate::scenario::{ActionKind, Scenario};
use crate::topology::{initial_links, NodeView, RingSnapshot};
use crate::trace::{TraceEvent, TraceSink};

use super::{FailureQueue, RoundActions};

/// What a tick ended with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Work remains; call `tick` again.
    Running,
    /// The system was quiescent and this node was failed.
    FailureInjected(NodeId),
    /// The system was quiescent with no failure left. All nodes are stopped.
    Completed,
}

/// Owner of every node, the action table and the failure queue.
pub struct RingNetwork {
    round: u64,
    nodes: BTreeMap<NodeId, NodeHandle>,
    actions: RoundActions,
    failures: FailureQueue,
    config: NetworkConfig,
    trace: Box<dyn TraceSink>,
    elections: Vec<ElectionRecord>,
    failed: Vec<FailureRecord>,
    delivery: DeliveryStats,
    started: bool,
    completed: Option<RunReport>,
}

impl RingNetwork {
    /// Build the network for a scenario. Nodes are not started until the
    /// first tick.
    pub fn new(
        scenario: &Scenario,
        config: NetworkConfig,
        trace: impl TraceSink + 'static,
    ) -> Self {
        let nodes: BTreeMap<NodeId, NodeHandle> = initial_links(scenario)
            .into_iter()
            .map(|(id, links)| (id, NodeHandle::new(NodeState::new(id, links))))
            .collect();

        info!(
            nodes = nodes.len(),
            actions = scenario.actions().len(),
            "ring network created"
        );

        Self {
            round: 0,
            nodes,
            actions: RoundActions::new(scenario.actions()),
            failures: FailureQueue::new(),
            config,
            trace: Box::new(trace),
            elections: Vec::new(),
            failed: Vec::new(),
            delivery: DeliveryStats::default(),
            started: false,
            completed: None,
        }
    }

    /// Last round started; 0 before the first tick.
    pub fn round(&self) -> u64 {
        self.round
    }

    /// Whether the run has reached its final quiescence.
    pub fn is_completed(&self) -> bool {
        self.completed.is_some()
    }

    /// Failures scheduled but not yet injected.
    pub fn pending_failures(&self) -> usize {
        self.failures.len()
    }

    /// Current view of a node.
    pub fn node(&self, id: NodeId) -> Option<NodeView> {
        self.nodes.get(&id).map(|h| h.state().borrow().view())
    }

    /// Current view of every node.
    pub fn snapshot(&self) -> RingSnapshot {
        RingSnapshot::new(self.nodes.values().map(|h| h.state().borrow().view()))
    }

    /// The final report once completed, otherwise a report of the current
    /// state.
    pub fn report(&self) -> RunReport {
        match &self.completed {
            Some(report) => report.clone(),
            None => self.build_report(),
        }
    }

    /// Tick until the run completes.
    pub async fn run(&mut self) -> ElectionResult<RunReport> {
        while self.tick().await? != TickOutcome::Completed {}
        Ok(self.report())
    }

    /// Run to completion on a fresh current-thread runtime.
    pub fn run_blocking(&mut self) -> ElectionResult<RunReport> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(|e| ElectionError::Runtime(e.to_string()))?;
        let local = tokio::task::LocalSet::new();
        local.block_on(&runtime, self.run())
    }

    /// Run a single round.
    #[instrument(skip(self), fields(round = self.round + 1))]
    pub async fn tick(&mut self) -> ElectionResult<TickOutcome> {
        if self.completed.is_some() {
            return Ok(TickOutcome::Completed);
        }
        if let Some(limit) = self.config.max_rounds {
            if self.round >= limit {
                return Err(ElectionError::RoundLimitExceeded { limit });
            }
        }

        self.start_nodes();
        self.round += 1;
        let round = self.round;
        self.trace.record(&TraceEvent::RoundStarted { round });

        self.apply_actions(round)?;
        self.deliver();
        self.barrier(round).await?;

        if !self.config.round_period.is_zero() {
            tokio::time::sleep(self.config.round_period).await;
        }

        if !self.is_quiescent() {
            return Ok(TickOutcome::Running);
        }

        match self.failures.pop() {
            Some(node) => {
                self.inject_failure(round, node)?;
                Ok(TickOutcome::FailureInjected(node))
            }
            None => {
                self.shutdown().await;
                Ok(TickOutcome::Completed)
            }
        }
    }

    fn start_nodes(&mut self) {
        if self.started {
            return;
        }
        for handle in self.nodes.values_mut() {
            handle.start();
        }
        self.started = true;
    }

    fn apply_actions(&mut self, round: u64) -> ElectionResult<()> {
        for action in self.actions.take(round) {
            match action {
                ActionKind::StartElection { nodes } => {
                    for id in nodes {
                        let handle = self.nodes.get(&id).ok_or(ElectionError::UnknownNode(id))?;
                        let mut state = handle.state().borrow_mut();
                        if state.is_active() {
                            state.start_election();
                        } else {
                            warn!(node = %id, "election requested at an inactive node");
                        }
                    }
                }
                ActionKind::ScheduleFailure { node } => {
                    if !self.nodes.contains_key(&node) {
                        return Err(ElectionError::UnknownNode(node));
                    }
                    debug!(%node, "failure queued");
                    self.failures.schedule(node);
                }
            }
        }
        Ok(())
    }

    /// Move at most one message per active node to its successor's inbox.
    fn deliver(&mut self) {
        let mut in_flight: Vec<(NodeId, Option<NodeId>, Message)> = Vec::new();
        for handle in self.nodes.values() {
            let mut state = handle.state().borrow_mut();
            if !state.is_active() {
                continue;
            }
            if let Some(message) = state.take_outbound() {
                in_flight.push((state.id(), state.links().next, message));
            }
        }

        for (sender, next, message) in in_flight {
            let target = next.and_then(|id| self.nodes.get(&id));
            let accepted = match target {
                Some(handle) => {
                    let mut state = handle.state().borrow_mut();
                    if state.is_active() {
                        state.deliver(message);
                        true
                    } else {
                        false
                    }
                }
                None => false,
            };

            if accepted {
                self.delivery.count(message.kind());
            } else {
                warn!(%sender, ?next, %message, "no active successor, message dropped");
                self.delivery.dropped += 1;
            }
        }
    }

    /// Step every active node and wait until all of them have drained their
    /// inbox.
    async fn barrier(&mut self, round: u64) -> ElectionResult<()> {
        let snapshot = Rc::new(self.snapshot());

        let mut replies = Vec::new();
        for handle in self.nodes.values() {
            if handle.state().borrow().is_active() {
                replies.push((handle.id(), handle.step(round, Rc::clone(&snapshot))?));
            }
        }

        for (id, reply) in replies {
            let events = reply.await.map_err(|_| ElectionError::NodeTaskGone(id))??;
            for event in events {
                self.emit(event);
            }
        }
        Ok(())
    }

    fn emit(&mut self, event: TraceEvent) {
        match &event {
            TraceEvent::LeaderElected {
                round,
                node,
                initiator,
            } => self.elections.push(ElectionRecord {
                round: *round,
                leader: *node,
                initiator: *initiator,
            }),
            TraceEvent::MessageReceived { .. } if !self.config.trace_messages => return,
            _ => {}
        }
        self.trace.record(&event);
    }

    fn is_quiescent(&self) -> bool {
        self.actions.is_empty()
            && self.nodes.values().all(|handle| {
                let state = handle.state().borrow();
                !state.is_active()
                    || (state.inbox_len() == 0 && state.outbox_len() == 0 && state.is_finished())
            })
    }

    fn inject_failure(&mut self, round: u64, node: NodeId) -> ElectionResult<()> {
        let handle = self
            .nodes
            .get_mut(&node)
            .ok_or(ElectionError::UnknownNode(node))?;
        if !handle.state().borrow().is_active() {
            warn!(%node, "node already failed");
            return Ok(());
        }

        let neighbors = handle.state().borrow().links().neighbors.clone();
        handle.stop();

        info!(%node, round, neighbors = neighbors.len(), "node failed");
        self.trace.record(&TraceEvent::NodeFailed { round, node });
        self.failed.push(FailureRecord { round, node });

        for neighbor in neighbors {
            let Some(handle) = self.nodes.get(&neighbor) else {
                continue;
            };
            let mut state = handle.state().borrow_mut();
            if state.is_active() {
                state.deliver(Message::Fail { failed: node });
                self.delivery.count(MessageKind::Fail);
            }
        }
        Ok(())
    }

    async fn shutdown(&mut self) {
        let report = self.build_report();

        for handle in self.nodes.values_mut() {
            handle.stop();
        }
        for handle in self.nodes.values_mut() {
            handle.join().await;
        }
        if let Err(e) = self.trace.flush() {
            warn!("unable to flush trace: {}", e);
        }

        info!(
            rounds = self.round,
            elections = report.elections.len(),
            failures = report.failures.len(),
            "run complete"
        );
        self.completed = Some(report);
    }

    fn build_report(&self) -> RunReport {
        RunReport::new(
            self.round,
            self.elections.clone(),
            self.failed.clone(),
            self.delivery,
            &self.snapshot(),
        )
    }
}

impl std::fmt::Debug for RingNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingNetwork")
            .field("round", &self.round)
            .field("nodes", &self.nodes.keys().collect::<Vec<_>>())
            .field("pending_failures", &self.failures.len())
            .field("completed", &self.completed.is_some())
            .finish()
    }
}
