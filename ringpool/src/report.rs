//! Summary of a completed run.

use std::fmt;

use serde::Serialize;

use crate::message::{MessageKind, NodeId};
use crate::topology::{NodeView, RingSnapshot};

/// Messages moved by the network, per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryStats {
    /// Elect messages delivered to a successor.
    pub elect: u64,
    /// Leader messages delivered to a successor.
    pub leader: u64,
    /// Failure notices handed to neighbors.
    pub fail: u64,
    /// Messages discarded because the sender had no successor or the
    /// successor was no longer active.
    pub dropped: u64,
}

impl DeliveryStats {
    pub(crate) fn count(&mut self, kind: MessageKind) {
        match kind {
            MessageKind::Elect => self.elect += 1,
            MessageKind::Leader => self.leader += 1,
            MessageKind::Fail => self.fail += 1,
        }
    }

    /// Total messages delivered.
    pub fn delivered(&self) -> u64 {
        self.elect + self.leader + self.fail
    }
}

/// One completed election.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ElectionRecord {
    /// Round in which the leader saw its own id return.
    pub round: u64,
    /// Elected node.
    pub leader: NodeId,
    /// Node that started the winning election.
    pub initiator: NodeId,
}

/// A failure injected at quiescence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    /// Round at whose end the failure was injected.
    pub round: u64,
    /// Failed node.
    pub node: NodeId,
}

/// Result of [`RingNetwork::run`](crate::RingNetwork::run).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Rounds executed, including the final quiescent one.
    pub rounds: u64,
    /// Elections in completion order.
    pub elections: Vec<ElectionRecord>,
    /// Failures in injection order.
    pub failures: Vec<FailureRecord>,
    /// Message accounting.
    pub delivery: DeliveryStats,
    /// Every node as it stood at the final quiescence, before shutdown.
    pub nodes: Vec<NodeView>,
    /// Active ring at the final quiescence, or `None` when the active nodes
    /// did not form a single cycle.
    pub ring: Option<Vec<NodeId>>,
}

impl RunReport {
    pub(crate) fn new(
        rounds: u64,
        elections: Vec<ElectionRecord>,
        failures: Vec<FailureRecord>,
        delivery: DeliveryStats,
        snapshot: &RingSnapshot,
    ) -> Self {
        let ring = match snapshot.ring_order() {
            Ok(order) => Some(order),
            Err(e) => {
                tracing::warn!("final topology is not a single ring: {}", e);
                None
            }
        };

        Self {
            rounds,
            elections,
            failures,
            delivery,
            nodes: snapshot.iter().cloned().collect(),
            ring,
        }
    }

    /// Surviving nodes that hold leadership.
    pub fn leaders(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| n.active && n.leader)
            .map(|n| n.id)
            .collect()
    }

    /// Leader of the most recent election, if one completed.
    pub fn last_leader(&self) -> Option<NodeId> {
        self.elections.last().map(|e| e.leader)
    }

    /// Final state of a node.
    pub fn node(&self, id: NodeId) -> Option<&NodeView> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Ids of nodes still active at the end.
    pub fn survivors(&self) -> Vec<NodeId> {
        self.nodes.iter().filter(|n| n.active).map(|n| n.id).collect()
    }
}

fn join(ids: &[NodeId], separator: &str) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(separator)
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Ring Election Report ===")?;
        writeln!(f, "Rounds: {}", self.rounds)?;
        writeln!(
            f,
            "Messages: {} delivered ({} elect, {} leader, {} fail), {} dropped",
            self.delivery.delivered(),
            self.delivery.elect,
            self.delivery.leader,
            self.delivery.fail,
            self.delivery.dropped
        )?;

        writeln!(f, "Elections: {}", self.elections.len())?;
        for e in &self.elections {
            writeln!(
                f,
                "  - round {}: node {} (initiator {})",
                e.round, e.leader, e.initiator
            )?;
        }

        if !self.failures.is_empty() {
            writeln!(f, "Failures: {}", self.failures.len())?;
            for failure in &self.failures {
                writeln!(f, "  - round {}: node {}", failure.round, failure.node)?;
            }
        }

        match &self.ring {
            Some(ring) if !ring.is_empty() => {
                writeln!(f, "Ring: {} -> {}", join(ring, " -> "), ring[0])?;
            }
            Some(_) => writeln!(f, "Ring: empty")?,
            None => writeln!(f, "Ring: BROKEN")?,
        }

        let leaders = self.leaders();
        if leaders.is_empty() {
            write!(f, "Leader: none")
        } else {
            write!(f, "Leader: {}", join(&leaders, ", "))
        }
    }
}
