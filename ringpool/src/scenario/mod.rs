//! Scenario input: the initial ring and the per-round action list.
//!
//! A [`Scenario`] is validated data. It is produced either by the text
//! [`parser`], by [`ScenarioBuilder`], or by the seeded generators in
//! [`random`], and consumed by [`RingNetwork`](crate::RingNetwork).

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ScenarioError;
use crate::message::NodeId;

pub mod parser;
pub mod random;

/// One line of ring declaration: a node and its initial neighbors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingDeclaration {
    /// Declared node.
    pub node: NodeId,
    /// Neighbors listed for the node.
    pub neighbors: Vec<NodeId>,
}

/// What happens when an action's round is reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    /// Every listed node starts an election.
    StartElection {
        /// Initiating nodes.
        nodes: Vec<NodeId>,
    },
    /// Queue the node for failure at the next quiescence point.
    ScheduleFailure {
        /// Node to fail.
        node: NodeId,
    },
}

/// An action keyed by round number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Round in which the action applies. Always at least 1.
    pub round: u64,
    /// The action.
    pub kind: ActionKind,
}

/// A validated simulation input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    declarations: Vec<RingDeclaration>,
    actions: Vec<Action>,
    nodes: BTreeSet<NodeId>,
}

impl Scenario {
    /// Start building a scenario.
    pub fn builder() -> ScenarioBuilder {
        ScenarioBuilder::default()
    }

    /// Builder pre-filled with a ring in the given order, each node listing
    /// its predecessor and successor as neighbors.
    pub fn ring(ids: &[u64]) -> ScenarioBuilder {
        let mut builder = ScenarioBuilder::default();
        let n = ids.len();
        for (index, id) in ids.iter().enumerate() {
            let neighbors: Vec<u64> = if n < 2 {
                Vec::new()
            } else {
                let previous = ids[(index + n - 1) % n];
                let next = ids[(index + 1) % n];
                if previous == next {
                    vec![next]
                } else {
                    vec![previous, next]
                }
            };
            builder = builder.declare(*id, &neighbors);
        }
        builder
    }

    /// Parse a scenario script.
    pub fn parse(text: &str) -> Result<Self, ScenarioError> {
        parser::parse(text)
    }

    /// Read and parse a scenario script from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Ring declarations in input order.
    pub fn declarations(&self) -> &[RingDeclaration] {
        &self.declarations
    }

    /// Scheduled actions in input order.
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Every node referenced anywhere in the scenario.
    pub fn nodes(&self) -> &BTreeSet<NodeId> {
        &self.nodes
    }
}

/// Incremental scenario construction.
///
/// Nodes are created the first time they are referenced, whether by a
/// declaration, a neighbor list or an action.
#[derive(Debug, Clone, Default)]
pub struct ScenarioBuilder {
    declarations: Vec<RingDeclaration>,
    actions: Vec<Action>,
    nodes: BTreeSet<NodeId>,
}

impl ScenarioBuilder {
    /// Declare a ring member. Declaring the same node again merges the
    /// neighbor lists and keeps its original ring position.
    pub fn declare(mut self, id: u64, neighbors: &[u64]) -> Self {
        let node = NodeId(id);
        let neighbors: Vec<NodeId> = neighbors.iter().copied().map(NodeId).collect();
        self.nodes.insert(node);
        self.nodes.extend(neighbors.iter().copied());

        match self.declarations.iter_mut().find(|d| d.node == node) {
            Some(existing) => {
                for neighbor in neighbors {
                    if !existing.neighbors.contains(&neighbor) {
                        existing.neighbors.push(neighbor);
                    }
                }
            }
            None => self.declarations.push(RingDeclaration { node, neighbors }),
        }
        self
    }

    /// Start elections at `nodes` in `round`.
    pub fn elect(mut self, round: u64, nodes: &[u64]) -> Self {
        let nodes: Vec<NodeId> = nodes.iter().copied().map(NodeId).collect();
        self.nodes.extend(nodes.iter().copied());
        self.actions.push(Action {
            round,
            kind: ActionKind::StartElection { nodes },
        });
        self
    }

    /// Schedule a failure of `node` from `round` on.
    pub fn fail(mut self, round: u64, node: u64) -> Self {
        let node = NodeId(node);
        self.nodes.insert(node);
        self.actions.push(Action {
            round,
            kind: ActionKind::ScheduleFailure { node },
        });
        self
    }

    /// Declared ring members in ring order.
    pub fn declared(&self) -> Vec<NodeId> {
        self.declarations.iter().map(|d| d.node).collect()
    }

    /// Validate and finish.
    pub fn build(self) -> Result<Scenario, ScenarioError> {
        if let Some(action) = self.actions.iter().find(|a| a.round == 0) {
            return Err(ScenarioError::InvalidRound {
                line: 0,
                round: action.round,
            });
        }

        Ok(Scenario {
            declarations: self.declarations,
            actions: self.actions,
            nodes: self.nodes,
        })
    }
}
