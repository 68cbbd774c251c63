//! Error types for ring election runs, topology checks and scenario parsing.

use thiserror::Error;

use crate::message::NodeId;

/// Errors that abort a simulation run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ElectionError {
    /// A node received a failure notice for a node it does not know as a
    /// neighbor. This means the topology was corrupted upstream.
    #[error("node {node} received a failure notice for {failed}, which is not one of its neighbors")]
    UnknownFailedNeighbor {
        /// The node that received the notice.
        node: NodeId,
        /// The failed node named in the notice.
        failed: NodeId,
    },

    /// An operation referenced a node the network does not own.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    /// The run did not reach quiescence within the configured round budget.
    #[error("run did not terminate within {limit} rounds")]
    RoundLimitExceeded {
        /// The configured limit.
        limit: u64,
    },

    /// A node task stopped answering round steps while still active.
    #[error("task for node {0} is gone")]
    NodeTaskGone(NodeId),

    /// The async runtime driving the node tasks could not be built.
    #[error("runtime error: {0}")]
    Runtime(String),

    /// The ring failed a structural check.
    #[error("topology error: {0}")]
    Topology(#[from] TopologyError),
}

/// Structural problems with the ring.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    /// Walking `next` pointers did not visit every active node exactly once.
    #[error("ring starting at {start} covers {visited} of {active} active nodes")]
    BrokenRing {
        /// Node the walk started from.
        start: NodeId,
        /// Number of distinct nodes visited before the walk closed.
        visited: usize,
        /// Number of active nodes.
        active: usize,
    },

    /// An active node points at a node that is inactive or unknown.
    #[error("node {node} points at {target}, which is not an active node")]
    DanglingPointer {
        /// Node holding the pointer.
        node: NodeId,
        /// Pointer target.
        target: NodeId,
    },

    /// An active node has no successor while other nodes are active.
    #[error("node {0} has no successor")]
    MissingSuccessor(NodeId),
}

/// Errors produced while reading or building a scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// A token that should be an integer is not.
    #[error("line {line}: '{token}' is not a valid integer")]
    InvalidInteger {
        /// 1-based line number.
        line: usize,
        /// Offending token.
        token: String,
    },

    /// A directive is missing a required argument.
    #[error("line {line}: {directive} is missing an argument")]
    MissingArgument {
        /// 1-based line number.
        line: usize,
        /// Directive name.
        directive: String,
    },

    /// Rounds start at 1; actions for earlier rounds would never fire.
    #[error("line {line}: round {round} is invalid, rounds start at 1")]
    InvalidRound {
        /// 1-based line number, 0 for programmatic scenarios.
        line: usize,
        /// Offending round.
        round: u64,
    },

    /// A configuration file is not valid JSON for the expected shape.
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),

    /// The script could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A type alias for `Result<T, ElectionError>`.
pub type ElectionResult<T> = Result<T, ElectionError>;
