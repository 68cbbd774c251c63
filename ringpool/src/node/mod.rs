//! Ring members.
//!
//! - `state` - the synchronous election and repair state machine
//! - `actor` - the task that runs one node and answers round steps

pub(crate) mod actor;
pub mod state;

pub use state::{NodeState, NodeStatus};
