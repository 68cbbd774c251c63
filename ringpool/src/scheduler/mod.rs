//! Round scheduling.
//!
//! - `network` - the round loop: actions, delivery, barrier, quiescence
//! - `actions` - actions keyed by round
//! - `failure` - the failure queue drained at quiescence

pub mod actions;
pub mod failure;
pub mod network;

pub use actions::RoundActions;
pub use failure::FailureQueue;
pub use network::{RingNetwork, TickOutcome};
