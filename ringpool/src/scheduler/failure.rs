//! Queue of pending node failures.

use std::collections::VecDeque;

use crate::message::NodeId;

/// FIFO of nodes waiting to fail.
///
/// The network pops at most one entry per quiescence point, so failures are
/// never resolved concurrently with each other or with an election.
#[derive(Debug, Clone, Default)]
pub struct FailureQueue {
    pending: VecDeque<NodeId>,
}

impl FailureQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a failure.
    pub fn schedule(&mut self, node: NodeId) {
        self.pending.push_back(node);
    }

    /// Take the oldest pending failure.
    pub fn pop(&mut self) -> Option<NodeId> {
        self.pending.pop_front()
    }

    /// Number of pending failures.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_come_out_in_schedule_order() {
        let mut queue = FailureQueue::new();
        queue.schedule(NodeId(3));
        queue.schedule(NodeId(1));

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop(), Some(NodeId(3)));
        assert_eq!(queue.pop(), Some(NodeId(1)));
        assert!(queue.is_empty());
        assert_eq!(queue.pop(), None);
    }
}
