//! Message protocol exchanged between ring members.
//!
//! The protocol is closed: there are exactly three message kinds. No
//! handler in [`crate::node`] emits more than one outbound message per
//! inbound message.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a ring member.
///
/// Ids are totally ordered; the ordering is the election comparison key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Create a new node id.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw integer value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A protocol message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    /// Election in progress, carrying the largest id seen so far.
    Elect {
        /// Node that started this election.
        initiator: NodeId,
        /// Candidate id currently being propagated.
        candidate: NodeId,
    },
    /// Announcement of the elected leader.
    Leader {
        /// Node that started the election that produced this leader.
        initiator: NodeId,
        /// The elected leader.
        leader: NodeId,
    },
    /// A neighbor has failed and the ring must be repaired around it.
    Fail {
        /// The node that failed.
        failed: NodeId,
    },
}

impl Message {
    /// The kind of this message, used for delivery accounting.
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Elect { .. } => MessageKind::Elect,
            Message::Leader { .. } => MessageKind::Leader,
            Message::Fail { .. } => MessageKind::Fail,
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Elect {
                initiator,
                candidate,
            } => write!(
                f,
                "election message with id {candidate}. Initiator: {initiator}"
            ),
            Message::Leader { initiator, leader } => {
                write!(f, "leader message with id {leader}. Initiator: {initiator}")
            }
            Message::Fail { failed } => write!(f, "failure notice for node {failed}"),
        }
    }
}

/// Discriminant of [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    /// [`Message::Elect`]
    Elect,
    /// [`Message::Leader`]
    Leader,
    /// [`Message::Fail`]
    Fail,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_ids_order_by_value() {
        assert!(NodeId(6) > NodeId(5));
        assert_eq!(NodeId::from(3), NodeId::new(3));
        assert_eq!(NodeId(42).get(), 42);
    }

    #[test]
    fn display_matches_trace_text() {
        let elect = Message::Elect {
            initiator: NodeId(3),
            candidate: NodeId(6),
        };
        assert_eq!(
            elect.to_string(),
            "election message with id 6. Initiator: 3"
        );
        assert_eq!(elect.kind(), MessageKind::Elect);

        let leader = Message::Leader {
            initiator: NodeId(3),
            leader: NodeId(6),
        };
        assert_eq!(leader.to_string(), "leader message with id 6. Initiator: 3");
        assert_eq!(Message::Fail { failed: NodeId(2) }.kind(), MessageKind::Fail);
    }
}
