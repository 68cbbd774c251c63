//! Per-node election and ring-repair state machine.
//!
//! `NodeState` is synchronous and owns everything a ring member knows about
//! itself. The network writes into its inbox and takes from its outbox; the
//! node's own task drains the inbox once per round. Nothing here blocks.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::error::{ElectionError, ElectionResult};
use crate::message::{Message, NodeId};
use crate::topology::{Links, NodeView, RingSnapshot};
use crate::trace::TraceEvent;

/// Externally visible election state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeStatus {
    /// Not taking part in an election.
    Idle,
    /// Participant that has not won.
    Candidate,
    /// Won an election.
    Leader,
    /// Failed or shut down.
    Inactive,
}

/// State of one ring member.
#[derive(Debug, Clone)]
pub struct NodeState {
    id: NodeId,
    participant: bool,
    leader: bool,
    active: bool,
    finished: bool,
    known_leader: Option<NodeId>,
    links: Links,
    inbox: VecDeque<Message>,
    outbox: VecDeque<Message>,
}

impl NodeState {
    /// Create an idle, active node with the given adjacency.
    pub fn new(id: NodeId, links: Links) -> Self {
        Self {
            id,
            participant: false,
            leader: false,
            active: true,
            finished: true,
            known_leader: None,
            links,
            inbox: VecDeque::new(),
            outbox: VecDeque::new(),
        }
    }

    /// Node id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Whether the node takes part in the current election.
    pub fn is_participant(&self) -> bool {
        self.participant
    }

    /// Whether the node has been elected.
    pub fn is_leader(&self) -> bool {
        self.leader
    }

    /// Whether the node is still running.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether inbox and outbox were both empty after the last drain.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Leader most recently announced to this node.
    pub fn known_leader(&self) -> Option<NodeId> {
        self.known_leader
    }

    /// Ring adjacency.
    pub fn links(&self) -> &Links {
        &self.links
    }

    /// Number of messages waiting to be processed.
    pub fn inbox_len(&self) -> usize {
        self.inbox.len()
    }

    /// Number of messages waiting to be delivered.
    pub fn outbox_len(&self) -> usize {
        self.outbox.len()
    }

    /// Derived election state.
    pub fn status(&self) -> NodeStatus {
        if !self.active {
            NodeStatus::Inactive
        } else if self.leader {
            NodeStatus::Leader
        } else if self.participant {
            NodeStatus::Candidate
        } else {
            NodeStatus::Idle
        }
    }

    /// Snapshot of this node for other nodes and for reports.
    pub fn view(&self) -> NodeView {
        NodeView {
            id: self.id,
            active: self.active,
            leader: self.leader,
            participant: self.participant,
            known_leader: self.known_leader,
            links: self.links.clone(),
        }
    }

    /// Announce this node's own id as a candidate.
    ///
    /// Always enqueues, whatever the current state; duplicate elections are
    /// resolved by the comparison rule when the messages meet.
    pub fn start_election(&mut self) {
        debug!(node = %self.id, "starting election");
        self.push_outbound(Message::Elect {
            initiator: self.id,
            candidate: self.id,
        });
    }

    /// Append a message to the inbox.
    pub fn deliver(&mut self, message: Message) {
        self.inbox.push_back(message);
        self.finished = false;
    }

    /// Remove the oldest outbound message for delivery.
    ///
    /// Sending an Elect message makes the sender a participant.
    pub fn take_outbound(&mut self) -> Option<Message> {
        let message = self.outbox.pop_front()?;
        if matches!(message, Message::Elect { .. }) {
            self.participant = true;
        }
        Some(message)
    }

    /// Stop the node. Pending messages are never processed.
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Drain the inbox, handling every queued message exactly once.
    ///
    /// `snapshot` is the between-round view of the ring used to look up a
    /// failed neighbor's last-known pointers. Returns the trace events
    /// produced while draining.
    pub fn process_inbox(
        &mut self,
        round: u64,
        snapshot: &RingSnapshot,
    ) -> ElectionResult<Vec<TraceEvent>> {
        let mut events = Vec::new();
        if !self.active {
            return Ok(events);
        }

        while let Some(message) = self.inbox.pop_front() {
            trace!(node = %self.id, round, %message, "handling message");
            events.push(TraceEvent::MessageReceived {
                round,
                node: self.id,
                message,
            });

            match message {
                Message::Elect {
                    initiator,
                    candidate,
                } => {
                    if let Some(elected) = self.on_elect(round, initiator, candidate) {
                        events.push(elected);
                    }
                }
                Message::Leader { initiator, leader } => self.on_leader(initiator, leader),
                Message::Fail { failed } => self.on_fail(failed, snapshot)?,
            }
        }

        self.finished = self.inbox.is_empty() && self.outbox.is_empty();
        Ok(events)
    }

    fn on_elect(&mut self, round: u64, initiator: NodeId, candidate: NodeId) -> Option<TraceEvent> {
        if !self.participant {
            self.participant = true;
            let carried = candidate.max(self.id);
            self.push_outbound(Message::Elect {
                initiator,
                candidate: carried,
            });
            return None;
        }

        if candidate == self.id {
            self.participant = false;
            self.leader = true;
            self.known_leader = Some(self.id);
            info!(node = %self.id, %initiator, round, "elected as leader");
            self.push_outbound(Message::Leader {
                initiator,
                leader: self.id,
            });
            return Some(TraceEvent::LeaderElected {
                round,
                node: self.id,
                initiator,
            });
        }

        if candidate > self.id {
            self.push_outbound(Message::Elect {
                initiator,
                candidate,
            });
        } else {
            trace!(node = %self.id, %candidate, "dropping beaten candidate");
        }
        None
    }

    fn on_leader(&mut self, initiator: NodeId, leader: NodeId) {
        if leader == self.id {
            // announcement made it around the ring
            return;
        }
        self.participant = false;
        self.known_leader = Some(leader);
        self.push_outbound(Message::Leader { initiator, leader });
    }

    fn on_fail(&mut self, failed: NodeId, snapshot: &RingSnapshot) -> ElectionResult<()> {
        if !self.links.neighbors.contains(&failed) {
            return Err(ElectionError::UnknownFailedNeighbor {
                node: self.id,
                failed,
            });
        }

        let (failed_previous, failed_next, failed_was_leader) = snapshot
            .get(failed)
            .map(|v| (v.links.previous, v.links.next, v.leader))
            .unwrap_or((None, None, false));

        let me = Some(self.id);
        if failed_previous == me && failed_next == me {
            // two-node ring: the survivor closes onto itself
            self.links.next = me;
            self.links.previous = me;
        } else {
            if failed_next == me {
                if let Some(previous) = failed_previous {
                    self.links.previous = Some(previous);
                    self.adopt_neighbor(previous);
                }
            }
            if failed_previous == me {
                if let Some(next) = failed_next {
                    self.links.next = Some(next);
                    self.adopt_neighbor(next);
                }
            }
        }

        self.links.neighbors.remove(&failed);
        debug!(
            node = %self.id,
            %failed,
            next = ?self.links.next,
            previous = ?self.links.previous,
            "repaired around failed neighbor"
        );

        if failed_was_leader {
            self.start_election();
        }
        Ok(())
    }

    fn adopt_neighbor(&mut self, node: NodeId) {
        if node != self.id {
            self.links.neighbors.insert(node);
        }
    }

    fn push_outbound(&mut self, message: Message) {
        self.outbox.push_back(message);
        self.finished = false;
    }
}
