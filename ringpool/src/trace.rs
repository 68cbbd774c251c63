//! Protocol trace: the human-readable record of a run.
//!
//! The trace is separate from diagnostic `tracing` output. The network emits
//! one [`TraceEvent`] per round start, received message, election and
//! failure, in round order, and hands each to a [`TraceSink`].

use std::cell::RefCell;
use std::fmt;
use std::io::{self, Write};
use std::rc::Rc;

use serde::Serialize;

use crate::message::{Message, NodeId};

/// A single trace entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TraceEvent {
    /// A new round began.
    RoundStarted {
        /// Round number, starting at 1.
        round: u64,
    },
    /// A node took a message from its inbox.
    MessageReceived {
        /// Round in which the message was handled.
        round: u64,
        /// Receiving node.
        node: NodeId,
        /// The message.
        message: Message,
    },
    /// A node saw its own id come back and became leader.
    LeaderElected {
        /// Round of the election.
        round: u64,
        /// The new leader.
        node: NodeId,
        /// Node that started the winning election.
        initiator: NodeId,
    },
    /// A node was failed by the scheduler.
    NodeFailed {
        /// Round at whose end the failure was injected.
        round: u64,
        /// The failed node.
        node: NodeId,
    },
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceEvent::RoundStarted { round } => write!(f, "-- Round {round} starting"),
            TraceEvent::MessageReceived { node, message, .. } => {
                write!(f, "Node {node} received {message}")
            }
            TraceEvent::LeaderElected {
                node, initiator, ..
            } => write!(f, "Node {node} is ELECTED as leader. Initiator: {initiator}"),
            TraceEvent::NodeFailed { node, .. } => write!(f, "Node {node} FAILED"),
        }
    }
}

/// Destination for trace events.
pub trait TraceSink {
    /// Record one event.
    fn record(&mut self, event: &TraceEvent);

    /// Flush buffered output.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Trace kept in memory, cheap to clone.
///
/// Clones share the same buffer, so a test can hand one clone to the network
/// and read the events back from another.
#[derive(Debug, Clone, Default)]
pub struct MemoryTrace {
    events: Rc<RefCell<Vec<TraceEvent>>>,
}

impl MemoryTrace {
    /// Create an empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// All events recorded so far.
    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.borrow().clone()
    }

    /// Events rendered as trace lines.
    pub fn lines(&self) -> Vec<String> {
        self.events.borrow().iter().map(ToString::to_string).collect()
    }

    /// Leaders in the order they were elected.
    pub fn elected(&self) -> Vec<NodeId> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                TraceEvent::LeaderElected { node, .. } => Some(*node),
                _ => None,
            })
            .collect()
    }
}

impl TraceSink for MemoryTrace {
    fn record(&mut self, event: &TraceEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}

/// Trace written line by line to any [`Write`] implementation.
///
/// Write errors are logged and do not interrupt the run.
#[derive(Debug)]
pub struct WriterTrace<W: Write> {
    writer: W,
}

impl<W: Write> WriterTrace<W> {
    /// Wrap a writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl WriterTrace<io::BufWriter<std::fs::File>> {
    /// Create (or truncate) a trace file.
    pub fn create(path: impl AsRef<std::path::Path>) -> io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(io::BufWriter::new(file)))
    }
}

impl<W: Write> TraceSink for WriterTrace<W> {
    fn record(&mut self, event: &TraceEvent) {
        if let Err(e) = writeln!(self.writer, "{event}") {
            tracing::warn!("unable to write trace line: {}", e);
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Trace that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTrace;

impl TraceSink for NullTrace {
    fn record(&mut self, _event: &TraceEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_trace_clones_share_events() {
        let trace = MemoryTrace::new();
        let mut sink = trace.clone();

        sink.record(&TraceEvent::RoundStarted { round: 1 });
        sink.record(&TraceEvent::LeaderElected {
            round: 4,
            node: NodeId(6),
            initiator: NodeId(3),
        });

        assert_eq!(trace.events().len(), 2);
        assert_eq!(trace.elected(), vec![NodeId(6)]);
        assert_eq!(
            trace.lines(),
            vec![
                "-- Round 1 starting".to_string(),
                "Node 6 is ELECTED as leader. Initiator: 3".to_string(),
            ]
        );
    }

    #[test]
    fn writer_trace_emits_one_line_per_event() {
        let mut sink = WriterTrace::new(Vec::new());
        sink.record(&TraceEvent::MessageReceived {
            round: 2,
            node: NodeId(4),
            message: Message::Elect {
                initiator: NodeId(3),
                candidate: NodeId(3),
            },
        });
        sink.record(&TraceEvent::NodeFailed {
            round: 9,
            node: NodeId(3),
        });
        sink.flush().expect("flush to memory");

        let text = String::from_utf8(sink.into_inner()).expect("utf-8 trace");
        assert_eq!(
            text,
            "Node 4 received election message with id 3. Initiator: 3\nNode 3 FAILED\n"
        );
    }
}
