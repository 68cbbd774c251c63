//! Task wrapper that runs a node's processing loop.
//!
//! Each active node runs in its own `spawn_local` task. The network hands it
//! a [`RoundStep`] once per round and waits for the reply, which makes the
//! reply the round barrier: quiescence is only evaluated after every node
//! has drained what was delivered to it.

use std::cell::RefCell;
use std::rc::Rc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::{ElectionError, ElectionResult};
use crate::message::NodeId;
use crate::topology::RingSnapshot;
use crate::trace::TraceEvent;

use super::state::NodeState;

/// Outcome of one node's round.
pub(crate) type StepOutcome = ElectionResult<Vec<TraceEvent>>;

/// Instruction to process everything currently in the inbox.
pub(crate) struct RoundStep {
    pub(crate) round: u64,
    pub(crate) snapshot: Rc<RingSnapshot>,
    pub(crate) reply: oneshot::Sender<StepOutcome>,
}

/// The network's handle on a running node.
pub(crate) struct NodeHandle {
    id: NodeId,
    state: Rc<RefCell<NodeState>>,
    steps: Option<mpsc::UnboundedSender<RoundStep>>,
    task: Option<JoinHandle<()>>,
}

impl NodeHandle {
    /// Wrap a node that has not been started yet.
    pub(crate) fn new(state: NodeState) -> Self {
        Self {
            id: state.id(),
            state: Rc::new(RefCell::new(state)),
            steps: None,
            task: None,
        }
    }

    pub(crate) fn id(&self) -> NodeId {
        self.id
    }

    pub(crate) fn state(&self) -> &Rc<RefCell<NodeState>> {
        &self.state
    }

    /// Spawn the processing task. Must run inside a `LocalSet`.
    pub(crate) fn start(&mut self) {
        if self.task.is_some() || !self.state.borrow().is_active() {
            return;
        }
        let (tx, rx) = mpsc::unbounded_channel();
        let state = Rc::clone(&self.state);
        self.task = Some(tokio::task::spawn_local(run_node(state, rx)));
        self.steps = Some(tx);
    }

    /// Ask the node to process one round and return the reply channel.
    pub(crate) fn step(
        &self,
        round: u64,
        snapshot: Rc<RingSnapshot>,
    ) -> ElectionResult<oneshot::Receiver<StepOutcome>> {
        let steps = self
            .steps
            .as_ref()
            .ok_or(ElectionError::NodeTaskGone(self.id))?;
        let (reply, receiver) = oneshot::channel();
        steps
            .send(RoundStep {
                round,
                snapshot,
                reply,
            })
            .map_err(|_| ElectionError::NodeTaskGone(self.id))?;
        Ok(receiver)
    }

    /// Mark the node inactive and close its step channel.
    pub(crate) fn stop(&mut self) {
        self.state.borrow_mut().deactivate();
        self.steps = None;
    }

    /// Wait for the processing task to exit after [`stop`](Self::stop).
    pub(crate) async fn join(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(node = %self.id, "node task ended abnormally: {}", e);
            }
        }
    }
}

async fn run_node(state: Rc<RefCell<NodeState>>, mut steps: mpsc::UnboundedReceiver<RoundStep>) {
    let id = state.borrow().id();

    while let Some(step) = steps.recv().await {
        let outcome = state
            .borrow_mut()
            .process_inbox(step.round, &step.snapshot);
        if step.reply.send(outcome).is_err() {
            break;
        }
        if !state.borrow().is_active() {
            break;
        }
    }

    debug!(node = %id, "node finished");
}
