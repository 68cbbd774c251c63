//! Ring topology: directed `next`/`previous` pointers plus undirected
//! neighbor sets, addressed by [`NodeId`].
//!
//! The live pointers belong to each node's [`NodeState`](crate::node::NodeState)
//! and are only rewritten by that node while it handles a failure notice.
//! Everything else reads a [`RingSnapshot`] captured by the network between
//! rounds.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::TopologyError;
use crate::message::NodeId;
use crate::scenario::Scenario;

/// Adjacency of a single node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Links {
    /// Ring successor; Elect and Leader messages travel this way.
    pub next: Option<NodeId>,
    /// Ring predecessor.
    pub previous: Option<NodeId>,
    /// Nodes that receive this node's failure notice.
    pub neighbors: BTreeSet<NodeId>,
}

impl Links {
    /// Links of a node that belongs to no ring.
    pub fn isolated() -> Self {
        Self::default()
    }
}

/// Build the initial adjacency of every node referenced by a scenario.
///
/// Declaration order defines the ring: each declared node's `next` is the
/// following declaration and the last one wraps to the first. Neighbor sets
/// are made undirected, and ring successors and predecessors are always
/// neighbors so that a failure notice reaches both sides of the gap.
/// Nodes that are referenced but never declared stay isolated.
pub fn initial_links(scenario: &Scenario) -> BTreeMap<NodeId, Links> {
    let mut links: BTreeMap<NodeId, Links> = scenario
        .nodes()
        .iter()
        .map(|id| (*id, Links::isolated()))
        .collect();

    let order: Vec<NodeId> = scenario.declarations().iter().map(|d| d.node).collect();
    let mut edges = Vec::new();

    for declaration in scenario.declarations() {
        for neighbor in &declaration.neighbors {
            edges.push((declaration.node, *neighbor));
        }
    }

    for (index, node) in order.iter().enumerate() {
        let next = order[(index + 1) % order.len()];
        if let Some(entry) = links.get_mut(node) {
            entry.next = Some(next);
        }
        if let Some(entry) = links.get_mut(&next) {
            entry.previous = Some(*node);
        }
        edges.push((*node, next));
    }

    for (a, b) in edges {
        if a == b {
            continue;
        }
        if let Some(entry) = links.get_mut(&a) {
            entry.neighbors.insert(b);
        }
        if let Some(entry) = links.get_mut(&b) {
            entry.neighbors.insert(a);
        }
    }

    links
}

/// Point-in-time view of one node, as seen by other nodes between rounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeView {
    /// Node id.
    pub id: NodeId,
    /// Whether the node was active when the view was taken.
    pub active: bool,
    /// Whether the node holds leadership.
    pub leader: bool,
    /// Whether the node takes part in an ongoing election.
    pub participant: bool,
    /// Last leader announced to this node, if any.
    pub known_leader: Option<NodeId>,
    /// Adjacency.
    pub links: Links,
}

/// Consistent view of every node, captured by the network between rounds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingSnapshot {
    nodes: BTreeMap<NodeId, NodeView>,
}

impl RingSnapshot {
    /// Build a snapshot from node views.
    pub fn new(views: impl IntoIterator<Item = NodeView>) -> Self {
        Self {
            nodes: views.into_iter().map(|v| (v.id, v)).collect(),
        }
    }

    /// View of a single node.
    pub fn get(&self, id: NodeId) -> Option<&NodeView> {
        self.nodes.get(&id)
    }

    /// All views ordered by id.
    pub fn iter(&self) -> impl Iterator<Item = &NodeView> {
        self.nodes.values()
    }

    /// Ids of nodes that were active.
    pub fn active_ids(&self) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|v| v.active)
            .map(|v| v.id)
            .collect()
    }

    /// Ids of active nodes that hold leadership.
    pub fn leaders(&self) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|v| v.active && v.leader)
            .map(|v| v.id)
            .collect()
    }

    /// Walk `next` pointers from the smallest active id and return the ring.
    ///
    /// Succeeds only when the active nodes form exactly one cycle and no
    /// active node points at an inactive or unknown node. A lone active node
    /// is a valid ring whether it points at itself or at nothing.
    pub fn ring_order(&self) -> Result<Vec<NodeId>, TopologyError> {
        let active = self.active_ids();
        let Some(&start) = active.first() else {
            return Ok(Vec::new());
        };

        if active.len() == 1 {
            return match self.nodes[&start].links.next {
                None => Ok(vec![start]),
                Some(next) if next == start => Ok(vec![start]),
                Some(target) => Err(TopologyError::DanglingPointer {
                    node: start,
                    target,
                }),
            };
        }

        let mut order = vec![start];
        let mut seen = BTreeSet::from([start]);
        let mut current = start;

        loop {
            let next = self.nodes[&current]
                .links
                .next
                .ok_or(TopologyError::MissingSuccessor(current))?;

            match self.nodes.get(&next) {
                Some(view) if view.active => {}
                _ => {
                    return Err(TopologyError::DanglingPointer {
                        node: current,
                        target: next,
                    })
                }
            }

            if next == start {
                break;
            }
            if !seen.insert(next) {
                break;
            }
            order.push(next);
            current = next;
        }

        let last = order[order.len() - 1];
        if order.len() != active.len() || self.nodes[&last].links.next != Some(start) {
            return Err(TopologyError::BrokenRing {
                start,
                visited: order.len(),
                active: active.len(),
            });
        }

        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(id: u64, next: Option<u64>, active: bool) -> NodeView {
        NodeView {
            id: NodeId(id),
            active,
            leader: false,
            participant: false,
            known_leader: None,
            links: Links {
                next: next.map(NodeId),
                previous: None,
                neighbors: BTreeSet::new(),
            },
        }
    }

    #[test]
    fn initial_links_follow_declaration_order() {
        let scenario = Scenario::ring(&[1, 2, 3, 4])
            .build()
            .expect("valid scenario");
        let links = initial_links(&scenario);

        assert_eq!(links[&NodeId(1)].next, Some(NodeId(2)));
        assert_eq!(links[&NodeId(4)].next, Some(NodeId(1)));
        assert_eq!(links[&NodeId(1)].previous, Some(NodeId(4)));
        assert_eq!(
            links[&NodeId(1)].neighbors,
            BTreeSet::from([NodeId(2), NodeId(4)])
        );
    }

    #[test]
    fn neighbors_are_made_undirected() {
        let scenario = Scenario::builder()
            .declare(1, &[2])
            .declare(2, &[])
            .declare(3, &[])
            .build()
            .expect("valid scenario");
        let links = initial_links(&scenario);

        assert!(links[&NodeId(2)].neighbors.contains(&NodeId(1)));
        // ring adjacency 3 -> 1 always implies neighborship
        assert!(links[&NodeId(1)].neighbors.contains(&NodeId(3)));
    }

    #[test]
    fn single_declared_node_points_at_itself() {
        let scenario = Scenario::builder()
            .declare(7, &[])
            .build()
            .expect("valid scenario");
        let links = initial_links(&scenario);

        assert_eq!(links[&NodeId(7)].next, Some(NodeId(7)));
        assert!(links[&NodeId(7)].neighbors.is_empty());
    }

    #[test]
    fn ring_order_detects_two_cycles() {
        let snapshot = RingSnapshot::new([
            view(1, Some(2), true),
            view(2, Some(1), true),
            view(3, Some(4), true),
            view(4, Some(3), true),
        ]);

        assert_eq!(
            snapshot.ring_order(),
            Err(TopologyError::BrokenRing {
                start: NodeId(1),
                visited: 2,
                active: 4,
            })
        );
    }

    #[test]
    fn ring_order_rejects_pointer_to_failed_node() {
        let snapshot = RingSnapshot::new([
            view(1, Some(2), true),
            view(2, Some(3), true),
            view(3, Some(1), false),
        ]);

        assert_eq!(
            snapshot.ring_order(),
            Err(TopologyError::DanglingPointer {
                node: NodeId(2),
                target: NodeId(3),
            })
        );
    }

    #[test]
    fn ring_order_walks_active_cycle() {
        let snapshot = RingSnapshot::new([
            view(1, Some(2), true),
            view(2, Some(4), true),
            view(3, Some(4), false),
            view(4, Some(1), true),
        ]);

        assert_eq!(
            snapshot.ring_order(),
            Ok(vec![NodeId(1), NodeId(2), NodeId(4)])
        );
    }

    #[test]
    fn lone_survivor_is_a_ring() {
        let snapshot = RingSnapshot::new([view(5, Some(5), true), view(6, Some(5), false)]);
        assert_eq!(snapshot.ring_order(), Ok(vec![NodeId(5)]));
    }
}
