//! # Topological Ordering
//!
//! Depth-first post-order over the combined control and value edges of a
//! function graph. Reversing the post-order gives a sequence where every
//! node comes after the nodes it reads values from.
//!
//! Every node is used as a root (in id order) so disconnected nodes are
//! still covered. A node is visited at most once, which guarantees
//! termination on cycles; edges back to a node that is still on the DFS
//! stack are recorded as [`BackEdge`]s so callers can report the cycle.

use super::function::{Links, Nodes};
use super::node::NodeId;
use std::collections::{BTreeMap, HashMap};

/// An edge that closes a cycle: `to` was still in progress when reached
/// from `from`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackEdge {
    pub from: NodeId,
    pub to: NodeId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Traversal {
    /// Reverse post-order: producers before consumers.
    pub order: Vec<NodeId>,
    pub back_edges: Vec<BackEdge>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// Successors of each node, in link-list order.
///
/// Links pointing at ids missing from `nodes` are skipped.
fn successors(nodes: &Nodes, links: &Links) -> BTreeMap<NodeId, Vec<NodeId>> {
    let mut adjacency: BTreeMap<NodeId, Vec<NodeId>> =
        nodes.keys().map(|id| (*id, Vec::new())).collect();

    for link in links {
        if !nodes.contains_key(&link.to.id) {
            continue;
        }
        if let Some(targets) = adjacency.get_mut(&link.from.id) {
            targets.push(link.to.id);
        }
    }

    adjacency
}

pub fn topo_sort(nodes: &Nodes, links: &Links) -> Traversal {
    let adjacency = successors(nodes, links);
    let mut marks: HashMap<NodeId, Mark> = HashMap::with_capacity(nodes.len());
    let mut post_order = Vec::with_capacity(nodes.len());
    let mut back_edges = Vec::new();

    // (node, index of the next successor to visit)
    let mut stack: Vec<(NodeId, usize)> = Vec::new();

    for &root in adjacency.keys() {
        if marks.contains_key(&root) {
            continue;
        }
        marks.insert(root, Mark::InProgress);
        stack.push((root, 0));

        while let Some(frame) = stack.last_mut() {
            let (id, next) = *frame;
            let targets = &adjacency[&id];

            if next < targets.len() {
                frame.1 += 1;
                let target = targets[next];
                match marks.get(&target) {
                    None => {
                        marks.insert(target, Mark::InProgress);
                        stack.push((target, 0));
                    }
                    Some(Mark::InProgress) => {
                        tracing::debug!("[TOPO] Cycle closed by edge {} -> {}", id, target);
                        back_edges.push(BackEdge { from: id, to: target });
                    }
                    Some(Mark::Done) => {}
                }
            } else {
                stack.pop();
                marks.insert(id, Mark::Done);
                post_order.push(id);
            }
        }
    }

    post_order.reverse();
    Traversal { order: post_order, back_edges }
}
