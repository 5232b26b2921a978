//! Shortest routes over passable edges
//!
//! Dijkstra from the rover's node. `Block` and `BlockWhite` edges have no cost
//! and are never relaxed, so a route can end next to a block but never cross it.

use super::grid::{GridMap, Node};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};

/// Open-set entry ordered as a min-heap on cost
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct QueueEntry {
    cost: u32,
    node: Node,
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (lower cost = higher priority)
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Costs and predecessors of every node reachable from `origin`
fn search(map: &GridMap, origin: Node) -> (BTreeMap<Node, u32>, BTreeMap<Node, Node>) {
    let mut dist = BTreeMap::new();
    let mut prev = BTreeMap::new();
    let mut open = BinaryHeap::new();

    dist.insert(origin, 0);
    open.push(QueueEntry {
        cost: 0,
        node: origin,
    });

    while let Some(QueueEntry { cost, node }) = open.pop() {
        if dist.get(&node).is_some_and(|&best| cost > best) {
            continue;
        }
        for &next in map.neighbors(node) {
            let Some(step) = map.knowledge(node, next).and_then(|k| k.cost()) else {
                continue;
            };
            let candidate = cost + step;
            if dist.get(&next).is_none_or(|&best| candidate < best) {
                dist.insert(next, candidate);
                prev.insert(next, node);
                open.push(QueueEntry {
                    cost: candidate,
                    node: next,
                });
            }
        }
    }

    (dist, prev)
}

fn unwind(prev: &BTreeMap<Node, Node>, origin: Node, target: Node) -> Vec<Node> {
    let mut path = vec![target];
    let mut node = target;
    while node != origin {
        match prev.get(&node) {
            Some(&p) => {
                path.push(p);
                node = p;
            }
            None => break,
        }
    }
    path.reverse();
    path
}

/// Shortest path to the cheapest reachable destination
///
/// `destinations` pairs each candidate with a priority; among equally cheap
/// candidates the higher priority wins, then the lower node. The origin is
/// never a destination. The path starts at `origin` and ends at the chosen node.
pub fn nearest(map: &GridMap, origin: Node, destinations: &[(Node, usize)]) -> Option<Vec<Node>> {
    if destinations.is_empty() {
        return None;
    }
    let (dist, prev) = search(map, origin);

    let (_, _, target) = destinations
        .iter()
        .filter(|(node, _)| *node != origin)
        .filter_map(|&(node, priority)| dist.get(&node).map(|&cost| (cost, priority, node)))
        .min_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)).then(a.2.cmp(&b.2)))?;

    Some(unwind(&prev, origin, target))
}

/// Route toward the closest node touching a `Block` edge
pub fn to_blocks(map: &GridMap, origin: Node) -> Option<Vec<Node>> {
    let targets: Vec<(Node, usize)> = map.block_nodes().into_iter().map(|n| (n, 0)).collect();
    nearest(map, origin, &targets)
}

/// Route toward the best frontier node
pub fn to_frontier(map: &GridMap, origin: Node) -> Option<Vec<Node>> {
    nearest(map, origin, &map.frontier_nodes())
}

/// Route to the staging sentinel
pub fn to_staging(map: &GridMap, origin: Node) -> Option<Vec<Node>> {
    nearest(map, origin, &[(Node::Staging, 0)])
}
