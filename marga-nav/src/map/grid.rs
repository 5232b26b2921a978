//! Discovered-knowledge graph over arena intersections
//!
//! Every adjacent pair of nodes shares one undirected edge, and the staging
//! sentinel is joined to each column-0 node by an entrance edge. Edges carry a
//! [`Knowledge`] state; only passable states have a cost, so the router cannot
//! accidentally add a blocked edge into a sum.

use crate::position::GridPoint;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Graph vertex: an intersection or the staging-lane entrance
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Node {
    Point(GridPoint),
    Staging,
}

impl Node {
    pub const fn at(row: i32, col: i32) -> Self {
        Node::Point(GridPoint::new(row, col))
    }

    pub fn point(self) -> Option<GridPoint> {
        match self {
            Node::Point(p) => Some(p),
            Node::Staging => None,
        }
    }
}

impl From<GridPoint> for Node {
    fn from(p: GridPoint) -> Self {
        Node::Point(p)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Point(p) => write!(f, "{}", p),
            Node::Staging => write!(f, "staging"),
        }
    }
}

/// Belief about one edge
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Knowledge {
    Unknown,
    Empty,
    /// Staging entrance
    Start,
    /// Retrievable block believed present
    Block,
    /// Invalid object, ignored until a full reset of the map is forced
    BlockWhite,
}

impl Knowledge {
    /// Traversal cost, `None` for impassable edges
    pub fn cost(self) -> Option<u32> {
        match self {
            Knowledge::Empty => Some(1),
            Knowledge::Unknown => Some(2),
            Knowledge::Start => Some(50),
            Knowledge::Block | Knowledge::BlockWhite => None,
        }
    }

    pub fn is_passable(self) -> bool {
        self.cost().is_some()
    }
}

/// Lateral sensor reading bucketed by range
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DistanceClass {
    NotFound,
    /// Block on the adjacent edge
    Near,
    /// Block on the edge after the adjacent one
    Medium,
}

/// Bucket a distance reading; zero means the sensor saw nothing
pub fn classify_distance(mm: u32, near_mm: u32, medium_mm: u32) -> DistanceClass {
    if mm == 0 {
        DistanceClass::NotFound
    } else if mm <= near_mm {
        DistanceClass::Near
    } else if mm <= medium_mm {
        DistanceClass::Medium
    } else {
        DistanceClass::NotFound
    }
}

type EdgeKey = (Node, Node);

fn edge_key(a: Node, b: Node) -> EdgeKey {
    if a <= b { (a, b) } else { (b, a) }
}

/// Arena knowledge graph
#[derive(Clone, Debug, PartialEq)]
pub struct GridMap {
    rows: i32,
    cols: i32,
    edges: BTreeMap<EdgeKey, Knowledge>,
    adjacency: BTreeMap<Node, Vec<Node>>,
}

impl GridMap {
    /// Fully unknown grid with entrance edges on column 0
    pub fn new(rows: usize, cols: usize) -> Self {
        let mut map = Self {
            rows: rows as i32,
            cols: cols as i32,
            edges: BTreeMap::new(),
            adjacency: BTreeMap::new(),
        };
        for r in 0..map.rows {
            for c in 0..map.cols {
                let here = Node::at(r, c);
                map.adjacency.entry(here).or_default();
                if c + 1 < map.cols {
                    map.insert_edge(here, Node::at(r, c + 1), Knowledge::Unknown);
                }
                if r + 1 < map.rows {
                    map.insert_edge(here, Node::at(r + 1, c), Knowledge::Unknown);
                }
            }
            map.insert_edge(Node::Staging, Node::at(r, 0), Knowledge::Start);
        }
        map
    }

    fn insert_edge(&mut self, a: Node, b: Node, knowledge: Knowledge) {
        self.edges.insert(edge_key(a, b), knowledge);
        self.adjacency.entry(a).or_default().push(b);
        self.adjacency.entry(b).or_default().push(a);
    }

    pub fn rows(&self) -> usize {
        self.rows as usize
    }

    pub fn cols(&self) -> usize {
        self.cols as usize
    }

    pub fn contains(&self, p: GridPoint) -> bool {
        (0..self.rows).contains(&p.row) && (0..self.cols).contains(&p.col)
    }

    /// Edges as `(a, b, knowledge)` with `a < b`
    pub fn edges(&self) -> impl Iterator<Item = (Node, Node, Knowledge)> + '_ {
        self.edges.iter().map(|(&(a, b), &k)| (a, b, k))
    }

    pub fn neighbors(&self, node: Node) -> &[Node] {
        self.adjacency.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn knowledge(&self, a: Node, b: Node) -> Option<Knowledge> {
        self.edges.get(&edge_key(a, b)).copied()
    }

    /// Overwrite an edge unconditionally. Returns `false` if there is no such edge.
    pub fn set_knowledge(&mut self, a: Node, b: Node, knowledge: Knowledge) -> bool {
        match self.edges.get_mut(&edge_key(a, b)) {
            Some(slot) => {
                *slot = knowledge;
                true
            }
            None => false,
        }
    }

    /// Sensor-driven update; leaves `BlockWhite` and missing edges alone
    pub fn update_knowledge(&mut self, a: Node, b: Node, knowledge: Knowledge) -> bool {
        match self.edges.get_mut(&edge_key(a, b)) {
            Some(Knowledge::BlockWhite) | None => false,
            Some(slot) => {
                *slot = knowledge;
                true
            }
        }
    }

    /// Fold one classified lateral reading from `current` toward `neighbor`
    pub fn apply_reading(&mut self, current: GridPoint, neighbor: GridPoint, class: DistanceClass) {
        let near = (Node::Point(current), Node::Point(neighbor));
        let far = (Node::Point(neighbor), Node::Point(neighbor.beyond(current)));
        match class {
            DistanceClass::Near => {
                self.update_knowledge(near.0, near.1, Knowledge::Block);
            }
            DistanceClass::Medium => {
                self.update_knowledge(near.0, near.1, Knowledge::Empty);
                self.update_knowledge(far.0, far.1, Knowledge::Block);
            }
            DistanceClass::NotFound => {
                self.update_knowledge(near.0, near.1, Knowledge::Empty);
                self.update_knowledge(far.0, far.1, Knowledge::Empty);
            }
        }
    }

    fn nodes_touching(&self, knowledge: Knowledge) -> BTreeSet<Node> {
        self.edges
            .iter()
            .filter(|(_, k)| **k == knowledge)
            .flat_map(|(&(a, b), _)| [a, b])
            .collect()
    }

    /// Pickup destinations: every node on a `Block` edge
    pub fn block_nodes(&self) -> BTreeSet<Node> {
        self.nodes_touching(Knowledge::Block)
    }

    /// Exploration destinations with their priority, highest first
    pub fn frontier_nodes(&self) -> Vec<(Node, usize)> {
        let mut frontier: Vec<(Node, usize)> = self
            .nodes_touching(Knowledge::Unknown)
            .into_iter()
            .map(|n| (n, self.frontier_priority(n)))
            .collect();
        frontier.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        frontier
    }

    /// Distinct nodes within two hops reachable over unknown edges
    ///
    /// A neighbor counts when its edge to `node` is unknown; the node one step
    /// further in the same direction counts when the neighbor's continuing
    /// edge is unknown.
    pub fn frontier_priority(&self, node: Node) -> usize {
        let mut seen = BTreeSet::new();
        for &next in self.neighbors(node) {
            if self.knowledge(node, next) == Some(Knowledge::Unknown) {
                seen.insert(next);
            }
            let (Node::Point(from), Node::Point(via)) = (node, next) else {
                continue;
            };
            let beyond = Node::Point(via.beyond(from));
            if self.knowledge(next, beyond) == Some(Knowledge::Unknown) {
                seen.insert(beyond);
            }
        }
        seen.len()
    }

    /// Forget everything except entrance edges and invalid blocks
    pub fn reset(&mut self) {
        for knowledge in self.edges.values_mut() {
            if !matches!(knowledge, Knowledge::Start | Knowledge::BlockWhite) {
                *knowledge = Knowledge::Unknown;
            }
        }
    }

    pub fn count(&self, knowledge: Knowledge) -> usize {
        self.edges.values().filter(|k| **k == knowledge).count()
    }
}
