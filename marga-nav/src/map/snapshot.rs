//! Read-only map export
//!
//! A snapshot is plain data: the edge list with knowledge states plus the
//! rover pose. Restoring one builds a fresh map, it never mutates a live one.

use super::grid::{GridMap, Knowledge, Node};
use crate::error::{NavError, Result};
use crate::position::{Direction, Pose};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub a: Node,
    pub b: Node,
    pub knowledge: Knowledge,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapSnapshot {
    pub rows: usize,
    pub cols: usize,
    pub edges: Vec<EdgeRecord>,
    pub position: Pose,
    pub direction: Direction,
}

impl GridMap {
    pub fn snapshot(&self, pose: &Pose) -> MapSnapshot {
        MapSnapshot {
            rows: self.rows(),
            cols: self.cols(),
            edges: self
                .edges()
                .map(|(a, b, knowledge)| EdgeRecord { a, b, knowledge })
                .collect(),
            position: *pose,
            direction: pose.direction(),
        }
    }
}

impl MapSnapshot {
    /// Rebuild the map and pose; edges the grid does not have are an error
    pub fn restore(&self) -> Result<(GridMap, Pose)> {
        let mut map = GridMap::new(self.rows, self.cols);
        for edge in &self.edges {
            if !map.set_knowledge(edge.a, edge.b, edge.knowledge) {
                return Err(NavError::Config(format!(
                    "snapshot edge {}-{} is not part of a {}x{} grid",
                    edge.a, edge.b, self.rows, self.cols
                )));
            }
        }
        Ok((map, self.position))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::GridPoint;

    #[test]
    fn test_snapshot_round_trip() {
        let mut map = GridMap::new(5, 6);
        map.set_knowledge(Node::at(0, 0), Node::at(1, 0), Knowledge::Block);
        map.set_knowledge(Node::at(2, 2), Node::at(2, 3), Knowledge::BlockWhite);
        map.set_knowledge(Node::at(0, 0), Node::at(0, 1), Knowledge::Empty);
        let pose = Pose::new(GridPoint::new(1, 1), GridPoint::new(1, 2));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/map.json");
        map.snapshot(&pose).save(&path).unwrap();

        let snapshot = MapSnapshot::load(&path).unwrap();
        assert_eq!(snapshot.direction, Direction::Right);
        let (restored, restored_pose) = snapshot.restore().unwrap();
        assert_eq!(restored, map);
        assert_eq!(restored_pose, pose);
    }

    #[test]
    fn test_restore_rejects_foreign_edges() {
        let mut snapshot = GridMap::new(2, 2).snapshot(&Pose::default());
        snapshot.edges.push(EdgeRecord {
            a: Node::at(0, 0),
            b: Node::at(1, 1),
            knowledge: Knowledge::Empty,
        });
        assert!(matches!(snapshot.restore(), Err(NavError::Config(_))));
    }
}
