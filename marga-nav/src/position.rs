//! Grid position bookkeeping
//!
//! The pose is a pair of nodes, `(previous, current)`. Heading is never stored:
//! it is derived from the last committed move, so it cannot drift away from it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Arena intersection
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPoint {
    pub row: i32,
    pub col: i32,
}

impl GridPoint {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Node one more step in the direction `self - from`
    pub fn beyond(self, from: GridPoint) -> GridPoint {
        GridPoint::new(2 * self.row - from.row, 2 * self.col - from.col)
    }
}

impl fmt::Display for GridPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Cardinal direction; `Up` decreases the row and turns are clockwise
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up = 0,
    Right = 1,
    Down = 2,
    Left = 3,
    Unknown = 4,
}

impl Direction {
    /// Direction of the unit step `from -> to`
    pub fn between(from: GridPoint, to: GridPoint) -> Direction {
        match (to.row - from.row, to.col - from.col) {
            (-1, 0) => Direction::Up,
            (0, 1) => Direction::Right,
            (1, 0) => Direction::Down,
            (0, -1) => Direction::Left,
            _ => Direction::Unknown,
        }
    }

    pub fn index(self) -> i32 {
        self as i32
    }
}

/// Signed shortest turn in degrees
///
/// A reversal is reported as 180. `None` when either direction is unknown.
pub fn compute_turn(current: Direction, target: Direction) -> Option<i32> {
    if current == Direction::Unknown || target == Direction::Unknown {
        return None;
    }
    let quarters = (target.index() - current.index() + 2).rem_euclid(4) - 2;
    Some(if quarters == -2 { 180 } else { quarters * 90 })
}

/// Neighbors of the current node relative to the heading
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Neighbors {
    pub front: GridPoint,
    pub right: GridPoint,
    pub back: GridPoint,
    pub left: GridPoint,
}

/// Rover pose on the grid
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pose {
    pub previous: GridPoint,
    pub current: GridPoint,
}

impl Default for Pose {
    /// Node (0, 0), arrived from the staging side
    fn default() -> Self {
        Self::at_entrance(0)
    }
}

impl Pose {
    pub fn new(previous: GridPoint, current: GridPoint) -> Self {
        Self { previous, current }
    }

    /// `(row, 0)` having just come off the staging lane
    pub fn at_entrance(row: i32) -> Self {
        Self::new(GridPoint::new(row, -1), GridPoint::new(row, 0))
    }

    pub fn direction(&self) -> Direction {
        Direction::between(self.previous, self.current)
    }

    /// Front, right, back and left neighbors
    ///
    /// The base set faces `Up` and is rotated clockwise once per quarter turn
    /// of the heading. An unknown heading is treated as `Up`.
    pub fn neighbors(&self) -> Neighbors {
        let GridPoint { row, col } = self.current;
        let mut ring = [
            GridPoint::new(row - 1, col),
            GridPoint::new(row, col + 1),
            GridPoint::new(row + 1, col),
            GridPoint::new(row, col - 1),
        ];
        let turns = match self.direction() {
            Direction::Unknown => 0,
            d => d.index() as usize,
        };
        ring.rotate_left(turns);
        Neighbors {
            front: ring[0],
            right: ring[1],
            back: ring[2],
            left: ring[3],
        }
    }

    /// Degrees to turn to face the adjacent node `target`
    pub fn turn_towards(&self, target: GridPoint) -> Option<i32> {
        compute_turn(self.direction(), Direction::between(self.current, target))
    }

    /// Re-derive `previous` so the pose faces `target`
    pub fn face(&mut self, target: GridPoint) {
        self.previous = GridPoint::new(
            2 * self.current.row - target.row,
            2 * self.current.col - target.col,
        );
    }

    /// Commit a move to `next`
    pub fn advance_to(&mut self, next: GridPoint) {
        self.previous = self.current;
        self.current = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_from_pose() {
        assert_eq!(Pose::default().direction(), Direction::Right);
        let pose = Pose::new(GridPoint::new(2, 2), GridPoint::new(1, 2));
        assert_eq!(pose.direction(), Direction::Up);
        let pose = Pose::new(GridPoint::new(0, 0), GridPoint::new(2, 2));
        assert_eq!(pose.direction(), Direction::Unknown);
    }

    #[test]
    fn test_compute_turn_values() {
        use Direction::*;
        assert_eq!(compute_turn(Up, Down), Some(180));
        assert_eq!(compute_turn(Right, Left), Some(180));
        assert_eq!(compute_turn(Left, Up), Some(90));
        assert_eq!(compute_turn(Up, Left), Some(-90));
        assert_eq!(compute_turn(Right, Right), Some(0));
        assert_eq!(compute_turn(Unknown, Up), None);

        let all = [Up, Right, Down, Left];
        for &a in &all {
            for &b in &all {
                let t = compute_turn(a, b).unwrap();
                assert!([-180, -90, 0, 90, 180].contains(&t));
                // Turning by t lands on b modulo a full rotation
                assert_eq!((a.index() + t / 90).rem_euclid(4), b.index());
            }
        }
    }

    #[test]
    fn test_neighbors_rotate_with_heading() {
        let pose = Pose::default(); // facing right at (0,0)
        let n = pose.neighbors();
        assert_eq!(n.front, GridPoint::new(0, 1));
        assert_eq!(n.right, GridPoint::new(1, 0));
        assert_eq!(n.back, GridPoint::new(0, -1));
        assert_eq!(n.left, GridPoint::new(-1, 0));

        let pose = Pose::new(GridPoint::new(1, 3), GridPoint::new(2, 3)); // facing down
        let n = pose.neighbors();
        assert_eq!(n.front, GridPoint::new(3, 3));
        assert_eq!(n.right, GridPoint::new(2, 2));
        assert_eq!(n.left, GridPoint::new(2, 4));
    }

    #[test]
    fn test_face_and_advance() {
        let mut pose = Pose::default();
        let target = GridPoint::new(1, 0);
        assert_eq!(pose.turn_towards(target), Some(90));
        pose.face(target);
        assert_eq!(pose.direction(), Direction::Down);
        pose.advance_to(target);
        assert_eq!(pose.current, target);
        assert_eq!(pose.direction(), Direction::Down);
    }

    #[test]
    fn test_beyond() {
        let a = GridPoint::new(2, 2);
        let b = GridPoint::new(2, 3);
        assert_eq!(b.beyond(a), GridPoint::new(2, 4));
    }
}
