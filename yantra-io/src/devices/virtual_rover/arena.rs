//! Arena grid with hidden blocks
//!
//! Nodes are `(row, col)` intersections; blocks sit on the edges between them.
//! The rover pose is a pair of nodes and its heading is derived from their
//! difference, the same way the mission layer tracks it.

use super::config::BlockPlacement;
use super::noise::WorldNoise;
use crate::color::classify_block;
use crate::core::types::{Color, Hsv, LateralDistances, Rgbc};
use crate::error::{Error, Result};
use std::collections::HashMap;

pub(crate) type Cell = (i32, i32);
type EdgeKey = (Cell, Cell);

/// Lateral sensor reading with a block on the adjacent edge
pub const NEAR_READING_MM: u32 = 200;
/// Lateral sensor reading with a block one edge further out
pub const FAR_READING_MM: u32 = 500;
/// Lateral sensor reading with nothing in range
pub const CLEAR_READING_MM: u32 = 1000;

fn edge_key(a: Cell, b: Cell) -> EdgeKey {
    if a <= b { (a, b) } else { (b, a) }
}

/// Unit step for a heading index (0 up, 1 right, 2 down, 3 left)
fn heading_delta(heading: u8) -> Cell {
    match heading % 4 {
        0 => (-1, 0),
        1 => (0, 1),
        2 => (1, 0),
        _ => (0, -1),
    }
}

/// Claw sensor reading a block of the given color would produce
fn block_reading(color: Color) -> (Hsv, Rgbc) {
    match color {
        Color::Yellow => (Hsv::new(40.0, 150.0, 200.0), Rgbc::new(6000, 5200, 1500, 9000)),
        Color::White => (Hsv::new(0.0, 0.0, 250.0), Rgbc::new(8000, 8000, 8000, 25_000)),
        Color::Red => (Hsv::new(355.0, 200.0, 150.0), Rgbc::new(4000, 900, 900, 6000)),
        Color::Green => (Hsv::new(130.0, 120.0, 80.0), Rgbc::new(900, 2600, 1200, 5000)),
        Color::Blue => (Hsv::new(220.0, 230.0, 100.0), Rgbc::new(600, 900, 2400, 4000)),
        Color::Black => (Hsv::new(0.0, 0.0, 10.0), Rgbc::new(500, 500, 500, 2000)),
        Color::Brown => (Hsv::new(15.0, 90.0, 60.0), Rgbc::new(2500, 1600, 1000, 6000)),
    }
}

/// Outcome of a virtual pickup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grab {
    pub classified: Option<Color>,
    pub secured: bool,
}

pub struct Arena {
    rows: i32,
    cols: i32,
    blocks: HashMap<EdgeKey, Color>,
    previous: Cell,
    current: Cell,
}

impl Arena {
    fn empty(rows: usize, cols: usize) -> Self {
        Self {
            rows: rows as i32,
            cols: cols as i32,
            blocks: HashMap::new(),
            previous: (0, -1),
            current: (0, 0),
        }
    }

    fn contains(&self, cell: Cell) -> bool {
        (0..self.rows).contains(&cell.0) && (0..self.cols).contains(&cell.1)
    }

    fn all_edges(&self) -> Vec<EdgeKey> {
        let mut edges = Vec::new();
        for r in 0..self.rows {
            for c in 0..self.cols {
                if c + 1 < self.cols {
                    edges.push(((r, c), (r, c + 1)));
                }
                if r + 1 < self.rows {
                    edges.push(((r, c), (r + 1, c)));
                }
            }
        }
        edges
    }

    /// Place explicit blocks
    pub fn with_blocks(rows: usize, cols: usize, placements: &[BlockPlacement]) -> Result<Self> {
        let mut arena = Self::empty(rows, cols);
        for p in placements {
            let a = (p.a[0], p.a[1]);
            let b = (p.b[0], p.b[1]);
            let adjacent = (a.0 - b.0).abs() + (a.1 - b.1).abs() == 1;
            if !adjacent || !arena.contains(a) || !arena.contains(b) {
                return Err(Error::Config(format!(
                    "block {:?}-{:?} is not an arena edge",
                    a, b
                )));
            }
            arena.blocks.insert(edge_key(a, b), p.color);
        }
        Ok(arena)
    }

    /// Place `count` blocks in pairs mirrored through the arena center
    ///
    /// An odd count puts one block on the central edge, which is its own mirror.
    pub fn mirrored(
        rows: usize,
        cols: usize,
        count: usize,
        palette: &[Color],
        noise: &mut WorldNoise,
    ) -> Result<Self> {
        let mut arena = Self::empty(rows, cols);
        if count == 0 {
            return Ok(arena);
        }
        if palette.is_empty() {
            return Err(Error::Config("block palette is empty".to_string()));
        }

        let mut edges = arena.all_edges();
        if edges.len() % 2 == 0 && count % 2 == 1 {
            return Err(Error::Config(format!(
                "cannot mirror {} blocks on a grid with {} edges",
                count,
                edges.len()
            )));
        }

        let (r, c) = (arena.rows, arena.cols);
        let central = edge_key(((r - 1) / 2, (c - 1) / 2), (r / 2, c / 2));
        if count % 2 == 1 || edges.len() % 2 == 1 {
            edges.retain(|e| *e != central);
            if count % 2 == 1 {
                if let Some(color) = noise.pick(palette) {
                    arena.blocks.insert(central, color);
                }
            }
        }

        if count / 2 > edges.len() / 2 {
            return Err(Error::Config(format!("too many blocks: {}", count)));
        }

        for _ in 0..count / 2 {
            let (Some((a, b)), Some(color)) = (noise.pick(&edges), noise.pick(palette)) else {
                break;
            };
            let mirror = edge_key((r - 1 - a.0, c - 1 - a.1), (r - 1 - b.0, c - 1 - b.1));
            arena.blocks.insert((a, b), color);
            arena.blocks.insert(mirror, color);
            edges.retain(|e| *e != (a, b) && *e != mirror);
        }

        Ok(arena)
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn block_on(&self, a: Cell, b: Cell) -> Option<Color> {
        self.blocks.get(&edge_key(a, b)).copied()
    }

    pub fn position(&self) -> (Cell, Cell) {
        (self.previous, self.current)
    }

    /// Put the rover on `(row, 0)` as if it had just left the staging lane
    pub fn place_at_entrance(&mut self, row: i32) {
        self.previous = (row, -1);
        self.current = (row, 0);
    }

    /// Heading index derived from the pose, `None` when the pose is not a unit step
    pub fn heading(&self) -> Option<u8> {
        match (
            self.current.0 - self.previous.0,
            self.current.1 - self.previous.1,
        ) {
            (-1, 0) => Some(0),
            (0, 1) => Some(1),
            (1, 0) => Some(2),
            (0, -1) => Some(3),
            _ => None,
        }
    }

    /// Front, right, back and left neighbors
    fn neighbors(&self) -> Result<[Cell; 4]> {
        let heading = self
            .heading()
            .ok_or_else(|| Error::NotAligned("heading unknown".to_string()))?;
        let mut out = [(0, 0); 4];
        for (i, slot) in out.iter_mut().enumerate() {
            let (dr, dc) = heading_delta(heading + i as u8);
            *slot = (self.current.0 + dr, self.current.1 + dc);
        }
        Ok(out)
    }

    /// Snap a rotation to quarter turns
    pub fn turn(&mut self, degrees: f32) -> Result<()> {
        let quarters = (degrees / 90.0).round();
        if (degrees - quarters * 90.0).abs() > 15.0 {
            return Err(Error::InvalidParameter(format!(
                "arena turns must be quarter turns, got {}",
                degrees
            )));
        }
        let heading = self
            .heading()
            .ok_or_else(|| Error::NotAligned("heading unknown".to_string()))?;
        let next = (heading as i32 + quarters as i32).rem_euclid(4) as u8;
        let (dr, dc) = heading_delta(next);
        self.previous = (self.current.0 - dr, self.current.1 - dc);
        Ok(())
    }

    /// Move to the front neighbor
    ///
    /// Returns `false` without moving when carrying a block toward column -1,
    /// where the staging marker ends the follow.
    pub fn follow(&mut self, carrying: bool) -> Result<bool> {
        let [front, ..] = self.neighbors()?;
        if front.1 < 0 && carrying {
            return Ok(false);
        }
        if !self.contains(front) {
            return Err(Error::NotAligned(format!(
                "no line ahead of {:?}",
                self.current
            )));
        }
        if let Some(color) = self.block_on(self.current, front) {
            log::warn!(
                "Virtual rover pushed through a {} block on {:?}-{:?}",
                color,
                self.current,
                front
            );
        }
        self.previous = self.current;
        self.current = front;
        Ok(true)
    }

    /// Lateral sensor model
    pub fn lateral(&self) -> Result<LateralDistances> {
        let [front, right, _, left] = self.neighbors()?;
        let read = |neighbor: Cell| -> u32 {
            if !self.contains(neighbor) {
                return CLEAR_READING_MM;
            }
            if self.block_on(self.current, neighbor).is_some() {
                return NEAR_READING_MM;
            }
            let beyond = (
                2 * neighbor.0 - self.current.0,
                2 * neighbor.1 - self.current.1,
            );
            if self.contains(beyond) && self.block_on(neighbor, beyond).is_some() {
                return FAR_READING_MM;
            }
            CLEAR_READING_MM
        };
        Ok(LateralDistances::new(read(left), read(front), read(right)))
    }

    /// Grab the block ahead if its classified color is accepted
    pub fn pick_up(&mut self, accepted: &[Color], miss: bool) -> Result<Grab> {
        let [front, ..] = self.neighbors()?;
        let Some(color) = self.block_on(self.current, front) else {
            return Ok(Grab {
                classified: None,
                secured: false,
            });
        };
        if miss {
            return Ok(Grab {
                classified: None,
                secured: false,
            });
        }
        let (hsv, rgbc) = block_reading(color);
        let classified = classify_block(hsv, rgbc);
        let secured = matches!(classified, Some(c) if c != Color::White && accepted.contains(&c));
        if secured {
            self.blocks.remove(&edge_key(self.current, front));
        }
        Ok(Grab {
            classified,
            secured,
        })
    }
}
