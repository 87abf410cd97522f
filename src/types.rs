// Geometry types shared by every module of the rules engine
// Coordinates address the board grid, directions describe penguin slides

use serde::{Deserialize, Serialize};
use std::fmt;

/// A pair of 2D coordinates addressing a tile of the board (column, row)
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy, Hash, Default)]
pub struct Coords {
    pub x: i32,
    pub y: i32,
}

impl Coords {
    pub const fn new(x: i32, y: i32) -> Self {
        Coords { x, y }
    }

    /// Returns the coordinates shifted by the given offset
    pub fn offset(&self, delta: Coords) -> Coords {
        Coords {
            x: self.x + delta.x,
            y: self.y + delta.y,
        }
    }

    /// Manhattan distance, the only distance that matters since penguins move along the axes
    pub fn distance(&self, other: Coords) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

impl fmt::Display for Coords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The four directions a penguin can slide in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Right,
    Down,
    Left,
    Up,
}

impl Direction {
    /// Returns all directions in the order used for move enumeration
    pub fn all() -> [Direction; 4] {
        [Direction::Right, Direction::Down, Direction::Left, Direction::Up]
    }

    /// Relative coordinates of a single step in this direction
    pub fn delta(&self) -> Coords {
        match self {
            Direction::Right => Coords::new(1, 0),
            Direction::Down => Coords::new(0, 1),
            Direction::Left => Coords::new(-1, 0),
            Direction::Up => Coords::new(0, -1),
        }
    }

    /// Calculates the next coordinates when stepping in this direction
    pub fn apply(&self, coords: &Coords) -> Coords {
        coords.offset(self.delta())
    }

    /// The neighbor of the 8-neighborhood that lies in this direction
    pub fn neighbor(&self) -> Neighbor {
        match self {
            Direction::Right => Neighbor::Right,
            Direction::Down => Neighbor::Bottom,
            Direction::Left => Neighbor::Left,
            Direction::Up => Neighbor::Top,
        }
    }

    /// Classifies the straight line from `start` to `target`
    ///
    /// # Returns
    /// * `Some(direction)` - if both points share a row or a column and differ
    /// * `None` - if the points are equal or the line is diagonal
    pub fn between(start: Coords, target: Coords) -> Option<Direction> {
        let dx = target.x - start.x;
        let dy = target.y - start.y;
        match (dx.signum(), dy.signum()) {
            (1, 0) => Some(Direction::Right),
            (-1, 0) => Some(Direction::Left),
            (0, 1) => Some(Direction::Down),
            (0, -1) => Some(Direction::Up),
            _ => None,
        }
    }
}

/// The 8-neighborhood of a tile on the square grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Neighbor {
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
    TopLeft,
    Top,
    TopRight,
}

impl Neighbor {
    /// Returns all neighbors, clockwise starting from the right one
    pub fn all() -> [Neighbor; 8] {
        [
            Neighbor::Right,
            Neighbor::BottomRight,
            Neighbor::Bottom,
            Neighbor::BottomLeft,
            Neighbor::Left,
            Neighbor::TopLeft,
            Neighbor::Top,
            Neighbor::TopRight,
        ]
    }

    pub fn delta(&self) -> Coords {
        match self {
            Neighbor::Right => Coords::new(1, 0),
            Neighbor::BottomRight => Coords::new(1, 1),
            Neighbor::Bottom => Coords::new(0, 1),
            Neighbor::BottomLeft => Coords::new(-1, 1),
            Neighbor::Left => Coords::new(-1, 0),
            Neighbor::TopLeft => Coords::new(-1, -1),
            Neighbor::Top => Coords::new(0, -1),
            Neighbor::TopRight => Coords::new(1, -1),
        }
    }

    pub fn apply(&self, coords: &Coords) -> Coords {
        coords.offset(self.delta())
    }

    /// Whether this neighbor is reachable with a single orthogonal step
    pub fn is_orthogonal(&self) -> bool {
        let d = self.delta();
        d.x == 0 || d.y == 0
    }
}
