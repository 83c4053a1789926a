//! Grid coordinates and adjacency.
//!
//! A location is a (row, column) pair on the rectangular board. Which
//! locations border each other is decided by the board's `Adjacency` rule.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A cell on the board grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    pub row: i32,
    pub column: i32,
}

impl Location {
    pub const fn new(row: i32, column: i32) -> Self {
        Self { row, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

/// Offsets reachable under orthogonal adjacency.
const ORTHOGONAL: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Offsets reachable under king-move adjacency.
const KING_MOVE: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Rule deciding which cells border each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Adjacency {
    /// Cells differing by one unit in exactly one axis.
    #[default]
    Orthogonal,
    /// Cells differing by at most one unit in each axis, diagonals included.
    KingMove,
}

impl Adjacency {
    /// Returns true if `a` and `b` border each other. A cell never borders itself.
    pub fn is_adjacent(self, a: Location, b: Location) -> bool {
        let dr = (a.row - b.row).abs();
        let dc = (a.column - b.column).abs();
        match self {
            Adjacency::Orthogonal => dr + dc == 1,
            Adjacency::KingMove => dr <= 1 && dc <= 1 && (dr, dc) != (0, 0),
        }
    }

    fn offsets(self) -> &'static [(i32, i32)] {
        match self {
            Adjacency::Orthogonal => &ORTHOGONAL,
            Adjacency::KingMove => &KING_MOVE,
        }
    }

    /// Candidate neighbours of `loc`, unbounded. Callers filter against the board.
    pub fn neighbours(self, loc: Location) -> impl Iterator<Item = Location> {
        self.offsets()
            .iter()
            .map(move |&(dr, dc)| Location::new(loc.row + dr, loc.column + dc))
    }
}
