use serde::{Deserialize, Serialize};
use std::fmt;

use super::constants::DEFAULT_BOARD_SIZE;

/// Stone color. Black always moves first.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Black,
    White,
}

impl Color {
    /// The color that moves first in every session.
    pub const FIRST: Color = Color::Black;

    pub fn opponent(self) -> Self {
        match self {
            Self::Black => Self::White,
            Self::White => Self::Black,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Black => "black",
            Self::White => "white",
        };
        write!(f, "{repr}")
    }
}

/// A board coordinate. `x` is the column, `y` the row.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Coord {
    pub x: usize,
    pub y: usize,
}

impl Coord {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Step `distance` cells along `(dx, dy)`, returning `None` when the
    /// result would leave the non-negative quadrant.
    pub(crate) fn offset(self, dx: isize, dy: isize, distance: isize) -> Option<Self> {
        let x = self.x.checked_add_signed(dx * distance)?;
        let y = self.y.checked_add_signed(dy * distance)?;
        Some(Self { x, y })
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Square omok board. Cells are stored row-major and are written at most
/// once; there is no way to clear a stone.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Board {
    size: usize,
    cells: Vec<Option<Color>>,
    stones: usize,
}

impl Board {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![None; size * size],
            stones: 0,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn contains(&self, at: Coord) -> bool {
        at.x < self.size && at.y < self.size
    }

    /// Cell contents, or `None` for both empty and out-of-bounds cells.
    pub fn get(&self, at: Coord) -> Option<Color> {
        if self.contains(at) {
            self.cells[at.y * self.size + at.x]
        } else {
            None
        }
    }

    pub fn is_empty_at(&self, at: Coord) -> bool {
        self.contains(at) && self.cells[at.y * self.size + at.x].is_none()
    }

    /// Place a stone on an empty in-bounds cell. Returns `false` and leaves
    /// the board untouched otherwise.
    pub fn place(&mut self, at: Coord, color: Color) -> bool {
        if !self.is_empty_at(at) {
            return false;
        }
        self.cells[at.y * self.size + at.x] = Some(color);
        self.stones += 1;
        true
    }

    /// Number of stones placed so far.
    pub fn stone_count(&self) -> usize {
        self.stones
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new(DEFAULT_BOARD_SIZE)
    }
}
