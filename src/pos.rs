use serde::{Deserialize, Serialize};

/// A cell on the board. Move candidates may fall outside the grid, so the
/// axes are signed and bounds are checked explicitly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

impl Pos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, (dx, dy): (i32, i32)) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn out_of_bounds(self, length: usize) -> bool {
        let len = length as i32;
        self.x < 0 || self.y < 0 || self.x >= len || self.y >= len
    }

    /// Cell index, row-major by x. Only meaningful for in-bounds positions.
    pub fn to_index(self, length: usize) -> usize {
        self.x as usize * length + self.y as usize
    }

    /// Inverse of [`Pos::to_index`].
    pub fn from_index(index: usize, length: usize) -> Self {
        Self::new((index / length) as i32, (index % length) as i32)
    }

    /// Whether `self` is closer to `reference` than `other` is.
    ///
    /// Only one axis is compared: x when both positions share a row, y
    /// otherwise. The comparison is strict.
    pub fn closer_to(self, other: Pos, reference: Pos) -> bool {
        if self.y == other.y {
            (reference.x - self.x).abs() < (reference.x - other.x).abs()
        } else {
            (reference.y - self.y).abs() < (reference.y - other.y).abs()
        }
    }
}

/// Position bookkeeping shared by snake segments and the apple: where the
/// occupant is now and where it was before its most recent move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tracked {
    pub current: Pos,
    pub previous: Pos,
}

impl Tracked {
    /// A fresh occupant has not moved yet, so both positions coincide.
    pub fn new(pos: Pos) -> Self {
        Self {
            current: pos,
            previous: pos,
        }
    }

    pub fn move_to(&mut self, pos: Pos) {
        self.previous = self.current;
        self.current = pos;
    }
}
