use crate::error::{Result, SimError};
use crate::grid::Grid;
use crate::pos::{Pos, Tracked};
use rand::Rng;
use rand::seq::SliceRandom;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Apple {
    pos: Tracked,
}

impl Apple {
    pub fn new(pos: Pos) -> Self {
        Self {
            pos: Tracked::new(pos),
        }
    }

    pub fn pos(&self) -> Pos {
        self.pos.current
    }

    pub fn previous(&self) -> Pos {
        self.pos.previous
    }

    pub fn relocate(&mut self, pos: Pos) {
        self.pos.move_to(pos);
    }
}

/// Picks a uniformly random free cell for the next apple.
///
/// Callers only ask while the snake is below maximum size, so a full grid
/// means occupancy bookkeeping has gone wrong.
pub fn spawn<R: Rng>(grid: &Grid, rng: &mut R) -> Result<Pos> {
    let free = grid.free_cells();
    free.choose(rng).copied().ok_or(SimError::NoFreeCell {
        occupied: grid.occupied_count(),
        area: grid.area(),
    })
}
