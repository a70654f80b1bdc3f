use crate::apple::Apple;
use crate::pos::Pos;
use crate::snake::Snake;

/// Square occupancy map. A cell is occupied iff it holds a live snake segment
/// or the current apple.
#[derive(Clone, Debug)]
pub struct Grid {
    length: usize,
    cells: Vec<bool>,
}

impl Grid {
    pub fn new(length: usize) -> Self {
        Self {
            length,
            cells: vec![false; length * length],
        }
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn area(&self) -> usize {
        self.cells.len()
    }

    /// Out-of-bounds cells read as free; callers check bounds separately.
    pub fn is_occupied(&self, pos: Pos) -> bool {
        !pos.out_of_bounds(self.length) && self.cells[pos.to_index(self.length)]
    }

    /// Rebuilds every flag from the snake body and the apple.
    ///
    /// Nothing from the previous tick is trusted, so a cell vacated by the
    /// tail is free unless a segment or the apple sits on it now.
    pub fn recompute(&mut self, snake: &Snake, apple: Option<&Apple>) {
        self.cells.fill(false);
        for segment in snake.segments() {
            self.mark(segment.current);
        }
        if let Some(apple) = apple {
            self.mark(apple.pos());
        }
    }

    #[cfg(test)]
    pub(crate) fn occupy(&mut self, pos: Pos) {
        self.mark(pos);
    }

    fn mark(&mut self, pos: Pos) {
        if !pos.out_of_bounds(self.length) {
            let idx = pos.to_index(self.length);
            self.cells[idx] = true;
        }
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    pub fn free_cells(&self) -> Vec<Pos> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, occupied)| !**occupied)
            .map(|(i, _)| Pos::from_index(i, self.length))
            .collect()
    }

    /// Read-only view of the flags, indexed like [`Pos::to_index`].
    pub fn cells(&self) -> &[bool] {
        &self.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snake::{Dir, Snake};

    #[test]
    fn test_new_grid_is_free() {
        let grid = Grid::new(8);
        assert_eq!(grid.area(), 64);
        assert_eq!(grid.occupied_count(), 0);
        assert_eq!(grid.free_cells().len(), 64);
    }

    #[test]
    fn test_recompute_marks_snake_and_apple() {
        let mut grid = Grid::new(8);
        let snake = Snake::new(Pos::new(3, 3), Dir::Up);
        let apple = Apple::new(Pos::new(6, 6));
        grid.recompute(&snake, Some(&apple));

        assert!(grid.is_occupied(Pos::new(3, 3)));
        assert!(grid.is_occupied(Pos::new(3, 4)));
        assert!(grid.is_occupied(Pos::new(6, 6)));
        assert_eq!(grid.occupied_count(), snake.len() + 1);
    }

    #[test]
    fn test_recompute_clears_vacated_tail() {
        let mut grid = Grid::new(8);
        let mut snake = Snake::new(Pos::new(3, 3), Dir::Up);
        let apple = Apple::new(Pos::new(6, 6));
        grid.recompute(&snake, Some(&apple));
        assert!(snake.advance(&grid, apple.pos()).is_moved());
        grid.recompute(&snake, Some(&apple));

        assert!(!grid.is_occupied(Pos::new(3, 4)));
        assert!(grid.is_occupied(Pos::new(3, 2)));
        assert_eq!(grid.occupied_count(), 3);
    }

    #[test]
    fn test_apple_previous_cell_under_body_stays_occupied() {
        let mut grid = Grid::new(8);
        let mut snake = Snake::new(Pos::new(3, 3), Dir::Up);
        let mut apple = Apple::new(Pos::new(3, 2));
        grid.recompute(&snake, Some(&apple));

        // Eat the apple, then advance so the body rests where it used to be.
        assert!(snake.advance(&grid, apple.pos()).is_moved());
        snake.grow();
        apple.relocate(Pos::new(0, 0));
        grid.recompute(&snake, Some(&apple));
        assert!(snake.advance(&grid, apple.pos()).is_moved());
        grid.recompute(&snake, Some(&apple));

        assert_eq!(apple.previous(), Pos::new(3, 2));
        assert!(grid.is_occupied(apple.previous()));
        assert_eq!(grid.occupied_count(), snake.len() + 1);
    }

    #[test]
    fn test_out_of_bounds_reads_free() {
        let grid = Grid::new(4);
        assert!(!grid.is_occupied(Pos::new(-1, 2)));
        assert!(!grid.is_occupied(Pos::new(4, 2)));
    }
}
