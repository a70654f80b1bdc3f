use crate::apple::{self, Apple};
use crate::brain::Controller;
use crate::error::Result;
use crate::grid::Grid;
use crate::observe;
use crate::pos::Pos;
use crate::snake::{Advance, Cause, Snake};
use rand::Rng;

/// Outcome of one move tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Moved { ate: bool },
    Over(Cause),
}

/// The board for one individual: its snake, the apple and the occupancy grid.
#[derive(Clone, Debug)]
pub struct Game {
    grid: Grid,
    snake: Snake,
    // None once the snake has filled the board.
    apple: Option<Apple>,
}

impl Game {
    /// Fresh board with a randomly placed snake and apple.
    pub fn new<R: Rng>(length: usize, rng: &mut R) -> Result<Self> {
        let snake = Snake::spawn(rng, length);
        Self::with_snake(length, snake, rng)
    }

    /// Fresh board around a given snake, apple placed at random.
    pub fn with_snake<R: Rng>(length: usize, snake: Snake, rng: &mut R) -> Result<Self> {
        let mut grid = Grid::new(length);
        grid.recompute(&snake, None);
        let apple = Apple::new(apple::spawn(&grid, rng)?);
        grid.recompute(&snake, Some(&apple));
        Ok(Self {
            grid,
            snake,
            apple: Some(apple),
        })
    }

    /// Board with everything placed by hand.
    pub fn with_layout(length: usize, snake: Snake, apple: Pos) -> Self {
        let apple = Apple::new(apple);
        let mut grid = Grid::new(length);
        grid.recompute(&snake, Some(&apple));
        Self {
            grid,
            snake,
            apple: Some(apple),
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn snake(&self) -> &Snake {
        &self.snake
    }

    pub fn snake_mut(&mut self) -> &mut Snake {
        &mut self.snake
    }

    pub fn apple(&self) -> Option<&Apple> {
        self.apple.as_ref()
    }

    pub fn is_over(&self) -> bool {
        !self.snake.is_alive()
    }

    /// One move tick.
    ///
    /// Moves the snake, lets the controller (if any) pick the heading for the
    /// next tick, scores the move, handles the apple and finally resyncs the
    /// grid. A blocked move ends the game; so does filling the board.
    /// Stepping a finished game changes nothing.
    pub fn step<R: Rng>(
        &mut self,
        controller: Option<&mut dyn Controller>,
        rng: &mut R,
    ) -> Result<Step> {
        if let Some(cause) = self.snake.cause() {
            return Ok(Step::Over(cause));
        }
        let Some(apple) = self.apple else {
            return Ok(Step::Over(self.end(Cause::Filled)));
        };

        match self.snake.advance(&self.grid, apple.pos()) {
            Advance::Moved => {}
            Advance::Blocked(cause) => return Ok(Step::Over(self.end(cause))),
            Advance::Inert => {
                return Ok(Step::Over(self.snake.cause().unwrap_or(Cause::Reset)));
            }
        }

        // Encoded against the grid as it stood at the start of the tick.
        if let Some(controller) = controller {
            let observation = observe::encode(&self.grid, &self.snake, apple.pos());
            let action = controller.calculate(&observation)?;
            if let Some(turn) = observe::decide(&action)? {
                self.snake.turn(turn);
            }
        }

        self.snake.score_step(apple.pos());

        let ate = self.snake.head().current == apple.pos();
        if ate {
            self.snake.feed();
            if self.snake.len() >= self.grid.area() {
                self.apple = None;
                self.grid.recompute(&self.snake, None);
                return Ok(Step::Over(self.end(Cause::Filled)));
            }
            self.grid.recompute(&self.snake, None);
            let next = apple::spawn(&self.grid, rng)?;
            if let Some(apple) = self.apple.as_mut() {
                apple.relocate(next);
            }
        }

        self.grid.recompute(&self.snake, self.apple.as_ref());
        Ok(Step::Moved { ate })
    }

    /// Starvation heartbeat. Ends the game if nothing was eaten since the
    /// previous beat, otherwise opens a new window.
    pub fn starve(&mut self) -> Option<Cause> {
        if !self.snake.is_alive() {
            return self.snake.cause();
        }
        if self.snake.fed_recently() {
            self.snake.go_hungry();
            None
        } else {
            Some(self.end(Cause::Starved))
        }
    }

    /// Ends the game with `cause` and returns the cause that stands.
    pub fn end(&mut self, cause: Cause) -> Cause {
        self.snake.retire(cause);
        self.snake.cause().unwrap_or(cause)
    }
}
