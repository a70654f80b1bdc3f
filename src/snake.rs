use crate::grid::Grid;
use crate::pos::{Pos, Tracked};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A snake starts with a head and one body segment.
pub const MIN_SIZE: usize = 2;

/// A body unit: where it is and where it was before the last move.
pub type Segment = Tracked;

/// Heading on the board. `Up` is north, towards `y == 0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dir {
    Up = 0,
    Right = 1,
    Down = 2,
    Left = 3,
}

/// Direction relative to the current heading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rel {
    Forward = 0,
    Left = 1,
    Right = 2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Turn {
    Left,
    Right,
}

// Indexed by [Dir][Rel].
const OFFSETS: [[(i32, i32); 3]; 4] = [
    [(0, -1), (-1, 0), (1, 0)],
    [(1, 0), (0, -1), (0, 1)],
    [(0, 1), (1, 0), (-1, 0)],
    [(-1, 0), (0, 1), (0, -1)],
];

impl Dir {
    pub const ALL: [Dir; 4] = [Dir::Up, Dir::Right, Dir::Down, Dir::Left];

    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    pub fn left(self) -> Dir {
        match self {
            Dir::Up => Dir::Left,
            Dir::Left => Dir::Down,
            Dir::Down => Dir::Right,
            Dir::Right => Dir::Up,
        }
    }

    pub fn right(self) -> Dir {
        match self {
            Dir::Up => Dir::Right,
            Dir::Right => Dir::Down,
            Dir::Down => Dir::Left,
            Dir::Left => Dir::Up,
        }
    }

    pub fn turned(self, turn: Turn) -> Dir {
        match turn {
            Turn::Left => self.left(),
            Turn::Right => self.right(),
        }
    }

    pub fn offset(self, rel: Rel) -> (i32, i32) {
        OFFSETS[self as usize][rel as usize]
    }
}

/// Why a snake left the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cause {
    /// Ran off the grid.
    Wall,
    /// Ran into its own body.
    Body,
    /// Went a whole starvation window without eating.
    Starved,
    /// Filled the board; there is nowhere left for an apple.
    Filled,
    /// Reset on request.
    Reset,
}

/// Outcome of [`Snake::advance`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Advance {
    Moved,
    Blocked(Cause),
    /// The snake is already retired; nothing was touched.
    Inert,
}

impl Advance {
    pub fn is_moved(self) -> bool {
        matches!(self, Advance::Moved)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Alive,
    Retired(Cause),
}

#[derive(Clone, Debug)]
pub struct Snake {
    body: Vec<Segment>,
    dir: Dir,
    // Foraging points banked since the last apple; never negative.
    score: u32,
    health: u32,
    food_eaten: u32,
    fitness: u32,
    fed_recently: bool,
    state: State,
}

impl Snake {
    /// Head at `head`, tail one step behind it.
    pub fn new(head: Pos, dir: Dir) -> Self {
        let (dx, dy) = dir.offset(Rel::Forward);
        let tail = head.offset((-dx, -dy));
        Self {
            body: vec![Segment::new(head), Segment::new(tail)],
            dir,
            score: 0,
            health: 0,
            food_eaten: 0,
            fitness: 0,
            fed_recently: true,
            state: State::Alive,
        }
    }

    /// Random heading, head on a random cell off the outer ring.
    pub fn spawn<R: Rng>(rng: &mut R, length: usize) -> Self {
        let inner = length as i32 - 1;
        let head = Pos::new(rng.gen_range(1..inner), rng.gen_range(1..inner));
        Self::new(head, Dir::random(rng))
    }

    pub fn head(&self) -> &Segment {
        &self.body[0]
    }

    pub fn tail(&self) -> &Segment {
        &self.body[self.body.len() - 1]
    }

    pub fn segments(&self) -> &[Segment] {
        &self.body
    }

    pub fn positions(&self) -> Vec<Pos> {
        self.body.iter().map(|s| s.current).collect()
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn dir(&self) -> Dir {
        self.dir
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn health(&self) -> u32 {
        self.health
    }

    pub fn food_eaten(&self) -> u32 {
        self.food_eaten
    }

    pub fn fitness(&self) -> u32 {
        self.fitness
    }

    pub fn fed_recently(&self) -> bool {
        self.fed_recently
    }

    pub fn is_alive(&self) -> bool {
        self.state == State::Alive
    }

    pub fn cause(&self) -> Option<Cause> {
        match self.state {
            State::Alive => None,
            State::Retired(cause) => Some(cause),
        }
    }

    pub fn contains(&self, pos: Pos) -> bool {
        self.body.iter().any(|s| s.current == pos)
    }

    pub fn turn(&mut self, turn: Turn) {
        if self.is_alive() {
            self.dir = self.dir.turned(turn);
        }
    }

    /// The cell one step from the head, possibly off the grid.
    pub fn peek(&self, rel: Rel) -> Pos {
        self.head().current.offset(self.dir.offset(rel))
    }

    /// Moves one cell forward unless the way is blocked.
    ///
    /// The head steps first; every follower then takes the cell its
    /// predecessor held before this move.
    pub fn advance(&mut self, grid: &Grid, apple: Pos) -> Advance {
        if !self.is_alive() {
            return Advance::Inert;
        }
        let next = self.peek(Rel::Forward);
        if next.out_of_bounds(grid.length()) {
            return Advance::Blocked(Cause::Wall);
        }
        if grid.is_occupied(next) && next != apple {
            return Advance::Blocked(Cause::Body);
        }

        self.body[0].move_to(next);
        for i in 1..self.body.len() {
            let target = self.body[i - 1].previous;
            self.body[i].move_to(target);
        }
        Advance::Moved
    }

    /// Adds a segment where the tail was before the last move.
    pub fn grow(&mut self) {
        let spot = self.tail().previous;
        self.body.push(Segment::new(spot));
        self.food_eaten += 1;
        self.fed_recently = true;
    }

    /// Foraging heuristic for one successful move: +1 when the head got
    /// closer to the apple, -2 otherwise, floored at zero.
    pub fn score_step(&mut self, apple: Pos) {
        let head = self.head();
        if head.current.closer_to(head.previous, apple) {
            self.score += 1;
        } else {
            self.score = self.score.saturating_sub(2);
        }
    }

    /// Banks the foraging score into health and grows.
    pub fn feed(&mut self) {
        self.health += self.score;
        self.score = 0;
        self.grow();
    }

    /// Starts a fresh starvation window.
    pub fn go_hungry(&mut self) {
        self.fed_recently = false;
    }

    /// Terminal transition. Returns the fitness, `food * 10 + health`, with
    /// the unbanked score folded into health first. Retiring twice keeps the
    /// first cause and fitness.
    pub fn retire(&mut self, cause: Cause) -> u32 {
        if self.is_alive() {
            self.health += self.score;
            self.score = 0;
            self.fitness = self.food_eaten * 10 + self.health;
            self.state = State::Retired(cause);
        }
        self.fitness
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apple::Apple;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn board(snake: &Snake, apple: Pos) -> Grid {
        let mut grid = Grid::new(8);
        grid.recompute(snake, Some(&Apple::new(apple)));
        grid
    }

    #[test]
    fn test_offset_table_matches_turns() {
        for dir in Dir::ALL {
            assert_eq!(dir.offset(Rel::Left), dir.left().offset(Rel::Forward));
            assert_eq!(dir.offset(Rel::Right), dir.right().offset(Rel::Forward));
        }
    }

    #[test]
    fn test_four_turns_come_back() {
        for dir in Dir::ALL {
            let mut d = dir;
            for _ in 0..4 {
                d = d.turned(Turn::Right);
            }
            assert_eq!(d, dir);
            assert_eq!(dir.left().right(), dir);
        }
    }

    #[test]
    fn test_new_places_tail_behind_head() {
        let snake = Snake::new(Pos::new(3, 3), Dir::Right);
        assert_eq!(snake.positions(), vec![Pos::new(3, 3), Pos::new(2, 3)]);
        assert_eq!(snake.len(), MIN_SIZE);
        assert!(snake.fed_recently());
    }

    #[test]
    fn test_spawn_stays_off_outer_ring() {
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..500 {
            let snake = Snake::spawn(&mut rng, 8);
            let head = snake.head().current;
            assert!((1..7).contains(&head.x) && (1..7).contains(&head.y));
            assert!(!snake.tail().current.out_of_bounds(8));
        }
    }

    #[test]
    fn test_peek_does_not_move() {
        let snake = Snake::new(Pos::new(3, 3), Dir::Up);
        assert_eq!(snake.peek(Rel::Forward), Pos::new(3, 2));
        assert_eq!(snake.peek(Rel::Left), Pos::new(2, 3));
        assert_eq!(snake.peek(Rel::Right), Pos::new(4, 3));
        assert_eq!(snake.head().current, Pos::new(3, 3));
    }

    #[test]
    fn test_advance_chain_shifts_body() {
        let mut snake = Snake::new(Pos::new(3, 3), Dir::Up);
        let apple = Pos::new(0, 7);
        let grid = board(&snake, apple);
        snake.grow();
        // Grown segment sits on the tail's previous cell, which is its own.
        assert_eq!(snake.positions(), vec![Pos::new(3, 3), Pos::new(3, 4), Pos::new(3, 4)]);

        assert_eq!(snake.advance(&grid, apple), Advance::Moved);
        assert_eq!(
            snake.positions(),
            vec![Pos::new(3, 2), Pos::new(3, 3), Pos::new(3, 4)]
        );
        assert_eq!(snake.head().previous, Pos::new(3, 3));
    }

    #[test]
    fn test_advance_into_wall_is_blocked() {
        let mut snake = Snake::new(Pos::new(0, 3), Dir::Left);
        let apple = Pos::new(7, 7);
        let grid = board(&snake, apple);
        let before = snake.positions();
        assert_eq!(snake.advance(&grid, apple), Advance::Blocked(Cause::Wall));
        assert_eq!(snake.positions(), before);
    }

    #[test]
    fn test_advance_into_body_is_blocked() {
        let mut snake = Snake::new(Pos::new(3, 3), Dir::Up);
        let apple = Pos::new(7, 7);
        snake.turn(Turn::Right);
        snake.turn(Turn::Right);
        let grid = board(&snake, apple);
        assert_eq!(snake.advance(&grid, apple), Advance::Blocked(Cause::Body));
    }

    #[test]
    fn test_advance_onto_apple_is_allowed() {
        let mut snake = Snake::new(Pos::new(3, 3), Dir::Up);
        let apple = Pos::new(3, 2);
        let grid = board(&snake, apple);
        assert!(grid.is_occupied(apple));
        assert!(snake.advance(&grid, apple).is_moved());
        assert_eq!(snake.head().current, apple);
    }

    #[test]
    fn test_grow_only_appends() {
        let mut snake = Snake::new(Pos::new(3, 3), Dir::Up);
        let apple = Pos::new(0, 0);
        let grid = board(&snake, apple);
        snake.advance(&grid, apple);
        let before = snake.positions();
        snake.grow();
        assert_eq!(&snake.positions()[..before.len()], &before[..]);
        assert_eq!(snake.tail().current, Pos::new(3, 4));
        assert_eq!(snake.food_eaten(), 1);
    }

    #[test]
    fn test_score_is_floored_at_zero() {
        let mut snake = Snake::new(Pos::new(3, 3), Dir::Up);
        let apple = Pos::new(3, 7);
        let grid = board(&snake, apple);
        snake.advance(&grid, apple);
        snake.score_step(apple);
        assert_eq!(snake.score(), 0);
    }

    #[test]
    fn test_feed_banks_score() {
        let mut snake = Snake::new(Pos::new(3, 5), Dir::Up);
        let apple = Pos::new(3, 1);
        for _ in 0..3 {
            let grid = board(&snake, apple);
            snake.advance(&grid, apple);
            snake.score_step(apple);
        }
        assert_eq!(snake.score(), 3);
        snake.feed();
        assert_eq!(snake.score(), 0);
        assert_eq!(snake.health(), 3);
        assert_eq!(snake.len(), 3);
    }

    #[test]
    fn test_retire_computes_fitness_once() {
        let mut snake = Snake::new(Pos::new(3, 5), Dir::Up);
        let apple = Pos::new(3, 1);
        let grid = board(&snake, apple);
        snake.advance(&grid, apple);
        snake.score_step(apple);
        snake.feed();
        snake.score_step(apple);

        // One apple, one banked point, one pending point folded in.
        assert_eq!(snake.retire(Cause::Starved), 12);
        assert_eq!(snake.retire(Cause::Wall), 12);
        assert_eq!(snake.cause(), Some(Cause::Starved));
    }

    #[test]
    fn test_retired_snake_does_not_move() {
        let mut snake = Snake::new(Pos::new(3, 3), Dir::Up);
        let apple = Pos::new(7, 7);
        let grid = board(&snake, apple);
        snake.retire(Cause::Reset);
        let before = snake.positions();
        assert_eq!(snake.advance(&grid, apple), Advance::Inert);
        snake.turn(Turn::Left);
        assert_eq!(snake.positions(), before);
        assert_eq!(snake.dir(), Dir::Up);
    }
}
