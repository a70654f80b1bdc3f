//! Encoding of the board into controller inputs, and decoding of the
//! controller's answer back into a steering decision.

use crate::error::{Result, SimError};
use crate::grid::Grid;
use crate::pos::Pos;
use crate::snake::{Dir, Rel, Snake, Turn};

pub const OBSERVATION_SIZE: usize = 6;
pub const ACTION_SIZE: usize = 3;

pub type Observation = [f32; OBSERVATION_SIZE];

// Inputs 0..=2: hazard forward, left, right. Inputs 3..=5: apple ahead,
// hard left, hard right.
const HAZARD_PROBES: [Rel; 3] = [Rel::Forward, Rel::Left, Rel::Right];
const APPLE_AHEAD: usize = 3;
const APPLE_LEFT: usize = 4;
const APPLE_RIGHT: usize = 5;

pub fn encode(grid: &Grid, snake: &Snake, apple: Pos) -> Observation {
    let mut input = [0.0; OBSERVATION_SIZE];
    for (slot, rel) in HAZARD_PROBES.into_iter().enumerate() {
        if is_hazard(grid, snake.peek(rel), apple) {
            input[slot] = 1.0;
        }
    }

    let angle = angle_to_apple(snake.head().current, snake.dir(), apple);
    input[bucket(angle)] = 1.0;
    input
}

// The exact +/-45 boundaries belong to the side buckets.
fn bucket(angle: f64) -> usize {
    if angle <= -45.0 {
        APPLE_LEFT
    } else if angle >= 45.0 {
        APPLE_RIGHT
    } else {
        APPLE_AHEAD
    }
}

fn is_hazard(grid: &Grid, pos: Pos, apple: Pos) -> bool {
    pos.out_of_bounds(grid.length()) || (grid.is_occupied(pos) && pos != apple)
}

/// Signed bearing from the head to the apple in degrees, relative to the
/// heading. Negative is to the snake's left, in (-180, 180].
pub fn angle_to_apple(head: Pos, dir: Dir, apple: Pos) -> f64 {
    let dy = f64::from(apple.y - head.y);
    let dx = f64::from(apple.x - head.x);
    // atan2 measures from east; +90 puts zero on north.
    let north = normalize(dy.atan2(dx).to_degrees() + 90.0);
    normalize(north + heading_offset(dir))
}

fn heading_offset(dir: Dir) -> f64 {
    match dir {
        Dir::Up => 0.0,
        Dir::Right => 270.0,
        Dir::Down => 180.0,
        Dir::Left => 90.0,
    }
}

fn normalize(mut angle: f64) -> f64 {
    while angle > 180.0 {
        angle -= 360.0;
    }
    while angle <= -180.0 {
        angle += 360.0;
    }
    angle
}

/// Turns the controller's action values into a steering decision.
///
/// The winner is the first index that strictly beats the running maximum,
/// which starts at 0.0 on index 0, so all-non-positive answers and ties with
/// straight ahead keep going straight.
pub fn decide(action: &[f32]) -> Result<Option<Turn>> {
    if action.len() != ACTION_SIZE {
        return Err(SimError::ActionLength {
            expected: ACTION_SIZE,
            actual: action.len(),
        });
    }
    let mut best = 0.0;
    let mut index = 0;
    for (i, &value) in action.iter().enumerate() {
        if value > best {
            best = value;
            index = i;
        }
    }
    Ok(match index {
        1 => Some(Turn::Left),
        2 => Some(Turn::Right),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apple::Apple;

    fn observe(snake: &Snake, apple: Pos) -> Observation {
        let mut grid = Grid::new(8);
        grid.recompute(snake, Some(&Apple::new(apple)));
        encode(&grid, snake, apple)
    }

    #[test]
    fn test_apple_due_east_while_heading_north_is_hard_right() {
        let angle = angle_to_apple(Pos::new(0, 0), Dir::Up, Pos::new(5, 0));
        assert!((angle - 90.0).abs() < 1e-9);

        let snake = Snake::new(Pos::new(0, 0), Dir::Up);
        let input = observe(&snake, Pos::new(5, 0));
        assert_eq!(&input[3..], &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_apple_buckets_follow_heading() {
        let head = Pos::new(4, 4);
        // Apple straight north.
        let apple = Pos::new(4, 1);
        assert!(angle_to_apple(head, Dir::Up, apple).abs() < 1e-9);
        assert!((angle_to_apple(head, Dir::Right, apple) + 90.0).abs() < 1e-9);
        assert!((angle_to_apple(head, Dir::Left, apple) - 90.0).abs() < 1e-9);
        // Directly behind sits on the +/-180 seam.
        assert!((angle_to_apple(head, Dir::Down, apple).abs() - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_bucket_boundaries_favor_sides() {
        assert_eq!(bucket(-45.0), APPLE_LEFT);
        assert_eq!(bucket(45.0), APPLE_RIGHT);
        assert_eq!(bucket(-44.9), APPLE_AHEAD);
        assert_eq!(bucket(44.9), APPLE_AHEAD);
        assert_eq!(bucket(180.0), APPLE_RIGHT);
        assert_eq!(bucket(-179.0), APPLE_LEFT);
    }

    #[test]
    fn test_exactly_one_apple_flag() {
        for dir in Dir::ALL {
            for x in 0..8 {
                for y in 0..8 {
                    let snake = Snake::new(Pos::new(3, 3), dir);
                    let apple = Pos::new(x, y);
                    if snake.contains(apple) {
                        continue;
                    }
                    let input = observe(&snake, apple);
                    assert_eq!(input[3..].iter().sum::<f32>(), 1.0);
                }
            }
        }
    }

    #[test]
    fn test_hazards_walls_and_body() {
        // Head in the top-left corner heading north: wall ahead and left.
        let snake = Snake::new(Pos::new(0, 0), Dir::Up);
        let input = observe(&snake, Pos::new(7, 7));
        assert_eq!(&input[..3], &[1.0, 1.0, 0.0]);

        // Heading east with the tail behind: nothing adjacent is blocked.
        let snake = Snake::new(Pos::new(3, 3), Dir::Right);
        let input = observe(&snake, Pos::new(7, 7));
        assert_eq!(&input[..3], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_apple_cell_is_not_a_hazard() {
        let snake = Snake::new(Pos::new(3, 3), Dir::Up);
        let input = observe(&snake, Pos::new(3, 2));
        assert_eq!(input[0], 0.0);
        assert_eq!(input[APPLE_AHEAD], 1.0);
    }

    #[test]
    fn test_decide_picks_first_strict_maximum() {
        assert_eq!(decide(&[0.2, 0.9, 0.1]).unwrap(), Some(Turn::Left));
        assert_eq!(decide(&[0.2, 0.1, 0.9]).unwrap(), Some(Turn::Right));
        assert_eq!(decide(&[0.5, 0.5, 0.5]).unwrap(), None);
        assert_eq!(decide(&[0.1, 0.7, 0.7]).unwrap(), Some(Turn::Left));
        assert_eq!(decide(&[-1.0, -0.5, -0.2]).unwrap(), None);
    }

    #[test]
    fn test_decide_rejects_wrong_width() {
        let err = decide(&[1.0, 0.0]).unwrap_err();
        assert!(matches!(
            err,
            SimError::ActionLength {
                expected: 3,
                actual: 2
            }
        ));
    }
}
