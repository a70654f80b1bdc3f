//! Snake simulation and generational training engine.
//!
//! One snake at a time plays on a square grid. When it dies, starves, fills
//! the board or is reset, its fitness goes back to the population; when the
//! whole generation has played, an [`brain::Evaluator`] breeds the next one.

pub mod apple;
pub mod brain;
pub mod clock;
pub mod config;
pub mod draw;
pub mod error;
pub mod evolution;
pub mod game;
pub mod grid;
pub mod input;
pub mod observe;
pub mod population;
pub mod pos;
pub mod session;
pub mod snake;

pub use config::AppConfig;
pub use error::{Result, SimError};
pub use session::{Event, Snapshot, TrainingSession};
