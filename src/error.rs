//! Hard failures of the simulation core.
//!
//! Collisions, starvation and a full board are not errors: they retire the
//! current snake and training carries on. Only broken bookkeeping and broken
//! collaborator contracts end up here.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    /// Apple placement found no free cell although the snake is below maximum size.
    #[error("no free cell left for the apple ({occupied} of {area} cells occupied)")]
    NoFreeCell { occupied: usize, area: usize },

    /// A controller was fed an observation of the wrong width.
    #[error("observation has {actual} values, controller expects {expected}")]
    ObservationLength { expected: usize, actual: usize },

    /// A controller answered with the wrong number of action values.
    #[error("action has {actual} values, expected {expected}")]
    ActionLength { expected: usize, actual: usize },

    /// The evaluator produced fewer genomes than the roster needs.
    #[error("evaluator yielded {actual} genomes for a roster of {expected}")]
    PayloadShortfall { expected: usize, actual: usize },

    /// A checkpoint was written for a different network shape.
    #[error("checkpoint topology {actual:?} does not match configured {expected:?}")]
    TopologyMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// A checkpointed genome has the wrong number of weights.
    #[error("checkpoint genome has {actual} weights, topology needs {expected}")]
    GenomeShape { expected: usize, actual: usize },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("checkpoint I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("checkpoint encode error: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("checkpoint decode error: {0}")]
    Decode(#[from] bincode::error::DecodeError),
}

pub type Result<T> = std::result::Result<T, SimError>;
