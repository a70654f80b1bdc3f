//! Seams to the learning framework.
//!
//! The simulation never looks inside a genome or a network: it hands a
//! controller an observation, reads back an action, and writes a fitness
//! into the genome before passing the generation to the evaluator.

use crate::error::Result;
use crate::population::Retired;

/// Maps an observation to action values, one per steering option.
pub trait Controller {
    fn calculate(&mut self, inputs: &[f32]) -> Result<Vec<f32>>;
}

impl<F> Controller for F
where
    F: FnMut(&[f32]) -> Vec<f32>,
{
    fn calculate(&mut self, inputs: &[f32]) -> Result<Vec<f32>> {
        Ok(self(inputs))
    }
}

/// Opaque per-individual payload.
pub trait Genome {
    type Brain: Controller;

    fn brain(&self) -> Self::Brain;

    fn set_fitness(&mut self, fitness: u32);
}

/// Selection and reproduction between generations.
pub trait Evaluator {
    type Genome: Genome;

    /// Genomes for the generation about to be played. Called once at start
    /// and once after every [`Evaluator::evaluate_generation`].
    fn genomes(&mut self, count: usize) -> Vec<Self::Genome>;

    /// Receives the finished generation sorted by ascending fitness and
    /// prepares the next one.
    fn evaluate_generation(&mut self, ranked: &[Retired<Self::Genome>]);
}
