use crate::brain::{Evaluator, Genome};
use crate::error::{Result, SimError};
use crate::snake::{Cause, Snake};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A finished individual, waiting for the rest of its generation.
#[derive(Clone, Debug)]
pub struct Retired<G> {
    pub genome: G,
    pub fitness: u32,
    pub food_eaten: u32,
    pub cause: Cause,
}

/// Summary of one finished generation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub generation: u64,
    pub size: usize,
    pub best: u32,
    pub worst: u32,
    pub mean: f64,
    pub best_food: u32,
}

impl GenerationReport {
    fn from_ranked<G>(generation: u64, ranked: &[Retired<G>]) -> Self {
        let total: u64 = ranked.iter().map(|r| u64::from(r.fitness)).sum();
        let mean = if ranked.is_empty() {
            0.0
        } else {
            total as f64 / ranked.len() as f64
        };
        Self {
            generation,
            size: ranked.len(),
            best: ranked.last().map_or(0, |r| r.fitness),
            worst: ranked.first().map_or(0, |r| r.fitness),
            mean,
            best_food: ranked.iter().map(|r| r.food_eaten).max().unwrap_or(0),
        }
    }
}

/// The two rosters of a generation. The front of `alive` is the individual
/// currently on the board; every genome sits in exactly one roster.
#[derive(Debug)]
pub struct Population<G> {
    size: usize,
    generation: u64,
    alive: VecDeque<G>,
    retired: Vec<Retired<G>>,
}

impl<G: Genome> Population<G> {
    /// Pulls the first generation from the evaluator.
    pub fn spawn<E>(evaluator: &mut E, size: usize) -> Result<Self>
    where
        E: Evaluator<Genome = G>,
    {
        Ok(Self {
            size,
            generation: 0,
            alive: pull(evaluator, size)?,
            retired: Vec::with_capacity(size),
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn current(&self) -> Option<&G> {
        self.alive.front()
    }

    pub fn alive(&self) -> impl Iterator<Item = &G> {
        self.alive.iter()
    }

    pub fn retired(&self) -> &[Retired<G>] {
        &self.retired
    }

    /// How many individuals of this generation have already played.
    pub fn played(&self) -> usize {
        self.retired.len()
    }

    /// Moves the current individual to the retired roster with the fitness
    /// of its finished snake. Returns whether the generation is over.
    pub fn retire(&mut self, snake: &Snake) -> bool {
        if let Some(mut genome) = self.alive.pop_front() {
            let fitness = snake.fitness();
            genome.set_fitness(fitness);
            self.retired.push(Retired {
                genome,
                fitness,
                food_eaten: snake.food_eaten(),
                cause: snake.cause().unwrap_or(Cause::Reset),
            });
        }
        self.alive.is_empty()
    }

    /// Sorts the retired roster by ascending fitness, keeping the retirement
    /// order of equal fitness.
    pub fn rank(&mut self) {
        self.retired.sort_by_key(|r| r.fitness);
    }

    /// Hands the ranked generation to the evaluator and replaces the alive
    /// roster with the next generation.
    pub fn rollover<E>(&mut self, evaluator: &mut E) -> Result<GenerationReport>
    where
        E: Evaluator<Genome = G>,
    {
        self.rank();
        let report = GenerationReport::from_ranked(self.generation, &self.retired);
        evaluator.evaluate_generation(&self.retired);
        self.alive = pull(evaluator, self.size)?;
        self.retired.clear();
        self.generation += 1;
        Ok(report)
    }
}

fn pull<E: Evaluator>(evaluator: &mut E, size: usize) -> Result<VecDeque<E::Genome>> {
    let mut genomes = evaluator.genomes(size);
    if genomes.len() < size {
        return Err(SimError::PayloadShortfall {
            expected: size,
            actual: genomes.len(),
        });
    }
    genomes.truncate(size);
    Ok(genomes.into())
}
