//! A small neuroevolution pool that plugs into the training loop.
//!
//! Genomes are flat weight vectors for a fully connected feed-forward
//! network, 6 inputs to 3 outputs with optional hidden layers. Between
//! generations the pool keeps its elites and breeds the rest by tournament
//! selection, uniform crossover and Gaussian mutation.

use crate::brain::{Controller, Evaluator, Genome};
use crate::config::EvolutionConfig;
use crate::error::{Result, SimError};
use crate::observe::{ACTION_SIZE, OBSERVATION_SIZE};
use crate::population::Retired;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetGenome {
    layers: Vec<usize>,
    // Per layer, per output neuron: bias followed by one weight per input.
    weights: Vec<f32>,
    fitness: Option<u32>,
}

impl NetGenome {
    /// Genesis genome with normally distributed weights.
    pub fn random<R: Rng>(layers: &[usize], rng: &mut R) -> Self {
        let weights = (0..weight_count(layers)).map(|_| gaussian(rng)).collect();
        Self {
            layers: layers.to_vec(),
            weights,
            fitness: None,
        }
    }

    pub fn layers(&self) -> &[usize] {
        &self.layers
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    pub fn fitness(&self) -> Option<u32> {
        self.fitness
    }

    fn offspring(&self) -> Self {
        Self {
            fitness: None,
            ..self.clone()
        }
    }

    fn crossover<R: Rng>(&self, other: &Self, rng: &mut R) -> Self {
        let mut child = self.offspring();
        for (w, &theirs) in child.weights.iter_mut().zip(other.weights.iter()) {
            if rng.gen_bool(0.5) {
                *w = theirs;
            }
        }
        child
    }

    fn mutate<R: Rng>(&mut self, params: &EvolutionConfig, rng: &mut R) {
        let reset_rate = f64::from(params.reset_rate);
        let mutation_rate = f64::from(params.mutation_rate);
        for w in self.weights.iter_mut() {
            if rng.gen_bool(reset_rate) {
                *w = gaussian(rng);
            } else if rng.gen_bool(mutation_rate) {
                *w += gaussian(rng) * params.mutation_power;
            }
        }
    }
}

impl Genome for NetGenome {
    type Brain = Network;

    fn brain(&self) -> Network {
        Network {
            layers: self.layers.clone(),
            weights: self.weights.clone(),
        }
    }

    fn set_fitness(&mut self, fitness: u32) {
        self.fitness = Some(fitness);
    }
}

/// The phenotype of a [`NetGenome`]: tanh hidden layers, sigmoid outputs.
#[derive(Clone, Debug)]
pub struct Network {
    layers: Vec<usize>,
    weights: Vec<f32>,
}

impl Controller for Network {
    fn calculate(&mut self, inputs: &[f32]) -> Result<Vec<f32>> {
        let expected = self.layers.first().copied().unwrap_or(0);
        if inputs.len() != expected {
            return Err(SimError::ObservationLength {
                expected,
                actual: inputs.len(),
            });
        }

        let mut values = inputs.to_vec();
        let mut cursor = 0;
        let last = self.layers.len().saturating_sub(2);
        for (index, pair) in self.layers.windows(2).enumerate() {
            let (fan_in, fan_out) = (pair[0], pair[1]);
            let mut next = Vec::with_capacity(fan_out);
            for _ in 0..fan_out {
                let row = &self.weights[cursor..cursor + fan_in + 1];
                cursor += fan_in + 1;
                let sum = row[0]
                    + row[1..]
                        .iter()
                        .zip(values.iter())
                        .map(|(w, x)| w * x)
                        .sum::<f32>();
                next.push(if index == last { sigmoid(sum) } else { sum.tanh() });
            }
            values = next;
        }
        Ok(values)
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

fn weight_count(layers: &[usize]) -> usize {
    layers.windows(2).map(|pair| (pair[0] + 1) * pair[1]).sum()
}

// Box-Muller; one standard normal sample.
fn gaussian<R: Rng>(rng: &mut R) -> f32 {
    let u1: f32 = rng.gen_range(f32::EPSILON..1.0);
    let u2: f32 = rng.gen_range(0.0..1.0);
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos()
}

/// Input, hidden and output widths for the configured hidden layers.
pub fn topology(params: &EvolutionConfig) -> Vec<usize> {
    let mut layers = Vec::with_capacity(params.hidden_layers.len() + 2);
    layers.push(OBSERVATION_SIZE);
    layers.extend_from_slice(&params.hidden_layers);
    layers.push(ACTION_SIZE);
    layers
}

#[derive(Serialize, Deserialize)]
struct Checkpoint {
    layers: Vec<usize>,
    generation: u64,
    pending: Vec<NetGenome>,
    best: Option<NetGenome>,
}

/// The bundled [`Evaluator`].
#[derive(Debug)]
pub struct GenePool {
    params: EvolutionConfig,
    layers: Vec<usize>,
    rng: SmallRng,
    // Generation handed out by `genomes`.
    pending: Vec<NetGenome>,
    generation: u64,
    best: Option<NetGenome>,
}

impl GenePool {
    pub fn new(params: EvolutionConfig, seed: u64) -> Self {
        let layers = topology(&params);
        Self {
            params,
            layers,
            rng: SmallRng::seed_from_u64(seed),
            pending: Vec::new(),
            generation: 0,
            best: None,
        }
    }

    pub fn layers(&self) -> &[usize] {
        &self.layers
    }

    /// Generations evaluated so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Fittest genome seen in any generation.
    pub fn best(&self) -> Option<&NetGenome> {
        self.best.as_ref()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let checkpoint = Checkpoint {
            layers: self.layers.clone(),
            generation: self.generation,
            pending: self.pending.clone(),
            best: self.best.clone(),
        };
        let bytes = bincode::serde::encode_to_vec(&checkpoint, bincode::config::standard())?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Restores a pool saved by [`GenePool::save`]. The checkpoint and every
    /// genome in it must match the configured topology.
    pub fn load(path: &Path, params: EvolutionConfig, seed: u64) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let (checkpoint, _): (Checkpoint, usize) =
            bincode::serde::decode_from_slice(&bytes, bincode::config::standard())?;
        let mut pool = Self::new(params, seed);
        if checkpoint.layers != pool.layers {
            return Err(SimError::TopologyMismatch {
                expected: pool.layers,
                actual: checkpoint.layers,
            });
        }
        let expected = weight_count(&pool.layers);
        for genome in checkpoint.pending.iter().chain(checkpoint.best.iter()) {
            if genome.layers != pool.layers {
                return Err(SimError::TopologyMismatch {
                    expected: pool.layers,
                    actual: genome.layers.clone(),
                });
            }
            if genome.weights.len() != expected {
                return Err(SimError::GenomeShape {
                    expected,
                    actual: genome.weights.len(),
                });
            }
        }
        pool.generation = checkpoint.generation;
        pool.pending = checkpoint.pending;
        pool.best = checkpoint.best;
        Ok(pool)
    }

    /// Like [`GenePool::load`], but starts fresh when the checkpoint cannot
    /// be used.
    pub fn resume_or_new(path: &Path, params: EvolutionConfig, seed: u64) -> Self {
        match Self::load(path, params.clone(), seed) {
            Ok(pool) => {
                tracing::info!(
                    path = %path.display(),
                    generation = pool.generation,
                    "Resumed gene pool"
                );
                pool
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "Cannot resume gene pool: {e}");
                Self::new(params, seed)
            }
        }
    }

    // Highest-ranked of `tournament_size` random picks. `ranked` is
    // ascending, so the largest index wins.
    fn tournament<'a>(&mut self, ranked: &'a [Retired<NetGenome>]) -> &'a NetGenome {
        let winner = (0..self.params.tournament_size.max(1))
            .map(|_| self.rng.gen_range(0..ranked.len()))
            .max()
            .unwrap_or(0);
        &ranked[winner].genome
    }
}

impl Evaluator for GenePool {
    type Genome = NetGenome;

    // The batch stays in `pending` until the next evaluation, so a
    // checkpoint taken mid-generation replays that generation.
    fn genomes(&mut self, count: usize) -> Vec<NetGenome> {
        self.pending.truncate(count);
        while self.pending.len() < count {
            let genome = NetGenome::random(&self.layers, &mut self.rng);
            self.pending.push(genome);
        }
        self.pending.clone()
    }

    fn evaluate_generation(&mut self, ranked: &[Retired<NetGenome>]) {
        self.generation += 1;
        let Some(champion) = ranked.last() else {
            return;
        };
        if self
            .best
            .as_ref()
            .is_none_or(|best| best.fitness.unwrap_or(0) < champion.fitness)
        {
            let mut best = champion.genome.clone();
            best.fitness = Some(champion.fitness);
            self.best = Some(best);
        }

        let mut next: Vec<NetGenome> = ranked
            .iter()
            .rev()
            .take(self.params.elitism)
            .map(|r| r.genome.offspring())
            .collect();

        let crossover_rate = f64::from(self.params.crossover_rate);
        while next.len() < ranked.len() {
            let mother = self.tournament(ranked);
            let mut child = if self.rng.gen_bool(crossover_rate) {
                let father = self.tournament(ranked);
                mother.crossover(father, &mut self.rng)
            } else {
                mother.offspring()
            };
            child.mutate(&self.params, &mut self.rng);
            next.push(child);
        }
        self.pending = next;
    }
}
