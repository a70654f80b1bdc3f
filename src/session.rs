//! The generational training loop.
//!
//! A [`TrainingSession`] owns the population rosters, the board of the
//! individual currently playing, its controller and both heartbeats. The
//! caller polls it with the current time; every heartbeat that fires runs one
//! tick to completion before `poll` returns.

use crate::brain::{Controller, Evaluator, Genome};
use crate::clock::Scheduler;
use crate::config::AppConfig;
use crate::error::{Result, SimError};
use crate::game::{Game, Step};
use crate::input::{InputHandle, TurnGate};
use crate::population::{GenerationReport, Population};
use crate::pos::Pos;
use crate::snake::{Cause, Dir, Turn};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, trace};

/// Something that happened while polling.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Moved {
        ate: bool,
    },
    Retired {
        generation: u64,
        individual: usize,
        cause: Cause,
        fitness: u32,
    },
    Rollover(GenerationReport),
}

/// Read-only picture of the board and counters.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Snapshot {
    pub length: usize,
    pub cells: Vec<bool>,
    /// Head first.
    pub segments: Vec<Pos>,
    pub heading: Dir,
    pub apple: Option<Pos>,
    pub generation: u64,
    /// 1-based position of the current individual in its generation.
    pub individual: usize,
    pub population: usize,
    pub score: u32,
    pub health: u32,
    pub food_eaten: u32,
    pub paused: bool,
}

type Brain<E> = <<E as Evaluator>::Genome as Genome>::Brain;

pub struct TrainingSession<E: Evaluator> {
    evaluator: E,
    population: Population<E::Genome>,
    game: Game,
    // None in human mode.
    brain: Option<Brain<E>>,
    scheduler: Scheduler,
    gate: Arc<TurnGate>,
    rng: SmallRng,
    length: usize,
    human: bool,
}

impl<E: Evaluator> TrainingSession<E> {
    /// Pulls the first generation and puts its first individual on the board.
    /// Both heartbeats start counting from `now`. An invalid config is
    /// rejected before anything is built.
    pub fn new(config: &AppConfig, mut evaluator: E, now: Instant) -> Result<Self> {
        config
            .validate()
            .map_err(|e| SimError::Config(format!("{e:#}")))?;
        let mut rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        let length = config.grid.length;
        let population = Population::spawn(&mut evaluator, config.population.size)?;
        let game = Game::new(length, &mut rng)?;

        let mut session = Self {
            evaluator,
            population,
            game,
            brain: None,
            scheduler: Scheduler::from_config(&config.timing),
            gate: Arc::new(TurnGate::new()),
            rng,
            length,
            human: config.human_player,
        };
        session.brain = session.current_brain();
        session.scheduler.restart(now);
        Ok(session)
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    pub fn population(&self) -> &Population<E::Genome> {
        &self.population
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn generation(&self) -> u64 {
        self.population.generation()
    }

    /// 1-based number of the individual on the board.
    pub fn individual(&self) -> usize {
        self.population.played() + 1
    }

    pub fn is_human(&self) -> bool {
        self.human
    }

    pub fn is_paused(&self) -> bool {
        self.scheduler.is_paused()
    }

    /// Runs whatever heartbeats are due at `now`: the move tick first, then
    /// the starvation check.
    pub fn poll(&mut self, now: Instant) -> Result<Vec<Event>> {
        let mut events = Vec::new();
        if self.scheduler.fire_movement(now) {
            events.extend(self.move_tick(now)?);
        }
        if self.scheduler.fire_starvation(now) {
            events.extend(self.starve_tick(now)?);
        }
        Ok(events)
    }

    /// One move tick, regardless of the heartbeat.
    ///
    /// A turn requested since the previous tick is applied before moving; the
    /// controller's choice applies to the following tick. The turn lock opens
    /// again once the tick is over.
    pub fn move_tick(&mut self, now: Instant) -> Result<Vec<Event>> {
        if let Some(turn) = self.gate.take() {
            self.game.snake_mut().turn(turn);
        }
        let controller = self
            .brain
            .as_mut()
            .map(|brain| brain as &mut dyn Controller);
        let step = self.game.step(controller, &mut self.rng);
        self.gate.release();

        match step? {
            Step::Moved { ate } => {
                trace!(
                    head = ?self.game.snake().head().current,
                    score = self.game.snake().score(),
                    ate,
                    "Tick"
                );
                Ok(vec![Event::Moved { ate }])
            }
            Step::Over(cause) => self.retire(cause, now),
        }
    }

    /// One starvation check, regardless of the heartbeat.
    pub fn starve_tick(&mut self, now: Instant) -> Result<Vec<Event>> {
        match self.game.starve() {
            Some(cause) => self.retire(cause, now),
            None => Ok(Vec::new()),
        }
    }

    /// Retires the current individual as if it had died.
    pub fn reset(&mut self, now: Instant) -> Result<Vec<Event>> {
        self.retire(Cause::Reset, now)
    }

    pub fn set_paused(&mut self, paused: bool, now: Instant) {
        self.scheduler.set_paused(paused, now);
        debug!(paused, "Pause state changed");
    }

    pub fn toggle_pause(&mut self, now: Instant) {
        let paused = !self.scheduler.is_paused();
        self.set_paused(paused, now);
    }

    /// Queues a turn for the next move tick. Returns false when a turn is
    /// already pending.
    pub fn request_turn(&self, turn: Turn) -> bool {
        self.gate.request(turn)
    }

    /// Handle for requesting turns from another thread.
    pub fn input_handle(&self) -> InputHandle {
        InputHandle::new(Arc::clone(&self.gate))
    }

    pub fn snapshot(&self) -> Snapshot {
        let snake = self.game.snake();
        Snapshot {
            length: self.length,
            cells: self.game.grid().cells().to_vec(),
            segments: snake.positions(),
            heading: snake.dir(),
            apple: self.game.apple().map(|a| a.pos()),
            generation: self.generation(),
            individual: self.individual(),
            population: self.population.size(),
            score: snake.score(),
            health: snake.health(),
            food_eaten: snake.food_eaten(),
            paused: self.is_paused(),
        }
    }

    fn retire(&mut self, cause: Cause, now: Instant) -> Result<Vec<Event>> {
        let generation = self.generation();
        let individual = self.individual();
        let cause = self.game.end(cause);
        let fitness = self.game.snake().fitness();
        debug!(generation, individual, ?cause, fitness, "Individual retired");

        let mut events = vec![Event::Retired {
            generation,
            individual,
            cause,
            fitness,
        }];
        if self.population.retire(self.game.snake()) {
            let report = self.population.rollover(&mut self.evaluator)?;
            info!(
                generation = report.generation,
                best = report.best,
                mean = report.mean,
                worst = report.worst,
                best_food = report.best_food,
                "Generation complete"
            );
            events.push(Event::Rollover(report));
        }

        self.game = Game::new(self.length, &mut self.rng)?;
        self.brain = self.current_brain();
        self.scheduler.restart(now);
        self.gate.clear();
        Ok(events)
    }

    fn current_brain(&self) -> Option<Brain<E>> {
        if self.human {
            return None;
        }
        self.population.current().map(|genome| genome.brain())
    }
}
