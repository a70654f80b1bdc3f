//! Run configuration, read from `config.toml`.
//!
//! Every field has a default, so a partial file only overrides what it
//! names. Defaults follow the classic setup: an 8x8 board, 45 snakes per
//! generation and heartbeats of 132 ms / 5280 ms at double speed.
//!
//! ```toml
//! seed = 42
//!
//! [grid]
//! length = 10
//!
//! [population]
//! size = 60
//!
//! [timing]
//! speed_multiplier = 4
//!
//! [evolution]
//! hidden_layers = [6]
//! mutation_rate = 0.1
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct GridConfig {
    /// Cells per side.
    pub length: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { length: 8 }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct PopulationConfig {
    /// Snakes per generation.
    pub size: usize,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self { size: 45 }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct TimingConfig {
    pub move_delay_ms: u64,
    pub starve_delay_ms: u64,
    /// Divides both delays.
    pub speed_multiplier: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            move_delay_ms: 132,
            starve_delay_ms: 5280,
            speed_multiplier: 2,
        }
    }
}

impl TimingConfig {
    pub fn move_delay(&self) -> Duration {
        Duration::from_millis(self.move_delay_ms / u64::from(self.speed_multiplier.max(1)))
    }

    pub fn starve_delay(&self) -> Duration {
        Duration::from_millis(self.starve_delay_ms / u64::from(self.speed_multiplier.max(1)))
    }
}

/// Parameters of the bundled gene pool.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct EvolutionConfig {
    /// Hidden layer widths between the 6 inputs and 3 outputs.
    pub hidden_layers: Vec<usize>,
    /// Best genomes copied unchanged into the next generation.
    pub elitism: usize,
    pub tournament_size: usize,
    pub crossover_rate: f32,
    /// Chance per weight of a Gaussian nudge.
    pub mutation_rate: f32,
    /// Standard deviation of the nudge.
    pub mutation_power: f32,
    /// Chance per weight of being redrawn from scratch.
    pub reset_rate: f32,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            hidden_layers: Vec::new(),
            elitism: 2,
            tournament_size: 3,
            crossover_rate: 0.75,
            mutation_rate: 0.2,
            mutation_power: 0.5,
            reset_rate: 0.02,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub seed: Option<u64>,
    /// Steer by hand instead of asking the controller.
    pub human_player: bool,
    pub grid: GridConfig,
    pub population: PopulationConfig,
    pub timing: TimingConfig,
    pub evolution: EvolutionConfig,
}

impl AppConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            (3..=64).contains(&self.grid.length),
            "Grid length must be in [3, 64]"
        );
        anyhow::ensure!(self.population.size > 0, "Population size must be positive");

        anyhow::ensure!(self.timing.speed_multiplier > 0, "Speed multiplier must be positive");
        anyhow::ensure!(
            !self.timing.move_delay().is_zero(),
            "Move delay must stay positive after the speed multiplier"
        );
        anyhow::ensure!(
            !self.timing.starve_delay().is_zero(),
            "Starvation delay must stay positive after the speed multiplier"
        );

        let evo = &self.evolution;
        anyhow::ensure!(
            evo.hidden_layers.iter().all(|&w| w > 0),
            "Hidden layers must not be empty"
        );
        anyhow::ensure!(
            evo.elitism <= self.population.size,
            "Elitism cannot exceed the population size"
        );
        anyhow::ensure!(evo.tournament_size > 0, "Tournament size must be positive");
        for (name, rate) in [
            ("Crossover rate", evo.crossover_rate),
            ("Mutation rate", evo.mutation_rate),
            ("Reset rate", evo.reset_rate),
        ] {
            anyhow::ensure!((0.0..=1.0).contains(&rate), "{name} must be in [0.0, 1.0]");
        }
        anyhow::ensure!(
            evo.mutation_power >= 0.0,
            "Mutation power must be non-negative"
        );
        Ok(())
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `path`, or returns the validated defaults if it does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("parsing {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timing.move_delay(), Duration::from_millis(66));
        assert_eq!(config.timing.starve_delay(), Duration::from_millis(2640));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            seed = 7

            [grid]
            length = 10

            [evolution]
            hidden_layers = [4]
            "#,
        )
        .unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.grid.length, 10);
        assert_eq!(config.population.size, 45);
        assert_eq!(config.evolution.hidden_layers, vec![4]);
        assert_eq!(config.evolution.elitism, 2);
    }

    #[test]
    fn test_invalid_grid_length() {
        let config = AppConfig {
            grid: GridConfig { length: 2 },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_speed_multiplier() {
        let config = AppConfig {
            timing: TimingConfig {
                speed_multiplier: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_delay_rounding_to_zero_is_rejected() {
        let config = AppConfig {
            timing: TimingConfig {
                move_delay_ms: 1,
                speed_multiplier: 2,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_mutation_rate() {
        let config = AppConfig {
            evolution: EvolutionConfig {
                mutation_rate: 1.5,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_elitism_larger_than_population() {
        let config = AppConfig {
            population: PopulationConfig { size: 3 },
            evolution: EvolutionConfig {
                elitism: 4,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = AppConfig::load(Path::new("definitely/not/here.toml")).unwrap();
        assert_eq!(config.grid.length, 8);
    }
}
