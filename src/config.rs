//! Configuration for a simulation run.
//!
//! Supports YAML configuration files with defaults matching a classic
//! 128x128 arena of 100 peeps.

use crate::actions::Action;
use crate::barriers::BarrierKind;
use crate::challenges::Challenge;
use crate::genetics::SimilarityMethod;
use crate::sensors::Sensor;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Largest world dimension; coordinates are `i16`.
pub const MAX_WORLD_SIZE: u16 = 0x7fff;

/// Errors raised while loading, saving or validating a [`Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("cannot build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("{barrier:?} leaves {free} free cells for {population} peeps")]
    Crowded {
        barrier: BarrierKind,
        free: usize,
        population: usize,
    },
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub world: WorldConfig,
    pub population: PopulationConfig,
    pub genome: GenomeConfig,
    pub mutation: MutationConfig,
    pub sensors: SensorConfig,
    #[serde(default)]
    pub actions: ActionConfig,
    #[serde(default)]
    pub challenge: Challenge,
    /// Worker threads for the parallel phase of a tick
    #[serde(default = "default_threads")]
    pub threads: usize,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Arena configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    pub size_x: u16,
    pub size_y: u16,
    /// Barrier layout drawn at the start of every generation
    #[serde(default)]
    pub barrier: BarrierKind,
    /// Layout that takes over from `replace_barrier_generation` onward
    #[serde(default)]
    pub replace_barrier: Option<BarrierKind>,
    #[serde(default)]
    pub replace_barrier_generation: u32,
    /// Number of pheromone layers
    pub signal_layers: usize,
}

/// Population and generation timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Peeps spawned each generation
    pub size: usize,
    pub steps_per_generation: u32,
    pub max_generations: u32,
    /// Whether the KILL_FORWARD action is honoured
    pub kill_enable: bool,
}

/// Genome shape and comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenomeConfig {
    pub initial_length_min: usize,
    pub initial_length_max: usize,
    pub max_length: usize,
    /// Upper bound on internal neurons after renumbering
    pub max_neurons: usize,
    pub comparison: SimilarityMethod,
}

/// Genetic operator rates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationConfig {
    /// Per-gene probability of a single bit flip
    pub point_mutation_rate: f32,
    /// Per-genome probability of one insertion or deletion
    pub insertion_deletion_rate: f32,
    /// Share of insertion/deletion events that delete
    pub deletion_ratio: f32,
    pub sexual_reproduction: bool,
    pub choose_parents_by_fitness: bool,
}

/// Sensor and action tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    pub population_radius: f32,
    pub signal_radius: f32,
    pub responsiveness_curve_k: f32,
    /// Initial long-probe distance of a newborn peep
    pub long_probe_distance: u32,
    pub short_probe_barrier_distance: u32,
    /// Sensors genomes can wire to, in index order
    #[serde(default = "all_sensors")]
    pub enabled: Vec<Sensor>,
}

/// Enabled actions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionConfig {
    /// Actions genomes can wire to, in index order
    pub enabled: Vec<Action>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
    /// Generations between summary log lines
    pub summary_interval: u32,
}

fn default_threads() -> usize {
    1
}

fn all_sensors() -> Vec<Sensor> {
    Sensor::ALL.to_vec()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            population: PopulationConfig::default(),
            genome: GenomeConfig::default(),
            mutation: MutationConfig::default(),
            sensors: SensorConfig::default(),
            actions: ActionConfig::default(),
            challenge: Challenge::default(),
            threads: default_threads(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            size_x: 128,
            size_y: 128,
            barrier: BarrierKind::default(),
            replace_barrier: None,
            replace_barrier_generation: 0,
            signal_layers: 1,
        }
    }
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            size: 100,
            steps_per_generation: 100,
            max_generations: 100,
            kill_enable: false,
        }
    }
}

impl Default for GenomeConfig {
    fn default() -> Self {
        Self {
            initial_length_min: 16,
            initial_length_max: 16,
            max_length: 20,
            max_neurons: 10,
            comparison: SimilarityMethod::HammingBits,
        }
    }
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            point_mutation_rate: 0.0001,
            insertion_deletion_rate: 0.0001,
            deletion_ratio: 0.7,
            sexual_reproduction: true,
            choose_parents_by_fitness: true,
        }
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            population_radius: 2.0,
            signal_radius: 1.0,
            responsiveness_curve_k: 2.0,
            long_probe_distance: 16,
            short_probe_barrier_distance: 3,
            enabled: all_sensors(),
        }
    }
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            enabled: Action::ALL.to_vec(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            summary_interval: 1,
        }
    }
}
impl WorldConfig {
    /// Barrier layout drawn for `generation`.
    pub fn barrier_for(&self, generation: u32) -> BarrierKind {
        match self.replace_barrier {
            Some(kind) if generation >= self.replace_barrier_generation => kind,
            _ => self.barrier,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        let world = &self.world;
        if world.size_x < 2 || world.size_y < 2 {
            return invalid("world size must be at least 2x2");
        }
        if world.size_x > MAX_WORLD_SIZE || world.size_y > MAX_WORLD_SIZE {
            return invalid("world size must fit in a signed 16-bit coordinate");
        }
        if world.signal_layers == 0 {
            return invalid("signal_layers must be > 0");
        }

        let cells = world.size_x as usize * world.size_y as usize;
        let population = &self.population;
        if population.size == 0 {
            return invalid("population size must be > 0");
        }
        if population.size >= cells || population.size >= u16::MAX as usize {
            return invalid("population must be smaller than the arena and the handle space");
        }
        if population.steps_per_generation == 0 {
            return invalid("steps_per_generation must be > 0");
        }

        let genome = &self.genome;
        if genome.initial_length_min == 0 || genome.initial_length_min > genome.initial_length_max {
            return invalid("initial genome length range must satisfy 1 <= min <= max");
        }
        if genome.initial_length_max > genome.max_length {
            return invalid("initial_length_max cannot exceed max_length");
        }
        if genome.max_neurons == 0 || genome.max_neurons > 0x80 {
            return invalid("max_neurons must be between 1 and 128");
        }

        let mutation = &self.mutation;
        for (name, rate) in [
            ("point_mutation_rate", mutation.point_mutation_rate),
            ("insertion_deletion_rate", mutation.insertion_deletion_rate),
            ("deletion_ratio", mutation.deletion_ratio),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(ConfigError::Invalid(format!("{} must be within [0, 1]", name)));
            }
        }

        let sensors = &self.sensors;
        if sensors.population_radius <= 0.0 || sensors.signal_radius <= 0.0 {
            return invalid("sensor radii must be > 0");
        }
        if sensors.long_probe_distance == 0 || sensors.short_probe_barrier_distance == 0 {
            return invalid("probe distances must be > 0");
        }
        if sensors.enabled.is_empty() {
            return invalid("no valid sensors configured");
        }
        if self.actions.enabled.is_empty() {
            return invalid("no valid actions configured");
        }
        if has_duplicates(&sensors.enabled) || has_duplicates(&self.actions.enabled) {
            return invalid("enabled sensors and actions must not repeat");
        }

        if self.threads == 0 {
            return invalid("threads must be > 0");
        }
        Ok(())
    }
}

fn has_duplicates<T: PartialEq>(items: &[T]) -> bool {
    items.iter().enumerate().any(|(i, a)| items[..i].contains(a))
}
