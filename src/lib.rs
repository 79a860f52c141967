//! # PEEPS
//!
//! Grid-world evolution simulator. Each peep carries a genome that wires a
//! small neural brain between sensors and actions; survivors of a
//! selectable challenge breed the next generation.
//!
//! ## Features
//!
//! - **Parallel**: peeps think concurrently on a Rayon pool; deaths and
//!   moves are queued and applied single-threaded
//! - **Evolvable**: crossover, insertion/deletion and point mutations of
//!   gene sequences
//! - **Configurable**: YAML configuration files
//! - **Reproducible**: seeded random number generation, including the
//!   per-worker streams
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use peeps::{World, Config};
//!
//! // Create world with default config
//! let config = Config::default();
//! let mut world = World::new(config).unwrap();
//!
//! // Run ten generations
//! world.run(10).unwrap();
//!
//! // Check results
//! println!("Population: {}", world.population());
//! println!("Generation: {}", world.generation());
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use peeps::{Challenge, Config};
//!
//! let mut config = Config::default();
//! config.population.size = 500;
//! config.challenge = Challenge::CenterWeighted;
//! config.mutation.point_mutation_rate = 0.001;
//! assert!(config.validate().is_ok());
//! ```

pub mod actions;
pub mod barriers;
pub mod challenges;
pub mod config;
pub mod evolution;
pub mod genetics;
pub mod geometry;
pub mod grid;
pub mod neural;
pub mod peep;
pub mod pheromones;
pub mod population;
pub mod sensors;
pub mod stats;
pub mod world;

// Re-export main types
pub use actions::Action;
pub use barriers::BarrierKind;
pub use challenges::Challenge;
pub use config::{Config, ConfigError};
pub use peep::{Peep, PeepState};
pub use sensors::Sensor;
pub use stats::{GenerationSummary, StatsHistory, TickSnapshot};
pub use world::World;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run a quick benchmark
pub fn benchmark(generations: u32, population: usize) -> Result<BenchmarkResult, ConfigError> {
    use std::time::Instant;

    let mut config = Config::default();
    config.population.size = population;

    let mut world = World::new_with_seed(config, 42)?;
    let steps = generations as u64 * world.config().population.steps_per_generation as u64;

    let start = Instant::now();
    world.run(generations)?;
    let elapsed = start.elapsed();

    Ok(BenchmarkResult {
        generations,
        steps,
        population,
        final_survivors: world.history().last().map_or(0, |s| s.survivors),
        elapsed_secs: elapsed.as_secs_f64(),
        steps_per_second: steps as f64 / elapsed.as_secs_f64(),
    })
}

/// Benchmark result
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub generations: u32,
    pub steps: u64,
    pub population: usize,
    pub final_survivors: usize,
    pub elapsed_secs: f64,
    pub steps_per_second: f64,
}

impl std::fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Benchmark Results ===")?;
        writeln!(f, "Generations: {} ({} steps)", self.generations, self.steps)?;
        writeln!(f, "Population: {}", self.population)?;
        writeln!(f, "Survivors of last generation: {}", self.final_survivors)?;
        writeln!(f, "Time: {:.3}s", self.elapsed_secs)?;
        writeln!(f, "Speed: {:.1} steps/s", self.steps_per_second)?;
        Ok(())
    }
}
