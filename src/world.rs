//! World simulation engine: the tick scheduler and the generation loop.
//!
//! A tick has two phases. In the parallel phase every live peep senses,
//! thinks and acts against a frozen view of the world; the only shared
//! writes are pheromone emission and pushes onto the death and move queues.
//! The drain phase then runs single-threaded: the challenge's per-tick
//! hook, the death queue, the move queue and pheromone fading, in that
//! order.

use crate::actions::{self, ActionLevels};
use crate::challenges::Challenge;
use crate::config::{Config, ConfigError};
use crate::evolution;
use crate::genetics::{average_genome_length, genetic_diversity, Genome};
use crate::grid::Grid;
use crate::peep::{Peep, PeepState};
use crate::pheromones::PheromoneField;
use crate::population::{PeepsPool, RequestQueues};
use crate::sensors::WorldView;
use crate::stats::{GenerationSummary, StatsHistory, TickSnapshot, WiringUsage};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};

/// The simulation world
pub struct World {
    config: Config,
    grid: Grid,
    pheromones: PheromoneField,
    pool: PeepsPool,
    challenge: Challenge,

    // Clock
    generation: u32,
    tick: u32,
    murder_count: usize,

    // Generation-boundary randomness; per-chunk streams are derived from `seed`
    rng: ChaCha8Rng,
    seed: u64,

    workers: rayon::ThreadPool,
    history: StatsHistory,
}

impl World {
    /// Create a new world with a random seed
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        let seed = rand::thread_rng().gen();
        Self::new_with_seed(config, seed)
    }

    /// Create a new world with a specific seed for reproducibility.
    ///
    /// Fails on an invalid config, or when the barrier layout leaves fewer
    /// free cells than peeps.
    pub fn new_with_seed(config: Config, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        let workers = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .thread_name(|i| format!("peeps-worker-{}", i))
            .build()?;

        let (size_x, size_y) = (config.world.size_x, config.world.size_y);
        let mut world = Self {
            grid: Grid::new(size_x, size_y),
            pheromones: PheromoneField::new(config.world.signal_layers, size_x, size_y),
            pool: PeepsPool::new(config.population.size),
            challenge: config.challenge,
            generation: 0,
            tick: 0,
            murder_count: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            workers,
            history: StatsHistory::new(),
            config,
        };
        world.spawn_generation_zero()?;

        log::debug!(
            "world {}x{} with {} peeps, challenge {:?}, seed {}, {} threads",
            size_x,
            size_y,
            world.config.population.size,
            world.challenge,
            seed,
            world.config.threads
        );
        Ok(world)
    }

    fn spawn_generation_zero(&mut self) -> Result<(), ConfigError> {
        evolution::spawn_generation_zero(
            &mut self.pool,
            &mut self.grid,
            &mut self.pheromones,
            &self.config,
            &mut self.rng,
        )
    }

    /// Restarts from generation 0 with the original seed, forgetting history.
    pub fn reset(&mut self) -> Result<(), ConfigError> {
        self.generation = 0;
        self.tick = 0;
        self.murder_count = 0;
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
        self.history = StatsHistory::new();
        self.spawn_generation_zero()
    }

    /// Runs one tick.
    pub fn step(&mut self) {
        // Phase 1: every live peep senses, thinks and acts in parallel
        self.parallel_phase();

        // Phase 2: single-threaded drain
        self.murder_count += self.pool.queues().pending_deaths();
        self.challenge
            .end_of_tick(&mut self.pool, &self.grid, &self.config, self.tick, &mut self.rng);
        self.pool.drain_death_queue(&mut self.grid);
        self.pool.drain_move_queue(&mut self.grid);
        self.pheromones.fade(0);

        self.tick += 1;
    }

    fn parallel_phase(&mut self) {
        let (peeps, states, queues) = self.pool.split_for_tick();
        let view = WorldView {
            config: &self.config,
            grid: &self.grid,
            pheromones: &self.pheromones,
            peeps,
            tick: self.tick,
        };
        let chunk_len = states.len().div_ceil(self.config.threads).max(1);
        let (seed, generation, tick) = (self.seed, self.generation, self.tick);

        self.workers.install(|| {
            states
                .par_chunks_mut(chunk_len)
                .enumerate()
                .for_each(|(chunk, chunk_states)| {
                    let mut rng = ChaCha8Rng::seed_from_u64(chunk_seed(seed, generation, tick, chunk));
                    // Slot 0 is reserved, so state `i` belongs to handle `i + 1`.
                    let first = chunk * chunk_len + 1;
                    for (offset, state) in chunk_states.iter_mut().enumerate() {
                        let peep = &view.peeps[first + offset];
                        if peep.alive {
                            think_and_act(&view, peep, state, queues, &mut rng);
                        }
                    }
                });
        });
    }

    /// Runs the remaining ticks of the current generation, then breeds the
    /// next one.
    ///
    /// Fails when the next generation's barriers leave no room for the
    /// population; the arena is then empty until [`World::reset`] succeeds.
    pub fn run_generation(&mut self) -> Result<GenerationSummary, ConfigError> {
        while self.tick < self.config.population.steps_per_generation {
            self.step();
        }
        self.end_generation()
    }

    fn end_generation(&mut self) -> Result<GenerationSummary, ConfigError> {
        let scored = self.challenge.evaluate_generation(
            &self.pool,
            &self.grid,
            &self.config,
            self.generation,
            &mut self.rng,
        );

        let genomes: Vec<&Genome> = self.pool.iter().map(|p| &p.genome).collect();
        let summary = GenerationSummary {
            generation: self.generation,
            survivors: scored.len(),
            diversity: genetic_diversity(&genomes, self.config.genome.comparison, &mut self.rng),
            average_genome_length: average_genome_length(&genomes, &mut self.rng),
            murder_count: self.murder_count,
        };

        let interval = self.config.logging.summary_interval;
        if interval > 0 && self.generation % interval == 0 {
            log::info!("{}", summary.summary());
        }

        let parents = evolution::spawn_next_generation(
            &scored,
            &mut self.pool,
            &mut self.grid,
            &mut self.pheromones,
            &self.config,
            self.generation + 1,
            &mut self.rng,
        )?;
        // Extinction starts the count over.
        self.generation = if parents == 0 { 0 } else { self.generation + 1 };
        self.tick = 0;
        self.murder_count = 0;

        self.history.record(summary.clone());
        Ok(summary)
    }

    /// Run `generations` complete generations
    pub fn run(&mut self, generations: u32) -> Result<(), ConfigError> {
        for _ in 0..generations {
            self.run_generation()?;
        }
        Ok(())
    }

    /// Runs until `max_generations` is reached or `stop` is raised. The flag
    /// is checked before every tick. Returns the number of generations
    /// completed.
    ///
    /// Extinction sets the generation back to 0, so under a challenge nobody
    /// passes only `stop` ends the loop.
    pub fn run_until(&mut self, stop: &AtomicBool) -> Result<u32, ConfigError> {
        let mut completed = 0;
        while self.generation < self.config.population.max_generations {
            while self.tick < self.config.population.steps_per_generation {
                if stop.load(Ordering::Relaxed) {
                    return Ok(completed);
                }
                self.step();
            }
            self.end_generation()?;
            completed += 1;
        }
        Ok(completed)
    }

    /// Get current population count
    pub fn population(&self) -> usize {
        self.pool.alive_count()
    }

    /// Get seed for reproducibility
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Tick within the current generation
    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn pheromones(&self) -> &PheromoneField {
        &self.pheromones
    }

    pub fn pool(&self) -> &PeepsPool {
        &self.pool
    }

    pub fn challenge(&self) -> Challenge {
        self.challenge
    }

    pub fn history(&self) -> &StatsHistory {
        &self.history
    }

    /// Copy of the current tick for rendering
    pub fn snapshot(&self) -> TickSnapshot {
        TickSnapshot::capture(self.generation, self.tick, &self.pool, &self.grid, &self.pheromones)
    }

    pub fn wiring_usage(&self) -> WiringUsage {
        WiringUsage::tally(&self.pool, &self.config.sensors.enabled, &self.config.actions.enabled)
    }
}

/// One peep's share of the parallel phase.
fn think_and_act<R: Rng + ?Sized>(
    view: &WorldView<'_>,
    peep: &Peep,
    state: &mut PeepState,
    queues: &RequestQueues,
    rng: &mut R,
) {
    let PeepState { net, vitals } = state;
    vitals.age += 1;

    let config = view.config;
    let live = net.feed_forward(config.actions.enabled.len(), |s| {
        view.read(config.sensors.enabled[s], peep, &*vitals, &mut *rng)
    });
    let levels = ActionLevels::from_live(&config.actions.enabled, &live);
    actions::execute(&levels, view, peep, vitals, queues, rng);
}

/// Seed of one chunk's random stream for one tick (splitmix64 finalizer).
fn chunk_seed(seed: u64, generation: u32, tick: u32, chunk: usize) -> u64 {
    let mut z = seed
        ^ ((generation as u64) << 32 | tick as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15)
        ^ (chunk as u64).wrapping_mul(0xd6e8_feb8_6659_fd93);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
