//! PEEPS - CLI Entry Point
//!
//! Grid-world evolution simulator.

use clap::{Parser, Subcommand};
use peeps::peep::edge_list;
use peeps::{benchmark, Config, World};
use std::path::PathBuf;
use std::time::Instant;

/// Genomes printed in the final report
const SAMPLE_GENOMES: usize = 3;

#[derive(Parser)]
#[command(name = "peeps")]
#[command(version)]
#[command(about = "Grid-world evolution simulator with genome-wired neural brains")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a new simulation
    Run {
        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Number of generations (defaults to max_generations from the config)
        #[arg(short, long)]
        generations: Option<u32>,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// Worker threads (overrides the config)
        #[arg(short, long)]
        threads: Option<usize>,

        /// Write the generation history as JSON
        #[arg(long)]
        summary: Option<PathBuf>,

        /// Quiet mode (minimal output)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Run performance benchmark
    Benchmark {
        /// Number of generations
        #[arg(short, long, default_value = "10")]
        generations: u32,

        /// Population size
        #[arg(short, long, default_value = "1000")]
        population: usize,
    },

    /// Generate default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            generations,
            seed,
            threads,
            summary,
            quiet,
        } => run_simulation(config, generations, seed, threads, summary, quiet),

        Commands::Benchmark { generations, population } => {
            init_logging("warn");
            run_benchmark(generations, population)
        }

        Commands::Init { output } => {
            init_logging("info");
            generate_config(output)
        }
    }
}

fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run_simulation(
    config_path: PathBuf,
    generations: Option<u32>,
    seed: Option<u64>,
    threads: Option<usize>,
    summary_path: Option<PathBuf>,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    // Load or create config
    let (mut config, from_file) = if config_path.exists() {
        (Config::from_file(&config_path)?, true)
    } else {
        (Config::default(), false)
    };
    if let Some(threads) = threads {
        config.threads = threads;
    }
    init_logging(if quiet { "warn" } else { &config.logging.log_level });

    if from_file {
        log::info!("Loaded config from {:?}", config_path);
    } else {
        log::info!("No config at {:?}, using defaults", config_path);
    }

    let generations = generations.unwrap_or(config.population.max_generations);
    let mut world = match seed {
        Some(s) => World::new_with_seed(config.clone(), s)?,
        None => World::new(config.clone())?,
    };

    if !quiet {
        println!("Starting simulation");
        println!("  Population: {}", world.population());
        println!("  Grid size: {}x{}", config.world.size_x, config.world.size_y);
        println!("  Challenge: {:?}", config.challenge);
        println!("  Barrier: {:?}", config.world.barrier);
        if let Some(replacement) = config.world.replace_barrier {
            println!(
                "  Barrier from generation {}: {:?}",
                config.world.replace_barrier_generation, replacement
            );
        }
        println!("  Generations: {}", generations);
        println!("  Seed: {}", world.seed());
        println!();
    }

    let start = Instant::now();
    world.run(generations)?;
    let elapsed = start.elapsed();
    let steps = generations as u64 * config.population.steps_per_generation as u64;

    println!();
    println!("=== Simulation Complete ===");
    println!("Time: {:.2}s", elapsed.as_secs_f64());
    println!("Speed: {:.1} steps/s", steps as f64 / elapsed.as_secs_f64());
    println!("Generation: {}", world.generation());
    if let Some(last) = world.history().last() {
        println!("Last summary: {}", last.summary());
    }

    if !quiet {
        print_sample_brains(&world);
        print_wiring_usage(&world);
    }

    if let Some(path) = summary_path {
        world.history().save_json(&path)?;
        println!("Summary history: {:?}", path);
    }

    Ok(())
}

fn print_sample_brains(world: &World) {
    let config = world.config();
    println!();
    println!("=== Sample Genomes ===");
    for peep in world.pool().living().take(SAMPLE_GENOMES) {
        let net = &world.pool().state(peep.index).net;
        println!("Peep {} ({} genes): {}", peep.index, peep.genome.len(), peep.genome.to_hex());
        print!("{}", edge_list(net, &config.sensors.enabled, &config.actions.enabled));
    }
}

fn print_wiring_usage(world: &World) {
    let usage = world.wiring_usage();
    println!();
    println!("=== Wiring Usage ===");
    for (sensor, count) in usage.sensors.iter().filter(|(_, n)| *n > 0) {
        println!("  {:<20} {}", sensor.name(), count);
    }
    for (action, count) in usage.actions.iter().filter(|(_, n)| *n > 0) {
        println!("  {:<20} {}", action.name(), count);
    }
}

fn run_benchmark(generations: u32, population: usize) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== PEEPS Benchmark ===");
    println!("Generations: {}", generations);
    println!("Population: {}", population);
    println!();

    let result = benchmark(generations, population)?;
    println!("{}", result);

    Ok(())
}

fn generate_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    config.save(&output)?;
    println!("Configuration saved to: {:?}", output);
    Ok(())
}
