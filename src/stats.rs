//! Statistics and read-only snapshots of the simulation.

use crate::actions::Action;
use crate::geometry::Coord;
use crate::grid::Grid;
use crate::neural::{Sink, Source};
use crate::pheromones::PheromoneField;
use crate::population::PeepsPool;
use crate::sensors::Sensor;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One live peep as seen by a renderer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeepSnapshot {
    pub index: u16,
    pub loc: Coord,
    /// Genome-derived color; related peeps tend to share it
    pub color: u8,
}

/// Copy of everything needed to draw one tick.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TickSnapshot {
    pub generation: u32,
    pub tick: u32,
    pub peeps: Vec<PeepSnapshot>,
    pub barriers: Vec<Coord>,
    /// One column-major buffer per pheromone layer
    pub pheromones: Vec<Vec<u8>>,
}

impl TickSnapshot {
    pub fn capture(generation: u32, tick: u32, pool: &PeepsPool, grid: &Grid, pheromones: &PheromoneField) -> Self {
        Self {
            generation,
            tick,
            peeps: pool
                .living()
                .map(|peep| PeepSnapshot {
                    index: peep.index,
                    loc: peep.loc,
                    color: peep.color(),
                })
                .collect(),
            barriers: grid.barrier_locations().to_vec(),
            pheromones: (0..pheromones.num_layers()).map(|layer| pheromones.layer_snapshot(layer)).collect(),
        }
    }
}

/// End-of-generation report
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub generation: u32,
    /// Peeps that passed the challenge and became parents
    pub survivors: usize,
    /// `1 - mean similarity` of sampled neighbouring genomes
    pub diversity: f32,
    pub average_genome_length: f32,
    /// Death requests queued over the generation, counted before the drain.
    /// Two attackers killing the same victim count twice.
    pub murder_count: usize,
}

impl GenerationSummary {
    /// Format as a one-line summary
    pub fn summary(&self) -> String {
        format!(
            "Gen:{:5} | Survivors:{:5} | Diversity:{:.3} | Genome:{:.1} | Murders:{}",
            self.generation, self.survivors, self.diversity, self.average_genome_length, self.murder_count
        )
    }
}

/// Every generation summary of a run
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StatsHistory {
    pub summaries: Vec<GenerationSummary>,
}

impl StatsHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, summary: GenerationSummary) {
        self.summaries.push(summary);
    }

    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }

    pub fn last(&self) -> Option<&GenerationSummary> {
        self.summaries.last()
    }

    /// Survivors per generation
    pub fn survivor_series(&self) -> Vec<(u32, usize)> {
        self.summaries.iter().map(|s| (s.generation, s.survivors)).collect()
    }

    pub fn diversity_series(&self) -> Vec<(u32, f32)> {
        self.summaries.iter().map(|s| (s.generation, s.diversity)).collect()
    }

    pub fn genome_length_series(&self) -> Vec<(u32, f32)> {
        self.summaries.iter().map(|s| (s.generation, s.average_genome_length)).collect()
    }

    pub fn murder_series(&self) -> Vec<(u32, usize)> {
        self.summaries.iter().map(|s| (s.generation, s.murder_count)).collect()
    }

    /// Save history to a JSON file
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }

    /// Load history from a JSON file
    pub fn load_json<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

/// How many live brains wire each enabled sensor and action.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WiringUsage {
    pub sensors: Vec<(Sensor, usize)>,
    pub actions: Vec<(Action, usize)>,
}

impl WiringUsage {
    /// Counts connection endpoints over every live peep. A brain wiring one
    /// sensor twice counts twice.
    pub fn tally(pool: &PeepsPool, sensors: &[Sensor], actions: &[Action]) -> Self {
        let mut sensor_counts = vec![0usize; sensors.len()];
        let mut action_counts = vec![0usize; actions.len()];
        for peep in pool.living() {
            for conn in pool.state(peep.index).net.connections() {
                if let Source::Sensor(s) = conn.source {
                    sensor_counts[s] += 1;
                }
                if let Sink::Action(a) = conn.sink {
                    action_counts[a] += 1;
                }
            }
        }
        Self {
            sensors: sensors.iter().copied().zip(sensor_counts).collect(),
            actions: actions.iter().copied().zip(action_counts).collect(),
        }
    }
}
