//! Peeps: the grid-dwelling agents.
//!
//! A peep is split in two. [`Peep`] is the body other peeps and the
//! drain phase see (location, facing, genome). [`PeepState`] is the part
//! only the peep itself mutates during a tick (its brain and vitals).

use crate::actions::Action;
use crate::config::Config;
use crate::geometry::{Coord, Dir};
use crate::genetics::{genetic_color, Genome};
use crate::grid::Grid;
use crate::neural::{compile, NeuralNet, Sink, Source, WiringLimits};
use crate::sensors::Sensor;
use rand::Rng;
use std::fmt::Write;

/// Oscillator period of a newborn peep.
pub const INITIAL_OSC_PERIOD: u32 = 34;

/// Responsiveness of a newborn peep.
pub const INITIAL_RESPONSIVENESS: f32 = 0.5;

/// Shared-read part of a peep.
#[derive(Clone, Debug, Default)]
pub struct Peep {
    /// Handle stored in the grid; 0 is reserved
    pub index: u16,
    pub alive: bool,
    pub loc: Coord,
    pub birth_loc: Coord,
    pub last_move_dir: Dir,
    pub genome: Genome,
    /// Flags set by survival challenges during a generation
    pub challenge_bits: u32,
}

impl Peep {
    pub fn color(&self) -> u8 {
        genetic_color(&self.genome)
    }
}

/// Per-peep parameters the brain can adjust.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vitals {
    /// Ticks lived this generation
    pub age: u32,
    pub responsiveness: f32,
    pub osc_period: u32,
    pub long_probe_dist: u32,
}

/// Exclusively-owned part of a peep.
#[derive(Clone, Debug)]
pub struct PeepState {
    pub net: NeuralNet,
    pub vitals: Vitals,
}

impl Default for PeepState {
    fn default() -> Self {
        Self {
            net: NeuralNet::default(),
            vitals: Vitals {
                age: 0,
                responsiveness: INITIAL_RESPONSIVENESS,
                osc_period: INITIAL_OSC_PERIOD,
                long_probe_dist: 0,
            },
        }
    }
}

/// Wiring limits implied by the enabled sensors and actions.
pub fn wiring_limits(config: &Config) -> WiringLimits {
    WiringLimits {
        num_sensors: config.sensors.enabled.len(),
        num_actions: config.actions.enabled.len(),
        max_neurons: config.genome.max_neurons,
    }
}

/// Births a peep at `loc` and stamps its handle into the grid.
pub fn spawn<R: Rng + ?Sized>(
    index: u16,
    loc: Coord,
    genome: Genome,
    config: &Config,
    grid: &mut Grid,
    rng: &mut R,
) -> (Peep, PeepState) {
    debug_assert!(index != 0, "handle 0 is reserved");
    grid.set(loc, index);

    let net = compile(&genome, &wiring_limits(config));
    let peep = Peep {
        index,
        alive: true,
        loc,
        birth_loc: loc,
        last_move_dir: Dir::random8(rng),
        genome,
        challenge_bits: 0,
    };
    let state = PeepState {
        net,
        vitals: Vitals {
            age: 0,
            responsiveness: INITIAL_RESPONSIVENESS,
            osc_period: INITIAL_OSC_PERIOD,
            long_probe_dist: config.sensors.long_probe_distance,
        },
    };
    (peep, state)
}

/// One line per connection: `source sink weight`, using sensor and action
/// short names and `N<i>` for neurons.
pub fn edge_list(net: &NeuralNet, sensors: &[Sensor], actions: &[Action]) -> String {
    let mut out = String::new();
    for conn in net.connections() {
        let source = match conn.source {
            Source::Sensor(s) => sensors[s].short_name().to_string(),
            Source::Neuron(n) => format!("N{}", n),
        };
        let sink = match conn.sink {
            Sink::Action(a) => actions[a].short_name().to_string(),
            Sink::Neuron(n) => format!("N{}", n),
        };
        let _ = writeln!(out, "{} {} {}", source, sink, conn.weight);
    }
    out
}
