//! Sensor catalogue and evaluation.
//!
//! Every reading lands in `[0, 1]`. Sensors are evaluated lazily while
//! the brain runs, against a read-only [`WorldView`] of the tick.

use crate::config::Config;
use crate::geometry::{Coord, Dir};
use crate::genetics::similarity_or_aligned;
use crate::grid::Grid;
use crate::peep::{Peep, Vitals};
use crate::pheromones::PheromoneField;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of sensors in the catalogue.
pub const NUM_SENSORS: usize = 21;

/// Readings farther than this outside `[0, 1]` are logged before clamping.
const CLAMP_TOLERANCE: f32 = 0.01;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sensor {
    /// Distance from the west edge
    LocX,
    /// Distance from the south edge
    LocY,
    BoundaryDistX,
    BoundaryDist,
    BoundaryDistY,
    /// Genome similarity to the peep directly ahead
    GeneticSimFwd,
    LastMoveDirX,
    LastMoveDirY,
    LongprobePopFwd,
    LongprobeBarFwd,
    Population,
    PopulationFwd,
    PopulationLr,
    Osc1,
    Age,
    BarrierFwd,
    BarrierLr,
    Random,
    Signal0,
    Signal0Fwd,
    Signal0Lr,
}

impl Sensor {
    pub const ALL: [Sensor; NUM_SENSORS] = [
        Sensor::LocX,
        Sensor::LocY,
        Sensor::BoundaryDistX,
        Sensor::BoundaryDist,
        Sensor::BoundaryDistY,
        Sensor::GeneticSimFwd,
        Sensor::LastMoveDirX,
        Sensor::LastMoveDirY,
        Sensor::LongprobePopFwd,
        Sensor::LongprobeBarFwd,
        Sensor::Population,
        Sensor::PopulationFwd,
        Sensor::PopulationLr,
        Sensor::Osc1,
        Sensor::Age,
        Sensor::BarrierFwd,
        Sensor::BarrierLr,
        Sensor::Random,
        Sensor::Signal0,
        Sensor::Signal0Fwd,
        Sensor::Signal0Lr,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Sensor::LocX => "loc X",
            Sensor::LocY => "loc Y",
            Sensor::BoundaryDistX => "boundary dist X",
            Sensor::BoundaryDist => "boundary dist",
            Sensor::BoundaryDistY => "boundary dist Y",
            Sensor::GeneticSimFwd => "genetic similarity fwd",
            Sensor::LastMoveDirX => "last move dir X",
            Sensor::LastMoveDirY => "last move dir Y",
            Sensor::LongprobePopFwd => "long probe population fwd",
            Sensor::LongprobeBarFwd => "long probe barrier fwd",
            Sensor::Population => "population",
            Sensor::PopulationFwd => "population fwd",
            Sensor::PopulationLr => "population LR",
            Sensor::Osc1 => "osc1",
            Sensor::Age => "age",
            Sensor::BarrierFwd => "short probe barrier fwd-rev",
            Sensor::BarrierLr => "short probe barrier left-right",
            Sensor::Random => "random",
            Sensor::Signal0 => "signal 0",
            Sensor::Signal0Fwd => "signal 0 fwd",
            Sensor::Signal0Lr => "signal 0 LR",
        }
    }

    /// Compact label used in wiring edge lists.
    pub fn short_name(self) -> &'static str {
        match self {
            Sensor::LocX => "Lx",
            Sensor::LocY => "Ly",
            Sensor::BoundaryDistX => "EDx",
            Sensor::BoundaryDist => "ED",
            Sensor::BoundaryDistY => "EDy",
            Sensor::GeneticSimFwd => "Gen",
            Sensor::LastMoveDirX => "LMx",
            Sensor::LastMoveDirY => "LMy",
            Sensor::LongprobePopFwd => "LPf",
            Sensor::LongprobeBarFwd => "LPb",
            Sensor::Population => "Pop",
            Sensor::PopulationFwd => "Pfd",
            Sensor::PopulationLr => "Plr",
            Sensor::Osc1 => "Osc",
            Sensor::Age => "Age",
            Sensor::BarrierFwd => "Bfd",
            Sensor::BarrierLr => "Blr",
            Sensor::Random => "Rnd",
            Sensor::Signal0 => "Sg",
            Sensor::Signal0Fwd => "Sfd",
            Sensor::Signal0Lr => "Slr",
        }
    }
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Read-only view of the world shared by every peep during the parallel
/// phase of a tick.
#[derive(Clone, Copy)]
pub struct WorldView<'a> {
    pub config: &'a Config,
    pub grid: &'a Grid,
    pub pheromones: &'a PheromoneField,
    /// Every peep body, indexed by handle
    pub peeps: &'a [Peep],
    /// Tick within the current generation
    pub tick: u32,
}

impl<'a> WorldView<'a> {
    /// Reads `sensor` for `peep`, clamped to `[0, 1]`.
    pub fn read<R: Rng + ?Sized>(&self, sensor: Sensor, peep: &Peep, vitals: &Vitals, rng: &mut R) -> f32 {
        let value = self.raw_reading(sensor, peep, vitals, rng);
        if value.is_nan() || value < -CLAMP_TOLERANCE || value > 1.0 + CLAMP_TOLERANCE {
            log::debug!("sensor {} read {} for peep {}, clamping", sensor, value, peep.index);
        }
        if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, 1.0)
        }
    }

    fn raw_reading<R: Rng + ?Sized>(&self, sensor: Sensor, peep: &Peep, vitals: &Vitals, rng: &mut R) -> f32 {
        let world = &self.config.world;
        let (size_x, size_y) = (world.size_x as i32, world.size_y as i32);
        let (x, y) = (peep.loc.x as i32, peep.loc.y as i32);
        let radii = &self.config.sensors;

        match sensor {
            Sensor::LocX => x as f32 / (size_x - 1) as f32,
            Sensor::LocY => y as f32 / (size_y - 1) as f32,
            Sensor::BoundaryDistX => x.min(size_x - x - 1) as f32 / (size_x as f32 / 2.0),
            Sensor::BoundaryDistY => y.min(size_y - y - 1) as f32 / (size_y as f32 / 2.0),
            Sensor::BoundaryDist => {
                let closest = x.min(size_x - x - 1).min(y.min(size_y - y - 1));
                let max_possible = (size_x / 2 - 1).max(size_y / 2 - 1).max(1);
                closest as f32 / max_possible as f32
            }
            Sensor::LastMoveDirX => axis_reading(peep.last_move_dir.as_normalized_coord().x),
            Sensor::LastMoveDirY => axis_reading(peep.last_move_dir.as_normalized_coord().y),
            Sensor::Osc1 => {
                let period = vitals.osc_period.max(1);
                let phase = (self.tick % period) as f32 / period as f32;
                (1.0 - (phase * std::f32::consts::TAU).cos()) / 2.0
            }
            Sensor::Age => vitals.age as f32 / self.config.population.steps_per_generation as f32,
            Sensor::Random => rng.gen::<f32>(),
            Sensor::Population => {
                let mut count = 0u32;
                let mut occupied = 0u32;
                self.grid.visit_neighborhood(peep.loc, radii.population_radius, |c| {
                    count += 1;
                    if self.grid.is_occupied_at(c) {
                        occupied += 1;
                    }
                });
                occupied as f32 / count as f32
            }
            Sensor::PopulationFwd => self.population_along_axis(peep.loc, peep.last_move_dir),
            Sensor::PopulationLr => self.population_along_axis(peep.loc, peep.last_move_dir.rotate_90_cw()),
            Sensor::BarrierFwd => self.short_probe_barrier(peep.loc, peep.last_move_dir),
            Sensor::BarrierLr => self.short_probe_barrier(peep.loc, peep.last_move_dir.rotate_90_cw()),
            Sensor::LongprobePopFwd => {
                self.long_probe_population(peep.loc, peep.last_move_dir, vitals.long_probe_dist) as f32
                    / vitals.long_probe_dist.max(1) as f32
            }
            Sensor::LongprobeBarFwd => {
                self.long_probe_barrier(peep.loc, peep.last_move_dir, vitals.long_probe_dist) as f32
                    / vitals.long_probe_dist.max(1) as f32
            }
            Sensor::GeneticSimFwd => {
                let ahead = peep.loc + peep.last_move_dir;
                match self.grid.occupant(ahead).map(|h| &self.peeps[h as usize]) {
                    Some(other) if other.alive => {
                        similarity_or_aligned(&peep.genome, &other.genome, self.config.genome.comparison)
                    }
                    _ => 0.0,
                }
            }
            Sensor::Signal0 => self.pheromones.density(0, peep.loc, radii.signal_radius),
            Sensor::Signal0Fwd => {
                self.pheromones
                    .density_along_axis(0, peep.loc, peep.last_move_dir, radii.signal_radius)
            }
            Sensor::Signal0Lr => self.pheromones.density_along_axis(
                0,
                peep.loc,
                peep.last_move_dir.rotate_90_cw(),
                radii.signal_radius,
            ),
        }
    }

    /// Occupied neighbors projected onto `dir`, weighted by inverse squared
    /// distance, mapped to `[0, 1]` around 0.5.
    fn population_along_axis(&self, loc: Coord, dir: Dir) -> f32 {
        if dir.is_center() {
            return 0.5;
        }
        let axis = dir.as_normalized_coord();
        let len = ((axis.x * axis.x + axis.y * axis.y) as f64).sqrt();
        let (ux, uy) = (axis.x as f64 / len, axis.y as f64 / len);
        let radius = self.config.sensors.population_radius;

        let mut sum = 0.0f64;
        self.grid.visit_neighborhood(loc, radius, |c| {
            if c != loc && self.grid.is_occupied_at(c) {
                let offset = c - loc;
                let proj = ux * offset.x as f64 + uy * offset.y as f64;
                sum += proj / ((offset.x as f64).powi(2) + (offset.y as f64).powi(2));
            }
        });

        let max_sum = 6.0 * radius as f64;
        ((sum / max_sum + 1.0) / 2.0) as f32
    }

    /// Barrier distance ahead versus behind along `dir`, mapped to `[0, 1]`.
    /// A probe that runs off the grid before its budget counts as clear.
    fn short_probe_barrier(&self, loc: Coord, dir: Dir) -> f32 {
        let distance = self.config.sensors.short_probe_barrier_distance;
        let probe = |step: Coord| {
            let mut count = 0;
            let mut remaining = distance;
            let mut at = loc + step;
            while remaining > 0 && self.grid.in_bounds(at) && !self.grid.is_barrier_at(at) {
                count += 1;
                at = at + step;
                remaining -= 1;
            }
            if remaining > 0 && !self.grid.in_bounds(at) {
                distance
            } else {
                count
            }
        };
        let step = dir.as_normalized_coord();
        let fwd = probe(step) as f32;
        let rev = probe(Coord::new(-step.x, -step.y)) as f32;
        let d = distance as f32;
        ((fwd - rev) + d) / (2.0 * d)
    }

    /// Empty cells ahead before the next peep; the full distance when the
    /// probe meets the border or a barrier first.
    fn long_probe_population(&self, loc: Coord, dir: Dir, distance: u32) -> u32 {
        let mut count = 0;
        let mut remaining = distance;
        let mut at = loc + dir;
        while remaining > 0 && self.grid.in_bounds(at) && self.grid.is_empty_at(at) {
            count += 1;
            at = at + dir;
            remaining -= 1;
        }
        if remaining > 0 && (!self.grid.in_bounds(at) || self.grid.is_barrier_at(at)) {
            distance
        } else {
            count
        }
    }

    /// Cells ahead before the next barrier; the full distance when the
    /// probe meets the border first.
    fn long_probe_barrier(&self, loc: Coord, dir: Dir, distance: u32) -> u32 {
        let mut count = 0;
        let mut remaining = distance;
        let mut at = loc + dir;
        while remaining > 0 && self.grid.in_bounds(at) && !self.grid.is_barrier_at(at) {
            count += 1;
            at = at + dir;
            remaining -= 1;
        }
        if remaining > 0 && !self.grid.in_bounds(at) {
            distance
        } else {
            count
        }
    }
}

/// Maps an axis component of -1, 0, 1 to 0, 0.5, 1.
fn axis_reading(component: i16) -> f32 {
    match component {
        0 => 0.5,
        c if c < 0 => 0.0,
        _ => 1.0,
    }
}
