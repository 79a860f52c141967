//! Action catalogue and interpretation of a brain's raw action levels.

use crate::geometry::{Coord, Dir};
use crate::peep::{Peep, Vitals};
use crate::population::RequestQueues;
use crate::sensors::WorldView;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of actions in the catalogue.
pub const NUM_ACTIONS: usize = 17;

/// Action levels below this (after squashing) never emit or kill.
const FIRE_THRESHOLD: f32 = 0.5;

/// Upper bound of the long-probe distance action.
const MAX_LONG_PROBE_DISTANCE: f32 = 32.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    MoveX,
    MoveY,
    MoveForward,
    /// Sideways, clockwise of the last move
    MoveRl,
    MoveRandom,
    SetOscillatorPeriod,
    SetLongprobeDist,
    SetResponsiveness,
    EmitSignal0,
    MoveEast,
    MoveWest,
    MoveNorth,
    MoveSouth,
    MoveLeft,
    MoveRight,
    MoveReverse,
    KillForward,
}

impl Action {
    pub const ALL: [Action; NUM_ACTIONS] = [
        Action::MoveX,
        Action::MoveY,
        Action::MoveForward,
        Action::MoveRl,
        Action::MoveRandom,
        Action::SetOscillatorPeriod,
        Action::SetLongprobeDist,
        Action::SetResponsiveness,
        Action::EmitSignal0,
        Action::MoveEast,
        Action::MoveWest,
        Action::MoveNorth,
        Action::MoveSouth,
        Action::MoveLeft,
        Action::MoveRight,
        Action::MoveReverse,
        Action::KillForward,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Action::MoveX => "move X",
            Action::MoveY => "move Y",
            Action::MoveForward => "move fwd",
            Action::MoveRl => "move R-L",
            Action::MoveRandom => "move random",
            Action::SetOscillatorPeriod => "set osc1",
            Action::SetLongprobeDist => "set longprobe dist",
            Action::SetResponsiveness => "set inv-responsiveness",
            Action::EmitSignal0 => "emit signal 0",
            Action::MoveEast => "move east",
            Action::MoveWest => "move west",
            Action::MoveNorth => "move north",
            Action::MoveSouth => "move south",
            Action::MoveLeft => "move left",
            Action::MoveRight => "move right",
            Action::MoveReverse => "move reverse",
            Action::KillForward => "kill fwd",
        }
    }

    pub fn short_name(self) -> &'static str {
        match self {
            Action::MoveX => "MvX",
            Action::MoveY => "MvY",
            Action::MoveForward => "Mfd",
            Action::MoveRl => "MRL",
            Action::MoveRandom => "Mrn",
            Action::SetOscillatorPeriod => "OSC",
            Action::SetLongprobeDist => "LPD",
            Action::SetResponsiveness => "Res",
            Action::EmitSignal0 => "SG",
            Action::MoveEast => "MvE",
            Action::MoveWest => "MvW",
            Action::MoveNorth => "MvN",
            Action::MoveSouth => "MvS",
            Action::MoveLeft => "MvL",
            Action::MoveRight => "MvR",
            Action::MoveReverse => "Mrv",
            Action::KillForward => "Klf",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw brain outputs keyed by action. Disabled actions have no level and
/// leave the peep's state untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActionLevels {
    levels: [Option<f32>; NUM_ACTIONS],
}

impl ActionLevels {
    /// Maps the brain's live action outputs back onto the catalogue.
    pub fn from_live(enabled: &[Action], live: &[f32]) -> Self {
        debug_assert_eq!(enabled.len(), live.len());
        let mut levels = [None; NUM_ACTIONS];
        for (&action, &level) in enabled.iter().zip(live) {
            levels[action as usize] = Some(level);
        }
        Self { levels }
    }

    #[inline]
    pub fn get(&self, action: Action) -> Option<f32> {
        self.levels[action as usize]
    }

    /// Level of an enabled action, or 0 for a disabled one.
    #[inline]
    fn level(&self, action: Action) -> f32 {
        self.get(action).unwrap_or(0.0)
    }
}

/// Squashes an unbounded level into `[0, 1]`.
#[inline]
fn unit(level: f32) -> f32 {
    (level.tanh() + 1.0) / 2.0
}

/// Maps responsiveness `r` in `[0, 1]` onto a curve whose steepness is set
/// by `k`.
pub fn response_curve(r: f32, k: f32) -> f32 {
    (r - 2.0).powf(-2.0 * k) - 2.0f32.powf(-2.0 * k) * (1.0 - r)
}

/// Applies one peep's action levels.
///
/// Internal parameters in `vitals` change immediately. Pheromone emission
/// goes through the field's own lock. Kills and moves are only requested;
/// the drain phase applies them.
pub fn execute<R: Rng + ?Sized>(
    levels: &ActionLevels,
    view: &WorldView<'_>,
    peep: &Peep,
    vitals: &mut Vitals,
    queues: &RequestQueues,
    rng: &mut R,
) {
    if let Some(level) = levels.get(Action::SetResponsiveness) {
        vitals.responsiveness = unit(level);
    }
    let adjusted = response_curve(vitals.responsiveness, view.config.sensors.responsiveness_curve_k);

    if let Some(level) = levels.get(Action::SetOscillatorPeriod) {
        let period = 1 + (1.5 + (7.0 * unit(level)).exp()) as u32;
        debug_assert!((2..=2048).contains(&period));
        vitals.osc_period = period;
    }

    if let Some(level) = levels.get(Action::SetLongprobeDist) {
        vitals.long_probe_dist = (1.0 + unit(level) * MAX_LONG_PROBE_DISTANCE) as u32;
    }

    if let Some(level) = levels.get(Action::EmitSignal0) {
        let level = unit(level) * adjusted;
        if level > FIRE_THRESHOLD && rng.gen::<f32>() < level {
            view.pheromones.increment(0, peep.loc);
        }
    }

    if view.config.population.kill_enable {
        if let Some(level) = levels.get(Action::KillForward) {
            let level = unit(level) * adjusted;
            if level > FIRE_THRESHOLD && rng.gen::<f32>() < level {
                let ahead = peep.loc + peep.last_move_dir;
                if let Some(victim) = view.grid.occupant(ahead).map(|h| &view.peeps[h as usize]) {
                    debug_assert_eq!((peep.loc - victim.loc).length(), 1);
                    queues.queue_for_death(victim);
                }
            }
        }
    }

    let offset = movement_offset(levels, peep.last_move_dir, adjusted, rng);
    let target = peep.loc + offset;
    if view.grid.in_bounds(target) && view.grid.is_empty_at(target) {
        queues.queue_for_move(peep.index, target);
    }
}

/// Sums every movement urge into an X/Y pair, squashes each axis and turns
/// it into a probabilistic unit step.
fn movement_offset<R: Rng + ?Sized>(levels: &ActionLevels, facing: Dir, adjusted: f32, rng: &mut R) -> Coord {
    let forward = facing.as_normalized_coord();
    let left = facing.rotate_90_ccw().as_normalized_coord();
    let right = facing.rotate_90_cw().as_normalized_coord();

    let mut move_x = levels.level(Action::MoveX);
    let mut move_y = levels.level(Action::MoveY);
    move_x += levels.level(Action::MoveEast) - levels.level(Action::MoveWest);
    move_y += levels.level(Action::MoveNorth) - levels.level(Action::MoveSouth);

    let mut push = |dir: Coord, level: f32| {
        move_x += dir.x as f32 * level;
        move_y += dir.y as f32 * level;
    };
    push(forward, levels.level(Action::MoveForward));
    push(forward, -levels.level(Action::MoveReverse));
    push(left, levels.level(Action::MoveLeft));
    push(right, levels.level(Action::MoveRight));
    push(right, levels.level(Action::MoveRl));
    if let Some(level) = levels.get(Action::MoveRandom) {
        push(Dir::random8(rng).as_normalized_coord(), level);
    }

    let move_x = move_x.tanh() * adjusted;
    let move_y = move_y.tanh() * adjusted;
    let step = |v: f32, rng: &mut R| -> i16 {
        if rng.gen::<f32>() < v.abs() {
            if v < 0.0 {
                -1
            } else {
                1
            }
        } else {
            0
        }
    };
    let dx = step(move_x, &mut *rng);
    let dy = step(move_y, &mut *rng);
    Coord::new(dx, dy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::geometry::Compass;
    use crate::genetics::Genome;
    use crate::grid::Grid;
    use crate::pheromones::PheromoneField;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn test_config() -> Config {
        let mut config = Config::default();
        config.world.size_x = 12;
        config.world.size_y = 12;
        config.population.size = 2;
        config
    }

    fn peep_at(index: u16, x: i16, y: i16, facing: Compass) -> Peep {
        Peep {
            index,
            alive: true,
            loc: Coord::new(x, y),
            birth_loc: Coord::new(x, y),
            last_move_dir: Dir::new(facing),
            genome: Genome::default(),
            challenge_bits: 0,
        }
    }

    fn vitals() -> Vitals {
        Vitals {
            age: 0,
            responsiveness: 0.5,
            osc_period: 34,
            long_probe_dist: 16,
        }
    }

    fn only(action: Action, level: f32) -> ActionLevels {
        ActionLevels::from_live(&[action], &[level])
    }

    #[test]
    fn test_undriven_defaults() {
        // A zero level maps to mid-range parameters.
        let levels = ActionLevels::from_live(
            &[Action::SetOscillatorPeriod, Action::SetLongprobeDist, Action::SetResponsiveness],
            &[0.0, 0.0, 0.0],
        );
        let config = test_config();
        let grid = Grid::new(12, 12);
        let pheromones = PheromoneField::new(1, 12, 12);
        let peeps = vec![peep_at(0, 0, 0, Compass::N), peep_at(1, 5, 5, Compass::N)];
        let view = WorldView {
            config: &config,
            grid: &grid,
            pheromones: &pheromones,
            peeps: &peeps,
            tick: 0,
        };
        let queues = RequestQueues::default();
        let mut v = vitals();
        v.responsiveness = 0.1;
        let mut rng = ChaCha8Rng::seed_from_u64(71);
        execute(&levels, &view, &peeps[1], &mut v, &queues, &mut rng);
        assert_eq!(v.osc_period, 35);
        assert_eq!(v.long_probe_dist, 17);
        assert_eq!(v.responsiveness, 0.5);
    }

    #[test]
    fn test_disabled_actions_leave_state() {
        let levels = only(Action::MoveEast, 0.0);
        assert_eq!(levels.get(Action::SetResponsiveness), None);
        assert_eq!(levels.level(Action::SetResponsiveness), 0.0);
    }

    #[test]
    fn test_strong_east_urge_requests_move() {
        let config = test_config();
        let mut grid = Grid::new(12, 12);
        let pheromones = PheromoneField::new(1, 12, 12);
        let peeps = vec![peep_at(0, 0, 0, Compass::N), peep_at(1, 5, 5, Compass::N)];
        grid.set(peeps[1].loc, 1);
        let view = WorldView {
            config: &config,
            grid: &grid,
            pheromones: &pheromones,
            peeps: &peeps,
            tick: 0,
        };
        let mut queues = RequestQueues::default();
        let mut rng = ChaCha8Rng::seed_from_u64(72);
        let mut v = vitals();
        v.responsiveness = 1.0;
        let levels = ActionLevels::from_live(&[Action::MoveEast, Action::SetResponsiveness], &[50.0, 50.0]);
        for _ in 0..20 {
            execute(&levels, &view, &peeps[1], &mut v, &queues, &mut rng);
        }
        let moves = queues.take_moves();
        assert!(!moves.is_empty());
        assert!(moves.iter().all(|&(h, to)| h == 1 && to == Coord::new(6, 5)));
    }

    #[test]
    fn test_kill_requires_enable() {
        let mut config = test_config();
        let mut grid = Grid::new(12, 12);
        let pheromones = PheromoneField::new(1, 12, 12);
        let peeps = vec![
            peep_at(0, 0, 0, Compass::N),
            peep_at(1, 5, 5, Compass::N),
            peep_at(2, 5, 6, Compass::S),
        ];
        grid.set(peeps[1].loc, 1);
        grid.set(peeps[2].loc, 2);
        let levels = ActionLevels::from_live(&[Action::KillForward, Action::SetResponsiveness], &[50.0, 50.0]);
        let mut rng = ChaCha8Rng::seed_from_u64(73);

        for enabled in [false, true] {
            config.population.kill_enable = enabled;
            let view = WorldView {
                config: &config,
                grid: &grid,
                pheromones: &pheromones,
                peeps: &peeps,
                tick: 0,
            };
            let mut queues = RequestQueues::default();
            let mut v = vitals();
            for _ in 0..20 {
                execute(&levels, &view, &peeps[1], &mut v, &queues, &mut rng);
            }
            let deaths = queues.take_deaths();
            if enabled {
                assert!(deaths.contains(&2));
            } else {
                assert!(deaths.is_empty());
            }
        }
    }

    #[test]
    fn test_emit_signal() {
        let config = test_config();
        let grid = Grid::new(12, 12);
        let pheromones = PheromoneField::new(1, 12, 12);
        let peeps = vec![peep_at(0, 0, 0, Compass::N), peep_at(1, 5, 5, Compass::N)];
        let view = WorldView {
            config: &config,
            grid: &grid,
            pheromones: &pheromones,
            peeps: &peeps,
            tick: 0,
        };
        let queues = RequestQueues::default();
        let mut rng = ChaCha8Rng::seed_from_u64(74);
        let mut v = vitals();
        let levels = ActionLevels::from_live(&[Action::EmitSignal0, Action::SetResponsiveness], &[50.0, 50.0]);
        for _ in 0..10 {
            execute(&levels, &view, &peeps[1], &mut v, &queues, &mut rng);
        }
        assert!(pheromones.magnitude(0, Coord::new(5, 5)) > 0);
    }

    #[test]
    fn test_response_curve_endpoints() {
        // r = 1 gives full response for any k
        assert!((response_curve(1.0, 2.0) - 1.0).abs() < 1e-6);
        assert!(response_curve(0.0, 2.0).abs() < 1e-6);
    }
}
