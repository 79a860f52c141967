//! Survival challenges: who gets to reproduce at the end of a generation.

use crate::config::Config;
use crate::genetics::similarity_or_aligned;
use crate::geometry::Coord;
use crate::grid::Grid;
use crate::peep::Peep;
use crate::population::PeepsPool;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Radius around a barrier center that counts as visiting it.
const LOCATION_SEQUENCE_RADIUS: u32 = 9;

/// Generation after which Altruism only saves kin of the sacrificed.
const KINSHIP_GENERATION: u32 = 10;

/// Parents saved per sacrifice.
const ALTRUISM_FACTOR: usize = 10;

/// Genome similarity that counts as kin.
const KINSHIP_THRESHOLD: f32 = 0.7;

/// Survival criterion selected in the config.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Challenge {
    /// Be inside the circle around the north-west quarter point; closer
    /// scores higher
    Circle,
    /// Be in the east half of the arena
    #[default]
    RightHalf,
    /// Be in the east quarter of the arena
    RightQuarter,
    /// Stay off the border with 5 to 13 peeps within radius 2.5, self
    /// included
    NeighborCount,
    /// Be near the center; closer scores higher
    CenterWeighted,
    /// Be near the center
    CenterUnweighted,
    /// Be near any corner
    Corner,
    /// Be near any corner; closer scores higher
    CornerWeighted,
    /// Everyone passes; score is distance travelled from birth
    MigrateDistance,
    /// Be near the center with 5 to 8 peeps within radius 1.5, self included
    CenterSparsed,
    /// Be in the west eighth of the arena
    LeftEighth,
    /// Survive walls that kill nearby peeps, switching sides mid-generation
    RadioactiveWalls,
    /// End the generation on the border
    AgainstAnyWall,
    /// Touch any border at least once
    TouchAnyWall,
    /// Be in the west or east eighth of the arena
    EastWestEighths,
    /// Be within half the arena width of a barrier center; closer scores
    /// higher
    NearBarrier,
    /// Stay off the border next to exactly one peep that has no other
    /// neighbor
    Pairs,
    /// Visit the barrier centers in order
    LocationSequence,
    /// Be inside the north-east circle
    AltruismSacrifice,
    /// Like [`Challenge::Circle`], but after the first generations only kin
    /// of peeps that reached the sacrifice circle may breed
    Altruism,
}

impl Challenge {
    /// Per-tick side effects, run single-threaded before the queues drain.
    pub fn end_of_tick<R: Rng + ?Sized>(
        &self,
        pool: &mut PeepsPool,
        grid: &Grid,
        config: &Config,
        tick: u32,
        rng: &mut R,
    ) {
        match self {
            Challenge::TouchAnyWall => {
                for peep in pool.iter_mut() {
                    if grid.is_border(peep.loc) {
                        peep.challenge_bits |= 1;
                    }
                }
            }
            Challenge::LocationSequence => {
                let centers = grid.barrier_centers();
                for peep in pool.iter_mut() {
                    // Only the first unvisited center counts.
                    let next = (0..centers.len().min(32)).find(|&n| peep.challenge_bits & (1 << n) == 0);
                    if let Some(n) = next {
                        if (peep.loc - centers[n]).length() <= LOCATION_SEQUENCE_RADIUS {
                            peep.challenge_bits |= 1 << n;
                        }
                    }
                }
            }
            Challenge::RadioactiveWalls => {
                let size_x = config.world.size_x as i32;
                let first_half = tick < config.population.steps_per_generation / 2;
                let wall_x = if first_half { 0 } else { size_x - 1 };
                let reach = size_x / 2;
                for peep in pool.living() {
                    let distance = (peep.loc.x as i32 - wall_x).abs();
                    if distance < reach && rng.gen::<f32>() < 1.0 / distance as f32 {
                        pool.queues().queue_for_death(peep);
                    }
                }
            }
            _ => {}
        }
    }

    /// Scores every live peep with a usable brain that meets the criterion.
    ///
    /// `generation` is the number of the generation that just ended.
    pub fn evaluate_generation<R: Rng + ?Sized>(
        &self,
        pool: &PeepsPool,
        grid: &Grid,
        config: &Config,
        generation: u32,
        rng: &mut R,
    ) -> Vec<(u16, f32)> {
        if *self == Challenge::Altruism {
            return self.altruism_parents(pool, grid, config, generation, rng);
        }
        pool.living()
            .filter(|peep| !pool.state(peep.index).net.is_empty())
            .filter_map(|peep| self.score(peep, grid, config).map(|score| (peep.index, score)))
            .collect()
    }

    /// `Some(score)` when `peep` passes, judged against the arena in `grid`.
    pub fn score(&self, peep: &Peep, grid: &Grid, config: &Config) -> Option<f32> {
        let (sx, sy) = (config.world.size_x, config.world.size_y);
        let center = Coord::new((sx / 2) as i16, (sy / 2) as i16);
        let north_west = Coord::new((sx / 4) as i16, (sy / 4) as i16);
        let corners = [
            Coord::new(0, 0),
            Coord::new(0, sy as i16 - 1),
            Coord::new(sx as i16 - 1, 0),
            Coord::new(sx as i16 - 1, sy as i16 - 1),
        ];
        let x = peep.loc.x as u16;
        let near = |target: Coord, radius: f32| {
            let d = (target - peep.loc).length() as f32;
            (d <= radius).then_some((radius - d) / radius)
        };
        let crowd = |radius: f32| {
            let mut count = 0;
            grid.visit_neighborhood(peep.loc, radius, |loc| {
                if grid.is_occupied_at(loc) {
                    count += 1;
                }
            });
            count
        };

        match self {
            Challenge::Circle | Challenge::Altruism => near(north_west, sx as f32 / 4.0),
            Challenge::RightHalf => (x > sx / 2).then_some(1.0),
            Challenge::RightQuarter => (x > sx / 2 + sx / 4).then_some(1.0),
            Challenge::NeighborCount => {
                (!grid.is_border(peep.loc) && (5..=13).contains(&crowd(2.5))).then_some(1.0)
            }
            Challenge::CenterWeighted => near(center, sx as f32 / 5.0),
            Challenge::CenterUnweighted => near(center, sx as f32 / 6.0).map(|_| 1.0),
            Challenge::Corner => corners.iter().find_map(|&c| near(c, sx as f32 / 8.0)).map(|_| 1.0),
            Challenge::CornerWeighted => corners.iter().find_map(|&c| near(c, sx as f32 / 8.0)),
            Challenge::MigrateDistance => {
                Some((peep.loc - peep.birth_loc).length() as f32 / sx.max(sy) as f32)
            }
            Challenge::CenterSparsed => near(center, sx as f32 / 4.0)
                .filter(|_| (5..=8).contains(&crowd(1.5)))
                .map(|_| 1.0),
            Challenge::LeftEighth => (x < sx / 8).then_some(1.0),
            Challenge::RadioactiveWalls => Some(1.0),
            Challenge::AgainstAnyWall => grid.is_border(peep.loc).then_some(1.0),
            Challenge::TouchAnyWall => (peep.challenge_bits != 0).then_some(1.0),
            Challenge::EastWestEighths => (x < sx / 8 || x >= sx - sx / 8).then_some(1.0),
            Challenge::NearBarrier => {
                let radius = (sx / 2) as f32;
                let closest = grid.barrier_centers().iter().map(|&c| (peep.loc - c).length()).min()?;
                let d = closest as f32;
                (d <= radius).then_some(1.0 - d / radius)
            }
            Challenge::Pairs => {
                if grid.is_border(peep.loc) {
                    return None;
                }
                let mates: Vec<Coord> = occupied_neighbors(grid, peep.loc).collect();
                match mates[..] {
                    [mate] => occupied_neighbors(grid, mate).all(|n| n == peep.loc).then_some(1.0),
                    _ => None,
                }
            }
            Challenge::LocationSequence => {
                let centers = grid.barrier_centers().len();
                let visited = peep.challenge_bits.count_ones();
                (visited > 0).then(|| visited as f32 / centers.max(1) as f32)
            }
            Challenge::AltruismSacrifice => {
                let target = Coord::new((sx - sx / 4) as i16, (sy - sy / 4) as i16);
                near(target, sx as f32 / 4.0)
            }
        }
    }

    /// Peeps in the spawning circle pass. Past [`KINSHIP_GENERATION`], each
    /// peep in the sacrifice circle instead saves up to [`ALTRUISM_FACTOR`]
    /// genetically similar passers, and only the saved breed.
    fn altruism_parents<R: Rng + ?Sized>(
        &self,
        pool: &PeepsPool,
        grid: &Grid,
        config: &Config,
        generation: u32,
        rng: &mut R,
    ) -> Vec<(u16, f32)> {
        let mut parents = Vec::new();
        let mut sacrificed = Vec::new();
        for peep in pool.living().filter(|peep| !pool.state(peep.index).net.is_empty()) {
            if let Some(score) = self.score(peep, grid, config) {
                parents.push((peep.index, score));
            } else if Challenge::AltruismSacrifice.score(peep, grid, config).is_some() {
                sacrificed.push(peep.index);
            }
        }
        if generation <= KINSHIP_GENERATION || parents.is_empty() {
            return parents;
        }

        let method = config.genome.comparison;
        let mut saved = Vec::new();
        for _ in 0..ALTRUISM_FACTOR {
            for &victim in &sacrificed {
                let victim_genome = &pool.get(victim).genome;
                // Random start so the first passers are not always chosen.
                let start = rng.gen_range(0..parents.len());
                let kin = (0..parents.len())
                    .map(|n| parents[(start + n) % parents.len()])
                    .find(|&(index, _)| {
                        similarity_or_aligned(victim_genome, &pool.get(index).genome, method) >= KINSHIP_THRESHOLD
                    });
                saved.extend(kin);
            }
        }
        log::debug!(
            "altruism: {} passed, {} sacrificed, {} saved",
            parents.len(),
            sacrificed.len(),
            saved.len()
        );
        saved
    }
}

/// Occupied cells among the eight around `loc`.
fn occupied_neighbors(grid: &Grid, loc: Coord) -> impl Iterator<Item = Coord> + '_ {
    (-1i16..=1)
        .flat_map(move |dx| (-1i16..=1).map(move |dy| Coord::new(loc.x + dx, loc.y + dy)))
        .filter(move |&n| n != loc && grid.in_bounds(n) && grid.is_occupied_at(n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genetics::{Gene, Genome, SinkKind, SourceKind};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn test_config() -> Config {
        let mut config = Config::default();
        config.world.size_x = 40;
        config.world.size_y = 40;
        config.population.size = 2;
        config
    }

    fn body(x: i16, y: i16) -> Peep {
        Peep {
            index: 1,
            alive: true,
            loc: Coord::new(x, y),
            birth_loc: Coord::new(x, y),
            ..Peep::default()
        }
    }

    fn open_grid() -> Grid {
        Grid::new(40, 40)
    }

    fn wired_genome() -> Genome {
        vec![Gene::new(SourceKind::Sensor, 0, SinkKind::Action, 0, 100)].into()
    }

    #[test]
    fn test_right_half() {
        let config = test_config();
        assert_eq!(Challenge::RightHalf.score(&body(21, 3), &open_grid(), &config), Some(1.0));
        assert_eq!(Challenge::RightHalf.score(&body(20, 3), &open_grid(), &config), None);
    }

    #[test]
    fn test_center_weighted_scales_with_distance() {
        let config = test_config();
        assert_eq!(Challenge::CenterWeighted.score(&body(20, 20), &open_grid(), &config), Some(1.0));
        let near = Challenge::CenterWeighted.score(&body(24, 20), &open_grid(), &config).unwrap();
        assert!((near - 0.5).abs() < 1e-6);
        assert_eq!(Challenge::CenterWeighted.score(&body(29, 20), &open_grid(), &config), None);
        assert_eq!(Challenge::CenterUnweighted.score(&body(26, 20), &open_grid(), &config), Some(1.0));
    }

    #[test]
    fn test_corners() {
        let config = test_config();
        assert_eq!(Challenge::Corner.score(&body(39, 0), &open_grid(), &config), Some(1.0));
        assert_eq!(Challenge::CornerWeighted.score(&body(39, 39), &open_grid(), &config), Some(1.0));
        assert_eq!(Challenge::Corner.score(&body(20, 0), &open_grid(), &config), None);
    }

    #[test]
    fn test_migrate_distance() {
        let config = test_config();
        let mut peep = body(0, 0);
        peep.loc = Coord::new(20, 0);
        assert_eq!(Challenge::MigrateDistance.score(&peep, &open_grid(), &config), Some(0.5));
    }

    #[test]
    fn test_touch_any_wall_sets_flag() {
        let config = test_config();
        let mut rng = ChaCha8Rng::seed_from_u64(101);
        let mut grid = Grid::new(40, 40);
        let mut pool = PeepsPool::new(2);
        pool.spawn(1, Coord::new(0, 10), wired_genome(), &config, &mut grid, &mut rng);
        pool.spawn(2, Coord::new(10, 10), wired_genome(), &config, &mut grid, &mut rng);
        Challenge::TouchAnyWall.end_of_tick(&mut pool, &grid, &config, 0, &mut rng);
        let scored = Challenge::TouchAnyWall.evaluate_generation(&pool, &grid, &config, 0, &mut rng);
        assert_eq!(scored, vec![(1, 1.0)]);
    }

    #[test]
    fn test_location_sequence_in_order() {
        let config = test_config();
        let mut rng = ChaCha8Rng::seed_from_u64(102);
        let mut grid = Grid::new(40, 40);
        grid.add_barrier_center(Coord::new(5, 5));
        grid.add_barrier_center(Coord::new(35, 35));
        let mut pool = PeepsPool::new(1);
        // Standing at the second center first does not count.
        pool.spawn(1, Coord::new(35, 35), wired_genome(), &config, &mut grid, &mut rng);
        Challenge::LocationSequence.end_of_tick(&mut pool, &grid, &config, 0, &mut rng);
        assert_eq!(pool.get(1).challenge_bits, 0);

        pool.get_mut(1).loc = Coord::new(6, 6);
        Challenge::LocationSequence.end_of_tick(&mut pool, &grid, &config, 1, &mut rng);
        pool.get_mut(1).loc = Coord::new(34, 35);
        Challenge::LocationSequence.end_of_tick(&mut pool, &grid, &config, 2, &mut rng);
        assert_eq!(pool.get(1).challenge_bits, 0b11);
        let scored = Challenge::LocationSequence.evaluate_generation(&pool, &grid, &config, 0, &mut rng);
        assert_eq!(scored, vec![(1, 1.0)]);
    }

    #[test]
    fn test_radioactive_wall_switches_sides() {
        let config = test_config();
        let mut rng = ChaCha8Rng::seed_from_u64(103);
        let mut grid = Grid::new(40, 40);
        let mut pool = PeepsPool::new(2);
        pool.spawn(1, Coord::new(1, 10), wired_genome(), &config, &mut grid, &mut rng);
        pool.spawn(2, Coord::new(38, 10), wired_genome(), &config, &mut grid, &mut rng);

        // distance 1 from the active wall is certain death
        Challenge::RadioactiveWalls.end_of_tick(&mut pool, &grid, &config, 0, &mut rng);
        pool.drain_death_queue(&mut grid);
        assert!(!pool.get(1).alive);
        assert!(pool.get(2).alive);

        let late = config.population.steps_per_generation - 1;
        Challenge::RadioactiveWalls.end_of_tick(&mut pool, &grid, &config, late, &mut rng);
        pool.drain_death_queue(&mut grid);
        assert!(!pool.get(2).alive);
    }

    #[test]
    fn test_empty_brains_never_reproduce() {
        let config = test_config();
        let mut rng = ChaCha8Rng::seed_from_u64(104);
        let mut grid = Grid::new(40, 40);
        let mut pool = PeepsPool::new(1);
        // neuron feeding only itself culls to nothing
        let genome: Genome = vec![Gene::new(SourceKind::Neuron, 0, SinkKind::Neuron, 0, 1)].into();
        pool.spawn(1, Coord::new(30, 30), genome, &config, &mut grid, &mut rng);
        assert!(Challenge::RightHalf.evaluate_generation(&pool, &grid, &config, 0, &mut rng).is_empty());
    }

    #[test]
    fn test_region_bands() {
        let config = test_config();
        let grid = open_grid();
        assert_eq!(Challenge::RightQuarter.score(&body(31, 5), &grid, &config), Some(1.0));
        assert_eq!(Challenge::RightQuarter.score(&body(30, 5), &grid, &config), None);
        assert_eq!(Challenge::LeftEighth.score(&body(4, 5), &grid, &config), Some(1.0));
        assert_eq!(Challenge::LeftEighth.score(&body(5, 5), &grid, &config), None);
        assert_eq!(Challenge::EastWestEighths.score(&body(4, 5), &grid, &config), Some(1.0));
        assert_eq!(Challenge::EastWestEighths.score(&body(35, 5), &grid, &config), Some(1.0));
        assert_eq!(Challenge::EastWestEighths.score(&body(34, 5), &grid, &config), None);
        assert_eq!(Challenge::AgainstAnyWall.score(&body(0, 10), &grid, &config), Some(1.0));
        assert_eq!(Challenge::AgainstAnyWall.score(&body(1, 10), &grid, &config), None);
    }

    #[test]
    fn test_circles() {
        let config = test_config();
        let grid = open_grid();
        assert_eq!(Challenge::Circle.score(&body(10, 10), &grid, &config), Some(1.0));
        assert_eq!(Challenge::Circle.score(&body(25, 25), &grid, &config), None);
        assert_eq!(Challenge::AltruismSacrifice.score(&body(30, 30), &grid, &config), Some(1.0));
        assert_eq!(Challenge::AltruismSacrifice.score(&body(10, 10), &grid, &config), None);
    }

    #[test]
    fn test_neighbor_count_includes_self() {
        let config = test_config();
        let mut grid = open_grid();
        let peep = body(10, 10);
        grid.set(peep.loc, 1);
        for (handle, (x, y)) in [(11, 10), (9, 10), (10, 11)].into_iter().enumerate() {
            grid.set(Coord::new(x, y), handle as u16 + 2);
        }
        assert_eq!(Challenge::NeighborCount.score(&peep, &grid, &config), None);
        grid.set(Coord::new(10, 9), 5);
        assert_eq!(Challenge::NeighborCount.score(&peep, &grid, &config), Some(1.0));

        let mut border = open_grid();
        border.set(Coord::new(0, 10), 1);
        assert_eq!(Challenge::NeighborCount.score(&body(0, 10), &border, &config), None);
    }

    #[test]
    fn test_center_sparsed() {
        let config = test_config();
        let mut grid = open_grid();
        let peep = body(20, 20);
        let ring = [(19, 19), (19, 20), (19, 21), (20, 19), (20, 21), (21, 19), (21, 20), (21, 21)];
        grid.set(peep.loc, 1);
        for (n, &(x, y)) in ring.iter().take(4).enumerate() {
            grid.set(Coord::new(x, y), n as u16 + 2);
        }
        assert_eq!(Challenge::CenterSparsed.score(&peep, &grid, &config), Some(1.0));

        for (n, &(x, y)) in ring.iter().enumerate().skip(4) {
            grid.set(Coord::new(x, y), n as u16 + 2);
        }
        assert_eq!(Challenge::CenterSparsed.score(&peep, &grid, &config), None);
    }

    #[test]
    fn test_pairs() {
        let config = test_config();
        let mut grid = open_grid();
        let peep = body(10, 10);
        grid.set(peep.loc, 1);
        assert_eq!(Challenge::Pairs.score(&peep, &grid, &config), None);

        grid.set(Coord::new(11, 11), 2);
        assert_eq!(Challenge::Pairs.score(&peep, &grid, &config), Some(1.0));

        // the mate has a second neighbor
        grid.set(Coord::new(12, 12), 3);
        assert_eq!(Challenge::Pairs.score(&peep, &grid, &config), None);
    }

    #[test]
    fn test_near_barrier() {
        let config = test_config();
        let mut grid = open_grid();
        assert_eq!(Challenge::NearBarrier.score(&body(20, 30), &grid, &config), None);
        grid.add_barrier_center(Coord::new(20, 20));
        assert_eq!(Challenge::NearBarrier.score(&body(20, 30), &grid, &config), Some(0.5));
        assert_eq!(Challenge::NearBarrier.score(&body(39, 0), &grid, &config), None);
    }

    #[test]
    fn test_altruism_saves_kin_of_the_sacrificed() {
        let config = test_config();
        let mut rng = ChaCha8Rng::seed_from_u64(105);
        let mut grid = Grid::new(40, 40);
        let mut pool = PeepsPool::new(3);
        let stranger: Genome = vec![Gene::new(SourceKind::Sensor, 0x7f, SinkKind::Action, 0x7f, -1)].into();
        pool.spawn(1, Coord::new(10, 10), wired_genome(), &config, &mut grid, &mut rng);
        pool.spawn(2, Coord::new(12, 10), stranger, &config, &mut grid, &mut rng);
        pool.spawn(3, Coord::new(30, 30), wired_genome(), &config, &mut grid, &mut rng);

        let early = Challenge::Altruism.evaluate_generation(&pool, &grid, &config, 3, &mut rng);
        assert_eq!(early.len(), 2);

        let late = Challenge::Altruism.evaluate_generation(&pool, &grid, &config, 11, &mut rng);
        assert_eq!(late.len(), ALTRUISM_FACTOR);
        assert!(late.iter().all(|&(index, _)| index == 1));

        // nobody sacrificed, nobody saved
        pool.get_mut(3).alive = false;
        assert!(Challenge::Altruism.evaluate_generation(&pool, &grid, &config, 11, &mut rng).is_empty());
    }
}
