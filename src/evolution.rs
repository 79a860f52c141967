//! Reproduction pipeline: turning one generation's survivors into the next.

use crate::barriers;
use crate::config::{Config, ConfigError};
use crate::genetics::{crossover, mutate, select_parents, Genome};
use crate::grid::Grid;
use crate::pheromones::PheromoneField;
use crate::population::PeepsPool;
use rand::Rng;

/// Clears the arena, draws the barriers of `generation` and fades every
/// pheromone to zero. Fails when the barriers leave no room for the whole
/// population.
fn reset_arena<R: Rng + ?Sized>(
    grid: &mut Grid,
    pheromones: &mut PheromoneField,
    config: &Config,
    population: usize,
    generation: u32,
    rng: &mut R,
) -> Result<(), ConfigError> {
    let barrier = config.world.barrier_for(generation);
    grid.zero_fill();
    barriers::draw(barrier, grid, rng);
    pheromones.zero_fill();

    let free = grid.empty_count();
    if free < population {
        return Err(ConfigError::Crowded { barrier, free, population });
    }
    Ok(())
}

/// Fills every slot of `pool` with a random genome at a random empty cell.
pub fn spawn_generation_zero<R: Rng + ?Sized>(
    pool: &mut PeepsPool,
    grid: &mut Grid,
    pheromones: &mut PheromoneField,
    config: &Config,
    rng: &mut R,
) -> Result<(), ConfigError> {
    reset_arena(grid, pheromones, config, pool.len(), 0, rng)?;
    let (min, max) = (config.genome.initial_length_min, config.genome.initial_length_max);
    for index in 1..=pool.len() as u16 {
        let genome = Genome::random(min, max, rng);
        let loc = grid.find_empty_location(rng);
        pool.spawn(index, loc, genome, config, grid, rng);
    }
    Ok(())
}

/// Builds one child genome from parents sorted best-first.
pub fn make_child<R: Rng + ?Sized>(parents: &[&Genome], config: &Config, rng: &mut R) -> Genome {
    let (first, second) = select_parents(parents.len(), config.mutation.choose_parents_by_fitness, rng);
    let mut child = crossover(parents[first], parents[second], config.mutation.sexual_reproduction, rng);
    mutate(&mut child, &config.mutation, config.genome.max_length, rng);
    assert!(!child.is_empty(), "child genome lost every gene");
    assert!(child.len() <= config.genome.max_length, "child genome exceeds max_length");
    child
}

/// Replaces the population with children of the scored survivors.
///
/// `scored` pairs a survivor's handle with its challenge score and
/// `generation` is the number of the generation being born. With no
/// survivors the world restarts from random genomes. Returns the number of
/// parents used.
pub fn spawn_next_generation<R: Rng + ?Sized>(
    scored: &[(u16, f32)],
    pool: &mut PeepsPool,
    grid: &mut Grid,
    pheromones: &mut PheromoneField,
    config: &Config,
    generation: u32,
    rng: &mut R,
) -> Result<usize, ConfigError> {
    if scored.is_empty() {
        log::warn!("no survivors, restarting from random genomes");
        spawn_generation_zero(pool, grid, pheromones, config, rng)?;
        return Ok(0);
    }

    let mut ranked = scored.to_vec();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    let genomes: Vec<Genome> = ranked.iter().map(|&(index, _)| pool.get(index).genome.clone()).collect();
    let parents: Vec<&Genome> = genomes.iter().collect();

    reset_arena(grid, pheromones, config, pool.len(), generation, rng)?;
    for index in 1..=pool.len() as u16 {
        let child = make_child(&parents, config, rng);
        let loc = grid.find_empty_location(rng);
        pool.spawn(index, loc, child, config, grid, rng);
    }
    Ok(parents.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::barriers::BarrierKind;
    use crate::genetics::{Gene, SinkKind, SourceKind};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn test_config() -> Config {
        let mut config = Config::default();
        config.world.size_x = 24;
        config.world.size_y = 24;
        config.population.size = 30;
        config.genome.initial_length_min = 3;
        config.genome.initial_length_max = 6;
        config.genome.max_length = 8;
        config
    }

    fn arena(config: &Config) -> (PeepsPool, Grid, PheromoneField) {
        (
            PeepsPool::new(config.population.size),
            Grid::new(config.world.size_x, config.world.size_y),
            PheromoneField::new(config.world.signal_layers, config.world.size_x, config.world.size_y),
        )
    }

    #[test]
    fn test_generation_zero_fills_pool() {
        let mut config = test_config();
        config.world.barrier = BarrierKind::HorizontalBarConstant;
        let (mut pool, mut grid, mut pheromones) = arena(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(121);
        spawn_generation_zero(&mut pool, &mut grid, &mut pheromones, &config, &mut rng).unwrap();

        assert_eq!(pool.alive_count(), 30);
        assert_eq!(grid.occupied_count(), 30);
        assert!(!grid.barrier_locations().is_empty());
        for peep in pool.iter() {
            assert!((3..=6).contains(&peep.genome.len()));
            assert_eq!(grid.at(peep.loc), peep.index);
        }
    }

    #[test]
    fn test_next_generation_inherits_parent_genes() {
        let mut config = test_config();
        config.mutation.point_mutation_rate = 0.0;
        config.mutation.insertion_deletion_rate = 0.0;
        config.mutation.sexual_reproduction = false;
        let (mut pool, mut grid, mut pheromones) = arena(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(122);
        spawn_generation_zero(&mut pool, &mut grid, &mut pheromones, &config, &mut rng).unwrap();

        let marker: Genome = vec![Gene::new(SourceKind::Sensor, 3, SinkKind::Action, 9, 4242)].into();
        pool.get_mut(5).genome = marker.clone();

        let used = spawn_next_generation(&[(5, 1.0)], &mut pool, &mut grid, &mut pheromones, &config, 1, &mut rng).unwrap();
        assert_eq!(used, 1);
        assert!(pool.iter().all(|p| p.genome == marker));
        assert_eq!(grid.occupied_count(), 30);
    }

    #[test]
    fn test_children_respect_max_length() {
        let mut config = test_config();
        config.mutation.insertion_deletion_rate = 1.0;
        config.mutation.deletion_ratio = 0.0;
        let mut rng = ChaCha8Rng::seed_from_u64(123);
        let long = Genome::random(8, 8, &mut rng);
        let short = Genome::random(3, 3, &mut rng);
        for _ in 0..50 {
            let child = make_child(&[&long, &short], &config, &mut rng);
            assert!(!child.is_empty());
            assert!(child.len() <= 8);
        }
    }

    #[test]
    fn test_extinction_restarts_randomly() {
        let config = test_config();
        let (mut pool, mut grid, mut pheromones) = arena(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(124);
        spawn_generation_zero(&mut pool, &mut grid, &mut pheromones, &config, &mut rng).unwrap();
        let before: Vec<Genome> = pool.iter().map(|p| p.genome.clone()).collect();

        let used = spawn_next_generation(&[], &mut pool, &mut grid, &mut pheromones, &config, 1, &mut rng).unwrap();
        assert_eq!(used, 0);
        assert_eq!(pool.alive_count(), 30);
        assert!(pool.iter().all(|p| !before.contains(&p.genome)));
    }

    #[test]
    fn test_crowded_arena_is_rejected() {
        let mut config = test_config();
        config.world.size_x = 8;
        config.world.size_y = 8;
        config.population.size = 60;
        config.world.barrier = BarrierKind::VerticalBarConstant;
        assert!(config.validate().is_ok());

        let (mut pool, mut grid, mut pheromones) = arena(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(126);
        let err = spawn_generation_zero(&mut pool, &mut grid, &mut pheromones, &config, &mut rng).unwrap_err();
        assert!(matches!(err, ConfigError::Crowded { free: 54, population: 60, .. }));
    }

    #[test]
    fn test_barrier_replaced_from_generation() {
        let mut config = test_config();
        config.world.replace_barrier = Some(BarrierKind::HorizontalBarConstant);
        config.world.replace_barrier_generation = 2;
        let (mut pool, mut grid, mut pheromones) = arena(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(127);
        spawn_generation_zero(&mut pool, &mut grid, &mut pheromones, &config, &mut rng).unwrap();
        assert!(grid.barrier_locations().is_empty());

        spawn_next_generation(&[(1, 1.0)], &mut pool, &mut grid, &mut pheromones, &config, 1, &mut rng).unwrap();
        assert!(grid.barrier_locations().is_empty());

        spawn_next_generation(&[(1, 1.0)], &mut pool, &mut grid, &mut pheromones, &config, 2, &mut rng).unwrap();
        assert!(!grid.barrier_locations().is_empty());
        for peep in pool.iter() {
            assert!(!grid.is_barrier_at(peep.loc));
        }
    }

    #[test]
    fn test_pheromones_cleared_between_generations() {
        let config = test_config();
        let (mut pool, mut grid, mut pheromones) = arena(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(125);
        spawn_generation_zero(&mut pool, &mut grid, &mut pheromones, &config, &mut rng).unwrap();
        let loc = pool.get(1).loc;
        pheromones.increment(0, loc);
        spawn_next_generation(&[(1, 0.5), (2, 0.9)], &mut pool, &mut grid, &mut pheromones, &config, 1, &mut rng).unwrap();
        assert_eq!(pheromones.magnitude(0, loc), 0);
    }
}
