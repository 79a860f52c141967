//! Pheromone layers: decaying byte fields that peeps emit into and sense.
//!
//! Emission happens during the parallel phase of a tick, so cells are
//! atomics and every [`PheromoneField::increment`] runs inside a single
//! critical section. Reads are relaxed and may observe a concurrent
//! emission partially applied, which sensors tolerate.

use crate::geometry::{Coord, Dir};
use crate::grid::visit_neighborhood;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Mutex;

/// Saturation value of every cell.
pub const SIGNAL_MAX: u8 = 255;

/// Radius around the emitter that receives [`NEIGHBOR_INCREASE`].
const EMIT_RADIUS: f32 = 1.5;
const NEIGHBOR_INCREASE: u8 = 1;
const CENTER_INCREASE: u8 = 2;
const FADE_AMOUNT: u8 = 1;

/// One or more pheromone layers sized to the grid.
#[derive(Debug)]
pub struct PheromoneField {
    size_x: u16,
    size_y: u16,
    layers: Vec<Vec<AtomicU8>>,
    increment_lock: Mutex<()>,
}

impl PheromoneField {
    pub fn new(num_layers: usize, size_x: u16, size_y: u16) -> Self {
        let cells = size_x as usize * size_y as usize;
        Self {
            size_x,
            size_y,
            layers: (0..num_layers)
                .map(|_| (0..cells).map(|_| AtomicU8::new(0)).collect())
                .collect(),
            increment_lock: Mutex::new(()),
        }
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    #[inline]
    fn index(&self, loc: Coord) -> usize {
        loc.x as usize * self.size_y as usize + loc.y as usize
    }

    /// Concentration at `loc`
    #[inline]
    pub fn magnitude(&self, layer: usize, loc: Coord) -> u8 {
        self.layers[layer][self.index(loc)].load(Ordering::Relaxed)
    }

    /// Emits at `loc`: every cell within 1.5 gains 1, then the center gains
    /// 2 more, all saturating at [`SIGNAL_MAX`].
    pub fn increment(&self, layer: usize, loc: Coord) {
        let _guard = self.increment_lock.lock().unwrap_or_else(|e| e.into_inner());
        let cells = &self.layers[layer];
        let bump = |cell: &AtomicU8, amount: u8| {
            let value = cell.load(Ordering::Relaxed);
            cell.store(value.saturating_add(amount), Ordering::Relaxed);
        };

        visit_neighborhood(self.size_x, self.size_y, loc, EMIT_RADIUS, |c| {
            bump(&cells[self.index(c)], NEIGHBOR_INCREASE);
        });
        bump(&cells[self.index(loc)], CENTER_INCREASE);
    }

    /// Decays every cell of `layer` by one, floored at zero.
    pub fn fade(&mut self, layer: usize) {
        for cell in self.layers[layer].iter_mut() {
            let value = cell.get_mut();
            *value = value.saturating_sub(FADE_AMOUNT);
        }
    }

    /// Clears every layer.
    pub fn zero_fill(&mut self) {
        for cell in self.layers.iter_mut().flatten() {
            *cell.get_mut() = 0;
        }
    }

    /// Mean concentration within `radius` of `loc`, in `[0, 1]`.
    pub fn density(&self, layer: usize, loc: Coord, radius: f32) -> f32 {
        let mut count = 0u64;
        let mut sum = 0u64;
        visit_neighborhood(self.size_x, self.size_y, loc, radius, |c| {
            count += 1;
            sum += self.magnitude(layer, c) as u64;
        });
        (sum as f64 / (count as f64 * SIGNAL_MAX as f64)) as f32
    }

    /// Directional gradient reading in `[0, 1]`; 0.5 means balanced.
    ///
    /// Each neighbor's concentration is projected onto the unit vector of
    /// `dir` and weighted by inverse squared distance. A `Center` direction
    /// has no axis and reads 0.5.
    pub fn density_along_axis(&self, layer: usize, loc: Coord, dir: Dir, radius: f32) -> f32 {
        if dir.is_center() {
            return 0.5;
        }
        let axis = dir.as_normalized_coord();
        let len = ((axis.x * axis.x + axis.y * axis.y) as f64).sqrt();
        let (ux, uy) = (axis.x as f64 / len, axis.y as f64 / len);

        let mut sum = 0.0f64;
        visit_neighborhood(self.size_x, self.size_y, loc, radius, |c| {
            if c != loc {
                let offset = c - loc;
                let proj = ux * offset.x as f64 + uy * offset.y as f64;
                let dist2 = (offset.x as f64).powi(2) + (offset.y as f64).powi(2);
                sum += proj * self.magnitude(layer, c) as f64 / dist2;
            }
        });

        let max_sum = 6.0 * radius as f64 * SIGNAL_MAX as f64;
        ((sum / max_sum + 1.0) / 2.0) as f32
    }

    /// Copy of one layer, column-major like the grid.
    pub fn layer_snapshot(&self, layer: usize) -> Vec<u8> {
        self.layers[layer].iter().map(|c| c.load(Ordering::Relaxed)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Compass;

    #[test]
    fn test_increment_shape() {
        let field = PheromoneField::new(1, 10, 10);
        let center = Coord::new(5, 5);
        field.increment(0, center);
        assert_eq!(field.magnitude(0, center), 3);
        assert_eq!(field.magnitude(0, Coord::new(6, 6)), 1);
        assert_eq!(field.magnitude(0, Coord::new(5, 7)), 0);
    }

    #[test]
    fn test_saturation_and_floor() {
        let mut field = PheromoneField::new(1, 4, 4);
        let loc = Coord::new(1, 1);
        for _ in 0..200 {
            field.increment(0, loc);
        }
        assert_eq!(field.magnitude(0, loc), SIGNAL_MAX);
        field.increment(0, loc);
        assert_eq!(field.magnitude(0, loc), SIGNAL_MAX);

        let corner = Coord::new(3, 3);
        assert_eq!(field.magnitude(0, corner), 0);
        field.fade(0);
        assert_eq!(field.magnitude(0, corner), 0);
        assert_eq!(field.magnitude(0, loc), SIGNAL_MAX - 1);
    }

    #[test]
    fn test_layers_are_independent() {
        let mut field = PheromoneField::new(2, 4, 4);
        field.increment(1, Coord::new(2, 2));
        assert_eq!(field.magnitude(0, Coord::new(2, 2)), 0);
        field.zero_fill();
        assert!(field.layer_snapshot(1).iter().all(|&v| v == 0));
    }

    #[test]
    fn test_density() {
        let field = PheromoneField::new(1, 10, 10);
        assert_eq!(field.density(0, Coord::new(5, 5), 1.0), 0.0);
        field.increment(0, Coord::new(5, 5));
        // plus shape: 3 + 1 + 1 + 1 + 1 over 5 cells
        let expected = 7.0 / (5.0 * 255.0);
        assert!((field.density(0, Coord::new(5, 5), 1.0) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_density_along_axis_points_upwind() {
        let field = PheromoneField::new(1, 20, 20);
        let here = Coord::new(10, 10);
        field.increment(0, Coord::new(12, 10));

        let east = field.density_along_axis(0, here, Dir::new(Compass::E), 3.0);
        let west = field.density_along_axis(0, here, Dir::new(Compass::W), 3.0);
        assert!(east > 0.5);
        assert!(west < 0.5);
        assert!((east - 0.5 - (0.5 - west)).abs() < 1e-6);
        assert_eq!(field.density_along_axis(0, here, Dir::new(Compass::Center), 3.0), 0.5);
    }

    #[test]
    fn test_concurrent_increments_stay_bounded() {
        use rayon::prelude::*;
        let field = PheromoneField::new(1, 8, 8);
        (0..10_000).into_par_iter().for_each(|i| {
            field.increment(0, Coord::new((i % 8) as i16, ((i / 8) % 8) as i16));
        });
        assert!(field.layer_snapshot(0).iter().all(|&v| v == SIGNAL_MAX));
    }
}
