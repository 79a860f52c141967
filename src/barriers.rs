//! Barrier layouts drawn onto the grid at the start of each generation.

use crate::geometry::Coord;
use crate::grid::Grid;
use rand::Rng;
use serde::{Deserialize, Serialize};

const ISLAND_RADIUS: f32 = 3.0;
const ISLAND_PLACEMENT_ATTEMPTS: usize = 1000;
const SPOT_COUNT: u16 = 5;
const SPOT_RADIUS: f32 = 5.0;

/// Barrier layout selected in the config.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BarrierKind {
    #[default]
    None,
    /// One vertical bar through the middle
    VerticalBarConstant,
    /// One vertical bar, placed anew every generation
    VerticalBarRandom,
    /// Five thin vertical blocks in a quincunx
    FiveBlocksStaggered,
    /// One horizontal bar through the middle
    HorizontalBarConstant,
    /// Three small circles, placed anew every generation
    FloatingIslands,
    /// Five circles down the middle column
    SpotsSpecified,
}

/// Draws `kind` onto an already zero-filled `grid`.
pub fn draw<R: Rng + ?Sized>(kind: BarrierKind, grid: &mut Grid, rng: &mut R) {
    let (sx, sy) = (grid.size_x() as i32, grid.size_y() as i32);
    match kind {
        BarrierKind::None => {}
        BarrierKind::VerticalBarConstant => {
            rectangle(grid, sx / 2, sy / 4, 1, sy / 2);
        }
        BarrierKind::VerticalBarRandom => {
            let x = uniform(rng, 20, sx - 20);
            let y = uniform(rng, 20, sy / 2 - 20);
            rectangle(grid, x, y, 1, sy / 2);
        }
        BarrierKind::FiveBlocksStaggered => {
            let (width, height) = (2, sx / 3);
            let left = sx / 4 - width / 2;
            let right = left + sx / 2;
            let top = sy / 4 - height / 2;
            let bottom = top + sy / 2;
            for (x, y) in [(left, top), (right, top), (right, bottom), (left, bottom)] {
                rectangle(grid, x, y, width, height);
            }
            rectangle(grid, sx / 2 - width / 2, sy / 2 - height / 2, width, height);
        }
        BarrierKind::HorizontalBarConstant => {
            rectangle(grid, sx / 4, sy / 2, sx / 2, 2);
        }
        BarrierKind::FloatingIslands => {
            let margin = 2 * ISLAND_RADIUS as i32;
            let mut centers: Vec<Coord> = Vec::with_capacity(3);
            for _ in 0..3 {
                let mut placed = None;
                for _ in 0..ISLAND_PLACEMENT_ATTEMPTS {
                    let candidate = Coord::new(
                        uniform(rng, margin, sx - margin) as i16,
                        uniform(rng, margin, sy - margin) as i16,
                    );
                    if centers.iter().all(|&c| (c - candidate).length() as i32 >= margin) {
                        placed = Some(candidate);
                        break;
                    }
                }
                match placed {
                    Some(center) => centers.push(center),
                    None => log::warn!("no room for floating island {} on a {}x{} grid", centers.len(), sx, sy),
                }
            }
            for center in centers {
                circle(grid, center, ISLAND_RADIUS);
            }
        }
        BarrierKind::SpotsSpecified => {
            let slice = grid.size_y() / (SPOT_COUNT + 1);
            for n in 1..=SPOT_COUNT {
                circle(grid, Coord::new((sx / 2) as i16, (n * slice) as i16), SPOT_RADIUS);
            }
        }
    }
}

/// Fills `[x, x + width] x [y, y + height]`, both edges included, clipped
/// to the grid.
fn rectangle(grid: &mut Grid, x: i32, y: i32, width: i32, height: i32) {
    let x_end = (x + width).min(grid.size_x() as i32 - 1);
    let y_end = (y + height).min(grid.size_y() as i32 - 1);
    for cx in x.max(0)..=x_end {
        for cy in y.max(0)..=y_end {
            grid.set_barrier(Coord::new(cx as i16, cy as i16));
        }
    }
}

fn circle(grid: &mut Grid, center: Coord, radius: f32) {
    let mut cells = Vec::new();
    grid.visit_neighborhood(center, radius, |loc| cells.push(loc));
    for loc in cells {
        grid.set_barrier(loc);
    }
    grid.add_barrier_center(center);
}

/// Uniform in `lo..=hi`; the midpoint when the range is empty.
fn uniform<R: Rng + ?Sized>(rng: &mut R, lo: i32, hi: i32) -> i32 {
    if hi <= lo {
        ((lo + hi) / 2).max(0)
    } else {
        rng.gen_range(lo..=hi)
    }
}
