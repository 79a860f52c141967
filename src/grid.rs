//! Occupancy grid and neighborhood queries.

use crate::geometry::Coord;
use rand::Rng;

/// Cell value of an unoccupied location.
pub const EMPTY: u16 = 0;

/// Cell value of an impassable location.
pub const BARRIER: u16 = 0xffff;

/// Calls `f` for every in-bounds cell within Euclidean `radius` of
/// `center`, center included.
///
/// Columns are walked within `radius` of `center.x`; each column's row span
/// is `floor(sqrt(radius^2 - dx^2))`, so no bounding-box cells are wasted.
pub fn visit_neighborhood<F>(size_x: u16, size_y: u16, center: Coord, radius: f32, mut f: F)
where
    F: FnMut(Coord),
{
    let r = radius as i32;
    let (cx, cy) = (center.x as i32, center.y as i32);
    let (sx, sy) = (size_x as i32, size_y as i32);

    for dx in -r.min(cx)..=r.min(sx - cx - 1) {
        let extent_y = (radius * radius - (dx * dx) as f32).sqrt() as i32;
        for dy in -extent_y.min(cy)..=extent_y.min(sy - cy - 1) {
            f(Coord::new((cx + dx) as i16, (cy + dy) as i16));
        }
    }
}

/// Column-major 2D array of cell values.
///
/// A cell is [`EMPTY`], [`BARRIER`], or the handle of the peep standing
/// there. Outside the drain phase, every handle stored here belongs to a
/// live peep whose recorded location is that cell.
#[derive(Clone, Debug)]
pub struct Grid {
    size_x: u16,
    size_y: u16,
    cells: Vec<u16>,
    barrier_locations: Vec<Coord>,
    barrier_centers: Vec<Coord>,
}

impl Grid {
    /// Create an empty grid
    pub fn new(size_x: u16, size_y: u16) -> Self {
        Self {
            size_x,
            size_y,
            cells: vec![EMPTY; size_x as usize * size_y as usize],
            barrier_locations: Vec::new(),
            barrier_centers: Vec::new(),
        }
    }

    #[inline]
    pub fn size_x(&self) -> u16 {
        self.size_x
    }

    #[inline]
    pub fn size_y(&self) -> u16 {
        self.size_y
    }

    #[inline]
    pub fn in_bounds(&self, loc: Coord) -> bool {
        loc.x >= 0 && (loc.x as u16) < self.size_x && loc.y >= 0 && (loc.y as u16) < self.size_y
    }

    #[inline]
    fn index(&self, loc: Coord) -> usize {
        debug_assert!(self.in_bounds(loc), "{} is outside the grid", loc);
        loc.x as usize * self.size_y as usize + loc.y as usize
    }

    /// Raw cell value
    #[inline]
    pub fn at(&self, loc: Coord) -> u16 {
        self.cells[self.index(loc)]
    }

    #[inline]
    pub fn set(&mut self, loc: Coord, value: u16) {
        let idx = self.index(loc);
        self.cells[idx] = value;
    }

    #[inline]
    pub fn is_empty_at(&self, loc: Coord) -> bool {
        self.at(loc) == EMPTY
    }

    #[inline]
    pub fn is_barrier_at(&self, loc: Coord) -> bool {
        self.at(loc) == BARRIER
    }

    /// True when a peep stands at `loc`
    #[inline]
    pub fn is_occupied_at(&self, loc: Coord) -> bool {
        let value = self.at(loc);
        value != EMPTY && value != BARRIER
    }

    /// Handle of the peep at `loc`, if any
    pub fn occupant(&self, loc: Coord) -> Option<u16> {
        if self.in_bounds(loc) && self.is_occupied_at(loc) {
            Some(self.at(loc))
        } else {
            None
        }
    }

    /// Clear every cell and forget barriers
    pub fn zero_fill(&mut self) {
        self.cells.fill(EMPTY);
        self.barrier_locations.clear();
        self.barrier_centers.clear();
    }

    /// Mark `loc` as a barrier and remember it for rendering
    pub fn set_barrier(&mut self, loc: Coord) {
        if !self.is_barrier_at(loc) {
            self.set(loc, BARRIER);
            self.barrier_locations.push(loc);
        }
    }

    pub fn add_barrier_center(&mut self, center: Coord) {
        self.barrier_centers.push(center);
    }

    pub fn barrier_locations(&self) -> &[Coord] {
        &self.barrier_locations
    }

    /// Centers of circular barriers, used by location-sequence scoring
    pub fn barrier_centers(&self) -> &[Coord] {
        &self.barrier_centers
    }

    /// Rejection-samples a uniformly random empty cell.
    ///
    /// The caller guarantees at least one empty cell exists.
    pub fn find_empty_location<R: Rng + ?Sized>(&self, rng: &mut R) -> Coord {
        loop {
            let loc = Coord::new(
                rng.gen_range(0..self.size_x) as i16,
                rng.gen_range(0..self.size_y) as i16,
            );
            if self.is_empty_at(loc) {
                return loc;
            }
        }
    }

    pub fn visit_neighborhood<F>(&self, center: Coord, radius: f32, f: F)
    where
        F: FnMut(Coord),
    {
        visit_neighborhood(self.size_x, self.size_y, center, radius, f);
    }

    /// Number of cells neither occupied nor blocked
    pub fn empty_count(&self) -> usize {
        self.cells.iter().filter(|&&v| v == EMPTY).count()
    }

    /// True on the outermost ring of cells
    pub fn is_border(&self, loc: Coord) -> bool {
        loc.x == 0 || loc.y == 0 || loc.x as i32 == self.size_x as i32 - 1 || loc.y as i32 == self.size_y as i32 - 1
    }

    /// Number of cells holding a peep handle
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&v| v != EMPTY && v != BARRIER).count()
    }

    /// Iterates `(location, handle)` over occupied cells
    pub fn occupied_cells(&self) -> impl Iterator<Item = (Coord, u16)> + '_ {
        let size_y = self.size_y as usize;
        self.cells.iter().enumerate().filter_map(move |(i, &v)| {
            if v != EMPTY && v != BARRIER {
                Some((Coord::new((i / size_y) as i16, (i % size_y) as i16), v))
            } else {
                None
            }
        })
    }
}
