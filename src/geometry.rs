//! Integer grid geometry: coordinates and the eight compass directions.
//!
//! Compass values are laid out on a 3x3 keypad so that a direction maps
//! to its unit offset arithmetically:
//!
//! ```text
//!     6  7  8        NW  N  NE
//!     3  4  5   =>   W   C   E
//!     0  1  2        SW  S  SE
//! ```
//!
//! North is `+y`.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// One of the eight compass directions, or `Center` for "no direction".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Compass {
    SW = 0,
    S,
    SE,
    W,
    Center,
    E,
    NW,
    N,
    NE,
}

impl Compass {
    const ALL: [Compass; 9] = [
        Compass::SW,
        Compass::S,
        Compass::SE,
        Compass::W,
        Compass::Center,
        Compass::E,
        Compass::NW,
        Compass::N,
        Compass::NE,
    ];

    /// Clockwise ring starting at north. Used for rotation.
    const RING: [Compass; 8] = [
        Compass::N,
        Compass::NE,
        Compass::E,
        Compass::SE,
        Compass::S,
        Compass::SW,
        Compass::W,
        Compass::NW,
    ];

    fn ring_position(self) -> Option<usize> {
        Self::RING.iter().position(|&c| c == self)
    }
}

/// A facing direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dir(Compass);

impl Default for Dir {
    fn default() -> Self {
        Dir(Compass::Center)
    }
}

impl From<Compass> for Dir {
    fn from(compass: Compass) -> Self {
        Dir(compass)
    }
}

impl Dir {
    pub fn new(compass: Compass) -> Self {
        Dir(compass)
    }

    /// Uniformly random among the eight non-center directions.
    pub fn random8<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Dir(Compass::N).rotate(rng.gen_range(0..8))
    }

    pub fn compass(self) -> Compass {
        self.0
    }

    pub fn as_u8(self) -> u8 {
        self.0 as u8
    }

    pub fn is_center(self) -> bool {
        self.0 == Compass::Center
    }

    /// Unit offset for this direction: `(d % 3 - 1, d / 3 - 1)`.
    pub fn as_normalized_coord(self) -> Coord {
        let d = self.as_u8() as i16;
        Coord::new(d % 3 - 1, d / 3 - 1)
    }

    /// Rotates by `n` eighths of a turn. Positive is clockwise.
    /// `Center` is unaffected.
    pub fn rotate(self, n: i32) -> Self {
        match self.0.ring_position() {
            Some(pos) => {
                let idx = (pos as i32 + n).rem_euclid(8) as usize;
                Dir(Compass::RING[idx])
            }
            None => self,
        }
    }

    pub fn rotate_90_cw(self) -> Self {
        self.rotate(2)
    }

    pub fn rotate_90_ccw(self) -> Self {
        self.rotate(-2)
    }

    pub fn rotate_180(self) -> Self {
        self.rotate(4)
    }
}

/// A grid location, or the difference between two locations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub x: i16,
    pub y: i16,
}

impl Coord {
    pub const fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }

    /// Euclidean length, rounded down.
    pub fn length(self) -> u32 {
        let (x, y) = (self.x as f64, self.y as f64);
        (x * x + y * y).sqrt() as u32
    }

    pub fn is_normalized(self) -> bool {
        (-1..=1).contains(&self.x) && (-1..=1).contains(&self.y)
    }

    /// Nearest of the eight compass directions; the zero vector maps to `Center`.
    ///
    /// The plane is pre-rotated by 22.5 degrees so that each 45 degree sector
    /// boundary lines up with an axis or diagonal, which turns the lookup into
    /// four sign tests.
    pub fn as_dir(self) -> Dir {
        const TAN_N: i32 = 13860;
        const TAN_D: i32 = 33461;
        const CONVERSION: [Compass; 16] = [
            Compass::S,
            Compass::Center,
            Compass::SW,
            Compass::N,
            Compass::SE,
            Compass::E,
            Compass::N,
            Compass::N,
            Compass::N,
            Compass::N,
            Compass::W,
            Compass::NW,
            Compass::N,
            Compass::NE,
            Compass::N,
            Compass::N,
        ];

        let (x, y) = (self.x as i32, self.y as i32);
        let xp = x * TAN_D + y * TAN_N;
        let yp = y * TAN_D - x * TAN_N;
        let idx = (yp > 0) as usize * 8
            + (xp > 0) as usize * 4
            + (yp > xp) as usize * 2
            + (yp >= -xp) as usize;
        Dir(CONVERSION[idx])
    }

    pub fn normalize(self) -> Coord {
        self.as_dir().as_normalized_coord()
    }
}

impl Add for Coord {
    type Output = Coord;

    fn add(self, rhs: Coord) -> Coord {
        Coord::new(self.x.wrapping_add(rhs.x), self.y.wrapping_add(rhs.y))
    }
}

impl Sub for Coord {
    type Output = Coord;

    fn sub(self, rhs: Coord) -> Coord {
        Coord::new(self.x.wrapping_sub(rhs.x), self.y.wrapping_sub(rhs.y))
    }
}

impl Add<Dir> for Coord {
    type Output = Coord;

    fn add(self, rhs: Dir) -> Coord {
        self + rhs.as_normalized_coord()
    }
}

impl Sub<Dir> for Coord {
    type Output = Coord;

    fn sub(self, rhs: Dir) -> Coord {
        self - rhs.as_normalized_coord()
    }
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl TryFrom<u8> for Compass {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Compass::ALL.get(value as usize).copied().ok_or(value)
    }
}
