//! Peep arena and the deferred death and move queues.
//!
//! Handles index straight into the arena. Slot 0 is a dead placeholder so
//! that a grid cell's handle never needs translating.

use crate::config::Config;
use crate::geometry::Coord;
use crate::genetics::Genome;
use crate::grid::{Grid, EMPTY};
use crate::peep::{self, Peep, PeepState};
use rand::Rng;
use std::sync::Mutex;

/// Requests collected during the parallel phase of a tick.
///
/// Each push takes a short lock; the drain phase takes the queues whole.
#[derive(Debug, Default)]
pub struct RequestQueues {
    deaths: Mutex<Vec<u16>>,
    moves: Mutex<Vec<(u16, Coord)>>,
}

impl RequestQueues {
    /// Asks for `victim` to die at the end of the tick. Dead peeps are
    /// ignored.
    pub fn queue_for_death(&self, victim: &Peep) {
        if victim.alive {
            self.deaths.lock().unwrap_or_else(|e| e.into_inner()).push(victim.index);
        }
    }

    /// Asks for peep `index` to move to `to` at the end of the tick.
    pub fn queue_for_move(&self, index: u16, to: Coord) {
        self.moves.lock().unwrap_or_else(|e| e.into_inner()).push((index, to));
    }

    pub fn pending_deaths(&self) -> usize {
        self.deaths.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Empties the death queue, ordered by handle.
    pub fn take_deaths(&mut self) -> Vec<u16> {
        let mut deaths = std::mem::take(self.deaths.get_mut().unwrap_or_else(|e| e.into_inner()));
        deaths.sort_unstable();
        deaths
    }

    /// Empties the move queue, ordered by handle. Requests from one peep
    /// keep their submission order.
    pub fn take_moves(&mut self) -> Vec<(u16, Coord)> {
        let mut moves = std::mem::take(self.moves.get_mut().unwrap_or_else(|e| e.into_inner()));
        moves.sort_by_key(|&(index, _)| index);
        moves
    }
}

/// Every peep of the current generation.
#[derive(Debug)]
pub struct PeepsPool {
    peeps: Vec<Peep>,
    states: Vec<PeepState>,
    queues: RequestQueues,
}

impl PeepsPool {
    /// Allocates `population` dead peeps plus the reserved slot.
    pub fn new(population: usize) -> Self {
        Self {
            peeps: vec![Peep::default(); population + 1],
            states: vec![PeepState::default(); population + 1],
            queues: RequestQueues::default(),
        }
    }

    /// Population size, excluding the reserved slot
    pub fn len(&self) -> usize {
        self.peeps.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Peep with handle `index`
    #[inline]
    pub fn get(&self, index: u16) -> &Peep {
        &self.peeps[index as usize]
    }

    #[inline]
    pub fn get_mut(&mut self, index: u16) -> &mut Peep {
        &mut self.peeps[index as usize]
    }

    #[inline]
    pub fn state(&self, index: u16) -> &PeepState {
        &self.states[index as usize]
    }

    /// Every body indexed by handle, reserved slot included
    pub fn peeps(&self) -> &[Peep] {
        &self.peeps
    }

    /// Peeps with handles `1..=len`
    pub fn iter(&self) -> impl Iterator<Item = &Peep> {
        self.peeps.iter().skip(1)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Peep> {
        self.peeps.iter_mut().skip(1)
    }

    pub fn living(&self) -> impl Iterator<Item = &Peep> {
        self.iter().filter(|p| p.alive)
    }

    pub fn alive_count(&self) -> usize {
        self.living().count()
    }

    pub fn queues(&self) -> &RequestQueues {
        &self.queues
    }

    /// Births peep `index` at `loc` with `genome`.
    pub fn spawn<R: Rng + ?Sized>(
        &mut self,
        index: u16,
        loc: Coord,
        genome: Genome,
        config: &Config,
        grid: &mut Grid,
        rng: &mut R,
    ) {
        let (body, state) = peep::spawn(index, loc, genome, config, grid, rng);
        self.peeps[index as usize] = body;
        self.states[index as usize] = state;
    }

    /// Splits the pool for the parallel phase: every body read-only, each
    /// peep's own state (slot 0 excluded) writable, and the shared queues.
    pub fn split_for_tick(&mut self) -> (&[Peep], &mut [PeepState], &RequestQueues) {
        (&self.peeps, &mut self.states[1..], &self.queues)
    }

    /// Applies queued deaths: clears each victim's cell and marks it dead.
    /// Returns how many peeps died.
    pub fn drain_death_queue(&mut self, grid: &mut Grid) -> usize {
        let mut died = 0;
        for index in self.queues.take_deaths() {
            let peep = &mut self.peeps[index as usize];
            if !peep.alive {
                continue;
            }
            grid.set(peep.loc, EMPTY);
            peep.alive = false;
            died += 1;
        }
        died
    }

    /// Applies queued moves whose destination is still empty. Moves of
    /// peeps that died this tick are dropped.
    pub fn drain_move_queue(&mut self, grid: &mut Grid) {
        for (index, to) in self.queues.take_moves() {
            let peep = &mut self.peeps[index as usize];
            if !peep.alive || !grid.is_empty_at(to) {
                continue;
            }
            let facing = (to - peep.loc).as_dir();
            grid.set(peep.loc, EMPTY);
            grid.set(to, index);
            peep.loc = to;
            peep.last_move_dir = facing;
        }
    }
}
