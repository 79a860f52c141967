//! Parent selection and genome crossover.

use super::gene::Genome;
use super::mutation::crop_length;
use rand::Rng;

/// Picks two parent indices from a pool of `pool_len` genomes sorted
/// best-first.
///
/// Fitness-weighted selection draws the first parent from `1..=n-1` and the
/// second from strictly better-ranked slots, so low ranks appear less often.
/// Otherwise both are uniform over the pool.
pub fn select_parents<R: Rng + ?Sized>(pool_len: usize, by_fitness: bool, rng: &mut R) -> (usize, usize) {
    assert!(pool_len > 0, "cannot select parents from an empty pool");
    if by_fitness && pool_len > 1 {
        let first = rng.gen_range(1..pool_len);
        let second = rng.gen_range(0..first);
        (first, second)
    } else {
        (rng.gen_range(0..pool_len), rng.gen_range(0..pool_len))
    }
}

/// Produces a child genome from two parents, before mutation.
///
/// Sexual: copy the longer parent, overlay a random slice of the shorter one
/// at the same offsets, then crop to the average parent length (rounding up
/// half the time when the sum is odd). Asexual: a copy of `g2`.
pub fn crossover<R: Rng + ?Sized>(g1: &Genome, g2: &Genome, sexual: bool, rng: &mut R) -> Genome {
    assert!(!g1.is_empty() && !g2.is_empty(), "parents must carry at least one gene");

    if !sexual {
        return g2.clone();
    }

    let (longer, shorter) = if g1.len() > g2.len() { (g1, g2) } else { (g2, g1) };
    let mut child = longer.clone();
    overlay_slice(&mut child, shorter, rng);

    let mut sum = g1.len() + g2.len();
    if sum % 2 == 1 && rng.gen::<bool>() {
        sum += 1;
    }
    crop_length(&mut child, sum / 2, rng);
    debug_assert!(!child.is_empty());
    child
}

fn overlay_slice<R: Rng + ?Sized>(child: &mut Genome, shorter: &Genome, rng: &mut R) {
    let mut i0 = rng.gen_range(0..shorter.len());
    let mut i1 = rng.gen_range(0..=shorter.len());
    if i0 > i1 {
        std::mem::swap(&mut i0, &mut i1);
    }
    child.genes_mut()[i0..i1].copy_from_slice(&shorter.genes()[i0..i1]);
}
