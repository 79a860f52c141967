//! Genome mutation: insertion/deletion, point mutations and cropping.

use super::gene::{Gene, Genome, INDEX_MASK};
use crate::config::MutationConfig;
use rand::Rng;

/// Applies one round of mutation: a possible insertion or deletion,
/// then independent point mutations.
pub fn mutate<R: Rng + ?Sized>(genome: &mut Genome, config: &MutationConfig, max_length: usize, rng: &mut R) {
    random_insert_deletion(genome, config.insertion_deletion_rate, config.deletion_ratio, max_length, rng);
    apply_point_mutations(genome, config.point_mutation_rate, rng);
}

/// With probability `rate`, deletes a random gene (share `deletion_ratio`)
/// or appends a fresh random gene. Never shrinks below one gene or grows
/// past `max_length`.
pub fn random_insert_deletion<R: Rng + ?Sized>(
    genome: &mut Genome,
    rate: f32,
    deletion_ratio: f32,
    max_length: usize,
    rng: &mut R,
) {
    if rng.gen::<f32>() >= rate {
        return;
    }

    let genes = genome.genes_mut();
    if rng.gen::<f32>() < deletion_ratio {
        if genes.len() > 1 {
            let index = rng.gen_range(0..genes.len());
            genes.remove(index);
        }
    } else if genes.len() < max_length {
        genes.push(Gene::random(rng));
    }
}

/// Gives every gene position one chance at a bit flip.
pub fn apply_point_mutations<R: Rng + ?Sized>(genome: &mut Genome, rate: f32, rng: &mut R) {
    for _ in 0..genome.len() {
        if rng.gen::<f32>() < rate {
            random_bit_flip(genome, rng);
        }
    }
}

/// Flips one bit-field of a randomly chosen gene.
pub fn random_bit_flip<R: Rng + ?Sized>(genome: &mut Genome, rng: &mut R) {
    if genome.is_empty() {
        return;
    }
    let genes = genome.genes_mut();
    let index = rng.gen_range(0..genes.len());
    let bit = 1u8 << rng.gen_range(0..8);
    let gene = &mut genes[index];

    let chance: f32 = rng.gen();
    if chance < 0.2 {
        gene.source_kind = gene.source_kind.flipped();
    } else if chance < 0.4 {
        gene.sink_kind = gene.sink_kind.flipped();
    } else if chance < 0.6 {
        gene.source_num = (gene.source_num ^ bit) & INDEX_MASK;
    } else if chance < 0.8 {
        gene.sink_num = (gene.sink_num ^ bit) & INDEX_MASK;
    } else {
        gene.weight ^= 1i16 << rng.gen_range(1..=15);
    }
}

/// Trims `genome` to `length` genes from the front or the back, chosen by
/// a fair coin. Does nothing when already short enough or `length == 0`.
pub fn crop_length<R: Rng + ?Sized>(genome: &mut Genome, length: usize, rng: &mut R) {
    let genes = genome.genes_mut();
    if genes.len() <= length || length == 0 {
        return;
    }
    let excess = genes.len() - length;
    if rng.gen::<f32>() < 0.5 {
        genes.drain(..excess);
    } else {
        genes.truncate(length);
    }
}
