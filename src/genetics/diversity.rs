//! Population-level genetics metrics.

use super::gene::Genome;
use super::similarity::{similarity_or_aligned, SimilarityMethod};
use rand::Rng;

/// Maximum adjacent pairs sampled by [`genetic_diversity`].
pub const DIVERSITY_SAMPLES: usize = 1000;

/// Genomes sampled by [`average_genome_length`].
pub const LENGTH_SAMPLES: usize = 100;

/// Eight-bit color derived from a handful of genome bits, so that related
/// peeps tend to share a color.
pub fn genetic_color(genome: &Genome) -> u8 {
    let (Some(front), Some(back)) = (genome.first(), genome.last()) else {
        return 0;
    };
    (genome.len() & 1) as u8
        | front.source_kind.bit() << 1
        | back.source_kind.bit() << 2
        | front.sink_kind.bit() << 3
        | back.sink_kind.bit() << 4
        | (front.source_num & 1) << 5
        | (front.sink_num & 1) << 6
        | (back.source_num & 1) << 7
}

/// Estimates `1 - mean similarity` by sampling neighbouring genomes.
///
/// Returns 0 for fewer than two genomes.
pub fn genetic_diversity<R: Rng + ?Sized>(genomes: &[&Genome], method: SimilarityMethod, rng: &mut R) -> f32 {
    if genomes.len() < 2 {
        return 0.0;
    }
    let samples = DIVERSITY_SAMPLES.min(genomes.len());
    let total: f32 = (0..samples)
        .map(|_| {
            let i = rng.gen_range(0..genomes.len() - 1);
            similarity_or_aligned(genomes[i], genomes[i + 1], method)
        })
        .sum();
    1.0 - total / samples as f32
}

/// Mean genome length over a random sample.
pub fn average_genome_length<R: Rng + ?Sized>(genomes: &[&Genome], rng: &mut R) -> f32 {
    if genomes.is_empty() {
        return 0.0;
    }
    let total: usize = (0..LENGTH_SAMPLES)
        .map(|_| genomes[rng.gen_range(0..genomes.len())].len())
        .sum();
    total as f32 / LENGTH_SAMPLES as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genetics::gene::{Gene, SinkKind, SourceKind};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_color_bits() {
        let front = Gene::new(SourceKind::Sensor, 1, SinkKind::Action, 1, 0);
        let back = Gene::new(SourceKind::Neuron, 1, SinkKind::Neuron, 0, 0);
        let genome: Genome = vec![front, back].into();
        // even length, front sensor, back neuron, front action, back neuron,
        // front source odd, front sink odd, back source odd
        assert_eq!(genetic_color(&genome), 0b1110_1010);
        assert_eq!(genetic_color(&Genome::default()), 0);
    }

    #[test]
    fn test_clones_have_no_diversity() {
        let mut rng = ChaCha8Rng::seed_from_u64(31);
        let genome = Genome::random(8, 8, &mut rng);
        let population = vec![&genome; 30];
        assert_eq!(genetic_diversity(&population, SimilarityMethod::HammingBits, &mut rng), 0.0);
    }

    #[test]
    fn test_random_population_is_diverse() {
        let mut rng = ChaCha8Rng::seed_from_u64(32);
        let genomes: Vec<Genome> = (0..50).map(|_| Genome::random(16, 16, &mut rng)).collect();
        let refs: Vec<&Genome> = genomes.iter().collect();
        let diversity = genetic_diversity(&refs, SimilarityMethod::HammingBits, &mut rng);
        assert!(diversity > 0.5, "diversity = {}", diversity);
    }

    #[test]
    fn test_diversity_of_tiny_population() {
        let mut rng = ChaCha8Rng::seed_from_u64(33);
        let genome = Genome::random(4, 4, &mut rng);
        assert_eq!(genetic_diversity(&[&genome], SimilarityMethod::JaroWinkler, &mut rng), 0.0);
    }

    #[test]
    fn test_average_length() {
        let mut rng = ChaCha8Rng::seed_from_u64(34);
        let genome = Genome::random(7, 7, &mut rng);
        assert_eq!(average_genome_length(&[&genome, &genome], &mut rng), 7.0);
        assert_eq!(average_genome_length(&[], &mut rng), 0.0);
    }
}
