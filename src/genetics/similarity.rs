//! Genome similarity metrics, each returning a value in `[0, 1]`.

use super::gene::{Gene, Genome};
use serde::{Deserialize, Serialize};

/// Genes beyond this prefix are ignored by the Jaro-Winkler metric.
pub const JARO_WINKLER_MAX_GENES: usize = 20;

/// Selects how two genomes are compared.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimilarityMethod {
    /// Alignment-tolerant; works on genomes of any length.
    JaroWinkler,
    /// Fraction of equal bits, rescaled so random genomes score about 0.
    #[default]
    HammingBits,
    /// Fraction of equal bytes.
    HammingBytes,
}

impl SimilarityMethod {
    /// Hamming metrics only compare genomes of equal length.
    pub fn requires_equal_length(self) -> bool {
        !matches!(self, SimilarityMethod::JaroWinkler)
    }
}

/// Compares two genomes with `method`.
///
/// # Panics
///
/// Hamming methods panic on genomes of different lengths.
pub fn similarity(g1: &Genome, g2: &Genome, method: SimilarityMethod) -> f32 {
    match method {
        SimilarityMethod::JaroWinkler => jaro_winkler(g1, g2),
        SimilarityMethod::HammingBits => hamming_bits(g1, g2),
        SimilarityMethod::HammingBytes => hamming_bytes(g1, g2),
    }
}

/// Like [`similarity`], but falls back to Jaro-Winkler when `method` cannot
/// handle the pair's lengths.
pub fn similarity_or_aligned(g1: &Genome, g2: &Genome, method: SimilarityMethod) -> f32 {
    if method.requires_equal_length() && g1.len() != g2.len() {
        jaro_winkler(g1, g2)
    } else {
        similarity(g1, g2, method)
    }
}

/// Jaro similarity over genes, tolerant of gaps, shifts and unequal lengths.
/// Only the first [`JARO_WINKLER_MAX_GENES`] genes of each genome count.
pub fn jaro_winkler(g1: &Genome, g2: &Genome) -> f32 {
    let s: &[Gene] = &g1.genes()[..g1.len().min(JARO_WINKLER_MAX_GENES)];
    let a: &[Gene] = &g2.genes()[..g2.len().min(JARO_WINKLER_MAX_GENES)];
    let (sl, al) = (s.len(), a.len());
    if sl == 0 || al == 0 {
        return 0.0;
    }

    let range = (sl.max(al) / 2).saturating_sub(1);
    let mut s_flags = vec![false; sl];
    let mut a_flags = vec![false; al];
    let mut matches = 0usize;

    for (i, gene) in a.iter().enumerate() {
        let lo = i.saturating_sub(range);
        let hi = (i + range + 1).min(sl);
        for j in lo..hi {
            if !s_flags[j] && s[j] == *gene {
                s_flags[j] = true;
                a_flags[i] = true;
                matches += 1;
                break;
            }
        }
    }
    if matches == 0 {
        return 0.0;
    }

    // Matched genes taken in order from each side; mismatched pairs are
    // transpositions.
    let s_matched = s.iter().zip(&s_flags).filter(|&(_, &f)| f).map(|(g, _)| g);
    let a_matched = a.iter().zip(&a_flags).filter(|&(_, &f)| f).map(|(g, _)| g);
    let transpositions = a_matched.zip(s_matched).filter(|(x, y)| x != y).count() / 2;

    let m = matches as f32;
    (m / sl as f32 + m / al as f32 + (m - transpositions as f32) / m) / 3.0
}

/// Bitwise similarity of equal-length genomes.
///
/// Two random bit patterns differ in about half their bits, so the raw
/// match ratio is doubled and clipped to give roughly `[0, 1]`.
pub fn hamming_bits(g1: &Genome, g2: &Genome) -> f32 {
    assert_eq!(g1.len(), g2.len(), "bitwise Hamming similarity needs equal-length genomes");
    if g1.is_empty() {
        return 1.0;
    }
    let differing: u32 = g1
        .iter()
        .zip(g2.iter())
        .flat_map(|(x, y)| x.to_bytes().into_iter().zip(y.to_bytes()))
        .map(|(bx, by)| (bx ^ by).count_ones())
        .sum();
    let total_bits = (g1.len() * 4 * 8) as f32;
    1.0 - (2.0 * differing as f32 / total_bits).min(1.0)
}

/// Bytewise similarity of equal-length genomes.
pub fn hamming_bytes(g1: &Genome, g2: &Genome) -> f32 {
    assert_eq!(g1.len(), g2.len(), "bytewise Hamming similarity needs equal-length genomes");
    if g1.is_empty() {
        return 1.0;
    }
    let equal = g1
        .iter()
        .zip(g2.iter())
        .flat_map(|(x, y)| x.to_bytes().into_iter().zip(y.to_bytes()))
        .filter(|(bx, by)| bx == by)
        .count();
    equal as f32 / (g1.len() * 4) as f32
}
