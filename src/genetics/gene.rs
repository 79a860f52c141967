//! Genes and genomes.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Where a connection draws its input from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    Neuron = 0,
    Sensor = 1,
}

/// Where a connection delivers its output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SinkKind {
    Neuron = 0,
    Action = 1,
}

impl SourceKind {
    pub fn flipped(self) -> Self {
        match self {
            SourceKind::Neuron => SourceKind::Sensor,
            SourceKind::Sensor => SourceKind::Neuron,
        }
    }

    pub fn bit(self) -> u8 {
        self as u8
    }
}

impl SinkKind {
    pub fn flipped(self) -> Self {
        match self {
            SinkKind::Neuron => SinkKind::Action,
            SinkKind::Action => SinkKind::Neuron,
        }
    }

    pub fn bit(self) -> u8 {
        self as u8
    }
}

/// Mask for the 7-bit source/sink index fields.
pub const INDEX_MASK: u8 = 0x7f;

/// Divisor that maps the raw `i16` weight onto roughly `[-4, 4)`.
pub const WEIGHT_SCALE: f32 = 8192.0;

/// One weighted edge between a source (sensor or neuron) and a sink
/// (neuron or action). Four bytes of payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Gene {
    pub source_kind: SourceKind,
    pub source_num: u8,
    pub sink_kind: SinkKind,
    pub sink_num: u8,
    pub weight: i16,
}

impl Gene {
    pub fn new(source_kind: SourceKind, source_num: u8, sink_kind: SinkKind, sink_num: u8, weight: i16) -> Self {
        Self {
            source_kind,
            source_num: source_num & INDEX_MASK,
            sink_kind,
            sink_num: sink_num & INDEX_MASK,
            weight,
        }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let source_kind = if rng.gen::<bool>() { SourceKind::Sensor } else { SourceKind::Neuron };
        let source_num = (rng.gen_range(0..=0x7fffu16) as u8) & INDEX_MASK;
        let sink_kind = if rng.gen::<bool>() { SinkKind::Action } else { SinkKind::Neuron };
        let sink_num = (rng.gen_range(0..=0x7fffu16) as u8) & INDEX_MASK;
        Self {
            source_kind,
            source_num,
            sink_kind,
            sink_num,
            weight: Self::random_weight(rng),
        }
    }

    /// Uniform over `[-0x8000, 0x6fff]`.
    pub fn random_weight<R: Rng + ?Sized>(rng: &mut R) -> i16 {
        (rng.gen_range(0..=0xefffi32) - 0x8000) as i16
    }

    pub fn weight_as_float(&self) -> f32 {
        self.weight as f32 / WEIGHT_SCALE
    }

    /// Weight that decodes to `value`, saturating at the `i16` range.
    pub fn weight_from_float(value: f32) -> i16 {
        (value * WEIGHT_SCALE).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16
    }

    /// Packed byte image: kind bit over the 7-bit index, then the weight
    /// little-endian.
    pub fn to_bytes(&self) -> [u8; 4] {
        let [lo, hi] = self.weight.to_le_bytes();
        [
            self.source_kind.bit() << 7 | (self.source_num & INDEX_MASK),
            self.sink_kind.bit() << 7 | (self.sink_num & INDEX_MASK),
            lo,
            hi,
        ]
    }

    pub fn to_hex(&self) -> String {
        self.to_bytes().iter().map(|b| format!("{:02x}", b)).collect()
    }
}

/// Ordered sequence of genes owned by one peep.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genome {
    genes: Vec<Gene>,
}

impl Genome {
    pub fn new(genes: Vec<Gene>) -> Self {
        Self { genes }
    }

    /// Random genome with a length drawn uniformly from `min_len..=max_len`.
    pub fn random<R: Rng + ?Sized>(min_len: usize, max_len: usize, rng: &mut R) -> Self {
        let len = rng.gen_range(min_len..=max_len);
        Self {
            genes: (0..len).map(|_| Gene::random(rng)).collect(),
        }
    }

    pub fn genes(&self) -> &[Gene] {
        &self.genes
    }

    pub fn genes_mut(&mut self) -> &mut Vec<Gene> {
        &mut self.genes
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Gene> {
        self.genes.iter()
    }

    pub fn first(&self) -> Option<&Gene> {
        self.genes.first()
    }

    pub fn last(&self) -> Option<&Gene> {
        self.genes.last()
    }

    /// Space-separated hex dump, eight genes per line.
    pub fn to_hex(&self) -> String {
        self.genes
            .chunks(8)
            .map(|line| line.iter().map(Gene::to_hex).collect::<Vec<_>>().join(" "))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<Vec<Gene>> for Genome {
    fn from(genes: Vec<Gene>) -> Self {
        Self::new(genes)
    }
}

impl<'a> IntoIterator for &'a Genome {
    type Item = &'a Gene;
    type IntoIter = std::slice::Iter<'a, Gene>;

    fn into_iter(self) -> Self::IntoIter {
        self.genes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_weight_decoding_is_linear() {
        let gene = Gene::new(SourceKind::Sensor, 0, SinkKind::Action, 0, 8192);
        assert_eq!(gene.weight_as_float(), 1.0);
        let gene = Gene::new(SourceKind::Sensor, 0, SinkKind::Action, 0, -4096);
        assert_eq!(gene.weight_as_float(), -0.5);
        assert_eq!(Gene::weight_from_float(1.0), 8192);
        assert_eq!(Gene::weight_from_float(100.0), i16::MAX);
    }

    #[test]
    fn test_random_gene_fields_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..1000 {
            let gene = Gene::random(&mut rng);
            assert!(gene.source_num <= INDEX_MASK);
            assert!(gene.sink_num <= INDEX_MASK);
            assert!(gene.weight <= 0x6fff);
        }
    }

    #[test]
    fn test_byte_image() {
        let gene = Gene::new(SourceKind::Sensor, 5, SinkKind::Neuron, 0x7f, 0x0102);
        assert_eq!(gene.to_bytes(), [0x85, 0x7f, 0x02, 0x01]);
        assert_eq!(gene.to_hex(), "857f0201");
    }

    #[test]
    fn test_new_masks_indices() {
        let gene = Gene::new(SourceKind::Neuron, 0xff, SinkKind::Action, 0x80, 0);
        assert_eq!(gene.source_num, 0x7f);
        assert_eq!(gene.sink_num, 0);
    }

    #[test]
    fn test_random_genome_length() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        for _ in 0..50 {
            let genome = Genome::random(3, 9, &mut rng);
            assert!((3..=9).contains(&genome.len()));
        }
    }
}
