//! Genetics module - genes, genomes and the operators evolution applies to them.

pub mod crossover;
pub mod diversity;
pub mod gene;
pub mod mutation;
pub mod similarity;

pub use crossover::{crossover, select_parents};
pub use diversity::{average_genome_length, genetic_color, genetic_diversity};
pub use gene::{Gene, Genome, SinkKind, SourceKind};
pub use mutation::{crop_length, mutate};
pub use similarity::{similarity, similarity_or_aligned, SimilarityMethod};
