// ============================================================
// Layer 3 - Domain Layer
// ============================================================
// Plain Rust types describing motifs, genomic regions and the
// labeled token sequences the rest of the pipeline passes around.
//
// Rules for this layer:
//   - NO Burn framework types
//   - NO file I/O
//   - Only structs, enums, errors and traits

/// Chromosome identifiers (chr1..chr22, chrX, chrY)
pub mod chromosome;

/// Genomic regions, binding labels and motif records
pub mod motif;

/// Typed pipeline errors
pub mod error;

/// Core abstractions (traits) that other layers implement
pub mod traits;
