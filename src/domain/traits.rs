// ============================================================
// Layer 3 - Core Traits (Abstractions)
// ============================================================
// The application layer programs against these traits so the
// data sources can be swapped (files on disk, in-memory fixtures).

use anyhow::Result;

use crate::domain::chromosome::Chromosome;
use crate::domain::motif::MotifRecord;

// ─── MotifSource ──────────────────────────────────────────────────────────────
/// Any component that can produce labeled motif records.
///
/// Implementations:
///   - AnnotationLoader → motif/peak intersection table on disk
pub trait MotifSource {
    fn load_all(&self) -> Result<Vec<MotifRecord>>;
}

// ─── TokenSource ──────────────────────────────────────────────────────────────
/// Any component that can provide the whole-chromosome tokenization.
///
/// Implementations:
///   - ChromosomeTokenStore → one pickle / text file per chromosome
pub trait TokenSource {
    /// Ordered tokens covering the chromosome from position 0
    fn load_chromosome(&self, chrom: Chromosome) -> Result<Vec<String>>;
}
