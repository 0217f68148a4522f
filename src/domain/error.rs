// ============================================================
// Layer 3 - Pipeline Errors
// ============================================================
// Failure points of the data-preparation pipeline. Callers in the
// application layer wrap these into anyhow errors with context.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A coordinate or interval falls outside the valid range
    #[error("invalid coordinate on {chrom}: [{start}, {end}) outside 0..{limit}")]
    InvalidCoordinate {
        chrom: String,
        start: u64,
        end:   u64,
        limit: u64,
    },

    #[error("missing input file: {}", .0.display())]
    MissingFile(PathBuf),

    /// A table row that cannot be interpreted (1-based line number)
    #[error("malformed row at line {line}: {reason}")]
    MalformedRow { line: usize, reason: String },

    #[error("unsupported chromosome: {0}")]
    UnknownChromosome(String),
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
