// ============================================================
// Layer 4 - Region-to-Token Slicer
// ============================================================
// Converts a nucleotide window into the tokens covering it by
// looking up both window boundaries in the chromosome's position
// map, then slicing the chromosome's token list.
//
// For a half-open window [start, end):
//   first token = map[start]
//   last token  = map[end - 1]
//   result      = tokens[first ..= last]
//
// Windows that are empty or run past the end of the chromosome
// are rejected with InvalidCoordinate.

use crate::data::position_map::PositionMap;
use crate::domain::error::{PipelineError, PipelineResult};
use crate::domain::motif::GenomicRegion;

/// One chromosome's tokens plus the map built from them
pub struct ChromosomeIndex {
    tokens: Vec<String>,
    map:    PositionMap,
}

impl ChromosomeIndex {
    pub fn new(label: impl Into<String>, tokens: Vec<String>) -> Self {
        let map = PositionMap::build(label, &tokens);
        Self { tokens, map }
    }

    pub fn nucleotide_count(&self) -> usize {
        self.map.len()
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Tokens covering every nucleotide of `region`
    pub fn slice(&self, region: &GenomicRegion) -> PipelineResult<&[String]> {
        let limit = self.map.len() as u64;
        if region.start >= region.end || region.end > limit {
            return Err(PipelineError::InvalidCoordinate {
                chrom: region.chrom.name(),
                start: region.start,
                end:   region.end,
                limit,
            });
        }

        let first = self.map.token_index(region.start)?;
        let last  = self.map.token_index(region.end - 1)?;
        Ok(&self.tokens[first..=last])
    }
}
