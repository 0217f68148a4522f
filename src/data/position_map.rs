// ============================================================
// Layer 4 - Position Map
// ============================================================
// Maps every nucleotide offset of a chromosome to the index of
// the token that covers it. Built by a single forward pass that
// repeats token index i once per nucleotide of token i.
//
// Example, token lengths [3, 5, 2]:
//   map = [0, 0, 0, 1, 1, 1, 1, 1, 2, 2]
//   nucleotide 4 → token 1
//
// Invariants:
//   - map.len() == total nucleotides covered by the tokens
//   - values are non-decreasing

use crate::domain::error::{PipelineError, PipelineResult};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionMap {
    /// Name used in error messages
    label: String,
    map:   Vec<u32>,
}

impl PositionMap {
    /// Expand `tokens` into a per-nucleotide token index.
    /// Empty input yields an empty map.
    pub fn build<S: AsRef<str>>(label: impl Into<String>, tokens: &[S]) -> Self {
        let total: usize = tokens.iter().map(|t| t.as_ref().len()).sum();
        let mut map = Vec::with_capacity(total);

        for (idx, token) in tokens.iter().enumerate() {
            let len = token.as_ref().len();
            map.extend(std::iter::repeat(idx as u32).take(len));
        }

        Self { label: label.into(), map }
    }

    /// Number of nucleotides covered
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.map
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Index of the token covering nucleotide `pos`
    pub fn token_index(&self, pos: u64) -> PipelineResult<usize> {
        usize::try_from(pos)
            .ok()
            .and_then(|p| self.map.get(p))
            .map(|&idx| idx as usize)
            .ok_or_else(|| PipelineError::InvalidCoordinate {
                chrom: self.label.clone(),
                start: pos,
                end:   pos + 1,
                limit: self.map.len() as u64,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_from_token_lengths() {
        let tokens = ["AAA", "CCCCC", "GG"];
        let map = PositionMap::build("chr1", &tokens);
        assert_eq!(map.as_slice(), &[0, 0, 0, 1, 1, 1, 1, 1, 2, 2]);
        assert_eq!(map.len(), 10);
        assert_eq!(map.token_index(4).unwrap(), 1);
        assert_eq!(map.token_index(9).unwrap(), 2);
    }

    #[test]
    fn test_empty_tokens_give_empty_map() {
        let tokens: Vec<String> = Vec::new();
        let map = PositionMap::build("chr1", &tokens);
        assert!(map.is_empty());
        assert!(map.token_index(0).is_err());
    }

    #[test]
    fn test_length_matches_nucleotides_and_is_monotonic() {
        let tokens: Vec<String> = (1..50)
            .map(|i| "ACGTACGT"[..(i % 6 + 1)].to_string())
            .collect();
        let map = PositionMap::build("chr2", &tokens);

        let nucleotides: usize = tokens.iter().map(|t| t.len()).sum();
        assert_eq!(map.len(), nucleotides);
        assert!(map.as_slice().windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*map.as_slice().last().unwrap() as usize, tokens.len() - 1);
    }

    #[test]
    fn test_out_of_range_lookup() {
        let map = PositionMap::build("chr3", &["ACG"]);
        match map.token_index(3) {
            Err(PipelineError::InvalidCoordinate { chrom, limit, .. }) => {
                assert_eq!(chrom, "chr3");
                assert_eq!(limit, 3);
            }
            other => panic!("Expected InvalidCoordinate, got {:?}", other),
        }
    }
}
