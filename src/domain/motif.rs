// ============================================================
// Layer 3 - Motif Domain Types
// ============================================================
// A motif is a short genomic interval matching a transcription
// factor binding pattern. Each motif carries a label telling
// whether it overlaps a ChIP-seq peak (bound) or not.
//
// Coordinates are 0-based, half-open: [start, end).

use serde::{Deserialize, Serialize};

use crate::domain::chromosome::Chromosome;
use crate::domain::error::{PipelineError, PipelineResult};

/// Value written in the peak column when a motif has no overlapping peak
pub const PEAK_PLACEHOLDER: &str = ".";

/// Default number of nucleotides added on each side of a motif center
pub const DEFAULT_FLANK: u64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenomicRegion {
    pub chrom: Chromosome,
    pub start: u64,
    pub end:   u64,
}

impl GenomicRegion {
    pub fn new(chrom: Chromosome, start: u64, end: u64) -> Self {
        Self { chrom, start, end }
    }

    pub fn width(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn center(&self) -> u64 {
        self.start + self.width() / 2
    }

    /// Window of `2 * flank` nucleotides centered on this region.
    ///
    /// Fails when the window would start before position 0 or overflow.
    pub fn expand(&self, flank: u64) -> PipelineResult<GenomicRegion> {
        let center = self.center();
        let invalid = || PipelineError::InvalidCoordinate {
            chrom: self.chrom.name(),
            start: self.start,
            end:   self.end,
            limit: flank,
        };
        let start = center.checked_sub(flank).ok_or_else(invalid)?;
        let end   = center.checked_add(flank).ok_or_else(invalid)?;
        Ok(GenomicRegion::new(self.chrom, start, end))
    }
}

/// Whether a motif is bound by the transcription factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BindingLabel {
    Unbound,
    Bound,
}

impl BindingLabel {
    /// Derive the label from the peak column of an intersection table.
    pub fn from_peak_field(field: &str) -> Self {
        if field.trim() == PEAK_PLACEHOLDER {
            BindingLabel::Unbound
        } else {
            BindingLabel::Bound
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(BindingLabel::Unbound),
            1 => Some(BindingLabel::Bound),
            _ => None,
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            BindingLabel::Unbound => 0,
            BindingLabel::Bound   => 1,
        }
    }

    /// Two-class one-hot encoding: [unbound, bound]
    pub fn one_hot(&self) -> [u8; 2] {
        match self {
            BindingLabel::Unbound => [1, 0],
            BindingLabel::Bound   => [0, 1],
        }
    }

    pub fn is_bound(&self) -> bool {
        matches!(self, BindingLabel::Bound)
    }
}

/// A motif occurrence with its binding label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotifRecord {
    pub region: GenomicRegion,
    pub label:  BindingLabel,
}

impl MotifRecord {
    pub fn new(region: GenomicRegion, label: BindingLabel) -> Self {
        Self { region, label }
    }
}

/// Expanded motif window together with the tokens covering it.
/// This is the unit stored in the prepared-dataset cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledSequence {
    /// The motif itself
    pub motif:  GenomicRegion,
    /// The expanded window that was tokenized
    pub window: GenomicRegion,
    pub label:  BindingLabel,
    pub tokens: Vec<String>,
}

impl LabeledSequence {
    /// Total nucleotides spanned by the tokens (may exceed the window
    /// when the boundary tokens overhang it)
    pub fn nucleotide_span(&self) -> usize {
        self.tokens.iter().map(|t| t.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chr1() -> Chromosome {
        Chromosome::parse("chr1").unwrap()
    }

    #[test]
    fn test_expanded_window_is_1000_nt() {
        for (start, end) in [(10_000, 10_012), (5_000, 5_001), (700, 731), (500, 500)] {
            let region = GenomicRegion::new(chr1(), start, end);
            let window = region.expand(DEFAULT_FLANK).unwrap();
            assert_eq!(window.width(), 1000);
            assert_eq!(window.start, region.center() - 500);
        }
    }

    #[test]
    fn test_expand_near_chromosome_start_fails() {
        let region = GenomicRegion::new(chr1(), 100, 120);
        assert!(matches!(
            region.expand(DEFAULT_FLANK),
            Err(PipelineError::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn test_expand_past_u64_max_fails() {
        let region = GenomicRegion::new(chr1(), u64::MAX - 10, u64::MAX);
        assert!(matches!(
            region.expand(DEFAULT_FLANK),
            Err(PipelineError::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn test_center_uses_integer_midpoint() {
        assert_eq!(GenomicRegion::new(chr1(), 10, 21).center(), 15);
        assert_eq!(GenomicRegion::new(chr1(), 10, 20).center(), 15);
    }

    #[test]
    fn test_label_from_peak_field() {
        assert_eq!(BindingLabel::from_peak_field("."), BindingLabel::Unbound);
        assert_eq!(BindingLabel::from_peak_field("peak_1234"), BindingLabel::Bound);
        assert_eq!(BindingLabel::from_peak_field("0"), BindingLabel::Bound);
        assert_eq!(BindingLabel::Unbound.as_u8(), 0);
        assert_eq!(BindingLabel::Bound.as_u8(), 1);
    }

    #[test]
    fn test_one_hot() {
        assert_eq!(BindingLabel::Unbound.one_hot(), [1, 0]);
        assert_eq!(BindingLabel::Bound.one_hot(), [0, 1]);
        assert_eq!(BindingLabel::from_u8(1), Some(BindingLabel::Bound));
        assert_eq!(BindingLabel::from_u8(2), None);
    }
}
