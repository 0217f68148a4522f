use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::data::encoder::{EncodedSequence, SequenceEncoder};
use crate::domain::motif::{BindingLabel, GenomicRegion, LabeledSequence};

/// One encoded, padded and labeled motif window.
/// Sequence format: [CLS] tokens... [SEP] [PAD]...
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotifSample {
    pub motif:          GenomicRegion,
    pub input_ids:      Vec<u32>,
    pub attention_mask: Vec<u32>,
    pub label:          BindingLabel,
}

impl MotifSample {
    pub fn new(motif: GenomicRegion, encoded: EncodedSequence, label: BindingLabel) -> Self {
        Self {
            motif,
            input_ids: encoded.input_ids,
            attention_mask: encoded.attention_mask,
            label,
        }
    }

    pub fn from_sequence(sequence: &LabeledSequence, encoder: &SequenceEncoder) -> Self {
        Self::new(sequence.motif, encoder.encode(&sequence.tokens), sequence.label)
    }

    /// One-hot target: [unbound, bound]
    pub fn target(&self) -> [u8; 2] {
        self.label.one_hot()
    }
}

pub struct MotifDataset {
    samples: Vec<MotifSample>,
}

impl MotifDataset {
    pub fn new(samples: Vec<MotifSample>) -> Self { Self { samples } }

    pub fn sample_count(&self) -> usize { self.samples.len() }

    pub fn bound_count(&self) -> usize {
        self.samples.iter().filter(|s| s.label.is_bound()).count()
    }

    pub fn samples(&self) -> &[MotifSample] { &self.samples }
}

impl Dataset<MotifSample> for MotifDataset {
    fn get(&self, index: usize) -> Option<MotifSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::encoder::tests::test_tokenizer;
    use crate::domain::chromosome::Chromosome;

    fn sequence(label: BindingLabel) -> LabeledSequence {
        let chrom = Chromosome::parse("chr4").unwrap();
        LabeledSequence {
            motif:  GenomicRegion::new(chrom, 1500, 1510),
            window: GenomicRegion::new(chrom, 1005, 2005),
            label,
            tokens: vec!["AAT".into(), "GCC".into()],
        }
    }

    #[test]
    fn test_sample_from_sequence() {
        let encoder = SequenceEncoder::new(test_tokenizer(), 6).unwrap();
        let sample = MotifSample::from_sequence(&sequence(BindingLabel::Bound), &encoder);
        assert_eq!(sample.input_ids, vec![2, 9, 10, 3, 0, 0]);
        assert_eq!(sample.attention_mask, vec![1, 1, 1, 1, 0, 0]);
        assert_eq!(sample.target(), [0, 1]);
        assert_eq!(sample.motif.start, 1500);
    }

    #[test]
    fn test_dataset_access() {
        let encoder = SequenceEncoder::new(test_tokenizer(), 6).unwrap();
        let samples = vec![
            MotifSample::from_sequence(&sequence(BindingLabel::Bound), &encoder),
            MotifSample::from_sequence(&sequence(BindingLabel::Unbound), &encoder),
        ];
        let dataset = MotifDataset::new(samples);
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.bound_count(), 1);
        assert_eq!(dataset.get(1).unwrap().label, BindingLabel::Unbound);
        assert!(dataset.get(2).is_none());
    }
}
