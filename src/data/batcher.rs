// ============================================================
// Layer 4 - Classification Batcher
// ============================================================
// Implements Burn's Batcher trait: stacks MotifSamples into
// tensors for one forward pass.
//
//   Input:  Vec of N samples, each padded to length S
//   Output: input_ids / attention_mask [N, S],
//           one-hot targets [N, 2], labels [N]
//
// All samples are padded to the same length by the encoder, so
// batching is a flatten + reshape.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::MotifSample;

#[derive(Debug, Clone)]
pub struct ClassificationBatch<B: Backend> {
    /// Token ids, shape [batch_size, seq_len]
    pub input_ids: Tensor<B, 2, Int>,

    /// 1 = real token, 0 = padding, shape [batch_size, seq_len]
    pub attention_mask: Tensor<B, 2, Int>,

    /// One-hot targets [unbound, bound], shape [batch_size, 2]
    pub targets: Tensor<B, 2, Int>,

    /// Class index (1 = bound), shape [batch_size]
    pub labels: Tensor<B, 1, Int>,
}

#[derive(Clone, Debug)]
pub struct ClassificationBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> ClassificationBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<MotifSample, ClassificationBatch<B>> for ClassificationBatcher<B> {
    fn batch(&self, items: Vec<MotifSample>) -> ClassificationBatch<B> {
        let batch_size = items.len();
        let seq_len    = items.first().map(|s| s.input_ids.len()).unwrap_or(0);

        let input_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.input_ids.iter().map(|&x| x as i32))
            .collect();

        let mask_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.attention_mask.iter().map(|&x| x as i32))
            .collect();

        let target_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.target().map(i32::from))
            .collect();

        let labels: Vec<i32> = items
            .iter()
            .map(|s| s.label.as_u8() as i32)
            .collect();

        let input_ids = Tensor::<B, 1, Int>::from_ints(
            input_flat.as_slice(), &self.device
        ).reshape([batch_size, seq_len]);

        let attention_mask = Tensor::<B, 1, Int>::from_ints(
            mask_flat.as_slice(), &self.device
        ).reshape([batch_size, seq_len]);

        let targets = Tensor::<B, 1, Int>::from_ints(
            target_flat.as_slice(), &self.device
        ).reshape([batch_size, 2]);

        let labels = Tensor::<B, 1, Int>::from_ints(
            labels.as_slice(), &self.device
        );

        ClassificationBatch {
            input_ids,
            attention_mask,
            targets,
            labels,
        }
    }
}
