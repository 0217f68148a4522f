// ============================================================
// Layer 5 - Predictor
// ============================================================
// Scores encoded motif windows with a fine-tuned classifier.
// Each prediction carries P(bound) and the thresholded call.
use anyhow::{bail, Result};
use burn::{data::dataloader::batcher::Batcher, prelude::*};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::data::{batcher::ClassificationBatcher, dataset::MotifSample};
use crate::domain::motif::{BindingLabel, GenomicRegion};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::{bound_probabilities, EncoderClassifier, EncoderClassifierConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub motif:       GenomicRegion,
    /// Label from the input table
    pub label:       BindingLabel,
    pub probability: f32,
    pub predicted:   BindingLabel,
}

pub struct Predictor<B: Backend> {
    model:      EncoderClassifier<B>,
    config:     EncoderClassifierConfig,
    batch_size: usize,
    threshold:  f32,
    device:     B::Device,
}

impl<B: Backend> Predictor<B> {
    pub fn new(
        model:      EncoderClassifier<B>,
        config:     EncoderClassifierConfig,
        batch_size: usize,
        threshold:  f32,
        device:     B::Device,
    ) -> Self {
        Self { model, config, batch_size: batch_size.max(1), threshold, device }
    }

    /// Load a fine-tuned model directory. Weights are required.
    pub fn from_directory(
        dir:        &Path,
        batch_size: usize,
        threshold:  f32,
        device:     B::Device,
    ) -> Result<Self> {
        let ckpt = CheckpointManager::open(dir)?;
        if !ckpt.has_weights() {
            bail!("'{}' has no fine-tuned weights (model.mpk)", dir.display());
        }
        let (model, config) = ckpt.init_model::<B>(&device)?;
        tracing::info!("Predictor ready ({} layers, hidden={})", config.num_layers, config.hidden_size);
        Ok(Self::new(model, config, batch_size, threshold, device))
    }

    pub fn config(&self) -> &EncoderClassifierConfig {
        &self.config
    }

    pub fn predict(&self, samples: &[MotifSample]) -> Result<Vec<Prediction>> {
        let batcher = ClassificationBatcher::<B>::new(self.device.clone());
        let mut predictions = Vec::with_capacity(samples.len());

        for chunk in samples.chunks(self.batch_size) {
            let batch  = batcher.batch(chunk.to_vec());
            let logits = self.model.forward(batch.input_ids, batch.attention_mask);
            let probs  = bound_probabilities(logits)
                .into_data()
                .convert::<f32>()
                .to_vec::<f32>()
                .map_err(|e| anyhow::anyhow!("Cannot read probabilities: {e:?}"))?;

            predictions.extend(chunk.iter().zip(probs).map(|(sample, probability)| Prediction {
                motif: sample.motif,
                label: sample.label,
                probability,
                predicted: if probability >= self.threshold {
                    BindingLabel::Bound
                } else {
                    BindingLabel::Unbound
                },
            }));
        }

        tracing::debug!("Scored {} motifs", predictions.len());
        Ok(predictions)
    }
}
