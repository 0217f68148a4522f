// ============================================================
// Layer 2 - PredictUseCase
// ============================================================
// Scores motifs with a fine-tuned model directory:
//
//   Step 0: Resolve flank / max_len           (train_config.json)
//   Step 1: Prepare labeled sequences        (Layer 2 - prepare)
//   Step 2: Load tokenizer + fine-tuned model (Layer 5/6)
//   Step 3: Encode and score                  (Layer 5 - predictor)
//   Step 4: Write predictions as TSV
//
// Output columns: chrom, start, end, label, probability, prediction.
// The input table's labels are also scored against the calls.
//
// Windows must be sliced the way the model saw them in training,
// so flank and max_len come from the model directory's
// train_config.json unless set explicitly.

use anyhow::{Context, Result};
use burn::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::PathBuf;

use crate::application::prepare_use_case::{PrepareConfig, PrepareUseCase};
use crate::data::{
    dataset::MotifSample,
    encoder::SequenceEncoder,
    token_store::DEFAULT_FILE_TEMPLATE,
};
use crate::domain::motif::DEFAULT_FLANK;
use crate::infra::{checkpoint::CheckpointManager, tokenizer_store::TokenizerStore};
use crate::ml::{
    evaluation::{ClassificationReport, DEFAULT_THRESHOLD},
    predictor::{Prediction, Predictor},
};

type InferBackend = burn::backend::Wgpu;

/// Used when the model directory has no train_config.json
pub const DEFAULT_MAX_LEN: usize = 512;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictConfig {
    pub annotations:    PathBuf,
    pub tokens_dir:     PathBuf,
    pub token_template: String,
    /// `None` uses the value the model was fine-tuned with
    pub flank:          Option<u64>,
    /// Fine-tuned model directory
    pub model_dir:      PathBuf,
    /// Destination TSV
    pub output:         PathBuf,
    /// `None` uses the value the model was fine-tuned with
    pub max_len:        Option<usize>,
    pub batch_size:     usize,
    pub threshold:      f32,
}

impl Default for PredictConfig {
    fn default() -> Self {
        Self {
            annotations:    PathBuf::from("data/motifs_peaks.tsv.gz"),
            tokens_dir:     PathBuf::from("data/tokens"),
            token_template: DEFAULT_FILE_TEMPLATE.to_string(),
            flank:          None,
            model_dir:      PathBuf::from("models/finetuned"),
            output:         PathBuf::from("predictions.tsv"),
            max_len:        None,
            batch_size:     32,
            threshold:      DEFAULT_THRESHOLD,
        }
    }
}

/// One row of the output TSV
#[derive(Debug, Serialize)]
struct PredictionRow {
    chrom:       String,
    start:       u64,
    end:         u64,
    label:       u8,
    probability: f32,
    prediction:  u8,
}

impl From<&Prediction> for PredictionRow {
    fn from(p: &Prediction) -> Self {
        Self {
            chrom:       p.motif.chrom.name(),
            start:       p.motif.start,
            end:         p.motif.end,
            label:       p.label.as_u8(),
            probability: p.probability,
            prediction:  p.predicted.as_u8(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionSummary {
    pub scored:  usize,
    pub skipped: usize,
    /// Flank the windows were sliced with
    pub flank:   u64,
    pub max_len: usize,
    /// Calls compared against the input table's labels
    pub report:  ClassificationReport,
}

pub struct PredictUseCase {
    config: PredictConfig,
}

impl PredictUseCase {
    pub fn new(config: PredictConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<PredictionSummary> {
        let device = burn::backend::wgpu::WgpuDevice::default();
        self.execute_on::<InferBackend>(device)
    }

    pub fn execute_on<B: Backend>(&self, device: B::Device) -> Result<PredictionSummary> {
        let cfg = &self.config;

        // ── Step 0: window settings ──────────────────────────────────────────
        let trained = CheckpointManager::open(&cfg.model_dir)?.find_train_config()?;
        if trained.is_none() {
            tracing::warn!(
                "No training settings in '{}', falling back to flank={} max_len={} unless given",
                cfg.model_dir.display(), DEFAULT_FLANK, DEFAULT_MAX_LEN,
            );
        }
        let flank = resolve_setting(
            "flank", cfg.flank, trained.as_ref().map(|t| t.flank), DEFAULT_FLANK,
        );
        let requested_len = resolve_setting(
            "max_len", cfg.max_len, trained.as_ref().map(|t| t.max_len), DEFAULT_MAX_LEN,
        );

        // ── Step 1: sequences ────────────────────────────────────────────────
        let prepared = PrepareUseCase::from_config(&PrepareConfig {
            annotations:    cfg.annotations.clone(),
            tokens_dir:     cfg.tokens_dir.clone(),
            token_template: cfg.token_template.clone(),
            flank,
            cache:          None,
        })
        .execute()?;

        // ── Step 2: model + tokenizer ────────────────────────────────────────
        let predictor = Predictor::<B>::from_directory(&cfg.model_dir, cfg.batch_size, cfg.threshold, device)?;
        let tokenizer = TokenizerStore::new(&cfg.model_dir).load()?;
        let max_len   = requested_len.min(predictor.config().max_position_embeddings);
        let encoder   = SequenceEncoder::new(tokenizer, max_len)?;
        encoder.check_vocab_size(predictor.config().vocab_size)?;

        // ── Step 3: score ────────────────────────────────────────────────────
        let samples: Vec<MotifSample> = prepared
            .sequences
            .iter()
            .map(|s| MotifSample::from_sequence(s, &encoder))
            .collect();
        let predictions = predictor.predict(&samples)?;

        // ── Step 4: write ────────────────────────────────────────────────────
        self.write_predictions(&predictions)?;

        let probabilities: Vec<f32> = predictions.iter().map(|p| p.probability).collect();
        let labels:        Vec<u8>  = predictions.iter().map(|p| p.label.as_u8()).collect();
        let report = ClassificationReport::from_predictions(&probabilities, &labels, cfg.threshold);

        tracing::info!(
            "Scored {} motifs into '{}' | precision={:.3} | recall={:.3} | f1={:.3} | accuracy={:.3}",
            predictions.len(), cfg.output.display(),
            report.precision, report.recall, report.f1, report.accuracy,
        );

        Ok(PredictionSummary {
            scored:  predictions.len(),
            skipped: prepared.skipped,
            flank,
            max_len,
            report,
        })
    }

    fn write_predictions(&self, predictions: &[Prediction]) -> Result<()> {
        let path = &self.config.output;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_path(path)
            .with_context(|| format!("Cannot create '{}'", path.display()))?;
        for p in predictions {
            writer.serialize(PredictionRow::from(p))?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Explicit value first, then the training value, then the default.
fn resolve_setting<T: Copy + PartialEq + Display>(
    name:      &str,
    requested: Option<T>,
    trained:   Option<T>,
    default:   T,
) -> T {
    match (requested, trained) {
        (Some(r), Some(t)) if r != t => {
            tracing::warn!("{name}={r} differs from the {name}={t} the model was fine-tuned with");
            r
        }
        (Some(r), _)    => r,
        (None, Some(t)) => t,
        (None, None)    => default,
    }
}
