// ============================================================
// Layer 6 - Model Directory / Checkpoint Manager
// ============================================================
// Reads a pretrained model directory and writes the fine-tuned
// one. Both use the same layout, so a fine-tuned directory can
// be passed back in as --pretrained:
//
//   <dir>/
//     config.json        ← encoder hyper-parameters (HF field names)
//     tokenizer.json     ← vocabulary (see tokenizer_store.rs)
//     model.mpk          ← weights, Burn CompactRecorder format
//     train_config.json  ← fine-tuning run settings (output only)
//     test_report.json   ← held-out test metrics (output only)
//
// Weights are written only when validation loss improves, so
// model.mpk always holds the best epoch seen so far.

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::application::train_use_case::{TestReport, TrainConfig};
use crate::domain::error::PipelineError;
use crate::ml::model::{EncoderClassifier, EncoderClassifierConfig};

pub const CONFIG_FILE:       &str = "config.json";
pub const WEIGHTS_STEM:      &str = "model";
pub const TRAIN_CONFIG_FILE: &str = "train_config.json";
pub const TEST_REPORT_FILE:  &str = "test_report.json";

/// `config.json` of a BERT-style checkpoint. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PretrainedConfig {
    pub vocab_size:              usize,
    pub hidden_size:             usize,
    pub num_hidden_layers:       usize,
    pub num_attention_heads:     usize,
    pub intermediate_size:       usize,
    pub max_position_embeddings: usize,
    #[serde(default = "default_dropout")]
    pub hidden_dropout_prob:     f64,
    #[serde(default = "default_layer_norm_eps")]
    pub layer_norm_eps:          f64,
    #[serde(default = "default_num_labels")]
    pub num_labels:              usize,
}

fn default_dropout() -> f64 { 0.1 }
fn default_layer_norm_eps() -> f64 { 1e-12 }
fn default_num_labels() -> usize { 2 }

impl PretrainedConfig {
    pub fn to_model_config(&self) -> EncoderClassifierConfig {
        EncoderClassifierConfig::new(
            self.vocab_size,
            self.max_position_embeddings,
            self.hidden_size,
            self.num_attention_heads,
            self.num_hidden_layers,
            self.intermediate_size,
            self.hidden_dropout_prob,
        )
        .with_num_labels(self.num_labels)
        .with_layer_norm_eps(self.layer_norm_eps)
    }

    pub fn from_model_config(cfg: &EncoderClassifierConfig) -> Self {
        Self {
            vocab_size:              cfg.vocab_size,
            hidden_size:             cfg.hidden_size,
            num_hidden_layers:       cfg.num_layers,
            num_attention_heads:     cfg.num_heads,
            intermediate_size:       cfg.intermediate_size,
            max_position_embeddings: cfg.max_position_embeddings,
            hidden_dropout_prob:     cfg.dropout,
            layer_norm_eps:          cfg.layer_norm_eps,
            num_labels:              cfg.num_labels,
        }
    }
}

/// Handle on one model directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Open an existing directory for reading.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(PipelineError::MissingFile(dir).into());
        }
        Ok(Self { dir })
    }

    /// Create (or reuse) a directory for writing.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create model directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn weights_path(&self) -> PathBuf {
        self.dir.join(WEIGHTS_STEM)
    }

    /// CompactRecorder appends the `.mpk` extension itself.
    pub fn has_weights(&self) -> bool {
        self.weights_path().with_extension("mpk").exists()
    }

    pub fn load_model_config(&self) -> Result<EncoderClassifierConfig> {
        let pretrained: PretrainedConfig = self.read_json(CONFIG_FILE)?;
        Ok(pretrained.to_model_config())
    }

    pub fn save_model_config(&self, cfg: &EncoderClassifierConfig) -> Result<()> {
        self.write_json(CONFIG_FILE, &PretrainedConfig::from_model_config(cfg))
    }

    pub fn save_model<B: Backend>(&self, model: &EncoderClassifier<B>) -> Result<()> {
        let path = self.weights_path();
        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save weights to '{}'", path.display()))?;
        tracing::debug!("Saved weights to '{}'", path.display());
        Ok(())
    }

    pub fn load_model<B: Backend>(
        &self,
        model:  EncoderClassifier<B>,
        device: &B::Device,
    ) -> Result<EncoderClassifier<B>> {
        let path = self.weights_path();
        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| format!("Cannot load weights from '{}'", path.display()))?;
        Ok(model.load_record(record))
    }

    /// Build the encoder from config.json and load model.mpk if present.
    /// A directory without weights yields a freshly initialised encoder.
    pub fn init_model<B: Backend>(
        &self,
        device: &B::Device,
    ) -> Result<(EncoderClassifier<B>, EncoderClassifierConfig)> {
        let cfg   = self.load_model_config()?;
        let model = cfg.init::<B>(device);
        let model = if self.has_weights() {
            tracing::info!("Loading weights from '{}'", self.dir.display());
            self.load_model(model, device)?
        } else {
            tracing::warn!(
                "No weights in '{}', encoder starts from random initialisation",
                self.dir.display()
            );
            model
        };
        Ok((model, cfg))
    }

    pub fn save_train_config(&self, cfg: &TrainConfig) -> Result<()> {
        self.write_json(TRAIN_CONFIG_FILE, cfg)
    }

    pub fn load_train_config(&self) -> Result<TrainConfig> {
        self.read_json(TRAIN_CONFIG_FILE)
    }

    /// Settings of the run that produced this directory, if it was fine-tuned here
    pub fn find_train_config(&self) -> Result<Option<TrainConfig>> {
        if self.dir.join(TRAIN_CONFIG_FILE).is_file() {
            self.load_train_config().map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn save_test_report(&self, report: &TestReport) -> Result<()> {
        self.write_json(TEST_REPORT_FILE, report)
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        tracing::debug!("Wrote '{}'", path.display());
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.dir.join(name);
        if !path.exists() {
            return Err(PipelineError::MissingFile(path).into());
        }
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Invalid JSON in '{}'", path.display()))
    }
}
