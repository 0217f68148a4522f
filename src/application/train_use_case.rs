// ============================================================
// Layer 2 - TrainUseCase
// ============================================================
// Orchestrates the full fine-tuning pipeline in order:
//
//   Step 1: Load or build prepared sequences  (Layer 2 - prepare)
//   Step 2: Load tokenizer, copy to output     (Layer 6 - infra)
//   Step 3: Build encoder from pretrained dir  (Layer 6 - infra)
//   Step 4: Encode sequences                   (Layer 4 - data)
//   Step 5: Split train/validation/test        (Layer 4 - data)
//   Step 6: Run training loop                  (Layer 5 - ml)
//   Step 7: Reload best weights, run test      (Layer 5 - ml)
//   Step 8: Write test_report.json             (Layer 6 - infra)

use anyhow::Result;
use burn::tensor::backend::AutodiffBackend;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::application::prepare_use_case::{
    read_cache, write_cache, PrepareConfig, PrepareUseCase,
};
use crate::data::{
    dataset::{MotifDataset, MotifSample},
    encoder::SequenceEncoder,
    splitter::{split_train_val_test, SplitRatios},
    token_store::DEFAULT_FILE_TEMPLATE,
};
use crate::domain::motif::{LabeledSequence, DEFAULT_FLANK};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::MetricsLogger,
    tokenizer_store::TokenizerStore,
};
use crate::ml::{
    evaluation::DEFAULT_THRESHOLD,
    trainer::{evaluate_dataset, run_training, EvaluationOutcome, TrainingOptions, TrainingSummary},
};

type MyBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

// ─── Training Configuration ──────────────────────────────────────────────────
// Everything needed to reproduce a run. Written to the output
// directory as train_config.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub annotations:    PathBuf,
    pub tokens_dir:     PathBuf,
    pub token_template: String,
    pub flank:          u64,
    /// Prepared-sequence cache; read if present, written otherwise
    pub cache:          Option<PathBuf>,
    pub pretrained_dir: PathBuf,
    pub output_dir:     PathBuf,
    pub max_len:        usize,
    pub batch_size:     usize,
    pub epochs:         usize,
    pub learning_rate:  f64,
    pub warmup_steps:   usize,
    pub max_grad_norm:  f32,
    pub log_every:      usize,
    pub num_workers:    usize,
    pub seed:           u64,
    pub threshold:      f32,
    pub train_ratio:    f64,
    pub val_ratio:      f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        let split = SplitRatios::default();
        Self {
            annotations:    PathBuf::from("data/motifs_peaks.tsv.gz"),
            tokens_dir:     PathBuf::from("data/tokens"),
            token_template: DEFAULT_FILE_TEMPLATE.to_string(),
            flank:          DEFAULT_FLANK,
            cache:          None,
            pretrained_dir: PathBuf::from("models/grover"),
            output_dir:     PathBuf::from("models/finetuned"),
            max_len:        512,
            batch_size:     16,
            epochs:         3,
            learning_rate:  2e-5,
            warmup_steps:   0,
            max_grad_norm:  1.0,
            log_every:      50,
            num_workers:    1,
            seed:           42,
            threshold:      DEFAULT_THRESHOLD,
            train_ratio:    split.train,
            val_ratio:      split.val,
        }
    }
}

impl TrainConfig {
    pub fn prepare_config(&self) -> PrepareConfig {
        PrepareConfig {
            annotations:    self.annotations.clone(),
            tokens_dir:     self.tokens_dir.clone(),
            token_template: self.token_template.clone(),
            flank:          self.flank,
            cache:          self.cache.clone(),
        }
    }

    pub fn training_options(&self) -> TrainingOptions {
        TrainingOptions {
            epochs:        self.epochs,
            batch_size:    self.batch_size,
            learning_rate: self.learning_rate,
            warmup_steps:  self.warmup_steps,
            max_grad_norm: self.max_grad_norm,
            log_every:     self.log_every,
            num_workers:   self.num_workers,
            seed:          self.seed,
            threshold:     self.threshold,
        }
    }

    pub fn split_ratios(&self) -> SplitRatios {
        SplitRatios { train: self.train_ratio, val: self.val_ratio }
    }
}

/// Final result of a run, written as test_report.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestReport {
    pub train_samples: usize,
    pub val_samples:   usize,
    pub test_samples:  usize,
    pub training:      TrainingSummary,
    pub test:          EvaluationOutcome,
}

pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Run on the default WGPU device
    pub fn execute(&self) -> Result<TestReport> {
        let device = burn::backend::wgpu::WgpuDevice::default();
        tracing::info!("Using WGPU device: {:?}", device);
        self.execute_on::<MyBackend>(device)
    }

    pub fn execute_on<B: AutodiffBackend>(&self, device: B::Device) -> Result<TestReport> {
        let cfg = &self.config;

        // ── Step 1: prepared sequences ───────────────────────────────────────
        let sequences = self.load_sequences()?;
        anyhow::ensure!(!sequences.is_empty(), "No usable motif sequences to train on");

        // ── Step 2: tokenizer ────────────────────────────────────────────────
        let tokenizer = TokenizerStore::new(&cfg.pretrained_dir).load()?;
        TokenizerStore::save_to(&tokenizer, &cfg.output_dir)?;

        // ── Step 3: pretrained encoder ───────────────────────────────────────
        let pretrained = CheckpointManager::open(&cfg.pretrained_dir)?;
        let output     = CheckpointManager::create(&cfg.output_dir)?;
        let (model, model_cfg) = pretrained.init_model::<B>(&device)?;
        output.save_model_config(&model_cfg)?;
        output.save_train_config(cfg)?;

        let max_len = if cfg.max_len > model_cfg.max_position_embeddings {
            tracing::warn!(
                "max_len {} exceeds the encoder's {} positions, using {}",
                cfg.max_len, model_cfg.max_position_embeddings, model_cfg.max_position_embeddings,
            );
            model_cfg.max_position_embeddings
        } else {
            cfg.max_len
        };

        // ── Step 4: encode ───────────────────────────────────────────────────
        let encoder = SequenceEncoder::new(tokenizer, max_len)?;
        encoder.check_vocab_size(model_cfg.vocab_size)?;
        let samples: Vec<MotifSample> = sequences
            .iter()
            .map(|s| MotifSample::from_sequence(s, &encoder))
            .collect();

        // ── Step 5: split ────────────────────────────────────────────────────
        let split = split_train_val_test(samples, cfg.split_ratios(), cfg.seed);
        let (train_samples, val_samples, test_samples) =
            (split.train.len(), split.val.len(), split.test.len());
        tracing::info!(
            "Split: {} train, {} validation, {} test",
            train_samples, val_samples, test_samples,
        );

        // ── Step 6: train ────────────────────────────────────────────────────
        let metrics = MetricsLogger::new(&cfg.output_dir)?;
        let opts    = cfg.training_options();
        let training = run_training::<B>(
            model,
            MotifDataset::new(split.train),
            MotifDataset::new(split.val),
            &opts,
            &output,
            &metrics,
            &device,
        )?;

        // ── Step 7: test with the best checkpoint ────────────────────────────
        let best = output.load_model(model_cfg.init::<B::InnerBackend>(&device), &device)?;
        let test = evaluate_dataset(
            &best,
            MotifDataset::new(split.test),
            cfg.batch_size,
            cfg.threshold,
            &device,
        )?;
        tracing::info!(
            "Test | loss={:.4} | precision={:.3} | recall={:.3} | f1={:.3} | accuracy={:.3}",
            test.loss, test.report.precision, test.report.recall,
            test.report.f1, test.report.accuracy,
        );

        // ── Step 8: report ───────────────────────────────────────────────────
        let report = TestReport { train_samples, val_samples, test_samples, training, test };
        output.save_test_report(&report)?;
        Ok(report)
    }

    fn load_sequences(&self) -> Result<Vec<LabeledSequence>> {
        let prepare_cfg = self.config.prepare_config();
        if let Some(cache) = prepare_cfg.cache.as_deref().filter(|p| p.is_file()) {
            return read_cache(cache);
        }
        let prepared = PrepareUseCase::from_config(&prepare_cfg).execute()?;
        if let Some(cache) = &prepare_cfg.cache {
            write_cache(cache, &prepared.sequences)?;
        }
        Ok(prepared.sequences)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use crate::data::encoder::tests::test_tokenizer;
    use crate::infra::checkpoint::TEST_REPORT_FILE;
    use crate::ml::model::tests::tiny_config;
    use std::{fs, path::Path};

    type TestAutodiff = Autodiff<NdArray<f32>>;

    /// 19-column intersection row; column 9 is the peak field
    pub(crate) fn annotation_row(chrom: &str, start: u64, end: u64, peak: &str) -> String {
        let mut cols = vec!["x".to_string(); 19];
        cols[0] = chrom.to_string();
        cols[3] = start.to_string();
        cols[4] = end.to_string();
        cols[9] = peak.to_string();
        cols.join("\t")
    }

    /// Annotation table, chr1 text tokens and a tiny pretrained directory
    pub(crate) fn write_fixture(root: &Path) {
        let rows: Vec<String> = (0..10u64)
            .map(|i| {
                let peak = if i % 2 == 0 { "peak_1" } else { "." };
                annotation_row("chr1", 20 + i * 10, 24 + i * 10, peak)
            })
            .collect();
        fs::write(root.join("motifs.tsv"), rows.join("\n") + "\n").unwrap();

        let tokens_dir = root.join("tokens");
        fs::create_dir_all(&tokens_dir).unwrap();
        let tokens: Vec<&str> = (0..60).map(|i| ["AAT", "GCC", "TTAG", "CAGT"][i % 4]).collect();
        fs::write(tokens_dir.join("chr1.txt"), tokens.join("\n")).unwrap();

        let pretrained = root.join("pretrained");
        CheckpointManager::create(&pretrained).unwrap().save_model_config(&tiny_config()).unwrap();
        TokenizerStore::save_to(&test_tokenizer(), &pretrained).unwrap();
    }

    pub(crate) fn fixture_config(root: &Path) -> TrainConfig {
        TrainConfig {
            annotations:    root.join("motifs.tsv"),
            tokens_dir:     root.join("tokens"),
            token_template: "chr{}.txt".to_string(),
            flank:          5,
            cache:          Some(root.join("cache").join("prepared.json")),
            pretrained_dir: root.join("pretrained"),
            output_dir:     root.join("finetuned"),
            max_len:        12,
            batch_size:     2,
            epochs:         1,
            learning_rate:  1e-3,
            log_every:      1,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_end_to_end_fine_tuning() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        let cfg = fixture_config(dir.path());

        let report = TrainUseCase::new(cfg.clone())
            .execute_on::<TestAutodiff>(Default::default())
            .unwrap();

        assert_eq!(report.train_samples, 8);
        assert_eq!(report.val_samples, 1);
        assert_eq!(report.test_samples, 1);
        assert_eq!(report.test.samples, 1);
        assert_eq!(report.training.best_epoch, Some(1));

        let out = &cfg.output_dir;
        for file in ["config.json", "tokenizer.json", "model.mpk", "train_config.json", "metrics.csv", TEST_REPORT_FILE] {
            assert!(out.join(file).exists(), "missing {file}");
        }
        assert!(cfg.cache.as_ref().unwrap().exists());

        // the fine-tuned directory is itself a valid pretrained directory
        let reopened = CheckpointManager::open(out).unwrap();
        assert_eq!(reopened.load_train_config().unwrap().epochs, 1);
        assert!(reopened.has_weights());
    }

    #[test]
    fn test_tokenizer_larger_than_embedding_table_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        let mut small = tiny_config();
        small.vocab_size = 8;
        CheckpointManager::create(dir.path().join("pretrained"))
            .unwrap()
            .save_model_config(&small)
            .unwrap();

        let err = TrainUseCase::new(fixture_config(dir.path()))
            .execute_on::<TestAutodiff>(Default::default())
            .unwrap_err();
        assert!(format!("{err:#}").contains("vocab_size is 8"));
    }

    #[test]
    fn test_max_len_is_clipped_to_positions() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        let cfg = TrainConfig { max_len: 4096, ..fixture_config(dir.path()) };
        assert!(TrainUseCase::new(cfg).execute_on::<TestAutodiff>(Default::default()).is_ok());
    }
}
