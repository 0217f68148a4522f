// ============================================================
// Layer 5 - Training Loop
// ============================================================
// Fine-tunes the encoder classifier with Burn's DataLoader and
// Adam, validating after every epoch.
//
//   - Training runs on the autodiff backend B
//   - model.valid() strips autodiff and disables dropout; the
//     validation and test loaders use B::InnerBackend
//   - Learning rate follows LinearSchedule (warmup, then decay)
//   - Gradients are clipped by global norm before each step
//   - Weights are written only when validation loss drops

use anyhow::Result;
use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    grad_clipping::GradientClippingConfig,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};

use crate::data::{
    batcher::{ClassificationBatch, ClassificationBatcher},
    dataset::MotifDataset,
};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::{
    evaluation::ClassificationReport,
    model::{bound_probabilities, EncoderClassifier},
    schedule::LinearSchedule,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingOptions {
    pub epochs:        usize,
    pub batch_size:    usize,
    pub learning_rate: f64,
    pub warmup_steps:  usize,
    pub max_grad_norm: f32,
    pub log_every:     usize,
    pub num_workers:   usize,
    pub seed:          u64,
    pub threshold:     f32,
}

/// Loss and metrics of one pass over a held-out loader
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationOutcome {
    pub loss:    f64,
    pub samples: usize,
    pub report:  ClassificationReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub epochs:        usize,
    pub steps:         usize,
    pub best_epoch:    Option<usize>,
    pub best_val_loss: f64,
}

pub fn run_training<B: AutodiffBackend>(
    mut model:     EncoderClassifier<B>,
    train_dataset: MotifDataset,
    val_dataset:   MotifDataset,
    opts:          &TrainingOptions,
    ckpt_manager:  &CheckpointManager,
    metrics:       &MetricsLogger,
    device:        &B::Device,
) -> Result<TrainingSummary> {
    let steps_per_epoch = train_dataset.sample_count().div_ceil(opts.batch_size.max(1));
    let schedule = LinearSchedule::new(
        opts.learning_rate,
        opts.warmup_steps,
        steps_per_epoch * opts.epochs,
    );

    // Adam with global-norm gradient clipping
    let mut optim = AdamConfig::new()
        .with_epsilon(1e-8)
        .with_grad_clipping(Some(GradientClippingConfig::Norm(opts.max_grad_norm)))
        .init::<B, EncoderClassifier<B>>();

    // ── Training data loader (AutodiffBackend) ────────────────────────────────
    let train_loader = DataLoaderBuilder::new(ClassificationBatcher::<B>::new(device.clone()))
        .batch_size(opts.batch_size)
        .shuffle(opts.seed)
        .num_workers(opts.num_workers)
        .build(train_dataset);

    // ── Validation data loader (InnerBackend, no autodiff overhead) ───────────
    let val_loader = DataLoaderBuilder::new(ClassificationBatcher::<B::InnerBackend>::new(device.clone()))
        .batch_size(opts.batch_size)
        .num_workers(opts.num_workers)
        .build(val_dataset);

    tracing::info!(
        "Training for {} epochs, {} steps per epoch",
        opts.epochs, steps_per_epoch,
    );

    let mut step          = 0usize;
    let mut best_val_loss = f64::INFINITY;
    let mut best_epoch    = None;

    for epoch in 1..=opts.epochs {
        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;

        for batch in train_loader.iter() {
            let output = model.forward_classification(
                batch.input_ids,
                batch.attention_mask,
                batch.targets,
            );

            let loss_val: f64 = output.loss.clone().into_scalar().elem::<f64>();
            train_loss_sum += loss_val;
            train_batches  += 1;

            let lr    = schedule.lr_at(step);
            let grads = output.loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(lr, model, grads);
            step += 1;

            if opts.log_every > 0 && step % opts.log_every == 0 {
                tracing::info!(
                    "epoch {} step {}/{} | loss={:.4} | lr={:.2e}",
                    epoch, step, steps_per_epoch * opts.epochs, loss_val, lr,
                );
            }
        }

        let avg_train_loss = if train_batches > 0 {
            train_loss_sum / train_batches as f64
        } else { f64::NAN };

        let model_valid = model.valid();
        let outcome = evaluate(&model_valid, val_loader.as_ref(), opts.threshold)?;

        let epoch_metrics = EpochMetrics::new(epoch, avg_train_loss, outcome.loss, &outcome.report);
        metrics.log(&epoch_metrics)?;

        tracing::info!(
            "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | precision={:.3} | recall={:.3} | f1={:.3} | accuracy={:.3}",
            epoch, opts.epochs, avg_train_loss, outcome.loss,
            outcome.report.precision, outcome.report.recall,
            outcome.report.f1, outcome.report.accuracy,
        );

        // An empty validation split cannot rank epochs; keep the latest.
        if outcome.samples == 0 || epoch_metrics.is_improvement(best_val_loss) {
            if outcome.samples > 0 {
                best_val_loss = outcome.loss;
            }
            best_epoch = Some(epoch);
            ckpt_manager.save_model(&model_valid)?;
            tracing::info!("Validation loss improved, checkpoint saved (epoch {})", epoch);
        }
    }

    tracing::info!("Training complete");
    Ok(TrainingSummary { epochs: opts.epochs, steps: step, best_epoch, best_val_loss })
}

/// Validation / test pass. Loss is weighted by batch size.
pub fn evaluate<B: Backend>(
    model:     &EncoderClassifier<B>,
    loader:    &dyn DataLoader<ClassificationBatch<B>>,
    threshold: f32,
) -> Result<EvaluationOutcome> {
    let mut loss_sum      = 0.0f64;
    let mut probabilities = Vec::new();
    let mut labels        = Vec::new();

    for batch in loader.iter() {
        let [batch_size, _] = batch.input_ids.dims();
        let output = model.forward_classification(
            batch.input_ids,
            batch.attention_mask,
            batch.targets,
        );
        loss_sum += output.loss.into_scalar().elem::<f64>() * batch_size as f64;

        let probs = bound_probabilities(output.logits)
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| anyhow::anyhow!("Cannot read probabilities: {e:?}"))?;
        let batch_labels = batch.labels
            .into_data()
            .convert::<i64>()
            .to_vec::<i64>()
            .map_err(|e| anyhow::anyhow!("Cannot read labels: {e:?}"))?;

        probabilities.extend(probs);
        labels.extend(batch_labels.into_iter().map(|l| l as u8));
    }

    let samples = labels.len();
    let loss = if samples > 0 { loss_sum / samples as f64 } else { f64::NAN };
    let report = ClassificationReport::from_predictions(&probabilities, &labels, threshold);
    Ok(EvaluationOutcome { loss, samples, report })
}

/// Evaluate a whole dataset with a fresh (unshuffled) loader.
pub fn evaluate_dataset<B: Backend>(
    model:      &EncoderClassifier<B>,
    dataset:    MotifDataset,
    batch_size: usize,
    threshold:  f32,
    device:     &B::Device,
) -> Result<EvaluationOutcome> {
    let loader = DataLoaderBuilder::new(ClassificationBatcher::<B>::new(device.clone()))
        .batch_size(batch_size)
        .build(dataset);
    evaluate(model, loader.as_ref(), threshold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use crate::data::dataset::MotifSample;
    use crate::domain::chromosome::Chromosome;
    use crate::domain::motif::{BindingLabel, GenomicRegion};
    use crate::ml::model::tests::tiny_config;

    type TestBackend     = NdArray<f32>;
    type TestAutodiff    = Autodiff<TestBackend>;

    fn sample(i: u64, label: BindingLabel) -> MotifSample {
        let (ids, mask) = if label.is_bound() {
            (vec![2, 9, 10, 11, 3, 0], vec![1, 1, 1, 1, 1, 0])
        } else {
            (vec![2, 12, 13, 3, 0, 0], vec![1, 1, 1, 1, 0, 0])
        };
        MotifSample {
            motif: GenomicRegion::new(Chromosome::parse("chr2").unwrap(), 1000 + i * 50, 1010 + i * 50),
            input_ids: ids,
            attention_mask: mask,
            label,
        }
    }

    fn dataset(n: u64) -> MotifDataset {
        MotifDataset::new(
            (0..n)
                .map(|i| sample(i, if i % 2 == 0 { BindingLabel::Bound } else { BindingLabel::Unbound }))
                .collect(),
        )
    }

    fn options(epochs: usize) -> TrainingOptions {
        TrainingOptions {
            epochs,
            batch_size:    2,
            learning_rate: 1e-3,
            warmup_steps:  0,
            max_grad_norm: 1.0,
            log_every:     1,
            num_workers:   1,
            seed:          42,
            threshold:     0.5,
        }
    }

    #[test]
    fn test_training_saves_checkpoint_and_metrics() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::create(dir.path()).unwrap();
        let metrics = MetricsLogger::new(dir.path()).unwrap();
        let device = Default::default();
        let model = tiny_config().init::<TestAutodiff>(&device);

        let summary = run_training(
            model, dataset(6), dataset(2), &options(2), &ckpt, &metrics, &device,
        ).unwrap();

        assert_eq!(summary.epochs, 2);
        assert_eq!(summary.steps, 6);
        assert!(summary.best_epoch.is_some());
        assert!(summary.best_val_loss.is_finite());
        assert!(ckpt.has_weights());

        let csv = std::fs::read_to_string(metrics.csv_path()).unwrap();
        assert_eq!(csv.lines().count(), 3);
    }

    #[test]
    fn test_empty_validation_keeps_latest_epoch() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::create(dir.path()).unwrap();
        let metrics = MetricsLogger::new(dir.path()).unwrap();
        let device = Default::default();
        let model = tiny_config().init::<TestAutodiff>(&device);

        let summary = run_training(
            model, dataset(4), dataset(0), &options(2), &ckpt, &metrics, &device,
        ).unwrap();

        assert_eq!(summary.best_epoch, Some(2));
        assert!(ckpt.has_weights());
    }

    #[test]
    fn test_evaluate_counts_every_sample() {
        let device = Default::default();
        let model = tiny_config().init::<TestBackend>(&device);

        let outcome = evaluate_dataset(&model, dataset(5), 2, 0.5, &device).unwrap();
        assert_eq!(outcome.samples, 5);
        assert_eq!(outcome.report.total(), 5);
        assert!(outcome.loss > 0.0);
    }
}
