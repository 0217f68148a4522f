// ============================================================
// Layer 1 - CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and routes each subcommand to its
// Layer 2 use case:
//
//   1. `prepare` - build the labeled sequence cache
//   2. `train`   - fine-tune and test
//   3. `predict` - score motifs with a fine-tuned model

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, PredictArgs, PrepareArgs, TrainArgs};

use crate::application::{
    predict_use_case::PredictUseCase,
    prepare_use_case::{write_cache, PrepareConfig, PrepareUseCase},
    train_use_case::TrainUseCase,
};

#[derive(Parser, Debug)]
#[command(
    name = "motif-finetune",
    version,
    about = "Fine-tune a pretrained DNA language model to classify TF-bound motifs."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Prepare(args) => run_prepare(args),
            Commands::Train(args)   => run_train(args),
            Commands::Predict(args) => run_predict(args),
        }
    }
}

fn run_prepare(args: PrepareArgs) -> Result<()> {
    let cfg: PrepareConfig = args.into();
    let prepared = PrepareUseCase::from_config(&cfg).execute()?;
    if let Some(path) = &cfg.cache {
        write_cache(path, &prepared.sequences)?;
    }
    println!(
        "Prepared {} sequences ({} bound), skipped {}.",
        prepared.sequences.len(),
        prepared.bound_count(),
        prepared.skipped,
    );
    Ok(())
}

fn run_train(args: TrainArgs) -> Result<()> {
    tracing::info!("Fine-tuning from '{}'", args.pretrained.display());
    let report = TrainUseCase::new(args.into()).execute()?;
    println!(
        "Training complete. Test: precision={:.3} recall={:.3} f1={:.3} accuracy={:.3}",
        report.test.report.precision,
        report.test.report.recall,
        report.test.report.f1,
        report.test.report.accuracy,
    );
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    let output  = args.output.clone();
    let summary = PredictUseCase::new(args.into()).execute()?;
    println!("Wrote {} predictions to '{}'.", summary.scored, output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_train_args_convert_to_config() {
        let cli = Cli::try_parse_from([
            "motif-finetune", "train",
            "--annotations", "a.tsv", "--pretrained", "pre", "--epochs", "5", "--lr", "1e-4",
        ]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: crate::application::train_use_case::TrainConfig = args.into();
        assert_eq!(cfg.epochs, 5);
        assert_eq!(cfg.flank, 500);
        assert_eq!(cfg.token_template, "chr{}.pkl");
        assert_eq!(cfg.pretrained_dir.to_str(), Some("pre"));
        assert!((cfg.learning_rate - 1e-4).abs() < 1e-12);
    }

    #[test]
    fn test_prepare_always_writes_cache() {
        let cli = Cli::try_parse_from(["motif-finetune", "prepare", "--output", "out.json"]).unwrap();
        let Commands::Prepare(args) = cli.command else { panic!("expected prepare") };
        let cfg: PrepareConfig = args.into();
        assert_eq!(cfg.cache.as_deref().and_then(|p| p.to_str()), Some("out.json"));
    }

    #[test]
    fn test_predict_window_settings_default_to_the_model() {
        let cli = Cli::try_parse_from(["motif-finetune", "predict", "--model-dir", "m"]).unwrap();
        let Commands::Predict(args) = cli.command else { panic!("expected predict") };
        let cfg: crate::application::predict_use_case::PredictConfig = args.into();
        assert_eq!(cfg.flank, None);
        assert_eq!(cfg.max_len, None);

        let cli = Cli::try_parse_from(["motif-finetune", "predict", "--flank", "200", "--max-len", "64"]).unwrap();
        let Commands::Predict(args) = cli.command else { panic!("expected predict") };
        let cfg: crate::application::predict_use_case::PredictConfig = args.into();
        assert_eq!(cfg.flank, Some(200));
        assert_eq!(cfg.max_len, Some(64));
    }
}
