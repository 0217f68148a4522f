// ============================================================
// Layer 1 - CLI Commands and Arguments
// ============================================================
// Three subcommands: `prepare`, `train` and `predict`.
// Each args struct converts into its application-layer config,
// so the application layer never sees clap types.

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::domain::motif::DEFAULT_FLANK;
use crate::application::{
    predict_use_case::PredictConfig,
    prepare_use_case::PrepareConfig,
    train_use_case::TrainConfig,
};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Slice motif windows into token sequences and write a JSON cache
    Prepare(PrepareArgs),

    /// Fine-tune a pretrained encoder on labeled motifs
    Train(TrainArgs),

    /// Score motifs with a fine-tuned model
    Predict(PredictArgs),
}

/// Inputs shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Motif/peak intersection table (.tsv or .tsv.gz, 19 columns)
    #[arg(long, default_value = "data/motifs_peaks.tsv.gz")]
    pub annotations: PathBuf,

    /// Directory with one token file per chromosome
    #[arg(long, default_value = "data/tokens")]
    pub tokens_dir: PathBuf,

    /// Token file name, `{}` is replaced by the chromosome index (X=23, Y=24)
    #[arg(long, default_value = "chr{}.pkl")]
    pub token_template: String,

    /// Nucleotides kept on each side of the motif center [default: 500,
    /// or for `predict` the value the model was fine-tuned with]
    #[arg(long)]
    pub flank: Option<u64>,
}

#[derive(Args, Debug)]
pub struct PrepareArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Where to write the prepared sequences
    #[arg(long, default_value = "data/prepared.json")]
    pub output: PathBuf,
}

impl From<PrepareArgs> for PrepareConfig {
    fn from(a: PrepareArgs) -> Self {
        PrepareConfig {
            annotations:    a.input.annotations,
            tokens_dir:     a.input.tokens_dir,
            token_template: a.input.token_template,
            flank:          a.input.flank.unwrap_or(DEFAULT_FLANK),
            cache:          Some(a.output),
        }
    }
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Prepared-sequence cache, reused when it exists
    #[arg(long)]
    pub cache: Option<PathBuf>,

    /// Pretrained model directory (config.json, tokenizer.json, model.mpk)
    #[arg(long, default_value = "models/grover")]
    pub pretrained: PathBuf,

    /// Output directory for the fine-tuned model
    #[arg(long, default_value = "models/finetuned")]
    pub output_dir: PathBuf,

    /// Maximum tokens per input, including [CLS] and [SEP]
    #[arg(long, default_value_t = 512)]
    pub max_len: usize,

    #[arg(long, default_value_t = 16)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 3)]
    pub epochs: usize,

    /// Peak learning rate
    #[arg(long, default_value_t = 2e-5)]
    pub lr: f64,

    /// Steps of linear warmup before the linear decay
    #[arg(long, default_value_t = 0)]
    pub warmup_steps: usize,

    /// Global gradient norm clip
    #[arg(long, default_value_t = 1.0)]
    pub max_grad_norm: f32,

    /// Log training loss every N optimizer steps
    #[arg(long, default_value_t = 50)]
    pub log_every: usize,

    #[arg(long, default_value_t = 1)]
    pub num_workers: usize,

    /// Seed for the split and the batch shuffle
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Probability at or above which a motif is called bound
    #[arg(long, default_value_t = 0.5)]
    pub threshold: f32,

    #[arg(long, default_value_t = 0.8)]
    pub train_ratio: f64,

    #[arg(long, default_value_t = 0.1)]
    pub val_ratio: f64,
}

impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            annotations:    a.input.annotations,
            tokens_dir:     a.input.tokens_dir,
            token_template: a.input.token_template,
            flank:          a.input.flank.unwrap_or(DEFAULT_FLANK),
            cache:          a.cache,
            pretrained_dir: a.pretrained,
            output_dir:     a.output_dir,
            max_len:        a.max_len,
            batch_size:     a.batch_size,
            epochs:         a.epochs,
            learning_rate:  a.lr,
            warmup_steps:   a.warmup_steps,
            max_grad_norm:  a.max_grad_norm,
            log_every:      a.log_every,
            num_workers:    a.num_workers,
            seed:           a.seed,
            threshold:      a.threshold,
            train_ratio:    a.train_ratio,
            val_ratio:      a.val_ratio,
        }
    }
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Fine-tuned model directory
    #[arg(long, default_value = "models/finetuned")]
    pub model_dir: PathBuf,

    /// Destination TSV
    #[arg(long, default_value = "predictions.tsv")]
    pub output: PathBuf,

    /// Maximum tokens per input [default: the model's training value, else 512]
    #[arg(long)]
    pub max_len: Option<usize>,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 0.5)]
    pub threshold: f32,
}

impl From<PredictArgs> for PredictConfig {
    fn from(a: PredictArgs) -> Self {
        PredictConfig {
            annotations:    a.input.annotations,
            tokens_dir:     a.input.tokens_dir,
            token_template: a.input.token_template,
            flank:          a.input.flank,
            model_dir:      a.model_dir,
            output:         a.output,
            max_len:        a.max_len,
            batch_size:     a.batch_size,
            threshold:      a.threshold,
        }
    }
}
