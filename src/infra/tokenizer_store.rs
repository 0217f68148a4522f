// ============================================================
// Layer 6 - Tokenizer Store
// ============================================================
// Loads the pretrained model's tokenizer.json and copies it into
// the fine-tuned output directory so that directory is
// self-contained.
//
// The vocabulary is never rebuilt here: the chromosome token
// files were produced with the same vocabulary as the pretrained
// encoder, and ids must line up with its embedding table.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokenizers::Tokenizer;

use crate::domain::error::PipelineError;

pub const TOKENIZER_FILE: &str = "tokenizer.json";

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(TOKENIZER_FILE)
    }

    pub fn load(&self) -> Result<Tokenizer> {
        let path = self.path();
        if !path.exists() {
            return Err(PipelineError::MissingFile(path).into());
        }
        let tokenizer = Tokenizer::from_file(&path)
            .map_err(|e| anyhow::anyhow!(
                "Cannot load tokenizer from '{}': {}", path.display(), e
            ))?;
        tracing::info!(
            "Loaded tokenizer from '{}' ({} entries)",
            path.display(),
            tokenizer.get_vocab(true).len(),
        );
        Ok(tokenizer)
    }

    /// Write `tokenizer` into `dir/tokenizer.json`.
    pub fn save_to(tokenizer: &Tokenizer, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;
        let path = dir.join(TOKENIZER_FILE);
        tokenizer
            .save(&path, true)
            .map_err(|e| anyhow::anyhow!("Cannot write tokenizer to '{}': {}", path.display(), e))?;
        tracing::debug!("Tokenizer saved to '{}'", path.display());
        Ok(())
    }
}
