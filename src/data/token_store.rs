// ============================================================
// Layer 4 - Chromosome Token Store
// ============================================================
// Loads the precomputed whole-chromosome tokenization: one file
// per chromosome, named from a template where `{}` is replaced by
// the chromosome index (1-22, X=23, Y=24).
//
// Supported file formats (chosen by extension):
//   .pkl / .pickle  Python pickle of a list of token strings
//   .txt            one token per line

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde_pickle::DeOptions;

use crate::domain::chromosome::Chromosome;
use crate::domain::error::PipelineError;
use crate::domain::traits::TokenSource;

pub const DEFAULT_FILE_TEMPLATE: &str = "chr{}.pkl";

pub struct ChromosomeTokenStore {
    dir:      PathBuf,
    template: String,
}

impl ChromosomeTokenStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir:      dir.into(),
            template: DEFAULT_FILE_TEMPLATE.to_string(),
        }
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    /// Path of the token file for `chrom`
    pub fn path_for(&self, chrom: Chromosome) -> PathBuf {
        self.dir
            .join(self.template.replace("{}", &chrom.index().to_string()))
    }
}

impl TokenSource for ChromosomeTokenStore {
    fn load_chromosome(&self, chrom: Chromosome) -> Result<Vec<String>> {
        let path = self.path_for(chrom);
        if !path.is_file() {
            return Err(PipelineError::MissingFile(path).into());
        }

        tracing::debug!("Loading tokens for {} from '{}'", chrom, path.display());

        let tokens = read_token_file(&path)
            .with_context(|| format!("Cannot read tokens for {} from '{}'", chrom, path.display()))?;

        tracing::info!("{}: {} tokens", chrom, tokens.len());
        Ok(tokens)
    }
}

fn read_token_file(path: &Path) -> Result<Vec<String>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase());

    match ext.as_deref() {
        Some("pkl") | Some("pickle") => {
            let reader = BufReader::new(File::open(path)?);
            let tokens: Vec<String> = serde_pickle::from_reader(reader, DeOptions::new())
                .context("Invalid pickle: expected a list of strings")?;
            Ok(tokens)
        }
        Some("txt") => {
            let reader = BufReader::new(File::open(path)?);
            let mut tokens = Vec::new();
            for line in reader.lines() {
                let line = line?;
                let token = line.trim();
                if !token.is_empty() {
                    tokens.push(token.to_string());
                }
            }
            Ok(tokens)
        }
        other => bail!("Unsupported token file extension: {:?}", other),
    }
}
