// ============================================================
// Layer 2 - PrepareUseCase
// ============================================================
// Turns labeled motif coordinates into labeled token sequences:
//
//   Step 1: Load motif records            (Layer 4 - loader)
//   Step 2: Group motifs by chromosome
//   Step 3: For each chromosome:
//             load its tokens             (Layer 4 - token_store)
//             build the position map      (Layer 4 - slicer)
//             expand each motif ± flank   (Layer 3 - domain)
//             slice the covering tokens   (Layer 4 - slicer)
//   Step 4: Optionally write a JSON cache
//
// Only one chromosome's tokens and map are resident at a time.
// Motifs whose window falls outside the chromosome are skipped
// with a warning and counted.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
};

use crate::data::{
    loader::AnnotationLoader,
    slicer::ChromosomeIndex,
    token_store::{ChromosomeTokenStore, DEFAULT_FILE_TEMPLATE},
};
use crate::domain::{
    chromosome::Chromosome,
    motif::{LabeledSequence, MotifRecord, DEFAULT_FLANK},
    traits::{MotifSource, TokenSource},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepareConfig {
    /// Motif/peak intersection table (.tsv or .tsv.gz)
    pub annotations:    PathBuf,
    /// Directory of per-chromosome token files
    pub tokens_dir:     PathBuf,
    pub token_template: String,
    pub flank:          u64,
    /// Where to write the prepared sequences as JSON
    pub cache:          Option<PathBuf>,
}

impl Default for PrepareConfig {
    fn default() -> Self {
        Self {
            annotations:    PathBuf::from("data/motifs_peaks.tsv.gz"),
            tokens_dir:     PathBuf::from("data/tokens"),
            token_template: DEFAULT_FILE_TEMPLATE.to_string(),
            flank:          DEFAULT_FLANK,
            cache:          None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreparedDataset {
    pub sequences: Vec<LabeledSequence>,
    /// Motifs dropped because their window left the chromosome
    pub skipped:   usize,
}

impl PreparedDataset {
    pub fn bound_count(&self) -> usize {
        self.sequences.iter().filter(|s| s.label.is_bound()).count()
    }
}

pub struct PrepareUseCase<M: MotifSource, T: TokenSource> {
    motifs: M,
    tokens: T,
    flank:  u64,
}

impl PrepareUseCase<AnnotationLoader, ChromosomeTokenStore> {
    pub fn from_config(cfg: &PrepareConfig) -> Self {
        Self::new(
            AnnotationLoader::new(&cfg.annotations),
            ChromosomeTokenStore::new(&cfg.tokens_dir).with_template(cfg.token_template.clone()),
            cfg.flank,
        )
    }
}

impl<M: MotifSource, T: TokenSource> PrepareUseCase<M, T> {
    pub fn new(motifs: M, tokens: T, flank: u64) -> Self {
        Self { motifs, tokens, flank }
    }

    pub fn execute(&self) -> Result<PreparedDataset> {
        let records = self.motifs.load_all()?;

        // ── Step 2: group by chromosome, keeping input order within each ─────
        let mut by_chrom: BTreeMap<Chromosome, Vec<MotifRecord>> = BTreeMap::new();
        for record in records {
            by_chrom.entry(record.region.chrom).or_default().push(record);
        }

        let mut sequences = Vec::new();
        let mut skipped   = 0usize;

        // ── Step 3: one chromosome at a time ─────────────────────────────────
        for (chrom, motifs) in by_chrom {
            let tokens = self.tokens.load_chromosome(chrom)?;
            let index  = ChromosomeIndex::new(chrom.name(), tokens);
            tracing::debug!(
                "{}: {} nucleotides, {} motifs",
                chrom, index.nucleotide_count(), motifs.len(),
            );

            for record in motifs {
                let sliced = record
                    .region
                    .expand(self.flank)
                    .and_then(|window| index.slice(&window).map(|t| (window, t.to_vec())));

                match sliced {
                    Ok((window, tokens)) => sequences.push(LabeledSequence {
                        motif: record.region,
                        window,
                        label: record.label,
                        tokens,
                    }),
                    Err(e) => {
                        tracing::warn!("Skipping motif {}:{}-{}: {}",
                            chrom, record.region.start, record.region.end, e);
                        skipped += 1;
                    }
                }
            }
            // index (tokens + map) dropped here before the next chromosome
        }

        let prepared = PreparedDataset { sequences, skipped };
        tracing::info!(
            "Prepared {} sequences ({} bound), skipped {} motifs",
            prepared.sequences.len(),
            prepared.bound_count(),
            prepared.skipped,
        );
        Ok(prepared)
    }
}

/// Write prepared sequences to a JSON cache file.
pub fn write_cache(path: &Path, sequences: &[LabeledSequence]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)
        .with_context(|| format!("Cannot create cache '{}'", path.display()))?;
    serde_json::to_writer(BufWriter::new(file), sequences)
        .with_context(|| format!("Cannot write cache '{}'", path.display()))?;
    tracing::info!("Wrote {} sequences to '{}'", sequences.len(), path.display());
    Ok(())
}

pub fn read_cache(path: &Path) -> Result<Vec<LabeledSequence>> {
    let file = File::open(path)
        .with_context(|| format!("Cannot open cache '{}'", path.display()))?;
    let sequences: Vec<LabeledSequence> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Invalid cache '{}'", path.display()))?;
    tracing::info!("Loaded {} prepared sequences from '{}'", sequences.len(), path.display());
    Ok(sequences)
}
