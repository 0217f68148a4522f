// ============================================================
// Layer 4 - Annotation Loader
// ============================================================
// Reads the motif/peak intersection table produced by intersecting
// a motif annotation with a ChIP-seq peak annotation (left outer
// join, so motifs without a peak are kept with placeholder columns).
//
// Table layout (tab-separated, no header, 19 columns):
//   column 0  chromosome
//   column 3  motif start
//   column 4  motif end
//   column 9  peak indicator, or "." when no peak overlaps
//
// Plain and gzip-compressed (.gz) files are supported.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use flate2::read::GzDecoder;

use crate::domain::chromosome::Chromosome;
use crate::domain::error::PipelineError;
use crate::domain::motif::{BindingLabel, GenomicRegion, MotifRecord};
use crate::domain::traits::MotifSource;

pub const NUM_COLUMNS: usize = 19;
pub const CHROM_COLUMN: usize = 0;
pub const START_COLUMN: usize = 3;
pub const END_COLUMN: usize = 4;
pub const PEAK_COLUMN: usize = 9;

/// Loads labeled motif records from an intersection table.
/// Implements the MotifSource trait from Layer 3.
pub struct AnnotationLoader {
    path: PathBuf,
}

impl AnnotationLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn is_gzipped(path: &Path) -> bool {
        path.extension().and_then(|e| e.to_str()) == Some("gz")
    }
}

impl MotifSource for AnnotationLoader {
    fn load_all(&self) -> Result<Vec<MotifRecord>> {
        if !self.path.is_file() {
            return Err(PipelineError::MissingFile(self.path.clone()).into());
        }

        tracing::info!("Loading motif annotations from '{}'", self.path.display());

        let file = File::open(&self.path)
            .with_context(|| format!("Cannot open '{}'", self.path.display()))?;

        let records = if Self::is_gzipped(&self.path) {
            parse_records(BufReader::new(GzDecoder::new(file)))
        } else {
            parse_records(BufReader::new(file))
        }
        .with_context(|| format!("Cannot parse '{}'", self.path.display()))?;

        let bound = records.iter().filter(|r| r.label.is_bound()).count();
        tracing::info!(
            "Loaded {} motifs ({} bound, {} unbound)",
            records.len(),
            bound,
            records.len() - bound
        );
        Ok(records)
    }
}

/// Parse the intersection table from any reader.
///
/// A motif overlapping several peaks appears once per peak; rows are
/// merged on (chrom, start, end) and the motif is bound if any row is.
/// Records keep the order in which motifs first appear.
pub fn parse_records<R: Read>(reader: R) -> Result<Vec<MotifRecord>> {
    let mut csv_reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .comment(Some(b'#'))
        .from_reader(reader);

    let mut records: Vec<MotifRecord> = Vec::new();
    let mut seen: HashMap<GenomicRegion, usize> = HashMap::new();
    let mut skipped_contigs = 0usize;

    for (row_idx, result) in csv_reader.records().enumerate() {
        let row = result.context("Failed to read table row")?;
        let line = row
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(row_idx + 1);

        if row.len() < NUM_COLUMNS {
            return Err(PipelineError::MalformedRow {
                line,
                reason: format!("expected {} columns, found {}", NUM_COLUMNS, row.len()),
            }
            .into());
        }

        let chrom = match Chromosome::parse(&row[CHROM_COLUMN]) {
            Ok(c) => c,
            Err(_) => {
                tracing::debug!("Skipping line {}: unsupported contig '{}'", line, &row[CHROM_COLUMN]);
                skipped_contigs += 1;
                continue;
            }
        };

        let start = parse_coordinate(&row[START_COLUMN], line, "start")?;
        let end   = parse_coordinate(&row[END_COLUMN], line, "end")?;
        if end <= start {
            return Err(PipelineError::MalformedRow {
                line,
                reason: format!("end ({end}) must be greater than start ({start})"),
            }
            .into());
        }

        let region = GenomicRegion::new(chrom, start, end);
        let label  = BindingLabel::from_peak_field(&row[PEAK_COLUMN]);

        match seen.get(&region) {
            Some(&idx) => {
                if label.is_bound() {
                    records[idx].label = BindingLabel::Bound;
                }
            }
            None => {
                seen.insert(region, records.len());
                records.push(MotifRecord::new(region, label));
            }
        }
    }

    if skipped_contigs > 0 {
        tracing::info!("Skipped {} rows on unsupported contigs", skipped_contigs);
    }

    Ok(records)
}

fn parse_coordinate(field: &str, line: usize, name: &str) -> Result<u64> {
    field.trim().parse::<u64>().map_err(|_| {
        PipelineError::MalformedRow {
            line,
            reason: format!("{name} '{field}' is not a non-negative integer"),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    /// Build one 19-column row with the given chrom/start/end/peak fields
    fn row(chrom: &str, start: u64, end: u64, peak: &str) -> String {
        let mut cols: Vec<String> = (0..NUM_COLUMNS).map(|i| format!("c{i}")).collect();
        cols[CHROM_COLUMN] = chrom.to_string();
        cols[START_COLUMN] = start.to_string();
        cols[END_COLUMN]   = end.to_string();
        cols[PEAK_COLUMN]  = peak.to_string();
        cols.join("\t")
    }

    #[test]
    fn test_parses_labels_from_peak_column() {
        let table = [
            row("chr1", 1000, 1012, "."),
            row("chr2", 5000, 5012, "peak_7"),
        ]
        .join("\n");

        let records = parse_records(Cursor::new(table)).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].region.chrom.name(), "chr1");
        assert_eq!(records[0].region.start, 1000);
        assert_eq!(records[0].region.end, 1012);
        assert_eq!(records[0].label, BindingLabel::Unbound);
        assert_eq!(records[1].label, BindingLabel::Bound);
    }

    #[test]
    fn test_quote_characters_are_plain_text() {
        let with_name = |line: String, name: &str| {
            let mut cols: Vec<String> = line.split('\t').map(String::from).collect();
            cols[1] = name.to_string();
            cols.join("\t")
        };
        let first  = with_name(row("chr1", 1000, 1012, "."), "\"motif");
        let second = with_name(row("chr1", 2000, 2012, "peak_2"), "name\"");

        let records = parse_records(Cursor::new([first, second].join("\n"))).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].region.start, 1000);
        assert_eq!(records[1].region.start, 2000);
        assert_eq!(records[1].label, BindingLabel::Bound);
    }

    #[test]
    fn test_merges_motifs_hitting_several_peaks() {
        let table = [
            row("chr1", 1000, 1012, "."),
            row("chr3", 2000, 2012, "peak_1"),
            row("chr3", 2000, 2012, "peak_2"),
            row("chr1", 1000, 1012, "peak_9"),
        ]
        .join("\n");

        let records = parse_records(Cursor::new(table)).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].region.chrom.name(), "chr1");
        assert_eq!(records[0].label, BindingLabel::Bound);
        assert_eq!(records[1].region.chrom.name(), "chr3");
    }

    #[test]
    fn test_skips_unsupported_contigs() {
        let table = [row("chrM", 10, 20, "."), row("chrX", 600, 620, ".")].join("\n");
        let records = parse_records(Cursor::new(table)).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].region.chrom.index(), 23);
    }

    #[test]
    fn test_short_row_is_malformed() {
        let table = format!("{}\nchr1\t10\t20", row("chr1", 1000, 1012, "."));
        let err = parse_records(Cursor::new(table)).unwrap_err();
        match err.downcast_ref::<PipelineError>() {
            Some(PipelineError::MalformedRow { line, .. }) => assert_eq!(*line, 2),
            other => panic!("Expected MalformedRow, got {:?}", other),
        }
    }

    #[test]
    fn test_non_numeric_coordinate_is_malformed() {
        let table = row("chr1", 1000, 1012, ".").replace("1000", "abc");
        let err = parse_records(Cursor::new(table)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::MalformedRow { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let loader = AnnotationLoader::new("/nonexistent/motifs.tsv");
        let err = loader.load_all().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::MissingFile(_))
        ));
    }

    #[test]
    fn test_loads_gzipped_table() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("motifs.tsv.gz");
        let mut enc = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        writeln!(enc, "{}", row("chr5", 3000, 3010, "peak")).unwrap();
        enc.finish().unwrap();

        let records = AnnotationLoader::new(&path).load_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].label, BindingLabel::Bound);
    }
}
