// ============================================================
// Layer 4 - Data Pipeline
// ============================================================
// Everything from the motif/peak table to tensor batches:
//
//   intersection table (.tsv / .tsv.gz)
//       │
//       ▼
//   AnnotationLoader     → labeled MotifRecords
//       │
//       ▼
//   ChromosomeTokenStore → whole-chromosome token list
//       │
//       ▼
//   PositionMap          → nucleotide offset → token index
//       │
//       ▼
//   ChromosomeIndex      → tokens covering each motif window
//       │
//       ▼
//   SequenceEncoder      → [CLS] ids [SEP] + padding + mask
//       │
//       ▼
//   split_train_val_test → 80 / 10 / 10 partitions
//       │
//       ▼
//   MotifDataset + ClassificationBatcher → Burn DataLoader

/// Reads the motif/peak intersection table
pub mod loader;

/// Per-chromosome token files (pickle or text)
pub mod token_store;

/// Nucleotide-to-token position map
pub mod position_map;

/// Region-to-token slicing
pub mod slicer;

/// Token strings → framed, padded id sequences
pub mod encoder;

/// Implements Burn's Dataset trait for motif samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Seeded train/validation/test split
pub mod splitter;
