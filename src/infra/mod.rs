// ============================================================
// Layer 6 - Infrastructure Layer
// ============================================================
// File-level concerns shared by the training and prediction
// workflows:
//
//   checkpoint.rs      - model directory layout: config.json,
//                        model.mpk weights (CompactRecorder),
//                        train_config.json and test_report.json
//
//   tokenizer_store.rs - loads the pretrained tokenizer.json and
//                        copies it into the output directory
//
//   metrics.rs         - per-epoch metrics appended to metrics.csv

/// Model directory reading and writing
pub mod checkpoint;

/// Tokenizer loading and copying
pub mod tokenizer_store;

/// Training metrics CSV logger
pub mod metrics;
