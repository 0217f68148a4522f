// ============================================================
// Layer 2 - Application / Use Cases
// ============================================================
// Workflow coordination only: each use case wires the data,
// ml and infra layers together for one CLI command.
//
//   prepare - motif table + token files → labeled sequences
//   train   - prepare, encode, split, fine-tune, test
//   predict - prepare, encode, score with a fine-tuned model

// Coordinates to token sequences
pub mod prepare_use_case;

// The fine-tuning workflow
pub mod train_use_case;

// Scoring motifs with a fine-tuned model
pub mod predict_use_case;
