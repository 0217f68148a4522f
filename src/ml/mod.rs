// ============================================================
// Layer 5 - ML / Model Layer (Burn)
// ============================================================
// All model and optimisation code lives here.
//
//   model.rs      - BERT-style encoder: token + position
//                   embeddings, post-norm encoder blocks with a
//                   padding mask, [CLS] pooler, 2-logit head
//
//   trainer.rs    - train / validate / test loops, Adam with
//                   gradient clipping, checkpoint on improvement
//
//   schedule.rs   - linear warmup and decay of the learning rate
//
//   evaluation.rs - precision / recall / F1 / accuracy
//
//   predictor.rs  - scores motifs with a fine-tuned directory
//
// Reference: Devlin et al. (2019) BERT
//            Sanabria et al. (2024) GROVER

/// Encoder classifier architecture
pub mod model;

/// Training loop with validation and checkpointing
pub mod trainer;

/// Learning-rate schedule
pub mod schedule;

/// Binary classification metrics
pub mod evaluation;

/// Batched inference over encoded motifs
pub mod predictor;
