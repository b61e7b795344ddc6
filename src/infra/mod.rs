// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns used by several use cases:
//
//   checkpoint.rs      — per-epoch weights during training,
//                        best-epoch pointer, saved TrainConfig
//
//   artifacts.rs       — config.json plus exported and quantized
//                        weight records; warm-start encoder loading
//
//   tokenizer_store.rs — resolves, builds and saves the tokenizer
//                        so training and inference share a vocabulary
//
//   metrics.rs         — per-epoch metrics appended to metrics.csv
//
//   hub.rs             — Hugging Face Hub upload client
//
//   pretrained.rs      — DistilBERT safetensors checkpoints used
//                        to seed the encoder before fine-tuning
//
// Reference: Rust Book §7 (Modules)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Exported model directories and weight records
pub mod artifacts;

/// Tokenizer resolution, saving, and loading
pub mod tokenizer_store;

/// Training metrics CSV logger
pub mod metrics;

/// Model registry client
pub mod hub;

/// Pretrained DistilBERT weight loading
pub mod pretrained;
