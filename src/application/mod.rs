// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// a specific goal (training, prediction, packaging).
//
// Rules for this layer:
//   - No ML math or model code here
//   - No UI or printing here (that's Layer 1)
//   - Only workflow coordination
//
//   train      → word lists → fine-tuned checkpoints
//   predict    → checkpoint or export → label per word
//   classify   → prompt → words grouped by category
//   export     → best checkpoint → model.bin
//   quantize   → model.bin → model_quantized.bin
//   upload     → export directory → model registry
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The training workflow
pub mod train_use_case;

// Single-word and batch prediction
pub mod predict_use_case;

// Prompt classification with heuristics and cache
pub mod classify_use_case;

// Checkpoint → portable artifact
pub mod export_use_case;

// Half-precision artifact
pub mod quantize_use_case;

// Publishing to the model registry
pub mod upload_use_case;
