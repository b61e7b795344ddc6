// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between word-list files and tensor batches:
//
//   actions.txt, subjects.txt, ...
//       │
//       ▼
//   DatasetLoader     → reads files, one DatasetItem per word
//       │
//       ▼
//   split_train_test  → seeded shuffle + train/test split
//       │
//       ▼
//   WordEncoder       → word → padded token ids + mask
//       │
//       ▼
//   WordDataset       → implements Burn's Dataset trait
//       │
//       ▼
//   WordBatcher       → stacks samples into tensor batches
//
// The prompt helpers in `text` feed the same encoder at
// classification time.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads one word list per label
pub mod loader;

/// Cleans raw lines before they become words
pub mod preprocessor;

/// Tokenises words to fixed-length id sequences
pub mod encoder;

/// Implements Burn's Dataset trait for word samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Seeded train/test split
pub mod splitter;

/// Prompt word splitting and suffix heuristics
pub mod text;
