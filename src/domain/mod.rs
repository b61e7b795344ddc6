// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain structs, enums and traits describing what the system
// works with: labelled words, categories, predictions, and the
// seams to data sources and registries.
//
// Rules for this layer:
//   - NO Burn framework types
//   - NO file I/O or network calls

// A labelled word loaded from disk
pub mod dataset_item;

// Word categories and the label ⇄ id mapping
pub mod labels;

// Per-word predictions and grouped prompt results
pub mod prediction;

// Core abstractions (traits) that other layers implement
pub mod traits;
