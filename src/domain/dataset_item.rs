// ============================================================
// Layer 3 — DatasetItem Domain Type
// ============================================================
// One labelled word from the training corpus.
// Created by the DatasetLoader and never modified afterwards;
// tokenisation produces a separate WordSample.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetItem {
    /// The word itself, already trimmed
    pub text: String,

    /// Category name, e.g. "ACTION"
    pub label: String,
}

impl DatasetItem {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text:  text.into(),
            label: label.into(),
        }
    }
}
