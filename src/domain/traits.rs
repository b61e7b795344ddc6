// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer talks to data sources, predictors and
// registries only through these traits. Tests plug in small
// in-memory implementations; the binary wires up the real ones:
//
//   DatasetSource  ← DatasetLoader (word-list files)
//   WordPredictor  ← WordCategoryPredictor (burn model)
//   Registry       ← HubClient (Hugging Face Hub over HTTP)

use std::path::PathBuf;

use anyhow::Result;

use crate::domain::dataset_item::DatasetItem;
use crate::domain::prediction::PredictionResult;

// ─── DatasetSource ────────────────────────────────────────────────────────────
/// Anything that can produce labelled training words.
pub trait DatasetSource {
    fn load_data(&self) -> Result<Vec<DatasetItem>>;
}

// ─── WordPredictor ────────────────────────────────────────────────────────────
/// Anything that can assign a category to a word.
pub trait WordPredictor {
    fn predict(&self, word: &str) -> Result<PredictionResult>;

    /// Results come back in input order.
    fn predict_batch(&self, words: &[String]) -> Result<Vec<PredictionResult>> {
        words.iter().map(|w| self.predict(w)).collect()
    }
}

// ─── Registry ─────────────────────────────────────────────────────────────────
/// Target repository on a model registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoTarget {
    pub repo_id:   String,
    pub repo_type: String,
    pub revision:  String,
}

impl RepoTarget {
    pub fn model(repo_id: impl Into<String>) -> Self {
        Self {
            repo_id:   repo_id.into(),
            repo_type: "model".to_string(),
            revision:  "main".to_string(),
        }
    }
}

/// A local file and the path it should have inside the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub local:        PathBuf,
    pub path_in_repo: String,
}

/// A remote store for model artifacts.
pub trait Registry {
    /// Upload all files as a single commit.
    fn upload(&self, target: &RepoTarget, files: &[UploadFile], summary: &str) -> Result<()>;

    /// Public page of a repository.
    fn repo_url(&self, repo_id: &str) -> String {
        format!("https://huggingface.co/{repo_id}")
    }
}
