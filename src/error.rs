// ============================================================
// Error Types
// ============================================================
// Typed failures raised by the pipeline. The application and
// CLI layers carry these inside anyhow::Error, so tests and
// callers can still downcast to the exact variant.

use std::path::PathBuf;

/// Boxed cause attached to wrapped library failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(thiserror::Error, Debug)]
pub enum ClassifierError {
    /// One or more input files do not exist. Every missing path is listed.
    #[error("Files not found: {}", join_paths(.0))]
    FilesNotFound(Vec<PathBuf>),

    #[error("Encoding error in {}: {source}", path.display())]
    Encoding {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A component was used before it was loaded or built.
    #[error("{0} not initialized")]
    NotInitialized(&'static str),

    #[error("Unknown label '{0}'")]
    UnknownLabel(String),

    #[error("Duplicate label '{0}'")]
    DuplicateLabel(String),

    #[error("Tokenization error: {0}")]
    Tokenization(String),

    #[error("Model initialization failed")]
    ModelInit(#[source] BoxError),

    #[error("Training failed: {0}")]
    Training(String),

    #[error("No Hugging Face token found (set HF_TOKEN or run `huggingface-cli login`)")]
    MissingToken,

    #[error("Registry error: {0}")]
    Registry(String),
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
