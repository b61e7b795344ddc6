// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the subcommands and all their configurable flags:
//
//   train     fine-tune on the four word lists
//   predict   label individual words
//   classify  group the words of a prompt by category
//   export    best checkpoint → model.bin
//   quantize  model.bin → model_quantized.bin
//   upload    export directory → Hugging Face Hub
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::{
    export_use_case::ExportConfig,
    predict_use_case::PredictionConfig,
    train_use_case::TrainConfig,
    upload_use_case::{UploadConfig, DEFAULT_REPO_ID},
};
use crate::ml::backend::DeviceKind;

/// Words labelled by `predict` when none are given.
pub const DEFAULT_TEST_WORDS: &[&str] = &[
    "run", "jump", "deploy", "considering", "training", "make",
    "teacher", "doctor", "woman", "viewer", "wizard", "pilot",
    "banana", "laptop", "dog", "pencil", "flower", "car",
    "beautiful", "urgent", "successful", "frequently", "strategic", "faithful",
];

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fine-tune the classifier on the word lists
    Train(TrainArgs),

    /// Predict the category of individual words
    Predict(PredictArgs),

    /// Group the words of a prompt by category (JSON output)
    Classify(ClassifyArgs),

    /// Write the best checkpoint as a portable model.bin
    Export(ExportArgs),

    /// Store the exported weights in half precision
    Quantize(QuantizeArgs),

    /// Publish the exported model to the Hugging Face Hub
    Upload(UploadArgs),
}

// ─── train ────────────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory holding actions.txt, subjects.txt, objects.txt, descriptors.txt
    #[arg(long, default_value = "dataset")]
    pub dataset_dir: PathBuf,

    /// Directory for checkpoints, config.json and tokenizer files
    #[arg(long, default_value = "distilbert-word-classifier")]
    pub output_dir: PathBuf,

    /// Hub model id to fetch the tokenizer and pretrained weights from
    #[arg(long, default_value = "distilbert-base-cased")]
    pub model_name: String,

    /// Never contact the hub; build a word-level tokenizer and start from random weights
    #[arg(long)]
    pub offline: bool,

    /// Exported model, or directory with config.json + model.safetensors, to warm-start from
    #[arg(long)]
    pub base_model_dir: Option<PathBuf>,

    /// Tokens per word including [CLS] and [SEP]
    #[arg(long, default_value_t = 16)]
    pub max_length: usize,

    /// Fraction of words held out for evaluation
    #[arg(long, default_value_t = 0.1)]
    pub test_size: f64,

    /// Seed for the train/test shuffle
    #[arg(long, default_value_t = 50)]
    pub seed: u64,

    #[arg(long, default_value_t = 7)]
    pub epochs: usize,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    /// Peak learning rate, decayed linearly to zero
    #[arg(long, default_value_t = 2e-5)]
    pub lr: f64,

    /// Log the running loss every N steps
    #[arg(long, default_value_t = 50)]
    pub logging_steps: usize,

    /// Hidden dimension of the transformer
    #[arg(long, default_value_t = 768)]
    pub d_model: usize,

    /// d_model must be divisible by num_heads
    #[arg(long, default_value_t = 12)]
    pub num_heads: usize,

    #[arg(long, default_value_t = 6)]
    pub num_layers: usize,

    /// Inner dimension of the feed-forward network
    #[arg(long, default_value_t = 3072)]
    pub d_ff: usize,

    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,

    #[arg(long, value_enum, default_value_t = DeviceKind::Cpu)]
    pub device: DeviceKind,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            dataset_files:  TrainConfig::default_dataset_files(&a.dataset_dir),
            model_name:     a.model_name,
            offline:        a.offline,
            base_model_dir: a.base_model_dir,
            output_dir:     a.output_dir,
            max_length:     a.max_length,
            test_size:      a.test_size,
            random_seed:    a.seed,
            num_epochs:     a.epochs,
            batch_size:     a.batch_size,
            learning_rate:  a.lr,
            logging_steps:  a.logging_steps,
            d_model:        a.d_model,
            num_heads:      a.num_heads,
            num_layers:     a.num_layers,
            d_ff:           a.d_ff,
            dropout:        a.dropout,
            device:         a.device,
        }
    }
}

// ─── predict / classify ───────────────────────────────────────────────────────
/// Where the model lives and how to run it.
#[derive(Args, Debug)]
pub struct ModelArgs {
    /// Training output or export directory
    #[arg(long, default_value = "distilbert-word-classifier")]
    pub model_dir: PathBuf,

    /// Directory with tokenizer.json (defaults to --model-dir)
    #[arg(long)]
    pub tokenizer_dir: Option<PathBuf>,

    /// Use model_quantized.bin
    #[arg(long)]
    pub quantized: bool,

    #[arg(long, default_value_t = 16)]
    pub max_length: usize,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    #[arg(long, value_enum, default_value_t = DeviceKind::Cpu)]
    pub device: DeviceKind,
}

impl From<ModelArgs> for PredictionConfig {
    fn from(a: ModelArgs) -> Self {
        let tokenizer_dir = a.tokenizer_dir.unwrap_or_else(|| a.model_dir.clone());
        PredictionConfig {
            device:     a.device,
            max_length: a.max_length,
            batch_size: a.batch_size,
            quantized:  a.quantized,
            ..PredictionConfig::new(a.model_dir, tokenizer_dir)
        }
    }
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Words to label (a built-in sample list when empty)
    pub words: Vec<String>,

    #[command(flatten)]
    pub model: ModelArgs,
}

impl PredictArgs {
    pub fn words(&self) -> Vec<String> {
        if self.words.is_empty() {
            DEFAULT_TEST_WORDS.iter().map(|w| w.to_string()).collect()
        } else {
            self.words.clone()
        }
    }
}

#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Prompt text, optionally starting with a #! marker
    pub prompt: String,

    #[command(flatten)]
    pub model: ModelArgs,
}

// ─── export / quantize / upload ───────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Training output with config.json and checkpoints
    #[arg(long, default_value = "distilbert-word-classifier")]
    pub train_dir: PathBuf,

    #[arg(long, default_value = "onnx-model")]
    pub export_dir: PathBuf,
}

impl From<ExportArgs> for ExportConfig {
    fn from(a: ExportArgs) -> Self {
        ExportConfig { train_dir: a.train_dir, export_dir: a.export_dir }
    }
}

#[derive(Args, Debug)]
pub struct QuantizeArgs {
    #[arg(long, default_value = "onnx-model")]
    pub export_dir: PathBuf,
}

#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Target repository, as owner/name
    #[arg(long, default_value = DEFAULT_REPO_ID)]
    pub repo_id: String,

    #[arg(long, default_value = "onnx-model")]
    pub export_dir: PathBuf,

    /// Training output holding the tokenizer files
    #[arg(long, default_value = "distilbert-word-classifier")]
    pub train_dir: PathBuf,

    /// Model card uploaded as README.md
    #[arg(long, default_value = "info.md")]
    pub readme: PathBuf,
}

impl From<UploadArgs> for UploadConfig {
    fn from(a: UploadArgs) -> Self {
        UploadConfig {
            repo_id:    a.repo_id,
            export_dir: a.export_dir,
            train_dir:  a.train_dir,
            readme:     a.readme,
        }
    }
}
