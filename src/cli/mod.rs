// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application);
// this layer only routes and prints.
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use burn::prelude::Backend;
use clap::Parser;
use commands::{ClassifyArgs, Commands, ExportArgs, PredictArgs, QuantizeArgs, TrainArgs, UploadArgs};

use crate::application::predict_use_case::{PredictionConfig, WordCategoryPredictor};
use crate::domain::prediction::{CategorizedWords, PredictionResult};
use crate::ml::backend::{CpuBackend, CpuDevice, DeviceKind, GpuBackend, GpuDevice};

#[derive(Parser, Debug)]
#[command(
    name = "word-classifier",
    version,
    about = "Classify words as ACTION, SUBJECT, OBJECT or DESCRIPTOR with a fine-tuned transformer."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Predict(args)  => run_predict(args),
            Commands::Classify(args) => run_classify(args),
            Commands::Export(args)   => run_export(args),
            Commands::Quantize(args) => run_quantize(args),
            Commands::Upload(args)   => run_upload(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on word lists in: {}", args.dataset_dir.display());

    let use_case = TrainUseCase::new(args.into());
    let metrics  = use_case.execute()?;

    println!("\nEvaluation results:");
    println!("  eval_loss:     {:.4}", metrics.eval_loss);
    println!("  eval_accuracy: {:.4}", metrics.eval_accuracy);
    println!("  best_epoch:    {}", metrics.best_epoch);
    println!("Training completed!");
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    let words  = args.words();
    let config = PredictionConfig::from(args.model);

    let results = match config.device {
        DeviceKind::Cpu => predict_words::<CpuBackend>(config, CpuDevice::default(), &words)?,
        DeviceKind::Gpu => predict_words::<GpuBackend>(config, GpuDevice::default(), &words)?,
    };

    println!("Word Classification Results:");
    println!("{}", "-".repeat(50));
    for r in &results {
        println!("{:15} -> {:10} (confidence: {:.2}%)", r.word, r.label, r.confidence * 100.0);
    }

    println!("\nDetailed probabilities:");
    for r in &results {
        println!("\n{}:", r.word);
        for (label, p) in &r.all_probabilities {
            println!("  {:10}: {:.2}%", label, p * 100.0);
        }
    }
    Ok(())
}

fn predict_words<B: Backend>(
    config: PredictionConfig,
    device: B::Device,
    words:  &[String],
) -> Result<Vec<PredictionResult>> {
    let batch_size    = config.batch_size;
    let mut predictor = WordCategoryPredictor::<B>::new(config, device);
    predictor.load_model()?;
    predictor.predict_batch(words, batch_size)
}

fn run_classify(args: ClassifyArgs) -> Result<()> {
    let config = PredictionConfig::from(args.model);

    let words = match config.device {
        DeviceKind::Cpu => classify_prompt::<CpuBackend>(config, CpuDevice::default(), &args.prompt),
        DeviceKind::Gpu => classify_prompt::<GpuBackend>(config, GpuDevice::default(), &args.prompt),
    };

    println!("{}", serde_json::to_string_pretty(&words)?);
    Ok(())
}

/// Without a usable model the suffix heuristics still run; ambiguous
/// words are then left out.
fn classify_prompt<B: Backend>(config: PredictionConfig, device: B::Device, prompt: &str) -> CategorizedWords {
    use crate::application::classify_use_case::PromptClassifier;

    let mut predictor = WordCategoryPredictor::<B>::new(config, device);
    if let Err(e) = predictor.load_model() {
        tracing::warn!("Classifying with heuristics only: {:#}", e);
    }
    PromptClassifier::new(predictor).classify(prompt)
}

fn run_export(args: ExportArgs) -> Result<()> {
    use crate::application::export_use_case::ExportUseCase;

    let path = ExportUseCase::new(args.into()).execute()?;
    println!("Model exported to: {}", path.display());
    Ok(())
}

fn run_quantize(args: QuantizeArgs) -> Result<()> {
    use crate::application::quantize_use_case::QuantizeUseCase;

    let report = QuantizeUseCase::new(args.export_dir).execute()?;
    println!("Quantized model saved to: {}", report.quantized_path.display());
    println!("  original:  {} bytes", report.original_bytes);
    println!("  quantized: {} bytes ({:.1}%)", report.quantized_bytes, report.ratio() * 100.0);
    Ok(())
}

fn run_upload(args: UploadArgs) -> Result<()> {
    use crate::application::upload_use_case::UploadUseCase;
    use crate::infra::hub::HubClient;

    let client = HubClient::from_env()?;
    let url    = UploadUseCase::new(args.into(), client).execute()?;
    println!("Model uploaded to: {url}");
    Ok(())
}
