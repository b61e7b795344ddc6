// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Train + evaluation loop using Burn's DataLoader and Adam.
//
// Backend notes:
//   - Training runs on Autodiff<CpuBackend | GpuBackend>
//   - model.valid() returns the model on the inner backend,
//     so the eval batcher is built for B::InnerBackend
//   - argmax(1) returns [batch, 1]; flatten before .equal()
//
// Schedule:
//   - learning rate decays linearly from `learning_rate` to 0
//     over all optimizer steps
//   - checkpoint after every epoch, best epoch = lowest eval loss
//   - at the end the best checkpoint is reloaded and evaluated,
//     and those numbers are returned
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use std::path::PathBuf;
use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::{WordBatch, WordBatcher}, dataset::WordDataset};
use crate::error::ClassifierError;
use crate::infra::{
    artifacts,
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricsLogger},
    pretrained::PretrainedFiles,
};
use crate::ml::backend::{CpuBackend, CpuDevice, DeviceKind, GpuBackend, GpuDevice};
use crate::ml::model::{WordClassifierModel, WordClassifierModelConfig};

/// Evaluation of the best checkpoint after training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalMetrics {
    /// NaN when the test split is empty
    pub eval_loss:     f64,
    pub eval_accuracy: f64,
    pub best_epoch:    usize,
    pub epochs_run:    usize,
}

// ─── Model initialisation ─────────────────────────────────────────────────────
/// Where the encoder weights come from when not randomly initialised.
#[derive(Debug, Clone, PartialEq)]
pub enum WarmStart {
    /// Exported artifact directory (config.json + model.bin)
    Exported(PathBuf),
    /// Hugging Face DistilBERT checkpoint (config.json + model.safetensors)
    Pretrained(PretrainedFiles),
}

/// How to build the model once the training device is known.
#[derive(Debug, Clone)]
pub struct ModelInit {
    pub config:     WordClassifierModelConfig,
    pub warm_start: Option<WarmStart>,
}

impl ModelInit {
    pub fn build<B: Backend>(&self, device: &B::Device) -> Result<WordClassifierModel<B>> {
        let mut model = self.config.init::<B>(device);
        match &self.warm_start {
            Some(WarmStart::Exported(dir)) => {
                let (encoder, _) = artifacts::load_encoder::<B>(dir, self.config.max_seq_len, device)?;
                model.encoder = encoder;
            }
            Some(WarmStart::Pretrained(files)) => {
                model.encoder = files.load_encoder::<B>(&self.config, device)?;
            }
            None => {}
        }
        Ok(model)
    }
}

// ─── Entry point ──────────────────────────────────────────────────────────────
pub fn run_training(
    cfg:     &TrainConfig,
    init:    &ModelInit,
    train:   WordDataset,
    test:    WordDataset,
    ckpt:    &CheckpointManager,
    metrics: &MetricsLogger,
) -> Result<EvalMetrics> {
    match cfg.device {
        DeviceKind::Cpu => {
            let device = CpuDevice::default();
            tracing::info!("Training on CPU (ndarray)");
            train_loop::<burn::backend::Autodiff<CpuBackend>>(cfg, init, train, test, ckpt, metrics, device)
        }
        DeviceKind::Gpu => {
            let device = GpuDevice::default();
            tracing::info!("Training on WGPU device: {:?}", device);
            train_loop::<burn::backend::Autodiff<GpuBackend>>(cfg, init, train, test, ckpt, metrics, device)
        }
    }
}

fn train_loop<B: AutodiffBackend>(
    cfg:     &TrainConfig,
    init:    &ModelInit,
    train:   WordDataset,
    test:    WordDataset,
    ckpt:    &CheckpointManager,
    metrics: &MetricsLogger,
    device:  B::Device,
) -> Result<EvalMetrics> {
    if cfg.batch_size == 0 || cfg.num_epochs == 0 {
        return Err(ClassifierError::Training(
            "batch_size and num_epochs must be positive".to_string(),
        ).into());
    }

    // ── Build model ───────────────────────────────────────────────────────────
    let mut model: WordClassifierModel<B> = init.build(&device)?;
    tracing::info!(
        "Model ready: {} layers, d_model={}, {} labels",
        init.config.num_layers, init.config.d_model, init.config.num_labels
    );

    let mut optim = AdamConfig::new().with_epsilon(1e-8).init();

    let train_len   = train.sample_count();
    let test_len    = test.sample_count();
    let total_steps = cfg.num_epochs * train_len.div_ceil(cfg.batch_size);
    tracing::info!("{} train / {} test samples, {} optimizer steps", train_len, test_len, total_steps);

    // ── Data loaders ──────────────────────────────────────────────────────────
    let train_loader = DataLoaderBuilder::new(WordBatcher::<B>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .shuffle(cfg.random_seed)
        .num_workers(1)
        .build(train);

    let test_loader = DataLoaderBuilder::new(WordBatcher::<B::InnerBackend>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .build(test);

    // ── Epoch loop ────────────────────────────────────────────────────────────
    let mut best: Option<(usize, f64)> = None;
    let mut step = 0usize;

    for epoch in 1..=cfg.num_epochs {
        let mut loss_sum = 0.0f64;
        let mut batches  = 0usize;

        for batch in train_loader.iter() {
            let (loss, _) = model.forward_classification(
                batch.input_ids,
                batch.attention_mask,
                batch.labels,
            );

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            if !loss_val.is_finite() {
                return Err(ClassifierError::Training(format!(
                    "loss became {loss_val} at epoch {epoch}, step {}", step + 1
                )).into());
            }
            loss_sum += loss_val;
            batches  += 1;

            let lr = cfg.learning_rate * (1.0 - step as f64 / total_steps.max(1) as f64);
            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optim.step(lr, model, grads);
            step += 1;

            if cfg.logging_steps > 0 && step % cfg.logging_steps == 0 {
                tracing::info!("step {:>5} | epoch {} | loss={:.4} | lr={:.2e}", step, epoch, loss_val, lr);
            }
        }

        let train_loss = if batches > 0 { loss_sum / batches as f64 } else { f64::NAN };

        // Dropout off, no autodiff graph.
        let (eval_loss, eval_accuracy) = evaluate(&model.valid(), &test_loader);
        let m = EpochMetrics::new(epoch, train_loss, eval_loss, eval_accuracy);

        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | eval_loss={:.4} | eval_acc={:.1}%",
            epoch, cfg.num_epochs, train_loss, eval_loss, eval_accuracy * 100.0,
        );

        metrics.log(&m)?;
        ckpt.save_model(&model, epoch)?;

        if m.is_improvement(best.map(|(_, loss)| loss)) {
            best = Some((epoch, eval_loss));
            ckpt.mark_best(epoch)?;
            tracing::info!("New best eval_loss={:.4} at epoch {}", eval_loss, epoch);
        }
    }

    // ── Load best at end ──────────────────────────────────────────────────────
    let best_epoch = match best {
        Some((epoch, _)) => epoch,
        None => {
            tracing::warn!("No finite eval loss; using the last epoch");
            ckpt.mark_best(cfg.num_epochs)?;
            cfg.num_epochs
        }
    };

    let best_model = ckpt.load_epoch(init.config.init::<B::InnerBackend>(&device), best_epoch, &device)?;
    let (eval_loss, eval_accuracy) = evaluate(&best_model, &test_loader);

    tracing::info!("Training complete, best epoch {}", best_epoch);
    Ok(EvalMetrics { eval_loss, eval_accuracy, best_epoch, epochs_run: cfg.num_epochs })
}

/// Sample-weighted mean loss and accuracy over a loader.
/// Returns (NaN, 0.0) for an empty loader.
fn evaluate<B: Backend>(
    model:  &WordClassifierModel<B>,
    loader: &Arc<dyn DataLoader<WordBatch<B>>>,
) -> (f64, f64) {
    let mut loss_sum = 0.0f64;
    let mut correct  = 0usize;
    let mut total    = 0usize;

    for batch in loader.iter() {
        let n = batch.labels.dims()[0];
        let (loss, logits) = model.forward_classification(
            batch.input_ids,
            batch.attention_mask,
            batch.labels.clone(),
        );
        loss_sum += loss.into_scalar().elem::<f64>() * n as f64;

        let predicted = logits.argmax(1).flatten::<1>(0, 1);
        let hits: i64 = predicted.equal(batch.labels).int().sum().into_scalar().elem::<i64>();
        correct += hits as usize;
        total   += n;
    }

    if total == 0 {
        return (f64::NAN, 0.0);
    }
    (loss_sum / total as f64, correct as f64 / total as f64)
}
