// ============================================================
// Layer 6 — Model Artifacts
// ============================================================
// Everything needed to rebuild a trained classifier lives in
// one directory:
//
//   config.json              ← architecture + label maps + max_length
//   model.bin                ← full-precision weights (export)
//   model_quantized.bin      ← half-precision weights (quantize)
//   tokenizer.json           ← vocabulary used in training
//
// Training checkpoints (checkpoint-N.mpk.gz) are compressed and
// type-checked by field name; export rewrites the best one as an
// uncompressed binary record that loads faster. Quantization
// stores the same record with f16 floats, roughly halving the
// size. Burn converts the values back to the backend float type
// when the record is loaded.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{collections::BTreeMap, fs, path::{Path, PathBuf}};
use burn::{
    prelude::*,
    record::{BinFileRecorder, FullPrecisionSettings, HalfPrecisionSettings, Recorder},
};
use serde::{Deserialize, Serialize};

use crate::domain::labels::LabelMap;
use crate::error::ClassifierError;
use crate::ml::model::{
    TransformerEncoder, WordClassifierModel, WordClassifierModelConfig, WordClassifierModelRecord,
};

pub const CONFIG_FILE: &str = "config.json";

const ARCHITECTURE: &str = "WordClassifierModel";

/// Precision of a stored weights record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightFormat {
    /// model.bin, f32 floats
    Full,
    /// model_quantized.bin, f16 floats
    Half,
}

impl WeightFormat {
    fn stem(&self) -> &'static str {
        match self {
            WeightFormat::Full => "model",
            WeightFormat::Half => "model_quantized",
        }
    }

    /// File name as written by the recorder.
    pub fn file_name(&self) -> String {
        format!("{}.bin", self.stem())
    }

    pub fn path_in(&self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }
}

// ─── config.json ──────────────────────────────────────────────────────────────
/// Architecture and label metadata stored next to the weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    pub architectures: Vec<String>,
    pub model:         WordClassifierModelConfig,
    pub max_length:    usize,
    pub id2label:      BTreeMap<usize, String>,
    pub label2id:      BTreeMap<String, usize>,
}

impl ArtifactConfig {
    pub fn new(model: WordClassifierModelConfig, max_length: usize, labels: &LabelMap) -> Self {
        Self {
            architectures: vec![ARCHITECTURE.to_string()],
            model,
            max_length,
            id2label: labels.id2label(),
            label2id: labels.label2id(),
        }
    }

    pub fn labels(&self) -> Result<LabelMap, ClassifierError> {
        LabelMap::from_id2label(&self.id2label)
    }

    pub fn exists_in(dir: &Path) -> bool {
        dir.join(CONFIG_FILE).exists()
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;
        let path = dir.join(CONFIG_FILE);
        fs::write(&path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        tracing::debug!("Saved model config to '{}'", path.display());
        Ok(())
    }

    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Invalid model config in '{}'", path.display()))
    }
}

// ─── Weights ──────────────────────────────────────────────────────────────────
pub fn save_weights<B: Backend>(
    model:  &WordClassifierModel<B>,
    dir:    &Path,
    format: WeightFormat,
) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Cannot create '{}'", dir.display()))?;

    // The recorder appends ".bin" itself.
    let stem   = dir.join(format.stem());
    let record = model.clone().into_record();
    match format {
        WeightFormat::Full => BinFileRecorder::<FullPrecisionSettings>::new().record(record, stem),
        WeightFormat::Half => BinFileRecorder::<HalfPrecisionSettings>::new().record(record, stem),
    }
    .with_context(|| format!("Failed to write '{}'", format.path_in(dir).display()))?;

    Ok(format.path_in(dir))
}

pub fn load_weights<B: Backend>(
    model:  WordClassifierModel<B>,
    dir:    &Path,
    format: WeightFormat,
    device: &B::Device,
) -> Result<WordClassifierModel<B>> {
    let path = format.path_in(dir);
    if !path.exists() {
        return Err(ClassifierError::FilesNotFound(vec![path]).into());
    }

    let stem = dir.join(format.stem());
    let record: WordClassifierModelRecord<B> = match format {
        WeightFormat::Full => BinFileRecorder::<FullPrecisionSettings>::new().load(stem, device),
        WeightFormat::Half => BinFileRecorder::<HalfPrecisionSettings>::new().load(stem, device),
    }
    .with_context(|| format!("Cannot load weights from '{}'", path.display()))?;

    Ok(model.load_record(record))
}

/// Rebuild a classifier from a directory holding config.json and weights.
pub fn load_model<B: Backend>(
    dir:    &Path,
    format: WeightFormat,
    device: &B::Device,
) -> Result<(WordClassifierModel<B>, ArtifactConfig)> {
    let config = ArtifactConfig::load(dir)?;
    let model  = config.model.init::<B>(device);
    let model  = load_weights(model, dir, format, device)?;
    Ok((model, config))
}

/// Pretrained encoder from a previously exported artifact.
///
/// The classification head is discarded; only the encoder is reused.
/// Fails if the stored position table is shorter than `max_length`.
pub fn load_encoder<B: Backend>(
    dir:        &Path,
    max_length: usize,
    device:     &B::Device,
) -> Result<(TransformerEncoder<B>, WordClassifierModelConfig)> {
    let config = ArtifactConfig::load(dir)?;
    if config.model.max_seq_len < max_length {
        anyhow::bail!(
            "Base model in '{}' supports sequences of {} tokens, {} requested",
            dir.display(),
            config.model.max_seq_len,
            max_length
        );
    }
    let model = config.model.init::<B>(device);
    let model = load_weights(model, dir, WeightFormat::Full, device)?;
    tracing::info!("Loaded pretrained encoder from '{}'", dir.display());
    Ok((model.encoder, config.model))
}

/// True if `dir` holds a warm-startable artifact.
pub fn is_pretrained_dir(dir: &Path) -> bool {
    ArtifactConfig::exists_in(dir) && WeightFormat::Full.path_in(dir).exists()
}

pub fn file_size(path: &Path) -> Result<u64> {
    Ok(fs::metadata(path)
        .with_context(|| format!("Cannot stat '{}'", path.display()))?
        .len())
}
