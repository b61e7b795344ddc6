// ============================================================
// Layer 6 — Pretrained DistilBERT Weights
// ============================================================
// Seeds the encoder with a Hugging Face DistilBERT checkpoint
// (config.json + model.safetensors), read from a local directory
// or downloaded through hf-hub.
//
// Tensor names, with or without a leading "distilbert.":
//
//   embeddings.word_embeddings          → token_embedding
//   embeddings.position_embeddings      → position_embedding
//   embeddings.LayerNorm                → embedding_norm
//   transformer.layer.N.attention.q_lin → layers[N].self_attn.query
//                       (k_lin, v_lin, out_lin → key, value, output)
//   transformer.layer.N.sa_layer_norm   → layers[N].norm1
//   transformer.layer.N.ffn.lin1 / lin2 → layers[N].ffn_linear1 / 2
//   transformer.layer.N.output_layer_norm → layers[N].norm2
//
// PyTorch stores Linear weights as [out, in] and burn as [in, out],
// so every linear weight is transposed on load. The masked-LM head
// (vocab_transform, vocab_projector) is ignored.

use anyhow::{Context, Result};
use burn::{
    module::Param,
    nn::LayerNorm,
    prelude::*,
    tensor::TensorData,
};
use safetensors::{Dtype, SafeTensors};
use serde::Deserialize;
use std::{fs, path::{Path, PathBuf}};

use crate::ml::model::{TransformerEncoder, WordClassifierModelConfig};

pub const HF_CONFIG_FILE: &str = "config.json";
pub const SAFETENSORS_FILE: &str = "model.safetensors";

const PREFIX: &str = "distilbert.";

/// The fields of a Hugging Face DistilBERT config.json we rely on.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DistilBertConfig {
    pub vocab_size:              usize,
    pub max_position_embeddings: usize,
    pub dim:                     usize,
    pub n_layers:                usize,
    pub n_heads:                 usize,
    pub hidden_dim:              usize,
    #[serde(default = "default_dropout")]
    pub dropout:                 f64,
    #[serde(default = "default_activation")]
    pub activation:              String,
}

fn default_dropout() -> f64 {
    0.1
}

fn default_activation() -> String {
    "gelu".to_string()
}

impl DistilBertConfig {
    /// Classifier config with this encoder's shape.
    pub fn model_config(&self, num_labels: usize) -> WordClassifierModelConfig {
        WordClassifierModelConfig::new(
            self.vocab_size,
            self.max_position_embeddings,
            self.dim,
            self.n_heads,
            self.n_layers,
            self.hidden_dim,
            num_labels,
        )
        .with_dropout(self.dropout)
    }
}

/// Location of a DistilBERT checkpoint on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PretrainedFiles {
    pub config:  PathBuf,
    pub weights: PathBuf,
}

impl PretrainedFiles {
    /// Both files inside `dir`, if present.
    pub fn in_dir(dir: &Path) -> Option<Self> {
        let files = Self {
            config:  dir.join(HF_CONFIG_FILE),
            weights: dir.join(SAFETENSORS_FILE),
        };
        (files.config.exists() && files.weights.exists()).then_some(files)
    }

    /// Download (or reuse from the hf-hub cache) the checkpoint of `model_id`.
    pub fn fetch(model_id: &str) -> Result<Self> {
        let api  = hf_hub::api::sync::Api::new().context("Failed to create hub API client")?;
        let repo = api.model(model_id.to_string());

        tracing::info!("Fetching pretrained weights for '{}' from the hub", model_id);
        let config = repo
            .get(HF_CONFIG_FILE)
            .with_context(|| format!("Failed to fetch {HF_CONFIG_FILE} for '{model_id}'"))?;
        let weights = repo
            .get(SAFETENSORS_FILE)
            .with_context(|| format!("Failed to fetch {SAFETENSORS_FILE} for '{model_id}'"))?;
        Ok(Self { config, weights })
    }

    pub fn load_config(&self) -> Result<DistilBertConfig> {
        let text = fs::read_to_string(&self.config)
            .with_context(|| format!("Cannot read '{}'", self.config.display()))?;
        let config: DistilBertConfig = serde_json::from_str(&text)
            .with_context(|| format!("'{}' is not a DistilBERT config", self.config.display()))?;
        if config.activation != "gelu" {
            anyhow::bail!("Unsupported activation '{}' (only gelu)", config.activation);
        }
        Ok(config)
    }

    /// Encoder shaped by `config` with every weight read from the checkpoint.
    pub fn load_encoder<B: Backend>(
        &self,
        config: &WordClassifierModelConfig,
        device: &B::Device,
    ) -> Result<TransformerEncoder<B>> {
        let bytes = fs::read(&self.weights)
            .with_context(|| format!("Cannot read '{}'", self.weights.display()))?;
        let tensors = SafeTensors::deserialize(&bytes)
            .map_err(|e| anyhow::anyhow!("Cannot parse '{}': {e}", self.weights.display()))?;
        let prefix = if tensors.names().iter().any(|n| n.starts_with(PREFIX)) { PREFIX } else { "" };
        let source = Checkpoint { tensors, prefix };

        let (d, d_ff) = (config.d_model, config.d_ff);
        let mut encoder = config.init_encoder::<B>(device);

        encoder.token_embedding.weight = Param::from_tensor(source.tensor(
            "embeddings.word_embeddings.weight", [config.vocab_size, d], device,
        )?);
        encoder.position_embedding.weight = Param::from_tensor(source.tensor(
            "embeddings.position_embeddings.weight", [config.max_seq_len, d], device,
        )?);
        encoder.embedding_norm = source.layer_norm(encoder.embedding_norm, "embeddings.LayerNorm", d, device)?;

        let mut layers = Vec::with_capacity(encoder.layers.len());
        for (i, mut block) in encoder.layers.into_iter().enumerate() {
            let name = format!("transformer.layer.{i}");

            let mut attn = block.self_attn.clone().into_record();
            for (lin, slot) in [
                ("q_lin", &mut attn.query),
                ("k_lin", &mut attn.key),
                ("v_lin", &mut attn.value),
                ("out_lin", &mut attn.output),
            ] {
                let path = format!("{name}.attention.{lin}");
                source.linear(&mut slot.weight, &mut slot.bias, &path, d, d, device)?;
            }
            block.self_attn = block.self_attn.load_record(attn);

            block.norm1 = source.layer_norm(block.norm1, &format!("{name}.sa_layer_norm"), d, device)?;
            source.linear(
                &mut block.ffn_linear1.weight, &mut block.ffn_linear1.bias,
                &format!("{name}.ffn.lin1"), d, d_ff, device,
            )?;
            source.linear(
                &mut block.ffn_linear2.weight, &mut block.ffn_linear2.bias,
                &format!("{name}.ffn.lin2"), d_ff, d, device,
            )?;
            block.norm2 = source.layer_norm(block.norm2, &format!("{name}.output_layer_norm"), d, device)?;
            layers.push(block);
        }
        encoder.layers = layers;

        tracing::info!(
            "Loaded pretrained encoder ({} layers, dim {}) from '{}'",
            config.num_layers, d, self.weights.display()
        );
        Ok(encoder)
    }
}

struct Checkpoint<'a> {
    tensors: SafeTensors<'a>,
    prefix:  &'static str,
}

impl Checkpoint<'_> {
    fn tensor<B: Backend, const D: usize>(
        &self,
        name:   &str,
        shape:  [usize; D],
        device: &B::Device,
    ) -> Result<Tensor<B, D>> {
        let full = format!("{}{name}", self.prefix);
        let view = self
            .tensors
            .tensor(&full)
            .map_err(|e| anyhow::anyhow!("Tensor '{full}' missing from checkpoint: {e}"))?;

        if view.shape() != shape.as_slice() {
            anyhow::bail!("Tensor '{full}' has shape {:?}, expected {:?}", view.shape(), shape);
        }
        let values: Vec<f32> = match view.dtype() {
            Dtype::F32 => view
                .data()
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect(),
            other => anyhow::bail!("Tensor '{full}' is {other:?}, only F32 is supported"),
        };
        Ok(Tensor::from_data(TensorData::new(values, shape), device))
    }

    fn linear<B: Backend>(
        &self,
        weight: &mut Param<Tensor<B, 2>>,
        bias:   &mut Option<Param<Tensor<B, 1>>>,
        name:   &str,
        d_in:   usize,
        d_out:  usize,
        device: &B::Device,
    ) -> Result<()> {
        let w = self.tensor::<B, 2>(&format!("{name}.weight"), [d_out, d_in], device)?;
        let b = self.tensor::<B, 1>(&format!("{name}.bias"), [d_out], device)?;
        *weight = Param::from_tensor(w.transpose());
        *bias   = Some(Param::from_tensor(b));
        Ok(())
    }

    fn layer_norm<B: Backend>(
        &self,
        norm:   LayerNorm<B>,
        name:   &str,
        d:      usize,
        device: &B::Device,
    ) -> Result<LayerNorm<B>> {
        let mut record = norm.clone().into_record();
        record.gamma = Param::from_tensor(self.tensor::<B, 1>(&format!("{name}.weight"), [d], device)?);
        record.beta  = Param::from_tensor(self.tensor::<B, 1>(&format!("{name}.bias"), [d], device)?);
        Ok(norm.load_record(record))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use burn::backend::NdArray;
    use safetensors::tensor::TensorView;
    use std::collections::HashMap;

    type TestBackend = NdArray;

    pub(crate) fn tiny_distilbert() -> DistilBertConfig {
        DistilBertConfig {
            vocab_size:              40,
            max_position_embeddings: 12,
            dim:                     8,
            n_layers:                1,
            n_heads:                 2,
            hidden_dim:              16,
            dropout:                 0.1,
            activation:              "gelu".to_string(),
        }
    }

    /// Deterministic values so each tensor can be recognised after loading.
    fn values(seed: usize, len: usize) -> Vec<f32> {
        (0..len).map(|i| (seed * 1000 + i) as f32 * 1e-4).collect()
    }

    fn shapes(cfg: &DistilBertConfig) -> Vec<(String, Vec<usize>)> {
        let (d, ff) = (cfg.dim, cfg.hidden_dim);
        let mut out = vec![
            ("embeddings.word_embeddings.weight".to_string(), vec![cfg.vocab_size, d]),
            ("embeddings.position_embeddings.weight".to_string(), vec![cfg.max_position_embeddings, d]),
            ("embeddings.LayerNorm.weight".to_string(), vec![d]),
            ("embeddings.LayerNorm.bias".to_string(), vec![d]),
        ];
        for i in 0..cfg.n_layers {
            let l = format!("transformer.layer.{i}");
            for lin in ["q_lin", "k_lin", "v_lin", "out_lin"] {
                out.push((format!("{l}.attention.{lin}.weight"), vec![d, d]));
                out.push((format!("{l}.attention.{lin}.bias"), vec![d]));
            }
            for norm in ["sa_layer_norm", "output_layer_norm"] {
                out.push((format!("{l}.{norm}.weight"), vec![d]));
                out.push((format!("{l}.{norm}.bias"), vec![d]));
            }
            out.push((format!("{l}.ffn.lin1.weight"), vec![ff, d]));
            out.push((format!("{l}.ffn.lin1.bias"), vec![ff]));
            out.push((format!("{l}.ffn.lin2.weight"), vec![d, ff]));
            out.push((format!("{l}.ffn.lin2.bias"), vec![d]));
        }
        out
    }

    /// Write config.json + model.safetensors the way the hub lays them out.
    pub(crate) fn write_checkpoint(dir: &Path, cfg: &DistilBertConfig, prefix: &str) {
        let config = serde_json::json!({
            "model_type": "distilbert",
            "vocab_size": cfg.vocab_size,
            "max_position_embeddings": cfg.max_position_embeddings,
            "dim": cfg.dim,
            "n_layers": cfg.n_layers,
            "n_heads": cfg.n_heads,
            "hidden_dim": cfg.hidden_dim,
            "dropout": cfg.dropout,
            "activation": cfg.activation,
        });
        fs::write(dir.join(HF_CONFIG_FILE), config.to_string()).unwrap();

        let entries = shapes(cfg);
        let buffers: Vec<Vec<u8>> = entries
            .iter()
            .enumerate()
            .map(|(seed, (_, shape))| {
                values(seed, shape.iter().product())
                    .iter()
                    .flat_map(|v| v.to_le_bytes())
                    .collect()
            })
            .collect();

        let mut tensors: HashMap<String, TensorView<'_>> = HashMap::new();
        for ((name, shape), bytes) in entries.iter().zip(&buffers) {
            let view = TensorView::new(Dtype::F32, shape.clone(), bytes).unwrap();
            tensors.insert(format!("{prefix}{name}"), view);
        }
        let bytes = safetensors::serialize(&tensors, &None).unwrap();
        fs::write(dir.join(SAFETENSORS_FILE), bytes).unwrap();
    }

    fn seed_of(cfg: &DistilBertConfig, name: &str) -> usize {
        shapes(cfg).iter().position(|(n, _)| n == name).unwrap()
    }

    fn to_vec<const D: usize>(t: Tensor<TestBackend, D>) -> Vec<f32> {
        t.into_data().to_vec::<f32>().unwrap()
    }

    #[test]
    fn test_weights_land_in_matching_modules() {
        let dir = tempfile::tempdir().unwrap();
        let hf  = tiny_distilbert();
        write_checkpoint(dir.path(), &hf, PREFIX);

        let files  = PretrainedFiles::in_dir(dir.path()).unwrap();
        let config = files.load_config().unwrap().model_config(4);
        assert_eq!(config.max_seq_len, 12);
        assert_eq!(config.d_ff, 16);

        let encoder = files
            .load_encoder::<TestBackend>(&config, &Default::default())
            .unwrap();

        let words = seed_of(&hf, "embeddings.word_embeddings.weight");
        assert_eq!(to_vec(encoder.token_embedding.weight.val()), values(words, 40 * 8));

        let gamma = seed_of(&hf, "transformer.layer.0.sa_layer_norm.weight");
        let norm1 = encoder.layers[0].norm1.clone().into_record();
        assert_eq!(to_vec(norm1.gamma.val()), values(gamma, 8));

        // [out, in] on disk → [in, out] in burn
        let lin1   = seed_of(&hf, "transformer.layer.0.ffn.lin1.weight");
        let stored = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(values(lin1, 16 * 8), [16, 8]),
            &Default::default(),
        );
        let loaded = encoder.layers[0].ffn_linear1.weight.val();
        assert_eq!(loaded.dims(), [8, 16]);
        assert_eq!(to_vec(loaded), to_vec(stored.transpose()));

        let q_bias = seed_of(&hf, "transformer.layer.0.attention.q_lin.bias");
        let attn   = encoder.layers[0].self_attn.clone().into_record();
        let bias   = attn.query.bias.unwrap();
        assert_eq!(to_vec(bias.val()), values(q_bias, 8));
    }

    #[test]
    fn test_checkpoint_without_prefix_loads() {
        let dir = tempfile::tempdir().unwrap();
        let hf  = tiny_distilbert();
        write_checkpoint(dir.path(), &hf, "");

        let files   = PretrainedFiles::in_dir(dir.path()).unwrap();
        let config  = hf.model_config(4);
        let encoder = files.load_encoder::<TestBackend>(&config, &Default::default()).unwrap();

        let ids    = Tensor::<TestBackend, 2, Int>::from_ints([[2, 9, 3, 0]], &Default::default());
        let mask   = Tensor::<TestBackend, 2, Int>::from_ints([[1, 1, 1, 0]], &Default::default());
        let hidden = encoder.forward(ids, mask);
        assert_eq!(hidden.dims(), [1, 4, 8]);
    }

    #[test]
    fn test_shape_mismatch_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_checkpoint(dir.path(), &tiny_distilbert(), PREFIX);

        let files = PretrainedFiles::in_dir(dir.path()).unwrap();
        let wider = WordClassifierModelConfig::new(40, 12, 16, 2, 1, 16, 4);
        let err   = files.load_encoder::<TestBackend>(&wider, &Default::default()).unwrap_err();
        assert!(err.to_string().contains("word_embeddings"), "{err}");
    }

    #[test]
    fn test_in_dir_needs_both_files() {
        let dir = tempfile::tempdir().unwrap();
        assert!(PretrainedFiles::in_dir(dir.path()).is_none());
        fs::write(dir.path().join(HF_CONFIG_FILE), "{}").unwrap();
        assert!(PretrainedFiles::in_dir(dir.path()).is_none());
    }

    #[test]
    fn test_non_distilbert_config_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(HF_CONFIG_FILE), r#"{"hidden_size": 768}"#).unwrap();
        fs::write(dir.path().join(SAFETENSORS_FILE), b"").unwrap();
        let files = PretrainedFiles::in_dir(dir.path()).unwrap();
        assert!(files.load_config().is_err());
    }
}
