use burn::{
    nn::{
        attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        loss::CrossEntropyLossConfig,
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::{gelu, relu},
};

/// DistilBERT's layer norm epsilon, kept so pretrained weights behave as trained.
pub const LAYER_NORM_EPS: f64 = 1e-12;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug, PartialEq)]
pub struct WordClassifierModelConfig {
    pub vocab_size:  usize,
    pub max_seq_len: usize,
    pub d_model:     usize,
    pub num_heads:   usize,
    pub num_layers:  usize,
    pub d_ff:        usize,
    pub num_labels:  usize,
    #[config(default = 0.1)]
    pub dropout:     f64,
}

impl WordClassifierModelConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> WordClassifierModel<B> {
        let encoder = self.init_encoder(device);
        let pre_classifier = LinearConfig::new(self.d_model, self.d_model).init(device);
        let classifier     = LinearConfig::new(self.d_model, self.num_labels).init(device);
        let dropout        = DropoutConfig::new(self.dropout).init();
        WordClassifierModel { encoder, pre_classifier, classifier, dropout }
    }

    pub fn init_encoder<B: Backend>(&self, device: &B::Device) -> TransformerEncoder<B> {
        let token_embedding    = EmbeddingConfig::new(self.vocab_size, self.d_model).init(device);
        let position_embedding = EmbeddingConfig::new(self.max_seq_len, self.d_model).init(device);
        let embedding_norm     = self.layer_norm(device);
        let layers: Vec<EncoderBlock<B>> = (0..self.num_layers)
            .map(|_| self.build_encoder_block(device))
            .collect();
        let dropout = DropoutConfig::new(self.dropout).init();
        TransformerEncoder {
            token_embedding, position_embedding, embedding_norm, layers, dropout,
            max_seq_len: self.max_seq_len,
        }
    }

    fn layer_norm<B: Backend>(&self, device: &B::Device) -> LayerNorm<B> {
        LayerNormConfig::new(self.d_model).with_epsilon(LAYER_NORM_EPS).init(device)
    }

    fn build_encoder_block<B: Backend>(&self, device: &B::Device) -> EncoderBlock<B> {
        let self_attn   = MultiHeadAttentionConfig::new(self.d_model, self.num_heads)
            .with_dropout(self.dropout)
            .init(device);
        let ffn_linear1 = LinearConfig::new(self.d_model, self.d_ff).init(device);
        let ffn_linear2 = LinearConfig::new(self.d_ff, self.d_model).init(device);
        let norm1   = self.layer_norm(device);
        let norm2   = self.layer_norm(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        EncoderBlock { self_attn, ffn_linear1, ffn_linear2, norm1, norm2, dropout }
    }

    /// Same architecture with a different number of output classes.
    pub fn with_labels(&self, num_labels: usize) -> Self {
        let mut cfg = self.clone();
        cfg.num_labels = num_labels;
        cfg
    }

    /// Reject shapes the encoder cannot run.
    pub fn validate(&self) -> Result<(), String> {
        if self.num_heads == 0 || self.d_model % self.num_heads != 0 {
            return Err(format!(
                "d_model ({}) must be divisible by num_heads ({})",
                self.d_model, self.num_heads
            ));
        }
        if self.num_labels == 0 {
            return Err("num_labels must be positive".to_string());
        }
        if self.vocab_size == 0 || self.max_seq_len == 0 {
            return Err("vocab_size and max_seq_len must be positive".to_string());
        }
        Ok(())
    }
}

/// Post-LN block laid out like a DistilBERT `TransformerBlock`:
/// attention → sa_layer_norm, ffn (lin1, GELU, lin2) → output_layer_norm.
#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    /// sa_layer_norm
    pub norm1:       LayerNorm<B>,
    /// output_layer_norm
    pub norm2:       LayerNorm<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> EncoderBlock<B> {
    /// mask_pad: [batch, seq_len], true where the token is padding.
    pub fn forward(&self, x: Tensor<B, 3>, mask_pad: Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        let input       = MhaInput::self_attn(x.clone()).mask_pad(mask_pad);
        let attn_output = self.self_attn.forward(input).context;
        let x = self.norm1.forward(x + self.dropout.forward(attn_output));
        let ffn_out = self.ffn_linear2.forward(gelu(self.ffn_linear1.forward(x.clone())));
        self.norm2.forward(x + self.dropout.forward(ffn_out))
    }
}

#[derive(Module, Debug)]
pub struct TransformerEncoder<B: Backend> {
    pub token_embedding:    Embedding<B>,
    pub position_embedding: Embedding<B>,
    /// LayerNorm over token + position embeddings
    pub embedding_norm:     LayerNorm<B>,
    pub layers:             Vec<EncoderBlock<B>>,
    pub dropout:            Dropout,
    pub max_seq_len:        usize,
}

impl<B: Backend> TransformerEncoder<B> {
    /// input_ids, attention_mask: [batch, seq_len] → hidden: [batch, seq_len, d_model]
    pub fn forward(&self, input_ids: Tensor<B, 2, Int>, attention_mask: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let [batch_size, seq_len] = input_ids.dims();

        let tok_emb = self.token_embedding.forward(input_ids);

        // Self-attention is permutation-invariant, so position must be injected explicitly.
        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &tok_emb.device())
            .unsqueeze::<2>()
            .expand([batch_size, seq_len]);
        let pos_emb = self.position_embedding.forward(positions);

        let mask_pad = attention_mask.equal_elem(0);

        let mut x = self.dropout.forward(self.embedding_norm.forward(tok_emb + pos_emb));
        for layer in &self.layers {
            x = layer.forward(x, mask_pad.clone());
        }
        x
    }
}

/// Encoder plus a DistilBERT-style sequence classification head.
#[derive(Module, Debug)]
pub struct WordClassifierModel<B: Backend> {
    pub encoder:        TransformerEncoder<B>,
    pub pre_classifier: Linear<B>,
    pub classifier:     Linear<B>,
    pub dropout:        Dropout,
}

impl<B: Backend> WordClassifierModel<B> {
    /// input_ids, attention_mask: [batch, seq_len] → logits: [batch, num_labels]
    pub fn forward(&self, input_ids: Tensor<B, 2, Int>, attention_mask: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        let hidden = self.encoder.forward(input_ids, attention_mask);
        let [batch_size, _, d_model] = hidden.dims();

        // Pool on the first ([CLS]) token.
        let pooled = hidden
            .slice([0..batch_size, 0..1, 0..d_model])
            .reshape([batch_size, d_model]);

        let x = relu(self.pre_classifier.forward(pooled));
        self.classifier.forward(self.dropout.forward(x))
    }

    /// Returns (mean cross-entropy loss, logits).
    pub fn forward_classification(
        &self,
        input_ids:      Tensor<B, 2, Int>,
        attention_mask: Tensor<B, 2, Int>,
        labels:         Tensor<B, 1, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let logits = self.forward(input_ids, attention_mask);
        let loss   = CrossEntropyLossConfig::new()
            .init(&logits.device())
            .forward(logits.clone(), labels);
        (loss, logits)
    }
}
