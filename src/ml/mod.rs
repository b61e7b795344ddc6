// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// The model, its training loop and the inference engine.
//
//   backend.rs    — CPU (ndarray) / GPU (wgpu) selection
//
//   model.rs      — transformer encoder with a DistilBERT-style
//                   sequence classification head:
//                   • token + learned position embeddings
//                   • multi-head self-attention with padding mask
//                   • GELU feed-forward, residuals, layer norm
//                   • [CLS] pooling → pre_classifier → classifier
//
//   trainer.rs    — Adam with linear decay, per-epoch evaluation,
//                   checkpointing and best-epoch tracking
//
//   inferencer.rs — loads an exported artifact and returns
//                   softmax probabilities per word
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Sanh et al. (2019) DistilBERT

/// Runtime backend selection
pub mod backend;

/// Transformer encoder word classifier
pub mod model;

/// Training loop with evaluation and checkpointing
pub mod trainer;

/// Inference engine over exported artifacts
pub mod inferencer;
