// ============================================================
// Layer 4 — Word Batcher
// ============================================================
// Implements Burn's Batcher trait to stack WordSamples into
// tensors for one forward pass.
//
// How batching works here:
//   Input:  Vec of N WordSamples, each padded to length S
//   Output: WordBatch with
//             input_ids      [N, S]
//             attention_mask [N, S]
//             labels         [N]
//
//   All token rows are flattened into one Vec, then reshaped:
//   [w1_t1, ..., w1_tS, w2_t1, ..., wN_tS] → [N, S]
//
// The encoder pads every word to the same length, so no
// dynamic padding is needed at this stage.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::WordSample;
use crate::data::encoder::EncodedWord;

/// A batch of words ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct WordBatch<B: Backend> {
    /// Token id rows — shape: [batch_size, seq_len]
    pub input_ids: Tensor<B, 2, Int>,

    /// 1 = real token, 0 = padding — shape: [batch_size, seq_len]
    pub attention_mask: Tensor<B, 2, Int>,

    /// Class id per word — shape: [batch_size]
    pub labels: Tensor<B, 1, Int>,
}

#[derive(Clone, Debug)]
pub struct WordBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> WordBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    /// Stack unlabelled words for inference.
    /// Returns (input_ids, attention_mask), both [batch, seq_len].
    pub fn inputs(&self, words: &[EncodedWord]) -> (Tensor<B, 2, Int>, Tensor<B, 2, Int>) {
        let ids  = words.iter().map(|w| w.input_ids.as_slice());
        let mask = words.iter().map(|w| w.attention_mask.as_slice());
        (self.stack(ids), self.stack(mask))
    }

    /// Flatten equal-length rows and reshape to [rows, seq_len].
    fn stack<'a>(&self, rows: impl ExactSizeIterator<Item = &'a [u32]> + Clone) -> Tensor<B, 2, Int> {
        let batch_size = rows.len();
        let seq_len    = rows.clone().next().map_or(0, |r| r.len());

        let flat: Vec<i32> = rows
            .flat_map(|r| r.iter().map(|&x| x as i32))
            .collect();

        Tensor::<B, 1, Int>::from_ints(flat.as_slice(), &self.device)
            .reshape([batch_size, seq_len])
    }
}

// ─── Burn Batcher Trait Implementation ────────────────────────────────────────
impl<B: Backend> Batcher<WordSample, WordBatch<B>> for WordBatcher<B> {
    fn batch(&self, items: Vec<WordSample>) -> WordBatch<B> {
        let input_ids      = self.stack(items.iter().map(|s| s.input_ids.as_slice()));
        let attention_mask = self.stack(items.iter().map(|s| s.attention_mask.as_slice()));

        let labels: Vec<i32> = items.iter().map(|s| s.label as i32).collect();
        let labels = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device);

        WordBatch { input_ids, attention_mask, labels }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn sample(id: u32, label: usize) -> WordSample {
        WordSample {
            input_ids:      vec![2, id, 3, 0, 0],
            attention_mask: vec![1, 1, 1, 0, 0],
            label,
        }
    }

    #[test]
    fn test_batch_shapes() {
        let batcher = WordBatcher::<TestBackend>::new(Default::default());
        let batch   = batcher.batch(vec![sample(7, 0), sample(8, 2), sample(9, 3)]);

        assert_eq!(batch.input_ids.dims(), [3, 5]);
        assert_eq!(batch.attention_mask.dims(), [3, 5]);
        assert_eq!(batch.labels.dims(), [3]);
    }

    #[test]
    fn test_batch_preserves_row_order() {
        let batcher = WordBatcher::<TestBackend>::new(Default::default());
        let batch   = batcher.batch(vec![sample(7, 1), sample(8, 2)]);

        let ids: Vec<i64> = batch
            .input_ids
            .into_data()
            .convert::<i64>()
            .to_vec()
            .unwrap();
        assert_eq!(ids, vec![2, 7, 3, 0, 0, 2, 8, 3, 0, 0]);

        let labels: Vec<i64> = batch.labels.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(labels, vec![1, 2]);
    }

    #[test]
    fn test_inputs_for_inference() {
        let batcher = WordBatcher::<TestBackend>::new(Default::default());
        let words   = vec![
            EncodedWord { input_ids: vec![2, 5, 3], attention_mask: vec![1, 1, 1] },
            EncodedWord { input_ids: vec![2, 1, 3], attention_mask: vec![1, 1, 1] },
        ];
        let (ids, mask) = batcher.inputs(&words);
        assert_eq!(ids.dims(), [2, 3]);
        assert_eq!(mask.dims(), [2, 3]);
    }
}
