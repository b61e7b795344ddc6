use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

/// One tokenised and padded training word.
/// Sequence format: [CLS] word pieces [SEP] [PAD]...
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordSample {
    pub input_ids:      Vec<u32>,
    pub attention_mask: Vec<u32>,
    pub label:          usize,
}

pub struct WordDataset {
    samples: Vec<WordSample>,
}

impl WordDataset {
    pub fn new(samples: Vec<WordSample>) -> Self { Self { samples } }

    pub fn sample_count(&self) -> usize { self.samples.len() }

    /// Number of samples per class id, indexed by id.
    pub fn class_counts(&self, num_labels: usize) -> Vec<usize> {
        let mut counts = vec![0; num_labels];
        for s in &self.samples {
            if let Some(c) = counts.get_mut(s.label) {
                *c += 1;
            }
        }
        counts
    }
}

impl Dataset<WordSample> for WordDataset {
    fn get(&self, index: usize) -> Option<WordSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
