// ============================================================
// Layer 4 — Word Encoder
// ============================================================
// Turns words into fixed-length token sequences.
//
// Every word becomes exactly `max_length` token ids:
//
//   "deploying" → [CLS] deploy ##ing [SEP] [PAD] [PAD] ...
//   mask        →   1     1     1     1     0     0   ...
//
// Truncation and padding are configured on the tokenizer
// itself, so the post-processor still places [SEP] correctly
// when a long word is cut.

use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

use crate::data::dataset::WordSample;
use crate::error::ClassifierError;

/// Token ids and attention mask for a single word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedWord {
    pub input_ids:      Vec<u32>,
    pub attention_mask: Vec<u32>,
}

impl EncodedWord {
    pub fn into_sample(self, label: usize) -> WordSample {
        WordSample {
            input_ids:      self.input_ids,
            attention_mask: self.attention_mask,
            label,
        }
    }
}

/// Pad tokens tried in order when the tokenizer does not declare one.
const PAD_CANDIDATES: [&str; 3] = ["[PAD]", "<pad>", "<PAD>"];

#[derive(Clone)]
pub struct WordEncoder {
    tokenizer:  Tokenizer,
    max_length: usize,
}

impl WordEncoder {
    /// Take ownership of a tokenizer and force truncation and
    /// fixed-length padding to `max_length`.
    pub fn new(mut tokenizer: Tokenizer, max_length: usize) -> Result<Self, ClassifierError> {
        if max_length == 0 {
            return Err(ClassifierError::Tokenization("max_length must be positive".into()));
        }

        let (pad_token, pad_id) = PAD_CANDIDATES
            .iter()
            .find_map(|t| tokenizer.token_to_id(t).map(|id| (t.to_string(), id)))
            .unwrap_or_else(|| ("[PAD]".to_string(), 0));

        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length,
                ..Default::default()
            }))
            .map_err(|e| ClassifierError::Tokenization(e.to_string()))?;

        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::Fixed(max_length),
            pad_id,
            pad_token,
            ..Default::default()
        }));

        Ok(Self { tokenizer, max_length })
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn encode(&self, word: &str) -> Result<EncodedWord, ClassifierError> {
        let enc = self
            .tokenizer
            .encode(word, true)
            .map_err(|e| ClassifierError::Tokenization(format!("'{word}': {e}")))?;

        let input_ids      = enc.get_ids().to_vec();
        let attention_mask = enc.get_attention_mask().to_vec();

        if input_ids.len() != self.max_length {
            return Err(ClassifierError::Tokenization(format!(
                "'{word}' encoded to {} tokens, expected {}",
                input_ids.len(),
                self.max_length
            )));
        }

        Ok(EncodedWord { input_ids, attention_mask })
    }

    pub fn encode_all<S: AsRef<str>>(&self, words: &[S]) -> Result<Vec<EncodedWord>, ClassifierError> {
        words.iter().map(|w| self.encode(w.as_ref())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::tokenizer_store::TokenizerStore;

    fn encoder(max_length: usize) -> (tempfile::TempDir, WordEncoder) {
        let dir   = tempfile::tempdir().unwrap();
        let words = vec!["run".to_string(), "teacher".to_string(), "dog".to_string()];
        let tok   = TokenizerStore::new(dir.path()).build_and_save(&words).unwrap();
        (dir, WordEncoder::new(tok, max_length).unwrap())
    }

    #[test]
    fn test_word_is_padded_to_max_length() {
        let (_dir, enc) = encoder(8);
        let out = enc.encode("run").unwrap();

        assert_eq!(out.input_ids.len(), 8);
        assert_eq!(out.attention_mask, vec![1, 1, 1, 0, 0, 0, 0, 0]);
        assert_eq!(out.input_ids[0], 2);
        assert_eq!(out.input_ids[2], 3);
        assert_eq!(out.input_ids[3], 0);
    }

    #[test]
    fn test_long_input_is_truncated() {
        let (_dir, enc) = encoder(4);
        let out = enc.encode("run teacher dog run teacher").unwrap();

        assert_eq!(out.input_ids.len(), 4);
        assert_eq!(out.attention_mask, vec![1, 1, 1, 1]);
        assert_eq!(out.input_ids[3], 3);
    }

    #[test]
    fn test_unknown_word_maps_to_unk() {
        let (_dir, enc) = encoder(4);
        let out = enc.encode("zebra").unwrap();
        assert_eq!(out.input_ids[1], 1);
    }

    #[test]
    fn test_zero_max_length_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let tok = TokenizerStore::new(dir.path()).build_and_save(&["run".to_string()]).unwrap();
        assert!(WordEncoder::new(tok, 0).is_err());
    }
}
