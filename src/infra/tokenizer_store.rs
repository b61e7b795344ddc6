// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Finds, builds and saves the tokenizer.
//
// Resolution order when training starts:
//   1. <base model dir>/tokenizer.json   (a pretrained model on disk)
//   2. the hub model id via hf-hub        (e.g. distilbert-base-cased)
//   3. a word-level tokenizer built from the training words
//
// Option 3 writes the tokenizer JSON directly in the Hugging Face
// format rather than going through the trainer API, since
// train_from_files in tokenizers 0.15 requires Trainer::Model to
// equal ModelWrapper. Vocabulary keys are produced by running each
// word through the same normalizer and pre-tokenizer the JSON
// declares, so every training word encodes to a known id.
//
// Whatever was resolved is saved with the trained weights, so
// inference always uses the vocabulary the model was trained on.

use anyhow::{Context, Result};
use std::{collections::HashSet, fs, path::{Path, PathBuf}};
use tokenizers::{
    normalizers::BertNormalizer,
    pre_tokenizers::whitespace::WhitespaceSplit,
    NormalizedString, Normalizer, OffsetReferential, OffsetType, PreTokenizedString, PreTokenizer,
    Tokenizer,
};

pub const TOKENIZER_FILE: &str = "tokenizer.json";
pub const TOKENIZER_CONFIG_FILE: &str = "tokenizer_config.json";
pub const SPECIAL_TOKENS_FILE: &str = "special_tokens_map.json";

// Special ids of the word-level fallback vocabulary; words follow from 5
const PAD_ID:  u32 = 0;
const UNK_ID:  u32 = 1;
const CLS_ID:  u32 = 2;
const SEP_ID:  u32 = 3;
const MASK_ID: u32 = 4;

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    /// Resolve the tokenizer for a training run.
    pub fn resolve(
        &self,
        base_model_dir: Option<&Path>,
        hub_model_id:   Option<&str>,
        words:          &[String],
    ) -> Result<Tokenizer> {
        if let Some(dir) = base_model_dir {
            let path = dir.join(TOKENIZER_FILE);
            if path.exists() {
                tracing::info!("Loading pretrained tokenizer from '{}'", path.display());
                return load_file(&path);
            }
        }

        if let Some(model_id) = hub_model_id {
            tracing::info!("Fetching tokenizer for '{}' from the hub", model_id);
            return fetch_from_hub(model_id);
        }

        tracing::info!("Building word-level tokenizer from {} training words", words.len());
        self.build_and_save(words)
    }

    /// Load the tokenizer saved in this store's directory.
    pub fn load(&self) -> Result<Tokenizer> {
        load_file(&self.dir.join(TOKENIZER_FILE))
    }

    /// Build a word-level vocabulary from the training words and
    /// write a valid tokenizer JSON to `<dir>/tokenizer.json`.
    pub fn build_and_save(&self, words: &[String]) -> Result<Tokenizer> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        // ── Step 1: Vocabulary ────────────────────────────────────────────────
        // Sorting keeps ids stable across runs on the same data.
        let mut seen   = HashSet::new();
        let mut pieces = Vec::new();
        for word in words {
            for piece in word_pieces(word)? {
                if seen.insert(piece.clone()) {
                    pieces.push(piece);
                }
            }
        }
        pieces.sort();

        let mut vocab = serde_json::json!({
            "[PAD]":  PAD_ID,
            "[UNK]":  UNK_ID,
            "[CLS]":  CLS_ID,
            "[SEP]":  SEP_ID,
            "[MASK]": MASK_ID,
        });

        let mut next_id = MASK_ID + 1;
        for piece in &pieces {
            if vocab.get(piece).is_none() {
                vocab[piece] = serde_json::json!(next_id);
                next_id += 1;
            }
        }

        // ── Step 2: Tokenizer JSON in Hugging Face format ────────────────────
        let special = |id: u32, content: &str| serde_json::json!({
            "id": id, "content": content, "single_word": false, "lstrip": false,
            "rstrip": false, "normalized": false, "special": true
        });

        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [
                special(PAD_ID, "[PAD]"),
                special(UNK_ID, "[UNK]"),
                special(CLS_ID, "[CLS]"),
                special(SEP_ID, "[SEP]"),
                special(MASK_ID, "[MASK]"),
            ],
            // Must agree with normalizer() and word_pieces()
            "normalizer": {
                "type": "BertNormalizer",
                "clean_text": true,
                "handle_chinese_chars": false,
                "strip_accents": false,
                "lowercase": true
            },
            "pre_tokenizer": {
                "type": "WhitespaceSplit"
            },
            "post_processor": {
                "type": "TemplateProcessing",
                "single": [
                    {"SpecialToken": {"id": "[CLS]", "type_id": 0}},
                    {"Sequence": {"id": "A", "type_id": 0}},
                    {"SpecialToken": {"id": "[SEP]", "type_id": 0}}
                ],
                "pair": [
                    {"SpecialToken": {"id": "[CLS]", "type_id": 0}},
                    {"Sequence": {"id": "A", "type_id": 0}},
                    {"SpecialToken": {"id": "[SEP]", "type_id": 0}},
                    {"Sequence": {"id": "B", "type_id": 1}},
                    {"SpecialToken": {"id": "[SEP]", "type_id": 1}}
                ],
                "special_tokens": {
                    "[CLS]": {"id": "[CLS]", "ids": [CLS_ID], "tokens": ["[CLS]"]},
                    "[SEP]": {"id": "[SEP]", "ids": [SEP_ID], "tokens": ["[SEP]"]}
                }
            },
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": "[UNK]"
            }
        });

        let tok_path = self.dir.join(TOKENIZER_FILE);
        fs::write(&tok_path, serde_json::to_string_pretty(&tokenizer_json)?)
            .with_context(|| format!("Cannot write '{}'", tok_path.display()))?;

        tracing::info!(
            "Tokenizer built with {} entries, saved to '{}'",
            pieces.len() + 5,
            tok_path.display()
        );

        load_file(&tok_path)
    }

    /// Save the tokenizer and its side files the way a pretrained
    /// model directory lays them out.
    pub fn save_pretrained(&self, tokenizer: &Tokenizer, max_length: usize) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        let tok_path = self.dir.join(TOKENIZER_FILE);
        tokenizer
            .save(&tok_path, true)
            .map_err(|e| anyhow::anyhow!("Cannot save tokenizer to '{}': {e}", tok_path.display()))?;

        let mut special = serde_json::Map::new();
        for (key, token) in [
            ("pad_token", "[PAD]"),
            ("unk_token", "[UNK]"),
            ("cls_token", "[CLS]"),
            ("sep_token", "[SEP]"),
            ("mask_token", "[MASK]"),
        ] {
            if tokenizer.token_to_id(token).is_some() {
                special.insert(key.to_string(), serde_json::json!(token));
            }
        }

        let mut config = special.clone();
        config.insert("model_max_length".to_string(), serde_json::json!(max_length));
        config.insert("tokenizer_class".to_string(), serde_json::json!("PreTrainedTokenizerFast"));

        write_json(&self.dir.join(SPECIAL_TOKENS_FILE), &serde_json::Value::Object(special))?;
        write_json(&self.dir.join(TOKENIZER_CONFIG_FILE), &serde_json::Value::Object(config))?;

        tracing::debug!("Saved tokenizer files to '{}'", self.dir.display());
        Ok(())
    }
}

/// Embedding table size needed for this tokenizer: highest id + 1.
/// Hub vocabularies may have added tokens past the model vocabulary,
/// so the entry count alone is not enough.
pub fn vocab_size(tokenizer: &Tokenizer) -> usize {
    tokenizer
        .get_vocab(true)
        .values()
        .max()
        .map_or(0, |&max| max as usize + 1)
}

/// Lower-cases, keeps accents and splits on whitespace only, so
/// words like "café", "well-known" and "don't" stay whole.
fn normalizer() -> BertNormalizer {
    BertNormalizer::new(true, false, Some(false), true)
}

/// Pieces the fallback tokenizer will look up for `word`.
fn word_pieces(word: &str) -> Result<Vec<String>> {
    let mut normalized = NormalizedString::from(word);
    normalizer()
        .normalize(&mut normalized)
        .map_err(|e| anyhow::anyhow!("Cannot normalize '{word}': {e}"))?;

    let mut pre = PreTokenizedString::from(normalized);
    WhitespaceSplit
        .pre_tokenize(&mut pre)
        .map_err(|e| anyhow::anyhow!("Cannot pre-tokenize '{word}': {e}"))?;

    Ok(pre
        .get_splits(OffsetReferential::Normalized, OffsetType::Byte)
        .into_iter()
        .map(|(piece, _, _)| piece.to_string())
        .filter(|piece| !piece.is_empty())
        .collect())
}

fn load_file(path: &Path) -> Result<Tokenizer> {
    Tokenizer::from_file(path)
        .map_err(|e| anyhow::anyhow!("Cannot load tokenizer from '{}': {}", path.display(), e))
}

fn fetch_from_hub(model_id: &str) -> Result<Tokenizer> {
    let api  = hf_hub::api::sync::Api::new().context("Failed to create hub API client")?;
    let path = api
        .model(model_id.to_string())
        .get(TOKENIZER_FILE)
        .with_context(|| format!("Failed to fetch tokenizer for '{model_id}' from the hub"))?;
    load_file(&path)
}

fn write_json(path: &Path, value: &serde_json::Value) -> Result<()> {
    fs::write(path, serde_json::to_string_pretty(value)?)
        .with_context(|| format!("Cannot write '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words() -> Vec<String> {
        ["run", "Teacher", "dog", "run"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_build_adds_special_tokens_and_lowercases() {
        let dir = tempfile::tempdir().unwrap();
        let tok = TokenizerStore::new(dir.path()).build_and_save(&words()).unwrap();

        assert_eq!(tok.token_to_id("[CLS]"), Some(CLS_ID));
        assert_eq!(tok.token_to_id("[PAD]"), Some(PAD_ID));
        assert!(tok.token_to_id("teacher").is_some());
        assert!(tok.token_to_id("Teacher").is_none());

        let enc = tok.encode("Teacher", true).unwrap();
        assert_eq!(enc.get_ids().len(), 3);
        assert_eq!(enc.get_ids()[0], CLS_ID);
        assert_eq!(enc.get_ids()[2], SEP_ID);
    }

    #[test]
    fn test_vocab_size_covers_highest_id() {
        let dir = tempfile::tempdir().unwrap();
        let tok = TokenizerStore::new(dir.path()).build_and_save(&words()).unwrap();
        // 5 special ids, then 3 distinct words
        assert_eq!(vocab_size(&tok), 8);
        assert_eq!(tok.get_vocab(true).len(), 8);
    }

    #[test]
    fn test_punctuated_and_accented_words_are_in_vocabulary() {
        let dir   = tempfile::tempdir().unwrap();
        let words: Vec<String> = ["Café", "well-known", "don't", "dog"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let tok = TokenizerStore::new(dir.path()).build_and_save(&words).unwrap();

        let mut ids = HashSet::new();
        for word in &words {
            let enc = tok.encode(word.as_str(), true).unwrap();
            let got = enc.get_ids();
            assert_eq!(got.len(), 3, "{word} split into {:?}", enc.get_tokens());
            assert_eq!((got[0], got[2]), (CLS_ID, SEP_ID));
            assert_ne!(got[1], UNK_ID, "{word} encoded as [UNK]");
            ids.insert(got[1]);
        }
        assert_eq!(ids.len(), 4);
        assert!(tok.token_to_id("café").is_some());
        assert!(tok.token_to_id("cafe").is_none());
    }

    #[test]
    fn test_resolve_prefers_base_model_dir() {
        let base  = tempfile::tempdir().unwrap();
        let built = TokenizerStore::new(base.path()).build_and_save(&["zebra".to_string()]).unwrap();
        assert!(built.token_to_id("zebra").is_some());

        let out = tempfile::tempdir().unwrap();
        let tok = TokenizerStore::new(out.path())
            .resolve(Some(base.path()), None, &words())
            .unwrap();
        assert!(tok.token_to_id("zebra").is_some());
        assert!(tok.token_to_id("dog").is_none());
    }

    #[test]
    fn test_resolve_builds_when_nothing_else_is_available() {
        let out = tempfile::tempdir().unwrap();
        let tok = TokenizerStore::new(out.path()).resolve(None, None, &words()).unwrap();
        assert!(tok.token_to_id("dog").is_some());
        assert!(out.path().join(TOKENIZER_FILE).exists());
    }

    #[test]
    fn test_save_pretrained_writes_side_files() {
        let dir   = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path());
        let tok   = store.build_and_save(&words()).unwrap();

        let out = tempfile::tempdir().unwrap();
        TokenizerStore::new(out.path()).save_pretrained(&tok, 16).unwrap();

        let config: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(out.path().join(TOKENIZER_CONFIG_FILE)).unwrap(),
        ).unwrap();
        assert_eq!(config["model_max_length"], 16);
        assert_eq!(config["cls_token"], "[CLS]");
        assert!(out.path().join(SPECIAL_TOKENS_FILE).exists());
        assert!(TokenizerStore::new(out.path()).load().is_ok());
    }
}
