// ============================================================
// Layer 2 — PromptClassifier
// ============================================================
// Groups the words of a prompt by category:
//
//   Step 1: Strip the marker, split into words   (Layer 4 - text)
//   Step 2: Drop exception words                  (Layer 4 - text)
//   Step 3: Suffix heuristics, cached per word    (Layer 4 - text)
//   Step 4: Remaining words → model, 6 at a time  (WordPredictor)
//
// Model answers are cached too. A word the model fails on stays
// unclassified for this prompt and is retried next time, since
// failures are never cached.

use std::collections::HashMap;

use crate::data::text::{classify_by_suffix, is_exception_word, prepare_prompt, split_words};
use crate::domain::{
    prediction::{CategorizedWords, PredictionResult, WordCategory},
    traits::WordPredictor,
};

/// Words sent to the model per call.
pub const MODEL_BATCH_SIZE: usize = 6;

pub struct PromptClassifier<P: WordPredictor> {
    predictor: P,
    cache:     HashMap<String, WordCategory>,
}

impl<P: WordPredictor> PromptClassifier<P> {
    pub fn new(predictor: P) -> Self {
        Self { predictor, cache: HashMap::new() }
    }

    pub fn classify(&mut self, prompt: &str) -> CategorizedWords {
        let (text, mut categories) = prepare_prompt(prompt);

        let mut ambiguous = Vec::new();
        for word in split_words(&text) {
            if is_exception_word(word) {
                continue;
            }
            match self.classify_with_heuristics(word).category {
                Some(category) => categories.push(category, word),
                None           => ambiguous.push(word.to_string()),
            }
        }

        for batch in ambiguous.chunks(MODEL_BATCH_SIZE) {
            let predictions = self.classify_with_model(batch);
            for (word, prediction) in batch.iter().zip(predictions) {
                if let Some(category) = prediction.category {
                    categories.push(category, word.as_str());
                }
            }
        }

        tracing::debug!(
            "Classified prompt: {} subject, {} action, {} object, {} descriptor",
            categories.subject.len(),
            categories.action.len(),
            categories.object.len(),
            categories.descriptor.len()
        );
        categories
    }

    /// Cached result, or the suffix rules. Hits are cached.
    pub fn classify_with_heuristics(&mut self, word: &str) -> WordCategory {
        if let Some(hit) = self.cache.get(word) {
            return hit.clone();
        }
        let result = classify_by_suffix(word);
        if result.is_classified() {
            self.cache.insert(word.to_string(), result.clone());
        }
        result
    }

    /// One result per word, in order. Cached words skip the model.
    ///
    /// The uncached words go to the model as one batch. If that call
    /// fails, each word is retried on its own; a word that still fails
    /// comes back unclassified.
    pub fn classify_with_model(&mut self, words: &[String]) -> Vec<WordCategory> {
        let pending: Vec<String> = words
            .iter()
            .filter(|w| !self.cache.contains_key(w.as_str()))
            .cloned()
            .collect();

        if !pending.is_empty() {
            match self.predictor.predict_batch(&pending) {
                Ok(results) => {
                    for result in results {
                        self.remember(result);
                    }
                }
                Err(e) => {
                    tracing::warn!("Batch prediction failed, retrying word by word: {:#}", e);
                    for word in &pending {
                        match self.predictor.predict(word) {
                            Ok(result) => self.remember(result),
                            Err(e)     => tracing::error!("Prediction error for '{}': {:#}", word, e),
                        }
                    }
                }
            }
        }

        words
            .iter()
            .map(|w| self.cache.get(w.as_str()).cloned().unwrap_or_else(WordCategory::unclassified))
            .collect()
    }

    fn remember(&mut self, result: PredictionResult) {
        let Some(category) = result.category() else {
            tracing::warn!("Model returned unknown label '{}' for '{}'", result.label, result.word);
            return;
        };
        self.cache.insert(
            result.word,
            WordCategory { category: Some(category), confidence: result.confidence },
        );
    }
}
