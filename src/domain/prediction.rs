// ============================================================
// Layer 3 — Prediction Results
// ============================================================

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::labels::{Category, LabelMap};

/// Output of one inference call for one word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub word:              String,
    pub label:             String,
    pub confidence:        f32,
    pub all_probabilities: BTreeMap<String, f32>,
}

impl PredictionResult {
    /// Build a result from one softmax row.
    /// Returns None if the row is empty or the winning id has no label.
    pub fn from_probabilities(word: &str, probs: &[f32], labels: &LabelMap) -> Option<Self> {
        let (best_id, confidence) = probs
            .iter()
            .copied()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(&b.1))?;

        let label = labels.label_of(best_id)?.to_string();
        let all_probabilities = probs
            .iter()
            .enumerate()
            .filter_map(|(id, p)| labels.label_of(id).map(|l| (l.to_string(), *p)))
            .collect();

        Some(Self {
            word: word.to_string(),
            label,
            confidence,
            all_probabilities,
        })
    }

    pub fn category(&self) -> Option<Category> {
        self.label.parse().ok()
    }
}

/// Category and confidence for a word inside a prompt.
/// An empty category with zero confidence means "unclassified".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WordCategory {
    pub category:   Option<Category>,
    pub confidence: f32,
}

impl WordCategory {
    pub fn certain(category: Category) -> Self {
        Self { category: Some(category), confidence: 1.0 }
    }

    pub fn unclassified() -> Self {
        Self::default()
    }

    pub fn is_classified(&self) -> bool {
        self.category.is_some() && self.confidence > 0.0
    }
}

/// Words of a prompt grouped by category.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CategorizedWords {
    pub marker:     Vec<String>,
    pub subject:    Vec<String>,
    pub action:     Vec<String>,
    pub object:     Vec<String>,
    pub descriptor: Vec<String>,
}

impl CategorizedWords {
    pub fn with_marker(marker: &str) -> Self {
        Self {
            marker: vec![marker.to_string()],
            ..Self::default()
        }
    }

    pub fn push(&mut self, category: Category, word: impl Into<String>) {
        let bucket = match category {
            Category::Action     => &mut self.action,
            Category::Subject    => &mut self.subject,
            Category::Object     => &mut self.object,
            Category::Descriptor => &mut self.descriptor,
        };
        bucket.push(word.into());
    }

    pub fn words(&self, category: Category) -> &[String] {
        match category {
            Category::Action     => &self.action,
            Category::Subject    => &self.subject,
            Category::Object     => &self.object,
            Category::Descriptor => &self.descriptor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_probabilities_picks_argmax() {
        let labels = LabelMap::new(&Category::ALL.map(|c| c.as_str())).unwrap();
        let result = PredictionResult::from_probabilities("dog", &[0.1, 0.2, 0.6, 0.1], &labels).unwrap();

        assert_eq!(result.label, "OBJECT");
        assert_eq!(result.confidence, 0.6);
        assert_eq!(result.all_probabilities.len(), 4);
        assert_eq!(result.all_probabilities["OBJECT"], result.confidence);
        assert_eq!(result.category(), Some(Category::Object));
    }

    #[test]
    fn test_from_probabilities_empty_row() {
        let labels = LabelMap::new(&Category::ALL.map(|c| c.as_str())).unwrap();
        assert!(PredictionResult::from_probabilities("x", &[], &labels).is_none());
    }

    #[test]
    fn test_categorized_words_buckets() {
        let mut words = CategorizedWords::with_marker("#!promptskeeper");
        words.push(Category::Action, "deploy");
        words.push(Category::Descriptor, "urgent");

        assert_eq!(words.marker, vec!["#!promptskeeper"]);
        assert_eq!(words.words(Category::Action), ["deploy"]);
        assert_eq!(words.words(Category::Descriptor), ["urgent"]);
        assert!(words.subject.is_empty());
    }
}
