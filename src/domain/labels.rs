// ============================================================
// Layer 3 — Categories and Label Mapping
// ============================================================
// The classifier predicts one of four word categories.
// The model itself only knows integer class ids, so every
// label crossing the model boundary goes through a LabelMap:
//
//   "ACTION"     ⇄ 0
//   "SUBJECT"    ⇄ 1
//   "OBJECT"     ⇄ 2
//   "DESCRIPTOR" ⇄ 3
//
// The map is built once from an ordered class list and is
// persisted next to the weights as id2label / label2id.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ClassifierError;

/// One of the four word categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    Action,
    Subject,
    Object,
    Descriptor,
}

impl Category {
    /// Canonical class order used when training a new model.
    pub const ALL: [Category; 4] = [
        Category::Action,
        Category::Subject,
        Category::Object,
        Category::Descriptor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Action     => "ACTION",
            Category::Subject    => "SUBJECT",
            Category::Object     => "OBJECT",
            Category::Descriptor => "DESCRIPTOR",
        }
    }

    /// Lower-case name, as shown to prompt authors.
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Action     => "action",
            Category::Subject    => "subject",
            Category::Object     => "object",
            Category::Descriptor => "descriptor",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ClassifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACTION"     => Ok(Category::Action),
            "SUBJECT"    => Ok(Category::Subject),
            "OBJECT"     => Ok(Category::Object),
            "DESCRIPTOR" => Ok(Category::Descriptor),
            _            => Err(ClassifierError::UnknownLabel(s.to_string())),
        }
    }
}

// ─── LabelMap ─────────────────────────────────────────────────────────────────
/// Bidirectional label ⇄ id mapping. Ids are positions in the class list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelMap {
    id2label: Vec<String>,
    label2id: HashMap<String, usize>,
}

impl LabelMap {
    /// Build the mapping from an ordered list of class names.
    /// Duplicate names are rejected.
    pub fn new<S: AsRef<str>>(class_names: &[S]) -> Result<Self, ClassifierError> {
        let mut id2label = Vec::with_capacity(class_names.len());
        let mut label2id = HashMap::with_capacity(class_names.len());

        for (id, name) in class_names.iter().enumerate() {
            let name = name.as_ref().to_string();
            if label2id.insert(name.clone(), id).is_some() {
                return Err(ClassifierError::DuplicateLabel(name));
            }
            id2label.push(name);
        }

        Ok(Self { id2label, label2id })
    }

    /// Rebuild the mapping from a persisted id2label table.
    /// Ids must be exactly 0..n.
    pub fn from_id2label(table: &BTreeMap<usize, String>) -> Result<Self, ClassifierError> {
        for (expected, id) in table.keys().enumerate() {
            if *id != expected {
                return Err(ClassifierError::UnknownLabel(format!("missing id {expected}")));
            }
        }
        let names: Vec<&String> = table.values().collect();
        Self::new(&names)
    }

    pub fn id_of(&self, label: &str) -> Result<usize, ClassifierError> {
        self.label2id
            .get(label)
            .copied()
            .ok_or_else(|| ClassifierError::UnknownLabel(label.to_string()))
    }

    pub fn label_of(&self, id: usize) -> Option<&str> {
        self.id2label.get(id).map(String::as_str)
    }

    pub fn labels(&self) -> &[String] {
        &self.id2label
    }

    pub fn len(&self) -> usize {
        self.id2label.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id2label.is_empty()
    }

    pub fn id2label(&self) -> BTreeMap<usize, String> {
        self.id2label.iter().cloned().enumerate().collect()
    }

    pub fn label2id(&self) -> BTreeMap<String, usize> {
        self.label2id.iter().map(|(k, v)| (k.clone(), *v)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_is_identity() {
        let map = LabelMap::new(&Category::ALL.map(|c| c.as_str())).unwrap();
        for id in 0..map.len() {
            let label = map.label_of(id).unwrap();
            assert_eq!(map.id_of(label).unwrap(), id);
        }
        for label in Category::ALL.map(|c| c.as_str()) {
            let id = map.id_of(label).unwrap();
            assert_eq!(map.label_of(id), Some(label));
        }
    }

    #[test]
    fn test_ids_follow_class_order() {
        let map = LabelMap::new(&["ACTION", "SUBJECT", "OBJECT", "DESCRIPTOR"]).unwrap();
        assert_eq!(map.id_of("ACTION").unwrap(), 0);
        assert_eq!(map.id_of("DESCRIPTOR").unwrap(), 3);
    }

    #[test]
    fn test_duplicate_label_rejected() {
        let err = LabelMap::new(&["ACTION", "ACTION"]).unwrap_err();
        assert!(matches!(err, ClassifierError::DuplicateLabel(l) if l == "ACTION"));
    }

    #[test]
    fn test_unknown_label_is_an_error() {
        let map = LabelMap::new(&["ACTION"]).unwrap();
        assert!(matches!(map.id_of("VERB"), Err(ClassifierError::UnknownLabel(_))));
        assert_eq!(map.label_of(7), None);
    }

    #[test]
    fn test_persisted_table_round_trip() {
        let map    = LabelMap::new(&Category::ALL.map(|c| c.as_str())).unwrap();
        let json   = serde_json::to_string(&map.id2label()).unwrap();
        let table: BTreeMap<usize, String> = serde_json::from_str(&json).unwrap();
        assert_eq!(LabelMap::from_id2label(&table).unwrap(), map);
    }

    #[test]
    fn test_gap_in_persisted_ids_rejected() {
        let mut table = BTreeMap::new();
        table.insert(0, "ACTION".to_string());
        table.insert(2, "OBJECT".to_string());
        assert!(LabelMap::from_id2label(&table).is_err());
    }

    #[test]
    fn test_category_parse_is_case_insensitive() {
        assert_eq!("subject".parse::<Category>().unwrap(), Category::Subject);
        assert_eq!(" Descriptor ".parse::<Category>().unwrap(), Category::Descriptor);
        assert!("noun".parse::<Category>().is_err());
    }
}
