// ============================================================
// Layer 4 — Dataset Loader
// ============================================================
// Reads one plain-text word list per category:
//
//   dataset/
//     actions.txt      → ACTION
//     subjects.txt     → SUBJECT
//     objects.txt      → OBJECT
//     descriptors.txt  → DESCRIPTOR
//
// Each non-blank line is one word. Files are read as UTF-8;
// anything else is reported as an encoding error for that file.
//
// All paths are checked up front so a user with three missing
// files sees all three in one message instead of one per run.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

use crate::data::preprocessor::Preprocessor;
use crate::domain::dataset_item::DatasetItem;
use crate::domain::traits::DatasetSource;
use crate::error::ClassifierError;

/// Loads labelled words from one file per label.
/// File order is preserved, so items come out grouped by label
/// in the order the files were given.
pub struct DatasetLoader {
    file_paths: Vec<(String, PathBuf)>,
}

impl DatasetLoader {
    pub fn new<L, P>(file_paths: impl IntoIterator<Item = (L, P)>) -> Self
    where
        L: Into<String>,
        P: AsRef<Path>,
    {
        Self {
            file_paths: file_paths
                .into_iter()
                .map(|(label, path)| (label.into(), path.as_ref().to_path_buf()))
                .collect(),
        }
    }

    /// Fail with every missing path if any file does not exist.
    pub fn validate_files(&self) -> Result<(), ClassifierError> {
        let missing: Vec<PathBuf> = self
            .file_paths
            .iter()
            .filter(|(_, path)| !path.exists())
            .map(|(_, path)| path.clone())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ClassifierError::FilesNotFound(missing))
        }
    }
}

impl DatasetSource for DatasetLoader {
    fn load_data(&self) -> Result<Vec<DatasetItem>> {
        self.validate_files()?;

        let prep     = Preprocessor::new();
        let mut data = Vec::new();

        for (label, path) in &self.file_paths {
            let before = data.len();
            let text   = read_utf8(path)?;

            data.extend(
                text.lines()
                    .map(|line| prep.clean(line))
                    .filter(|word| !word.is_empty())
                    .map(|word| DatasetItem::new(word, label.clone())),
            );

            tracing::debug!(
                "Loaded {} words for {} from '{}'",
                data.len() - before,
                label,
                path.display()
            );
        }

        tracing::info!("Loaded {} labelled words from {} files", data.len(), self.file_paths.len());
        Ok(data)
    }
}

fn read_utf8(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == ErrorKind::InvalidData => Err(ClassifierError::Encoding {
            path:   path.to_path_buf(),
            source: e,
        }
        .into()),
        Err(e) => Err(e).with_context(|| format!("Cannot read '{}'", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_loads_words_with_labels_in_file_order() {
        let dir      = tempfile::tempdir().unwrap();
        let actions  = write(dir.path(), "actions.txt", b"run\n  jump \n\n");
        let subjects = write(dir.path(), "subjects.txt", b"\xEF\xBB\xBFteacher\r\ndoctor\r\n");

        let loader = DatasetLoader::new([("ACTION", &actions), ("SUBJECT", &subjects)]);
        let data   = loader.load_data().unwrap();

        assert_eq!(
            data,
            vec![
                DatasetItem::new("run", "ACTION"),
                DatasetItem::new("jump", "ACTION"),
                DatasetItem::new("teacher", "SUBJECT"),
                DatasetItem::new("doctor", "SUBJECT"),
            ]
        );
    }

    #[test]
    fn test_missing_files_are_all_reported() {
        let dir     = tempfile::tempdir().unwrap();
        let present = write(dir.path(), "objects.txt", b"dog\n");
        let gone_a  = dir.path().join("actions.txt");
        let gone_b  = dir.path().join("descriptors.txt");

        let loader = DatasetLoader::new([
            ("ACTION", gone_a.clone()),
            ("OBJECT", present),
            ("DESCRIPTOR", gone_b.clone()),
        ]);

        let err = loader.load_data().unwrap_err();
        match err.downcast_ref::<ClassifierError>() {
            Some(ClassifierError::FilesNotFound(paths)) => {
                assert_eq!(paths, &vec![gone_a.clone(), gone_b.clone()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let message = err.to_string();
        assert!(message.starts_with("Files not found: "));
        assert!(message.contains(&gone_a.display().to_string()));
        assert!(message.contains(&gone_b.display().to_string()));
    }

    #[test]
    fn test_invalid_utf8_is_an_encoding_error() {
        let dir    = tempfile::tempdir().unwrap();
        let broken = write(dir.path(), "objects.txt", b"caf\xE9\n");

        let loader = DatasetLoader::new([("OBJECT", &broken)]);
        let err    = loader.load_data().unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ClassifierError>(),
            Some(ClassifierError::Encoding { path, .. }) if path == &broken
        ));
    }

    #[test]
    fn test_empty_file_gives_no_items() {
        let dir   = tempfile::tempdir().unwrap();
        let empty = write(dir.path(), "actions.txt", b"\n\n");

        let loader = DatasetLoader::new([("ACTION", &empty)]);
        assert!(loader.load_data().unwrap().is_empty());
    }
}
