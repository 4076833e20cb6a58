//! Flat record representation of the statistics store and its on-disk file.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write snapshot {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub account: i64,
    #[serde(rename = "class")]
    pub category: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordRecord {
    pub account: i64,
    pub word: String,
    #[serde(rename = "class")]
    pub category: String,
    pub frequency: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub messages: Vec<MessageRecord>,
    pub words: Vec<WordRecord>,
}

impl Snapshot {
    pub fn to_json_pretty(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Location of the persisted snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when no snapshot has been written yet.
    pub fn read(&self) -> Result<Option<Snapshot>, SnapshotError> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SnapshotError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        Snapshot::from_json(&json).map(Some)
    }

    /// Replaces the file atomically: the snapshot goes to a temp file next to the
    /// target which is then renamed over it.
    pub fn write(&self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        let json = snapshot.to_json_pretty()?;
        let parent = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let write_err = |source| SnapshotError::Write {
            path: self.path.clone(),
            source,
        };

        fs::create_dir_all(parent).map_err(write_err)?;
        let mut temp = NamedTempFile::new_in(parent).map_err(write_err)?;
        temp.write_all(json.as_bytes()).map_err(write_err)?;
        temp.as_file().sync_all().map_err(write_err)?;
        temp.persist(&self.path)
            .map_err(|err| write_err(err.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Snapshot {
        Snapshot {
            messages: vec![
                MessageRecord {
                    account: 1,
                    category: "Work".into(),
                    count: 3,
                },
                MessageRecord {
                    account: 2,
                    category: "Junk".into(),
                    count: 0,
                },
            ],
            words: vec![WordRecord {
                account: 1,
                word: "déjà".into(),
                category: "Work".into(),
                frequency: 2,
            }],
        }
    }

    #[test]
    fn json_uses_class_field_and_two_space_indent() {
        let json = sample().to_json_pretty().unwrap();
        assert!(json.starts_with("{\n  \"messages\": [\n    {\n      \"account\": 1,"));
        assert!(json.contains("\"class\": \"Work\""));
        assert!(json.contains("\"frequency\": 2"));
        assert!(!json.contains("category"));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let json = r#"{"version": 2, "messages": [{"account": 5, "class": "Inbox", "count": 1, "extra": true}], "words": []}"#;
        let snapshot = Snapshot::from_json(json).unwrap();
        assert_eq!(snapshot.messages[0].account, 5);
        assert!(snapshot.words.is_empty());
    }

    #[test]
    fn negative_counts_are_malformed() {
        let json = r#"{"messages": [{"account": 5, "class": "Inbox", "count": -1}], "words": []}"#;
        assert!(matches!(
            Snapshot::from_json(json),
            Err(SnapshotError::Json(_))
        ));
    }

    #[test]
    fn missing_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let file = SnapshotFile::new(dir.path().join("classifier.json"));
        assert!(file.read().unwrap().is_none());
    }

    #[test]
    fn write_then_read_is_lossless() {
        let dir = tempfile::tempdir().unwrap();
        let file = SnapshotFile::new(dir.path().join("nested").join("classifier.json"));
        file.write(&sample()).unwrap();
        assert_eq!(file.read().unwrap(), Some(sample()));

        let mut updated = sample();
        updated.messages.truncate(1);
        file.write(&updated).unwrap();
        assert_eq!(file.read().unwrap(), Some(updated));
    }

    #[test]
    fn garbage_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("classifier.json");
        fs::write(&path, "not json").unwrap();
        let err = SnapshotFile::new(&path).read().unwrap_err();
        assert!(matches!(err, SnapshotError::Json(_)));
    }
}
