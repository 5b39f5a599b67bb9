//! Key-value store persisted as a JSON file.
//!
//! The file may be replicated by an outside tool (a synced folder, for
//! example). Edits made behind our back are picked up by `synchronize`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tokio::sync::broadcast;

use super::{change_channel, ExternalChange, KeyValueStore};
use crate::error::{Error, Result};

#[derive(Debug, Default)]
struct Snapshot {
    values: BTreeMap<String, String>,
    /// File contents as last read or written by this handle
    raw: Option<String>,
}

/// File-backed key-value store
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    snapshot: Mutex<Snapshot>,
    changes: broadcast::Sender<ExternalChange>,
}

impl FileKeyValueStore {
    /// Open (or lazily create) the store at `path`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let snapshot = read_snapshot(&path)?;
        Ok(Self {
            path,
            snapshot: Mutex::new(snapshot),
            changes: change_channel(),
        })
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn snapshot(&self) -> Result<MutexGuard<'_, Snapshot>> {
        self.snapshot
            .lock()
            .map_err(|_| Error::Channel("key-value store lock poisoned".to_string()))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.snapshot()?.values.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        let mut snapshot = self.snapshot()?;
        snapshot.values.insert(key.to_string(), value);

        let raw = serde_json::to_string_pretty(&snapshot.values)?;
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &raw)?;
        std::fs::rename(&tmp_path, &self.path)?;
        snapshot.raw = Some(raw);
        Ok(())
    }

    fn synchronize(&self) -> Result<()> {
        let on_disk = read_snapshot(&self.path)?;
        let mut snapshot = self.snapshot()?;
        if on_disk.raw == snapshot.raw {
            return Ok(());
        }

        tracing::debug!("Key-value file {} changed externally", self.path.display());
        *snapshot = on_disk;
        let _ = self.changes.send(ExternalChange);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ExternalChange> {
        self.changes.subscribe()
    }
}

fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            return Ok(Snapshot::default());
        }
        Err(error) => return Err(error.into()),
    };
    let values = if raw.trim().is_empty() {
        BTreeMap::new()
    } else {
        serde_json::from_str(&raw)?
    };
    Ok(Snapshot {
        values,
        raw: Some(raw),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn values_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("groups.json");

        let store = FileKeyValueStore::open(&path).unwrap();
        store.set("pinnedVocabularyIDs", "[\"a\"]".to_string()).unwrap();
        drop(store);

        let reopened = FileKeyValueStore::open(&path).unwrap();
        assert_eq!(
            reopened.get("pinnedVocabularyIDs").unwrap().as_deref(),
            Some("[\"a\"]")
        );
    }

    #[test]
    fn synchronize_detects_external_edits() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("groups.json");

        let store = FileKeyValueStore::open(&path).unwrap();
        store.set("k", "1".to_string()).unwrap();
        let mut changes = store.subscribe();

        store.synchronize().unwrap();
        assert!(changes.try_recv().is_err());

        let other_device = FileKeyValueStore::open(&path).unwrap();
        other_device.set("k", "2".to_string()).unwrap();

        store.synchronize().unwrap();
        assert_eq!(changes.try_recv().unwrap(), ExternalChange);
        assert_eq!(store.get("k").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn corrupt_file_is_a_serialization_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("groups.json");
        std::fs::write(&path, "not json").unwrap();

        let error = FileKeyValueStore::open(&path).unwrap_err();
        assert!(matches!(error, Error::Serialization(_)));
    }
}
