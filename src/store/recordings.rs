//! The ordered list of saved recordings.
//!
//! The whole list is serialized to JSON and written under one storage key on
//! every mutation, newest first. A list that fails to deserialize is logged and
//! treated as empty.

use super::storage::KeyValueStore;
use anyhow::{anyhow, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Storage key holding the serialized list.
pub const RECORDINGS_KEY: &str = "recordings";

/// Metadata for one saved clip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingItem {
    /// Time-derived identifier, not guaranteed unique
    pub id: String,
    /// Absolute path to the container file
    pub file_path: PathBuf,
    /// Length in whole seconds
    pub duration: u64,
    /// Creation time, epoch milliseconds
    pub created_at: i64,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl RecordingItem {
    /// Entry for a recording that just stopped.
    pub fn recorded(file_path: PathBuf, duration: u64) -> Self {
        let now = Local::now();
        Self {
            id: now.timestamp_millis().to_string(),
            file_path,
            duration,
            created_at: now.timestamp_millis(),
            name: Some(format!("Recording {}", now.format("%Y-%m-%d %H:%M:%S"))),
        }
    }

    /// Entry for the output of trimming `source` to `[start, end]`.
    pub fn trimmed(source: &RecordingItem, file_path: PathBuf, start: f64, end: f64) -> Self {
        let now = Local::now();
        Self {
            id: now.timestamp_millis().to_string(),
            file_path,
            duration: (end - start).max(0.0).round() as u64,
            created_at: now.timestamp_millis(),
            name: Some(format!("{} (Trimmed)", source.display_name())),
        }
    }

    /// Name shown in lists; unnamed entries fall back to a generic label.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Recording")
    }
}

/// The recordings list and the storage it is persisted to.
pub struct RecordingStore {
    storage: KeyValueStore,
    items: Vec<RecordingItem>,
}

impl RecordingStore {
    /// Opens the store in `data_dir` and loads the saved list.
    ///
    /// # Errors
    /// - If the data directory cannot be created
    pub fn open(data_dir: &Path) -> Result<Self> {
        let mut store = Self {
            storage: KeyValueStore::new(data_dir)?,
            items: Vec::new(),
        };
        store.load();
        Ok(store)
    }

    /// Replaces the in-memory list with the persisted one.
    pub fn load(&mut self) {
        self.items = match self.storage.get(RECORDINGS_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<RecordingItem>>(&raw) {
                Ok(items) => items,
                Err(e) => {
                    tracing::warn!("Failed to load recordings: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to load recordings: {:#}", e);
                Vec::new()
            }
        };
        tracing::debug!("Loaded {} recordings", self.items.len());
    }

    /// Writes the full list to storage.
    ///
    /// # Errors
    /// - If serialization or the storage write fails
    pub fn save(&mut self) -> Result<()> {
        let json = serde_json::to_string(&self.items)?;
        self.storage.set(RECORDINGS_KEY, &json)
    }

    /// Adds an entry at the front of the list and persists.
    ///
    /// # Errors
    /// - If persisting fails (the entry stays in memory)
    pub fn insert(&mut self, item: RecordingItem) -> Result<()> {
        tracing::info!("Recording saved: {} ({}s)", item.display_name(), item.duration);
        self.items.insert(0, item);
        self.save()
    }

    /// Drops the entry at 0-based `index`, persists, then deletes its file
    /// best-effort.
    ///
    /// When the list cannot be persisted the entry is put back at `index` and
    /// its file is left alone.
    ///
    /// # Errors
    /// - If `index` is out of range
    /// - If persisting fails
    pub fn remove_at(&mut self, index: usize) -> Result<RecordingItem> {
        if index >= self.items.len() {
            return Err(anyhow!("No recording at position {}", index + 1));
        }
        let removed = self.items.remove(index);

        if let Err(e) = self.save() {
            self.items.insert(index, removed);
            return Err(e);
        }

        if removed.file_path.exists() {
            match std::fs::remove_file(&removed.file_path) {
                Ok(()) => tracing::info!("Deleted recording file: {}", removed.file_path.display()),
                Err(e) => tracing::warn!("Failed to delete file {}: {}", removed.file_path.display(), e),
            }
        }
        Ok(removed)
    }

    /// Entry with the given id.
    pub fn get(&self, id: &str) -> Option<&RecordingItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// All entries, newest first.
    pub fn items(&self) -> &[RecordingItem] {
        &self.items
    }

    /// Entry by 1-based position (1 = most recent).
    ///
    /// # Errors
    /// - If the list is empty or the index is out of range
    pub fn by_index(&self, index: usize) -> Result<&RecordingItem> {
        if self.items.is_empty() {
            return Err(anyhow!("No recordings found"));
        }
        if index < 1 || index > self.items.len() {
            return Err(anyhow!(
                "Recording index out of range. Available recordings: 1-{}",
                self.items.len()
            ));
        }
        Ok(&self.items[index - 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, path: PathBuf) -> RecordingItem {
        RecordingItem {
            id: id.to_string(),
            file_path: path,
            duration: 5,
            created_at: 0,
            name: Some(format!("clip {id}")),
        }
    }

    #[test]
    fn test_insert_prepends_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = RecordingStore::open(dir.path()).unwrap();
        store.insert(item("1", dir.path().join("1.wav"))).unwrap();
        store.insert(item("2", dir.path().join("2.wav"))).unwrap();

        let reopened = RecordingStore::open(dir.path()).unwrap();
        let ids: Vec<_> = reopened.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);
        assert_eq!(reopened.by_index(1).unwrap().id, "2");
    }

    #[test]
    fn test_remove_drops_one_entry_and_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let doomed = dir.path().join("b.wav");
        std::fs::write(&doomed, b"RIFF").unwrap();

        let mut store = RecordingStore::open(dir.path()).unwrap();
        for (id, name) in [("a", "a.wav"), ("b", "b.wav"), ("c", "c.wav"), ("d", "d.wav")] {
            store.insert(item(id, dir.path().join(name))).unwrap();
        }

        let removed = store.remove_at(2).unwrap();
        assert_eq!(removed.id, "b");
        assert!(!doomed.exists());

        let ids: Vec<_> = store.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["d", "c", "a"]);
        assert!(store.remove_at(3).is_err());
        assert!(store.get("b").is_none());
        assert_eq!(store.get("c").map(|i| i.display_name()), Some("clip c"));

        let reopened = RecordingStore::open(dir.path()).unwrap();
        assert_eq!(reopened.items().len(), 3);
    }

    #[test]
    fn test_remove_with_missing_file_still_removes_entry() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = RecordingStore::open(dir.path()).unwrap();
        store.insert(item("x", dir.path().join("gone.wav"))).unwrap();
        assert_eq!(store.remove_at(0).unwrap().id, "x");
        assert!(store.items().is_empty());
    }

    /// Holds a write lock on the database from a second connection.
    fn lock_database(dir: &Path) -> rusqlite::Connection {
        let lock = rusqlite::Connection::open(dir.join("clipdeck.db")).unwrap();
        lock.execute_batch("BEGIN EXCLUSIVE").unwrap();
        lock
    }

    #[test]
    fn test_remove_keeps_file_and_entry_when_save_fails() {
        let dir = tempfile::tempdir().unwrap();
        let kept = dir.path().join("1.wav");
        std::fs::write(&kept, b"RIFF").unwrap();

        let mut store = RecordingStore::open(dir.path()).unwrap();
        store.insert(item("1", kept.clone())).unwrap();

        let lock = lock_database(dir.path());
        assert!(store.remove_at(0).is_err());
        assert!(kept.exists());
        assert_eq!(store.items().len(), 1);
        assert_eq!(store.items()[0].id, "1");
        drop(lock);

        let reopened = RecordingStore::open(dir.path()).unwrap();
        assert_eq!(reopened.items().len(), 1);
        assert_eq!(reopened.items()[0].file_path, kept);
    }

    #[test]
    fn test_remove_at_restores_position_when_save_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = RecordingStore::open(dir.path()).unwrap();
        for id in ["a", "b", "c"] {
            store.insert(item(id, dir.path().join(format!("{id}.wav")))).unwrap();
        }

        let lock = lock_database(dir.path());
        assert!(store.remove_at(1).is_err());
        drop(lock);

        let ids: Vec<_> = store.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_insert_keeps_entry_in_memory_when_save_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = RecordingStore::open(dir.path()).unwrap();
        store.insert(item("1", dir.path().join("1.wav"))).unwrap();

        let lock = lock_database(dir.path());
        assert!(store.insert(item("2", dir.path().join("2.wav"))).is_err());
        drop(lock);

        assert_eq!(store.items()[0].id, "2");
        assert_eq!(RecordingStore::open(dir.path()).unwrap().items().len(), 1);

        store.save().unwrap();
        assert_eq!(RecordingStore::open(dir.path()).unwrap().items().len(), 2);
    }

    #[test]
    fn test_remove_at_picks_the_indexed_entry_among_shared_ids() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.wav");
        let second = dir.path().join("second.wav");
        std::fs::write(&first, b"RIFF").unwrap();
        std::fs::write(&second, b"RIFF").unwrap();

        let mut store = RecordingStore::open(dir.path()).unwrap();
        store.insert(item("same", second.clone())).unwrap();
        store.insert(item("same", first.clone())).unwrap();

        let removed = store.remove_at(1).unwrap();
        assert_eq!(removed.file_path, second);
        assert!(!second.exists());
        assert!(first.exists());
        assert_eq!(store.items().len(), 1);
        assert_eq!(store.items()[0].file_path, first);
        assert!(store.remove_at(5).is_err());
    }

    #[test]
    fn test_corrupt_list_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut storage = KeyValueStore::new(dir.path()).unwrap();
            storage.set(RECORDINGS_KEY, "{not json").unwrap();
        }
        let store = RecordingStore::open(dir.path()).unwrap();
        assert!(store.items().is_empty());
    }

    #[test]
    fn test_serialized_shape_uses_camel_case() {
        let json = serde_json::to_string(&item("7", PathBuf::from("/r/7.wav"))).unwrap();
        assert!(json.contains("\"filePath\":\"/r/7.wav\""));
        assert!(json.contains("\"createdAt\":0"));

        let parsed: RecordingItem =
            serde_json::from_str(r#"{"id":"9","filePath":"/r/9.wav","duration":3,"createdAt":1}"#)
                .unwrap();
        assert_eq!(parsed.display_name(), "Recording");
    }

    #[test]
    fn test_trimmed_item_names_and_duration() {
        let source = item("1", PathBuf::from("/r/1.wav"));
        let trimmed = RecordingItem::trimmed(&source, PathBuf::from("/r/t.wav"), 2.0, 5.0);
        assert_eq!(trimmed.duration, 3);
        assert_eq!(trimmed.display_name(), "clip 1 (Trimmed)");
    }

    #[test]
    fn test_by_index_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = RecordingStore::open(dir.path()).unwrap();
        assert!(store.by_index(1).is_err());
        store.insert(item("1", dir.path().join("1.wav"))).unwrap();
        assert!(store.by_index(0).is_err());
        assert!(store.by_index(2).is_err());
    }
}
