use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use dashmap::DashMap;

use crate::{error::StorageError, models::UrlRecord};

/// Slot name the record list lives under.
pub const RECORDS_SLOT: &str = "shortened_urls";

/// Full-snapshot persistence for the record list.
///
/// `load` returns every record in insertion order; `save` replaces the whole
/// list. There is no partial update and no locking: concurrent writers race
/// and the last `save` wins.
pub trait RecordStore: Send + Sync {
    fn load(&self) -> Result<Vec<UrlRecord>, StorageError>;
    fn save(&self, records: &[UrlRecord]) -> Result<(), StorageError>;
}

/// Load the record list, degrading to an empty list if the slot can't be read.
pub fn load_or_empty(store: &dyn RecordStore) -> Vec<UrlRecord> {
    match store.load() {
        Ok(records) => records,
        Err(e) => {
            tracing::error!("Failed to retrieve stored URLs: {}", e);
            Vec::new()
        }
    }
}

/// Persist the record list, logging and dropping the write on failure.
/// Returns whether the write went through.
pub fn save_or_log(store: &dyn RecordStore, records: &[UrlRecord]) -> bool {
    match store.save(records) {
        Ok(()) => {
            tracing::debug!("Stored {} URL record(s)", records.len());
            true
        }
        Err(e) => {
            tracing::error!("Failed to store URLs: {}", e);
            false
        }
    }
}

// ── JSON file ──────────────────────────────────────────────────────────────

/// Records kept as a JSON array in a single file.
///
/// A missing file reads as an empty list. Writes go to a sibling temp file
/// first and are renamed into place.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| RECORDS_SLOT.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl RecordStore for JsonFileStore {
    fn load(&self) -> Result<Vec<UrlRecord>, StorageError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("{} not found, starting empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, records: &[UrlRecord]) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(records)?;
        let tmp = self.temp_path();
        fs::write(&tmp, json)?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }
}

// ── In-memory ──────────────────────────────────────────────────────────────

/// Thread-safe in-memory slot store: slot name -> serialized JSON.
///
/// Behaves like a browser's local storage. Records still round-trip through
/// serde so a slot can be seeded with arbitrary (even malformed) content.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    slots: Arc<DashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with the given records already persisted.
    pub fn with_records(records: &[UrlRecord]) -> Result<Self, StorageError> {
        let store = Self::new();
        store.save(records)?;
        Ok(store)
    }

    /// Raw contents of a slot.
    pub fn get_slot(&self, slot: &str) -> Option<String> {
        self.slots.get(slot).map(|v| v.clone())
    }

    /// Overwrite a slot with raw contents.
    pub fn set_slot(&self, slot: impl Into<String>, value: impl Into<String>) {
        self.slots.insert(slot.into(), value.into());
    }
}

impl RecordStore for MemoryStore {
    fn load(&self) -> Result<Vec<UrlRecord>, StorageError> {
        match self.slots.get(RECORDS_SLOT) {
            Some(json) => Ok(serde_json::from_str(json.value())?),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, records: &[UrlRecord]) -> Result<(), StorageError> {
        let json = serde_json::to_string(records)?;
        self.slots.insert(RECORDS_SLOT.to_owned(), json);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn sample(code: &str) -> UrlRecord {
        let now = Utc::now();
        UrlRecord {
            id: now.timestamp_millis(),
            long_url: format!("https://example.com/{code}"),
            shortcode: code.into(),
            short_url: format!("http://localhost:3000/{code}"),
            created_at: now,
            expires_at: now + Duration::minutes(30),
            validity_minutes: 30,
            clicks: 0,
            click_details: Vec::new(),
        }
    }

    #[test]
    fn memory_store_starts_empty() {
        assert!(MemoryStore::new().load().unwrap().is_empty());
    }

    #[test]
    fn memory_store_reads_are_stable() {
        let store = MemoryStore::with_records(&[sample("aaa111"), sample("bbb222")]).unwrap();
        let first = store.load().unwrap();
        let second = store.load().unwrap();
        assert_eq!(first, second);
        assert_eq!(first[0].shortcode, "aaa111");
        assert_eq!(first[1].shortcode, "bbb222");
    }

    #[test]
    fn malformed_slot_is_an_error_and_degrades_to_empty() {
        let store = MemoryStore::new();
        store.set_slot(RECORDS_SLOT, "{not json");
        assert!(matches!(store.load(), Err(StorageError::Serialization(_))));
        assert!(load_or_empty(&store).is_empty());
    }

    #[test]
    fn file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("urls.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn file_store_persists_full_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("urls.json");
        let store = JsonFileStore::new(&path);

        store.save(&[sample("one111")]).unwrap();
        store.save(&[sample("one111"), sample("two222")]).unwrap();

        let reopened = JsonFileStore::new(&path);
        let records = reopened.load().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].shortcode, "two222");
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn file_store_save_failure_is_logged_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be makes the rename fail.
        let path = dir.path().join("urls.json");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), "x").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(!save_or_log(&store, &[sample("abc123")]));
        assert!(!store.temp_path().exists());
        assert!(path.join("keep").exists());
    }
}
