//! Storage backend implementations and the ordered tier list.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::StorageError;

/// A single key-value storage tier.
///
/// Values are opaque strings (callers serialize their own JSON). A `ttl`
/// of `None` means the entry never expires within the backend's own
/// lifetime.
pub trait StorageBackend: Send + Sync {
    /// Reads the value stored under `key`, treating expired entries as
    /// missing.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the underlying medium fails.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Writes `value` under `key` with an optional time-to-live.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the underlying medium fails.
    fn write(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StorageError>;

    /// Removes the entry under `key` if present.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the underlying medium fails.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// A stored entry with its optional expiry stamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,
}

impl StoredEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

fn expiry_from_ttl(ttl: Option<Duration>) -> Option<DateTime<Utc>> {
    ttl.and_then(|d| chrono::Duration::from_std(d).ok())
        .map(|d| Utc::now() + d)
}

/// In-memory tier. Lives only as long as the process — the analogue of
/// session storage.
#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, StoredEntry>>,
}

impl MemoryBackend {
    /// Creates an empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut entries = self.entries.lock().expect("memory backend mutex poisoned");
        let now = Utc::now();
        if entries.get(key).is_some_and(|e| e.is_expired(now)) {
            entries.remove(key);
        }
        Ok(entries.get(key).map(|e| e.value.clone()))
    }

    fn write(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StorageError> {
        let entry = StoredEntry {
            value: value.to_string(),
            expires_at: expiry_from_ttl(ttl),
        };
        self.entries
            .lock()
            .expect("memory backend mutex poisoned")
            .insert(key.to_string(), entry);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .expect("memory backend mutex poisoned")
            .remove(key);
        Ok(())
    }
}

/// File-backed tier. Entries survive process restarts — the analogue of
/// cookie or local storage, depending on whether a TTL is supplied.
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Creates a backend rooted at `dir`, creating the directory if
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys are caller-chosen identifiers; anything outside
        // [a-z0-9_-] is flattened so a key can never escape the dir.
        let safe: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

impl StorageBackend for FileBackend {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let entry: StoredEntry = serde_json::from_str(&raw)?;
        if entry.is_expired(Utc::now()) {
            let _ = std::fs::remove_file(&path);
            return Ok(None);
        }
        Ok(Some(entry.value))
    }

    fn write(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StorageError> {
        let entry = StoredEntry {
            value: value.to_string(),
            expires_at: expiry_from_ttl(ttl),
        };
        std::fs::write(self.path_for(key), serde_json::to_string(&entry)?)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// An ordered list of storage tiers.
///
/// Reads try each tier in order and return the first hit; writes and
/// removals go to every tier. A failing tier is logged and skipped —
/// storage degrades to the remaining tiers rather than failing the
/// caller.
#[derive(Clone)]
pub struct TieredStore {
    tiers: Vec<Arc<dyn StorageBackend>>,
}

impl TieredStore {
    /// Creates a store over `tiers`, highest priority first.
    #[must_use]
    pub fn new(tiers: Vec<Arc<dyn StorageBackend>>) -> Self {
        Self { tiers }
    }

    /// Reads `key` from the first tier that has it.
    #[must_use]
    pub fn read(&self, key: &str) -> Option<String> {
        for tier in &self.tiers {
            match tier.read(key) {
                Ok(Some(value)) => return Some(value),
                Ok(None) => {}
                Err(e) => log::warn!("Storage tier read failed for {key}: {e}"),
            }
        }
        None
    }

    /// Writes `key` to every tier.
    pub fn write(&self, key: &str, value: &str, ttl: Option<Duration>) {
        for tier in &self.tiers {
            if let Err(e) = tier.write(key, value, ttl) {
                log::warn!("Storage tier write failed for {key}: {e}");
            }
        }
    }

    /// Removes `key` from every tier.
    pub fn remove(&self, key: &str) {
        for tier in &self.tiers {
            if let Err(e) = tier.remove(key) {
                log::warn!("Storage tier removal failed for {key}: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingBackend;

    impl StorageBackend for FailingBackend {
        fn read(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(std::io::Error::other("blocked").into())
        }

        fn write(&self, _: &str, _: &str, _: Option<Duration>) -> Result<(), StorageError> {
            Err(std::io::Error::other("blocked").into())
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(std::io::Error::other("blocked").into())
        }
    }

    #[test]
    fn memory_backend_round_trips() {
        let backend = MemoryBackend::new();
        backend.write("draft", "{\"a\":1}", None).unwrap();
        assert_eq!(backend.read("draft").unwrap().as_deref(), Some("{\"a\":1}"));
        backend.remove("draft").unwrap();
        assert_eq!(backend.read("draft").unwrap(), None);
    }

    #[test]
    fn expired_entries_read_as_missing() {
        let backend = MemoryBackend::new();
        backend
            .write("draft", "x", Some(Duration::from_secs(0)))
            .unwrap();
        assert_eq!(backend.read("draft").unwrap(), None);
    }

    #[test]
    fn file_backend_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let backend = FileBackend::new(dir.path()).unwrap();
            backend.write("accident-form", "persisted", None).unwrap();
        }
        let backend = FileBackend::new(dir.path()).unwrap();
        assert_eq!(
            backend.read("accident-form").unwrap().as_deref(),
            Some("persisted")
        );
    }

    #[test]
    fn file_backend_flattens_hostile_keys() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path()).unwrap();
        backend.write("../../etc/passwd", "nope", None).unwrap();
        assert!(backend.path_for("../../etc/passwd").starts_with(dir.path()));
    }

    #[test]
    fn tiered_read_takes_first_hit() {
        let primary = Arc::new(MemoryBackend::new());
        let backup = Arc::new(MemoryBackend::new());
        backup.write("k", "from-backup", None).unwrap();
        let store = TieredStore::new(vec![primary.clone(), backup]);

        assert_eq!(store.read("k").as_deref(), Some("from-backup"));

        primary.write("k", "from-primary", None).unwrap();
        assert_eq!(store.read("k").as_deref(), Some("from-primary"));
    }

    #[test]
    fn blocked_tier_degrades_to_next() {
        let backup = Arc::new(MemoryBackend::new());
        let store = TieredStore::new(vec![Arc::new(FailingBackend), backup.clone()]);

        store.write("k", "v", None);
        assert_eq!(store.read("k").as_deref(), Some("v"));
        assert_eq!(backup.read("k").unwrap().as_deref(), Some("v"));
    }
}
