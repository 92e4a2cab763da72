//! Lock Storage - Persistence layer for resource locks
//!
//! All locks live in a single JSON array document. Every mutation is a full
//! load, transform and full save; saves go through a temporary file and a
//! rename so a crash mid-write never leaves a truncated document behind.

use super::{LockType, ResourceLock};
use panelguard_core::Timestamp;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Lock store errors
#[derive(Debug, thiserror::Error)]
pub enum LockStoreError {
    #[error("Lock store I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Lock store {path} is corrupt: {message}")]
    Corrupt { path: PathBuf, message: String },

    #[error("Failed to serialize locks: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type LockStoreResult<T> = Result<T, LockStoreError>;

/// On-disk lock record. Every field is optional so that a single damaged
/// entry can be skipped instead of failing the whole document.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredLock {
    #[serde(default)]
    resource_id: String,
    #[serde(default)]
    lock_type: String,
    #[serde(default)]
    session_id: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    timestamp: Timestamp,
}

impl StoredLock {
    fn into_lock(self) -> Option<ResourceLock> {
        let lock_type: LockType = self.lock_type.parse().ok()?;
        let lock = ResourceLock {
            resource_id: self.resource_id,
            lock_type,
            session_id: self.session_id,
            username: self.username,
            timestamp: self.timestamp,
        };
        lock.is_valid().then_some(lock)
    }
}

/// Durable collection of resource locks
pub struct LockStore {
    path: PathBuf,
}

impl LockStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> LockStoreError {
        LockStoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Ensure the parent directory and an empty, valid document exist
    pub fn initialize(&self) -> LockStoreResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        if self.path.exists() {
            debug!("Lock store found at: {}", self.path.display());
        } else {
            info!(
                "Lock store not found, creating empty store at: {}",
                self.path.display()
            );
            self.save_all(&[])?;
        }

        Ok(())
    }

    /// Load every valid lock. Fails if the document cannot be read or is not
    /// a JSON array; individual invalid entries are skipped.
    pub fn load_all(&self) -> LockStoreResult<Vec<ResourceLock>> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let document: serde_json::Value =
            serde_json::from_str(&content).map_err(|e| LockStoreError::Corrupt {
                path: self.path.clone(),
                message: e.to_string(),
            })?;

        let entries = match document {
            serde_json::Value::Array(entries) => entries,
            _ => {
                return Err(LockStoreError::Corrupt {
                    path: self.path.clone(),
                    message: "top-level value is not an array".to_string(),
                })
            }
        };

        let mut locks = Vec::with_capacity(entries.len());
        for entry in entries {
            match serde_json::from_value::<StoredLock>(entry)
                .ok()
                .and_then(StoredLock::into_lock)
            {
                Some(lock) => locks.push(lock),
                None => warn!(
                    "Skipping invalid lock entry in {}",
                    self.path.display()
                ),
            }
        }

        Ok(locks)
    }

    /// Replace the whole document with the valid entries of `locks`
    pub fn save_all(&self, locks: &[ResourceLock]) -> LockStoreResult<()> {
        let valid: Vec<&ResourceLock> = locks.iter().filter(|lock| lock.is_valid()).collect();
        let json = serde_json::to_string_pretty(&valid)?;

        let tmp_path = self.temp_path();
        std::fs::write(&tmp_path, json).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp_path, &self.path).map_err(|e| self.io_error(e))?;

        debug!(count = valid.len(), "Saved locks to {}", self.path.display());
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, LockStore) {
        let dir = TempDir::new().unwrap();
        let store = LockStore::new(dir.path().join("locks").join("active_locks.json"));
        (dir, store)
    }

    fn lock(resource_id: &str, session_id: &str) -> ResourceLock {
        ResourceLock {
            resource_id: resource_id.to_string(),
            lock_type: LockType::EditingSchedule,
            session_id: session_id.to_string(),
            username: "alice".to_string(),
            timestamp: 7,
        }
    }

    #[test]
    fn test_initialize_creates_empty_store() {
        let (_dir, store) = store();
        store.initialize().unwrap();

        assert!(store.path().exists());
        assert!(store.load_all().unwrap().is_empty());
        let content = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(content.trim(), "[]");
    }

    #[test]
    fn test_initialize_keeps_existing_store() {
        let (_dir, store) = store();
        store.initialize().unwrap();
        store.save_all(&[lock("schedule_a", "s1")]).unwrap();

        store.initialize().unwrap();
        assert_eq!(store.load_all().unwrap().len(), 1);
    }

    #[test]
    fn test_save_and_load_preserves_order() {
        let (_dir, store) = store();
        store.initialize().unwrap();
        let locks = vec![lock("b", "s1"), lock("a", "s2")];
        store.save_all(&locks).unwrap();

        assert_eq!(store.load_all().unwrap(), locks);
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn test_save_drops_invalid_entries() {
        let (_dir, store) = store();
        store.initialize().unwrap();
        store.save_all(&[lock("a", "s1"), lock("", "s2")]).unwrap();

        let loaded = store.load_all().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].resource_id, "a");
    }

    #[test]
    fn test_empty_file_is_empty_store() {
        let (_dir, store) = store();
        store.initialize().unwrap();
        std::fs::write(store.path(), "").unwrap();
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_document_fails() {
        let (_dir, store) = store();
        store.initialize().unwrap();

        std::fs::write(store.path(), "[{\"resourceId\": ").unwrap();
        assert!(matches!(
            store.load_all(),
            Err(LockStoreError::Corrupt { .. })
        ));

        std::fs::write(store.path(), "{\"resourceId\": \"a\"}").unwrap();
        assert!(matches!(
            store.load_all(),
            Err(LockStoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_invalid_entries_are_skipped_on_load() {
        let (_dir, store) = store();
        store.initialize().unwrap();
        let document = r#"[
            {"resourceId": "a", "lockType": "editing_schedule", "sessionId": "s1", "username": "alice", "timestamp": 5},
            {"resourceId": "b", "lockType": "shredding", "sessionId": "s1", "username": "alice", "timestamp": 5},
            {"resourceId": "", "lockType": "editing_template", "sessionId": "s1", "username": "alice", "timestamp": 5},
            "not an object",
            {"resourceId": "c", "lockType": "EDITING_TEMPLATE", "sessionId": "s2", "timestamp": 9}
        ]"#;
        std::fs::write(store.path(), document).unwrap();

        let loaded = store.load_all().unwrap();
        let ids: Vec<&str> = loaded.iter().map(|l| l.resource_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(loaded[1].lock_type, LockType::EditingTemplate);
        assert_eq!(loaded[1].username, "");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let (_dir, store) = store();
        assert!(matches!(store.load_all(), Err(LockStoreError::Io { .. })));
    }
}
