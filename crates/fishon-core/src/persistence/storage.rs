//! File-backed string key/value store.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// File name inside the storage directory.
pub const STORAGE_FILE: &str = "storage.json";

/// Key under which the bearer credential is persisted.
pub const TOKEN_KEY: &str = "token";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Durable string key/value pairs, one JSON object on disk.
///
/// Every call reads or rewrites the file, so two handles on the same
/// directory always see each other's writes.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    dir: PathBuf,
}

impl LocalStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_path(&self) -> PathBuf {
        self.dir.join(STORAGE_FILE)
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let path = self.file_path();
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = fs::read_to_string(&path)?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;

        let file_path = self.file_path();
        let temp_path = self.dir.join(format!("{}.tmp", STORAGE_FILE));

        let json = serde_json::to_string_pretty(entries)?;
        fs::write(&temp_path, &json)?;
        fs::rename(&temp_path, &file_path)?;

        Ok(())
    }

    /// Read a value.
    pub fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load()?.remove(key))
    }

    /// Write a value, replacing any previous one.
    pub fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.load().unwrap_or_else(|e| {
            log::warn!("Discarding unreadable {}: {}", STORAGE_FILE, e);
            BTreeMap::new()
        });
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    /// Remove a value. Removing a missing key is not an error.
    pub fn remove(&self, key: &str) -> Result<(), StorageError> {
        let (mut entries, readable) = match self.load() {
            Ok(entries) => (entries, true),
            Err(e) => {
                log::warn!("Discarding unreadable {}: {}", STORAGE_FILE, e);
                (BTreeMap::new(), false)
            }
        };
        if entries.remove(key).is_none() && readable {
            return Ok(());
        }
        self.save(&entries)
    }

    // ========================================================================
    // Credential
    // ========================================================================

    pub fn load_token(&self) -> Result<Option<String>, StorageError> {
        Ok(self.get(TOKEN_KEY)?.filter(|t| !t.is_empty()))
    }

    pub fn save_token(&self, token: &str) -> Result<(), StorageError> {
        self.set(TOKEN_KEY, token)
    }

    pub fn clear_token(&self) -> Result<(), StorageError> {
        self.remove(TOKEN_KEY)
    }
}

// ============================================================================
// TESTS
// ============================================================================
