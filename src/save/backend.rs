//! Durable slot backends: in-memory, one file per slot, browser localStorage.

use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

#[cfg(not(target_arch = "wasm32"))]
use std::fs;
#[cfg(not(target_arch = "wasm32"))]
use std::path::PathBuf;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage lock was poisoned")]
    LockPoisoned,

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// A string-keyed store of text blobs. Calls are synchronous.
pub trait StorageBackend: Send + Sync {
    fn get(&self, slot: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, slot: &str, payload: &str) -> Result<(), StorageError>;
}

// ═══════════════════════════════════════════════════════════════════════
// MEMORY
// ═══════════════════════════════════════════════════════════════════════

/// Process-local slots. Used by tests and when no durable backend is configured.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a slot directly, bypassing the codec.
    pub fn with_slot(self, slot: &str, payload: &str) -> Self {
        if let Ok(mut slots) = self.slots.lock() {
            slots.insert(slot.to_string(), payload.to_string());
        }
        self
    }
}

impl StorageBackend for MemoryStorage {
    fn get(&self, slot: &str) -> Result<Option<String>, StorageError> {
        let slots = self.slots.lock().map_err(|_| StorageError::LockPoisoned)?;
        Ok(slots.get(slot).cloned())
    }

    fn set(&self, slot: &str, payload: &str) -> Result<(), StorageError> {
        let mut slots = self.slots.lock().map_err(|_| StorageError::LockPoisoned)?;
        slots.insert(slot.to_string(), payload.to_string());
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// FILESYSTEM
// ═══════════════════════════════════════════════════════════════════════

/// One `<slot>.json` file per slot inside `dir`.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn slot_path(&self, slot: &str) -> PathBuf {
        let file_name: String = slot
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", file_name))
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl StorageBackend for FileStorage {
    fn get(&self, slot: &str) -> Result<Option<String>, StorageError> {
        let path = self.slot_path(slot);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&path)?))
    }

    fn set(&self, slot: &str, payload: &str) -> Result<(), StorageError> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }
        let path = self.slot_path(slot);
        // Write to a temp file first, then rename for atomicity
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, payload)?;
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// BROWSER
// ═══════════════════════════════════════════════════════════════════════

/// `window.localStorage`. Looked up on every call; the handle itself is not `Send`.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

#[cfg(target_arch = "wasm32")]
impl LocalStorage {
    fn storage() -> Result<web_sys::Storage, StorageError> {
        let window = web_sys::window()
            .ok_or_else(|| StorageError::Unavailable("no window".to_string()))?;
        window
            .local_storage()
            .map_err(|e| StorageError::Unavailable(format!("{:?}", e)))?
            .ok_or_else(|| StorageError::Unavailable("localStorage disabled".to_string()))
    }
}

#[cfg(target_arch = "wasm32")]
impl StorageBackend for LocalStorage {
    fn get(&self, slot: &str) -> Result<Option<String>, StorageError> {
        Self::storage()?
            .get_item(slot)
            .map_err(|e| StorageError::Unavailable(format!("{:?}", e)))
    }

    fn set(&self, slot: &str, payload: &str) -> Result<(), StorageError> {
        Self::storage()?
            .set_item(slot, payload)
            .map_err(|e| StorageError::Unavailable(format!("{:?}", e)))
    }
}
