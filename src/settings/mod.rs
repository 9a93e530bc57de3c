//! Store settings, read from a RON file.
//!
//! ```ron
//! (
//!     backend: File,
//!     save_dir: Some("saves"),
//!     slots: (game: "lingxu-game", farm: "lingxu-farm"),
//! )
//! ```
//!
//! Every field is optional; a missing or unreadable file yields the defaults.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::save::{MemoryStorage, StorageBackend};

pub const DEFAULT_SETTINGS_PATH: &str = "config/lingxu.ron";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("could not read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid settings: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendKind {
    /// Slots live only as long as the process.
    Memory,
    /// One JSON file per slot under `save_dir`.
    File,
    /// Browser `localStorage` (wasm32 only).
    LocalStorage,
}

impl Default for BackendKind {
    fn default() -> Self {
        if cfg!(target_arch = "wasm32") {
            BackendKind::LocalStorage
        } else {
            BackendKind::File
        }
    }
}

/// Durable slot name per store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotNames {
    pub game: String,
    pub farm: String,
    pub fishing: String,
    pub shop: String,
}

impl Default for SlotNames {
    fn default() -> Self {
        Self {
            game: String::from("lingxu-game"),
            farm: String::from("lingxu-farm"),
            fishing: String::from("lingxu-fishing"),
            shop: String::from("lingxu-shop"),
        }
    }
}

#[derive(Resource, Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub backend: BackendKind,
    /// Directory for the file backend. Defaults to `saves/` next to the executable.
    pub save_dir: Option<PathBuf>,
    pub slots: SlotNames,
}

impl StoreSettings {
    pub fn from_ron(text: &str) -> Result<Self, SettingsError> {
        Ok(ron::from_str(text)?)
    }

    pub fn read(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_ron(&text)
    }

    /// Read `path`, falling back to the defaults when it is missing or invalid.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            info!("[Settings] {} not found, using defaults.", path.display());
            return Self::default();
        }
        match Self::read(path) {
            Ok(settings) => {
                info!("[Settings] Loaded {}.", path.display());
                settings
            }
            Err(e) => {
                warn!("[Settings] {}. Using defaults.", e);
                Self::default()
            }
        }
    }

    pub fn resolved_save_dir(&self) -> PathBuf {
        if let Some(dir) = &self.save_dir {
            return dir.clone();
        }
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."));
        exe_dir.join("saves")
    }

    /// Build the configured backend, substituting one the target supports when needed.
    pub fn open_backend(&self) -> Arc<dyn StorageBackend> {
        match self.backend {
            BackendKind::Memory => Arc::new(MemoryStorage::new()),
            #[cfg(not(target_arch = "wasm32"))]
            BackendKind::File => Arc::new(crate::save::FileStorage::new(self.resolved_save_dir())),
            #[cfg(not(target_arch = "wasm32"))]
            BackendKind::LocalStorage => {
                warn!("[Settings] localStorage is only available in the browser. Using memory slots.");
                Arc::new(MemoryStorage::new())
            }
            #[cfg(target_arch = "wasm32")]
            BackendKind::File => {
                warn!("[Settings] No filesystem in the browser. Using localStorage.");
                Arc::new(crate::save::LocalStorage)
            }
            #[cfg(target_arch = "wasm32")]
            BackendKind::LocalStorage => Arc::new(crate::save::LocalStorage),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_ron_is_defaults() {
        let settings = StoreSettings::from_ron("()").unwrap();
        assert_eq!(settings, StoreSettings::default());
    }

    #[test]
    fn test_partial_slot_names() {
        let settings = StoreSettings::from_ron(
            r#"(backend: Memory, slots: (game: "custom-game"))"#,
        )
        .unwrap();
        assert_eq!(settings.backend, BackendKind::Memory);
        assert_eq!(settings.slots.game, "custom-game");
        assert_eq!(settings.slots.farm, "lingxu-farm");
    }

    #[test]
    fn test_save_dir_override() {
        let settings = StoreSettings::from_ron(r#"(save_dir: Some("/tmp/lingxu"))"#).unwrap();
        assert_eq!(settings.resolved_save_dir(), PathBuf::from("/tmp/lingxu"));
    }

    #[test]
    fn test_invalid_ron_is_an_error() {
        assert!(matches!(
            StoreSettings::from_ron("(backend: Floppy)"),
            Err(SettingsError::Parse(_))
        ));
    }

    #[test]
    fn test_load_missing_file_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = StoreSettings::load(&tmp.path().join("absent.ron"));
        assert_eq!(settings, StoreSettings::default());
    }

    #[test]
    fn test_load_invalid_file_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bad.ron");
        std::fs::write(&path, "(((").unwrap();
        assert_eq!(StoreSettings::load(&path), StoreSettings::default());
    }

    #[test]
    fn test_memory_backend_round_trip() {
        let settings = StoreSettings {
            backend: BackendKind::Memory,
            ..Default::default()
        };
        let backend = settings.open_backend();
        backend.set("x", "y").unwrap();
        assert_eq!(backend.get("x").unwrap().as_deref(), Some("y"));
    }
}
