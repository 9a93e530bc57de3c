use bevy::prelude::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::settings::StoreSettings;
use crate::shared::*;

mod backend;

pub use backend::*;

// ═══════════════════════════════════════════════════════════════════════
// CODEC
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed save payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("save payload is not an object")]
    NotAnObject,
}

pub fn encode<T: Serialize>(state: &T) -> Result<String, CodecError> {
    Ok(serde_json::to_string(state)?)
}

/// Parse `payload` and lay its top-level fields over `defaults`.
///
/// Fields missing from an older blob keep their default values; fields the
/// current model no longer has are ignored.
pub fn decode<T>(payload: &str, defaults: &T) -> Result<T, CodecError>
where
    T: Serialize + DeserializeOwned,
{
    let Value::Object(persisted) = serde_json::from_str::<Value>(payload)? else {
        return Err(CodecError::NotAnObject);
    };

    let mut merged = serde_json::to_value(defaults)?;
    match &mut merged {
        Value::Object(base) => {
            for (key, value) in persisted {
                base.insert(key, value);
            }
        }
        _ => return Err(CodecError::NotAnObject),
    }

    Ok(serde_json::from_value(merged)?)
}

/// An aggregate a store can persist.
pub trait SaveData: Serialize + DeserializeOwned + Default {
    /// Restore invariants a well-formed but inconsistent blob can break.
    /// Runs after every successful decode.
    fn repair(&mut self) {}
}

/// Read `slot`, falling back to `T::default()` when it is missing or corrupt.
///
/// A corrupt slot is overwritten with the defaults so the next load is clean.
pub fn load_or_default<T: SaveData>(storage: &dyn StorageBackend, slot: &str) -> T {
    let defaults = T::default();
    match storage.get(slot) {
        Ok(None) => {
            debug!("[Save] Slot '{}' is empty, starting from defaults.", slot);
            defaults
        }
        Ok(Some(payload)) => match decode(&payload, &defaults) {
            Ok(mut state) => {
                T::repair(&mut state);
                info!("[Save] Loaded slot '{}'.", slot);
                state
            }
            Err(e) => {
                warn!("[Save] Slot '{}' is corrupt ({}). Resetting to defaults.", slot, e);
                persist(storage, slot, &defaults);
                defaults
            }
        },
        Err(e) => {
            warn!("[Save] Could not read slot '{}': {}. Using defaults.", slot, e);
            defaults
        }
    }
}

/// Serialize `state` into `slot`. Failures are logged, never propagated.
pub fn persist<T: Serialize>(storage: &dyn StorageBackend, slot: &str, state: &T) -> bool {
    let payload = match encode(state) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("[Save] Could not serialize slot '{}': {}", slot, e);
            return false;
        }
    };
    match storage.set(slot, &payload) {
        Ok(()) => true,
        Err(e) => {
            warn!("[Save] Write to slot '{}' FAILED: {}", slot, e);
            false
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// RESOURCES
// ═══════════════════════════════════════════════════════════════════════

/// The storage backend every store in the app persists through.
#[derive(Resource, Clone)]
pub struct StorageHandle(pub Arc<dyn StorageBackend>);

/// The clock every store in the app reads time from.
#[derive(Resource, Clone)]
pub struct GameClock(pub SharedClock);

// ═══════════════════════════════════════════════════════════════════════
// PLUGIN
// ═══════════════════════════════════════════════════════════════════════

/// Installs settings, storage and clock. Must be added before the store plugins.
pub struct SavePlugin {
    pub settings: StoreSettings,
    pub storage: Option<Arc<dyn StorageBackend>>,
    pub clock: Option<SharedClock>,
}

impl SavePlugin {
    pub fn new(settings: StoreSettings) -> Self {
        Self {
            settings,
            storage: None,
            clock: None,
        }
    }

    /// In-memory slots and a caller-controlled clock.
    pub fn in_memory(storage: Arc<MemoryStorage>, clock: SharedClock) -> Self {
        Self {
            settings: StoreSettings::default(),
            storage: Some(storage as Arc<dyn StorageBackend>),
            clock: Some(clock),
        }
    }
}

impl Default for SavePlugin {
    fn default() -> Self {
        Self::new(StoreSettings::default())
    }
}

impl Plugin for SavePlugin {
    fn build(&self, app: &mut App) {
        let storage = self
            .storage
            .clone()
            .unwrap_or_else(|| self.settings.open_backend());
        let clock = self
            .clock
            .clone()
            .unwrap_or_else(|| Arc::new(SystemClock) as SharedClock);

        app.insert_resource(self.settings.clone())
            .insert_resource(StorageHandle(storage))
            .insert_resource(GameClock(clock));

        info!("[Save] SavePlugin registered ({:?} backend).", self.settings.backend);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Sample {
        gold: u64,
        name: String,
        added_later: Vec<u32>,
    }

    impl Default for Sample {
        fn default() -> Self {
            Self {
                gold: 10,
                name: "default".to_string(),
                added_later: vec![1, 2, 3],
            }
        }
    }

    impl SaveData for Sample {
        fn repair(&mut self) {
            if self.name.is_empty() {
                self.name = "default".to_string();
            }
        }
    }

    #[test]
    fn test_round_trip_preserves_every_field() {
        let original = Sample {
            gold: 99,
            name: "saved".to_string(),
            added_later: vec![],
        };
        let payload = encode(&original).unwrap();
        let decoded: Sample = decode(&payload, &Sample::default()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_stale_blob_keeps_new_defaults() {
        let decoded: Sample = decode(r#"{"gold": 5, "name": "old"}"#, &Sample::default()).unwrap();
        assert_eq!(decoded.gold, 5);
        assert_eq!(decoded.name, "old");
        assert_eq!(decoded.added_later, vec![1, 2, 3]);
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let decoded: Sample =
            decode(r#"{"gold": 5, "retired_field": true}"#, &Sample::default()).unwrap();
        assert_eq!(decoded.gold, 5);
    }

    #[test]
    fn test_non_object_payload_is_rejected() {
        let err = decode::<Sample>("[1, 2]", &Sample::default()).unwrap_err();
        assert!(matches!(err, CodecError::NotAnObject));
        assert!(decode::<Sample>("{not json", &Sample::default()).is_err());
    }

    #[test]
    fn test_corrupt_slot_resets_and_rewrites_defaults() {
        let storage = MemoryStorage::new().with_slot("sample", "{{{ garbage");
        let loaded: Sample = load_or_default(&storage, "sample");
        assert_eq!(loaded, Sample::default());

        let rewritten = storage.get("sample").unwrap().unwrap();
        let reparsed: Sample = decode(&rewritten, &Sample::default()).unwrap();
        assert_eq!(reparsed, Sample::default());
    }

    #[test]
    fn test_wrong_field_type_falls_back_to_defaults() {
        let storage = MemoryStorage::new().with_slot("sample", r#"{"gold": "lots"}"#);
        let loaded: Sample = load_or_default(&storage, "sample");
        assert_eq!(loaded, Sample::default());
    }

    #[test]
    fn test_missing_slot_uses_defaults_without_writing() {
        let storage = MemoryStorage::new();
        let loaded: Sample = load_or_default(&storage, "sample");
        assert_eq!(loaded, Sample::default());
        assert!(storage.get("sample").unwrap().is_none());
    }

    #[test]
    fn test_loaded_state_is_repaired() {
        let storage = MemoryStorage::new().with_slot("sample", r#"{"gold": 3, "name": ""}"#);
        let loaded: Sample = load_or_default(&storage, "sample");
        assert_eq!(loaded.gold, 3);
        assert_eq!(loaded.name, "default");
    }

    #[test]
    fn test_persist_then_load() {
        let storage = MemoryStorage::new();
        let state = Sample {
            gold: 7,
            ..Sample::default()
        };
        assert!(persist(&storage, "sample", &state));
        let loaded: Sample = load_or_default(&storage, "sample");
        assert_eq!(loaded, state);
    }
}
