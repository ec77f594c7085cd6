//! Key/value stores standing in for browser storage.
//!
//! [`FileStore`] survives restarts (the local storage of the client) while
//! [`MemoryStore`] lives as long as the process (the session storage).

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StorageError;

/// Cached ingredient catalog with its fetch timestamp.
pub const INGREDIENTS_CACHE_KEY: &str = "ingredients_cache";
/// Backup of the in-progress recipe draft.
pub const FORM_BACKUP_KEY: &str = "recipe_form_backup";
/// Session-scoped form progress, used only for display.
pub const FORM_STATE_KEY: &str = "recipe_form_state";
/// Session flag set once the draft restore has been offered.
pub const RESTORE_OFFERED_KEY: &str = "draft_restore_offered";
/// Logged-in user and bearer token.
pub const AUTH_SESSION_KEY: &str = "auth_session";

/// String key/value storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Read and deserialize a JSON entry.
///
/// A value that fails to parse is removed and reported as `Corrupted`.
pub fn get_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            tracing::warn!(key, error = %e, "removing corrupted storage entry");
            store.remove(key)?;
            Err(StorageError::Corrupted {
                key: key.to_string(),
                message: e.to_string(),
            })
        }
    }
}

pub fn set_json<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value).map_err(|e| StorageError::Serialize {
        key: key.to_string(),
        message: e.to_string(),
    })?;
    store.set(key, &raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corrupted_json_is_removed() {
        let store = MemoryStore::new();
        store.set("k", "{not json").unwrap();

        let result: Result<Option<Vec<u32>>, _> = get_json(&store, "k");
        assert!(matches!(result, Err(StorageError::Corrupted { .. })));
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_json_round_trip() {
        let store = MemoryStore::new();
        set_json(&store, "k", &vec![1u32, 2, 3]).unwrap();
        let value: Option<Vec<u32>> = get_json(&store, "k").unwrap();
        assert_eq!(value, Some(vec![1, 2, 3]));
    }
}
