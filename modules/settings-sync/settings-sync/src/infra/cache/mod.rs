//! Best-effort persisted mirror of the last known settings per user.
//!
//! The cache is never the source of truth and never fails its caller: every
//! storage or serialization error is logged and swallowed.

pub mod file;
pub mod storage;

use std::sync::Arc;

use settings_sync_sdk::UserSettings;
use uuid::Uuid;

pub use file::FileCacheStorage;
pub use storage::{CacheError, CacheStorage, MemoryCacheStorage};

const KEY_PREFIX: &str = "settings_";

#[derive(Clone)]
pub struct SettingsCache {
    storage: Option<Arc<dyn CacheStorage>>,
}

impl std::fmt::Debug for SettingsCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsCache")
            .field("enabled", &self.storage.is_some())
            .finish_non_exhaustive()
    }
}

impl SettingsCache {
    #[must_use]
    pub fn new(storage: Arc<dyn CacheStorage>) -> Self {
        Self {
            storage: Some(storage),
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryCacheStorage::new()))
    }

    /// A cache that stores nothing and always misses.
    #[must_use]
    pub fn disabled() -> Self {
        Self { storage: None }
    }

    #[must_use]
    pub fn key(user_id: Uuid) -> String {
        format!("{KEY_PREFIX}{user_id}")
    }

    /// Last cached settings for the user, or `None` on a miss or any failure.
    #[must_use]
    pub fn get(&self, user_id: Uuid) -> Option<UserSettings> {
        let storage = self.storage.as_ref()?;
        let key = Self::key(user_id);

        let raw = match storage.get_item(&key) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Failed to read settings cache");
                return None;
            }
        };

        match serde_json::from_str::<UserSettings>(&raw) {
            Ok(settings) if settings.user_id == user_id => Some(settings),
            Ok(settings) => {
                tracing::warn!(
                    key = %key,
                    cached_user_id = %settings.user_id,
                    "Ignoring settings cache entry that belongs to another user"
                );
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Discarding unreadable settings cache entry");
                None
            }
        }
    }

    pub fn set(&self, user_id: Uuid, settings: &UserSettings) {
        let Some(storage) = &self.storage else {
            return;
        };
        let key = Self::key(user_id);

        let raw = match serde_json::to_string(settings) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Failed to serialize settings for cache");
                return;
            }
        };
        if let Err(e) = storage.set_item(&key, &raw) {
            tracing::warn!(error = %e, key = %key, "Failed to write settings cache");
        }
    }

    pub fn remove(&self, user_id: Uuid) {
        let Some(storage) = &self.storage else {
            return;
        };
        let key = Self::key(user_id);
        if let Err(e) = storage.remove_item(&key) {
            tracing::warn!(error = %e, key = %key, "Failed to remove settings cache entry");
        }
    }

    /// Removes every settings entry. Foreign keys in the same storage are kept.
    pub fn clear(&self) {
        let Some(storage) = &self.storage else {
            return;
        };
        let keys = match storage.keys() {
            Ok(keys) => keys,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to list settings cache entries");
                return;
            }
        };
        for key in keys.iter().filter(|k| k.starts_with(KEY_PREFIX)) {
            if let Err(e) = storage.remove_item(key) {
                tracing::warn!(error = %e, key = %key, "Failed to remove settings cache entry");
            }
        }
    }
}
