use std::collections::HashMap;

use parking_lot::Mutex;

/// Failures of the underlying persistence medium.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid cache key '{0}'")]
    InvalidKey(String),

    #[error("cache storage unavailable: {0}")]
    Unavailable(String),
}

/// String key-value medium behind [`super::SettingsCache`].
///
/// Implementations may fail freely; the cache layer never lets a
/// `CacheError` escape.
pub trait CacheStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, CacheError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), CacheError>;

    fn remove_item(&self, key: &str) -> Result<(), CacheError>;

    fn keys(&self) -> Result<Vec<String>, CacheError>;
}

/// Process-local storage. Contents do not survive a restart.
#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryCacheStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStorage for MemoryCacheStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.items.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), CacheError> {
        self.items.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), CacheError> {
        self.items.lock().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        Ok(self.items.lock().keys().cloned().collect())
    }
}
