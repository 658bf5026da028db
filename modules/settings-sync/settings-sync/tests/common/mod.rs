#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

//! Shared fixtures for settings-sync integration tests

use std::sync::Arc;

use settings_sync::infra::cache::FileCacheStorage;
use settings_sync::{
    ExponentialBackoff, LocalSettingsService, RetryConfig, RetryPolicy, SettingsCache,
    SettingsSession,
};

pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(RetryConfig {
        backoff: ExponentialBackoff::fast(),
        ..RetryConfig::default()
    })
}

pub fn file_cache(dir: &tempfile::TempDir) -> SettingsCache {
    SettingsCache::new(Arc::new(FileCacheStorage::new(dir.path())))
}

pub fn session(service: &Arc<LocalSettingsService>, cache: &SettingsCache) -> SettingsSession {
    SettingsSession::new(service.clone(), cache.clone(), fast_retry())
}
