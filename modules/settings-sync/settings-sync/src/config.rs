use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use serde::Deserialize;

use crate::domain::retry::RetryConfig;
use crate::infra::cache::{FileCacheStorage, SettingsCache};

/// Prefix of environment overrides; `__` separates nested keys.
pub const ENV_PREFIX: &str = "SETTINGS_SYNC_";

/// Configuration for the settings sync engine
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsSyncConfig {
    pub retry: RetryConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

impl SettingsSyncConfig {
    /// Loads configuration from an optional YAML file, then applies
    /// `SETTINGS_SYNC_*` environment overrides.
    ///
    /// # Errors
    /// Fails when the file is missing or any value does not deserialize.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            anyhow::ensure!(
                path.is_file(),
                "settings-sync config file not found: {}",
                path.display()
            );
            figment = figment.merge(Yaml::file(path));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self::from_figment(&figment)
    }

    /// # Errors
    /// Fails when any value does not deserialize.
    pub fn from_figment(figment: &Figment) -> anyhow::Result<Self> {
        figment
            .extract()
            .context("invalid settings-sync configuration")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackend {
    /// One JSON file per user under `dir`
    #[default]
    File,
    /// Process memory only
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub enabled: bool,
    pub backend: CacheBackend,
    /// Defaults to `<platform cache dir>/settings-sync`
    pub dir: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: CacheBackend::File,
            dir: None,
        }
    }
}

impl CacheConfig {
    /// Builds the cache. A file backend without a usable directory degrades
    /// to an in-memory cache.
    #[must_use]
    pub fn build(&self) -> SettingsCache {
        if !self.enabled {
            return SettingsCache::disabled();
        }
        match self.backend {
            CacheBackend::Memory => SettingsCache::in_memory(),
            CacheBackend::File => {
                let storage = match &self.dir {
                    Some(dir) => Ok(FileCacheStorage::new(dir)),
                    None => FileCacheStorage::in_default_location(),
                };
                match storage {
                    Ok(storage) => {
                        tracing::debug!(dir = %storage.dir().display(), "Using file settings cache");
                        SettingsCache::new(Arc::new(storage))
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "File settings cache unavailable, using memory");
                        SettingsCache::in_memory()
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence when set.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Plain,
        }
    }
}
