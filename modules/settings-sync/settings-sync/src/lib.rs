//! Client-side settings synchronization.
//!
//! A [`SettingsSession`] owns the signed-in user's [`SettingsStore`], which
//! applies category updates optimistically, sends them through a retrying
//! [`SettingsServiceApi`] client, rolls back on failure and mirrors the last
//! confirmed settings into a [`SettingsCache`].
//!
//! The service contract and data model live in `settings-sync-sdk` and are
//! re-exported here.
#![forbid(unsafe_code)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub use settings_sync_sdk::{
    AccountPatch, AccountSettings, Category, CategoryPatch, CategoryRecord, Currency,
    DateFormat, DigestFrequency, DisplayPatch, DisplaySettings, ErrorKind, ExportedData,
    NotificationPatch, NotificationSettings, PrivacyPatch, PrivacySettings, ProfilePatch,
    ProfileSettings, SettingsError, SettingsServiceApi, SyncFrequency, Theme, UserSettings,
};

pub mod config;
pub mod domain;
pub mod hooks;
pub mod humantime_serde;
pub mod infra;
pub mod session;
pub mod telemetry;

pub use config::SettingsSyncConfig;
pub use domain::error::StoreError;
pub use domain::events::{BroadcastEventPublisher, ChangeEvent, EventPublisher, LogEventPublisher};
pub use domain::retry::{ExponentialBackoff, RetryConfig, RetryPolicy};
pub use domain::store::{LoadPhase, SettingsStore, StoreView};
pub use domain::validator::ValidationReport;
pub use hooks::SettingsHandle;
pub use infra::cache::SettingsCache;
pub use infra::local_service::LocalSettingsService;
pub use session::SettingsSession;
pub use telemetry::init_logging;
