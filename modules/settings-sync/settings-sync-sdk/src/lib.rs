//! Settings Sync SDK
//!
//! This crate provides the public contract of the settings synchronization engine:
//! - `SettingsServiceApi` trait for the remote settings service
//! - Model types (`UserSettings`, the five category records, `Category`)
//! - Partial update types (`ProfilePatch`, ..., `CategoryPatch`)
//! - Error type (`SettingsError`) with retry classification
//!
//! Consumers hand an implementation of `SettingsServiceApi` to the core:
//! ```ignore
//! let remote: Arc<dyn SettingsServiceApi> = Arc::new(HttpSettingsClient::new(base_url));
//! let settings = remote.get_user_settings(user_id).await?;
//! ```

#![forbid(unsafe_code)]

pub mod api;
pub mod errors;
pub mod models;
pub mod patches;

pub use api::SettingsServiceApi;
pub use errors::{ErrorKind, SettingsError};
pub use models::{
    AccountSettings, Category, CategoryRecord, Currency, DateFormat, DigestFrequency,
    DisplaySettings, ExportedData, NotificationSettings, PrivacySettings, ProfileSettings,
    SyncFrequency, Theme, UnknownCategory, UserSettings,
};
pub use patches::{
    AccountPatch, CategoryPatch, DisplayPatch, NotificationPatch, PrivacyPatch, ProfilePatch,
};
