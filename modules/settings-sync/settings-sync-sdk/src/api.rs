//! `SettingsServiceApi` trait definition.
//!
//! This trait is the contract of the remote settings service. The sync engine
//! consumes it and never implements persistence, transport or auth itself.

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::SettingsError;
use crate::models::{
    AccountSettings, Category, DisplaySettings, ExportedData, NotificationSettings,
    PrivacySettings, ProfileSettings, UserSettings,
};
use crate::patches::{AccountPatch, DisplayPatch, NotificationPatch, PrivacyPatch, ProfilePatch};

/// Remote settings service.
///
/// Every category update returns the server's authoritative copy of that
/// category, which may include server-derived fields such as `updated_at`.
/// Every call may fail with a classified [`SettingsError`].
#[async_trait]
pub trait SettingsServiceApi: Send + Sync {
    /// Full settings record for the user.
    /// Services return defaults when the user has no record yet.
    async fn get_user_settings(&self, user_id: Uuid) -> Result<UserSettings, SettingsError>;

    async fn update_profile_settings(
        &self,
        user_id: Uuid,
        patch: ProfilePatch,
    ) -> Result<ProfileSettings, SettingsError>;

    async fn update_notification_settings(
        &self,
        user_id: Uuid,
        patch: NotificationPatch,
    ) -> Result<NotificationSettings, SettingsError>;

    async fn update_display_settings(
        &self,
        user_id: Uuid,
        patch: DisplayPatch,
    ) -> Result<DisplaySettings, SettingsError>;

    async fn update_privacy_settings(
        &self,
        user_id: Uuid,
        patch: PrivacyPatch,
    ) -> Result<PrivacySettings, SettingsError>;

    async fn update_account_settings(
        &self,
        user_id: Uuid,
        patch: AccountPatch,
    ) -> Result<AccountSettings, SettingsError>;

    async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<(), SettingsError>;

    async fn change_email(&self, user_id: Uuid, new_email: &str) -> Result<(), SettingsError>;

    /// Resets one category, or every category when `category` is `None`.
    async fn reset_user_settings(
        &self,
        user_id: Uuid,
        category: Option<Category>,
    ) -> Result<(), SettingsError>;

    async fn export_user_data(&self, user_id: Uuid) -> Result<ExportedData, SettingsError>;
}
