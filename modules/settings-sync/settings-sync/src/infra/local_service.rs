use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::one::RefMut;
use settings_sync_sdk::{
    AccountPatch, AccountSettings, Category, CategoryPatch, DisplayPatch, DisplaySettings,
    ExportedData, NotificationPatch, NotificationSettings, PrivacyPatch, PrivacySettings,
    ProfilePatch, ProfileSettings, SettingsError, SettingsServiceApi, UserSettings,
};
use uuid::Uuid;

use crate::domain::validator::{validate_email_change, validate_password_change, validate_patch};

/// In-process implementation of [`SettingsServiceApi`].
///
/// Keeps per-user records in memory, validates like a server would and
/// stamps `updated_at` on every accepted write. Can be switched offline to
/// answer every call with a network error.
#[derive(Debug, Default)]
pub struct LocalSettingsService {
    records: DashMap<Uuid, UserSettings>,
    passwords: DashMap<Uuid, String>,
    offline: AtomicBool,
}

impl LocalSettingsService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a stored record.
    pub fn insert(&self, settings: UserSettings) {
        self.records.insert(settings.user_id, settings);
    }

    /// Seeds the password `change_password` checks the current one against.
    pub fn set_password(&self, user_id: Uuid, password: impl Into<String>) {
        self.passwords.insert(user_id, password.into());
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    #[must_use]
    pub fn stored(&self, user_id: Uuid) -> Option<UserSettings> {
        self.records.get(&user_id).map(|r| r.value().clone())
    }

    fn ensure_online(&self) -> Result<(), SettingsError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(SettingsError::network("settings service is unreachable"))
        } else {
            Ok(())
        }
    }

    fn record(&self, user_id: Uuid) -> RefMut<'_, Uuid, UserSettings> {
        self.records
            .entry(user_id)
            .or_insert_with(|| UserSettings::with_defaults(user_id))
    }

    fn apply<T>(
        &self,
        user_id: Uuid,
        patch: &CategoryPatch,
        pick: impl FnOnce(&UserSettings) -> T,
    ) -> Result<T, SettingsError> {
        self.ensure_online()?;
        let report = validate_patch(patch);
        if !report.is_valid() {
            return Err(SettingsError::validation(report.to_string()));
        }

        let mut record = self.record(user_id);
        patch.apply_to(record.value_mut());
        stamp(record.value_mut(), patch.category());
        tracing::debug!(user_id = %user_id, category = %patch.category(), "Stored settings update");
        Ok(pick(record.value()))
    }
}

fn stamp(settings: &mut UserSettings, category: Category) {
    let now = Some(Utc::now());
    match category {
        Category::Profile => settings.profile.updated_at = now,
        Category::Notifications => settings.notifications.updated_at = now,
        Category::Display => settings.display.updated_at = now,
        Category::Privacy => settings.privacy.updated_at = now,
        Category::Accounts => settings.accounts.updated_at = now,
    }
}

#[async_trait]
impl SettingsServiceApi for LocalSettingsService {
    async fn get_user_settings(&self, user_id: Uuid) -> Result<UserSettings, SettingsError> {
        self.ensure_online()?;
        Ok(self.record(user_id).value().clone())
    }

    async fn update_profile_settings(
        &self,
        user_id: Uuid,
        patch: ProfilePatch,
    ) -> Result<ProfileSettings, SettingsError> {
        self.apply(user_id, &patch.into(), |s| s.profile.clone())
    }

    async fn update_notification_settings(
        &self,
        user_id: Uuid,
        patch: NotificationPatch,
    ) -> Result<NotificationSettings, SettingsError> {
        self.apply(user_id, &patch.into(), |s| s.notifications.clone())
    }

    async fn update_display_settings(
        &self,
        user_id: Uuid,
        patch: DisplayPatch,
    ) -> Result<DisplaySettings, SettingsError> {
        self.apply(user_id, &patch.into(), |s| s.display.clone())
    }

    async fn update_privacy_settings(
        &self,
        user_id: Uuid,
        patch: PrivacyPatch,
    ) -> Result<PrivacySettings, SettingsError> {
        self.apply(user_id, &patch.into(), |s| s.privacy.clone())
    }

    async fn update_account_settings(
        &self,
        user_id: Uuid,
        patch: AccountPatch,
    ) -> Result<AccountSettings, SettingsError> {
        self.apply(user_id, &patch.into(), |s| s.accounts.clone())
    }

    async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<(), SettingsError> {
        self.ensure_online()?;
        let report = validate_password_change(current_password, new_password, confirm_password);
        if !report.is_valid() {
            return Err(SettingsError::validation(report.to_string()));
        }
        if let Some(stored) = self.passwords.get(&user_id)
            && stored.as_str() != current_password
        {
            return Err(SettingsError::validation("Current password is incorrect"));
        }
        self.passwords.insert(user_id, new_password.to_owned());
        tracing::debug!(user_id = %user_id, "Password changed");
        Ok(())
    }

    async fn change_email(&self, user_id: Uuid, new_email: &str) -> Result<(), SettingsError> {
        self.ensure_online()?;
        let report = validate_email_change(new_email);
        if !report.is_valid() {
            return Err(SettingsError::validation(report.to_string()));
        }
        let new_email = new_email.trim();
        let taken = self
            .records
            .iter()
            .any(|r| r.user_id != user_id && r.profile.email.eq_ignore_ascii_case(new_email));
        if taken {
            return Err(SettingsError::validation("Email is already in use"));
        }

        let mut record = self.record(user_id);
        record.profile.email = new_email.to_owned();
        stamp(record.value_mut(), Category::Profile);
        Ok(())
    }

    async fn reset_user_settings(
        &self,
        user_id: Uuid,
        category: Option<Category>,
    ) -> Result<(), SettingsError> {
        self.ensure_online()?;
        let mut record = self.record(user_id);
        match category {
            Some(category) => record.reset(category),
            None => {
                for category in Category::ALL {
                    record.reset(category);
                }
            }
        }
        tracing::debug!(user_id = %user_id, category = ?category, "Settings reset");
        Ok(())
    }

    async fn export_user_data(&self, user_id: Uuid) -> Result<ExportedData, SettingsError> {
        self.ensure_online()?;
        let settings = self.record(user_id).value().clone();
        Ok(ExportedData {
            user_id,
            exported_at: Utc::now(),
            settings,
            datasets: BTreeMap::new(),
        })
    }
}
