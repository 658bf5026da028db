//! Consumer-facing accessors over a [`SettingsStore`].
//!
//! Handles are cheap to clone and hold no state of their own; every read goes
//! to the store. Authorization failures are forwarded to the session's
//! unauthorized hook before being returned.

mod categories;

use std::sync::Arc;

use settings_sync_sdk::{
    AccountPatch, Category, CategoryRecord, DisplayPatch, ExportedData, NotificationPatch,
    PrivacyPatch, ProfilePatch, UserSettings,
};

pub use categories::{
    AccountsHandle, DisplayHandle, NotificationsHandle, PrivacyHandle, ProfileHandle,
};

use crate::domain::error::StoreError;
use crate::domain::store::SettingsStore;

/// Called with the user id whenever an operation fails with an authorization error.
pub type UnauthorizedHook = Arc<dyn Fn(uuid::Uuid) + Send + Sync>;

#[derive(Clone)]
pub struct SettingsHandle {
    store: Arc<SettingsStore>,
    on_unauthorized: Option<UnauthorizedHook>,
}

impl std::fmt::Debug for SettingsHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsHandle")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl SettingsHandle {
    #[must_use]
    pub fn new(store: Arc<SettingsStore>) -> Self {
        Self {
            store,
            on_unauthorized: None,
        }
    }

    #[must_use]
    pub fn with_unauthorized_hook(mut self, hook: UnauthorizedHook) -> Self {
        self.on_unauthorized = Some(hook);
        self
    }

    #[must_use]
    pub fn store(&self) -> &Arc<SettingsStore> {
        &self.store
    }

    #[must_use]
    pub fn settings(&self) -> Option<UserSettings> {
        self.store.settings()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.store.view().is_loading()
    }

    #[must_use]
    pub fn error(&self) -> Option<StoreError> {
        self.store.view().error
    }

    fn route<T>(&self, result: Result<T, StoreError>) -> Result<T, StoreError> {
        if let Err(err) = &result
            && err.is_unauthorized()
            && let Some(hook) = &self.on_unauthorized
        {
            tracing::warn!(user_id = %self.store.user_id(), "Settings session lost authorization");
            hook(self.store.user_id());
        }
        result
    }

    /// # Errors
    /// See [`SettingsStore::update_category`].
    pub async fn update_profile(&self, patch: ProfilePatch) -> Result<CategoryRecord, StoreError> {
        self.route(self.store.update_profile(patch).await)
    }

    /// # Errors
    /// See [`SettingsStore::update_category`].
    pub async fn update_notifications(
        &self,
        patch: NotificationPatch,
    ) -> Result<CategoryRecord, StoreError> {
        self.route(self.store.update_notifications(patch).await)
    }

    /// # Errors
    /// See [`SettingsStore::update_category`].
    pub async fn update_display(&self, patch: DisplayPatch) -> Result<CategoryRecord, StoreError> {
        self.route(self.store.update_display(patch).await)
    }

    /// # Errors
    /// See [`SettingsStore::update_category`].
    pub async fn update_privacy(&self, patch: PrivacyPatch) -> Result<CategoryRecord, StoreError> {
        self.route(self.store.update_privacy(patch).await)
    }

    /// # Errors
    /// See [`SettingsStore::update_category`].
    pub async fn update_accounts(&self, patch: AccountPatch) -> Result<CategoryRecord, StoreError> {
        self.route(self.store.update_accounts(patch).await)
    }

    /// # Errors
    /// See [`SettingsStore::change_password`].
    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<(), StoreError> {
        self.route(
            self.store
                .change_password(current_password, new_password, confirm_password)
                .await,
        )
    }

    /// # Errors
    /// See [`SettingsStore::change_email`].
    pub async fn change_email(&self, new_email: &str) -> Result<(), StoreError> {
        self.route(self.store.change_email(new_email).await)
    }

    /// # Errors
    /// See [`SettingsStore::reset_category`].
    pub async fn reset_settings(
        &self,
        category: Option<Category>,
    ) -> Result<UserSettings, StoreError> {
        self.route(self.store.reset_category(category).await)
    }

    /// # Errors
    /// See [`SettingsStore::export_all`].
    pub async fn export_data(&self) -> Result<ExportedData, StoreError> {
        self.route(self.store.export_all().await)
    }

    /// # Errors
    /// See [`SettingsStore::load`].
    pub async fn refresh_settings(&self) -> Result<UserSettings, StoreError> {
        self.route(self.store.load().await)
    }

    #[must_use]
    pub fn profile(&self) -> ProfileHandle {
        ProfileHandle::new(self.clone())
    }

    #[must_use]
    pub fn notifications(&self) -> NotificationsHandle {
        NotificationsHandle::new(self.clone())
    }

    #[must_use]
    pub fn display(&self) -> DisplayHandle {
        DisplayHandle::new(self.clone())
    }

    #[must_use]
    pub fn privacy(&self) -> PrivacyHandle {
        PrivacyHandle::new(self.clone())
    }

    #[must_use]
    pub fn accounts(&self) -> AccountsHandle {
        AccountsHandle::new(self.clone())
    }
}
