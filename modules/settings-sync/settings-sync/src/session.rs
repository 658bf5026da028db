//! Process-wide scope for the signed-in user's settings.
//!
//! Exactly one store is active at a time. Signing in as a different user or
//! signing out tears the previous store down (memory and cache entry), so
//! settings never leak across users.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use settings_sync_sdk::SettingsServiceApi;
use uuid::Uuid;

use crate::config::SettingsSyncConfig;
use crate::domain::events::{ChangeEvent, EventPublisher, LogEventPublisher};
use crate::domain::retry::RetryPolicy;
use crate::domain::store::SettingsStore;
use crate::hooks::{SettingsHandle, UnauthorizedHook};
use crate::infra::cache::SettingsCache;

pub struct SettingsSession {
    remote: Arc<dyn SettingsServiceApi>,
    cache: SettingsCache,
    retry: RetryPolicy,
    events: Arc<dyn EventPublisher<ChangeEvent>>,
    active: Arc<ArcSwapOption<SettingsStore>>,
    on_unauthorized: Option<UnauthorizedHook>,
}

impl std::fmt::Debug for SettingsSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsSession")
            .field("cache", &self.cache)
            .field("retry", &self.retry)
            .field("active_user", &self.active_user())
            .finish_non_exhaustive()
    }
}

impl SettingsSession {
    #[must_use]
    pub fn new(remote: Arc<dyn SettingsServiceApi>, cache: SettingsCache, retry: RetryPolicy) -> Self {
        Self {
            remote,
            cache,
            retry,
            events: Arc::new(LogEventPublisher),
            active: Arc::new(ArcSwapOption::from(None)),
            on_unauthorized: None,
        }
    }

    #[must_use]
    pub fn from_config(remote: Arc<dyn SettingsServiceApi>, config: &SettingsSyncConfig) -> Self {
        Self::new(
            remote,
            config.cache.build(),
            RetryPolicy::new(config.retry.clone()),
        )
    }

    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn EventPublisher<ChangeEvent>>) -> Self {
        self.events = events;
        self
    }

    /// Hook invoked after the session signed the user out because the
    /// service rejected their authorization.
    #[must_use]
    pub fn with_unauthorized_hook(mut self, hook: UnauthorizedHook) -> Self {
        self.on_unauthorized = Some(hook);
        self
    }

    /// Activates the store for `user_id`, reusing it if that user is already
    /// signed in. Call [`SettingsHandle::refresh_settings`] to load.
    #[must_use]
    pub fn sign_in(&self, user_id: Uuid) -> SettingsHandle {
        if let Some(store) = self.active.load_full()
            && store.user_id() == user_id
        {
            return self.handle(store);
        }

        let store = Arc::new(
            SettingsStore::new(
                user_id,
                Arc::clone(&self.remote),
                self.cache.clone(),
                self.retry.clone(),
            )
            .with_events(Arc::clone(&self.events)),
        );
        if let Some(previous) = self.active.swap(Some(Arc::clone(&store))) {
            tracing::info!(
                previous_user = %previous.user_id(),
                user_id = %user_id,
                "Switching settings session user"
            );
            previous.teardown();
        }
        self.handle(store)
    }

    /// Tears down the active store: in-memory state and its cache entry.
    pub fn sign_out(&self) {
        if let Some(store) = self.active.swap(None) {
            tracing::info!(user_id = %store.user_id(), "Settings session signed out");
            store.teardown();
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<SettingsHandle> {
        self.active.load_full().map(|store| self.handle(store))
    }

    #[must_use]
    pub fn active_user(&self) -> Option<Uuid> {
        self.active.load().as_ref().map(|store| store.user_id())
    }

    fn handle(&self, store: Arc<SettingsStore>) -> SettingsHandle {
        let active = Arc::clone(&self.active);
        let external = self.on_unauthorized.clone();
        let hook: UnauthorizedHook = Arc::new(move |user_id: Uuid| {
            end_session(&active, user_id);
            if let Some(external) = &external {
                external(user_id);
            }
        });
        SettingsHandle::new(store).with_unauthorized_hook(hook)
    }
}

/// Signs `user_id` out if their store is still the active one.
fn end_session(active: &ArcSwapOption<SettingsStore>, user_id: Uuid) {
    let current = active.load_full();
    let Some(store) = current.as_ref().filter(|s| s.user_id() == user_id) else {
        return;
    };
    let previous = active.compare_and_swap(&current, None::<Arc<SettingsStore>>);
    if let Some(previous) = &*previous
        && Arc::ptr_eq(previous, store)
    {
        tracing::warn!(user_id = %user_id, "Settings session ended after authorization failure");
        store.teardown();
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::domain::retry::{ExponentialBackoff, RetryConfig};
    use crate::infra::local_service::LocalSettingsService;
    use settings_sync_sdk::{DisplayPatch, Theme};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn session(service: &Arc<LocalSettingsService>, cache: &SettingsCache) -> SettingsSession {
        SettingsSession::new(
            service.clone(),
            cache.clone(),
            RetryPolicy::new(RetryConfig {
                backoff: ExponentialBackoff::fast(),
                ..RetryConfig::default()
            }),
        )
    }

    #[tokio::test]
    async fn sign_in_same_user_reuses_store() {
        let service = Arc::new(LocalSettingsService::new());
        let session = session(&service, &SettingsCache::in_memory());
        let user_id = Uuid::new_v4();

        let first = session.sign_in(user_id);
        first.refresh_settings().await.unwrap();
        let second = session.sign_in(user_id);

        assert!(Arc::ptr_eq(first.store(), second.store()));
        assert!(second.settings().is_some());
    }

    #[tokio::test]
    async fn switching_user_tears_previous_store_down() {
        let service = Arc::new(LocalSettingsService::new());
        let cache = SettingsCache::in_memory();
        let session = session(&service, &cache);
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let alice_handle = session.sign_in(alice);
        alice_handle.refresh_settings().await.unwrap();
        assert!(cache.get(alice).is_some());

        let bob_handle = session.sign_in(bob);

        assert!(alice_handle.settings().is_none());
        assert!(cache.get(alice).is_none());
        assert_eq!(session.active_user(), Some(bob));
        assert_eq!(bob_handle.store().user_id(), bob);
    }

    #[tokio::test]
    async fn sign_out_clears_memory_and_cache() {
        let service = Arc::new(LocalSettingsService::new());
        let cache = SettingsCache::in_memory();
        let session = session(&service, &cache);
        let user_id = Uuid::new_v4();

        let handle = session.sign_in(user_id);
        handle.refresh_settings().await.unwrap();
        session.sign_out();

        assert!(session.current().is_none());
        assert!(handle.settings().is_none());
        assert!(cache.get(user_id).is_none());
    }

    struct RejectingService;

    #[async_trait::async_trait]
    impl SettingsServiceApi for RejectingService {
        async fn get_user_settings(
            &self,
            user_id: Uuid,
        ) -> Result<settings_sync_sdk::UserSettings, settings_sync_sdk::SettingsError> {
            Ok(settings_sync_sdk::UserSettings::with_defaults(user_id))
        }

        async fn update_profile_settings(
            &self,
            _user_id: Uuid,
            _patch: settings_sync_sdk::ProfilePatch,
        ) -> Result<settings_sync_sdk::ProfileSettings, settings_sync_sdk::SettingsError> {
            Err(settings_sync_sdk::SettingsError::unauthorized("token expired"))
        }

        async fn update_notification_settings(
            &self,
            _user_id: Uuid,
            _patch: settings_sync_sdk::NotificationPatch,
        ) -> Result<settings_sync_sdk::NotificationSettings, settings_sync_sdk::SettingsError>
        {
            Err(settings_sync_sdk::SettingsError::unauthorized("token expired"))
        }

        async fn update_display_settings(
            &self,
            _user_id: Uuid,
            _patch: DisplayPatch,
        ) -> Result<settings_sync_sdk::DisplaySettings, settings_sync_sdk::SettingsError> {
            Err(settings_sync_sdk::SettingsError::unauthorized("token expired"))
        }

        async fn update_privacy_settings(
            &self,
            _user_id: Uuid,
            _patch: settings_sync_sdk::PrivacyPatch,
        ) -> Result<settings_sync_sdk::PrivacySettings, settings_sync_sdk::SettingsError> {
            Err(settings_sync_sdk::SettingsError::unauthorized("token expired"))
        }

        async fn update_account_settings(
            &self,
            _user_id: Uuid,
            _patch: settings_sync_sdk::AccountPatch,
        ) -> Result<settings_sync_sdk::AccountSettings, settings_sync_sdk::SettingsError> {
            Err(settings_sync_sdk::SettingsError::unauthorized("token expired"))
        }

        async fn change_password(
            &self,
            _user_id: Uuid,
            _current_password: &str,
            _new_password: &str,
            _confirm_password: &str,
        ) -> Result<(), settings_sync_sdk::SettingsError> {
            Err(settings_sync_sdk::SettingsError::unauthorized("token expired"))
        }

        async fn change_email(
            &self,
            _user_id: Uuid,
            _new_email: &str,
        ) -> Result<(), settings_sync_sdk::SettingsError> {
            Err(settings_sync_sdk::SettingsError::unauthorized("token expired"))
        }

        async fn reset_user_settings(
            &self,
            _user_id: Uuid,
            _category: Option<settings_sync_sdk::Category>,
        ) -> Result<(), settings_sync_sdk::SettingsError> {
            Err(settings_sync_sdk::SettingsError::unauthorized("token expired"))
        }

        async fn export_user_data(
            &self,
            _user_id: Uuid,
        ) -> Result<settings_sync_sdk::ExportedData, settings_sync_sdk::SettingsError> {
            Err(settings_sync_sdk::SettingsError::unauthorized("token expired"))
        }
    }

    #[tokio::test]
    async fn authorization_failure_signs_out_and_notifies() {
        let notified = Arc::new(AtomicUsize::new(0));
        let counter = notified.clone();
        let session = SettingsSession::new(
            Arc::new(RejectingService),
            SettingsCache::in_memory(),
            RetryPolicy::default(),
        )
        .with_unauthorized_hook(Arc::new(move |_: Uuid| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        let user_id = Uuid::new_v4();

        let handle = session.sign_in(user_id);
        handle.refresh_settings().await.unwrap();
        let err = handle
            .update_display(DisplayPatch {
                theme: Some(Theme::Dark),
                ..DisplayPatch::default()
            })
            .await
            .unwrap_err();

        assert!(err.is_unauthorized());
        assert_eq!(notified.load(Ordering::SeqCst), 1);
        assert!(session.current().is_none());
        assert!(handle.settings().is_none());
    }
}
