//! Settings store state machine.
//!
//! Owns the in-memory settings record of one user. Category updates are
//! applied optimistically, confirmed against the remote service through the
//! retry policy and rolled back from a snapshot when confirmation fails.
//!
//! Concurrency:
//! - each category has its own FIFO lock, so updates to the same category
//!   queue behind each other while different categories proceed in parallel;
//! - `load` and `reset_category` hold every category lock;
//! - state lives behind a synchronous mutex that is never held across `.await`;
//! - `teardown` bumps a generation counter and continuations started under an
//!   older generation leave state alone.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use settings_sync_sdk::{
    AccountPatch, Category, CategoryPatch, CategoryRecord, DisplayPatch, ExportedData,
    NotificationPatch, PrivacyPatch, ProfilePatch, SettingsError, SettingsServiceApi,
    UserSettings,
};
use tokio::sync::{Mutex as AsyncMutex, MutexGuard as AsyncMutexGuard};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::error::StoreError;
use super::events::{ChangeEvent, EventPublisher, LogEventPublisher};
use super::retry::RetryPolicy;
use super::snapshot::{PendingUpdate, PendingUpdates, Snapshot};
use super::validator::{
    parse_raw_patch, validate_email_change, validate_password_change, validate_patch,
};
use crate::infra::cache::SettingsCache;

/// Coarse lifecycle of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPhase {
    #[default]
    Empty,
    Loading,
    Loaded,
}

/// Read model handed to consumers.
#[derive(Debug, Clone)]
pub struct StoreView {
    pub settings: Option<UserSettings>,
    pub phase: LoadPhase,
    pub error: Option<StoreError>,
    /// Categories with an unconfirmed optimistic change.
    pub updating: Vec<Category>,
}

impl StoreView {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.phase == LoadPhase::Loading
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.phase == LoadPhase::Loaded
    }

    #[must_use]
    pub fn is_updating(&self, category: Category) -> bool {
        self.updating.contains(&category)
    }
}

#[derive(Debug, Default)]
struct StoreState {
    phase: LoadPhase,
    /// What the UI sees, including optimistic changes.
    settings: Option<UserSettings>,
    /// Last record confirmed by the service (or read from the cache); what gets cached.
    confirmed: Option<UserSettings>,
    error: Option<StoreError>,
    pending: PendingUpdates,
    generation: u64,
    /// Bumped whenever `confirmed` changes; orders cache writes.
    confirmed_version: u64,
}

impl StoreState {
    fn check_generation(&self, generation: u64) -> Result<(), StoreError> {
        if self.generation == generation {
            Ok(())
        } else {
            Err(StoreError::SessionEnded)
        }
    }

    fn bump_confirmed(&mut self) -> u64 {
        self.confirmed_version += 1;
        self.confirmed_version
    }
}

/// In-memory settings of one user, synchronized with the remote service.
pub struct SettingsStore {
    user_id: Uuid,
    remote: Arc<dyn SettingsServiceApi>,
    cache: SettingsCache,
    retry: RetryPolicy,
    events: Arc<dyn EventPublisher<ChangeEvent>>,
    state: parking_lot::Mutex<StoreState>,
    /// Version of the confirmed record last written to the cache.
    cached_version: parking_lot::Mutex<u64>,
    category_locks: [AsyncMutex<()>; 5],
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore")
            .field("user_id", &self.user_id)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl SettingsStore {
    #[must_use]
    pub fn new(
        user_id: Uuid,
        remote: Arc<dyn SettingsServiceApi>,
        cache: SettingsCache,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            user_id,
            remote,
            cache,
            retry,
            events: Arc::new(LogEventPublisher),
            state: parking_lot::Mutex::new(StoreState::default()),
            cached_version: parking_lot::Mutex::new(0),
            category_locks: std::array::from_fn(|_| AsyncMutex::new(())),
        }
    }

    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn EventPublisher<ChangeEvent>>) -> Self {
        self.events = events;
        self
    }

    #[must_use]
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    #[must_use]
    pub fn view(&self) -> StoreView {
        let state = self.state.lock();
        StoreView {
            settings: state.settings.clone(),
            phase: state.phase,
            error: state.error.clone(),
            updating: state.pending.categories(),
        }
    }

    #[must_use]
    pub fn settings(&self) -> Option<UserSettings> {
        self.state.lock().settings.clone()
    }

    fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    async fn lock_category(&self, category: Category) -> AsyncMutexGuard<'_, ()> {
        self.category_locks[category.index()].lock().await
    }

    /// Acquires every category lock in canonical order.
    async fn lock_all(&self) -> Vec<AsyncMutexGuard<'_, ()>> {
        let mut guards = Vec::with_capacity(Category::ALL.len());
        for category in Category::ALL {
            guards.push(self.lock_category(category).await);
        }
        guards
    }

    /// Loads settings, surfacing a cached copy first and then revalidating
    /// against the remote service.
    ///
    /// # Errors
    /// `StoreError::Remote`/`Unauthorized` when the fetch fails after retries
    /// (the last good settings stay visible), `SessionEnded` after teardown.
    #[instrument(skip(self), fields(user_id = %self.user_id))]
    pub async fn load(&self) -> Result<UserSettings, StoreError> {
        let generation = self.generation();
        let _turns = self.lock_all().await;
        self.load_locked(generation).await
    }

    async fn load_locked(&self, generation: u64) -> Result<UserSettings, StoreError> {
        let needs_cache = {
            let mut state = self.state.lock();
            state.check_generation(generation)?;
            state.phase = LoadPhase::Loading;
            state.settings.is_none()
        };

        if needs_cache && let Some(cached) = self.cache.get(self.user_id) {
            let mut state = self.state.lock();
            state.check_generation(generation)?;
            if state.settings.is_none() {
                debug!("Serving cached settings while revalidating");
                state.settings = Some(cached.clone());
                state.confirmed = Some(cached);
            }
        }

        let user_id = self.user_id;
        let remote = &self.remote;
        let result = self
            .retry
            .run("get_user_settings", move || remote.get_user_settings(user_id))
            .await;

        let mut state = self.state.lock();
        state.check_generation(generation)?;
        match result {
            Ok(settings) => {
                state.settings = Some(settings.clone());
                state.confirmed = Some(settings.clone());
                state.phase = LoadPhase::Loaded;
                state.error = None;
                let version = state.bump_confirmed();
                drop(state);

                self.persist_confirmed(generation, version, &settings);
                info!("Settings loaded");
                Ok(settings)
            }
            Err(source) => {
                let error = StoreError::remote(source);
                state.phase = if state.settings.is_some() {
                    LoadPhase::Loaded
                } else {
                    LoadPhase::Empty
                };
                state.error = Some(error.clone());
                warn!(error = %error, has_cached = state.settings.is_some(), "Settings load failed");
                Err(error)
            }
        }
    }

    /// Validates, applies optimistically and confirms a partial update.
    ///
    /// On success the category holds the service's authoritative copy. On a
    /// remote failure the category is restored from the snapshot taken right
    /// before this call's optimistic apply.
    ///
    /// # Errors
    /// `Validation` (nothing changed, nothing sent), `NotLoaded`,
    /// `Reverted`/`Unauthorized` after rollback, `SessionEnded` after teardown.
    #[instrument(skip(self, patch), fields(user_id = %self.user_id, category = %patch.category()))]
    pub async fn update_category(
        &self,
        patch: CategoryPatch,
    ) -> Result<CategoryRecord, StoreError> {
        let report = validate_patch(&patch);
        if !report.is_valid() {
            debug!(errors = %report, "Rejected invalid settings update");
            return Err(StoreError::validation(report));
        }

        let category = patch.category();
        let generation = self.generation();
        let _turn = self.lock_category(category).await;

        {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            state.check_generation(generation)?;
            let Some(settings) = state.settings.as_mut() else {
                return Err(StoreError::NotLoaded);
            };
            if state.phase != LoadPhase::Loaded {
                return Err(StoreError::NotLoaded);
            }

            let snapshot = Snapshot::capture(settings);
            patch.apply_to(settings);
            state.pending.insert(PendingUpdate {
                category,
                proposed: patch.clone(),
                snapshot,
                started_at: Utc::now(),
            });
        }

        let result = {
            let patch = &patch;
            self.retry
                .run(category.as_str(), move || self.send_update(patch))
                .await
        };

        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.check_generation(generation)?;
        let (Some(pending), Some(settings), Some(confirmed)) = (
            state.pending.take(category),
            state.settings.as_mut(),
            state.confirmed.as_mut(),
        ) else {
            return Err(StoreError::SessionEnded);
        };
        let elapsed_ms = (Utc::now() - pending.started_at).num_milliseconds();

        match result {
            Ok(record) => {
                let previous = pending.snapshot.settings().record(category);
                settings.replace(record.clone());
                confirmed.replace(record.clone());
                state.error = None;
                let version = state.bump_confirmed();
                let confirmed = state.confirmed.clone();
                drop(guard);

                if let Some(confirmed) = confirmed {
                    self.persist_confirmed(generation, version, &confirmed);
                }
                debug!(elapsed_ms, "Settings update confirmed");
                self.publish_change(&record, &previous);
                Ok(record)
            }
            Err(source) => {
                pending.snapshot.restore_into(settings, category);
                let error = StoreError::reverted(category, source);
                state.error = Some(error.clone());
                warn!(error = %error, elapsed_ms, proposed = ?pending.proposed, "Settings update reverted");
                Err(error)
            }
        }
    }

    /// Same as [`Self::update_category`] for an untyped payload addressed by
    /// category name.
    ///
    /// # Errors
    /// `Validation` for unknown categories, unknown fields, enum values outside
    /// their domain and rule violations; otherwise as `update_category`.
    pub async fn update_category_raw(
        &self,
        category: &str,
        payload: &Value,
    ) -> Result<CategoryRecord, StoreError> {
        let patch = parse_raw_patch(category, payload).map_err(StoreError::validation)?;
        self.update_category(patch).await
    }

    /// # Errors
    /// As [`Self::update_category`].
    pub async fn update_profile(&self, patch: ProfilePatch) -> Result<CategoryRecord, StoreError> {
        self.update_category(patch.into()).await
    }

    /// # Errors
    /// As [`Self::update_category`].
    pub async fn update_notifications(
        &self,
        patch: NotificationPatch,
    ) -> Result<CategoryRecord, StoreError> {
        self.update_category(patch.into()).await
    }

    /// # Errors
    /// As [`Self::update_category`].
    pub async fn update_display(&self, patch: DisplayPatch) -> Result<CategoryRecord, StoreError> {
        self.update_category(patch.into()).await
    }

    /// # Errors
    /// As [`Self::update_category`].
    pub async fn update_privacy(&self, patch: PrivacyPatch) -> Result<CategoryRecord, StoreError> {
        self.update_category(patch.into()).await
    }

    /// # Errors
    /// As [`Self::update_category`].
    pub async fn update_accounts(&self, patch: AccountPatch) -> Result<CategoryRecord, StoreError> {
        self.update_category(patch.into()).await
    }

    async fn send_update(&self, patch: &CategoryPatch) -> Result<CategoryRecord, SettingsError> {
        let user_id = self.user_id;
        Ok(match patch.clone() {
            CategoryPatch::Profile(p) => {
                CategoryRecord::Profile(self.remote.update_profile_settings(user_id, p).await?)
            }
            CategoryPatch::Notifications(p) => CategoryRecord::Notifications(
                self.remote.update_notification_settings(user_id, p).await?,
            ),
            CategoryPatch::Display(p) => {
                CategoryRecord::Display(self.remote.update_display_settings(user_id, p).await?)
            }
            CategoryPatch::Privacy(p) => {
                CategoryRecord::Privacy(self.remote.update_privacy_settings(user_id, p).await?)
            }
            CategoryPatch::Accounts(p) => {
                CategoryRecord::Accounts(self.remote.update_account_settings(user_id, p).await?)
            }
        })
    }

    /// Clears the cached copy, resets one category (or all) remotely and reloads.
    ///
    /// # Errors
    /// `Remote`/`Unauthorized` when the reset or reload fails, `SessionEnded`
    /// after teardown.
    #[instrument(skip(self), fields(user_id = %self.user_id))]
    pub async fn reset_category(
        &self,
        category: Option<Category>,
    ) -> Result<UserSettings, StoreError> {
        let generation = self.generation();
        let _turns = self.lock_all().await;
        self.state.lock().check_generation(generation)?;

        self.cache.remove(self.user_id);

        let user_id = self.user_id;
        let remote = &self.remote;
        let reset = self
            .retry
            .run("reset_user_settings", move || {
                remote.reset_user_settings(user_id, category)
            })
            .await;

        if let Err(source) = reset {
            let error = StoreError::remote(source);
            let mut state = self.state.lock();
            state.check_generation(generation)?;
            state.error = Some(error.clone());
            warn!(error = %error, "Settings reset failed");
            return Err(error);
        }

        info!(category = ?category, "Settings reset, reloading");
        self.load_locked(generation).await
    }

    /// Remote data export. Leaves local state untouched.
    ///
    /// # Errors
    /// `Remote`/`Unauthorized` when the export fails after retries.
    #[instrument(skip(self), fields(user_id = %self.user_id))]
    pub async fn export_all(&self) -> Result<ExportedData, StoreError> {
        let user_id = self.user_id;
        let remote = &self.remote;
        self.retry
            .run("export_user_data", move || remote.export_user_data(user_id))
            .await
            .map_err(StoreError::remote)
    }

    /// # Errors
    /// `Validation` before anything is sent, `Remote`/`Unauthorized` on failure.
    #[instrument(skip_all, fields(user_id = %self.user_id))]
    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<(), StoreError> {
        let report = validate_password_change(current_password, new_password, confirm_password);
        if !report.is_valid() {
            return Err(StoreError::validation(report));
        }

        let user_id = self.user_id;
        let remote = &self.remote;
        self.retry
            .run("change_password", move || {
                remote.change_password(user_id, current_password, new_password, confirm_password)
            })
            .await
            .map_err(StoreError::remote)?;
        info!("Password changed");
        Ok(())
    }

    /// Changes the account email. A confirmed change is mirrored into the
    /// profile category and the cache; nothing is applied optimistically.
    ///
    /// # Errors
    /// `Validation` before anything is sent, `Remote`/`Unauthorized` on
    /// failure, `SessionEnded` after teardown.
    #[instrument(skip_all, fields(user_id = %self.user_id))]
    pub async fn change_email(&self, new_email: &str) -> Result<(), StoreError> {
        let report = validate_email_change(new_email);
        if !report.is_valid() {
            return Err(StoreError::validation(report));
        }
        let new_email = new_email.trim();

        let generation = self.generation();
        let _turn = self.lock_category(Category::Profile).await;

        let user_id = self.user_id;
        let remote = &self.remote;
        self.retry
            .run("change_email", move || remote.change_email(user_id, new_email))
            .await
            .map_err(StoreError::remote)?;

        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.check_generation(generation)?;
        let (Some(settings), Some(confirmed)) =
            (state.settings.as_mut(), state.confirmed.as_mut())
        else {
            // not loaded yet; the next load picks the new email up
            return Ok(());
        };

        let previous = confirmed.record(Category::Profile);
        settings.profile.email = new_email.to_owned();
        confirmed.profile.email = new_email.to_owned();
        let record = confirmed.record(Category::Profile);
        let version = state.bump_confirmed();
        let confirmed = state.confirmed.clone();
        drop(guard);

        if let Some(confirmed) = confirmed {
            self.persist_confirmed(generation, version, &confirmed);
        }

        info!("Email changed");
        self.publish_change(&record, &previous);
        Ok(())
    }

    /// Drops all in-memory state and the cached entry. In-flight operations
    /// finish with `SessionEnded` without touching state.
    #[instrument(skip(self), fields(user_id = %self.user_id))]
    pub fn teardown(&self) {
        {
            let mut state = self.state.lock();
            let generation = state.generation.wrapping_add(1);
            let confirmed_version = state.confirmed_version;
            *state = StoreState {
                generation,
                confirmed_version,
                ..StoreState::default()
            };
        }
        self.cache.remove(self.user_id);
        info!("Settings store torn down");
    }

    /// Mirrors a confirmed record into the cache outside the state lock.
    ///
    /// Writes are ordered by version so an older record never overwrites a
    /// newer one. A teardown that raced the write removes the entry again.
    fn persist_confirmed(&self, generation: u64, version: u64, settings: &UserSettings) {
        let mut cached_version = self.cached_version.lock();
        if version <= *cached_version {
            return;
        }
        self.cache.set(self.user_id, settings);
        *cached_version = version;
        if self.state.lock().generation != generation {
            self.cache.remove(self.user_id);
        }
    }

    fn publish_change(&self, record: &CategoryRecord, previous: &CategoryRecord) {
        let (data, previous_data) = match (record.to_json(), previous.to_json()) {
            (Ok(data), Ok(previous_data)) => (data, previous_data),
            (Err(e), _) | (_, Err(e)) => {
                warn!(error = %e, category = %record.category(), "Failed to encode change event");
                return;
            }
        };
        self.events.publish(&ChangeEvent {
            user_id: self.user_id,
            category: record.category(),
            data,
            previous_data,
            timestamp: Utc::now(),
        });
    }
}
