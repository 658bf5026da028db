use std::time::Duration;

use rust_decimal::{Decimal, RoundingStrategy};
use settings_sync_sdk::{
    AccountPatch, AccountSettings, CategoryRecord, DigestFrequency, DisplayPatch,
    DisplaySettings, NotificationPatch, NotificationSettings, PrivacyPatch, PrivacySettings,
    ProfilePatch, ProfileSettings, SyncFrequency, Theme,
};

use super::SettingsHandle;
use crate::domain::error::StoreError;

#[derive(Debug, Clone)]
pub struct ProfileHandle {
    handle: SettingsHandle,
}

impl ProfileHandle {
    pub(super) fn new(handle: SettingsHandle) -> Self {
        Self { handle }
    }

    #[must_use]
    pub fn get(&self) -> Option<ProfileSettings> {
        self.handle.settings().map(|s| s.profile)
    }

    /// "First Last", or whichever part is set.
    #[must_use]
    pub fn full_name(&self) -> Option<String> {
        let profile = self.get()?;
        let name = format!("{} {}", profile.first_name.trim(), profile.last_name.trim());
        let name = name.trim();
        (!name.is_empty()).then(|| name.to_owned())
    }

    /// Up to two uppercase initials, falling back to the email's first letter.
    #[must_use]
    pub fn initials(&self) -> Option<String> {
        let profile = self.get()?;
        let initials: String = [&profile.first_name, &profile.last_name]
            .iter()
            .filter_map(|part| part.trim().chars().next())
            .flat_map(char::to_uppercase)
            .collect();
        if !initials.is_empty() {
            return Some(initials);
        }
        profile
            .email
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
    }

    /// # Errors
    /// See [`SettingsHandle::update_profile`].
    pub async fn update(&self, patch: ProfilePatch) -> Result<CategoryRecord, StoreError> {
        self.handle.update_profile(patch).await
    }
}

#[derive(Debug, Clone)]
pub struct NotificationsHandle {
    handle: SettingsHandle,
}

impl NotificationsHandle {
    pub(super) fn new(handle: SettingsHandle) -> Self {
        Self { handle }
    }

    #[must_use]
    pub fn get(&self) -> Option<NotificationSettings> {
        self.handle.settings().map(|s| s.notifications)
    }

    /// Names of the delivery channels that are switched on.
    #[must_use]
    pub fn enabled_channels(&self) -> Vec<&'static str> {
        let Some(n) = self.get() else {
            return Vec::new();
        };
        [
            ("email", n.email_enabled),
            ("push", n.push_enabled),
            ("sms", n.sms_enabled),
        ]
        .into_iter()
        .filter_map(|(name, on)| on.then_some(name))
        .collect()
    }

    /// `true` when a balance under the user's threshold should raise an alert.
    #[must_use]
    pub fn is_low_balance(&self, balance: Decimal) -> bool {
        self.get()
            .is_some_and(|n| n.transaction_alerts && balance < n.low_balance_threshold)
    }

    /// # Errors
    /// See [`SettingsHandle::update_notifications`].
    pub async fn set_digest_frequency(
        &self,
        digest_frequency: DigestFrequency,
    ) -> Result<CategoryRecord, StoreError> {
        self.update(NotificationPatch {
            digest_frequency: Some(digest_frequency),
            ..NotificationPatch::default()
        })
        .await
    }

    /// # Errors
    /// See [`SettingsHandle::update_notifications`].
    pub async fn update(&self, patch: NotificationPatch) -> Result<CategoryRecord, StoreError> {
        self.handle.update_notifications(patch).await
    }
}

#[derive(Debug, Clone)]
pub struct DisplayHandle {
    handle: SettingsHandle,
}

impl DisplayHandle {
    pub(super) fn new(handle: SettingsHandle) -> Self {
        Self { handle }
    }

    #[must_use]
    pub fn get(&self) -> Option<DisplaySettings> {
        self.handle.settings().map(|s| s.display)
    }

    /// Concrete theme to render; `System` follows the platform preference.
    #[must_use]
    pub fn resolved_theme(&self, system_prefers_dark: bool) -> Theme {
        match self.get().map(|d| d.theme).unwrap_or_default() {
            Theme::System if system_prefers_dark => Theme::Dark,
            Theme::System => Theme::Light,
            theme => theme,
        }
    }

    /// Formats an amount with the user's currency symbol and cents preference.
    #[must_use]
    pub fn format_amount(&self, amount: Decimal) -> String {
        let display = self.get().unwrap_or_default();
        let places = if display.show_cents {
            display.currency.minor_units()
        } else {
            0
        };
        let rounded = amount
            .abs()
            .round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
        let sign = if amount.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        let precision = usize::try_from(places).unwrap_or_default();
        format!(
            "{sign}{}{rounded:.precision$}",
            display.currency.symbol()
        )
    }

    /// # Errors
    /// See [`SettingsHandle::update_display`].
    pub async fn set_theme(&self, theme: Theme) -> Result<CategoryRecord, StoreError> {
        self.update(DisplayPatch {
            theme: Some(theme),
            ..DisplayPatch::default()
        })
        .await
    }

    /// # Errors
    /// See [`SettingsHandle::update_display`].
    pub async fn update(&self, patch: DisplayPatch) -> Result<CategoryRecord, StoreError> {
        self.handle.update_display(patch).await
    }
}

#[derive(Debug, Clone)]
pub struct PrivacyHandle {
    handle: SettingsHandle,
}

impl PrivacyHandle {
    pub(super) fn new(handle: SettingsHandle) -> Self {
        Self { handle }
    }

    #[must_use]
    pub fn get(&self) -> Option<PrivacySettings> {
        self.handle.settings().map(|s| s.privacy)
    }

    #[must_use]
    pub fn session_timeout(&self) -> Option<Duration> {
        self.get()
            .map(|p| Duration::from_secs(u64::from(p.session_timeout_minutes) * 60))
    }

    /// # Errors
    /// See [`SettingsHandle::update_privacy`].
    pub async fn set_session_timeout(&self, minutes: u32) -> Result<CategoryRecord, StoreError> {
        self.update(PrivacyPatch {
            session_timeout_minutes: Some(minutes),
            ..PrivacyPatch::default()
        })
        .await
    }

    /// # Errors
    /// See [`SettingsHandle::update_privacy`].
    pub async fn update(&self, patch: PrivacyPatch) -> Result<CategoryRecord, StoreError> {
        self.handle.update_privacy(patch).await
    }
}

#[derive(Debug, Clone)]
pub struct AccountsHandle {
    handle: SettingsHandle,
}

impl AccountsHandle {
    pub(super) fn new(handle: SettingsHandle) -> Self {
        Self { handle }
    }

    #[must_use]
    pub fn get(&self) -> Option<AccountSettings> {
        self.handle.settings().map(|s| s.accounts)
    }

    /// Interval between background syncs. `None` when syncing is manual or off;
    /// zero for realtime.
    #[must_use]
    pub fn sync_interval(&self) -> Option<Duration> {
        let accounts = self.get()?;
        if !accounts.auto_sync {
            return None;
        }
        match accounts.sync_frequency {
            SyncFrequency::Realtime => Some(Duration::ZERO),
            SyncFrequency::Hourly => Some(Duration::from_secs(60 * 60)),
            SyncFrequency::Daily => Some(Duration::from_secs(24 * 60 * 60)),
            SyncFrequency::Weekly => Some(Duration::from_secs(7 * 24 * 60 * 60)),
            SyncFrequency::Manual => None,
        }
    }

    /// # Errors
    /// See [`SettingsHandle::update_accounts`].
    pub async fn set_auto_sync(&self, auto_sync: bool) -> Result<CategoryRecord, StoreError> {
        self.update(AccountPatch {
            auto_sync: Some(auto_sync),
            ..AccountPatch::default()
        })
        .await
    }

    /// # Errors
    /// See [`SettingsHandle::update_accounts`].
    pub async fn update(&self, patch: AccountPatch) -> Result<CategoryRecord, StoreError> {
        self.handle.update_accounts(patch).await
    }
}
