//! Partial update payloads, one per category.
//!
//! Every field is optional; `None` leaves the stored value untouched. For the
//! nullable text fields (`phone`, `avatar_url`, `default_account_id`) an
//! empty string clears the stored value.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{
    AccountSettings, Category, Currency, DateFormat, DigestFrequency, DisplaySettings,
    NotificationSettings, PrivacySettings, ProfileSettings, SyncFrequency, Theme, UserSettings,
};

fn clearable(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl ProfilePatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.phone.is_none()
            && self.timezone.is_none()
            && self.avatar_url.is_none()
    }

    pub fn apply_to(&self, target: &mut ProfileSettings) {
        if let Some(v) = &self.first_name {
            target.first_name.clone_from(v);
        }
        if let Some(v) = &self.last_name {
            target.last_name.clone_from(v);
        }
        if let Some(v) = &self.phone {
            target.phone = clearable(v);
        }
        if let Some(v) = &self.timezone {
            target.timezone.clone_from(v);
        }
        if let Some(v) = &self.avatar_url {
            target.avatar_url = clearable(v);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotificationPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sms_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_alerts: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_alerts: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal_reminders: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekly_summary: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_balance_threshold: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest_frequency: Option<DigestFrequency>,
}

impl NotificationPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply_to(&self, target: &mut NotificationSettings) {
        let flags = [
            (self.email_enabled, &mut target.email_enabled),
            (self.push_enabled, &mut target.push_enabled),
            (self.sms_enabled, &mut target.sms_enabled),
            (self.transaction_alerts, &mut target.transaction_alerts),
            (self.budget_alerts, &mut target.budget_alerts),
            (self.goal_reminders, &mut target.goal_reminders),
            (self.weekly_summary, &mut target.weekly_summary),
        ];
        for (value, slot) in flags {
            if let Some(value) = value {
                *slot = value;
            }
        }
        if let Some(v) = self.low_balance_threshold {
            target.low_balance_threshold = v;
        }
        if let Some(v) = self.digest_frequency {
            target.digest_frequency = v;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplayPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_format: Option<DateFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compact_mode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_cents: Option<bool>,
}

impl DisplayPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply_to(&self, target: &mut DisplaySettings) {
        if let Some(v) = self.theme {
            target.theme = v;
        }
        if let Some(v) = self.currency {
            target.currency = v;
        }
        if let Some(v) = self.date_format {
            target.date_format = v;
        }
        if let Some(v) = &self.language {
            target.language.clone_from(v);
        }
        if let Some(v) = self.compact_mode {
            target.compact_mode = v;
        }
        if let Some(v) = self.show_cents {
            target.show_cents = v;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PrivacyPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub two_factor_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_timeout_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_sharing_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analytics_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_alerts: Option<bool>,
}

impl PrivacyPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply_to(&self, target: &mut PrivacySettings) {
        if let Some(v) = self.two_factor_enabled {
            target.two_factor_enabled = v;
        }
        if let Some(v) = self.session_timeout_minutes {
            target.session_timeout_minutes = v;
        }
        if let Some(v) = self.data_sharing_enabled {
            target.data_sharing_enabled = v;
        }
        if let Some(v) = self.analytics_enabled {
            target.analytics_enabled = v;
        }
        if let Some(v) = self.login_alerts {
            target.login_alerts = v;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AccountPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_sync: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_frequency: Option<SyncFrequency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide_zero_balances: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_in_net_worth: Option<bool>,
}

impl AccountPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply_to(&self, target: &mut AccountSettings) {
        if let Some(v) = self.auto_sync {
            target.auto_sync = v;
        }
        if let Some(v) = self.sync_frequency {
            target.sync_frequency = v;
        }
        if let Some(v) = &self.default_account_id {
            target.default_account_id = clearable(v);
        }
        if let Some(v) = self.hide_zero_balances {
            target.hide_zero_balances = v;
        }
        if let Some(v) = self.include_in_net_worth {
            target.include_in_net_worth = v;
        }
    }
}

/// A partial update addressed to exactly one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", content = "data", rename_all = "snake_case")]
pub enum CategoryPatch {
    Profile(ProfilePatch),
    Notifications(NotificationPatch),
    Display(DisplayPatch),
    Privacy(PrivacyPatch),
    Accounts(AccountPatch),
}

impl CategoryPatch {
    #[must_use]
    pub fn category(&self) -> Category {
        match self {
            Self::Profile(_) => Category::Profile,
            Self::Notifications(_) => Category::Notifications,
            Self::Display(_) => Category::Display,
            Self::Privacy(_) => Category::Privacy,
            Self::Accounts(_) => Category::Accounts,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Profile(p) => p.is_empty(),
            Self::Notifications(p) => p.is_empty(),
            Self::Display(p) => p.is_empty(),
            Self::Privacy(p) => p.is_empty(),
            Self::Accounts(p) => p.is_empty(),
        }
    }

    /// Merges the patch into its own category of `settings`.
    pub fn apply_to(&self, settings: &mut UserSettings) {
        match self {
            Self::Profile(p) => p.apply_to(&mut settings.profile),
            Self::Notifications(p) => p.apply_to(&mut settings.notifications),
            Self::Display(p) => p.apply_to(&mut settings.display),
            Self::Privacy(p) => p.apply_to(&mut settings.privacy),
            Self::Accounts(p) => p.apply_to(&mut settings.accounts),
        }
    }
}

impl From<ProfilePatch> for CategoryPatch {
    fn from(p: ProfilePatch) -> Self {
        Self::Profile(p)
    }
}

impl From<NotificationPatch> for CategoryPatch {
    fn from(p: NotificationPatch) -> Self {
        Self::Notifications(p)
    }
}

impl From<DisplayPatch> for CategoryPatch {
    fn from(p: DisplayPatch) -> Self {
        Self::Display(p)
    }
}

impl From<PrivacyPatch> for CategoryPatch {
    fn from(p: PrivacyPatch) -> Self {
        Self::Privacy(p)
    }
}

impl From<AccountPatch> for CategoryPatch {
    fn from(p: AccountPatch) -> Self {
        Self::Accounts(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn patch_updates_only_provided_fields() {
        let mut profile = ProfileSettings {
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
            phone: Some("+44 20 7946 0000".to_owned()),
            ..ProfileSettings::default()
        };

        ProfilePatch {
            first_name: Some("Augusta".to_owned()),
            ..ProfilePatch::default()
        }
        .apply_to(&mut profile);

        assert_eq!(profile.first_name, "Augusta");
        assert_eq!(profile.last_name, "Lovelace");
        assert_eq!(profile.phone.as_deref(), Some("+44 20 7946 0000"));
    }

    #[test]
    fn empty_string_clears_nullable_field() {
        let mut profile = ProfileSettings {
            phone: Some("+1 555 0100".to_owned()),
            ..ProfileSettings::default()
        };
        ProfilePatch {
            phone: Some(String::new()),
            ..ProfilePatch::default()
        }
        .apply_to(&mut profile);
        assert_eq!(profile.phone, None);
    }

    #[test]
    fn category_patch_never_touches_other_categories() {
        let mut settings = UserSettings::with_defaults(Uuid::new_v4());
        let before = settings.clone();

        CategoryPatch::from(NotificationPatch {
            sms_enabled: Some(true),
            low_balance_threshold: Some(Decimal::new(250, 0)),
            ..NotificationPatch::default()
        })
        .apply_to(&mut settings);

        assert!(settings.notifications.sms_enabled);
        assert_eq!(settings.profile, before.profile);
        assert_eq!(settings.display, before.display);
        assert_eq!(settings.privacy, before.privacy);
        assert_eq!(settings.accounts, before.accounts);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = serde_json::from_value::<DisplayPatch>(serde_json::json!({ "colour": "red" }));
        assert!(err.is_err());
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(CategoryPatch::Display(DisplayPatch::default()).is_empty());
        assert!(!CategoryPatch::Privacy(PrivacyPatch {
            login_alerts: Some(false),
            ..PrivacyPatch::default()
        })
        .is_empty());
    }
}
