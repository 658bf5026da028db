//! Public models for the settings-sync engine.
//!
//! These are transport-agnostic data structures shared by the remote
//! settings service, the local cache and the in-memory store. The
//! serialized form is also the persisted cache format.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An independently updatable partition of [`UserSettings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Profile,
    Notifications,
    Display,
    Privacy,
    Accounts,
}

impl Category {
    /// All categories in their canonical order.
    pub const ALL: [Category; 5] = [
        Category::Profile,
        Category::Notifications,
        Category::Display,
        Category::Privacy,
        Category::Accounts,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Notifications => "notifications",
            Self::Display => "display",
            Self::Privacy => "privacy",
            Self::Accounts => "accounts",
        }
    }

    /// Position in [`Category::ALL`].
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Profile => 0,
            Self::Notifications => 1,
            Self::Display => 2,
            Self::Privacy => 3,
            Self::Accounts => 4,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing a category name that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown settings category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_owned()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Gbp,
    Cad,
    Aud,
    Jpy,
    Inr,
}

impl Currency {
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
            Self::Cad => "CAD",
            Self::Aud => "AUD",
            Self::Jpy => "JPY",
            Self::Inr => "INR",
        }
    }

    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Usd | Self::Cad | Self::Aud => "$",
            Self::Eur => "\u{20ac}",
            Self::Gbp => "\u{a3}",
            Self::Jpy => "\u{a5}",
            Self::Inr => "\u{20b9}",
        }
    }

    /// Number of minor units shown after the decimal point.
    #[must_use]
    pub fn minor_units(self) -> u32 {
        match self {
            Self::Jpy => 0,
            _ => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DateFormat {
    #[default]
    #[serde(rename = "MM/DD/YYYY")]
    MonthDayYear,
    #[serde(rename = "DD/MM/YYYY")]
    DayMonthYear,
    #[serde(rename = "YYYY-MM-DD")]
    Iso,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestFrequency {
    Daily,
    #[default]
    Weekly,
    Monthly,
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncFrequency {
    Realtime,
    Hourly,
    #[default]
    Daily,
    Weekly,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSettings {
    pub first_name: String,
    pub last_name: String,
    /// Changed only through `change_email`, never through a profile patch.
    pub email: String,
    pub phone: Option<String>,
    pub timezone: String,
    pub avatar_url: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            phone: None,
            timezone: "UTC".to_owned(),
            avatar_url: None,
            updated_at: None,
        }
    }
}

#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub email_enabled: bool,
    pub push_enabled: bool,
    pub sms_enabled: bool,
    pub transaction_alerts: bool,
    pub budget_alerts: bool,
    pub goal_reminders: bool,
    pub weekly_summary: bool,
    pub low_balance_threshold: Decimal,
    pub digest_frequency: DigestFrequency,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            email_enabled: true,
            push_enabled: true,
            sms_enabled: false,
            transaction_alerts: true,
            budget_alerts: true,
            goal_reminders: true,
            weekly_summary: false,
            low_balance_threshold: Decimal::new(100, 0),
            digest_frequency: DigestFrequency::default(),
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub theme: Theme,
    pub currency: Currency,
    pub date_format: DateFormat,
    pub language: String,
    pub compact_mode: bool,
    pub show_cents: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            currency: Currency::default(),
            date_format: DateFormat::default(),
            language: "en-US".to_owned(),
            compact_mode: false,
            show_cents: true,
            updated_at: None,
        }
    }
}

#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivacySettings {
    pub two_factor_enabled: bool,
    pub session_timeout_minutes: u32,
    pub data_sharing_enabled: bool,
    pub analytics_enabled: bool,
    pub login_alerts: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for PrivacySettings {
    fn default() -> Self {
        Self {
            two_factor_enabled: false,
            session_timeout_minutes: 30,
            data_sharing_enabled: false,
            analytics_enabled: true,
            login_alerts: true,
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountSettings {
    pub auto_sync: bool,
    pub sync_frequency: SyncFrequency,
    pub default_account_id: Option<String>,
    pub hide_zero_balances: bool,
    pub include_in_net_worth: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for AccountSettings {
    fn default() -> Self {
        Self {
            auto_sync: true,
            sync_frequency: SyncFrequency::default(),
            default_account_id: None,
            hide_zero_balances: false,
            include_in_net_worth: true,
            updated_at: None,
        }
    }
}

/// Root settings record of one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    pub user_id: Uuid,
    #[serde(default)]
    pub profile: ProfileSettings,
    #[serde(default)]
    pub notifications: NotificationSettings,
    #[serde(default)]
    pub display: DisplaySettings,
    #[serde(default)]
    pub privacy: PrivacySettings,
    #[serde(default)]
    pub accounts: AccountSettings,
}

impl UserSettings {
    /// Settings record with every category at its default.
    #[must_use]
    pub fn with_defaults(user_id: Uuid) -> Self {
        Self {
            user_id,
            profile: ProfileSettings::default(),
            notifications: NotificationSettings::default(),
            display: DisplaySettings::default(),
            privacy: PrivacySettings::default(),
            accounts: AccountSettings::default(),
        }
    }

    /// Owned copy of a single category.
    #[must_use]
    pub fn record(&self, category: Category) -> CategoryRecord {
        match category {
            Category::Profile => CategoryRecord::Profile(self.profile.clone()),
            Category::Notifications => CategoryRecord::Notifications(self.notifications.clone()),
            Category::Display => CategoryRecord::Display(self.display.clone()),
            Category::Privacy => CategoryRecord::Privacy(self.privacy.clone()),
            Category::Accounts => CategoryRecord::Accounts(self.accounts.clone()),
        }
    }

    /// Replaces exactly one category; all others are left untouched.
    pub fn replace(&mut self, record: CategoryRecord) {
        match record {
            CategoryRecord::Profile(v) => self.profile = v,
            CategoryRecord::Notifications(v) => self.notifications = v,
            CategoryRecord::Display(v) => self.display = v,
            CategoryRecord::Privacy(v) => self.privacy = v,
            CategoryRecord::Accounts(v) => self.accounts = v,
        }
    }

    /// Copies one category over from `source`.
    pub fn restore_from(&mut self, source: &UserSettings, category: Category) {
        self.replace(source.record(category));
    }

    /// Resets one category to its defaults.
    pub fn reset(&mut self, category: Category) {
        match category {
            Category::Profile => {
                // identity fields survive a profile reset
                let email = std::mem::take(&mut self.profile.email);
                self.profile = ProfileSettings {
                    email,
                    ..ProfileSettings::default()
                };
            }
            Category::Notifications => self.notifications = NotificationSettings::default(),
            Category::Display => self.display = DisplaySettings::default(),
            Category::Privacy => self.privacy = PrivacySettings::default(),
            Category::Accounts => self.accounts = AccountSettings::default(),
        }
    }
}

/// A full category record, tagged with its category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", content = "data", rename_all = "snake_case")]
pub enum CategoryRecord {
    Profile(ProfileSettings),
    Notifications(NotificationSettings),
    Display(DisplaySettings),
    Privacy(PrivacySettings),
    Accounts(AccountSettings),
}

impl CategoryRecord {
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

    /// Untagged JSON form of the record, used for audit payloads.
    ///
    /// # Errors
    /// Returns an error if the record cannot be represented as JSON.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            Self::Profile(v) => serde_json::to_value(v),
            Self::Notifications(v) => serde_json::to_value(v),
            Self::Display(v) => serde_json::to_value(v),
            Self::Privacy(v) => serde_json::to_value(v),
            Self::Accounts(v) => serde_json::to_value(v),
        }
    }
}

/// Bundle returned by the remote data export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedData {
    pub user_id: Uuid,
    pub exported_at: DateTime<Utc>,
    pub settings: UserSettings,
    /// Additional datasets (accounts, transactions, goals) keyed by name.
    #[serde(default)]
    pub datasets: BTreeMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_round_trips_through_str() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
            assert_eq!(Category::ALL[category.index()], category);
        }
        assert_eq!(
            "billing".parse::<Category>(),
            Err(UnknownCategory("billing".to_owned()))
        );
    }

    #[test]
    fn replace_touches_only_one_category() {
        let mut settings = UserSettings::with_defaults(Uuid::new_v4());
        let before = settings.clone();

        settings.replace(CategoryRecord::Display(DisplaySettings {
            theme: Theme::Dark,
            ..DisplaySettings::default()
        }));

        assert_eq!(settings.display.theme, Theme::Dark);
        assert_eq!(settings.profile, before.profile);
        assert_eq!(settings.notifications, before.notifications);
        assert_eq!(settings.privacy, before.privacy);
        assert_eq!(settings.accounts, before.accounts);
    }

    #[test]
    fn reset_profile_keeps_email() {
        let mut settings = UserSettings::with_defaults(Uuid::new_v4());
        settings.profile.email = "ada@example.com".to_owned();
        settings.profile.first_name = "Ada".to_owned();

        settings.reset(Category::Profile);

        assert_eq!(settings.profile.email, "ada@example.com");
        assert!(settings.profile.first_name.is_empty());
    }

    #[test]
    fn enums_use_wire_names() {
        let display = DisplaySettings {
            theme: Theme::Dark,
            currency: Currency::Eur,
            date_format: DateFormat::Iso,
            ..DisplaySettings::default()
        };
        let json = serde_json::to_value(&display).unwrap();
        assert_eq!(json["theme"], "dark");
        assert_eq!(json["currency"], "EUR");
        assert_eq!(json["date_format"], "YYYY-MM-DD");
    }

    #[test]
    fn cached_record_missing_categories_falls_back_to_defaults() {
        let user_id = Uuid::new_v4();
        let json = serde_json::json!({ "user_id": user_id, "display": { "theme": "light" } });
        let settings: UserSettings = serde_json::from_value(json).unwrap();
        assert_eq!(settings.display.theme, Theme::Light);
        assert_eq!(settings.display.language, "en-US");
        assert_eq!(settings.privacy, PrivacySettings::default());
    }
}
