//! Pure, synchronous checks run before any optimistic mutation.
//!
//! Nothing in here looks at the store, the cache or the network, so a
//! rejected payload can never leave a trace behind.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use settings_sync_sdk::{
    AccountPatch, Category, CategoryPatch, DisplayPatch, NotificationPatch, PrivacyPatch,
    ProfilePatch, SyncFrequency,
};

use super::fields::SettingsFields;

#[allow(clippy::expect_used)] // literal pattern, it doesn't panic
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?[0-9][0-9 ()\-]{6,19}$").expect("static regex should not panic")
});
#[allow(clippy::expect_used)] // literal pattern, it doesn't panic
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static regex should not panic")
});
#[allow(clippy::expect_used)] // literal pattern, it doesn't panic
static LANGUAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z]{2}(-[A-Z]{2})?$").expect("static regex should not panic")
});

/// Outcome of a validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
}

impl ValidationReport {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    fn single(message: impl Into<String>) -> Self {
        Self {
            errors: vec![message.into()],
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.errors.join("; "))
    }
}

/// Validates a typed partial update against its category rules.
#[must_use]
pub fn validate_patch(patch: &CategoryPatch) -> ValidationReport {
    let mut report = ValidationReport::default();
    if patch.is_empty() {
        report.push("No fields to update");
        return report;
    }
    match patch {
        CategoryPatch::Profile(p) => validate_profile(p, &mut report),
        CategoryPatch::Notifications(p) => validate_notifications(p, &mut report),
        CategoryPatch::Display(p) => validate_display(p, &mut report),
        CategoryPatch::Privacy(p) => validate_privacy(p, &mut report),
        CategoryPatch::Accounts(p) => validate_accounts(p, &mut report),
    }
    report
}

fn validate_name(label: &str, value: &str, report: &mut ValidationReport) {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        report.push(format!("{label} is required"));
    } else if trimmed.chars().count() > SettingsFields::NAME_MAX_LEN {
        report.push(format!(
            "{label} must be at most {} characters",
            SettingsFields::NAME_MAX_LEN
        ));
    }
}

fn validate_profile(p: &ProfilePatch, report: &mut ValidationReport) {
    if let Some(v) = &p.first_name {
        validate_name("First name", v, report);
    }
    if let Some(v) = &p.last_name {
        validate_name("Last name", v, report);
    }
    if let Some(v) = &p.phone
        && !v.is_empty()
        && !PHONE_RE.is_match(v)
    {
        report.push("Please enter a valid phone number");
    }
    if let Some(v) = &p.timezone
        && v.trim().is_empty()
    {
        report.push("Timezone is required");
    }
    if let Some(v) = &p.avatar_url
        && !v.is_empty()
        && !(v.starts_with("https://") || v.starts_with("http://"))
    {
        report.push("Avatar URL must be an http(s) URL");
    }
}

fn validate_notifications(p: &NotificationPatch, report: &mut ValidationReport) {
    if let Some(v) = p.low_balance_threshold
        && v < Decimal::ZERO
    {
        report.push("Low balance threshold cannot be negative");
    }
}

fn validate_display(p: &DisplayPatch, report: &mut ValidationReport) {
    if let Some(v) = &p.language
        && !LANGUAGE_RE.is_match(v)
    {
        report.push("Language must be a language tag such as 'en' or 'en-US'");
    }
}

fn validate_privacy(p: &PrivacyPatch, report: &mut ValidationReport) {
    if let Some(v) = p.session_timeout_minutes
        && !(SettingsFields::SESSION_TIMEOUT_MIN..=SettingsFields::SESSION_TIMEOUT_MAX)
            .contains(&v)
    {
        report.push(format!(
            "Session timeout must be between {} and {} minutes",
            SettingsFields::SESSION_TIMEOUT_MIN,
            SettingsFields::SESSION_TIMEOUT_MAX
        ));
    }
}

fn validate_accounts(p: &AccountPatch, report: &mut ValidationReport) {
    if let Some(v) = &p.default_account_id
        && !v.is_empty()
        && v.trim().is_empty()
    {
        report.push("Default account id cannot be blank");
    }
    if p.auto_sync == Some(true) && p.sync_frequency == Some(SyncFrequency::Manual) {
        report.push("Automatic sync cannot use the manual sync frequency");
    }
}

fn known_fields(category: Category) -> &'static [&'static str] {
    match category {
        Category::Profile => &[
            SettingsFields::FIRST_NAME,
            SettingsFields::LAST_NAME,
            SettingsFields::PHONE,
            SettingsFields::TIMEZONE,
            SettingsFields::AVATAR_URL,
        ],
        Category::Notifications => &[
            "email_enabled",
            "push_enabled",
            "sms_enabled",
            "transaction_alerts",
            "budget_alerts",
            "goal_reminders",
            "weekly_summary",
            SettingsFields::LOW_BALANCE_THRESHOLD,
            SettingsFields::DIGEST_FREQUENCY,
        ],
        Category::Display => &[
            SettingsFields::THEME,
            SettingsFields::CURRENCY,
            SettingsFields::DATE_FORMAT,
            SettingsFields::LANGUAGE,
            "compact_mode",
            "show_cents",
        ],
        Category::Privacy => &[
            "two_factor_enabled",
            SettingsFields::SESSION_TIMEOUT_MINUTES,
            "data_sharing_enabled",
            "analytics_enabled",
            "login_alerts",
        ],
        Category::Accounts => &[
            SettingsFields::AUTO_SYNC,
            SettingsFields::SYNC_FREQUENCY,
            SettingsFields::DEFAULT_ACCOUNT_ID,
            "hide_zero_balances",
            "include_in_net_worth",
        ],
    }
}

fn enum_domain(field: &str) -> Option<&'static [&'static str]> {
    match field {
        SettingsFields::THEME => Some(&["light", "dark", "system"]),
        SettingsFields::CURRENCY => Some(&["USD", "EUR", "GBP", "CAD", "AUD", "JPY", "INR"]),
        SettingsFields::DATE_FORMAT => Some(&["MM/DD/YYYY", "DD/MM/YYYY", "YYYY-MM-DD"]),
        SettingsFields::DIGEST_FREQUENCY => Some(&["daily", "weekly", "monthly", "never"]),
        SettingsFields::SYNC_FREQUENCY => {
            Some(&["realtime", "hourly", "daily", "weekly", "manual"])
        }
        _ => None,
    }
}

fn decode(category: Category, payload: &Value) -> Result<CategoryPatch, serde_json::Error> {
    let payload = payload.clone();
    Ok(match category {
        Category::Profile => CategoryPatch::Profile(serde_json::from_value(payload)?),
        Category::Notifications => CategoryPatch::Notifications(serde_json::from_value(payload)?),
        Category::Display => CategoryPatch::Display(serde_json::from_value(payload)?),
        Category::Privacy => CategoryPatch::Privacy(serde_json::from_value(payload)?),
        Category::Accounts => CategoryPatch::Accounts(serde_json::from_value(payload)?),
    })
}

/// Validates an untyped payload addressed to a category by name.
///
/// Unknown categories, unknown fields and enum values outside their domain
/// are reported before the typed rules run.
#[must_use]
pub fn validate_raw(category: &str, payload: &Value) -> ValidationReport {
    match parse_raw_patch(category, payload) {
        Ok(_) => ValidationReport::default(),
        Err(report) => report,
    }
}

/// Validates an untyped payload and converts it into a typed patch.
///
/// # Errors
/// Returns the full [`ValidationReport`] when the payload is not acceptable.
pub fn parse_raw_patch(category: &str, payload: &Value) -> Result<CategoryPatch, ValidationReport> {
    let category: Category = category
        .parse()
        .map_err(|e: settings_sync_sdk::UnknownCategory| ValidationReport::single(e.to_string()))?;

    let Some(fields) = payload.as_object() else {
        return Err(ValidationReport::single(format!(
            "Payload for {category} settings must be an object"
        )));
    };

    let mut report = ValidationReport::default();
    let allowed = known_fields(category);
    for (name, value) in fields {
        if !allowed.contains(&name.as_str()) {
            report.push(format!("Unknown field '{name}' for {category} settings"));
            continue;
        }
        if let Some(domain) = enum_domain(name) {
            let member = value.as_str().is_some_and(|s| domain.contains(&s));
            if !member {
                report.push(format!(
                    "Invalid {name} '{}'. Expected one of: {}",
                    value.as_str().map_or_else(|| value.to_string(), ToOwned::to_owned),
                    domain.join(", ")
                ));
            }
        }
    }
    if !report.is_valid() {
        return Err(report);
    }

    let patch = decode(category, payload).map_err(|e| {
        ValidationReport::single(format!("Invalid {category} settings payload: {e}"))
    })?;

    let report = validate_patch(&patch);
    if report.is_valid() {
        Ok(patch)
    } else {
        Err(report)
    }
}

/// Checks a password change request before it is sent anywhere.
#[must_use]
pub fn validate_password_change(current: &str, new: &str, confirm: &str) -> ValidationReport {
    let mut report = ValidationReport::default();
    if current.is_empty() {
        report.push("Current password is required");
    }
    if new.chars().count() < SettingsFields::PASSWORD_MIN_LEN {
        report.push(format!(
            "New password must be at least {} characters",
            SettingsFields::PASSWORD_MIN_LEN
        ));
    }
    if !(new.chars().any(char::is_alphabetic) && new.chars().any(|c| c.is_ascii_digit())) {
        report.push("New password must contain at least one letter and one number");
    }
    if new != confirm {
        report.push("New passwords do not match");
    }
    if !current.is_empty() && new == current {
        report.push("New password must be different from the current password");
    }
    report
}

#[must_use]
pub fn validate_email_change(new_email: &str) -> ValidationReport {
    let mut report = ValidationReport::default();
    if new_email.trim().is_empty() {
        report.push("Email is required");
    } else if !EMAIL_RE.is_match(new_email.trim()) {
        report.push("Please enter a valid email address");
    }
    report
}
