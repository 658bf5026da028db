pub struct SettingsFields;

impl SettingsFields {
    pub const FIRST_NAME: &'static str = "first_name";
    pub const LAST_NAME: &'static str = "last_name";
    pub const EMAIL: &'static str = "email";
    pub const PHONE: &'static str = "phone";
    pub const TIMEZONE: &'static str = "timezone";
    pub const AVATAR_URL: &'static str = "avatar_url";
    pub const LOW_BALANCE_THRESHOLD: &'static str = "low_balance_threshold";
    pub const DIGEST_FREQUENCY: &'static str = "digest_frequency";
    pub const THEME: &'static str = "theme";
    pub const CURRENCY: &'static str = "currency";
    pub const DATE_FORMAT: &'static str = "date_format";
    pub const LANGUAGE: &'static str = "language";
    pub const SESSION_TIMEOUT_MINUTES: &'static str = "session_timeout_minutes";
    pub const AUTO_SYNC: &'static str = "auto_sync";
    pub const SYNC_FREQUENCY: &'static str = "sync_frequency";
    pub const DEFAULT_ACCOUNT_ID: &'static str = "default_account_id";

    pub const NAME_MAX_LEN: usize = 50;
    pub const SESSION_TIMEOUT_MIN: u32 = 5;
    pub const SESSION_TIMEOUT_MAX: u32 = 1440;
    pub const PASSWORD_MIN_LEN: usize = 8;
}
