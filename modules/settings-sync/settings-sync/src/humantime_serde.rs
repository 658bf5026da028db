//! Serde support for `Duration` fields written the humantime way
//! (`"250ms"`, `"1s"`, `"2m 30s"`).
//!
//! Bare integers are read as milliseconds, which is what environment
//! overrides such as `SETTINGS_SYNC_RETRY__BACKOFF__INITIAL=500` produce.
//!
//! ```ignore
//! #[derive(Deserialize)]
//! struct Backoff {
//!     #[serde(with = "crate::humantime_serde")]
//!     initial: Duration,
//! }
//! ```

use std::fmt;
use std::time::Duration;

use serde::{Deserializer, Serializer, de};

/// Deserializes a `Duration` from a humantime string or integer milliseconds.
///
/// # Errors
/// Returns a deserialization error for unparsable strings and negative numbers.
pub fn deserialize<'de, D>(d: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    d.deserialize_any(DurationVisitor)
}

/// Serializes a `Duration` as a humantime string.
///
/// # Errors
/// Propagates serializer errors.
pub fn serialize<S>(d: &Duration, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.collect_str(&humantime::format_duration(*d))
}

struct DurationVisitor;

impl de::Visitor<'_> for DurationVisitor {
    type Value = Duration;

    fn expecting(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str("a duration such as \"1s\" or a number of milliseconds")
    }

    fn visit_str<E>(self, v: &str) -> Result<Duration, E>
    where
        E: de::Error,
    {
        humantime::parse_duration(v).map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Duration, E>
    where
        E: de::Error,
    {
        Ok(Duration::from_millis(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Duration, E>
    where
        E: de::Error,
    {
        u64::try_from(v)
            .map(Duration::from_millis)
            .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
    }
}
