//! Time and timestamp helpers.

use chrono::{DateTime, SecondsFormat, Utc};

/// UTC timestamp used for `last_user_command`, directive samples, sync reports.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Format a timestamp the way the directive protocol expects
/// (RFC 3339, millisecond precision, `Z` suffix).
#[must_use]
pub fn to_protocol_string(ts: Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}
