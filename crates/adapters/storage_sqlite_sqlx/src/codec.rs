//! Column codecs shared by the repositories.

use chrono::{DateTime, SecondsFormat, Utc};
use homepilot_domain::time::Timestamp;
use serde::de::DeserializeOwned;

pub(crate) fn decode_error<E>(err: E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    sqlx::Error::Decode(Box::new(err))
}

pub(crate) fn json_column<T: DeserializeOwned>(raw: &str) -> Result<T, sqlx::Error> {
    serde_json::from_str(raw).map_err(decode_error)
}

pub(crate) fn count_column(value: i64) -> Result<u32, sqlx::Error> {
    u32::try_from(value).map_err(decode_error)
}

pub(crate) fn encode_timestamp(ts: Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode_timestamp(raw: &str) -> Result<Timestamp, sqlx::Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(decode_error)
}

/// Stored id for an insert: `None` lets `SQLite` pick the next rowid.
pub(crate) fn insert_id(id: i64) -> Option<i64> {
    (id > 0).then_some(id)
}
