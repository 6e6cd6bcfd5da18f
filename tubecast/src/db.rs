use chrono::{DateTime, Utc};

pub type Db = sqlx::SqlitePool;
pub type DbC = sqlx::SqliteConnection;

/// Timestamps are stored as RFC 3339 text columns. Fixed-width fractional
/// seconds keep lexicographic ordering consistent with time ordering.
pub(crate) fn encode_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

pub(crate) fn decode_datetime(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
