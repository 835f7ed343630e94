use chrono::{DateTime, NaiveDateTime, Utc};
use uuid::Uuid;

const STAMP_FORMAT: &str = "%Y%m%d%H%M%S%6f";

/// Event id stamped with `at`: `evt-{YYYYMMDDHHmmssffffff}-{random8}`.
///
/// Ids of events created at different microseconds sort by time.
pub fn event_id_at(at: DateTime<Utc>) -> String {
    let nonce = Uuid::new_v4().simple().to_string();
    format!("evt-{}-{}", at.format(STAMP_FORMAT), &nonce[..8])
}

/// Recovers the creation time embedded by [`event_id_at`].
pub fn event_id_timestamp(id: &str) -> Option<DateTime<Utc>> {
    let stamp = id.strip_prefix("evt-")?.split('-').next()?;
    NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}
