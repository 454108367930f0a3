//! ISO-week arithmetic for the weekly purchase counters.
//!
//! Weekly counters reset lazily by comparing the stored week identifier
//! against the current one; no cleanup job runs anywhere. Expiry deadlines
//! (buffs, duel windows) are compared with
//! [`dachstaler_types::deadline_passed`] next to the types they guard.

use chrono::{DateTime, Datelike, Utc};
use dachstaler_types::WeekId;

/// ISO week containing the unix timestamp `now`, packed as `year * 100 + week`.
pub fn week_of(now: u64) -> WeekId {
    let ts = i64::try_from(now).unwrap_or(i64::MAX);
    let date = DateTime::<Utc>::from_timestamp(ts, 0).unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    let iso = date.iso_week();
    let year = iso.year().max(0) as u32;
    WeekId(year * 100 + iso.week())
}
