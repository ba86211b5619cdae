//! Time zone conversion helpers.
//!
//! What this module provides:
//! - [`VENUE_TZ`]: the exchange clock for TWSE/TPEx listings (`Asia/Taipei`).
//! - [`from_local_naive_with_policy`]: Convert a naive wall-clock timestamp in some IANA zone
//!   to UTC, choosing how DST gaps and ambiguities are resolved via [`DstPolicy`].
//!
//! Notes:
//! - Bars are stored in UTC; venue-local time is only used for bucket alignment and display.
//! - Taipei has no DST, so venue conversions are always unambiguous. The policy
//!   machinery exists so the resampler can be pointed at other zones.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use thiserror::Error;

/// Exchange clock for Taiwan equities.
pub const VENUE_TZ: Tz = chrono_tz::Asia::Taipei;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TzError {
    #[error("ambiguous local time {0}")]
    Ambiguous(NaiveDateTime),

    #[error("nonexistent local time {0}")]
    Nonexistent(NaiveDateTime),
}

/// Policy for handling DST edge cases when converting local naive timestamps to UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DstPolicy {
    /// Error on ambiguous (fall-back) or nonexistent (spring-forward) local times.
    Strict,
    /// For ambiguous local times, pick the earlier instant.
    PreferEarliest,
    /// For nonexistent local times, step forward one minute at a time until the
    /// first valid instant (capped at 2 hours). Ambiguous times take the earlier instant.
    ShiftForward,
}

/// Convert a naive local timestamp to UTC using a specific IANA time zone and DST policy.
pub fn from_local_naive_with_policy(
    naive: NaiveDateTime,
    tz: Tz,
    policy: DstPolicy,
) -> Result<DateTime<Utc>, TzError> {
    use chrono::offset::LocalResult::*;
    match tz.from_local_datetime(&naive) {
        Single(dt) => Ok(dt.with_timezone(&Utc)),
        Ambiguous(a, _) => match policy {
            DstPolicy::PreferEarliest | DstPolicy::ShiftForward => Ok(a.with_timezone(&Utc)),
            DstPolicy::Strict => Err(TzError::Ambiguous(naive)),
        },
        None => match policy {
            DstPolicy::ShiftForward => {
                let mut t = naive;
                for _ in 0..120 {
                    t += chrono::Duration::minutes(1);
                    if let Single(dt) = tz.from_local_datetime(&t) {
                        return Ok(dt.with_timezone(&Utc));
                    }
                }
                Err(TzError::Nonexistent(naive))
            }
            _ => Err(TzError::Nonexistent(naive)),
        },
    }
}
