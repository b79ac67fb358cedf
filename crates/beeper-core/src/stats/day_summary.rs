//! Per-day accounting over raw uptime and moment records.
//!
//! Pure computation: the caller fetches the records, this module
//! apportions active time. The subtle cases are sessions straddling
//! midnight (only the portion inside the queried day counts), the
//! still-open session (counts up to `now`, capped at the day boundary),
//! and sessions that lost their end timestamp to a crash (counted at a
//! conservative floor instead of zero or unknown).

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::{Moment, Uptime};

/// Per-day summary of self-reports and active time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub accepted_count: u32,
    pub declined_count: u32,
    pub active_secs: i64,
}

/// UTC bounds of a calendar day, `[start, end)`.
pub fn day_bounds(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = day.and_time(NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}

/// Seconds of `[start, end]` that fall inside `[lo, hi)`.
fn overlap_secs(start: DateTime<Utc>, end: DateTime<Utc>, lo: DateTime<Utc>, hi: DateTime<Utc>) -> i64 {
    (end.min(hi) - start.max(lo)).num_seconds().max(0)
}

/// Apportion active time and count self-reports for one calendar day.
///
/// `open_uptime_id` identifies the currently running session; any other
/// record without an end timestamp is a data-integrity gap and
/// contributes `min_uptime_floor` seconds instead.
///
/// Moments are bucketed by their own timestamp's day, never their
/// uptime's, so a report just past midnight lands on the right side.
pub fn summarize_day(
    uptimes: &[Uptime],
    moments: &[Moment],
    day: NaiveDate,
    now: DateTime<Utc>,
    open_uptime_id: Option<i64>,
    min_uptime_floor: i64,
) -> DaySummary {
    let (sod, eod) = day_bounds(day);

    let mut active_secs = 0i64;
    for uptime in uptimes {
        let contribution = match uptime.end {
            Some(end) => overlap_secs(uptime.start, end, sod, eod),
            None if open_uptime_id == Some(uptime.id) => {
                overlap_secs(uptime.start, now.min(eod), sod, eod)
            }
            None => {
                // Crash-induced gap: the end was never recorded. Count the
                // minimum session length on the day it started.
                if uptime.start >= sod && uptime.start < eod {
                    log::warn!(
                        "uptime {} has no end timestamp; counting {min_uptime_floor}s floor",
                        uptime.id
                    );
                    min_uptime_floor
                } else {
                    0
                }
            }
        };
        active_secs += contribution;
    }

    let mut accepted_count = 0u32;
    let mut declined_count = 0u32;
    for moment in moments {
        if moment.timestamp.date_naive() != day {
            continue;
        }
        if moment.accepted {
            accepted_count += 1;
        } else {
            declined_count += 1;
        }
    }

    DaySummary {
        date: day,
        accepted_count,
        declined_count,
        active_secs,
    }
}
