//! Statistics over persisted scheduler history.
//!
//! Read-side only: these functions recompute summaries from the store on
//! demand (for the UI, export, or the adaptive planner) and never touch
//! scheduler state. Safe to run concurrently with scheduling as long as
//! the store hands out consistent snapshots.

mod day_summary;

pub use day_summary::{day_bounds, summarize_day, DaySummary};

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::error::DatabaseError;
use crate::storage::UptimeStore;

/// Fetch one day's records and summarize them.
pub fn day_summary<S: UptimeStore>(
    store: &S,
    day: NaiveDate,
    now: DateTime<Utc>,
    open_uptime_id: Option<i64>,
    min_uptime_floor: i64,
) -> Result<DaySummary, DatabaseError> {
    let uptimes = store.uptimes_of_day(day)?;
    let moments = store.moments_of_day(day)?;
    Ok(summarize_day(
        &uptimes,
        &moments,
        day,
        now,
        open_uptime_id,
        min_uptime_floor,
    ))
}

/// Summaries for every day in `[from, to]` inclusive.
pub fn range_summary<S: UptimeStore>(
    store: &S,
    from: NaiveDate,
    to: NaiveDate,
    now: DateTime<Utc>,
    open_uptime_id: Option<i64>,
    min_uptime_floor: i64,
) -> Result<Vec<DaySummary>, DatabaseError> {
    let mut summaries = Vec::new();
    let mut day = from;
    while day <= to {
        summaries.push(day_summary(store, day, now, open_uptime_id, min_uptime_floor)?);
        day = day + Duration::days(1);
    }
    Ok(summaries)
}

/// Mean active seconds per day, over the days of the study that contain
/// at least one uptime. Days the scheduler was never used don't dilute
/// the signal. Returns 0 before any history exists.
pub fn average_daily_active_secs<S: UptimeStore>(
    store: &S,
    now: DateTime<Utc>,
    open_uptime_id: Option<i64>,
    min_uptime_floor: i64,
) -> Result<i64, DatabaseError> {
    let first = match store.first_uptime()? {
        Some(uptime) => uptime,
        None => return Ok(0),
    };

    let mut total = 0i64;
    let mut observed_days = 0i64;
    let mut day = first.start.date_naive();
    let today = now.date_naive();
    while day <= today {
        let uptimes = store.uptimes_of_day(day)?;
        if !uptimes.is_empty() {
            let moments = store.moments_of_day(day)?;
            let summary = summarize_day(
                &uptimes,
                &moments,
                day,
                now,
                open_uptime_id,
                min_uptime_floor,
            );
            total += summary.active_secs;
            observed_days += 1;
        }
        day = day + Duration::days(1);
    }

    if observed_days == 0 {
        Ok(0)
    } else {
        Ok(total / observed_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;
    use chrono::TimeZone;

    fn at(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, d, h, m, 0).unwrap()
    }

    #[test]
    fn average_skips_unused_days() {
        let db = Database::open_memory().unwrap();
        // One hour on March 8, two hours on March 10, nothing on the 9th.
        let u1 = db.create_uptime(at(8, 9, 0)).unwrap();
        db.close_uptime(u1, at(8, 10, 0)).unwrap();
        let u2 = db.create_uptime(at(10, 9, 0)).unwrap();
        db.close_uptime(u2, at(10, 11, 0)).unwrap();

        let avg = average_daily_active_secs(&db, at(10, 23, 0), None, 60).unwrap();
        assert_eq!(avg, (3600 + 7200) / 2);
    }

    #[test]
    fn average_is_zero_without_history() {
        let db = Database::open_memory().unwrap();
        assert_eq!(
            average_daily_active_secs(&db, at(10, 12, 0), None, 60).unwrap(),
            0
        );
    }

    #[test]
    fn range_summary_covers_every_day() {
        let db = Database::open_memory().unwrap();
        let u1 = db.create_uptime(at(9, 23, 0)).unwrap();
        db.close_uptime(u1, at(10, 1, 0)).unwrap();

        let from = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        let to = NaiveDate::from_ymd_opt(2026, 3, 11).unwrap();
        let summaries = range_summary(&db, from, to, at(11, 12, 0), None, 60).unwrap();
        assert_eq!(summaries.len(), 3);
        assert_eq!(summaries[0].active_secs, 3600);
        assert_eq!(summaries[1].active_secs, 3600);
        assert_eq!(summaries[2].active_secs, 0);
    }
}
