//! Integration tests for duration aggregation over the SQLite store.

use beeper_core::{stats, Database, UptimeStore};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};

fn at(d: u32, h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, d, h, m, 0).unwrap()
}

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
}

#[test]
fn midnight_crossing_session_splits_across_days() {
    let db = Database::open_memory().unwrap();
    let id = db.create_uptime(at(9, 23, 0)).unwrap();
    db.close_uptime(id, at(10, 1, 0)).unwrap();

    let now = at(10, 12, 0);
    let day1 = stats::day_summary(&db, date(9), now, None, 60).unwrap();
    let day2 = stats::day_summary(&db, date(10), now, None, 60).unwrap();

    assert_eq!(day1.active_secs, 3600);
    assert_eq!(day2.active_secs, 3600);
    assert_eq!(day1.active_secs + day2.active_secs, 7200);
}

#[test]
fn live_session_advances_with_now() {
    let db = Database::open_memory().unwrap();
    let id = db.create_uptime(at(10, 9, 0)).unwrap();

    let after_10min = stats::day_summary(&db, date(10), at(10, 9, 10), Some(id), 60).unwrap();
    assert_eq!(after_10min.active_secs, 600);

    let after_1h = stats::day_summary(&db, date(10), at(10, 10, 0), Some(id), 60).unwrap();
    assert_eq!(after_1h.active_secs, 3600);

    // Queried the next day, the contribution stops at midnight.
    let next_day = stats::day_summary(&db, date(10), at(11, 9, 0), Some(id), 60).unwrap();
    assert_eq!(next_day.active_secs, 15 * 3600);
}

#[test]
fn crash_gap_counts_the_conservative_floor() {
    let db = Database::open_memory().unwrap();
    // A session that never got an end timestamp, then a newer one: the
    // older row is a gap, not the running session.
    let gap = db.create_uptime(at(10, 9, 0)).unwrap();
    let current = db.create_uptime(at(10, 14, 0)).unwrap();

    let summary = stats::day_summary(&db, date(10), at(10, 14, 30), Some(current), 60).unwrap();
    // 60s floor for the gap + 30 live minutes.
    assert_eq!(summary.active_secs, 60 + 1800);
    assert_ne!(gap, current);
}

#[test]
fn moments_on_the_boundary_count_once() {
    let db = Database::open_memory().unwrap();
    let id = db.create_uptime(at(9, 22, 0)).unwrap();
    db.close_uptime(id, at(10, 2, 0)).unwrap();

    db.create_moment(id, at(9, 23, 59), true).unwrap();
    db.create_moment(id, at(10, 0, 0), true).unwrap();
    db.create_moment(id, at(10, 0, 1), false).unwrap();

    let now = at(10, 12, 0);
    let day1 = stats::day_summary(&db, date(9), now, None, 60).unwrap();
    let day2 = stats::day_summary(&db, date(10), now, None, 60).unwrap();

    assert_eq!((day1.accepted_count, day1.declined_count), (1, 0));
    assert_eq!((day2.accepted_count, day2.declined_count), (1, 1));
    let total = day1.accepted_count + day1.declined_count + day2.accepted_count
        + day2.declined_count;
    assert_eq!(total, 3);
}

#[test]
fn range_summary_spans_the_study() {
    let db = Database::open_memory().unwrap();
    let u1 = db.create_uptime(at(8, 9, 0)).unwrap();
    db.close_uptime(u1, at(8, 10, 0)).unwrap();
    let u2 = db.create_uptime(at(10, 9, 0)).unwrap();
    db.close_uptime(u2, at(10, 9, 30)).unwrap();

    let summaries = stats::range_summary(&db, date(8), date(10), at(10, 23, 0), None, 60).unwrap();
    assert_eq!(summaries.len(), 3);
    assert_eq!(summaries[0].active_secs, 3600);
    assert_eq!(summaries[1].active_secs, 0);
    assert_eq!(summaries[2].active_secs, 1800);
}

#[test]
fn study_average_feeds_the_planner() {
    let db = Database::open_memory().unwrap();
    let u1 = db.create_uptime(at(8, 9, 0)).unwrap();
    db.close_uptime(u1, at(8, 11, 0)).unwrap();
    let u2 = db.create_uptime(at(9, 9, 0)).unwrap();
    db.close_uptime(u2, at(9, 10, 0)).unwrap();

    let avg = stats::average_daily_active_secs(&db, at(9, 23, 0), None, 60).unwrap();
    assert_eq!(avg, (7200 + 3600) / 2);
}
