//! SQLite-based storage for uptimes, beeps, and moments.
//!
//! Implements the [`UptimeStore`] contract on a local SQLite file.
//! Timestamps are stored as RFC 3339 text in UTC so lexicographic
//! comparison matches chronological order; statuses are stored as short
//! text tags with parse/format helpers.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::DatabaseError;
use crate::timer::BeepStatus;

use super::{data_dir, Beep, Moment, Uptime, UptimeStore};

// === Helper Functions ===

/// Parse beep status from database string
fn parse_beep_status(status_str: &str) -> BeepStatus {
    match status_str {
        "received" => BeepStatus::Received,
        "cancelled" => BeepStatus::Cancelled,
        "expired" => BeepStatus::Expired,
        _ => BeepStatus::Active,
    }
}

/// Format beep status for database storage
fn format_beep_status(status: BeepStatus) -> &'static str {
    match status {
        BeepStatus::Active => "active",
        BeepStatus::Received => "received",
        BeepStatus::Cancelled => "cancelled",
        BeepStatus::Expired => "expired",
    }
}

/// Parse datetime from RFC3339 string with fallback to current time
fn parse_datetime_fallback(dt_str: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(dt_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// RFC 3339 bounds of a calendar day, `[start, end)`.
fn day_range(day: NaiveDate) -> (String, String) {
    let start = day.and_time(NaiveTime::MIN).and_utc();
    let end = start + chrono::Duration::days(1);
    (start.to_rfc3339(), end.to_rfc3339())
}

/// Build an Uptime from a database row
fn row_to_uptime(row: &rusqlite::Row) -> Result<Uptime, rusqlite::Error> {
    let start_str: String = row.get(1)?;
    let end_str: Option<String> = row.get(2)?;
    Ok(Uptime {
        id: row.get(0)?,
        start: parse_datetime_fallback(&start_str),
        end: end_str.map(|s| parse_datetime_fallback(&s)),
    })
}

/// Build a Beep from a database row
fn row_to_beep(row: &rusqlite::Row) -> Result<Beep, rusqlite::Error> {
    let ts_str: String = row.get(2)?;
    let status_str: String = row.get(3)?;
    Ok(Beep {
        id: row.get(0)?,
        uptime_id: row.get(1)?,
        timestamp: parse_datetime_fallback(&ts_str),
        status: parse_beep_status(&status_str),
    })
}

/// SQLite database for scheduler storage.
///
/// Stores uptimes, scheduled beeps, and self-report moments.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/beeper/beeper.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let path = data_dir()?.join("beeper.db");
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests and ephemeral runs).
    pub fn open_memory() -> Result<Self, Box<dyn std::error::Error>> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS uptimes (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                start_time TEXT NOT NULL,
                end_time   TEXT
            );

            CREATE TABLE IF NOT EXISTS beeps (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                uptime_id  INTEGER NOT NULL REFERENCES uptimes(id),
                timestamp  TEXT NOT NULL,
                status     TEXT NOT NULL DEFAULT 'active'
            );

            CREATE TABLE IF NOT EXISTS moments (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                uptime_id  INTEGER NOT NULL REFERENCES uptimes(id),
                timestamp  TEXT NOT NULL,
                accepted   INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            -- Create indexes for common query patterns
            CREATE INDEX IF NOT EXISTS idx_uptimes_start_time ON uptimes(start_time);
            CREATE INDEX IF NOT EXISTS idx_beeps_uptime_id ON beeps(uptime_id);
            CREATE INDEX IF NOT EXISTS idx_beeps_timestamp ON beeps(timestamp);
            CREATE INDEX IF NOT EXISTS idx_moments_timestamp ON moments(timestamp);",
        )?;
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES ('schema_version', '1')",
            [],
        )?;
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

impl UptimeStore for Database {
    fn open_uptime(&self) -> Result<Option<Uptime>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, start_time, end_time FROM uptimes
             WHERE end_time IS NULL ORDER BY id DESC LIMIT 1",
        )?;
        Ok(stmt.query_row([], row_to_uptime).optional()?)
    }

    fn create_uptime(&self, start: DateTime<Utc>) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO uptimes (start_time) VALUES (?1)",
            params![start.to_rfc3339()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn close_uptime(&self, id: i64, end: DateTime<Utc>) -> Result<(), DatabaseError> {
        self.conn.execute(
            "UPDATE uptimes SET end_time = ?2 WHERE id = ?1",
            params![id, end.to_rfc3339()],
        )?;
        Ok(())
    }

    fn delete_uptime(&self, id: i64) -> Result<(), DatabaseError> {
        self.conn
            .execute("DELETE FROM beeps WHERE uptime_id = ?1", params![id])?;
        self.conn
            .execute("DELETE FROM moments WHERE uptime_id = ?1", params![id])?;
        self.conn
            .execute("DELETE FROM uptimes WHERE id = ?1", params![id])?;
        Ok(())
    }

    fn uptime(&self, id: i64) -> Result<Option<Uptime>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, start_time, end_time FROM uptimes WHERE id = ?1")?;
        Ok(stmt.query_row(params![id], row_to_uptime).optional()?)
    }

    fn uptimes_of_day(&self, day: NaiveDate) -> Result<Vec<Uptime>, DatabaseError> {
        let (sod, eod) = day_range(day);
        let mut stmt = self.conn.prepare(
            "SELECT id, start_time, end_time FROM uptimes
             WHERE start_time < ?2 AND (end_time IS NULL OR end_time > ?1)
             ORDER BY start_time ASC",
        )?;
        let rows = stmt.query_map(params![sod, eod], row_to_uptime)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn most_recent_uptime(&self) -> Result<Option<Uptime>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, start_time, end_time FROM uptimes
             ORDER BY start_time DESC, id DESC LIMIT 1",
        )?;
        Ok(stmt.query_row([], row_to_uptime).optional()?)
    }

    fn first_uptime(&self) -> Result<Option<Uptime>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, start_time, end_time FROM uptimes
             ORDER BY start_time ASC, id ASC LIMIT 1",
        )?;
        Ok(stmt.query_row([], row_to_uptime).optional()?)
    }

    fn create_beep(&self, uptime_id: i64, timestamp: DateTime<Utc>) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO beeps (uptime_id, timestamp, status) VALUES (?1, ?2, 'active')",
            params![uptime_id, timestamp.to_rfc3339()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn beep(&self, id: i64) -> Result<Option<Beep>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, uptime_id, timestamp, status FROM beeps WHERE id = ?1")?;
        Ok(stmt.query_row(params![id], row_to_beep).optional()?)
    }

    fn set_beep_status(&self, id: i64, status: BeepStatus) -> Result<(), DatabaseError> {
        self.conn.execute(
            "UPDATE beeps SET status = ?2 WHERE id = ?1",
            params![id, format_beep_status(status)],
        )?;
        Ok(())
    }

    fn active_beep_of(&self, uptime_id: i64) -> Result<Option<Beep>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, uptime_id, timestamp, status FROM beeps
             WHERE uptime_id = ?1 AND status = 'active'
             ORDER BY id DESC LIMIT 1",
        )?;
        Ok(stmt.query_row(params![uptime_id], row_to_beep).optional()?)
    }

    fn beeps_of_day(&self, day: NaiveDate) -> Result<Vec<Beep>, DatabaseError> {
        let (sod, eod) = day_range(day);
        let mut stmt = self.conn.prepare(
            "SELECT id, uptime_id, timestamp, status FROM beeps
             WHERE timestamp >= ?1 AND timestamp < ?2
             ORDER BY timestamp ASC, id ASC",
        )?;
        let rows = stmt.query_map(params![sod, eod], row_to_beep)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn trailing_cancelled_run(&self, day: NaiveDate) -> Result<u32, DatabaseError> {
        let (sod, eod) = day_range(day);
        let mut stmt = self.conn.prepare(
            "SELECT status FROM beeps
             WHERE timestamp >= ?1 AND timestamp < ?2
             ORDER BY timestamp DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![sod, eod], |row| row.get::<_, String>(0))?;

        let mut run = 0u32;
        for row in rows {
            match parse_beep_status(&row?) {
                BeepStatus::Cancelled => run += 1,
                _ => break,
            }
        }
        Ok(run)
    }

    fn create_moment(
        &self,
        uptime_id: i64,
        timestamp: DateTime<Utc>,
        accepted: bool,
    ) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO moments (uptime_id, timestamp, accepted) VALUES (?1, ?2, ?3)",
            params![uptime_id, timestamp.to_rfc3339(), accepted],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn moments_of_day(&self, day: NaiveDate) -> Result<Vec<Moment>, DatabaseError> {
        let (sod, eod) = day_range(day);
        let mut stmt = self.conn.prepare(
            "SELECT id, uptime_id, timestamp, accepted FROM moments
             WHERE timestamp >= ?1 AND timestamp < ?2
             ORDER BY timestamp ASC, id ASC",
        )?;
        let rows = stmt.query_map(params![sod, eod], |row| {
            let ts_str: String = row.get(2)?;
            Ok(Moment {
                id: row.get(0)?,
                uptime_id: row.get(1)?,
                timestamp: parse_datetime_fallback(&ts_str),
                accepted: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
