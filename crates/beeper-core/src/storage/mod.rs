pub mod config;
pub mod database;

pub use config::{Config, SchedulerConfig};
pub use database::Database;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DatabaseError;
use crate::timer::BeepStatus;

use std::path::PathBuf;

/// Returns `~/.config/beeper[-dev]/` based on BEEPER_ENV.
///
/// Set BEEPER_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if the home directory cannot be determined or if
/// creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("BEEPER_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("beeper-dev")
    } else {
        base_dir.join("beeper")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// A contiguous interval during which the scheduler is active and beeps
/// may fire. `end` is `None` while the session is open, or when the
/// process died without recording an end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Uptime {
    pub id: i64,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

/// One scheduling decision: when a beep should fire and what became of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beep {
    pub id: i64,
    pub uptime_id: i64,
    pub timestamp: DateTime<Utc>,
    pub status: BeepStatus,
}

/// The user-entered record resulting from an accepted or declined beep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Moment {
    pub id: i64,
    pub uptime_id: i64,
    pub timestamp: DateTime<Utc>,
    pub accepted: bool,
}

/// The persistence contract the scheduler core consumes.
///
/// All calls are synchronous round-trips to a local store. Identifiers are
/// opaque monotonic surrogate keys owned by the implementation; the core
/// never recomputes or reuses them.
pub trait UptimeStore {
    /// The uptime with no end timestamp, if any.
    fn open_uptime(&self) -> Result<Option<Uptime>, DatabaseError>;

    fn create_uptime(&self, start: DateTime<Utc>) -> Result<i64, DatabaseError>;

    fn close_uptime(&self, id: i64, end: DateTime<Utc>) -> Result<(), DatabaseError>;

    /// Delete an uptime together with its beeps and moments.
    fn delete_uptime(&self, id: i64) -> Result<(), DatabaseError>;

    fn uptime(&self, id: i64) -> Result<Option<Uptime>, DatabaseError>;

    /// Uptimes intersecting the given calendar day, including ones that
    /// started the day before or have no end yet.
    fn uptimes_of_day(&self, day: NaiveDate) -> Result<Vec<Uptime>, DatabaseError>;

    fn most_recent_uptime(&self) -> Result<Option<Uptime>, DatabaseError>;

    /// The earliest recorded uptime; anchors per-study averages.
    fn first_uptime(&self) -> Result<Option<Uptime>, DatabaseError>;

    fn create_beep(
        &self,
        uptime_id: i64,
        timestamp: DateTime<Utc>,
    ) -> Result<i64, DatabaseError>;

    fn beep(&self, id: i64) -> Result<Option<Beep>, DatabaseError>;

    fn set_beep_status(&self, id: i64, status: BeepStatus) -> Result<(), DatabaseError>;

    /// The still-active beep of an uptime, if any.
    fn active_beep_of(&self, uptime_id: i64) -> Result<Option<Beep>, DatabaseError>;

    fn beeps_of_day(&self, day: NaiveDate) -> Result<Vec<Beep>, DatabaseError>;

    /// Length of the unbroken run of cancelled beeps at the end of the
    /// day's history, scanning newest-first and stopping at the first
    /// non-cancelled beep.
    fn trailing_cancelled_run(&self, day: NaiveDate) -> Result<u32, DatabaseError>;

    fn create_moment(
        &self,
        uptime_id: i64,
        timestamp: DateTime<Utc>,
        accepted: bool,
    ) -> Result<i64, DatabaseError>;

    fn moments_of_day(&self, day: NaiveDate) -> Result<Vec<Moment>, DatabaseError>;
}
