use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::Regime;

/// Every state change in the scheduler produces an Event.
/// The host application consumes them to drive alarms and displays.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    UptimeStarted {
        uptime_id: i64,
        at: DateTime<Utc>,
    },
    UptimeClosed {
        uptime_id: i64,
        duration_secs: i64,
        /// In-flight beep cancelled as part of closing, if any.
        /// The host should disarm its alarm.
        cancelled_beep: Option<i64>,
        at: DateTime<Utc>,
    },
    /// The session was shorter than the profile's minimum and was deleted
    /// together with its beeps, so toggle noise never reaches statistics.
    UptimeDiscarded {
        uptime_id: i64,
        duration_secs: i64,
        cancelled_beep: Option<i64>,
        at: DateTime<Utc>,
    },
    BeepScheduled {
        beep_id: i64,
        uptime_id: i64,
        delay_secs: i64,
        regime: Regime,
        fire_at: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    /// A previously scheduled beep was cancelled because a new one
    /// replaced it before it fired.
    BeepSuperseded {
        beep_id: i64,
        at: DateTime<Utc>,
    },
    BeepDelivered {
        beep_id: i64,
        at: DateTime<Utc>,
    },
    BeepCancelled {
        beep_id: i64,
        at: DateTime<Utc>,
    },
    /// The beep missed its tolerance window and was marked expired.
    /// A replacement is scheduled immediately.
    BeepExpired {
        beep_id: i64,
        at: DateTime<Utc>,
    },
    MomentRecorded {
        moment_id: i64,
        uptime_id: i64,
        accepted: bool,
        at: DateTime<Utc>,
    },
    /// An uptime left open by a previous process was re-adopted on startup.
    SchedulerResumed {
        uptime_id: i64,
        active_beep: Option<i64>,
        at: DateTime<Utc>,
    },
}
