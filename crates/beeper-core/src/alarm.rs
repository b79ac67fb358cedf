use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The OS-level alarm facility the scheduler drives.
///
/// The core emits "fire at timestamp" requests and never manages
/// wall-clock timers itself. The host arms a platform alarm and feeds
/// [`AlarmSignal`]s back into the lifecycle when it fires or when the
/// deadline was missed (e.g. the device slept through it).
pub trait AlarmBackend {
    /// Arrange for `beep_id` to fire at `fire_at`.
    fn arm(&mut self, beep_id: i64, fire_at: DateTime<Utc>);

    /// Drop a pending alarm (the beep was cancelled or superseded).
    fn disarm(&mut self, beep_id: i64);
}

/// Callback from the alarm facility, fed into
/// [`crate::timer::BeepScheduler::handle_alarm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AlarmSignal {
    /// The alarm fired and the beep screen is being shown.
    Fired { beep_id: i64 },
    /// The alarm never fired before its deadline; the beep must be
    /// expired and replaced.
    MissedDeadline { beep_id: i64 },
}

/// Alarm backend that does nothing. Used by tests and by front-ends that
/// poll instead of arming real alarms.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAlarm;

impl AlarmBackend for NullAlarm {
    fn arm(&mut self, _beep_id: i64, _fire_at: DateTime<Utc>) {}

    fn disarm(&mut self, _beep_id: i64) {}
}
