//! Uptime/beep lifecycle state machine.
//!
//! Tracks session start/end and per-beep status transitions against the
//! persistence contract, and recovers from missing data after a crash.
//! The machine is single-writer: at most one scheduling decision and one
//! beep delivery are in flight at a time.
//!
//! ## State Transitions
//!
//! ```text
//! Uptime: (none) -> open -> closed | discarded
//! Beep:   active -> received | cancelled | expired
//! ```
//!
//! Received, cancelled, and expired are terminal. A transition attempted
//! on a terminal beep is a no-op, never an error, so cancellation always
//! wins over a racing delivery.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StateError};
use crate::events::Event;
use crate::stats;
use crate::storage::{Beep, Uptime, UptimeStore};

use super::controller::{BeepPlanner, DayHistory};

/// Status of one scheduled beep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BeepStatus {
    /// Scheduled, waiting to fire.
    Active,
    /// The beep screen was shown to the user.
    Received,
    /// Declined by the user or cancelled before firing.
    Cancelled,
    /// Never delivered within the tolerance window; superseded.
    Expired,
}

impl BeepStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, BeepStatus::Active)
    }
}

/// The scheduler's in-memory view of what is currently in flight.
///
/// An owned value threaded through by the caller; the persisted records
/// remain the source of truth and `resume` rebuilds this after a restart.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SchedulerState {
    pub open_uptime: Option<i64>,
    pub active_beep: Option<i64>,
}

/// Drives uptime and beep transitions against a store.
pub struct BeepScheduler<'a, S: UptimeStore> {
    store: &'a S,
    planner: BeepPlanner,
    state: SchedulerState,
}

impl<'a, S: UptimeStore> BeepScheduler<'a, S> {
    /// Create a scheduler with no session open.
    pub fn new(store: &'a S, planner: BeepPlanner) -> Self {
        Self {
            store,
            planner,
            state: SchedulerState::default(),
        }
    }

    /// Create a scheduler, re-adopting a session a previous process left
    /// open. The most recent uptime with no end timestamp is treated as
    /// the running session rather than assumed crashed; only an explicit
    /// `stop` closes it.
    pub fn resume(store: &'a S, planner: BeepPlanner) -> Result<(Self, Option<Event>)> {
        let mut scheduler = Self::new(store, planner);
        let event = match store.most_recent_uptime()? {
            Some(uptime) if uptime.end.is_none() => {
                let active = store.active_beep_of(uptime.id)?;
                scheduler.state.open_uptime = Some(uptime.id);
                scheduler.state.active_beep = active.as_ref().map(|b| b.id);
                log::debug!("resumed open uptime {}", uptime.id);
                Some(Event::SchedulerResumed {
                    uptime_id: uptime.id,
                    active_beep: scheduler.state.active_beep,
                    at: Utc::now(),
                })
            }
            _ => None,
        };
        Ok((scheduler, event))
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn planner(&self) -> &BeepPlanner {
        &self.planner
    }

    pub fn is_running(&self) -> bool {
        self.state.open_uptime.is_some()
    }

    /// The open uptime record, resolved from the store.
    pub fn current_open(&self) -> Result<Option<Uptime>> {
        match self.state.open_uptime {
            Some(id) => Ok(self.store.uptime(id)?),
            None => Ok(self.store.open_uptime()?),
        }
    }

    /// The in-flight beep, if one is still active.
    pub fn active_beep(&self) -> Result<Option<Beep>> {
        if let Some(id) = self.state.active_beep {
            if let Some(beep) = self.store.beep(id)? {
                if beep.status == BeepStatus::Active {
                    return Ok(Some(beep));
                }
            }
        }
        match self.current_open()? {
            Some(uptime) => Ok(self.store.active_beep_of(uptime.id)?),
            None => Ok(None),
        }
    }

    /// Collect today's history snapshot for the planner.
    pub fn gather_history(&self, now: DateTime<Utc>) -> Result<DayHistory> {
        let day = now.date_naive();
        let floor = self.planner.profile().min_uptime_duration;
        let open_id = self.current_open()?.map(|u| u.id);
        let today = stats::day_summary(self.store, day, now, open_id, floor)?;
        let avg = stats::average_daily_active_secs(self.store, now, open_id, floor)?;
        let run = self.store.trailing_cancelled_run(day)?;
        Ok(DayHistory {
            today_uptime_secs: today.active_secs,
            today_avg_uptime_secs: avg,
            consecutive_cancelled: run,
        })
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Open a new uptime. Fails if one is already open.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<Event> {
        if let Some(open) = self.current_open()? {
            return Err(StateError::UptimeAlreadyOpen { id: open.id }.into());
        }
        let id = self.store.create_uptime(now)?;
        self.state.open_uptime = Some(id);
        self.state.active_beep = None;
        Ok(Event::UptimeStarted {
            uptime_id: id,
            at: now,
        })
    }

    /// Close the open uptime, cancelling any in-flight beep.
    ///
    /// A session shorter than the profile's `min_uptime_duration` is
    /// deleted together with its beeps and moments instead of persisted,
    /// so toggle noise never reaches statistics.
    pub fn stop(&mut self, now: DateTime<Utc>) -> Result<Event> {
        let open = self.current_open()?.ok_or(StateError::NoOpenUptime)?;
        let cancelled_beep = self.cancel_in_flight(open.id)?;
        let duration_secs = (now - open.start).num_seconds();
        self.state.open_uptime = None;
        self.state.active_beep = None;

        if duration_secs < self.planner.profile().min_uptime_duration {
            self.store.delete_uptime(open.id)?;
            log::debug!(
                "discarded uptime {} after {duration_secs}s (below minimum)",
                open.id
            );
            Ok(Event::UptimeDiscarded {
                uptime_id: open.id,
                duration_secs,
                cancelled_beep,
                at: now,
            })
        } else {
            self.store.close_uptime(open.id, now)?;
            Ok(Event::UptimeClosed {
                uptime_id: open.id,
                duration_secs,
                cancelled_beep,
                at: now,
            })
        }
    }

    /// Plan and persist the next beep. Fails if no uptime is open.
    ///
    /// A beep still in flight is cancelled first so no two beeps are ever
    /// concurrently active.
    pub fn schedule_beep(
        &mut self,
        now: DateTime<Utc>,
        history: &DayHistory,
    ) -> Result<Vec<Event>> {
        let open = self.current_open()?.ok_or(StateError::NoOpenUptime)?;
        let mut events = Vec::new();

        if let Some(previous) = self.active_beep()? {
            self.store.set_beep_status(previous.id, BeepStatus::Cancelled)?;
            self.state.active_beep = None;
            events.push(Event::BeepSuperseded {
                beep_id: previous.id,
                at: now,
            });
        }

        let regime = self.planner.regime(history);
        let delay_secs = self.planner.compute_next_beep_delay(history);
        let fire_at = now + Duration::seconds(delay_secs);
        let beep_id = self.store.create_beep(open.id, fire_at)?;
        self.state.active_beep = Some(beep_id);

        events.push(Event::BeepScheduled {
            beep_id,
            uptime_id: open.id,
            delay_secs,
            regime,
            fire_at,
            at: now,
        });
        Ok(events)
    }

    /// Gather history and schedule in one step.
    pub fn schedule_next(&mut self, now: DateTime<Utc>) -> Result<Vec<Event>> {
        let history = self.gather_history(now)?;
        self.schedule_beep(now, &history)
    }

    /// The beep screen was shown: active -> received.
    pub fn deliver(&mut self, beep_id: i64, now: DateTime<Utc>) -> Result<Option<Event>> {
        self.transition(beep_id, BeepStatus::Received, now)
    }

    /// The user declined the beep: active -> cancelled.
    pub fn decline(&mut self, beep_id: i64, now: DateTime<Utc>) -> Result<Option<Event>> {
        self.transition(beep_id, BeepStatus::Cancelled, now)
    }

    /// The beep was cancelled before firing (scheduler toggled off, an
    /// incoming call, ...): active -> cancelled.
    pub fn cancel(&mut self, beep_id: i64, now: DateTime<Utc>) -> Result<Option<Event>> {
        self.transition(beep_id, BeepStatus::Cancelled, now)
    }

    /// The beep missed its deadline: active -> expired.
    ///
    /// Callers should schedule a replacement right away; `check_overdue`
    /// and `handle_alarm` do both in one step.
    pub fn expire(&mut self, beep_id: i64, now: DateTime<Utc>) -> Result<Option<Event>> {
        self.transition(beep_id, BeepStatus::Expired, now)
    }

    /// Persist the user's self-report for the open uptime.
    pub fn record_moment(&mut self, now: DateTime<Utc>, accepted: bool) -> Result<Event> {
        let open = self.current_open()?.ok_or(StateError::NoOpenUptime)?;
        let moment_id = self.store.create_moment(open.id, now, accepted)?;
        Ok(Event::MomentRecorded {
            moment_id,
            uptime_id: open.id,
            accepted,
            at: now,
        })
    }

    /// Expire the in-flight beep if it overshot its tolerance window and
    /// immediately schedule a replacement, so the study never stalls.
    ///
    /// A beep exactly at `timestamp + tolerance` is still deliverable;
    /// one second past is expired.
    pub fn check_overdue(
        &mut self,
        now: DateTime<Utc>,
        tolerance_secs: i64,
    ) -> Result<Vec<Event>> {
        let Some(beep) = self.active_beep()? else {
            return Ok(Vec::new());
        };
        if now - beep.timestamp <= Duration::seconds(tolerance_secs) {
            return Ok(Vec::new());
        }
        log::debug!(
            "beep {} overshot its {tolerance_secs}s tolerance; replacing",
            beep.id
        );
        let mut events = Vec::new();
        events.extend(self.expire(beep.id, now)?);
        events.extend(self.schedule_next(now)?);
        Ok(events)
    }

    /// Feed a callback from the OS alarm facility into the state machine.
    pub fn handle_alarm(
        &mut self,
        signal: crate::alarm::AlarmSignal,
        now: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        use crate::alarm::AlarmSignal;
        match signal {
            AlarmSignal::Fired { beep_id } => {
                Ok(self.deliver(beep_id, now)?.into_iter().collect())
            }
            AlarmSignal::MissedDeadline { beep_id } => {
                let mut events = Vec::new();
                events.extend(self.expire(beep_id, now)?);
                if self.current_open()?.is_some() {
                    events.extend(self.schedule_next(now)?);
                }
                Ok(events)
            }
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Apply one status transition. Terminal beeps are left untouched and
    /// yield no event.
    fn transition(
        &mut self,
        beep_id: i64,
        to: BeepStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<Event>> {
        debug_assert!(to.is_terminal(), "cannot transition back to active");
        let beep = self
            .store
            .beep(beep_id)?
            .ok_or(StateError::BeepNotFound { id: beep_id })?;
        if beep.status.is_terminal() {
            log::debug!(
                "beep {beep_id} is already {:?}; ignoring transition to {to:?}",
                beep.status
            );
            return Ok(None);
        }
        self.store.set_beep_status(beep_id, to)?;
        if self.state.active_beep == Some(beep_id) {
            self.state.active_beep = None;
        }
        let event = match to {
            BeepStatus::Received => Event::BeepDelivered { beep_id, at: now },
            BeepStatus::Cancelled => Event::BeepCancelled { beep_id, at: now },
            BeepStatus::Expired => Event::BeepExpired { beep_id, at: now },
            BeepStatus::Active => unreachable!("guarded by debug_assert"),
        };
        Ok(Some(event))
    }

    /// Cancel whatever beep is still active inside `uptime_id`.
    fn cancel_in_flight(&mut self, uptime_id: i64) -> Result<Option<i64>> {
        let beep = match self.store.active_beep_of(uptime_id)? {
            Some(b) => b,
            None => return Ok(None),
        };
        self.store.set_beep_status(beep.id, BeepStatus::Cancelled)?;
        self.state.active_beep = None;
        Ok(Some(beep.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;
    use crate::timer::TimerProfile;
    use chrono::TimeZone;

    fn ts(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, h, m, 0).unwrap()
    }

    fn planner() -> BeepPlanner {
        BeepPlanner::with_seed(TimerProfile::builtin("standard").unwrap(), 42).unwrap()
    }

    #[test]
    fn second_start_fails_while_open() {
        let db = Database::open_memory().unwrap();
        let mut scheduler = BeepScheduler::new(&db, planner());

        scheduler.start(ts(9, 0)).unwrap();
        assert!(scheduler.start(ts(9, 1)).is_err());

        scheduler.stop(ts(10, 0)).unwrap();
        assert!(scheduler.start(ts(10, 1)).is_ok());
    }

    #[test]
    fn short_session_is_discarded_with_its_beeps() {
        let db = Database::open_memory().unwrap();
        let mut scheduler = BeepScheduler::new(&db, planner());

        scheduler.start(ts(9, 0)).unwrap();
        scheduler
            .schedule_beep(ts(9, 0), &DayHistory::default())
            .unwrap();
        // standard profile: min_uptime_duration = 60s; stop after 30s.
        let event = scheduler
            .stop(ts(9, 0) + Duration::seconds(30))
            .unwrap();
        assert!(matches!(event, Event::UptimeDiscarded { .. }));

        let day = ts(9, 0).date_naive();
        assert!(db.uptimes_of_day(day).unwrap().is_empty());
        assert!(db.beeps_of_day(day).unwrap().is_empty());
    }

    #[test]
    fn long_session_is_closed() {
        let db = Database::open_memory().unwrap();
        let mut scheduler = BeepScheduler::new(&db, planner());

        scheduler.start(ts(9, 0)).unwrap();
        let event = scheduler.stop(ts(10, 0)).unwrap();
        match event {
            Event::UptimeClosed { duration_secs, .. } => assert_eq!(duration_secs, 3600),
            other => panic!("expected UptimeClosed, got {other:?}"),
        }
    }

    #[test]
    fn schedule_requires_open_uptime() {
        let db = Database::open_memory().unwrap();
        let mut scheduler = BeepScheduler::new(&db, planner());
        assert!(scheduler
            .schedule_beep(ts(9, 0), &DayHistory::default())
            .is_err());
    }

    #[test]
    fn scheduling_supersedes_the_previous_beep() {
        let db = Database::open_memory().unwrap();
        let mut scheduler = BeepScheduler::new(&db, planner());
        scheduler.start(ts(9, 0)).unwrap();

        let first = scheduler
            .schedule_beep(ts(9, 0), &DayHistory::default())
            .unwrap();
        let first_id = match first[0] {
            Event::BeepScheduled { beep_id, .. } => beep_id,
            ref other => panic!("expected BeepScheduled, got {other:?}"),
        };

        let second = scheduler
            .schedule_beep(ts(9, 5), &DayHistory::default())
            .unwrap();
        assert!(matches!(
            second[0],
            Event::BeepSuperseded { beep_id, .. } if beep_id == first_id
        ));
        assert_eq!(db.beep(first_id).unwrap().unwrap().status, BeepStatus::Cancelled);
    }

    #[test]
    fn terminal_states_are_monotonic() {
        let db = Database::open_memory().unwrap();
        let mut scheduler = BeepScheduler::new(&db, planner());
        scheduler.start(ts(9, 0)).unwrap();
        let events = scheduler
            .schedule_beep(ts(9, 0), &DayHistory::default())
            .unwrap();
        let beep_id = match events[0] {
            Event::BeepScheduled { beep_id, .. } => beep_id,
            ref other => panic!("expected BeepScheduled, got {other:?}"),
        };

        assert!(scheduler.cancel(beep_id, ts(9, 10)).unwrap().is_some());
        // Cancellation wins: a racing delivery becomes a no-op.
        assert!(scheduler.deliver(beep_id, ts(9, 11)).unwrap().is_none());
        assert_eq!(
            db.beep(beep_id).unwrap().unwrap().status,
            BeepStatus::Cancelled
        );
    }

    #[test]
    fn overdue_beep_is_expired_and_replaced() {
        let db = Database::open_memory().unwrap();
        let mut scheduler = BeepScheduler::new(&db, planner());
        scheduler.start(ts(9, 0)).unwrap();
        let events = scheduler
            .schedule_beep(ts(9, 0), &DayHistory::default())
            .unwrap();
        let beep_id = match events[0] {
            Event::BeepScheduled { beep_id, fire_at, .. } => {
                assert!(fire_at > ts(9, 0));
                beep_id
            }
            ref other => panic!("expected BeepScheduled, got {other:?}"),
        };
        let fire_at = db.beep(beep_id).unwrap().unwrap().timestamp;

        // Within tolerance: nothing happens.
        let quiet = scheduler
            .check_overdue(fire_at + Duration::seconds(600), 600)
            .unwrap();
        assert!(quiet.is_empty());

        // One second past tolerance: expired and replaced.
        let events = scheduler
            .check_overdue(fire_at + Duration::seconds(601), 600)
            .unwrap();
        assert!(matches!(events[0], Event::BeepExpired { .. }));
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::BeepScheduled { .. })));
        assert_eq!(
            db.beep(beep_id).unwrap().unwrap().status,
            BeepStatus::Expired
        );
    }

    #[test]
    fn resume_adopts_open_uptime() {
        let db = Database::open_memory().unwrap();
        let uptime_id;
        {
            let mut scheduler = BeepScheduler::new(&db, planner());
            scheduler.start(ts(9, 0)).unwrap();
            uptime_id = scheduler.state().open_uptime.unwrap();
            // Process dies here without stopping.
        }

        let (scheduler, event) = BeepScheduler::resume(&db, planner()).unwrap();
        assert_eq!(scheduler.state().open_uptime, Some(uptime_id));
        assert!(matches!(event, Some(Event::SchedulerResumed { .. })));
    }

    #[test]
    fn resume_without_open_uptime_is_idle() {
        let db = Database::open_memory().unwrap();
        {
            let mut scheduler = BeepScheduler::new(&db, planner());
            scheduler.start(ts(9, 0)).unwrap();
            scheduler.stop(ts(10, 0)).unwrap();
        }
        let (scheduler, event) = BeepScheduler::resume(&db, planner()).unwrap();
        assert!(!scheduler.is_running());
        assert!(event.is_none());
    }

    #[test]
    fn moment_requires_open_uptime() {
        let db = Database::open_memory().unwrap();
        let mut scheduler = BeepScheduler::new(&db, planner());
        assert!(scheduler.record_moment(ts(9, 0), true).is_err());

        scheduler.start(ts(9, 0)).unwrap();
        let event = scheduler.record_moment(ts(9, 30), true).unwrap();
        assert!(matches!(event, Event::MomentRecorded { accepted: true, .. }));
    }
}
