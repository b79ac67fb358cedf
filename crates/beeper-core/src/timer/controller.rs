//! Adaptive beep planning.
//!
//! The planner decides the bounds handed to the interval generator. Two
//! regimes, switched by hysteresis:
//!
//! - **Approximation**: early in the day there is not enough signal to
//!   infer the user's rhythm, so the study-wide profile bounds are used
//!   as-is.
//! - **History-driven**: once enough active time has accumulated today, or
//!   the user keeps cancelling beeps, the window tightens around half the
//!   observed average daily active time, converging the delivered rate
//!   toward one beep per `avg_beep_interval` of *active* time.
//!
//! Degenerate windows (e.g. a fresh study where the observed average is
//! zero) are repaired by deterministic widening, never surfaced as errors.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

use super::generator::{BeepWindow, IntervalGenerator};
use super::profile::TimerProfile;

/// The history snapshot the planner needs to pick a regime.
///
/// All values are observed, never assumed: accumulated active seconds so
/// far today, the mean of per-day active seconds over the study, and the
/// unbroken trailing run of cancelled beeps today.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DayHistory {
    pub today_uptime_secs: i64,
    pub today_avg_uptime_secs: i64,
    pub consecutive_cancelled: u32,
}

/// Which regime produced a scheduling decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Regime {
    Approximation,
    History,
}

/// Chooses generator bounds from beep history and owns the per-study
/// tunables.
pub struct BeepPlanner {
    profile: TimerProfile,
    generator: IntervalGenerator,
}

impl BeepPlanner {
    /// Create a planner for a validated profile.
    pub fn new(profile: TimerProfile) -> Result<Self, ValidationError> {
        profile.validate()?;
        Ok(Self {
            profile,
            generator: IntervalGenerator::new(),
        })
    }

    /// Create a planner with a seeded generator (for reproducible tests).
    pub fn with_seed(profile: TimerProfile, seed: u64) -> Result<Self, ValidationError> {
        profile.validate()?;
        Ok(Self {
            profile,
            generator: IntervalGenerator::with_seed(seed),
        })
    }

    pub fn profile(&self) -> &TimerProfile {
        &self.profile
    }

    /// Regime selection by hysteresis.
    ///
    /// Stays in approximation while today's accumulated uptime is at or
    /// below the threshold AND the user is not on a cancellation streak.
    pub fn regime(&self, history: &DayHistory) -> Regime {
        let p = &self.profile;
        if history.today_uptime_secs <= p.uptime_count_move_to_average
            && history.consecutive_cancelled < p.num_cancelled_beeps_move_to_average
        {
            Regime::Approximation
        } else {
            Regime::History
        }
    }

    /// Compute the generator window for the current regime.
    ///
    /// Guarantees `min < avg < max` on the result, regardless of input:
    /// pathological history narrows the window to `min_size_beep_interval`
    /// on the affected side instead of failing.
    pub fn plan_window(&self, history: &DayHistory) -> BeepWindow {
        let p = &self.profile;
        match self.regime(history) {
            Regime::Approximation => BeepWindow {
                min: p.min_beep_interval,
                avg: p.avg_beep_interval,
                max: p.max_beep_interval,
            },
            Regime::History => {
                let observed = history.today_avg_uptime_secs.max(0);
                let avg = ((observed + 1) / 2).min(p.avg_beep_interval);

                // Early side: promote min until it sits strictly below avg.
                let mut min = p.min_beep_interval;
                if min >= avg {
                    min = p.min_uptime_duration;
                }
                if min >= avg {
                    min = avg - p.min_size_beep_interval;
                }

                // Late side: cap at the observed day length, widen if the
                // cap collapses onto avg.
                let mut max = observed.min(p.max_beep_interval);
                if max <= avg {
                    max = avg + p.min_size_beep_interval;
                }

                BeepWindow { min, avg, max }
            }
        }
    }

    /// Produce the next wait time in seconds.
    ///
    /// Pure over its inputs apart from the RNG draw; the caller hands the
    /// result to the OS alarm facility.
    pub fn compute_next_beep_delay(&mut self, history: &DayHistory) -> i64 {
        let regime = self.regime(history);
        let window = self.plan_window(history);
        let delay = self.generator.next_wait(
            self.profile.strategy,
            window,
            self.profile.min_uptime_duration,
        );
        log::debug!(
            "planned beep delay {delay}s ({regime:?} regime, window {}..{}..{})",
            window.min,
            window.avg,
            window.max
        );
        delay
    }
}
