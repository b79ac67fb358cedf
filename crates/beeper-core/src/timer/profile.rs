//! Study timer profiles.
//!
//! A profile is the named set of tunables governing interval bounds and
//! the hysteresis thresholds of the adaptive controller. Profiles are
//! immutable during a study and looked up by identifier; exactly one is
//! active at a time. Built-in presets cover common study designs.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

use super::generator::Strategy;

/// Unique identifier for a timer profile.
pub type ProfileId = String;

/// Named set of scheduler tunables. All interval fields are whole seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerProfile {
    /// Unique identifier (e.g. "standard", "pilot", "dense").
    pub id: ProfileId,
    /// Human-readable display name.
    pub name: String,
    /// Brief description of the intended study design.
    #[serde(default)]
    pub description: String,
    /// Probability shape used when drawing wait times.
    pub strategy: Strategy,
    /// Sessions shorter than this are discarded; also the lower clamp on
    /// every generated wait time.
    pub min_uptime_duration: i64,
    /// Target mean interval between delivered beeps, in active seconds.
    pub avg_beep_interval: i64,
    /// Upper bound on any generated interval.
    pub max_beep_interval: i64,
    /// Lower bound on any generated interval.
    pub min_beep_interval: i64,
    /// Narrowest half-window the controller may degrade to when history
    /// forces the bounds together.
    pub min_size_beep_interval: i64,
    /// Accumulated active seconds today above which the controller leaves
    /// the approximation regime.
    pub uptime_count_move_to_average: i64,
    /// Length of the trailing cancelled-beep run that forces the
    /// history-driven regime early.
    pub num_cancelled_beeps_move_to_average: u32,
}

impl TimerProfile {
    /// Check the profile invariants the controller and generator rely on.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.min_uptime_duration <= 0 {
            return Err(ValidationError::InvalidValue {
                field: "min_uptime_duration".into(),
                message: "must be positive".into(),
            });
        }
        if self.min_size_beep_interval <= 0 {
            return Err(ValidationError::InvalidValue {
                field: "min_size_beep_interval".into(),
                message: "must be positive".into(),
            });
        }
        if !(self.min_beep_interval < self.avg_beep_interval
            && self.avg_beep_interval < self.max_beep_interval)
        {
            return Err(ValidationError::InvalidValue {
                field: "beep intervals".into(),
                message: format!(
                    "expected min < avg < max, got {} / {} / {}",
                    self.min_beep_interval, self.avg_beep_interval, self.max_beep_interval
                ),
            });
        }
        if self.uptime_count_move_to_average < 0 {
            return Err(ValidationError::InvalidValue {
                field: "uptime_count_move_to_average".into(),
                message: "must not be negative".into(),
            });
        }
        Ok(())
    }

    /// Look up a built-in profile by id.
    pub fn builtin(id: &str) -> Option<TimerProfile> {
        builtin_profiles().into_iter().find(|p| p.id == id)
    }
}

/// Returns all built-in profiles.
pub fn builtin_profiles() -> Vec<TimerProfile> {
    vec![standard_profile(), pilot_profile(), dense_profile()]
}

/// Default study design: about one beep every 30 active minutes.
fn standard_profile() -> TimerProfile {
    TimerProfile {
        id: "standard".into(),
        name: "Standard".into(),
        description: "Roughly one beep per half hour of active time".into(),
        strategy: Strategy::Average,
        min_uptime_duration: 60,
        avg_beep_interval: 1800,
        max_beep_interval: 3600,
        min_beep_interval: 600,
        min_size_beep_interval: 300,
        uptime_count_move_to_average: 3600,
        num_cancelled_beeps_move_to_average: 3,
    }
}

/// Sparse schedule for pilot runs: fewer interruptions, plain uniform
/// draws so pilots see the full spread of the window.
fn pilot_profile() -> TimerProfile {
    TimerProfile {
        id: "pilot".into(),
        name: "Pilot".into(),
        description: "Sparse beeps for piloting a questionnaire".into(),
        strategy: Strategy::Interval,
        min_uptime_duration: 120,
        avg_beep_interval: 3600,
        max_beep_interval: 7200,
        min_beep_interval: 1800,
        min_size_beep_interval: 600,
        uptime_count_move_to_average: 7200,
        num_cancelled_beeps_move_to_average: 2,
    }
}

/// High-frequency sampling for short sessions.
fn dense_profile() -> TimerProfile {
    TimerProfile {
        id: "dense".into(),
        name: "Dense".into(),
        description: "High-frequency sampling for short observation windows".into(),
        strategy: Strategy::Average,
        min_uptime_duration: 30,
        avg_beep_interval: 900,
        max_beep_interval: 1800,
        min_beep_interval: 300,
        min_size_beep_interval: 120,
        uptime_count_move_to_average: 1800,
        num_cancelled_beeps_move_to_average: 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_valid() {
        for profile in builtin_profiles() {
            profile.validate().unwrap();
        }
    }

    #[test]
    fn builtin_lookup() {
        assert!(TimerProfile::builtin("standard").is_some());
        assert!(TimerProfile::builtin("nonexistent").is_none());
    }

    #[test]
    fn validate_rejects_unordered_intervals() {
        let mut profile = TimerProfile::builtin("standard").unwrap();
        profile.min_beep_interval = profile.max_beep_interval;
        assert!(profile.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_min_uptime() {
        let mut profile = TimerProfile::builtin("standard").unwrap();
        profile.min_uptime_duration = 0;
        assert!(profile.validate().is_err());
    }
}
