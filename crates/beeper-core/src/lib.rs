//! # Beeper Core Library
//!
//! This library provides the core scheduling logic for Beeper, an
//! experience-sampling tool that interrupts the user with a "beep" at
//! pseudo-random, bounded intervals and records the resulting
//! self-reports. The front-ends (CLI, mobile shells) are thin layers over
//! this crate.
//!
//! ## Architecture
//!
//! - **Interval Generator**: draws one randomized wait time from a
//!   bounded window using a selectable probability strategy
//! - **Beep Planner**: hysteresis between a fixed-approximation regime
//!   and a history-driven regime, keeping the delivered beep rate near
//!   the profile's target as observed behavior accumulates
//! - **Lifecycle**: the uptime/beep state machine, including crash
//!   recovery and the expiry/replace timeout
//! - **Stats**: on-demand per-day accounting of accepted/declined
//!   reports and active time, correct across midnight and live sessions
//! - **Storage**: SQLite store behind the [`storage::UptimeStore`]
//!   contract, plus TOML configuration
//!
//! ## Key Components
//!
//! - [`BeepScheduler`]: drives every state transition
//! - [`BeepPlanner`]: computes the next beep delay
//! - [`Database`]: uptime/beep/moment persistence
//! - [`Config`]: study configuration

pub mod alarm;
pub mod error;
pub mod events;
pub mod stats;
pub mod storage;
pub mod timer;

pub use alarm::{AlarmBackend, AlarmSignal, NullAlarm};
pub use error::{ConfigError, CoreError, DatabaseError, StateError, ValidationError};
pub use events::Event;
pub use stats::DaySummary;
pub use storage::{Beep, Config, Database, Moment, SchedulerConfig, Uptime, UptimeStore};
pub use timer::{
    BeepPlanner, BeepScheduler, BeepStatus, BeepWindow, DayHistory, IntervalGenerator, Regime,
    SchedulerState, Strategy, TimerProfile,
};
