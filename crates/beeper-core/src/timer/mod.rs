mod controller;
mod generator;
mod lifecycle;
mod profile;

pub use controller::{BeepPlanner, DayHistory, Regime};
pub use generator::{BeepWindow, IntervalGenerator, Strategy};
pub use lifecycle::{BeepScheduler, BeepStatus, SchedulerState};
pub use profile::{builtin_profiles, ProfileId, TimerProfile};
