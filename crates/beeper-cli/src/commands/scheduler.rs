use clap::Subcommand;
use serde::Serialize;

use beeper_core::{BeepPlanner, BeepScheduler, Config, Database};
use chrono::{DateTime, Utc};

#[derive(Subcommand)]
pub enum SchedulerAction {
    /// Activate the scheduler and arm the first beep
    On,
    /// Deactivate the scheduler, closing (or discarding) the session
    Off,
    /// Current scheduler state
    Status,
}

#[derive(Serialize)]
struct SchedulerStatus {
    running: bool,
    open_uptime: Option<i64>,
    session_started: Option<DateTime<Utc>>,
    active_beep: Option<i64>,
    next_fire_at: Option<DateTime<Utc>>,
}

pub fn run(action: SchedulerAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let config = Config::load()?;
    let planner = BeepPlanner::new(config.active_profile()?)?;
    let (mut scheduler, resumed) = BeepScheduler::resume(&db, planner)?;
    if let Some(ref event) = resumed {
        log::debug!("adopted previous session: {event:?}");
    }
    let now = Utc::now();

    match action {
        SchedulerAction::On => {
            let mut events = vec![scheduler.start(now)?];
            events.extend(scheduler.schedule_next(now)?);
            println!("{}", serde_json::to_string_pretty(&events)?);
        }
        SchedulerAction::Off => {
            let event = scheduler.stop(now)?;
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        SchedulerAction::Status => {
            let open = scheduler.current_open()?;
            let beep = scheduler.active_beep()?;
            let status = SchedulerStatus {
                running: open.is_some(),
                open_uptime: open.as_ref().map(|u| u.id),
                session_started: open.map(|u| u.start),
                active_beep: beep.as_ref().map(|b| b.id),
                next_fire_at: beep.map(|b| b.timestamp),
            };
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }
    Ok(())
}
