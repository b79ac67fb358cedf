use clap::Subcommand;

use beeper_core::{BeepPlanner, BeepScheduler, Config, Database, Event};
use chrono::Utc;

#[derive(Subcommand)]
pub enum BeepAction {
    /// Plan and persist the next beep
    Schedule,
    /// Mark a beep as shown to the user
    Deliver { id: i64 },
    /// Accept a beep and record the self-report
    Accept { id: i64 },
    /// Decline a beep and record the declined report
    Decline { id: i64 },
    /// Expire the in-flight beep if it overshot the tolerance window
    Check,
}

pub fn run(action: BeepAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let config = Config::load()?;
    let planner = BeepPlanner::new(config.active_profile()?)?;
    let (mut scheduler, _resumed) = BeepScheduler::resume(&db, planner)?;
    let now = Utc::now();
    let mut events: Vec<Event> = Vec::new();

    match action {
        BeepAction::Schedule => {
            events.extend(scheduler.schedule_next(now)?);
        }
        BeepAction::Deliver { id } => {
            events.extend(scheduler.deliver(id, now)?);
        }
        BeepAction::Accept { id } => {
            events.extend(scheduler.deliver(id, now)?);
            events.push(scheduler.record_moment(now, true)?);
            if config.scheduler.auto_reschedule {
                events.extend(scheduler.schedule_next(now)?);
            }
        }
        BeepAction::Decline { id } => {
            events.extend(scheduler.decline(id, now)?);
            events.push(scheduler.record_moment(now, false)?);
            if config.scheduler.auto_reschedule {
                events.extend(scheduler.schedule_next(now)?);
            }
        }
        BeepAction::Check => {
            events.extend(scheduler.check_overdue(now, config.scheduler.expiry_tolerance_secs)?);
        }
    }

    println!("{}", serde_json::to_string_pretty(&events)?);
    Ok(())
}
