use clap::Subcommand;
use serde::Serialize;

use beeper_core::{stats, Config, Database, UptimeStore};
use chrono::{NaiveDate, Utc};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's summary
    Today,
    /// Summary for one day (YYYY-MM-DD)
    Day { date: NaiveDate },
    /// Summaries for an inclusive date range
    Range { from: NaiveDate, to: NaiveDate },
    /// Mean active seconds per observed study day
    Average,
}

#[derive(Serialize)]
struct AverageReport {
    average_daily_active_secs: i64,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let config = Config::load()?;
    let floor = config.active_profile()?.min_uptime_duration;
    let now = Utc::now();
    let open_id = db.open_uptime()?.map(|u| u.id);

    match action {
        StatsAction::Today => {
            let summary = stats::day_summary(&db, now.date_naive(), now, open_id, floor)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        StatsAction::Day { date } => {
            let summary = stats::day_summary(&db, date, now, open_id, floor)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        StatsAction::Range { from, to } => {
            let summaries = stats::range_summary(&db, from, to, now, open_id, floor)?;
            println!("{}", serde_json::to_string_pretty(&summaries)?);
        }
        StatsAction::Average => {
            let avg = stats::average_daily_active_secs(&db, now, open_id, floor)?;
            let report = AverageReport {
                average_daily_active_secs: avg,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
