use clap::Subcommand;

use beeper_core::timer::builtin_profiles;
use beeper_core::TimerProfile;

#[derive(Subcommand)]
pub enum ProfileAction {
    /// List built-in profiles
    List,
    /// Show one profile by id
    Show { id: String },
}

pub fn run(action: ProfileAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ProfileAction::List => {
            println!("{}", serde_json::to_string_pretty(&builtin_profiles())?);
        }
        ProfileAction::Show { id } => {
            let profile = TimerProfile::builtin(&id)
                .ok_or_else(|| format!("unknown profile '{id}'"))?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
    }
    Ok(())
}
