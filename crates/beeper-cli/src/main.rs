use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "beeper-cli", version, about = "Beeper CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scheduler control
    Scheduler {
        #[command(subcommand)]
        action: commands::scheduler::SchedulerAction,
    },
    /// Beep lifecycle
    Beep {
        #[command(subcommand)]
        action: commands::beep::BeepAction,
    },
    /// Daily statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Timer profile management
    Profile {
        #[command(subcommand)]
        action: commands::profile::ProfileAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Scheduler { action } => commands::scheduler::run(action),
        Commands::Beep { action } => commands::beep::run(action),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Profile { action } => commands::profile::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
