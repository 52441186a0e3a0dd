//! Focus CLI
//!
//! Terminal Pomodoro timer with projects, tasks, goals, ideas and optional
//! cloud sync.
//!
//! # Commands
//!
//! - `timer` - Run a work or break interval in the foreground
//! - `project`, `task`, `goal`, `idea` - Manage records
//! - `stats` - Show today's progress and recent history
//! - `plan` - Show or switch the subscription plan
//! - `sync` - Push, pull or inspect cloud sync

mod app;
mod commands;
mod config;
mod error;
mod http;

use app::App;
use clap::{Parser, Subcommand};
use commands::{
    goal::GoalCommand, idea::IdeaCommand, plan::PlanCommand, project::ProjectCommand,
    sync::SyncCommand, task::TaskCommand,
};
use config::AppConfig;
use focus_timer::TimerMode;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Pomodoro timer with projects, goals and cloud sync.
#[derive(Parser)]
#[command(name = "focus")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the data directory
    #[arg(global = true, short, long)]
    data_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a timer interval in the foreground
    Timer {
        /// Interval to run (work, short, long)
        #[arg(short, long, default_value = "work")]
        mode: TimerMode,

        /// Override the interval length in minutes
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=180))]
        minutes: Option<u32>,

        /// Attribute the session to this task
        #[arg(short, long)]
        task: Option<String>,
    },

    /// Manage projects
    #[command(subcommand)]
    Project(ProjectCommand),

    /// Manage tasks
    #[command(subcommand)]
    Task(TaskCommand),

    /// Manage goals
    #[command(subcommand)]
    Goal(GoalCommand),

    /// Manage ideas
    #[command(subcommand)]
    Idea(IdeaCommand),

    /// Show progress statistics
    Stats {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show or change the plan
    #[command(subcommand)]
    Plan(PlanCommand),

    /// Cloud sync
    #[command(subcommand)]
    Sync(SyncCommand),

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Version = cli.command {
        println!("Focus CLI v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = AppConfig::load(cli.data_dir)?;
    let app = App::open(config)?;

    match cli.command {
        Commands::Timer {
            mode,
            minutes,
            task,
        } => commands::timer::run(&app, mode, minutes, task.as_deref())?,
        Commands::Project(cmd) => commands::project::run(&app, cmd)?,
        Commands::Task(cmd) => commands::task::run(&app, cmd)?,
        Commands::Goal(cmd) => commands::goal::run(&app, cmd)?,
        Commands::Idea(cmd) => commands::idea::run(&app, cmd)?,
        Commands::Stats { json } => commands::stats::run(&app, json)?,
        Commands::Plan(cmd) => commands::plan::run(&app, cmd)?,
        Commands::Sync(cmd) => commands::sync::run(&app, cmd)?,
        Commands::Version => {}
    }

    Ok(())
}
