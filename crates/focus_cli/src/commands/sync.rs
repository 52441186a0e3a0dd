//! Sync commands.

use crate::app::App;
use crate::error::CliResult;
use clap::Subcommand;
use focus_sync::{CollectionOutcome, SkipReason, SyncReport};

/// Sync subcommands.
#[derive(Subcommand)]
pub enum SyncCommand {
    /// Upload local records
    Up,

    /// Download and merge remote records
    Down,

    /// Show the sync configuration and last outcome
    Status,
}

/// Runs a sync command.
pub fn run(app: &App, command: SyncCommand) -> CliResult<()> {
    match command {
        SyncCommand::Up => print_report(&app.sync().sync_up()?),
        SyncCommand::Down => print_report(&app.sync().sync_down()?),
        SyncCommand::Status => {
            match &app.config().remote {
                Some(remote) => {
                    println!("Remote:  {}", remote.url);
                    println!(
                        "Session: {}",
                        if remote.access_token.is_some() { "token set" } else { "signed out" }
                    );
                }
                None => println!("Remote:  not configured"),
            }
            println!("Plan:    {}", app.plan().state().plan);
            match app.last_sync() {
                Some(last) => println!(
                    "Last:    {} at {}",
                    last.status,
                    last.at.format("%Y-%m-%d %H:%M:%S UTC")
                ),
                None => println!("Last:    never"),
            }
        }
    }
    Ok(())
}

fn print_report(report: &SyncReport) {
    if let Some(reason) = report.skipped {
        println!("Skipped: {}", skip_reason(reason));
        return;
    }
    for (collection, outcome) in &report.collections {
        let text = match outcome {
            CollectionOutcome::Empty => "nothing to push".to_string(),
            CollectionOutcome::Pushed(n) => format!("pushed {n}"),
            CollectionOutcome::Pulled(n) => format!("pulled {n}"),
            CollectionOutcome::Failed(err) => format!("FAILED: {err}"),
        };
        println!("  {:<10} {text}", collection.name());
    }
    println!(
        "{} rows, {} failed, {:.2?}",
        report.rows(),
        report.failed_count(),
        report.duration
    );
}

fn skip_reason(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::InFlight => "another sync is running",
        SkipReason::NoRemote => "no remote configured",
        SkipReason::FreePlan => "sync requires the Pro plan",
        SkipReason::NotSignedIn => "not signed in",
        SkipReason::NoLocalState => "no local data loaded",
    }
}

