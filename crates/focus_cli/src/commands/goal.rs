//! Goal commands.

use crate::app::App;
use crate::error::CliResult;
use clap::Subcommand;
use focus_core::{analytics, GoalType};

/// Goal subcommands.
#[derive(Subcommand)]
pub enum GoalCommand {
    /// List goals with their progress
    List,

    /// Create a goal
    Add {
        /// Goal title
        title: String,

        /// Goal type (daily, weekly, long-term)
        #[arg(short = 't', long = "type", default_value = "long-term")]
        goal_type: GoalType,

        /// Target number of work sessions
        #[arg(long)]
        target: Option<u32>,

        /// Project the goal counts sessions of
        #[arg(short, long)]
        project: Option<String>,
    },

    /// Flip the completed flag of a goal
    Toggle {
        /// Goal id
        id: String,
    },

    /// Delete a goal
    Delete {
        /// Goal id
        id: String,
    },
}

/// Runs a goal command.
pub fn run(app: &App, command: GoalCommand) -> CliResult<()> {
    match command {
        GoalCommand::List => app.read(|ws| {
            let now = focus_core::now();
            for goal in ws.goals() {
                let progress = analytics::goal_progress(goal, ws.collections(), now);
                let check = if progress.completed { "[x]" } else { "[ ]" };
                let target = match progress.target {
                    Some(t) => format!("{}/{t} ({}%)", progress.count, progress.percent),
                    None => format!("{} sessions", progress.count),
                };
                println!(
                    "{check} {:<24} {:<10} {:<28} {target}",
                    goal.id, goal.goal_type, goal.title
                );
            }
        }),
        GoalCommand::Add {
            title,
            goal_type,
            target,
            project,
        } => {
            let goal = app.mutate(|ws| ws.add_goal(&title, goal_type, target, project.as_deref()))?;
            println!("Created {} goal {} ({})", goal.goal_type, goal.title, goal.id);
        }
        GoalCommand::Toggle { id } => {
            let completed = app.mutate(|ws| ws.toggle_goal_completed(&id))?;
            println!(
                "{id} marked {}",
                if completed { "completed" } else { "open" }
            );
        }
        GoalCommand::Delete { id } => {
            app.mutate(|ws| ws.delete_goal(&id))?;
            println!("Deleted {id}");
        }
    }
    Ok(())
}
