//! Project commands.

use crate::app::App;
use crate::error::CliResult;
use clap::Subcommand;

/// Project subcommands.
#[derive(Subcommand)]
pub enum ProjectCommand {
    /// List projects
    List {
        /// Include archived projects
        #[arg(short, long)]
        all: bool,
    },

    /// Create a project
    Add {
        /// Project name
        name: String,

        /// Daily goal in work sessions
        #[arg(short, long)]
        goal: Option<u32>,
    },

    /// Rename a project
    Rename {
        /// Project id
        id: String,
        /// New name
        name: String,
    },

    /// Set the daily goal of a project
    Goal {
        /// Project id
        id: String,
        /// Daily goal in work sessions
        goal: u32,
    },

    /// Archive a project
    Archive {
        /// Project id
        id: String,
    },

    /// Restore an archived project
    Restore {
        /// Project id
        id: String,
    },

    /// Delete a project
    Delete {
        /// Project id
        id: String,
    },

    /// Make a project the active one
    Use {
        /// Project id
        id: String,
    },
}

/// Runs a project command.
pub fn run(app: &App, command: ProjectCommand) -> CliResult<()> {
    match command {
        ProjectCommand::List { all } => app.read(|ws| {
            let active = ws.active_project_id();
            for p in ws.projects().iter().filter(|p| all || !p.archived) {
                let marker = if p.id == active { "*" } else { " " };
                let goal = p.goal.map(|g| format!("{g}/day")).unwrap_or_default();
                let archived = if p.archived { " (archived)" } else { "" };
                println!("{marker} {:<24} {:<28} {goal}{archived}", p.id, p.name);
            }
        }),
        ProjectCommand::Add { name, goal } => {
            let project = app.mutate(|ws| ws.add_project(&name, goal))?;
            println!("Created project {} ({})", project.name, project.id);
        }
        ProjectCommand::Rename { id, name } => {
            app.mutate(|ws| ws.rename_project(&id, &name))?;
            println!("Renamed {id}");
        }
        ProjectCommand::Goal { id, goal } => {
            app.mutate(|ws| ws.set_project_goal(&id, goal))?;
            println!("Daily goal of {id} set to {goal}");
        }
        ProjectCommand::Archive { id } => {
            app.mutate(|ws| ws.archive_project(&id))?;
            println!("Archived {id}");
        }
        ProjectCommand::Restore { id } => {
            app.mutate(|ws| ws.restore_project(&id))?;
            println!("Restored {id}");
        }
        ProjectCommand::Delete { id } => {
            app.mutate(|ws| ws.delete_project(&id))?;
            println!("Deleted {id}");
        }
        ProjectCommand::Use { id } => {
            app.mutate(|ws| ws.set_active_project(&id))?;
            println!("Active project: {id}");
        }
    }
    Ok(())
}
