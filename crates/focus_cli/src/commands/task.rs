//! Task commands.

use crate::app::App;
use crate::error::CliResult;
use clap::Subcommand;

/// Task subcommands.
#[derive(Subcommand)]
pub enum TaskCommand {
    /// List tasks
    List {
        /// Include archived tasks
        #[arg(short, long)]
        all: bool,

        /// Only tasks of this project
        #[arg(short, long)]
        project: Option<String>,
    },

    /// Create a task
    Add {
        /// Task title
        title: String,

        /// Owning project (defaults to the active project)
        #[arg(short, long)]
        project: Option<String>,
    },

    /// Mark a task done
    Done {
        /// Task id
        id: String,

        /// Mark the task not done instead
        #[arg(long)]
        undo: bool,
    },

    /// Archive a task
    Archive {
        /// Task id
        id: String,
    },

    /// Restore an archived task
    Restore {
        /// Task id
        id: String,
    },

    /// Delete a task
    Delete {
        /// Task id
        id: String,
    },
}

/// Runs a task command.
pub fn run(app: &App, command: TaskCommand) -> CliResult<()> {
    match command {
        TaskCommand::List { all, project } => app.read(|ws| {
            let tasks = ws
                .tasks()
                .iter()
                .filter(|t| all || !t.archived)
                .filter(|t| project.is_none() || t.project_id == project);
            for t in tasks {
                let check = if t.done { "[x]" } else { "[ ]" };
                let archived = if t.archived { " (archived)" } else { "" };
                println!(
                    "{check} {:<24} {}{archived}  {}",
                    t.id,
                    t.title,
                    t.project_id.as_deref().unwrap_or("-")
                );
            }
        }),
        TaskCommand::Add { title, project } => {
            let task = app.mutate(|ws| {
                let project = project.unwrap_or_else(|| ws.active_project_id().to_string());
                ws.add_task(&title, Some(&project))
            })?;
            println!("Created task {} ({})", task.title, task.id);
        }
        TaskCommand::Done { id, undo } => {
            app.mutate(|ws| ws.set_task_done(&id, !undo))?;
            println!("{id} marked {}", if undo { "not done" } else { "done" });
        }
        TaskCommand::Archive { id } => {
            app.mutate(|ws| ws.archive_task(&id))?;
            println!("Archived {id}");
        }
        TaskCommand::Restore { id } => {
            app.mutate(|ws| ws.restore_task(&id))?;
            println!("Restored {id}");
        }
        TaskCommand::Delete { id } => {
            app.mutate(|ws| ws.delete_task(&id))?;
            println!("Deleted {id}");
        }
    }
    Ok(())
}
