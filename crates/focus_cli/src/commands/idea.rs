//! Idea commands.

use crate::app::App;
use crate::error::CliResult;
use clap::Subcommand;
use focus_core::Priority;

/// Idea subcommands.
#[derive(Subcommand)]
pub enum IdeaCommand {
    /// List ideas, newest first
    List,

    /// Capture an idea (Pro)
    Add {
        /// Idea text
        content: String,

        /// Priority (low, medium, high)
        #[arg(short = 'P', long, default_value = "medium")]
        priority: Priority,

        /// Related project
        #[arg(short, long)]
        project: Option<String>,
    },

    /// Delete an idea
    Delete {
        /// Idea id
        id: String,
    },
}

/// Runs an idea command.
pub fn run(app: &App, command: IdeaCommand) -> CliResult<()> {
    match command {
        IdeaCommand::List => app.read(|ws| {
            let mut ideas: Vec<_> = ws.ideas().iter().collect();
            ideas.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            for idea in ideas {
                println!("{:<24} {:<6} {}", idea.id, idea.priority, idea.content);
            }
        }),
        IdeaCommand::Add {
            content,
            priority,
            project,
        } => {
            let idea = app.mutate(|ws| ws.add_idea(&content, priority, project.as_deref()))?;
            println!("Captured idea {}", idea.id);
        }
        IdeaCommand::Delete { id } => {
            app.mutate(|ws| ws.delete_idea(&id))?;
            println!("Deleted {id}");
        }
    }
    Ok(())
}
