//! Plan commands.

use crate::app::App;
use crate::error::CliResult;
use clap::Subcommand;
use focus_core::Plan;

/// Plan subcommands.
#[derive(Subcommand)]
pub enum PlanCommand {
    /// Show the current plan
    Show,

    /// Switch plans (basic, pro)
    Set {
        /// New plan
        plan: Plan,

        /// Account email
        #[arg(short, long)]
        email: Option<String>,
    },
}

/// Runs a plan command.
pub fn run(app: &App, command: PlanCommand) -> CliResult<()> {
    match command {
        PlanCommand::Show => {
            let state = app.plan().state();
            println!("Plan:    {}", state.plan);
            if !state.user_email.is_empty() {
                println!("Email:   {}", state.user_email);
            }
            println!("Updated: {}", focus_core::format_timestamp(&state.last_updated));
            println!("Sync:    {}", app.sync().status());
        }
        PlanCommand::Set { plan, email } => {
            // Watch the plan first so an upgrade pulls cloud data.
            app.bootstrap();
            if let Some(email) = email {
                app.plan().set_email(email)?;
            }
            app.plan().set_plan(plan)?;
            println!("Plan set to {plan}");
            println!("Sync:    {}", app.sync().status());
        }
    }
    Ok(())
}
