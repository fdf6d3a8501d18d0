//! CLI command implementations
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments
//! - run() function to execute the command

use clap::Subcommand;

pub mod agents;
pub mod install;
pub mod list;
pub mod status;
pub mod uninstall;
pub mod update;

use crate::app::AppContext;
use crate::error::Result;

pub fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::List(args) => list::run(ctx, args),
        Commands::Install(args) => install::run(ctx, args),
        Commands::Update(args) => update::run(ctx, args),
        Commands::Status(args) => status::run(ctx, args),
        Commands::Uninstall(args) => uninstall::run(ctx, args),
        Commands::Agents(args) => agents::run(ctx, args),
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available skills in the library
    List(list::ListArgs),

    /// Install a skill for an agent
    Install(install::InstallArgs),

    /// Update installed skills from the library
    Update(update::UpdateArgs),

    /// Show installed skills and staleness
    Status(status::StatusArgs),

    /// Remove an installed skill
    Uninstall(uninstall::UninstallArgs),

    /// Show the supported agent table
    Agents(agents::AgentsArgs),
}
