//! ski uninstall - Remove an installed skill

use clap::Args;

use crate::agent::Agent;
use crate::app::AppContext;
use crate::catalog::Catalog;
use crate::cli::output::{OutputFormat, emit_json};
use crate::error::Result;
use crate::installer::Installer;

#[derive(Args, Debug)]
pub struct UninstallArgs {
    /// Name of the skill to remove
    pub skill_name: String,

    /// Target agent (defaults to the configured agent)
    #[arg(long, short)]
    pub agent: Option<String>,
}

pub fn run(ctx: &AppContext, args: &UninstallArgs) -> Result<()> {
    let agent = Agent::resolve(ctx.agent_name(args.agent.as_deref()))?;
    let catalog = Catalog::scan(&ctx.library_root)?;
    let installer = Installer::new(&catalog, agent)?;

    let removed = installer.uninstall(&args.skill_name)?;

    match ctx.output_format {
        OutputFormat::Json => emit_json(&serde_json::json!({
            "status": "ok",
            "uninstalled": args.skill_name,
            "agent": agent.name,
            "removed": removed,
        })),
        OutputFormat::Human => {
            println!();
            println!("  Uninstalled '{}'", args.skill_name);
            println!("  Removed: {}", removed.display());
            Ok(())
        }
    }
}
