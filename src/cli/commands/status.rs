//! ski status - Show installed skills and their staleness

use clap::Args;

use crate::agent::Agent;
use crate::app::AppContext;
use crate::catalog::Catalog;
use crate::cli::output::{OutputFormat, emit_json};
use crate::error::Result;
use crate::manifest::ManifestStore;
use crate::query::status_rows;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Target agent (defaults to the configured agent)
    #[arg(long, short)]
    pub agent: Option<String>,
}

pub fn run(ctx: &AppContext, args: &StatusArgs) -> Result<()> {
    let agent = Agent::resolve(ctx.agent_name(args.agent.as_deref()))?;
    let catalog = Catalog::scan(&ctx.library_root)?;
    let root = agent.install_root()?;
    let manifest = ManifestStore::new(root.clone()).load()?;

    let rows = status_rows(&catalog, &manifest);

    match ctx.output_format {
        OutputFormat::Json => emit_json(&serde_json::json!({
            "status": "ok",
            "agent": agent.name,
            "root": root,
            "available": catalog.packages().len(),
            "count": rows.len(),
            "installed": rows,
        })),
        OutputFormat::Human => {
            if rows.is_empty() {
                println!("No skills installed for agent '{}'.", agent.name);
                return Ok(());
            }

            println!();
            println!("  Installed Skills ({})", rows.len());
            println!("  {}", "─".repeat(72));
            println!(
                "  {:<30} {:<20} {:<12} {}",
                "Skill", "Group", "Auto-Update", "State"
            );
            println!("  {}", "─".repeat(72));
            for row in &rows {
                println!(
                    "  {:<30} {:<20} {:<12} {}",
                    row.skill_name,
                    row.group,
                    if row.auto_update { "yes" } else { "no" },
                    row.state.as_str()
                );
            }
            println!();
            println!("  Target:    {}", root.display());
            println!("  Available: {} skills in the library", catalog.packages().len());
            Ok(())
        }
    }
}
