//! ski update - Refresh installed skills from the library

use clap::Args;

use crate::agent::Agent;
use crate::app::AppContext;
use crate::catalog::Catalog;
use crate::cli::output::{OutputFormat, emit_json};
use crate::error::Result;
use crate::installer::{Installer, UpdateDisposition, UpdateOutcome};

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Specific skill to update (all auto-update skills if omitted)
    pub skill_name: Option<String>,

    /// Target agent (defaults to the configured agent)
    #[arg(long, short)]
    pub agent: Option<String>,
}

pub fn run(ctx: &AppContext, args: &UpdateArgs) -> Result<()> {
    let agent = Agent::resolve(ctx.agent_name(args.agent.as_deref()))?;
    let catalog = Catalog::scan(&ctx.library_root)?;
    let installer = Installer::new(&catalog, agent)?;

    let outcomes = installer.update(args.skill_name.as_deref())?;

    match ctx.output_format {
        OutputFormat::Json => {
            let pick = |d: UpdateDisposition| -> Vec<&str> {
                outcomes
                    .iter()
                    .filter(|o| o.disposition == d)
                    .map(|o| o.skill.as_str())
                    .collect()
            };
            emit_json(&serde_json::json!({
                "status": "ok",
                "agent": agent.name,
                "updated": pick(UpdateDisposition::Updated),
                "current": pick(UpdateDisposition::Current),
                "skipped": pick(UpdateDisposition::SkippedManual),
                "missing": pick(UpdateDisposition::MissingFromCatalog),
            }))
        }
        OutputFormat::Human => {
            display_human(&outcomes);
            Ok(())
        }
    }
}

fn display_human(outcomes: &[UpdateOutcome]) {
    if outcomes.is_empty() {
        println!("No skills installed; nothing to update.");
        return;
    }

    let section = |label: &str, d: UpdateDisposition| {
        let names: Vec<&str> = outcomes
            .iter()
            .filter(|o| o.disposition == d)
            .map(|o| o.skill.as_str())
            .collect();
        if !names.is_empty() {
            println!();
            println!("  {label} ({}):", names.len());
            for name in names {
                println!("    - {name}");
            }
        }
    };

    section("Updated", UpdateDisposition::Updated);
    section("Already current", UpdateDisposition::Current);
    section("Skipped (auto-update disabled)", UpdateDisposition::SkippedManual);
    section("Missing from library", UpdateDisposition::MissingFromCatalog);
}
