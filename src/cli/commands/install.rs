//! ski install - Install a skill into an agent's directory convention

use clap::Args;

use crate::agent::Agent;
use crate::app::AppContext;
use crate::catalog::Catalog;
use crate::cli::output::{HumanLayout, OutputFormat, emit_json};
use crate::error::Result;
use crate::installer::{InstallOptions, Installer};

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Name of the skill to install
    pub skill_name: String,

    /// Target agent (defaults to the configured agent)
    #[arg(long, short)]
    pub agent: Option<String>,

    /// Enable automatic updates for this skill
    #[arg(long)]
    pub auto_update: bool,

    /// Replace an existing skill occupying the same group
    #[arg(long, short)]
    pub force: bool,
}

pub fn run(ctx: &AppContext, args: &InstallArgs) -> Result<()> {
    let agent = Agent::resolve(ctx.agent_name(args.agent.as_deref()))?;
    let catalog = Catalog::scan(&ctx.library_root)?;
    let installer = Installer::new(&catalog, agent)?;

    let opts = InstallOptions {
        force: args.force,
        auto_update: args.auto_update || ctx.config.install.auto_update,
    };
    let outcome = installer.install(&args.skill_name, opts)?;

    match ctx.output_format {
        OutputFormat::Json => emit_json(&serde_json::json!({
            "status": "ok",
            "skill": outcome.skill,
            "group": outcome.group,
            "agent": agent.name,
            "target": outcome.target,
            "auto_update": outcome.auto_update,
            "replaced": outcome.replaced,
        })),
        OutputFormat::Human => {
            let mut layout = HumanLayout::new();
            layout
                .blank()
                .push_line(format!(
                    "  Installed '{}' from {}",
                    outcome.skill, outcome.group
                ))
                .kv("  Target:", &outcome.target.display().to_string())
                .kv(
                    "  Auto-update:",
                    if outcome.auto_update { "enabled" } else { "disabled" },
                );
            if let Some(replaced) = &outcome.replaced {
                layout.kv("  Replaced:", replaced);
            }
            layout
                .blank()
                .push_line("  One skill per group policy active; use --force to override.");
            println!("{}", layout.build());
            Ok(())
        }
    }
}
