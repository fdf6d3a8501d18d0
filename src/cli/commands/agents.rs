//! ski agents - Show the supported agent table

use clap::Args;
use serde::Serialize;

use crate::agent::{AGENTS, Agent, DEFAULT_AGENT};
use crate::app::AppContext;
use crate::cli::output::{OutputFormat, emit_json};
use crate::error::Result;

#[derive(Args, Debug)]
pub struct AgentsArgs {}

#[derive(Debug, Serialize)]
struct AgentEntry {
    name: &'static str,
    root: String,
    layout: &'static str,
    default: bool,
}

impl From<&Agent> for AgentEntry {
    fn from(agent: &Agent) -> Self {
        Self {
            name: agent.name,
            root: agent.root_display(),
            layout: agent.layout.as_str(),
            default: agent.name == DEFAULT_AGENT,
        }
    }
}

pub fn run(ctx: &AppContext, _args: &AgentsArgs) -> Result<()> {
    let entries: Vec<AgentEntry> = AGENTS.iter().map(AgentEntry::from).collect();

    match ctx.output_format {
        OutputFormat::Json => emit_json(&serde_json::json!({
            "status": "ok",
            "agents": entries,
        })),
        OutputFormat::Human => {
            println!();
            println!("  {:<10} {:<28} {:<10} {}", "Agent", "Install Root", "Layout", "");
            println!("  {}", "─".repeat(58));
            for entry in &entries {
                println!(
                    "  {:<10} {:<28} {:<10} {}",
                    entry.name,
                    entry.root,
                    entry.layout,
                    if entry.default { "(default)" } else { "" }
                );
            }
            Ok(())
        }
    }
}
