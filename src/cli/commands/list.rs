//! ski list - List available skills in the library

use clap::Args;
use serde::Serialize;
use tracing::debug;

use crate::app::AppContext;
use crate::catalog::{Catalog, SkillPackage};
use crate::cli::output::{OutputFormat, emit_json};
use crate::error::{Result, SkiError};

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Filter by domain group
    #[arg(long, short)]
    pub group: Option<String>,
}

#[derive(Debug, Serialize)]
struct ListEntry {
    name: String,
    group: String,
    description: String,
    tiers: Vec<&'static str>,
}

impl From<&SkillPackage> for ListEntry {
    fn from(pkg: &SkillPackage) -> Self {
        Self {
            name: pkg.name.clone(),
            group: pkg.group.clone(),
            description: pkg.description.clone(),
            tiers: pkg.tiers(),
        }
    }
}

pub fn run(ctx: &AppContext, args: &ListArgs) -> Result<()> {
    let catalog = Catalog::scan(&ctx.library_root)?;

    let packages: Vec<&SkillPackage> = match &args.group {
        Some(group) => {
            if !catalog.groups().contains(&group.as_str()) {
                return Err(SkiError::NotFound(format!(
                    "unknown group '{group}' (available: {})",
                    catalog.groups().join(", ")
                )));
            }
            catalog.packages().iter().filter(|p| &p.group == group).collect()
        }
        None => catalog.packages().iter().collect(),
    };

    debug!(count = packages.len(), filter = ?args.group, "listing skills");

    match ctx.output_format {
        OutputFormat::Json => {
            let entries: Vec<ListEntry> = packages.iter().map(|p| ListEntry::from(*p)).collect();
            emit_json(&serde_json::json!({
                "status": "ok",
                "count": entries.len(),
                "skills": entries,
            }))
        }
        OutputFormat::Human => {
            display_human(&packages);
            Ok(())
        }
    }
}

fn display_human(packages: &[&SkillPackage]) {
    if packages.is_empty() {
        println!("No skills found in the library");
        return;
    }

    let mut group_count = 0usize;
    let mut current_group = "";
    for pkg in packages {
        if pkg.group != current_group {
            current_group = &pkg.group;
            group_count += 1;
            println!();
            println!("  {current_group}");
            println!("  {}", "─".repeat(50));
        }
        println!("    {:<35} [{}]", pkg.name, pkg.tiers().join(", "));
        if !pkg.description.is_empty() {
            println!("      {}", pkg.description);
        }
    }

    println!();
    println!("  Total: {} skills across {} groups", packages.len(), group_count);
    println!();
    println!("  Install:  ski install <skill-name>");
    println!("  Details:  ski list --group <group-name>");
}
