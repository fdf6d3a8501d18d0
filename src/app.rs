use std::path::{Path, PathBuf};

use tracing::debug;

use crate::cli::OutputFormat;
use crate::config::Config;
use crate::error::{Result, SkiError};

/// Marker file identifying a skill library root during upward discovery.
pub const LIBRARY_MARKER: &str = "skills-library.toml";

pub struct AppContext {
    pub library_root: PathBuf,
    pub config: Config,
    pub output_format: OutputFormat,
    pub verbosity: u8,
}

impl AppContext {
    pub fn from_cli(cli: &crate::cli::Cli) -> Result<Self> {
        let config = Config::load(cli.config.as_deref())?;
        let library_root = find_library_root(cli.library.as_deref(), &config)?;
        debug!(root = %library_root.display(), "library root resolved");

        Ok(Self {
            library_root,
            config,
            output_format: cli.output_format(),
            verbosity: cli.verbose,
        })
    }

    /// Agent name for a command, falling back to the configured default.
    pub fn agent_name<'a>(&'a self, flag: Option<&'a str>) -> &'a str {
        flag.unwrap_or(&self.config.install.default_agent)
    }
}

/// Resolution order: `--library` flag (or `SKI_LIBRARY` via clap env) ->
/// config -> upward search from the working directory for a library marker
/// or a group tree containing a skill descriptor.
fn find_library_root(flag: Option<&Path>, config: &Config) -> Result<PathBuf> {
    if let Some(path) = flag {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = &config.library.root {
        return Ok(path.clone());
    }

    let cwd = std::env::current_dir()?;
    if let Some(found) = find_upwards(&cwd)? {
        return Ok(found);
    }

    Err(SkiError::Config(
        "cannot find a skill library; run inside one, or set --library / SKI_LIBRARY".to_string(),
    ))
}

fn find_upwards(start: &Path) -> Result<Option<PathBuf>> {
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir.join(LIBRARY_MARKER).is_file() || has_group_tree(dir) {
            return Ok(Some(dir.to_path_buf()));
        }
        current = dir.parent();
    }
    Ok(None)
}

/// A directory qualifies as a library root if some `<group>/<skill>/SKILL.md`
/// exists directly under it. Shallow check only; the full scan happens later.
fn has_group_tree(dir: &Path) -> bool {
    let Ok(groups) = std::fs::read_dir(dir) else {
        return false;
    };
    for group in groups.filter_map(|e| e.ok()) {
        let group_path = group.path();
        if !group_path.is_dir() {
            continue;
        }
        let Ok(skills) = std::fs::read_dir(&group_path) else {
            continue;
        };
        for skill in skills.filter_map(|e| e.ok()) {
            if skill.path().join(crate::catalog::DESCRIPTOR_FILE).is_file() {
                return true;
            }
        }
    }
    false
}
