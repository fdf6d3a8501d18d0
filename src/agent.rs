//! Target resolver: the fixed table of consumer agents.
//!
//! Each agent is a named directory convention describing where installed
//! skills land. Adding support for a new tool is a row in [`AGENTS`], not a
//! code change elsewhere.

use std::path::{Path, PathBuf};

use crate::error::{Result, SkiError};

/// Subdirectory used by [`LayoutKind::Vendored`] agents so installed skills
/// never collide with unrelated content sharing the same root (e.g. the
/// `.github/` tree used by both vscode and copilot).
pub const VENDOR_DIR: &str = "skills-library";

pub const DEFAULT_AGENT: &str = "project";

/// Where an agent's install root anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentRoot {
    /// Relative to the user's home directory.
    Home(&'static [&'static str]),
    /// Relative to the current working directory.
    Project(&'static [&'static str]),
}

/// How skills are placed under the install root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutKind {
    /// `<root>/<skill-name>`
    Flat,
    /// `<root>/skills-library/<skill-name>`
    Vendored,
}

impl LayoutKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::Vendored => "vendored",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Agent {
    pub name: &'static str,
    pub root: AgentRoot,
    pub layout: LayoutKind,
}

/// The compiled-in agent table. Order here is display order.
pub const AGENTS: &[Agent] = &[
    Agent {
        name: "claude",
        root: AgentRoot::Home(&[".claude", "skills"]),
        layout: LayoutKind::Flat,
    },
    Agent {
        name: "cursor",
        root: AgentRoot::Project(&[".cursor", "skills"]),
        layout: LayoutKind::Flat,
    },
    Agent {
        name: "vscode",
        root: AgentRoot::Project(&[".github", "skills"]),
        layout: LayoutKind::Vendored,
    },
    Agent {
        name: "copilot",
        root: AgentRoot::Project(&[".github", "skills"]),
        layout: LayoutKind::Vendored,
    },
    Agent {
        name: "codex",
        root: AgentRoot::Home(&[".codex", "skills"]),
        layout: LayoutKind::Flat,
    },
    Agent {
        name: "goose",
        root: AgentRoot::Home(&[".config", "goose", "skills"]),
        layout: LayoutKind::Flat,
    },
    Agent {
        name: "project",
        root: AgentRoot::Project(&[".skills"]),
        layout: LayoutKind::Flat,
    },
];

impl Agent {
    /// Look up an agent by name in the fixed table.
    pub fn resolve(name: &str) -> Result<&'static Agent> {
        AGENTS
            .iter()
            .find(|a| a.name == name)
            .ok_or_else(|| SkiError::UnknownAgent {
                name: name.to_string(),
                known: Agent::names().join(", "),
            })
    }

    pub fn names() -> Vec<&'static str> {
        AGENTS.iter().map(|a| a.name).collect()
    }

    /// Resolve the install root against the current environment. The
    /// substitution happens once per call and is deterministic for a given
    /// environment snapshot (home dir, cwd).
    pub fn install_root(&self) -> Result<PathBuf> {
        let (base, parts) = match self.root {
            AgentRoot::Home(parts) => {
                let home = dirs::home_dir()
                    .ok_or_else(|| SkiError::Config("home directory not found".to_string()))?;
                (home, parts)
            }
            AgentRoot::Project(parts) => (PathBuf::new(), parts),
        };
        Ok(parts.iter().fold(base, |p, part| p.join(part)))
    }

    /// Path of an installed skill under a resolved root, per this agent's
    /// layout rule.
    pub fn skill_dir(&self, root: &Path, skill_name: &str) -> PathBuf {
        match self.layout {
            LayoutKind::Flat => root.join(skill_name),
            LayoutKind::Vendored => root.join(VENDOR_DIR).join(skill_name),
        }
    }

    /// Human-readable root for display (`~/...` for home-anchored agents).
    pub fn root_display(&self) -> String {
        let parts = match self.root {
            AgentRoot::Home(parts) => {
                return format!("~/{}", parts.join("/"));
            }
            AgentRoot::Project(parts) => parts,
        };
        format!("./{}", parts.join("/"))
    }
}
