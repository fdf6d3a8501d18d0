//! Error taxonomy for ski.
//!
//! Every failure surfaced to the CLI maps to one of these variants; the
//! robot-mode error envelope uses [`SkiError::code`] as its stable `code`
//! field, so variant codes must not change between releases.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SkiError>;

#[derive(Debug, Error)]
pub enum SkiError {
    /// Skill or installed entry lookup failed.
    #[error("{0}")]
    NotFound(String),

    /// Agent name is not in the compiled-in table.
    #[error("unknown agent '{name}' (known agents: {known})")]
    UnknownAgent { name: String, known: String },

    /// One-skill-per-group policy violation.
    #[error(
        "group '{group}' already has '{existing}' installed for agent '{agent}'; \
         use --force to replace it or uninstall '{existing}' first"
    )]
    GroupConflict {
        group: String,
        existing: String,
        agent: String,
    },

    /// Persisted manifest exists but cannot be parsed. The file is left in
    /// place for manual inspection; it is never auto-deleted.
    #[error("manifest {path} is corrupt: {source} (inspect or delete it manually)")]
    CorruptManifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Library root missing, unreadable, or not a directory.
    #[error("catalog: {0}")]
    Catalog(String),

    /// Copy/rename/remove failure with path context.
    #[error("{context}: {source}")]
    Filesystem {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SkiError {
    /// Stable machine-readable code for robot-mode output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::UnknownAgent { .. } => "unknown_agent",
            Self::GroupConflict { .. } => "group_conflict",
            Self::CorruptManifest { .. } => "corrupt_manifest",
            Self::Catalog(_) => "catalog_error",
            Self::Filesystem { .. } | Self::Io(_) => "filesystem_error",
            Self::Config(_) => "config_error",
        }
    }

    pub(crate) fn fs(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Filesystem {
            context: context.into(),
            source,
        }
    }
}
