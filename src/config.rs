use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SkiError};

/// Tool configuration, loaded from a global `config.toml` with environment
/// overrides. Everything here has a sensible default; a config file is never
/// required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub library: LibraryConfig,
    #[serde(default)]
    pub install: InstallConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Explicit library root; overrides upward discovery.
    pub root: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallConfig {
    /// Agent used when `--agent` is not given.
    pub default_agent: String,
    /// Enable auto-update for new installs by default.
    pub auto_update: bool,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            default_agent: crate::agent::DEFAULT_AGENT.to_string(),
            auto_update: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    library: Option<LibraryPatch>,
    install: Option<InstallPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct LibraryPatch {
    root: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct InstallPatch {
    default_agent: Option<String>,
    auto_update: Option<bool>,
}

impl Config {
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("SKI_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            if let Some(patch) = Self::load_patch(&path)? {
                config.merge_patch(patch);
            }
        } else if let Some(global) = Self::load_global()? {
            config.merge_patch(global);
        }

        config.apply_env_overrides();
        Ok(config)
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        let Some(dir) = dirs::config_dir() else {
            return Ok(None);
        };
        Self::load_patch(&dir.join("ski/config.toml"))
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| SkiError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| SkiError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(library) = patch.library {
            if let Some(root) = library.root {
                self.library.root = Some(root);
            }
        }
        if let Some(install) = patch.install {
            if let Some(agent) = install.default_agent {
                self.install.default_agent = agent;
            }
            if let Some(auto) = install.auto_update {
                self.install.auto_update = auto;
            }
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(agent) = std::env::var("SKI_DEFAULT_AGENT") {
            if !agent.is_empty() {
                self.install.default_agent = agent;
            }
        }
    }
}
