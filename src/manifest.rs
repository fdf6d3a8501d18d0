//! Manifest store: the single durable record of install state.
//!
//! One JSON document per agent, owned exclusively by [`ManifestStore`]. All
//! writes go through `save`, which is atomic (temp file in the same
//! directory, then rename), so a crash mid-write leaves the previous
//! manifest intact. A corrupt manifest is surfaced as an error and never
//! auto-deleted.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, SkiError};

pub const MANIFEST_FILE: &str = ".ski-manifest.json";
const LOCK_FILE: &str = ".ski-manifest.lock";

const MANIFEST_VERSION: u32 = 1;

/// One installed skill, as recorded on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstalledSkill {
    pub skill_name: String,
    pub group: String,
    /// Agent that most recently installed or refreshed this entry. Agents
    /// sharing an install root share entries, so this is last-writer-wins.
    pub agent: String,
    pub installed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub auto_update: bool,
    pub source_hash: String,
}

/// The ordered collection of installed skills for one agent.
///
/// Unknown fields are ignored on read so manifests written by newer versions
/// of the installer still load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub installed: Vec<InstalledSkill>,
}

fn default_version() -> u32 {
    MANIFEST_VERSION
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            version: MANIFEST_VERSION,
            installed: Vec::new(),
        }
    }
}

impl Manifest {
    pub fn find(&self, skill_name: &str) -> Option<&InstalledSkill> {
        self.installed.iter().find(|s| s.skill_name == skill_name)
    }

    pub fn find_mut(&mut self, skill_name: &str) -> Option<&mut InstalledSkill> {
        self.installed.iter_mut().find(|s| s.skill_name == skill_name)
    }

    /// The entry occupying `group` with a different skill name, if any.
    pub fn group_conflict(&self, group: &str, skill_name: &str) -> Option<&InstalledSkill> {
        self.installed
            .iter()
            .find(|s| s.group == group && s.skill_name != skill_name)
    }

    /// Insert or replace in place, preserving entry order. At most one entry
    /// per skill name.
    pub fn upsert(&mut self, entry: InstalledSkill) {
        match self.find_mut(&entry.skill_name) {
            Some(existing) => *existing = entry,
            None => self.installed.push(entry),
        }
    }

    /// Remove an entry; returns it if present.
    pub fn remove(&mut self, skill_name: &str) -> Option<InstalledSkill> {
        let pos = self.installed.iter().position(|s| s.skill_name == skill_name)?;
        Some(self.installed.remove(pos))
    }
}

/// Advisory lock held around a read-modify-write sequence. Best effort: lock
/// acquisition failure downgrades to a warning, since atomic save/replace
/// already guarantees consistency.
pub struct ManifestLock {
    file: Option<File>,
}

impl Drop for ManifestLock {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = FileExt::unlock(&file);
        }
    }
}

pub struct ManifestStore {
    dir: PathBuf,
}

impl ManifestStore {
    /// Store rooted at an agent's install directory.
    pub fn new(install_root: impl Into<PathBuf>) -> Self {
        Self {
            dir: install_root.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    /// Load the manifest, returning an empty one if no file exists yet.
    pub fn load(&self) -> Result<Manifest> {
        let path = self.path();
        if !path.exists() {
            return Ok(Manifest::default());
        }
        let raw = std::fs::read_to_string(&path)
            .map_err(|err| SkiError::fs(format!("read manifest {}", path.display()), err))?;
        let manifest = serde_json::from_str(&raw)
            .map_err(|source| SkiError::CorruptManifest { path, source })?;
        Ok(manifest)
    }

    /// Atomic save: write to a temp file in the manifest's directory, then
    /// rename over the destination.
    pub fn save(&self, manifest: &Manifest) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|err| SkiError::fs(format!("create {}", self.dir.display()), err))?;

        let path = self.path();
        let mut payload = serde_json::to_string_pretty(manifest)
            .map_err(|err| SkiError::Config(format!("serialize manifest: {err}")))?;
        payload.push('\n');

        let tmp = tempfile::Builder::new()
            .prefix(".ski-manifest.")
            .suffix(".tmp")
            .tempfile_in(&self.dir)
            .map_err(|err| SkiError::fs(format!("create temp file in {}", self.dir.display()), err))?;
        std::fs::write(tmp.path(), payload)
            .map_err(|err| SkiError::fs(format!("write {}", tmp.path().display()), err))?;
        tmp.persist(&path)
            .map_err(|err| SkiError::fs(format!("replace {}", path.display()), err.error))?;

        debug!(path = %path.display(), entries = manifest.installed.len(), "manifest saved");
        Ok(())
    }

    /// Take the advisory lock for the duration of a mutating operation.
    pub fn lock(&self) -> ManifestLock {
        if let Err(err) = std::fs::create_dir_all(&self.dir) {
            warn!(dir = %self.dir.display(), %err, "cannot create manifest dir for lock");
            return ManifestLock { file: None };
        }
        let lock_path = self.dir.join(LOCK_FILE);
        let file = match OpenOptions::new().create(true).write(true).open(&lock_path) {
            Ok(file) => file,
            Err(err) => {
                warn!(path = %lock_path.display(), %err, "cannot open lock file");
                return ManifestLock { file: None };
            }
        };
        if let Err(err) = file.lock_exclusive() {
            warn!(path = %lock_path.display(), %err, "advisory lock unavailable");
            return ManifestLock { file: None };
        }
        ManifestLock { file: Some(file) }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
