//! Install / update / uninstall state transitions.
//!
//! Per `(agent, skill)` pair the states are Absent -> Installed, with
//! Installed further split into current and stale by comparing the recorded
//! source hash against the catalog. Every mutating operation holds the
//! manifest's advisory lock, replaces content with a staged directory swap,
//! and persists the manifest atomically, so an interrupted run leaves either
//! the old state or the new state, never a mix.

use std::path::PathBuf;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::agent::Agent;
use crate::catalog::{Catalog, SkillPackage};
use crate::error::{Result, SkiError};
use crate::manifest::{InstalledSkill, Manifest, ManifestStore};
use crate::utils::{remove_dir_if_exists, replace_dir};

#[derive(Debug, Clone, Copy, Default)]
pub struct InstallOptions {
    pub force: bool,
    pub auto_update: bool,
}

#[derive(Debug, Serialize)]
pub struct InstallOutcome {
    pub skill: String,
    pub group: String,
    pub target: PathBuf,
    pub auto_update: bool,
    /// Skill that was uninstalled to resolve a group conflict, if any.
    pub replaced: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateDisposition {
    /// Source hash differed; content was refreshed.
    Updated,
    /// Already in sync with the catalog.
    Current,
    /// Not flagged auto-update and not explicitly named.
    SkippedManual,
    /// Package no longer present in the catalog; entry left in place.
    MissingFromCatalog,
}

#[derive(Debug, Serialize)]
pub struct UpdateOutcome {
    pub skill: String,
    pub disposition: UpdateDisposition,
}

pub struct Installer<'a> {
    catalog: &'a Catalog,
    agent: &'static Agent,
    root: PathBuf,
    store: ManifestStore,
}

impl<'a> Installer<'a> {
    pub fn new(catalog: &'a Catalog, agent: &'static Agent) -> Result<Self> {
        let root = agent.install_root()?;
        Ok(Self::with_root(catalog, agent, root))
    }

    /// Installer over an explicit root instead of the agent's resolved one.
    pub fn with_root(catalog: &'a Catalog, agent: &'static Agent, root: PathBuf) -> Self {
        let store = ManifestStore::new(root.clone());
        Self {
            catalog,
            agent,
            root,
            store,
        }
    }

    pub fn agent(&self) -> &'static Agent {
        self.agent
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    pub fn store(&self) -> &ManifestStore {
        &self.store
    }

    /// Install a skill, enforcing the one-per-group policy. Idempotent:
    /// re-installing refreshes content and timestamps but changes nothing
    /// else.
    pub fn install(&self, skill_name: &str, opts: InstallOptions) -> Result<InstallOutcome> {
        let pkg = self.lookup(skill_name)?;

        let _lock = self.store.lock();
        let mut manifest = self.store.load()?;

        let replaced = match manifest.group_conflict(&pkg.group, &pkg.name) {
            Some(conflict) if !opts.force => {
                return Err(SkiError::GroupConflict {
                    group: pkg.group.clone(),
                    existing: conflict.skill_name.clone(),
                    agent: self.agent.name.to_string(),
                });
            }
            Some(conflict) => {
                // Forced: retire the occupant as its own transition before
                // the new install begins.
                let name = conflict.skill_name.clone();
                info!(skill = %name, group = %pkg.group, "uninstalling group occupant (--force)");
                self.remove_entry(&mut manifest, &name)?;
                self.store.save(&manifest)?;
                Some(name)
            }
            None => None,
        };

        let target = self.agent.skill_dir(&self.root, &pkg.name);
        replace_dir(&pkg.source_path, &target)?;

        let now = Utc::now();
        let installed_at = manifest
            .find(&pkg.name)
            .map(|existing| existing.installed_at)
            .unwrap_or(now);
        manifest.upsert(InstalledSkill {
            skill_name: pkg.name.clone(),
            group: pkg.group.clone(),
            agent: self.agent.name.to_string(),
            installed_at,
            updated_at: now,
            auto_update: opts.auto_update,
            source_hash: pkg.content_hash.clone(),
        });
        self.store.save(&manifest)?;

        info!(skill = %pkg.name, group = %pkg.group, target = %target.display(), "installed");
        Ok(InstallOutcome {
            skill: pkg.name.clone(),
            group: pkg.group.clone(),
            target,
            auto_update: opts.auto_update,
            replaced,
        })
    }

    /// Update one named skill, or all auto-update-flagged skills when `skill`
    /// is `None`. Explicit naming updates regardless of the auto-update flag;
    /// bulk updates never touch manually-managed entries.
    pub fn update(&self, skill: Option<&str>) -> Result<Vec<UpdateOutcome>> {
        let _lock = self.store.lock();
        let mut manifest = self.store.load()?;

        if let Some(name) = skill {
            if manifest.find(name).is_none() {
                return Err(SkiError::NotFound(format!(
                    "skill '{name}' is not installed for agent '{}'",
                    self.agent.name
                )));
            }
        }

        let names: Vec<String> = manifest
            .installed
            .iter()
            .map(|e| e.skill_name.clone())
            .collect();
        let mut outcomes = Vec::new();
        let mut dirty = false;

        for name in names {
            if skill.is_some_and(|wanted| wanted != name) {
                continue;
            }
            let disposition = self.update_entry(&mut manifest, &name, skill.is_some(), &mut dirty)?;
            outcomes.push(UpdateOutcome {
                skill: name,
                disposition,
            });
        }

        if dirty {
            self.store.save(&manifest)?;
        }
        Ok(outcomes)
    }

    fn update_entry(
        &self,
        manifest: &mut Manifest,
        name: &str,
        explicit: bool,
        dirty: &mut bool,
    ) -> Result<UpdateDisposition> {
        let (auto_update, source_hash, group) = match manifest.find(name) {
            Some(entry) => (
                entry.auto_update,
                entry.source_hash.clone(),
                entry.group.clone(),
            ),
            None => {
                return Err(SkiError::NotFound(format!(
                    "skill '{name}' is not installed"
                )));
            }
        };

        if !explicit && !auto_update {
            debug!(skill = %name, "skipping manually-managed skill in bulk update");
            return Ok(UpdateDisposition::SkippedManual);
        }

        let Some(pkg) = self.catalog.find(name) else {
            // The entry stays in place; status will keep reporting it.
            warn!(skill = %name, "package missing from catalog; leaving entry flagged");
            return Ok(UpdateDisposition::MissingFromCatalog);
        };

        // A package moved between groups keeps its new group on record even
        // when the content itself is unchanged.
        if pkg.group != group {
            let new_group = pkg.group.clone();
            if let Some(entry) = manifest.find_mut(name) {
                entry.group = new_group;
            }
            *dirty = true;
        }

        if pkg.content_hash == source_hash {
            return Ok(UpdateDisposition::Current);
        }

        let target = self.agent.skill_dir(&self.root, name);
        replace_dir(&pkg.source_path, &target)?;

        let hash = pkg.content_hash.clone();
        if let Some(entry) = manifest.find_mut(name) {
            entry.updated_at = Utc::now();
            entry.source_hash = hash;
        }
        *dirty = true;
        info!(skill = %name, "updated");
        Ok(UpdateDisposition::Updated)
    }

    /// Remove installed content and the manifest entry as one logical
    /// operation. Content already deleted by hand is not an error - the
    /// entry is still removed.
    pub fn uninstall(&self, skill_name: &str) -> Result<PathBuf> {
        let _lock = self.store.lock();
        let mut manifest = self.store.load()?;

        if manifest.find(skill_name).is_none() {
            return Err(SkiError::NotFound(format!(
                "skill '{skill_name}' is not installed for agent '{}'",
                self.agent.name
            )));
        }

        let target = self.agent.skill_dir(&self.root, skill_name);
        if !remove_dir_if_exists(&target)? {
            debug!(skill = %skill_name, "content directory already absent; removing entry anyway");
        }

        manifest.remove(skill_name);
        self.store.save(&manifest)?;

        info!(skill = %skill_name, target = %target.display(), "uninstalled");
        Ok(target)
    }

    fn lookup(&self, skill_name: &str) -> Result<&'a SkillPackage> {
        self.catalog.find(skill_name).ok_or_else(|| {
            let suggestions = self.catalog.suggestions(skill_name);
            let mut msg = format!("skill '{skill_name}' not found in the library");
            if !suggestions.is_empty() {
                msg.push_str(&format!("; did you mean: {}?", suggestions.join(", ")));
            }
            SkiError::NotFound(msg)
        })
    }

    fn remove_entry(&self, manifest: &mut Manifest, skill_name: &str) -> Result<()> {
        let target = self.agent.skill_dir(&self.root, skill_name);
        remove_dir_if_exists(&target)?;
        manifest.remove(skill_name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn write_skill(root: &Path, group: &str, name: &str, body: &str) {
        let dir = root.join(group).join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("SKILL.md"), body).unwrap();
    }

    struct Fixture {
        _tmp: tempfile::TempDir,
        library: PathBuf,
        root: PathBuf,
    }

    fn fixture() -> Fixture {
        let tmp = tempfile::tempdir().unwrap();
        let library = tmp.path().join("library");
        let root = tmp.path().join("target");
        write_skill(&library, "x", "alpha", "---\ndescription: first\n---\nalpha body\n");
        write_skill(&library, "x", "beta", "---\ndescription: second\n---\nbeta body\n");
        write_skill(&library, "y", "gamma", "---\ndescription: third\n---\ngamma body\n");
        Fixture {
            _tmp: tmp,
            library,
            root,
        }
    }

    fn installer<'a>(catalog: &'a Catalog, root: &Path) -> Installer<'a> {
        let agent = Agent::resolve("project").unwrap();
        Installer::with_root(catalog, agent, root.to_path_buf())
    }

    #[test]
    fn test_install_records_entry_and_content() {
        let fx = fixture();
        let catalog = Catalog::scan(&fx.library).unwrap();
        let ins = installer(&catalog, &fx.root);

        let outcome = ins.install("alpha", InstallOptions::default()).unwrap();
        assert_eq!(outcome.group, "x");
        assert!(outcome.replaced.is_none());
        assert!(fx.root.join("alpha/SKILL.md").exists());

        let manifest = ins.store().load().unwrap();
        assert_eq!(manifest.installed.len(), 1);
        let entry = manifest.find("alpha").unwrap();
        assert_eq!(entry.group, "x");
        assert_eq!(entry.agent, "project");
        assert_eq!(entry.source_hash, catalog.find("alpha").unwrap().content_hash);
    }

    #[test]
    fn test_install_is_idempotent() {
        let fx = fixture();
        let catalog = Catalog::scan(&fx.library).unwrap();
        let ins = installer(&catalog, &fx.root);

        ins.install("alpha", InstallOptions::default()).unwrap();
        let first = ins.store().load().unwrap();
        ins.install("alpha", InstallOptions::default()).unwrap();
        let second = ins.store().load().unwrap();

        assert_eq!(second.installed.len(), 1);
        let (a, b) = (first.find("alpha").unwrap(), second.find("alpha").unwrap());
        assert_eq!(a.source_hash, b.source_hash);
        assert_eq!(a.installed_at, b.installed_at, "installed_at survives re-install");
        assert_eq!(
            std::fs::read_to_string(fx.root.join("alpha/SKILL.md")).unwrap(),
            "---\ndescription: first\n---\nalpha body\n"
        );
    }

    #[test]
    fn test_group_policy_without_force() {
        let fx = fixture();
        let catalog = Catalog::scan(&fx.library).unwrap();
        let ins = installer(&catalog, &fx.root);

        ins.install("alpha", InstallOptions::default()).unwrap();
        let err = ins.install("beta", InstallOptions::default()).unwrap_err();
        assert_eq!(err.code(), "group_conflict");

        // Manifest untouched by the failed install.
        let manifest = ins.store().load().unwrap();
        assert_eq!(manifest.installed.len(), 1);
        assert!(manifest.find("alpha").is_some());
    }

    #[test]
    fn test_group_policy_with_force_replaces_occupant() {
        let fx = fixture();
        let catalog = Catalog::scan(&fx.library).unwrap();
        let ins = installer(&catalog, &fx.root);

        ins.install("alpha", InstallOptions::default()).unwrap();
        let outcome = ins
            .install(
                "beta",
                InstallOptions {
                    force: true,
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(outcome.replaced.as_deref(), Some("alpha"));

        let manifest = ins.store().load().unwrap();
        assert!(manifest.find("alpha").is_none());
        assert!(manifest.find("beta").is_some());
        assert!(!fx.root.join("alpha").exists());
        assert!(fx.root.join("beta/SKILL.md").exists());
    }

    #[test]
    fn test_different_groups_coexist() {
        let fx = fixture();
        let catalog = Catalog::scan(&fx.library).unwrap();
        let ins = installer(&catalog, &fx.root);

        ins.install("alpha", InstallOptions::default()).unwrap();
        ins.install("gamma", InstallOptions::default()).unwrap();
        assert_eq!(ins.store().load().unwrap().installed.len(), 2);
    }

    #[test]
    fn test_update_refreshes_stale_content() {
        let fx = fixture();
        let catalog = Catalog::scan(&fx.library).unwrap();
        let ins = installer(&catalog, &fx.root);
        ins.install("alpha", InstallOptions::default()).unwrap();

        // Library content drifts.
        std::fs::write(
            fx.library.join("x/alpha/SKILL.md"),
            "---\ndescription: first\n---\nrevised body\n",
        )
        .unwrap();
        let rescanned = Catalog::scan(&fx.library).unwrap();
        let ins = installer(&rescanned, &fx.root);

        let outcomes = ins.update(Some("alpha")).unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].disposition, UpdateDisposition::Updated);
        assert!(
            std::fs::read_to_string(fx.root.join("alpha/SKILL.md"))
                .unwrap()
                .contains("revised body")
        );

        let entry_hash = ins.store().load().unwrap().find("alpha").unwrap().source_hash.clone();
        assert_eq!(entry_hash, rescanned.find("alpha").unwrap().content_hash);

        // A second update is a no-op.
        let outcomes = ins.update(Some("alpha")).unwrap();
        assert_eq!(outcomes[0].disposition, UpdateDisposition::Current);
    }

    #[test]
    fn test_bulk_update_skips_manual_entries() {
        let fx = fixture();
        let catalog = Catalog::scan(&fx.library).unwrap();
        let ins = installer(&catalog, &fx.root);
        ins.install("alpha", InstallOptions::default()).unwrap();
        ins.install(
            "gamma",
            InstallOptions {
                auto_update: true,
                ..Default::default()
            },
        )
        .unwrap();

        std::fs::write(fx.library.join("x/alpha/SKILL.md"), "---\n---\nchanged\n").unwrap();
        std::fs::write(fx.library.join("y/gamma/SKILL.md"), "---\n---\nchanged\n").unwrap();
        let rescanned = Catalog::scan(&fx.library).unwrap();
        let ins = installer(&rescanned, &fx.root);

        let outcomes = ins.update(None).unwrap();
        let by_name = |n: &str| outcomes.iter().find(|o| o.skill == n).unwrap().disposition;
        assert_eq!(by_name("alpha"), UpdateDisposition::SkippedManual);
        assert_eq!(by_name("gamma"), UpdateDisposition::Updated);
    }

    #[test]
    fn test_update_with_nothing_installed_is_noop() {
        let fx = fixture();
        let catalog = Catalog::scan(&fx.library).unwrap();
        let ins = installer(&catalog, &fx.root);
        assert!(ins.update(None).unwrap().is_empty());
    }

    #[test]
    fn test_update_named_but_not_installed_errors() {
        let fx = fixture();
        let catalog = Catalog::scan(&fx.library).unwrap();
        let ins = installer(&catalog, &fx.root);
        let err = ins.update(Some("alpha")).unwrap_err();
        assert_eq!(err.code(), "not_found");
    }

    #[test]
    fn test_update_package_gone_from_catalog() {
        let fx = fixture();
        let catalog = Catalog::scan(&fx.library).unwrap();
        let ins = installer(&catalog, &fx.root);
        ins.install("alpha", InstallOptions::default()).unwrap();

        std::fs::remove_dir_all(fx.library.join("x/alpha")).unwrap();
        let rescanned = Catalog::scan(&fx.library).unwrap();
        let ins = installer(&rescanned, &fx.root);

        let outcomes = ins.update(Some("alpha")).unwrap();
        assert_eq!(outcomes[0].disposition, UpdateDisposition::MissingFromCatalog);
        // Entry must survive, flagged rather than silently deleted.
        assert!(ins.store().load().unwrap().find("alpha").is_some());
    }

    #[test]
    fn test_update_tracks_group_move() {
        let fx = fixture();
        let catalog = Catalog::scan(&fx.library).unwrap();
        let ins = installer(&catalog, &fx.root);
        ins.install("alpha", InstallOptions::default()).unwrap();

        // The package moves to another group with identical content.
        std::fs::create_dir_all(fx.library.join("z")).unwrap();
        std::fs::rename(fx.library.join("x/alpha"), fx.library.join("z/alpha")).unwrap();
        let rescanned = Catalog::scan(&fx.library).unwrap();
        let ins = installer(&rescanned, &fx.root);

        let outcomes = ins.update(Some("alpha")).unwrap();
        assert_eq!(outcomes[0].disposition, UpdateDisposition::Current);

        // The new group is persisted, so future conflict checks use it.
        let manifest = ins.store().load().unwrap();
        assert_eq!(manifest.find("alpha").unwrap().group, "z");
    }

    #[test]
    fn test_uninstall_round_trip() {
        let fx = fixture();
        let catalog = Catalog::scan(&fx.library).unwrap();
        let ins = installer(&catalog, &fx.root);

        ins.install("alpha", InstallOptions::default()).unwrap();
        ins.uninstall("alpha").unwrap();

        assert!(!fx.root.join("alpha").exists());
        assert!(ins.store().load().unwrap().installed.is_empty());
        // Manifest file itself is never auto-deleted.
        assert!(ins.store().path().exists());
    }

    #[test]
    fn test_uninstall_self_heals_missing_content() {
        let fx = fixture();
        let catalog = Catalog::scan(&fx.library).unwrap();
        let ins = installer(&catalog, &fx.root);
        ins.install("alpha", InstallOptions::default()).unwrap();

        std::fs::remove_dir_all(fx.root.join("alpha")).unwrap();
        ins.uninstall("alpha").unwrap();
        assert!(ins.store().load().unwrap().find("alpha").is_none());
    }

    #[test]
    fn test_uninstall_not_installed_errors() {
        let fx = fixture();
        let catalog = Catalog::scan(&fx.library).unwrap();
        let ins = installer(&catalog, &fx.root);
        let err = ins.uninstall("alpha").unwrap_err();
        assert_eq!(err.code(), "not_found");
    }

    #[test]
    fn test_lookup_unknown_skill_suggests() {
        let fx = fixture();
        let catalog = Catalog::scan(&fx.library).unwrap();
        let ins = installer(&catalog, &fx.root);

        let err = ins.install("alp", InstallOptions::default()).unwrap_err();
        assert_eq!(err.code(), "not_found");
        assert!(err.to_string().contains("alpha"));
    }
}
