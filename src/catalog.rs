//! Catalog scanner: walks the skill library tree and builds the in-memory
//! list of installable packages.
//!
//! The library layout is one subdirectory per group, each containing one
//! subdirectory per skill package. A package is identified by the presence of
//! a `SKILL.md` descriptor; directories without one are skipped with a
//! warning, never an error - partial catalogs are expected while content is
//! being authored.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Result, SkiError};

pub const DESCRIPTOR_FILE: &str = "SKILL.md";

/// Directory names that never contain skill packages.
const SKIP_DIRS: &[&str] = &["assets", "node_modules", ".git", "scripts", "references"];

/// Entries excluded from content hashing and from installed copies.
const IGNORED_FILES: &[&str] = &["__pycache__", ".DS_Store"];

const DESCRIPTION_MAX: usize = 120;

/// One installable bundle, derived fresh from the library tree on each scan.
#[derive(Debug, Clone)]
pub struct SkillPackage {
    pub name: String,
    pub group: String,
    pub source_path: PathBuf,
    pub description: String,
    pub content_hash: String,
    pub has_scripts: bool,
    pub has_references: bool,
    pub has_assets: bool,
}

impl SkillPackage {
    /// Tier tags shown by `list`: which optional content the package ships.
    pub fn tiers(&self) -> Vec<&'static str> {
        let mut tiers = Vec::new();
        if self.has_scripts {
            tiers.push("scripts");
        }
        if self.has_references {
            tiers.push("refs");
        }
        if self.has_assets {
            tiers.push("assets");
        }
        if tiers.is_empty() {
            tiers.push("docs");
        }
        tiers
    }
}

#[derive(Debug, Default)]
pub struct Catalog {
    packages: Vec<SkillPackage>,
}

impl Catalog {
    /// Scan a library root. Read-only; stable-sorted by `(group, name)`.
    pub fn scan(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(SkiError::Catalog(format!(
                "library root {} does not exist or is not a directory",
                root.display()
            )));
        }

        let mut packages = Vec::new();
        for group_entry in read_sorted_dirs(root)? {
            let group = group_entry
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();
            if group.is_empty() || group.starts_with('.') || SKIP_DIRS.contains(&group.as_str()) {
                continue;
            }

            for skill_entry in read_sorted_dirs(&group_entry)? {
                let name = skill_entry
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or_default()
                    .to_string();
                if name.is_empty() || name.starts_with('.') || SKIP_DIRS.contains(&name.as_str()) {
                    continue;
                }

                let descriptor = skill_entry.join(DESCRIPTOR_FILE);
                if !descriptor.is_file() {
                    warn!(
                        group = %group,
                        skill = %name,
                        "skipping directory without {DESCRIPTOR_FILE}"
                    );
                    continue;
                }

                let description = std::fs::read_to_string(&descriptor)
                    .map(|text| frontmatter_description(&text))
                    .unwrap_or_default();

                packages.push(SkillPackage {
                    name,
                    group: group.clone(),
                    content_hash: hash_dir(&skill_entry)?,
                    has_scripts: dir_has_entries(&skill_entry.join("scripts")),
                    has_references: dir_has_entries(&skill_entry.join("references")),
                    has_assets: dir_has_entries(&skill_entry.join("assets")),
                    description,
                    source_path: skill_entry,
                });
            }
        }

        packages.sort_by(|a, b| (a.group.as_str(), a.name.as_str()).cmp(&(b.group.as_str(), b.name.as_str())));
        debug!(count = packages.len(), root = %root.display(), "catalog scanned");
        Ok(Self { packages })
    }

    pub fn packages(&self) -> &[SkillPackage] {
        &self.packages
    }

    /// First package matching `name`, in `(group, name)` order. Names are
    /// unique within a group.
    pub fn find(&self, name: &str) -> Option<&SkillPackage> {
        self.packages.iter().find(|p| p.name == name)
    }

    pub fn groups(&self) -> Vec<&str> {
        let mut groups: Vec<&str> = self.packages.iter().map(|p| p.group.as_str()).collect();
        groups.dedup();
        groups
    }

    /// Case-insensitive substring suggestions for an unknown skill name.
    pub fn suggestions(&self, name: &str) -> Vec<&str> {
        let needle = name.to_lowercase();
        self.packages
            .iter()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .map(|p| p.name.as_str())
            .take(5)
            .collect()
    }
}

fn read_sorted_dirs(path: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    let entries = std::fs::read_dir(path)
        .map_err(|err| SkiError::Catalog(format!("read {}: {err}", path.display())))?;
    for entry in entries {
        let entry = entry.map_err(|err| SkiError::Catalog(format!("read {}: {err}", path.display())))?;
        if entry.path().is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Extract the `description:` line from YAML frontmatter, if present.
/// Truncated for display; not a full YAML parse by design - descriptors are
/// treated as opaque content apart from this one display field.
fn frontmatter_description(text: &str) -> String {
    let Some(rest) = text.strip_prefix("---") else {
        return String::new();
    };
    let Some(end) = rest.find("---") else {
        return String::new();
    };
    for line in rest[..end].lines() {
        if let Some(value) = line.trim().strip_prefix("description:") {
            let value = value.trim().trim_start_matches(['>', '-', '|']).trim();
            return value.chars().take(DESCRIPTION_MAX).collect();
        }
    }
    String::new()
}

/// Content hash over relative paths and file bytes, in sorted walk order.
/// Used to detect drift between the library and an installed copy.
pub fn hash_dir(dir: &Path) -> Result<String> {
    let mut hasher = Sha256::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|err| SkiError::Catalog(format!("walk {}: {err}", dir.display())))?;
        if !entry.file_type().is_file() || is_ignored(entry.path()) {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(dir)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .replace('\\', "/");
        let bytes = std::fs::read(entry.path())
            .map_err(|err| SkiError::fs(format!("read {}", entry.path().display()), err))?;
        hasher.update(rel.as_bytes());
        hasher.update([0u8]);
        hasher.update(&bytes);
        hasher.update([0u8]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Whether a path should be excluded from hashing and installed copies.
pub fn is_ignored(path: &Path) -> bool {
    path.components().any(|c| {
        let name = c.as_os_str().to_string_lossy();
        IGNORED_FILES.contains(&name.as_ref()) || name.ends_with(".pyc")
    })
}

fn dir_has_entries(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|mut entries| {
            entries.any(|e| {
                e.map(|e| e.file_name().to_string_lossy() != ".gitkeep")
                    .unwrap_or(false)
            })
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_skill(root: &Path, group: &str, name: &str, body: &str) -> PathBuf {
        let dir = root.join(group).join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(DESCRIPTOR_FILE), body).unwrap();
        dir
    }

    #[test]
    fn test_scan_missing_root_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let err = Catalog::scan(&tmp.path().join("nope")).unwrap_err();
        assert_eq!(err.code(), "catalog_error");
    }

    #[test]
    fn test_scan_sorted_by_group_then_name() {
        let tmp = tempfile::tempdir().unwrap();
        write_skill(tmp.path(), "zeta", "aaa", "---\ndescription: z\n---\n");
        write_skill(tmp.path(), "alpha", "zzz", "---\ndescription: a\n---\n");
        write_skill(tmp.path(), "alpha", "bbb", "---\ndescription: b\n---\n");

        let catalog = Catalog::scan(tmp.path()).unwrap();
        let order: Vec<(&str, &str)> = catalog
            .packages()
            .iter()
            .map(|p| (p.group.as_str(), p.name.as_str()))
            .collect();
        assert_eq!(order, vec![("alpha", "bbb"), ("alpha", "zzz"), ("zeta", "aaa")]);
    }

    #[test]
    fn test_scan_skips_descriptorless_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        write_skill(tmp.path(), "team", "real", "---\ndescription: ok\n---\n");
        std::fs::create_dir_all(tmp.path().join("team/draft")).unwrap();

        let catalog = Catalog::scan(tmp.path()).unwrap();
        assert_eq!(catalog.packages().len(), 1);
        assert_eq!(catalog.packages()[0].name, "real");
    }

    #[test]
    fn test_scan_skips_reserved_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        write_skill(tmp.path(), "team", "real", "---\ndescription: ok\n---\n");
        // A SKILL.md under assets/ must not register as a package.
        write_skill(tmp.path(), "assets", "sample-skill", "---\ndescription: no\n---\n");

        let catalog = Catalog::scan(tmp.path()).unwrap();
        assert_eq!(catalog.packages().len(), 1);
    }

    #[test]
    fn test_frontmatter_description_extraction() {
        let text = "---\nname: demo\ndescription: >-\n---\nbody";
        assert_eq!(frontmatter_description(text), "");

        let text = "---\nname: demo\ndescription: Builds DCF models fast\n---\nbody";
        assert_eq!(frontmatter_description(text), "Builds DCF models fast");

        assert_eq!(frontmatter_description("no frontmatter here"), "");
    }

    #[test]
    fn test_frontmatter_description_truncated() {
        let long = "x".repeat(300);
        let text = format!("---\ndescription: {long}\n---\n");
        assert_eq!(frontmatter_description(&text).len(), DESCRIPTION_MAX);
    }

    #[test]
    fn test_hash_changes_with_content() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = write_skill(tmp.path(), "g", "s", "---\ndescription: v1\n---\n");
        let h1 = hash_dir(&dir).unwrap();
        let h2 = hash_dir(&dir).unwrap();
        assert_eq!(h1, h2, "hash must be deterministic");

        std::fs::write(dir.join(DESCRIPTOR_FILE), "---\ndescription: v2\n---\n").unwrap();
        let h3 = hash_dir(&dir).unwrap();
        assert_ne!(h1, h3, "hash must track content changes");
    }

    #[test]
    fn test_hash_ignores_cache_artifacts() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = write_skill(tmp.path(), "g", "s", "---\ndescription: v1\n---\n");
        let h1 = hash_dir(&dir).unwrap();

        std::fs::create_dir_all(dir.join("scripts/__pycache__")).unwrap();
        std::fs::write(dir.join("scripts/__pycache__/mod.cpython-312.pyc"), b"junk").unwrap();
        std::fs::write(dir.join(".DS_Store"), b"junk").unwrap();
        let h2 = hash_dir(&dir).unwrap();
        assert_eq!(h1, h2);
    }

    #[test]
    fn test_tiers() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = write_skill(tmp.path(), "g", "s", "---\ndescription: d\n---\n");
        std::fs::create_dir_all(dir.join("scripts")).unwrap();
        std::fs::write(dir.join("scripts/run.py"), "print()").unwrap();
        // assets with only .gitkeep does not count
        std::fs::create_dir_all(dir.join("assets")).unwrap();
        std::fs::write(dir.join("assets/.gitkeep"), "").unwrap();

        let catalog = Catalog::scan(tmp.path()).unwrap();
        let pkg = catalog.find("s").unwrap();
        assert_eq!(pkg.tiers(), vec!["scripts"]);
        assert!(!pkg.has_assets);
    }

    #[test]
    fn test_suggestions() {
        let tmp = tempfile::tempdir().unwrap();
        write_skill(tmp.path(), "g", "content-creator", "---\ndescription: d\n---\n");
        write_skill(tmp.path(), "g", "content-reviewer", "---\ndescription: d\n---\n");
        write_skill(tmp.path(), "g", "ceo-advisor", "---\ndescription: d\n---\n");

        let catalog = Catalog::scan(tmp.path()).unwrap();
        let hits = catalog.suggestions("Content");
        assert_eq!(hits, vec!["content-creator", "content-reviewer"]);
        assert!(catalog.suggestions("xyz").is_empty());
    }
}
