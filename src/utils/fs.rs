//! Filesystem utilities.
//!
//! The replace-style directory swap here is what keeps installs atomic: the
//! destination only ever holds the complete old tree or the complete new
//! tree, never a mix.

use std::path::Path;

use walkdir::WalkDir;

use crate::catalog::is_ignored;
use crate::error::{Result, SkiError};

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        std::fs::create_dir_all(path)
            .map_err(|err| SkiError::fs(format!("create {}", path.display()), err))?;
    }
    Ok(())
}

/// Remove a directory tree if present. Returns whether anything was removed.
pub fn remove_dir_if_exists(path: impl AsRef<Path>) -> Result<bool> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(false);
    }
    std::fs::remove_dir_all(path)
        .map_err(|err| SkiError::fs(format!("remove {}", path.display()), err))?;
    Ok(true)
}

/// Replace `dest` with a copy of `src`: stage the copy next to the
/// destination, then swap it in. A failure mid-copy leaves the previous
/// destination untouched; cache artifacts are excluded from the copy.
pub fn replace_dir(src: &Path, dest: &Path) -> Result<()> {
    let parent = dest
        .parent()
        .ok_or_else(|| SkiError::Config(format!("{} has no parent directory", dest.display())))?;
    ensure_dir(parent)?;

    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "skill".to_string());
    let staged = parent.join(format!(".{name}.ski-stage"));
    remove_dir_if_exists(&staged)?;

    if let Err(err) = copy_tree(src, &staged) {
        let _ = std::fs::remove_dir_all(&staged);
        return Err(err);
    }

    // Swap: the old tree is gone only once the new one is fully staged.
    remove_dir_if_exists(dest)?;
    std::fs::rename(&staged, dest).map_err(|err| {
        let _ = std::fs::remove_dir_all(&staged);
        SkiError::fs(format!("rename {} -> {}", staged.display(), dest.display()), err)
    })?;
    Ok(())
}

fn copy_tree(src: &Path, dest: &Path) -> Result<()> {
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry.map_err(|err| {
            let io = err
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("walk loop detected"));
            SkiError::fs(format!("walk {}", src.display()), io)
        })?;
        if is_ignored(entry.path()) {
            continue;
        }
        let rel = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            ensure_dir(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                ensure_dir(parent)?;
            }
            std::fs::copy(entry.path(), &target).map_err(|err| {
                SkiError::fs(
                    format!("copy {} -> {}", entry.path().display(), target.display()),
                    err,
                )
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_dir_fresh_install() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        std::fs::create_dir_all(src.join("scripts")).unwrap();
        std::fs::write(src.join("SKILL.md"), "content").unwrap();
        std::fs::write(src.join("scripts/run.py"), "print()").unwrap();

        let dest = tmp.path().join("target/skill");
        replace_dir(&src, &dest).unwrap();

        assert_eq!(std::fs::read_to_string(dest.join("SKILL.md")).unwrap(), "content");
        assert!(dest.join("scripts/run.py").exists());
    }

    #[test]
    fn test_replace_dir_removes_old_files() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("SKILL.md"), "new").unwrap();

        let dest = tmp.path().join("dest");
        std::fs::create_dir_all(&dest).unwrap();
        std::fs::write(dest.join("SKILL.md"), "old").unwrap();
        std::fs::write(dest.join("leftover.md"), "stale partial install").unwrap();

        replace_dir(&src, &dest).unwrap();

        assert_eq!(std::fs::read_to_string(dest.join("SKILL.md")).unwrap(), "new");
        assert!(
            !dest.join("leftover.md").exists(),
            "replace must not leave mixed old/new trees"
        );
    }

    #[test]
    fn test_replace_dir_excludes_cache_artifacts() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        std::fs::create_dir_all(src.join("__pycache__")).unwrap();
        std::fs::write(src.join("SKILL.md"), "content").unwrap();
        std::fs::write(src.join("__pycache__/mod.pyc"), "junk").unwrap();
        std::fs::write(src.join(".DS_Store"), "junk").unwrap();

        let dest = tmp.path().join("dest");
        replace_dir(&src, &dest).unwrap();

        assert!(dest.join("SKILL.md").exists());
        assert!(!dest.join("__pycache__").exists());
        assert!(!dest.join(".DS_Store").exists());
    }

    #[test]
    fn test_replace_dir_failure_preserves_old_state() {
        let tmp = tempfile::tempdir().unwrap();
        let missing_src = tmp.path().join("does-not-exist");

        let dest = tmp.path().join("dest");
        std::fs::create_dir_all(&dest).unwrap();
        std::fs::write(dest.join("SKILL.md"), "old").unwrap();

        assert!(replace_dir(&missing_src, &dest).is_err());
        assert_eq!(std::fs::read_to_string(dest.join("SKILL.md")).unwrap(), "old");
    }

    #[test]
    fn test_remove_dir_if_exists() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("d");
        assert!(!remove_dir_if_exists(&dir).unwrap());
        std::fs::create_dir_all(&dir).unwrap();
        assert!(remove_dir_if_exists(&dir).unwrap());
        assert!(!dir.exists());
    }
}
