//! Read-only views over the catalog and manifest.
//!
//! No side effects here: these rows are what `list` and `status` render.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::catalog::Catalog;
use crate::manifest::Manifest;

/// Installed-copy state relative to the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallState {
    /// Recorded source hash matches the catalog.
    Current,
    /// Library content changed since install.
    Stale,
    /// Package no longer exists in the catalog.
    MissingFromCatalog,
}

impl InstallState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Stale => "stale",
            Self::MissingFromCatalog => "missing from catalog",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusRow {
    pub skill_name: String,
    pub group: String,
    pub auto_update: bool,
    pub state: InstallState,
    pub installed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One row per installed skill, with staleness derived from the catalog.
pub fn status_rows(catalog: &Catalog, manifest: &Manifest) -> Vec<StatusRow> {
    manifest
        .installed
        .iter()
        .map(|entry| {
            let state = match catalog.find(&entry.skill_name) {
                None => InstallState::MissingFromCatalog,
                Some(pkg) if pkg.content_hash != entry.source_hash => InstallState::Stale,
                Some(_) => InstallState::Current,
            };
            StatusRow {
                skill_name: entry.skill_name.clone(),
                group: entry.group.clone(),
                auto_update: entry.auto_update,
                state,
                installed_at: entry.installed_at,
                updated_at: entry.updated_at,
            }
        })
        .collect()
}
