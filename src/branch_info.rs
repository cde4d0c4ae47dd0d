//! Per-release-branch ledger stored as `.cdtools/<tag>-<slug>.json`
//!
//! Records which project was bumped to which version during the current
//! release cycle, and when that version last changed.

use crate::config::{to_pretty_json, STATE_DIR};
use crate::domain::ReleaseBranch;
use crate::error::{CdToolsError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectUpdate {
    pub version: String,
    pub updated_at: DateTime<Utc>,
}

/// Project path -> last version written in this cycle
pub type ProjectUpdates = BTreeMap<String, ProjectUpdate>;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BranchInfo {
    pub tag: String,
    pub parent_branch: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_updated: Option<ProjectUpdates>,
}

impl BranchInfo {
    pub fn new(tag: impl Into<String>, parent_branch: impl Into<String>) -> Self {
        BranchInfo {
            tag: tag.into(),
            parent_branch: parent_branch.into(),
            project_updated: None,
        }
    }

    /// Version recorded for `path` in this cycle, if any
    pub fn current_version(&self, path: &str) -> Option<&str> {
        self.project_updated
            .as_ref()
            .and_then(|updates| updates.get(path))
            .map(|u| u.version.as_str())
    }

    /// Replace the ledger with `new_versions`, keeping timestamps of unchanged entries
    pub fn record_versions(&mut self, new_versions: &BTreeMap<String, String>, now: DateTime<Utc>) {
        let merged = merge_project_updated(self.project_updated.as_ref(), new_versions, now);
        self.project_updated = Some(merged);
    }
}

/// Build the next ledger from `new_versions`.
///
/// `updated_at` moves to `now` only for paths whose version string changed.
/// Paths absent from `new_versions` are dropped.
pub fn merge_project_updated(
    previous: Option<&ProjectUpdates>,
    new_versions: &BTreeMap<String, String>,
    now: DateTime<Utc>,
) -> ProjectUpdates {
    new_versions
        .iter()
        .map(|(path, version)| {
            let updated_at = previous
                .and_then(|prev| prev.get(path))
                .filter(|prev| &prev.version == version)
                .map_or(now, |prev| prev.updated_at);
            (
                path.clone(),
                ProjectUpdate {
                    version: version.clone(),
                    updated_at,
                },
            )
        })
        .collect()
}

pub fn branch_info_path(root: &Path, branch: &ReleaseBranch) -> PathBuf {
    root.join(STATE_DIR).join(branch.info_file_name())
}

/// Load the ledger for `branch`; a missing file is a `NotFound`
pub fn load_branch_info(root: &Path, branch: &ReleaseBranch) -> Result<BranchInfo> {
    try_load_branch_info(root, branch)?.ok_or_else(|| {
        CdToolsError::not_found_with_hint(
            format!("No branch info for '{}'", branch),
            "Run `cdtools start-pr` first",
        )
    })
}

/// Load the ledger for `branch`, `None` when the branch has none
pub fn try_load_branch_info(root: &Path, branch: &ReleaseBranch) -> Result<Option<BranchInfo>> {
    let path = branch_info_path(root, branch);
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path)?;
    let info = serde_json::from_str(&content).map_err(|e| {
        CdToolsError::validation(format!("{} is not valid branch info: {}", path.display(), e))
    })?;
    Ok(Some(info))
}

pub fn save_branch_info(root: &Path, branch: &ReleaseBranch, info: &BranchInfo) -> Result<()> {
    let path = branch_info_path(root, branch);
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(&path, to_pretty_json(info)?)?;
    log::debug!("wrote branch info {}", path.display());
    Ok(())
}

/// Remove the ledger; removing an absent ledger is not an error
pub fn delete_branch_info(root: &Path, branch: &ReleaseBranch) -> Result<()> {
    let path = branch_info_path(root, branch);
    match fs::remove_file(&path) {
        Ok(()) => {
            log::debug!("deleted branch info {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
