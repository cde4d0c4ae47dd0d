//! Which projects a push bumps, and by how much
//!
//! Split into three steps so each can be tested alone: map changed files to
//! projects, turn the user's answers into bump levels, then ask the version
//! manager for the concrete versions.

use crate::branch_info::BranchInfo;
use crate::config::{Config, DependentBump, STATE_DIR};
use crate::domain::BumpLevel;
use crate::error::{CdToolsError, Result};
use crate::version_manager::VersionManager;
use std::collections::BTreeMap;

/// Answer to a bump prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BumpChoice {
    Bump(BumpLevel),
    Skip,
}

/// How the user answered for this push
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BumpSelection {
    /// Fixed strategy: one answer for every changed project
    Global(BumpChoice),
    /// Independent strategy: answers keyed by project path
    PerProject(BTreeMap<String, BumpChoice>),
}

/// Changed projects, in config order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectChanges {
    /// Projects owning at least one changed file
    pub direct: Vec<String>,
    /// Projects only touched through one of their `deps`
    pub dependency: Vec<String>,
}

impl ProjectChanges {
    pub fn is_empty(&self) -> bool {
        self.direct.is_empty() && self.dependency.is_empty()
    }

    pub fn all(&self) -> impl Iterator<Item = &String> {
        self.direct.iter().chain(self.dependency.iter())
    }
}

/// Map changed files to projects. Files under the cdtools state directory never count.
pub fn detect_changes(config: &Config, files: &[String]) -> ProjectChanges {
    let files: Vec<&str> = files
        .iter()
        .map(String::as_str)
        .filter(|f| !is_state_file(f))
        .collect();

    let mut changes = ProjectChanges::default();
    for project in &config.projects {
        if files.iter().any(|f| project.owns_file(f)) {
            changes.direct.push(project.path.clone());
        } else if files.iter().any(|f| project.depends_on_file(f)) {
            changes.dependency.push(project.path.clone());
        }
    }
    log::debug!(
        "{} changed files: direct {:?}, via deps {:?}",
        files.len(),
        changes.direct,
        changes.dependency
    );
    changes
}

fn is_state_file(file: &str) -> bool {
    file.trim_start_matches("./")
        .strip_prefix(STATE_DIR)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Bump level per project path; skipped projects are absent.
///
/// A dependency-only project without an explicit answer follows `dependent_bump`.
pub fn resolve_bump_levels(
    changes: &ProjectChanges,
    selection: &BumpSelection,
    dependent_bump: DependentBump,
) -> BTreeMap<String, BumpLevel> {
    let mut levels = BTreeMap::new();
    match selection {
        BumpSelection::Global(BumpChoice::Skip) => {}
        BumpSelection::Global(BumpChoice::Bump(level)) => {
            for path in changes.all() {
                levels.insert(path.clone(), *level);
            }
        }
        BumpSelection::PerProject(choices) => {
            for path in &changes.direct {
                if let Some(BumpChoice::Bump(level)) = choices.get(path) {
                    levels.insert(path.clone(), *level);
                }
            }
            for path in &changes.dependency {
                let choice = choices.get(path).copied().unwrap_or(match dependent_bump {
                    DependentBump::Patch => BumpChoice::Bump(BumpLevel::Patch),
                    DependentBump::Skip => BumpChoice::Skip,
                });
                if let BumpChoice::Bump(level) = choice {
                    levels.insert(path.clone(), level);
                }
            }
        }
    }
    levels
}

/// Concrete version per project path for a push to `target_tag`
pub fn plan_versions(
    manager: &VersionManager<'_>,
    config: &Config,
    levels: &BTreeMap<String, BumpLevel>,
    target_tag: &str,
    branch_info: &BranchInfo,
) -> Result<BTreeMap<String, String>> {
    levels
        .iter()
        .map(|(path, level)| {
            let project = config.project(path).ok_or_else(|| {
                CdToolsError::validation(format!("project '{}' is not configured", path))
            })?;
            let version = manager.calculate_project_version(
                &project.base_version,
                *level,
                target_tag,
                branch_info.current_version(path),
            )?;
            Ok((path.clone(), version))
        })
        .collect()
}

/// `chore(release): <tag> <path>@<version>, ...`
pub fn release_commit_message(tag: &str, versions: &BTreeMap<String, String>) -> String {
    let entries: Vec<String> = versions
        .iter()
        .map(|(path, version)| format!("{}@{}", path, version))
        .collect();
    if entries.is_empty() {
        format!("chore(release): {}", tag)
    } else {
        format!("chore(release): {} {}", tag, entries.join(", "))
    }
}
