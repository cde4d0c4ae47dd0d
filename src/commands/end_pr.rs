//! `cdtools end-pr`
//!
//! Prompts, in order:
//! 1. merge confirmation
//! 2. merge method
//! 3. switch back to the parent branch and delete the release branch,
//!    only after a successful merge

use crate::branch_info::{delete_branch_info, save_branch_info, try_load_branch_info};
use crate::commands::CommandContext;
use crate::config::{
    is_stable, load_config, save_config, Config, Project, VersioningStrategy, STABLE_TAG,
};
use crate::domain::{ReleaseBranch, Version};
use crate::error::{CdToolsError, Result};
use crate::github::{MergeMethod, PrState};
use crate::manifest;
use crate::planner::release_commit_message;
use crate::ui::{
    display_manual_merge_instruction, display_release_warning, display_status, display_success,
    display_version_plan, ReleaseWarning,
};
use crate::version_manager::VersionManager;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndPrOutcome {
    /// The user declined the merge; nothing was changed
    Declined,
    Finished {
        /// Final versions per project path
        versions: BTreeMap<String, String>,
        merged: bool,
    },
}

/// Where the branch's versions go when it is finished
#[derive(Debug, Clone, PartialEq, Eq)]
enum Transition {
    /// No `next` tag: versions stay as they are
    Stay,
    /// Versions lose their prerelease and become the new base versions
    Stable,
    /// Versions move to another prerelease tag
    Next(String),
}

impl Transition {
    fn target_tag<'a>(&'a self, current: &'a str) -> &'a str {
        match self {
            Transition::Stay => current,
            Transition::Stable => STABLE_TAG,
            Transition::Next(tag) => tag,
        }
    }
}

pub fn run(ctx: &CommandContext<'_>) -> Result<EndPrOutcome> {
    let mut config = load_config(&ctx.root)?;
    let (branch, info) = ctx.current_release()?;

    let status = ctx.forge.get_pr_status()?;
    if status.state != PrState::Open {
        return Err(CdToolsError::not_found(format!(
            "Pull request {} is {}, not open",
            status.url, status.state
        )));
    }

    if !ctx.prompter.confirm(
        &format!("Merge {} into '{}'?", status.url, info.parent_branch),
        true,
    )? {
        display_status("Nothing merged");
        return Ok(EndPrOutcome::Declined);
    }
    let methods: Vec<String> = MergeMethod::ALL.iter().map(|m| m.to_string()).collect();
    let method_idx = ctx.prompter.select("Merge method", &methods, 0)?;
    let method = MergeMethod::ALL
        .get(method_idx)
        .copied()
        .unwrap_or(MergeMethod::Merge);

    let ledger: BTreeMap<String, String> = info
        .project_updated
        .iter()
        .flatten()
        .filter(|(path, _)| {
            let known = config.project(path).is_some();
            if !known {
                log::warn!("'{}' is in the ledger but no longer configured", path);
            }
            known
        })
        .map(|(path, update)| (path.clone(), update.version.clone()))
        .collect();

    let (transition, versions) = {
        let manager = VersionManager::new(&config, ctx.git, ctx.clock);
        let transition = if is_stable(&info.tag) {
            Transition::Stable
        } else {
            match manager.tag_config(&info.tag)?.next {
                None => Transition::Stay,
                Some(next) if is_stable(&next) => Transition::Stable,
                Some(next) => Transition::Next(next),
            }
        };
        let versions = if transition == Transition::Stay || is_stable(&info.tag) {
            ledger.clone()
        } else {
            transition_versions(&manager, &config, &info.tag, &ledger)?
        };
        (transition, versions)
    };
    let target_tag = transition.target_tag(&info.tag).to_string();

    if !versions.is_empty() {
        display_version_plan(&target_tag, &versions);
    }
    if versions != ledger {
        let updates: Vec<(&Project, String)> = versions
            .iter()
            .filter_map(|(path, version)| config.project(path).map(|p| (p, version.clone())))
            .collect();
        manifest::write_versions(&ctx.root, &updates)?;
    }

    match &transition {
        Transition::Stable => {
            for (path, version) in &versions {
                if let Some(project) = config.project_mut(path) {
                    project.base_version = version.clone();
                }
            }
            save_config(&ctx.root, &config)?;
        }
        Transition::Next(next) if !versions.is_empty() => {
            carry_ledger(ctx, &info.parent_branch, next, &versions)?;
        }
        _ => {}
    }

    delete_branch_info(&ctx.root, &branch)?;
    let branch_name = branch.to_string();
    ctx.git
        .commit_changes(&release_commit_message(&target_tag, &versions))?;
    ctx.git.push_changes(&branch_name)?;

    let merged = match ctx.forge.merge_pull_request(method) {
        Ok(()) => {
            display_success(&format!("Merged {} ({})", status.url, method));
            true
        }
        Err(e) if e.is_forge() => {
            display_release_warning(&ReleaseWarning::MergeFailed {
                url: status.url.clone(),
                reason: e.to_string(),
            });
            display_manual_merge_instruction(&status.url);
            false
        }
        Err(e) => return Err(e),
    };

    if merged {
        if let Some(notes) = config.release_notes.as_ref().filter(|n| n.enabled) {
            for (tag, name, version) in planned_releases(ctx, &config, &versions) {
                let prerelease = Version::parse(&version).map_or(true, |v| v.is_prerelease());
                let body = notes.render(&name, &version, &tag);
                match ctx.forge.create_release(&tag, &tag, &body, prerelease) {
                    Ok(()) => display_success(&format!("Created release {}", tag)),
                    Err(e) if e.is_forge() => {
                        display_release_warning(&ReleaseWarning::ReleaseFailed {
                            tag,
                            reason: e.to_string(),
                        })
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        if ctx.prompter.confirm(
            &format!(
                "Switch back to '{}' and delete '{}'?",
                info.parent_branch, branch_name
            ),
            true,
        )? {
            ctx.git.switch_to_branch(&info.parent_branch)?;
            ctx.git.pull_latest(&info.parent_branch)?;
            // squash and rebase merges leave the branch unmerged as far as git knows
            ctx.git.delete_local_branch(&branch_name, true)?;
            display_success(&format!("Back on '{}'", info.parent_branch));
        }
    }

    Ok(EndPrOutcome::Finished { versions, merged })
}

fn transition_versions(
    manager: &VersionManager<'_>,
    config: &Config,
    tag: &str,
    ledger: &BTreeMap<String, String>,
) -> Result<BTreeMap<String, String>> {
    ledger
        .iter()
        .filter_map(|(path, current)| config.project(path).map(|p| (path, p, current)))
        .map(|(path, project, current)| {
            let version =
                manager.calculate_next_tag_version(tag, &project.base_version, Some(current))?;
            Ok((path.clone(), version))
        })
        .collect()
}

/// Merge `versions` into the parent's ledger when the parent is a release
/// branch for `next_tag`; otherwise warn that they are dropped.
fn carry_ledger(
    ctx: &CommandContext<'_>,
    parent: &str,
    next_tag: &str,
    versions: &BTreeMap<String, String>,
) -> Result<bool> {
    let discarded = || {
        display_release_warning(&ReleaseWarning::LedgerDiscarded {
            parent: parent.to_string(),
        });
        Ok(false)
    };

    let parent_branch = match ReleaseBranch::parse(parent) {
        Ok(b) if b.tag == next_tag => b,
        _ => return discarded(),
    };
    let Some(mut parent_info) = try_load_branch_info(&ctx.root, &parent_branch)? else {
        return discarded();
    };

    let mut combined: BTreeMap<String, String> = parent_info
        .project_updated
        .iter()
        .flatten()
        .map(|(path, update)| (path.clone(), update.version.clone()))
        .collect();
    combined.extend(versions.iter().map(|(p, v)| (p.clone(), v.clone())));
    parent_info.record_versions(&combined, ctx.clock.now());
    save_branch_info(&ctx.root, &parent_branch, &parent_info)?;

    display_status(&format!("Carried {} version(s) into '{}'", versions.len(), parent));
    Ok(true)
}

/// GitHub release tag for a project version
pub fn release_tag(strategy: VersioningStrategy, project: &Project, version: &str) -> String {
    match (strategy, project.dir_name()) {
        (VersioningStrategy::Fixed, _) | (_, None) => version.to_string(),
        (VersioningStrategy::Independent, Some(dir)) => format!("{}-{}", dir, version),
    }
}

/// `(release tag, project name, version)` per distinct release tag
fn planned_releases(
    ctx: &CommandContext<'_>,
    config: &Config,
    versions: &BTreeMap<String, String>,
) -> Vec<(String, String, String)> {
    let root_name = ctx
        .root
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(".")
        .to_string();

    let mut releases: BTreeMap<String, (String, String)> = BTreeMap::new();
    for (path, version) in versions {
        let Some(project) = config.project(path) else {
            continue;
        };
        let tag = release_tag(config.versioning_strategy, project, version);
        let name = project
            .dir_name()
            .map_or_else(|| root_name.clone(), str::to_string);
        releases.entry(tag).or_insert((name, version.clone()));
    }
    releases
        .into_iter()
        .map(|(tag, (name, version))| (tag, name, version))
        .collect()
}
