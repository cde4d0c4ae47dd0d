//! `cdtools push-pr`
//!
//! Prompts, in order:
//! 1. bump level: once for every changed project (fixed), or
//!    once per directly changed project with a `skip` option (independent)
//! 2. pull request title, only when the branch has no pull request yet

use crate::branch_info::save_branch_info;
use crate::commands::{bump_level_items, CommandContext};
use crate::config::{load_config, Config, VersioningStrategy};
use crate::domain::BumpLevel;
use crate::error::Result;
use crate::manifest;
use crate::planner::{
    detect_changes, plan_versions, release_commit_message, resolve_bump_levels, BumpChoice,
    BumpSelection, ProjectChanges,
};
use crate::ui::{
    display_release_warning, display_status, display_success, display_version_plan,
    ReleaseWarning,
};
use crate::version_manager::VersionManager;
use std::collections::BTreeMap;

/// Bump, commit and push the current release branch, opening its PR if needed.
///
/// Returns the versions written by this push, keyed by project path.
pub fn run(ctx: &CommandContext<'_>) -> Result<BTreeMap<String, String>> {
    let config = load_config(&ctx.root)?;
    let (branch, mut info) = ctx.current_release()?;
    let manager = VersionManager::new(&config, ctx.git, ctx.clock);
    manager.tag_config(&info.tag)?;

    let files = ctx.git.get_changed_files(&info.parent_branch)?;
    let changes = detect_changes(&config, &files);

    let versions = if changes.is_empty() {
        display_release_warning(&ReleaseWarning::NoProjectChanges {
            parent: info.parent_branch.clone(),
        });
        BTreeMap::new()
    } else {
        let selection = prompt_bump_selection(ctx, &config, &changes)?;
        let levels = resolve_bump_levels(&changes, &selection, config.dependent_bump);
        plan_versions(&manager, &config, &levels, &info.tag, &info)?
    };

    if !versions.is_empty() {
        display_version_plan(&info.tag, &versions);
        let updates = versions
            .iter()
            .filter_map(|(path, version)| config.project(path).map(|p| (p, version.clone())))
            .collect::<Vec<_>>();
        manifest::write_versions(&ctx.root, &updates)?;
        info.record_versions(&versions, ctx.clock.now());
    }
    save_branch_info(&ctx.root, &branch, &info)?;

    let branch_name = branch.to_string();
    ctx.git
        .commit_changes(&release_commit_message(&info.tag, &versions))?;
    ctx.git.push_changes(&branch_name)?;

    if ctx.forge.check_pr_exists()? {
        let url = ctx.forge.get_current_pr_url()?;
        display_success(&format!("Pushed to {}", url));
    } else {
        let title = ctx
            .prompter
            .input("Pull request title", Some(branch.branch_name.as_str()))?;
        let body = pull_request_body(&info.tag, &info.parent_branch, &versions);
        display_status(&format!("Opening a pull request into '{}'", info.parent_branch));
        let url = ctx
            .forge
            .create_pull_request_interactive(&title, &body, &info.parent_branch)?;
        display_success(&format!("Created pull request {}", url));
    }
    Ok(versions)
}

fn prompt_bump_selection(
    ctx: &CommandContext<'_>,
    config: &Config,
    changes: &ProjectChanges,
) -> Result<BumpSelection> {
    let levels = bump_level_items();
    match config.versioning_strategy {
        VersioningStrategy::Fixed => {
            let changed = changes.all().cloned().collect::<Vec<_>>().join(", ");
            let idx = ctx.prompter.select(
                &format!("Bump level for {}", changed),
                &levels,
                0,
            )?;
            let level = BumpLevel::ALL.get(idx).copied().unwrap_or(BumpLevel::Patch);
            Ok(BumpSelection::Global(BumpChoice::Bump(level)))
        }
        VersioningStrategy::Independent => {
            let mut items = levels;
            items.push("skip".to_string());
            let mut choices = BTreeMap::new();
            for path in &changes.direct {
                let idx = ctx
                    .prompter
                    .select(&format!("Bump level for '{}'", path), &items, 0)?;
                let choice = BumpLevel::ALL
                    .get(idx)
                    .map_or(BumpChoice::Skip, |level| BumpChoice::Bump(*level));
                choices.insert(path.clone(), choice);
            }
            if !changes.dependency.is_empty() {
                log::debug!(
                    "{:?} follow the {:?} dependent bump policy",
                    changes.dependency,
                    config.dependent_bump
                );
            }
            Ok(BumpSelection::PerProject(choices))
        }
    }
}

/// Markdown body listing every version in the push
pub fn pull_request_body(tag: &str, parent: &str, versions: &BTreeMap<String, String>) -> String {
    let mut body = format!("Release `{}` into `{}`.\n\n", tag, parent);
    if versions.is_empty() {
        body.push_str("No project versions changed.\n");
    }
    for (path, version) in versions {
        body.push_str(&format!("- `{}`: {}\n", path, version));
    }
    body
}
