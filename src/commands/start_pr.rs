//! `cdtools start-pr`
//!
//! Prompts, in order: version tag, branch name.

use crate::branch_info::{save_branch_info, BranchInfo};
use crate::commands::CommandContext;
use crate::config::load_config;
use crate::domain::ReleaseBranch;
use crate::error::{CdToolsError, Result};
use crate::ui::{display_status, display_success};

/// Create `<slug>(<tag>)` from the current branch and start its ledger
pub fn run(ctx: &CommandContext<'_>) -> Result<ReleaseBranch> {
    let config = load_config(&ctx.root)?;
    if config.tag_names().is_empty() {
        return Err(CdToolsError::validation("no version tags are configured"));
    }
    let tags = config.release_tags();

    let parent = ctx.git.get_current_branch()?;
    let tag_idx = ctx
        .prompter
        .select("Version tag for the release branch", &tags, 0)?;
    let tag = &tags[tag_idx];

    let slug = ctx.prompter.input("Branch name", None)?;
    if !ReleaseBranch::is_valid_slug(&slug) {
        return Err(CdToolsError::validation(format!(
            "invalid branch name '{}': it must be non-empty and contain no parentheses",
            slug
        )));
    }
    let branch = ReleaseBranch::new(slug, tag.as_str());

    display_status(&format!("Updating '{}'", parent));
    ctx.git.pull_latest(&parent)?;
    ctx.git.create_and_checkout_branch(&branch.to_string())?;
    save_branch_info(&ctx.root, &branch, &BranchInfo::new(tag.as_str(), parent.as_str()))?;

    display_success(&format!(
        "Created '{}' from '{}'; run `cdtools push-pr` when ready",
        branch, parent
    ));
    Ok(branch)
}
