//! The four release lifecycle commands
//!
//! Each command takes a [CommandContext] holding the repository root and
//! every collaborator it may touch, so the same code runs against the real
//! git/gh/terminal in `main` and against mocks in tests.

pub mod end_pr;
pub mod init;
pub mod push_pr;
pub mod start_pr;

use crate::branch_info::{load_branch_info, BranchInfo};
use crate::clock::Clock;
use crate::domain::{BumpLevel, ReleaseBranch};
use crate::error::Result;
use crate::git::GitOperations;
use crate::github::Forge;
use crate::ui::Prompter;
use std::path::PathBuf;

pub struct CommandContext<'a> {
    /// Repository work tree; `.cdtools/` and project paths are relative to it
    pub root: PathBuf,
    pub git: &'a dyn GitOperations,
    pub forge: &'a dyn Forge,
    pub prompter: &'a dyn Prompter,
    pub clock: &'a dyn Clock,
}

impl CommandContext<'_> {
    /// Release branch currently checked out together with its ledger
    pub(crate) fn current_release(&self) -> Result<(ReleaseBranch, BranchInfo)> {
        let current = self.git.get_current_branch()?;
        let branch = ReleaseBranch::parse(&current)?;
        let info = load_branch_info(&self.root, &branch)?;
        Ok((branch, info))
    }
}

pub(crate) fn bump_level_items() -> Vec<String> {
    BumpLevel::ALL.iter().map(|l| l.to_string()).collect()
}
