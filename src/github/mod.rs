//! GitHub collaborator
//!
//! Pull requests and releases for the checked out branch. [GhCli] drives the
//! GitHub CLI; [MockForge] records calls for tests.

pub mod gh;
pub mod mock;

pub use gh::GhCli;
pub use mock::MockForge;

use crate::error::Result;
use serde::Deserialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMethod {
    Merge,
    Squash,
    Rebase,
}

impl MergeMethod {
    pub const ALL: [MergeMethod; 3] =
        [MergeMethod::Merge, MergeMethod::Squash, MergeMethod::Rebase];

    /// Flag understood by `gh pr merge`
    pub fn flag(&self) -> &'static str {
        match self {
            MergeMethod::Merge => "--merge",
            MergeMethod::Squash => "--squash",
            MergeMethod::Rebase => "--rebase",
        }
    }
}

impl fmt::Display for MergeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeMethod::Merge => write!(f, "merge"),
            MergeMethod::Squash => write!(f, "squash"),
            MergeMethod::Rebase => write!(f, "rebase"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PrState {
    Open,
    Closed,
    Merged,
}

impl fmt::Display for PrState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrState::Open => write!(f, "open"),
            PrState::Closed => write!(f, "closed"),
            PrState::Merged => write!(f, "merged"),
        }
    }
}

/// Subset of `gh pr view --json url,state,mergeable`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PrStatus {
    pub url: String,
    pub state: PrState,
    #[serde(default)]
    pub mergeable: String,
}

/// Forge operations on the current branch's pull request
pub trait Forge: Send + Sync {
    /// Whether the current branch has a pull request; a missing PR is `Ok(false)`
    fn check_pr_exists(&self) -> Result<bool>;

    fn get_current_pr_url(&self) -> Result<String>;

    /// Open a pull request from the current branch into `base_branch`, returning its URL
    fn create_pull_request_interactive(&self, title: &str, body: &str, base_branch: &str)
        -> Result<String>;

    fn merge_pull_request(&self, method: MergeMethod) -> Result<()>;

    fn get_pr_status(&self) -> Result<PrStatus>;

    fn create_release(&self, tag: &str, title: &str, body: &str, prerelease: bool) -> Result<()>;
}
