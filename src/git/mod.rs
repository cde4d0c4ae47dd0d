//! Git operations abstraction layer
//!
//! Commands depend on the [GitOperations] trait rather than on a concrete
//! backend so whole release flows can run against [MockGit] in tests.
//!
//! - [repository::GitRepository]: `git2` for queries, the system `git` binary
//!   for anything that mutates the repository or talks to a remote
//! - [mock::MockGit]: in-memory implementation recording every call

pub mod mock;
pub mod repository;

pub use mock::MockGit;
pub use repository::GitRepository;

use crate::error::Result;

/// Version-control collaborator used by the release commands
///
/// Every method either returns parsed output or a
/// [crate::error::CdToolsError] naming the failed command.
/// Not `Sync`: a `git2::Repository` must stay on one thread.
pub trait GitOperations: Send {
    /// Name of the checked out branch
    fn get_current_branch(&self) -> Result<String>;

    /// Fast-forward `branch` from `origin`
    fn pull_latest(&self, branch: &str) -> Result<()>;

    /// Create `name` from HEAD and check it out
    fn create_and_checkout_branch(&self, name: &str) -> Result<()>;

    /// Repository relative paths changed since the merge-base with `parent_branch`,
    /// including uncommitted and untracked files
    fn get_changed_files(&self, parent_branch: &str) -> Result<Vec<String>>;

    /// Stage everything and commit; a clean tree is left alone
    fn commit_changes(&self, message: &str) -> Result<()>;

    /// Push `branch` to `origin`, setting upstream
    fn push_changes(&self, branch: &str) -> Result<()>;

    /// Tag names matching a glob such as `*1.2.0-rc.*`
    fn get_tags_matching_pattern(&self, pattern: &str) -> Result<Vec<String>>;

    fn switch_to_branch(&self, name: &str) -> Result<()>;

    fn delete_local_branch(&self, name: &str, force: bool) -> Result<()>;
}
