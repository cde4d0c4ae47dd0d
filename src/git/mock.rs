use crate::error::{CdToolsError, Result};
use crate::git::GitOperations;
use regex::Regex;
use std::sync::{Mutex, MutexGuard};

/// Everything the mock has been told or has recorded
#[derive(Debug, Default, Clone)]
pub struct MockGitState {
    pub current_branch: String,
    pub branches: Vec<String>,
    pub changed_files: Vec<String>,
    pub tags: Vec<String>,
    pub fail_tag_lookup: bool,
    pub pulled: Vec<String>,
    pub commits: Vec<String>,
    pub pushed: Vec<String>,
    pub deleted_branches: Vec<String>,
}

/// Mock repository for testing without actual git operations
pub struct MockGit {
    state: Mutex<MockGitState>,
}

impl MockGit {
    /// Create a mock positioned on `branch`
    pub fn new(branch: impl Into<String>) -> Self {
        let branch = branch.into();
        MockGit {
            state: Mutex::new(MockGitState {
                current_branch: branch.clone(),
                branches: vec![branch],
                ..MockGitState::default()
            }),
        }
    }

    pub fn set_changed_files(&self, files: &[&str]) {
        self.lock().changed_files = files.iter().map(|f| f.to_string()).collect();
    }

    pub fn add_tag(&self, tag: impl Into<String>) {
        self.lock().tags.push(tag.into());
    }

    /// Make every tag lookup fail
    pub fn fail_tag_lookup(&self) {
        self.lock().fail_tag_lookup = true;
    }

    /// Snapshot of the recorded state
    pub fn state(&self) -> MockGitState {
        self.lock().clone()
    }

    pub fn current_branch(&self) -> String {
        self.lock().current_branch.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockGitState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MockGit {
    fn default() -> Self {
        Self::new("main")
    }
}

impl GitOperations for MockGit {
    fn get_current_branch(&self) -> Result<String> {
        Ok(self.current_branch())
    }

    fn pull_latest(&self, branch: &str) -> Result<()> {
        self.lock().pulled.push(branch.to_string());
        Ok(())
    }

    fn create_and_checkout_branch(&self, name: &str) -> Result<()> {
        let mut state = self.lock();
        if state.branches.iter().any(|b| b == name) {
            return Err(CdToolsError::git(
                format!("git checkout -b {}", name),
                format!("a branch named '{}' already exists", name),
            ));
        }
        state.branches.push(name.to_string());
        state.current_branch = name.to_string();
        Ok(())
    }

    fn get_changed_files(&self, _parent_branch: &str) -> Result<Vec<String>> {
        Ok(self.lock().changed_files.clone())
    }

    fn commit_changes(&self, message: &str) -> Result<()> {
        self.lock().commits.push(message.to_string());
        Ok(())
    }

    fn push_changes(&self, branch: &str) -> Result<()> {
        self.lock().pushed.push(branch.to_string());
        Ok(())
    }

    fn get_tags_matching_pattern(&self, pattern: &str) -> Result<Vec<String>> {
        let state = self.lock();
        if state.fail_tag_lookup {
            return Err(CdToolsError::git(
                format!("git tag -l {}", pattern),
                "simulated failure",
            ));
        }
        let re = glob_to_regex(pattern)?;
        Ok(state.tags.iter().filter(|t| re.is_match(t)).cloned().collect())
    }

    fn switch_to_branch(&self, name: &str) -> Result<()> {
        let mut state = self.lock();
        if !state.branches.iter().any(|b| b == name) {
            state.branches.push(name.to_string());
        }
        state.current_branch = name.to_string();
        Ok(())
    }

    fn delete_local_branch(&self, name: &str, _force: bool) -> Result<()> {
        let mut state = self.lock();
        if state.current_branch == name {
            return Err(CdToolsError::git(
                format!("git branch -D {}", name),
                "cannot delete the checked out branch",
            ));
        }
        state.branches.retain(|b| b != name);
        state.deleted_branches.push(name.to_string());
        Ok(())
    }
}

fn glob_to_regex(pattern: &str) -> Result<Regex> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    Regex::new(&format!("^{}$", body))
        .map_err(|e| CdToolsError::git(format!("git tag -l {}", pattern), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_branch_lifecycle() {
        let git = MockGit::new("main");
        git.create_and_checkout_branch("feat(alpha)").unwrap();
        assert_eq!(git.get_current_branch().unwrap(), "feat(alpha)");
        assert!(git.create_and_checkout_branch("feat(alpha)").is_err());
        assert!(git.delete_local_branch("feat(alpha)", true).is_err());

        git.switch_to_branch("main").unwrap();
        git.delete_local_branch("feat(alpha)", true).unwrap();
        assert_eq!(git.state().deleted_branches, vec!["feat(alpha)"]);
    }

    #[test]
    fn test_mock_tag_glob() {
        let git = MockGit::default();
        for tag in ["1.0.1-rc.0", "api-1.0.1-rc.1", "1.0.1-alpha.3", "1x0x1-rc.9"] {
            git.add_tag(tag);
        }
        let tags = git.get_tags_matching_pattern("*1.0.1-rc.*").unwrap();
        assert_eq!(tags, vec!["1.0.1-rc.0", "api-1.0.1-rc.1"]);

        git.fail_tag_lookup();
        assert!(git.get_tags_matching_pattern("*").is_err());
    }

    #[test]
    fn test_mock_records_commits_and_pushes() {
        let git = MockGit::default();
        git.commit_changes("chore(release): alpha .@1.0.1-alpha.1").unwrap();
        git.push_changes("main").unwrap();
        let state = git.state();
        assert_eq!(state.commits.len(), 1);
        assert_eq!(state.pushed, vec!["main"]);
    }
}
