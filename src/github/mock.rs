use crate::error::{CdToolsError, Result};
use crate::github::{Forge, MergeMethod, PrState, PrStatus};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq)]
pub struct CreatedPr {
    pub title: String,
    pub body: String,
    pub base: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreatedRelease {
    pub tag: String,
    pub title: String,
    pub body: String,
    pub prerelease: bool,
}

#[derive(Debug, Clone)]
pub struct MockForgeState {
    /// URL of the current branch's PR, `None` when there is none
    pub pr_url: Option<String>,
    pub pr_state: PrState,
    pub fail_merge: bool,
    pub created: Vec<CreatedPr>,
    pub merges: Vec<MergeMethod>,
    pub releases: Vec<CreatedRelease>,
}

impl Default for MockForgeState {
    fn default() -> Self {
        MockForgeState {
            pr_url: None,
            pr_state: PrState::Open,
            fail_merge: false,
            created: Vec::new(),
            merges: Vec::new(),
            releases: Vec::new(),
        }
    }
}

/// In-memory forge recording every pull request and release call
#[derive(Default)]
pub struct MockForge {
    state: Mutex<MockForgeState>,
}

impl MockForge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forge where the current branch already has an open PR
    pub fn with_open_pr(url: impl Into<String>) -> Self {
        let forge = Self::new();
        forge.lock().pr_url = Some(url.into());
        forge
    }

    pub fn set_pr_state(&self, state: PrState) {
        self.lock().pr_state = state;
    }

    pub fn fail_merge(&self) {
        self.lock().fail_merge = true;
    }

    pub fn state(&self) -> MockForgeState {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockForgeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn require_pr(state: &MockForgeState) -> Result<String> {
        state
            .pr_url
            .clone()
            .ok_or_else(|| CdToolsError::not_found("No pull request for the current branch"))
    }
}

impl Forge for MockForge {
    fn check_pr_exists(&self) -> Result<bool> {
        Ok(self.lock().pr_url.is_some())
    }

    fn get_current_pr_url(&self) -> Result<String> {
        Self::require_pr(&self.lock())
    }

    fn create_pull_request_interactive(
        &self,
        title: &str,
        body: &str,
        base_branch: &str,
    ) -> Result<String> {
        let mut state = self.lock();
        if state.pr_url.is_some() {
            return Err(CdToolsError::forge(
                "gh pr create",
                "a pull request for this branch already exists",
            ));
        }
        let url = format!("https://github.com/acme/app/pull/{}", state.created.len() + 1);
        state.created.push(CreatedPr {
            title: title.to_string(),
            body: body.to_string(),
            base: base_branch.to_string(),
        });
        state.pr_url = Some(url.clone());
        state.pr_state = PrState::Open;
        Ok(url)
    }

    fn merge_pull_request(&self, method: MergeMethod) -> Result<()> {
        let mut state = self.lock();
        Self::require_pr(&state)?;
        if state.fail_merge {
            return Err(CdToolsError::forge(
                format!("gh pr merge {}", method.flag()),
                "Pull request is not mergeable: the base branch policy prohibits the merge",
            ));
        }
        state.merges.push(method);
        state.pr_state = PrState::Merged;
        Ok(())
    }

    fn get_pr_status(&self) -> Result<PrStatus> {
        let state = self.lock();
        Ok(PrStatus {
            url: Self::require_pr(&state)?,
            state: state.pr_state,
            mergeable: "MERGEABLE".to_string(),
        })
    }

    fn create_release(&self, tag: &str, title: &str, body: &str, prerelease: bool) -> Result<()> {
        self.lock().releases.push(CreatedRelease {
            tag: tag.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            prerelease,
        });
        Ok(())
    }
}
