use crate::error::{CdToolsError, Result};
use crate::github::{Forge, MergeMethod, PrStatus};
use std::path::PathBuf;
use std::process::Command;

/// Forge backed by the `gh` binary, run from the repository work tree
pub struct GhCli {
    work_tree: PathBuf,
}

impl GhCli {
    pub fn new(work_tree: impl Into<PathBuf>) -> Self {
        GhCli {
            work_tree: work_tree.into(),
        }
    }

    fn run_gh(&self, args: &[&str]) -> Result<String> {
        let command = format!("gh {}", args.join(" "));
        log::debug!("running {}", command);

        let output = Command::new("gh")
            .current_dir(&self.work_tree)
            .args(args)
            .output()
            .map_err(|e| CdToolsError::forge(&command, e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(CdToolsError::forge(command, stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

fn is_missing_pr(err: &CdToolsError) -> bool {
    match err {
        CdToolsError::Forge { message, .. } => {
            message.to_lowercase().contains("no pull requests found")
        }
        _ => false,
    }
}

impl Forge for GhCli {
    fn check_pr_exists(&self) -> Result<bool> {
        match self.run_gh(&["pr", "view", "--json", "url"]) {
            Ok(_) => Ok(true),
            Err(e) if is_missing_pr(&e) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn get_current_pr_url(&self) -> Result<String> {
        match self.run_gh(&["pr", "view", "--json", "url", "--jq", ".url"]) {
            Ok(url) => Ok(url),
            Err(e) if is_missing_pr(&e) => Err(CdToolsError::not_found_with_hint(
                "No pull request for the current branch",
                "Run `cdtools push-pr` to open one",
            )),
            Err(e) => Err(e),
        }
    }

    fn create_pull_request_interactive(
        &self,
        title: &str,
        body: &str,
        base_branch: &str,
    ) -> Result<String> {
        let out = self.run_gh(&[
            "pr", "create", "--title", title, "--body", body, "--base", base_branch,
        ])?;
        // gh prints progress lines before the URL
        Ok(out.lines().last().unwrap_or_default().trim().to_string())
    }

    fn merge_pull_request(&self, method: MergeMethod) -> Result<()> {
        self.run_gh(&["pr", "merge", method.flag()])?;
        Ok(())
    }

    fn get_pr_status(&self) -> Result<PrStatus> {
        let raw = match self.run_gh(&["pr", "view", "--json", "url,state,mergeable"]) {
            Ok(raw) => raw,
            Err(e) if is_missing_pr(&e) => {
                return Err(CdToolsError::not_found_with_hint(
                    "No pull request for the current branch",
                    "Run `cdtools push-pr` to open one",
                ))
            }
            Err(e) => return Err(e),
        };
        serde_json::from_str(&raw).map_err(|e| {
            CdToolsError::forge("gh pr view --json url,state,mergeable", e.to_string())
        })
    }

    fn create_release(&self, tag: &str, title: &str, body: &str, prerelease: bool) -> Result<()> {
        let mut args = vec!["release", "create", tag, "--title", title, "--notes", body];
        if prerelease {
            args.push("--prerelease");
        }
        self.run_gh(&args)?;
        Ok(())
    }
}
