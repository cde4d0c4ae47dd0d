use crate::error::{CdToolsError, Result};
use crate::git::GitOperations;
use git2::{DiffOptions, Repository as Git2Repo};
use std::path::{Path, PathBuf};
use std::process::Command;

const REMOTE: &str = "origin";

/// Repository backed by `git2` for reads and the `git` binary for writes
pub struct GitRepository {
    repo: Git2Repo,
    work_tree: PathBuf,
}

impl GitRepository {
    /// Discover the repository containing `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path.as_ref()).map_err(|e| {
            CdToolsError::not_found(format!(
                "Not in a git repository ({}): {}",
                path.as_ref().display(),
                e.message()
            ))
        })?;
        let work_tree = repo
            .workdir()
            .ok_or_else(|| CdToolsError::validation("bare repositories are not supported"))?
            .to_path_buf();

        Ok(GitRepository { repo, work_tree })
    }

    /// Root of the working tree; all cdtools state lives below it
    pub fn work_tree(&self) -> &Path {
        &self.work_tree
    }

    fn run_git(&self, args: &[&str]) -> Result<String> {
        let command = format!("git {}", args.join(" "));
        log::debug!("running {}", command);

        let output = Command::new("git")
            .arg("-C")
            .arg(&self.work_tree)
            .args(args)
            .output()
            .map_err(|e| CdToolsError::git(&command, e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
            let message = if stderr.is_empty() { stdout } else { stderr };
            return Err(CdToolsError::git(command, message));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl GitOperations for GitRepository {
    fn get_current_branch(&self) -> Result<String> {
        let head = self.repo.head()?;
        if !head.is_branch() {
            return Err(CdToolsError::validation("HEAD is detached; check out a branch first"));
        }
        head.shorthand()
            .map(str::to_string)
            .ok_or_else(|| CdToolsError::validation("current branch name is not valid UTF-8"))
    }

    fn pull_latest(&self, branch: &str) -> Result<()> {
        self.run_git(&["pull", "--ff-only", REMOTE, branch])?;
        Ok(())
    }

    fn create_and_checkout_branch(&self, name: &str) -> Result<()> {
        self.run_git(&["checkout", "-b", name])?;
        Ok(())
    }

    fn get_changed_files(&self, parent_branch: &str) -> Result<Vec<String>> {
        let head = self.repo.head()?.peel_to_commit()?;
        let parent = self
            .repo
            .revparse_single(parent_branch)
            .and_then(|obj| obj.peel_to_commit())
            .map_err(|e| {
                CdToolsError::not_found(format!(
                    "Parent branch '{}' not found: {}",
                    parent_branch,
                    e.message()
                ))
            })?;
        let base = self.repo.merge_base(head.id(), parent.id())?;
        let base_tree = self.repo.find_commit(base)?.tree()?;

        let mut opts = DiffOptions::new();
        opts.include_untracked(true).recurse_untracked_dirs(true);
        let diff = self
            .repo
            .diff_tree_to_workdir_with_index(Some(&base_tree), Some(&mut opts))?;

        let mut files: Vec<String> = diff
            .deltas()
            .filter_map(|delta| {
                delta
                    .new_file()
                    .path()
                    .or_else(|| delta.old_file().path())
                    .map(|p| p.to_string_lossy().replace('\\', "/"))
            })
            .collect();
        files.sort();
        files.dedup();
        log::debug!("{} files changed since {}", files.len(), parent_branch);
        Ok(files)
    }

    fn commit_changes(&self, message: &str) -> Result<()> {
        self.run_git(&["add", "-A"])?;
        if self.run_git(&["status", "--porcelain"])?.is_empty() {
            log::debug!("nothing to commit for '{}'", message);
            return Ok(());
        }
        self.run_git(&["commit", "-m", message])?;
        Ok(())
    }

    fn push_changes(&self, branch: &str) -> Result<()> {
        self.run_git(&["push", "-u", REMOTE, branch])?;
        Ok(())
    }

    fn get_tags_matching_pattern(&self, pattern: &str) -> Result<Vec<String>> {
        let tags = self.repo.tag_names(Some(pattern))?;
        Ok(tags.iter().flatten().map(str::to_string).collect())
    }

    fn switch_to_branch(&self, name: &str) -> Result<()> {
        self.run_git(&["checkout", name])?;
        Ok(())
    }

    fn delete_local_branch(&self, name: &str, force: bool) -> Result<()> {
        let flag = if force { "-D" } else { "-d" };
        self.run_git(&["branch", flag, name])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Signature;
    use std::fs;
    use tempfile::TempDir;

    fn init_repo() -> (TempDir, Git2Repo) {
        let dir = TempDir::new().unwrap();
        let repo = Git2Repo::init(dir.path()).unwrap();
        fs::write(dir.path().join("README.md"), "hello\n").unwrap();
        commit_all(&repo, "initial");
        (dir, repo)
    }

    fn commit_all(repo: &Git2Repo, message: &str) {
        let mut index = repo.index().unwrap();
        index
            .add_all(["*"], git2::IndexAddOption::DEFAULT, None)
            .unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = Signature::now("Test", "test@example.com").unwrap();
        let parents: Vec<git2::Commit> = repo
            .head()
            .ok()
            .and_then(|h| h.peel_to_commit().ok())
            .into_iter()
            .collect();
        let parent_refs: Vec<&git2::Commit> = parents.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
            .unwrap();
    }

    fn checkout_new_branch(repo: &Git2Repo, name: &str) {
        let head = repo.head().unwrap().peel_to_commit().unwrap();
        repo.branch(name, &head, false).unwrap();
        repo.set_head(&format!("refs/heads/{}", name)).unwrap();
    }

    #[test]
    fn test_open_outside_repository_fails() {
        let dir = TempDir::new().unwrap();
        let err = GitRepository::open(dir.path().join("nowhere")).err();
        assert!(err.is_some());
    }

    #[test]
    fn test_current_branch_and_changed_files() {
        let (dir, repo) = init_repo();
        let base = GitRepository::open(dir.path()).unwrap();
        let parent = base.get_current_branch().unwrap();

        checkout_new_branch(&repo, "feat/x(alpha)");
        fs::create_dir_all(dir.path().join("api/src")).unwrap();
        fs::write(dir.path().join("api/src/lib.rs"), "pub fn x() {}\n").unwrap();
        commit_all(&repo, "add api");
        fs::write(dir.path().join("notes.txt"), "untracked\n").unwrap();

        let git = GitRepository::open(dir.path()).unwrap();
        assert_eq!(git.get_current_branch().unwrap(), "feat/x(alpha)");
        let changed = git.get_changed_files(&parent).unwrap();
        assert_eq!(changed, vec!["api/src/lib.rs", "notes.txt"]);
    }

    #[test]
    fn test_changed_files_unknown_parent() {
        let (dir, _repo) = init_repo();
        let git = GitRepository::open(dir.path()).unwrap();
        let err = git.get_changed_files("no-such-branch").unwrap_err();
        assert!(matches!(err, CdToolsError::NotFound { .. }));
    }

    #[test]
    fn test_tags_matching_pattern() {
        let (dir, repo) = init_repo();
        let head = repo.head().unwrap().peel_to_commit().unwrap();
        for tag in ["1.0.1-rc.0", "api-1.0.1-rc.1", "1.0.1-alpha.3", "2.0.0-rc.0"] {
            repo.tag_lightweight(tag, head.as_object(), false).unwrap();
        }

        let git = GitRepository::open(dir.path()).unwrap();
        let mut tags = git.get_tags_matching_pattern("*1.0.1-rc.*").unwrap();
        tags.sort();
        assert_eq!(tags, vec!["1.0.1-rc.0", "api-1.0.1-rc.1"]);
    }

    #[test]
    fn test_repository_tags_feed_increment_suffix() {
        use crate::clock::ManualClock;
        use crate::config::{Config, VersioningStrategy};
        use crate::version_manager::VersionManager;
        use chrono::Utc;

        let (dir, repo) = init_repo();
        let head = repo.head().unwrap().peel_to_commit().unwrap();
        repo.tag_lightweight("1.0.1-rc.0", head.as_object(), false)
            .unwrap();

        let git = GitRepository::open(dir.path()).unwrap();
        let ops: &dyn GitOperations = &git;
        let config = Config::with_default_tags(VersioningStrategy::Fixed, vec![]);
        let clock = ManualClock::new(Utc::now());
        let vm = VersionManager::new(&config, ops, &clock);
        assert_eq!(
            vm.calculate_version_for_tag("rc", "1.0.0", None).unwrap(),
            "1.0.1-rc.1"
        );
    }
}
