use thiserror::Error;

/// Unified error type for cdtools operations
#[derive(Error, Debug)]
pub enum CdToolsError {
    /// Expected file or state is absent (config, branch info, pull request)
    #[error("{message}")]
    NotFound {
        message: String,
        hint: Option<&'static str>,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid version format: {0}")]
    VersionFormat(String),

    #[error("Version calculation error: {0}")]
    VersionCalculation(String),

    #[error("Version manager error: {0}")]
    VersionManager(String),

    #[error("Git command failed: `{command}`: {message}")]
    Git { command: String, message: String },

    #[error("Git repository error: {0}")]
    Repository(#[from] git2::Error),

    #[error("GitHub CLI command failed: `{command}`: {message}")]
    Forge { command: String, message: String },

    #[error("Prompt failed: {0}")]
    Prompt(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Convenience type alias for Results in cdtools
pub type Result<T> = std::result::Result<T, CdToolsError>;

impl CdToolsError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        CdToolsError::NotFound {
            message: msg.into(),
            hint: None,
        }
    }

    /// Create a not-found error carrying a remediation hint for the user
    pub fn not_found_with_hint(msg: impl Into<String>, hint: &'static str) -> Self {
        CdToolsError::NotFound {
            message: msg.into(),
            hint: Some(hint),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        CdToolsError::Validation(msg.into())
    }

    pub fn version_format(msg: impl Into<String>) -> Self {
        CdToolsError::VersionFormat(msg.into())
    }

    pub fn version_calculation(msg: impl Into<String>) -> Self {
        CdToolsError::VersionCalculation(msg.into())
    }

    pub fn version_manager(msg: impl Into<String>) -> Self {
        CdToolsError::VersionManager(msg.into())
    }

    pub fn git(command: impl Into<String>, msg: impl Into<String>) -> Self {
        CdToolsError::Git {
            command: command.into(),
            message: msg.into(),
        }
    }

    pub fn forge(command: impl Into<String>, msg: impl Into<String>) -> Self {
        CdToolsError::Forge {
            command: command.into(),
            message: msg.into(),
        }
    }

    pub fn prompt(msg: impl Into<String>) -> Self {
        CdToolsError::Prompt(msg.into())
    }

    /// Remediation hint shown below the error message, if any
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            CdToolsError::NotFound { hint, .. } => *hint,
            CdToolsError::Validation(_) => {
                Some("Fix .cdtools/config.json or re-run `cdtools init`")
            }
            CdToolsError::Forge { .. } => {
                Some("Make sure the GitHub CLI is installed and `gh auth status` succeeds")
            }
            _ => None,
        }
    }

    /// True when the failure came from the `gh` collaborator
    pub fn is_forge(&self) -> bool {
        matches!(self, CdToolsError::Forge { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CdToolsError::validation("versionTags[0] must have exactly one key");
        assert_eq!(
            err.to_string(),
            "Validation error: versionTags[0] must have exactly one key"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CdToolsError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_not_found_keeps_hint() {
        let err = CdToolsError::not_found_with_hint("Config not found", "Run `cdtools init` first");
        assert_eq!(err.to_string(), "Config not found");
        assert_eq!(err.hint(), Some("Run `cdtools init` first"));

        let bare = CdToolsError::not_found("Pull request not found");
        assert_eq!(bare.hint(), None);
    }

    #[test]
    fn test_command_errors_include_command_line() {
        let err = CdToolsError::git("git push -u origin feat(alpha)", "rejected");
        assert!(err.to_string().contains("git push -u origin feat(alpha)"));
        assert!(!err.is_forge());

        let err = CdToolsError::forge("gh pr merge --squash", "not mergeable");
        assert!(err.to_string().contains("gh pr merge --squash"));
        assert!(err.is_forge());
    }

    #[test]
    fn test_error_messages_are_descriptive() {
        let error_pairs = vec![
            (CdToolsError::validation("x"), "Validation error"),
            (CdToolsError::version_format("x"), "Invalid version format"),
            (CdToolsError::version_calculation("x"), "Version calculation error"),
            (CdToolsError::version_manager("x"), "Version manager error"),
            (CdToolsError::prompt("x"), "Prompt failed"),
        ];

        for (err, expected_prefix) in error_pairs {
            let msg = err.to_string();
            assert!(
                msg.starts_with(expected_prefix),
                "Error message should start with '{}', but got '{}'",
                expected_prefix,
                msg
            );
        }
    }
}
