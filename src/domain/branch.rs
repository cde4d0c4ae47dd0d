use crate::error::{CdToolsError, Result};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static RELEASE_BRANCH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+)\(([^)]+)\)$").expect("branch pattern is valid"));

const PATH_UNSAFE: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// A release branch named `<slug>(<tag>)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseBranch {
    pub branch_name: String,
    pub tag: String,
}

impl ReleaseBranch {
    pub fn new(branch_name: impl Into<String>, tag: impl Into<String>) -> Self {
        ReleaseBranch {
            branch_name: branch_name.into(),
            tag: tag.into(),
        }
    }

    /// Split `feat/foo(alpha)` into slug and tag
    pub fn parse(name: &str) -> Result<Self> {
        let caps = RELEASE_BRANCH_RE.captures(name).ok_or_else(|| {
            CdToolsError::not_found_with_hint(
                format!(
                    "Branch '{}' is not a release branch (expected '<name>(<tag>)')",
                    name
                ),
                "Run `cdtools start-pr` to create a release branch",
            )
        })?;
        Ok(ReleaseBranch::new(&caps[1], &caps[2]))
    }

    /// True if `name` could be used as the slug of a release branch
    pub fn is_valid_slug(name: &str) -> bool {
        !name.trim().is_empty() && !name.contains('(') && !name.contains(')')
    }

    /// `<tag>-<escaped slug>.json`
    pub fn info_file_name(&self) -> String {
        format!("{}-{}.json", self.tag, escape_slug(&self.branch_name))
    }
}

impl fmt::Display for ReleaseBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.branch_name, self.tag)
    }
}

/// Replace characters that are unsafe in file names with `_`
pub fn escape_slug(slug: &str) -> String {
    slug.chars()
        .map(|c| if PATH_UNSAFE.contains(&c) { '_' } else { c })
        .collect()
}
