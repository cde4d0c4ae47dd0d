use std::fmt;

/// Non-fatal problems met while running a release command.
/// The command carries on; the user is told what was skipped.
#[derive(Debug, Clone, PartialEq)]
pub enum ReleaseWarning {
    /// Listing existing tags failed, the build number starts over at 0
    TagLookupFailed { pattern: String, reason: String },
    /// No configured project is touched by the branch
    NoProjectChanges { parent: String },
    /// The pull request could not be merged from the command line
    MergeFailed { url: String, reason: String },
    /// The finished branch's versions have nowhere to go
    LedgerDiscarded { parent: String },
    /// A GitHub release could not be created
    ReleaseFailed { tag: String, reason: String },
}

impl fmt::Display for ReleaseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseWarning::TagLookupFailed { pattern, reason } => {
                write!(
                    f,
                    "Could not list tags matching '{}' ({}); starting the build number at 0",
                    pattern, reason
                )
            }
            ReleaseWarning::NoProjectChanges { parent } => {
                write!(f, "No project has changed since '{}'", parent)
            }
            ReleaseWarning::MergeFailed { url, reason } => {
                write!(f, "Could not merge {}: {}", url, reason)
            }
            ReleaseWarning::LedgerDiscarded { parent } => {
                write!(
                    f,
                    "'{}' is not a release branch for the next tag; \
                     recorded versions were not carried over",
                    parent
                )
            }
            ReleaseWarning::ReleaseFailed { tag, reason } => {
                write!(f, "Could not create release '{}': {}", tag, reason)
            }
        }
    }
}
