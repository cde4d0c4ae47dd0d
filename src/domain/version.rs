use crate::error::{CdToolsError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\.(\d+)\.(\d+)(?:-(.+))?$").expect("version pattern is valid")
});

/// Semantic version `major.minor.patch[-prerelease]`
///
/// The prerelease part is kept opaque; most callers expect `<tag>.<suffix>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub prerelease: Option<String>,
}

impl Version {
    /// Create a new version without prerelease
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Version {
            major,
            minor,
            patch,
            prerelease: None,
        }
    }

    /// Parse `major.minor.patch` with an optional `-prerelease` part
    pub fn parse(version: &str) -> Result<Self> {
        let caps = VERSION_RE.captures(version).ok_or_else(|| {
            CdToolsError::version_format(format!(
                "'{}' - expected major.minor.patch[-prerelease]",
                version
            ))
        })?;

        let component = |idx: usize, name: &str| -> Result<u64> {
            caps[idx].parse::<u64>().map_err(|_| {
                CdToolsError::version_format(format!(
                    "'{}' - {} component '{}' is out of range",
                    version, name, &caps[idx]
                ))
            })
        };

        Ok(Version {
            major: component(1, "major")?,
            minor: component(2, "minor")?,
            patch: component(3, "patch")?,
            prerelease: caps.get(4).map(|m| m.as_str().to_string()),
        })
    }

    /// Attach a prerelease identifier, replacing any existing one
    pub fn with_prerelease(mut self, prerelease: impl Into<String>) -> Self {
        self.prerelease = Some(prerelease.into());
        self
    }

    /// Numeric triple only
    pub fn without_prerelease(&self) -> Self {
        Version::new(self.major, self.minor, self.patch)
    }

    pub fn is_prerelease(&self) -> bool {
        self.prerelease.is_some()
    }

    /// Bump by level; the prerelease of `self` is discarded
    pub fn bump(&self, level: BumpLevel) -> Result<Self> {
        let overflow = || {
            CdToolsError::version_calculation(format!("cannot bump {} of '{}'", level, self))
        };
        let bumped = match level {
            BumpLevel::Major => Version::new(self.major.checked_add(1).ok_or_else(overflow)?, 0, 0),
            BumpLevel::Minor => Version::new(
                self.major,
                self.minor.checked_add(1).ok_or_else(overflow)?,
                0,
            ),
            BumpLevel::Patch => Version::new(
                self.major,
                self.minor,
                self.patch.checked_add(1).ok_or_else(overflow)?,
            ),
        };
        Ok(bumped)
    }
}

impl FromStr for Version {
    type Err = CdToolsError;

    fn from_str(s: &str) -> Result<Self> {
        Version::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.prerelease {
            write!(f, "-{}", pre)?;
        }
        Ok(())
    }
}

/// Semver component to increment, ordered `Patch < Minor < Major`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BumpLevel {
    Patch,
    Minor,
    Major,
}

impl BumpLevel {
    pub const ALL: [BumpLevel; 3] = [BumpLevel::Patch, BumpLevel::Minor, BumpLevel::Major];

    pub fn as_str(&self) -> &'static str {
        match self {
            BumpLevel::Patch => "patch",
            BumpLevel::Minor => "minor",
            BumpLevel::Major => "major",
        }
    }
}

impl fmt::Display for BumpLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BumpLevel {
    type Err = CdToolsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "patch" => Ok(BumpLevel::Patch),
            "minor" => Ok(BumpLevel::Minor),
            "major" => Ok(BumpLevel::Major),
            other => Err(CdToolsError::validation(format!(
                "unknown bump level '{}'",
                other
            ))),
        }
    }
}

/// Which bump level separates `candidate` from `base`.
///
/// The candidate's prerelease is ignored. Components are checked in the
/// order major, minor, patch and the first one where the candidate is
/// greater wins; `None` when no component is greater.
pub fn compare_bump_level(base: &str, candidate: &str) -> Result<Option<BumpLevel>> {
    let base = Version::parse(base)?;
    let candidate = Version::parse(candidate)?.without_prerelease();

    let level = if candidate.major > base.major {
        Some(BumpLevel::Major)
    } else if candidate.minor > base.minor {
        Some(BumpLevel::Minor)
    } else if candidate.patch > base.patch {
        Some(BumpLevel::Patch)
    } else {
        None
    };
    Ok(level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_parse() {
        let v = Version::parse("1.2.3").unwrap();
        assert_eq!(v, Version::new(1, 2, 3));
        assert!(!v.is_prerelease());
    }

    #[test]
    fn test_version_parse_prerelease() {
        let v = Version::parse("1.2.3-alpha.20240102030405").unwrap();
        assert_eq!(v.without_prerelease(), Version::new(1, 2, 3));
        assert_eq!(v.prerelease.as_deref(), Some("alpha.20240102030405"));
    }

    #[test]
    fn test_version_parse_invalid() {
        for bad in ["1.2", "v1.2.3", "1.2.3.4", "1.2.3-", "a.b.c", "", " 1.2.3"] {
            let err = Version::parse(bad).unwrap_err();
            assert!(
                matches!(err, CdToolsError::VersionFormat(_)),
                "expected VersionFormat for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_version_parse_overflow() {
        assert!(Version::parse("99999999999999999999999.0.0").is_err());
    }

    #[test]
    fn test_version_display_roundtrip() {
        for s in ["0.0.0", "1.2.3", "10.20.30-rc.4", "2.0.0-beta.20251231235959"] {
            assert_eq!(Version::parse(s).unwrap().to_string(), s);
        }
    }

    #[test]
    fn test_version_bump_levels() {
        let v = Version::parse("1.2.3-rc.1").unwrap();
        assert_eq!(v.bump(BumpLevel::Major).unwrap(), Version::new(2, 0, 0));
        assert_eq!(v.bump(BumpLevel::Minor).unwrap(), Version::new(1, 3, 0));
        assert_eq!(v.bump(BumpLevel::Patch).unwrap(), Version::new(1, 2, 4));
    }

    #[test]
    fn test_version_bump_chain() {
        let v = Version::parse("1.0.0")
            .unwrap()
            .bump(BumpLevel::Major)
            .unwrap()
            .bump(BumpLevel::Minor)
            .unwrap()
            .bump(BumpLevel::Patch)
            .unwrap();
        assert_eq!(v.to_string(), "2.1.1");
    }

    #[test]
    fn test_version_bump_overflow() {
        let v = Version::new(1, 2, u64::MAX);
        let err = v.bump(BumpLevel::Patch).unwrap_err();
        assert!(matches!(err, CdToolsError::VersionCalculation(_)));
    }

    #[test]
    fn test_bump_level_ordering() {
        assert!(BumpLevel::Patch < BumpLevel::Minor);
        assert!(BumpLevel::Minor < BumpLevel::Major);
        assert_eq!("minor".parse::<BumpLevel>().unwrap(), BumpLevel::Minor);
        assert!("huge".parse::<BumpLevel>().is_err());
    }

    #[test]
    fn test_compare_bump_level() {
        assert_eq!(compare_bump_level("1.0.0", "1.0.0").unwrap(), None);
        assert_eq!(
            compare_bump_level("1.0.0", "1.1.0").unwrap(),
            Some(BumpLevel::Minor)
        );
        assert_eq!(
            compare_bump_level("1.0.0", "2.0.0-rc.3").unwrap(),
            Some(BumpLevel::Major)
        );
        assert_eq!(
            compare_bump_level("1.0.0", "1.0.1-alpha.0").unwrap(),
            Some(BumpLevel::Patch)
        );
        assert_eq!(compare_bump_level("1.2.3", "1.2.0").unwrap(), None);
    }

    #[test]
    fn test_compare_bump_level_rejects_garbage() {
        assert!(compare_bump_level("1.0", "1.0.0").is_err());
        assert!(compare_bump_level("1.0.0", "next").is_err());
    }
}
