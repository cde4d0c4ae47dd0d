//! Version calculation over the configured tag graph
//!
//! Combines the version algebra, the suffix strategies and the release
//! configuration into the answers the commands need: the version for a tag,
//! the version after moving to the next tag, and the per-project version for
//! a selected bump level.

use crate::clock::Clock;
use crate::config::{is_stable, Config, VersionTagConfig};
use crate::domain::suffix::compute_suffixed_version;
use crate::domain::{compare_bump_level, BumpLevel, Version};
use crate::error::{CdToolsError, Result};
use crate::git::GitOperations;
use crate::ui::{display_release_warning, ReleaseWarning};

pub struct VersionManager<'a> {
    config: &'a Config,
    git: &'a dyn GitOperations,
    clock: &'a dyn Clock,
}

impl<'a> VersionManager<'a> {
    pub fn new(config: &'a Config, git: &'a dyn GitOperations, clock: &'a dyn Clock) -> Self {
        VersionManager { config, git, clock }
    }

    /// Tag configuration, or a `VersionManager` error naming the tag
    pub fn tag_config(&self, tag: &str) -> Result<VersionTagConfig> {
        self.config
            .resolve_tag_config(tag)
            .ok_or_else(|| CdToolsError::version_manager(format!("Unknown version tag '{}'", tag)))
    }

    pub fn is_valid_tag(&self, tag: &str) -> bool {
        self.config.resolve_tag_config(tag).is_some()
    }

    pub fn is_valid_version(version: &str) -> bool {
        Version::parse(version).is_ok()
    }

    /// Version for `tag` starting from `base_version`.
    ///
    /// Stable bumps the patch and carries no suffix. Any other tag suffixes the
    /// patch-bumped base, unless `current_version` already belongs to the same
    /// tag, in which case its numeric part is kept and only the suffix moves.
    pub fn calculate_version_for_tag(
        &self,
        tag: &str,
        base_version: &str,
        current_version: Option<&str>,
    ) -> Result<String> {
        let tag_config = self.tag_config(tag)?;
        let base = Version::parse(base_version)?;

        if is_stable(tag) {
            return Ok(base.bump(BumpLevel::Patch)?.to_string());
        }

        let numeric = match current_version.map(Version::parse).transpose()? {
            Some(current) if belongs_to_tag(&current, tag) => current.without_prerelease(),
            _ => base.bump(BumpLevel::Patch)?,
        };
        Ok(self.suffixed(&numeric, tag, &tag_config))
    }

    /// Version after leaving `current_tag` for its `next` tag.
    ///
    /// Without `next` the tag stays put and only the suffix is refreshed.
    /// Moving to stable strips the prerelease. Moving to another tag keeps the
    /// numeric part and starts that tag's suffix fresh.
    pub fn calculate_next_tag_version(
        &self,
        current_tag: &str,
        base_version: &str,
        current_version: Option<&str>,
    ) -> Result<String> {
        let Some(next) = self.tag_config(current_tag)?.next else {
            return self.calculate_version_for_tag(current_tag, base_version, current_version);
        };
        let next_config = self.tag_config(&next)?;

        let numeric = match current_version {
            Some(current) => Version::parse(current)?.without_prerelease(),
            None => Version::parse(base_version)?.bump(BumpLevel::Patch)?,
        };

        if is_stable(&next) {
            return Ok(numeric.to_string());
        }
        Ok(self.suffixed(&numeric, &next, &next_config))
    }

    /// Version for one project on a push.
    ///
    /// A level already reached in this cycle (the recorded version is at
    /// least that far above the project's base) is not applied twice: the
    /// recorded numeric part is reused and only the suffix is recomputed.
    pub fn calculate_project_version(
        &self,
        base_version: &str,
        level: BumpLevel,
        target_tag: &str,
        current_version: Option<&str>,
    ) -> Result<String> {
        let tag_config = self.tag_config(target_tag)?;
        let base = Version::parse(base_version)?;

        if is_stable(target_tag) {
            return Ok(base.bump(level)?.to_string());
        }

        let reached = current_version
            .map(|current| compare_bump_level(base_version, current))
            .transpose()?
            .flatten();
        let already_released = reached.is_some_and(|reached| reached >= level);

        let numeric = match current_version {
            Some(current) if already_released => Version::parse(current)?.without_prerelease(),
            _ => base.bump(level)?,
        };
        log::debug!(
            "{} bump of {} (recorded {:?}, already released: {}) -> {}",
            level,
            base_version,
            current_version,
            already_released,
            numeric
        );
        Ok(self.suffixed(&numeric, target_tag, &tag_config))
    }

    fn suffixed(&self, numeric: &Version, tag: &str, tag_config: &VersionTagConfig) -> String {
        let base = numeric.to_string();
        compute_suffixed_version(
            &base,
            tag,
            tag_config.version_suffix_strategy,
            self.clock.now(),
            // a failed lookup is the one external failure that is not fatal
            |pattern| {
                self.git
                    .get_tags_matching_pattern(pattern)
                    .unwrap_or_else(|e| {
                        display_release_warning(&ReleaseWarning::TagLookupFailed {
                            pattern: pattern.to_string(),
                            reason: e.to_string(),
                        });
                        Vec::new()
                    })
            },
        )
    }
}

fn belongs_to_tag(version: &Version, tag: &str) -> bool {
    version
        .prerelease
        .as_deref()
        .and_then(|pre| pre.strip_prefix(tag))
        .is_some_and(|rest| rest.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::VersioningStrategy;
    use crate::git::MockGit;
    use chrono::{TimeZone, Utc};

    fn setup() -> (Config, MockGit, ManualClock) {
        let config = Config::with_default_tags(VersioningStrategy::Fixed, vec![]);
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 4, 5, 6, 7).unwrap());
        (config, MockGit::default(), clock)
    }

    #[test]
    fn test_unknown_tag_is_named_error() {
        let (config, git, clock) = setup();
        let vm = VersionManager::new(&config, &git, &clock);

        for result in [
            vm.tag_config("beta").map(|_| String::new()),
            vm.calculate_version_for_tag("beta", "1.0.0", None),
            vm.calculate_next_tag_version("beta", "1.0.0", None),
            vm.calculate_project_version("1.0.0", BumpLevel::Patch, "beta", None),
        ] {
            let err = result.unwrap_err();
            assert!(matches!(err, CdToolsError::VersionManager(_)));
            assert!(err.to_string().contains("'beta'"));
        }
        assert!(!vm.is_valid_tag("beta"));
        assert!(vm.is_valid_tag("stable"));
    }

    #[test]
    fn test_version_for_stable_has_no_suffix() {
        let (config, git, clock) = setup();
        let vm = VersionManager::new(&config, &git, &clock);
        assert_eq!(vm.calculate_version_for_tag("stable", "1.4.2", None).unwrap(), "1.4.3");
    }

    #[test]
    fn test_version_for_tag_timestamp() {
        let (config, git, clock) = setup();
        let vm = VersionManager::new(&config, &git, &clock);
        assert_eq!(
            vm.calculate_version_for_tag("alpha", "1.0.0", None).unwrap(),
            "1.0.1-alpha.20240304050607"
        );
    }

    #[test]
    fn test_version_for_tag_reuses_in_cycle_base() {
        let (config, git, clock) = setup();
        git.add_tag("1.3.0-rc.0");
        let vm = VersionManager::new(&config, &git, &clock);
        assert_eq!(
            vm.calculate_version_for_tag("rc", "1.2.0", Some("1.3.0-rc.0")).unwrap(),
            "1.3.0-rc.1"
        );
        // a version from another tag does not count as in-cycle
        assert_eq!(
            vm.calculate_version_for_tag("rc", "1.2.0", Some("1.3.0-alpha.5")).unwrap(),
            "1.2.1-rc.0"
        );
    }

    #[test]
    fn test_next_tag_to_stable_strips_prerelease() {
        let (config, git, clock) = setup();
        let vm = VersionManager::new(&config, &git, &clock);
        assert_eq!(
            vm.calculate_next_tag_version("rc", "1.0.0", Some("1.1.0-rc.3")).unwrap(),
            "1.1.0"
        );
        assert_eq!(vm.calculate_next_tag_version("rc", "1.0.0", None).unwrap(), "1.0.1");
    }

    #[test]
    fn test_next_tag_starts_fresh_suffix() {
        let (config, git, clock) = setup();
        git.add_tag("1.0.1-rc.0");
        git.add_tag("1.1.0-rc.7");
        let vm = VersionManager::new(&config, &git, &clock);
        assert_eq!(
            vm.calculate_next_tag_version("alpha", "1.0.0", Some("1.1.0-alpha.20240101000000"))
                .unwrap(),
            "1.1.0-rc.8"
        );
        assert_eq!(
            vm.calculate_next_tag_version("alpha", "2.0.0", Some("2.0.1-alpha.1")).unwrap(),
            "2.0.1-rc.0"
        );
    }

    #[test]
    fn test_next_tag_without_next_stays_on_tag() {
        let (mut config, git, clock) = setup();
        config.version_tags[0].get_mut("alpha").unwrap().next = None;
        let vm = VersionManager::new(&config, &git, &clock);
        let first = vm
            .calculate_next_tag_version("alpha", "1.0.0", Some("1.0.1-alpha.20240101000000"))
            .unwrap();
        assert_eq!(first, "1.0.1-alpha.20240304050607");
    }

    #[test]
    fn test_project_version_not_yet_released() {
        let (config, git, clock) = setup();
        let vm = VersionManager::new(&config, &git, &clock);
        assert_eq!(
            vm.calculate_project_version("1.0.0", BumpLevel::Minor, "rc", None).unwrap(),
            "1.1.0-rc.0"
        );
    }

    #[test]
    fn test_project_version_already_released_keeps_numeric_base() {
        let (config, git, clock) = setup();
        let vm = VersionManager::new(&config, &git, &clock);
        let first = vm
            .calculate_project_version("1.0.0", BumpLevel::Patch, "alpha", None)
            .unwrap();
        assert_eq!(first, "1.0.1-alpha.20240304050607");

        clock.advance_secs(5);
        let second = vm
            .calculate_project_version("1.0.0", BumpLevel::Patch, "alpha", Some(&first))
            .unwrap();
        assert_eq!(second, "1.0.1-alpha.20240304050612");

        // a minor bump recorded earlier satisfies a later patch request
        let third = vm
            .calculate_project_version("1.0.0", BumpLevel::Patch, "alpha", Some("1.1.0-alpha.1"))
            .unwrap();
        assert_eq!(third, "1.1.0-alpha.20240304050612");
    }

    #[test]
    fn test_project_version_escalation_bumps_from_base() {
        let (config, git, clock) = setup();
        let vm = VersionManager::new(&config, &git, &clock);
        assert_eq!(
            vm.calculate_project_version("1.0.0", BumpLevel::Major, "rc", Some("1.0.1-rc.2"))
                .unwrap(),
            "2.0.0-rc.0"
        );
    }

    #[test]
    fn test_project_version_stable_target() {
        let (config, git, clock) = setup();
        let vm = VersionManager::new(&config, &git, &clock);
        assert_eq!(
            vm.calculate_project_version("1.0.0", BumpLevel::Minor, "stable", Some("1.1.0-rc.2"))
                .unwrap(),
            "1.1.0"
        );
    }

    #[test]
    fn test_increment_lookup_failure_starts_at_zero() {
        let (config, git, clock) = setup();
        git.add_tag("1.0.1-rc.4");
        git.fail_tag_lookup();
        let vm = VersionManager::new(&config, &git, &clock);
        assert_eq!(
            vm.calculate_project_version("1.0.0", BumpLevel::Patch, "rc", None).unwrap(),
            "1.0.1-rc.0"
        );
    }

    #[test]
    fn test_belongs_to_tag() {
        let v = Version::parse("1.0.0-rc.1").unwrap();
        assert!(belongs_to_tag(&v, "rc"));
        assert!(!belongs_to_tag(&v, "r"));
        assert!(!belongs_to_tag(&Version::new(1, 0, 0), "rc"));
    }
}
