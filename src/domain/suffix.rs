//! Prerelease suffix generation
//!
//! A suffixed version looks like `<base>-<tag>.<suffix>` where the suffix is
//! either a 14 digit UTC timestamp or the next free build number found among
//! existing release tags.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the numeric part of a prerelease identifier is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuffixStrategy {
    Timestamp,
    Increment,
}

impl fmt::Display for SuffixStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuffixStrategy::Timestamp => write!(f, "timestamp"),
            SuffixStrategy::Increment => write!(f, "increment"),
        }
    }
}

/// `YYYYMMDDhhmmss` in UTC
pub fn timestamp_suffix(now: DateTime<Utc>) -> String {
    now.format("%Y%m%d%H%M%S").to_string()
}

/// Next unused build number for `<base_version>-<tag>.<N>` among `existing_tags`.
///
/// Tags may carry any `<prefix>-` in front of the version. Returns 0 when no
/// tag matches; non-numeric suffixes never match.
pub fn next_increment(existing_tags: &[String], base_version: &str, tag: &str) -> u64 {
    let pattern = format!(
        r"^(?:.+-)?{}-{}\.(\d+)$",
        regex::escape(base_version),
        regex::escape(tag)
    );
    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(e) => {
            log::warn!("could not build tag pattern {}: {}", pattern, e);
            return 0;
        }
    };

    existing_tags
        .iter()
        .filter_map(|t| re.captures(t))
        .filter_map(|caps| caps[1].parse::<u64>().ok())
        .max()
        .map_or(0, |max| max.saturating_add(1))
}

/// Glob handed to the tag listing for the increment scan
pub fn increment_tag_glob(base_version: &str, tag: &str) -> String {
    format!("*{}-{}.*", base_version, tag)
}

/// Build `<base_version>-<tag>.<suffix>`.
///
/// `existing_tags` lists the tags matching a glob and is only called for the
/// increment strategy.
pub fn compute_suffixed_version<F>(
    base_version: &str,
    tag: &str,
    strategy: SuffixStrategy,
    now: DateTime<Utc>,
    existing_tags: F,
) -> String
where
    F: FnOnce(&str) -> Vec<String>,
{
    let suffix = match strategy {
        SuffixStrategy::Timestamp => timestamp_suffix(now),
        SuffixStrategy::Increment => {
            let tags = existing_tags(&increment_tag_glob(base_version, tag));
            next_increment(&tags, base_version, tag).to_string()
        }
    };
    log::debug!("suffix for {}-{} ({}): {}", base_version, tag, strategy, suffix);
    format!("{}-{}.{}", base_version, tag, suffix)
}
