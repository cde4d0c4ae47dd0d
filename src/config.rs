use crate::domain::{SuffixStrategy, Version};
use crate::error::{CdToolsError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory holding every piece of cdtools state, relative to the repository root
pub const STATE_DIR: &str = ".cdtools";
pub const CONFIG_FILE: &str = "config.json";

/// Reserved terminal tag. Always available, never suffixed.
pub const STABLE_TAG: &str = "stable";

pub fn is_stable(tag: &str) -> bool {
    tag == STABLE_TAG
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(STATE_DIR).join(CONFIG_FILE)
}

/// Release policy for the whole repository, stored in `.cdtools/config.json`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub versioning_strategy: VersioningStrategy,

    #[serde(default)]
    pub version_tags: Vec<VersionTagRecord>,

    #[serde(default)]
    pub projects: Vec<Project>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_notes: Option<ReleaseNotesConfig>,

    #[serde(default, skip_serializing_if = "DependentBump::is_default")]
    pub dependent_bump: DependentBump,
}

/// One `{ "<tag>": { ... } }` entry of `versionTags`
pub type VersionTagRecord = BTreeMap<String, VersionTagConfig>;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VersioningStrategy {
    /// One bump decision shared by every project
    Fixed,
    /// One bump decision per project
    Independent,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VersionTagConfig {
    pub version_suffix_strategy: SuffixStrategy,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

impl VersionTagConfig {
    pub fn new(strategy: SuffixStrategy, next: Option<&str>) -> Self {
        VersionTagConfig {
            version_suffix_strategy: strategy,
            next: next.map(str::to_string),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    Typescript,
    Rust,
}

impl ProjectType {
    pub fn manifest_file(&self) -> &'static str {
        match self {
            ProjectType::Typescript => "package.json",
            ProjectType::Rust => "Cargo.toml",
        }
    }

    pub fn default_registry(&self) -> &'static str {
        match self {
            ProjectType::Typescript => "npm",
            ProjectType::Rust => "crates.io",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub path: String,

    #[serde(rename = "type")]
    pub project_type: ProjectType,

    /// Last stable release of this project
    pub base_version: String,

    /// Files whose changes also bump this project
    #[serde(default)]
    pub deps: Vec<String>,

    #[serde(default)]
    pub registries: Vec<String>,
}

impl Project {
    /// Whether `file` (repository relative, `/` separated) lives in this project
    pub fn owns_file(&self, file: &str) -> bool {
        path_contains(&self.path, file)
    }

    /// Whether `file` is one of this project's dependency paths
    pub fn depends_on_file(&self, file: &str) -> bool {
        self.deps.iter().any(|dep| path_contains(dep, file))
    }

    /// Directory name used to prefix release tags, `None` for the repository root
    pub fn dir_name(&self) -> Option<&str> {
        normalize(&self.path)
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty() && *name != ".")
    }
}

/// GitHub release creation when a release branch is finalised
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseNotesConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Release body; `{project}`, `{version}` and `{tag}` are substituted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

pub const DEFAULT_RELEASE_NOTES_TEMPLATE: &str = "Release {project} {version}";

impl ReleaseNotesConfig {
    pub fn render(&self, project: &str, version: &str, tag: &str) -> String {
        self.template
            .as_deref()
            .unwrap_or(DEFAULT_RELEASE_NOTES_TEMPLATE)
            .replace("{project}", project)
            .replace("{version}", version)
            .replace("{tag}", tag)
    }
}

/// What happens to a project that only has dependency changes and no explicit choice
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DependentBump {
    #[default]
    Patch,
    Skip,
}

impl DependentBump {
    fn is_default(&self) -> bool {
        *self == DependentBump::default()
    }
}

impl Config {
    /// Config created by `init` when the user keeps the default tag chain
    pub fn with_default_tags(strategy: VersioningStrategy, projects: Vec<Project>) -> Self {
        Config {
            versioning_strategy: strategy,
            version_tags: vec![
                BTreeMap::from([(
                    "alpha".to_string(),
                    VersionTagConfig::new(SuffixStrategy::Timestamp, Some("rc")),
                )]),
                BTreeMap::from([(
                    "rc".to_string(),
                    VersionTagConfig::new(SuffixStrategy::Increment, Some(STABLE_TAG)),
                )]),
            ],
            projects,
            release_notes: None,
            dependent_bump: DependentBump::default(),
        }
    }

    /// Configured tag names in declaration order
    pub fn tag_names(&self) -> Vec<String> {
        self.version_tags
            .iter()
            .flat_map(|record| record.keys().cloned())
            .collect()
    }

    /// Tags a release branch can be started for: the configured ones, then
    /// `stable` unless it is configured already
    pub fn release_tags(&self) -> Vec<String> {
        let mut tags = self.tag_names();
        if !tags.iter().any(|t| is_stable(t)) {
            tags.push(STABLE_TAG.to_string());
        }
        tags
    }

    /// Look a tag up; `stable` is synthesised when not configured
    pub fn resolve_tag_config(&self, tag: &str) -> Option<VersionTagConfig> {
        self.version_tags
            .iter()
            .find_map(|record| record.get(tag).cloned())
            .or_else(|| {
                is_stable(tag).then(|| VersionTagConfig::new(SuffixStrategy::Increment, None))
            })
    }

    pub fn project(&self, path: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.path == path)
    }

    pub fn project_mut(&mut self, path: &str) -> Option<&mut Project> {
        self.projects.iter_mut().find(|p| p.path == path)
    }

    /// Structural checks applied on every load
    pub fn validate(&self) -> Result<()> {
        let mut tags = HashSet::new();
        for (idx, record) in self.version_tags.iter().enumerate() {
            if record.len() != 1 {
                return Err(CdToolsError::validation(format!(
                    "versionTags[{}] must have exactly one key, found {}",
                    idx,
                    record.len()
                )));
            }
            for (name, tag_config) in record {
                if name.is_empty() || name.contains('(') || name.contains(')') {
                    return Err(CdToolsError::validation(format!(
                        "invalid tag name '{}'",
                        name
                    )));
                }
                if is_stable(name) && tag_config.next.is_some() {
                    return Err(CdToolsError::validation(format!(
                        "'{}' is the last tag and cannot have a next tag",
                        STABLE_TAG
                    )));
                }
                if !tags.insert(name.as_str()) {
                    return Err(CdToolsError::validation(format!(
                        "tag '{}' is configured twice",
                        name
                    )));
                }
            }
        }

        for record in &self.version_tags {
            for (name, tag_config) in record {
                if let Some(next) = &tag_config.next {
                    if !is_stable(next) && !tags.contains(next.as_str()) {
                        return Err(CdToolsError::validation(format!(
                            "tag '{}' points to unknown next tag '{}'",
                            name, next
                        )));
                    }
                }
            }
        }
        self.check_tag_cycles()?;

        let mut paths = HashSet::new();
        for project in &self.projects {
            if !paths.insert(normalize(&project.path)) {
                return Err(CdToolsError::validation(format!(
                    "project '{}' is configured twice",
                    project.path
                )));
            }
            Version::parse(&project.base_version).map_err(|e| {
                CdToolsError::validation(format!(
                    "project '{}' has an invalid baseVersion: {}",
                    project.path, e
                ))
            })?;
        }
        Ok(())
    }

    fn check_tag_cycles(&self) -> Result<()> {
        for start in self.tag_names() {
            let mut seen = vec![start.clone()];
            let mut current = start;
            while let Some(next) = self.resolve_tag_config(&current).and_then(|c| c.next) {
                if seen.contains(&next) {
                    seen.push(next);
                    return Err(CdToolsError::validation(format!(
                        "version tag chain contains a cycle: {}",
                        seen.join(" -> ")
                    )));
                }
                seen.push(next.clone());
                current = next;
            }
        }
        Ok(())
    }
}

/// Load and validate `.cdtools/config.json` under `root`
pub fn load_config(root: &Path) -> Result<Config> {
    let path = config_path(root);
    if !path.exists() {
        return Err(CdToolsError::not_found_with_hint(
            format!("Config not found at {}", path.display()),
            "Run `cdtools init` first",
        ));
    }

    let content = fs::read_to_string(&path)?;
    let config: Config = serde_json::from_str(&content).map_err(|e| {
        CdToolsError::validation(format!("{} is not a valid config: {}", path.display(), e))
    })?;
    config.validate()?;
    log::debug!("loaded config from {}", path.display());
    Ok(config)
}

/// Persist the config as tab indented JSON with a trailing newline
pub fn save_config(root: &Path, config: &Config) -> Result<()> {
    let path = config_path(root);
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(&path, to_pretty_json(config)?)?;
    log::debug!("wrote config to {}", path.display());
    Ok(())
}

pub(crate) fn to_pretty_json<T: Serialize>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    let mut json = String::from_utf8_lossy(&buf).into_owned();
    json.push('\n');
    Ok(json)
}

fn normalize(path: &str) -> &str {
    let trimmed = path.trim_start_matches("./").trim_end_matches('/');
    if trimmed.is_empty() {
        "."
    } else {
        trimmed
    }
}

/// `dir` equals `file` or is one of its parent directories; `.` contains everything
fn path_contains(dir: &str, file: &str) -> bool {
    let dir = normalize(dir);
    let file = normalize(file);
    if dir == "." {
        return true;
    }
    file == dir
        || file
            .strip_prefix(dir)
            .is_some_and(|rest| rest.starts_with('/'))
}
