//! `cdtools init`
//!
//! Prompts, in order:
//! 1. overwrite confirmation, only when a config already exists
//! 2. versioning strategy
//! 3. project paths, comma separated
//! 4. project type, only for a path with neither `Cargo.toml` nor `package.json`
//! 5. whether to keep the default tag chain
//! 6. custom tag names and one suffix strategy per tag, when the default is declined

use crate::commands::CommandContext;
use crate::config::{
    config_path, save_config, Config, Project, ProjectType, VersionTagConfig, VersionTagRecord,
    VersioningStrategy, STABLE_TAG,
};
use crate::domain::{SuffixStrategy, Version};
use crate::error::{CdToolsError, Result};
use crate::manifest;
use crate::ui::{display_status, display_success};
use std::collections::BTreeMap;

const DEFAULT_BASE_VERSION: &str = "0.0.0";

pub fn run(ctx: &CommandContext<'_>) -> Result<()> {
    let path = config_path(&ctx.root);
    if path.exists()
        && !ctx
            .prompter
            .confirm("A cdtools config already exists. Overwrite it?", false)?
    {
        display_status("Keeping the existing config");
        return Ok(());
    }

    let strategies = vec!["fixed".to_string(), "independent".to_string()];
    let strategy = match ctx.prompter.select("Versioning strategy", &strategies, 0)? {
        0 => VersioningStrategy::Fixed,
        _ => VersioningStrategy::Independent,
    };

    let paths = ctx
        .prompter
        .input("Project paths (comma separated)", Some("."))?;
    let projects = split_list(&paths)
        .into_iter()
        .map(|p| detect_project(ctx, &p))
        .collect::<Result<Vec<_>>>()?;
    if projects.is_empty() {
        return Err(CdToolsError::validation("at least one project path is required"));
    }

    let mut config = Config::with_default_tags(strategy, projects);
    if !ctx
        .prompter
        .confirm("Use the default tag chain (alpha -> rc -> stable)?", true)?
    {
        config.version_tags = prompt_tag_chain(ctx)?;
    }
    config.validate()?;
    save_config(&ctx.root, &config)?;

    let chain = config
        .tag_names()
        .into_iter()
        .chain(std::iter::once(STABLE_TAG.to_string()))
        .collect::<Vec<_>>()
        .join(" -> ");
    for p in &config.projects {
        display_status(&format!(
            "{} ({}, base {})",
            p.path,
            p.project_type.manifest_file(),
            p.base_version
        ));
    }
    display_success(&format!("Wrote {} (tags: {})", path.display(), chain));
    Ok(())
}

fn detect_project(ctx: &CommandContext<'_>, path: &str) -> Result<Project> {
    let dir = ctx.root.join(path);
    let project_type = if dir.join(ProjectType::Rust.manifest_file()).exists() {
        ProjectType::Rust
    } else if dir.join(ProjectType::Typescript.manifest_file()).exists() {
        ProjectType::Typescript
    } else {
        let types = vec!["typescript".to_string(), "rust".to_string()];
        match ctx
            .prompter
            .select(&format!("Project type for '{}'", path), &types, 0)?
        {
            0 => ProjectType::Typescript,
            _ => ProjectType::Rust,
        }
    };

    let base_version = match manifest::read_version(&dir, project_type)? {
        Some(v) => match Version::parse(&v) {
            Ok(version) => version.without_prerelease().to_string(),
            Err(e) => {
                log::warn!("ignoring manifest version of {}: {}", path, e);
                DEFAULT_BASE_VERSION.to_string()
            }
        },
        None => DEFAULT_BASE_VERSION.to_string(),
    };

    Ok(Project {
        path: path.to_string(),
        project_type,
        base_version,
        deps: Vec::new(),
        registries: vec![project_type.default_registry().to_string()],
    })
}

fn prompt_tag_chain(ctx: &CommandContext<'_>) -> Result<Vec<VersionTagRecord>> {
    let names = split_list(
        &ctx.prompter
            .input("Tag names in release order (comma separated)", None)?,
    );
    if names.is_empty() {
        return Err(CdToolsError::validation("at least one version tag is required"));
    }

    let strategies = vec!["timestamp".to_string(), "increment".to_string()];
    let mut records = Vec::with_capacity(names.len());
    for (idx, name) in names.iter().enumerate() {
        let strategy = match ctx.prompter.select(
            &format!("Suffix strategy for '{}'", name),
            &strategies,
            0,
        )? {
            0 => SuffixStrategy::Timestamp,
            _ => SuffixStrategy::Increment,
        };
        let next = names.get(idx + 1).map_or(STABLE_TAG, String::as_str);
        records.push(BTreeMap::from([(
            name.clone(),
            VersionTagConfig::new(strategy, Some(next)),
        )]));
    }
    Ok(records)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
