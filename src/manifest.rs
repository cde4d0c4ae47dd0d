//! Reading and writing project manifest versions
//!
//! `package.json` is rewritten through an order preserving JSON value so
//! unrelated keys keep their place. `Cargo.toml` is edited as a document so
//! comments and formatting survive.

use crate::config::{Project, ProjectType};
use crate::error::{CdToolsError, Result};
use rayon::prelude::*;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use toml_edit::{value, DocumentMut};

#[derive(Deserialize)]
struct CargoManifest {
    package: Option<CargoPackage>,
}

#[derive(Deserialize)]
struct CargoPackage {
    version: Option<toml::Value>,
}

pub fn manifest_path(project_dir: &Path, project_type: ProjectType) -> PathBuf {
    project_dir.join(project_type.manifest_file())
}

/// Version declared in the project's manifest.
///
/// `None` when the manifest is missing or declares no literal version
/// (for example `version.workspace = true`).
pub fn read_version(project_dir: &Path, project_type: ProjectType) -> Result<Option<String>> {
    let path = manifest_path(project_dir, project_type);
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path)?;

    let version = match project_type {
        ProjectType::Typescript => {
            let json: serde_json::Value = serde_json::from_str(&content)?;
            json.get("version")
                .and_then(|v| v.as_str())
                .map(str::to_string)
        }
        ProjectType::Rust => {
            let manifest: CargoManifest = toml::from_str(&content)?;
            manifest
                .package
                .and_then(|p| p.version)
                .and_then(|v| v.as_str().map(str::to_string))
        }
    };
    Ok(version)
}

/// Set the version in the project's manifest
pub fn write_version(project_dir: &Path, project_type: ProjectType, version: &str) -> Result<()> {
    let path = manifest_path(project_dir, project_type);
    if !path.exists() {
        return Err(CdToolsError::not_found(format!(
            "Manifest not found: {}",
            path.display()
        )));
    }
    let content = fs::read_to_string(&path)?;

    let updated = match project_type {
        ProjectType::Typescript => update_package_json(&content, version)?,
        ProjectType::Rust => update_cargo_toml(&content, version)
            .map_err(|e| CdToolsError::validation(format!("{}: {}", path.display(), e)))?,
    };
    fs::write(&path, updated)?;
    log::debug!("{} -> {}", path.display(), version);
    Ok(())
}

/// Write every `(project, version)` pair, manifests in parallel.
///
/// All writes are attempted; the first failure is returned.
pub fn write_versions(root: &Path, updates: &[(&Project, String)]) -> Result<()> {
    let results: Vec<Result<()>> = updates
        .par_iter()
        .map(|(project, version)| {
            write_version(&root.join(&project.path), project.project_type, version)
        })
        .collect();
    results.into_iter().collect()
}

fn update_package_json(content: &str, version: &str) -> Result<String> {
    let mut json: serde_json::Value = serde_json::from_str(content)?;
    let object = json
        .as_object_mut()
        .ok_or_else(|| CdToolsError::validation("package.json is not a JSON object"))?;
    object.insert(
        "version".to_string(),
        serde_json::Value::String(version.to_string()),
    );
    let mut out = serde_json::to_string_pretty(&json)?;
    out.push('\n');
    Ok(out)
}

fn update_cargo_toml(content: &str, version: &str) -> std::result::Result<String, String> {
    let mut doc = content.parse::<DocumentMut>().map_err(|e| e.to_string())?;
    let package = doc
        .get_mut("package")
        .and_then(|p| p.as_table_like_mut())
        .ok_or_else(|| "missing [package] table".to_string())?;
    if package.get("version").is_some_and(|v| v.as_str().is_none()) {
        return Err("version is inherited from the workspace manifest".to_string());
    }
    package.insert("version", value(version));
    Ok(doc.to_string())
}
