//! Project manifest (v1).
//!
//! Used by the docs and hierarchy tools: names the project, its entrance
//! files and its libraries. `libraries` entries expand every `.asdl` under
//! a root, subject to relative exclude globs; list order is preserved.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// `{schema_version: 1, project_name, readme, docs, entrances, libraries}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectManifest {
    pub schema_version: u32,
    pub project_name: String,
    #[serde(default)]
    pub readme: Option<String>,
    #[serde(default)]
    pub docs: Vec<String>,
    #[serde(default)]
    pub entrances: Vec<String>,
    #[serde(default)]
    pub libraries: Vec<LibraryEntry>,
}

/// One library root with optional exclude globs (relative to the root).
#[derive(Debug, Clone, Deserialize)]
pub struct LibraryEntry {
    pub root: String,
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Load and version-check a manifest.
pub fn load_manifest(path: &Path) -> anyhow::Result<ProjectManifest> {
    let text = std::fs::read_to_string(path)?;
    let manifest: ProjectManifest = serde_yaml::from_str(&text)
        .map_err(|e| anyhow::anyhow!("cannot parse {}: {}", path.display(), e))?;
    if manifest.schema_version != 1 {
        anyhow::bail!(
            "unsupported manifest schema_version {} (expected 1)",
            manifest.schema_version
        );
    }
    Ok(manifest)
}

/// Expand a library entry into its `.asdl` files, sorted for determinism,
/// minus the excluded ones.
pub fn expand_library(base_dir: &Path, entry: &LibraryEntry) -> anyhow::Result<Vec<PathBuf>> {
    let root = base_dir.join(&entry.root);
    let pattern = root.join("**").join("*.asdl");
    let mut excluded: Vec<PathBuf> = Vec::new();
    for exclude in &entry.exclude {
        let exclude_pattern = root.join(exclude);
        for hit in glob::glob(&exclude_pattern.to_string_lossy())? {
            excluded.push(hit?);
        }
    }
    let mut files = Vec::new();
    for hit in glob::glob(&pattern.to_string_lossy())? {
        let path = hit?;
        if !excluded.contains(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// All library files of a manifest, in library order.
pub fn expand_libraries(
    base_dir: &Path,
    manifest: &ProjectManifest,
) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in &manifest.libraries {
        files.extend(expand_library(base_dir, entry)?);
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_parses_and_checks_version() {
        let manifest: ProjectManifest = serde_yaml::from_str(
            "schema_version: 1\nproject_name: amp\nentrances: [top.asdl]\nlibraries:\n  - root: lib\n    exclude: ['legacy/**']\n",
        )
        .unwrap();
        assert_eq!(manifest.project_name, "amp");
        assert_eq!(manifest.libraries[0].exclude, vec!["legacy/**"]);
    }
}
