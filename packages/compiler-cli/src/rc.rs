//! Invocation environment.
//!
//! `ASDL_LIB_PATH` and `ASDL_BACKEND_CONFIG` are read once at entry, merged
//! with an optional `.asdlrc` discovered from the entry directory upward.
//! Command-line flags override both.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use asdl_compiler::imports::path_expand::{expand_lib_path, expand_path};

/// `.asdlrc` file shape.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RcFile {
    #[serde(default)]
    pub lib_paths: Vec<String>,
    pub backend_config: Option<String>,
    pub backend: Option<String>,
}

/// Fully resolved invocation settings.
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    pub lib_roots: Vec<PathBuf>,
    pub backend_config_path: Option<PathBuf>,
    pub default_backend: Option<String>,
    pub env: HashMap<String, String>,
    pub home: Option<PathBuf>,
}

/// Search for `.asdlrc` from `start` upward.
pub fn find_rc_file(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start.to_path_buf());
    while let Some(current) = dir {
        let candidate = current.join(".asdlrc");
        if candidate.is_file() {
            return Some(candidate);
        }
        dir = current.parent().map(Path::to_path_buf);
    }
    None
}

/// Capture the environment and merge `.asdlrc` settings for an entry file.
/// `extra_libs` (from repeated `--lib` flags) take priority over
/// `ASDL_LIB_PATH` roots, which take priority over `.asdlrc` ones.
pub fn resolve_invocation(entry: &Path, extra_libs: &[PathBuf]) -> anyhow::Result<Invocation> {
    let env: HashMap<String, String> = std::env::vars().collect();
    let home = env.get("HOME").map(PathBuf::from);

    let mut invocation = Invocation {
        lib_roots: extra_libs.to_vec(),
        env: env.clone(),
        home: home.clone(),
        ..Default::default()
    };

    if let Some(value) = env.get("ASDL_LIB_PATH") {
        let (roots, errors) = expand_lib_path(value, &env, home.as_deref());
        for (part, err) in errors {
            eprintln!("warning: ignoring ASDL_LIB_PATH entry `{}`: {}", part, err);
        }
        invocation.lib_roots.extend(roots);
    }
    if let Some(value) = env.get("ASDL_BACKEND_CONFIG") {
        invocation.backend_config_path = Some(expand_path(value, &env, home.as_deref())?);
    }

    let entry_dir = entry.parent().unwrap_or(Path::new("."));
    if let Some(rc_path) = find_rc_file(entry_dir) {
        let text = std::fs::read_to_string(&rc_path)?;
        let rc: RcFile = serde_yaml::from_str(&text)
            .map_err(|e| anyhow::anyhow!("cannot parse {}: {}", rc_path.display(), e))?;
        let rc_dir = rc_path.parent().unwrap_or(Path::new("."));
        for root in rc.lib_paths {
            let expanded = expand_path(&root, &env, home.as_deref())?;
            let absolute =
                if expanded.is_absolute() { expanded } else { rc_dir.join(expanded) };
            invocation.lib_roots.push(absolute);
        }
        if invocation.backend_config_path.is_none() {
            if let Some(config) = rc.backend_config {
                let expanded = expand_path(&config, &env, home.as_deref())?;
                invocation.backend_config_path =
                    Some(if expanded.is_absolute() { expanded } else { rc_dir.join(expanded) });
            }
        }
        invocation.default_backend = rc.backend;
    }

    Ok(invocation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rc_file_shape_parses() {
        let rc: RcFile = serde_yaml::from_str(
            "lib_paths: [../lib, /abs/lib]\nbackend_config: backends.yml\nbackend: sim.ngspice\n",
        )
        .unwrap();
        assert_eq!(rc.lib_paths.len(), 2);
        assert_eq!(rc.backend.as_deref(), Some("sim.ngspice"));
    }
}
