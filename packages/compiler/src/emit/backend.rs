//! Backend configuration.
//!
//! A backend config is span-less YAML mapping backend names to extension,
//! comment prefix, device templates and pattern rendering. Reserved
//! `__..__` templates have built-in defaults a config may override.

use indexmap::IndexMap;
use lazy_static::lazy_static;
use serde::Deserialize;

use crate::diagnostics::{codes, Diagnostic};

/// Reserved template keys.
pub const SUBCKT_HEADER: &str = "__subckt_header__";
pub const SUBCKT_HEADER_PARAMS: &str = "__subckt_header_params__";
pub const SUBCKT_FOOTER: &str = "__subckt_footer__";
pub const SUBCKT_CALL: &str = "__subckt_call__";
pub const SUBCKT_CALL_PARAMS: &str = "__subckt_call_params__";
pub const NETLIST_HEADER: &str = "__netlist_header__";
pub const NETLIST_FOOTER: &str = "__netlist_footer__";

lazy_static! {
    /// Built-in renderings for the reserved templates.
    pub static ref RESERVED_DEFAULTS: IndexMap<&'static str, &'static str> = {
        let mut m = IndexMap::new();
        m.insert(NETLIST_HEADER, "* {top_sym_name} netlist emitted {emit_date} {emit_time}");
        m.insert(NETLIST_FOOTER, ".end");
        m.insert(SUBCKT_HEADER, ".subckt {name} {ports}");
        m.insert(SUBCKT_HEADER_PARAMS, ".subckt {name} {ports} {params}");
        m.insert(SUBCKT_FOOTER, ".ends {name}");
        m.insert(SUBCKT_CALL, "X{name} {ports} {sym_name}");
        m.insert(SUBCKT_CALL_PARAMS, "X{name} {ports} {sym_name} {params}");
        m
    };
}

/// Built-in config used when neither `ASDL_BACKEND_CONFIG` nor `.asdlrc`
/// provides one.
pub const DEFAULT_BACKEND_CONFIG: &str = "\
backends:
  sim.ngspice:
    extension: .spice
    comment_prefix: \"*\"
    pattern_rendering: \"{N}\"
    templates: {}
";

#[derive(Debug, Deserialize)]
struct BackendConfigFile {
    backends: IndexMap<String, BackendEntry>,
}

#[derive(Debug, Deserialize)]
struct BackendEntry {
    extension: String,
    #[serde(default = "default_comment_prefix")]
    comment_prefix: String,
    #[serde(default)]
    templates: IndexMap<String, String>,
    #[serde(default = "default_pattern_rendering")]
    pattern_rendering: String,
}

fn default_comment_prefix() -> String {
    "*".to_string()
}

fn default_pattern_rendering() -> String {
    "{N}".to_string()
}

/// One selected backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub name: String,
    pub extension: String,
    pub comment_prefix: String,
    pub templates: IndexMap<String, String>,
    pub pattern_rendering: String,
}

impl BackendConfig {
    /// The short name devices use in their `backends:` section
    /// (`sim.ngspice` -> `ngspice`).
    pub fn short_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// A reserved template, config override first, built-in default second.
    pub fn reserved(&self, key: &str) -> &str {
        self.templates
            .get(key)
            .map(String::as_str)
            .or_else(|| RESERVED_DEFAULTS.get(key).copied())
            .unwrap_or("")
    }
}

/// Parse a backend config document and select `backend_name` from it.
pub fn load_backend_config(
    source: &str,
    backend_name: &str,
) -> (Option<BackendConfig>, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();
    let file: BackendConfigFile = match serde_yaml::from_str(source) {
        Ok(file) => file,
        Err(err) => {
            diagnostics.push(Diagnostic::error(
                codes::EMIT_BACKEND_CONFIG,
                format!("cannot load backend config: {}", err),
            ));
            return (None, diagnostics);
        }
    };
    match file.backends.get(backend_name) {
        Some(entry) => (
            Some(BackendConfig {
                name: backend_name.to_string(),
                extension: entry.extension.clone(),
                comment_prefix: entry.comment_prefix.clone(),
                templates: entry.templates.clone(),
                pattern_rendering: entry.pattern_rendering.clone(),
            }),
            diagnostics,
        ),
        None => {
            let known = file.backends.keys().cloned().collect::<Vec<_>>().join(", ");
            diagnostics.push(Diagnostic::error(
                codes::EMIT_UNKNOWN_BACKEND,
                format!(
                    "backend `{}` is not defined in the backend config (known: {})",
                    backend_name, known
                ),
            ));
            (None, diagnostics)
        }
    }
}
