//! Pipeline driver.
//!
//! Composes parse -> imports -> lowering -> atomization -> view binding ->
//! netlist lowering -> emission. Every stage appends diagnostics and
//! returns a best-effort result; only the final emission step is gated on
//! the absence of errors.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Serialize;

use crate::atomize::atomize_program;
use crate::diagnostics::render::{to_json, DiagnosticJson};
use crate::diagnostics::{Diagnostic, DiagnosticCollector, Severity};
use crate::emit::{emit_netlist, load_backend_config, EmitOptions, DEFAULT_BACKEND_CONFIG};
use crate::graph::lower_program;
use crate::imports::{load_program, ResolverConfig};
use crate::netlist::{lower_netlist, NetlistDesign};
use crate::parse_util::SourceMap;
use crate::pattern::{ExpandOptions, DEFAULT_EXPANSION_CAP};
use crate::view::{apply_views, load_view_config, BindingRecord};

/// Everything a compilation needs from the invocation environment. Captured
/// once at CLI entry; the pipeline itself never reads the process
/// environment.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Backend name, e.g. `sim.ngspice`.
    pub backend: String,
    /// Backend config document; falls back to the built-in default.
    pub backend_config_source: Option<String>,
    /// View config document and profile selection.
    pub view_config_source: Option<String>,
    pub profiles: Vec<String>,
    pub lib_roots: Vec<PathBuf>,
    pub env: HashMap<String, String>,
    pub home: Option<PathBuf>,
    pub top_as_subckt: bool,
    pub expansion_cap: usize,
    /// Fixed emission timestamp; `None` captures the current time once.
    pub timestamp: Option<(String, String)>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            backend: "sim.ngspice".to_string(),
            backend_config_source: None,
            view_config_source: None,
            profiles: Vec::new(),
            lib_roots: Vec::new(),
            env: HashMap::new(),
            home: None,
            top_as_subckt: false,
            expansion_cap: DEFAULT_EXPANSION_CAP,
            timestamp: None,
        }
    }
}

/// Compile log, serialized as JSON next to the netlist.
#[derive(Debug, Serialize)]
pub struct CompileLog {
    pub view_bindings: Vec<BindingRecord>,
    pub emission_name_map: IndexMap<String, String>,
    pub warning_count: usize,
    pub warnings: Vec<DiagnosticJson>,
    pub diagnostic_count: usize,
    pub diagnostic_severity_counts: IndexMap<String, usize>,
    pub diagnostics: Vec<DiagnosticJson>,
}

/// Compilation artifacts. `netlist` is `None` when errors blocked emission.
#[derive(Debug)]
pub struct CompileArtifacts {
    pub netlist: Option<String>,
    pub extension: String,
    pub log: CompileLog,
    pub design: Option<NetlistDesign>,
    pub sources: SourceMap,
    /// Diagnostics in the deterministic render order.
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileArtifacts {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Run the full pipeline on one entry file.
pub fn compile(entry: &Path, options: &CompileOptions) -> CompileArtifacts {
    let mut sink = DiagnosticCollector::new();
    let mut sources = SourceMap::new();
    if let Some(parent) = entry.parent() {
        sources.set_base(if parent.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            parent.to_path_buf()
        });
    }

    let resolver_config = ResolverConfig {
        lib_roots: options.lib_roots.clone(),
        env: options.env.clone(),
        home: options.home.clone(),
    };
    let loaded = load_program(entry, &resolver_config, &mut sources);
    sink.extend(loaded.diagnostics);

    let mut view_bindings = Vec::new();
    let mut design: Option<NetlistDesign> = None;
    let mut netlist: Option<String> = None;
    let mut extension = String::new();

    let backend_source = options
        .backend_config_source
        .clone()
        .unwrap_or_else(|| DEFAULT_BACKEND_CONFIG.to_string());
    let (backend, backend_diags) = load_backend_config(&backend_source, &options.backend);
    sink.extend(backend_diags);
    if let Some(backend) = &backend {
        extension = backend.extension.clone();
    }

    if let Some(db) = loaded.program {
        let lowered = lower_program(&db);
        sink.extend(lowered.diagnostics);

        if let Some(graph) = lowered.graph {
            let expand_options =
                ExpandOptions { cap: options.expansion_cap, forbid_splice: false };
            let atomized = atomize_program(&graph, expand_options);
            sink.extend(atomized.diagnostics);

            if let Some(mut program) = atomized.program {
                // View binding, when a config and profiles were given.
                if let Some(view_source) = &options.view_config_source {
                    let (view_config, view_diags) = load_view_config(view_source);
                    sink.extend(view_diags);
                    let mut selection_diags = Vec::new();
                    let profiles = view_config.select(&options.profiles, &mut selection_diags);
                    sink.extend(selection_diags);
                    let top_decl = db
                        .document(db.entry)
                        .and_then(|d| d.top.as_ref())
                        .map(|t| t.value.clone());
                    let top_module = crate::netlist::resolve_top(
                        &program,
                        top_decl.as_deref(),
                        crate::netlist::TopPolicy::Permissive,
                    );
                    if let Ok(top_module) = top_module {
                        let top_id = top_module.id.clone();
                        let bound =
                            apply_views(&program, &db, &profiles, &top_id, &mut sources);
                        sink.extend(bound.diagnostics);
                        view_bindings = bound.bindings;
                        program = bound.program;
                    }
                }

                let top_decl = db
                    .document(db.entry)
                    .and_then(|d| d.top.as_ref())
                    .map(|t| t.value.clone());
                let lowered_netlist =
                    lower_netlist(&program, &graph, top_decl.as_deref(), &sources);
                sink.extend(lowered_netlist.diagnostics);
                design = lowered_netlist.design;

                // Emission only runs on an error-free pipeline.
                if !sink.has_errors() {
                    if let (Some(design), Some(backend)) = (&design, &backend) {
                        let (emit_date, emit_time) = options
                            .timestamp
                            .clone()
                            .unwrap_or_else(current_timestamp);
                        let emit_options = EmitOptions {
                            top_as_subckt: options.top_as_subckt,
                            emit_date,
                            emit_time,
                        };
                        let emitted =
                            emit_netlist(design, &graph, backend, &sources, &emit_options);
                        sink.extend(emitted.diagnostics);
                        if !sink.has_errors() {
                            netlist = emitted.text;
                        }
                    }
                }
            }
        }
    }

    let diagnostics = sink.into_sorted();
    let log = build_log(&diagnostics, view_bindings, design.as_ref(), &sources);
    CompileArtifacts { netlist, extension, log, design, sources, diagnostics }
}

fn current_timestamp() -> (String, String) {
    let now = chrono::Local::now();
    (now.format("%Y-%m-%d").to_string(), now.format("%H:%M:%S").to_string())
}

fn build_log(
    diagnostics: &[Diagnostic],
    view_bindings: Vec<BindingRecord>,
    design: Option<&NetlistDesign>,
    sources: &SourceMap,
) -> CompileLog {
    let warnings: Vec<DiagnosticJson> = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Warning)
        .map(|d| to_json(d, sources))
        .collect();
    let mut severity_counts: IndexMap<String, usize> = IndexMap::new();
    for severity in [Severity::Error, Severity::Warning, Severity::Note] {
        severity_counts.insert(
            severity.as_str().to_string(),
            diagnostics.iter().filter(|d| d.severity == severity).count(),
        );
    }
    CompileLog {
        view_bindings,
        emission_name_map: design
            .map(|d| d.emission_name_map.clone())
            .unwrap_or_default(),
        warning_count: warnings.len(),
        warnings,
        diagnostic_count: diagnostics.len(),
        diagnostic_severity_counts: severity_counts,
        diagnostics: diagnostics.iter().map(|d| to_json(d, sources)).collect(),
    }
}

/// Default compile log path: `<entry_basename>.log.json` next to the entry.
pub fn default_log_path(entry: &Path) -> PathBuf {
    let stem = entry
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "out".to_string());
    entry.with_file_name(format!("{}.log.json", stem))
}
