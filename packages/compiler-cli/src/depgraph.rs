//! `asdlc depgraph-dump` implementation.
//!
//! Module dependency graph as JSON: one node per `(file, name)` module or
//! device, one edge per instance reference.

use std::path::PathBuf;

use serde_json::{json, Value};

use asdl_compiler::diagnostics::render::render_all_text;
use asdl_compiler::diagnostics::DiagnosticCollector;
use asdl_compiler::graph::lower_program;
use asdl_compiler::imports::{load_program, ResolverConfig, SymbolKind};
use asdl_compiler::parse_util::SourceMap;

use crate::rc::resolve_invocation;

/// Parsed `depgraph-dump` arguments.
#[derive(Debug, Default)]
pub struct DepgraphArgs {
    pub entries: Vec<PathBuf>,
    pub output: Option<PathBuf>,
}

/// Build and write the dependency graph.
pub fn run_depgraph_dump(args: &DepgraphArgs) -> i32 {
    let mut nodes: Vec<Value> = Vec::new();
    let mut edges: Vec<Value> = Vec::new();

    for entry in &args.entries {
        let invocation = match resolve_invocation(entry, &[]) {
            Ok(invocation) => invocation,
            Err(err) => {
                eprintln!("error: {}", err);
                return 1;
            }
        };
        let mut sink = DiagnosticCollector::new();
        let mut sources = SourceMap::new();
        if let Some(parent) = entry.parent() {
            sources.set_base(parent.to_path_buf());
        }
        let config = ResolverConfig {
            lib_roots: invocation.lib_roots,
            env: invocation.env,
            home: invocation.home,
        };
        let loaded = load_program(entry, &config, &mut sources);
        sink.extend(loaded.diagnostics);
        let Some(db) = loaded.program else {
            eprintln!("{}", render_all_text(&sink.into_sorted(), &sources));
            return 1;
        };
        let lowered = lower_program(&db);
        sink.extend(lowered.diagnostics);
        let diagnostics = sink.into_sorted();
        if !diagnostics.is_empty() {
            eprintln!("{}", render_all_text(&diagnostics, &sources));
        }
        if diagnostics.iter().any(|d| d.is_error()) {
            return 1;
        }
        let Some(graph) = lowered.graph else {
            return 1;
        };

        let node_id = |file: asdl_compiler::parse_util::FileId, name: &str| {
            format!("{}#{}", sources.display_path(file), name)
        };
        for module in &graph.modules {
            nodes.push(json!({
                "module_id": node_id(module.id.file, &module.id.name),
                "name": module.id.name,
                "file": sources.display_path(module.id.file),
                "kind": "module",
            }));
            for instance in &module.instance_bundles {
                edges.push(json!({
                    "from": node_id(module.id.file, &module.id.name),
                    "to": node_id(instance.ref_file_id, &instance.ref_symbol),
                    "instance": instance.name.text,
                    "kind": match instance.ref_kind {
                        SymbolKind::Module => "module",
                        SymbolKind::Device => "device",
                    },
                }));
            }
        }
        for device in &graph.devices {
            nodes.push(json!({
                "module_id": node_id(device.id.file, &device.id.name),
                "name": device.id.name,
                "file": sources.display_path(device.id.file),
                "kind": "device",
            }));
        }
    }

    let dump = json!({ "nodes": nodes, "edges": edges });
    let text = serde_json::to_string_pretty(&dump).unwrap_or_default();
    match &args.output {
        Some(path) => {
            if let Err(err) = std::fs::write(path, text) {
                eprintln!("error: cannot write `{}`: {}", path.display(), err);
                return 1;
            }
        }
        None => println!("{}", text),
    }
    0
}
