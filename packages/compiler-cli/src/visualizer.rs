//! `asdlc visualizer-dump` implementation.
//!
//! Minimal per-module JSON for the VS Code visualizer extension. The
//! compiler core owns the graph engines; this command only shapes their
//! output.

use std::path::PathBuf;

use serde_json::{json, Value};

use asdl_compiler::atomize::{atomize_program, AtomizedModuleGraph};
use asdl_compiler::diagnostics::render::render_all_text;
use asdl_compiler::diagnostics::DiagnosticCollector;
use asdl_compiler::graph::{lower_program, ProgramGraph};
use asdl_compiler::imports::{load_program, ResolverConfig, SymbolKind};
use asdl_compiler::netlist::{resolve_top, TopPolicy};
use asdl_compiler::parse_util::SourceMap;
use asdl_compiler::pattern::ExpandOptions;

use crate::rc::resolve_invocation;

pub const SCHEMA_VERSION: u32 = 1;

/// Parsed `visualizer-dump` arguments.
#[derive(Debug, Default)]
pub struct VisualizerArgs {
    pub files: Vec<PathBuf>,
    pub module: Option<String>,
    pub list_modules: bool,
    pub compact: bool,
}

/// Dump the selected module graph as JSON on stdout.
pub fn run_visualizer_dump(args: &VisualizerArgs) -> i32 {
    let Some(entry) = args.files.first() else {
        eprintln!("error: no input files");
        return 1;
    };
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
    let Some(graph) = lowered.graph else {
        eprintln!("{}", render_all_text(&sink.into_sorted(), &sources));
        return 1;
    };
    let atomized = atomize_program(&graph, ExpandOptions::default());
    sink.extend(atomized.diagnostics);
    let Some(program) = atomized.program else {
        eprintln!("{}", render_all_text(&sink.into_sorted(), &sources));
        return 1;
    };

    let diagnostics = sink.into_sorted();
    if !diagnostics.is_empty() {
        eprintln!("{}", render_all_text(&diagnostics, &sources));
    }
    if diagnostics.iter().any(|d| d.is_error()) {
        return 1;
    }

    if args.list_modules {
        let names: Vec<&str> = program.modules.iter().map(|m| m.id.name.as_str()).collect();
        println!("{}", serde_json::to_string(&names).unwrap_or_default());
        return 0;
    }

    let module = match &args.module {
        Some(name) => program.modules.iter().find(|m| &m.id.name == name),
        None => {
            let top_decl = db
                .document(db.entry)
                .and_then(|d| d.top.as_ref())
                .map(|t| t.value.clone());
            resolve_top(&program, top_decl.as_deref(), TopPolicy::Permissive).ok()
        }
    };
    let Some(module) = module else {
        eprintln!("error: module not found");
        return 1;
    };

    let dump = module_dump(module, &graph);
    let rendered = if args.compact {
        serde_json::to_string(&dump)
    } else {
        serde_json::to_string_pretty(&dump)
    };
    println!("{}", rendered.unwrap_or_default());
    0
}

fn module_dump(module: &AtomizedModuleGraph, graph: &ProgramGraph) -> Value {
    let instances: Vec<Value> = module
        .instances
        .iter()
        .map(|instance| {
            json!({
                "name": instance.name,
                "ref": instance.ref_symbol,
                "kind": match instance.ref_kind {
                    SymbolKind::Module => "module",
                    SymbolKind::Device => "device",
                },
                "parameters": instance.parameters,
                "pattern_origin": instance.origin,
            })
        })
        .collect();
    let nets: Vec<Value> = module
        .nets
        .iter()
        .map(|net| {
            json!({
                "name": net.name,
                "is_port": net.is_port,
                "pattern_origin": net.origin,
            })
        })
        .collect();
    let endpoints: Vec<Value> = module
        .endpoints
        .iter()
        .map(|endpoint| {
            json!({
                "instance": endpoint.instance,
                "pin": endpoint.pin,
                "net": module.nets.get(endpoint.net).map(|n| n.name.as_str()),
            })
        })
        .collect();

    let mut ref_modules: Vec<&str> = Vec::new();
    let mut ref_devices: Vec<&str> = Vec::new();
    for instance in &module.instances {
        let list = match instance.ref_kind {
            SymbolKind::Module => &mut ref_modules,
            SymbolKind::Device => &mut ref_devices,
        };
        if !list.contains(&instance.ref_symbol.as_str()) {
            list.push(&instance.ref_symbol);
        }
    }

    // Registry slice: only expressions this module's provenance refers to.
    let mut expressions: Vec<Value> = Vec::new();
    let mut seen = std::collections::HashSet::new();
    let origins = module
        .nets
        .iter()
        .filter_map(|n| n.origin.as_ref())
        .chain(module.instances.iter().filter_map(|i| i.origin.as_ref()))
        .chain(module.endpoints.iter().filter_map(|e| e.origin.as_ref()));
    for origin in origins {
        if seen.insert(origin.expression_id) {
            if let Some(info) = graph.registries.expressions.get(origin.expression_id) {
                expressions.push(json!(info));
            }
        }
    }

    json!({
        "schema_version": SCHEMA_VERSION,
        "module": module.id.name,
        "instances": instances,
        "nets": nets,
        "endpoints": endpoints,
        "registries": { "expressions": expressions },
        "refs": { "modules": ref_modules, "devices": ref_devices },
    })
}
