//! AtomizedGraph -> NetlistIR lowering.
//!
//! Resolves the top module (one shared resolver for the strict emission
//! path and the permissive tool path), walks the reachable hierarchy in
//! deterministic order, allocates collision-free emitted names, and builds
//! ordered connections.

use indexmap::IndexMap;
use std::collections::HashSet;

use crate::atomize::{AtomizedModuleGraph, AtomizedProgram};
use crate::diagnostics::{codes, Diagnostic};
use crate::graph::{ExprId, ModuleId, ProgramGraph};
use crate::imports::SymbolKind;
use crate::parse_util::{FileId, SourceMap};

use super::ir::{NetlistDesign, NetlistDevice, NetlistInstance, NetlistModule, NetlistNet};

/// Top-resolution policy: emission is strict, hierarchy tools are
/// permissive. Both go through [`resolve_top`] so the contracts cannot
/// drift apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopPolicy {
    Strict,
    Permissive,
}

/// Shared symbol selection: exact `(file, symbol)` match first, name-only
/// fallback second. Single source of truth for module identity lookups.
pub fn select_by_symbol<'a, T>(
    items: impl IntoIterator<Item = &'a T>,
    file: FileId,
    symbol: &str,
    id_of: impl Fn(&T) -> (FileId, &str),
) -> Option<&'a T> {
    let mut fallback = None;
    for item in items {
        let (item_file, item_symbol) = id_of(item);
        if item_symbol == symbol {
            if item_file == file {
                return Some(item);
            }
            if fallback.is_none() {
                fallback = Some(item);
            }
        }
    }
    fallback
}

/// Select a module of the atomized program.
pub fn select_module<'a>(
    program: &'a AtomizedProgram,
    file: FileId,
    symbol: &str,
) -> Option<&'a AtomizedModuleGraph> {
    select_by_symbol(program.modules.iter(), file, symbol, |m| {
        (m.id.file, m.id.name.as_str())
    })
}

/// Resolve the design top.
pub fn resolve_top<'a>(
    program: &'a AtomizedProgram,
    top_decl: Option<&str>,
    policy: TopPolicy,
) -> Result<&'a AtomizedModuleGraph, Diagnostic> {
    let entry_modules: Vec<&AtomizedModuleGraph> = program
        .modules
        .iter()
        .filter(|m| m.id.file == program.entry_file_id)
        .collect();

    match top_decl {
        Some(top) => entry_modules
            .iter()
            .find(|m| m.id.name == top || crate::ast::nodes::split_decorated(&m.id.name).0 == top)
            .copied()
            .or_else(|| {
                if policy == TopPolicy::Permissive && entry_modules.len() == 1 {
                    Some(entry_modules[0])
                } else {
                    None
                }
            })
            .ok_or_else(|| {
                Diagnostic::error(
                    codes::EMIT_TOP,
                    format!("top `{}` not found in entry file", top),
                )
            }),
        None => match entry_modules.len() {
            1 => Ok(entry_modules[0]),
            0 => Err(Diagnostic::error(
                codes::EMIT_TOP,
                "entry file declares no modules".to_string(),
            )),
            n => {
                if policy == TopPolicy::Permissive {
                    Ok(entry_modules[0])
                } else {
                    Err(Diagnostic::error(
                        codes::EMIT_TOP,
                        format!("entry file has {} modules and no `top`; add a `top` entry", n),
                    ))
                }
            }
        },
    }
}

/// Lowering output.
#[derive(Debug)]
pub struct NetlistLowerResult {
    pub design: Option<NetlistDesign>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Build the flat design for emission.
pub fn lower_netlist(
    program: &AtomizedProgram,
    graph: &ProgramGraph,
    top_decl: Option<&str>,
    sources: &SourceMap,
) -> NetlistLowerResult {
    let mut diagnostics = Vec::new();

    let top = match resolve_top(program, top_decl, TopPolicy::Strict) {
        Ok(top) => top,
        Err(diag) => {
            let mut diag = diag;
            if diag.primary_span.is_none() {
                // Anchor the error at the entry file so it renders with a
                // location.
                diag.primary_span = Some(crate::parse_util::SourceSpan::new(
                    program.entry_file_id,
                    1,
                    1,
                    0,
                ));
            }
            diagnostics.push(diag);
            return NetlistLowerResult { design: None, diagnostics };
        }
    };

    // Reachable modules, dependencies before users, top last.
    let mut order: Vec<&AtomizedModuleGraph> = Vec::new();
    let mut visited: HashSet<ModuleId> = HashSet::new();
    let mut stack: Vec<ModuleId> = Vec::new();
    collect_reachable(program, top, &mut order, &mut visited, &mut stack);

    // Global emitted-name allocation over the reachable set.
    let mut taken: HashSet<String> = HashSet::new();
    let mut emitted: IndexMap<ModuleId, String> = IndexMap::new();
    let mut emission_name_map: IndexMap<String, String> = IndexMap::new();
    for module in &order {
        let base = crate::ast::nodes::split_decorated(&module.id.name).0.to_string();
        let mut candidate = base.clone();
        let mut counter = 2usize;
        while taken.contains(&candidate) {
            candidate = format!("{}__{}", base, counter);
            counter += 1;
        }
        taken.insert(candidate.clone());
        emitted.insert(module.id.clone(), candidate.clone());

        let mut key = module.id.name.clone();
        if emission_name_map.contains_key(&key) {
            key = format!("{} ({})", module.id.name, sources.display_path(module.id.file));
        }
        emission_name_map.insert(key, candidate);
    }

    // Devices referenced by reachable instances, in first-use order.
    let mut devices: Vec<NetlistDevice> = Vec::new();
    for module in &order {
        for instance in &module.instances {
            if instance.ref_kind != SymbolKind::Device {
                continue;
            }
            let device = select_by_symbol(
                graph.devices.iter(),
                instance.ref_file_id,
                &instance.ref_symbol,
                |d| (d.id.file, d.id.name.as_str()),
            );
            if let Some(device) = device {
                if !devices.iter().any(|d| d.name == device.id.name && d.file_id == device.id.file)
                {
                    devices.push(NetlistDevice {
                        name: device.id.name.clone(),
                        file_id: device.id.file,
                        ports: device.ports.clone(),
                        parameters: device.parameters.clone(),
                        variables: device.variables.clone(),
                        backends: device.backends.clone(),
                    });
                }
            }
        }
    }

    let mut modules = Vec::with_capacity(order.len());
    for &module in &order {
        modules.push(lower_module(
            module,
            program,
            graph,
            &emitted,
            &mut emission_name_map,
            &mut diagnostics,
        ));
    }

    let top_name = emitted
        .get(&top.id)
        .cloned()
        .unwrap_or_else(|| top.id.name.clone());

    let design = NetlistDesign {
        entry_file_id: program.entry_file_id,
        top_name,
        modules,
        devices,
        emission_name_map,
    };
    NetlistLowerResult { design: Some(design), diagnostics }
}

fn collect_reachable<'a>(
    program: &'a AtomizedProgram,
    module: &'a AtomizedModuleGraph,
    order: &mut Vec<&'a AtomizedModuleGraph>,
    visited: &mut HashSet<ModuleId>,
    stack: &mut Vec<ModuleId>,
) {
    if visited.contains(&module.id) || stack.contains(&module.id) {
        return;
    }
    stack.push(module.id.clone());
    for instance in &module.instances {
        if instance.ref_kind != SymbolKind::Module {
            continue;
        }
        if let Some(child) = select_module(program, instance.ref_file_id, &instance.ref_symbol) {
            collect_reachable(program, child, order, visited, stack);
        }
    }
    stack.pop();
    visited.insert(module.id.clone());
    order.push(module);
}

fn lower_module(
    module: &AtomizedModuleGraph,
    program: &AtomizedProgram,
    graph: &ProgramGraph,
    emitted: &IndexMap<ModuleId, String>,
    emission_name_map: &mut IndexMap<String, String>,
    diagnostics: &mut Vec<Diagnostic>,
) -> NetlistModule {
    let mut expression_table: IndexMap<ExprId, String> = IndexMap::new();
    let mut harvest = |origin: &Option<crate::atomize::AtomizedPatternOrigin>| {
        if let Some(origin) = origin {
            if let Some(info) = graph.registries.expressions.get(origin.expression_id) {
                expression_table
                    .entry(origin.expression_id)
                    .or_insert_with(|| info.expression.clone());
            }
        }
    };

    let nets: Vec<NetlistNet> = module
        .nets
        .iter()
        .map(|net| {
            harvest(&net.origin);
            NetlistNet {
                name: net.name.clone(),
                is_port: net.is_port,
                pattern_origin: net.origin.clone(),
            }
        })
        .collect();

    let mut instances = Vec::with_capacity(module.instances.len());
    for instance in &module.instances {
        harvest(&instance.origin);

        // Connections authored on this instance, in endpoint order.
        let mut authored: IndexMap<String, String> = IndexMap::new();
        for endpoint in &module.endpoints {
            if endpoint.instance == instance.name {
                harvest(&endpoint.origin);
                if let Some(net) = module.nets.get(endpoint.net) {
                    authored.insert(endpoint.pin.clone(), net.name.clone());
                }
            }
        }

        // Reorder by the referenced declaration's port list; unknown pins
        // keep authoring order at the end for the emitter to report.
        let (reference, target_ports, variables) = match instance.ref_kind {
            SymbolKind::Module => {
                let target =
                    select_module(program, instance.ref_file_id, &instance.ref_symbol);
                match target {
                    Some(target) => {
                        let name = emitted
                            .get(&target.id)
                            .cloned()
                            .unwrap_or_else(|| target.id.name.clone());
                        (name, target.ports.clone(), IndexMap::new())
                    }
                    None => {
                        diagnostics.push(
                            Diagnostic::warning(
                                codes::EMIT_PROVENANCE,
                                format!(
                                    "instance `{}` references module `{}` outside the design",
                                    instance.name, instance.ref_symbol
                                ),
                            )
                            .with_span(instance.span),
                        );
                        (instance.ref_symbol.clone(), Vec::new(), IndexMap::new())
                    }
                }
            }
            SymbolKind::Device => {
                let device = select_by_symbol(
                    graph.devices.iter(),
                    instance.ref_file_id,
                    &instance.ref_symbol,
                    |d| (d.id.file, d.id.name.as_str()),
                );
                match device {
                    Some(device) => (
                        device.id.name.clone(),
                        device.ports.clone(),
                        device.variables.clone(),
                    ),
                    None => (instance.ref_symbol.clone(), Vec::new(), IndexMap::new()),
                }
            }
        };

        let mut conns: IndexMap<String, String> = IndexMap::new();
        if target_ports.is_empty() {
            conns = authored;
        } else {
            for port in &target_ports {
                if let Some(net) = authored.get(port) {
                    conns.insert(port.clone(), net.clone());
                }
            }
            for (pin, net) in authored {
                if !conns.contains_key(&pin) {
                    conns.insert(pin, net);
                }
            }
        }

        if !emission_name_map.contains_key(&instance.name) {
            emission_name_map.insert(instance.name.clone(), instance.name.clone());
        }

        instances.push(NetlistInstance {
            name: instance.name.clone(),
            emitted_name: instance.name.clone(),
            reference,
            ref_file_id: instance.ref_file_id,
            ref_kind: instance.ref_kind,
            conns,
            parameters: instance.parameters.clone(),
            variables,
            pattern_origin: instance.origin.clone(),
            span: instance.span,
        });
    }

    NetlistModule {
        name: crate::ast::nodes::split_decorated(&module.id.name).0.to_string(),
        emitted_name: emitted
            .get(&module.id)
            .cloned()
            .unwrap_or_else(|| module.id.name.clone()),
        file_id: module.id.file,
        ports: module.ports.clone(),
        parameters: module.parameters.clone(),
        nets,
        instances,
        pattern_expression_table: expression_table,
        span: module.span,
    }
}
