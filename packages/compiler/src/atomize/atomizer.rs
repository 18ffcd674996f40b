//! PatternedGraph -> AtomizedGraph.
//!
//! Expands every bundle, binds endpoint lists to net positions, and checks
//! literal collisions. Failure modes: binding mismatches (`IR-001`),
//! collisions (`IR-002`), pattern parse failures (`IR-003`), expansion cap
//! (`IR-004`). The stage is best-effort: a failing bundle is skipped, the
//! rest of the module still atomizes.

use std::collections::{HashMap, HashSet};

use crate::diagnostics::{codes, Diagnostic, DiagnosticCode};
use crate::graph::{ModuleGraph, NetBundle, ProgramGraph};
use crate::parse_util::SourceSpan;
use crate::pattern::{
    bind, expand, expand_endpoints, Atom, ExpandOptions, Expansion, PatternError,
};

use super::ir::{
    AtomizedEndpoint, AtomizedInstance, AtomizedModuleGraph, AtomizedNet, AtomizedPatternOrigin,
    AtomizedProgram,
};

/// Atomization output.
#[derive(Debug)]
pub struct AtomizeResult {
    pub program: Option<AtomizedProgram>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Atomize every module of the program.
pub fn atomize_program(graph: &ProgramGraph, options: ExpandOptions) -> AtomizeResult {
    let mut diagnostics = Vec::new();
    let modules = graph
        .modules
        .iter()
        .map(|module| atomize_module(module, options, &mut diagnostics))
        .collect();
    let program = AtomizedProgram { entry_file_id: graph.entry_file_id, modules };
    AtomizeResult { program: Some(program), diagnostics }
}

fn origin_from_atom(
    expr_id: crate::graph::ExprId,
    atom: &Atom,
    expansion: &Expansion,
) -> Option<AtomizedPatternOrigin> {
    if atom.parts.is_empty() && expansion.segment_count == 1 {
        // A literal name has no pattern provenance.
        return None;
    }
    Some(AtomizedPatternOrigin {
        expression_id: expr_id,
        segment_index: atom.segment_index,
        atom_index: atom.atom_index,
        base_name: expansion
            .segment_bases
            .get(atom.segment_index as usize)
            .cloned()
            .unwrap_or_default(),
        pattern_parts: atom.parts.clone(),
    })
}

fn pattern_error_code(err: &PatternError) -> DiagnosticCode {
    match err {
        PatternError::TooLarge { .. } => codes::IR_EXPANSION_CAP,
        _ => codes::IR_PATTERN_PARSE,
    }
}

fn push_pattern_error(
    diagnostics: &mut Vec<Diagnostic>,
    expr: &str,
    err: &PatternError,
    span: Option<SourceSpan>,
) {
    diagnostics.push(
        Diagnostic::error(
            pattern_error_code(err),
            format!("invalid pattern expression `{}`: {}", expr, err),
        )
        .with_span(span),
    );
}

fn atomize_module(
    module: &ModuleGraph,
    options: ExpandOptions,
    diagnostics: &mut Vec<Diagnostic>,
) -> AtomizedModuleGraph {
    let mut out = AtomizedModuleGraph {
        id: module.id.clone(),
        ports: Vec::new(),
        parameters: module.parameters.clone(),
        variables: module.variables.clone(),
        nets: Vec::new(),
        instances: Vec::new(),
        endpoints: Vec::new(),
        span: module.span,
    };

    // Instances first so endpoint targets can be checked.
    let mut instance_names: HashSet<String> = HashSet::new();
    for bundle in &module.instance_bundles {
        let expansion = match expand(&bundle.name.text, &bundle.name.axes, options) {
            Ok(expansion) => expansion,
            Err(err) => {
                push_pattern_error(diagnostics, &bundle.name.text, &err, bundle.span);
                continue;
            }
        };
        for atom in &expansion.atoms {
            if !instance_names.insert(atom.text.clone()) {
                diagnostics.push(
                    Diagnostic::error(
                        codes::IR_COLLISION,
                        format!("duplicate instance `{}`", atom.text),
                    )
                    .with_span(bundle.span),
                );
                continue;
            }
            out.instances.push(AtomizedInstance {
                name: atom.text.clone(),
                ref_symbol: bundle.ref_symbol.clone(),
                ref_file_id: bundle.ref_file_id,
                ref_kind: bundle.ref_kind,
                parameters: bundle.parameters.clone(),
                origin: origin_from_atom(bundle.expr_id, atom, &expansion),
                span: bundle.span,
            });
        }
    }

    // Nets, tracking the global atom offset per bundle for endpoint binding.
    let mut net_names: HashMap<String, usize> = HashMap::new();
    let mut bundle_expansions: Vec<Option<(usize, Expansion, &NetBundle)>> = Vec::new();
    for bundle in &module.net_bundles {
        let net_options = ExpandOptions { forbid_splice: bundle.is_port, ..options };
        let expansion = match expand(&bundle.name.text, &bundle.name.axes, net_options) {
            Ok(expansion) => expansion,
            Err(err) => {
                push_pattern_error(diagnostics, &bundle.name.text, &err, bundle.span);
                bundle_expansions.push(None);
                continue;
            }
        };
        let base = out.nets.len();
        for atom in &expansion.atoms {
            if net_names.contains_key(&atom.text) {
                diagnostics.push(
                    Diagnostic::error(codes::IR_COLLISION, format!("duplicate net `{}`", atom.text))
                        .with_span(bundle.span),
                );
            } else {
                net_names.insert(atom.text.clone(), out.nets.len());
            }
            out.nets.push(AtomizedNet {
                name: atom.text.clone(),
                is_port: bundle.is_port,
                origin: origin_from_atom(bundle.expr_id, atom, &expansion),
                span: bundle.span,
            });
        }
        bundle_expansions.push(Some((base, expansion, bundle)));
    }

    // Final port order: expand the port expressions and keep first use.
    for port in &module.ports {
        match expand(&port.text, &port.axes, options) {
            Ok(expansion) => {
                for atom in &expansion.atoms {
                    if !out.ports.iter().any(|p| p == &atom.text) {
                        out.ports.push(atom.text.clone());
                    }
                    if !net_names.contains_key(&atom.text) {
                        // Ports without an explicit net get an implicit one.
                        net_names.insert(atom.text.clone(), out.nets.len());
                        out.nets.push(AtomizedNet {
                            name: atom.text.clone(),
                            is_port: true,
                            origin: origin_from_atom(
                                crate::graph::ExprId(u32::MAX),
                                atom,
                                &expansion,
                            ),
                            span: port.span,
                        });
                    }
                }
            }
            Err(err) => push_pattern_error(diagnostics, &port.text, &err, port.span),
        }
    }

    // Endpoint binding: bound pins are unique per (instance, pin).
    let mut bound_pins: HashMap<(String, String), (usize, bool, bool)> = HashMap::new();
    for entry in bundle_expansions.into_iter().flatten() {
        let (base, net_expansion, bundle) = entry;
        for endpoint in &bundle.endpoints {
            let (endpoint_atoms, _dims) =
                match expand_endpoints(&endpoint.expr.text, &endpoint.expr.axes, options) {
                    Ok(expanded) => expanded,
                    Err(err) => {
                        push_pattern_error(diagnostics, &endpoint.expr.text, &err, endpoint.span);
                        continue;
                    }
                };
            // Rebuild an expansion view for binding.
            let endpoint_expansion = match expand(&endpoint.expr.text, &endpoint.expr.axes, options)
            {
                Ok(expansion) => expansion,
                Err(_) => continue,
            };
            let binding = match bind(&net_expansion, &endpoint_expansion) {
                Ok(binding) => binding,
                Err(err) => {
                    diagnostics.push(
                        Diagnostic::error(
                            codes::IR_BIND_MISMATCH,
                            format!(
                                "cannot bind `{}` to `{}`: {}",
                                endpoint.expr.text, bundle.name.text, err
                            ),
                        )
                        .with_span(endpoint.span),
                    );
                    continue;
                }
            };
            for (net_offset, endpoint_indices) in binding.iter().enumerate() {
                for &j in endpoint_indices {
                    let atom = &endpoint_atoms[j];
                    if !instance_names.contains(&atom.instance) {
                        diagnostics.push(
                            Diagnostic::error(
                                codes::IR_LOCAL_UNRESOLVED,
                                format!(
                                    "endpoint `{}.{}` references unknown instance `{}`",
                                    atom.instance, atom.pin, atom.instance
                                ),
                            )
                            .with_span(endpoint.span),
                        );
                        continue;
                    }
                    let net_index = base + net_offset;
                    let key = (atom.instance.clone(), atom.pin.clone());
                    match bound_pins.get(&key).copied() {
                        Some((existing_net, existing_default, existing_suppressed)) => {
                            if existing_net == net_index {
                                continue;
                            }
                            if endpoint.from_default {
                                // Explicit binding wins over the default.
                                if !endpoint.suppress_override_warning {
                                    diagnostics.push(
                                        Diagnostic::warning(
                                            codes::IR_DEFAULT_OVERRIDDEN,
                                            format!(
                                                "default binding for `{}.{}` overridden by `{}`",
                                                atom.instance,
                                                atom.pin,
                                                out.nets[existing_net].name
                                            ),
                                        )
                                        .with_span(endpoint.span),
                                    );
                                }
                                continue;
                            }
                            if existing_default {
                                // The default came first; replace it.
                                if !existing_suppressed {
                                    diagnostics.push(
                                        Diagnostic::warning(
                                            codes::IR_DEFAULT_OVERRIDDEN,
                                            format!(
                                                "default binding for `{}.{}` overridden by `{}`",
                                                atom.instance,
                                                atom.pin,
                                                out.nets[net_index].name
                                            ),
                                        )
                                        .with_span(endpoint.span),
                                    );
                                }
                                if let Some(slot) = out
                                    .endpoints
                                    .iter_mut()
                                    .find(|e| e.instance == key.0 && e.pin == key.1)
                                {
                                    slot.net = net_index;
                                    slot.from_default = false;
                                }
                                bound_pins.insert(key, (net_index, false, false));
                                continue;
                            }
                            diagnostics.push(
                                Diagnostic::error(
                                    codes::IR_COLLISION,
                                    format!(
                                        "pin `{}.{}` is bound to both `{}` and `{}`",
                                        atom.instance,
                                        atom.pin,
                                        out.nets[existing_net].name,
                                        out.nets[net_index].name
                                    ),
                                )
                                .with_span(endpoint.span),
                            );
                        }
                        None => {
                            bound_pins.insert(
                                key,
                                (net_index, endpoint.from_default, endpoint.suppress_override_warning),
                            );
                            out.endpoints.push(AtomizedEndpoint {
                                instance: atom.instance.clone(),
                                pin: atom.pin.clone(),
                                net: net_index,
                                from_default: endpoint.from_default,
                                suppress_override_warning: endpoint.suppress_override_warning,
                                origin: origin_from_atom(
                                    endpoint.expr_id,
                                    &atom.atom,
                                    &endpoint_expansion,
                                ),
                                span: endpoint.span,
                            });
                        }
                    }
                }
            }
        }
    }

    out
}
