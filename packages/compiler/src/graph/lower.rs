//! AST -> PatternedGraph lowering.
//!
//! Resolves instance references through the per-file name environment,
//! substitutes module variables into instance parameters (before any
//! pattern expansion), applies `instance_defaults`, and interns every
//! pattern expression into the registry.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::nodes::{Document, ModuleDecl, PatternExpr};
use crate::diagnostics::{codes, Diagnostic};
use crate::imports::resolver::RefError;
use crate::imports::ProgramDB;
use crate::parse_util::{FileId, Spanned};
use crate::pattern::parse_expression;

use super::ir::{
    DeviceGraph, EndpointBundle, InstanceBundle, ModuleGraph, ModuleId, NetBundle, PatternOrigin,
    ProgramGraph,
};
use super::registry::{ExprKind, Registries, TemplateEntry};

/// `{name}` references inside variable and parameter values.
static VAR_REF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap());

/// Lowering output.
#[derive(Debug)]
pub struct LowerResult {
    pub graph: Option<ProgramGraph>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Lower every document of the program into one graph.
pub fn lower_program(db: &ProgramDB) -> LowerResult {
    let mut diagnostics = Vec::new();
    let mut registries = Registries::default();
    let mut modules = Vec::new();
    let mut devices = Vec::new();

    for (&file, document) in &db.documents {
        lower_document(db, file, document, &mut registries, &mut modules, &mut devices, &mut diagnostics);
    }

    let graph = ProgramGraph { entry_file_id: db.entry, modules, devices, registries };
    LowerResult { graph: Some(graph), diagnostics }
}

fn lower_document(
    db: &ProgramDB,
    file: FileId,
    document: &Document,
    registries: &mut Registries,
    modules: &mut Vec<ModuleGraph>,
    devices: &mut Vec<DeviceGraph>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for module in document.modules.values() {
        modules.push(lower_module(db, file, module, registries, diagnostics));
    }
    for device in document.devices.values() {
        let mut backends = Vec::new();
        for (backend_name, backend) in &device.backends {
            backends.push(backend_name.clone());
            registries.templates.insert(
                file,
                &device.name,
                backend_name,
                TemplateEntry {
                    template: backend.template.clone(),
                    variables: backend
                        .variables
                        .iter()
                        .map(|(k, v)| (k.clone(), v.value.clone()))
                        .collect(),
                },
            );
        }
        devices.push(DeviceGraph {
            id: ModuleId::new(file, &device.name),
            ports: device.ports.iter().map(|p| p.value.clone()).collect(),
            parameters: to_string_map(&device.parameters),
            variables: to_string_map(&device.variables),
            backends,
            span: device.span,
        });
    }
}

fn lower_module(
    db: &ProgramDB,
    file: FileId,
    module: &ModuleDecl,
    registries: &mut Registries,
    diagnostics: &mut Vec<Diagnostic>,
) -> ModuleGraph {
    let variables = resolve_variables(&module.variables, diagnostics);

    let mut graph = ModuleGraph {
        id: ModuleId::new(file, &module.name),
        ports: module
            .ports
            .iter()
            .map(|p| PatternExpr::new(p.value.clone(), p.span))
            .collect(),
        parameters: to_string_map(&module.parameters),
        variables: variables.clone(),
        net_bundles: Vec::new(),
        instance_bundles: Vec::new(),
        span: module.span,
    };

    let mut next_net = 0u32;
    let mut next_endpoint = 0u32;

    // Explicit nets; `$`-nets contribute ports in authoring order.
    for net in &module.nets {
        let (is_port, name) = strip_port_sentinel(&net.name);
        let expr_id = registries.expressions.intern(
            ExprKind::Net,
            &net.name.text,
            net.name.span,
            &net.name.axes,
        );
        if is_port && !graph.ports.iter().any(|p| p.text == name.text) {
            graph.ports.push(name.clone());
        }
        let mut endpoints = Vec::new();
        for endpoint in &net.endpoints {
            let endpoint_id = registries.expressions.intern(
                ExprKind::Endpoint,
                &endpoint.text,
                endpoint.span,
                &endpoint.axes,
            );
            endpoints.push(EndpointBundle {
                id: next_endpoint,
                expr: endpoint.clone(),
                expr_id: endpoint_id,
                from_default: false,
                suppress_override_warning: false,
                span: endpoint.span,
            });
            next_endpoint += 1;
        }
        graph.net_bundles.push(NetBundle {
            id: next_net,
            origin: origin_for(expr_id, &name.text),
            name,
            expr_id,
            is_port,
            endpoints,
            span: net.span,
        });
        next_net += 1;
    }

    // Defaults attach endpoints to existing nets or introduce new ones.
    for (endpoint_expr, net_token) in &module.instance_defaults {
        let (suppress, token) = match net_token.value.strip_prefix('!') {
            Some(rest) => (true, rest.to_string()),
            None => (false, net_token.value.clone()),
        };
        let token_expr = PatternExpr::new(token, net_token.span);
        let (is_port, name) = strip_port_sentinel(&token_expr);

        let endpoint_id = registries.expressions.intern(
            ExprKind::Endpoint,
            endpoint_expr,
            net_token.span,
            &[],
        );
        let endpoint = EndpointBundle {
            id: next_endpoint,
            expr: PatternExpr::new(endpoint_expr.clone(), net_token.span),
            expr_id: endpoint_id,
            from_default: true,
            suppress_override_warning: suppress,
            span: net_token.span,
        };
        next_endpoint += 1;

        match graph.net_bundles.iter_mut().find(|b| b.name.text == name.text) {
            Some(bundle) => bundle.endpoints.push(endpoint),
            None => {
                let expr_id = registries.expressions.intern(
                    ExprKind::Net,
                    &token_expr.text,
                    net_token.span,
                    &[],
                );
                if is_port && !graph.ports.iter().any(|p| p.text == name.text) {
                    graph.ports.push(name.clone());
                }
                graph.net_bundles.push(NetBundle {
                    id: next_net,
                    origin: origin_for(expr_id, &name.text),
                    name,
                    expr_id,
                    is_port,
                    endpoints: vec![endpoint],
                    span: net_token.span,
                });
                next_net += 1;
            }
        }
    }

    for (index, instance) in module.instances.iter().enumerate() {
        let expr_id = registries.expressions.intern(
            ExprKind::Instance,
            &instance.name.text,
            instance.name.span,
            &instance.name.axes,
        );

        let (ref_file_id, ref_symbol, ref_kind) =
            match db.resolve_instance_ref(file, &instance.reference) {
                Ok((ref_file, symbol, kind)) => (ref_file, symbol, Some(kind)),
                Err(RefError::UnknownNamespace { ns }) => {
                    diagnostics.push(
                        Diagnostic::error(
                            codes::IR_QUALIFIED_UNRESOLVED,
                            format!(
                                "`{}` does not resolve: namespace `{}` is not imported",
                                instance.ref_raw, ns
                            ),
                        )
                        .with_span(instance.span),
                    );
                    (FileId::UNKNOWN, instance.reference.decorated_symbol(), None)
                }
                Err(RefError::UnknownSymbol { qualified, symbol }) => {
                    let code = if qualified {
                        codes::IR_QUALIFIED_UNRESOLVED
                    } else {
                        codes::IR_LOCAL_UNRESOLVED
                    };
                    let message = if qualified {
                        format!("`{}` does not resolve in the imported file", instance.ref_raw)
                    } else {
                        format!("`{}` is not defined in this file", symbol)
                    };
                    diagnostics.push(Diagnostic::error(code, message).with_span(instance.span));
                    (FileId::UNKNOWN, symbol, None)
                }
            };

        let mut parameters = IndexMap::new();
        for (key, value) in &instance.parameters {
            let substituted =
                substitute_variables(value, &variables, &graph.parameters, diagnostics);
            if substituted.contains('<') {
                registries.expressions.intern(ExprKind::Param, &substituted, value.span, &[]);
            }
            parameters.insert(key.clone(), substituted);
        }

        graph.instance_bundles.push(InstanceBundle {
            id: index as u32,
            origin: origin_for(expr_id, &instance.name.text),
            name: instance.name.clone(),
            expr_id,
            reference: instance.reference.clone(),
            ref_symbol,
            ref_file_id,
            ref_kind: ref_kind.unwrap_or(crate::imports::SymbolKind::Module),
            parameters,
            span: instance.span,
        });
    }

    graph
}

/// Bundle origin: the stem of the first segment, or the raw text when the
/// expression does not parse (atomization reports that).
fn origin_for(expr_id: super::registry::ExprId, text: &str) -> PatternOrigin {
    let base_name = parse_expression(text)
        .ok()
        .and_then(|segments| segments.first().map(|s| s.base_name()))
        .unwrap_or_else(|| text.to_string());
    PatternOrigin { expression_id: expr_id, segment_index: 0, base_name }
}

fn strip_port_sentinel(expr: &PatternExpr) -> (bool, PatternExpr) {
    match expr.text.strip_prefix('$') {
        Some(stripped) => (
            true,
            PatternExpr { text: stripped.to_string(), axes: expr.axes.clone(), span: expr.span },
        ),
        None => (false, expr.clone()),
    }
}

fn to_string_map(map: &IndexMap<String, Spanned<String>>) -> IndexMap<String, String> {
    map.iter().map(|(k, v)| (k.clone(), v.value.clone())).collect()
}

/// Resolve module variables recursively; cycles and undefined references
/// are errors.
fn resolve_variables(
    variables: &IndexMap<String, Spanned<String>>,
    diagnostics: &mut Vec<Diagnostic>,
) -> IndexMap<String, String> {
    let mut resolved: IndexMap<String, String> = IndexMap::new();
    for name in variables.keys() {
        let mut visiting = Vec::new();
        resolve_one(name, variables, &mut resolved, &mut visiting, diagnostics);
    }
    resolved
}

fn resolve_one(
    name: &str,
    variables: &IndexMap<String, Spanned<String>>,
    resolved: &mut IndexMap<String, String>,
    visiting: &mut Vec<String>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<String> {
    if let Some(done) = resolved.get(name) {
        return Some(done.clone());
    }
    let value = variables.get(name)?;
    if visiting.iter().any(|v| v == name) {
        diagnostics.push(
            Diagnostic::error(
                codes::IR_VARIABLE_CYCLE,
                format!("variable `{}` expands through itself ({} -> {})", name, visiting.join(" -> "), name),
            )
            .with_span(value.span),
        );
        return None;
    }
    visiting.push(name.to_string());

    let mut failed = false;
    let out = VAR_REF_RE
        .replace_all(&value.value, |caps: &regex::Captures| {
            let inner = caps.get(1).unwrap().as_str();
            match resolve_one(inner, variables, resolved, visiting, diagnostics) {
                Some(resolved_value) => resolved_value,
                None => {
                    if !variables.contains_key(inner) {
                        diagnostics.push(
                            Diagnostic::error(
                                codes::IR_VARIABLE_UNDEFINED,
                                format!("variable `{}` is not defined", inner),
                            )
                            .with_span(value.span),
                        );
                    }
                    failed = true;
                    caps.get(0).unwrap().as_str().to_string()
                }
            }
        })
        .to_string();
    visiting.pop();
    if failed {
        return None;
    }
    resolved.insert(name.to_string(), out.clone());
    Some(out)
}

/// Substitute `{var}` references in an instance parameter value. Module
/// parameter names are left intact for emission-time binding; anything else
/// unknown is an error.
fn substitute_variables(
    value: &Spanned<String>,
    variables: &IndexMap<String, String>,
    parameters: &IndexMap<String, String>,
    diagnostics: &mut Vec<Diagnostic>,
) -> String {
    VAR_REF_RE
        .replace_all(&value.value, |caps: &regex::Captures| {
            let name = caps.get(1).unwrap().as_str();
            if let Some(resolved) = variables.get(name) {
                resolved.clone()
            } else if parameters.contains_key(name) {
                caps.get(0).unwrap().as_str().to_string()
            } else {
                diagnostics.push(
                    Diagnostic::error(
                        codes::IR_VARIABLE_UNDEFINED,
                        format!("variable `{}` is not defined", name),
                    )
                    .with_span(value.span),
                );
                caps.get(0).unwrap().as_str().to_string()
            }
        })
        .to_string()
}
