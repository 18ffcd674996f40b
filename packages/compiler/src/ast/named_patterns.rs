//! Named-pattern elaboration.
//!
//! Substitutes `<@NAME>` references before any later pattern analysis.
//! Definitions are flattened first (a definition may reference other
//! definitions; referencing itself transitively is an error), then every
//! substitution site is rewritten textually. Groups introduced by a named
//! reference keep the pattern's axis identity (its tag, or its name) on the
//! surrounding [`PatternExpr`] so endpoint binding can project by axis.

use indexmap::IndexMap;

use crate::diagnostics::{codes, Diagnostic};
use crate::parse_util::{SourceSpan, Spanned};

use super::nodes::{Document, ModuleDecl, PatternExpr};

/// A flattened pattern definition.
#[derive(Debug, Clone)]
struct ResolvedPattern {
    expr: String,
    axis: String,
    group_count: usize,
}

/// Elaborate every module in place.
pub fn elaborate_document(doc: &mut Document) -> Vec<Diagnostic> {
    let mut errors = Vec::new();
    for module in doc.modules.values_mut() {
        elaborate_module(module, &mut errors);
    }
    errors
}

fn elaborate_module(module: &mut ModuleDecl, errors: &mut Vec<Diagnostic>) {
    let mut resolved = resolve_definitions(module, errors);
    // Definitions that failed to resolve already have an error at the
    // definition site; mark them so use sites do not double-report.
    for name in module.patterns.keys() {
        if !resolved.contains_key(name) {
            resolved.insert(
                name.clone(),
                ResolvedPattern { expr: String::new(), axis: String::new(), group_count: 0 },
            );
        }
    }

    for instance in &mut module.instances {
        substitute_expr(&mut instance.name, &resolved, errors);
        for value in instance.parameters.values_mut() {
            substitute_plain(value, &resolved, errors);
        }
    }
    for net in &mut module.nets {
        substitute_expr(&mut net.name, &resolved, errors);
        for endpoint in &mut net.endpoints {
            substitute_expr(endpoint, &resolved, errors);
        }
    }
    if !module.instance_defaults.is_empty() {
        let mut rewritten = IndexMap::new();
        for (key, mut value) in std::mem::take(&mut module.instance_defaults) {
            let mut key_expr = PatternExpr::new(key, value.span);
            substitute_expr(&mut key_expr, &resolved, errors);
            substitute_plain(&mut value, &resolved, errors);
            rewritten.insert(key_expr.text, value);
        }
        module.instance_defaults = rewritten;
    }
}

/// Flatten all pattern definitions of a module, detecting recursion.
fn resolve_definitions(
    module: &ModuleDecl,
    errors: &mut Vec<Diagnostic>,
) -> IndexMap<String, ResolvedPattern> {
    let mut resolved: IndexMap<String, ResolvedPattern> = IndexMap::new();
    for name in module.patterns.keys() {
        let mut visiting = Vec::new();
        resolve_one(module, name, &mut visiting, &mut resolved, errors);
    }
    resolved
}

fn resolve_one(
    module: &ModuleDecl,
    name: &str,
    visiting: &mut Vec<String>,
    resolved: &mut IndexMap<String, ResolvedPattern>,
    errors: &mut Vec<Diagnostic>,
) -> Option<ResolvedPattern> {
    if let Some(done) = resolved.get(name) {
        return Some(done.clone());
    }
    let def = module.patterns.get(name)?;
    if visiting.iter().any(|n| n == name) {
        let chain = visiting.join(" -> ");
        errors.push(
            Diagnostic::error(
                codes::AST_PATTERN_RECURSIVE,
                format!("named pattern `{}` references itself ({} -> {})", name, chain, name),
            )
            .with_span(def.span),
        );
        return None;
    }
    visiting.push(name.to_string());

    let mut expr = String::new();
    let mut ok = true;
    let mut rest = def.expr.as_str();
    while let Some((before, ref_name, after)) = next_named_ref(rest) {
        expr.push_str(before);
        match resolve_one(module, ref_name, visiting, resolved, errors) {
            Some(inner) => expr.push_str(&inner.expr),
            None => {
                if !module.patterns.contains_key(ref_name) {
                    errors.push(
                        Diagnostic::error(
                            codes::AST_PATTERN_UNDEFINED,
                            format!("named pattern `<@{}>` is not defined", ref_name),
                        )
                        .with_span(def.span),
                    );
                }
                ok = false;
            }
        }
        rest = after;
    }
    expr.push_str(rest);
    visiting.pop();
    if !ok {
        return None;
    }

    let result = ResolvedPattern {
        group_count: count_groups(&expr),
        axis: def.axis_id(name).to_string(),
        expr,
    };
    resolved.insert(name.to_string(), result.clone());
    Some(result)
}

/// Find the next `<@NAME>` in `text`; returns (before, name, after).
fn next_named_ref(text: &str) -> Option<(&str, &str, &str)> {
    let start = text.find("<@")?;
    let close = text[start..].find('>')? + start;
    let name = &text[start + 2..close];
    Some((&text[..start], name, &text[close + 1..]))
}

/// Count top-level groups in a flattened expression.
fn count_groups(expr: &str) -> usize {
    expr.chars().filter(|&c| c == '<').count()
}

/// Rewrite a pattern-expression site, recording per-group axis identities.
fn substitute_expr(
    expr: &mut PatternExpr,
    resolved: &IndexMap<String, ResolvedPattern>,
    errors: &mut Vec<Diagnostic>,
) {
    let (text, axes) = rewrite(&expr.text, expr.span, resolved, errors);
    expr.text = text;
    expr.axes = axes;
}

/// Rewrite a plain-string site (parameter values, default bindings) without
/// axis bookkeeping.
fn substitute_plain(
    value: &mut Spanned<String>,
    resolved: &IndexMap<String, ResolvedPattern>,
    errors: &mut Vec<Diagnostic>,
) {
    let (text, _) = rewrite(&value.value, value.span, resolved, errors);
    value.value = text;
}

fn rewrite(
    text: &str,
    span: Option<SourceSpan>,
    resolved: &IndexMap<String, ResolvedPattern>,
    errors: &mut Vec<Diagnostic>,
) -> (String, Vec<Option<String>>) {
    let mut out = String::new();
    let mut axes: Vec<Option<String>> = Vec::new();
    let mut rest = text;

    loop {
        // Copy anonymous groups verbatim, tracking their axis slot.
        let next_ref = rest.find("<@");
        let next_group = rest.find('<');
        match (next_group, next_ref) {
            (Some(g), r) if r != Some(g) => {
                // Anonymous group first.
                let close = match rest[g..].find('>') {
                    Some(c) => g + c,
                    None => break,
                };
                out.push_str(&rest[..=close]);
                axes.push(None);
                rest = &rest[close + 1..];
            }
            (_, Some(r)) => {
                let close = match rest[r..].find('>') {
                    Some(c) => r + c,
                    None => break,
                };
                let name = &rest[r + 2..close];
                out.push_str(&rest[..r]);
                match resolved.get(name) {
                    Some(pattern) => {
                        out.push_str(&pattern.expr);
                        for _ in 0..pattern.group_count {
                            axes.push(Some(pattern.axis.clone()));
                        }
                    }
                    None => {
                        errors.push(
                            Diagnostic::error(
                                codes::AST_PATTERN_UNDEFINED,
                                format!("named pattern `<@{}>` is not defined", name),
                            )
                            .with_span(span),
                        );
                        // Keep the site so later parse errors point at it.
                        out.push_str(&rest[r..=close]);
                        axes.push(None);
                    }
                }
                rest = &rest[close + 1..];
            }
            _ => break,
        }
    }
    out.push_str(rest);
    (out, axes)
}
