//! Template rendering.
//!
//! `{placeholder}` substitution with validation: every placeholder must be
//! recognized by the rendering context before any text is produced, and
//! display names honor the backend's `pattern_rendering` for numeric
//! pattern provenance.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::atomize::AtomizedPatternOrigin;
use crate::diagnostics::{codes, Diagnostic};
use crate::parse_util::SourceSpan;

static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap());

/// Placeholder names used in `template`, in first-use order.
pub fn placeholders(template: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for caps in PLACEHOLDER_RE.captures_iter(template) {
        let name = caps.get(1).unwrap().as_str().to_string();
        if !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

/// Verify `template` against a context: unknown placeholders are errors,
/// recognized placeholders without a value are errors. `{name}` and
/// `{ports}` need not appear in any template.
pub fn validate_template(
    key: &str,
    template: &str,
    context: &IndexMap<String, String>,
    span: Option<SourceSpan>,
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for name in placeholders(template) {
        match context.get(&name) {
            None => diagnostics.push(
                Diagnostic::error(
                    codes::EMIT_UNKNOWN_PLACEHOLDER,
                    format!("template `{}` uses unknown placeholder `{{{}}}`", key, name),
                )
                .with_span(span),
            ),
            // `{name}` and `{ports}` are the only placeholders allowed to
            // render empty.
            Some(value) if value.is_empty() && name != "name" && name != "ports" => diagnostics
                .push(
                    Diagnostic::error(
                        codes::EMIT_MISSING_PLACEHOLDER,
                        format!("template `{}` placeholder `{{{}}}` has no value", key, name),
                    )
                    .with_span(span),
                ),
            Some(_) => {}
        }
    }
    diagnostics
}

/// Substitute the context into `template`. Unrecognized placeholders pass
/// through so best-effort output stays readable after a validation error.
pub fn render(template: &str, context: &IndexMap<String, String>) -> String {
    PLACEHOLDER_RE
        .replace_all(template, |caps: &regex::Captures| {
            let name = caps.get(1).unwrap().as_str();
            context
                .get(name)
                .cloned()
                .unwrap_or_else(|| caps.get(0).unwrap().as_str().to_string())
        })
        .to_string()
}

/// Format a display name from pattern provenance: alphabetic parts join
/// with `_`, numeric parts render through the backend's `pattern_rendering`
/// format (`,`-joined when an atom spans several numeric axes).
pub fn format_display_name(
    fallback: &str,
    origin: Option<&AtomizedPatternOrigin>,
    pattern_rendering: &str,
) -> String {
    let Some(origin) = origin else {
        return fallback.to_string();
    };
    if origin.pattern_parts.is_empty() {
        return fallback.to_string();
    }
    let mut numeric: Vec<&str> = Vec::new();
    let mut display = origin.base_name.clone();
    for part in &origin.pattern_parts {
        if part.parse::<i64>().is_ok() {
            numeric.push(part);
        } else {
            display.push('_');
            display.push_str(part);
        }
    }
    if numeric.is_empty() {
        return fallback.to_string();
    }
    display.push_str(&pattern_rendering.replace("{N}", &numeric.join(",")));
    display
}
