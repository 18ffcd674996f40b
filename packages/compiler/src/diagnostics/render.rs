//! Diagnostic renderers.
//!
//! The text renderer is what the CLI prints to stderr; the JSON renderer
//! feeds the compile log. Both render spans through the [`SourceMap`] so
//! paths come out repo-relative.

use serde::Serialize;

use super::Diagnostic;
use crate::parse_util::{SourceMap, SourceSpan};

fn render_span(span: &SourceSpan, sources: &SourceMap) -> String {
    format!("{}:{}:{}", sources.display_path(span.file), span.line, span.col)
}

/// Render one diagnostic as human-readable text:
///
/// ```text
/// error[IR-002]: duplicate net `x_p`
///   --> lib/mux.asdl:14:3
///   = note: first defined here
/// ```
pub fn render_text(diag: &Diagnostic, sources: &SourceMap) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}[{}]: {}", diag.severity.as_str(), diag.code, diag.message));
    if let Some(span) = &diag.primary_span {
        out.push_str(&format!("\n  --> {}", render_span(span, sources)));
    }
    for label in &diag.labels {
        out.push_str(&format!(
            "\n  --> {}: {}",
            render_span(&label.span, sources),
            label.caption
        ));
    }
    for note in &diag.notes {
        out.push_str(&format!("\n  = note: {}", note));
    }
    if let Some(help) = &diag.help {
        out.push_str(&format!("\n  = help: {}", help));
    }
    out
}

/// Render a batch of diagnostics, one per line group, separated by newlines.
pub fn render_all_text(diags: &[Diagnostic], sources: &SourceMap) -> String {
    diags
        .iter()
        .map(|d| render_text(d, sources))
        .collect::<Vec<_>>()
        .join("\n")
}

/// JSON shape of a span as written to the compile log.
#[derive(Debug, Clone, Serialize)]
pub struct SpanJson {
    pub file: String,
    pub line: u32,
    pub col: u32,
    pub length: u32,
}

/// JSON shape of a label.
#[derive(Debug, Clone, Serialize)]
pub struct LabelJson {
    pub span: SpanJson,
    pub caption: String,
}

/// JSON shape of a diagnostic as written to the compile log.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticJson {
    pub code: String,
    pub severity: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_span: Option<SpanJson>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<LabelJson>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

fn span_json(span: &SourceSpan, sources: &SourceMap) -> SpanJson {
    SpanJson {
        file: sources.display_path(span.file),
        line: span.line,
        col: span.col,
        length: span.length,
    }
}

/// Convert a diagnostic to its JSON form.
pub fn to_json(diag: &Diagnostic, sources: &SourceMap) -> DiagnosticJson {
    DiagnosticJson {
        code: diag.code.to_string(),
        severity: diag.severity.as_str().to_string(),
        message: diag.message.clone(),
        primary_span: diag.primary_span.as_ref().map(|s| span_json(s, sources)),
        labels: diag
            .labels
            .iter()
            .map(|l| LabelJson { span: span_json(&l.span, sources), caption: l.caption.clone() })
            .collect(),
        notes: diag.notes.clone(),
        help: diag.help.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{codes, Diagnostic};
    use crate::parse_util::{FileId, SourceMap, SourceSpan};
    use std::path::{Path, PathBuf};

    fn sources_with_file() -> (SourceMap, FileId) {
        let mut map = SourceMap::new();
        map.set_base(PathBuf::from("/proj"));
        let id = map.intern(Path::new("/proj/top.asdl"), String::new());
        (map, id)
    }

    #[test]
    fn test_text_rendering_uses_relative_path() {
        let (sources, file) = sources_with_file();
        let diag = Diagnostic::error(codes::IR_COLLISION, "duplicate net `x`")
            .with_span(Some(SourceSpan::new(file, 3, 5, 1)));
        let text = render_text(&diag, &sources);
        assert_eq!(
            text,
            "error[IR-002]: duplicate net `x`\n  --> top.asdl:3:5"
        );
    }

    #[test]
    fn test_json_rendering_round_trips_code() {
        let (sources, file) = sources_with_file();
        let diag = Diagnostic::warning(codes::IR_DEFAULT_OVERRIDDEN, "overridden")
            .with_span(Some(SourceSpan::new(file, 1, 1, 4)));
        let json = serde_json::to_value(to_json(&diag, &sources)).unwrap();
        assert_eq!(json["code"], "IR-008");
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["primary_span"]["file"], "top.asdl");
    }
}
