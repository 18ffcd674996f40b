//! Diagnostics
//!
//! Code-tagged errors and warnings with source spans, a collecting sink with
//! a deterministic total order, and text/JSON renderers.

pub mod codes;
pub mod render;

use serde::{Deserialize, Serialize};

use crate::parse_util::SourceSpan;

/// Closed severity set. The discriminant order is the sort order: errors
/// render before warnings, warnings before notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
        }
    }
}

/// Diagnostic kind, the prefix of the code tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DiagnosticKind {
    Parse,
    Ast,
    Import,
    Ir,
    Emit,
    View,
    Tool,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::Parse => "PARSE",
            DiagnosticKind::Ast => "AST",
            DiagnosticKind::Import => "IMPORT",
            DiagnosticKind::Ir => "IR",
            DiagnosticKind::Emit => "EMIT",
            DiagnosticKind::View => "VIEW",
            DiagnosticKind::Tool => "TOOL",
        }
    }
}

/// A `KIND-NNN` code tag, e.g. `IR-001`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DiagnosticCode {
    pub kind: DiagnosticKind,
    pub number: u16,
}

impl DiagnosticCode {
    pub const fn new(kind: DiagnosticKind, number: u16) -> Self {
        DiagnosticCode { kind, number }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{:03}", self.kind.as_str(), self.number)
    }
}

/// Secondary span with a caption.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub span: SourceSpan,
    pub caption: String,
}

/// A machine-applicable replacement.
#[derive(Debug, Clone, PartialEq)]
pub struct FixIt {
    pub span: SourceSpan,
    pub replacement: String,
    pub description: String,
}

/// Note appended by the collector to any diagnostic that lacks a primary
/// span. Pipeline stages must never produce one for user-input failures.
pub const NO_SPAN_NOTE: &str = "no primary source span";

/// A single compiler diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub message: String,
    pub primary_span: Option<SourceSpan>,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
    pub help: Option<String>,
    pub fix_its: Vec<FixIt>,
}

impl Diagnostic {
    pub fn new(code: DiagnosticCode, severity: Severity, message: impl Into<String>) -> Self {
        Diagnostic {
            code,
            severity,
            message: message.into(),
            primary_span: None,
            labels: Vec::new(),
            notes: Vec::new(),
            help: None,
            fix_its: Vec::new(),
        }
    }

    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Diagnostic::new(code, Severity::Error, message)
    }

    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Diagnostic::new(code, Severity::Warning, message)
    }

    pub fn note(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Diagnostic::new(code, Severity::Note, message)
    }

    pub fn with_span(mut self, span: Option<SourceSpan>) -> Self {
        self.primary_span = span;
        self
    }

    pub fn with_label(mut self, span: SourceSpan, caption: impl Into<String>) -> Self {
        self.labels.push(Label { span, caption: caption.into() });
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_fix_it(mut self, fix_it: FixIt) -> Self {
        self.fix_its.push(fix_it);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Accumulating sink. Every stage appends; the driver sorts once at the end.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diags: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        DiagnosticCollector::default()
    }

    pub fn emit(&mut self, mut diag: Diagnostic) {
        if diag.primary_span.is_none() && !diag.notes.iter().any(|n| n == NO_SPAN_NOTE) {
            diag.notes.push(NO_SPAN_NOTE.to_string());
        }
        self.diags.push(diag);
    }

    pub fn extend(&mut self, diags: impl IntoIterator<Item = Diagnostic>) {
        for diag in diags {
            self.emit(diag);
        }
    }

    pub fn has_errors(&self) -> bool {
        self.diags.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.diags.iter().filter(|d| d.severity == Severity::Error).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diags.iter().filter(|d| d.severity == Severity::Warning).count()
    }

    pub fn len(&self) -> usize {
        self.diags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diags.iter()
    }

    /// Deterministic total order: severity desc, code asc, primary span
    /// (file, line, col) asc with span-less entries last, insertion order.
    pub fn into_sorted(self) -> Vec<Diagnostic> {
        let mut indexed: Vec<(usize, Diagnostic)> = self.diags.into_iter().enumerate().collect();
        indexed.sort_by(|(ia, a), (ib, b)| {
            a.severity
                .cmp(&b.severity)
                .then_with(|| a.code.cmp(&b.code))
                .then_with(|| span_order(a.primary_span).cmp(&span_order(b.primary_span)))
                .then_with(|| ia.cmp(ib))
        });
        indexed.into_iter().map(|(_, d)| d).collect()
    }
}

fn span_order(span: Option<SourceSpan>) -> (u32, u32, u32, u32) {
    match span {
        Some(s) => {
            let (file, line, col) = s.sort_key();
            (0, file, line, col)
        }
        None => (1, 0, 0, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_util::FileId;

    fn span(file: u32, line: u32, col: u32) -> SourceSpan {
        SourceSpan::new(FileId(file), line, col, 1)
    }

    #[test]
    fn test_code_display() {
        let code = DiagnosticCode::new(DiagnosticKind::Ir, 1);
        assert_eq!(code.to_string(), "IR-001");
    }

    #[test]
    fn test_errors_sort_before_warnings() {
        let mut sink = DiagnosticCollector::new();
        sink.emit(Diagnostic::warning(codes::IR_BIND_MISMATCH, "w").with_span(Some(span(0, 1, 1))));
        sink.emit(Diagnostic::error(codes::EMIT_TOP, "e").with_span(Some(span(0, 9, 9))));
        let sorted = sink.into_sorted();
        assert_eq!(sorted[0].severity, Severity::Error);
        assert_eq!(sorted[1].severity, Severity::Warning);
    }

    #[test]
    fn test_same_severity_sorts_by_code_then_span() {
        let mut sink = DiagnosticCollector::new();
        sink.emit(Diagnostic::error(codes::IR_COLLISION, "b").with_span(Some(span(0, 1, 1))));
        sink.emit(Diagnostic::error(codes::IR_BIND_MISMATCH, "a2").with_span(Some(span(0, 5, 1))));
        sink.emit(Diagnostic::error(codes::IR_BIND_MISMATCH, "a1").with_span(Some(span(0, 2, 1))));
        let sorted = sink.into_sorted();
        assert_eq!(sorted[0].message, "a1");
        assert_eq!(sorted[1].message, "a2");
        assert_eq!(sorted[2].message, "b");
    }

    #[test]
    fn test_spanless_diagnostic_gets_marker_note() {
        let mut sink = DiagnosticCollector::new();
        sink.emit(Diagnostic::error(codes::TOOL_LOG_WRITE, "cannot write log"));
        let sorted = sink.into_sorted();
        assert!(sorted[0].notes.iter().any(|n| n == NO_SPAN_NOTE));
    }

    #[test]
    fn test_spanned_diagnostic_has_no_marker_note() {
        let mut sink = DiagnosticCollector::new();
        sink.emit(Diagnostic::error(codes::IR_COLLISION, "dup").with_span(Some(span(0, 1, 1))));
        let sorted = sink.into_sorted();
        assert!(sorted[0].notes.is_empty());
    }
}
