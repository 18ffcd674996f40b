//! Deterministic diagnostic ordering and rendering.

use asdl_compiler::diagnostics::render::{render_all_text, to_json};
use asdl_compiler::diagnostics::{codes, Diagnostic, DiagnosticCollector, Severity, NO_SPAN_NOTE};
use asdl_compiler::parse_util::{FileId, SourceMap, SourceSpan};
use std::path::{Path, PathBuf};

fn span(file: u32, line: u32, col: u32) -> SourceSpan {
    SourceSpan::new(FileId(file), line, col, 1)
}

#[test]
fn should_order_by_severity_code_span_then_insertion() {
    let mut sink = DiagnosticCollector::new();
    sink.emit(Diagnostic::note(codes::IR_COLLISION, "n").with_span(Some(span(0, 1, 1))));
    sink.emit(Diagnostic::warning(codes::IR_DEFAULT_OVERRIDDEN, "w").with_span(Some(span(0, 1, 1))));
    sink.emit(Diagnostic::error(codes::IR_COLLISION, "e-late").with_span(Some(span(0, 9, 1))));
    sink.emit(Diagnostic::error(codes::IR_COLLISION, "e-early").with_span(Some(span(0, 2, 1))));
    sink.emit(Diagnostic::error(codes::IR_BIND_MISMATCH, "e-lowcode").with_span(Some(span(0, 9, 9))));

    let messages: Vec<String> =
        sink.into_sorted().into_iter().map(|d| d.message).collect();
    assert_eq!(messages, vec!["e-lowcode", "e-early", "e-late", "w", "n"]);
}

#[test]
fn should_keep_insertion_order_for_equal_keys() {
    let mut sink = DiagnosticCollector::new();
    sink.emit(Diagnostic::error(codes::IR_COLLISION, "first").with_span(Some(span(0, 1, 1))));
    sink.emit(Diagnostic::error(codes::IR_COLLISION, "second").with_span(Some(span(0, 1, 1))));
    let messages: Vec<String> =
        sink.into_sorted().into_iter().map(|d| d.message).collect();
    assert_eq!(messages, vec!["first", "second"]);
}

#[test]
fn should_mark_spanless_diagnostics() {
    let mut sink = DiagnosticCollector::new();
    sink.emit(Diagnostic::error(codes::TOOL_LOG_WRITE, "no file"));
    sink.emit(Diagnostic::error(codes::IR_COLLISION, "spanned").with_span(Some(span(0, 1, 1))));
    let sorted = sink.into_sorted();
    let spanless = sorted.iter().find(|d| d.message == "no file").unwrap();
    assert!(spanless.notes.iter().any(|n| n == NO_SPAN_NOTE));
    let spanned = sorted.iter().find(|d| d.message == "spanned").unwrap();
    assert!(spanned.notes.is_empty());
}

#[test]
fn should_render_repo_relative_paths() {
    let mut sources = SourceMap::new();
    sources.set_base(PathBuf::from("/work/project"));
    let file = sources.intern(Path::new("/work/project/lib/mux.asdl"), String::new());

    let diag = Diagnostic::error(codes::IR_COLLISION, "duplicate net `x_p`")
        .with_span(Some(SourceSpan::new(file, 14, 3, 3)));
    let text = render_all_text(&[diag.clone()], &sources);
    assert_eq!(text, "error[IR-002]: duplicate net `x_p`\n  --> lib/mux.asdl:14:3");

    let json = serde_json::to_value(to_json(&diag, &sources)).unwrap();
    assert_eq!(json["primary_span"]["file"], "lib/mux.asdl");
    assert_eq!(json["code"], "IR-002");
}

#[test]
fn should_count_severities() {
    let mut sink = DiagnosticCollector::new();
    sink.emit(Diagnostic::error(codes::IR_COLLISION, "e").with_span(Some(span(0, 1, 1))));
    sink.emit(Diagnostic::warning(codes::IR_DEFAULT_OVERRIDDEN, "w1").with_span(Some(span(0, 1, 1))));
    sink.emit(Diagnostic::warning(codes::IR_DEFAULT_OVERRIDDEN, "w2").with_span(Some(span(0, 2, 1))));
    assert!(sink.has_errors());
    assert_eq!(sink.warning_count(), 2);
    assert_eq!(sink.error_count(), 1);
    let sorted = sink.into_sorted();
    assert_eq!(sorted.iter().filter(|d| d.severity == Severity::Warning).count(), 2);
}
