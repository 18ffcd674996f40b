//! Marked YAML reader behavior on realistic documents.

use asdl_compiler::diagnostics::codes;
use asdl_compiler::parse_util::FileId;
use asdl_compiler::yaml::parse_document;

const DOCUMENT: &str = "\
# two-stage amplifier
top: amp
imports:
  stdlib: ./cells/stdlib.asdl

modules:
  amp:
    ports: [in_p, in_n, out, vdd, vss]
    parameters:
      gain: 10
    nets:
      $in<p|n>: [gm<p|n>.g]
      $out: [load.d]
    instances:
      gm<p|n>: stdlib.nmos w=2u
      load: {ref: stdlib.pmos, parameters: {w: 4u}}

devices:
  cap:
    ports: [a, b]
    backends:
      ngspice:
        template: |
          C{name} {ports} {c}
";

#[test]
fn should_parse_a_realistic_document_without_errors() {
    let result = parse_document(DOCUMENT, FileId(0));
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    let root = result.root.unwrap();

    let amp = root.get("modules").unwrap().get("amp").unwrap();
    let ports = amp.get("ports").unwrap().as_sequence().unwrap();
    assert_eq!(ports.len(), 5);
    assert_eq!(ports[0].as_str(), Some("in_p"));

    // Pattern keys with `<...>` survive the key/value split.
    let nets = amp.get("nets").unwrap().as_mapping().unwrap();
    assert_eq!(nets[0].0.text, "$in<p|n>");
    assert_eq!(
        nets[0].1.as_sequence().unwrap()[0].as_str(),
        Some("gm<p|n>.g")
    );

    // Inline shorthand stays a single scalar.
    let instances = amp.get("instances").unwrap().as_mapping().unwrap();
    assert_eq!(instances[0].1.as_str(), Some("stdlib.nmos w=2u"));

    // Flow-mapping instance form.
    let load = &instances[1].1;
    assert_eq!(load.get("ref").unwrap().as_str(), Some("stdlib.pmos"));

    // Block scalar template keeps its newline.
    let template = root
        .get("devices")
        .unwrap()
        .get("cap")
        .unwrap()
        .get("backends")
        .unwrap()
        .get("ngspice")
        .unwrap()
        .get("template")
        .unwrap();
    assert_eq!(template.as_str(), Some("C{name} {ports} {c}\n"));
}

#[test]
fn should_attach_line_and_column_spans() {
    let result = parse_document("a: 1\nb:\n  c: x\n", FileId(7));
    let root = result.root.unwrap();
    let entries = root.as_mapping().unwrap();
    assert_eq!(entries[0].0.span.line, 1);
    assert_eq!(entries[0].0.span.col, 1);
    let c = root.get("b").unwrap().as_mapping().unwrap();
    assert_eq!(c[0].0.span.line, 3);
    assert_eq!(c[0].0.span.col, 3);
    assert_eq!(c[0].0.span.file, FileId(7));
}

#[test]
fn should_report_tabs_in_indentation() {
    let result = parse_document("a:\n\tb: 1\n", FileId(0));
    assert!(result.errors.iter().any(|e| e.code == codes::PARSE_TAB_INDENT));
}

#[test]
fn should_reject_a_sequence_root() {
    let result = parse_document("- one\n- two\n", FileId(0));
    assert!(result.root.is_none());
    assert_eq!(result.errors[0].code, codes::PARSE_ROOT_NOT_MAPPING);
}

#[test]
fn should_report_unterminated_quotes() {
    let result = parse_document("a: 'open\n", FileId(0));
    assert!(result.errors.iter().any(|e| e.code == codes::PARSE_SYNTAX));
}
