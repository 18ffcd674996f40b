//! Emission behavior through the full pipeline: templates, pin checks,
//! pattern rendering.

use std::fs;
use std::path::PathBuf;

use asdl_compiler::diagnostics::codes;
use asdl_compiler::{compile, CompileOptions};

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir()
        .join("asdl-emitter-tests")
        .join(format!("{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

fn options() -> CompileOptions {
    CompileOptions {
        timestamp: Some(("2025-01-01".to_string(), "00:00:00".to_string())),
        ..Default::default()
    }
}

fn compile_source(name: &str, source: &str, options: CompileOptions) -> asdl_compiler::CompileArtifacts {
    let dir = scratch(name);
    let entry = dir.join("design.asdl");
    fs::write(&entry, source).unwrap();
    compile(&entry, &options)
}

#[test]
fn should_report_a_missing_pin() {
    let source = "\
top: m
modules:
  m:
    nets:
      $a: [R1.p]
    instances:
      R1: res_dev
devices:
  res_dev:
    ports: [p, n]
    backends:
      ngspice:
        template: \"R {name} {ports} 1k\"
";
    let artifacts = compile_source("missing-pin", source, options());
    assert!(artifacts.has_errors());
    assert!(artifacts
        .diagnostics
        .iter()
        .any(|d| d.code == codes::EMIT_MISSING_PIN && d.message.contains("`n`")));
    assert!(artifacts.netlist.is_none());
}

#[test]
fn should_report_an_extra_pin() {
    let source = "\
top: m
modules:
  m:
    nets:
      $a: [R1.p]
      $b: [R1.x]
    instances:
      R1: res_dev
devices:
  res_dev:
    ports: [p]
    backends:
      ngspice:
        template: \"R {name} {ports} 1k\"
";
    let artifacts = compile_source("extra-pin", source, options());
    assert!(artifacts
        .diagnostics
        .iter()
        .any(|d| d.code == codes::EMIT_EXTRA_PIN && d.message.contains("`x`")));
}

#[test]
fn should_report_unknown_placeholders() {
    let source = "\
top: m
modules:
  m:
    nets:
      $a: [R1.p]
    instances:
      R1: res_dev
devices:
  res_dev:
    ports: [p]
    backends:
      ngspice:
        template: \"R {name} {ports} {mystery}\"
";
    let artifacts = compile_source("unknown-placeholder", source, options());
    assert!(artifacts
        .diagnostics
        .iter()
        .any(|d| d.code == codes::EMIT_UNKNOWN_PLACEHOLDER && d.message.contains("mystery")));
    assert!(artifacts.netlist.is_none());
}

#[test]
fn should_report_unknown_backends() {
    let source = "\
top: m
modules:
  m:
    instances:
      R1: res_dev
devices:
  res_dev:
    ports: [p]
    backends:
      ngspice:
        template: \"R {name} {ports} 1k\"
";
    let artifacts = compile_source(
        "unknown-backend",
        source,
        CompileOptions { backend: "sim.xyce".to_string(), ..options() },
    );
    assert!(artifacts
        .diagnostics
        .iter()
        .any(|d| d.code == codes::EMIT_UNKNOWN_BACKEND));
}

#[test]
fn should_format_numeric_names_with_pattern_rendering() {
    let backend_config = "\
backends:
  sim.ngspice:
    extension: .spice
    pattern_rendering: \"[{N}]\"
";
    let source = "\
top: m
modules:
  m:
    nets:
      $bus<2:1>: [X<2:1>.p]
    instances:
      X<2:1>: res_dev
devices:
  res_dev:
    ports: [p]
    backends:
      ngspice:
        template: \"R {name} {ports} 1k\"
";
    let artifacts = compile_source(
        "pattern-rendering",
        source,
        CompileOptions {
            backend_config_source: Some(backend_config.to_string()),
            top_as_subckt: true,
            ..options()
        },
    );
    assert!(!artifacts.has_errors(), "{:?}", artifacts.diagnostics);
    let netlist = artifacts.netlist.unwrap();
    assert!(netlist.contains(".subckt m bus[2] bus[1]"), "{}", netlist);
    assert!(netlist.contains("R X[2] bus[2] 1k"), "{}", netlist);
    assert!(netlist.contains("R X[1] bus[1] 1k"), "{}", netlist);
}

#[test]
fn should_use_backend_config_templates_as_fallback() {
    // The device declares no template for the selected backend; the
    // backend config's `templates` table supplies one by device name.
    let backend_config = "\
backends:
  sim.xyce:
    extension: .cir
    templates:
      res_dev: \"RX {name} {ports} 2k\"
";
    let source = "\
top: m
modules:
  m:
    nets:
      $a: [R1.p]
    instances:
      R1: res_dev
devices:
  res_dev:
    ports: [p]
    backends:
      ngspice:
        template: \"R {name} {ports} 1k\"
";
    let artifacts = compile_source(
        "config-template-fallback",
        source,
        CompileOptions {
            backend: "sim.xyce".to_string(),
            backend_config_source: Some(backend_config.to_string()),
            ..options()
        },
    );
    assert!(!artifacts.has_errors(), "{:?}", artifacts.diagnostics);
    assert!(artifacts.netlist.unwrap().contains("RX R1 a 2k"));
    assert_eq!(artifacts.extension, ".cir");
}

#[test]
fn should_report_missing_device_templates() {
    let backend_config = "\
backends:
  sim.xyce:
    extension: .cir
";
    let source = "\
top: m
modules:
  m:
    nets:
      $a: [R1.p]
    instances:
      R1: res_dev
devices:
  res_dev:
    ports: [p]
    backends:
      ngspice:
        template: \"R {name} {ports} 1k\"
";
    let artifacts = compile_source(
        "no-template",
        source,
        CompileOptions {
            backend: "sim.xyce".to_string(),
            backend_config_source: Some(backend_config.to_string()),
            ..options()
        },
    );
    assert!(artifacts
        .diagnostics
        .iter()
        .any(|d| d.code == codes::EMIT_NO_TEMPLATE));
}
