//! End-to-end pipeline scenarios.

use std::fs;
use std::path::PathBuf;

use asdl_compiler::diagnostics::{codes, NO_SPAN_NOTE};
use asdl_compiler::{compile, CompileOptions};

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir()
        .join("asdl-pipeline-tests")
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

const INVERTER: &str = "\
top: inv
modules:
  inv:
    ports: [in, out, vdd, vss]
    nets:
      $in: [M1.a]
      $out: [M1.b]
      $vdd: [M1.c]
      $vss: [M1.d]
    instances:
      M1: nmos_dev w=1u
devices:
  nmos_dev:
    ports: [a, b, c, d]
    parameters:
      w: 1u
    backends:
      ngspice:
        template: \"M {name} {ports} nch w={w}\"
";

#[test]
fn should_compile_the_minimal_inverter() {
    let dir = scratch("inverter");
    let entry = dir.join("inv.asdl");
    fs::write(&entry, INVERTER).unwrap();

    let artifacts = compile(&entry, &options());
    assert!(!artifacts.has_errors(), "{:?}", artifacts.diagnostics);
    let netlist = artifacts.netlist.as_deref().unwrap();
    assert!(netlist.contains("M M1 in out vdd vss nch w=1u"), "{}", netlist);
    assert!(netlist.ends_with(".end\n"), "{}", netlist);
    assert_eq!(
        artifacts.log.emission_name_map.get("M1").map(String::as_str),
        Some("M1")
    );
    assert_eq!(artifacts.extension, ".spice");
}

#[test]
fn should_expand_literal_alternation_ports_in_order() {
    let source = "\
top: pair
modules:
  pair:
    nets:
      $in<p|n>: [X<p|n>.a]
    instances:
      X<p|n>: res_dev
devices:
  res_dev:
    ports: [a]
    backends:
      ngspice:
        template: \"R {name} {ports} 1k\"
";
    let dir = scratch("alternation");
    let entry = dir.join("pair.asdl");
    fs::write(&entry, source).unwrap();

    let artifacts = compile(
        &entry,
        &CompileOptions { top_as_subckt: true, ..options() },
    );
    assert!(artifacts.diagnostics.is_empty(), "{:?}", artifacts.diagnostics);
    let netlist = artifacts.netlist.as_deref().unwrap();
    assert!(netlist.contains(".subckt pair in_p in_n"), "{}", netlist);
}

#[test]
fn should_broadcast_a_named_axis_across_a_tagged_row() {
    // Differently indexed ranges reconcile through the BUS axis: the net
    // side uses the pattern name BUS25, the endpoint side the tag BUS; the
    // 130-row axis broadcasts, producing 3250 endpoint atoms.
    let pins = (0..=24)
        .rev()
        .map(|i| format!("BUS_{}", i))
        .collect::<Vec<_>>()
        .join(", ");
    let source = format!(
        "\
top: matrix
modules:
  matrix:
    patterns:
      BUS25: \"<25:1>\"
      BUS0: {{expr: \"<24:0>\", tag: BUS}}
      ROW: \"<130:1>\"
    nets:
      $BUS<@BUS25>: [sw_row<@ROW>.BUS<@BUS0>]
    instances:
      sw_row<@ROW>: row_dev
devices:
  row_dev:
    ports: [{pins}]
    backends:
      ngspice:
        template: \"SW {{name}} {{ports}}\"
",
        pins = pins
    );
    let dir = scratch("axis-broadcast");
    let entry = dir.join("matrix.asdl");
    fs::write(&entry, source).unwrap();

    let artifacts = compile(&entry, &options());
    assert!(!artifacts.has_errors(), "{:?}", artifacts.diagnostics);
    assert!(artifacts.netlist.is_some());

    let design = artifacts.design.as_ref().unwrap();
    let top = design
        .modules
        .iter()
        .find(|m| m.emitted_name == "matrix")
        .unwrap();
    assert_eq!(top.ports.len(), 25);
    assert_eq!(top.ports.first().map(String::as_str), Some("BUS_25"));
    assert_eq!(top.ports.last().map(String::as_str), Some("BUS_1"));
    assert_eq!(top.instances.len(), 130);

    // Every row connects all 25 bus pins: 3250 bindings in total.
    let total: usize = top.instances.iter().map(|i| i.conns.len()).sum();
    assert_eq!(total, 3250);

    // Positions pair by index within the axis: BUS_25 <-> BUS_24 pin,
    // BUS_1 <-> BUS_0 pin, identically on every row.
    for name in ["sw_row_1", "sw_row_130"] {
        let row = top.instances.iter().find(|i| i.name == name).unwrap();
        assert_eq!(row.conns.get("BUS_24").map(String::as_str), Some("BUS_25"));
        assert_eq!(row.conns.get("BUS_0").map(String::as_str), Some("BUS_1"));
    }
}

#[test]
fn should_fail_on_an_import_cycle() {
    let dir = scratch("cycle");
    fs::write(
        dir.join("a.asdl"),
        "imports:\n  b: ./b.asdl\ntop: ma\nmodules:\n  ma:\n    ports: [x]\n",
    )
    .unwrap();
    fs::write(
        dir.join("b.asdl"),
        "imports:\n  a: ./a.asdl\nmodules:\n  mb:\n    ports: [x]\n",
    )
    .unwrap();

    let artifacts = compile(&dir.join("a.asdl"), &options());
    assert!(artifacts.has_errors());
    let cycle = artifacts
        .diagnostics
        .iter()
        .find(|d| d.code == codes::AST_IMPORT_CYCLE)
        .expect("cycle diagnostic");
    assert!(cycle.message.contains("a.asdl -> b.asdl -> a.asdl"), "{}", cycle.message);
    assert!(artifacts.netlist.is_none());
}

const STAGES: &str = "\
top: top
modules:
  top:
    nets:
      n<1:3>: [s<1:3>.a]
    instances:
      s<1:3>: stage
  stage:
    nets:
      $a: [R1.p]
    instances:
      R1: res_dev
  stage@behave:
    nets:
      $a: [R2.p]
    instances:
      R2: res_dev
devices:
  res_dev:
    ports: [p]
    backends:
      ngspice:
        template: \"R {name} {ports} 1k\"
";

const STAGE_VIEWS: &str = "\
profiles:
  alt:
    rules:
      - instance: top/s_2
        bind: stage@behave
";

#[test]
fn should_specialize_divergent_view_occurrences() {
    let dir = scratch("views");
    let entry = dir.join("top.asdl");
    fs::write(&entry, STAGES).unwrap();

    let artifacts = compile(
        &entry,
        &CompileOptions {
            view_config_source: Some(STAGE_VIEWS.to_string()),
            profiles: vec!["alt".to_string()],
            ..options()
        },
    );
    assert!(!artifacts.has_errors(), "{:?}", artifacts.diagnostics);
    let netlist = artifacts.netlist.as_deref().unwrap();

    assert!(netlist.contains(".subckt stage a"), "{}", netlist);
    assert!(netlist.contains(".subckt stage__2 a"), "{}", netlist);
    assert!(netlist.contains(".subckt stage__3 a"), "{}", netlist);
    assert!(!netlist.contains("__occ_"), "{}", netlist);

    // The rebound occurrence carries the behave body.
    let behave_at = netlist.find(".subckt stage__2").unwrap();
    let behave_end = netlist[behave_at..].find(".ends").unwrap() + behave_at;
    assert!(netlist[behave_at..behave_end].contains("R R2 a 1k"), "{}", netlist);

    let emitted: Vec<&str> = artifacts
        .log
        .emission_name_map
        .values()
        .map(String::as_str)
        .collect();
    assert!(emitted.contains(&"stage__2"));
    assert!(emitted.contains(&"stage__3"));
    assert_eq!(artifacts.log.view_bindings.len(), 1);
    assert_eq!(artifacts.log.view_bindings[0].path, "top/s_2");
}

#[test]
fn should_require_top_with_multiple_entry_modules() {
    let dir = scratch("no-top");
    let entry = dir.join("three.asdl");
    fs::write(
        &entry,
        "modules:\n  m1:\n    ports: [a]\n  m2:\n    ports: [a]\n  m3:\n    ports: [a]\n",
    )
    .unwrap();

    let artifacts = compile(&entry, &options());
    assert!(artifacts.has_errors());
    let top_error = artifacts
        .diagnostics
        .iter()
        .find(|d| d.code == codes::EMIT_TOP)
        .expect("top diagnostic");
    assert!(top_error.message.contains("3 modules"), "{}", top_error.message);
    assert!(top_error.primary_span.is_some());
    assert!(artifacts.netlist.is_none());
}

#[test]
fn should_distinguish_a_top_that_does_not_exist() {
    let dir = scratch("bad-top");
    let entry = dir.join("bad.asdl");
    fs::write(&entry, "top: nope\nmodules:\n  m1:\n    ports: [a]\n  m2:\n    ports: [a]\n")
        .unwrap();

    let artifacts = compile(&entry, &options());
    let top_error = artifacts
        .diagnostics
        .iter()
        .find(|d| d.code == codes::EMIT_TOP)
        .expect("top diagnostic");
    assert!(
        top_error.message.contains("`nope` not found"),
        "{}",
        top_error.message
    );
}

#[test]
fn should_never_mark_pipeline_errors_spanless() {
    // Several distinct user-input failures; none may carry the span-less
    // marker note.
    let failing_sources = [
        "top: x\nmodules:\n  x:\n    instances:\n      M1: missing_dev\n",
        "top: x\nmodules:\n  x:\n    nets:\n      $a: [M1.p, M2.p]\n    instances:\n      M1: x\n",
        "modules:\n  a:\n    ports: [x]\n  b:\n    ports: [x]\n",
    ];
    for (index, source) in failing_sources.iter().enumerate() {
        let dir = scratch(&format!("spanless-{}", index));
        let entry = dir.join("t.asdl");
        fs::write(&entry, source).unwrap();
        let artifacts = compile(&entry, &options());
        assert!(artifacts.has_errors(), "case {} should fail", index);
        for diag in &artifacts.diagnostics {
            assert!(
                !diag.notes.iter().any(|n| n == NO_SPAN_NOTE),
                "case {}: {:?}",
                index,
                diag
            );
        }
    }
}

#[test]
fn should_reproduce_identical_outputs_on_recompilation() {
    let dir = scratch("idempotent");
    let entry = dir.join("inv.asdl");
    fs::write(&entry, INVERTER).unwrap();

    let first = compile(&entry, &options());
    let second = compile(&entry, &options());
    assert_eq!(first.netlist, second.netlist);
    assert_eq!(
        serde_json::to_string(&first.log).unwrap(),
        serde_json::to_string(&second.log).unwrap()
    );
}

#[test]
fn should_warn_but_emit_when_a_default_is_overridden() {
    let source = "\
top: m
modules:
  m:
    instance_defaults:
      R1.b: $gnd
    nets:
      $a: [R1.p]
      $gnd: []
      other: [R1.b]
    instances:
      R1: res_dev
devices:
  res_dev:
    ports: [p, b]
    backends:
      ngspice:
        template: \"R {name} {ports} 1k\"
";
    let dir = scratch("default-override");
    let entry = dir.join("m.asdl");
    fs::write(&entry, source).unwrap();

    let artifacts = compile(&entry, &options());
    assert!(!artifacts.has_errors(), "{:?}", artifacts.diagnostics);
    assert!(artifacts
        .diagnostics
        .iter()
        .any(|d| d.code == codes::IR_DEFAULT_OVERRIDDEN));
    // The explicit binding wins in the output.
    assert!(artifacts.netlist.unwrap().contains("R R1 a other"));
}
