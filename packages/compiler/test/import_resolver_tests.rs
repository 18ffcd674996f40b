//! Import resolution over real files: cycles, dedup, logical roots.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use asdl_compiler::diagnostics::codes;
use asdl_compiler::imports::{load_program, ResolverConfig};
use asdl_compiler::parse_util::SourceMap;

/// A unique scratch directory per test.
fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir()
        .join("asdl-import-tests")
        .join(format!("{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

fn write(dir: &PathBuf, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

const LEAF: &str = "modules:\n  leaf:\n    ports: [a]\n";

#[test]
fn should_load_a_two_file_program() {
    let dir = scratch("two-file");
    write(&dir, "lib.asdl", LEAF);
    let entry = write(&dir, "top.asdl", "imports:\n  lib: ./lib.asdl\ntop: t\nmodules:\n  t:\n    instances:\n      U1: lib.leaf\n");

    let mut sources = SourceMap::new();
    sources.set_base(dir.clone());
    let result = load_program(&entry, &ResolverConfig::default(), &mut sources);
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    let db = result.program.unwrap();
    assert_eq!(db.documents.len(), 2);
    let env = db.name_env(db.entry).unwrap();
    assert!(env.resolve_namespace("lib").is_some());
}

#[test]
fn should_report_an_import_cycle_with_the_chain() {
    let dir = scratch("cycle");
    write(&dir, "a.asdl", "imports:\n  b: ./b.asdl\nmodules:\n  ma:\n    ports: [x]\n");
    write(&dir, "b.asdl", "imports:\n  a: ./a.asdl\nmodules:\n  mb:\n    ports: [x]\n");

    let mut sources = SourceMap::new();
    sources.set_base(dir.clone());
    let entry = dir.join("a.asdl");
    let result = load_program(&entry, &ResolverConfig::default(), &mut sources);

    let cycle = result
        .diagnostics
        .iter()
        .find(|d| d.code == codes::AST_IMPORT_CYCLE)
        .expect("cycle diagnostic");
    assert!(cycle.message.contains("a.asdl -> b.asdl -> a.asdl"), "{}", cycle.message);
    assert!(cycle.primary_span.is_some());
}

#[test]
fn should_dedupe_documents_by_normalized_path() {
    let dir = scratch("dedupe");
    write(&dir, "shared.asdl", LEAF);
    let entry = write(
        &dir,
        "top.asdl",
        "imports:\n  one: ./shared.asdl\n  two: ././shared.asdl\nmodules:\n  t:\n    ports: [a]\n",
    );

    let mut sources = SourceMap::new();
    sources.set_base(dir.clone());
    let result = load_program(&entry, &ResolverConfig::default(), &mut sources);
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    let db = result.program.unwrap();
    // Two namespaces, one shared document.
    assert_eq!(db.documents.len(), 2);
    let env = db.name_env(db.entry).unwrap();
    assert_eq!(env.resolve_namespace("one"), env.resolve_namespace("two"));
}

#[test]
fn should_resolve_logical_paths_against_library_roots() {
    let dir = scratch("logical");
    write(&dir, "roots/first/cells.asdl", LEAF);
    let entry = write(
        &dir,
        "top.asdl",
        "imports:\n  cells: cells.asdl\nmodules:\n  t:\n    ports: [a]\n",
    );

    let config = ResolverConfig {
        lib_roots: vec![dir.join("roots/first"), dir.join("roots/second")],
        env: HashMap::new(),
        home: None,
    };
    let mut sources = SourceMap::new();
    sources.set_base(dir.clone());
    let result = load_program(&entry, &config, &mut sources);
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
}

#[test]
fn should_report_ambiguous_logical_paths_in_root_order() {
    let dir = scratch("ambiguous");
    write(&dir, "roots/first/cells.asdl", LEAF);
    write(&dir, "roots/second/cells.asdl", LEAF);
    let entry = write(
        &dir,
        "top.asdl",
        "imports:\n  cells: cells.asdl\nmodules:\n  t:\n    ports: [a]\n",
    );

    let config = ResolverConfig {
        lib_roots: vec![dir.join("roots/first"), dir.join("roots/second")],
        env: HashMap::new(),
        home: None,
    };
    let mut sources = SourceMap::new();
    sources.set_base(dir.clone());
    let result = load_program(&entry, &config, &mut sources);
    let ambiguous = result
        .diagnostics
        .iter()
        .find(|d| d.code == codes::AST_IMPORT_AMBIGUOUS)
        .expect("ambiguity diagnostic");
    let first = ambiguous.message.find("first").expect("first root listed");
    let second = ambiguous.message.find("second").expect("second root listed");
    assert!(first < second, "roots must be listed in order: {}", ambiguous.message);
}

#[test]
fn should_report_missing_imports_at_the_import_site() {
    let dir = scratch("missing");
    let entry = write(
        &dir,
        "top.asdl",
        "imports:\n  gone: ./gone.asdl\nmodules:\n  t:\n    ports: [a]\n",
    );

    let mut sources = SourceMap::new();
    sources.set_base(dir.clone());
    let result = load_program(&entry, &ResolverConfig::default(), &mut sources);
    let missing = result
        .diagnostics
        .iter()
        .find(|d| d.code == codes::AST_IMPORT_MISSING)
        .expect("missing-file diagnostic");
    assert!(missing.primary_span.is_some());
    assert_eq!(missing.primary_span.unwrap().line, 2);
}
