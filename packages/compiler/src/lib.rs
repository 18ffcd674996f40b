//! ASDL Compiler
//!
//! Compiler for a YAML-authored analog/mixed-signal schematic description
//! language. Hierarchical modules, device primitives with backend
//! templates, imports and pattern expressions lower through a multi-stage
//! IR pipeline into a fully elaborated, atomized netlist with
//! deterministic diagnostics:
//!
//! parser -> AST -> PatternedGraph -> AtomizedGraph -> NetlistIR -> text

pub mod chars;
pub mod parse_util;

pub mod diagnostics;
pub mod yaml;

pub mod ast;
pub mod imports;
pub mod pattern;

pub mod atomize;
pub mod graph;
pub mod netlist;
pub mod view;

pub mod emit;
pub mod pipeline;

pub use pipeline::{compile, default_log_path, CompileArtifacts, CompileLog, CompileOptions};
