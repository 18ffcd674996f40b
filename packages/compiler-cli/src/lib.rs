//! ASDL compiler CLI.
//!
//! Subcommand implementations for the `asdlc` binary plus `.asdlrc` and
//! environment handling. Each command returns an exit code; diagnostics go
//! to stderr, requested output to stdout or files.

pub mod depgraph;
pub mod manifest;
pub mod netlist_cmd;
pub mod rc;
pub mod schema_cmd;
pub mod visualizer;
