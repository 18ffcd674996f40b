//! `asdlc netlist` implementation.

use std::path::{Path, PathBuf};

use asdl_compiler::diagnostics::render::render_all_text;
use asdl_compiler::diagnostics::{codes, Diagnostic};
use asdl_compiler::{compile, default_log_path, CompileOptions};

use crate::rc::resolve_invocation;

/// Parsed `netlist` arguments.
#[derive(Debug, Default)]
pub struct NetlistArgs {
    pub entry: PathBuf,
    pub backend: Option<String>,
    pub libs: Vec<PathBuf>,
    pub output: Option<PathBuf>,
    pub log: Option<PathBuf>,
    pub view_config: Option<PathBuf>,
    pub profiles: Vec<String>,
    pub top_as_subckt: bool,
}

/// Run the full pipeline and write the netlist and compile log.
/// Returns the process exit code.
pub fn run_netlist(args: &NetlistArgs) -> i32 {
    if !args.entry.is_file() {
        eprintln!("error: entry file `{}` not found", args.entry.display());
        return 1;
    }
    let invocation = match resolve_invocation(&args.entry, &args.libs) {
        Ok(invocation) => invocation,
        Err(err) => {
            eprintln!("error: {}", err);
            return 1;
        }
    };

    let backend = args
        .backend
        .clone()
        .or_else(|| invocation.default_backend.clone())
        .unwrap_or_else(|| "sim.ngspice".to_string());

    let backend_config_source = match &invocation.backend_config_path {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(text) => Some(text),
            Err(err) => {
                eprintln!("error: cannot read backend config `{}`: {}", path.display(), err);
                return 1;
            }
        },
        None => None,
    };
    let view_config_source = match &args.view_config {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(text) => Some(text),
            Err(err) => {
                eprintln!("error: cannot read view config `{}`: {}", path.display(), err);
                return 1;
            }
        },
        None => None,
    };

    let options = CompileOptions {
        backend,
        backend_config_source,
        view_config_source,
        profiles: args.profiles.clone(),
        lib_roots: invocation.lib_roots,
        env: invocation.env,
        home: invocation.home,
        top_as_subckt: args.top_as_subckt,
        ..Default::default()
    };

    let mut artifacts = compile(&args.entry, &options);

    // The compile log is written even for failing runs; a log-write failure
    // is itself a diagnostic.
    let log_path = args.log.clone().unwrap_or_else(|| default_log_path(&args.entry));
    let log_json = serde_json::to_string_pretty(&artifacts.log)
        .unwrap_or_else(|_| "{}".to_string());
    if let Err(err) = std::fs::write(&log_path, log_json) {
        artifacts.diagnostics.push(
            Diagnostic::error(
                codes::TOOL_LOG_WRITE,
                format!("cannot write compile log `{}`: {}", log_path.display(), err),
            ),
        );
    }

    if !artifacts.diagnostics.is_empty() {
        eprintln!("{}", render_all_text(&artifacts.diagnostics, &artifacts.sources));
    }
    if artifacts.has_errors() {
        // Never clobber an existing output on a failing run.
        return 1;
    }

    if let Some(netlist) = &artifacts.netlist {
        let output = args
            .output
            .clone()
            .unwrap_or_else(|| default_output_path(&args.entry, &artifacts.extension));
        if let Err(err) = std::fs::write(&output, netlist) {
            eprintln!("error: cannot write `{}`: {}", output.display(), err);
            return 1;
        }
    }
    0
}

fn default_output_path(entry: &Path, extension: &str) -> PathBuf {
    let stem = entry
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "out".to_string());
    let ext = extension.trim_start_matches('.');
    entry.with_file_name(format!("{}.{}", stem, ext))
}
