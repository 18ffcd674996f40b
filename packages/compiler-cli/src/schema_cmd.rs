//! `asdlc schema` implementation.
//!
//! Writes `schema.json` (machine-readable) and `schema.txt` (rendered) for
//! the `.asdl` document format.

use serde_json::{json, Value};

fn schema_value() -> Value {
    json!({
        "schema_version": 1,
        "document": {
            "imports": "mapping: namespace -> path expression (absolute, relative, or logical against ASDL_LIB_PATH)",
            "top": "optional symbol; required when the entry file has more than one module",
            "modules": "mapping: name or name@view -> module",
            "devices": "mapping: name -> device",
        },
        "module": {
            "ports": "ordered list of port names",
            "parameters": "ordered mapping: name -> default value",
            "variables": "ordered mapping: name -> value; `{var}` references resolve recursively",
            "patterns": "ordered mapping: name -> expression or {expr, tag}",
            "instance_defaults": "ordered mapping: endpoint expression -> net token; `!` prefix suppresses the override warning",
            "nets": "ordered mapping: net expression -> endpoint list; `$` prefix marks a port net",
            "instances": "ordered mapping: instance expression -> `ref key=value ...` or {ref, parameters}",
        },
        "device": {
            "ports": "ordered list of pin names",
            "parameters": "ordered mapping: name -> default value",
            "variables": "ordered mapping: name -> value",
            "backends": "non-empty mapping: backend -> template or {template, variables}",
        },
        "instance_ref": ["symbol", "symbol@view", "ns.symbol", "ns.symbol@view"],
        "pattern_groups": {
            "alternation": "<A|B>",
            "range": "<start:end> (direction-sensitive, inclusive)",
            "named": "<@NAME> (module-local, substituted before expansion)",
            "splice": "`;` concatenates expansions; not allowed in `$`-nets",
        },
    })
}

fn schema_text() -> String {
    let mut out = String::new();
    out.push_str("ASDL document schema (v1)\n");
    out.push_str("=========================\n\n");
    out.push_str("Top level: imports, top, modules, devices.\n");
    out.push_str("  imports:   namespace -> path expression\n");
    out.push_str("  top:       entry module; required with more than one module\n\n");
    out.push_str("Module fields: ports, parameters, variables, patterns,\n");
    out.push_str("  instance_defaults, nets, instances. All maps keep authoring order.\n");
    out.push_str("  nets:      `$name` marks a port net; values list `inst.pin` endpoints\n");
    out.push_str("  instances: `ref key='value' k2=v2` shorthand or {ref, parameters}\n\n");
    out.push_str("Device fields: ports, parameters, variables, backends.\n");
    out.push_str("  backends:  backend name -> template or {template, variables}\n\n");
    out.push_str("Pattern groups: <A|B> alternation, <start:end> range, <@NAME> named\n");
    out.push_str("  reference; `;` splices expansions. Delimiters < > | ; : . @ are\n");
    out.push_str("  reserved and never part of identifiers.\n");
    out
}

/// Write both schema files into the current directory.
pub fn run_schema() -> i32 {
    let json_text = serde_json::to_string_pretty(&schema_value()).unwrap_or_default();
    if let Err(err) = std::fs::write("schema.json", json_text) {
        eprintln!("error: cannot write schema.json: {}", err);
        return 1;
    }
    if let Err(err) = std::fs::write("schema.txt", schema_text()) {
        eprintln!("error: cannot write schema.txt: {}", err);
        return 1;
    }
    0
}
