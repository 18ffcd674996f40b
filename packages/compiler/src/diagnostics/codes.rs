//! Diagnostic code catalog.
//!
//! Single source of truth for every code tag the compiler can emit, with the
//! stable message template noted on each constant. Messages are formatted at
//! the emission site; templates here document the shape.

use super::{DiagnosticCode, DiagnosticKind};

const fn parse(n: u16) -> DiagnosticCode {
    DiagnosticCode::new(DiagnosticKind::Parse, n)
}
const fn ast(n: u16) -> DiagnosticCode {
    DiagnosticCode::new(DiagnosticKind::Ast, n)
}
const fn ir(n: u16) -> DiagnosticCode {
    DiagnosticCode::new(DiagnosticKind::Ir, n)
}
const fn emit(n: u16) -> DiagnosticCode {
    DiagnosticCode::new(DiagnosticKind::Emit, n)
}
const fn view(n: u16) -> DiagnosticCode {
    DiagnosticCode::new(DiagnosticKind::View, n)
}
const fn tool(n: u16) -> DiagnosticCode {
    DiagnosticCode::new(DiagnosticKind::Tool, n)
}

// ---------------------------------------------------------------------------
// PARSE: YAML reader
// ---------------------------------------------------------------------------

/// "unexpected {token}" / "unterminated {quote|flow sequence}"
pub const PARSE_SYNTAX: DiagnosticCode = parse(1);
/// "tab character in indentation"
pub const PARSE_TAB_INDENT: DiagnosticCode = parse(2);
/// "duplicate mapping key `{key}`"
pub const PARSE_DUPLICATE_KEY: DiagnosticCode = parse(3);
/// "document root must be a mapping"
pub const PARSE_ROOT_NOT_MAPPING: DiagnosticCode = parse(4);

// ---------------------------------------------------------------------------
// AST: schema validation, imports, pattern grammar
// ---------------------------------------------------------------------------

/// "imported file `{path}` not found"
pub const AST_IMPORT_MISSING: DiagnosticCode = ast(10);
/// "cannot expand `{expr}` in import path: {reason}"
pub const AST_IMPORT_EXPANSION: DiagnosticCode = ast(11);
/// "import cycle: {a} -> {b} -> ... -> {a}"
pub const AST_IMPORT_CYCLE: DiagnosticCode = ast(12);
/// "`{field}` must be a {expected}"
pub const AST_BAD_SHAPE: DiagnosticCode = ast(13);
/// "duplicate {symbol|import namespace} `{name}`"
pub const AST_DUPLICATE_SYMBOL: DiagnosticCode = ast(14);
/// "logical path `{name}` matches multiple library roots: {roots}"
pub const AST_IMPORT_AMBIGUOUS: DiagnosticCode = ast(15);
/// "unknown field `{field}`"
pub const AST_UNKNOWN_FIELD: DiagnosticCode = ast(16);
/// "`params` is not a valid field; use `parameters`"
pub const AST_PARAMS_FIELD: DiagnosticCode = ast(17);
/// "device backend `{name}` must define a non-empty `template`"
pub const AST_EMPTY_TEMPLATE: DiagnosticCode = ast(18);
/// "`{name}` is not a valid `cell` or `cell@view` symbol"
pub const AST_BAD_DECORATED_NAME: DiagnosticCode = ast(19);
/// "unterminated quote in instance expression"
pub const AST_UNTERMINATED_QUOTE: DiagnosticCode = ast(20);
/// "named pattern `<@{name}>` is not defined"
pub const AST_PATTERN_UNDEFINED: DiagnosticCode = ast(21);
/// "named pattern `{name}` references itself"
pub const AST_PATTERN_RECURSIVE: DiagnosticCode = ast(22);

// ---------------------------------------------------------------------------
// IR: pattern expansion, binding, resolution
// ---------------------------------------------------------------------------

/// "cannot bind {r} endpoints to {l} atoms of `{expr}`"
pub const IR_BIND_MISMATCH: DiagnosticCode = ir(1);
/// "duplicate {net|instance|atom} `{name}`"
pub const IR_COLLISION: DiagnosticCode = ir(2);
/// "invalid pattern expression `{expr}`: {reason}"
pub const IR_PATTERN_PARSE: DiagnosticCode = ir(3);
/// "pattern expansion of `{expr}` exceeds the {cap}-atom limit"
pub const IR_EXPANSION_CAP: DiagnosticCode = ir(4);
/// "variable `{name}` expands through itself"
pub const IR_VARIABLE_CYCLE: DiagnosticCode = ir(6);
/// "variable `{name}` is not defined"
pub const IR_VARIABLE_UNDEFINED: DiagnosticCode = ir(7);
/// warning: "default binding `{pin}` overridden by `{net}`"
pub const IR_DEFAULT_OVERRIDDEN: DiagnosticCode = ir(8);
/// "`{ns}.{symbol}` does not resolve through namespace `{ns}`"
pub const IR_QUALIFIED_UNRESOLVED: DiagnosticCode = ir(10);
/// "`{symbol}` is not defined in this file"
pub const IR_LOCAL_UNRESOLVED: DiagnosticCode = ir(11);

// ---------------------------------------------------------------------------
// EMIT: top resolution, backends, templates, provenance
// ---------------------------------------------------------------------------

/// "no `top` and entry file has multiple modules" /
/// "top `{name}` not found in entry file"
pub const EMIT_TOP: DiagnosticCode = emit(1);
/// "backend `{name}` is not defined in the backend config"
pub const EMIT_UNKNOWN_BACKEND: DiagnosticCode = emit(2);
/// "cannot load backend config `{path}`: {reason}"
pub const EMIT_BACKEND_CONFIG: DiagnosticCode = emit(3);
/// "instance parameter `{name}` shadows a {variable|parameter}"
pub const EMIT_SHADOWED: DiagnosticCode = emit(10);
/// "template `{key}` placeholder `{{{name}}}` has no value"
pub const EMIT_MISSING_PLACEHOLDER: DiagnosticCode = emit(11);
/// "template `{key}` uses unknown placeholder `{{{name}}}`"
pub const EMIT_UNKNOWN_PLACEHOLDER: DiagnosticCode = emit(12);
/// "instance `{inst}` does not connect pin `{pin}` of `{ref}`"
pub const EMIT_MISSING_PIN: DiagnosticCode = emit(13);
/// "instance `{inst}` connects `{pin}` which is not a port of `{ref}`"
pub const EMIT_EXTRA_PIN: DiagnosticCode = emit(14);
/// warning: "emitting `{name}` with unknown {file_id|ref_file_id|entry_file_id}"
pub const EMIT_PROVENANCE: DiagnosticCode = emit(15);
/// "no template for device `{name}` in backend `{backend}`"
pub const EMIT_NO_TEMPLATE: DiagnosticCode = emit(16);

// ---------------------------------------------------------------------------
// VIEW: profile rules
// ---------------------------------------------------------------------------

/// "rule `{id}` must match exactly one of `instance` or `module`"
pub const VIEW_RULE_MATCH: DiagnosticCode = view(1);
/// "rule `{id}` bind `{value}` is not `cell` or `cell@view`"
pub const VIEW_RULE_BIND: DiagnosticCode = view(2);
/// "profile `{name}` is not defined in the view config"
pub const VIEW_UNKNOWN_PROFILE: DiagnosticCode = view(3);

// ---------------------------------------------------------------------------
// TOOL
// ---------------------------------------------------------------------------

/// "cannot write compile log `{path}`: {reason}"
pub const TOOL_LOG_WRITE: DiagnosticCode = tool(2);
