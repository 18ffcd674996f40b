//! Schema validation: marked YAML -> typed AST.
//!
//! Rejects unknown fields, wrong shapes and malformed symbols while
//! collecting as much of the document as possible, so later stages can keep
//! producing diagnostics.

use indexmap::IndexMap;

use crate::diagnostics::{codes, Diagnostic, DiagnosticCode};
use crate::parse_util::{SourceSpan, Spanned};
use crate::yaml::{YamlKey, YamlNode, YamlValue};

use super::nodes::{
    is_decorated_symbol, DeviceBackendDecl, DeviceDecl, Document, InstanceDecl, InstanceRef,
    ModuleDecl, NetDecl, PatternDef, PatternExpr,
};
use super::shorthand::{parse_instance_body, InstanceBody, ShorthandError};

/// Validation output: a best-effort document plus schema errors.
#[derive(Debug)]
pub struct SchemaResult {
    pub document: Option<Document>,
    pub errors: Vec<Diagnostic>,
}

const DOCUMENT_FIELDS: &[&str] = &["imports", "top", "modules", "devices"];
const MODULE_FIELDS: &[&str] = &[
    "ports",
    "parameters",
    "variables",
    "patterns",
    "instance_defaults",
    "nets",
    "instances",
];
const DEVICE_FIELDS: &[&str] = &["ports", "parameters", "variables", "backends"];
const BACKEND_FIELDS: &[&str] = &["template", "variables"];
const INSTANCE_FIELDS: &[&str] = &["ref", "parameters"];

struct Validator {
    errors: Vec<Diagnostic>,
}

impl Validator {
    fn error(&mut self, code: DiagnosticCode, message: String, span: Option<SourceSpan>) {
        self.errors.push(Diagnostic::error(code, message).with_span(span));
    }

    /// Reject fields outside `allowed`; `params` gets its own code so the
    /// message can point at `parameters`.
    fn check_fields(&mut self, entries: &[(YamlKey, YamlNode)], allowed: &[&str], context: &str) {
        for (key, _) in entries {
            if key.text == "params" && allowed.contains(&"parameters") {
                self.error(
                    codes::AST_PARAMS_FIELD,
                    "`params` is not a valid field; use `parameters`".to_string(),
                    Some(key.span),
                );
            } else if !allowed.contains(&key.text.as_str()) {
                self.error(
                    codes::AST_UNKNOWN_FIELD,
                    format!("unknown field `{}` in {}", key.text, context),
                    Some(key.span),
                );
            }
        }
    }

    fn expect_mapping<'a>(
        &mut self,
        node: &'a YamlNode,
        what: &str,
    ) -> Option<&'a [(YamlKey, YamlNode)]> {
        match node.as_mapping() {
            Some(entries) => Some(entries),
            None => {
                self.error(
                    codes::AST_BAD_SHAPE,
                    format!("{} must be a mapping, found {}", what, node.type_name()),
                    Some(node.span),
                );
                None
            }
        }
    }

    fn expect_scalar(&mut self, node: &YamlNode, what: &str) -> Option<Spanned<String>> {
        match &node.value {
            YamlValue::Scalar(s, _) => Some(Spanned::new(s.clone(), Some(node.span))),
            _ => {
                self.error(
                    codes::AST_BAD_SHAPE,
                    format!("{} must be a scalar, found {}", what, node.type_name()),
                    Some(node.span),
                );
                None
            }
        }
    }

    /// Mapping of scalar values with in-place duplicate-key detection.
    fn scalar_map(
        &mut self,
        node: &YamlNode,
        what: &str,
        dup_code: DiagnosticCode,
        dup_what: &str,
    ) -> IndexMap<String, Spanned<String>> {
        let mut out = IndexMap::new();
        let Some(entries) = self.expect_mapping(node, what) else {
            return out;
        };
        for (key, value) in entries {
            if out.contains_key(&key.text) {
                self.error(
                    dup_code,
                    format!("duplicate {} `{}`", dup_what, key.text),
                    Some(key.span),
                );
                continue;
            }
            if let Some(value) = self.expect_scalar(value, &format!("{} `{}`", dup_what, key.text))
            {
                out.insert(key.text.clone(), value);
            }
        }
        out
    }

    /// Sequence of scalars; a lone scalar is accepted as a one-element list.
    fn scalar_list(&mut self, node: &YamlNode, what: &str) -> Vec<Spanned<String>> {
        match &node.value {
            YamlValue::Scalar(s, _) => vec![Spanned::new(s.clone(), Some(node.span))],
            YamlValue::Sequence(items) => items
                .iter()
                .filter_map(|item| self.expect_scalar(item, what))
                .collect(),
            YamlValue::Null => Vec::new(),
            _ => {
                self.error(
                    codes::AST_BAD_SHAPE,
                    format!("{} must be a list, found {}", what, node.type_name()),
                    Some(node.span),
                );
                Vec::new()
            }
        }
    }
}

/// Validate one document.
pub fn document_from_yaml(root: &YamlNode) -> SchemaResult {
    let mut v = Validator { errors: Vec::new() };
    let Some(entries) = root.as_mapping() else {
        v.error(
            codes::AST_BAD_SHAPE,
            "document root must be a mapping".to_string(),
            Some(root.span),
        );
        return SchemaResult { document: None, errors: v.errors };
    };

    v.check_fields(entries, DOCUMENT_FIELDS, "document");

    let mut doc = Document::default();

    if let Some(node) = root.get("imports") {
        if let Some(import_entries) = v.expect_mapping(node, "`imports`") {
            for (key, value) in import_entries {
                if doc.imports.contains_key(&key.text) {
                    v.error(
                        codes::AST_DUPLICATE_SYMBOL,
                        format!("duplicate import namespace `{}`", key.text),
                        Some(key.span),
                    );
                    continue;
                }
                if !super::nodes::is_identifier(&key.text) {
                    v.error(
                        codes::AST_BAD_DECORATED_NAME,
                        format!("import namespace `{}` is not a valid identifier", key.text),
                        Some(key.span),
                    );
                    continue;
                }
                if let Some(path) = v.expect_scalar(value, "import path") {
                    doc.imports.insert(key.text.clone(), path);
                }
            }
        }
    }

    if let Some(node) = root.get("top") {
        doc.top = v.expect_scalar(node, "`top`");
    }

    if let Some(node) = root.get("modules") {
        if let Some(module_entries) = v.expect_mapping(node, "`modules`") {
            for (key, body) in module_entries {
                if doc.modules.contains_key(&key.text) || doc.devices.contains_key(&key.text) {
                    v.error(
                        codes::AST_DUPLICATE_SYMBOL,
                        format!("duplicate symbol `{}`", key.text),
                        Some(key.span),
                    );
                    continue;
                }
                if let Some(module) = module_from_yaml(&mut v, key, body) {
                    doc.modules.insert(key.text.clone(), module);
                }
            }
        }
    }

    if let Some(node) = root.get("devices") {
        if let Some(device_entries) = v.expect_mapping(node, "`devices`") {
            for (key, body) in device_entries {
                if doc.devices.contains_key(&key.text) || doc.modules.contains_key(&key.text) {
                    v.error(
                        codes::AST_DUPLICATE_SYMBOL,
                        format!("duplicate symbol `{}`", key.text),
                        Some(key.span),
                    );
                    continue;
                }
                if let Some(device) = device_from_yaml(&mut v, key, body) {
                    doc.devices.insert(key.text.clone(), device);
                }
            }
        }
    }

    if doc.modules.is_empty() && doc.devices.is_empty() {
        v.error(
            codes::AST_BAD_SHAPE,
            "document must declare at least one module or device".to_string(),
            Some(root.span),
        );
    }

    SchemaResult { document: Some(doc), errors: v.errors }
}

fn module_from_yaml(v: &mut Validator, key: &YamlKey, body: &YamlNode) -> Option<ModuleDecl> {
    if !is_decorated_symbol(&key.text) {
        v.error(
            codes::AST_BAD_DECORATED_NAME,
            format!("`{}` is not a valid `cell` or `cell@view` symbol", key.text),
            Some(key.span),
        );
        return None;
    }
    let entries = v.expect_mapping(body, &format!("module `{}`", key.text))?;
    v.check_fields(entries, MODULE_FIELDS, &format!("module `{}`", key.text));

    let mut module = ModuleDecl::new(key.text.clone(), Some(key.span));

    if let Some(node) = body.get("ports") {
        module.ports = v.scalar_list(node, "port name");
    }
    if let Some(node) = body.get("parameters") {
        module.parameters =
            v.scalar_map(node, "`parameters`", codes::PARSE_DUPLICATE_KEY, "parameter");
    }
    if let Some(node) = body.get("variables") {
        module.variables = v.scalar_map(node, "`variables`", codes::PARSE_DUPLICATE_KEY, "variable");
    }
    if let Some(node) = body.get("patterns") {
        module.patterns = patterns_from_yaml(v, node);
    }
    if let Some(node) = body.get("instance_defaults") {
        module.instance_defaults = v.scalar_map(
            node,
            "`instance_defaults`",
            codes::PARSE_DUPLICATE_KEY,
            "default binding",
        );
    }
    if let Some(node) = body.get("nets") {
        if let Some(net_entries) = v.expect_mapping(node, "`nets`") {
            for (net_key, endpoints) in net_entries {
                let name = PatternExpr::new(net_key.text.clone(), Some(net_key.span));
                let endpoints = v
                    .scalar_list(endpoints, "endpoint expression")
                    .into_iter()
                    .map(|s| PatternExpr::new(s.value, s.span))
                    .collect();
                module.nets.push(NetDecl { name, endpoints, span: Some(net_key.span) });
            }
        }
    }
    if let Some(node) = body.get("instances") {
        if let Some(inst_entries) = v.expect_mapping(node, "`instances`") {
            for (inst_key, inst_body) in inst_entries {
                if let Some(instance) = instance_from_yaml(v, inst_key, inst_body) {
                    module.instances.push(instance);
                }
            }
        }
    }
    Some(module)
}

fn patterns_from_yaml(v: &mut Validator, node: &YamlNode) -> IndexMap<String, PatternDef> {
    let mut out = IndexMap::new();
    let Some(entries) = v.expect_mapping(node, "`patterns`") else {
        return out;
    };
    for (key, value) in entries {
        if out.contains_key(&key.text) {
            v.error(
                codes::PARSE_DUPLICATE_KEY,
                format!("duplicate pattern `{}`", key.text),
                Some(key.span),
            );
            continue;
        }
        let def = match &value.value {
            YamlValue::Scalar(expr, _) => {
                Some(PatternDef { expr: expr.clone(), tag: None, span: Some(value.span) })
            }
            YamlValue::Mapping(_) => {
                v.check_fields(
                    value.as_mapping().unwrap(),
                    &["expr", "tag"],
                    &format!("pattern `{}`", key.text),
                );
                let expr = value
                    .get("expr")
                    .and_then(|n| v.expect_scalar(n, "pattern `expr`"))
                    .map(|s| s.value);
                let tag = value
                    .get("tag")
                    .and_then(|n| v.expect_scalar(n, "pattern `tag`"))
                    .map(|s| s.value);
                match expr {
                    Some(expr) => Some(PatternDef { expr, tag, span: Some(value.span) }),
                    None => {
                        v.error(
                            codes::AST_BAD_SHAPE,
                            format!("pattern `{}` must define `expr`", key.text),
                            Some(value.span),
                        );
                        None
                    }
                }
            }
            _ => {
                v.error(
                    codes::AST_BAD_SHAPE,
                    format!(
                        "pattern `{}` must be a string or `{{expr, tag}}`, found {}",
                        key.text,
                        value.type_name()
                    ),
                    Some(value.span),
                );
                None
            }
        };
        if let Some(def) = def {
            out.insert(key.text.clone(), def);
        }
    }
    out
}

fn instance_from_yaml(
    v: &mut Validator,
    key: &YamlKey,
    body: &YamlNode,
) -> Option<InstanceDecl> {
    let parsed: Option<(InstanceBody, Option<SourceSpan>)> = match &body.value {
        YamlValue::Scalar(text, _) => match parse_instance_body(text) {
            Ok(parsed) => Some((parsed, Some(body.span))),
            Err(err) => {
                let code = match err {
                    ShorthandError::UnterminatedQuote { .. } => codes::AST_UNTERMINATED_QUOTE,
                    _ => codes::AST_BAD_SHAPE,
                };
                v.error(code, format!("instance `{}`: {}", key.text, err), Some(body.span));
                None
            }
        },
        YamlValue::Mapping(entries) => {
            v.check_fields(entries, INSTANCE_FIELDS, &format!("instance `{}`", key.text));
            let ref_raw = body
                .get("ref")
                .and_then(|n| v.expect_scalar(n, "instance `ref`"))
                .map(|s| s.value);
            let mut parameters = IndexMap::new();
            if let Some(params) = body.get("parameters") {
                parameters = v
                    .scalar_map(params, "`parameters`", codes::PARSE_DUPLICATE_KEY, "parameter")
                    .into_iter()
                    .map(|(k, s)| (k, s.value))
                    .collect();
            }
            match ref_raw {
                Some(ref_raw) => {
                    Some((InstanceBody { ref_raw, parameters }, Some(body.span)))
                }
                None => {
                    v.error(
                        codes::AST_BAD_SHAPE,
                        format!("instance `{}` must define `ref`", key.text),
                        Some(body.span),
                    );
                    None
                }
            }
        }
        _ => {
            v.error(
                codes::AST_BAD_SHAPE,
                format!(
                    "instance `{}` must be a string or `{{ref, parameters}}`, found {}",
                    key.text,
                    body.type_name()
                ),
                Some(body.span),
            );
            None
        }
    };

    let (parsed_body, body_span) = parsed?;
    let Some(reference) = InstanceRef::parse(&parsed_body.ref_raw) else {
        v.error(
            codes::AST_BAD_DECORATED_NAME,
            format!(
                "instance `{}` reference `{}` is not `symbol`, `symbol@view`, `ns.symbol` or `ns.symbol@view`",
                key.text, parsed_body.ref_raw
            ),
            body_span,
        );
        return None;
    };

    Some(InstanceDecl {
        name: PatternExpr::new(key.text.clone(), Some(key.span)),
        ref_raw: parsed_body.ref_raw,
        reference,
        parameters: parsed_body
            .parameters
            .into_iter()
            .map(|(k, value)| (k, Spanned::new(value, body_span)))
            .collect(),
        span: Some(key.span),
    })
}

fn device_from_yaml(v: &mut Validator, key: &YamlKey, body: &YamlNode) -> Option<DeviceDecl> {
    if !is_decorated_symbol(&key.text) {
        v.error(
            codes::AST_BAD_DECORATED_NAME,
            format!("`{}` is not a valid `cell` or `cell@view` symbol", key.text),
            Some(key.span),
        );
        return None;
    }
    let entries = v.expect_mapping(body, &format!("device `{}`", key.text))?;
    v.check_fields(entries, DEVICE_FIELDS, &format!("device `{}`", key.text));

    let mut device = DeviceDecl {
        name: key.text.clone(),
        ports: Vec::new(),
        parameters: IndexMap::new(),
        variables: IndexMap::new(),
        backends: IndexMap::new(),
        span: Some(key.span),
    };

    if let Some(node) = body.get("ports") {
        device.ports = v.scalar_list(node, "port name");
    }
    if let Some(node) = body.get("parameters") {
        device.parameters =
            v.scalar_map(node, "`parameters`", codes::PARSE_DUPLICATE_KEY, "parameter");
    }
    if let Some(node) = body.get("variables") {
        device.variables = v.scalar_map(node, "`variables`", codes::PARSE_DUPLICATE_KEY, "variable");
    }

    match body.get("backends") {
        Some(node) => {
            if let Some(backend_entries) = v.expect_mapping(node, "`backends`") {
                for (backend_key, backend_body) in backend_entries {
                    if let Some(backend) = backend_from_yaml(v, backend_key, backend_body) {
                        device.backends.insert(backend_key.text.clone(), backend);
                    }
                }
            }
        }
        None => {
            v.error(
                codes::AST_BAD_SHAPE,
                format!("device `{}` must define `backends`", key.text),
                Some(key.span),
            );
        }
    }
    if device.backends.is_empty() {
        return None;
    }
    Some(device)
}

fn backend_from_yaml(
    v: &mut Validator,
    key: &YamlKey,
    body: &YamlNode,
) -> Option<DeviceBackendDecl> {
    // A bare scalar is the template itself.
    if let YamlValue::Scalar(template, _) = &body.value {
        if template.trim().is_empty() {
            v.error(
                codes::AST_EMPTY_TEMPLATE,
                format!("device backend `{}` must define a non-empty `template`", key.text),
                Some(key.span),
            );
            return None;
        }
        return Some(DeviceBackendDecl {
            template: template.clone(),
            variables: IndexMap::new(),
            span: Some(key.span),
        });
    }

    let entries = v.expect_mapping(body, &format!("device backend `{}`", key.text))?;
    v.check_fields(entries, BACKEND_FIELDS, &format!("device backend `{}`", key.text));

    let template = body
        .get("template")
        .and_then(|n| v.expect_scalar(n, "backend `template`"))
        .map(|s| s.value)
        .unwrap_or_default();
    if template.trim().is_empty() {
        v.error(
            codes::AST_EMPTY_TEMPLATE,
            format!("device backend `{}` must define a non-empty `template`", key.text),
            Some(key.span),
        );
        return None;
    }
    let variables = body
        .get("variables")
        .map(|n| v.scalar_map(n, "`variables`", codes::PARSE_DUPLICATE_KEY, "variable"))
        .unwrap_or_default();

    Some(DeviceBackendDecl { template, variables, span: Some(key.span) })
}
