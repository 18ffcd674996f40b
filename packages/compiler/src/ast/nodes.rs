//! AST node definitions.
//!
//! All maps are order-preserving: authoring order is semantic (port order,
//! subckt pin order, emission order).

use indexmap::IndexMap;
use serde::Serialize;

use crate::parse_util::{SourceSpan, Spanned};

/// A pattern expression together with the axis identity of each `<...>`
/// group. `axes` is filled by named-pattern elaboration: `Some(id)` for a
/// group that came from a named pattern (id = tag or pattern name), `None`
/// for an anonymous group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternExpr {
    pub text: String,
    pub axes: Vec<Option<String>>,
    pub span: Option<SourceSpan>,
}

impl PatternExpr {
    pub fn new(text: impl Into<String>, span: Option<SourceSpan>) -> Self {
        PatternExpr { text: text.into(), axes: Vec::new(), span }
    }
}

/// One parsed `.asdl` file.
#[derive(Debug, Clone, Default)]
pub struct Document {
    /// namespace -> import path expression.
    pub imports: IndexMap<String, Spanned<String>>,
    pub top: Option<Spanned<String>>,
    pub modules: IndexMap<String, ModuleDecl>,
    pub devices: IndexMap<String, DeviceDecl>,
}

/// A hierarchical module.
#[derive(Debug, Clone)]
pub struct ModuleDecl {
    /// Full authored symbol, possibly decorated (`cell` or `cell@view`).
    pub name: String,
    pub ports: Vec<Spanned<String>>,
    pub parameters: IndexMap<String, Spanned<String>>,
    pub variables: IndexMap<String, Spanned<String>>,
    pub patterns: IndexMap<String, PatternDef>,
    /// endpoint expression -> default net token (`!` prefix suppresses the
    /// override warning).
    pub instance_defaults: IndexMap<String, Spanned<String>>,
    pub nets: Vec<NetDecl>,
    pub instances: Vec<InstanceDecl>,
    pub span: Option<SourceSpan>,
}

impl ModuleDecl {
    pub fn new(name: impl Into<String>, span: Option<SourceSpan>) -> Self {
        ModuleDecl {
            name: name.into(),
            ports: Vec::new(),
            parameters: IndexMap::new(),
            variables: IndexMap::new(),
            patterns: IndexMap::new(),
            instance_defaults: IndexMap::new(),
            nets: Vec::new(),
            instances: Vec::new(),
            span,
        }
    }

    /// Split a decorated symbol into `(cell, view)`.
    pub fn decorated_parts(&self) -> (&str, Option<&str>) {
        split_decorated(&self.name)
    }
}

/// A named pattern definition: plain string (axis id = name) or
/// `{expr, tag}` (axis id = tag).
#[derive(Debug, Clone, PartialEq)]
pub struct PatternDef {
    pub expr: String,
    pub tag: Option<String>,
    pub span: Option<SourceSpan>,
}

impl PatternDef {
    /// The axis identity this pattern contributes to its groups.
    pub fn axis_id<'a>(&'a self, name: &'a str) -> &'a str {
        self.tag.as_deref().unwrap_or(name)
    }
}

/// A net declaration: pattern expression -> endpoint expressions.
#[derive(Debug, Clone)]
pub struct NetDecl {
    pub name: PatternExpr,
    pub endpoints: Vec<PatternExpr>,
    pub span: Option<SourceSpan>,
}

/// An instance declaration.
#[derive(Debug, Clone)]
pub struct InstanceDecl {
    pub name: PatternExpr,
    pub ref_raw: String,
    pub reference: InstanceRef,
    pub parameters: IndexMap<String, Spanned<String>>,
    pub span: Option<SourceSpan>,
}

/// How an instance names its target symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceRef {
    Local { symbol: String },
    LocalView { symbol: String, view: String },
    Qualified { ns: String, symbol: String },
    QualifiedView { ns: String, symbol: String, view: String },
}

impl InstanceRef {
    /// Parse `symbol`, `symbol@view`, `ns.symbol`, `ns.symbol@view`.
    pub fn parse(raw: &str) -> Option<InstanceRef> {
        let (path, view) = match raw.split_once('@') {
            Some((path, view)) => {
                if !is_identifier(view) {
                    return None;
                }
                (path, Some(view.to_string()))
            }
            None => (raw, None),
        };
        let (ns, symbol) = match path.split_once('.') {
            Some((ns, symbol)) => {
                if !is_identifier(ns) || !is_identifier(symbol) {
                    return None;
                }
                (Some(ns.to_string()), symbol.to_string())
            }
            None => {
                if !is_identifier(path) {
                    return None;
                }
                (None, path.to_string())
            }
        };
        Some(match (ns, view) {
            (None, None) => InstanceRef::Local { symbol },
            (None, Some(view)) => InstanceRef::LocalView { symbol, view },
            (Some(ns), None) => InstanceRef::Qualified { ns, symbol },
            (Some(ns), Some(view)) => InstanceRef::QualifiedView { ns, symbol, view },
        })
    }

    pub fn namespace(&self) -> Option<&str> {
        match self {
            InstanceRef::Qualified { ns, .. } | InstanceRef::QualifiedView { ns, .. } => Some(ns),
            _ => None,
        }
    }

    pub fn view(&self) -> Option<&str> {
        match self {
            InstanceRef::LocalView { view, .. } | InstanceRef::QualifiedView { view, .. } => {
                Some(view)
            }
            _ => None,
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            InstanceRef::Local { symbol }
            | InstanceRef::LocalView { symbol, .. }
            | InstanceRef::Qualified { symbol, .. }
            | InstanceRef::QualifiedView { symbol, .. } => symbol,
        }
    }

    /// The symbol as looked up in the target file: `cell` or `cell@view`.
    pub fn decorated_symbol(&self) -> String {
        match self.view() {
            Some(view) => format!("{}@{}", self.symbol(), view),
            None => self.symbol().to_string(),
        }
    }
}

impl std::fmt::Display for InstanceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstanceRef::Local { symbol } => write!(f, "{}", symbol),
            InstanceRef::LocalView { symbol, view } => write!(f, "{}@{}", symbol, view),
            InstanceRef::Qualified { ns, symbol } => write!(f, "{}.{}", ns, symbol),
            InstanceRef::QualifiedView { ns, symbol, view } => {
                write!(f, "{}.{}@{}", ns, symbol, view)
            }
        }
    }
}

/// A device primitive with per-backend templates.
#[derive(Debug, Clone)]
pub struct DeviceDecl {
    pub name: String,
    pub ports: Vec<Spanned<String>>,
    pub parameters: IndexMap<String, Spanned<String>>,
    pub variables: IndexMap<String, Spanned<String>>,
    pub backends: IndexMap<String, DeviceBackendDecl>,
    pub span: Option<SourceSpan>,
}

/// One backend entry of a device.
#[derive(Debug, Clone)]
pub struct DeviceBackendDecl {
    pub template: String,
    pub variables: IndexMap<String, Spanned<String>>,
    pub span: Option<SourceSpan>,
}

/// True for a bare ASDL identifier (no pattern delimiters).
pub fn is_identifier(text: &str) -> bool {
    let mut it = text.chars();
    match it.next() {
        Some(ch) if crate::chars::is_identifier_start(ch) => {}
        _ => return false,
    }
    it.all(crate::chars::is_identifier_char)
}

/// True for `cell` or `cell@view`.
pub fn is_decorated_symbol(text: &str) -> bool {
    match text.split_once('@') {
        Some((cell, view)) => is_identifier(cell) && is_identifier(view),
        None => is_identifier(text),
    }
}

/// Split `cell@view` into parts.
pub fn split_decorated(text: &str) -> (&str, Option<&str>) {
    match text.split_once('@') {
        Some((cell, view)) => (cell, Some(view)),
        None => (text, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_ref_forms() {
        assert_eq!(
            InstanceRef::parse("inv"),
            Some(InstanceRef::Local { symbol: "inv".into() })
        );
        assert_eq!(
            InstanceRef::parse("inv@behave"),
            Some(InstanceRef::LocalView { symbol: "inv".into(), view: "behave".into() })
        );
        assert_eq!(
            InstanceRef::parse("lib.inv"),
            Some(InstanceRef::Qualified { ns: "lib".into(), symbol: "inv".into() })
        );
        assert_eq!(
            InstanceRef::parse("lib.inv@behave"),
            Some(InstanceRef::QualifiedView {
                ns: "lib".into(),
                symbol: "inv".into(),
                view: "behave".into()
            })
        );
    }

    #[test]
    fn test_instance_ref_rejects_pattern_delimiters() {
        assert_eq!(InstanceRef::parse("in<v"), None);
        assert_eq!(InstanceRef::parse("a.b.c"), None);
        assert_eq!(InstanceRef::parse(""), None);
    }

    #[test]
    fn test_decorated_symbol_grammar() {
        assert!(is_decorated_symbol("inv"));
        assert!(is_decorated_symbol("inv@behave"));
        assert!(!is_decorated_symbol("inv@"));
        assert!(!is_decorated_symbol("@behave"));
        assert!(!is_decorated_symbol("inv@be@have"));
    }
}
