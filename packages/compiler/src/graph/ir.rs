//! PatternedGraph node types.

use indexmap::IndexMap;
use serde::Serialize;

use crate::ast::nodes::{InstanceRef, PatternExpr};
use crate::imports::SymbolKind;
use crate::parse_util::{FileId, SourceSpan};

use super::registry::{ExprId, Registries};

/// Stable module/device identity: `(file_id, name)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ModuleId {
    pub file: FileId,
    pub name: String,
}

impl ModuleId {
    pub fn new(file: FileId, name: impl Into<String>) -> Self {
        ModuleId { file, name: name.into() }
    }
}

impl std::fmt::Display for ModuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.file.0, self.name)
    }
}

/// Bundle-level pattern provenance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternOrigin {
    pub expression_id: ExprId,
    pub segment_index: u32,
    pub base_name: String,
}

/// A net with its pattern expression unexpanded.
#[derive(Debug, Clone)]
pub struct NetBundle {
    pub id: u32,
    /// Name expression, `$` sentinel stripped.
    pub name: PatternExpr,
    pub expr_id: ExprId,
    pub is_port: bool,
    pub endpoints: Vec<EndpointBundle>,
    pub origin: PatternOrigin,
    pub span: Option<SourceSpan>,
}

/// An endpoint expression attached to a net.
#[derive(Debug, Clone)]
pub struct EndpointBundle {
    pub id: u32,
    pub expr: PatternExpr,
    pub expr_id: ExprId,
    /// True when introduced by `instance_defaults`.
    pub from_default: bool,
    /// `!`-prefixed default: override warning suppressed.
    pub suppress_override_warning: bool,
    pub span: Option<SourceSpan>,
}

/// An instance with its name expression unexpanded.
#[derive(Debug, Clone)]
pub struct InstanceBundle {
    pub id: u32,
    pub name: PatternExpr,
    pub expr_id: ExprId,
    pub reference: InstanceRef,
    /// Resolved declaration symbol in the target file.
    pub ref_symbol: String,
    pub ref_file_id: FileId,
    pub ref_kind: SymbolKind,
    pub parameters: IndexMap<String, String>,
    pub origin: PatternOrigin,
    pub span: Option<SourceSpan>,
}

/// A module with patterns unexpanded.
#[derive(Debug, Clone)]
pub struct ModuleGraph {
    pub id: ModuleId,
    /// Port name expressions in port order: explicit `ports:` first, then
    /// `$`-nets, then defaults-introduced `$`-nets.
    pub ports: Vec<PatternExpr>,
    pub parameters: IndexMap<String, String>,
    pub variables: IndexMap<String, String>,
    pub net_bundles: Vec<NetBundle>,
    pub instance_bundles: Vec<InstanceBundle>,
    pub span: Option<SourceSpan>,
}

/// A device primitive.
#[derive(Debug, Clone)]
pub struct DeviceGraph {
    pub id: ModuleId,
    pub ports: Vec<String>,
    pub parameters: IndexMap<String, String>,
    pub variables: IndexMap<String, String>,
    /// Backend names in authoring order; templates live in the registry.
    pub backends: Vec<String>,
    pub span: Option<SourceSpan>,
}

/// The whole program, patterns unexpanded.
#[derive(Debug)]
pub struct ProgramGraph {
    pub entry_file_id: FileId,
    pub modules: Vec<ModuleGraph>,
    pub devices: Vec<DeviceGraph>,
    pub registries: Registries,
}

impl ProgramGraph {
    pub fn module(&self, id: &ModuleId) -> Option<&ModuleGraph> {
        self.modules.iter().find(|m| &m.id == id)
    }

    pub fn device(&self, id: &ModuleId) -> Option<&DeviceGraph> {
        self.devices.iter().find(|d| &d.id == id)
    }
}
