//! NetlistIR node types.

use indexmap::IndexMap;

use crate::atomize::AtomizedPatternOrigin;
use crate::graph::ExprId;
use crate::imports::SymbolKind;
use crate::parse_util::{FileId, SourceSpan};

/// A flat net.
#[derive(Debug, Clone)]
pub struct NetlistNet {
    pub name: String,
    pub is_port: bool,
    pub pattern_origin: Option<AtomizedPatternOrigin>,
}

/// A flat instance with ordered connections.
#[derive(Debug, Clone)]
pub struct NetlistInstance {
    pub name: String,
    /// Collision-free name used in the output text.
    pub emitted_name: String,
    /// Referenced symbol (module emitted name, or device symbol).
    pub reference: String,
    pub ref_file_id: FileId,
    pub ref_kind: SymbolKind,
    /// target pin -> net atom, ordered by the referenced declaration's
    /// ports; pins with no matching port keep authoring order at the end.
    pub conns: IndexMap<String, String>,
    pub parameters: IndexMap<String, String>,
    /// Device-level variables; backend variables merge in at emission.
    pub variables: IndexMap<String, String>,
    pub pattern_origin: Option<AtomizedPatternOrigin>,
    pub span: Option<SourceSpan>,
}

/// A flat module.
#[derive(Debug, Clone)]
pub struct NetlistModule {
    /// Base cell name (view decoration dropped).
    pub name: String,
    pub emitted_name: String,
    pub file_id: FileId,
    pub ports: Vec<String>,
    /// String-stringified parameter defaults.
    pub parameters: IndexMap<String, String>,
    pub nets: Vec<NetlistNet>,
    pub instances: Vec<NetlistInstance>,
    /// Expressions referenced by this module's provenance, harvested from
    /// the registry.
    pub pattern_expression_table: IndexMap<ExprId, String>,
    pub span: Option<SourceSpan>,
}

/// A device primitive visible to emission.
#[derive(Debug, Clone)]
pub struct NetlistDevice {
    pub name: String,
    pub file_id: FileId,
    pub ports: Vec<String>,
    pub parameters: IndexMap<String, String>,
    pub variables: IndexMap<String, String>,
    /// Backend names declared on the device.
    pub backends: Vec<String>,
}

/// The emission-ready design.
#[derive(Debug, Clone)]
pub struct NetlistDesign {
    pub entry_file_id: FileId,
    /// Emitted name of the top module.
    pub top_name: String,
    /// Reachable modules in emission order (dependencies before their
    /// users, top last).
    pub modules: Vec<NetlistModule>,
    pub devices: Vec<NetlistDevice>,
    /// Authored name -> emitted name, modules and instances, written to the
    /// compile log.
    pub emission_name_map: IndexMap<String, String>,
}

impl NetlistDesign {
    pub fn top(&self) -> Option<&NetlistModule> {
        self.modules.iter().find(|m| m.emitted_name == self.top_name)
    }
}
