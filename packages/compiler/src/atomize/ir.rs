//! AtomizedGraph node types.

use indexmap::IndexMap;
use serde::Serialize;
use smallvec::SmallVec;

use crate::graph::{ExprId, ModuleId};
use crate::imports::SymbolKind;
use crate::parse_util::{FileId, SourceSpan};

/// Per-atom pattern provenance. Survives even when the upstream registry
/// entry is missing or registered under a different kind, so renderers can
/// still format numeric suffixes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtomizedPatternOrigin {
    pub expression_id: ExprId,
    pub segment_index: u32,
    pub atom_index: u32,
    pub base_name: String,
    /// Substitution values in operator order.
    pub pattern_parts: SmallVec<[String; 4]>,
}

/// A scalar net.
#[derive(Debug, Clone)]
pub struct AtomizedNet {
    pub name: String,
    pub is_port: bool,
    pub origin: Option<AtomizedPatternOrigin>,
    pub span: Option<SourceSpan>,
}

/// A scalar endpoint bound to a net atom.
#[derive(Debug, Clone)]
pub struct AtomizedEndpoint {
    pub instance: String,
    pub pin: String,
    /// Index into the owning module's `nets`.
    pub net: usize,
    /// True when the binding came from `instance_defaults`.
    pub from_default: bool,
    pub suppress_override_warning: bool,
    pub origin: Option<AtomizedPatternOrigin>,
    pub span: Option<SourceSpan>,
}

/// A scalar instance.
#[derive(Debug, Clone)]
pub struct AtomizedInstance {
    pub name: String,
    pub ref_symbol: String,
    pub ref_file_id: FileId,
    pub ref_kind: SymbolKind,
    pub parameters: IndexMap<String, String>,
    pub origin: Option<AtomizedPatternOrigin>,
    pub span: Option<SourceSpan>,
}

/// A module with everything expanded to scalars.
#[derive(Debug, Clone)]
pub struct AtomizedModuleGraph {
    pub id: ModuleId,
    /// Scalar port names in final port order.
    pub ports: Vec<String>,
    pub parameters: IndexMap<String, String>,
    pub variables: IndexMap<String, String>,
    pub nets: Vec<AtomizedNet>,
    pub instances: Vec<AtomizedInstance>,
    pub endpoints: Vec<AtomizedEndpoint>,
    pub span: Option<SourceSpan>,
}

impl AtomizedModuleGraph {
    pub fn instance(&self, name: &str) -> Option<&AtomizedInstance> {
        self.instances.iter().find(|i| i.name == name)
    }
}

/// The fully atomized program. Devices pass through unchanged from the
/// patterned graph; registries stay on the `ProgramGraph` root.
#[derive(Debug, Clone)]
pub struct AtomizedProgram {
    pub entry_file_id: FileId,
    pub modules: Vec<AtomizedModuleGraph>,
}

impl AtomizedProgram {
    pub fn module(&self, id: &ModuleId) -> Option<&AtomizedModuleGraph> {
        self.modules.iter().find(|m| &m.id == id)
    }
}
