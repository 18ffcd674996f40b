//! Graph registries.
//!
//! Heavier shared data lives here, indexed by id, so per-node provenance
//! stays cheap. Registries hang off the [`ProgramGraph`](super::ir::ProgramGraph)
//! root and are never duplicated per module.

use indexmap::IndexMap;
use serde::Serialize;

use crate::parse_util::{FileId, SourceSpan};

/// Stable id of a registered pattern expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ExprId(pub u32);

/// Semantic position an expression was used in. The same string registered
/// under two kinds gets two distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExprKind {
    Net,
    Endpoint,
    Instance,
    Param,
}

/// A registered expression.
#[derive(Debug, Clone, Serialize)]
pub struct ExprInfo {
    pub id: ExprId,
    pub kind: ExprKind,
    pub expression: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<SourceSpan>,
    /// Per-group axis identities recorded by named-pattern elaboration.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub axes: Vec<Option<String>>,
}

/// Interner keyed by `(kind, expression)`; ids are sequential in first-use
/// order, so identical inputs always produce identical ids.
#[derive(Debug, Default)]
pub struct PatternExpressionRegistry {
    by_key: IndexMap<(ExprKind, String), ExprId>,
    infos: Vec<ExprInfo>,
}

impl PatternExpressionRegistry {
    pub fn intern(
        &mut self,
        kind: ExprKind,
        expression: &str,
        span: Option<SourceSpan>,
        axes: &[Option<String>],
    ) -> ExprId {
        if let Some(&id) = self.by_key.get(&(kind, expression.to_string())) {
            return id;
        }
        let id = ExprId(self.infos.len() as u32);
        self.by_key.insert((kind, expression.to_string()), id);
        self.infos.push(ExprInfo {
            id,
            kind,
            expression: expression.to_string(),
            span,
            axes: axes.to_vec(),
        });
        id
    }

    pub fn get(&self, id: ExprId) -> Option<&ExprInfo> {
        self.infos.get(id.0 as usize)
    }

    pub fn lookup(&self, kind: ExprKind, expression: &str) -> Option<ExprId> {
        self.by_key.get(&(kind, expression.to_string())).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExprInfo> {
        self.infos.iter()
    }

    pub fn len(&self) -> usize {
        self.infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }
}

/// One device backend template.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateEntry {
    pub template: String,
    pub variables: IndexMap<String, String>,
}

/// Device backend templates keyed by `(file, device, backend)`.
#[derive(Debug, Default)]
pub struct BackendTemplateRegistry {
    templates: IndexMap<(FileId, String, String), TemplateEntry>,
}

impl BackendTemplateRegistry {
    pub fn insert(
        &mut self,
        file: FileId,
        device: &str,
        backend: &str,
        entry: TemplateEntry,
    ) {
        self.templates
            .insert((file, device.to_string(), backend.to_string()), entry);
    }

    pub fn get(&self, file: FileId, device: &str, backend: &str) -> Option<&TemplateEntry> {
        self.templates
            .get(&(file, device.to_string(), backend.to_string()))
    }

    /// Backends registered for one device, in insertion order.
    pub fn backends_of(&self, file: FileId, device: &str) -> Vec<&str> {
        self.templates
            .keys()
            .filter(|(f, d, _)| *f == file && d == device)
            .map(|(_, _, b)| b.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Free-form annotations attached to module symbols, carried through to
/// tool dumps.
#[derive(Debug, Default)]
pub struct AnnotationIndex {
    entries: IndexMap<(FileId, String), IndexMap<String, String>>,
}

impl AnnotationIndex {
    pub fn annotate(&mut self, file: FileId, symbol: &str, key: &str, value: &str) {
        self.entries
            .entry((file, symbol.to_string()))
            .or_default()
            .insert(key.to_string(), value.to_string());
    }

    pub fn get(&self, file: FileId, symbol: &str) -> Option<&IndexMap<String, String>> {
        self.entries.get(&(file, symbol.to_string()))
    }
}

/// All registries, hanging off the program graph root.
#[derive(Debug, Default)]
pub struct Registries {
    pub expressions: PatternExpressionRegistry,
    pub templates: BackendTemplateRegistry,
    pub annotations: AnnotationIndex,
}
