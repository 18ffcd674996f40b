//! Per-file name environment.

use indexmap::IndexMap;

use crate::parse_util::FileId;

/// What a local symbol names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Module,
    Device,
}

/// Maps a file's import namespaces to file ids and its local symbols to
/// their declaration kind. Unqualified references resolve in the current
/// file only; qualified references go through `namespaces`.
#[derive(Debug, Clone, Default)]
pub struct NameEnv {
    pub namespaces: IndexMap<String, FileId>,
    pub symbols: IndexMap<String, SymbolKind>,
}

impl NameEnv {
    pub fn resolve_namespace(&self, ns: &str) -> Option<FileId> {
        self.namespaces.get(ns).copied()
    }

    pub fn resolve_local(&self, symbol: &str) -> Option<SymbolKind> {
        self.symbols.get(symbol).copied()
    }
}
