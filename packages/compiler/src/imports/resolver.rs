//! File graph construction.
//!
//! Depth-first load from the entry file. Every document is parsed once per
//! normalized path (two namespaces importing the same file share one AST);
//! revisiting a file that is still on the active import chain is a cycle.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::ast::named_patterns::elaborate_document;
use crate::ast::nodes::{Document, InstanceRef};
use crate::ast::schema::document_from_yaml;
use crate::diagnostics::{codes, Diagnostic};
use crate::parse_util::{FileId, SourceMap, SourceSpan};
use crate::yaml::parse_document;

use super::name_env::{NameEnv, SymbolKind};
use super::path_expand::{expand_path, ExpandError};

/// Everything the resolver needs from the invocation environment.
#[derive(Debug, Clone, Default)]
pub struct ResolverConfig {
    /// Ordered logical roots from `ASDL_LIB_PATH` and `--lib` flags.
    pub lib_roots: Vec<PathBuf>,
    /// Captured environment for `$VAR` expansion.
    pub env: HashMap<String, String>,
    /// Home directory for `~` expansion.
    pub home: Option<PathBuf>,
}

/// All loaded documents keyed by file id, plus per-file name environments.
#[derive(Debug, Default)]
pub struct ProgramDB {
    pub entry: FileId,
    pub documents: IndexMap<FileId, Document>,
    pub name_envs: IndexMap<FileId, NameEnv>,
}

/// Failure modes of instance-reference resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefError {
    UnknownNamespace { ns: String },
    UnknownSymbol { qualified: bool, symbol: String },
}

impl ProgramDB {
    pub fn document(&self, file: FileId) -> Option<&Document> {
        self.documents.get(&file)
    }

    pub fn name_env(&self, file: FileId) -> Option<&NameEnv> {
        self.name_envs.get(&file)
    }

    /// Look up a possibly decorated symbol in one file: exact decorated
    /// match first, base name fallback.
    pub fn select_symbol(&self, file: FileId, decorated: &str) -> Option<(String, SymbolKind)> {
        let env = self.name_envs.get(&file)?;
        if let Some(kind) = env.resolve_local(decorated) {
            return Some((decorated.to_string(), kind));
        }
        let (base, view) = crate::ast::nodes::split_decorated(decorated);
        if view.is_some() {
            if let Some(kind) = env.resolve_local(base) {
                return Some((base.to_string(), kind));
            }
        }
        None
    }

    /// Resolve an instance reference from `from`'s scope to the declaring
    /// `(file, symbol, kind)`.
    pub fn resolve_instance_ref(
        &self,
        from: FileId,
        reference: &InstanceRef,
    ) -> Result<(FileId, String, SymbolKind), RefError> {
        let (target_file, qualified) = match reference.namespace() {
            Some(ns) => {
                let env = self.name_envs.get(&from);
                match env.and_then(|e| e.resolve_namespace(ns)) {
                    Some(file) => (file, true),
                    None => return Err(RefError::UnknownNamespace { ns: ns.to_string() }),
                }
            }
            None => (from, false),
        };
        let decorated = reference.decorated_symbol();
        match self.select_symbol(target_file, &decorated) {
            Some((symbol, kind)) => Ok((target_file, symbol, kind)),
            None => Err(RefError::UnknownSymbol { qualified, symbol: decorated }),
        }
    }
}

/// Resolver output, best-effort even in the presence of errors.
#[derive(Debug)]
pub struct LoadResult {
    pub program: Option<ProgramDB>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Load the program rooted at `entry_path`.
pub fn load_program(
    entry_path: &Path,
    config: &ResolverConfig,
    sources: &mut SourceMap,
) -> LoadResult {
    let mut loader = Loader {
        config,
        sources,
        db: ProgramDB::default(),
        diagnostics: Vec::new(),
        chain: Vec::new(),
    };
    let entry = loader.load_file(entry_path, None);
    let program = entry.map(|entry| {
        loader.db.entry = entry;
        loader.db
    });
    LoadResult { program, diagnostics: loader.diagnostics }
}

struct Loader<'a> {
    config: &'a ResolverConfig,
    sources: &'a mut SourceMap,
    db: ProgramDB,
    diagnostics: Vec<Diagnostic>,
    chain: Vec<FileId>,
}

impl<'a> Loader<'a> {
    fn load_file(&mut self, path: &Path, import_span: Option<SourceSpan>) -> Option<FileId> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                self.diagnostics.push(
                    Diagnostic::error(
                        codes::AST_IMPORT_MISSING,
                        format!("imported file `{}` not found: {}", path.display(), err),
                    )
                    .with_span(import_span),
                );
                return None;
            }
        };
        let file = self.sources.intern(path, content);

        if self.chain.contains(&file) {
            let mut names: Vec<String> =
                self.chain.iter().map(|&id| self.sources.display_path(id)).collect();
            names.push(self.sources.display_path(file));
            // Trim the chain to start at the revisited file.
            let start = self
                .chain
                .iter()
                .position(|&id| id == file)
                .unwrap_or(0);
            self.diagnostics.push(
                Diagnostic::error(
                    codes::AST_IMPORT_CYCLE,
                    format!("import cycle: {}", names[start..].join(" -> ")),
                )
                .with_span(import_span),
            );
            return None;
        }
        if self.db.documents.contains_key(&file) {
            return Some(file);
        }

        let source = self.sources.content(file).unwrap_or_default().to_string();
        let parsed = parse_document(&source, file);
        self.diagnostics.extend(parsed.errors);
        let mut document = match parsed.root.as_ref() {
            Some(root) => {
                let result = document_from_yaml(root);
                self.diagnostics.extend(result.errors);
                result.document.unwrap_or_default()
            }
            None => Document::default(),
        };
        self.diagnostics.extend(elaborate_document(&mut document));

        self.chain.push(file);
        let mut env = NameEnv::default();
        let imports: Vec<(String, String, Option<SourceSpan>)> = document
            .imports
            .iter()
            .map(|(ns, path)| (ns.clone(), path.value.clone(), path.span))
            .collect();
        for (ns, path_expr, span) in imports {
            if let Some(resolved) = self.resolve_import_path(path, &path_expr, span) {
                if let Some(imported) = self.load_file(&resolved, span) {
                    env.namespaces.insert(ns, imported);
                }
            }
        }
        self.chain.pop();

        for name in document.modules.keys() {
            env.symbols.insert(name.clone(), SymbolKind::Module);
        }
        for name in document.devices.keys() {
            env.symbols.insert(name.clone(), SymbolKind::Device);
        }

        self.db.documents.insert(file, document);
        self.db.name_envs.insert(file, env);
        Some(file)
    }

    /// Turn an import path expression into a concrete path: absolute,
    /// relative (to the importing file), or logical (first segment against
    /// the ordered library roots).
    fn resolve_import_path(
        &mut self,
        importing: &Path,
        expr: &str,
        span: Option<SourceSpan>,
    ) -> Option<PathBuf> {
        let expanded = match expand_path(expr, &self.config.env, self.config.home.as_deref()) {
            Ok(path) => path,
            Err(err) => {
                self.push_expand_error(expr, &err, span);
                return None;
            }
        };
        if expanded.is_absolute() {
            return Some(expanded);
        }
        if expr.starts_with("./") || expr.starts_with("../") {
            let base = importing.parent().unwrap_or(Path::new("."));
            return Some(base.join(expanded));
        }

        // Logical path: collect matches in root order.
        let matches: Vec<PathBuf> = self
            .config
            .lib_roots
            .iter()
            .map(|root| root.join(&expanded))
            .filter(|candidate| candidate.exists())
            .collect();
        match matches.len() {
            1 => Some(matches.into_iter().next().unwrap()),
            0 => {
                // Fall back to importing-file-relative before reporting.
                let base = importing.parent().unwrap_or(Path::new("."));
                let relative = base.join(&expanded);
                if relative.exists() {
                    Some(relative)
                } else {
                    self.diagnostics.push(
                        Diagnostic::error(
                            codes::AST_IMPORT_MISSING,
                            format!("imported file `{}` not found", expr),
                        )
                        .with_span(span),
                    );
                    None
                }
            }
            _ => {
                let listed = matches
                    .iter()
                    .map(|p| p.to_string_lossy().replace('\\', "/"))
                    .collect::<Vec<_>>()
                    .join(", ");
                self.diagnostics.push(
                    Diagnostic::error(
                        codes::AST_IMPORT_AMBIGUOUS,
                        format!("logical path `{}` matches multiple library roots: {}", expr, listed),
                    )
                    .with_span(span),
                );
                None
            }
        }
    }

    fn push_expand_error(&mut self, expr: &str, err: &ExpandError, span: Option<SourceSpan>) {
        self.diagnostics.push(
            Diagnostic::error(
                codes::AST_IMPORT_EXPANSION,
                format!("cannot expand `{}` in import path: {}", expr, err),
            )
            .with_span(span),
        );
    }
}
