//! Profile application.
//!
//! Applied post-atomization. Rules rewrite instance references; a
//! path-scoped rule can make occurrences of the same authored module
//! diverge, in which case every occurrence becomes its own module with a
//! deterministically specialized file id (never a synthesized
//! `__occ_<hash>` name), so the global collision allocator in NetlistIR
//! lowering handles naming uniformly.

use indexmap::IndexMap;

use crate::ast::nodes::split_decorated;
use crate::atomize::{AtomizedModuleGraph, AtomizedProgram};
use crate::diagnostics::{codes, Diagnostic};
use crate::graph::ModuleId;
use crate::imports::{ProgramDB, SymbolKind};
use crate::parse_util::{FileId, SourceMap};

use super::config::{path_matches, RuleMatch, ViewProfile, ViewRule};

/// One applied binding, recorded for the compile log.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BindingRecord {
    pub path: String,
    pub profile: String,
    pub rule_id: String,
    pub from: String,
    pub to: String,
}

/// Binder output.
#[derive(Debug)]
pub struct ViewBindResult {
    pub program: AtomizedProgram,
    pub bindings: Vec<BindingRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Apply the selected profiles to the hierarchy rooted at `top`.
pub fn apply_views(
    program: &AtomizedProgram,
    db: &ProgramDB,
    profiles: &[&ViewProfile],
    top: &ModuleId,
    sources: &mut SourceMap,
) -> ViewBindResult {
    let rules: Vec<(String, &ViewRule)> = profiles
        .iter()
        .flat_map(|p| p.rules.iter().map(move |r| (p.name.clone(), r)))
        .collect();
    if rules.is_empty() {
        return ViewBindResult {
            program: program.clone(),
            bindings: Vec::new(),
            diagnostics: Vec::new(),
        };
    }

    let mut binder = Binder {
        program,
        db,
        rules,
        diagnostics: Vec::new(),
        bindings: Vec::new(),
        occurrences: IndexMap::new(),
        stack: Vec::new(),
    };

    let top_path = split_decorated(&top.name).0.to_string();
    binder.survey(top, &top_path, true);

    // Authored targets whose occurrences diverge get one module per
    // occurrence; everything else keeps its (possibly rebound) shared id.
    let mut assigned: IndexMap<String, ModuleId> = IndexMap::new();
    let occurrences = std::mem::take(&mut binder.occurrences);
    for (_authored, occs) in &occurrences {
        let divergent =
            occs.len() > 1 && occs.iter().any(|o| o.content_key != occs[0].content_key);
        for occ in occs {
            let id = if divergent {
                let base = split_decorated(&occ.final_target.name).0.to_string();
                let synthetic =
                    sources.intern(std::path::Path::new(&format!("<occurrence:{}>", occ.path)), String::new());
                ModuleId::new(synthetic, base)
            } else {
                occ.final_target.clone()
            };
            assigned.insert(occ.path.clone(), id);
        }
    }

    // Rebuild: clone rewritten content under each assigned id.
    let mut modules: IndexMap<ModuleId, AtomizedModuleGraph> = program
        .modules
        .iter()
        .map(|m| (m.id.clone(), m.clone()))
        .collect();
    binder.stack.clear();
    binder.rebuild(top, top.clone(), &top_path, &assigned, &mut modules);

    ViewBindResult {
        program: AtomizedProgram {
            entry_file_id: program.entry_file_id,
            modules: modules.into_values().collect(),
        },
        bindings: binder.bindings,
        diagnostics: binder.diagnostics,
    }
}

/// One surveyed occurrence of an authored module.
#[derive(Debug, Clone)]
struct Occurrence {
    path: String,
    /// Identity of the post-binding target module.
    final_target: ModuleId,
    /// Recursive content fingerprint of the occurrence.
    content_key: String,
}

struct Binder<'a> {
    program: &'a AtomizedProgram,
    db: &'a ProgramDB,
    rules: Vec<(String, &'a ViewRule)>,
    diagnostics: Vec<Diagnostic>,
    bindings: Vec<BindingRecord>,
    /// Authored target id -> occurrences, in DFS discovery order.
    occurrences: IndexMap<ModuleId, Vec<Occurrence>>,
    stack: Vec<ModuleId>,
}

impl<'a> Binder<'a> {
    /// Pass 1: walk the hierarchy, apply rules, and fingerprint each
    /// occurrence's content. Diagnostics and binding records are only
    /// collected here.
    fn survey(&mut self, module_id: &ModuleId, path: &str, record: bool) -> String {
        let Some(module) = self.program.module(module_id) else {
            return format!("missing:{}", module_id);
        };
        if self.stack.contains(module_id) {
            return format!("cycle:{}", module_id);
        }
        self.stack.push(module_id.clone());

        let mut key = String::new();
        for instance in &module.instances {
            let occ_path = format!("{}/{}", path, instance.name);
            let (file, symbol, kind) =
                self.apply_rules(&occ_path, instance.ref_file_id, &instance.ref_symbol, record);
            key.push_str(&instance.name);
            key.push('=');
            if kind == SymbolKind::Module {
                let authored = ModuleId::new(instance.ref_file_id, instance.ref_symbol.clone());
                let target = ModuleId::new(file, symbol.clone());
                let child_key = self.survey(&target, &occ_path, record);
                key.push_str(&format!("{}#{}[{}]", file.0, symbol, child_key));
                if record {
                    self.occurrences.entry(authored).or_default().push(Occurrence {
                        path: occ_path,
                        final_target: target,
                        content_key: child_key,
                    });
                }
            } else {
                key.push_str(&format!("dev:{}#{}", file.0, symbol));
            }
            key.push(';');
        }
        self.stack.pop();
        key
    }

    /// Apply the last matching rule to one instance occurrence.
    fn apply_rules(
        &mut self,
        occ_path: &str,
        ref_file: FileId,
        ref_symbol: &str,
        record: bool,
    ) -> (FileId, String, SymbolKind) {
        let mut matched: Option<(&String, &ViewRule)> = None;
        for (profile, rule) in &self.rules {
            let hit = match &rule.matcher {
                RuleMatch::Instance(pattern) => path_matches(pattern, occ_path),
                RuleMatch::Module(name) => {
                    name == ref_symbol || name == split_decorated(ref_symbol).0
                }
            };
            if hit {
                matched = Some((profile, rule));
            }
        }

        let current_kind = self
            .db
            .select_symbol(ref_file, ref_symbol)
            .map(|(_, kind)| kind)
            .unwrap_or(SymbolKind::Module);

        let Some((profile, rule)) = matched else {
            return (ref_file, ref_symbol.to_string(), current_kind);
        };
        let bind_symbol = rule.bind_symbol();
        match self.db.select_symbol(ref_file, &bind_symbol) {
            Some((resolved, kind)) => {
                if record && resolved != ref_symbol {
                    self.bindings.push(BindingRecord {
                        path: occ_path.to_string(),
                        profile: profile.clone(),
                        rule_id: rule.id.clone(),
                        from: ref_symbol.to_string(),
                        to: resolved.clone(),
                    });
                }
                (ref_file, resolved, kind)
            }
            None => {
                if record {
                    self.diagnostics.push(Diagnostic::error(
                        codes::VIEW_RULE_BIND,
                        format!(
                            "rule `{}`: bind target `{}` not found for `{}`",
                            rule.id, bind_symbol, occ_path
                        ),
                    ));
                }
                (ref_file, ref_symbol.to_string(), current_kind)
            }
        }
    }

    /// Pass 2: materialize the rewritten module tree under the assigned
    /// ids. `source_id` is the module whose content backs this occurrence.
    fn rebuild(
        &mut self,
        source_id: &ModuleId,
        assigned_id: ModuleId,
        path: &str,
        assigned: &IndexMap<String, ModuleId>,
        out: &mut IndexMap<ModuleId, AtomizedModuleGraph>,
    ) {
        if self.stack.contains(source_id) {
            return;
        }
        self.stack.push(source_id.clone());

        let Some(source) = self.program.module(source_id) else {
            self.stack.pop();
            return;
        };
        let mut content = source.clone();
        content.id = assigned_id.clone();

        for instance in &mut content.instances {
            let occ_path = format!("{}/{}", path, instance.name);
            let (file, symbol, kind) =
                self.apply_rules(&occ_path, instance.ref_file_id, &instance.ref_symbol, false);
            if kind == SymbolKind::Module {
                let target = ModuleId::new(file, symbol.clone());
                let child_assigned = assigned.get(&occ_path).cloned().unwrap_or_else(|| target.clone());
                instance.ref_file_id = child_assigned.file;
                instance.ref_symbol = child_assigned.name.clone();
                self.rebuild(&target, child_assigned, &occ_path, assigned, out);
            } else {
                instance.ref_file_id = file;
                instance.ref_symbol = symbol;
                instance.ref_kind = kind;
            }
        }

        out.insert(assigned_id, content);
        self.stack.pop();
    }
}
