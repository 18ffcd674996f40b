//! View config parsing.
//!
//! The config is span-less YAML loaded through serde; validation produces
//! diagnostics rather than panics so a broken config degrades gracefully.

use indexmap::IndexMap;
use serde::Deserialize;

use crate::ast::nodes::{is_decorated_symbol, split_decorated};
use crate::diagnostics::{codes, Diagnostic};

/// Raw file shape.
#[derive(Debug, Deserialize)]
struct ViewConfigFile {
    #[serde(default)]
    profiles: IndexMap<String, ProfileFile>,
}

#[derive(Debug, Deserialize)]
struct ProfileFile {
    #[serde(default)]
    view_order: u32,
    #[serde(default)]
    rules: Vec<RuleFile>,
}

#[derive(Debug, Deserialize)]
struct RuleFile {
    id: Option<String>,
    instance: Option<String>,
    module: Option<String>,
    bind: String,
}

/// A validated rule match: exactly one of a hierarchical instance path (with
/// `*` wildcard segments) or a decorated module name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleMatch {
    Instance(String),
    Module(String),
}

/// A validated rule.
#[derive(Debug, Clone)]
pub struct ViewRule {
    pub id: String,
    pub matcher: RuleMatch,
    /// `(cell, view)` from `cell` or `cell@view`.
    pub bind_cell: String,
    pub bind_view: Option<String>,
}

impl ViewRule {
    pub fn bind_symbol(&self) -> String {
        match &self.bind_view {
            Some(view) => format!("{}@{}", self.bind_cell, view),
            None => self.bind_cell.clone(),
        }
    }
}

/// A validated profile.
#[derive(Debug, Clone)]
pub struct ViewProfile {
    pub name: String,
    pub view_order: u32,
    pub rules: Vec<ViewRule>,
}

/// All profiles of a config.
#[derive(Debug, Clone, Default)]
pub struct ViewConfig {
    pub profiles: IndexMap<String, ViewProfile>,
}

impl ViewConfig {
    /// Select profiles by name, ordered by `view_order` then name-request
    /// order. Unknown names are diagnostics.
    pub fn select<'a>(
        &'a self,
        names: &[String],
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<&'a ViewProfile> {
        let mut selected: Vec<&ViewProfile> = Vec::new();
        for name in names {
            match self.profiles.get(name) {
                Some(profile) => selected.push(profile),
                None => diagnostics.push(Diagnostic::error(
                    codes::VIEW_UNKNOWN_PROFILE,
                    format!("profile `{}` is not defined in the view config", name),
                )),
            }
        }
        selected.sort_by_key(|p| p.view_order);
        selected
    }
}

/// Parse and validate a view config document.
pub fn load_view_config(source: &str) -> (ViewConfig, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();
    let file: ViewConfigFile = match serde_yaml::from_str(source) {
        Ok(file) => file,
        Err(err) => {
            diagnostics.push(Diagnostic::error(
                codes::VIEW_RULE_MATCH,
                format!("cannot parse view config: {}", err),
            ));
            return (ViewConfig::default(), diagnostics);
        }
    };

    let mut config = ViewConfig::default();
    for (profile_name, profile) in file.profiles {
        let mut rules = Vec::new();
        for (index, rule) in profile.rules.into_iter().enumerate() {
            let id = rule.id.unwrap_or_else(|| format!("rule{}", index + 1));
            let matcher = match (&rule.instance, &rule.module) {
                (Some(path), None) => RuleMatch::Instance(path.clone()),
                (None, Some(name)) => RuleMatch::Module(name.clone()),
                _ => {
                    diagnostics.push(Diagnostic::error(
                        codes::VIEW_RULE_MATCH,
                        format!("rule `{}` must match exactly one of `instance` or `module`", id),
                    ));
                    continue;
                }
            };
            if !is_decorated_symbol(&rule.bind) {
                diagnostics.push(Diagnostic::error(
                    codes::VIEW_RULE_BIND,
                    format!("rule `{}` bind `{}` is not `cell` or `cell@view`", id, rule.bind),
                ));
                continue;
            }
            let (cell, view) = split_decorated(&rule.bind);
            rules.push(ViewRule {
                id,
                matcher,
                bind_cell: cell.to_string(),
                bind_view: view.map(String::from),
            });
        }
        config.profiles.insert(
            profile_name.clone(),
            ViewProfile { name: profile_name, view_order: profile.view_order, rules },
        );
    }
    (config, diagnostics)
}

/// Match a hierarchical occurrence path like `top/stage_2/M1` against a
/// rule path; `*` matches one segment.
pub fn path_matches(pattern: &str, path: &str) -> bool {
    let pattern_segments: Vec<&str> = pattern.split('/').collect();
    let path_segments: Vec<&str> = path.split('/').collect();
    if pattern_segments.len() != path_segments.len() {
        return false;
    }
    pattern_segments
        .iter()
        .zip(&path_segments)
        .all(|(p, s)| *p == "*" || p == s)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = "\
profiles:
  fast:
    view_order: 1
    rules:
      - module: inv
        bind: inv@fast
      - instance: top/stage_2
        bind: stage@behave
";

    #[test]
    fn test_profiles_and_default_rule_ids() {
        let (config, diagnostics) = load_view_config(CONFIG);
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        let fast = &config.profiles["fast"];
        assert_eq!(fast.rules.len(), 2);
        assert_eq!(fast.rules[0].id, "rule1");
        assert_eq!(fast.rules[1].matcher, RuleMatch::Instance("top/stage_2".into()));
        assert_eq!(fast.rules[1].bind_symbol(), "stage@behave");
    }

    #[test]
    fn test_rule_with_both_matchers_rejected() {
        let source = "\
profiles:
  p:
    rules:
      - module: a
        instance: b
        bind: c
";
        let (_, diagnostics) = load_view_config(source);
        assert!(diagnostics.iter().any(|d| d.code == codes::VIEW_RULE_MATCH));
    }

    #[test]
    fn test_bad_bind_symbol_rejected() {
        let source = "\
profiles:
  p:
    rules:
      - module: a
        bind: not@a@cell
";
        let (_, diagnostics) = load_view_config(source);
        assert!(diagnostics.iter().any(|d| d.code == codes::VIEW_RULE_BIND));
    }

    #[test]
    fn test_unknown_profile_selection() {
        let (config, _) = load_view_config(CONFIG);
        let mut diagnostics = Vec::new();
        let selected = config.select(&["nope".to_string()], &mut diagnostics);
        assert!(selected.is_empty());
        assert_eq!(diagnostics[0].code, codes::VIEW_UNKNOWN_PROFILE);
    }

    #[test]
    fn test_path_wildcards() {
        assert!(path_matches("top/*/M1", "top/stage_2/M1"));
        assert!(!path_matches("top/*/M1", "top/stage_2/sub/M1"));
        assert!(path_matches("top/stage_2", "top/stage_2"));
    }
}
