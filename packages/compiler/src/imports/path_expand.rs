//! Path expression expansion.
//!
//! Expands `~` and `$VAR`/`${VAR}` in import paths and library roots. The
//! environment is captured once at CLI entry and passed in; nothing here
//! reads the process environment.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpandError {
    #[error("environment variable `{0}` is not set")]
    UndefinedVariable(String),
    #[error("unclosed `${{` in `{0}`")]
    UnclosedBrace(String),
    #[error("`~` cannot be expanded: no home directory")]
    NoHome,
}

/// Expand a path expression. `home` backs `~`; `env` backs `$VAR`.
pub fn expand_path(
    input: &str,
    env: &HashMap<String, String>,
    home: Option<&Path>,
) -> Result<PathBuf, ExpandError> {
    let mut out = String::new();
    let mut rest = input;

    if rest == "~" || rest.starts_with("~/") {
        let home = home.ok_or(ExpandError::NoHome)?;
        out.push_str(&home.to_string_lossy());
        rest = &rest[1..];
    }

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos + 1..];
        let (name, after) = if let Some(stripped) = rest.strip_prefix('{') {
            let close = stripped
                .find('}')
                .ok_or_else(|| ExpandError::UnclosedBrace(input.to_string()))?;
            (&stripped[..close], &stripped[close + 1..])
        } else {
            let end = rest
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(rest.len());
            (&rest[..end], &rest[end..])
        };
        if name.is_empty() {
            out.push('$');
        } else {
            let value = env
                .get(name)
                .ok_or_else(|| ExpandError::UndefinedVariable(name.to_string()))?;
            out.push_str(value);
        }
        rest = after;
    }
    out.push_str(rest);
    Ok(PathBuf::from(out))
}

/// Split an `ASDL_LIB_PATH` value on the OS path separator and expand each
/// root. Roots that fail to expand are returned as errors alongside the
/// usable ones.
pub fn expand_lib_path(
    value: &str,
    env: &HashMap<String, String>,
    home: Option<&Path>,
) -> (Vec<PathBuf>, Vec<(String, ExpandError)>) {
    let separator = if cfg!(windows) { ';' } else { ':' };
    let mut roots = Vec::new();
    let mut errors = Vec::new();
    for part in value.split(separator) {
        if part.is_empty() {
            continue;
        }
        match expand_path(part, env, home) {
            Ok(path) => roots.push(path),
            Err(err) => errors.push((part.to_string(), err)),
        }
    }
    (roots, errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_plain_path_passes_through() {
        let result = expand_path("/lib/cells.asdl", &env(&[]), None).unwrap();
        assert_eq!(result, PathBuf::from("/lib/cells.asdl"));
    }

    #[test]
    fn test_tilde_expands_to_home() {
        let result = expand_path("~/lib", &env(&[]), Some(Path::new("/home/u"))).unwrap();
        assert_eq!(result, PathBuf::from("/home/u/lib"));
    }

    #[test]
    fn test_braced_and_bare_variables() {
        let e = env(&[("ROOT", "/r")]);
        assert_eq!(expand_path("${ROOT}/x", &e, None).unwrap(), PathBuf::from("/r/x"));
        assert_eq!(expand_path("$ROOT/x", &e, None).unwrap(), PathBuf::from("/r/x"));
    }

    #[test]
    fn test_undefined_variable_is_error() {
        let err = expand_path("$NOPE/x", &env(&[]), None).unwrap_err();
        assert_eq!(err, ExpandError::UndefinedVariable("NOPE".into()));
    }

    #[test]
    fn test_unclosed_brace_is_error() {
        let err = expand_path("${OOPS/x", &env(&[]), None).unwrap_err();
        assert!(matches!(err, ExpandError::UnclosedBrace(_)));
    }

    #[test]
    fn test_lib_path_splits_and_reports_bad_roots() {
        let (roots, errors) = expand_lib_path("/a:$BAD:/b", &env(&[]), None);
        assert_eq!(roots, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
        assert_eq!(errors.len(), 1);
    }
}
