//! Inline instance shorthand.
//!
//! The single shared parser for `"ref key='value with spaces' k2=v2"`.
//! Both the schema validator and the structured `{ref, parameters}` form go
//! through this module so the two spellings cannot drift apart.

use indexmap::IndexMap;
use thiserror::Error;

use crate::chars;

/// Parsed shorthand body.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceBody {
    pub ref_raw: String,
    pub parameters: IndexMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShorthandError {
    #[error("unterminated quote in instance expression")]
    UnterminatedQuote { offset: usize },
    #[error("expected `key=value`, found `{token}`")]
    BadToken { token: String, offset: usize },
    #[error("instance expression is empty")]
    Empty,
}

/// Tokenize quote-aware: whitespace splits tokens except inside single or
/// double quotes. Backslash escaping is reserved and passes through.
fn tokenize(text: &str) -> Result<Vec<(String, usize)>, ShorthandError> {
    let mut tokens: Vec<(String, usize)> = Vec::new();
    let mut current = String::new();
    let mut start = 0usize;
    let mut quote: Option<char> = None;
    let mut quote_offset = 0usize;

    for (i, ch) in text.char_indices() {
        match quote {
            Some(q) => {
                if ch == q {
                    quote = None;
                } else {
                    current.push(ch);
                }
            }
            None => match ch {
                chars::SQ | chars::DQ => {
                    quote = Some(ch);
                    quote_offset = i;
                }
                c if c.is_whitespace() => {
                    if !current.is_empty() {
                        tokens.push((std::mem::take(&mut current), start));
                    }
                    start = i + 1;
                }
                c => {
                    if current.is_empty() {
                        start = i;
                    }
                    current.push(c);
                }
            },
        }
    }
    if quote.is_some() {
        return Err(ShorthandError::UnterminatedQuote { offset: quote_offset });
    }
    if !current.is_empty() {
        tokens.push((current, start));
    }
    Ok(tokens)
}

/// Parse an inline instance body: first token is the reference, remaining
/// tokens are `key=value` parameter bindings. Later duplicates override
/// earlier ones, preserving the first position.
pub fn parse_instance_body(text: &str) -> Result<InstanceBody, ShorthandError> {
    let tokens = tokenize(text)?;
    let mut it = tokens.into_iter();
    let (ref_raw, _) = it.next().ok_or(ShorthandError::Empty)?;

    let mut parameters = IndexMap::new();
    for (token, offset) in it {
        match token.split_once(chars::EQ) {
            Some((key, value)) if !key.is_empty() => {
                parameters.insert(key.to_string(), value.to_string());
            }
            _ => return Err(ShorthandError::BadToken { token, offset }),
        }
    }
    Ok(InstanceBody { ref_raw, parameters })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_reference() {
        let body = parse_instance_body("nmos_dev").unwrap();
        assert_eq!(body.ref_raw, "nmos_dev");
        assert!(body.parameters.is_empty());
    }

    #[test]
    fn test_parameters_in_order() {
        let body = parse_instance_body("nmos_dev w=1u l=0.15u").unwrap();
        assert_eq!(body.ref_raw, "nmos_dev");
        let keys: Vec<_> = body.parameters.keys().cloned().collect();
        assert_eq!(keys, vec!["w", "l"]);
        assert_eq!(body.parameters["w"], "1u");
    }

    #[test]
    fn test_single_quotes_group_whitespace() {
        let body = parse_instance_body("res model='rm 2x' w=2").unwrap();
        assert_eq!(body.parameters["model"], "rm 2x");
        assert_eq!(body.parameters["w"], "2");
    }

    #[test]
    fn test_double_quotes_group_whitespace() {
        let body = parse_instance_body("res model=\"rm 2x\"").unwrap();
        assert_eq!(body.parameters["model"], "rm 2x");
    }

    #[test]
    fn test_unterminated_quote() {
        let err = parse_instance_body("res model='rm").unwrap_err();
        assert!(matches!(err, ShorthandError::UnterminatedQuote { .. }));
    }

    #[test]
    fn test_token_without_equals_is_rejected() {
        let err = parse_instance_body("res stray").unwrap_err();
        assert!(matches!(err, ShorthandError::BadToken { .. }));
    }

    #[test]
    fn test_empty_body() {
        assert_eq!(parse_instance_body("  "), Err(ShorthandError::Empty));
    }
}
