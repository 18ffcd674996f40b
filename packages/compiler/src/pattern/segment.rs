//! Pattern expression grammar.
//!
//! An expression is a `;`-spliced list of segments; each segment is a run
//! of literals and `<...>` groups. A group is an alternation `<A|B>`, a
//! direction-sensitive numeric range `<7:0>`, or a named reference
//! `<@NAME>` (substituted before the engine sees it; parsing keeps the
//! variant for validation and completion tooling).

use thiserror::Error;

use crate::chars;

/// A `<...>` group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Group {
    Alt(Vec<String>),
    Range { start: i64, end: i64 },
    Named(String),
}

impl Group {
    /// Number of atoms this group multiplies the expansion by.
    pub fn size(&self) -> usize {
        match self {
            Group::Alt(values) => values.len(),
            Group::Range { start, end } => (start.abs_diff(*end) + 1) as usize,
            Group::Named(_) => 1,
        }
    }

    /// Substitution values in group order.
    pub fn values(&self) -> Vec<String> {
        match self {
            Group::Alt(values) => values.clone(),
            Group::Range { start, end } => {
                let step: i64 = if start <= end { 1 } else { -1 };
                let mut out = Vec::with_capacity(self.size());
                let mut v = *start;
                loop {
                    out.push(v.to_string());
                    if v == *end {
                        break;
                    }
                    v += step;
                }
                out
            }
            Group::Named(name) => vec![format!("<@{}>", name)],
        }
    }
}

/// One piece of a segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece {
    Literal(String),
    Group(Group),
}

/// A `;`-delimited slice of the expression.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Segment {
    pub pieces: Vec<Piece>,
}

impl Segment {
    /// Concatenated literal runs; the stem recorded as `base_name` in
    /// pattern provenance.
    pub fn base_name(&self) -> String {
        self.pieces
            .iter()
            .filter_map(|p| match p {
                Piece::Literal(text) => Some(text.as_str()),
                Piece::Group(_) => None,
            })
            .collect()
    }

    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.pieces.iter().filter_map(|p| match p {
            Piece::Group(group) => Some(group),
            Piece::Literal(_) => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("empty group")]
    EmptyGroup { offset: usize },
    #[error("empty alternative in group")]
    EmptyAlternative { offset: usize },
    #[error("unbalanced `<`")]
    UnbalancedOpen { offset: usize },
    #[error("unbalanced `>`")]
    UnbalancedClose { offset: usize },
    #[error("`<` groups cannot nest")]
    NestedGroup { offset: usize },
    #[error("`|` and `:` cannot be mixed in one group")]
    MixedGroup { offset: usize },
    #[error("`,` is not valid inside a group; write an alternation or a range")]
    CommaInGroup { offset: usize },
    #[error("whitespace is not allowed in a pattern expression")]
    Whitespace { offset: usize },
    #[error("invalid range bound `{text}`")]
    BadRange { text: String, offset: usize },
    #[error("empty segment")]
    EmptySegment { offset: usize },
    #[error("named reference `<@{name}>` was not substituted")]
    UnresolvedNamed { name: String, offset: usize },
    #[error("endpoint atom `{atom}` must contain exactly one `.`")]
    EndpointDot { atom: String },
    #[error("`;` splice is not allowed in port nets")]
    SpliceInPort { offset: usize },
    #[error("expansion exceeds the {cap}-atom limit")]
    TooLarge { cap: usize },
}

/// Parse an expression into its segments.
pub fn parse_expression(expr: &str) -> Result<Vec<Segment>, PatternError> {
    let mut segments = Vec::new();
    let mut segment = Segment::default();
    let mut literal = String::new();
    let mut group_body: Option<(String, usize)> = None;

    for (offset, ch) in expr.char_indices() {
        if ch.is_whitespace() {
            return Err(PatternError::Whitespace { offset });
        }
        match &mut group_body {
            Some((body, start)) => match ch {
                chars::GT => {
                    let group = parse_group(body, *start)?;
                    segment.pieces.push(Piece::Group(group));
                    group_body = None;
                }
                chars::LT => return Err(PatternError::NestedGroup { offset }),
                _ => body.push(ch),
            },
            None => match ch {
                chars::LT => {
                    if !literal.is_empty() {
                        segment.pieces.push(Piece::Literal(std::mem::take(&mut literal)));
                    }
                    group_body = Some((String::new(), offset));
                }
                chars::GT => return Err(PatternError::UnbalancedClose { offset }),
                chars::SEMICOLON => {
                    if !literal.is_empty() {
                        segment.pieces.push(Piece::Literal(std::mem::take(&mut literal)));
                    }
                    if segment.pieces.is_empty() {
                        return Err(PatternError::EmptySegment { offset });
                    }
                    segments.push(std::mem::take(&mut segment));
                }
                _ => literal.push(ch),
            },
        }
    }
    if let Some((_, start)) = group_body {
        return Err(PatternError::UnbalancedOpen { offset: start });
    }
    if !literal.is_empty() {
        segment.pieces.push(Piece::Literal(literal));
    }
    if segment.pieces.is_empty() {
        return Err(PatternError::EmptySegment { offset: expr.len() });
    }
    segments.push(segment);
    Ok(segments)
}

fn parse_group(body: &str, offset: usize) -> Result<Group, PatternError> {
    if body.is_empty() {
        return Err(PatternError::EmptyGroup { offset });
    }
    if let Some(comma) = body.find(chars::COMMA) {
        return Err(PatternError::CommaInGroup { offset: offset + 1 + comma });
    }
    if let Some(name) = body.strip_prefix(chars::AT) {
        return Ok(Group::Named(name.to_string()));
    }

    let has_pipe = body.contains(chars::PIPE);
    let has_colon = body.contains(chars::COLON);
    if has_pipe && has_colon {
        return Err(PatternError::MixedGroup { offset });
    }
    if has_colon {
        let (start_text, end_text) =
            body.split_once(chars::COLON).expect("colon presence checked");
        let parse_bound = |text: &str| -> Result<i64, PatternError> {
            text.parse::<i64>().map_err(|_| PatternError::BadRange {
                text: text.to_string(),
                offset,
            })
        };
        return Ok(Group::Range { start: parse_bound(start_text)?, end: parse_bound(end_text)? });
    }
    if has_pipe {
        let values: Vec<String> = body.split(chars::PIPE).map(String::from).collect();
        if values.iter().any(String::is_empty) {
            return Err(PatternError::EmptyAlternative { offset });
        }
        return Ok(Group::Alt(values));
    }
    // A single value is a one-element alternation.
    Ok(Group::Alt(vec![body.to_string()]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_only() {
        let segments = parse_expression("tap").unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].pieces, vec![Piece::Literal("tap".into())]);
    }

    #[test]
    fn test_alternation_and_range() {
        let segments = parse_expression("tap<p|n><7:0>").unwrap();
        let groups: Vec<_> = segments[0].groups().cloned().collect();
        assert_eq!(
            groups,
            vec![
                Group::Alt(vec!["p".into(), "n".into()]),
                Group::Range { start: 7, end: 0 },
            ]
        );
        assert_eq!(segments[0].base_name(), "tap");
    }

    #[test]
    fn test_splice_segments() {
        let segments = parse_expression("a<1:2>;b").unwrap();
        assert_eq!(segments.len(), 2);
    }

    #[test]
    fn test_named_reference() {
        let segments = parse_expression("x<@BUS>").unwrap();
        assert_eq!(
            segments[0].pieces[1],
            Piece::Group(Group::Named("BUS".into()))
        );
    }

    #[test]
    fn test_empty_group_rejected() {
        assert_eq!(parse_expression("x<>"), Err(PatternError::EmptyGroup { offset: 1 }));
    }

    #[test]
    fn test_mixed_separators_rejected() {
        assert!(matches!(
            parse_expression("x<a|1:2>"),
            Err(PatternError::MixedGroup { .. })
        ));
    }

    #[test]
    fn test_comma_rejected() {
        assert!(matches!(
            parse_expression("x<a,b>"),
            Err(PatternError::CommaInGroup { .. })
        ));
    }

    #[test]
    fn test_whitespace_rejected() {
        assert!(matches!(
            parse_expression("x <a|b>"),
            Err(PatternError::Whitespace { .. })
        ));
    }

    #[test]
    fn test_unbalanced_brackets() {
        assert!(matches!(
            parse_expression("x<a|b"),
            Err(PatternError::UnbalancedOpen { .. })
        ));
        assert!(matches!(
            parse_expression("xa|b>"),
            Err(PatternError::UnbalancedClose { .. })
        ));
    }

    #[test]
    fn test_range_direction_values() {
        let up = Group::Range { start: 1, end: 3 };
        assert_eq!(up.values(), vec!["1", "2", "3"]);
        let down = Group::Range { start: 3, end: 1 };
        assert_eq!(down.values(), vec!["3", "2", "1"]);
    }
}
