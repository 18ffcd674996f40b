//! Pattern expansion.
//!
//! Operators are processed strictly left to right; each group duplicates
//! the entire current list once per substitution value, so the first group
//! varies fastest. `;` splices segment expansions into one ordered list.

use smallvec::SmallVec;

use crate::chars;

use super::segment::{parse_expression, Group, PatternError, Piece, Segment};

/// Default cap on the total number of atoms one expression may expand to.
pub const DEFAULT_EXPANSION_CAP: usize = 1_000_000;

/// Expansion options.
#[derive(Debug, Clone, Copy)]
pub struct ExpandOptions {
    pub cap: usize,
    /// `$`-net expressions refuse `;` splices.
    pub forbid_splice: bool,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        ExpandOptions { cap: DEFAULT_EXPANSION_CAP, forbid_splice: false }
    }
}

/// One expanded atom with its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atom {
    pub text: String,
    pub segment_index: u32,
    pub atom_index: u32,
    /// Substitution values in operator order.
    pub parts: SmallVec<[String; 4]>,
}

/// One group's contribution to the expansion shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupDim {
    /// Axis identity when the group came from a named pattern.
    pub axis: Option<String>,
    pub size: usize,
    /// True when every substitution value is numeric (drives display
    /// formatting in the emitter).
    pub numeric: bool,
}

/// An expanded expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    pub atoms: Vec<Atom>,
    /// Group dims in scan order across all segments. Axis projection only
    /// applies to single-segment expressions.
    pub dims: Vec<GroupDim>,
    pub segment_count: usize,
    /// Literal stem of each segment, for provenance.
    pub segment_bases: Vec<String>,
}

impl Expansion {
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}

/// Expand `expr`. `axes` carries the per-group axis identity recorded by
/// named-pattern elaboration (empty when none).
pub fn expand(expr: &str, axes: &[Option<String>], options: ExpandOptions) -> Result<Expansion, PatternError> {
    let segments = parse_expression(expr)?;
    if options.forbid_splice && segments.len() > 1 {
        let offset = expr.find(chars::SEMICOLON).unwrap_or(0);
        return Err(PatternError::SpliceInPort { offset });
    }

    // Enforce the cap before materializing anything.
    let mut total: usize = 0;
    for segment in &segments {
        let mut size: usize = 1;
        for group in segment.groups() {
            size = size.saturating_mul(group.size());
        }
        total = total.saturating_add(size);
    }
    if total > options.cap {
        return Err(PatternError::TooLarge { cap: options.cap });
    }

    let mut atoms = Vec::with_capacity(total);
    let mut dims = Vec::new();
    let mut segment_bases = Vec::with_capacity(segments.len());
    let mut group_index = 0usize;
    for (segment_index, segment) in segments.iter().enumerate() {
        let expanded = expand_segment(segment, segment_index as u32, &mut group_index, axes, &mut dims)?;
        atoms.extend(expanded);
        segment_bases.push(segment.base_name());
    }
    Ok(Expansion { atoms, dims, segment_count: segments.len(), segment_bases })
}

fn expand_segment(
    segment: &Segment,
    segment_index: u32,
    group_index: &mut usize,
    axes: &[Option<String>],
    dims: &mut Vec<GroupDim>,
) -> Result<Vec<Atom>, PatternError> {
    let mut current: Vec<Atom> = vec![Atom {
        text: String::new(),
        segment_index,
        atom_index: 0,
        parts: SmallVec::new(),
    }];

    for piece in &segment.pieces {
        match piece {
            Piece::Literal(text) => {
                for atom in &mut current {
                    atom.text.push_str(text);
                }
            }
            Piece::Group(Group::Named(name)) => {
                return Err(PatternError::UnresolvedNamed {
                    name: name.clone(),
                    offset: 0,
                });
            }
            Piece::Group(group) => {
                let values = group.values();
                let axis = axes.get(*group_index).cloned().flatten();
                dims.push(GroupDim {
                    axis,
                    size: values.len(),
                    numeric: matches!(group, Group::Range { .. }),
                });
                *group_index += 1;
                let mut next = Vec::with_capacity(current.len() * values.len());
                for value in &values {
                    for atom in &current {
                        let mut text = atom.text.clone();
                        if needs_joiner(&text) {
                            text.push(chars::UNDERSCORE);
                        }
                        text.push_str(value);
                        let mut parts = atom.parts.clone();
                        parts.push(value.clone());
                        next.push(Atom { text, segment_index, atom_index: 0, parts });
                    }
                }
                current = next;
            }
        }
    }
    for (i, atom) in current.iter_mut().enumerate() {
        atom.atom_index = i as u32;
    }
    Ok(current)
}

/// Substitution values join to the stem with `_`, except at the start of a
/// name or right after the instance/pin separator.
fn needs_joiner(text: &str) -> bool {
    match text.chars().last() {
        None => false,
        Some(chars::PERIOD) => false,
        Some(_) => true,
    }
}

/// An endpoint atom split into its instance and pin parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointAtom {
    pub instance: String,
    pub pin: String,
    pub atom: Atom,
}

/// Expand an endpoint expression: the whole expression expands first, then
/// each atom must split on exactly one `.`.
pub fn expand_endpoints(
    expr: &str,
    axes: &[Option<String>],
    options: ExpandOptions,
) -> Result<(Vec<EndpointAtom>, Vec<GroupDim>), PatternError> {
    let expansion = expand(expr, axes, options)?;
    let mut endpoints = Vec::with_capacity(expansion.atoms.len());
    for atom in expansion.atoms {
        let mut split = atom.text.split(chars::PERIOD);
        let (instance, pin) = match (split.next(), split.next(), split.next()) {
            (Some(instance), Some(pin), None) if !instance.is_empty() && !pin.is_empty() => {
                (instance.to_string(), pin.to_string())
            }
            _ => return Err(PatternError::EndpointDot { atom: atom.text }),
        };
        endpoints.push(EndpointAtom { instance, pin, atom });
    }
    Ok((endpoints, expansion.dims))
}

/// Duplicate literal atoms in one ordered list.
pub fn find_duplicates<'a, I: IntoIterator<Item = &'a str>>(atoms: I) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut duplicates = Vec::new();
    for atom in atoms {
        if !seen.insert(atom) && !duplicates.iter().any(|d| d == atom) {
            duplicates.push(atom.to_string());
        }
    }
    duplicates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(expansion: &Expansion) -> Vec<&str> {
        expansion.atoms.iter().map(|a| a.text.as_str()).collect()
    }

    #[test]
    fn test_left_to_right_duplication_order() {
        let expansion = expand("tap<p|n><1:0>", &[], ExpandOptions::default()).unwrap();
        assert_eq!(texts(&expansion), vec!["tap_p_1", "tap_n_1", "tap_p_0", "tap_n_0"]);
    }

    #[test]
    fn test_reversed_group_order_changes_order() {
        let expansion = expand("tap<1:0><p|n>", &[], ExpandOptions::default()).unwrap();
        assert_eq!(texts(&expansion), vec!["tap_1_p", "tap_0_p", "tap_1_n", "tap_0_n"]);
    }

    #[test]
    fn test_count_is_product_of_group_sizes() {
        let expansion = expand("x<p|n><7:0><a|b|c>", &[], ExpandOptions::default()).unwrap();
        assert_eq!(expansion.len(), 2 * 8 * 3);
    }

    #[test]
    fn test_splice_concatenates() {
        let expansion = expand("a<1:2>;b", &[], ExpandOptions::default()).unwrap();
        assert_eq!(texts(&expansion), vec!["a_1", "a_2", "b"]);
        assert_eq!(expansion.segment_count, 2);
    }

    #[test]
    fn test_parts_record_operator_order() {
        let expansion = expand("tap<p|n><1:0>", &[], ExpandOptions::default()).unwrap();
        let atom = &expansion.atoms[1];
        assert_eq!(atom.text, "tap_n_1");
        assert_eq!(atom.parts.as_slice(), ["n".to_string(), "1".to_string()]);
    }

    #[test]
    fn test_endpoint_split() {
        let (endpoints, _) =
            expand_endpoints("MN<P|N>.<S|D>", &[], ExpandOptions::default()).unwrap();
        assert_eq!(endpoints.len(), 4);
        assert_eq!(endpoints[0].instance, "MN_P");
        assert_eq!(endpoints[0].pin, "S");
    }

    #[test]
    fn test_endpoint_needs_exactly_one_dot() {
        let err = expand_endpoints("a_b", &[], ExpandOptions::default()).unwrap_err();
        assert!(matches!(err, PatternError::EndpointDot { .. }));
        let err = expand_endpoints("a.b.c", &[], ExpandOptions::default()).unwrap_err();
        assert!(matches!(err, PatternError::EndpointDot { .. }));
    }

    #[test]
    fn test_splice_forbidden_for_ports() {
        let options = ExpandOptions { forbid_splice: true, ..Default::default() };
        let err = expand("$a;$b", &[], options).unwrap_err();
        assert!(matches!(err, PatternError::SpliceInPort { .. }));
    }

    #[test]
    fn test_cap_enforced_before_materializing() {
        let options = ExpandOptions { cap: 10, ..Default::default() };
        let err = expand("x<1:100>", &[], options).unwrap_err();
        assert_eq!(err, PatternError::TooLarge { cap: 10 });
    }

    #[test]
    fn test_duplicate_detection() {
        let dups = find_duplicates(["a", "b", "a", "a"]);
        assert_eq!(dups, vec!["a"]);
    }

    #[test]
    fn test_expansion_is_deterministic() {
        let a = expand("x<p|n><3:0>", &[], ExpandOptions::default()).unwrap();
        let b = expand("x<p|n><3:0>", &[], ExpandOptions::default()).unwrap();
        assert_eq!(a, b);
    }
}
