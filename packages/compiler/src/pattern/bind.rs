//! Endpoint binding.
//!
//! Binds a left-hand (net/instance) atom list to a right-hand
//! (endpoint/default) list: elementwise when lengths agree, scalar
//! broadcast for a single right-hand atom, axis projection when every group
//! on both sides carries a named-pattern axis identity. Axis ids compare
//! modulo a trailing numeric index hint, so a pattern named `BUS25` shares
//! axis `BUS` with a pattern tagged `BUS`; sides with no axis in common are
//! a binding error, never a silent full cross.

use thiserror::Error;

use super::expand::{Expansion, GroupDim};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("cannot bind {rhs} endpoints to {lhs} atoms")]
    LengthMismatch { lhs: usize, rhs: usize },
    #[error("axis `{axis}` has {lhs} positions on the net side and {rhs} on the endpoint side")]
    AxisSizeMismatch { axis: String, lhs: usize, rhs: usize },
    #[error("shared axes appear in a different order on the two sides")]
    AxisOrder,
    #[error("the two sides share no pattern axis")]
    NoSharedAxis,
    #[error("axis `{axis}` appears more than once on one side")]
    DuplicateAxis { axis: String },
}

/// For each left-hand position, the right-hand indices bound to it (in
/// right-hand order).
pub type Binding = Vec<Vec<usize>>;

/// Bind `rhs` onto `lhs`.
pub fn bind(lhs: &Expansion, rhs: &Expansion) -> Result<Binding, BindError> {
    let l = lhs.len();
    let r = rhs.len();

    if r == l {
        return Ok((0..l).map(|i| vec![i]).collect());
    }
    if r == 1 {
        return Ok(vec![vec![0]; l]);
    }
    if l == 1 {
        return Ok(vec![(0..r).collect()]);
    }
    project_by_axis(lhs, rhs).ok_or(BindError::LengthMismatch { lhs: l, rhs: r })?
}

/// Axis projection. Returns `None` when the sides are not eligible (any
/// anonymous group, or a spliced expression), so the caller reports a plain
/// length mismatch; eligibility with inconsistent axes is a specific error.
fn project_by_axis(lhs: &Expansion, rhs: &Expansion) -> Option<Result<Binding, BindError>> {
    if lhs.segment_count != 1 || rhs.segment_count != 1 {
        return None;
    }
    let lhs_axes = named_axes(&lhs.dims)?;
    let rhs_axes = named_axes(&rhs.dims)?;

    if let Some(axis) = first_duplicate(&lhs_axes).or_else(|| first_duplicate(&rhs_axes)) {
        return Some(Err(BindError::DuplicateAxis { axis }));
    }

    // Shared axes, in left-hand order; they must form a left-to-right
    // subsequence of the right-hand side too. Two sides that share nothing
    // cannot project at all.
    let shared: Vec<&str> = lhs_axes
        .iter()
        .map(|(id, _)| id.as_str())
        .filter(|id| rhs_axes.iter().any(|(rid, _)| rid == id))
        .collect();
    if shared.is_empty() {
        return Some(Err(BindError::NoSharedAxis));
    }
    let rhs_shared: Vec<&str> = rhs_axes
        .iter()
        .map(|(id, _)| id.as_str())
        .filter(|id| shared.contains(id))
        .collect();
    if shared != rhs_shared {
        return Some(Err(BindError::AxisOrder));
    }
    for id in &shared {
        let lsize = lhs_axes.iter().find(|(a, _)| a == id).map(|(_, s)| *s).unwrap_or(0);
        let rsize = rhs_axes.iter().find(|(a, _)| a == id).map(|(_, s)| *s).unwrap_or(0);
        if lsize != rsize {
            return Some(Err(BindError::AxisSizeMismatch {
                axis: id.to_string(),
                lhs: lsize,
                rhs: rsize,
            }));
        }
    }

    // Group right-hand atoms by their coordinates on the shared axes.
    let mut by_key: std::collections::HashMap<Vec<usize>, Vec<usize>> =
        std::collections::HashMap::new();
    for j in 0..rhs.len() {
        let coords = decode(j, &rhs.dims);
        let key = shared_key(&shared, &rhs_axes, &coords);
        by_key.entry(key).or_default().push(j);
    }

    let mut out = Vec::with_capacity(lhs.len());
    for i in 0..lhs.len() {
        let coords = decode(i, &lhs.dims);
        let key = shared_key(&shared, &lhs_axes, &coords);
        match by_key.get(&key) {
            Some(indices) => out.push(indices.clone()),
            None => {
                return Some(Err(BindError::LengthMismatch { lhs: lhs.len(), rhs: rhs.len() }))
            }
        }
    }
    Some(Ok(out))
}

/// Axis ids match modulo a trailing numeric index hint: `BUS25`, `BUS0`
/// and the tag `BUS` all name axis `BUS`. An id that is nothing but digits
/// stays as authored.
fn axis_key(id: &str) -> &str {
    let trimmed = id.trim_end_matches(|c: char| c.is_ascii_digit());
    if trimmed.is_empty() {
        id
    } else {
        trimmed
    }
}

/// `(normalized axis id, size)` per group; `None` when any group is
/// anonymous.
fn named_axes(dims: &[GroupDim]) -> Option<Vec<(String, usize)>> {
    dims.iter()
        .map(|dim| {
            dim.axis
                .as_deref()
                .map(|axis| (axis_key(axis).to_string(), dim.size))
        })
        .collect()
}

fn first_duplicate(axes: &[(String, usize)]) -> Option<String> {
    for (i, (axis, _)) in axes.iter().enumerate() {
        if axes[..i].iter().any(|(other, _)| other == axis) {
            return Some(axis.clone());
        }
    }
    None
}

/// Decode an atom index into per-group coordinates: the first group varies
/// fastest.
fn decode(index: usize, dims: &[GroupDim]) -> Vec<usize> {
    let mut coords = Vec::with_capacity(dims.len());
    let mut rest = index;
    for dim in dims {
        coords.push(rest % dim.size);
        rest /= dim.size;
    }
    coords
}

fn shared_key(shared: &[&str], axes: &[(String, usize)], coords: &[usize]) -> Vec<usize> {
    shared
        .iter()
        .map(|id| {
            let pos = axes.iter().position(|(a, _)| a == id).expect("shared axis present");
            coords[pos]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::expand::{expand, ExpandOptions};

    fn expand_with(expr: &str, axes: &[Option<String>]) -> Expansion {
        expand(expr, axes, ExpandOptions::default()).unwrap()
    }

    fn axis(name: &str) -> Option<String> {
        Some(name.to_string())
    }

    #[test]
    fn test_elementwise_binding() {
        let lhs = expand_with("$in<p|n>", &[]);
        let rhs = expand_with("x<p|n>", &[]);
        assert_eq!(bind(&lhs, &rhs).unwrap(), vec![vec![0], vec![1]]);
    }

    #[test]
    fn test_scalar_broadcast() {
        let lhs = expand_with("tap<3:0>", &[]);
        let rhs = expand_with("vss", &[]);
        assert_eq!(bind(&lhs, &rhs).unwrap(), vec![vec![0]; 4]);
    }

    #[test]
    fn test_plain_length_mismatch_is_error() {
        let lhs = expand_with("a<1:3>", &[]);
        let rhs = expand_with("b<1:2>", &[]);
        assert_eq!(
            bind(&lhs, &rhs).unwrap_err(),
            BindError::LengthMismatch { lhs: 3, rhs: 2 }
        );
    }

    #[test]
    fn test_axis_projection_inherits_shared_axis() {
        // Net BUS<1:0> against endpoint row<1:3>.BUS<1:0>, axes BUS and ROW.
        let lhs = expand_with("BUS<1:0>", &[axis("BUS")]);
        let rhs = expand_with("row<1:3>.BUS<1:0>", &[axis("ROW"), axis("BUS")]);
        let binding = bind(&lhs, &rhs).unwrap();
        assert_eq!(binding.len(), 2);
        // Each BUS position collects all three rows; positions pair up by
        // index within the axis, BUS being the slower axis on the endpoint
        // side.
        assert_eq!(binding[0], vec![0, 1, 2]);
        assert_eq!(binding[1], vec![3, 4, 5]);
    }

    #[test]
    fn test_tagged_axes_bridge_different_ranges() {
        // <25:1> and <24:0> share size 25 via tag BUS.
        let lhs = expand_with("$BUS<25:1>", &[axis("BUS")]);
        let rhs = expand_with("sw<2:1>.B<24:0>", &[axis("ROW"), axis("BUS")]);
        let binding = bind(&lhs, &rhs).unwrap();
        assert_eq!(binding.len(), 25);
        assert!(binding.iter().all(|b| b.len() == 2));
    }

    #[test]
    fn test_numeric_suffix_name_shares_an_axis_with_a_tag() {
        // A pattern named BUS25 on one side, a pattern tagged BUS on the
        // other: both name axis BUS.
        let lhs = expand_with("BUS<25:1>", &[axis("BUS25")]);
        let rhs = expand_with("sw<130:1>.B<24:0>", &[axis("ROW"), axis("BUS")]);
        let binding = bind(&lhs, &rhs).unwrap();
        assert_eq!(binding.len(), 25);
        assert!(binding.iter().all(|b| b.len() == 130));
    }

    #[test]
    fn test_disjoint_axes_are_an_error() {
        let lhs = expand_with("a<1:2>", &[axis("A")]);
        let rhs = expand_with("x<1:3>.p", &[axis("B")]);
        assert_eq!(bind(&lhs, &rhs).unwrap_err(), BindError::NoSharedAxis);
    }

    #[test]
    fn test_axis_size_mismatch_is_specific_error() {
        let lhs = expand_with("x<1:3>", &[axis("A")]);
        let rhs = expand_with("y<1:2>.p", &[axis("A")]);
        assert_eq!(
            bind(&lhs, &rhs).unwrap_err(),
            BindError::AxisSizeMismatch { axis: "A".into(), lhs: 3, rhs: 2 }
        );
    }

    #[test]
    fn test_anonymous_groups_fall_back_to_length_mismatch() {
        let lhs = expand_with("x<1:3>", &[]);
        let rhs = expand_with("y<1:2>.<a|b>", &[]);
        assert!(matches!(
            bind(&lhs, &rhs).unwrap_err(),
            BindError::LengthMismatch { .. }
        ));
    }

    #[test]
    fn test_shared_axis_order_must_agree() {
        let lhs = expand_with("x<1:2><a|b>", &[axis("A"), axis("B")]);
        let rhs = expand_with("y<a|b|c>.<1:2>", &[axis("B"), axis("A")]);
        assert_eq!(bind(&lhs, &rhs).unwrap_err(), BindError::AxisOrder);
    }
}
