//! Endpoint binding behavior, including axis projection at scale.

use asdl_compiler::pattern::{bind, expand, BindError, ExpandOptions};

fn axes(names: &[&str]) -> Vec<Option<String>> {
    names
        .iter()
        .map(|n| if n.is_empty() { None } else { Some(n.to_string()) })
        .collect()
}

#[test]
fn should_bind_elementwise_when_lengths_agree() {
    let lhs = expand("$in<p|n>", &[], ExpandOptions::default()).unwrap();
    let rhs = expand("X<p|n>.a", &[], ExpandOptions::default()).unwrap();
    let binding = bind(&lhs, &rhs).unwrap();
    assert_eq!(binding, vec![vec![0], vec![1]]);
}

#[test]
fn should_broadcast_a_scalar_endpoint() {
    let lhs = expand("tap<7:0>", &[], ExpandOptions::default()).unwrap();
    let rhs = expand("R1.n", &[], ExpandOptions::default()).unwrap();
    let binding = bind(&lhs, &rhs).unwrap();
    assert_eq!(binding.len(), 8);
    assert!(binding.iter().all(|b| b == &[0]));
}

#[test]
fn should_error_on_plain_length_mismatch() {
    let lhs = expand("a<1:3>", &[], ExpandOptions::default()).unwrap();
    let rhs = expand("X<1:2>.p", &[], ExpandOptions::default()).unwrap();
    assert_eq!(
        bind(&lhs, &rhs).unwrap_err(),
        BindError::LengthMismatch { lhs: 3, rhs: 2 }
    );
}

#[test]
fn should_project_a_shared_tagged_axis_over_a_row_axis() {
    // Differently indexed ranges <25:1> and <24:0> share size 25 through
    // the BUS tag; the 130-row axis broadcasts.
    let lhs = expand("BUS<25:1>", &axes(&["BUS"]), ExpandOptions::default()).unwrap();
    let rhs = expand(
        "sw_row<130:1>.BUS<24:0>",
        &axes(&["ROW", "BUS"]),
        ExpandOptions::default(),
    )
    .unwrap();
    assert_eq!(lhs.atoms.len(), 25);
    assert_eq!(rhs.atoms.len(), 130 * 25);

    let binding = bind(&lhs, &rhs).unwrap();
    assert_eq!(binding.len(), 25);
    assert!(binding.iter().all(|b| b.len() == 130));
    // All 3250 endpoint atoms are consumed exactly once.
    let total: usize = binding.iter().map(Vec::len).sum();
    assert_eq!(total, 3250);
    let mut seen: Vec<usize> = binding.iter().flatten().copied().collect();
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen.len(), 3250);
}

#[test]
fn should_match_a_numeric_suffix_name_against_a_tag() {
    // Axis ids from a pattern name (`BUS25`) and from a tag (`BUS`)
    // reconcile modulo the numeric index hint.
    let lhs = expand("BUS<25:1>", &axes(&["BUS25"]), ExpandOptions::default()).unwrap();
    let rhs = expand(
        "sw_row<130:1>.BUS<24:0>",
        &axes(&["ROW", "BUS"]),
        ExpandOptions::default(),
    )
    .unwrap();
    let binding = bind(&lhs, &rhs).unwrap();
    assert_eq!(binding.len(), 25);
    assert!(binding.iter().all(|b| b.len() == 130));
}

#[test]
fn should_error_when_no_axis_is_shared() {
    let lhs = expand("a<1:2>", &axes(&["A"]), ExpandOptions::default()).unwrap();
    let rhs = expand("x<1:3>.p", &axes(&["B"]), ExpandOptions::default()).unwrap();
    assert_eq!(bind(&lhs, &rhs).unwrap_err(), BindError::NoSharedAxis);
}

#[test]
fn should_pair_axis_positions_by_index_not_value() {
    let lhs = expand("BUS<2:1>", &axes(&["BUS"]), ExpandOptions::default()).unwrap();
    let rhs = expand("X.b<1:0>", &axes(&["BUS"]), ExpandOptions::default()).unwrap();
    // Positions pair up: BUS_2 <-> b_1, BUS_1 <-> b_0.
    let binding = bind(&lhs, &rhs).unwrap();
    assert_eq!(binding, vec![vec![0], vec![1]]);
}

#[test]
fn should_report_axis_size_mismatches() {
    let lhs = expand("a<1:3>", &axes(&["A"]), ExpandOptions::default()).unwrap();
    let rhs = expand("X<1:2>.p", &axes(&["A"]), ExpandOptions::default()).unwrap();
    assert_eq!(
        bind(&lhs, &rhs).unwrap_err(),
        BindError::AxisSizeMismatch { axis: "A".into(), lhs: 3, rhs: 2 }
    );
}

#[test]
fn should_require_consistent_shared_axis_order() {
    let lhs = expand("x<1:2><a|b>", &axes(&["A", "B"]), ExpandOptions::default()).unwrap();
    let rhs = expand("y<a|b|c>.<1:2>", &axes(&["B", "A"]), ExpandOptions::default()).unwrap();
    assert_eq!(bind(&lhs, &rhs).unwrap_err(), BindError::AxisOrder);
}

#[test]
fn should_not_project_when_any_group_is_anonymous() {
    let lhs = expand("x<1:3>", &axes(&[""]), ExpandOptions::default()).unwrap();
    let rhs = expand("y<1:2>.<a|b>", &axes(&["", ""]), ExpandOptions::default()).unwrap();
    assert!(matches!(
        bind(&lhs, &rhs).unwrap_err(),
        BindError::LengthMismatch { .. }
    ));
}
