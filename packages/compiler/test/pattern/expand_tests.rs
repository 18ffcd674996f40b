//! Pattern expansion behavior.

use asdl_compiler::pattern::{
    expand, expand_endpoints, find_duplicates, parse_expression, ExpandOptions, PatternError,
};

fn texts(expr: &str) -> Vec<String> {
    expand(expr, &[], ExpandOptions::default())
        .unwrap()
        .atoms
        .into_iter()
        .map(|a| a.text)
        .collect()
}

#[test]
fn should_expand_operators_left_to_right() {
    assert_eq!(
        texts("tap<p|n><7:6>"),
        vec!["tap_p_7", "tap_n_7", "tap_p_6", "tap_n_6"]
    );
}

#[test]
fn should_produce_a_different_order_for_swapped_groups() {
    assert_eq!(
        texts("tap<7:6><p|n>"),
        vec!["tap_7_p", "tap_6_p", "tap_7_n", "tap_6_n"]
    );
}

#[test]
fn should_count_the_product_of_group_sizes() {
    let expansion = expand("x<p|n><7:0><a|b|c>", &[], ExpandOptions::default()).unwrap();
    assert_eq!(expansion.atoms.len(), 2 * 8 * 3);
}

#[test]
fn should_respect_range_direction() {
    assert_eq!(texts("b<1:3>"), vec!["b_1", "b_2", "b_3"]);
    assert_eq!(texts("b<3:1>"), vec!["b_3", "b_2", "b_1"]);
}

#[test]
fn should_splice_segments_in_order() {
    assert_eq!(texts("a<1:2>;vss"), vec!["a_1", "a_2", "vss"]);
}

#[test]
fn should_be_deterministic() {
    let first = expand("row<130:1>", &[], ExpandOptions::default()).unwrap();
    let second = expand("row<130:1>", &[], ExpandOptions::default()).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.atoms.len(), 130);
}

#[test]
fn should_split_endpoint_atoms_on_the_dot() {
    let (endpoints, _) = expand_endpoints("MN<P|N>.<S|D>", &[], ExpandOptions::default()).unwrap();
    let pairs: Vec<(String, String)> = endpoints
        .into_iter()
        .map(|e| (e.instance, e.pin))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("MN_P".to_string(), "S".to_string()),
            ("MN_N".to_string(), "S".to_string()),
            ("MN_P".to_string(), "D".to_string()),
            ("MN_N".to_string(), "D".to_string()),
        ]
    );
}

#[test]
fn should_reject_an_endpoint_without_a_dot() {
    let err = expand_endpoints("vss", &[], ExpandOptions::default()).unwrap_err();
    assert!(matches!(err, PatternError::EndpointDot { .. }));
}

#[test]
fn should_reject_commas_inside_groups() {
    assert!(matches!(
        parse_expression("x<a,b>"),
        Err(PatternError::CommaInGroup { .. })
    ));
}

#[test]
fn should_reject_whitespace_in_expressions() {
    assert!(matches!(
        parse_expression("x <a|b>"),
        Err(PatternError::Whitespace { .. })
    ));
}

#[test]
fn should_enforce_the_expansion_cap() {
    let options = ExpandOptions { cap: 1000, ..Default::default() };
    let err = expand("x<1:100><1:100>", &[], options).unwrap_err();
    assert_eq!(err, PatternError::TooLarge { cap: 1000 });
}

#[test]
fn should_forbid_splices_in_port_nets() {
    let options = ExpandOptions { forbid_splice: true, ..Default::default() };
    assert!(matches!(
        expand("a;b", &[], options),
        Err(PatternError::SpliceInPort { .. })
    ));
}

#[test]
fn should_record_parts_in_operator_order() {
    let expansion = expand("sw<2:1><a|b>", &[], ExpandOptions::default()).unwrap();
    let last = expansion.atoms.last().unwrap();
    assert_eq!(last.text, "sw_1_b");
    assert_eq!(last.parts.as_slice(), ["1".to_string(), "b".to_string()]);
}

#[test]
fn should_find_duplicate_atoms() {
    assert_eq!(find_duplicates(["a_1", "a_2", "a_1"]), vec!["a_1"]);
    assert!(find_duplicates(["a", "b"]).is_empty());
}
