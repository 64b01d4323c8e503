use trellis_description::{
    condition::{ComparisonOp, Condition, ConditionTree, InstanceContext},
    evaluate_conditions, InstanceGeometry, Orientation, PropertySet, TypedValue,
};

fn props(values: &[(&str, TypedValue)]) -> PropertySet {
    values
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn is_true(name: &str) -> ConditionTree {
    Condition::property(name, ComparisonOp::Equal, TypedValue::Bool(true)).into()
}

fn is_not_true(name: &str) -> ConditionTree {
    Condition::property(name, ComparisonOp::NotEqual, TypedValue::Bool(true)).into()
}

#[test]
fn truth_table() {
    // a AND (b OR b != true) collapses to a.
    let tautology = ConditionTree::and(
        is_true("a"),
        ConditionTree::or(is_true("b"), is_not_true("b")),
    );
    let conjunction = ConditionTree::and(is_true("a"), is_true("b"));
    let disjunction = ConditionTree::or(is_true("a"), is_true("b"));

    for a in [false, true] {
        for b in [false, true] {
            let set = props(&[("a", a.into()), ("b", b.into())]);

            assert_eq!(evaluate_conditions(&tautology, &set), a, "a={a} b={b}");
            assert_eq!(evaluate_conditions(&conjunction, &set), a && b);
            assert_eq!(evaluate_conditions(&disjunction, &set), a || b);
        }
    }
}

#[test]
fn empty_is_always_true() {
    assert!(evaluate_conditions(&ConditionTree::Empty, &PropertySet::new()));
    assert!(evaluate_conditions(
        &ConditionTree::Empty,
        &props(&[("x", TypedValue::Int(3))])
    ));
}

#[test]
fn missing_property_is_false() {
    let eq = ConditionTree::from(Condition::property(
        "Missing",
        ComparisonOp::Equal,
        TypedValue::Int(1),
    ));
    let ne = ConditionTree::from(Condition::property(
        "Missing",
        ComparisonOp::NotEqual,
        TypedValue::Int(1),
    ));

    assert!(!evaluate_conditions(&eq, &PropertySet::new()));
    assert!(!evaluate_conditions(&ne, &PropertySet::new()));
}

#[test]
fn numeric_comparisons_cross_types() {
    let set = props(&[("R", TypedValue::Double(4.7e3))]);
    let check = |op, v: TypedValue| {
        evaluate_conditions(&Condition::property("R", op, v).into(), &set)
    };

    assert!(check(ComparisonOp::Greater, TypedValue::Int(1000)));
    assert!(check(ComparisonOp::LessOrEqual, TypedValue::Double(4700.0)));
    assert!(check(ComparisonOp::Equal, TypedValue::Int(4700)));
    assert!(!check(ComparisonOp::Less, TypedValue::Int(4700)));
    assert!(!check(ComparisonOp::Equal, TypedValue::String("4700".into())));
}

#[test]
fn enum_operands_ignore_case() {
    let set = props(&[("Type", TypedValue::Enum("NPN".into()))]);

    let enum_eq = Condition::property("Type", ComparisonOp::Equal, TypedValue::Enum("npn".into()));
    let str_eq =
        Condition::property("Type", ComparisonOp::Equal, TypedValue::String("npn".into()));

    assert!(evaluate_conditions(&enum_eq.into(), &set));
    assert!(!evaluate_conditions(&str_eq.into(), &set));
}

#[test]
fn state_conditions_use_instance_geometry() {
    let set = PropertySet::new();
    let horizontal: ConditionTree = Condition::state("horizontal", true).into();
    let flipped: ConditionTree = Condition::state("flipped", true).into();

    let mut geometry = InstanceGeometry::default();
    let ctx = InstanceContext::new(&set, &geometry);
    assert!(evaluate_conditions(&horizontal, &ctx));
    assert!(!evaluate_conditions(&flipped, &ctx));

    geometry.orientation = Orientation::Vertical;
    geometry.flipped = true;
    let ctx = InstanceContext::new(&set, &geometry);
    assert!(!evaluate_conditions(&horizontal, &ctx));
    assert!(evaluate_conditions(&flipped, &ctx));

    // Plain property sets have no state.
    assert!(!evaluate_conditions(&horizontal, &set));
}

#[test]
fn collections_convert_to_and_chains() {
    let a = Condition::property("a", ComparisonOp::Equal, TypedValue::Int(1));
    let b = Condition::state("horizontal", false);
    let tree = ConditionTree::from_collection(vec![a.clone(), b.clone()]);

    assert_eq!(tree.to_collection(), Some(vec![&a, &b]));
    assert_eq!(ConditionTree::from_collection(Vec::new()), ConditionTree::Empty);

    let or = ConditionTree::or(a.into(), b.into());
    assert_eq!(or.to_collection(), None);
    assert_eq!(or.conditions().len(), 2);
}
