use trellis_description::{
    condition::{ComparisonOp, Condition, ConditionTree},
    geometry::{ComponentPoint, ComponentPosition},
    render::PathCommand,
    value::ValueError,
    Point, PropertyType, TypedValue,
};
use trellis_xml::{
    condition::{format_conditions, parse_conditions, ConditionError, Grammar},
    path::{format_path, parse_path, PathError},
    point::{format_point, parse_point, PointError},
};

fn types(name: &str) -> Option<PropertyType> {
    match name {
        "A" | "B" => Some(PropertyType::Int),
        "Type" => Some(PropertyType::Enum),
        "Label" => Some(PropertyType::String),
        _ => None,
    }
}

fn expr(text: &str) -> Result<ConditionTree, ConditionError> {
    parse_conditions(text, Grammar::Expression, types)
}

fn int(name: &str, op: ComparisonOp, value: i64) -> ConditionTree {
    Condition::property(name, op, TypedValue::Int(value)).into()
}

#[test]
fn and_binds_tighter_than_or() -> Result<(), ConditionError> {
    let expected = ConditionTree::or(
        int("A", ComparisonOp::Equal, 1),
        ConditionTree::and(
            int("B", ComparisonOp::Less, 2),
            Condition::state("horizontal", true).into(),
        ),
    );

    assert_eq!(expr("$A == 1 || $B < 2 && horizontal")?, expected);
    assert_eq!(expr("$A=1 OR ($B<2 and horizontal)")?, expected);

    Ok(())
}

#[test]
fn parentheses_group() -> Result<(), ConditionError> {
    let tree = expr("($A >= 1 || !flipped) && $Type == pnp")?;
    assert_eq!(
        tree,
        ConditionTree::and(
            ConditionTree::or(
                int("A", ComparisonOp::GreaterOrEqual, 1),
                Condition::state("flipped", false).into(),
            ),
            Condition::property("Type", ComparisonOp::Equal, TypedValue::Enum("pnp".into()))
                .into(),
        )
    );

    Ok(())
}

#[test]
fn quoted_operands() -> Result<(), ConditionError> {
    let tree = expr(r#"$Label != "two \"quoted\" words""#)?;
    assert_eq!(
        tree,
        Condition::property(
            "Label",
            ComparisonOp::NotEqual,
            TypedValue::String(r#"two "quoted" words"#.into())
        )
        .into()
    );

    Ok(())
}

#[test]
fn legacy_terms_are_and_ed() -> Result<(), ConditionError> {
    let tree = parse_conditions("$Type=PNP, !horizontal,$A!=3", Grammar::Legacy, types)?;
    assert_eq!(
        tree,
        ConditionTree::from_collection(vec![
            Condition::property("Type", ComparisonOp::Equal, TypedValue::Enum("PNP".into())),
            Condition::state("horizontal", false),
            Condition::property("A", ComparisonOp::NotEqual, TypedValue::Int(3)),
        ])
    );

    Ok(())
}

#[test]
fn blank_conditions_are_always_true() -> Result<(), ConditionError> {
    assert_eq!(expr("  ")?, ConditionTree::Empty);
    assert_eq!(format_conditions(&ConditionTree::Empty), None);
    Ok(())
}

#[test]
fn condition_errors() {
    assert_eq!(
        expr("$Missing == 1"),
        Err(ConditionError::UndefinedProperty("Missing".into()))
    );
    assert_eq!(
        expr("upside_down"),
        Err(ConditionError::UnknownState("upside_down".into()))
    );
    assert_eq!(
        expr("$A == 1 &&"),
        Err(ConditionError::UnexpectedEnd)
    );
    assert_eq!(
        expr("($A == 1"),
        Err(ConditionError::UnexpectedEnd)
    );
    assert_eq!(
        expr("$A 1"),
        Err(ConditionError::MissingOperator("A".into()))
    );
    assert!(matches!(
        expr("$A == many"),
        Err(ConditionError::Value(ValueError::Invalid {
            ty: PropertyType::Int,
            ..
        }))
    ));
}

#[test]
fn formatted_conditions_keep_their_shape() -> Result<(), ConditionError> {
    let a = || int("A", ComparisonOp::Equal, 1);
    let b = || int("B", ComparisonOp::GreaterOrEqual, 2);
    let state = || ConditionTree::from(Condition::state("horizontal", false));

    let trees = [
        ConditionTree::and(a(), ConditionTree::and(b(), state())),
        ConditionTree::and(ConditionTree::or(a(), b()), state()),
        ConditionTree::or(a(), ConditionTree::and(b(), state())),
        ConditionTree::or(ConditionTree::or(a(), b()), state()),
    ];

    for tree in trees {
        let text = format_conditions(&tree).unwrap();
        assert_eq!(expr(&text)?, tree, "{text}");
    }

    let text = format_conditions(&ConditionTree::and(ConditionTree::or(a(), b()), state()));
    assert_eq!(text.as_deref(), Some("($A == 1 || $B >= 2) && !horizontal"));

    Ok(())
}

#[test]
fn operators_need_no_spacing() -> Result<(), ConditionError> {
    let spaced = expr("$A != 1 && !horizontal || $Type == npn")?;
    assert_eq!(expr("$A!=1&&!horizontal||$Type==npn")?, spaced);
    assert_eq!(expr("$A != 1 AnD !horizontal oR $Type = npn")?, spaced);
    Ok(())
}

#[test]
fn awkward_operands_are_quoted() -> Result<(), ConditionError> {
    for value in ["or", "AND", "two words", "a(b)", "x<y", "$A", "", r#"back\slash"#] {
        let tree: ConditionTree = Condition::property(
            "Label",
            ComparisonOp::Equal,
            TypedValue::String(value.into()),
        )
        .into();

        let text = format_conditions(&tree).unwrap();
        assert_eq!(expr(&text)?, tree, "{text}");
    }

    Ok(())
}

#[test]
fn unterminated_quotes() {
    assert_eq!(
        expr(r#"$Label == "open"#),
        Err(ConditionError::UnterminatedString)
    );
}

#[test]
fn absolute_path_commands() -> Result<(), PathError> {
    assert_eq!(
        parse_path("M0,0 L10,0 L10,10 Z")?,
        vec![
            PathCommand::MoveTo(Point::new(0.0, 0.0)),
            PathCommand::LineTo(Point::new(10.0, 0.0)),
            PathCommand::LineTo(Point::new(10.0, 10.0)),
            PathCommand::ClosePath,
        ]
    );

    assert_eq!(
        parse_path("M0,0 H10")?,
        vec![
            PathCommand::MoveTo(Point::ORIGIN),
            PathCommand::LineTo(Point::new(10.0, 0.0)),
        ]
    );

    Ok(())
}

#[test]
fn relative_path_commands() -> Result<(), PathError> {
    assert_eq!(
        parse_path("M5,5 l 5,0")?,
        vec![
            PathCommand::MoveTo(Point::new(5.0, 5.0)),
            PathCommand::LineTo(Point::new(10.0, 5.0)),
        ]
    );

    // Closing a subpath returns to its start.
    assert_eq!(
        parse_path("m1,1 h2 v3 z m1,1")?,
        vec![
            PathCommand::MoveTo(Point::new(1.0, 1.0)),
            PathCommand::LineTo(Point::new(3.0, 1.0)),
            PathCommand::LineTo(Point::new(3.0, 4.0)),
            PathCommand::ClosePath,
            PathCommand::MoveTo(Point::new(2.0, 2.0)),
        ]
    );

    assert_eq!(
        parse_path("M0,0 c1,1 2,2 3,3 s1,1 2,2")?,
        vec![
            PathCommand::MoveTo(Point::ORIGIN),
            PathCommand::CurveTo {
                control1: Point::new(1.0, 1.0),
                control2: Point::new(2.0, 2.0),
                end: Point::new(3.0, 3.0),
            },
            PathCommand::SmoothCurveTo {
                control2: Point::new(4.0, 4.0),
                end: Point::new(5.0, 5.0),
            },
        ]
    );

    Ok(())
}

#[test]
fn repeated_operands() -> Result<(), PathError> {
    assert_eq!(
        parse_path("M0,0 10,0 10-10")?,
        vec![
            PathCommand::MoveTo(Point::ORIGIN),
            PathCommand::LineTo(Point::new(10.0, 0.0)),
            PathCommand::LineTo(Point::new(10.0, -10.0)),
        ]
    );

    assert_eq!(
        parse_path("M0,0 A5,5 0 1 0 10,0")?,
        vec![
            PathCommand::MoveTo(Point::ORIGIN),
            PathCommand::EllipticalArcTo {
                radius_x: 5.0,
                radius_y: 5.0,
                rotation: 0.0,
                large_arc: true,
                sweep: false,
                end: Point::new(10.0, 0.0),
            },
        ]
    );

    Ok(())
}

#[test]
fn path_number_forms() -> Result<(), PathError> {
    assert_eq!(
        parse_path(" M 1e1 , 2.5E-1\tL-.5-.5 ")?,
        vec![
            PathCommand::MoveTo(Point::new(10.0, 0.25)),
            PathCommand::LineTo(Point::new(-0.5, -0.5)),
        ]
    );

    Ok(())
}

#[test]
fn malformed_paths() {
    assert_eq!(parse_path("10,10"), Err(PathError::MissingCommand));
    assert_eq!(parse_path("M1e,4"), Err(PathError::MalformedNumber("1e".into())));
    assert_eq!(parse_path("M1,x"), Err(PathError::MissingOperands('M')));
    assert_eq!(parse_path("M0,0 X1,2"), Err(PathError::UnknownCommand('X')));
    assert_eq!(
        parse_path("M0,0 A5,5 0 2 0 10,0"),
        Err(PathError::InvalidFlag)
    );
}

#[test]
fn formatted_paths_parse_back() -> Result<(), PathError> {
    let commands = parse_path("M0,-10 l0,20 M0,-5 q5,5 10,0 t10,0 Z")?;
    let text = format_path(&commands);

    assert_eq!(text, "M0,-10 L0,10 M0,-5 Q5,0 10,-5 T20,-5 Z");
    assert_eq!(parse_path(&text)?, commands);

    Ok(())
}

#[test]
fn points() -> Result<(), PointError> {
    assert_eq!(parse_point("_Start")?, ComponentPoint::default());
    assert_eq!(
        parse_point("_Middlex_Endy-5y")?,
        ComponentPoint::new(
            ComponentPosition::Middle,
            ComponentPosition::End,
            Point::new(0.0, -5.0)
        )
    );
    assert_eq!(
        parse_point("_End +10x -2.5y +5x")?,
        ComponentPoint::new(
            ComponentPosition::End,
            ComponentPosition::End,
            Point::new(15.0, -2.5)
        )
    );

    assert_eq!(
        parse_point("_Top"),
        Err(PointError::UnknownAnchor("Top".into()))
    );
    assert_eq!(parse_point("_Start+5"), Err(PointError::MissingAxis("+5".into())));
    assert_eq!(parse_point("Start"), Err(PointError::Unexpected("Start".into())));

    Ok(())
}

#[test]
fn point_terms_ignore_case() -> Result<(), PointError> {
    assert_eq!(
        parse_point("_endY _MIDDLEx +.5X")?,
        ComponentPoint::new(
            ComponentPosition::Middle,
            ComponentPosition::End,
            Point::new(0.5, 0.0)
        )
    );
    assert_eq!(
        parse_point("_Start +1.2.3x"),
        Err(PointError::MalformedOffset("+1.2.3".into()))
    );

    Ok(())
}

#[test]
fn formatted_points() {
    let point = ComponentPoint::new(
        ComponentPosition::Middle,
        ComponentPosition::End,
        Point::new(0.0, -5.0),
    );
    assert_eq!(format_point(&point), "_Middlex_Endy-5y");

    let point = ComponentPoint::new(
        ComponentPosition::End,
        ComponentPosition::End,
        Point::new(10.0, 0.0),
    );
    assert_eq!(format_point(&point), "_End+10x");
}
