use trellis_description::{
    condition::{ComparisonOp, Condition, ConditionTree, InstanceContext},
    geometry::{ComponentPoint, ComponentPosition},
    interpret::{PathOp, SCRIPT_SIZE_SCALE},
    property::{ComponentProperty, FormatRule},
    render::{
        PathCommand, RenderCommand, RenderDescription, TextAlignment, TextBaseline,
        TextFormatting, TextRun,
    },
    resolve_render, ComponentDescription, InstanceGeometry, Orientation, Point, PrimitiveDrawOp,
    PropertySet, Size, TypedValue,
};

fn point(x: ComponentPosition, y: ComponentPosition, dx: f64, dy: f64) -> ComponentPoint {
    ComponentPoint::new(x, y, Point::new(dx, dy))
}

fn start(dx: f64, dy: f64) -> ComponentPoint {
    point(ComponentPosition::Start, ComponentPosition::Start, dx, dy)
}

fn resistor() -> ComponentDescription {
    let mut desc = ComponentDescription::new("resistor", "Resistor");

    let mut resistance = ComponentProperty::new("Resistance", TypedValue::Double(4700.0));
    resistance.format_rules = vec![
        FormatRule {
            conditions: ConditionTree::Empty,
            value: "$Resistance Ohm".into(),
        },
        FormatRule {
            conditions: Condition::property(
                "Resistance",
                ComparisonOp::GreaterOrEqual,
                TypedValue::Double(1000.0),
            )
            .into(),
            value: "big $Resistance".into(),
        },
    ];
    desc.properties.push(resistance);

    desc.render.push(RenderDescription {
        conditions: ConditionTree::Empty,
        commands: vec![
            RenderCommand::Line {
                start: start(0.0, 0.0),
                end: point(ComponentPosition::End, ComponentPosition::Start, 0.0, 0.0),
                thickness: 2.0,
            },
            RenderCommand::Text {
                location: point(ComponentPosition::Middle, ComponentPosition::Start, 0.0, -10.0),
                alignment: TextAlignment::BottomCentre,
                runs: vec![
                    TextRun::new("R = $Resistance", TextFormatting::default()),
                    TextRun::new(
                        "1",
                        TextFormatting {
                            baseline: TextBaseline::Subscript,
                            size: 10.0,
                        },
                    ),
                ],
            },
        ],
    });

    desc.render.push(RenderDescription {
        conditions: Condition::state("horizontal", false).into(),
        commands: vec![RenderCommand::Rect {
            location: start(0.0, 0.0),
            width: 20.0,
            height: 10.0,
            thickness: 1.0,
            fill: false,
        }],
    });

    desc
}

fn geometry(orientation: Orientation, flipped: bool) -> InstanceGeometry {
    InstanceGeometry::new(Point::new(100.0, 50.0), Size::new(60.0, 0.0), orientation, flipped)
}

#[test]
fn format_rules_take_the_last_match() {
    let desc = resistor();
    let resistance = desc.property("Resistance").unwrap();

    let mut set = PropertySet::new();
    set.insert("Resistance".into(), TypedValue::Double(4700.0));
    assert_eq!(resistance.format(&set), "big 4700");

    set.insert("Resistance".into(), TypedValue::Double(470.0));
    assert_eq!(resistance.format(&set), "470 Ohm");

    // Absent values fall back to the default, but guards on them fail.
    assert_eq!(resistance.format(&PropertySet::new()), "4700 Ohm");
}

#[test]
fn horizontal_render() {
    let desc = resistor();
    let set = desc.default_properties();
    let geom = geometry(Orientation::Horizontal, false);
    let ops = resolve_render(&desc, &InstanceContext::new(&set, &geom), &geom);

    assert_eq!(ops.len(), 2);
    assert_eq!(
        ops[0],
        PrimitiveDrawOp::Line {
            start: Point::new(100.0, 50.0),
            end: Point::new(160.0, 50.0),
            thickness: 2.0,
        }
    );

    let PrimitiveDrawOp::Text {
        location,
        alignment,
        runs,
    } = &ops[1]
    else {
        panic!("expected text, got {:?}", ops[1]);
    };
    assert_eq!(*location, Point::new(130.0, 40.0));
    assert_eq!(*alignment, TextAlignment::BottomCentre);
    assert_eq!(runs[0].text, "R = big 4700");
    assert_eq!(runs[1].size, 10.0 * SCRIPT_SIZE_SCALE);
    assert!(runs[1].baseline_offset > 0.0);
}

#[test]
fn vertical_render_transposes() {
    let desc = resistor();
    let set = desc.default_properties();
    let geom = geometry(Orientation::Vertical, false);
    let ops = resolve_render(&desc, &InstanceContext::new(&set, &geom), &geom);

    // The rect group only applies to vertical instances.
    assert_eq!(ops.len(), 3);
    assert_eq!(
        ops[0],
        PrimitiveDrawOp::Line {
            start: Point::new(100.0, 50.0),
            end: Point::new(100.0, 110.0),
            thickness: 2.0,
        }
    );
    assert_eq!(
        ops[2],
        PrimitiveDrawOp::Rect {
            location: Point::new(100.0, 50.0),
            size: Size::new(10.0, 20.0),
            thickness: 1.0,
            fill: false,
        }
    );
}

#[test]
fn flipped_render_mirrors_along_length() {
    let desc = resistor();
    let set = desc.default_properties();
    let geom = geometry(Orientation::Horizontal, true);
    let ops = resolve_render(&desc, &set, &geom);

    assert_eq!(
        ops[0],
        PrimitiveDrawOp::Line {
            start: Point::new(160.0, 50.0),
            end: Point::new(100.0, 50.0),
            thickness: 2.0,
        }
    );
}

#[test]
fn paths_expand_smooth_curves() {
    let mut desc = ComponentDescription::new("wave", "Wave");
    desc.render.push(RenderDescription {
        conditions: ConditionTree::Empty,
        commands: vec![RenderCommand::Path {
            start: start(10.0, 0.0),
            thickness: 1.0,
            fill: false,
            commands: vec![
                PathCommand::MoveTo(Point::new(0.0, 0.0)),
                PathCommand::CurveTo {
                    control1: Point::new(0.0, -5.0),
                    control2: Point::new(5.0, -5.0),
                    end: Point::new(5.0, 0.0),
                },
                PathCommand::SmoothCurveTo {
                    control2: Point::new(10.0, 5.0),
                    end: Point::new(10.0, 0.0),
                },
                PathCommand::SmoothQuadraticCurveTo(Point::new(15.0, 0.0)),
                PathCommand::ClosePath,
            ],
        }],
    });

    let geom = InstanceGeometry::new(
        Point::ORIGIN,
        Size::new(40.0, 0.0),
        Orientation::Horizontal,
        false,
    );
    let ops = resolve_render(&desc, &PropertySet::new(), &geom);

    let PrimitiveDrawOp::Path { ops, .. } = &ops[0] else {
        panic!("expected a path");
    };
    assert_eq!(ops[0], PathOp::MoveTo(Point::new(10.0, 0.0)));
    assert_eq!(
        ops[2],
        PathOp::CurveTo {
            control1: Point::new(15.0, 5.0),
            control2: Point::new(20.0, 5.0),
            end: Point::new(20.0, 0.0),
        }
    );
    // A smooth quadratic after a cubic has no control point to mirror.
    assert_eq!(
        ops[3],
        PathOp::QuadraticCurveTo {
            control: Point::new(20.0, 0.0),
            end: Point::new(25.0, 0.0),
        }
    );
    assert_eq!(ops[4], PathOp::ClosePath);
}

#[test]
fn arcs_follow_reflections() {
    let mut desc = ComponentDescription::new("arc", "Arc");
    desc.render.push(RenderDescription {
        conditions: ConditionTree::Empty,
        commands: vec![RenderCommand::Path {
            start: start(0.0, 0.0),
            thickness: 1.0,
            fill: false,
            commands: vec![PathCommand::EllipticalArcTo {
                radius_x: 4.0,
                radius_y: 2.0,
                rotation: 30.0,
                large_arc: false,
                sweep: true,
                end: Point::new(8.0, 0.0),
            }],
        }],
    });

    let geom = geometry(Orientation::Vertical, false);
    let ops = resolve_render(&desc, &PropertySet::new(), &geom);
    let PrimitiveDrawOp::Path { ops, .. } = &ops[0] else {
        panic!("expected a path");
    };

    assert_eq!(ops[0], PathOp::MoveTo(Point::new(100.0, 50.0)));
    assert_eq!(
        ops[1],
        PathOp::ArcTo {
            radius_x: 2.0,
            radius_y: 4.0,
            rotation: -30.0,
            large_arc: false,
            sweep: false,
            end: Point::new(100.0, 58.0),
        }
    );
}

#[test]
fn paths_begin_at_their_start_point() {
    let mut desc = ComponentDescription::new("stub", "Stub");
    desc.render.push(RenderDescription {
        conditions: ConditionTree::Empty,
        commands: vec![RenderCommand::Path {
            start: point(ComponentPosition::Middle, ComponentPosition::Middle, 0.0, 0.0),
            thickness: 1.0,
            fill: false,
            commands: vec![PathCommand::LineTo(Point::new(10.0, 0.0))],
        }],
    });

    let geom = InstanceGeometry::new(
        Point::ORIGIN,
        Size::new(40.0, 20.0),
        Orientation::Horizontal,
        false,
    );
    let ops = resolve_render(&desc, &PropertySet::new(), &geom);
    let PrimitiveDrawOp::Path { ops, .. } = &ops[0] else {
        panic!("expected a path");
    };

    assert_eq!(
        ops,
        &[
            PathOp::MoveTo(Point::new(20.0, 10.0)),
            PathOp::LineTo(Point::new(30.0, 10.0)),
        ]
    );
}
