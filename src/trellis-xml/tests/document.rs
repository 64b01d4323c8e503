use std::fs;

use trellis_description::{
    condition::{ComparisonOp, Condition, ConditionTree, InstanceContext},
    geometry::{ComponentPoint, ComponentPosition},
    render::{PathCommand, RenderCommand, TextAlignment, TextBaseline},
    FlagOptions, InstanceGeometry, Orientation, Point, Size, TypedValue, Version,
};
use trellis_xml::{condition::ConditionError, load_xml, write_xml, Error, Warning, XmlDocument};

fn transistor() -> XmlDocument {
    let data = fs::read("tests/data/transistor.xml").unwrap();
    load_xml(&data).unwrap()
}

fn document(declaration: &str) -> String {
    format!(
        r#"<component version="1.2"><declaration><meta name="name" value="Test"/>{declaration}</declaration></component>"#
    )
}

#[test]
fn declaration() {
    let doc = transistor();
    let desc = &doc.description;

    assert_eq!(doc.version, Version::new(1, 2, 0));
    assert!(doc.warnings.is_empty());

    assert_eq!(desc.id, "transistor");
    assert_eq!(desc.name, "Transistor");
    assert!(!desc.can_resize);
    assert!(desc.can_flip);
    assert_eq!(desc.min_size, 60.0);
    assert_eq!(desc.metadata.version, Version::new(1, 3, 0));
    assert_eq!(desc.metadata.author.as_deref(), Some("Trellis Project"));

    let implements = desc.metadata.implements.as_ref().unwrap();
    assert_eq!(implements.set, "urn:trellis:common");
    assert_eq!(implements.item, "transistor");

    // Both icons carry the same image and share one resource.
    let resources = doc.resources();
    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0].mime_type, "image/png");
    assert_eq!(resources[0].data, b"\x89PNG\r\n\x1a\n");

    let ty = desc.property("Type").unwrap();
    assert_eq!(ty.default, TypedValue::Enum("NPN".into()));
    assert_eq!(ty.enum_options, ["NPN", "PNP"]);

    let gain = desc.property("Gain").unwrap();
    assert_eq!(gain.display_name, "Current Gain");
    assert_eq!(gain.default, TypedValue::Double(100.0));

    let config = desc.configuration("PNP").unwrap();
    assert_eq!(config.implementation_name.as_deref(), Some("pnp"));
    assert_eq!(config.setters["Gain"], TypedValue::Double(250.0));
}

#[test]
fn rules_evaluate() {
    let desc = transistor().description;
    let mut properties = desc.default_properties();

    assert_eq!(desc.format_property("Gain", &properties).unwrap(), "100");
    assert!(desc.property("Gain").unwrap().is_visible(&properties));

    let horizontal = InstanceGeometry::default();
    let vertical = InstanceGeometry {
        orientation: Orientation::Vertical,
        ..Default::default()
    };

    let ctx = InstanceContext::new(&properties, &horizontal);
    assert_eq!(desc.flags(&ctx), FlagOptions::FLIP_PRIMARY);
    let ctx = InstanceContext::new(&properties, &vertical);
    assert_eq!(
        desc.flags(&ctx),
        FlagOptions::MISC_DRAW | FlagOptions::NO_RESIZE
    );

    assert!(desc.apply_configuration("PNP", &mut properties));
    properties.insert("Gain".into(), TypedValue::Double(1500.0));

    assert_eq!(
        desc.format_property("Gain", &properties).unwrap(),
        "high (1500)"
    );
    assert!(!desc.property("Gain").unwrap().is_visible(&properties));

    let ctx = InstanceContext::new(&properties, &horizontal);
    assert_eq!(
        desc.flags(&ctx),
        FlagOptions::FLIP_PRIMARY | FlagOptions::MISC_DRAW | FlagOptions::NO_RESIZE
    );
}

#[test]
fn geometry_and_render() {
    let desc = transistor().description;

    let collector = &desc.connections[0].connections[1];
    assert_eq!(collector.name, "c");
    assert_eq!(
        collector.start,
        ComponentPoint::new(
            ComponentPosition::Middle,
            ComponentPosition::Start,
            Point::new(0.0, -30.0)
        )
    );

    let geometry = InstanceGeometry {
        size: Size::new(60.0, 0.0),
        ..Default::default()
    };
    let points = desc.resolve_connections(&desc.default_properties(), &geometry, 10.0);
    assert_eq!(points.len(), 6);
    assert_eq!(points[3].location, Point::new(30.0, -30.0));
    assert!(points[3].is_edge);

    let commands = &desc.render[0].commands;
    assert_eq!(commands.len(), 4);
    assert!(matches!(
        commands[0],
        RenderCommand::Line { thickness, .. } if thickness == 2.0
    ));
    match &commands[2] {
        RenderCommand::Path { fill, commands, .. } => {
            assert!(*fill);
            assert_eq!(commands[1], PathCommand::LineTo(Point::new(0.0, 10.0)));
            assert_eq!(commands.len(), 5);
        }
        other => panic!("expected a path, got {other:?}"),
    }

    let pnp = &desc.render[1];
    assert_eq!(
        pnp.conditions,
        ConditionTree::from(Condition::property(
            "Type",
            ComparisonOp::Equal,
            TypedValue::Enum("PNP".into())
        ))
    );
    match &pnp.commands[0] {
        RenderCommand::Text {
            alignment, runs, ..
        } => {
            assert_eq!(*alignment, TextAlignment::CentreLeft);
            assert_eq!(runs.len(), 2);
            assert_eq!(runs[0].text, "h");
            assert_eq!(runs[1].text, "FE");
            assert_eq!(runs[1].formatting.baseline, TextBaseline::Subscript);
            assert_eq!(runs[1].formatting.size, 8.0);
        }
        other => panic!("expected text, got {other:?}"),
    }
}

#[test]
fn written_documents_load_back() -> Result<(), Error> {
    let doc = transistor();
    let text = write_xml(&doc.description)?;

    assert!(text.contains(r#"<component version="1.2" xmlns="urn:trellis:component">"#));

    let reloaded = load_xml(text.as_bytes())?;
    assert_eq!(reloaded.description, doc.description);
    assert_eq!(write_xml(&reloaded.description)?, text);

    Ok(())
}

#[test]
fn unnamed_flag_bits_survive() -> Result<(), Error> {
    let text = document("<flags>MiscDraw, 0x80000000</flags>");
    let doc = load_xml(text.as_bytes())?;

    let expected = FlagOptions::MISC_DRAW | FlagOptions::from_bits_retain(0x8000_0000);
    assert_eq!(doc.description.flags[0].value, expected);

    let written = write_xml(&doc.description)?;
    assert!(written.contains("MiscDraw,0x80000000"), "{written}");
    assert_eq!(load_xml(written.as_bytes())?.description, doc.description);

    Ok(())
}

#[test]
fn binary_round_trip_preserves_the_model() {
    let doc = transistor();

    let bytes = trellis_binary::write_binary(
        std::slice::from_ref(&doc.description),
        &doc.resources(),
        &Default::default(),
    )
    .unwrap();
    let loaded = trellis_binary::load_binary(&bytes, None).unwrap();

    assert!(loaded.warnings.is_empty());
    assert_eq!(loaded.descriptions, vec![doc.description.clone()]);
    assert_eq!(
        write_xml(&loaded.descriptions[0]).unwrap(),
        write_xml(&doc.description).unwrap()
    );
}

#[test]
fn legacy_conditions() -> Result<(), Error> {
    let text = r#"<component version="1.1">
        <declaration>
            <meta name="name" value="Switch"/>
            <property name="Closed" type="bool" default="false"/>
            <flags conditions="$Closed=true,!horizontal">MiscDraw</flags>
        </declaration>
    </component>"#;

    let doc = load_xml(text.as_bytes())?;
    assert_eq!(doc.description.id, "Switch");
    assert_eq!(
        doc.description.flags[0].conditions,
        ConditionTree::and(
            Condition::property("Closed", ComparisonOp::Equal, TypedValue::Bool(true)).into(),
            Condition::state("horizontal", false).into(),
        )
    );

    Ok(())
}

#[test]
fn conditions_may_reference_later_properties() -> Result<(), Error> {
    let text = document(
        r#"<property name="A" type="string">
             <formatting><format conditions="$B &lt; 3" value="small"/></formatting>
           </property>
           <property name="B" type="int" default="1"/>"#,
    );

    let doc = load_xml(text.as_bytes())?;
    let desc = &doc.description;
    assert_eq!(
        desc.format_property("A", &desc.default_properties()).unwrap(),
        "small"
    );

    Ok(())
}

#[test]
fn defaults() -> Result<(), Error> {
    let doc = load_xml(document("").as_bytes())?;
    let desc = &doc.description;

    assert!(desc.can_resize);
    assert!(!desc.can_flip);
    assert_eq!(desc.min_size, 10.0);
    assert!(desc.render.is_empty());

    Ok(())
}

#[test]
fn newer_documents_load_with_a_warning() -> Result<(), Error> {
    let text = document("").replace(r#"version="1.2""#, r#"version="1.5""#);
    let doc = load_xml(text.as_bytes())?;

    assert_eq!(doc.warnings, vec![Warning::NewerVersion(Version::new(1, 5, 0))]);
    Ok(())
}

#[test]
fn colliding_icons_get_distinct_ids() {
    // Both payloads have the CRC32 0x4ddb0c25.
    let doc = document(
        r#"<meta name="icon" value="cGx1bWxlc3M="/>
           <configurations>
             <configuration name="a" icon="YnVja2Vyb28="/>
             <configuration name="b" icon="cGx1bWxlc3M="/>
           </configurations>"#,
    );
    let doc = load_xml(doc.as_bytes()).unwrap();

    let mut resources: Vec<_> = doc
        .resources()
        .iter()
        .map(|r| (r.id, r.data.clone()))
        .collect();
    resources.sort();
    assert_eq!(
        resources,
        [
            (0x4ddb0c25, b"plumless".to_vec()),
            (0x4ddb0c26, b"buckeroo".to_vec()),
        ]
    );

    let desc = &doc.description;
    let id = |name: &str| {
        let config = desc.configuration(name).unwrap();
        config.icon.as_ref().and_then(|i| i.resource()).map(|r| r.id)
    };
    assert_eq!(id("a"), Some(0x4ddb0c26));
    assert_eq!(id("b"), Some(0x4ddb0c25));
}

#[test]
fn invalid_documents() {
    let missing_name = r#"<component version="1.2"><declaration/></component>"#;
    assert!(matches!(
        load_xml(missing_name.as_bytes()),
        Err(Error::MissingName)
    ));

    let undefined = document(r#"<flags conditions="$Nope == 1">MiscDraw</flags>"#);
    match load_xml(undefined.as_bytes()) {
        Err(Error::Condition {
            source: ConditionError::UndefinedProperty(name),
            ..
        }) => assert_eq!(name, "Nope"),
        other => panic!("unexpected result {other:?}"),
    }

    let setter = document(
        r#"<configurations><configuration name="x"><setter name="Nope" value="1"/></configuration></configurations>"#,
    );
    assert!(matches!(
        load_xml(setter.as_bytes()),
        Err(Error::UndefinedProperty(_))
    ));

    let text = r#"<component version="1.2">
        <declaration><meta name="name" value="P"/></declaration>
        <render><text location="_Middle" value="$Nope"/></render>
    </component>"#;
    assert!(matches!(
        load_xml(text.as_bytes()),
        Err(Error::UndefinedProperty(name)) if name == "Nope"
    ));

    let format = document(
        r#"<property name="R" type="int"><formatting><format value="$R of $Total"/></formatting></property>"#,
    );
    assert!(matches!(
        load_xml(format.as_bytes()),
        Err(Error::UndefinedProperty(name)) if name == "Total"
    ));

    let escaped = r#"<component version="1.2">
        <declaration><meta name="name" value="P"/></declaration>
        <render><text location="_Middle" value="$$5"/></render>
    </component>"#;
    assert!(load_xml(escaped.as_bytes()).is_ok());

    let flag = document("<flags>Sideways</flags>");
    assert!(matches!(load_xml(flag.as_bytes()), Err(Error::UnknownFlag(_))));
    let flag = document("<flags>0xZZ</flags>");
    assert!(matches!(load_xml(flag.as_bytes()), Err(Error::UnknownFlag(_))));

    let root = "<symbol/>";
    assert!(matches!(
        load_xml(root.as_bytes()),
        Err(Error::UnexpectedRoot(name)) if name == "symbol"
    ));

    let path = r#"<component version="1.2">
        <declaration><meta name="name" value="P"/></declaration>
        <render><path start="_Start" data="M0,0 L1"/></render>
    </component>"#;
    assert!(matches!(load_xml(path.as_bytes()), Err(Error::Path { .. })));

    let point = r#"<component version="1.2">
        <declaration><meta name="name" value="P"/></declaration>
        <render><line start="_Start" end="_Nowhere"/></render>
    </component>"#;
    assert!(matches!(load_xml(point.as_bytes()), Err(Error::Point { .. })));

    let unclosed = r#"<component version="1.2"><declaration>"#;
    assert!(load_xml(unclosed.as_bytes()).is_err());
}
