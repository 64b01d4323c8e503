use std::sync::Arc;

use trellis_connect::*;
use trellis_description::{
    connection::{ConnectionDescription, ConnectionEdge, ConnectionGroup},
    geometry::{ComponentPoint, ComponentPosition},
    ComponentDescription, DescriptionRegistry, InstanceGeometry, Point, PropertySet, Size,
};

fn point(x: ComponentPosition, offset: Point) -> ComponentPoint {
    ComponentPoint::new(x, ComponentPosition::Middle, offset)
}

/// A two-terminal component with edge connections at both ends.
fn resistor() -> ComponentDescription {
    let terminal = |name: &str, at: ComponentPosition| ConnectionDescription {
        start: point(at, Point::ORIGIN),
        end: point(at, Point::ORIGIN),
        edge: ConnectionEdge::Both,
        name: name.into(),
    };

    let mut desc = ComponentDescription::new("resistor", "Resistor");
    desc.connections.push(ConnectionGroup {
        conditions: Default::default(),
        connections: vec![
            terminal("a", ComponentPosition::Start),
            terminal("b", ComponentPosition::End),
        ],
    });
    desc
}

fn registry() -> DescriptionRegistry {
    [Arc::new(resistor())].into_iter().collect()
}

fn placed(id: &str, x: f64, y: f64) -> PlacedComponent {
    PlacedComponent {
        id: id.into(),
        description: "resistor".into(),
        properties: PropertySet::new(),
        geometry: InstanceGeometry {
            location: Point::new(x, y),
            size: Size::new(40.0, 20.0),
            ..Default::default()
        },
    }
}

fn wire(id: &str, start: (f64, f64), end: (f64, f64)) -> Wire {
    Wire {
        id: id.into(),
        start: Point::new(start.0, start.1),
        end: Point::new(end.0, end.1),
    }
}

#[test]
fn coincident_points_share_a_group() -> Result<(), Error> {
    // r2 starts exactly where r1 ends.
    let document = Document {
        components: vec![placed("r1", 0.0, 0.0), placed("r2", 40.0, 0.0)],
        wires: vec![],
    };

    let map = consolidate_connections(&document, &registry())?;

    assert_eq!(map.group("r1", "b"), map.group("r2", "a"));
    assert_ne!(map.group("r1", "a"), map.group("r1", "b"));
    assert_ne!(map.group("r2", "b"), map.group("r2", "a"));
    assert_eq!(map.group_count(), 3);

    let shared = map.group("r1", "b").unwrap();
    assert_eq!(map.members(shared), vec![("r1", "b"), ("r2", "a")]);

    Ok(())
}

#[test]
fn group_ids_are_sequential_in_document_order() -> Result<(), Error> {
    let document = Document {
        components: vec![placed("r1", 0.0, 0.0)],
        wires: vec![],
    };

    let map = consolidate_connections(&document, &registry())?;
    assert_eq!(map.group("r1", "a"), Some(GroupId(0)));
    assert_eq!(map.group("r1", "b"), Some(GroupId(1)));
    assert_eq!(map.group("r1", "c"), None);

    Ok(())
}

#[test]
fn wires_join_distant_components() -> Result<(), Error> {
    // r1.b at (40, 10), r2.a at (100, 10).
    let document = Document {
        components: vec![placed("r1", 0.0, 0.0), placed("r2", 100.0, 0.0)],
        wires: vec![wire("w1", (40.0, 10.0), (100.0, 10.0))],
    };

    let map = consolidate_connections(&document, &registry())?;
    let group = map.group("w1", WIRE_CONNECTION).unwrap();

    assert_eq!(map.group("r1", "b"), Some(group));
    assert_eq!(map.group("r2", "a"), Some(group));
    assert_eq!(map.group_count(), 3);

    Ok(())
}

#[test]
fn wire_ends_join_along_other_wires() -> Result<(), Error> {
    let document = Document {
        components: vec![],
        wires: vec![
            wire("w1", (0.0, 0.0), (100.0, 0.0)),
            // Ends on the middle of w1.
            wire("w2", (50.0, 0.0), (50.0, 50.0)),
            // Crosses w1 without ending on it.
            wire("w3", (70.0, -20.0), (70.0, 20.0)),
        ],
    };

    let map = consolidate_connections(&document, &registry())?;

    assert_eq!(
        map.group("w1", WIRE_CONNECTION),
        map.group("w2", WIRE_CONNECTION)
    );
    assert_ne!(
        map.group("w1", WIRE_CONNECTION),
        map.group("w3", WIRE_CONNECTION)
    );
    assert_eq!(map.group_count(), 2);

    Ok(())
}

#[test]
fn nearly_coincident_points_are_joined() -> Result<(), Error> {
    let document = Document {
        components: vec![placed("r1", 0.0, 0.0), placed("r2", 40.0000001, 0.0)],
        wires: vec![],
    };

    let map = consolidate_connections(&document, &registry())?;
    assert_eq!(map.group("r1", "b"), map.group("r2", "a"));

    Ok(())
}

#[test]
fn unknown_descriptions_fail() {
    let mut component = placed("q1", 0.0, 0.0);
    component.description = "transistor".into();

    let document = Document {
        components: vec![component],
        wires: vec![],
    };

    assert!(matches!(
        consolidate_connections(&document, &registry()),
        Err(Error::UnknownDescription { component, .. }) if component == "q1"
    ));
}
