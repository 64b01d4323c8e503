//! Consolidation of connections across a whole circuit document.
//!
//! Every placed component exposes named connection points which are
//! resolved from its description. Points of different components that
//! land on the same canvas location are joined, and every resulting set
//! of joined connections is given a sequential [`GroupId`] suitable for
//! persisting the circuit.
//!
//! Two coincident points are only joined when at least one of them is
//! an edge point. This keeps wires that merely cross each other apart.

#![deny(rust_2018_idioms, rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

use std::{collections::HashMap, fmt};

use indexmap::{IndexMap, IndexSet};
use petgraph::unionfind::UnionFind;
use thiserror::Error;
use trellis_description::{
    connection::{ConnectionDescription, ConnectionEdge},
    geometry::{ComponentPoint, ComponentPosition},
    DescriptionRegistry, InstanceGeometry, Point, PropertySet, GRID_SIZE,
};

/// The connection name shared by every point of a wire.
pub const WIRE_CONNECTION: &str = "#";

/// Canvas coordinates are compared at this many steps per unit.
const QUANTIZATION: f64 = 1000.0;

/// Errors that may occur during consolidation.
#[derive(Debug, Error)]
pub enum Error {
    /// A placed component references a description that is not loaded.
    #[error("component '{component}' uses unknown description '{description}'")]
    UnknownDescription {
        component: String,
        description: String,
    },
}

/// A component instance placed on the canvas.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedComponent {
    /// The unique id of the instance within its document.
    pub id: String,
    /// The id or name of the description the instance uses.
    pub description: String,
    pub properties: PropertySet,
    pub geometry: InstanceGeometry,
}

/// A straight wire between two canvas points.
#[derive(Clone, Debug, PartialEq)]
pub struct Wire {
    pub id: String,
    pub start: Point,
    pub end: Point,
}

impl Wire {
    /// Describes the wire as a connection along its whole length.
    fn connection(&self) -> (ConnectionDescription, InstanceGeometry) {
        let point = |offset| {
            ComponentPoint::new(ComponentPosition::Start, ComponentPosition::Start, offset)
        };
        let connection = ConnectionDescription {
            start: point(Point::ORIGIN),
            end: point(self.end - self.start),
            edge: ConnectionEdge::Both,
            name: WIRE_CONNECTION.to_owned(),
        };
        let geometry = InstanceGeometry {
            location: self.start,
            ..Default::default()
        };

        (connection, geometry)
    }
}

/// The components and wires of a circuit.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    pub components: Vec<PlacedComponent>,
    pub wires: Vec<Wire>,
}

/// A canonical identifier of a set of joined connections.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupId(pub u32);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The connection group of every named connection in a document.
///
/// Keys are component or wire ids, then connection names, both in
/// document order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConnectionMap {
    groups: IndexMap<String, IndexMap<String, GroupId>>,
    group_count: u32,
}

impl ConnectionMap {
    /// Gets the group of a named connection of a component or wire.
    pub fn group(&self, component: &str, connection: &str) -> Option<GroupId> {
        self.groups.get(component)?.get(connection).copied()
    }

    /// Gets all connection groups of a component or wire.
    pub fn component(&self, component: &str) -> Option<&IndexMap<String, GroupId>> {
        self.groups.get(component)
    }

    /// Lists the connections that belong to a group.
    pub fn members(&self, group: GroupId) -> Vec<(&str, &str)> {
        self.groups
            .iter()
            .flat_map(|(component, connections)| {
                connections
                    .iter()
                    .filter(move |(_, g)| **g == group)
                    .map(move |(name, _)| (component.as_str(), name.as_str()))
            })
            .collect()
    }

    /// The number of distinct groups.
    pub fn group_count(&self) -> u32 {
        self.group_count
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndexMap<String, GroupId>)> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v))
    }
}

struct Endpoint {
    node: usize,
    is_edge: bool,
}

/// Builds the graph of connections and joins coincident points.
///
/// Every named connection of a component or wire is one node.
#[derive(Default)]
struct Consolidator {
    nodes: IndexSet<(String, String)>,
    locations: HashMap<(i64, i64), Vec<Endpoint>>,
}

fn quantize(p: Point) -> (i64, i64) {
    (
        (p.x * QUANTIZATION).round() as i64,
        (p.y * QUANTIZATION).round() as i64,
    )
}

impl Consolidator {
    fn add(&mut self, owner: &str, name: &str, location: Point, is_edge: bool) {
        let (node, _) = self.nodes.insert_full((owner.to_owned(), name.to_owned()));
        self.locations
            .entry(quantize(location))
            .or_default()
            .push(Endpoint { node, is_edge });
    }

    fn finish(self) -> ConnectionMap {
        let mut sets = UnionFind::<usize>::new(self.nodes.len());

        for endpoints in self.locations.values() {
            if !endpoints.iter().any(|e| e.is_edge) {
                continue;
            }
            for pair in endpoints.windows(2) {
                sets.union(pair[0].node, pair[1].node);
            }
        }

        let mut ids = HashMap::new();
        let mut map = ConnectionMap::default();
        for (node, (owner, name)) in self.nodes.into_iter().enumerate() {
            let next = GroupId(ids.len() as u32);
            let group = *ids.entry(sets.find(node)).or_insert(next);

            map.groups.entry(owner).or_default().insert(name, group);
        }
        map.group_count = ids.len() as u32;

        map
    }
}

/// Joins the connections of all components and wires in `document`.
///
/// Descriptions are looked up in `registry` by id, then by name.
/// Connections with the same name on one component always share a
/// group.
pub fn consolidate_connections(
    document: &Document,
    registry: &DescriptionRegistry,
) -> Result<ConnectionMap, Error> {
    let mut consolidator = Consolidator::default();

    for component in &document.components {
        let description = registry
            .get(&component.description)
            .or_else(|| registry.by_name(&component.description))
            .ok_or_else(|| Error::UnknownDescription {
                component: component.id.clone(),
                description: component.description.clone(),
            })?;

        let points =
            description.resolve_connections(&component.properties, &component.geometry, GRID_SIZE);
        for point in points {
            consolidator.add(&component.id, &point.name, point.location, point.is_edge);
        }
    }

    for wire in &document.wires {
        let (connection, geometry) = wire.connection();
        for point in connection.resolve(&geometry, GRID_SIZE) {
            consolidator.add(&wire.id, WIRE_CONNECTION, point.location, point.is_edge);
        }
    }

    let map = consolidator.finish();
    log::debug!(
        "consolidated {} components and {} wires into {} connection groups",
        document.components.len(),
        document.wires.len(),
        map.group_count()
    );

    Ok(map)
}
