//! Connection point declarations.

use std::{fmt, str::FromStr};

use crate::{
    condition::ConditionTree,
    geometry::{ComponentPoint, InstanceGeometry, Point},
};

/// Which ends of a connection segment are edge connections.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ConnectionEdge {
    #[default]
    None,
    Start,
    End,
    Both,
}

impl ConnectionEdge {
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Start => "start",
            Self::End => "end",
            Self::Both => "both",
        }
    }

    #[inline]
    fn at_start(self) -> bool {
        matches!(self, Self::Start | Self::Both)
    }

    #[inline]
    fn at_end(self) -> bool {
        matches!(self, Self::End | Self::Both)
    }
}

impl fmt::Display for ConnectionEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ConnectionEdge {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "" => Ok(Self::None),
            "start" => Ok(Self::Start),
            "end" => Ok(Self::End),
            "both" => Ok(Self::Both),
            _ => Err(()),
        }
    }
}

/// A named connection segment; every grid point on it can be wired.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ConnectionDescription {
    pub start: ComponentPoint,
    pub end: ComponentPoint,
    pub edge: ConnectionEdge,
    pub name: String,
}

/// A guarded set of connections.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConnectionGroup {
    pub conditions: ConditionTree,
    pub connections: Vec<ConnectionDescription>,
}

/// A connection point of a placed instance.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedConnection {
    pub name: String,
    pub location: Point,
    /// Whether this point is at an edge of its segment.
    pub is_edge: bool,
}

impl ConnectionDescription {
    /// Enumerates the grid points of this connection on a placed instance.
    ///
    /// Axis-aligned segments yield every `grid` step from start to end;
    /// other segments only yield their end points.
    pub fn resolve(&self, geometry: &InstanceGeometry, grid: f64) -> Vec<ResolvedConnection> {
        let start = self.start.resolve(geometry);
        let end = self.end.resolve(geometry);
        let point = |location, is_edge| ResolvedConnection {
            name: self.name.clone(),
            location,
            is_edge,
        };

        if start == end {
            return vec![point(start, self.edge != ConnectionEdge::None)];
        }

        let delta = end - start;
        let aligned = delta.x == 0.0 || delta.y == 0.0;
        if !aligned || grid <= 0.0 {
            return vec![
                point(start, self.edge.at_start()),
                point(end, self.edge.at_end()),
            ];
        }

        let length = delta.x.abs() + delta.y.abs();
        let steps = (length / grid).round().max(1.0) as usize;
        (0..=steps)
            .map(|i| {
                let t = i as f64 / steps as f64;
                let location = Point::new(start.x + delta.x * t, start.y + delta.y * t);
                let is_edge = (i == 0 && self.edge.at_start()) || (i == steps && self.edge.at_end());
                point(location, is_edge)
            })
            .collect()
    }
}
