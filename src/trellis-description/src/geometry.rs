//! Relative geometry and its resolution against placed instances.
//!
//! Descriptions are authored in a local frame where `x` runs along the
//! length of the component and `y` across it. An [`InstanceGeometry`]
//! maps that frame onto the canvas.

use std::ops::{Add, Neg, Sub};

/// A point or offset vector.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Reflects `self` through `centre`.
    #[inline]
    pub fn reflect(self, centre: Point) -> Self {
        Self {
            x: 2.0 * centre.x - self.x,
            y: 2.0 * centre.y - self.y,
        }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Point {
    type Output = Point;

    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y)
    }
}

/// Extents of a component or shape.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[inline]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// The direction the length of a component runs on the canvas.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

/// The placement of one component instance on the canvas.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InstanceGeometry {
    /// The canvas position of the local origin.
    pub location: Point,
    /// The size in the local frame; `width` is the component length.
    pub size: Size,
    pub orientation: Orientation,
    /// Whether the instance is mirrored along its length.
    pub flipped: bool,
}

impl InstanceGeometry {
    pub fn new(location: Point, size: Size, orientation: Orientation, flipped: bool) -> Self {
        Self {
            location,
            size,
            orientation,
            flipped,
        }
    }

    /// Whether the mapping to the canvas reverses handedness.
    ///
    /// Both flipping and vertical placement are reflections, so two of
    /// them cancel out.
    #[inline]
    pub fn is_mirrored(&self) -> bool {
        self.flipped ^ (self.orientation == Orientation::Vertical)
    }

    /// Maps a point in the local frame onto the canvas.
    pub fn to_world(&self, local: Point) -> Point {
        let mut p = local;
        if self.flipped {
            p.x = self.size.width - p.x;
        }
        if self.orientation == Orientation::Vertical {
            std::mem::swap(&mut p.x, &mut p.y);
        }

        self.location + p
    }

    /// Maps a local extent onto the canvas axes.
    pub fn to_world_size(&self, local: Size) -> Size {
        match self.orientation {
            Orientation::Horizontal => local,
            Orientation::Vertical => Size::new(local.height, local.width),
        }
    }
}

/// An anchor along one axis of the component.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ComponentPosition {
    #[default]
    Start,
    Middle,
    End,
}

impl ComponentPosition {
    /// The anchor's keyword in textual point definitions.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Start => "Start",
            Self::Middle => "Middle",
            Self::End => "End",
        }
    }

    #[inline]
    fn resolve(self, extent: f64) -> f64 {
        match self {
            Self::Start => 0.0,
            Self::Middle => extent / 2.0,
            Self::End => extent,
        }
    }
}

/// A point defined relative to the size of a component.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ComponentPoint {
    /// The anchor along the component length.
    pub relative_to_x: ComponentPosition,
    /// The anchor across the component.
    pub relative_to_y: ComponentPosition,
    /// A fixed offset from the anchor.
    pub offset: Point,
}

impl ComponentPoint {
    pub const fn new(
        relative_to_x: ComponentPosition,
        relative_to_y: ComponentPosition,
        offset: Point,
    ) -> Self {
        Self {
            relative_to_x,
            relative_to_y,
            offset,
        }
    }

    /// Resolves the point within the local frame of a component of
    /// the given size.
    pub fn resolve_local(&self, size: Size) -> Point {
        Point::new(
            self.relative_to_x.resolve(size.width) + self.offset.x,
            self.relative_to_y.resolve(size.height) + self.offset.y,
        )
    }

    /// Resolves the point onto the canvas.
    pub fn resolve(&self, geometry: &InstanceGeometry) -> Point {
        geometry.to_world(self.resolve_local(geometry.size))
    }
}
