//! The drawing instruction set of render programs.

use std::{fmt, str::FromStr};

use crate::{
    condition::ConditionTree,
    geometry::{ComponentPoint, Point},
};

/// A guarded group of render commands.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderDescription {
    /// The guard deciding whether the group is drawn.
    pub conditions: ConditionTree,
    /// The commands, drawn in order.
    pub commands: Vec<RenderCommand>,
}

/// A single drawing instruction.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub enum RenderCommand {
    Line {
        start: ComponentPoint,
        end: ComponentPoint,
        thickness: f64,
    },
    Rect {
        location: ComponentPoint,
        width: f64,
        height: f64,
        thickness: f64,
        fill: bool,
    },
    Ellipse {
        centre: ComponentPoint,
        radius_x: f64,
        radius_y: f64,
        thickness: f64,
        fill: bool,
    },
    /// A vector path whose sub-command operands are relative to `start`.
    Path {
        start: ComponentPoint,
        thickness: f64,
        fill: bool,
        commands: Vec<PathCommand>,
    },
    Text {
        location: ComponentPoint,
        alignment: TextAlignment,
        runs: Vec<TextRun>,
    },
}

/// A path sub-command with absolute operands.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    CurveTo {
        control1: Point,
        control2: Point,
        end: Point,
    },
    /// A cubic curve whose first control point mirrors the previous one.
    SmoothCurveTo { control2: Point, end: Point },
    QuadraticCurveTo { control: Point, end: Point },
    /// A quadratic curve whose control point mirrors the previous one.
    SmoothQuadraticCurveTo(Point),
    EllipticalArcTo {
        radius_x: f64,
        radius_y: f64,
        rotation: f64,
        large_arc: bool,
        sweep: bool,
        end: Point,
    },
    ClosePath,
}

impl PathCommand {
    /// The end point a command moves the pen to, if it carries one.
    pub fn end(&self) -> Option<Point> {
        match *self {
            Self::MoveTo(p) | Self::LineTo(p) | Self::SmoothQuadraticCurveTo(p) => Some(p),
            Self::CurveTo { end, .. }
            | Self::SmoothCurveTo { end, .. }
            | Self::QuadraticCurveTo { end, .. }
            | Self::EllipticalArcTo { end, .. } => Some(end),
            Self::ClosePath => None,
        }
    }
}

/// Where a text block sits relative to its location.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextAlignment {
    TopLeft,
    TopCentre,
    TopRight,
    CentreLeft,
    #[default]
    Centre,
    CentreRight,
    BottomLeft,
    BottomCentre,
    BottomRight,
}

impl TextAlignment {
    pub const ALL: [TextAlignment; 9] = [
        Self::TopLeft,
        Self::TopCentre,
        Self::TopRight,
        Self::CentreLeft,
        Self::Centre,
        Self::CentreRight,
        Self::BottomLeft,
        Self::BottomCentre,
        Self::BottomRight,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::TopLeft => "TopLeft",
            Self::TopCentre => "TopCentre",
            Self::TopRight => "TopRight",
            Self::CentreLeft => "CentreLeft",
            Self::Centre => "Centre",
            Self::CentreRight => "CentreRight",
            Self::BottomLeft => "BottomLeft",
            Self::BottomCentre => "BottomCentre",
            Self::BottomRight => "BottomRight",
        }
    }
}

impl fmt::Display for TextAlignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TextAlignment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

/// Vertical placement of a text run relative to the line.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextBaseline {
    #[default]
    Normal,
    Subscript,
    Superscript,
}

/// Styling of a [`TextRun`].
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextFormatting {
    pub baseline: TextBaseline,
    /// Font size in canvas units.
    pub size: f64,
}

impl Default for TextFormatting {
    fn default() -> Self {
        Self {
            baseline: TextBaseline::Normal,
            size: TEXT_SIZE_MEDIUM,
        }
    }
}

/// Font size for `size="small"` text.
pub const TEXT_SIZE_SMALL: f64 = 8.0;
/// Font size for `size="medium"` text.
pub const TEXT_SIZE_MEDIUM: f64 = 10.0;
/// Font size for `size="large"` text.
pub const TEXT_SIZE_LARGE: f64 = 12.0;

/// A run of uniformly styled text.
///
/// The text may reference properties as `$Name`; those are substituted
/// with formatted property values when rendering.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub formatting: TextFormatting,
}

impl TextRun {
    pub fn new(text: impl Into<String>, formatting: TextFormatting) -> Self {
        Self {
            text: text.into(),
            formatting,
        }
    }
}
