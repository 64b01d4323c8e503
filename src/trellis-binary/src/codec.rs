//! Encoding of the building blocks shared by all component sections.

use std::io;

use trellis_description::{
    condition::{BoolOp, ComparisonOp, Condition, ConditionKind, ConditionTree},
    geometry::{ComponentPoint, ComponentPosition, Point},
    render::{
        PathCommand, RenderCommand, TextAlignment, TextBaseline, TextFormatting, TextRun,
    },
    PropertyType, TypedValue,
};
use trellis_utils::binary;

/// Condition trees deeper than this are rejected when parsing.
const MAX_CONDITION_DEPTH: usize = 64;

#[inline]
fn invalid(msg: &'static str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}

/// The version-dependent encoding rules of a container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Encoding {
    pub version: u8,
}

impl Encoding {
    /// Whether conditions are encoded as trees rather than flat
    /// collections.
    #[inline]
    pub fn condition_trees(self) -> bool {
        self.version >= 2
    }
}

pub fn parse_type<R: io::Read>(reader: &mut R) -> io::Result<PropertyType> {
    Ok(match binary::uint8(reader)? {
        0 => PropertyType::String,
        1 => PropertyType::Int,
        2 => PropertyType::Double,
        3 => PropertyType::Bool,
        4 => PropertyType::Enum,
        _ => return Err(invalid("Received invalid property type")),
    })
}

pub fn write_type<W: io::Write>(writer: &mut W, ty: PropertyType) -> io::Result<()> {
    let tag = match ty {
        PropertyType::String => 0,
        PropertyType::Int => 1,
        PropertyType::Double => 2,
        PropertyType::Bool => 3,
        PropertyType::Enum => 4,
    };
    binary::write_uint8(writer, tag)
}

pub fn parse_value<R: io::Read>(reader: &mut R) -> io::Result<TypedValue> {
    Ok(match parse_type(reader)? {
        PropertyType::String => TypedValue::String(binary::str(reader)?),
        PropertyType::Int => TypedValue::Int(binary::int64(reader)?),
        PropertyType::Double => TypedValue::Double(binary::float64(reader)?),
        PropertyType::Bool => TypedValue::Bool(binary::boolean(reader)?),
        PropertyType::Enum => TypedValue::Enum(binary::str(reader)?),
    })
}

pub fn write_value<W: io::Write>(writer: &mut W, value: &TypedValue) -> io::Result<()> {
    write_type(writer, value.ty())?;
    match value {
        TypedValue::String(v) | TypedValue::Enum(v) => binary::write_str(writer, v),
        TypedValue::Int(v) => binary::write_int64(writer, *v),
        TypedValue::Double(v) => binary::write_float64(writer, *v),
        TypedValue::Bool(v) => binary::write_boolean(writer, *v),
    }
}

fn parse_condition<R: io::Read>(reader: &mut R) -> io::Result<Condition> {
    let variable = binary::str(reader)?;
    let op = match binary::uint8(reader)? {
        0 => ComparisonOp::Equal,
        1 => ComparisonOp::NotEqual,
        2 => ComparisonOp::Less,
        3 => ComparisonOp::LessOrEqual,
        4 => ComparisonOp::Greater,
        5 => ComparisonOp::GreaterOrEqual,
        _ => return Err(invalid("Received invalid comparison operator")),
    };
    let kind = match binary::uint8(reader)? {
        0 => ConditionKind::Property,
        1 => ConditionKind::State,
        _ => return Err(invalid("Received invalid condition kind")),
    };
    let value = parse_value(reader)?;

    Ok(Condition {
        variable,
        op,
        value,
        kind,
    })
}

fn write_condition<W: io::Write>(writer: &mut W, condition: &Condition) -> io::Result<()> {
    binary::write_str(writer, &condition.variable)?;
    binary::write_uint8(
        writer,
        match condition.op {
            ComparisonOp::Equal => 0,
            ComparisonOp::NotEqual => 1,
            ComparisonOp::Less => 2,
            ComparisonOp::LessOrEqual => 3,
            ComparisonOp::Greater => 4,
            ComparisonOp::GreaterOrEqual => 5,
        },
    )?;
    binary::write_uint8(
        writer,
        match condition.kind {
            ConditionKind::Property => 0,
            ConditionKind::State => 1,
        },
    )?;
    write_value(writer, &condition.value)
}

fn parse_tree<R: io::Read>(reader: &mut R, depth: usize) -> io::Result<ConditionTree> {
    if depth > MAX_CONDITION_DEPTH {
        return Err(invalid("Condition tree nested too deeply"));
    }

    Ok(match binary::uint8(reader)? {
        0 => ConditionTree::Empty,
        1 => ConditionTree::Leaf(parse_condition(reader)?),
        2 => {
            let op = match binary::uint8(reader)? {
                0 => BoolOp::And,
                1 => BoolOp::Or,
                _ => return Err(invalid("Received invalid boolean operator")),
            };
            let left = parse_tree(reader, depth + 1)?;
            let right = parse_tree(reader, depth + 1)?;

            ConditionTree::Operator {
                op,
                left: Box::new(left),
                right: Box::new(right),
            }
        }
        _ => return Err(invalid("Received invalid condition node")),
    })
}

fn write_tree<W: io::Write>(writer: &mut W, tree: &ConditionTree) -> io::Result<()> {
    match tree {
        ConditionTree::Empty => binary::write_uint8(writer, 0),
        ConditionTree::Leaf(c) => {
            binary::write_uint8(writer, 1)?;
            write_condition(writer, c)
        }
        ConditionTree::Operator { op, left, right } => {
            binary::write_uint8(writer, 2)?;
            binary::write_uint8(
                writer,
                match op {
                    BoolOp::And => 0,
                    BoolOp::Or => 1,
                },
            )?;
            write_tree(writer, left)?;
            write_tree(writer, right)
        }
    }
}

/// Parses a condition guard in the container's encoding.
pub fn parse_conditions<R: io::Read>(reader: &mut R, enc: Encoding) -> io::Result<ConditionTree> {
    if enc.condition_trees() {
        parse_tree(reader, 0)
    } else {
        binary::prefixed_seq(reader, parse_condition).map(ConditionTree::from_collection)
    }
}

/// Writes a condition guard in the container's encoding.
///
/// Trees that are not flat AND chains are written as empty collections
/// by version 1; callers reject them up front.
pub fn write_conditions<W: io::Write>(
    writer: &mut W,
    enc: Encoding,
    tree: &ConditionTree,
) -> io::Result<()> {
    if enc.condition_trees() {
        write_tree(writer, tree)
    } else {
        let flat = tree.to_collection().unwrap_or_default();
        binary::write_seq(writer, true, &flat, |w, c| write_condition(w, c))
    }
}

fn parse_position<R: io::Read>(reader: &mut R) -> io::Result<ComponentPosition> {
    Ok(match binary::uint8(reader)? {
        0 => ComponentPosition::Start,
        1 => ComponentPosition::Middle,
        2 => ComponentPosition::End,
        _ => return Err(invalid("Received invalid component position")),
    })
}

fn write_position<W: io::Write>(writer: &mut W, pos: ComponentPosition) -> io::Result<()> {
    let tag = match pos {
        ComponentPosition::Start => 0,
        ComponentPosition::Middle => 1,
        ComponentPosition::End => 2,
    };
    binary::write_uint8(writer, tag)
}

pub fn parse_vector<R: io::Read>(reader: &mut R) -> io::Result<Point> {
    Ok(Point::new(binary::float64(reader)?, binary::float64(reader)?))
}

pub fn write_vector<W: io::Write>(writer: &mut W, p: Point) -> io::Result<()> {
    binary::write_float64(writer, p.x)?;
    binary::write_float64(writer, p.y)
}

pub fn parse_point<R: io::Read>(reader: &mut R) -> io::Result<ComponentPoint> {
    Ok(ComponentPoint {
        relative_to_x: parse_position(reader)?,
        relative_to_y: parse_position(reader)?,
        offset: parse_vector(reader)?,
    })
}

pub fn write_point<W: io::Write>(writer: &mut W, p: &ComponentPoint) -> io::Result<()> {
    write_position(writer, p.relative_to_x)?;
    write_position(writer, p.relative_to_y)?;
    write_vector(writer, p.offset)
}

fn parse_path_command<R: io::Read>(reader: &mut R) -> io::Result<PathCommand> {
    Ok(match binary::uint8(reader)? {
        1 => PathCommand::MoveTo(parse_vector(reader)?),
        2 => PathCommand::LineTo(parse_vector(reader)?),
        3 => PathCommand::CurveTo {
            control1: parse_vector(reader)?,
            control2: parse_vector(reader)?,
            end: parse_vector(reader)?,
        },
        4 => PathCommand::SmoothCurveTo {
            control2: parse_vector(reader)?,
            end: parse_vector(reader)?,
        },
        5 => PathCommand::EllipticalArcTo {
            radius_x: binary::float64(reader)?,
            radius_y: binary::float64(reader)?,
            rotation: binary::float64(reader)?,
            large_arc: binary::boolean(reader)?,
            sweep: binary::boolean(reader)?,
            end: parse_vector(reader)?,
        },
        6 => PathCommand::QuadraticCurveTo {
            control: parse_vector(reader)?,
            end: parse_vector(reader)?,
        },
        7 => PathCommand::SmoothQuadraticCurveTo(parse_vector(reader)?),
        8 => PathCommand::ClosePath,

        _ => return Err(invalid("Received invalid path command")),
    })
}

fn write_path_command<W: io::Write>(writer: &mut W, cmd: &PathCommand) -> io::Result<()> {
    match *cmd {
        PathCommand::MoveTo(p) => {
            binary::write_uint8(writer, 1)?;
            write_vector(writer, p)?;
        }
        PathCommand::LineTo(p) => {
            binary::write_uint8(writer, 2)?;
            write_vector(writer, p)?;
        }
        PathCommand::CurveTo {
            control1,
            control2,
            end,
        } => {
            binary::write_uint8(writer, 3)?;
            write_vector(writer, control1)?;
            write_vector(writer, control2)?;
            write_vector(writer, end)?;
        }
        PathCommand::SmoothCurveTo { control2, end } => {
            binary::write_uint8(writer, 4)?;
            write_vector(writer, control2)?;
            write_vector(writer, end)?;
        }
        PathCommand::EllipticalArcTo {
            radius_x,
            radius_y,
            rotation,
            large_arc,
            sweep,
            end,
        } => {
            binary::write_uint8(writer, 5)?;
            binary::write_float64(writer, radius_x)?;
            binary::write_float64(writer, radius_y)?;
            binary::write_float64(writer, rotation)?;
            binary::write_boolean(writer, large_arc)?;
            binary::write_boolean(writer, sweep)?;
            write_vector(writer, end)?;
        }
        PathCommand::QuadraticCurveTo { control, end } => {
            binary::write_uint8(writer, 6)?;
            write_vector(writer, control)?;
            write_vector(writer, end)?;
        }
        PathCommand::SmoothQuadraticCurveTo(end) => {
            binary::write_uint8(writer, 7)?;
            write_vector(writer, end)?;
        }
        PathCommand::ClosePath => {
            binary::write_uint8(writer, 8)?;
        }
    }

    Ok(())
}

fn parse_text_run<R: io::Read>(reader: &mut R) -> io::Result<TextRun> {
    let text = binary::str(reader)?;
    let baseline = match binary::uint8(reader)? {
        0 => TextBaseline::Normal,
        1 => TextBaseline::Subscript,
        2 => TextBaseline::Superscript,
        _ => return Err(invalid("Received invalid text baseline")),
    };
    let size = binary::float64(reader)?;

    Ok(TextRun::new(text, TextFormatting { baseline, size }))
}

fn write_text_run<W: io::Write>(writer: &mut W, run: &TextRun) -> io::Result<()> {
    binary::write_str(writer, &run.text)?;
    binary::write_uint8(
        writer,
        match run.formatting.baseline {
            TextBaseline::Normal => 0,
            TextBaseline::Subscript => 1,
            TextBaseline::Superscript => 2,
        },
    )?;
    binary::write_float64(writer, run.formatting.size)
}

pub fn parse_render_command<R: io::Read>(reader: &mut R) -> io::Result<RenderCommand> {
    Ok(match binary::uint8(reader)? {
        1 => RenderCommand::Line {
            start: parse_point(reader)?,
            end: parse_point(reader)?,
            thickness: binary::float64(reader)?,
        },
        2 => RenderCommand::Rect {
            location: parse_point(reader)?,
            width: binary::float64(reader)?,
            height: binary::float64(reader)?,
            thickness: binary::float64(reader)?,
            fill: binary::boolean(reader)?,
        },
        3 => RenderCommand::Ellipse {
            centre: parse_point(reader)?,
            radius_x: binary::float64(reader)?,
            radius_y: binary::float64(reader)?,
            thickness: binary::float64(reader)?,
            fill: binary::boolean(reader)?,
        },
        4 => RenderCommand::Path {
            start: parse_point(reader)?,
            thickness: binary::float64(reader)?,
            fill: binary::boolean(reader)?,
            commands: binary::prefixed_seq(reader, parse_path_command)?,
        },
        5 => {
            let location = parse_point(reader)?;
            let alignment = TextAlignment::ALL
                .get(binary::uint8(reader)? as usize)
                .copied()
                .ok_or_else(|| invalid("Received invalid text alignment"))?;
            let runs = binary::prefixed_seq(reader, parse_text_run)?;

            RenderCommand::Text {
                location,
                alignment,
                runs,
            }
        }

        _ => return Err(invalid("Received invalid render command")),
    })
}

pub fn write_render_command<W: io::Write>(writer: &mut W, cmd: &RenderCommand) -> io::Result<()> {
    match cmd {
        RenderCommand::Line {
            start,
            end,
            thickness,
        } => {
            binary::write_uint8(writer, 1)?;
            write_point(writer, start)?;
            write_point(writer, end)?;
            binary::write_float64(writer, *thickness)?;
        }
        RenderCommand::Rect {
            location,
            width,
            height,
            thickness,
            fill,
        } => {
            binary::write_uint8(writer, 2)?;
            write_point(writer, location)?;
            binary::write_float64(writer, *width)?;
            binary::write_float64(writer, *height)?;
            binary::write_float64(writer, *thickness)?;
            binary::write_boolean(writer, *fill)?;
        }
        RenderCommand::Ellipse {
            centre,
            radius_x,
            radius_y,
            thickness,
            fill,
        } => {
            binary::write_uint8(writer, 3)?;
            write_point(writer, centre)?;
            binary::write_float64(writer, *radius_x)?;
            binary::write_float64(writer, *radius_y)?;
            binary::write_float64(writer, *thickness)?;
            binary::write_boolean(writer, *fill)?;
        }
        RenderCommand::Path {
            start,
            thickness,
            fill,
            commands,
        } => {
            binary::write_uint8(writer, 4)?;
            write_point(writer, start)?;
            binary::write_float64(writer, *thickness)?;
            binary::write_boolean(writer, *fill)?;
            binary::write_seq(writer, true, commands, write_path_command)?;
        }
        RenderCommand::Text {
            location,
            alignment,
            runs,
        } => {
            binary::write_uint8(writer, 5)?;
            write_point(writer, location)?;

            let alignment = TextAlignment::ALL
                .iter()
                .position(|a| a == alignment)
                .unwrap_or_default();
            binary::write_uint8(writer, alignment as u8)?;
            binary::write_seq(writer, true, runs, write_text_run)?;
        }
    }

    Ok(())
}
