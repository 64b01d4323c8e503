//! Reduction of render programs to primitive draw operations.
//!
//! The output is independent of any particular drawing backend. All
//! coordinates are canvas coordinates of the placed instance.

use crate::{
    condition::ConditionContext,
    description::ComponentDescription,
    format,
    geometry::{InstanceGeometry, Orientation, Point, Size},
    render::{PathCommand, RenderCommand, TextAlignment, TextBaseline, TextRun},
};

/// Font size scale of subscript and superscript runs.
pub const SCRIPT_SIZE_SCALE: f64 = 0.7;

/// A path segment with canvas coordinates.
///
/// Smooth curves are already expanded into their explicit forms.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathOp {
    MoveTo(Point),
    LineTo(Point),
    CurveTo {
        control1: Point,
        control2: Point,
        end: Point,
    },
    QuadraticCurveTo {
        control: Point,
        end: Point,
    },
    ArcTo {
        radius_x: f64,
        radius_y: f64,
        rotation: f64,
        large_arc: bool,
        sweep: bool,
        end: Point,
    },
    ClosePath,
}

/// A text run ready to be laid out.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedTextRun {
    pub text: String,
    pub baseline: TextBaseline,
    /// The effective font size.
    pub size: f64,
    /// Vertical shift from the line's baseline; positive is downwards.
    pub baseline_offset: f64,
}

/// A primitive drawing operation for an external renderer.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub enum PrimitiveDrawOp {
    Line {
        start: Point,
        end: Point,
        thickness: f64,
    },
    Rect {
        location: Point,
        size: Size,
        thickness: f64,
        fill: bool,
    },
    Ellipse {
        centre: Point,
        radius_x: f64,
        radius_y: f64,
        thickness: f64,
        fill: bool,
    },
    Path {
        ops: Vec<PathOp>,
        thickness: f64,
        fill: bool,
    },
    Text {
        location: Point,
        alignment: TextAlignment,
        runs: Vec<ResolvedTextRun>,
    },
}

/// Resolves the render program of `description` for one instance.
///
/// Every render group whose guard holds in `ctx` contributes its
/// commands, in declaration order.
pub fn resolve_render<C: ConditionContext + ?Sized>(
    description: &ComponentDescription,
    ctx: &C,
    geometry: &InstanceGeometry,
) -> Vec<PrimitiveDrawOp> {
    description
        .render
        .iter()
        .filter(|group| group.conditions.evaluate(ctx))
        .flat_map(|group| group.commands.iter())
        .map(|cmd| resolve_command(description, ctx, geometry, cmd))
        .collect()
}

fn resolve_command<C: ConditionContext + ?Sized>(
    description: &ComponentDescription,
    ctx: &C,
    geometry: &InstanceGeometry,
    cmd: &RenderCommand,
) -> PrimitiveDrawOp {
    match cmd {
        RenderCommand::Line {
            start,
            end,
            thickness,
        } => PrimitiveDrawOp::Line {
            start: start.resolve(geometry),
            end: end.resolve(geometry),
            thickness: *thickness,
        },

        RenderCommand::Rect {
            location,
            width,
            height,
            thickness,
            fill,
        } => {
            // Map both corners so flips and rotation keep the rect in place.
            let local = location.resolve_local(geometry.size);
            let a = geometry.to_world(local);
            let b = geometry.to_world(local + Point::new(*width, *height));

            PrimitiveDrawOp::Rect {
                location: Point::new(a.x.min(b.x), a.y.min(b.y)),
                size: geometry.to_world_size(Size::new(*width, *height)),
                thickness: *thickness,
                fill: *fill,
            }
        }

        RenderCommand::Ellipse {
            centre,
            radius_x,
            radius_y,
            thickness,
            fill,
        } => {
            let radii = geometry.to_world_size(Size::new(*radius_x, *radius_y));
            PrimitiveDrawOp::Ellipse {
                centre: centre.resolve(geometry),
                radius_x: radii.width,
                radius_y: radii.height,
                thickness: *thickness,
                fill: *fill,
            }
        }

        RenderCommand::Path {
            start,
            thickness,
            fill,
            commands,
        } => PrimitiveDrawOp::Path {
            ops: resolve_path(start.resolve_local(geometry.size), commands, geometry),
            thickness: *thickness,
            fill: *fill,
        },

        RenderCommand::Text {
            location,
            alignment,
            runs,
        } => PrimitiveDrawOp::Text {
            location: location.resolve(geometry),
            alignment: *alignment,
            runs: runs
                .iter()
                .map(|run| resolve_text_run(description, ctx, run))
                .collect(),
        },
    }
}

fn resolve_text_run<C: ConditionContext + ?Sized>(
    description: &ComponentDescription,
    ctx: &C,
    run: &TextRun,
) -> ResolvedTextRun {
    let text = format::substitute(&run.text, |name| description.format_property(name, ctx));

    let base = run.formatting.size;
    let (size, baseline_offset) = match run.formatting.baseline {
        TextBaseline::Normal => (base, 0.0),
        TextBaseline::Subscript => (base * SCRIPT_SIZE_SCALE, base * 0.3),
        TextBaseline::Superscript => (base * SCRIPT_SIZE_SCALE, -base * 0.4),
    };

    ResolvedTextRun {
        text,
        baseline: run.formatting.baseline,
        size,
        baseline_offset,
    }
}

/// Pen state while walking a path.
struct PathCursor {
    current: Point,
    subpath_start: Point,
    last_cubic_control: Option<Point>,
    last_quadratic_control: Option<Point>,
}

fn resolve_path(
    origin: Point,
    commands: &[PathCommand],
    geometry: &InstanceGeometry,
) -> Vec<PathOp> {
    let world = |p: Point| geometry.to_world(origin + p);
    let mirrored = geometry.is_mirrored();
    let vertical = geometry.orientation == Orientation::Vertical;

    let mut cursor = PathCursor {
        current: Point::ORIGIN,
        subpath_start: Point::ORIGIN,
        last_cubic_control: None,
        last_quadratic_control: None,
    };

    let mut ops = Vec::with_capacity(commands.len() + 1);
    // Drawing begins at the start point unless the data moves first.
    if !matches!(commands.first(), None | Some(PathCommand::MoveTo(_))) {
        ops.push(PathOp::MoveTo(world(Point::ORIGIN)));
    }

    for cmd in commands {
        let mut cubic = None;
        let mut quadratic = None;

        let op = match *cmd {
            PathCommand::MoveTo(p) => {
                cursor.subpath_start = p;
                PathOp::MoveTo(world(p))
            }
            PathCommand::LineTo(p) => PathOp::LineTo(world(p)),
            PathCommand::CurveTo {
                control1,
                control2,
                end,
            } => {
                cubic = Some(control2);
                PathOp::CurveTo {
                    control1: world(control1),
                    control2: world(control2),
                    end: world(end),
                }
            }
            PathCommand::SmoothCurveTo { control2, end } => {
                let control1 = cursor
                    .last_cubic_control
                    .map_or(cursor.current, |c| c.reflect(cursor.current));
                cubic = Some(control2);
                PathOp::CurveTo {
                    control1: world(control1),
                    control2: world(control2),
                    end: world(end),
                }
            }
            PathCommand::QuadraticCurveTo { control, end } => {
                quadratic = Some(control);
                PathOp::QuadraticCurveTo {
                    control: world(control),
                    end: world(end),
                }
            }
            PathCommand::SmoothQuadraticCurveTo(end) => {
                let control = cursor
                    .last_quadratic_control
                    .map_or(cursor.current, |c| c.reflect(cursor.current));
                quadratic = Some(control);
                PathOp::QuadraticCurveTo {
                    control: world(control),
                    end: world(end),
                }
            }
            PathCommand::EllipticalArcTo {
                radius_x,
                radius_y,
                rotation,
                large_arc,
                sweep,
                end,
            } => {
                let (radius_x, radius_y) = if vertical {
                    (radius_y, radius_x)
                } else {
                    (radius_x, radius_y)
                };
                PathOp::ArcTo {
                    radius_x,
                    radius_y,
                    rotation: if mirrored { -rotation } else { rotation },
                    large_arc,
                    sweep: sweep ^ mirrored,
                    end: world(end),
                }
            }
            PathCommand::ClosePath => {
                cursor.current = cursor.subpath_start;
                PathOp::ClosePath
            }
        };

        if let Some(end) = cmd.end() {
            cursor.current = end;
        }
        cursor.last_cubic_control = cubic;
        cursor.last_quadratic_control = quadratic;

        ops.push(op);
    }

    ops
}
