//! The path data mini language.
//!
//! Path data follows the SVG syntax for the `M L H V C S Q T A Z`
//! commands. Lowercase commands take operands relative to the current
//! point; those are resolved to absolute coordinates while parsing.

use std::fmt::Write;

use logos::Logos;
use thiserror::Error;
use trellis_description::{render::PathCommand, Point};

/// Errors in path data.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("unknown path command '{0}'")]
    UnknownCommand(char),

    #[error("path data must start with a command")]
    MissingCommand,

    #[error("malformed number '{0}'")]
    MalformedNumber(String),

    #[error("command '{0}' is missing operands")]
    MissingOperands(char),

    #[error("arc flags must be 0 or 1")]
    InvalidFlag,
}

type Span = std::ops::Range<usize>;

#[derive(Logos, Clone, Copy, Debug, PartialEq)]
#[logos(skip r"[\s,]+")]
enum Token {
    #[regex("[MmLlHhVvCcSsQqTtAaZz]", |lex| lex.slice().chars().next())]
    Command(char),

    #[regex(r"[+-]?[0-9.]+([eE][+-]?[0-9]*)?", |lex| lex.slice().parse::<f64>().ok())]
    Number(f64),
}

struct Tokens<'a> {
    text: &'a str,
    tokens: Vec<(Result<Token, ()>, Span)>,
    pos: usize,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            tokens: Token::lexer(text).spanned().collect(),
            pos: 0,
        }
    }

    fn is_empty(&self) -> bool {
        self.pos == self.tokens.len()
    }

    /// The text of an unlexable token at the cursor.
    fn invalid(&self) -> Option<&'a str> {
        match self.tokens.get(self.pos) {
            Some((Err(()), span)) => Some(&self.text[span.clone()]),
            _ => None,
        }
    }

    fn command(&mut self) -> Result<char, PathError> {
        match self.tokens.get(self.pos) {
            Some((Ok(Token::Command(cmd)), _)) => {
                self.pos += 1;
                Ok(*cmd)
            }
            Some((Ok(Token::Number(_)), _)) | None => Err(PathError::MissingCommand),
            Some((Err(()), span)) => {
                let text = &self.text[span.clone()];
                match text.chars().next() {
                    Some(c) if c.is_ascii_alphabetic() => Err(PathError::UnknownCommand(c)),
                    _ => Err(PathError::MalformedNumber(text.to_owned())),
                }
            }
        }
    }

    /// Whether another number follows before the next command.
    fn has_number(&self) -> bool {
        matches!(self.tokens.get(self.pos), Some((Ok(Token::Number(_)), _)))
            || self
                .invalid()
                .is_some_and(|text| !text.starts_with(|c: char| c.is_ascii_alphabetic()))
    }

    fn number(&mut self, cmd: char) -> Result<f64, PathError> {
        if let Some((Ok(Token::Number(v)), _)) = self.tokens.get(self.pos) {
            self.pos += 1;
            return Ok(*v);
        }

        match self.invalid() {
            Some(text) if !text.starts_with(|c: char| c.is_ascii_alphabetic()) => {
                Err(PathError::MalformedNumber(text.to_owned()))
            }
            _ => Err(PathError::MissingOperands(cmd)),
        }
    }

    fn flag(&mut self, cmd: char) -> Result<bool, PathError> {
        let v = self.number(cmd)?;
        if v == 0.0 {
            Ok(false)
        } else if v == 1.0 {
            Ok(true)
        } else {
            Err(PathError::InvalidFlag)
        }
    }
}

/// Parses path data into absolute path commands.
pub fn parse_path(data: &str) -> Result<Vec<PathCommand>, PathError> {
    let mut tokens = Tokens::new(data);
    let mut out = Vec::new();

    let mut current = Point::ORIGIN;
    let mut subpath_start = Point::ORIGIN;

    while !tokens.is_empty() {
        let cmd = tokens.command()?;
        let relative = cmd.is_ascii_lowercase();
        let base = |current: Point| if relative { current } else { Point::ORIGIN };

        let mut first = true;
        loop {
            let point = |tokens: &mut Tokens<'_>, current: Point| -> Result<Point, PathError> {
                let x = tokens.number(cmd)?;
                let y = tokens.number(cmd)?;
                Ok(base(current) + Point::new(x, y))
            };

            let command = match cmd.to_ascii_uppercase() {
                'M' => {
                    let p = point(&mut tokens, current)?;
                    if first {
                        subpath_start = p;
                        PathCommand::MoveTo(p)
                    } else {
                        // Further pairs after a move are implicit lines.
                        PathCommand::LineTo(p)
                    }
                }
                'L' => PathCommand::LineTo(point(&mut tokens, current)?),
                'H' => {
                    let x = tokens.number(cmd)? + base(current).x;
                    PathCommand::LineTo(Point::new(x, current.y))
                }
                'V' => {
                    let y = tokens.number(cmd)? + base(current).y;
                    PathCommand::LineTo(Point::new(current.x, y))
                }
                'C' => PathCommand::CurveTo {
                    control1: point(&mut tokens, current)?,
                    control2: point(&mut tokens, current)?,
                    end: point(&mut tokens, current)?,
                },
                'S' => PathCommand::SmoothCurveTo {
                    control2: point(&mut tokens, current)?,
                    end: point(&mut tokens, current)?,
                },
                'Q' => PathCommand::QuadraticCurveTo {
                    control: point(&mut tokens, current)?,
                    end: point(&mut tokens, current)?,
                },
                'T' => PathCommand::SmoothQuadraticCurveTo(point(&mut tokens, current)?),
                'A' => PathCommand::EllipticalArcTo {
                    radius_x: tokens.number(cmd)?,
                    radius_y: tokens.number(cmd)?,
                    rotation: tokens.number(cmd)?,
                    large_arc: tokens.flag(cmd)?,
                    sweep: tokens.flag(cmd)?,
                    end: point(&mut tokens, current)?,
                },
                _ => PathCommand::ClosePath,
            };

            match command.end() {
                Some(end) => current = end,
                None => current = subpath_start,
            }
            out.push(command);
            first = false;

            if command == PathCommand::ClosePath || !tokens.has_number() {
                break;
            }
        }
    }

    Ok(out)
}

/// Formats path commands as absolute path data.
pub fn format_path(commands: &[PathCommand]) -> String {
    let mut out = String::new();

    for cmd in commands {
        if !out.is_empty() {
            out.push(' ');
        }

        // Writing into a String cannot fail.
        let _ = match *cmd {
            PathCommand::MoveTo(p) => write!(out, "M{},{}", p.x, p.y),
            PathCommand::LineTo(p) => write!(out, "L{},{}", p.x, p.y),
            PathCommand::CurveTo {
                control1,
                control2,
                end,
            } => write!(
                out,
                "C{},{} {},{} {},{}",
                control1.x, control1.y, control2.x, control2.y, end.x, end.y
            ),
            PathCommand::SmoothCurveTo { control2, end } => write!(
                out,
                "S{},{} {},{}",
                control2.x, control2.y, end.x, end.y
            ),
            PathCommand::QuadraticCurveTo { control, end } => write!(
                out,
                "Q{},{} {},{}",
                control.x, control.y, end.x, end.y
            ),
            PathCommand::SmoothQuadraticCurveTo(p) => write!(out, "T{},{}", p.x, p.y),
            PathCommand::EllipticalArcTo {
                radius_x,
                radius_y,
                rotation,
                large_arc,
                sweep,
                end,
            } => write!(
                out,
                "A{},{} {} {} {} {},{}",
                radius_x, radius_y, rotation, large_arc as u8, sweep as u8, end.x, end.y
            ),
            PathCommand::ClosePath => write!(out, "Z"),
        };
    }

    out
}
