//! Textual component points.
//!
//! A point is a sequence of anchor terms and offsets, for example
//! `_Middlex_Endy-5y` or `_Start+10x`. Anchors without an axis suffix
//! apply to both axes; axes without an anchor default to the start.

use std::fmt::Write;

use logos::Logos;
use thiserror::Error;
use trellis_description::geometry::{ComponentPoint, ComponentPosition, Point};

/// Errors in point definitions.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PointError {
    #[error("unknown anchor '_{0}'")]
    UnknownAnchor(String),

    #[error("malformed offset '{0}'")]
    MalformedOffset(String),

    #[error("offset '{0}' must end in 'x' or 'y'")]
    MissingAxis(String),

    #[error("unexpected '{0}'")]
    Unexpected(String),
}

#[derive(Clone, Copy)]
enum Axis {
    X,
    Y,
    Both,
}

fn anchor(word: &str) -> Result<(ComponentPosition, Axis), PointError> {
    const ANCHORS: [ComponentPosition; 3] = [
        ComponentPosition::Start,
        ComponentPosition::Middle,
        ComponentPosition::End,
    ];

    for position in ANCHORS {
        let name = position.name();
        let Some(head) = word.get(..name.len()) else {
            continue;
        };
        if !head.eq_ignore_ascii_case(name) {
            continue;
        }

        let axis = match &word[name.len()..] {
            "" => Axis::Both,
            "x" | "X" => Axis::X,
            "y" | "Y" => Axis::Y,
            _ => break,
        };
        return Ok((position, axis));
    }

    Err(PointError::UnknownAnchor(word.to_owned()))
}

#[derive(Logos, Clone, Copy, Debug, PartialEq)]
#[logos(skip r"\s+")]
enum Token<'a> {
    #[regex("_[A-Za-z]*", |lex| &lex.slice()[1..])]
    Anchor(&'a str),

    #[regex("[+-][0-9.]*[xXyY]?")]
    Offset,
}

/// Parses a textual point.
pub fn parse_point(text: &str) -> Result<ComponentPoint, PointError> {
    let mut point = ComponentPoint::default();
    let mut lexer = Token::lexer(text);

    while let Some(token) = lexer.next() {
        match token {
            Ok(Token::Anchor(word)) => match anchor(word)? {
                (position, Axis::X) => point.relative_to_x = position,
                (position, Axis::Y) => point.relative_to_y = position,
                (position, Axis::Both) => {
                    point.relative_to_x = position;
                    point.relative_to_y = position;
                }
            },
            Ok(Token::Offset) => {
                let slice = lexer.slice();
                let (number, axis) = match slice.as_bytes()[slice.len() - 1] {
                    b'x' | b'X' => (&slice[..slice.len() - 1], Axis::X),
                    b'y' | b'Y' => (&slice[..slice.len() - 1], Axis::Y),
                    _ => return Err(PointError::MissingAxis(slice.to_owned())),
                };
                let value: f64 = number
                    .parse()
                    .map_err(|_| PointError::MalformedOffset(number.to_owned()))?;

                match axis {
                    Axis::X => point.offset.x += value,
                    _ => point.offset.y += value,
                }
            }
            Err(()) => {
                let rest = &text[lexer.span().start..];
                return Err(PointError::Unexpected(rest.trim_end().to_owned()));
            }
        }
    }

    Ok(point)
}

/// Formats a point in its shortest textual form.
pub fn format_point(point: &ComponentPoint) -> String {
    let mut out = String::new();

    if point.relative_to_x == point.relative_to_y {
        out.push('_');
        out.push_str(point.relative_to_x.name());
    } else {
        let _ = write!(
            out,
            "_{}x_{}y",
            point.relative_to_x.name(),
            point.relative_to_y.name()
        );
    }

    let Point { x, y } = point.offset;
    if x != 0.0 {
        let _ = write!(out, "{x:+}x");
    }
    if y != 0.0 {
        let _ = write!(out, "{y:+}y");
    }

    out
}
