//! The tagged value model shared by properties, defaults and conditions.

use std::{fmt, str::FromStr};

use indexmap::IndexMap;
use thiserror::Error;

/// A live set of property values for one component instance, keyed by
/// property name and kept in insertion order.
pub type PropertySet = IndexMap<String, TypedValue>;

/// Errors produced when interpreting text as a [`TypedValue`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValueError {
    /// The text is not a valid value of the requested type.
    #[error("'{text}' is not a valid {ty} value")]
    Invalid { ty: PropertyType, text: String },

    /// The name does not denote a known property type.
    #[error("unknown property type '{0}'")]
    UnknownType(String),
}

/// The type of a [`TypedValue`], without its payload.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropertyType {
    String,
    Int,
    Double,
    Bool,
    Enum,
}

impl PropertyType {
    /// The canonical textual name of the type.
    pub const fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Double => "double",
            Self::Bool => "bool",
            Self::Enum => "enum",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PropertyType {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "string" => Self::String,
            "int" | "integer" => Self::Int,
            "double" | "decimal" => Self::Double,
            "bool" | "boolean" => Self::Bool,
            "enum" => Self::Enum,
            _ => return Err(ValueError::UnknownType(s.to_owned())),
        })
    }
}

/// A dynamically typed property value.
///
/// The variant decides both the binary encoding and how the value takes
/// part in comparisons. [`TypedValue::Enum`] holds a string, but compares
/// case-insensitively when used as a condition operand.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", content = "value"))]
#[derive(Clone, Debug, PartialEq)]
pub enum TypedValue {
    String(String),
    Int(i64),
    Double(f64),
    Bool(bool),
    Enum(String),
}

impl TypedValue {
    /// Gets the [`PropertyType`] of this value.
    pub const fn ty(&self) -> PropertyType {
        match self {
            Self::String(..) => PropertyType::String,
            Self::Int(..) => PropertyType::Int,
            Self::Double(..) => PropertyType::Double,
            Self::Bool(..) => PropertyType::Bool,
            Self::Enum(..) => PropertyType::Enum,
        }
    }

    /// Parses `text` as a value of type `ty`.
    pub fn parse(ty: PropertyType, text: &str) -> Result<Self, ValueError> {
        let invalid = || ValueError::Invalid {
            ty,
            text: text.to_owned(),
        };

        Ok(match ty {
            PropertyType::String => Self::String(text.to_owned()),
            PropertyType::Enum => Self::Enum(text.to_owned()),
            PropertyType::Int => Self::Int(text.trim().parse().map_err(|_| invalid())?),
            PropertyType::Double => Self::Double(text.trim().parse().map_err(|_| invalid())?),
            PropertyType::Bool => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Self::Bool(true),
                "false" | "0" | "no" => Self::Bool(false),
                _ => return Err(invalid()),
            },
        })
    }

    /// The zero value of a given type.
    pub fn default_of(ty: PropertyType) -> Self {
        match ty {
            PropertyType::String => Self::String(String::new()),
            PropertyType::Int => Self::Int(0),
            PropertyType::Double => Self::Double(0.0),
            PropertyType::Bool => Self::Bool(false),
            PropertyType::Enum => Self::Enum(String::new()),
        }
    }

    /// Gets the numeric value for [`TypedValue::Int`] and
    /// [`TypedValue::Double`].
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Int(v) => Some(v as f64),
            Self::Double(v) => Some(v),
            _ => None,
        }
    }

    /// Gets the string payload for [`TypedValue::String`] and
    /// [`TypedValue::Enum`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Enum(s) => Some(s),
            _ => None,
        }
    }

    /// Gets the payload of a [`TypedValue::Bool`].
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Self::Bool(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) | Self::Enum(s) => f.write_str(s),
            Self::Int(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for TypedValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<i64> for TypedValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for TypedValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<bool> for TypedValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}
