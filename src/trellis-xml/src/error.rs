use std::io;

use thiserror::Error;
use trellis_description::{value::ValueError, Version};

use crate::{condition::ConditionError, path::PathError, point::PointError};

/// Errors that may occur when reading or writing XML descriptions.
#[derive(Debug, Error)]
pub enum Error {
    /// The document is not well-formed XML.
    #[error("{0}")]
    Xml(#[from] quick_xml::Error),

    /// Serialization of the document failed.
    #[error("{0}")]
    Io(#[from] io::Error),

    /// The document structure is broken.
    #[error("malformed document: {0}")]
    Malformed(String),

    /// The root element is not `<component>`.
    #[error("expected a <component> document, found <{0}>")]
    UnexpectedRoot(String),

    #[error("<{element}> is missing the '{attribute}' attribute")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
    },

    #[error("<{element}> has an invalid '{attribute}' value '{value}'")]
    InvalidAttribute {
        element: String,
        attribute: &'static str,
        value: String,
    },

    /// The mandatory `name` meta is absent.
    #[error("the description has no name")]
    MissingName,

    /// A setter or condition references a property that is not declared.
    #[error("property '{0}' is not declared")]
    UndefinedProperty(String),

    #[error("unknown flag '{0}'")]
    UnknownFlag(String),

    #[error("invalid conditions '{text}': {source}")]
    Condition {
        text: String,
        source: ConditionError,
    },

    #[error("invalid path data '{text}': {source}")]
    Path { text: String, source: PathError },

    #[error("invalid point '{text}': {source}")]
    Point { text: String, source: PointError },

    #[error(transparent)]
    Value(#[from] ValueError),

    /// Embedded binary data is not valid base64.
    #[error("invalid embedded data: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Non-fatal conditions encountered while loading a document.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Warning {
    /// The document was written by a newer version of the format.
    #[error("document version {0} is newer than supported")]
    NewerVersion(Version),
}
