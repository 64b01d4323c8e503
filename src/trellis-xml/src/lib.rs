//! Library for reading and writing component descriptions as XML.
//!
//! The XML format mirrors the description model one-to-one and is meant
//! to be written by hand. Conditions, points and path data are embedded
//! as small textual languages inside attribute values; the parsers for
//! those are exposed so that other tools can reuse them.
//!
//! Embedded icons are stored as base64 and loaded as resources whose id
//! is the CRC32 checksum of their data.

#![deny(rust_2018_idioms, rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

use trellis_description::Version;

pub mod condition;

mod dom;

mod error;
pub use error::*;

pub mod path;

pub mod point;

mod reader;
pub use reader::*;

mod writer;
pub use writer::*;

/// The newest document version this library reads and writes.
pub const FORMAT_VERSION: Version = Version::new(1, 2, 0);

/// The XML namespace of component documents.
pub const NAMESPACE: &str = "urn:trellis:component";
