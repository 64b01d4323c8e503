//! Library for reading and writing component description containers.
//!
//! A container holds any number of component descriptions together with
//! the binary resources (such as icons) they reference. The format is
//! versioned: every item and every section of a component is prefixed
//! with its type and length, so readers can skip data introduced by
//! newer writers.
//!
//! Containers may be signed with an RSA key. Signature problems never
//! prevent loading; they are reported through the returned
//! [`Warning`]s and the [`SignatureStatus`] of every description.
//!
//! [`SignatureStatus`]: trellis_description::SignatureStatus

#![deny(rust_2018_idioms, rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

mod builder;
pub use builder::*;

mod codec;

mod component;
pub use component::SectionType;

mod error;
pub use error::*;

mod header;
pub use header::MAGIC;

mod reader;
pub use reader::*;

mod signing;
pub use signing::{Certificate, SigningKey, TrustStore};

/// The newest container version this library reads and writes.
pub const CURRENT_VERSION: u8 = 2;

/// Type tags of the top-level container items.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u16)]
pub enum ItemType {
    Resource = 1,
    Component = 2,
}

impl ItemType {
    pub fn from_tag(tag: u16) -> Option<Self> {
        match tag {
            1 => Some(Self::Resource),
            2 => Some(Self::Component),
            _ => None,
        }
    }
}
