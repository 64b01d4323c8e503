//! The component description model.
//!
//! A [`ComponentDescription`] is the reusable definition of a schematic
//! symbol: its typed properties, conditional flag rules, connection
//! geometry and the render program which draws it.
//!
//! Descriptions are immutable once built by one of the codecs and are
//! meant to be shared between all component instances that use them.
//! Everything that depends on a concrete instance is evaluated against
//! a [`ConditionContext`] and an [`InstanceGeometry`] without mutating
//! the description itself.

#![deny(rust_2018_idioms, rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod condition;
pub use condition::{evaluate_conditions, ConditionContext, ConditionTree, InstanceContext};

pub mod connection;

mod description;
pub use description::*;

pub mod format;

pub mod geometry;
pub use geometry::{InstanceGeometry, Orientation, Point, Size};

pub mod interpret;
pub use interpret::{resolve_render, PrimitiveDrawOp};

pub mod property;

mod registry;
pub use registry::*;

pub mod render;

pub mod value;
pub use value::{PropertySet, PropertyType, TypedValue};
