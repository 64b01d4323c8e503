use std::{fmt, str::FromStr, sync::Arc};

use bitflags::bitflags;
use indexmap::IndexMap;
use uuid::Uuid;

use crate::{
    condition::{ConditionContext, ConditionTree, InstanceContext},
    connection::{ConnectionGroup, ResolvedConnection},
    geometry::InstanceGeometry,
    property::ComponentProperty,
    render::RenderDescription,
    value::{PropertySet, TypedValue},
};

/// The size of one grid unit on the canvas.
pub const GRID_SIZE: f64 = 10.0;

bitflags! {
    /// Behavior flags of a component, selected by [`FlagRule`]s.
    #[cfg_attr(feature = "serde", derive(serde::Serialize))]
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct FlagOptions: u32 {
        /// The component may only be placed horizontally.
        const HORIZONTAL_ONLY = 1 << 0;
        /// The component may only be placed vertically.
        const VERTICAL_ONLY = 1 << 1;
        /// Flipping mirrors the component along its length.
        const FLIP_PRIMARY = 1 << 2;
        /// Flipping mirrors the component across its length.
        const FLIP_SECONDARY = 1 << 3;
        /// The component keeps its minimum size.
        const NO_RESIZE = 1 << 4;
        /// Miscellaneous drawing is enabled.
        const MISC_DRAW = 1 << 5;
        /// Connections are not mirrored with the component.
        const DISABLE_FLIP_CONNECTIONS = 1 << 6;
    }
}

impl FlagOptions {
    /// Textual names of the individual flags.
    pub const NAMES: [(&'static str, FlagOptions); 7] = [
        ("HorizontalOnly", Self::HORIZONTAL_ONLY),
        ("VerticalOnly", Self::VERTICAL_ONLY),
        ("FlipPrimary", Self::FLIP_PRIMARY),
        ("FlipSecondary", Self::FLIP_SECONDARY),
        ("NoResize", Self::NO_RESIZE),
        ("MiscDraw", Self::MISC_DRAW),
        ("DisableFlipConnections", Self::DISABLE_FLIP_CONNECTIONS),
    ];
}

/// A conditional set of flags.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlagRule {
    pub conditions: ConditionTree,
    pub value: FlagOptions,
}

/// An embedded binary blob, such as an icon image.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryResource {
    pub id: u32,
    pub mime_type: String,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub data: Vec<u8>,
}

/// A reference to an icon image.
///
/// Codecs produce [`Icon::Id`] while parsing and replace it with the
/// shared resource once all resources are known.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Icon {
    Id(u32),
    Resource(Arc<BinaryResource>),
}

impl Icon {
    /// The id of the referenced resource.
    pub fn resource_id(&self) -> u32 {
        match self {
            Self::Id(id) => *id,
            Self::Resource(r) => r.id,
        }
    }

    /// The resource, if resolved.
    pub fn resource(&self) -> Option<&Arc<BinaryResource>> {
        match self {
            Self::Id(..) => None,
            Self::Resource(r) => Some(r),
        }
    }
}

/// A `major.minor.patch` version number.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
}

impl Version {
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = std::num::ParseIntError;

    /// Parses one to three dot-separated components; missing ones are 0.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().splitn(3, '.');
        let mut next = || parts.next().map_or(Ok(0), str::parse);

        Ok(Self {
            major: next()?,
            minor: next()?,
            patch: next()?,
        })
    }
}

/// The (set, item) identity a description implements, used to match
/// types across documents.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Implements {
    pub set: String,
    pub item: String,
}

/// The outcome of verifying a signed container.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignatureStatus {
    pub is_signed: bool,
    /// Whether the signature matches the signed content.
    pub signature_valid: bool,
    /// Whether the signing certificate is in the caller's trust store.
    pub certificate_trusted: bool,
    /// The raw certificate the content was signed with.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub certificate: Option<Vec<u8>>,
}

/// A named preset of property values.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ComponentConfiguration {
    pub name: String,
    pub implementation_name: Option<String>,
    pub icon: Option<Icon>,
    pub setters: IndexMap<String, TypedValue>,
}

/// Descriptive metadata of a component description.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ComponentDescriptionMetadata {
    pub guid: Uuid,
    pub author: Option<String>,
    pub version: Version,
    pub additional_information: Option<String>,
    pub implements: Option<Implements>,
    pub icon: Option<Icon>,
    pub signature: SignatureStatus,
    pub configurations: Vec<ComponentConfiguration>,
}

/// The reusable definition of a schematic symbol.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ComponentDescription {
    pub id: String,
    pub name: String,
    pub can_resize: bool,
    pub can_flip: bool,
    pub min_size: f64,
    pub properties: Vec<ComponentProperty>,
    pub connections: Vec<ConnectionGroup>,
    pub render: Vec<RenderDescription>,
    pub flags: Vec<FlagRule>,
    pub metadata: ComponentDescriptionMetadata,
}

impl ComponentDescription {
    /// Creates an empty description with default settings.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            can_resize: true,
            can_flip: false,
            min_size: GRID_SIZE,
            properties: Vec::new(),
            connections: Vec::new(),
            render: Vec::new(),
            flags: Vec::new(),
            metadata: ComponentDescriptionMetadata::default(),
        }
    }

    /// Finds a declared property by name.
    pub fn property(&self, name: &str) -> Option<&ComponentProperty> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Finds a configuration by name.
    pub fn configuration(&self, name: &str) -> Option<&ComponentConfiguration> {
        self.metadata
            .configurations
            .iter()
            .find(|c| c.name == name)
    }

    /// Builds the property set of a fresh instance from the defaults.
    pub fn default_properties(&self) -> PropertySet {
        self.properties
            .iter()
            .map(|p| (p.name.clone(), p.default.clone()))
            .collect()
    }

    /// Applies the setters of a named configuration to `properties`.
    ///
    /// Returns false when no such configuration exists.
    pub fn apply_configuration(&self, name: &str, properties: &mut PropertySet) -> bool {
        match self.configuration(name) {
            Some(config) => {
                for (k, v) in &config.setters {
                    properties.insert(k.clone(), v.clone());
                }
                true
            }
            None => false,
        }
    }

    /// Combines the flags of every matching rule.
    pub fn flags<C: ConditionContext + ?Sized>(&self, ctx: &C) -> FlagOptions {
        self.flags
            .iter()
            .filter(|r| r.conditions.evaluate(ctx))
            .fold(FlagOptions::empty(), |acc, r| acc | r.value)
    }

    /// Formats the value of the named property for display.
    pub fn format_property<C: ConditionContext + ?Sized>(
        &self,
        name: &str,
        ctx: &C,
    ) -> Option<String> {
        self.property(name).map(|p| p.format(ctx))
    }

    /// Resolves the connection points of a placed instance.
    ///
    /// Every connection group whose guard matches contributes, in
    /// declaration order.
    pub fn resolve_connections(
        &self,
        properties: &PropertySet,
        geometry: &InstanceGeometry,
        grid: f64,
    ) -> Vec<ResolvedConnection> {
        let ctx = InstanceContext::new(properties, geometry);
        self.connections
            .iter()
            .filter(|g| g.conditions.evaluate(&ctx))
            .flat_map(|g| g.connections.iter())
            .flat_map(|c| c.resolve(geometry, grid))
            .collect()
    }

    /// Iterates over every condition guard in the description.
    pub fn condition_trees(&self) -> impl Iterator<Item = &ConditionTree> {
        let properties = self.properties.iter().flat_map(|p| {
            p.format_rules
                .iter()
                .map(|r| &r.conditions)
                .chain(p.other_conditions.iter().map(|(_, t)| t))
        });

        self.flags
            .iter()
            .map(|r| &r.conditions)
            .chain(properties)
            .chain(self.connections.iter().map(|g| &g.conditions))
            .chain(self.render.iter().map(|g| &g.conditions))
    }

    /// Iterates over the icons of the description and its configurations.
    pub fn icons(&self) -> impl Iterator<Item = &Icon> {
        self.metadata.icon.iter().chain(
            self.metadata
                .configurations
                .iter()
                .filter_map(|c| c.icon.as_ref()),
        )
    }

    /// Iterates over all icon slots of the description and its
    /// configurations.
    pub fn icons_mut(&mut self) -> impl Iterator<Item = &mut Option<Icon>> {
        std::iter::once(&mut self.metadata.icon).chain(
            self.metadata
                .configurations
                .iter_mut()
                .map(|c| &mut c.icon),
        )
    }
}
