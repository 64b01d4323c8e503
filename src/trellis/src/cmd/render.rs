use std::{
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};

use clap::Args;
use eyre::Context;
use serde::Serialize;
use trellis_description::{
    condition::InstanceContext, connection::ResolvedConnection, resolve_render, ComponentDescription,
    DescriptionRegistry, FlagOptions, InstanceGeometry, Orientation, Point, PrimitiveDrawOp,
    PropertySet, Size, TypedValue, GRID_SIZE,
};

use super::Command;
use crate::cli::{helpers, read_file};

/// Subcommand for resolving a description into drawing primitives.
#[derive(Debug, Args)]
pub struct Render {
    /// Path to an XML document or a binary container.
    path: PathBuf,

    /// The id or name of the description to render.
    ///
    /// May be omitted when the input holds a single description.
    #[clap(short, long)]
    component: Option<String>,

    /// The instance size as `LENGTHxBREADTH`.
    #[clap(short, long, default_value = "60x20")]
    size: InstanceSize,

    /// Places the instance vertically.
    #[clap(long)]
    vertical: bool,

    /// Mirrors the instance along its length.
    #[clap(long)]
    flipped: bool,

    /// Applies a named configuration before any `--set` values.
    #[clap(long)]
    configuration: Option<String>,

    /// Overrides a property value as `NAME=VALUE`.
    ///
    /// May be given multiple times.
    #[clap(long = "set", value_name = "NAME=VALUE")]
    properties: Vec<String>,
}

#[derive(Clone, Copy, Debug)]
struct InstanceSize(Size);

impl FromStr for InstanceSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (length, breadth) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected LENGTHxBREADTH, got '{s}'"))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<f64>()
                .map_err(|e| format!("invalid size '{v}': {e}"))
        };

        Ok(Self(Size::new(parse(length)?, parse(breadth)?)))
    }
}

/// The JSON view of a rendered instance.
#[derive(Serialize)]
struct RenderDump {
    component: String,
    flags: FlagOptions,
    properties: PropertySet,
    connections: Vec<ResolvedConnection>,
    primitives: Vec<PrimitiveDrawOp>,
}

impl Command for Render {
    fn handle(self) -> eyre::Result<()> {
        let registry = load_registry(&self.path)?;
        let description = select(&registry, self.component.as_deref())?;

        let mut properties = description.default_properties();
        if let Some(name) = &self.configuration {
            if !description.apply_configuration(name, &mut properties) {
                eyre::bail!("'{}' has no configuration '{name}'", description.id);
            }
        }
        for assignment in &self.properties {
            let (name, value) = parse_assignment(description, assignment)?;
            properties.insert(name, value);
        }

        let geometry = InstanceGeometry::new(
            Point::ORIGIN,
            self.size.0,
            if self.vertical {
                Orientation::Vertical
            } else {
                Orientation::Horizontal
            },
            self.flipped,
        );
        let ctx = InstanceContext::new(&properties, &geometry);

        let dump = RenderDump {
            component: description.id.clone(),
            flags: description.flags(&ctx),
            connections: description.resolve_connections(&properties, &geometry, GRID_SIZE),
            primitives: resolve_render(description, &ctx, &geometry),
            properties,
        };
        helpers::write_json(None, &dump)
    }
}

fn load_registry(path: &Path) -> eyre::Result<DescriptionRegistry> {
    let data = read_file(path)?;

    if data.starts_with(&trellis_binary::MAGIC) {
        let container = trellis_binary::load_binary(&data, None)
            .with_context(|| format!("failed to load container '{}'", path.display()))?;
        Ok(container.into_registry())
    } else {
        let doc = trellis_xml::load_xml(&data)
            .with_context(|| format!("failed to load document '{}'", path.display()))?;
        Ok([Arc::new(doc.description)].into_iter().collect())
    }
}

fn select<'a>(
    registry: &'a DescriptionRegistry,
    component: Option<&str>,
) -> eyre::Result<&'a ComponentDescription> {
    let found = match component {
        Some(key) => registry.get(key).or_else(|| registry.by_name(key)),
        None if registry.len() == 1 => registry.iter().next(),
        None => eyre::bail!(
            "input holds {} descriptions; pick one with --component",
            registry.len()
        ),
    };

    found
        .map(|d| &**d)
        .ok_or_else(|| eyre::eyre!("no description matches the requested component"))
}

fn parse_assignment(
    description: &ComponentDescription,
    assignment: &str,
) -> eyre::Result<(String, TypedValue)> {
    let (name, text) = assignment
        .split_once('=')
        .ok_or_else(|| eyre::eyre!("expected NAME=VALUE, got '{assignment}'"))?;
    let property = description
        .property(name)
        .ok_or_else(|| eyre::eyre!("'{}' has no property '{name}'", description.id))?;
    let value = TypedValue::parse(property.ty, text)
        .with_context(|| format!("invalid value for property '{name}'"))?;

    Ok((name.to_owned(), value))
}
