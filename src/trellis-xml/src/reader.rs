use std::{cell::RefCell, collections::HashMap, sync::Arc};

use base64::{engine::general_purpose::STANDARD, Engine};
use trellis_description::{
    connection::{ConnectionDescription, ConnectionEdge, ConnectionGroup},
    geometry::ComponentPoint,
    property::{ComponentProperty, FormatRule, OtherConditionKind, OtherConditions},
    render::{
        RenderCommand, RenderDescription, TextAlignment, TextBaseline, TextFormatting, TextRun,
        TEXT_SIZE_LARGE, TEXT_SIZE_MEDIUM, TEXT_SIZE_SMALL,
    },
    value::{PropertyType, TypedValue},
    format, BinaryResource, ComponentConfiguration, ComponentDescription, ConditionTree,
    FlagOptions, FlagRule, Icon, Implements, Version,
};
use uuid::Uuid;

use crate::{
    condition::{parse_conditions, Grammar},
    dom::{self, Element},
    path::parse_path,
    point::parse_point,
    Error, Warning, FORMAT_VERSION,
};

/// Stroke thickness of shapes which do not specify one.
pub const DEFAULT_THICKNESS: f64 = 2.0;

/// A description loaded from an XML document.
#[derive(Clone, Debug, PartialEq)]
pub struct XmlDocument {
    /// The format version the document declares.
    pub version: Version,
    pub description: ComponentDescription,
    /// Non-fatal problems found while loading.
    pub warnings: Vec<Warning>,
}

impl XmlDocument {
    /// The resources embedded in the document, without duplicates.
    pub fn resources(&self) -> Vec<Arc<BinaryResource>> {
        let mut out: Vec<Arc<BinaryResource>> = Vec::new();
        for icon in self.description.icons() {
            if let Some(resource) = icon.resource() {
                if !out.iter().any(|r| r.id == resource.id) {
                    out.push(Arc::clone(resource));
                }
            }
        }
        out
    }
}

/// Loads a description from an XML document.
pub fn load_xml(data: &[u8]) -> Result<XmlDocument, Error> {
    let root = dom::parse(data)?;
    if root.name != "component" {
        return Err(Error::UnexpectedRoot(root.name));
    }

    let version = root.parse_attr("version", Version::new(1, 0, 0))?;
    let mut warnings = Vec::new();
    if version > FORMAT_VERSION {
        log::warn!("document version {version} is newer than supported");
        warnings.push(Warning::NewerVersion(version));
    }

    let empty = Element::default();
    let declaration = root.child("declaration").unwrap_or(&empty);

    let reader = DocumentReader::new(Grammar::for_version(version), declaration);
    let description = reader.read(&root, declaration)?;

    Ok(XmlDocument {
        version,
        description,
        warnings,
    })
}

struct DocumentReader {
    grammar: Grammar,
    /// Declared property types, known before any condition is parsed.
    types: HashMap<String, PropertyType>,
    /// Decoded icons by resource id.
    resources: RefCell<HashMap<u32, Arc<BinaryResource>>>,
}

impl DocumentReader {
    fn new(grammar: Grammar, declaration: &Element) -> Self {
        let types = declaration
            .elements("property")
            .filter_map(|p| {
                let name = p.attr("name")?;
                let ty = p.attr("type")?.parse().ok()?;
                Some((name.to_owned(), ty))
            })
            .collect();

        Self {
            grammar,
            types,
            resources: RefCell::default(),
        }
    }

    fn read(&self, root: &Element, declaration: &Element) -> Result<ComponentDescription, Error> {
        let mut desc = ComponentDescription::new("", "");

        let mut name = None;
        let mut id = None;
        let mut implements = Implements::default();
        for meta in declaration.elements("meta") {
            let key = meta.required("name")?;
            let value = || meta.required("value");

            match key.to_ascii_lowercase().as_str() {
                "name" => name = Some(value()?.to_owned()),
                "id" => id = Some(value()?.to_owned()),
                "canresize" => desc.can_resize = meta.parse_required::<Bool>("value")?.0,
                "canflip" => desc.can_flip = meta.parse_required::<Bool>("value")?.0,
                "minsize" => desc.min_size = meta.parse_required("value")?,
                "guid" => desc.metadata.guid = meta.parse_required::<Uuid>("value")?,
                "author" => desc.metadata.author = Some(value()?.to_owned()),
                "version" => desc.metadata.version = meta.parse_required("value")?,
                "additionalinformation" => {
                    desc.metadata.additional_information = Some(value()?.to_owned())
                }
                "implementset" => implements.set = value()?.to_owned(),
                "implementitem" => implements.item = value()?.to_owned(),
                "icon" => {
                    let ty = meta.attr("type").unwrap_or(DEFAULT_ICON_TYPE);
                    desc.metadata.icon = Some(self.icon(ty, value()?)?);
                }
                other => log::debug!("ignoring unknown meta '{other}'"),
            }
        }

        desc.name = name.ok_or(Error::MissingName)?;
        desc.id = id.unwrap_or_else(|| desc.name.clone());
        if implements != Implements::default() {
            desc.metadata.implements = Some(implements);
        }

        for property in declaration.elements("property") {
            desc.properties.push(self.property(property)?);
        }

        for flags in declaration.elements("flags") {
            desc.flags.push(FlagRule {
                conditions: self.conditions(flags, "conditions")?,
                value: parse_flags(&flags.text)?,
            });
        }

        if let Some(configurations) = declaration.child("configurations") {
            for config in configurations.elements("configuration") {
                desc.metadata.configurations.push(self.configuration(config)?);
            }
        }

        if let Some(connections) = root.child("connections") {
            desc.connections = self.groups(connections, |this, group| {
                let mut out = ConnectionGroup {
                    conditions: this.conditions(group, "conditions")?,
                    connections: Vec::new(),
                };
                for connection in group.elements("connection") {
                    out.connections.push(read_connection(connection)?);
                }
                Ok(out)
            })?;
        }

        if let Some(render) = root.child("render") {
            desc.render = self.groups(render, |this, group| {
                let mut out = RenderDescription {
                    conditions: this.conditions(group, "conditions")?,
                    commands: Vec::new(),
                };
                for element in &group.children {
                    match read_command(element)? {
                        Some(command) => {
                            if let RenderCommand::Text { runs, .. } = &command {
                                for run in runs {
                                    this.check_references(&run.text)?;
                                }
                            }
                            out.commands.push(command);
                        }
                        None => log::debug!("skipping unknown render element <{}>", element.name),
                    }
                }
                Ok(out)
            })?;
        }

        Ok(desc)
    }

    /// Reads the `<group>` children of a section.
    ///
    /// Other children form an implicit, unconditional group in front.
    fn groups<T, F>(&self, section: &Element, mut read: F) -> Result<Vec<T>, Error>
    where
        F: FnMut(&Self, &Element) -> Result<T, Error>,
    {
        let loose = Element {
            name: "group".into(),
            children: section
                .children
                .iter()
                .filter(|c| c.name != "group")
                .cloned()
                .collect(),
            ..Default::default()
        };

        let mut out = Vec::new();
        if !loose.children.is_empty() {
            out.push(read(self, &loose)?);
        }
        for group in section.elements("group") {
            out.push(read(self, group)?);
        }
        Ok(out)
    }

    fn parse_conditions(&self, text: &str) -> Result<ConditionTree, Error> {
        parse_conditions(text, self.grammar, |name| self.types.get(name).copied()).map_err(
            |source| Error::Condition {
                text: text.to_owned(),
                source,
            },
        )
    }

    /// Rejects text which references undeclared properties.
    fn check_references(&self, text: &str) -> Result<(), Error> {
        match format::references(text)
            .into_iter()
            .find(|name| !self.types.contains_key(*name))
        {
            Some(name) => Err(Error::UndefinedProperty(name.to_owned())),
            None => Ok(()),
        }
    }

    fn conditions(&self, element: &Element, attr: &str) -> Result<ConditionTree, Error> {
        match element.attr(attr) {
            Some(text) => self.parse_conditions(text),
            None => Ok(ConditionTree::Empty),
        }
    }

    fn property(&self, element: &Element) -> Result<ComponentProperty, Error> {
        let name = element.required("name")?;
        let ty: PropertyType = element.parse_required("type")?;

        let default = match element.attr("default") {
            Some(text) => TypedValue::parse(ty, text)?,
            None => TypedValue::default_of(ty),
        };

        let mut property = ComponentProperty::new(name, default);
        if let Some(serialized) = element.attr("serialize") {
            property.serialized_name = serialized.to_owned();
        }
        if let Some(display) = element.attr("display") {
            property.display_name = display.to_owned();
        }

        if let Some(formatting) = element.child("formatting") {
            for rule in formatting.elements("format") {
                let value = rule.required("value")?;
                self.check_references(value)?;
                property.format_rules.push(FormatRule {
                    conditions: self.conditions(rule, "conditions")?,
                    value: value.to_owned(),
                });
            }
        }

        if let Some(other) = element.child("other") {
            property.other_conditions = self.other_conditions(other)?;
        }

        property.enum_options = element
            .elements("option")
            .map(|o| o.text.trim().to_owned())
            .collect();

        Ok(property)
    }

    fn other_conditions(&self, element: &Element) -> Result<OtherConditions, Error> {
        let mut out = OtherConditions::default();
        for conditions in element.elements("conditions") {
            let kind = conditions.required("for")?;
            match OtherConditionKind::from_name(kind) {
                Some(kind) => out.set(kind, self.conditions(conditions, "value")?),
                None => log::debug!("ignoring unknown condition kind '{kind}'"),
            }
        }
        Ok(out)
    }

    /// Decodes an embedded icon.
    ///
    /// The resource id is derived from the data, so identical icons share
    /// one resource. Differing icons whose checksums collide move on to
    /// the next free id.
    fn icon(&self, mime_type: &str, data: &str) -> Result<Icon, Error> {
        let data: String = data.split_whitespace().collect();
        let data = STANDARD.decode(data)?;

        let mut resources = self.resources.borrow_mut();
        let mut id = crc32fast::hash(&data);
        loop {
            match resources.get(&id) {
                Some(r) if r.mime_type == mime_type && r.data == data => {
                    return Ok(Icon::Resource(Arc::clone(r)));
                }
                Some(_) => {
                    log::debug!("icon id {id:#010x} is taken; trying the next one");
                    id = id.wrapping_add(1);
                }
                None => break,
            }
        }

        let resource = Arc::new(BinaryResource {
            id,
            mime_type: mime_type.to_owned(),
            data,
        });
        resources.insert(id, Arc::clone(&resource));

        Ok(Icon::Resource(resource))
    }

    fn configuration(&self, element: &Element) -> Result<ComponentConfiguration, Error> {
        let mut config = ComponentConfiguration {
            name: element.required("name")?.to_owned(),
            implementation_name: element.attr("implements").map(str::to_owned),
            ..Default::default()
        };

        if let Some(data) = element.attr("icon") {
            let ty = element.attr("icon-type").unwrap_or(DEFAULT_ICON_TYPE);
            config.icon = Some(self.icon(ty, data)?);
        }

        for setter in element.elements("setter") {
            let name = setter.required("name")?;
            let ty = self
                .types
                .get(name)
                .ok_or_else(|| Error::UndefinedProperty(name.to_owned()))?;
            let value = TypedValue::parse(*ty, setter.required("value")?)?;
            config.setters.insert(name.to_owned(), value);
        }

        Ok(config)
    }
}

/// The MIME type of icons which do not declare one.
pub const DEFAULT_ICON_TYPE: &str = "image/png";

/// A boolean attribute, accepting the spellings of [`TypedValue::parse`].
struct Bool(bool);

impl std::str::FromStr for Bool {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match TypedValue::parse(PropertyType::Bool, s) {
            Ok(TypedValue::Bool(v)) => Ok(Self(v)),
            _ => Err(()),
        }
    }
}

fn parse_flags(text: &str) -> Result<FlagOptions, Error> {
    text.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .try_fold(FlagOptions::empty(), |acc, name| {
            let flag = match name.strip_prefix("0x").or_else(|| name.strip_prefix("0X")) {
                Some(hex) => u32::from_str_radix(hex, 16)
                    .ok()
                    .map(FlagOptions::from_bits_retain),
                None => FlagOptions::NAMES
                    .iter()
                    .find(|(n, _)| n.eq_ignore_ascii_case(name))
                    .map(|&(_, flag)| flag),
            };
            flag.map(|flag| acc | flag)
                .ok_or_else(|| Error::UnknownFlag(name.to_owned()))
        })
}

fn point(element: &Element, attr: &'static str) -> Result<ComponentPoint, Error> {
    let text = element.required(attr)?;
    parse_point(text).map_err(|source| Error::Point {
        text: text.to_owned(),
        source,
    })
}

fn read_connection(element: &Element) -> Result<ConnectionDescription, Error> {
    Ok(ConnectionDescription {
        start: point(element, "start")?,
        end: point(element, "end")?,
        edge: element.parse_attr("edge", ConnectionEdge::None)?,
        name: element.attr("name").unwrap_or_default().to_owned(),
    })
}

fn text_size(element: &Element, default: f64) -> Result<f64, Error> {
    match element.attr("size") {
        Some("small") => Ok(TEXT_SIZE_SMALL),
        Some("medium") => Ok(TEXT_SIZE_MEDIUM),
        Some("large") => Ok(TEXT_SIZE_LARGE),
        _ => element.parse_attr("size", default),
    }
}

fn text_baseline(element: &Element) -> Result<TextBaseline, Error> {
    match element.attr("baseline") {
        None | Some("normal") => Ok(TextBaseline::Normal),
        Some("subscript") => Ok(TextBaseline::Subscript),
        Some("superscript") => Ok(TextBaseline::Superscript),
        Some(other) => Err(Error::InvalidAttribute {
            element: element.name.clone(),
            attribute: "baseline",
            value: other.to_owned(),
        }),
    }
}

fn read_command(element: &Element) -> Result<Option<RenderCommand>, Error> {
    let thickness = || element.parse_attr("thickness", DEFAULT_THICKNESS);
    let fill = || element.parse_attr::<Bool>("fill", Bool(false)).map(|b| b.0);

    let command = match element.name.as_str() {
        "line" => RenderCommand::Line {
            start: point(element, "start")?,
            end: point(element, "end")?,
            thickness: thickness()?,
        },
        "rect" => RenderCommand::Rect {
            location: point(element, "location")?,
            width: element.parse_required("width")?,
            height: element.parse_required("height")?,
            thickness: thickness()?,
            fill: fill()?,
        },
        "ellipse" => RenderCommand::Ellipse {
            centre: point(element, "centre")?,
            radius_x: element.parse_required("rx")?,
            radius_y: element.parse_required("ry")?,
            thickness: thickness()?,
            fill: fill()?,
        },
        "path" => {
            let data = element.required("data")?;
            RenderCommand::Path {
                start: point(element, "start")?,
                thickness: thickness()?,
                fill: fill()?,
                commands: parse_path(data).map_err(|source| Error::Path {
                    text: data.to_owned(),
                    source,
                })?,
            }
        }
        "text" => {
            let size = text_size(element, TEXT_SIZE_MEDIUM)?;
            let runs = match element.attr("value") {
                Some(value) => vec![TextRun::new(
                    value,
                    TextFormatting {
                        baseline: TextBaseline::Normal,
                        size,
                    },
                )],
                None => element
                    .child("value")
                    .map(|value| {
                        value
                            .elements("span")
                            .map(|span| {
                                let formatting = TextFormatting {
                                    baseline: text_baseline(span)?,
                                    size: text_size(span, size)?,
                                };
                                Ok(TextRun::new(span.text.clone(), formatting))
                            })
                            .collect::<Result<Vec<_>, Error>>()
                    })
                    .transpose()?
                    .unwrap_or_default(),
            };

            RenderCommand::Text {
                location: point(element, "location")?,
                alignment: element.parse_attr("align", TextAlignment::Centre)?,
                runs,
            }
        }
        _ => return Ok(None),
    };

    Ok(Some(command))
}
