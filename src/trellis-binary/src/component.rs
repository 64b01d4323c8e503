//! Component items and their sections.

use std::io;

use trellis_description::{
    connection::{ConnectionDescription, ConnectionEdge, ConnectionGroup},
    property::{ComponentProperty, FormatRule, OtherConditionKind, OtherConditions},
    render::RenderDescription,
    ComponentConfiguration, ComponentDescription, ComponentDescriptionMetadata, FlagOptions,
    FlagRule, Icon, Implements, PropertySet, Version,
};
use trellis_utils::binary;
use uuid::Uuid;

use crate::codec::{self, Encoding};

/// Type tags of the sections in a component item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u16)]
pub enum SectionType {
    Metadata = 1,
    Flags = 2,
    Properties = 3,
    Configurations = 4,
    Connections = 5,
    Render = 6,
}

impl SectionType {
    pub fn from_tag(tag: u16) -> Option<Self> {
        Some(match tag {
            1 => Self::Metadata,
            2 => Self::Flags,
            3 => Self::Properties,
            4 => Self::Configurations,
            5 => Self::Connections,
            6 => Self::Render,
            _ => return None,
        })
    }
}

/// Parses the body of a component item.
///
/// Sections may come in any order; unknown ones are skipped.
pub fn parse_component(mut data: &[u8], enc: Encoding) -> io::Result<ComponentDescription> {
    let id = binary::str(&mut data)?;
    let name = binary::str(&mut data)?;

    let mut desc = ComponentDescription::new(id, name);
    desc.can_resize = binary::boolean(&mut data)?;
    desc.can_flip = binary::boolean(&mut data)?;
    desc.min_size = binary::float64(&mut data)?;

    while !data.is_empty() {
        let section = binary::block(&mut data)?;
        let mut body = section.body;

        match SectionType::from_tag(section.tag) {
            Some(SectionType::Metadata) => parse_metadata(&mut body, &mut desc.metadata)?,
            Some(SectionType::Flags) => {
                desc.flags = binary::prefixed_seq(&mut body, |r| parse_flag_rule(r, enc))?
            }
            Some(SectionType::Properties) => {
                desc.properties = binary::prefixed_seq(&mut body, |r| parse_property(r, enc))?
            }
            Some(SectionType::Configurations) => {
                desc.metadata.configurations =
                    binary::prefixed_seq(&mut body, parse_configuration)?
            }
            Some(SectionType::Connections) => {
                desc.connections =
                    binary::prefixed_seq(&mut body, |r| parse_connection_group(r, enc))?
            }
            Some(SectionType::Render) => {
                desc.render = binary::prefixed_seq(&mut body, |r| parse_render_group(r, enc))?
            }
            None => {
                log::debug!(
                    "'{}': skipping unknown section {} ({} bytes)",
                    desc.id,
                    section.tag,
                    section.body.len()
                );
                continue;
            }
        }

        if !body.is_empty() {
            log::debug!(
                "'{}': ignoring {} trailing bytes in section {}",
                desc.id,
                body.len(),
                section.tag
            );
        }
    }

    Ok(desc)
}

/// Writes the body of a component item.
///
/// Empty sections are omitted.
pub fn write_component<W: io::Write>(
    writer: &mut W,
    enc: Encoding,
    desc: &ComponentDescription,
) -> io::Result<()> {
    binary::write_str(writer, &desc.id)?;
    binary::write_str(writer, &desc.name)?;
    binary::write_boolean(writer, desc.can_resize)?;
    binary::write_boolean(writer, desc.can_flip)?;
    binary::write_float64(writer, desc.min_size)?;

    binary::write_block(writer, SectionType::Metadata as u16, |w| {
        write_metadata(w, &desc.metadata)
    })?;

    if !desc.flags.is_empty() {
        binary::write_block(writer, SectionType::Flags as u16, |w| {
            binary::write_seq(w, true, &desc.flags, |w, r| write_flag_rule(w, enc, r))
        })?;
    }
    if !desc.properties.is_empty() {
        binary::write_block(writer, SectionType::Properties as u16, |w| {
            binary::write_seq(w, true, &desc.properties, |w, p| write_property(w, enc, p))
        })?;
    }
    if !desc.metadata.configurations.is_empty() {
        binary::write_block(writer, SectionType::Configurations as u16, |w| {
            binary::write_seq(w, true, &desc.metadata.configurations, write_configuration)
        })?;
    }
    if !desc.connections.is_empty() {
        binary::write_block(writer, SectionType::Connections as u16, |w| {
            binary::write_seq(w, true, &desc.connections, |w, g| {
                write_connection_group(w, enc, g)
            })
        })?;
    }
    if !desc.render.is_empty() {
        binary::write_block(writer, SectionType::Render as u16, |w| {
            binary::write_seq(w, true, &desc.render, |w, g| write_render_group(w, enc, g))
        })?;
    }

    Ok(())
}

fn parse_icon<R: io::Read>(reader: &mut R) -> io::Result<Option<Icon>> {
    if binary::boolean(reader)? {
        binary::uint32(reader).map(|id| Some(Icon::Id(id)))
    } else {
        Ok(None)
    }
}

fn write_icon<W: io::Write>(writer: &mut W, icon: Option<&Icon>) -> io::Result<()> {
    binary::write_boolean(writer, icon.is_some())?;
    match icon {
        Some(icon) => binary::write_uint32(writer, icon.resource_id()),
        None => Ok(()),
    }
}

fn parse_metadata<R: io::Read>(
    reader: &mut R,
    meta: &mut ComponentDescriptionMetadata,
) -> io::Result<()> {
    meta.guid = Uuid::from_bytes(binary::array(reader)?);
    meta.author = binary::opt_str(reader)?;
    meta.version = Version::new(
        binary::uint16(reader)?,
        binary::uint16(reader)?,
        binary::uint16(reader)?,
    );
    meta.additional_information = binary::opt_str(reader)?;
    meta.implements = if binary::boolean(reader)? {
        Some(Implements {
            set: binary::str(reader)?,
            item: binary::str(reader)?,
        })
    } else {
        None
    };
    meta.icon = parse_icon(reader)?;

    Ok(())
}

fn write_metadata<W: io::Write>(
    writer: &mut W,
    meta: &ComponentDescriptionMetadata,
) -> io::Result<()> {
    writer.write_all(meta.guid.as_bytes())?;
    binary::write_opt_str(writer, meta.author.as_deref())?;
    binary::write_uint16(writer, meta.version.major)?;
    binary::write_uint16(writer, meta.version.minor)?;
    binary::write_uint16(writer, meta.version.patch)?;
    binary::write_opt_str(writer, meta.additional_information.as_deref())?;

    binary::write_boolean(writer, meta.implements.is_some())?;
    if let Some(implements) = &meta.implements {
        binary::write_str(writer, &implements.set)?;
        binary::write_str(writer, &implements.item)?;
    }

    write_icon(writer, meta.icon.as_ref())
}

fn parse_flag_rule<R: io::Read>(reader: &mut R, enc: Encoding) -> io::Result<FlagRule> {
    Ok(FlagRule {
        conditions: codec::parse_conditions(reader, enc)?,
        // Keep bits of flags this version does not know about.
        value: FlagOptions::from_bits_retain(binary::uint32(reader)?),
    })
}

fn write_flag_rule<W: io::Write>(writer: &mut W, enc: Encoding, rule: &FlagRule) -> io::Result<()> {
    codec::write_conditions(writer, enc, &rule.conditions)?;
    binary::write_uint32(writer, rule.value.bits())
}

fn parse_property<R: io::Read>(reader: &mut R, enc: Encoding) -> io::Result<ComponentProperty> {
    let name = binary::str(reader)?;
    let serialized_name = binary::str(reader)?;
    let display_name = binary::str(reader)?;
    let ty = codec::parse_type(reader)?;
    let default = codec::parse_value(reader)?;

    let format_rules = binary::prefixed_seq(reader, |r| {
        Ok(FormatRule {
            conditions: codec::parse_conditions(r, enc)?,
            value: binary::str(r)?,
        })
    })?;

    let mut other_conditions = OtherConditions::default();
    let count = binary::uint32(reader)?;
    for _ in 0..count {
        let kind = match binary::uint8(reader)? {
            0 => OtherConditionKind::Visible,
            1 => OtherConditionKind::ReadOnly,
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "Received invalid other condition kind",
                ))
            }
        };
        other_conditions.set(kind, codec::parse_conditions(reader, enc)?);
    }

    let enum_options = binary::prefixed_seq(reader, binary::str)?;

    Ok(ComponentProperty {
        name,
        serialized_name,
        display_name,
        ty,
        default,
        format_rules,
        other_conditions,
        enum_options,
    })
}

fn write_property<W: io::Write>(
    writer: &mut W,
    enc: Encoding,
    prop: &ComponentProperty,
) -> io::Result<()> {
    binary::write_str(writer, &prop.name)?;
    binary::write_str(writer, &prop.serialized_name)?;
    binary::write_str(writer, &prop.display_name)?;
    codec::write_type(writer, prop.ty)?;
    codec::write_value(writer, &prop.default)?;

    binary::write_seq(writer, true, &prop.format_rules, |w, r| {
        codec::write_conditions(w, enc, &r.conditions)?;
        binary::write_str(w, &r.value)
    })?;

    let others: Vec<_> = prop.other_conditions.iter().collect();
    binary::write_seq(writer, true, &others, |w, (kind, tree)| {
        binary::write_uint8(
            w,
            match kind {
                OtherConditionKind::Visible => 0,
                OtherConditionKind::ReadOnly => 1,
            },
        )?;
        codec::write_conditions(w, enc, tree)
    })?;

    binary::write_seq(writer, true, &prop.enum_options, |w, o| binary::write_str(w, o))
}

fn parse_configuration<R: io::Read>(reader: &mut R) -> io::Result<ComponentConfiguration> {
    let name = binary::str(reader)?;
    let implementation_name = binary::opt_str(reader)?;
    let icon = parse_icon(reader)?;

    let count = binary::uint32(reader)?;
    let mut setters = PropertySet::with_capacity((count as usize).min(64));
    for _ in 0..count {
        let key = binary::str(reader)?;
        let value = codec::parse_value(reader)?;
        setters.insert(key, value);
    }

    Ok(ComponentConfiguration {
        name,
        implementation_name,
        icon,
        setters,
    })
}

fn write_configuration<W: io::Write>(
    writer: &mut W,
    config: &ComponentConfiguration,
) -> io::Result<()> {
    binary::write_str(writer, &config.name)?;
    binary::write_opt_str(writer, config.implementation_name.as_deref())?;
    write_icon(writer, config.icon.as_ref())?;

    binary::write_uint32(writer, binary::checked_len(config.setters.len())?)?;
    for (key, value) in &config.setters {
        binary::write_str(writer, key)?;
        codec::write_value(writer, value)?;
    }

    Ok(())
}

fn parse_connection_group<R: io::Read>(
    reader: &mut R,
    enc: Encoding,
) -> io::Result<ConnectionGroup> {
    let conditions = codec::parse_conditions(reader, enc)?;
    let connections = binary::prefixed_seq(reader, |r| {
        Ok(ConnectionDescription {
            start: codec::parse_point(r)?,
            end: codec::parse_point(r)?,
            edge: match binary::uint8(r)? {
                0 => ConnectionEdge::None,
                1 => ConnectionEdge::Start,
                2 => ConnectionEdge::End,
                3 => ConnectionEdge::Both,
                _ => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        "Received invalid connection edge",
                    ))
                }
            },
            name: binary::str(r)?,
        })
    })?;

    Ok(ConnectionGroup {
        conditions,
        connections,
    })
}

fn write_connection_group<W: io::Write>(
    writer: &mut W,
    enc: Encoding,
    group: &ConnectionGroup,
) -> io::Result<()> {
    codec::write_conditions(writer, enc, &group.conditions)?;
    binary::write_seq(writer, true, &group.connections, |w, c| {
        codec::write_point(w, &c.start)?;
        codec::write_point(w, &c.end)?;
        binary::write_uint8(
            w,
            match c.edge {
                ConnectionEdge::None => 0,
                ConnectionEdge::Start => 1,
                ConnectionEdge::End => 2,
                ConnectionEdge::Both => 3,
            },
        )?;
        binary::write_str(w, &c.name)
    })
}

fn parse_render_group<R: io::Read>(reader: &mut R, enc: Encoding) -> io::Result<RenderDescription> {
    Ok(RenderDescription {
        conditions: codec::parse_conditions(reader, enc)?,
        commands: binary::prefixed_seq(reader, codec::parse_render_command)?,
    })
}

fn write_render_group<W: io::Write>(
    writer: &mut W,
    enc: Encoding,
    group: &RenderDescription,
) -> io::Result<()> {
    codec::write_conditions(writer, enc, &group.conditions)?;
    binary::write_seq(writer, true, &group.commands, codec::write_render_command)
}
