use base64::{engine::general_purpose::STANDARD, Engine};
use quick_xml::{
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
    Writer,
};
use trellis_description::{
    connection::ConnectionDescription,
    property::ComponentProperty,
    render::{
        RenderCommand, TextBaseline, TextRun, TEXT_SIZE_LARGE, TEXT_SIZE_MEDIUM, TEXT_SIZE_SMALL,
    },
    ComponentConfiguration, ComponentDescription, ConditionTree, FlagOptions, Icon, Version,
};

use crate::{
    condition::format_conditions, path::format_path, point::format_point, Error, FORMAT_VERSION,
    NAMESPACE,
};

type Attributes = Vec<(&'static str, String)>;

struct XmlWriter {
    inner: Writer<Vec<u8>>,
}

impl XmlWriter {
    fn element(name: &str, attributes: &Attributes) -> BytesStart<'static> {
        let mut start = BytesStart::new(name.to_owned());
        for (key, value) in attributes {
            start.push_attribute((*key, value.as_str()));
        }
        start
    }

    fn empty(&mut self, name: &str, attributes: Attributes) -> Result<(), Error> {
        self.inner
            .write_event(Event::Empty(Self::element(name, &attributes)))?;
        Ok(())
    }

    fn start(&mut self, name: &str, attributes: Attributes) -> Result<(), Error> {
        self.inner
            .write_event(Event::Start(Self::element(name, &attributes)))?;
        Ok(())
    }

    fn end(&mut self, name: &str) -> Result<(), Error> {
        self.inner.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    fn text_element(
        &mut self,
        name: &str,
        attributes: Attributes,
        text: &str,
    ) -> Result<(), Error> {
        self.start(name, attributes)?;
        self.inner.write_event(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    fn meta(&mut self, name: &str, value: impl ToString) -> Result<(), Error> {
        self.empty(
            "meta",
            vec![("name", name.to_owned()), ("value", value.to_string())],
        )
    }
}

fn conditions(attributes: &mut Attributes, key: &'static str, tree: &ConditionTree) {
    if let Some(text) = format_conditions(tree) {
        attributes.push((key, text));
    }
}

fn icon_data(icon: &Icon, component: &str) -> Option<(String, String)> {
    match icon.resource() {
        Some(resource) => Some((resource.mime_type.clone(), STANDARD.encode(&resource.data))),
        None => {
            log::warn!(
                "'{component}' references unresolved resource {}; skipping icon",
                icon.resource_id()
            );
            None
        }
    }
}

fn format_version(version: Version) -> String {
    format!("{}.{}", version.major, version.minor)
}

fn flag_names(flags: FlagOptions) -> String {
    let mut names: Vec<String> = FlagOptions::NAMES
        .iter()
        .filter(|(_, flag)| flags.contains(*flag))
        .map(|(name, _)| (*name).to_owned())
        .collect();

    // Bits without a name are kept as a hex term.
    let unknown = flags.bits() & !FlagOptions::all().bits();
    if unknown != 0 {
        names.push(format!("{unknown:#x}"));
    }

    names.join(",")
}

fn size_name(size: f64) -> String {
    if size == TEXT_SIZE_SMALL {
        "small".into()
    } else if size == TEXT_SIZE_MEDIUM {
        "medium".into()
    } else if size == TEXT_SIZE_LARGE {
        "large".into()
    } else {
        size.to_string()
    }
}

fn baseline_name(baseline: TextBaseline) -> &'static str {
    match baseline {
        TextBaseline::Normal => "normal",
        TextBaseline::Subscript => "subscript",
        TextBaseline::Superscript => "superscript",
    }
}

/// Writes a description as an XML document of the current version.
pub fn write_xml(description: &ComponentDescription) -> Result<String, Error> {
    let mut w = XmlWriter {
        inner: Writer::new_with_indent(Vec::new(), b' ', 2),
    };

    w.inner
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    w.start(
        "component",
        vec![
            ("version", format_version(FORMAT_VERSION)),
            ("xmlns", NAMESPACE.to_owned()),
        ],
    )?;

    write_declaration(&mut w, description)?;

    w.start("connections", vec![])?;
    for group in &description.connections {
        let mut attributes = vec![];
        conditions(&mut attributes, "conditions", &group.conditions);
        w.start("group", attributes)?;
        for connection in &group.connections {
            write_connection(&mut w, connection)?;
        }
        w.end("group")?;
    }
    w.end("connections")?;

    w.start("render", vec![])?;
    for group in &description.render {
        let mut attributes = vec![];
        conditions(&mut attributes, "conditions", &group.conditions);
        w.start("group", attributes)?;
        for command in &group.commands {
            write_command(&mut w, command)?;
        }
        w.end("group")?;
    }
    w.end("render")?;

    w.end("component")?;

    String::from_utf8(w.inner.into_inner()).map_err(|e| Error::Malformed(e.to_string()))
}

fn write_declaration(w: &mut XmlWriter, desc: &ComponentDescription) -> Result<(), Error> {
    let meta = &desc.metadata;

    w.start("declaration", vec![])?;
    w.meta("name", &desc.name)?;
    w.meta("id", &desc.id)?;
    w.meta("canresize", desc.can_resize)?;
    w.meta("canflip", desc.can_flip)?;
    w.meta("minsize", desc.min_size)?;
    if !meta.guid.is_nil() {
        w.meta("guid", meta.guid)?;
    }
    if let Some(author) = &meta.author {
        w.meta("author", author)?;
    }
    w.meta("version", meta.version)?;
    if let Some(info) = &meta.additional_information {
        w.meta("additionalinformation", info)?;
    }
    if let Some(implements) = &meta.implements {
        w.meta("implementset", &implements.set)?;
        w.meta("implementitem", &implements.item)?;
    }
    if let Some((ty, data)) = meta.icon.as_ref().and_then(|i| icon_data(i, &desc.id)) {
        w.empty(
            "meta",
            vec![("name", "icon".into()), ("type", ty), ("value", data)],
        )?;
    }

    for property in &desc.properties {
        write_property(w, property)?;
    }

    for rule in &desc.flags {
        let mut attributes = vec![];
        conditions(&mut attributes, "conditions", &rule.conditions);
        w.text_element("flags", attributes, &flag_names(rule.value))?;
    }

    if !meta.configurations.is_empty() {
        w.start("configurations", vec![])?;
        for config in &meta.configurations {
            write_configuration(w, config, &desc.id)?;
        }
        w.end("configurations")?;
    }

    w.end("declaration")
}

fn write_property(w: &mut XmlWriter, property: &ComponentProperty) -> Result<(), Error> {
    w.start(
        "property",
        vec![
            ("name", property.name.clone()),
            ("serialize", property.serialized_name.clone()),
            ("display", property.display_name.clone()),
            ("type", property.ty.name().to_owned()),
            ("default", property.default.to_string()),
        ],
    )?;

    if !property.format_rules.is_empty() {
        w.start("formatting", vec![])?;
        for rule in &property.format_rules {
            let mut attributes = vec![];
            conditions(&mut attributes, "conditions", &rule.conditions);
            attributes.push(("value", rule.value.clone()));
            w.empty("format", attributes)?;
        }
        w.end("formatting")?;
    }

    let mut other = property.other_conditions.iter().peekable();
    if other.peek().is_some() {
        w.start("other", vec![])?;
        for (kind, tree) in other {
            w.empty(
                "conditions",
                vec![
                    ("for", kind.name().to_owned()),
                    ("value", format_conditions(tree).unwrap_or_default()),
                ],
            )?;
        }
        w.end("other")?;
    }

    for option in &property.enum_options {
        w.text_element("option", vec![], option)?;
    }

    w.end("property")
}

fn write_configuration(
    w: &mut XmlWriter,
    config: &ComponentConfiguration,
    component: &str,
) -> Result<(), Error> {
    let mut attributes = vec![("name", config.name.clone())];
    if let Some(implementation) = &config.implementation_name {
        attributes.push(("implements", implementation.clone()));
    }
    if let Some((ty, data)) = config.icon.as_ref().and_then(|i| icon_data(i, component)) {
        attributes.push(("icon-type", ty));
        attributes.push(("icon", data));
    }

    w.start("configuration", attributes)?;
    for (name, value) in &config.setters {
        w.empty(
            "setter",
            vec![("name", name.clone()), ("value", value.to_string())],
        )?;
    }
    w.end("configuration")
}

fn write_connection(w: &mut XmlWriter, connection: &ConnectionDescription) -> Result<(), Error> {
    w.empty(
        "connection",
        vec![
            ("start", format_point(&connection.start)),
            ("end", format_point(&connection.end)),
            ("edge", connection.edge.name().to_owned()),
            ("name", connection.name.clone()),
        ],
    )
}

fn write_text(w: &mut XmlWriter, mut attributes: Attributes, runs: &[TextRun]) -> Result<(), Error> {
    if let [run] = runs {
        if run.formatting.baseline == TextBaseline::Normal {
            attributes.push(("size", size_name(run.formatting.size)));
            attributes.push(("value", run.text.clone()));
            return w.empty("text", attributes);
        }
    }

    w.start("text", attributes)?;
    w.start("value", vec![])?;
    for run in runs {
        w.text_element(
            "span",
            vec![
                ("baseline", baseline_name(run.formatting.baseline).to_owned()),
                ("size", size_name(run.formatting.size)),
            ],
            &run.text,
        )?;
    }
    w.end("value")?;
    w.end("text")
}

fn write_command(w: &mut XmlWriter, command: &RenderCommand) -> Result<(), Error> {
    match command {
        RenderCommand::Line {
            start,
            end,
            thickness,
        } => w.empty(
            "line",
            vec![
                ("start", format_point(start)),
                ("end", format_point(end)),
                ("thickness", thickness.to_string()),
            ],
        ),

        RenderCommand::Rect {
            location,
            width,
            height,
            thickness,
            fill,
        } => w.empty(
            "rect",
            vec![
                ("location", format_point(location)),
                ("width", width.to_string()),
                ("height", height.to_string()),
                ("thickness", thickness.to_string()),
                ("fill", fill.to_string()),
            ],
        ),

        RenderCommand::Ellipse {
            centre,
            radius_x,
            radius_y,
            thickness,
            fill,
        } => w.empty(
            "ellipse",
            vec![
                ("centre", format_point(centre)),
                ("rx", radius_x.to_string()),
                ("ry", radius_y.to_string()),
                ("thickness", thickness.to_string()),
                ("fill", fill.to_string()),
            ],
        ),

        RenderCommand::Path {
            start,
            thickness,
            fill,
            commands,
        } => w.empty(
            "path",
            vec![
                ("start", format_point(start)),
                ("data", format_path(commands)),
                ("thickness", thickness.to_string()),
                ("fill", fill.to_string()),
            ],
        ),

        RenderCommand::Text {
            location,
            alignment,
            runs,
        } => write_text(
            w,
            vec![
                ("location", format_point(location)),
                ("align", alignment.name().to_owned()),
            ],
            runs,
        ),
    }
}
