//! A minimal element tree built from the XML event stream.

use std::str::FromStr;

use quick_xml::{
    escape::unescape,
    events::{BytesStart, Event},
    Reader,
};

use crate::Error;

/// An XML element with its attributes, child elements and text content.
#[derive(Clone, Debug, Default)]
pub(crate) struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    pub text: String,
}

fn utf8(bytes: &[u8]) -> Result<&str, Error> {
    std::str::from_utf8(bytes).map_err(|e| Error::Malformed(e.to_string()))
}

fn resolve_reference(name: &str) -> Result<char, Error> {
    let invalid = || Error::Malformed(format!("unknown entity '&{name};'"));

    let code = match name {
        "lt" => return Ok('<'),
        "gt" => return Ok('>'),
        "amp" => return Ok('&'),
        "apos" => return Ok('\''),
        "quot" => return Ok('"'),
        _ => match name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => name.strip_prefix('#').ok_or_else(invalid)?.parse(),
        },
    };

    code.ok()
        .and_then(char::from_u32)
        .ok_or_else(invalid)
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> Result<Self, Error> {
        let mut element = Self {
            name: utf8(start.local_name().as_ref())?.to_owned(),
            ..Default::default()
        };

        for attr in start.attributes() {
            let attr = attr.map_err(|e| Error::Malformed(e.to_string()))?;
            let key = utf8(attr.key.local_name().as_ref())?.to_owned();
            let value = unescape(utf8(&attr.value)?)
                .map_err(|e| Error::Malformed(e.to_string()))?
                .into_owned();
            element.attributes.push((key, value));
        }

        Ok(element)
    }

    /// Gets the value of an attribute.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Gets the value of an attribute which must be present.
    pub fn required(&self, name: &'static str) -> Result<&str, Error> {
        self.attr(name).ok_or_else(|| Error::MissingAttribute {
            element: self.name.clone(),
            attribute: name,
        })
    }

    /// Parses an optional attribute, falling back to `default`.
    pub fn parse_attr<T: FromStr>(&self, name: &'static str, default: T) -> Result<T, Error> {
        match self.attr(name) {
            Some(value) => self.parse_value(name, value),
            None => Ok(default),
        }
    }

    /// Parses a mandatory attribute.
    pub fn parse_required<T: FromStr>(&self, name: &'static str) -> Result<T, Error> {
        self.parse_value(name, self.required(name)?)
    }

    fn parse_value<T: FromStr>(&self, name: &'static str, value: &str) -> Result<T, Error> {
        value.trim().parse().map_err(|_| Error::InvalidAttribute {
            element: self.name.clone(),
            attribute: name,
            value: value.to_owned(),
        })
    }

    /// Iterates over the child elements with a given name.
    pub fn elements<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Gets the first child element with a given name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }
}

fn push_text(stack: &mut [Element], text: &str) {
    // Text outside of the root element is insignificant.
    if let Some(top) = stack.last_mut() {
        top.text.push_str(text);
    }
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<(), Error> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(Error::Malformed("multiple root elements".into())),
    }
    Ok(())
}

/// Parses a document into its root element.
pub(crate) fn parse(data: &[u8]) -> Result<Element, Error> {
    let mut reader = Reader::from_reader(data);
    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(Element::from_start(&start)?),
            Event::Empty(start) => {
                let element = Element::from_start(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(..) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| Error::Malformed("unbalanced end tag".into()))?;
                attach(&mut stack, &mut root, element)?;
            }

            Event::Text(text) => push_text(&mut stack, utf8(&text)?),
            Event::CData(data) => push_text(&mut stack, utf8(&data)?),
            Event::GeneralRef(reference) => {
                let c = resolve_reference(utf8(&reference)?)?;
                push_text(&mut stack, c.encode_utf8(&mut [0; 4]));
            }

            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(Error::Malformed("unclosed element".into()));
    }
    root.ok_or_else(|| Error::Malformed("no root element".into()))
}
