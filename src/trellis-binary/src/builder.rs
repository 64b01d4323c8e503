use std::{collections::HashSet, io, sync::Arc};

use trellis_description::{BinaryResource, ComponentDescription};
use trellis_utils::binary;

use crate::{
    codec::Encoding,
    component,
    header::{Header, SignatureBlock},
    signing::SigningKey,
    Error, ItemType, CURRENT_VERSION,
};

/// Options for [`write_binary`].
#[derive(Clone)]
pub struct WriteOptions {
    /// The container format version to write.
    pub version: u8,
    /// The key to sign the content with, if any.
    pub signing_key: Option<SigningKey>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            signing_key: None,
        }
    }
}

/// A builder for programatically assembling containers.
///
/// Items are encoded as they are added; [`ContainerBuilder::finish`]
/// computes the header and optionally signs the content.
pub struct ContainerBuilder {
    enc: Encoding,
    content: Vec<u8>,
    item_count: u32,
    resources: HashSet<u32>,
}

impl ContainerBuilder {
    /// Creates a builder for the current format version.
    pub fn new() -> Self {
        Self {
            enc: Encoding {
                version: CURRENT_VERSION,
            },
            content: Vec::new(),
            item_count: 0,
            resources: HashSet::new(),
        }
    }

    /// Creates a builder for an older format version.
    pub fn with_version(version: u8) -> Result<Self, Error> {
        if version == 0 || version > CURRENT_VERSION {
            return Err(Error::UnsupportedVersion(version));
        }

        let mut this = Self::new();
        this.enc.version = version;
        Ok(this)
    }

    /// The format version this builder writes.
    #[inline]
    pub fn version(&self) -> u8 {
        self.enc.version
    }

    fn push_item<F>(&mut self, tag: u16, f: F) -> Result<(), Error>
    where
        F: FnOnce(&mut Vec<u8>) -> io::Result<()>,
    {
        let item_count = self.item_count.checked_add(1).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "too many container items")
        })?;

        binary::write_block(&mut self.content, tag, f)?;
        self.item_count = item_count;

        Ok(())
    }

    /// Adds an embedded resource.
    pub fn add_resource(&mut self, resource: &BinaryResource) -> Result<&mut Self, Error> {
        if !self.resources.insert(resource.id) {
            return Err(Error::DuplicateResource(resource.id));
        }

        self.push_item(ItemType::Resource as u16, |w| {
            binary::write_uint32(w, resource.id)?;
            binary::write_str(w, &resource.mime_type)?;
            binary::write_prefixed_bytes(w, &resource.data)
        })?;

        Ok(self)
    }

    /// Adds a component description.
    ///
    /// Icons which hold a resource that was not added yet embed it
    /// into the container.
    pub fn add_component(&mut self, description: &ComponentDescription) -> Result<&mut Self, Error> {
        if !self.enc.condition_trees()
            && description
                .condition_trees()
                .any(|t| t.to_collection().is_none())
        {
            return Err(Error::NotFlat(description.id.clone()));
        }

        for icon in description.icons() {
            if let Some(resource) = icon.resource() {
                if !self.resources.contains(&resource.id) {
                    self.add_resource(resource)?;
                }
            }
        }

        let enc = self.enc;
        self.push_item(ItemType::Component as u16, |w| {
            component::write_component(w, enc, description)
        })?;

        Ok(self)
    }

    /// Adds an item with a caller-encoded body.
    ///
    /// Readers skip item types they do not know, so this can be used to
    /// carry application data alongside descriptions.
    pub fn add_raw_item(&mut self, tag: u16, body: &[u8]) -> Result<&mut Self, Error> {
        self.push_item(tag, |w| {
            w.extend_from_slice(body);
            Ok(())
        })?;

        Ok(self)
    }

    /// Finishes the container and returns its bytes.
    pub fn finish(self, signing_key: Option<&SigningKey>) -> Result<Vec<u8>, Error> {
        let signature = match signing_key {
            Some(key) => Some(SignatureBlock {
                signature: key.sign(&self.content),
                certificate: key.certificate()?.into_bytes(),
            }),
            None => None,
        };

        let header = Header::new(self.enc.version, &self.content, self.item_count, signature)?;

        let mut out = Vec::with_capacity(header.binary_size() + self.content.len());
        header.write(&mut out)?;
        out.extend_from_slice(&self.content);

        Ok(out)
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes descriptions and resources into a new container.
///
/// Resources are written first, in order, followed by the descriptions.
pub fn write_binary(
    descriptions: &[ComponentDescription],
    resources: &[Arc<BinaryResource>],
    options: &WriteOptions,
) -> Result<Vec<u8>, Error> {
    let mut builder = ContainerBuilder::with_version(options.version)?;

    for resource in resources {
        builder.add_resource(resource)?;
    }
    for description in descriptions {
        builder.add_component(description)?;
    }

    log::debug!(
        "writing version {} container with {} items",
        builder.version(),
        builder.item_count
    );
    builder.finish(options.signing_key.as_ref())
}
