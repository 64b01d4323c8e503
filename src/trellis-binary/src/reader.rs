use std::{collections::HashMap, sync::Arc};

use trellis_description::{
    BinaryResource, ComponentDescription, DescriptionRegistry, Icon, SignatureStatus,
};
use trellis_utils::binary;

use crate::{
    codec::Encoding,
    component,
    header::{self, Header, SignatureBlock},
    signing::{self, TrustStore},
    Error, FormatError, ItemType, Warning,
};

/// The result of loading a container.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedContainer {
    /// The format version the container was written with.
    pub version: u8,
    pub descriptions: Vec<ComponentDescription>,
    pub resources: Vec<Arc<BinaryResource>>,
    /// The signature status shared by every description.
    pub signature: SignatureStatus,
    /// Non-fatal problems found while loading.
    pub warnings: Vec<Warning>,
}

impl LoadedContainer {
    /// Gets an embedded resource by id.
    pub fn resource(&self, id: u32) -> Option<&Arc<BinaryResource>> {
        self.resources.iter().find(|r| r.id == id)
    }

    /// Moves the loaded descriptions into a registry.
    pub fn into_registry(self) -> DescriptionRegistry {
        self.descriptions.into_iter().map(Arc::new).collect()
    }
}

/// Loads a container from its raw bytes.
///
/// Signatures are checked against `trust` when given; without a trust
/// store no certificate is considered trusted. Signature and integrity
/// problems are reported as [`Warning`]s, not errors.
pub fn load_binary(data: &[u8], trust: Option<&TrustStore>) -> Result<LoadedContainer, Error> {
    let mut cursor = data;
    let header = Header::parse(&mut cursor)?;

    let mut warnings = Vec::new();
    if header.is_newer() {
        log::warn!(
            "container version {} is newer than supported; decoding as {}",
            header.version,
            crate::CURRENT_VERSION
        );
        warnings.push(Warning::NewerVersion(header.version));
    }

    let content = content_slice(data, &header)?;
    if header::content_hash(content) != header.content_hash {
        log::warn!("container content hash does not match");
        warnings.push(Warning::HashMismatch);
    }

    let signature = verify_signature(header.signature.as_ref(), content, trust, &mut warnings);

    let enc = Encoding {
        version: header.version,
    };
    let (mut descriptions, resources) = parse_items(content, header.item_count, enc)?;

    resolve_resources(&mut descriptions, &resources, &mut warnings);
    for desc in &mut descriptions {
        desc.metadata.signature = signature.clone();
    }

    Ok(LoadedContainer {
        version: header.version,
        descriptions,
        resources,
        signature,
        warnings,
    })
}

fn content_slice<'a>(data: &'a [u8], header: &Header) -> Result<&'a [u8], FormatError> {
    let total = header.total_length as usize;
    let offset = header.content_offset as usize;

    if total > data.len() {
        return Err(FormatError::Truncated);
    }
    if offset < header.binary_size() || offset > total {
        return Err(FormatError::InvalidHeader("content offset out of range"));
    }
    if total < data.len() {
        log::debug!("ignoring {} bytes after the container", data.len() - total);
    }

    Ok(&data[offset..total])
}

fn verify_signature(
    block: Option<&SignatureBlock>,
    content: &[u8],
    trust: Option<&TrustStore>,
    warnings: &mut Vec<Warning>,
) -> SignatureStatus {
    let Some(block) = block else {
        return SignatureStatus::default();
    };

    let signature_valid = signing::verify(&block.certificate, content, &block.signature);
    if !signature_valid {
        log::warn!("container signature is invalid");
        warnings.push(Warning::InvalidSignature);
    }

    let certificate_trusted = trust.is_some_and(|t| t.is_trusted(&block.certificate));
    if !certificate_trusted {
        log::warn!("container is signed by an untrusted certificate");
        warnings.push(Warning::UntrustedCertificate);
    }

    SignatureStatus {
        is_signed: true,
        signature_valid,
        certificate_trusted,
        certificate: Some(block.certificate.clone()),
    }
}

fn parse_resource(mut data: &[u8]) -> Result<BinaryResource, FormatError> {
    Ok(BinaryResource {
        id: binary::uint32(&mut data)?,
        mime_type: binary::str(&mut data)?,
        data: binary::prefixed_bytes(&mut data)?,
    })
}

type Items = (Vec<ComponentDescription>, Vec<Arc<BinaryResource>>);

fn parse_items(mut content: &[u8], count: u32, enc: Encoding) -> Result<Items, FormatError> {
    let mut descriptions = Vec::new();
    let mut resources = Vec::new();

    for _ in 0..count {
        let item = binary::block(&mut content)?;
        match ItemType::from_tag(item.tag) {
            Some(ItemType::Resource) => resources.push(Arc::new(parse_resource(item.body)?)),
            Some(ItemType::Component) => {
                descriptions.push(component::parse_component(item.body, enc)?)
            }
            None => log::debug!(
                "skipping unknown item type {} ({} bytes)",
                item.tag,
                item.body.len()
            ),
        }
    }

    if !content.is_empty() {
        log::debug!("ignoring {} bytes after the last item", content.len());
    }

    Ok((descriptions, resources))
}

fn resolve_resources(
    descriptions: &mut [ComponentDescription],
    resources: &[Arc<BinaryResource>],
    warnings: &mut Vec<Warning>,
) {
    let by_id: HashMap<u32, &Arc<BinaryResource>> =
        resources.iter().map(|r| (r.id, r)).collect();

    for desc in descriptions {
        let component = desc.id.clone();
        for icon in desc.icons_mut() {
            let id = match icon {
                Some(Icon::Id(id)) => *id,
                _ => continue,
            };

            match by_id.get(&id) {
                Some(&resource) => *icon = Some(Icon::Resource(Arc::clone(resource))),
                None => {
                    log::warn!("'{component}' references missing resource {id}");
                    warnings.push(Warning::MissingResource {
                        component: component.clone(),
                        id,
                    });
                    *icon = None;
                }
            }
        }
    }
}
