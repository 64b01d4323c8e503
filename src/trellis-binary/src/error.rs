use std::io;

use thiserror::Error;

/// Errors that make a container unreadable.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The input does not start with the container magic.
    #[error("not a component description container")]
    BadMagic,

    /// The container declares a version that was never defined.
    #[error("unsupported container version {0}")]
    UnsupportedVersion(u8),

    /// The input ended in the middle of a structure.
    #[error("unexpected end of data")]
    Truncated,

    /// The header's offsets and lengths are inconsistent.
    #[error("invalid header: {0}")]
    InvalidHeader(&'static str),

    /// Any other malformed structure.
    #[error("{0}")]
    Malformed(String),
}

impl From<io::Error> for FormatError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::UnexpectedEof => Self::Truncated,
            _ => Self::Malformed(e.to_string()),
        }
    }
}

/// Errors that may occur when reading or writing containers.
#[derive(Debug, Error)]
pub enum Error {
    /// The container could not be parsed.
    #[error("failed to parse container: {0}")]
    Format(#[from] FormatError),

    /// Serialization of container data failed.
    #[error("{0}")]
    Io(#[from] io::Error),

    /// The requested output version cannot be written.
    #[error("cannot write container version {0}")]
    UnsupportedVersion(u8),

    /// A description uses OR conditions which version 1 cannot express.
    #[error("description '{0}' has conditions that are not a flat AND chain")]
    NotFlat(String),

    /// Two resources share the same id.
    #[error("duplicate resource id {0}")]
    DuplicateResource(u32),

    /// An RSA operation failed.
    #[error("{0}")]
    Rsa(#[from] rsa::Error),

    /// A key or certificate could not be encoded or decoded.
    #[error("{0}")]
    Pkcs1(#[from] rsa::pkcs1::Error),
}

/// Non-fatal conditions encountered while loading a container.
///
/// The container data is still returned; callers decide how much to
/// trust it.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Warning {
    /// The container was written by a newer version of the format.
    #[error("container version {0} is newer than supported; unknown data was skipped")]
    NewerVersion(u8),

    /// The stored content hash does not match the content.
    #[error("content hash mismatch")]
    HashMismatch,

    /// The signature does not match the content.
    #[error("invalid content signature")]
    InvalidSignature,

    /// The container is signed with a certificate that is not trusted.
    #[error("signing certificate is not trusted")]
    UntrustedCertificate,

    /// An icon references a resource which is not in the container.
    #[error("'{component}' references missing resource {id}")]
    MissingResource { component: String, id: u32 },
}
