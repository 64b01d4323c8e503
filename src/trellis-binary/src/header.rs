use std::io::{self, Read, Write};

use byteorder::{ReadBytesExt, WriteBytesExt, LE};
use sha1::{Digest, Sha1};
use trellis_utils::binary;

use crate::{FormatError, CURRENT_VERSION};

/// The magic bytes every container starts with.
pub const MAGIC: [u8; 8] = *b"TRLSCDC\x1a";

// magic + version + hash + reserved + total length + content offset
// + item count + signed flag
const FIXED_SIZE: usize = 8 + 1 + 16 + 4 + 4 + 4 + 4 + 1;

/// The signature over the container content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureBlock {
    pub signature: Vec<u8>,
    /// The DER-encoded public key of the signer.
    pub certificate: Vec<u8>,
}

/// The fixed header in front of the container content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    pub version: u8,
    pub content_hash: [u8; 16],
    pub total_length: u32,
    pub content_offset: u32,
    pub item_count: u32,
    pub signature: Option<SignatureBlock>,
}

impl Header {
    /// Creates a header for the given content.
    ///
    /// Lengths and offsets are computed from the content and signature.
    pub fn new(
        version: u8,
        content: &[u8],
        item_count: u32,
        signature: Option<SignatureBlock>,
    ) -> io::Result<Self> {
        let mut header = Self {
            version,
            content_hash: content_hash(content),
            total_length: 0,
            content_offset: 0,
            item_count,
            signature,
        };

        let offset = header.binary_size();
        header.content_offset = binary::checked_len(offset)?;
        header.total_length = binary::checked_len(offset + content.len())?;

        Ok(header)
    }

    /// The encoded size of this header in bytes.
    pub fn binary_size(&self) -> usize {
        FIXED_SIZE
            + self
                .signature
                .as_ref()
                .map_or(0, |s| 4 + s.signature.len() + 4 + s.certificate.len())
    }

    /// Parses a header off the front of `data`.
    pub fn parse(data: &mut &[u8]) -> Result<Self, FormatError> {
        // Short input cannot be a container either.
        binary::magic(data, MAGIC).map_err(|_| FormatError::BadMagic)?;

        let version = data.read_u8()?;
        if version == 0 {
            return Err(FormatError::UnsupportedVersion(version));
        }

        let mut content_hash = [0; 16];
        data.read_exact(&mut content_hash)?;

        let _reserved = data.read_u32::<LE>()?;
        let total_length = data.read_u32::<LE>()?;
        let content_offset = data.read_u32::<LE>()?;
        let item_count = data.read_u32::<LE>()?;

        let signature = if data.read_u8()? != 0 {
            let signature = binary::prefixed_bytes(data)?;
            let certificate = binary::prefixed_bytes(data)?;
            Some(SignatureBlock {
                signature,
                certificate,
            })
        } else {
            None
        };

        Ok(Self {
            version,
            content_hash,
            total_length,
            content_offset,
            item_count,
            signature,
        })
    }

    /// Writes the header to `out`.
    pub fn write<W: Write>(&self, out: &mut W) -> io::Result<()> {
        binary::write_magic(out, &MAGIC)?;
        out.write_u8(self.version)?;
        out.write_all(&self.content_hash)?;
        out.write_u32::<LE>(0)?;
        out.write_u32::<LE>(self.total_length)?;
        out.write_u32::<LE>(self.content_offset)?;
        out.write_u32::<LE>(self.item_count)?;

        match &self.signature {
            Some(sig) => {
                out.write_u8(1)?;
                binary::write_prefixed_bytes(out, &sig.signature)?;
                binary::write_prefixed_bytes(out, &sig.certificate)
            }
            None => out.write_u8(0),
        }
    }

    /// Whether this header was written by a newer format version.
    #[inline]
    pub fn is_newer(&self) -> bool {
        self.version > CURRENT_VERSION
    }
}

/// Computes the 16-byte content hash stored in the header.
pub fn content_hash(content: &[u8]) -> [u8; 16] {
    let digest = Sha1::digest(content);

    let mut out = [0; 16];
    out.copy_from_slice(&digest[..16]);
    out
}
