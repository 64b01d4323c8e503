//! RSA signing of container content.
//!
//! Content is signed with PKCS#1 v1.5 over a SHA-1 digest. The
//! certificate stored next to the signature is the DER encoding of the
//! signer's PKCS#1 RSA public key.

use std::collections::HashSet;

use rsa::{
    pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPublicKey},
    pkcs1v15::{Signature, SigningKey as RsaSigningKey, VerifyingKey},
    signature::{RandomizedSigner, SignatureEncoding, Verifier},
    RsaPrivateKey, RsaPublicKey,
};
use sha1::Sha1;

use crate::Error;

/// A private key used to sign containers.
#[derive(Clone)]
pub struct SigningKey(RsaPrivateKey);

impl SigningKey {
    /// Parses a PKCS#1-encoded RSA private key in PEM format.
    pub fn from_pkcs1_pem(pem: &str) -> Result<Self, Error> {
        RsaPrivateKey::from_pkcs1_pem(pem)
            .map(Self)
            .map_err(Into::into)
    }

    /// The certificate which verifies signatures made with this key.
    pub fn certificate(&self) -> Result<Certificate, Error> {
        Certificate::from_public_key(&self.0.to_public_key())
    }

    pub(crate) fn sign(&self, content: &[u8]) -> Vec<u8> {
        let signing_key = RsaSigningKey::<Sha1>::new(self.0.clone());
        signing_key
            .sign_with_rng(&mut rand::thread_rng(), content)
            .to_vec()
    }
}

impl From<RsaPrivateKey> for SigningKey {
    fn from(value: RsaPrivateKey) -> Self {
        Self(value)
    }
}

/// The DER-encoded public key of a signer.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Certificate(Vec<u8>);

impl Certificate {
    /// Wraps DER bytes after checking that they hold an RSA public key.
    pub fn from_der(der: impl Into<Vec<u8>>) -> Result<Self, Error> {
        let der = der.into();
        RsaPublicKey::from_pkcs1_der(&der)?;
        Ok(Self(der))
    }

    pub fn from_public_key(key: &RsaPublicKey) -> Result<Self, Error> {
        let doc = key.to_pkcs1_der()?;
        Ok(Self(doc.as_bytes().to_vec()))
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[inline]
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

/// Checks `signature` over `content` against a DER certificate.
pub(crate) fn verify(certificate: &[u8], content: &[u8], signature: &[u8]) -> bool {
    let Ok(key) = RsaPublicKey::from_pkcs1_der(certificate) else {
        return false;
    };
    let Ok(signature) = Signature::try_from(signature) else {
        return false;
    };

    VerifyingKey::<Sha1>::new(key)
        .verify(content, &signature)
        .is_ok()
}

/// The set of certificates a caller trusts to sign containers.
#[derive(Clone, Debug, Default)]
pub struct TrustStore {
    certificates: HashSet<Certificate>,
}

impl TrustStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a trusted certificate.
    pub fn add(&mut self, certificate: Certificate) {
        self.certificates.insert(certificate);
    }

    /// Whether the given DER certificate is trusted.
    pub fn is_trusted(&self, der: &[u8]) -> bool {
        self.certificates.contains(&Certificate(der.to_vec()))
    }

    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }
}

impl FromIterator<Certificate> for TrustStore {
    fn from_iter<T: IntoIterator<Item = Certificate>>(iter: T) -> Self {
        Self {
            certificates: iter.into_iter().collect(),
        }
    }
}
