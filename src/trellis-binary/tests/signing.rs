use std::{fs, sync::Arc};

use trellis_binary::*;
use trellis_description::{BinaryResource, ComponentDescription, Icon};

fn key(name: &str) -> SigningKey {
    let pem = fs::read_to_string(format!("tests/data/{name}.pem")).unwrap();
    SigningKey::from_pkcs1_pem(&pem).unwrap()
}

fn description() -> (ComponentDescription, Arc<BinaryResource>) {
    let resource = Arc::new(BinaryResource {
        id: 1,
        mime_type: "image/png".into(),
        data: b"ICONDATA".to_vec(),
    });

    let mut desc = ComponentDescription::new("lamp", "Lamp");
    desc.metadata.icon = Some(Icon::Resource(resource.clone()));
    (desc, resource)
}

fn signed_with(key: &SigningKey) -> Vec<u8> {
    let (desc, _) = description();
    let options = WriteOptions {
        signing_key: Some(key.clone()),
        ..Default::default()
    };
    write_binary(&[desc], &[], &options).unwrap()
}

#[test]
fn trusted_signature() -> Result<(), Error> {
    let key = key("signing-key");
    let bytes = signed_with(&key);

    let trust: TrustStore = [key.certificate()?].into_iter().collect();
    let loaded = load_binary(&bytes, Some(&trust))?;

    assert!(loaded.warnings.is_empty());
    assert!(loaded.signature.is_signed);
    assert!(loaded.signature.signature_valid);
    assert!(loaded.signature.certificate_trusted);
    assert_eq!(
        loaded.signature.certificate.as_deref(),
        Some(key.certificate()?.as_bytes())
    );
    assert_eq!(loaded.descriptions[0].metadata.signature, loaded.signature);

    Ok(())
}

#[test]
fn tampered_content_is_detected() -> Result<(), Error> {
    let key = key("signing-key");
    let mut bytes = signed_with(&key);

    let pos = bytes
        .windows(8)
        .position(|w| w == b"ICONDATA")
        .expect("resource data in container");
    bytes[pos] ^= 0x20;

    let trust: TrustStore = [key.certificate()?].into_iter().collect();
    let loaded = load_binary(&bytes, Some(&trust))?;

    assert!(loaded.signature.is_signed);
    assert!(!loaded.signature.signature_valid);
    assert!(loaded.signature.certificate_trusted);
    assert_eq!(
        loaded.warnings,
        vec![Warning::HashMismatch, Warning::InvalidSignature]
    );

    // The content still loads.
    let (desc, _) = description();
    let loaded_desc = &loaded.descriptions[0];
    assert_eq!(loaded_desc.id, desc.id);
    assert_eq!(loaded_desc.name, desc.name);
    assert_eq!(loaded.resources[0].data, b"iCONDATA");

    Ok(())
}

#[test]
fn untrusted_certificate() -> Result<(), Error> {
    let trusted = key("signing-key");
    let other = key("other-key");
    let bytes = signed_with(&other);

    let trust: TrustStore = [trusted.certificate()?].into_iter().collect();
    let loaded = load_binary(&bytes, Some(&trust))?;

    assert!(loaded.signature.signature_valid);
    assert!(!loaded.signature.certificate_trusted);
    assert_eq!(loaded.warnings, vec![Warning::UntrustedCertificate]);

    // Without a trust store nothing is trusted.
    let loaded = load_binary(&bytes, None)?;
    assert!(!loaded.signature.certificate_trusted);

    Ok(())
}

#[test]
fn signed_round_trip_keeps_the_model() -> Result<(), Error> {
    let key = key("signing-key");
    let bytes = signed_with(&key);
    let loaded = load_binary(&bytes, None)?;

    let (mut expected, resource) = description();
    expected.metadata.signature = loaded.signature.clone();

    assert_eq!(loaded.descriptions, vec![expected]);
    assert_eq!(loaded.resources, vec![resource]);

    Ok(())
}

#[test]
fn certificates_must_be_rsa_keys() {
    assert!(Certificate::from_der(b"not a key".to_vec()).is_err());

    let cert = key("signing-key").certificate().unwrap();
    assert_eq!(Certificate::from_der(cert.as_bytes()).unwrap(), cert);
}
