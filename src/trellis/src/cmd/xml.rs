use std::{collections::HashSet, fs, path::PathBuf};

use clap::{Args, Subcommand};
use eyre::Context;
use serde::Serialize;
use trellis_binary::{write_binary, SigningKey, WriteOptions, CURRENT_VERSION};
use trellis_description::{ComponentDescription, Version};
use trellis_xml::{load_xml, XmlDocument};

use super::Command;
use crate::cli::{expand_glob, helpers, process_par, read_file, InputsOutputs};

pub const TRELLIS_SIGNING_KEY: &str = "TRELLIS_SIGNING_KEY";

/// Subcommand for working with XML description documents.
#[derive(Debug, Args)]
pub struct Xml {
    #[clap(subcommand)]
    command: XmlCommand,
}

#[derive(Debug, Subcommand)]
enum XmlCommand {
    /// Deserializes given XML documents into JSON format.
    De(InputsOutputs),

    /// Packs XML documents into a binary container.
    Pack {
        /// The documents to pack.
        ///
        /// UNIX glob patterns are supported.
        #[clap(required = true)]
        inputs: Vec<String>,

        /// Path to the container file to create.
        #[clap(short, long)]
        output: PathBuf,

        /// Path to a PKCS#1-encoded RSA private key in PEM format to
        /// sign the container with.
        ///
        /// If no argument is provided, Trellis will try to find a file
        /// path under the `TRELLIS_SIGNING_KEY` environment variable.
        /// Without either, the container is not signed.
        #[clap(short, long, env = TRELLIS_SIGNING_KEY)]
        key: Option<PathBuf>,

        /// The container format version to write.
        #[clap(long, default_value_t = CURRENT_VERSION)]
        format_version: u8,
    },
}

/// The JSON view of a loaded document.
#[derive(Serialize)]
struct DocumentDump {
    version: Version,
    warnings: Vec<String>,
    description: ComponentDescription,
}

impl From<XmlDocument> for DocumentDump {
    fn from(doc: XmlDocument) -> Self {
        Self {
            version: doc.version,
            warnings: doc.warnings.iter().map(ToString::to_string).collect(),
            description: doc.description,
        }
    }
}

impl Command for Xml {
    fn handle(self) -> eyre::Result<()> {
        match self.command {
            XmlCommand::De(args) => {
                let (inputs, outputs) = args.evaluate("de.json")?;
                process_par(
                    inputs,
                    outputs,
                    |data| load(&data).map(DocumentDump::from),
                    helpers::write_as_json,
                )
            }

            XmlCommand::Pack {
                inputs,
                output,
                key,
                format_version,
            } => pack(&inputs, output, key, format_version),
        }
    }
}

fn load(data: &[u8]) -> eyre::Result<XmlDocument> {
    let doc = load_xml(data)?;
    for warning in &doc.warnings {
        log::warn!("{}: {warning}", doc.description.id);
    }

    Ok(doc)
}

fn load_signing_key(path: &PathBuf) -> eyre::Result<SigningKey> {
    let pem = fs::read_to_string(path)
        .with_context(|| format!("failed to read signing key from '{}'", path.display()))?;
    SigningKey::from_pkcs1_pem(&pem).context("failed to parse given signing key")
}

fn pack(
    inputs: &[String],
    output: PathBuf,
    key: Option<PathBuf>,
    format_version: u8,
) -> eyre::Result<()> {
    let mut descriptions = Vec::new();
    let mut resources = Vec::new();
    let mut seen = HashSet::new();

    for pattern in inputs {
        for path in expand_glob(pattern)? {
            let doc = load(&read_file(&path)?)
                .with_context(|| format!("failed to load '{}'", path.display()))?;

            resources.extend(doc.resources().into_iter().filter(|r| seen.insert(r.id)));
            descriptions.push(doc.description);
        }
    }

    let options = WriteOptions {
        version: format_version,
        signing_key: key.as_ref().map(load_signing_key).transpose()?,
    };
    let data = write_binary(&descriptions, &resources, &options)?;
    fs::write(&output, data)
        .with_context(|| format!("failed to write '{}'", output.display()))?;

    log::info!(
        "Packed {} descriptions and {} resources into '{}'",
        descriptions.len(),
        resources.len(),
        output.display()
    );
    Ok(())
}
