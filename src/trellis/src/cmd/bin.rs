use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{Args, Subcommand};
use eyre::Context;
use serde::Serialize;
use trellis_binary::{load_binary, Certificate, LoadedContainer, TrustStore};
use trellis_description::{BinaryResource, ComponentDescription, SignatureStatus};

use super::Command;
use crate::{
    cli::{helpers, process_par, read_file, InputsOutputs},
    utils,
};

/// Subcommand for working with binary description containers.
#[derive(Debug, Args)]
pub struct Bin {
    #[clap(subcommand)]
    command: BinCommand,

    /// Paths to DER-encoded certificates whose signatures are trusted.
    ///
    /// May be given multiple times.
    #[clap(short, long, global = true)]
    trust: Vec<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum BinCommand {
    /// Deserializes given containers into JSON format.
    De(InputsOutputs),

    /// Verifies the signature of a container.
    Verify {
        /// Path to the container to verify.
        path: PathBuf,
    },

    /// Writes every description in a container as an XML document.
    Unpack {
        /// Path to the container to unpack.
        path: PathBuf,

        /// The directory to write the documents to.
        #[clap(short, long)]
        output: PathBuf,
    },
}

/// The JSON view of a loaded container.
#[derive(Serialize)]
struct ContainerDump {
    version: u8,
    signature: SignatureStatus,
    warnings: Vec<String>,
    resources: Vec<Arc<BinaryResource>>,
    descriptions: Vec<ComponentDescription>,
}

impl From<LoadedContainer> for ContainerDump {
    fn from(container: LoadedContainer) -> Self {
        Self {
            version: container.version,
            signature: container.signature,
            warnings: container.warnings.iter().map(ToString::to_string).collect(),
            resources: container.resources,
            descriptions: container.descriptions,
        }
    }
}

impl Command for Bin {
    fn handle(self) -> eyre::Result<()> {
        let trust = load_trust_store(&self.trust)?;

        match self.command {
            BinCommand::De(args) => {
                let (inputs, outputs) = args.evaluate("de.json")?;
                process_par(
                    inputs,
                    outputs,
                    |data| load(&data, &trust).map(ContainerDump::from),
                    helpers::write_as_json,
                )
            }

            BinCommand::Verify { path } => verify(&path, &trust),

            BinCommand::Unpack { path, output } => unpack(&path, output, &trust),
        }
    }
}

fn load_trust_store(paths: &[PathBuf]) -> eyre::Result<TrustStore> {
    paths
        .iter()
        .map(|path| {
            let der = read_file(path)?;
            Certificate::from_der(der)
                .with_context(|| format!("'{}' is not a valid certificate", path.display()))
        })
        .collect()
}

fn load(data: &[u8], trust: &TrustStore) -> eyre::Result<LoadedContainer> {
    let container = load_binary(data, Some(trust))?;
    for warning in &container.warnings {
        log::warn!("{warning}");
    }

    Ok(container)
}

fn verify(path: &Path, trust: &TrustStore) -> eyre::Result<()> {
    let container = load(&read_file(path)?, trust)?;
    let status = &container.signature;

    println!("Signed: {}", utils::human_bool(status.is_signed));
    if status.is_signed {
        println!("Signature valid: {}", utils::human_bool(status.signature_valid));
        println!(
            "Certificate trusted: {}",
            utils::human_bool(status.certificate_trusted)
        );
    }
    println!("Descriptions: {}", container.descriptions.len());

    Ok(())
}

fn unpack(path: &Path, output: PathBuf, trust: &TrustStore) -> eyre::Result<()> {
    let container = load(&read_file(path)?, trust)?;
    fs::create_dir_all(&output)?;

    for description in &container.descriptions {
        let text = trellis_xml::write_xml(description)
            .with_context(|| format!("failed to write '{}' as XML", description.id))?;

        let out = utils::description_path_in(&output, &description.id)?;
        fs::write(&out, text).with_context(|| format!("failed to write '{}'", out.display()))?;
        log::info!("Unpacked '{}' to '{}'", description.id, out.display());
    }

    Ok(())
}
