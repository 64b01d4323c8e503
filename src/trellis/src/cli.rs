use clap::{Parser, Subcommand};

use crate::cmd::*;

mod args;

pub mod helpers;

pub mod io;
pub use io::*;

mod processor;
pub use processor::*;

pub const HYPHEN: &str = "-";

/// The CLI interface for the Trellis application.
#[derive(Debug, Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
pub struct Cli {
    /// The selected command.
    #[clap(subcommand)]
    pub command: TrellisCommand,

    #[clap(flatten)]
    pub verbosity: args::Verbosity,
}

/// The top-level commands supported by Trellis.
#[derive(Debug, Subcommand)]
pub enum TrellisCommand {
    Bin(bin::Bin),
    Render(render::Render),
    Xml(xml::Xml),
}

impl Command for TrellisCommand {
    fn handle(self) -> eyre::Result<()> {
        match self {
            Self::Bin(bin) => bin.handle(),
            Self::Render(render) => render.handle(),
            Self::Xml(xml) => xml.handle(),
        }
    }
}
