use std::path::PathBuf;

use clap::Args;
use glob::glob;

use crate::cli::HYPHEN;

/// An input source to [`InputsOutputs`] machinery.
#[derive(Clone, Debug)]
pub enum InputSource {
    /// The input will be read from stdin.
    Stdin,
    /// The input will be read from a single file.
    File(PathBuf),
    /// Inputs will be read from multiple files (glob).
    Files(Vec<PathBuf>),
}

/// An output source to [`InputsOutputs`] machinery.
#[derive(Clone, Debug)]
pub enum OutputSource {
    /// The output will be written to stdout.
    Stdout,
    /// The output will be written to a single file.
    File(PathBuf),
    /// The output will be written to files in the directory.
    ///
    /// The extra suffix will be attached to every file.
    Dir(PathBuf, &'static str),
}

/// Generalized command options for accepting many inputs and producing
/// many outputs.
#[derive(Debug, Args)]
pub struct InputsOutputs {
    /// Specifies the input sources to process.
    ///
    /// When the value is "-", then input will be read from stdin.
    ///
    /// Everything else will be recognized as a file path. UNIX glob
    /// patterns are supported to specify many files, in which case
    /// the output option must name a directory.
    pub input: String,

    /// An optional output source for the processed outputs.
    ///
    /// Defaults to "-" for printing output to stdout.
    ///
    /// This option takes either a path to a single file (if the
    /// input was a single file too), or a path to a directory
    /// where output files will be created for each input file.
    #[clap(short, default_value = HYPHEN)]
    pub output: PathBuf,
}

impl InputsOutputs {
    /// Evaluates the supplied arguments into input and output sources.
    pub fn evaluate(self, suffix: &'static str) -> eyre::Result<(InputSource, OutputSource)> {
        let inputs = self.input_source()?;
        let outputs = self.output_source(suffix, &inputs);

        Ok((inputs, outputs))
    }

    fn input_source(&self) -> eyre::Result<InputSource> {
        if self.input == HYPHEN {
            return Ok(InputSource::Stdin);
        }

        let mut paths = expand_glob(&self.input)?;
        if paths.len() == 1 {
            Ok(InputSource::File(paths.remove(0)))
        } else {
            Ok(InputSource::Files(paths))
        }
    }

    fn output_source(self, suffix: &'static str, input: &InputSource) -> OutputSource {
        if self.output.as_os_str() == HYPHEN {
            return OutputSource::Stdout;
        }

        match input {
            InputSource::Files(..) => OutputSource::Dir(self.output, suffix),
            _ if self.output.is_dir() => OutputSource::Dir(self.output, suffix),
            InputSource::Stdin | InputSource::File(..) => OutputSource::File(self.output),
        }
    }
}

/// Expands a glob pattern into the paths it matches.
///
/// Fails when nothing matches.
pub fn expand_glob(pattern: &str) -> eyre::Result<Vec<PathBuf>> {
    let paths: Vec<PathBuf> = glob(pattern)?.collect::<Result<_, _>>()?;
    if paths.is_empty() {
        eyre::bail!("failed to find files matching '{pattern}'");
    }

    Ok(paths)
}
