use std::{
    fs,
    io::{self, BufWriter, IsTerminal, Write},
    path::{Path, PathBuf},
};

use super::OutputSource;
use crate::utils;

/// Writes `value` as JSON to a file, or to stdout when `out` is [`None`].
///
/// Files and pipes get compact JSON; a terminal gets it pretty-printed.
pub fn write_json<T: serde::Serialize>(out: Option<&Path>, value: &T) -> eyre::Result<()> {
    match out {
        Some(path) => {
            let mut writer = BufWriter::new(fs::File::create(path)?);
            serde_json::to_writer(&mut writer, value)?;
            writer.flush()?;
            log::debug!("Wrote JSON to '{}'", path.display());
        }

        None => {
            let mut stdout = io::stdout().lock();
            if stdout.is_terminal() {
                serde_json::to_writer_pretty(&mut stdout, value)?;
                writeln!(stdout)?;
            } else {
                serde_json::to_writer(&mut stdout, value)?;
            }
        }
    }

    Ok(())
}

/// Helper function to be used with [`super::process_par`] for mapping
/// any serializable `T` value to an output source.
pub fn write_as_json<T: serde::Serialize>(
    inpath: Option<PathBuf>,
    value: T,
    out: OutputSource,
) -> eyre::Result<()> {
    match (out, inpath) {
        (OutputSource::Stdout, _) => write_json(None, &value),
        (OutputSource::File(path), _) => write_json(Some(&path), &value),
        (OutputSource::Dir(out, suffix), Some(path)) => {
            let out = utils::output_path_in(out, &path, suffix)?;
            write_json(Some(&out), &value)
        }

        (OutputSource::Dir(..), None) => Err(eyre::eyre!(
            "output path for stdin input is directory; specify a file path instead"
        )),
    }
}
