use std::{
    fs,
    io::{self, IsTerminal, Read},
    path::{Path, PathBuf},
};

use eyre::Context;
use rayon::prelude::*;

use super::{InputSource, OutputSource};

fn read_stdin() -> eyre::Result<Vec<u8>> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Err(eyre::eyre!(
            "no input given; pass a path or pipe a document into stdin"
        ));
    }

    let mut buf = Vec::new();
    stdin.lock().read_to_end(&mut buf)?;
    log::debug!("Read {} bytes from stdin", buf.len());
    Ok(buf)
}

/// Reads a whole input file into memory.
pub fn read_file(path: &Path) -> eyre::Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("failed to read '{}'", path.display()))
}

/// Processes inputs with rayon parallelism for batch operations.
///
/// Every input is read into memory and handed to `read`; the result
/// is passed on to `write` together with the path it came from.
pub fn process_par<T, R, W>(
    input: InputSource,
    output: OutputSource,
    read: R,
    write: W,
) -> eyre::Result<()>
where
    T: Send,
    R: Fn(Vec<u8>) -> eyre::Result<T> + Sync,
    W: Fn(Option<PathBuf>, T, OutputSource) -> eyre::Result<()> + Sync,
{
    match (input, output) {
        (InputSource::Stdin, out) => {
            let value = read(read_stdin()?)?;
            write(None, value, out)
        }

        (InputSource::File(path), out) => {
            let value = read(read_file(&path)?)
                .with_context(|| format!("failed to process '{}'", path.display()))?;
            write(Some(path), value, out)
        }

        (InputSource::Files(paths), OutputSource::Dir(dir, suffix)) => {
            fs::create_dir_all(&dir)?;
            paths.into_par_iter().try_for_each(|path| {
                let value = read(read_file(&path)?)
                    .with_context(|| format!("failed to process '{}'", path.display()))?;
                write(Some(path), value, OutputSource::Dir(dir.clone(), suffix))
            })
        }

        (InputSource::Files(..), _) => Err(eyre::eyre!(
            "multiple inputs need an output directory; pass one with -o"
        )),
    }
}
