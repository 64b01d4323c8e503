use std::path::{Component, Path, PathBuf};

/// Converts a [`bool`] value into a human-readable description.
#[inline]
pub fn human_bool(v: bool) -> &'static str {
    if v {
        "Yes"
    } else {
        "No"
    }
}

/// Builds the path of a file named after `input` inside `dir`.
pub fn output_path_in(mut dir: PathBuf, input: &Path, suffix: &str) -> eyre::Result<PathBuf> {
    let infile = input.with_extension(suffix);
    let name = infile
        .file_name()
        .ok_or_else(|| eyre::eyre!("'{}' does not name a file", input.display()))?;
    dir.push(name);

    Ok(dir)
}

/// Builds the path of the XML document for description `id` in `dir`.
///
/// Ids come from untrusted containers, so anything other than a plain
/// file name is refused.
pub fn description_path_in(dir: &Path, id: &str) -> eyre::Result<PathBuf> {
    let name = Path::new(id);
    let mut components = name.components();

    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !id.contains(['/', '\\']) => {
            Ok(dir.join(format!("{id}.xml")))
        }
        _ => Err(eyre::eyre!("refusing to unpack description with id '{id}'")),
    }
}
