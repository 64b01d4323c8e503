//! Property references in format strings and text runs.
//!
//! A reference is written as `$Name`, where the name consists of ASCII
//! alphanumerics and underscores. `$$` produces a literal dollar sign.

#[inline]
fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// A lexed piece of a format string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Piece<'a> {
    Literal(&'a str),
    Reference(&'a str),
}

fn pieces(text: &str) -> Vec<Piece<'_>> {
    let mut out = Vec::new();
    let mut rest = text;

    while let Some(idx) = rest.find('$') {
        if idx > 0 {
            out.push(Piece::Literal(&rest[..idx]));
        }

        let after = &rest[idx + 1..];
        if let Some(stripped) = after.strip_prefix('$') {
            out.push(Piece::Literal("$"));
            rest = stripped;
            continue;
        }

        let len = after.find(|c| !is_name_char(c)).unwrap_or(after.len());
        if len == 0 {
            out.push(Piece::Literal("$"));
        } else {
            out.push(Piece::Reference(&after[..len]));
        }
        rest = &after[len..];
    }

    if !rest.is_empty() {
        out.push(Piece::Literal(rest));
    }

    out
}

/// Collects the names of all properties referenced by `text`.
pub fn references(text: &str) -> Vec<&str> {
    pieces(text)
        .into_iter()
        .filter_map(|p| match p {
            Piece::Reference(name) => Some(name),
            Piece::Literal(..) => None,
        })
        .collect()
}

/// Replaces every reference in `text` with the result of `lookup`.
///
/// References which `lookup` does not know are kept verbatim.
pub fn substitute<F>(text: &str, mut lookup: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let mut out = String::with_capacity(text.len());
    for piece in pieces(text) {
        match piece {
            Piece::Literal(s) => out.push_str(s),
            Piece::Reference(name) => match lookup(name) {
                Some(v) => out.push_str(&v),
                None => {
                    out.push('$');
                    out.push_str(name);
                }
            },
        }
    }

    out
}
