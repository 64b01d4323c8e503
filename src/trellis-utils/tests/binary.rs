use std::io;

use trellis_utils::binary::*;

#[test]
fn strings_are_length_prefixed() -> io::Result<()> {
    let mut out = Vec::new();
    write_str(&mut out, "Ω")?;
    assert_eq!(out, [2, 0, 0, 0, 0xCE, 0xA9]);

    let mut data = &out[..];
    assert_eq!(str(&mut data)?, "Ω");
    assert!(data.is_empty());

    Ok(())
}

#[test]
fn truncated_string_is_eof() {
    let mut data: &[u8] = &[5, 0, 0, 0, b'a', b'b'];
    let err = str(&mut data).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
}

#[test]
fn magic_mismatch() {
    let mut data: &[u8] = b"NOPE";
    let err = magic(&mut data, *b"YEAH").unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidData);
}

#[test]
fn blocks_can_be_skipped() -> io::Result<()> {
    let mut out = Vec::new();
    write_block(&mut out, 7, |w| write_uint32(w, 0xDEADBEEF))?;
    write_block(&mut out, 3, |w| write_boolean(w, true))?;

    let mut data = &out[..];
    let first = block(&mut data)?;
    assert_eq!(first.tag, 7);
    assert_eq!(first.body, &[0xEF, 0xBE, 0xAD, 0xDE]);

    let second = block(&mut data)?;
    assert_eq!(second.tag, 3);
    assert_eq!(second.body, &[1]);
    assert!(data.is_empty());

    Ok(())
}

#[test]
fn block_overrun() {
    let mut data: &[u8] = &[1, 0, 10, 0, 0, 0, 1, 2];
    assert!(block(&mut data).is_err());
}

#[test]
fn optional_strings() -> io::Result<()> {
    let mut out = Vec::new();
    write_opt_str(&mut out, None)?;
    write_opt_str(&mut out, Some("npn"))?;

    let mut data = &out[..];
    assert_eq!(opt_str(&mut data)?, None);
    assert_eq!(opt_str(&mut data)?.as_deref(), Some("npn"));

    Ok(())
}
