//! Utilities for reading and writing structured binary data.
//!
//! All multi-byte values are encoded in little-endian byte order.

use std::{
    io::{self, Read, Write},
    mem,
};

#[inline]
fn invalid_data(msg: &'static str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}

/// Reads a magic value of `N` bytes from the stream.
#[inline]
pub fn magic<R: Read, const N: usize>(data: &mut R, expected: [u8; N]) -> io::Result<()> {
    let mut v = [0; N];
    data.read_exact(&mut v)?;

    if v == expected {
        Ok(())
    } else {
        Err(invalid_data("Magic mismatch in input stream"))
    }
}

/// Writes a magic value to the stream.
#[inline]
pub fn write_magic<W: Write>(out: &mut W, magic: &[u8]) -> io::Result<()> {
    out.write_all(magic)
}

/// Reads a fixed-size array of bytes from the stream.
#[inline]
pub fn array<R: Read, const N: usize>(data: &mut R) -> io::Result<[u8; N]> {
    let mut v = [0; N];
    data.read_exact(&mut v)?;
    Ok(v)
}

/// Parses an unsigned byte off the data stream.
#[inline]
pub fn uint8<R: Read>(data: &mut R) -> io::Result<u8> {
    let mut v = [0; 1];
    data.read_exact(&mut v)?;
    Ok(v[0])
}

/// Writes an unsigned byte to the data stream.
#[inline]
pub fn write_uint8<W: Write>(out: &mut W, v: u8) -> io::Result<()> {
    out.write_all(&[v])
}

/// Reads a [`bool`] from the data stream.
#[inline]
pub fn boolean<R: Read>(data: &mut R) -> io::Result<bool> {
    uint8(data).map(|v| v != 0)
}

/// Writes a [`bool`] to the data stream.
#[inline]
pub fn write_boolean<W: Write>(out: &mut W, v: bool) -> io::Result<()> {
    out.write_all(&[v as u8])
}

macro_rules! num_read_impl {
    ($($fn:ident() -> $ty:ty),* $(,)*) => {
        $(
            #[doc = concat!("Parses a [`", stringify!($ty), "`] value off the data stream.")]
            #[inline]
            pub fn $fn<R: io::Read>(data: &mut R) -> io::Result<$ty> {
                let mut v = [0; mem::size_of::<$ty>()];
                data.read_exact(&mut v)?;
                Ok(<$ty>::from_le_bytes(v))
            }
        )*
    };
}

macro_rules! num_write_impl {
    ($($fn:ident($ty:ty)),* $(,)*) => {
        $(
            #[doc = concat!("Writes a [`", stringify!($ty), "`] value to the data stream.")]
            #[inline]
            pub fn $fn<W: Write>(out: &mut W, v: $ty) -> io::Result<()> {
                out.write_all(&v.to_le_bytes())
            }
        )*
    };
}

num_read_impl! {
    uint16() -> u16,
    uint32() -> u32,
    int64() -> i64,
    float64() -> f64,
}

num_write_impl! {
    write_uint16(u16),
    write_uint32(u32),
    write_int64(i64),
    write_float64(f64),
}

/// Reads `len` raw bytes from the data stream.
#[inline]
pub fn bytes<R: Read>(data: &mut R, len: u32) -> io::Result<Vec<u8>> {
    let mut v = Vec::new();
    data.take(len as u64).read_to_end(&mut v)?;

    if v.len() != len as usize {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "Premature EOF while reading byte data",
        ));
    }

    Ok(v)
}

/// Reads a `u32` length-prefixed byte buffer from the data stream.
#[inline]
pub fn prefixed_bytes<R: Read>(data: &mut R) -> io::Result<Vec<u8>> {
    uint32(data).and_then(|len| bytes(data, len))
}

/// Writes a `u32` length-prefixed byte buffer to the data stream.
#[inline]
pub fn write_prefixed_bytes<W: Write>(out: &mut W, v: &[u8]) -> io::Result<()> {
    write_uint32(out, checked_len(v.len())?)?;
    out.write_all(v)
}

/// Parses a `u32` length-prefixed UTF-8 string.
///
/// Fails if the string is not valid UTF-8.
#[inline]
pub fn str<R: Read>(data: &mut R) -> io::Result<String> {
    let v = prefixed_bytes(data)?;
    String::from_utf8(v).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Writes a length-prefixed string to the output stream.
#[inline]
pub fn write_str<W: Write>(out: &mut W, v: &str) -> io::Result<()> {
    write_prefixed_bytes(out, v.as_bytes())
}

/// Parses an optional string which is preceded by a presence flag.
#[inline]
pub fn opt_str<R: Read>(data: &mut R) -> io::Result<Option<String>> {
    if boolean(data)? {
        str(data).map(Some)
    } else {
        Ok(None)
    }
}

/// Writes an optional string preceded by a presence flag.
#[inline]
pub fn write_opt_str<W: Write>(out: &mut W, v: Option<&str>) -> io::Result<()> {
    write_boolean(out, v.is_some())?;
    match v {
        Some(v) => write_str(out, v),
        None => Ok(()),
    }
}

/// Parses a sequence of `count` elements using the given parser.
///
/// The parser function freely defines how to parse one element
/// of the sequence.
#[inline]
pub fn seq<F, R, T>(data: &mut R, count: u32, mut f: F) -> io::Result<Vec<T>>
where
    F: FnMut(&mut R) -> io::Result<T>,
    R: Read,
{
    // Don't trust the count for preallocation; it comes from the input.
    let mut out = Vec::with_capacity((count as usize).min(1024));
    for _ in 0..count {
        let element = f(data)?;
        out.push(element);
    }
    Ok(out)
}

/// Parses a `u32` count followed by that many elements.
#[inline]
pub fn prefixed_seq<F, R, T>(data: &mut R, f: F) -> io::Result<Vec<T>>
where
    F: FnMut(&mut R) -> io::Result<T>,
    R: Read,
{
    let count = uint32(data)?;
    seq(data, count, f)
}

/// Writes a sequence of elements, optionally preceded by a `u32` count.
#[inline]
pub fn write_seq<F, T, W>(out: &mut W, prefixed: bool, seq: &[T], mut f: F) -> io::Result<()>
where
    F: FnMut(&mut W, &T) -> io::Result<()>,
    W: Write,
{
    if prefixed {
        write_uint32(out, checked_len(seq.len())?)?;
    }
    for v in seq {
        f(out, v)?;
    }

    Ok(())
}

/// Converts a buffer length into its `u32` wire representation.
#[inline]
pub fn checked_len(len: usize) -> io::Result<u32> {
    u32::try_from(len).map_err(|_| invalid_data("length too large to represent"))
}

/// A typed block of data split off an input buffer.
///
/// Blocks are encoded as a `u16` type tag, followed by a `u32` byte
/// length and that many bytes of body. Readers which do not know the
/// tag can skip the body without interpreting it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Block<'a> {
    /// The type tag of the block.
    pub tag: u16,
    /// The raw body bytes of the block.
    pub body: &'a [u8],
}

/// Splits the next [`Block`] off the front of `data`.
#[inline]
pub fn block<'a>(data: &mut &'a [u8]) -> io::Result<Block<'a>> {
    let tag = uint16(data)?;
    let len = uint32(data)? as usize;

    if data.len() < len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "block length exceeds remaining data",
        ));
    }

    let (body, rest) = data.split_at(len);
    *data = rest;

    Ok(Block { tag, body })
}

/// Writes a [`Block`] whose body is produced by `f`.
///
/// The body is buffered first so its length can be emitted ahead of it.
#[inline]
pub fn write_block<W, F>(out: &mut W, tag: u16, f: F) -> io::Result<()>
where
    W: Write,
    F: FnOnce(&mut Vec<u8>) -> io::Result<()>,
{
    let mut body = Vec::new();
    f(&mut body)?;

    write_uint16(out, tag)?;
    write_prefixed_bytes(out, &body)
}
