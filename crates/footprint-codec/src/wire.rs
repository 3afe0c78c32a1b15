//! Byte-level layout shared by the encoder and decoder.
//!
//! Every value is a one-byte [`TypeTag`] followed by its payload. Length and
//! count fields are `u32` little-endian; array dimensions are `u64`
//! little-endian; floats are their IEEE-754 bits as `u64` little-endian.

use crate::errors::{FootprintError, Result};

/// Bit pattern every NaN is written as.
pub const CANONICAL_NAN_BITS: u64 = 0x7ff8_0000_0000_0000;

/// One-byte type tag preceding each encoded value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    /// `0x01`
    Null,
    /// `0x02`, payload `u8` 0 or 1.
    Bool,
    /// `0x03`, payload sign `u8`, `u32` length, big-endian magnitude.
    Int,
    /// `0x04`, payload `u64` bits.
    Float,
    /// `0x05`, payload real bits then imaginary bits.
    Complex,
    /// `0x06`, payload `u32` length then bytes.
    Bytes,
    /// `0x07`, payload `u32` byte length then UTF-8.
    Text,
    /// `0x08`, payload `u32` count then items.
    List,
    /// `0x09`, payload `u32` count then items.
    Tuple,
    /// `0x0A`, payload `u32` pair count then pairs in canonical key order.
    Map,
    /// `0x0B`, payload name, `u32` count, field names (current only), values.
    Record,
    /// `0x0C`, payload class name then state value.
    Extension,
    /// `0x0D`, payload dtype, `u32` ndim, dims, `u32` byte length, bytes.
    Array,
}

impl TypeTag {
    /// Parses a tag byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0x01 => TypeTag::Null,
            0x02 => TypeTag::Bool,
            0x03 => TypeTag::Int,
            0x04 => TypeTag::Float,
            0x05 => TypeTag::Complex,
            0x06 => TypeTag::Bytes,
            0x07 => TypeTag::Text,
            0x08 => TypeTag::List,
            0x09 => TypeTag::Tuple,
            0x0A => TypeTag::Map,
            0x0B => TypeTag::Record,
            0x0C => TypeTag::Extension,
            0x0D => TypeTag::Array,
            _ => return None,
        })
    }

    /// Returns the byte value for this tag.
    pub fn to_byte(self) -> u8 {
        match self {
            TypeTag::Null => 0x01,
            TypeTag::Bool => 0x02,
            TypeTag::Int => 0x03,
            TypeTag::Float => 0x04,
            TypeTag::Complex => 0x05,
            TypeTag::Bytes => 0x06,
            TypeTag::Text => 0x07,
            TypeTag::List => 0x08,
            TypeTag::Tuple => 0x09,
            TypeTag::Map => 0x0A,
            TypeTag::Record => 0x0B,
            TypeTag::Extension => 0x0C,
            TypeTag::Array => 0x0D,
        }
    }
}

/// Float bits with NaN payloads collapsed.
pub fn canonical_float_bits(value: f64) -> u64 {
    if value.is_nan() {
        CANONICAL_NAN_BITS
    } else {
        value.to_bits()
    }
}

pub(crate) fn write_len(out: &mut Vec<u8>, what: &'static str, len: usize) -> Result<()> {
    let len32 = u32::try_from(len).map_err(|_| FootprintError::TooLarge { what, len })?;
    out.extend_from_slice(&len32.to_le_bytes());
    Ok(())
}

pub(crate) fn write_str(out: &mut Vec<u8>, what: &'static str, s: &str) -> Result<()> {
    write_len(out, what, s.len())?;
    out.extend_from_slice(s.as_bytes());
    Ok(())
}

/// Bounds-checked reader over an encoded buffer.
pub(crate) struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub(crate) fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(FootprintError::malformed(
                self.pos,
                format!(
                    "truncated {}: need {} bytes, {} remain",
                    what,
                    n,
                    self.remaining()
                ),
            ));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub(crate) fn u8(&mut self, what: &str) -> Result<u8> {
        Ok(self.take(1, what)?[0])
    }

    pub(crate) fn u32(&mut self, what: &str) -> Result<u32> {
        let b = self.take(4, what)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub(crate) fn u64(&mut self, what: &str) -> Result<u64> {
        let b = self.take(8, what)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(b);
        Ok(u64::from_le_bytes(buf))
    }

    /// Reads a length that must fit in the rest of the buffer.
    pub(crate) fn length(&mut self, what: &str) -> Result<usize> {
        let offset = self.pos;
        let len = self.u32(what)? as usize;
        if len > self.remaining() {
            return Err(FootprintError::malformed(
                offset,
                format!(
                    "{} {} exceeds the {} remaining bytes",
                    what,
                    len,
                    self.remaining()
                ),
            ));
        }
        Ok(len)
    }

    pub(crate) fn bytes(&mut self, what: &str) -> Result<&'a [u8]> {
        let len = self.length(what)?;
        self.take(len, what)
    }

    pub(crate) fn str(&mut self, what: &str) -> Result<&'a str> {
        let offset = self.pos;
        let raw = self.bytes(what)?;
        std::str::from_utf8(raw).map_err(|e| {
            FootprintError::malformed(offset, format!("invalid UTF-8 in {}: {}", what, e))
        })
    }
}
