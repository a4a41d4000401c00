//! Primitive reads over an in-memory byte buffer.
//!
//! A single cursor type over a fully-resident slice: the whole chunk lives
//! in memory before the first byte is interpreted, so reads are plain
//! synchronous slice indexing, never `.await`.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::error::DecodeError;

/// Endianness recorded in the chunk header. Governs every multi-byte read
/// that follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

/// The width/endianness parameters threaded through every decoder call,
/// read once from the header and never mutated again. An explicit, named,
/// immutable context rather than a positional size list or a global.
#[derive(Debug, Clone, Copy)]
pub struct DecodeContext {
    pub endianness: Endianness,
    pub int_size: u8,
    pub size_t_size: u8,
    pub instruction_size: u8,
    pub number_size: u8,
    pub integral_flag: u8,
}

/// A cursor over an immutable byte slice. Single-owner, no concurrent
/// access — decoding is strictly single-threaded.
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Current byte offset. Stamped onto every artifact as its identity.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let end = self.pos.checked_add(n).ok_or(DecodeError::UnexpectedEof { offset: self.pos })?;
        if end > self.bytes.len() {
            return Err(DecodeError::UnexpectedEof { offset: self.pos });
        }
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.read_bytes(1)?[0])
    }

    /// Reads `width` bytes (4 or 8) as an unsigned integer under the given
    /// endianness.
    pub fn read_uint(&mut self, endianness: Endianness, width: u8) -> Result<u64, DecodeError> {
        let bytes = self.read_bytes(width as usize)?;
        Ok(match endianness {
            Endianness::Little => LittleEndian::read_uint(bytes, width as usize),
            Endianness::Big => BigEndian::read_uint(bytes, width as usize),
        })
    }

    /// Reads `width` bytes (4 or 8) as an IEEE-754 float under the given
    /// endianness. `width = 4` reads a single-precision float widened to
    /// `f64`; `width = 8` reads a double directly.
    pub fn read_float(&mut self, endianness: Endianness, width: u8) -> Result<f64, DecodeError> {
        let bytes = self.read_bytes(width as usize)?;
        Ok(match (endianness, width) {
            (Endianness::Little, 4) => LittleEndian::read_f32(bytes) as f64,
            (Endianness::Little, 8) => LittleEndian::read_f64(bytes),
            (Endianness::Big, 4) => BigEndian::read_f32(bytes) as f64,
            (Endianness::Big, 8) => BigEndian::read_f64(bytes),
            _ => unreachable!("width is validated to be 4 or 8 before this is called"),
        })
    }

    /// Reads a length-prefixed byte string: an unsigned `size_t`-width
    /// length followed by that many raw bytes. Any trailing NUL is part of
    /// the stored length and is retained verbatim.
    pub fn read_lua_string(&mut self, ctx: &DecodeContext) -> Result<Vec<u8>, DecodeError> {
        let len = self.read_uint(ctx.endianness, ctx.size_t_size)? as usize;
        Ok(self.read_bytes(len)?.to_vec())
    }
}
