//! Debug info: the line table, local-variable records, and upvalue-name
//! table that trail every prototype.

use crate::error::DecodeError;
use crate::reader::{ByteReader, DecodeContext};

#[derive(Debug, Clone, PartialEq)]
pub struct LocalVar {
    pub address: usize,
    pub name: Vec<u8>,
    pub start_pc: u32,
    pub end_pc: u32,
}

pub fn decode_local_var(reader: &mut ByteReader, ctx: &DecodeContext) -> Result<LocalVar, DecodeError> {
    let address = reader.position();
    let name = reader.read_lua_string(ctx)?;
    let start_pc = reader.read_uint(ctx.endianness, 4)? as u32;
    let end_pc = reader.read_uint(ctx.endianness, 4)? as u32;
    Ok(LocalVar { address, name, start_pc, end_pc })
}

/// One 4-byte line-table entry. Never reinterpreted ("not
/// reinterpreted; the original tool never interprets them").
pub type LineEntry = [u8; 4];

pub fn decode_line_entry(reader: &mut ByteReader, ctx: &DecodeContext) -> Result<LineEntry, DecodeError> {
    let bytes = reader.read_bytes(4)?;
    let mut entry = [0u8; 4];
    entry.copy_from_slice(bytes);
    let _ = ctx; // endianness is irrelevant; the bytes are kept opaque.
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::Endianness;

    fn ctx() -> DecodeContext {
        DecodeContext {
            endianness: Endianness::Little,
            int_size: 4,
            size_t_size: 4,
            instruction_size: 4,
            number_size: 8,
            integral_flag: 0,
        }
    }

    #[test]
    fn decodes_local_var() {
        let mut buf = vec![];
        buf.extend_from_slice(&1u32.to_le_bytes());
        buf.push(b'i');
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&5u32.to_le_bytes());

        let mut reader = ByteReader::new(&buf);
        let local = decode_local_var(&mut reader, &ctx()).unwrap();
        assert_eq!(local.name, b"i");
        assert_eq!(local.start_pc, 0);
        assert_eq!(local.end_pc, 5);
    }
}
