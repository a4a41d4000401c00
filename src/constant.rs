//! Typed constant decoding, modeled as a genuine Rust sum type rather than
//! a `(type, value)` pair with an untyped payload field.

use crate::error::DecodeError;
use crate::reader::{ByteReader, DecodeContext};

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Nil,
    Bool(bool),
    Number(f64),
    String(Vec<u8>),
}

impl Constant {
    pub fn type_name(&self) -> &'static str {
        match self {
            Constant::Nil => "nil",
            Constant::Bool(_) => "boolean",
            Constant::Number(_) => "number",
            Constant::String(_) => "string",
        }
    }

    /// Renders the constant's value for display, the way the pseudo
    /// renderer and `list constants` both need it. String constants render
    /// as a quoted, lossily-UTF8-decoded literal (any UTF-8 interpretation
    /// is deferred to here and nowhere earlier).
    pub fn render(&self) -> String {
        match self {
            Constant::Nil => "nil".to_string(),
            Constant::Bool(b) => b.to_string(),
            Constant::Number(n) => n.to_string(),
            Constant::String(bytes) => format!("{:?}", String::from_utf8_lossy(bytes)),
        }
    }
}

pub fn decode_constant(reader: &mut ByteReader, ctx: &DecodeContext) -> Result<Constant, DecodeError> {
    let tag = reader.read_u8()?;
    Ok(match tag {
        0 => Constant::Nil,
        1 => Constant::Bool(reader.read_u8()? != 0),
        3 => Constant::Number(reader.read_float(ctx.endianness, ctx.number_size)?),
        4 => Constant::String(reader.read_lua_string(ctx)?),
        other => return Err(DecodeError::BadConstantTag(other)),
    })
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
    fn decodes_nil() {
        let buf = [0u8];
        let mut reader = ByteReader::new(&buf);
        assert_eq!(decode_constant(&mut reader, &ctx()).unwrap(), Constant::Nil);
    }

    #[test]
    fn decodes_bool() {
        let buf = [1u8, 1u8];
        let mut reader = ByteReader::new(&buf);
        assert_eq!(decode_constant(&mut reader, &ctx()).unwrap(), Constant::Bool(true));
    }

    #[test]
    fn decodes_number() {
        let mut buf = vec![3u8];
        buf.extend_from_slice(&42.5f64.to_le_bytes());
        let mut reader = ByteReader::new(&buf);
        assert_eq!(decode_constant(&mut reader, &ctx()).unwrap(), Constant::Number(42.5));
    }

    #[test]
    fn decodes_string_with_trailing_nul() {
        let mut buf = vec![4u8];
        buf.extend_from_slice(&6u32.to_le_bytes());
        buf.extend_from_slice(b"hello\0");
        let mut reader = ByteReader::new(&buf);
        assert_eq!(decode_constant(&mut reader, &ctx()).unwrap(), Constant::String(b"hello\0".to_vec()));
    }

    #[test]
    fn rejects_unused_tag_two() {
        let buf = [2u8];
        let mut reader = ByteReader::new(&buf);
        assert!(matches!(decode_constant(&mut reader, &ctx()), Err(DecodeError::BadConstantTag(2))));
    }

    #[test]
    fn rejects_tag_above_four() {
        let buf = [5u8];
        let mut reader = ByteReader::new(&buf);
        assert!(matches!(decode_constant(&mut reader, &ctx()), Err(DecodeError::BadConstantTag(5))));
    }
}
