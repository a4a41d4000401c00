//! The 12-byte chunk header: signature, version/format bytes, and the
//! endianness/size quartet every downstream decoder depends on.

use crate::error::DecodeError;
use crate::reader::{ByteReader, DecodeContext, Endianness};
use crate::registry::{Artifact, ArtifactKind, ArtifactRegistry};

pub const SIGNATURE: [u8; 4] = [0x1B, b'L', b'u', b'a'];
pub const SUPPORTED_VERSION: u8 = 0x51;

#[derive(Debug, Clone)]
pub struct ChunkHeader {
    pub version: u8,
    pub format: u8,
    pub endianness: u8,
    pub int_size: u8,
    pub size_t_size: u8,
    pub instruction_size: u8,
    pub number_size: u8,
    pub integral_flag: u8,
}

impl ChunkHeader {
    pub fn decode_context(&self) -> DecodeContext {
        DecodeContext {
            endianness: if self.endianness == 1 { Endianness::Little } else { Endianness::Big },
            int_size: self.int_size,
            size_t_size: self.size_t_size,
            instruction_size: self.instruction_size,
            number_size: self.number_size,
            integral_flag: self.integral_flag,
        }
    }
}

/// Reads exactly 12 bytes in fixed order, registering one artifact for the
/// signature and one for each of the six fields that follow it.
pub fn decode_header(reader: &mut ByteReader, registry: &mut ArtifactRegistry) -> Result<ChunkHeader, DecodeError> {
    let sig_addr = reader.position();
    let signature = reader.read_bytes(4)?;
    let mut found = [0u8; 4];
    found.copy_from_slice(signature);
    if found != SIGNATURE {
        return Err(DecodeError::BadSignature { found });
    }
    registry.register(ArtifactKind::HeaderField, sig_addr, Artifact::header_field("signature"));

    let field = |reader: &mut ByteReader, registry: &mut ArtifactRegistry, name: &'static str| -> Result<u8, DecodeError> {
        let addr = reader.position();
        let value = reader.read_u8()?;
        registry.register(ArtifactKind::HeaderField, addr, Artifact::header_field(name));
        Ok(value)
    };

    let version = field(reader, registry, "version")?;
    if version != SUPPORTED_VERSION {
        log::warn!("chunk declares version {version:#x}, this tool targets {SUPPORTED_VERSION:#x}");
    }

    let format = field(reader, registry, "format")?;
    let endianness = field(reader, registry, "endianness")?;
    let int_size = field(reader, registry, "int_size")?;
    if int_size != 4 && int_size != 8 {
        return Err(DecodeError::BadIntWidth(int_size));
    }
    let size_t_size = field(reader, registry, "size_t_size")?;
    if size_t_size != 4 && size_t_size != 8 {
        return Err(DecodeError::BadIntWidth(size_t_size));
    }
    let instruction_size = field(reader, registry, "instruction_size")?;
    if instruction_size != 4 {
        return Err(DecodeError::BadInstructionSize(instruction_size));
    }
    let number_size = field(reader, registry, "number_size")?;
    if number_size != 4 && number_size != 8 {
        return Err(DecodeError::BadNumberWidth(number_size));
    }
    let integral_flag = field(reader, registry, "integral_flag")?;

    Ok(ChunkHeader {
        version,
        format,
        endianness,
        int_size,
        size_t_size,
        instruction_size,
        number_size,
        integral_flag,
    })
}
