//! Recursive function prototype decoding, and the top-level `Chunk`.
//!
//! Each successful decode call registers the artifact it produced under
//! the byte offset its bytes started at, so the registry stays in lock
//! step with the decode pass.

use crate::constant::{decode_constant, Constant};
use crate::debug::{decode_line_entry, decode_local_var, LineEntry, LocalVar};
use crate::error::DecodeError;
use crate::header::{decode_header, ChunkHeader};
use crate::instruction::{decode_instruction, Instruction};
use crate::reader::{ByteReader, DecodeContext};
use crate::registry::{Artifact, ArtifactKind, ArtifactRegistry};

#[derive(Debug, Clone)]
pub struct Prototype {
    pub start_offset: usize,
    pub source_name: Vec<u8>,
    pub line_defined: u32,
    pub last_line_defined: u32,
    pub num_upvalues: u8,
    pub num_parameters: u8,
    pub is_vararg: u8,
    pub max_stack_size: u8,
    pub instructions: Vec<Instruction>,
    pub constants: Vec<Constant>,
    /// Byte offset each entry of `constants` was read from, index-paired
    /// with it — `list constants` needs the address column and `Constant`
    /// itself carries no position of its own.
    pub constant_addresses: Vec<usize>,
    pub protos: Vec<Prototype>,
    pub line_info: Vec<LineEntry>,
    pub locals: Vec<LocalVar>,
    pub upvalue_names: Vec<Vec<u8>>,
}

pub struct Chunk {
    pub header: ChunkHeader,
    pub root: Prototype,
}

impl Chunk {
    /// Finds the prototype whose `start_offset` equals `address`, searching
    /// the whole tree depth-first. Used by the REPL to resolve a selected
    /// Prototype artifact back to its decoded fields.
    pub fn find_prototype(&self, address: usize) -> Option<&Prototype> {
        find_prototype_in(&self.root, address)
    }
}

fn find_prototype_in(proto: &Prototype, address: usize) -> Option<&Prototype> {
    if proto.start_offset == address {
        return Some(proto);
    }
    proto.protos.iter().find_map(|child| find_prototype_in(child, address))
}

/// Reads, in order: sourceName, lineDefined, lastLineDefined, numUpvalues,
/// numParameters, isVararg, maxStackSize, instructions, constants, nested
/// prototypes (depth-first), then the debug block, in that fixed order.
pub fn decode_prototype(
    reader: &mut ByteReader,
    ctx: &DecodeContext,
    registry: &mut ArtifactRegistry,
) -> Result<Prototype, DecodeError> {
    let start_offset = reader.position();

    let source_name = reader.read_lua_string(ctx)?;
    let line_defined = reader.read_uint(ctx.endianness, ctx.int_size)? as u32;
    let last_line_defined = reader.read_uint(ctx.endianness, ctx.int_size)? as u32;
    let num_upvalues = reader.read_u8()?;
    let num_parameters = reader.read_u8()?;
    let is_vararg = reader.read_u8()?;
    let max_stack_size = reader.read_u8()?;

    let instruction_count = reader.read_uint(ctx.endianness, ctx.int_size)? as usize;
    let mut instructions = Vec::with_capacity(instruction_count);
    for _ in 0..instruction_count {
        let addr = reader.position();
        let inst = decode_instruction(reader, ctx.endianness)?;
        registry.register(
            ArtifactKind::Instruction,
            addr,
            Artifact::instruction(inst.opcode.mnemonic(), inst.opcode as u8),
        );
        instructions.push(inst);
    }

    let constant_count = reader.read_uint(ctx.endianness, ctx.int_size)? as usize;
    let mut constants = Vec::with_capacity(constant_count);
    let mut constant_addresses = Vec::with_capacity(constant_count);
    for _ in 0..constant_count {
        let addr = reader.position();
        let constant = decode_constant(reader, ctx)?;
        registry.register(ArtifactKind::Constant, addr, Artifact::constant(constant.type_name()));
        constants.push(constant);
        constant_addresses.push(addr);
    }

    let proto_count = reader.read_uint(ctx.endianness, ctx.int_size)? as usize;
    let mut protos = Vec::with_capacity(proto_count);
    for _ in 0..proto_count {
        let proto = decode_prototype(reader, ctx, registry)?;
        registry.register(ArtifactKind::Prototype, proto.start_offset, Artifact::prototype(proto.instructions.len()));
        protos.push(proto);
    }

    let line_count = reader.read_uint(ctx.endianness, ctx.int_size)? as usize;
    let mut line_info = Vec::with_capacity(line_count);
    for _ in 0..line_count {
        line_info.push(decode_line_entry(reader, ctx)?);
    }

    let local_count = reader.read_uint(ctx.endianness, ctx.int_size)? as usize;
    let mut locals = Vec::with_capacity(local_count);
    for _ in 0..local_count {
        let addr = reader.position();
        let local = decode_local_var(reader, ctx)?;
        registry.register(ArtifactKind::LocalVar, addr, Artifact::local_var(String::from_utf8_lossy(&local.name).into_owned()));
        locals.push(local);
    }

    let upvalue_count = reader.read_uint(ctx.endianness, ctx.int_size)? as usize;
    let mut upvalue_names = Vec::with_capacity(upvalue_count);
    for _ in 0..upvalue_count {
        let addr = reader.position();
        let name = reader.read_lua_string(ctx)?;
        registry.register(ArtifactKind::UpvalueName, addr, Artifact::upvalue_name(String::from_utf8_lossy(&name).into_owned()));
        upvalue_names.push(name);
    }

    Ok(Prototype {
        start_offset,
        source_name,
        line_defined,
        last_line_defined,
        num_upvalues,
        num_parameters,
        is_vararg,
        max_stack_size,
        instructions,
        constants,
        constant_addresses,
        protos,
        line_info,
        locals,
        upvalue_names,
    })
}

/// Decodes a complete binary chunk: the 12-byte header, then the root
/// prototype (which recurses for every nested prototype).
pub fn decode_chunk(bytes: &[u8], registry: &mut ArtifactRegistry) -> Result<Chunk, DecodeError> {
    let mut reader = ByteReader::new(bytes);
    let header = decode_header(&mut reader, registry)?;
    let ctx = header.decode_context();
    let root = decode_prototype(&mut reader, &ctx, registry)?;
    registry.register(ArtifactKind::Prototype, root.start_offset, Artifact::prototype(root.instructions.len()));
    Ok(Chunk { header, root })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_prototype_bytes(little_endian: bool) -> Vec<u8> {
        let mut buf = vec![];
        // source name: zero length
        buf.extend_from_slice(&0u32.to_le_bytes());
        // lineDefined, lastLineDefined
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
        // numUpvalues, numParameters, isVararg, maxStackSize
        buf.extend_from_slice(&[0, 0, 0, 2]);
        // instruction count = 0
        buf.extend_from_slice(&0u32.to_le_bytes());
        // constant count = 0
        buf.extend_from_slice(&0u32.to_le_bytes());
        // nested proto count = 0
        buf.extend_from_slice(&0u32.to_le_bytes());
        // line info count = 0
        buf.extend_from_slice(&0u32.to_le_bytes());
        // locals count = 0
        buf.extend_from_slice(&0u32.to_le_bytes());
        // upvalue count = 0
        buf.extend_from_slice(&0u32.to_le_bytes());
        let _ = little_endian;
        buf
    }

    #[test]
    fn decodes_empty_prototype() {
        let bytes = empty_prototype_bytes(true);
        let ctx = DecodeContext {
            endianness: crate::reader::Endianness::Little,
            int_size: 4,
            size_t_size: 4,
            instruction_size: 4,
            number_size: 8,
            integral_flag: 0,
        };
        let mut reader = ByteReader::new(&bytes);
        let mut registry = ArtifactRegistry::new();
        let proto = decode_prototype(&mut reader, &ctx, &mut registry).unwrap();
        assert_eq!(proto.source_name, Vec::<u8>::new());
        assert_eq!(proto.max_stack_size, 2);
        assert!(proto.instructions.is_empty());
        assert!(proto.line_info.is_empty());
        assert!(proto.upvalue_names.is_empty());
    }

    #[test]
    fn full_chunk_with_one_nested_prototype() {
        let mut bytes = vec![0x1B, 0x4C, 0x75, 0x61, 0x51, 0x00, 0x01, 0x04, 0x04, 0x04, 0x08, 0x00];
        let mut inner = empty_prototype_bytes(true);
        // Root prototype: zero-length source name, same scalar fields, zero instructions/constants,
        // then one nested prototype (`inner`), then empty line/local/upvalue tables.
        let mut root = vec![];
        root.extend_from_slice(&0u32.to_le_bytes());
        root.extend_from_slice(&0u32.to_le_bytes());
        root.extend_from_slice(&0u32.to_le_bytes());
        root.extend_from_slice(&[0, 0, 0, 2]);
        root.extend_from_slice(&0u32.to_le_bytes());
        root.extend_from_slice(&0u32.to_le_bytes());
        root.extend_from_slice(&1u32.to_le_bytes()); // one nested prototype
        root.append(&mut inner);
        root.extend_from_slice(&0u32.to_le_bytes());
        root.extend_from_slice(&0u32.to_le_bytes());
        root.extend_from_slice(&0u32.to_le_bytes());

        bytes.append(&mut root);

        let mut registry = ArtifactRegistry::new();
        let chunk = decode_chunk(&bytes, &mut registry).unwrap();
        assert_eq!(chunk.root.protos.len(), 1);

        let protos: Vec<_> = registry.list_by_kind(ArtifactKind::Prototype).collect();
        assert_eq!(protos.len(), 2);
    }
}
