//! Instruction decoding: opcode table and bit-field extraction by format.
//!
//! 38 opcodes in fixed order, one mode per opcode. Previously backed by an
//! `enum_map` + `once_cell::Lazy` static table; replaced here by an
//! exhaustive `match` in `OpCode::format`, so the mapping's completeness is
//! checked by rustc itself rather than at runtime.

use crate::error::DecodeError;
use crate::reader::{ByteReader, Endianness};

/// Instruction bit-field layout, by format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    ABC,
    ABx,
    AsBx,
    AB,
    AC,
    A,
    SBx,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    Move = 0,
    LoadK = 1,
    LoadBool = 2,
    LoadNil = 3,
    GetUpval = 4,
    GetGlobal = 5,
    GetTable = 6,
    SetGlobal = 7,
    SetUpval = 8,
    SetTable = 9,
    NewTable = 10,
    SelfOp = 11,
    Add = 12,
    Sub = 13,
    Mul = 14,
    Div = 15,
    Mod = 16,
    Pow = 17,
    Unm = 18,
    Not = 19,
    Len = 20,
    Concat = 21,
    Jmp = 22,
    Eq = 23,
    Lt = 24,
    Le = 25,
    Test = 26,
    TestSet = 27,
    Call = 28,
    TailCall = 29,
    Return = 30,
    ForLoop = 31,
    ForPrep = 32,
    TForLoop = 33,
    SetList = 34,
    Close = 35,
    Closure = 36,
    Vararg = 37,
}

impl OpCode {
    pub fn from_u8(value: u8) -> Result<Self, DecodeError> {
        use OpCode::*;
        Ok(match value {
            0 => Move,
            1 => LoadK,
            2 => LoadBool,
            3 => LoadNil,
            4 => GetUpval,
            5 => GetGlobal,
            6 => GetTable,
            7 => SetGlobal,
            8 => SetUpval,
            9 => SetTable,
            10 => NewTable,
            11 => SelfOp,
            12 => Add,
            13 => Sub,
            14 => Mul,
            15 => Div,
            16 => Mod,
            17 => Pow,
            18 => Unm,
            19 => Not,
            20 => Len,
            21 => Concat,
            22 => Jmp,
            23 => Eq,
            24 => Lt,
            25 => Le,
            26 => Test,
            27 => TestSet,
            28 => Call,
            29 => TailCall,
            30 => Return,
            31 => ForLoop,
            32 => ForPrep,
            33 => TForLoop,
            34 => SetList,
            35 => Close,
            36 => Closure,
            37 => Vararg,
            other => return Err(DecodeError::BadOpcode(other)),
        })
    }

    pub fn format(self) -> Format {
        use Format::*;
        use OpCode::*;
        match self {
            Move => ABC,
            LoadK => ABx,
            LoadBool => ABC,
            LoadNil => AB,
            GetUpval => AB,
            GetGlobal => ABx,
            GetTable => ABC,
            SetGlobal => ABx,
            SetUpval => AB,
            SetTable => ABC,
            NewTable => ABC,
            SelfOp => ABC,
            Add | Sub | Mul | Div | Mod | Pow => ABC,
            Unm => AB,
            Not => AB,
            Len => AB,
            Concat => ABC,
            Jmp => SBx,
            Eq | Lt | Le => ABC,
            Test => AC,
            TestSet => ABC,
            Call | TailCall => ABC,
            Return => AB,
            ForLoop | ForPrep => AsBx,
            TForLoop => AC,
            SetList => ABC,
            Close => A,
            Closure => ABx,
            Vararg => AB,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        use OpCode::*;
        match self {
            Move => "MOVE",
            LoadK => "LOADK",
            LoadBool => "LOADBOOL",
            LoadNil => "LOADNIL",
            GetUpval => "GETUPVAL",
            GetGlobal => "GETGLOBAL",
            GetTable => "GETTABLE",
            SetGlobal => "SETGLOBAL",
            SetUpval => "SETUPVAL",
            SetTable => "SETTABLE",
            NewTable => "NEWTABLE",
            SelfOp => "SELF",
            Add => "ADD",
            Sub => "SUB",
            Mul => "MUL",
            Div => "DIV",
            Mod => "MOD",
            Pow => "POW",
            Unm => "UNM",
            Not => "NOT",
            Len => "LEN",
            Concat => "CONCAT",
            Jmp => "JMP",
            Eq => "EQ",
            Lt => "LT",
            Le => "LE",
            Test => "TEST",
            TestSet => "TESTSET",
            Call => "CALL",
            TailCall => "TAILCALL",
            Return => "RETURN",
            ForLoop => "FORLOOP",
            ForPrep => "FORPREP",
            TForLoop => "TFORLOOP",
            SetList => "SETLIST",
            Close => "CLOSE",
            Closure => "CLOSURE",
            Vararg => "VARARG",
        }
    }
}

/// A bias applied to the raw unsigned `sBx`/`Bx` field to recover the
/// signed jump offset.
pub const SBX_BIAS: i64 = 131071;

/// One decoded 32-bit instruction word.
#[derive(Debug, Clone)]
pub struct Instruction {
    pub address: usize,
    pub opcode: OpCode,
    pub format: Format,
    pub a: u32,
    pub b: u32,
    pub c: u32,
    pub bx: u32,
    pub sbx: i64,
}

/// Decodes one 32-bit instruction word under the chunk's recorded
/// endianness. The opcode occupies the low 6 bits; the remaining fields are
/// carved out according to `OpCode::format`.
pub fn decode_instruction(reader: &mut ByteReader, endianness: Endianness) -> Result<Instruction, DecodeError> {
    let address = reader.position();
    let raw = reader.read_uint(endianness, 4)? as u32;

    let opcode = OpCode::from_u8((raw & 0x3F) as u8)?;
    let format = opcode.format();
    let a = (raw >> 6) & 0xFF;

    let mut inst = Instruction { address, opcode, format, a, b: 0, c: 0, bx: 0, sbx: 0 };

    match format {
        Format::ABC => {
            inst.c = (raw >> 14) & 0x1FF;
            inst.b = (raw >> 23) & 0x1FF;
        }
        Format::ABx => {
            inst.bx = (raw >> 14) & 0x3FFFF;
        }
        Format::AsBx => {
            inst.sbx = ((raw >> 14) & 0x3FFFF) as i64 - SBX_BIAS;
        }
        Format::AB => {
            inst.b = (raw >> 23) & 0x1FF;
        }
        Format::AC => {
            inst.c = (raw >> 14) & 0x1FF;
        }
        Format::A => {}
        Format::SBx => {
            inst.sbx = ((raw >> 14) & 0x3FFFF) as i64 - SBX_BIAS;
        }
    }

    Ok(inst)
}

/// `true` if operand `n` refers to a constant (bit 8 set) rather than a
/// register — the RK encoding.
pub fn is_constant_operand(n: u32) -> bool {
    n >= 256
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_decode() {
        let word: u32 = 0x00008080;
        let mut buf = word.to_le_bytes();
        let mut reader = ByteReader::new(&mut buf);
        let inst = decode_instruction(&mut reader, Endianness::Little).unwrap();
        assert_eq!(inst.opcode, OpCode::Move);
        assert_eq!(inst.format, Format::ABC);
        assert_eq!(inst.a, 2);
        assert_eq!(inst.b, 1);
        assert_eq!(inst.c, 0);
    }

    #[test]
    fn loadk_decode() {
        let word: u32 = 0x00004001;
        let buf = word.to_le_bytes();
        let mut reader = ByteReader::new(&buf);
        let inst = decode_instruction(&mut reader, Endianness::Little).unwrap();
        assert_eq!(inst.opcode, OpCode::LoadK);
        assert_eq!(inst.format, Format::ABx);
        assert_eq!(inst.a, 0);
        assert_eq!(inst.bx, 1);
    }

    #[test]
    fn jmp_signed_offset() {
        // bits 14..31 = 0x1FFFE (131070) -> sBx = -1
        let raw: u32 = (22) | ((0x1FFFEu32) << 14);
        let buf = raw.to_le_bytes();
        let mut reader = ByteReader::new(&buf);
        let inst = decode_instruction(&mut reader, Endianness::Little).unwrap();
        assert_eq!(inst.opcode, OpCode::Jmp);
        assert_eq!(inst.sbx, -1);
    }

    #[test]
    fn bad_opcode_is_rejected() {
        let raw: u32 = 38; // out of the 0..=37 range
        let buf = raw.to_le_bytes();
        let mut reader = ByteReader::new(&buf);
        assert!(matches!(decode_instruction(&mut reader, Endianness::Little), Err(DecodeError::BadOpcode(38))));
    }

    #[test]
    fn bit_field_round_trip_abc() {
        // Encode MOVE (op 0) with arbitrary A/B/C then decode it back.
        let (op, a, b, c) = (0u32, 200u32, 300u32, 100u32);
        let raw = op | (a << 6) | (c << 14) | (b << 23);
        let buf = raw.to_le_bytes();
        let mut reader = ByteReader::new(&buf);
        let inst = decode_instruction(&mut reader, Endianness::Little).unwrap();
        assert_eq!(inst.a, a);
        assert_eq!(inst.b, b);
        assert_eq!(inst.c, c);

        let re_encoded = (inst.opcode as u32) | (inst.a << 6) | (inst.c << 14) | (inst.b << 23);
        assert_eq!(re_encoded, raw);
    }

    #[test]
    fn rk_threshold() {
        assert!(!is_constant_operand(255));
        assert!(is_constant_operand(256));
    }
}
