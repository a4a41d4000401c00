//! Error types for the decode pipeline and the REPL's command dispatch.

use thiserror::Error;

/// Errors that abort the decode pass before the REPL ever starts.
///
/// These surface once, at startup, and cause the process to exit non-zero
/// (see `main.rs`). No partially-decoded `Chunk` is ever published when one
/// of these is returned.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unexpected end of file at offset {offset}")]
    UnexpectedEof { offset: usize },

    #[error("bad chunk signature: expected 1B 4C 75 61, got {found:02X?}")]
    BadSignature { found: [u8; 4] },

    #[error("unsupported instruction size {0} (must be 4)")]
    BadInstructionSize(u8),

    #[error("unsupported opcode {0} (valid range is 0..=37)")]
    BadOpcode(u8),

    #[error("unsupported constant tag {0} (valid tags are 0, 1, 3, 4)")]
    BadConstantTag(u8),

    #[error("unsupported int/size_t width {0} (must be 4 or 8)")]
    BadIntWidth(u8),

    #[error("unsupported number width {0} (must be 4 or 8)")]
    BadNumberWidth(u8),
}

/// Errors raised while handling a REPL command. Always recoverable: the
/// caller prints the message in the ERROR style and the loop continues.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("unknown subcommand {0:?}")]
    UnknownSubcommand(String),

    #[error("missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("not a valid hex address: {0:?}")]
    BadHex(String),

    #[error("no artifact selected")]
    NothingSelected,

    #[error("selected artifact is not a {0}")]
    WrongKind(&'static str),

    #[error("no artifact found at address {0:#x}")]
    AddressNotFound(usize),

    #[error("no artifact tagged {0:?}")]
    TagNotFound(String),

    #[error("tag {0:?} is already in use")]
    TagInUse(String),
}
