//! Command-line argument parsing.
//!
//! Exists only to get a file path and a verbosity flag in front of the
//! decoder.

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "lua51disasm", about = "Interactive disassembler for Lua 5.1 binary chunks")]
pub struct Args {
    /// Path to a Lua 5.1 binary chunk (e.g. `luac.out`).
    pub file: PathBuf,

    /// Increase log verbosity (info-level messages, such as the bad-version warning).
    #[arg(short, long)]
    pub verbose: bool,
}
