//! Session state and command dispatch for the REPL.
//!
//! Dispatch is a hand-rolled `match` on the first whitespace-separated
//! token rather than a subcommand-parser crate — the command set is small
//! and flat enough that a parser would add indirection without buying
//! anything. `run_command` is the testable core; `Repl::run` is just its
//! stdin-driving wrapper, exercised in tests via scripted command vectors
//! instead of real stdin.

use std::io::{self, BufRead, Write};

use crate::error::CommandError;
use crate::output::{OutputSystem, Style};
use crate::prototype::Chunk;
use crate::registry::{ArtifactKind, ArtifactRegistry};
use crate::render::render_instruction;

/// Owns the decoded chunk, its artifact registry, and which artifact (if
/// any) is currently selected. One `Session` per running process; tests
/// construct fresh ones freely.
pub struct Session {
    pub chunk: Chunk,
    pub registry: ArtifactRegistry,
    pub selected: Option<usize>,
    pub source_label: String,
}

impl Session {
    pub fn new(chunk: Chunk, registry: ArtifactRegistry, source_label: impl Into<String>) -> Self {
        Self { chunk, registry, selected: None, source_label: source_label.into() }
    }

    /// `@file>> ` / `@<kind>:<hex>>> ` / `@<kind>:<tag>>> `.
    pub fn prompt(&self) -> String {
        match self.selected {
            None => format!("@{}>> ", self.source_label),
            Some(idx) => {
                let artifact = self.registry.get(idx);
                format!("@{}:{}>> ", artifact.kind, artifact.display_identity())
            }
        }
    }

    fn selected_artifact(&self) -> Result<(usize, ArtifactKind, usize), CommandError> {
        let idx = self.selected.ok_or(CommandError::NothingSelected)?;
        let artifact = self.registry.get(idx);
        Ok((idx, artifact.kind, artifact.address))
    }

    fn require_selected_prototype(&self) -> Result<&crate::prototype::Prototype, CommandError> {
        let (_, kind, address) = self.selected_artifact()?;
        if kind != ArtifactKind::Prototype {
            return Err(CommandError::WrongKind("function"));
        }
        self.chunk.find_prototype(address).ok_or(CommandError::WrongKind("function"))
    }
}

/// Runs one command line against `session`, writing any produced output
/// into `out`. Unrecognized commands are silently ignored; recoverable
/// errors are returned to the caller, which is responsible for printing
/// them in `Style::Error` and continuing the loop.
pub fn run_command(session: &mut Session, out: &mut OutputSystem, line: &str) -> Result<bool, CommandError> {
    let mut parts = line.split_whitespace();
    let Some(cmd) = parts.next() else { return Ok(true) };
    let rest: Vec<&str> = parts.collect();

    match cmd {
        "help" => {
            for line in [
                "help", "exit", "clear", "list functions", "list instructions", "list constants",
                "pseudo", "addr", "select address <hex>", "select tag <name>", "tag <name>",
            ] {
                out.add_data(line, Style::Default);
                out.end_of_line();
            }
            Ok(true)
        }
        "exit" => Ok(false),
        "clear" => {
            print!("\x1B[2J\x1B[H");
            io::stdout().flush().ok();
            Ok(true)
        }
        "list" => match rest.first().copied() {
            Some("functions") => {
                for artifact in session.registry.list_by_kind(ArtifactKind::Prototype) {
                    let count = match &artifact.label {
                        crate::registry::ArtifactLabel::Prototype { instruction_count } => *instruction_count,
                        _ => 0,
                    };
                    out.add_data(format!("function[{count}] @ {}", artifact.display_identity()), Style::Default);
                    out.end_of_line();
                }
                Ok(true)
            }
            Some("instructions") => {
                let proto = session.require_selected_prototype()?;
                for inst in &proto.instructions {
                    out.add_data(format!("{:#x}", inst.address), Style::Address);
                    out.add_data(format!("[{}]", inst.opcode as u8), Style::Instruction);
                    out.add_data(inst.opcode.mnemonic(), Style::Keyword);
                    out.add_data(format!("A={} B={} C={}", inst.a, inst.b, inst.c), Style::Register);
                    out.end_of_line();
                }
                Ok(true)
            }
            Some("constants") => {
                let proto = session.require_selected_prototype()?;
                for (constant, &address) in proto.constants.iter().zip(proto.constant_addresses.iter()) {
                    out.add_data(format!("{address:#x}"), Style::Address);
                    out.add_data(format!("[{}]", constant.type_name()), Style::ConstantType);
                    out.add_data(constant.render(), Style::Constant);
                    out.end_of_line();
                }
                Ok(true)
            }
            _ => Ok(true),
        },
        "pseudo" => {
            let proto = session.require_selected_prototype()?;
            for inst in &proto.instructions {
                let line = render_instruction(inst, proto, &session.registry);
                out.add_data(format!("{:#x}", inst.address), Style::Address);
                out.add_data(line, Style::Default);
                out.end_of_line();
            }
            Ok(true)
        }
        "addr" => {
            let (idx, _, _) = session.selected_artifact()?;
            out.add_data(format!("{:#x}", session.registry.get(idx).address), Style::Address);
            out.end_of_line();
            Ok(true)
        }
        "select" => match rest.first().copied() {
            Some("address") => {
                let hex = rest.get(1).ok_or(CommandError::MissingArgument("address"))?;
                let address = usize::from_str_radix(hex.trim_start_matches("0x"), 16)
                    .map_err(|_| CommandError::BadHex((*hex).to_string()))?;
                let idx = session.registry.index_of_address(address).ok_or(CommandError::AddressNotFound(address))?;
                session.selected = Some(idx);
                Ok(true)
            }
            Some("tag") => {
                let name = rest.get(1).ok_or(CommandError::MissingArgument("tag"))?;
                let idx = session
                    .registry
                    .index_of_tag(name)
                    .ok_or_else(|| CommandError::TagNotFound((*name).to_string()))?;
                session.selected = Some(idx);
                Ok(true)
            }
            _ => Ok(true),
        },
        "tag" => {
            let name = rest.first().ok_or(CommandError::MissingArgument("tag"))?;
            let (idx, _, _) = session.selected_artifact()?;
            if session.registry.tag_in_use(name) {
                return Err(CommandError::TagInUse((*name).to_string()));
            }
            session.registry.set_tag(idx, (*name).to_string());
            Ok(true)
        }
        _ => Ok(true),
    }
}

/// Drives the command loop against stdin/stdout. A thin surface over
/// `run_command`, kept small and testable rather than hard-wired to stdin
/// inline.
pub struct Repl<'a> {
    pub session: &'a mut Session,
}

impl<'a> Repl<'a> {
    pub fn new(session: &'a mut Session) -> Self {
        Self { session }
    }

    pub fn run(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        loop {
            write!(stdout, "{}", self.session.prompt())?;
            stdout.flush()?;

            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                break;
            }

            let mut out = OutputSystem::new();
            match run_command(self.session, &mut out, line.trim()) {
                Ok(true) => {
                    for rendered in out.take_lines() {
                        writeln!(stdout, "{rendered}")?;
                    }
                }
                Ok(false) => break,
                Err(err) => {
                    writeln!(stdout, "{}", OutputSystem::color_from_type(err.to_string(), Style::Error))?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::ChunkHeader;
    use crate::prototype::Prototype;

    fn session_with_two_prototypes() -> Session {
        let header = ChunkHeader {
            version: 0x51,
            format: 0,
            endianness: 1,
            int_size: 4,
            size_t_size: 4,
            instruction_size: 4,
            number_size: 8,
            integral_flag: 0,
        };
        let mut registry = ArtifactRegistry::new();

        let nested = Prototype {
            start_offset: 40,
            source_name: vec![],
            line_defined: 0,
            last_line_defined: 0,
            num_upvalues: 0,
            num_parameters: 0,
            is_vararg: 0,
            max_stack_size: 2,
            instructions: vec![],
            constants: vec![],
            constant_addresses: vec![],
            protos: vec![],
            line_info: vec![],
            locals: vec![],
            upvalue_names: vec![],
        };

        let root = Prototype {
            start_offset: 12,
            source_name: vec![],
            line_defined: 0,
            last_line_defined: 0,
            num_upvalues: 0,
            num_parameters: 0,
            is_vararg: 0,
            max_stack_size: 2,
            instructions: vec![],
            constants: vec![],
            constant_addresses: vec![],
            protos: vec![nested],
            line_info: vec![],
            locals: vec![],
            upvalue_names: vec![],
        };
        // Registration order matches decode order: root registers after its
        // children return, so index 0 is the root here only because this is
        // a hand-built fixture, not a real decode pass.
        registry.register(ArtifactKind::Prototype, 12, crate::registry::Artifact::prototype(0));
        registry.register(ArtifactKind::Prototype, 40, crate::registry::Artifact::prototype(0));

        let chunk = Chunk { header, root };
        Session::new(chunk, registry, "luac.out")
    }

    #[test]
    fn prompt_without_selection() {
        let session = session_with_two_prototypes();
        assert_eq!(session.prompt(), "@luac.out>> ");
    }

    #[test]
    fn prompt_with_selected_untagged_artifact() {
        let mut session = session_with_two_prototypes();
        session.selected = Some(0);
        assert_eq!(session.prompt(), "@function:0xc>> ");
    }

    #[test]
    fn select_address_then_tag_round_trip() {
        let mut session = session_with_two_prototypes();
        let mut out = OutputSystem::new();

        run_command(&mut session, &mut out, "select address 28").unwrap();
        run_command(&mut session, &mut out, "tag main").unwrap();
        run_command(&mut session, &mut out, "select tag main").unwrap();
        run_command(&mut session, &mut out, "addr").unwrap();

        let lines = out.take_lines();
        assert!(lines.last().unwrap().contains("0x28"));
    }

    #[test]
    fn list_instructions_without_selection_errors() {
        let mut session = session_with_two_prototypes();
        let mut out = OutputSystem::new();
        let err = run_command(&mut session, &mut out, "list instructions").unwrap_err();
        assert!(matches!(err, CommandError::NothingSelected));
    }

    #[test]
    fn list_instructions_column_is_opcode_number_not_index() {
        // First instruction is LOADK (opcode 1), not MOVE (opcode 0) — if the
        // `[...]` column were the enumeration index rather than the opcode
        // value, this would wrongly read `[0]`.
        use crate::instruction::{Format, Instruction, OpCode};

        let mut session = session_with_two_prototypes();
        let proto = crate::prototype::Prototype {
            start_offset: 12,
            source_name: vec![],
            line_defined: 0,
            last_line_defined: 0,
            num_upvalues: 0,
            num_parameters: 0,
            is_vararg: 0,
            max_stack_size: 2,
            instructions: vec![
                Instruction { address: 12, opcode: OpCode::LoadK, format: Format::ABx, a: 0, b: 0, c: 0, bx: 0, sbx: 0 },
                Instruction { address: 16, opcode: OpCode::Move, format: Format::ABC, a: 0, b: 1, c: 0, bx: 0, sbx: 0 },
            ],
            constants: vec![],
            constant_addresses: vec![],
            protos: vec![],
            line_info: vec![],
            locals: vec![],
            upvalue_names: vec![],
        };
        session.chunk.root = proto;
        let mut out = OutputSystem::new();

        run_command(&mut session, &mut out, "select address c").unwrap();
        run_command(&mut session, &mut out, "list instructions").unwrap();

        let lines = out.take_lines();
        assert!(lines[0].contains("[1]") && lines[0].contains("LOADK"));
        assert!(lines[1].contains("[0]") && lines[1].contains("MOVE"));
    }

    #[test]
    fn unknown_command_is_silently_ignored() {
        let mut session = session_with_two_prototypes();
        let mut out = OutputSystem::new();
        let keep_going = run_command(&mut session, &mut out, "frobnicate").unwrap();
        assert!(keep_going);
        assert!(out.take_lines().is_empty());
    }

    #[test]
    fn tag_collision_is_rejected() {
        let mut session = session_with_two_prototypes();
        let mut out = OutputSystem::new();
        run_command(&mut session, &mut out, "select address c").unwrap();
        run_command(&mut session, &mut out, "tag main").unwrap();
        run_command(&mut session, &mut out, "select address 28").unwrap();
        let err = run_command(&mut session, &mut out, "tag main").unwrap_err();
        assert!(matches!(err, CommandError::TagInUse(_)));
    }
}
