//! Per-opcode pseudo-code rendering: one Lua-like source line per decoded
//! instruction.
//!
//! Grounded on `lua_instruction.py`'s `pseudo()`: each sub-value (a register
//! reference, a resolved constant, a keyword like `PC`/`not`/`nil`, a
//! `CLOSURE` target) is individually run through `color_from_type` before
//! being embedded in the composed line, exactly as the source's
//! `reg`/`kst`/`UPV` closures do — so every category in `Style` actually
//! shows up in pseudo output, not just in `list` tables.

use crate::instruction::{is_constant_operand, Instruction, OpCode};
use crate::output::{OutputSystem, Style};
use crate::prototype::Prototype;
use crate::registry::ArtifactRegistry;

fn styled(text: impl std::fmt::Display, style: Style) -> String {
    OutputSystem::color_from_type(text.to_string(), style)
}

/// `R(n)`, styled as one `Style::Register` token.
fn r(n: u32) -> String {
    styled(format!("R({n})"), Style::Register)
}

/// Renders an RK-encoded operand: a constant if bit 8 is set, else a
/// register.
fn rk(proto: &Prototype, n: u32) -> String {
    if is_constant_operand(n) {
        let idx = (n - 256) as usize;
        match proto.constants.get(idx) {
            Some(c) => styled(c.render(), Style::Constant),
            None => styled(format!("K({n})"), Style::Constant),
        }
    } else {
        r(n)
    }
}

/// Renders a direct constant-table index, used where the instruction
/// format already guarantees the operand is a constant (`LOADK`'s `Bx`,
/// `GETGLOBAL`/`SETGLOBAL`'s `Bx`) rather than an RK-encoded register/constant.
fn kst(proto: &Prototype, n: u32) -> String {
    match proto.constants.get(n as usize) {
        Some(c) => styled(c.render(), Style::Constant),
        None => styled(format!("K({n})"), Style::Constant),
    }
}

fn upv(proto: &Prototype, n: u32) -> String {
    match proto.upvalue_names.get(n as usize) {
        Some(name) => styled(String::from_utf8_lossy(name), Style::Constant),
        None => styled(format!("upvalues[{n}]"), Style::Constant),
    }
}

fn multiple_registers(start: i64, end: i64) -> String {
    if end <= start {
        return r(start.max(0) as u32);
    }
    (start..=end).map(|i| r(i as u32)).collect::<Vec<_>>().join(", ")
}

fn multiple_registers_set(start: i64, end: i64) -> String {
    format!("{} = ", multiple_registers(start, end))
}

/// Renders one instruction's pseudo-code line. `proto` supplies the
/// constant/upvalue/nested-prototype tables the instruction's operands
/// index into; `registry` resolves `CLOSURE` targets to their tag or
/// address. Every register, keyword, constant, number, and address
/// embedded in the line carries its own `Style`, per spec.md §4.8.
pub fn render_instruction(inst: &Instruction, proto: &Prototype, registry: &ArtifactRegistry) -> String {
    let a = inst.a as i64;
    let b = inst.b as i64;
    let c = inst.c as i64;
    let pc = styled("PC", Style::Keyword);

    match inst.opcode {
        OpCode::Move => format!("{} = {}", r(inst.a), r(inst.b)),
        OpCode::LoadK => format!("{} = {}", r(inst.a), kst(proto, inst.bx)),
        OpCode::LoadBool => {
            let suffix = if inst.c != 0 { format!("{pc}++") } else { String::new() };
            format!("{} = {} == {} {suffix}", r(inst.a), styled(inst.b, Style::Number), styled(1, Style::Number))
        }
        OpCode::LoadNil => format!("{} = {}", multiple_registers(a, b), styled("nil", Style::Constant)),
        OpCode::GetUpval => format!("{} = {}", r(inst.a), upv(proto, inst.b)),
        OpCode::GetGlobal => format!("{} = _G[{}]", r(inst.a), kst(proto, inst.bx)),
        OpCode::GetTable => format!("{} = {}[{}]", r(inst.a), r(inst.b), rk(proto, inst.c)),
        OpCode::SetGlobal => format!("_G[{}] = {}", kst(proto, inst.bx), r(inst.a)),
        OpCode::SetUpval => format!("{} = {}", upv(proto, inst.b), r(inst.a)),
        OpCode::SetTable => format!("{}[{}] = {}", r(inst.a), rk(proto, inst.b), rk(proto, inst.c)),
        OpCode::NewTable => format!("{} = newtable({}, {})", r(inst.a), r(inst.b), r(inst.c)),
        OpCode::SelfOp => format!(
            "{} = {rb}; {ra} = {rb}[{rk}]",
            r((a + 1) as u32),
            rb = r(inst.b),
            ra = r(inst.a),
            rk = rk(proto, inst.c),
        ),
        OpCode::Add => format!("{} = {} + {}", r(inst.a), rk(proto, inst.b), rk(proto, inst.c)),
        OpCode::Sub => format!("{} = {} - {}", r(inst.a), rk(proto, inst.b), rk(proto, inst.c)),
        OpCode::Mul => format!("{} = {} * {}", r(inst.a), rk(proto, inst.b), rk(proto, inst.c)),
        OpCode::Div => format!("{} = {} / {}", r(inst.a), rk(proto, inst.b), rk(proto, inst.c)),
        OpCode::Mod => format!("{} = {} % {}", r(inst.a), rk(proto, inst.b), rk(proto, inst.c)),
        OpCode::Pow => format!("{} = {} ^ {}", r(inst.a), rk(proto, inst.b), rk(proto, inst.c)),
        OpCode::Unm => format!("{} = -{}", r(inst.a), r(inst.b)),
        OpCode::Not => format!("{} = {} {}", r(inst.a), styled("not", Style::Keyword), r(inst.b)),
        OpCode::Len => format!("{} = len({})", r(inst.a), r(inst.b)),
        OpCode::Concat => format!("{} = {} .. ... .. {}", r(inst.a), r(inst.b), r(inst.c)),
        OpCode::Jmp => format!("{pc} += {}", styled(inst.sbx, Style::Number)),
        OpCode::Eq => {
            format!("if ({} == {}) != {} then {pc}++", rk(proto, inst.b), rk(proto, inst.c), styled(inst.a, Style::Number))
        }
        OpCode::Lt => {
            format!("if ({} < {}) != {} then {pc}++", rk(proto, inst.b), rk(proto, inst.c), styled(inst.a, Style::Number))
        }
        OpCode::Le => {
            format!("if ({} <= {}) != {} then {pc}++", rk(proto, inst.b), rk(proto, inst.c), styled(inst.a, Style::Number))
        }
        OpCode::Test => {
            format!("if not ({} <=> {}) then {pc}++", r(inst.a), styled(inst.c, Style::Number))
        }
        OpCode::TestSet => format!(
            "if not ({} <=> {}) then {} = {}; {pc}++",
            r(inst.b),
            styled(inst.c, Style::Number),
            r(inst.a),
            r(inst.b),
        ),
        OpCode::Call => {
            let call_args = match inst.b {
                0 => r((a + 1) as u32),
                1 => String::new(),
                _ => multiple_registers(a + 1, a + b - 1),
            };
            let results = match inst.c {
                0 => format!("{} = ", r(inst.a)),
                1 => String::new(),
                _ => multiple_registers_set(a, a + c - 2),
            };
            format!("{results}{}({call_args})", r(inst.a))
        }
        OpCode::TailCall => {
            format!("return {}({})", r(inst.a), multiple_registers(a + 1, a + b - 1))
        }
        OpCode::Return => {
            let return_regs = match inst.b {
                1 => String::new(),
                0 => multiple_registers(a, a + proto.max_stack_size as i64 - 1),
                _ => multiple_registers(a, a + b - 2),
            };
            format!("return {return_regs}")
        }
        OpCode::ForLoop => format!(
            "{a} += {step}; if {a} <?= {limit} then {pc} += {pc_inc} {var} = {a}",
            a = r(inst.a),
            step = r((a + 2) as u32),
            limit = r((a + 1) as u32),
            var = r((a + 3) as u32),
            pc_inc = styled(inst.sbx, Style::Number),
        ),
        OpCode::ForPrep => {
            format!("{} -= {}; {pc} += {}", r(inst.a), r((a + 2) as u32), styled(inst.sbx, Style::Number))
        }
        OpCode::TForLoop => {
            let set_regs = multiple_registers_set(a + 3, a + 2 + c);
            let call_args = multiple_registers(a + 1, a + 2);
            format!(
                "{set_regs}{}({call_args}) if {cond} ~= {nil} then {dst} = {src} else {pc}++",
                r(inst.a),
                cond = r((a + 3) as u32),
                nil = styled("nil", Style::Constant),
                dst = r((a + 2) as u32),
                src = r((a + 3) as u32),
            )
        }
        OpCode::SetList => "TODO: SETLIST".to_string(),
        OpCode::Close => "TODO: CLOSE".to_string(),
        OpCode::Closure => {
            let Some(closure) = proto.protos.get(inst.bx as usize) else {
                return format!("{} = function[?] @ ?", r(inst.a));
            };
            let size = styled(closure.instructions.len(), Style::Number);
            let identity = match registry.find_by_address(closure.start_offset) {
                Some(artifact) if artifact.tag.is_some() => styled(artifact.display_identity(), Style::Tag),
                Some(artifact) => styled(artifact.display_identity(), Style::Address),
                None => styled(format!("{:#x}", closure.start_offset), Style::Address),
            };
            format!("{} = function[{size}] @ {identity}", r(inst.a))
        }
        OpCode::Vararg => "TODO: VARARG".to_string(),
    }
}
