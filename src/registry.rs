//! The artifact registry: an address-indexed catalog of every parsed
//! entity, with user-assignable symbolic tags.
//!
//! An explicit, session-owned value rather than a global, which is what
//! lets the unit tests below construct a fresh one per test.

use std::fmt;

/// Which kind of parsed entity an `Artifact` wraps. Mirrors
/// `working_data.py`'s `WorkingType` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ArtifactKind {
    HeaderField,
    Prototype,
    Instruction,
    Constant,
    LocalVar,
    UpvalueName,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArtifactKind::HeaderField => "header",
            ArtifactKind::Prototype => "function",
            ArtifactKind::Instruction => "instruction",
            ArtifactKind::Constant => "constant",
            ArtifactKind::LocalVar => "local",
            ArtifactKind::UpvalueName => "upvalue",
        };
        f.write_str(s)
    }
}

/// A human-readable label for what the artifact actually is, used by `list`
/// commands and by the prompt. Distinct from `ArtifactKind` in that it can
/// carry per-instance detail (e.g. a header field's name, an opcode
/// mnemonic) without needing a new enum variant per case.
#[derive(Debug, Clone)]
pub enum ArtifactLabel {
    HeaderField(&'static str),
    Prototype { instruction_count: usize },
    Instruction { opcode: &'static str, opcode_number: u8 },
    Constant { type_name: &'static str },
    LocalVar { name: String },
    UpvalueName { name: String },
}

/// A record wrapping one parsed entity: its kind, the byte offset its bytes
/// began at (its identity), a display label, and an optional user tag.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub address: usize,
    pub label: ArtifactLabel,
    pub tag: Option<String>,
}

impl Artifact {
    pub fn header_field(name: &'static str) -> ArtifactLabel {
        ArtifactLabel::HeaderField(name)
    }

    pub fn prototype(instruction_count: usize) -> ArtifactLabel {
        ArtifactLabel::Prototype { instruction_count }
    }

    pub fn instruction(opcode: &'static str, opcode_number: u8) -> ArtifactLabel {
        ArtifactLabel::Instruction { opcode, opcode_number }
    }

    pub fn constant(type_name: &'static str) -> ArtifactLabel {
        ArtifactLabel::Constant { type_name }
    }

    pub fn local_var(name: String) -> ArtifactLabel {
        ArtifactLabel::LocalVar { name }
    }

    pub fn upvalue_name(name: String) -> ArtifactLabel {
        ArtifactLabel::UpvalueName { name }
    }

    /// Its tag if one has been assigned, else its hex address — the
    /// human-visible identity used when rendering
    /// `CLOSURE` targets and `list` output.
    pub fn display_identity(&self) -> String {
        match &self.tag {
            Some(tag) => tag.clone(),
            None => format!("{:#x}", self.address),
        }
    }
}

/// Process-wide (in practice, session-wide) catalog of every artifact
/// produced by the decode pass. `register` is the only way new entries are
/// created; `set_tag` is the only post-decode mutation.
#[derive(Debug, Default)]
pub struct ArtifactRegistry {
    artifacts: Vec<Artifact>,
}

impl ArtifactRegistry {
    pub fn new() -> Self {
        Self { artifacts: Vec::new() }
    }

    /// Appends a new artifact and returns its index. Address uniqueness
    /// within `kind` is assumed, not enforced.
    pub fn register(&mut self, kind: ArtifactKind, address: usize, label: ArtifactLabel) -> usize {
        self.artifacts.push(Artifact { kind, address, label, tag: None });
        self.artifacts.len() - 1
    }

    /// First artifact at `address`, preferring coarser-grained kinds on
    /// ties (a Prototype's start offset can coincide with the offset of its
    /// first sub-field) — ranked
    /// Prototype > Instruction > everything else.
    pub fn find_by_address(&self, address: usize) -> Option<&Artifact> {
        self.artifacts
            .iter()
            .filter(|a| a.address == address)
            .min_by_key(|a| kind_rank(a.kind))
    }

    pub fn find_by_tag(&self, tag: &str) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.tag.as_deref() == Some(tag))
    }

    /// `true` if `tag` is already assigned to some artifact. Tags must be
    /// globally unique across all kinds.
    pub fn tag_in_use(&self, tag: &str) -> bool {
        self.find_by_tag(tag).is_some()
    }

    /// Assigns `tag` to the artifact at `index`. Caller is responsible for
    /// checking `tag_in_use` first; this never fails silently by clobbering
    /// a collision; see `Session::tag_selected` for the user-facing check.
    pub fn set_tag(&mut self, index: usize, tag: String) {
        self.artifacts[index].tag = Some(tag);
    }

    pub fn get(&self, index: usize) -> &Artifact {
        &self.artifacts[index]
    }

    pub fn index_of_address(&self, address: usize) -> Option<usize> {
        self.artifacts
            .iter()
            .enumerate()
            .filter(|(_, a)| a.address == address)
            .min_by_key(|(_, a)| kind_rank(a.kind))
            .map(|(i, _)| i)
    }

    pub fn index_of_tag(&self, tag: &str) -> Option<usize> {
        self.artifacts.iter().position(|a| a.tag.as_deref() == Some(tag))
    }

    pub fn list_by_kind(&self, kind: ArtifactKind) -> impl Iterator<Item = &Artifact> {
        self.artifacts.iter().filter(move |a| a.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

fn kind_rank(kind: ArtifactKind) -> u8 {
    match kind {
        ArtifactKind::Prototype => 0,
        ArtifactKind::Instruction => 1,
        ArtifactKind::HeaderField => 2,
        ArtifactKind::Constant => 3,
        ArtifactKind::LocalVar => 4,
        ArtifactKind::UpvalueName => 5,
    }
}
