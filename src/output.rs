//! The output formatter: a token/style accumulator with an optional
//! tabular format template, rendered through the `colored` crate.
//!
//! Accumulates tokens rather than printing eagerly; a line is only
//! flushed once `end_of_line` is called, which lets a format template be
//! applied to a whole line's tokens at once.

use colored::{Color, Colorize};

/// The eleven style categories: ten named styles plus DEFAULT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Address,
    Keyword,
    Instruction,
    Register,
    ConstantType,
    Constant,
    Number,
    Tag,
    Error,
    Warning,
    Default,
}

impl Style {
    fn color(self) -> Color {
        match self {
            Style::Address => Color::BrightMagenta,
            Style::Keyword => Color::Green,
            Style::Instruction => Color::BrightBlack,
            Style::Register => Color::BrightCyan,
            Style::ConstantType => Color::BrightRed,
            Style::Constant => Color::BrightGreen,
            Style::Number => Color::BrightBlue,
            Style::Tag => Color::Yellow,
            Style::Error => Color::BrightRed,
            Style::Warning => Color::BrightYellow,
            Style::Default => Color::White,
        }
    }
}

enum Token {
    Data(String, Style),
    EndOfLine,
}

/// Accumulates styled tokens across one or more logical lines, and renders
/// them either space-separated or through a loaded `{}`-style format
/// template. Stateful across calls within a render — the caller must call
/// `end_of_line` at each logical line boundary.
#[derive(Default)]
pub struct OutputSystem {
    prepared: Vec<Token>,
    format_template: Option<String>,
    lines: Vec<String>,
}

impl OutputSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_data(&mut self, data: impl Into<String>, style: Style) {
        self.prepared.push(Token::Data(data.into(), style));
    }

    pub fn load_format(&mut self, template: impl Into<String>) {
        self.format_template = Some(template.into());
    }

    pub fn clear_format(&mut self) {
        self.format_template = None;
    }

    /// Colors `data` per `style`, using `colored`'s `Color` variants in
    /// place of a `termcolor`-style palette (exact colors are cosmetic; the
    /// category set is what matters).
    pub fn color_from_type(data: impl AsRef<str>, style: Style) -> String {
        data.as_ref().color(style.color()).to_string()
    }

    /// Marks the end of a logical line: flushes the tokens accumulated
    /// since the previous `end_of_line` (or since construction) into
    /// `lines`, formatted through the loaded template if one is set, else
    /// space-separated.
    pub fn end_of_line(&mut self) {
        let pending: Vec<String> = self
            .prepared
            .drain(..)
            .filter_map(|t| match t {
                Token::Data(s, style) => Some(Self::color_from_type(s, style)),
                Token::EndOfLine => None,
            })
            .collect();

        let rendered = match &self.format_template {
            Some(template) => apply_template(template, &pending),
            None => pending.join(" "),
        };
        self.lines.push(rendered);
    }

    /// Drains and returns every finished line produced since the last call.
    pub fn take_lines(&mut self) -> Vec<String> {
        std::mem::take(&mut self.lines)
    }
}

/// A minimal `{}`-positional template expander — the Rust analogue of
/// `str.format(*args)`. Only `{}` placeholders are supported; this is all
/// any tabular-layout template this crate needs ever uses.
fn apply_template(template: &str, args: &[String]) -> String {
    let mut out = String::new();
    let mut args = args.iter();
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '{' && chars.peek() == Some(&'}') {
            chars.next();
            if let Some(arg) = args.next() {
                out.push_str(arg);
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn space_separated_without_template() {
        let mut out = OutputSystem::new();
        out.add_data("R(0)", Style::Register);
        out.add_data("=", Style::Default);
        out.add_data("R(1)", Style::Register);
        out.end_of_line();

        let lines = out.take_lines();
        assert_eq!(lines.len(), 1);
        // Colored output still contains the plain text as a substring.
        assert!(lines[0].contains("R(0)"));
        assert!(lines[0].contains("R(1)"));
    }

    #[test]
    fn template_formats_accumulated_tokens() {
        let mut out = OutputSystem::new();
        out.load_format("{} | {}");
        out.add_data("0x0", Style::Address);
        out.add_data("MOVE", Style::Instruction);
        out.end_of_line();

        let lines = out.take_lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains('|'));
    }

    #[test]
    fn clear_format_reverts_to_space_separated() {
        let mut out = OutputSystem::new();
        out.load_format("{} - {}");
        out.clear_format();
        out.add_data("a", Style::Default);
        out.add_data("b", Style::Default);
        out.end_of_line();

        let lines = out.take_lines();
        assert!(!lines[0].contains('-'));
    }

    #[test]
    fn multiple_lines_accumulate_independently() {
        let mut out = OutputSystem::new();
        out.add_data("first", Style::Default);
        out.end_of_line();
        out.add_data("second", Style::Default);
        out.end_of_line();

        let lines = out.take_lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("first"));
        assert!(lines[1].contains("second"));
    }
}
