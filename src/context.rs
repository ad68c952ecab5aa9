//! Nested configuration contexts and the prompt derived from them

use crate::error::CliError;

/// One entered context, e.g. `interface`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextFrame {
    pub name: String,
}

/// Per-session context stack.
///
/// The prompt is recomputed on every push/pop: at depth 0 it is the base
/// prompt verbatim; otherwise the base loses its trailing mode glyph(s)
/// (`>` or `#`) and gets `(<frame>-<frame>)> ` appended.
#[derive(Debug, Clone)]
pub struct ContextStack {
    frames: Vec<ContextFrame>,
    base_prompt: String,
    prompt: String,
}

impl ContextStack {
    pub fn new(base_prompt: impl Into<String>) -> Self {
        let base_prompt = base_prompt.into();
        Self {
            frames: Vec::new(),
            prompt: base_prompt.clone(),
            base_prompt,
        }
    }

    pub fn enter(&mut self, name: impl Into<String>) {
        self.frames.push(ContextFrame { name: name.into() });
        self.recompute_prompt();
    }

    pub fn exit_one(&mut self) -> Result<(), CliError> {
        self.frames.pop().ok_or(CliError::ContextUnderflow)?;
        self.recompute_prompt();
        Ok(())
    }

    pub fn exit_all(&mut self) {
        self.frames.clear();
        self.recompute_prompt();
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn frames(&self) -> &[ContextFrame] {
        &self.frames
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn base_prompt(&self) -> &str {
        &self.base_prompt
    }

    /// Prefix `line` with the frame names, outermost first
    pub fn build_full_command(&self, line: &str) -> String {
        if self.frames.is_empty() {
            return line.to_string();
        }
        let mut full = self
            .frames
            .iter()
            .map(|frame| frame.name.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        full.push(' ');
        full.push_str(line);
        full
    }

    fn recompute_prompt(&mut self) {
        if self.frames.is_empty() {
            self.prompt = self.base_prompt.clone();
            return;
        }
        let path = self
            .frames
            .iter()
            .map(|frame| frame.name.as_str())
            .collect::<Vec<_>>()
            .join("-");
        self.prompt = format!("{}({path})> ", strip_mode_glyph(&self.base_prompt));
    }
}

/// Drop a trailing `"> "`/`"# "` pair, or a lone trailing `>`/`#`
fn strip_mode_glyph(base: &str) -> &str {
    let is_glyph = |c: char| c == '>' || c == '#';
    let mut chars = base.char_indices().rev();
    match (chars.next(), chars.next()) {
        (Some(_), Some((idx, second))) if is_glyph(second) => &base[..idx],
        (Some((idx, last)), _) if is_glyph(last) => &base[..idx],
        _ => base,
    }
}
