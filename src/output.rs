//! Running-configuration output
//!
//! Applications register one [`OutputBinding`] per piece of state that can be
//! reconstructed as command text. A dump walks the bindings in priority order,
//! brackets each group with `! <group> configuration` / `! end <group>`
//! markers and lets every emitter write its lines through a [`ConfigSink`].

use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

/// A typed value substituted into an output template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FmtValue<'a> {
    Str(&'a str),
    Int(i32),
    Uint(u32),
    Long(i64),
    ULong(u64),
}

impl fmt::Display for FmtValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FmtValue::Str(value) => f.write_str(value),
            FmtValue::Int(value) => write!(f, "{value}"),
            FmtValue::Uint(value) => write!(f, "{value}"),
            FmtValue::Long(value) => write!(f, "{value}"),
            FmtValue::ULong(value) => write!(f, "{value}"),
        }
    }
}

impl<'a> From<&'a str> for FmtValue<'a> {
    fn from(value: &'a str) -> Self {
        FmtValue::Str(value)
    }
}

impl<'a> From<&'a String> for FmtValue<'a> {
    fn from(value: &'a String) -> Self {
        FmtValue::Str(value)
    }
}

impl From<i32> for FmtValue<'_> {
    fn from(value: i32) -> Self {
        FmtValue::Int(value)
    }
}

impl From<u32> for FmtValue<'_> {
    fn from(value: u32) -> Self {
        FmtValue::Uint(value)
    }
}

impl From<i64> for FmtValue<'_> {
    fn from(value: i64) -> Self {
        FmtValue::Long(value)
    }
}

impl From<u64> for FmtValue<'_> {
    fn from(value: u64) -> Self {
        FmtValue::ULong(value)
    }
}

/// Replace `{name}` placeholders with the matching values.
///
/// Placeholders with no value, and a `{` with no closing brace, are copied
/// through unchanged.
pub fn render_template(template: &str, values: &[(&str, FmtValue<'_>)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let name = &after[..close];
        match values.iter().find(|(key, _)| *key == name) {
            Some((_, value)) => out.push_str(&value.to_string()),
            None => {
                out.push('{');
                out.push_str(name);
                out.push('}');
            }
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    out
}

/// Destination of a dump: a session's output or an open file
pub trait ConfigSink {
    fn emit(&mut self, text: &str) -> io::Result<()>;

    fn emit_fmt(&mut self, template: &str, values: &[(&str, FmtValue<'_>)]) -> io::Result<()> {
        self.emit(&render_template(template, values))
    }
}

impl ConfigSink for String {
    fn emit(&mut self, text: &str) -> io::Result<()> {
        self.push_str(text);
        Ok(())
    }
}

/// Sink over any [`Write`], typically a file
pub struct WriterSink<W: Write> {
    inner: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> ConfigSink for WriterSink<W> {
    fn emit(&mut self, text: &str) -> io::Result<()> {
        self.inner.write_all(text.as_bytes())
    }
}

/// Writes the commands reconstructing one piece of state. Receives the
/// template to use (the compiled-in one or an override). Writing nothing is
/// how an emitter suppresses state that is at its default.
pub type Emitter = Arc<dyn Fn(&mut dyn ConfigSink, &str) -> io::Result<()> + Send + Sync>;

#[derive(Clone)]
pub struct OutputBinding {
    pub name: String,
    pub group: String,
    pub template: String,
    pub priority: i32,
    pub emitter: Emitter,
}

impl OutputBinding {
    pub fn new<F>(
        name: impl Into<String>,
        group: impl Into<String>,
        template: impl Into<String>,
        priority: i32,
        emitter: F,
    ) -> Self
    where
        F: Fn(&mut dyn ConfigSink, &str) -> io::Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            group: group.into(),
            template: template.into(),
            priority,
            emitter: Arc::new(emitter),
        }
    }
}

impl fmt::Debug for OutputBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputBinding")
            .field("name", &self.name)
            .field("group", &self.group)
            .field("template", &self.template)
            .field("priority", &self.priority)
            .finish()
    }
}

/// Name → template replacements applied at dump time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatOverrides {
    templates: HashMap<String, String>,
}

impl FormatOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, template: impl Into<String>) {
        self.templates.insert(name.into(), template.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.templates.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl FromIterator<(String, String)> for FormatOverrides {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            templates: iter.into_iter().collect(),
        }
    }
}

/// Output bindings kept sorted by ascending priority, ties in registration
/// order.
///
/// Groups are not indexed: a group's block is whatever run of adjacent
/// bindings shares its name. Two same-group bindings separated by another
/// group's priority produce two blocks.
#[derive(Debug, Clone, Default)]
pub struct OutputRegistry {
    bindings: Vec<OutputBinding>,
}

impl OutputRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, binding: OutputBinding) {
        let position = self
            .bindings
            .iter()
            .position(|existing| existing.priority > binding.priority)
            .unwrap_or(self.bindings.len());
        self.bindings.insert(position, binding);
    }

    pub fn bindings(&self) -> &[OutputBinding] {
        &self.bindings
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn dump(
        &self,
        sink: &mut dyn ConfigSink,
        overrides: Option<&FormatOverrides>,
    ) -> io::Result<()> {
        let mut current: Option<&str> = None;

        for binding in &self.bindings {
            if current != Some(binding.group.as_str()) {
                if let Some(previous) = current {
                    sink.emit(&format!("! end {previous}\n"))?;
                }
                sink.emit(&format!("! {} configuration\n", binding.group))?;
                current = Some(binding.group.as_str());
            }

            let template = overrides
                .and_then(|overrides| overrides.get(&binding.name))
                .unwrap_or(binding.template.as_str());
            (binding.emitter)(&mut *sink, template)?;
        }

        if let Some(previous) = current {
            sink.emit(&format!("! end {previous}\n"))?;
        }
        sink.emit("! end\n")
    }
}
