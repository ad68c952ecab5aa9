//! Extended command documentation
//!
//! Syntax and summary come from the grammar (the node carrying the command's
//! callback name); the optional [`DocTable`] adds a long description and
//! examples. Rendered on the terminal by `show doc` or written to a file as
//! Markdown, reStructuredText or plain text.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::CliError;
use crate::grammar::GrammarNode;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DocEntry {
    #[serde(default)]
    pub description: Option<String>,
    /// One example per line
    #[serde(default)]
    pub examples: Option<String>,
}

impl DocEntry {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            examples: None,
        }
    }

    pub fn with_examples(mut self, examples: impl Into<String>) -> Self {
        self.examples = Some(examples.into());
        self
    }
}

/// Command name → documentation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct DocTable {
    entries: HashMap<String, DocEntry>,
}

impl DocTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, entry: DocEntry) {
        self.entries.insert(name.into(), entry);
    }

    pub fn with(mut self, name: impl Into<String>, entry: DocEntry) -> Self {
        self.insert(name, entry);
        self
    }

    pub fn get(&self, name: &str) -> Option<&DocEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocFormat {
    Markdown,
    Rst,
    Text,
}

impl DocFormat {
    pub fn label(self) -> &'static str {
        match self {
            DocFormat::Markdown => "Markdown",
            DocFormat::Rst => "reStructuredText",
            DocFormat::Text => "plain text",
        }
    }
}

impl FromStr for DocFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "md" => Ok(DocFormat::Markdown),
            "rst" => Ok(DocFormat::Rst),
            "txt" => Ok(DocFormat::Text),
            other => Err(format!("unknown documentation format '{other}'")),
        }
    }
}

/// Everything known about one command
#[derive(Debug, Clone)]
pub struct CommandDoc<'a> {
    pub name: &'a str,
    pub syntax: Option<String>,
    pub summary: Option<&'a str>,
    pub entry: Option<&'a DocEntry>,
}

impl<'a> CommandDoc<'a> {
    pub fn lookup(root: &'a GrammarNode, docs: Option<&'a DocTable>, name: &'a str) -> Self {
        let node = root.find_by_callback(name);
        Self {
            name,
            syntax: node.map(GrammarNode::syntax),
            summary: node.and_then(GrammarNode::help),
            entry: docs.and_then(|docs| docs.get(name)),
        }
    }

    /// Terminal layout used by `show doc`
    pub fn render_terminal(&self) -> String {
        let mut out = String::from("\nSyntax:\n");
        let _ = writeln!(out, "    {}", self.syntax.as_deref().unwrap_or(self.name));
        out.push('\n');

        if let Some(summary) = self.summary {
            let _ = writeln!(out, "    {summary}\n");
        }

        match self.entry {
            Some(entry) => {
                if let Some(description) = &entry.description {
                    let _ = writeln!(out, "Description:\n    {description}\n");
                }
                if let Some(examples) = &entry.examples {
                    out.push_str("Examples:\n");
                    for line in examples.lines() {
                        let _ = writeln!(out, "    {line}");
                    }
                    out.push('\n');
                }
            }
            None => out.push_str("  (no extended documentation available)\n\n"),
        }
        out
    }

    pub fn render(&self, format: DocFormat) -> String {
        let mut out = String::new();
        let description = self.entry.and_then(|entry| entry.description.as_deref());
        let examples = self.entry.and_then(|entry| entry.examples.as_deref());

        match format {
            DocFormat::Markdown => {
                let _ = write!(out, "# {}\n\n", self.name);
                if let Some(syntax) = &self.syntax {
                    let _ = write!(out, "## Syntax\n\n```\n{syntax}\n```\n\n");
                }
                if let Some(summary) = self.summary {
                    let _ = write!(out, "## Summary\n\n{summary}\n\n");
                }
                if let Some(description) = description {
                    let _ = write!(out, "## Description\n\n{description}\n\n");
                }
                if let Some(examples) = examples {
                    let _ = write!(out, "## Examples\n\n```\n{}\n```\n\n", examples.trim_end());
                }
            }
            DocFormat::Rst => {
                let _ = write!(out, "{}\n{}\n\n", self.name, "=".repeat(self.name.len()));
                if let Some(syntax) = &self.syntax {
                    let _ = write!(out, "Syntax\n------\n\n::\n\n    {syntax}\n\n");
                }
                if let Some(summary) = self.summary {
                    let _ = write!(out, "Summary\n-------\n\n{summary}\n\n");
                }
                if let Some(description) = description {
                    let _ = write!(out, "Description\n-----------\n\n{description}\n\n");
                }
                if let Some(examples) = examples {
                    out.push_str("Examples\n--------\n\n::\n\n");
                    for line in examples.lines() {
                        let _ = writeln!(out, "    {line}");
                    }
                }
            }
            DocFormat::Text => {
                let _ = write!(out, "{}\n{}\n\n", self.name, "-".repeat(self.name.len()));
                if let Some(syntax) = &self.syntax {
                    let _ = write!(out, "SYNTAX:\n    {syntax}\n\n");
                }
                if let Some(summary) = self.summary {
                    let _ = write!(out, "SUMMARY:\n    {summary}\n\n");
                }
                if let Some(description) = description {
                    let _ = write!(out, "DESCRIPTION:\n    {description}\n\n");
                }
                if let Some(examples) = examples {
                    out.push_str("EXAMPLES:\n");
                    for line in examples.lines() {
                        let _ = writeln!(out, "    {line}");
                    }
                }
            }
        }
        out
    }

    pub fn write_file(&self, path: &Path, format: DocFormat) -> Result<(), CliError> {
        fs::write(path, self.render(format)).map_err(|e| CliError::file_io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{compile_command, ArgSpec};

    fn root() -> GrammarNode {
        GrammarNode::or(vec![compile_command(
            "set_name",
            "set name <value>",
            Some("Set the greeting name"),
            &[ArgSpec::pattern("value", "[a-z]+")],
            None,
        )
        .unwrap()])
    }

    fn docs() -> DocTable {
        DocTable::new().with(
            "set_name",
            DocEntry::new("Changes who the hello command greets.")
                .with_examples("set name alice\nset name bob"),
        )
    }

    #[test]
    fn test_terminal_rendering() {
        let root = root();
        let docs = docs();
        let text = CommandDoc::lookup(&root, Some(&docs), "set_name").render_terminal();
        assert!(text.contains("Syntax:\n    set name <value>\n"));
        assert!(text.contains("    Set the greeting name\n"));
        assert!(text.contains("Description:\n    Changes who"));
        assert!(text.contains("Examples:\n    set name alice\n    set name bob\n"));
    }

    #[test]
    fn test_missing_entry() {
        let root = root();
        let text = CommandDoc::lookup(&root, None, "set_name").render_terminal();
        assert!(text.contains("(no extended documentation available)"));

        let unknown = CommandDoc::lookup(&root, Some(&DocTable::new()), "frob").render_terminal();
        assert!(unknown.contains("Syntax:\n    frob\n"));
    }

    #[test]
    fn test_file_formats() {
        let root = root();
        let docs = docs();
        let doc = CommandDoc::lookup(&root, Some(&docs), "set_name");

        let md = doc.render(DocFormat::Markdown);
        assert!(md.starts_with("# set_name\n\n## Syntax\n\n```\nset name <value>\n```"));

        let rst = doc.render(DocFormat::Rst);
        assert!(rst.starts_with("set_name\n========\n\n"));

        let txt = doc.render(DocFormat::Text);
        assert!(txt.contains("SUMMARY:\n    Set the greeting name\n"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("set_name.md");
        doc.write_file(&path, DocFormat::Markdown).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), md);
    }

    #[test]
    fn test_format_names_and_yaml() {
        assert_eq!("rst".parse::<DocFormat>(), Ok(DocFormat::Rst));
        assert!("pdf".parse::<DocFormat>().is_err());

        let table = DocTable::from_yaml_str("hello:\n  description: Say hello\n").unwrap();
        assert_eq!(table.get("hello").and_then(|e| e.description.as_deref()), Some("Say hello"));
    }
}
