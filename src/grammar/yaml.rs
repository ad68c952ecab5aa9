//! YAML grammar export/import
//!
//! A compiled grammar can be exported as YAML (keywords, argument patterns,
//! help strings and callback names), edited or translated, and loaded back at
//! startup. A loaded grammar has no direct handlers: commands are dispatched
//! through their callback names.
//!
//! For `foo.yaml`, an optional companion `foo_formats.yaml` carries an
//! `output_formats:` mapping of binding name to dump template.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::node::{GrammarNode, NodeKind};
use crate::error::GrammarError;
use crate::output::FormatOverrides;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum YamlKind {
    Str,
    Int,
    Re,
    Seq,
    Or,
    Option,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct YamlAttrs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    callback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    syntax: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct YamlNode {
    #[serde(rename = "type")]
    kind: YamlKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    help: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    attrs: Option<YamlAttrs>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<YamlNode>,
}

impl YamlNode {
    fn from_node(node: &GrammarNode) -> Self {
        let mut yaml = YamlNode {
            kind: YamlKind::Seq,
            id: node.id.clone(),
            string: None,
            pattern: None,
            min: None,
            max: None,
            help: node.attrs.help.clone(),
            attrs: None,
            children: node.children().iter().map(YamlNode::from_node).collect(),
        };
        match &node.kind {
            NodeKind::Keyword(word) => {
                yaml.kind = YamlKind::Str;
                yaml.string = Some(word.clone());
            }
            NodeKind::Int { min, max } => {
                yaml.kind = YamlKind::Int;
                yaml.min = Some(*min);
                yaml.max = Some(*max);
            }
            NodeKind::Pattern { source, .. } => {
                yaml.kind = YamlKind::Re;
                yaml.pattern = Some(source.clone());
            }
            NodeKind::Seq(_) => yaml.kind = YamlKind::Seq,
            NodeKind::Or(_) => yaml.kind = YamlKind::Or,
            NodeKind::Optional(_) => yaml.kind = YamlKind::Option,
        }
        if node.attrs.callback.is_some() || node.attrs.syntax.is_some() {
            yaml.attrs = Some(YamlAttrs {
                callback: node.attrs.callback.clone(),
                syntax: node.attrs.syntax.clone(),
            });
        }
        yaml
    }

    fn into_node(self) -> Result<GrammarNode, GrammarError> {
        let id = self.id.clone();
        let mut node = match self.kind {
            YamlKind::Str => {
                let word = self.string.ok_or_else(|| missing("str", "string"))?;
                GrammarNode::keyword(word)
            }
            YamlKind::Int => GrammarNode::int(
                id.clone().unwrap_or_default(),
                self.min.unwrap_or(i64::MIN),
                self.max.unwrap_or(i64::MAX),
            ),
            YamlKind::Re => {
                let pattern = self.pattern.ok_or_else(|| missing("re", "pattern"))?;
                GrammarNode::pattern(id.clone().unwrap_or_default(), &pattern)?
            }
            YamlKind::Seq => GrammarNode::seq(into_nodes(self.children)?),
            YamlKind::Or => GrammarNode::or(into_nodes(self.children)?),
            YamlKind::Option => {
                let mut children = into_nodes(self.children)?;
                let child = match children.len() {
                    1 => children.remove(0),
                    0 => return Err(missing("option", "children")),
                    _ => GrammarNode::seq(children),
                };
                GrammarNode::optional(child)
            }
        };

        node.id = id;
        if let Some(help) = self.help {
            node = node.with_help(help);
        }
        if let Some(attrs) = self.attrs {
            node.attrs.callback = attrs.callback;
            node.attrs.syntax = attrs.syntax;
        }
        Ok(node)
    }
}

fn into_nodes(children: Vec<YamlNode>) -> Result<Vec<GrammarNode>, GrammarError> {
    children.into_iter().map(YamlNode::into_node).collect()
}

fn missing(kind: &str, field: &str) -> GrammarError {
    GrammarError::Definition {
        message: format!("'{kind}' node without '{field}'"),
    }
}

fn io_error(path: &Path, source: std::io::Error) -> GrammarError {
    GrammarError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn header(app_name: &str, grammar_env: &str) -> String {
    format!(
        "# {app_name} CLI Grammar Template
#
# This file defines the CLI grammar in YAML format.
# You can customize this file to create an alternate CLI interface.
#
# USAGE:
#   1. Export this template:  write yaml grammar.yaml
#   2. Edit the file to customize command names and help strings
#   3. Set environment: {grammar_env}=translated.yaml
#   4. Restart the application; it will use the translated grammar
#
# TRANSLATION EXAMPLE:
#   To translate the CLI to French:
#     - Change 'string: help' to 'string: aide'
#     - Change 'string: show' to 'string: afficher'
#     - Translate all 'help:' strings
#
# IMPORTANT:
#   - Keep all 'attrs: callback:' values unchanged (they select the handler)
#   - Keep 'id:' values unchanged (they are used for argument extraction)
#   - Only modify 'string:', 'help:' and 'pattern:' values
#
# OUTPUT FORMATS:
#   Create a companion file 'grammar_formats.yaml' with:
#     output_formats:
#       set_name: \"set name {{name}}\\n\"
#   These override the default output for 'write terminal'.
#
# =============================================================================

"
    )
}

/// Serialize a grammar tree, preceded by a commented translation guide
pub fn export(root: &GrammarNode, app_name: &str, grammar_env: &str) -> Result<String, GrammarError> {
    let body = serde_yaml::to_string(&YamlNode::from_node(root))?;
    Ok(header(app_name, grammar_env) + &body)
}

pub fn export_to_file(
    root: &GrammarNode,
    app_name: &str,
    grammar_env: &str,
    path: &Path,
) -> Result<(), GrammarError> {
    let text = export(root, app_name, grammar_env)?;
    fs::write(path, text).map_err(|e| io_error(path, e))?;
    info!("Exported grammar to {}", path.display());
    Ok(())
}

/// A grammar loaded from YAML plus the output templates that came with it
#[derive(Debug)]
pub struct LoadedGrammar {
    pub root: GrammarNode,
    pub formats: FormatOverrides,
}

/// Parse a grammar tree from YAML text
pub fn from_str(text: &str) -> Result<GrammarNode, GrammarError> {
    let yaml: YamlNode = serde_yaml::from_str(text)?;
    yaml.into_node()
}

/// Companion formats path: `dir/foo.yaml` -> `dir/foo_formats.yaml`
pub fn formats_path(path: &Path) -> Option<PathBuf> {
    let stem = path.file_stem()?.to_str()?;
    let ext = path.extension()?.to_str()?;
    Some(path.with_file_name(format!("{stem}_formats.{ext}")))
}

/// Load a grammar file and its companion formats file, if present
pub fn load(path: &Path) -> Result<LoadedGrammar, GrammarError> {
    let text = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    let root = from_str(&text)?;
    info!("Loaded grammar from {}", path.display());

    let formats = match formats_path(path) {
        Some(companion) if companion.exists() => match load_formats(&companion) {
            Ok(formats) => formats,
            Err(e) => {
                warn!("Ignoring output formats {}: {}", companion.display(), e);
                FormatOverrides::default()
            }
        },
        _ => FormatOverrides::default(),
    };

    Ok(LoadedGrammar { root, formats })
}

#[derive(Debug, Default, Deserialize)]
struct FormatsFile {
    #[serde(default)]
    output_formats: BTreeMap<String, String>,
}

/// Load an `output_formats:` mapping of binding name to template
pub fn load_formats(path: &Path) -> Result<FormatOverrides, GrammarError> {
    let text = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    let file: FormatsFile = serde_yaml::from_str(&text)?;
    debug!(
        "Loaded {} output format(s) from {}",
        file.output_formats.len(),
        path.display()
    );
    Ok(file.output_formats.into_iter().collect())
}
