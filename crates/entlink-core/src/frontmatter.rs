//! YAML front matter: splitting, rendering and merging.
//!
//! A document has front matter when it starts with a `---` line and a later
//! line is exactly `---`. Everything after the closing line is the body and is
//! never touched by a merge.

use crate::error::{LinkerError, Result};
use crate::types::PropertySet;
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use tracing::debug;

/// Front matter block of a note.
pub type FrontMatter = Mapping;

/// A markdown document split into front matter and body.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedDocument {
    /// Parsed metadata block (empty when the document has none)
    pub front_matter: FrontMatter,
    /// Content after the metadata block
    pub body: String,
}

impl ParsedDocument {
    /// Split `content` into front matter and body.
    ///
    /// A block that is present but is not a YAML mapping is a parse error, so a
    /// document we cannot understand is never rewritten.
    pub fn parse(content: &str) -> Result<Self> {
        let Some((yaml_start, yaml_end, body_start)) = locate_block(content) else {
            return Ok(Self {
                front_matter: FrontMatter::new(),
                body: content.to_string(),
            });
        };

        let yaml = &content[yaml_start..yaml_end];
        let front_matter = if yaml.trim().is_empty() {
            FrontMatter::new()
        } else {
            match serde_yaml::from_str::<Value>(yaml)? {
                Value::Null => FrontMatter::new(),
                Value::Mapping(mapping) => mapping,
                other => {
                    return Err(LinkerError::Parse(format!(
                        "front matter: expected key/value mapping, found {}",
                        value_kind(&other)
                    )))
                }
            }
        };

        Ok(Self {
            front_matter,
            body: content[body_start..].to_string(),
        })
    }

    /// Render back to markdown. An empty block is omitted entirely.
    pub fn render(&self) -> Result<String> {
        if self.front_matter.is_empty() {
            return Ok(self.body.clone());
        }
        let yaml = serde_yaml::to_string(&self.front_matter)?;
        Ok(format!("---\n{}---\n{}", yaml, self.body))
    }
}

/// Keys touched (or deliberately left alone) by a merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Keys that were absent and have been set
    pub added: Vec<String>,
    /// Keys that existed and were replaced
    pub overwritten: Vec<String>,
    /// Keys that existed and were kept
    pub kept: Vec<String>,
}

impl MergeReport {
    /// Whether the merge modified the block
    pub fn changed(&self) -> bool {
        !self.added.is_empty() || !self.overwritten.is_empty()
    }
}

/// Merge `properties` into `block`.
///
/// Absent keys are always set. Present keys are replaced only when
/// `overwrite` is true.
pub fn merge(block: &mut FrontMatter, properties: &PropertySet, overwrite: bool) -> MergeReport {
    let mut report = MergeReport::default();

    for (key, value) in properties {
        let yaml_key = Value::String(key.clone());
        if !block.contains_key(&yaml_key) {
            block.insert(yaml_key, value.clone().into());
            report.added.push(key.clone());
        } else if overwrite {
            block.insert(yaml_key, value.clone().into());
            report.overwritten.push(key.clone());
        } else {
            report.kept.push(key.clone());
        }
    }

    debug!(
        "Merged front matter: {} added, {} overwritten, {} kept",
        report.added.len(),
        report.overwritten.len(),
        report.kept.len()
    );
    report
}

/// Byte ranges of the YAML text and the start of the body.
fn locate_block(content: &str) -> Option<(usize, usize, usize)> {
    let open_len = if content.starts_with("---\n") {
        4
    } else if content.starts_with("---\r\n") {
        5
    } else {
        return None;
    };

    let mut offset = open_len;
    for line in content[open_len..].split_inclusive('\n') {
        if line.trim_end_matches(&['\r', '\n'][..]) == "---" {
            return Some((open_len, offset, offset + line.len()));
        }
        offset += line.len();
    }
    None
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}
