//! Interview documents: typed item nodes and their parsing.
//!
//! A document is an ordered list of [`Node`]s. It can be written as YAML
//! (the default), TOML or JSON; the format follows the file extension. The
//! root may be a list of items, a single item mapping, or a mapping with an
//! `interview` list (the only shape TOML can express):
//!
//! ```toml
//! [[interview]]
//! kind = "question"
//! key = "name"
//! title = "Name"
//! text = "Who are you?"
//! ```
//!
//! Parsing goes through `serde_ignored`, so fields that no node consumes
//! (typos such as `match_vaules`) are reported back alongside the nodes.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use toml::Value;

use crate::error::InterviewError;
use crate::types::{Kind, SortOrder, ValueType, WalkPath};

/// One interview item as written in the document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Node {
    pub kind: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub disabled: bool,

    pub section: Option<String>,
    pub key: Option<String>,
    #[serde(rename = "type")]
    pub value_type: Option<ValueType>,
    pub value: Option<Value>,
    /// Setting whose integer value is appended to the key.
    pub parameterize: Option<String>,

    pub default: Option<Value>,
    pub default_from_file: Option<PathBuf>,
    #[serde(default)]
    pub force: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub multivalue: bool,
    pub range: Option<String>,
    pub regexp: Option<String>,
    #[serde(default)]
    pub required: bool,
    pub values: Option<Vec<Value>>,
    pub values_from_file: Option<PathBuf>,
    pub values_from_directory: Option<String>,
    pub values_regexp: Option<String>,
    pub values_sort: Option<SortOrder>,
    pub title: Option<String>,
    pub text: Option<String>,

    pub interview: Option<Vec<Node>>,
    #[serde(alias = "match_name")]
    pub match_key: Option<String>,
    pub match_values: Option<Vec<Value>>,
    pub match_not_values: Option<Vec<Value>>,

    pub path: Option<String>,

    pub reset_keys: Option<Vec<String>>,
    pub reset_key_regexp: Option<String>,
}

impl Node {
    /// The node's kind, or a document error naming its walk path.
    pub fn kind_at(&self, walkpath: &WalkPath) -> Result<Kind, InterviewError> {
        let raw = self
            .kind
            .as_deref()
            .ok_or_else(|| InterviewError::MissingKind {
                walkpath: walkpath.clone(),
            })?;
        raw.parse().map_err(|()| InterviewError::UnknownKind {
            kind: raw.to_string(),
            walkpath: walkpath.clone(),
        })
    }
}

/// Serialized form of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Toml,
    Json,
}

impl Format {
    /// Pick a format from a file extension; anything unrecognized is YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Format::Toml,
            Some("json") => Format::Json,
            _ => Format::Yaml,
        }
    }
}

/// Nodes parsed from one file, plus the fields none of them understood.
#[derive(Debug, Clone, Default)]
pub struct Parsed {
    pub nodes: Vec<Node>,
    pub unknown_fields: Vec<String>,
}

/// Parse document text. `path` is only used in error messages.
pub fn parse(content: &str, format: Format, path: &Path) -> Result<Parsed, InterviewError> {
    let parse_error = |source: Box<dyn std::error::Error + Send + Sync>| {
        InterviewError::ParseError {
            path: path.to_path_buf(),
            source,
        }
    };

    if content.trim().is_empty() {
        return Ok(Parsed::default());
    }

    let raw: serde_json::Value = match format {
        Format::Yaml => serde_yaml::from_str(content).map_err(|e| parse_error(e.into()))?,
        Format::Toml => toml::from_str(content).map_err(|e| parse_error(e.into()))?,
        Format::Json => serde_json::from_str(content).map_err(|e| parse_error(e.into()))?,
    };

    let items = match raw {
        serde_json::Value::Null => return Ok(Parsed::default()),
        serde_json::Value::Array(_) => raw,
        serde_json::Value::Object(mut map) => {
            if !map.contains_key("kind")
                && let Some(items) = map.remove("interview")
            {
                items
            } else {
                serde_json::Value::Array(vec![serde_json::Value::Object(map)])
            }
        }
        other => {
            return Err(parse_error(
                format!("expected a list of items, found {other}").into(),
            ));
        }
    };

    let mut unknown_fields = Vec::new();
    let nodes: Vec<Node> = serde_ignored::deserialize(items, |ignored| {
        unknown_fields.push(ignored.to_string());
    })
    .map_err(|e| parse_error(e.into()))?;

    Ok(Parsed {
        nodes,
        unknown_fields,
    })
}
