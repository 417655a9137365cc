//! Runtime configuration of the `questline` tool.
//!
//! Layers, lowest priority first:
//!
//! 1. compiled defaults
//! 2. the platform config file (e.g. `~/.config/questline/questline.toml`)
//! 3. an explicit `--config` file
//! 4. `QUESTLINE__*` environment variables, one per option, `__` separating
//!    the section (`QUESTLINE__ANSWERS__PREFIX`)
//!
//! [`resolve`] does the merging on pre-loaded input and performs no I/O;
//! [`load`] gathers the input from disk and the process environment.

use std::path::{Path, PathBuf};

use confique::Config;
use log::{debug, warn};
use toml::{Table, Value};

use crate::error::InterviewError;

pub const ENV_PREFIX: &str = "QUESTLINE";
pub const FILE_NAME: &str = "questline.toml";

/// Settings for running interviews.
#[derive(Config, Debug, Clone, PartialEq)]
pub struct InterviewConfig {
    /// Directory that bare file names (includes, data files) are resolved
    /// against. Defaults to the directory of the interview document.
    pub home: Option<PathBuf>,

    /// Fallback directory for bare file names not found under `home`.
    pub templates_dir: Option<PathBuf>,

    /// Give up after this many consecutive restarts of the walk (0 = never).
    #[config(default = 10000)]
    pub max_restarts: usize,

    /// Reject interview documents containing fields no item understands.
    #[config(default = false)]
    pub strict: bool,

    /// Scripted answers files.
    #[config(nested)]
    pub answers: AnswersConfig,
}

/// Format of answers files.
#[derive(Config, Debug, Clone, PartialEq)]
pub struct AnswersConfig {
    /// Lines starting with this prefix are answers.
    #[config(default = "answer:")]
    pub prefix: String,

    /// Lines starting with this marker are ignored.
    #[config(default = "=====")]
    pub separator: String,
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            home: None,
            templates_dir: None,
            max_restarts: 10000,
            strict: false,
            answers: AnswersConfig::default(),
        }
    }
}

impl Default for AnswersConfig {
    fn default() -> Self {
        Self {
            prefix: "answer:".into(),
            separator: "=====".into(),
        }
    }
}

/// Everything [`resolve`] needs, already read.
#[derive(Debug, Default)]
pub struct ConfigInput {
    /// File contents, lowest priority first.
    pub files: Vec<(PathBuf, String)>,
    /// Raw environment variables; only `QUESTLINE__*` ones are used.
    pub env_vars: Vec<(String, String)>,
}

/// Merge the layers and let confique fill in defaults.
pub fn resolve(input: ConfigInput) -> Result<InterviewConfig, InterviewError> {
    let mut merged = Table::new();
    for (path, content) in &input.files {
        reject_unknown_keys(content, path)?;
        let table: Table = toml::from_str(content).map_err(|e| InterviewError::ParseError {
            path: path.clone(),
            source: e.into(),
        })?;
        merged = overlay(merged, table);
    }
    merged = overlay(merged, env_layer(input.env_vars)?);

    let layer: <InterviewConfig as Config>::Layer =
        Value::Table(merged)
            .try_into()
            .map_err(|e: toml::de::Error| InterviewError::InvalidValue {
                key: "<config>".into(),
                reason: e.to_string(),
            })?;

    InterviewConfig::builder()
        .preloaded(layer)
        .load()
        .map_err(InterviewError::from)
}

/// Location of the per-user config file.
pub fn platform_path() -> Option<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "questline")?;
    Some(dirs.config_dir().join(FILE_NAME))
}

/// Load the configuration. An explicit file must exist; the platform file
/// is optional.
pub fn load(explicit: Option<&Path>) -> Result<InterviewConfig, InterviewError> {
    let read = |path: &Path| {
        std::fs::read_to_string(path).map_err(|e| InterviewError::IoError {
            path: path.to_path_buf(),
            source: e,
        })
    };

    let mut files = Vec::new();
    if let Some(path) = platform_path()
        && path.is_file()
    {
        files.push((path.clone(), read(&path)?));
    }
    if let Some(path) = explicit {
        files.push((path.to_path_buf(), read(path)?));
    }

    resolve(ConfigInput {
        files,
        env_vars: std::env::vars().collect(),
    })
}

/// A commented TOML template of every option and its default.
pub fn template() -> String {
    confique::toml::template::<InterviewConfig>(confique::toml::FormatOptions::default())
}

fn reject_unknown_keys(content: &str, path: &Path) -> Result<(), InterviewError> {
    let mut unknown = Vec::new();
    let deserializer = toml::Deserializer::new(content);
    let _layer: <InterviewConfig as Config>::Layer =
        serde_ignored::deserialize(deserializer, |ignored| {
            unknown.push(format!("{}: {ignored}", path.display()));
        })
        .map_err(|e| InterviewError::ParseError {
            path: path.to_path_buf(),
            source: e.into(),
        })?;

    if unknown.is_empty() {
        Ok(())
    } else {
        Err(InterviewError::UnknownFields(unknown))
    }
}

/// Lay `top` over `base`. Sections present in both are combined key by key.
fn overlay(mut base: Table, top: Table) -> Table {
    for (key, value) in top {
        let value = match (base.remove(&key), value) {
            (Some(Value::Table(section)), Value::Table(top_section)) => {
                Value::Table(overlay(section, top_section))
            }
            (_, value) => value,
        };
        base.insert(key, value);
    }
    base
}

/// How the text of an environment variable becomes an option value.
#[derive(Debug, Clone, Copy)]
enum EnvKind {
    Text,
    Count,
    Flag,
}

/// The environment variables read, with the option each one sets.
const ENV_VARS: [(&str, &str, EnvKind); 6] = [
    ("QUESTLINE__HOME", "home", EnvKind::Text),
    ("QUESTLINE__TEMPLATES_DIR", "templates_dir", EnvKind::Text),
    ("QUESTLINE__MAX_RESTARTS", "max_restarts", EnvKind::Count),
    ("QUESTLINE__STRICT", "strict", EnvKind::Flag),
    ("QUESTLINE__ANSWERS__PREFIX", "answers.prefix", EnvKind::Text),
    ("QUESTLINE__ANSWERS__SEPARATOR", "answers.separator", EnvKind::Text),
];

/// The layer set by `QUESTLINE__*` variables. Values are typed by the option
/// they set, so an answers prefix of `123` stays text. Unrecognised
/// `QUESTLINE__*` names are logged and skipped.
fn env_layer(vars: impl IntoIterator<Item = (String, String)>) -> Result<Table, InterviewError> {
    let needle = format!("{ENV_PREFIX}__");
    let mut layer = Table::new();

    for (name, raw) in vars {
        if !name.starts_with(&needle) {
            continue;
        }
        let Some((_, option, kind)) = ENV_VARS.iter().find(|(var, ..)| *var == name) else {
            warn!("Ignoring unknown environment variable {name}");
            continue;
        };
        let value = env_value(&raw, *kind).map_err(|reason| InterviewError::InvalidValue {
            key: name.clone(),
            reason,
        })?;
        debug!("{name} sets {option}");

        match option.split_once('.') {
            Some((section, field)) => {
                let entry = layer
                    .entry(section)
                    .or_insert_with(|| Value::Table(Table::new()));
                if let Value::Table(table) = entry {
                    table.insert(field.to_string(), value);
                }
            }
            None => {
                layer.insert(option.to_string(), value);
            }
        }
    }

    Ok(layer)
}

fn env_value(raw: &str, kind: EnvKind) -> Result<Value, String> {
    match kind {
        EnvKind::Text => Ok(Value::String(raw.to_string())),
        EnvKind::Count => raw
            .trim()
            .parse::<u32>()
            .map(|n| Value::Integer(n.into()))
            .map_err(|_| format!("'{raw}' is not a count")),
        EnvKind::Flag => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(Value::Boolean(true)),
            "false" | "no" | "off" | "0" => Ok(Value::Boolean(false)),
            _ => Err(format!("'{raw}' is not true or false")),
        },
    }
}
