use std::path::PathBuf;

use thiserror::Error;

use crate::types::{Kind, WalkPath};

#[derive(Debug, Error)]
pub enum InterviewError {
    #[error("Cannot set '{key}': '{prefix}' already holds a value")]
    Conflict { key: String, prefix: String },

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Notice '{key}' requires a default")]
    MissingDefault { key: String },

    #[error("Item at {walkpath} has no kind")]
    MissingKind { walkpath: WalkPath },

    #[error("Unknown kind '{kind}' at {walkpath}")]
    UnknownKind { kind: String, walkpath: WalkPath },

    #[error("'{field}' missing for {kind} item at {walkpath}")]
    MissingField {
        field: &'static str,
        kind: Kind,
        walkpath: WalkPath,
    },

    #[error("File not found for include item at {walkpath}: {path}")]
    IncludeNotFound { path: PathBuf, walkpath: WalkPath },

    #[error("Include cycle at {walkpath}: {path} is already being included")]
    IncludeCycle { path: PathBuf, walkpath: WalkPath },

    #[error("Bad {kind} item at {walkpath}: {reason}")]
    BadItem {
        kind: Kind,
        walkpath: WalkPath,
        reason: String,
    },

    #[error("Invalid regular expression '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        source: regex::Error,
    },

    #[error("Unknown fields in interview document: {}", .0.join(", "))]
    UnknownFields(Vec<String>),

    #[error("Failed to parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("Failed to serialize settings: {0}")]
    SerializeError(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] confique::Error),

    #[error("Interview did not settle after {limit} restarts (last change at {walkpath})")]
    RestartLimit { limit: usize, walkpath: WalkPath },

    #[error("Not enough answers for interview")]
    AnswersExhausted,

    #[error("Interrupted")]
    Interrupted,
}
