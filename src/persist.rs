//! Settings persistence: load a saved or expected settings file, write the
//! final settings.
//!
//! The format follows the file extension like interview documents do: YAML
//! by default, `.json` and `.toml` otherwise. TOML output is written with
//! `toml_edit` on top of the existing file, so its comments and layout
//! survive and leaves no longer in the store are dropped.

use std::path::Path;

use toml::{Table, Value};
use toml_edit::{DocumentMut, Item, TableLike};

use crate::document::Format;
use crate::error::InterviewError;
use crate::settings::Settings;

/// Read a settings mapping. Top-level keys may be dotted (`"net.host"`) or
/// nested; both land in the same tree.
pub fn load_settings(path: &Path) -> Result<Settings, InterviewError> {
    let content = std::fs::read_to_string(path).map_err(|e| InterviewError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_settings(&content, Format::from_path(path), path)
}

/// Parse settings text. `path` is only used in error messages.
pub fn parse_settings(
    content: &str,
    format: Format,
    path: &Path,
) -> Result<Settings, InterviewError> {
    if content.trim().is_empty() {
        return Ok(Settings::new());
    }
    let parse_error = |source: Box<dyn std::error::Error + Send + Sync>| {
        InterviewError::ParseError {
            path: path.to_path_buf(),
            source,
        }
    };
    let table: Table = match format {
        Format::Yaml => serde_yaml::from_str(content).map_err(|e| parse_error(e.into()))?,
        Format::Json => serde_json::from_str(content).map_err(|e| parse_error(e.into()))?,
        Format::Toml => toml::from_str(content).map_err(|e| parse_error(e.into()))?,
    };
    Settings::from_dotted(table)
}

/// Serialize settings. For TOML, `existing` is the current file content to
/// patch.
pub fn render(
    settings: &Settings,
    format: Format,
    existing: Option<&str>,
) -> Result<String, InterviewError> {
    match format {
        Format::Yaml => serde_yaml::to_string(settings.as_table())
            .map_err(|e| InterviewError::SerializeError(e.to_string())),
        Format::Json => serde_json::to_string_pretty(settings.as_table())
            .map(|json| json + "\n")
            .map_err(|e| InterviewError::SerializeError(e.to_string())),
        Format::Toml => render_toml(existing, settings),
    }
}

/// Patch `existing` (or an empty document) so it holds exactly the store's
/// leaves, keeping comments and formatting of what was already there.
pub fn render_toml(existing: Option<&str>, settings: &Settings) -> Result<String, InterviewError> {
    let mut doc: DocumentMut = existing
        .unwrap_or_default()
        .parse()
        .map_err(|e: toml_edit::TomlError| InterviewError::SerializeError(e.to_string()))?;

    prune(doc.as_table_mut(), "", settings);

    for (key, value) in settings.items() {
        let segments: Vec<&str> = key.split('.').collect();
        let Some((leaf, parents)) = segments.split_last() else {
            continue;
        };

        let mut current: &mut Item = doc.as_item_mut();
        for segment in parents {
            if !current.get(segment).is_some_and(Item::is_table_like) {
                let mut table = toml_edit::Table::new();
                table.set_implicit(true);
                current[segment] = Item::Table(table);
            }
            current = &mut current[segment];
        }

        let mut new_value = to_edit_value(value);
        match current.get_mut(leaf).and_then(Item::as_value_mut) {
            Some(old) => {
                *new_value.decor_mut() = old.decor().clone();
                *old = new_value;
            }
            None => current[leaf] = Item::Value(new_value),
        }
    }

    Ok(doc.to_string())
}

/// Write settings to `path`, creating parent directories. An existing TOML
/// file is patched rather than replaced.
pub fn write_settings(path: &Path, settings: &Settings) -> Result<(), InterviewError> {
    let io_error = |path: &Path, source| InterviewError::IoError {
        path: path.to_path_buf(),
        source,
    };

    let format = Format::from_path(path);
    let existing = match format {
        Format::Toml => match std::fs::read_to_string(path) {
            Ok(content) => Some(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(io_error(path, e)),
        },
        _ => None,
    };

    let content = render(settings, format, existing.as_deref())?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
    }
    std::fs::write(path, content).map_err(|e| io_error(path, e))
}

/// Remove leaves the store no longer holds, and tables left empty by that.
fn prune(table: &mut dyn TableLike, prefix: &str, settings: &Settings) {
    let keys: Vec<String> = table.iter().map(|(key, _)| key.to_string()).collect();
    for key in keys {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        let in_store = settings.get(&path);

        let keep = match table.get_mut(&key).and_then(Item::as_table_like_mut) {
            Some(nested) => {
                prune(nested, &path, settings);
                !nested.is_empty() || in_store.is_some_and(Value::is_table)
            }
            None => in_store.is_some_and(|v| !v.is_table()),
        };
        if !keep {
            table.remove(&key);
        }
    }
}

fn to_edit_value(value: &Value) -> toml_edit::Value {
    match value {
        Value::String(s) => s.as_str().into(),
        Value::Integer(i) => (*i).into(),
        Value::Float(f) => (*f).into(),
        Value::Boolean(b) => (*b).into(),
        Value::Datetime(dt) => match dt.to_string().parse::<toml_edit::Datetime>() {
            Ok(parsed) => parsed.into(),
            Err(_) => dt.to_string().into(),
        },
        Value::Array(items) => {
            let mut array: toml_edit::Array = items.iter().map(to_edit_value).collect();
            array.fmt();
            toml_edit::Value::Array(array)
        }
        Value::Table(table) => {
            let mut inline: toml_edit::InlineTable = table
                .iter()
                .map(|(key, value)| (key.as_str(), to_edit_value(value)))
                .collect();
            inline.fmt();
            toml_edit::Value::InlineTable(inline)
        }
    }
}
