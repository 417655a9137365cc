//! The settings store: a nested `toml::Table` addressed by dotted paths.
//!
//! Every segment of a dotted key names one level of nesting, so `"net.dns.0"`
//! lives at `root["net"]["dns"]["0"]`. Intermediate levels are created on
//! demand by [`Settings::set`], but never through a leaf: writing
//! `"a.b.c"` when `"a.b"` already holds a value is a
//! [`Conflict`](InterviewError::Conflict).
//!
//! Flattening ([`Settings::items`]) is lazy and depth-first and follows the
//! table's insertion order.

use std::fmt;

use toml::{Table, Value};

use crate::error::InterviewError;

/// Hierarchical key/value store for one interview session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    root: Table,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a mapping whose top-level keys may be dotted paths
    /// (`{"net.host": "x"}`) or plain nested tables (`{"net": {"host": "x"}}`).
    ///
    /// Both spellings merge regardless of order. A key given twice is a
    /// [`Conflict`](InterviewError::Conflict).
    pub fn from_dotted(table: Table) -> Result<Self, InterviewError> {
        let mut settings = Settings::new();
        for (key, value) in table {
            settings.merge(key, value)?;
        }
        Ok(settings)
    }

    fn merge(&mut self, key: String, value: Value) -> Result<(), InterviewError> {
        let existing = self.get(&key);
        match value {
            Value::Table(nested) if !nested.is_empty() => {
                if existing.is_some_and(|v| !v.is_table()) {
                    return Err(duplicate(key));
                }
                for (sub, value) in nested {
                    self.merge(format!("{key}.{sub}"), value)?;
                }
                Ok(())
            }
            Value::Table(_) if existing.is_some_and(Value::is_table) => Ok(()),
            _ if existing.is_some() => Err(duplicate(key)),
            value => self.set(&key, value),
        }
    }

    /// Look up a dotted path. Returns `None` when any segment is missing.
    ///
    /// Intermediate paths resolve to their nested table.
    pub fn get(&self, key: &str) -> Option<&Value> {
        let (path, leaf) = match key.rsplit_once('.') {
            Some((p, l)) => (Some(p), l),
            None => (None, key),
        };

        let mut current = &self.root;
        if let Some(path) = path {
            for segment in path.split('.') {
                current = current.get(segment)?.as_table()?;
            }
        }
        current.get(leaf)
    }

    /// Like [`get`](Self::get) but falls back to `default`.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a Value) -> &'a Value {
        self.get(key).unwrap_or(default)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Store `value` at `key`, creating intermediate tables as needed.
    pub fn set(&mut self, key: &str, value: Value) -> Result<(), InterviewError> {
        let segments = split_key(key)?;
        let Some((leaf, parents)) = segments.split_last() else {
            return Err(invalid_key(key));
        };

        let mut table = &mut self.root;
        for (depth, segment) in parents.iter().enumerate() {
            let entry = table
                .entry(segment.to_string())
                .or_insert(Value::Table(Table::new()));
            table = match entry {
                Value::Table(nested) => nested,
                _ => {
                    return Err(InterviewError::Conflict {
                        key: key.to_string(),
                        prefix: parents[..=depth].join("."),
                    });
                }
            };
        }

        table.insert(leaf.to_string(), value);
        Ok(())
    }

    /// Remove and return the value at `key`.
    pub fn delete(&mut self, key: &str) -> Result<Value, InterviewError> {
        let not_found = || InterviewError::KeyNotFound(key.to_string());
        let (path, leaf) = match key.rsplit_once('.') {
            Some((p, l)) => (Some(p), l),
            None => (None, key),
        };

        let mut table = &mut self.root;
        if let Some(path) = path {
            for segment in path.split('.') {
                table = table
                    .get_mut(segment)
                    .and_then(Value::as_table_mut)
                    .ok_or_else(not_found)?;
            }
        }
        table.remove(leaf).ok_or_else(not_found)
    }

    /// Depth-first `(dotted_key, leaf)` pairs.
    pub fn items(&self) -> Items<'_> {
        Items {
            stack: vec![(String::new(), self.root.iter())],
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = String> + '_ {
        self.items().map(|(key, _)| key)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> + '_ {
        self.items().map(|(_, value)| value)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn as_table(&self) -> &Table {
        &self.root
    }

    pub fn into_table(self) -> Table {
        self.root
    }
}

impl From<Table> for Settings {
    fn from(root: Table) -> Self {
        Settings { root }
    }
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.items().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{key} = {}", crate::ops::format_value(value))?;
        }
        Ok(())
    }
}

/// Lazy depth-first flattening of a [`Settings`] tree.
pub struct Items<'a> {
    stack: Vec<(String, toml::map::Iter<'a>)>,
}

impl<'a> Iterator for Items<'a> {
    type Item = (String, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (prefix, iter) = self.stack.last_mut()?;
            match iter.next() {
                None => {
                    self.stack.pop();
                }
                Some((key, value)) => {
                    let path = dotted(prefix, key);
                    match value {
                        Value::Table(nested) => self.stack.push((path, nested.iter())),
                        leaf => return Some((path, leaf)),
                    }
                }
            }
        }
    }
}

fn dotted(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn split_key(key: &str) -> Result<Vec<&str>, InterviewError> {
    let segments: Vec<&str> = key.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(invalid_key(key));
    }
    Ok(segments)
}

fn duplicate(key: String) -> InterviewError {
    InterviewError::Conflict {
        prefix: key.clone(),
        key,
    }
}

fn invalid_key(key: &str) -> InterviewError {
    InterviewError::InvalidValue {
        key: key.to_string(),
        reason: "key has an empty segment".into(),
    }
}
