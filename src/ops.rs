//! Display and result types: presented items, run outcomes and the
//! results comparison.
//!
//! These are returned to (or written for) the caller; nothing here reads
//! input or touches the store.

use std::collections::BTreeSet;
use std::fmt;

use toml::Value;

use crate::item::Item;
use crate::settings::Settings;

/// Format a settings value for display: strings unquoted, lists as
/// `[a, b]`.
pub(crate) fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(format_value).collect();
            format!("[{}]", items.join(", "))
        }
        other => other.to_string(),
    }
}

fn or_dash<T: fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

/// An item as presented to whoever answers it.
pub struct ItemView<'a> {
    item: &'a Item,
    verbose: bool,
}

impl<'a> ItemView<'a> {
    pub fn new(item: &'a Item, verbose: bool) -> Self {
        Self { item, verbose }
    }
}

impl fmt::Display for ItemView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let item = self.item;
        let node = item.node();

        if self.verbose {
            writeln!(f, "==========")?;
            writeln!(f, "walkpath:           {}", item.walkpath())?;
            writeln!(f, "name:               {}", or_dash(node.name.as_deref()))?;
            writeln!(f, "section:            {}", or_dash(node.section.as_deref()))?;
            writeln!(f, "key:                {}", or_dash(node.key.as_deref()))?;
            writeln!(f, "fqkey:              {}", item.fqkey())?;
            writeln!(
                f,
                "parameterize:       {}",
                or_dash(node.parameterize.as_deref())
            )?;
            writeln!(
                f,
                "type:               {}",
                or_dash(node.value_type.map(|t| t.as_str()))
            )?;
            writeln!(f, "hidden:             {}", node.hidden)?;
            writeln!(f, "multivalue:         {}", node.multivalue)?;
            writeln!(f, "range:              {}", or_dash(node.range.as_deref()))?;
            writeln!(f, "regexp:             {}", or_dash(node.regexp.as_deref()))?;
            writeln!(f, "required:           {}", node.required)?;
            writeln!(f, "----------")?;
        }

        let values = item
            .values()
            .map(|values| format_value(&Value::Array(values.to_vec())));
        writeln!(f, "title:              {}", or_dash(item.title()))?;
        writeln!(f, "text:               {}", or_dash(item.text()))?;
        writeln!(f, "values:             {}", or_dash(values))?;
        write!(
            f,
            "default:            {}",
            or_dash(item.default().map(format_value))
        )
    }
}

/// Knobs for [`Interview::run`](crate::Interview::run).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Show item metadata before each item.
    pub verbose: bool,
    /// Do not present items at all.
    pub quiet: bool,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every item was answered. `leftover` counts answers never consumed.
    Completed { answered: usize, leftover: usize },
    /// The user interrupted the run.
    Aborted { answered: usize },
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Completed { answered, leftover: 0 } => {
                write!(f, "Completed after {answered} answers")
            }
            RunOutcome::Completed { answered, leftover } => write!(
                f,
                "Completed after {answered} answers ({leftover} unused)"
            ),
            RunOutcome::Aborted { answered } => {
                write!(f, "Aborted after {answered} answers")
            }
        }
    }
}

/// Actual and expected value of one key.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyComparison {
    pub key: String,
    pub actual: Option<Value>,
    pub expected: Option<Value>,
}

impl KeyComparison {
    pub fn is_match(&self) -> bool {
        self.actual == self.expected
    }
}

/// Per-key comparison of the session's settings with expected results,
/// over the sorted union of both key sets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Comparison {
    pub entries: Vec<KeyComparison>,
}

impl Comparison {
    pub fn new(actual: &Settings, expected: &Settings) -> Self {
        let keys: BTreeSet<String> = actual.keys().chain(expected.keys()).collect();
        let entries = keys
            .into_iter()
            .map(|key| KeyComparison {
                actual: actual.get(&key).cloned(),
                expected: expected.get(&key).cloned(),
                key,
            })
            .collect();
        Self { entries }
    }

    pub fn mismatches(&self) -> impl Iterator<Item = &KeyComparison> {
        self.entries.iter().filter(|entry| !entry.is_match())
    }

    pub fn is_match(&self) -> bool {
        self.mismatches().next().is_none()
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |value: &Option<Value>| {
            value
                .as_ref()
                .map_or_else(|| "<missing>".to_string(), format_value)
        };
        for entry in &self.entries {
            writeln!(f, "key:      {}", entry.key)?;
            writeln!(f, "result:   {}", show(&entry.actual))?;
            writeln!(f, "expected: {}", show(&entry.expected))?;
            if !entry.is_match() {
                writeln!(f, "  *** mismatch ***")?;
            }
            writeln!(f, "----------")?;
        }
        Ok(())
    }
}
