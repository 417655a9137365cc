//! The item model: one document node bound to its place in the walk and to
//! the settings key it writes.
//!
//! An [`Item`] is materialized when the engine reaches a node that may write
//! a value. Materializing resolves the node's dynamic fields (values and
//! defaults read from files or directories) and compiles its `range` and
//! `regexp`, so a malformed document is reported before any answer is
//! requested. [`Item::set`] is the only path by which answers reach the
//! store.

use regex::Regex;
use toml::Value;

use crate::document::Node;
use crate::error::InterviewError;
use crate::file::Resolver;
use crate::settings::Settings;
use crate::types::{DirSelector, Kind, SortOrder, ValueType, WalkPath};
use crate::validate::{self, NumericRange, Rules};

/// Fully qualified key `[section.]key[.counter]` of a node.
///
/// `key` overrides the node's own key (branches resolve `match_key` and
/// resets resolve `reset_keys` through here). The section is only applied
/// to keys without a dot. With `parameterize`, the integer stored under that
/// setting (0 when absent) is appended.
pub fn fqkey(
    node: &Node,
    kind: Kind,
    walkpath: &WalkPath,
    key: Option<&str>,
    settings: &Settings,
) -> Result<String, InterviewError> {
    let key = key
        .or(node.key.as_deref())
        .ok_or_else(|| InterviewError::MissingField {
            field: "key",
            kind,
            walkpath: walkpath.clone(),
        })?;

    let mut fqkey = match &node.section {
        Some(section) if !key.contains('.') => format!("{section}.{key}"),
        _ => key.to_string(),
    };

    if let Some(counter_key) = &node.parameterize {
        let count = match settings.get(counter_key) {
            None => 0,
            Some(value) => {
                validate::as_integer(value).map_err(|reason| InterviewError::InvalidValue {
                    key: counter_key.clone(),
                    reason,
                })?
            }
        };
        fqkey = format!("{fqkey}.{count}");
    }

    Ok(fqkey)
}

pub(crate) fn compile_regex(pattern: &str) -> Result<Regex, InterviewError> {
    Regex::new(pattern).map_err(|source| InterviewError::InvalidRegex {
        pattern: pattern.to_string(),
        source,
    })
}

/// A node ready to receive a value.
#[derive(Debug, Clone)]
pub struct Item {
    walkpath: WalkPath,
    kind: Kind,
    fqkey: String,
    node: Node,
    range: Option<NumericRange>,
    regexp: Option<Regex>,
}

impl Item {
    /// Bind `node` to its walk path and resolve its dynamic fields.
    pub fn resolve(
        node: &Node,
        kind: Kind,
        walkpath: WalkPath,
        settings: &Settings,
        files: &Resolver,
    ) -> Result<Self, InterviewError> {
        let fqkey = fqkey(node, kind, &walkpath, None, settings)?;
        let bad_item = |reason: String| InterviewError::BadItem {
            kind,
            walkpath: walkpath.clone(),
            reason,
        };

        let mut node = node.clone();

        if let Some(path) = &node.default_from_file {
            let mut content = files.read_to_string(path)?;
            if content.ends_with('\n') {
                content.pop();
                if content.ends_with('\r') {
                    content.pop();
                }
            }
            node.default = Some(Value::String(content));
        }

        if let Some(selector) = &node.values_from_directory {
            let selector: DirSelector = selector.parse().map_err(bad_item)?;
            let names = files.list_dir(&selector)?;
            node.values = Some(names.into_iter().map(Value::String).collect());
        }

        if let Some(path) = &node.values_from_file {
            let content = files.read_to_string(path)?;
            node.values = Some(
                content
                    .lines()
                    .filter(|line| !line.is_empty())
                    .map(|line| Value::String(line.to_string()))
                    .collect(),
            );
        }

        if let Some(values) = node.values.take() {
            let mut values = match &node.values_regexp {
                Some(pattern) => {
                    let re = compile_regex(pattern)?;
                    values
                        .into_iter()
                        .filter(|v| validate::matches_at_start(&re, &validate::scalar_text(v)))
                        .collect()
                }
                None => values,
            };

            if let Some(ty @ (ValueType::Int | ValueType::Float | ValueType::Str)) =
                node.value_type
            {
                values = values
                    .iter()
                    .map(|v| validate::coerce_scalar(v, ty))
                    .collect::<Result<_, _>>()
                    .map_err(|reason| bad_item(format!("allowed values: {reason}")))?;
            }

            match node.values_sort {
                Some(SortOrder::Asc) => values.sort_by(validate::compare_values),
                Some(SortOrder::Desc) => values.sort_by(|a, b| validate::compare_values(b, a)),
                None => {}
            }
            node.values = Some(values);
        }

        let range = node
            .range
            .as_deref()
            .map(|spec| NumericRange::parse(spec, node.value_type))
            .transpose()
            .map_err(bad_item)?;
        let regexp = node.regexp.as_deref().map(compile_regex).transpose()?;

        Ok(Item {
            walkpath,
            kind,
            fqkey,
            node,
            range,
            regexp,
        })
    }

    pub fn walkpath(&self) -> &WalkPath {
        &self.walkpath
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn fqkey(&self) -> &str {
        &self.fqkey
    }

    /// The node with its dynamic fields resolved.
    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn title(&self) -> Option<&str> {
        self.node.title.as_deref()
    }

    pub fn text(&self) -> Option<&str> {
        self.node.text.as_deref()
    }

    pub fn values(&self) -> Option<&[Value]> {
        self.node.values.as_deref()
    }

    pub fn default(&self) -> Option<&Value> {
        self.node.default.as_ref()
    }

    pub fn hidden(&self) -> bool {
        self.node.hidden
    }

    /// Coerce, validate and store `value` under the item's key, returning
    /// what was stored. Nothing is written when any step fails.
    ///
    /// Notices ignore `value` and store their default. An absent or empty
    /// value falls back to the default.
    pub fn set(&self, settings: &mut Settings, value: Option<Value>) -> Result<Value, InterviewError> {
        let invalid = |reason: String| InterviewError::InvalidValue {
            key: self.fqkey.clone(),
            reason,
        };

        let value = if self.kind == Kind::Notice {
            let default = self
                .node
                .default
                .clone()
                .ok_or_else(|| InterviewError::MissingDefault {
                    key: self.fqkey.clone(),
                })?;
            Some(default)
        } else {
            value
        };

        let value = match value {
            Some(v) if !validate::is_blank(Some(&v)) => v,
            given => match (&self.node.default, given) {
                (Some(default), _) => default.clone(),
                (None, Some(empty)) => empty,
                (None, None) => return Err(invalid("no value given and no default".into())),
            },
        };

        let value = validate::coerce(value, self.node.value_type).map_err(invalid)?;

        let elements = match &value {
            Value::Array(items) if !self.node.multivalue => {
                return Err(invalid(format!(
                    "{} values given for a single-valued item",
                    items.len()
                )));
            }
            Value::Array(items) => items.clone(),
            single => vec![single.clone()],
        };

        Rules {
            required: self.node.required,
            values: self.node.values.as_deref(),
            regexp: self.regexp.as_ref(),
            range: self.range.as_ref(),
        }
        .check(&elements)
        .map_err(invalid)?;

        settings.set(&self.fqkey, value.clone())?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::node;
    use std::fs;
    use tempfile::TempDir;

    fn s(v: &str) -> Value {
        Value::String(v.into())
    }

    fn item(yaml: &str) -> Item {
        let n = node(yaml);
        let kind = n.kind_at(&WalkPath::root()).unwrap();
        Item::resolve(&n, kind, WalkPath::root(), &Settings::new(), &Resolver::default()).unwrap()
    }

    #[test]
    fn fqkey_plain_and_sectioned() {
        let settings = Settings::new();
        let at = WalkPath::root();
        let plain = node("kind: question\nkey: name");
        assert_eq!(fqkey(&plain, Kind::Question, &at, None, &settings).unwrap(), "name");

        let sectioned = node("kind: question\nkey: host\nsection: net");
        assert_eq!(
            fqkey(&sectioned, Kind::Question, &at, None, &settings).unwrap(),
            "net.host"
        );
        // Dotted keys ignore the section.
        assert_eq!(
            fqkey(&sectioned, Kind::Question, &at, Some("disk.size"), &settings).unwrap(),
            "disk.size"
        );
    }

    #[test]
    fn fqkey_parameterized() {
        let mut settings = Settings::new();
        let at = WalkPath::root();
        let n = node("kind: question\nkey: name\nsection: users\nparameterize: users.count");
        assert_eq!(
            fqkey(&n, Kind::Question, &at, None, &settings).unwrap(),
            "users.name.0"
        );
        settings.set("users.count", s("2")).unwrap();
        assert_eq!(
            fqkey(&n, Kind::Question, &at, None, &settings).unwrap(),
            "users.name.2"
        );
        settings.set("users.count", s("many")).unwrap();
        assert!(matches!(
            fqkey(&n, Kind::Question, &at, None, &settings),
            Err(InterviewError::InvalidValue { .. })
        ));
    }

    #[test]
    fn fqkey_without_key_is_missing_field() {
        let n = node("kind: set");
        match fqkey(&n, Kind::Set, &vec![2].into(), None, &Settings::new()) {
            Err(InterviewError::MissingField { field, kind, walkpath }) => {
                assert_eq!(field, "key");
                assert_eq!(kind, Kind::Set);
                assert_eq!(walkpath, WalkPath::from(vec![2]));
            }
            other => panic!("Expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn set_commits_under_fqkey() {
        let mut settings = Settings::new();
        let it = item("kind: question\nkey: name\nsection: user\nrequired: true");
        it.set(&mut settings, Some(s("alice"))).unwrap();
        assert_eq!(settings.get("user.name"), Some(&s("alice")));
    }

    #[test]
    fn empty_answer_takes_default() {
        let mut settings = Settings::new();
        let it = item("kind: question\nkey: port\ntype: int\ndefault: 22");
        assert_eq!(it.set(&mut settings, Some(s(""))).unwrap(), Value::Integer(22));
        assert_eq!(settings.get("port"), Some(&Value::Integer(22)));
    }

    #[test]
    fn absent_value_without_default_fails() {
        let mut settings = Settings::new();
        let it = item("kind: set\nkey: x");
        assert!(matches!(
            it.set(&mut settings, None),
            Err(InterviewError::InvalidValue { .. })
        ));
        assert!(settings.is_empty());
    }

    #[test]
    fn failed_validation_commits_nothing() {
        let mut settings = Settings::new();
        let it = item("kind: question\nkey: n\ntype: int\nrange: 1-10:2");
        for bad in ["0", "2", "11", "x"] {
            assert!(it.set(&mut settings, Some(s(bad))).is_err(), "{bad}");
        }
        assert!(!settings.contains("n"));
        it.set(&mut settings, Some(s("7"))).unwrap();
        assert_eq!(settings.get("n"), Some(&Value::Integer(7)));
    }

    #[test]
    fn list_requires_multivalue() {
        let mut settings = Settings::new();
        let single = item("kind: question\nkey: tags\ntype: csv");
        assert!(single.set(&mut settings, Some(s("a,b"))).is_err());

        let multi = item("kind: question\nkey: tags\ntype: csv\nmultivalue: true\nvalues: [a, b, c]");
        multi.set(&mut settings, Some(s("a,c"))).unwrap();
        assert_eq!(settings.get("tags"), Some(&Value::Array(vec![s("a"), s("c")])));
        assert!(multi.set(&mut settings, Some(s("a,z"))).is_err());
    }

    #[test]
    fn notice_commits_its_default() {
        let mut settings = Settings::new();
        let it = item("kind: notice\nkey: seen\ntype: bool\ndefault: true");
        // The reply is ignored.
        it.set(&mut settings, Some(s("no"))).unwrap();
        assert_eq!(settings.get("seen"), Some(&Value::Boolean(true)));

        let bare = item("kind: notice\nkey: seen");
        assert!(matches!(
            bare.set(&mut settings, None),
            Err(InterviewError::MissingDefault { .. })
        ));
    }

    #[test]
    fn typed_values_are_coerced_and_sorted() {
        let it = item("kind: question\nkey: n\ntype: int\nvalues: ['10', '2', '33']\nvalues_sort: desc");
        assert_eq!(
            it.values().unwrap(),
            &[Value::Integer(33), Value::Integer(10), Value::Integer(2)]
        );
        let mut settings = Settings::new();
        it.set(&mut settings, Some(s("10"))).unwrap();
        assert!(it.set(&mut settings, Some(s("11"))).is_err());
    }

    #[test]
    fn values_regexp_filters() {
        let it = item("kind: question\nkey: os\nvalues: [ubuntu, centos, arch]\nvalues_regexp: '[cu]'\nvalues_sort: asc");
        assert_eq!(it.values().unwrap(), &[s("centos"), s("ubuntu")]);
    }

    #[test]
    fn values_and_default_from_files() {
        let home = TempDir::new().unwrap();
        fs::write(home.path().join("zones.txt"), "east\n\nwest\n").unwrap();
        fs::write(home.path().join("motd.txt"), "welcome\n").unwrap();
        fs::create_dir(home.path().join("profiles")).unwrap();
        fs::create_dir(home.path().join("profiles").join("small")).unwrap();
        fs::write(home.path().join("profiles").join("large.conf"), "").unwrap();

        let files = Resolver::new(Some(home.path().to_path_buf()), None);
        let n = node("kind: question\nkey: zone\nvalues_from_file: zones.txt\ndefault_from_file: motd.txt");
        let it = Item::resolve(&n, Kind::Question, WalkPath::root(), &Settings::new(), &files)
            .unwrap();
        assert_eq!(it.values().unwrap(), &[s("east"), s("west")]);
        assert_eq!(it.default(), Some(&s("welcome")));

        let selector = format!(
            "kind: question\nkey: profile\nvalues_from_directory: 'dir+file:{}'",
            home.path().join("profiles").display()
        );
        let it = Item::resolve(&node(&selector), Kind::Question, WalkPath::root(), &Settings::new(), &files)
            .unwrap();
        assert_eq!(it.values().unwrap(), &[s("small"), s("large.conf")]);
    }

    #[test]
    fn malformed_rules_are_document_errors() {
        let n = node("kind: question\nkey: n\nrange: ten");
        assert!(matches!(
            Item::resolve(&n, Kind::Question, WalkPath::root(), &Settings::new(), &Resolver::default()),
            Err(InterviewError::BadItem { .. })
        ));
        let n = node("kind: question\nkey: n\nregexp: '[a-'");
        assert!(matches!(
            Item::resolve(&n, Kind::Question, WalkPath::root(), &Settings::new(), &Resolver::default()),
            Err(InterviewError::InvalidRegex { .. })
        ));
        let n = node("kind: question\nkey: n\nvalues_from_directory: 'both:/tmp'");
        assert!(matches!(
            Item::resolve(&n, Kind::Question, WalkPath::root(), &Settings::new(), &Resolver::default()),
            Err(InterviewError::BadItem { .. })
        ));
    }

    #[test]
    fn write_through_leaf_is_conflict() {
        let mut settings = Settings::new();
        settings.set("net", s("flat")).unwrap();
        let it = item("kind: set\nkey: net.host\nvalue: x");
        assert!(matches!(
            it.set(&mut settings, Some(s("x"))),
            Err(InterviewError::Conflict { .. })
        ));
    }
}
