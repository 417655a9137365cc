//! The traversal engine.
//!
//! One [`Walker::scan`] is a depth-first pass over the document that stops at
//! the first notice or question still waiting for a value. Non-interactive
//! nodes are applied on the way: `set`, key-bearing `branch` and `reset`
//! nodes commit through the item model, `update` nodes bump counters.
//!
//! A commit can change the outcome of a branch condition already evaluated
//! earlier in the pass, so any commit other than an `update` ends the pass
//! with [`Scan::Restart`]. The caller re-scans from the root against the
//! mutated store until it gets [`Scan::Found`] or [`Scan::Exhausted`].
//!
//! Includes are expanded into an [`IncludeCache`] keyed by the walk path of
//! the include node. The document itself is never modified. A file may not
//! include itself, directly or through the files that include it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};
use toml::Value;

use crate::document::Node;
use crate::error::InterviewError;
use crate::file::Resolver;
use crate::item::{self, Item, fqkey};
use crate::settings::Settings;
use crate::types::{Kind, WalkPath};
use crate::validate::{self, NumericRange};

/// Outcome of one scan.
#[derive(Debug)]
pub enum Scan {
    /// The next item waiting for a value.
    Found(Item),
    /// The store changed at this walk path; scan again from the root.
    Restart(WalkPath),
    /// Nothing left to ask.
    Exhausted,
}

/// Expanded include subtrees, keyed by the walk path of their include node.
#[derive(Debug, Default, Clone)]
pub struct IncludeCache {
    subtrees: HashMap<WalkPath, Included>,
    /// Canonical path of the top-level document, when it came from a file.
    root: Option<PathBuf>,
    unknown_fields: Vec<String>,
}

#[derive(Debug, Clone)]
struct Included {
    file: PathBuf,
    nodes: Arc<Vec<Node>>,
}

impl IncludeCache {
    /// An empty cache for a document read from `root`.
    pub fn rooted_at(root: Option<PathBuf>) -> Self {
        Self {
            root: root.map(|path| canonical(&path)),
            ..Self::default()
        }
    }

    pub fn get(&self, walkpath: &WalkPath) -> Option<Arc<Vec<Node>>> {
        self.subtrees
            .get(walkpath)
            .map(|included| Arc::clone(&included.nodes))
    }

    pub fn len(&self) -> usize {
        self.subtrees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subtrees.is_empty()
    }

    /// Fields not understood by any node of an included document, prefixed
    /// with the document path.
    pub fn unknown_fields(&self) -> &[String] {
        &self.unknown_fields
    }

    /// Read the document an include node points to and cache it.
    pub fn load(
        &mut self,
        node: &Node,
        walkpath: &WalkPath,
        files: &Resolver,
    ) -> Result<Arc<Vec<Node>>, InterviewError> {
        if let Some(cached) = self.get(walkpath) {
            return Ok(cached);
        }

        let path = node
            .path
            .as_deref()
            .ok_or_else(|| InterviewError::MissingField {
                field: "path",
                kind: Kind::Include,
                walkpath: walkpath.clone(),
            })?;
        let resolved = files.resolve(Path::new(path));
        if !resolved.is_file() {
            return Err(InterviewError::IncludeNotFound {
                path: resolved,
                walkpath: walkpath.clone(),
            });
        }

        let file = canonical(&resolved);
        if self.enclosing_files(walkpath).any(|open| *open == file) {
            return Err(InterviewError::IncludeCycle {
                path: resolved,
                walkpath: walkpath.clone(),
            });
        }

        let parsed = files.load_document(&resolved)?;
        for field in &parsed.unknown_fields {
            warn!("Unknown field in {}: {field}", resolved.display());
            self.unknown_fields
                .push(format!("{}: {field}", resolved.display()));
        }
        info!(
            "Included {} ({} items) at {walkpath}",
            resolved.display(),
            parsed.nodes.len()
        );

        let nodes = Arc::new(parsed.nodes);
        self.subtrees.insert(
            walkpath.clone(),
            Included {
                file,
                nodes: Arc::clone(&nodes),
            },
        );
        Ok(nodes)
    }

    /// Files already open around `walkpath`: the top-level document, then
    /// every include node on the way down. Ancestors are always expanded
    /// before their descendants, so each one is in the cache.
    fn enclosing_files<'s>(&'s self, walkpath: &WalkPath) -> impl Iterator<Item = &'s PathBuf> {
        let indices = walkpath.indices().to_vec();
        let ancestors = (1..indices.len())
            .filter_map(move |depth| {
                let ancestor = WalkPath::from(indices[..depth].to_vec());
                self.subtrees.get(&ancestor)
            })
            .map(|included| &included.file);
        self.root.iter().chain(ancestors)
    }
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// One scan's view of the session state.
pub struct Walker<'a> {
    settings: &'a mut Settings,
    includes: &'a mut IncludeCache,
    files: &'a Resolver,
}

impl<'a> Walker<'a> {
    pub fn new(
        settings: &'a mut Settings,
        includes: &'a mut IncludeCache,
        files: &'a Resolver,
    ) -> Self {
        Self {
            settings,
            includes,
            files,
        }
    }

    /// Scan the document from the root.
    pub fn scan(&mut self, document: &[Node]) -> Result<Scan, InterviewError> {
        self.scan_level(document, &WalkPath::root())
    }

    fn scan_level(&mut self, nodes: &[Node], parent: &WalkPath) -> Result<Scan, InterviewError> {
        for (i, node) in nodes.iter().enumerate() {
            if node.disabled {
                continue;
            }
            let walkpath = parent.child(i);
            let kind = node.kind_at(&walkpath)?;

            let scan = match kind {
                Kind::Branch => self.branch(node, &walkpath)?,
                Kind::Include => self.include(node, &walkpath)?,
                Kind::Notice | Kind::Question => self.interactive(node, kind, &walkpath)?,
                Kind::Set => {
                    if node.key.is_some() && self.auto_commit(node, kind, &walkpath)? {
                        Scan::Restart(walkpath)
                    } else {
                        Scan::Exhausted
                    }
                }
                Kind::Reset => self.reset(node, &walkpath)?,
                Kind::Update => self.update(node, &walkpath)?,
            };

            match scan {
                Scan::Exhausted => continue,
                found_or_restart => return Ok(found_or_restart),
            }
        }
        Ok(Scan::Exhausted)
    }

    fn branch(&mut self, node: &Node, walkpath: &WalkPath) -> Result<Scan, InterviewError> {
        if !self.branch_matches(node, walkpath)? {
            debug!("Skipping branch at {walkpath}");
            return Ok(Scan::Exhausted);
        }
        if node.key.is_some() && self.auto_commit(node, Kind::Branch, walkpath)? {
            return Ok(Scan::Restart(walkpath.clone()));
        }
        match &node.interview {
            Some(children) => self.scan_level(children, walkpath),
            None => Ok(Scan::Exhausted),
        }
    }

    /// A branch is skipped when its value is not in `match_values` (or that
    /// list is absent) and it is in `match_not_values` (or that list is
    /// absent). A branch with neither list is always entered.
    fn branch_matches(&self, node: &Node, walkpath: &WalkPath) -> Result<bool, InterviewError> {
        let Some(match_key) = &node.match_key else {
            return Ok(true);
        };
        let key = fqkey(node, Kind::Branch, walkpath, Some(match_key.as_str()), self.settings)?;
        let current = self.settings.get(&key);

        let member = |list: &Option<Vec<Value>>| {
            list.as_ref().map(|values| {
                current.is_some_and(|c| values.iter().any(|v| validate::same_value(v, c)))
            })
        };
        let (in_values, in_not_values) = (
            member(&node.match_values),
            member(&node.match_not_values),
        );
        if in_values.is_none() && in_not_values.is_none() {
            return Ok(true);
        }
        let skip = !in_values.unwrap_or(false) && in_not_values.unwrap_or(true);
        Ok(!skip)
    }

    fn include(&mut self, node: &Node, walkpath: &WalkPath) -> Result<Scan, InterviewError> {
        match self.includes.get(walkpath) {
            Some(subtree) => self.scan_level(&subtree, walkpath),
            None => {
                self.includes.load(node, walkpath, self.files)?;
                Ok(Scan::Restart(walkpath.clone()))
            }
        }
    }

    fn interactive(
        &mut self,
        node: &Node,
        kind: Kind,
        walkpath: &WalkPath,
    ) -> Result<Scan, InterviewError> {
        if node.key.is_none() {
            return Ok(Scan::Exhausted);
        }
        let key = fqkey(node, kind, walkpath, None, self.settings)?;
        if self.settings.contains(&key) && !node.force {
            return Ok(Scan::Exhausted);
        }
        let item = Item::resolve(node, kind, walkpath.clone(), self.settings, self.files)?;
        Ok(Scan::Found(item))
    }

    /// Commit the node's `value` when its key is unset or `force` is on.
    /// Returns whether anything was written.
    fn auto_commit(
        &mut self,
        node: &Node,
        kind: Kind,
        walkpath: &WalkPath,
    ) -> Result<bool, InterviewError> {
        let key = fqkey(node, kind, walkpath, None, self.settings)?;
        if self.settings.contains(&key) && !node.force {
            return Ok(false);
        }
        let item = Item::resolve(node, kind, walkpath.clone(), self.settings, self.files)?;
        let value = item.set(self.settings, node.value.clone())?;
        debug!("{kind} at {walkpath} set {key} = {value}");
        Ok(true)
    }

    fn reset(&mut self, node: &Node, walkpath: &WalkPath) -> Result<Scan, InterviewError> {
        let mut deleted = Vec::new();

        if let Some(keys) = &node.reset_keys {
            for key in keys {
                let key = fqkey(node, Kind::Reset, walkpath, Some(key.as_str()), self.settings)?;
                if self.settings.contains(&key) {
                    self.settings.delete(&key)?;
                    deleted.push(key);
                }
            }
        } else if let Some(pattern) = &node.reset_key_regexp {
            let re = item::compile_regex(pattern)?;
            let snapshot: Vec<String> = self.settings.keys().collect();
            for key in snapshot {
                if validate::matches_at_start(&re, &key) {
                    self.settings.delete(&key)?;
                    deleted.push(key);
                }
            }
        } else {
            return Err(InterviewError::BadItem {
                kind: Kind::Reset,
                walkpath: walkpath.clone(),
                reason: "needs 'reset_keys' or 'reset_key_regexp'".into(),
            });
        }

        if !deleted.is_empty() {
            info!("Reset at {walkpath} deleted {}", deleted.join(", "));
        }
        let committed = node.key.is_some() && self.auto_commit(node, Kind::Reset, walkpath)?;

        if deleted.is_empty() && !committed {
            Ok(Scan::Exhausted)
        } else {
            Ok(Scan::Restart(walkpath.clone()))
        }
    }

    fn update(&mut self, node: &Node, walkpath: &WalkPath) -> Result<Scan, InterviewError> {
        let item = Item::resolve(node, Kind::Update, walkpath.clone(), self.settings, self.files)?;
        let key = item.fqkey();

        let current = match self.settings.get(key) {
            None => 0,
            Some(value) => {
                validate::as_integer(value).map_err(|reason| InterviewError::InvalidValue {
                    key: key.to_string(),
                    reason,
                })?
            }
        };
        let step = match &node.value {
            None => 1,
            Some(value) => {
                validate::as_integer(value).map_err(|reason| InterviewError::BadItem {
                    kind: Kind::Update,
                    walkpath: walkpath.clone(),
                    reason,
                })?
            }
        };
        let total = current
            .checked_add(step)
            .ok_or_else(|| InterviewError::InvalidValue {
                key: key.to_string(),
                reason: "counter overflow".into(),
            })?;

        item.set(self.settings, Some(Value::Integer(total)))?;
        debug!("Update at {walkpath}: {key} {current} -> {total}");
        Ok(Scan::Exhausted)
    }
}

/// Structural pre-flight over the whole tree, expanding includes on the way.
///
/// Every node needs a known kind, includes need an existing file,
/// questions and sets need `key`, `title` and `text`, and resets need
/// something to reset. Ranges and regular expressions must compile.
pub fn check(
    nodes: &[Node],
    parent: &WalkPath,
    includes: &mut IncludeCache,
    files: &Resolver,
) -> Result<(), InterviewError> {
    for (i, node) in nodes.iter().enumerate() {
        let walkpath = parent.child(i);
        let kind = node.kind_at(&walkpath)?;
        let missing = |field: &'static str| InterviewError::MissingField {
            field,
            kind,
            walkpath: walkpath.clone(),
        };

        match kind {
            Kind::Include => {
                let subtree = includes.load(node, &walkpath, files)?;
                check(&subtree, &walkpath, includes, files)?;
            }
            Kind::Branch => {
                if let Some(children) = &node.interview {
                    check(children, &walkpath, includes, files)?;
                }
            }
            Kind::Question | Kind::Set => {
                if node.key.is_none() {
                    return Err(missing("key"));
                }
                if node.title.is_none() {
                    return Err(missing("title"));
                }
                if node.text.is_none() {
                    return Err(missing("text"));
                }
            }
            Kind::Reset => {
                if node.reset_keys.is_none() && node.reset_key_regexp.is_none() {
                    return Err(InterviewError::BadItem {
                        kind,
                        walkpath: walkpath.clone(),
                        reason: "needs 'reset_keys' or 'reset_key_regexp'".into(),
                    });
                }
            }
            Kind::Notice | Kind::Update => {}
        }

        if let Some(spec) = &node.range {
            NumericRange::parse(spec, node.value_type).map_err(|reason| {
                InterviewError::BadItem {
                    kind,
                    walkpath: walkpath.clone(),
                    reason,
                }
            })?;
        }
        for pattern in [&node.regexp, &node.values_regexp, &node.reset_key_regexp]
            .into_iter()
            .flatten()
        {
            item::compile_regex(pattern)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::nodes;
    use std::fs;
    use tempfile::TempDir;

    struct Session {
        document: Vec<Node>,
        settings: Settings,
        includes: IncludeCache,
        files: Resolver,
    }

    impl Session {
        fn new(yaml: &str) -> Self {
            Self {
                document: nodes(yaml),
                settings: Settings::new(),
                includes: IncludeCache::default(),
                files: Resolver::default(),
            }
        }

        fn scan(&mut self) -> Result<Scan, InterviewError> {
            Walker::new(&mut self.settings, &mut self.includes, &self.files).scan(&self.document)
        }

        /// Scan until something other than a restart comes back.
        fn settle(&mut self) -> Result<Option<Item>, InterviewError> {
            for _ in 0..100 {
                match self.scan()? {
                    Scan::Found(item) => return Ok(Some(item)),
                    Scan::Exhausted => return Ok(None),
                    Scan::Restart(_) => {}
                }
            }
            panic!("scan did not settle");
        }
    }

    fn s(v: &str) -> Value {
        Value::String(v.into())
    }

    #[test]
    fn question_is_returned_until_answered() {
        let mut session = Session::new(
            "- kind: question\n  key: name\n  required: true\n  title: Name\n  text: Name?",
        );
        let item = session.settle().unwrap().unwrap();
        assert_eq!(item.fqkey(), "name");
        assert_eq!(item.walkpath(), &WalkPath::from(vec![0]));

        // Repeated scans without a commit return the same item.
        let again = session.settle().unwrap().unwrap();
        assert_eq!(again.walkpath(), item.walkpath());

        item.set(&mut session.settings, Some(s("alice"))).unwrap();
        assert!(session.settle().unwrap().is_none());
        assert_eq!(session.settings.get("name"), Some(&s("alice")));
    }

    #[test]
    fn set_restarts_then_settles() {
        let mut session = Session::new("- kind: set\n  key: a\n  value: 1\n- kind: set\n  key: b\n  value: 2");
        assert!(matches!(session.scan().unwrap(), Scan::Restart(p) if p == WalkPath::from(vec![0])));
        assert!(matches!(session.scan().unwrap(), Scan::Restart(p) if p == WalkPath::from(vec![1])));
        assert!(matches!(session.scan().unwrap(), Scan::Exhausted));
        assert_eq!(session.settings.get("a"), Some(&Value::Integer(1)));
        assert_eq!(session.settings.get("b"), Some(&Value::Integer(2)));
    }

    #[test]
    fn updates_accumulate_without_restart() {
        let mut session = Session::new(
            "- kind: update\n  key: count\n- kind: update\n  key: count\n- kind: update\n  key: count",
        );
        assert!(matches!(session.scan().unwrap(), Scan::Exhausted));
        assert_eq!(session.settings.get("count"), Some(&Value::Integer(3)));
    }

    #[test]
    fn update_adds_value() {
        let mut session = Session::new("- kind: update\n  key: count\n  value: 5");
        session.settings.set("count", Value::Integer(2)).unwrap();
        session.scan().unwrap();
        assert_eq!(session.settings.get("count"), Some(&Value::Integer(7)));
    }

    #[test]
    fn branch_entered_only_for_matching_values() {
        let yaml = r#"
- kind: branch
  match_key: os
  match_values: [ubuntu, centos]
  interview:
    - kind: set
      key: family
      value: linux
"#;
        for (os, entered) in [("ubuntu", true), ("centos", true), ("arch", false)] {
            let mut session = Session::new(yaml);
            session.settings.set("os", s(os)).unwrap();
            session.settle().unwrap();
            assert_eq!(session.settings.contains("family"), entered, "{os}");
        }

        let mut unset = Session::new(yaml);
        unset.settle().unwrap();
        assert!(!unset.settings.contains("family"));
    }

    #[test]
    fn branch_with_not_values() {
        let yaml = r#"
- kind: branch
  match_key: os
  match_not_values: [windows]
  interview:
    - kind: set
      key: posix
      value: true
"#;
        let mut session = Session::new(yaml);
        session.settings.set("os", s("windows")).unwrap();
        session.settle().unwrap();
        assert!(!session.settings.contains("posix"));

        let mut session = Session::new(yaml);
        session.settings.set("os", s("arch")).unwrap();
        session.settle().unwrap();
        assert!(session.settings.contains("posix"));
    }

    #[test]
    fn branch_with_match_key_but_no_lists_is_entered() {
        let mut session = Session::new(
            "- kind: branch\n  match_key: os\n  interview:\n    - kind: set\n      key: x\n      value: 1",
        );
        session.settle().unwrap();
        assert!(session.settings.contains("x"));
    }

    #[test]
    fn branch_auto_set_restarts() {
        let mut session = Session::new(
            "- kind: branch\n  key: seen\n  value: true\n  interview:\n    - kind: update\n      key: n",
        );
        assert!(matches!(session.scan().unwrap(), Scan::Restart(_)));
        assert!(!session.settings.contains("n"));
        assert!(matches!(session.scan().unwrap(), Scan::Exhausted));
        assert_eq!(session.settings.get("seen"), Some(&Value::Boolean(true)));
        assert_eq!(session.settings.get("n"), Some(&Value::Integer(1)));
    }

    #[test]
    fn disabled_and_keyless_items_are_skipped() {
        let mut session = Session::new(
            r#"
- kind: question
  key: skipped
  disabled: true
  title: t
  text: t
- kind: notice
  text: just words
- kind: question
  key: asked
  title: t
  text: t
"#,
        );
        let item = session.settle().unwrap().unwrap();
        assert_eq!(item.fqkey(), "asked");
        assert_eq!(item.walkpath(), &WalkPath::from(vec![2]));
    }

    #[test]
    fn forced_question_is_asked_again() {
        let mut session = Session::new("- kind: question\n  key: q\n  force: true\n  title: t\n  text: t");
        session.settings.set("q", s("old")).unwrap();
        assert!(session.settle().unwrap().is_some());
    }

    #[test]
    fn reset_by_regexp_deletes_matching_keys_only() {
        let mut session = Session::new("- kind: reset\n  reset_key_regexp: '^temp\\..*'");
        session.settings.set("temp.a", Value::Integer(1)).unwrap();
        session.settings.set("temp.b.c", Value::Integer(2)).unwrap();
        session.settings.set("keep", Value::Integer(3)).unwrap();
        session.settings.set("attemp.x", Value::Integer(4)).unwrap();

        assert!(matches!(session.scan().unwrap(), Scan::Restart(_)));
        let keys: Vec<String> = session.settings.keys().collect();
        assert_eq!(keys, vec!["keep", "attemp.x"]);
        // Nothing left to delete: the scan runs through.
        assert!(matches!(session.scan().unwrap(), Scan::Exhausted));
    }

    #[test]
    fn reset_keys_then_commit() {
        let mut session = Session::new(
            "- kind: reset\n  section: net\n  reset_keys: [host, port]\n  key: state\n  value: fresh",
        );
        session.settings.set("net.host", s("h")).unwrap();
        assert!(matches!(session.scan().unwrap(), Scan::Restart(_)));
        assert!(!session.settings.contains("net.host"));
        assert_eq!(session.settings.get("net.state"), Some(&s("fresh")));
        assert!(matches!(session.scan().unwrap(), Scan::Exhausted));
    }

    #[test]
    fn reset_without_targets_is_bad_item() {
        let mut session = Session::new("- kind: reset\n  key: x");
        assert!(matches!(
            session.scan(),
            Err(InterviewError::BadItem { kind: Kind::Reset, .. })
        ));
    }

    #[test]
    fn unknown_kind_is_fatal() {
        let mut session = Session::new("- kind: ask\n  key: x");
        assert!(matches!(session.scan(), Err(InterviewError::UnknownKind { .. })));
    }

    #[test]
    fn include_is_expanded_once() {
        let home = TempDir::new().unwrap();
        fs::write(
            home.path().join("disk.yaml"),
            "- kind: question\n  key: disk\n  title: Disk\n  text: Which disk?\n",
        )
        .unwrap();

        let mut session = Session::new("- kind: set\n  key: a\n  value: 1\n- kind: include\n  path: disk.yaml");
        session.files = Resolver::new(Some(home.path().to_path_buf()), None);

        assert!(matches!(session.scan().unwrap(), Scan::Restart(_)));
        assert!(matches!(session.scan().unwrap(), Scan::Restart(p) if p == WalkPath::from(vec![1])));
        assert_eq!(session.includes.len(), 1);

        // The include file is no longer needed once cached.
        fs::remove_file(home.path().join("disk.yaml")).unwrap();
        let item = session.settle().unwrap().unwrap();
        assert_eq!(item.fqkey(), "disk");
        assert_eq!(item.walkpath(), &WalkPath::from(vec![1, 0]));
    }

    #[test]
    fn include_without_path_is_missing_field() {
        let mut session = Session::new("- kind: include");
        assert!(matches!(
            session.scan(),
            Err(InterviewError::MissingField { field: "path", .. })
        ));
    }

    #[test]
    fn missing_include_file() {
        let mut session = Session::new("- kind: include\n  path: nowhere.yaml");
        assert!(matches!(
            session.scan(),
            Err(InterviewError::IncludeNotFound { .. })
        ));
    }

    #[test]
    fn check_reports_first_problem() {
        let files = Resolver::default();
        let ok = nodes("- kind: question\n  key: a\n  title: A\n  text: a?");
        assert!(check(&ok, &WalkPath::root(), &mut IncludeCache::default(), &files).is_ok());

        let nested = nodes(
            "- kind: branch\n  interview:\n    - kind: set\n      key: a\n      title: A",
        );
        match check(&nested, &WalkPath::root(), &mut IncludeCache::default(), &files) {
            Err(InterviewError::MissingField { field, walkpath, .. }) => {
                assert_eq!(field, "text");
                assert_eq!(walkpath, WalkPath::from(vec![0, 0]));
            }
            other => panic!("Expected MissingField, got {other:?}"),
        }

        let missing_kind = nodes("- key: a");
        assert!(matches!(
            check(&missing_kind, &WalkPath::root(), &mut IncludeCache::default(), &files),
            Err(InterviewError::MissingKind { .. })
        ));

        let bad_range = nodes("- kind: question\n  key: a\n  title: A\n  text: a?\n  range: '5'");
        assert!(matches!(
            check(&bad_range, &WalkPath::root(), &mut IncludeCache::default(), &files),
            Err(InterviewError::BadItem { .. })
        ));
    }

    #[test]
    fn check_expands_includes() {
        let home = TempDir::new().unwrap();
        fs::write(home.path().join("inc.yaml"), "- kind: question\n  key: x\n  title: X\n").unwrap();
        let files = Resolver::new(Some(home.path().to_path_buf()), None);
        let mut includes = IncludeCache::default();

        let doc = nodes("- kind: include\n  path: inc.yaml");
        match check(&doc, &WalkPath::root(), &mut includes, &files) {
            Err(InterviewError::MissingField { field, walkpath, .. }) => {
                assert_eq!(field, "text");
                assert_eq!(walkpath, WalkPath::from(vec![0, 0]));
            }
            other => panic!("Expected MissingField, got {other:?}"),
        }
        assert_eq!(includes.len(), 1);
    }

    /// `a.yaml` includes itself; the document includes `a.yaml`.
    fn self_including() -> (TempDir, Resolver) {
        let home = TempDir::new().unwrap();
        fs::write(home.path().join("a.yaml"), "- kind: include\n  path: a.yaml\n").unwrap();
        let files = Resolver::new(Some(home.path().to_path_buf()), None);
        (home, files)
    }

    /// `a.yaml` includes `b.yaml`, which includes `a.yaml` again.
    fn mutually_including() -> (TempDir, Resolver) {
        let home = TempDir::new().unwrap();
        fs::write(
            home.path().join("a.yaml"),
            "- kind: notice\n  text: hello\n- kind: include\n  path: b.yaml\n",
        )
        .unwrap();
        fs::write(home.path().join("b.yaml"), "- kind: include\n  path: a.yaml\n").unwrap();
        let files = Resolver::new(Some(home.path().to_path_buf()), None);
        (home, files)
    }

    fn assert_cycle_at(result: Result<impl std::fmt::Debug, InterviewError>, expected: Vec<usize>) {
        match result {
            Err(InterviewError::IncludeCycle { path, walkpath }) => {
                assert!(path.ends_with("a.yaml"), "{}", path.display());
                assert_eq!(walkpath, WalkPath::from(expected));
            }
            other => panic!("Expected IncludeCycle, got {other:?}"),
        }
    }

    #[test]
    fn check_rejects_direct_include_cycle() {
        let (_home, files) = self_including();
        let doc = nodes("- kind: include\n  path: a.yaml");
        let result = check(&doc, &WalkPath::root(), &mut IncludeCache::default(), &files);
        assert_cycle_at(result, vec![0, 0]);
    }

    #[test]
    fn check_rejects_indirect_include_cycle() {
        let (_home, files) = mutually_including();
        let doc = nodes("- kind: include\n  path: a.yaml");
        let result = check(&doc, &WalkPath::root(), &mut IncludeCache::default(), &files);
        assert_cycle_at(result, vec![0, 1, 0]);
    }

    #[test]
    fn scan_stops_at_include_cycle() {
        let (_home, files) = self_including();
        let mut session = Session::new("- kind: include\n  path: a.yaml");
        session.files = files;
        assert_cycle_at(session.settle(), vec![0, 0]);

        let (_home, files) = mutually_including();
        let mut session = Session::new("- kind: include\n  path: a.yaml");
        session.files = files;
        assert_cycle_at(session.settle(), vec![0, 1, 0]);
    }

    #[test]
    fn top_level_file_counts_as_open() {
        let (home, files) = self_including();
        let mut includes = IncludeCache::rooted_at(Some(home.path().join("a.yaml")));
        let doc = nodes("- kind: include\n  path: a.yaml");
        let result = check(&doc, &WalkPath::root(), &mut includes, &files);
        assert_cycle_at(result, vec![0]);
        assert!(includes.is_empty());
    }

    #[test]
    fn same_file_twice_side_by_side_is_not_a_cycle() {
        let home = TempDir::new().unwrap();
        fs::write(home.path().join("disk.yaml"), "- kind: update\n  key: disks\n").unwrap();
        let files = Resolver::new(Some(home.path().to_path_buf()), None);
        let doc = nodes("- kind: include\n  path: disk.yaml\n- kind: include\n  path: disk.yaml");
        let mut includes = IncludeCache::default();
        check(&doc, &WalkPath::root(), &mut includes, &files).unwrap();
        assert_eq!(includes.len(), 2);
    }
}
