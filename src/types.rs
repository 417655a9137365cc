//! Small vocabulary types shared by the document model, the engine and the
//! item model.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;

/// The kind of an interview item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Container for a nested item list, optionally conditional.
    Branch,
    /// Placeholder replaced by the items of another document.
    Include,
    /// Informational step; commits its default once acknowledged.
    Notice,
    /// Asks for a value.
    Question,
    /// Deletes settings, optionally setting one afterwards.
    Reset,
    /// Quietly sets a value.
    Set,
    /// Increments an integer setting.
    Update,
}

impl Kind {
    pub const ALL: [Kind; 7] = [
        Kind::Branch,
        Kind::Include,
        Kind::Notice,
        Kind::Question,
        Kind::Reset,
        Kind::Set,
        Kind::Update,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Branch => "branch",
            Kind::Include => "include",
            Kind::Notice => "notice",
            Kind::Question => "question",
            Kind::Reset => "reset",
            Kind::Set => "set",
            Kind::Update => "update",
        }
    }

    /// Notices and questions wait for the caller to commit a value.
    pub fn is_interactive(self) -> bool {
        matches!(self, Kind::Notice | Kind::Question)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Kind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or(())
    }
}

/// Declared value type of an item. Drives coercion of answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Bool,
    /// Comma-separated list.
    Csv,
    Float,
    Int,
    Str,
    /// Whitespace-separated list.
    Ssv,
}

impl ValueType {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::Bool => "bool",
            ValueType::Csv => "csv",
            ValueType::Float => "float",
            ValueType::Int => "int",
            ValueType::Str => "str",
            ValueType::Ssv => "ssv",
        }
    }
}

/// Ordering applied to an item's allowed values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Which directory entries `values_from_directory` collects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirSelector {
    Dirs(PathBuf),
    Files(PathBuf),
    /// Directories first, then files.
    Both(PathBuf),
}

impl DirSelector {
    pub fn path(&self) -> &PathBuf {
        match self {
            DirSelector::Dirs(p) | DirSelector::Files(p) | DirSelector::Both(p) => p,
        }
    }
}

impl FromStr for DirSelector {
    type Err = String;

    /// Parses `dir:<path>`, `file:<path>` or `dir+file:<path>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (selector, path) = s
            .split_once(':')
            .ok_or_else(|| format!("expected '<dir|file|dir+file>:<path>', got '{s}'"))?;
        let path = PathBuf::from(path);
        match selector {
            "dir" => Ok(DirSelector::Dirs(path)),
            "file" => Ok(DirSelector::Files(path)),
            "dir+file" => Ok(DirSelector::Both(path)),
            other => Err(format!("unknown directory selector '{other}'")),
        }
    }
}

/// Location of an item in the (include-expanded) tree: one sibling index per
/// nesting level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WalkPath(Vec<usize>);

impl WalkPath {
    pub fn root() -> Self {
        WalkPath(Vec::new())
    }

    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        WalkPath(indices)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl From<Vec<usize>> for WalkPath {
    fn from(indices: Vec<usize>) -> Self {
        WalkPath(indices)
    }
}

impl fmt::Display for WalkPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{index}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_str() {
        for kind in Kind::ALL {
            assert_eq!(kind.as_str().parse::<Kind>(), Ok(kind));
        }
        assert!("setting".parse::<Kind>().is_err());
    }

    #[test]
    fn only_notice_and_question_are_interactive() {
        let interactive: Vec<Kind> = Kind::ALL
            .into_iter()
            .filter(|k| k.is_interactive())
            .collect();
        assert_eq!(interactive, vec![Kind::Notice, Kind::Question]);
    }

    #[test]
    fn dir_selector_parses_all_forms() {
        assert_eq!(
            "dir:/srv".parse::<DirSelector>(),
            Ok(DirSelector::Dirs("/srv".into()))
        );
        assert_eq!(
            "file:conf.d".parse::<DirSelector>(),
            Ok(DirSelector::Files("conf.d".into()))
        );
        assert_eq!(
            "dir+file:/a:b".parse::<DirSelector>(),
            Ok(DirSelector::Both("/a:b".into()))
        );
    }

    #[test]
    fn dir_selector_rejects_bad_input() {
        assert!("/srv".parse::<DirSelector>().is_err());
        assert!("files:/srv".parse::<DirSelector>().is_err());
    }

    #[test]
    fn walk_path_display() {
        assert_eq!(WalkPath::root().to_string(), "[]");
        assert_eq!(WalkPath::root().child(0).child(2).to_string(), "[0, 2]");
    }
}
