//! Path resolution and file access for interview documents and the data
//! files items refer to.
//!
//! # Resolution
//!
//! A **bare** name (a single path component such as `disks.yaml`) is looked up
//! in the interview's home directory, which defaults to the directory holding
//! the top-level document. When a templates directory is configured and the
//! name does not exist under home, the templates directory is tried next.
//! Anything with a separator (`./disks.yaml`, `/etc/x.yaml`, `sub/x.yaml`) is
//! used exactly as written.
//!
//! The same rule applies to includes, `default_from_file`,
//! `values_from_file` and `values_from_directory`.

use std::path::{Component, Path, PathBuf};

use crate::document::{self, Format, Parsed};
use crate::error::InterviewError;
use crate::types::DirSelector;

/// Resolves and reads the files an interview refers to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolver {
    home: Option<PathBuf>,
    templates_dir: Option<PathBuf>,
}

impl Resolver {
    pub fn new(home: Option<PathBuf>, templates_dir: Option<PathBuf>) -> Self {
        Self {
            home,
            templates_dir,
        }
    }

    pub fn home(&self) -> Option<&Path> {
        self.home.as_deref()
    }

    pub fn templates_dir(&self) -> Option<&Path> {
        self.templates_dir.as_deref()
    }

    pub(crate) fn set_home(&mut self, home: PathBuf) {
        self.home = Some(home);
    }

    /// Resolve a document-relative path to the file that should be opened.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if !is_bare(path) {
            return path.to_path_buf();
        }

        let in_home = self.home.as_ref().map(|home| home.join(path));
        if let Some(candidate) = &in_home
            && candidate.exists()
        {
            return candidate.clone();
        }

        if let Some(templates) = &self.templates_dir {
            let candidate = templates.join(path);
            if candidate.exists() {
                return candidate;
            }
        }

        in_home.unwrap_or_else(|| path.to_path_buf())
    }

    /// Read a file after resolving it.
    pub fn read_to_string(&self, path: &Path) -> Result<String, InterviewError> {
        let resolved = self.resolve(path);
        std::fs::read_to_string(&resolved).map_err(|e| InterviewError::IoError {
            path: resolved,
            source: e,
        })
    }

    /// Read and parse an interview document, choosing the format by extension.
    pub fn load_document(&self, path: &Path) -> Result<Parsed, InterviewError> {
        let resolved = self.resolve(path);
        let content =
            std::fs::read_to_string(&resolved).map_err(|e| InterviewError::IoError {
                path: resolved.clone(),
                source: e,
            })?;
        document::parse(&content, Format::from_path(&resolved), &resolved)
    }

    /// Names of the immediate children of a directory, sorted, filtered by
    /// the selector. `dir+file` lists directories before files.
    pub fn list_dir(&self, selector: &DirSelector) -> Result<Vec<String>, InterviewError> {
        let resolved = self.resolve(selector.path());
        let io_error = |source| InterviewError::IoError {
            path: resolved.clone(),
            source,
        };

        let mut dirs = Vec::new();
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&resolved).map_err(io_error)? {
            let entry = entry.map_err(io_error)?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.path().is_dir() {
                dirs.push(name);
            } else {
                files.push(name);
            }
        }
        dirs.sort();
        files.sort();

        Ok(match selector {
            DirSelector::Dirs(_) => dirs,
            DirSelector::Files(_) => files,
            DirSelector::Both(_) => {
                dirs.extend(files);
                dirs
            }
        })
    }
}

/// A path made of a single normal component, e.g. `answers.txt`.
pub fn is_bare(path: &Path) -> bool {
    let mut components = path.components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
