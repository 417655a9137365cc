use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::config::InterviewConfig;
use crate::document::{self, Format, Node, Parsed};
use crate::error::InterviewError;
use crate::file::Resolver;
use crate::interview::Interview;
use crate::settings::Settings;

/// Builder for an [`Interview`].
///
/// Controls where files are found, how long the engine may keep restarting
/// and which settings the session starts from:
///
/// - [`home()`](Self::home) and [`templates_dir()`](Self::templates_dir):
///   directories bare file names resolve against.
/// - [`max_restarts()`](Self::max_restarts): ceiling on consecutive walk
///   restarts.
/// - [`strict()`](Self::strict): reject unknown document fields.
/// - [`settings()`](Self::settings): resume from previously saved settings.
#[derive(Debug, Clone)]
pub struct InterviewBuilder {
    home: Option<PathBuf>,
    templates_dir: Option<PathBuf>,
    max_restarts: usize,
    strict: bool,
    settings: Settings,
}

impl Default for InterviewBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl InterviewBuilder {
    pub fn new() -> Self {
        Self {
            home: None,
            templates_dir: None,
            max_restarts: 10000,
            strict: false,
            settings: Settings::new(),
        }
    }

    /// Directory bare file names resolve against (default: the directory of
    /// the loaded document).
    pub fn home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    /// Fallback directory for bare names missing under home.
    pub fn templates_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.templates_dir = Some(dir.into());
        self
    }

    /// Consecutive restarts allowed before `next()` gives up. `0` removes
    /// the ceiling.
    pub fn max_restarts(mut self, limit: usize) -> Self {
        self.max_restarts = limit;
        self
    }

    /// Enable or disable strict mode (default: `false`).
    /// In strict mode, document fields no item understands are errors.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Settings the session starts from.
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Apply a loaded [`InterviewConfig`]. Unset optional values leave the
    /// builder's current values alone.
    pub fn config(mut self, config: &InterviewConfig) -> Self {
        if let Some(home) = &config.home {
            self.home = Some(home.clone());
        }
        if let Some(dir) = &config.templates_dir {
            self.templates_dir = Some(dir.clone());
        }
        self.max_restarts = config.max_restarts;
        self.strict = config.strict;
        self
    }

    /// Build an interview over nodes constructed in code.
    pub fn build(self, document: Vec<Node>) -> Interview {
        let files = Resolver::new(self.home, self.templates_dir);
        Interview::new(
            document,
            self.settings,
            files,
            self.max_restarts,
            self.strict,
            Vec::new(),
            None,
        )
    }

    /// Load the top-level document from a file.
    ///
    /// A bare name is looked up like an include. Unless set explicitly, the
    /// home directory becomes the directory containing the document.
    pub fn load(self, path: &Path) -> Result<Interview, InterviewError> {
        let mut files = Resolver::new(self.home.clone(), self.templates_dir.clone());
        let resolved = files.resolve(path);
        let parsed = files.load_document(&resolved)?;

        if files.home().is_none() {
            let absolute = std::fs::canonicalize(&resolved).unwrap_or_else(|_| resolved.clone());
            if let Some(dir) = absolute.parent() {
                files.set_home(dir.to_path_buf());
            }
        }

        info!(
            "Loaded {} items from {}",
            parsed.nodes.len(),
            resolved.display()
        );
        self.finish(parsed, files, Some(resolved))
    }

    /// Load the top-level document from text.
    pub fn load_str(self, content: &str, format: Format) -> Result<Interview, InterviewError> {
        let parsed = document::parse(content, format, Path::new("<string>"))?;
        let files = Resolver::new(self.home.clone(), self.templates_dir.clone());
        self.finish(parsed, files, None)
    }

    fn finish(
        self,
        parsed: Parsed,
        files: Resolver,
        origin: Option<PathBuf>,
    ) -> Result<Interview, InterviewError> {
        if !parsed.unknown_fields.is_empty() {
            if self.strict {
                return Err(InterviewError::UnknownFields(parsed.unknown_fields));
            }
            for field in &parsed.unknown_fields {
                warn!("Unknown field in interview document: {field}");
            }
        }

        Ok(Interview::new(
            parsed.nodes,
            self.settings,
            files,
            self.max_restarts,
            self.strict,
            parsed.unknown_fields,
            origin,
        ))
    }
}
