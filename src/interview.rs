//! The interview orchestrator.
//!
//! An [`Interview`] owns one parsed document, the include cache and the
//! settings store of a session. It is driven either step by step:
//!
//! ```no_run
//! use questline::Interview;
//!
//! let mut interview = Interview::builder().load("provision.yaml".as_ref())?;
//! interview.check()?;
//! while let Some(item) = interview.next()? {
//!     interview.answer(&item, "42")?;
//! }
//! println!("{}", interview.settings());
//! # Ok::<(), questline::InterviewError>(())
//! ```
//!
//! or end to end with [`Interview::run`] and an [`AnswerSource`].

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, info, warn};
use toml::Value;

use crate::answers::{AnswerSource, InterruptChoice};
use crate::builder::InterviewBuilder;
use crate::document::Node;
use crate::error::InterviewError;
use crate::file::Resolver;
use crate::item::Item;
use crate::ops::{Comparison, ItemView, RunOptions, RunOutcome};
use crate::settings::Settings;
use crate::types::WalkPath;
use crate::walk::{self, IncludeCache, Scan, Walker};

/// A loaded interview and its session state.
#[derive(Debug)]
pub struct Interview {
    document: Arc<Vec<Node>>,
    includes: IncludeCache,
    settings: Settings,
    files: Resolver,
    max_restarts: usize,
    strict: bool,
    unknown_fields: Vec<String>,
}

impl Interview {
    pub fn builder() -> InterviewBuilder {
        InterviewBuilder::new()
    }

    pub(crate) fn new(
        document: Vec<Node>,
        settings: Settings,
        files: Resolver,
        max_restarts: usize,
        strict: bool,
        unknown_fields: Vec<String>,
        origin: Option<PathBuf>,
    ) -> Self {
        Self {
            document: Arc::new(document),
            includes: IncludeCache::rooted_at(origin),
            settings,
            files,
            max_restarts,
            strict,
            unknown_fields,
        }
    }

    /// The next item waiting for an answer, or `None` when the interview is
    /// complete.
    ///
    /// Walks are repeated from the root for as long as they change the
    /// store. More than `max_restarts` consecutive restarts fail with
    /// [`RestartLimit`](InterviewError::RestartLimit).
    pub fn next(&mut self) -> Result<Option<Item>, InterviewError> {
        let mut restarts = 0usize;
        loop {
            let scan = Walker::new(&mut self.settings, &mut self.includes, &self.files)
                .scan(&self.document)?;
            match scan {
                Scan::Found(item) => return Ok(Some(item)),
                Scan::Exhausted => return Ok(None),
                Scan::Restart(walkpath) => {
                    restarts += 1;
                    debug!("Restarting walk after change at {walkpath}");
                    if self.max_restarts != 0 && restarts > self.max_restarts {
                        return Err(InterviewError::RestartLimit {
                            limit: self.max_restarts,
                            walkpath,
                        });
                    }
                }
            }
        }
    }

    /// Commit a reply for an item returned by [`next`](Self::next).
    pub fn answer(&mut self, item: &Item, reply: &str) -> Result<Value, InterviewError> {
        item.set(&mut self.settings, Some(Value::String(reply.to_string())))
    }

    /// Structural pre-flight over the whole document, includes expanded.
    ///
    /// Fields no item understands fail the check in strict mode and are only
    /// logged otherwise.
    pub fn check(&mut self) -> Result<(), InterviewError> {
        walk::check(
            &self.document,
            &WalkPath::root(),
            &mut self.includes,
            &self.files,
        )?;

        let unknown: Vec<String> = self
            .unknown_fields
            .iter()
            .chain(self.includes.unknown_fields())
            .cloned()
            .collect();
        if self.strict && !unknown.is_empty() {
            return Err(InterviewError::UnknownFields(unknown));
        }
        info!(
            "Check passed ({} items, {} includes)",
            self.document.len(),
            self.includes.len()
        );
        Ok(())
    }

    /// Run the interview to completion, presenting each item on `out` and
    /// taking replies from `source`.
    ///
    /// An interrupt lets the source choose to print the settings before the
    /// run stops with [`RunOutcome::Aborted`]. Any other error ends the run.
    pub fn run<W: Write>(
        &mut self,
        source: &mut dyn AnswerSource,
        out: &mut W,
        options: RunOptions,
    ) -> Result<RunOutcome, InterviewError> {
        let mut answered = 0;

        while let Some(item) = self.next()? {
            if !options.quiet {
                writeln!(out, "{}", ItemView::new(&item, options.verbose))?;
            }

            let reply = match source.next_answer(&item) {
                Ok(reply) => reply,
                Err(InterviewError::Interrupted) => {
                    let choice = match source.on_interrupt() {
                        Ok(choice) => choice,
                        Err(InterviewError::Interrupted) => InterruptChoice::Abort,
                        Err(e) => return Err(e),
                    };
                    if choice == InterruptChoice::Inspect {
                        writeln!(out, "{}", self.settings)?;
                    }
                    writeln!(out, "exiting prematurely")?;
                    warn!("Interview interrupted at {}", item.walkpath());
                    return Ok(RunOutcome::Aborted { answered });
                }
                Err(e) => return Err(e),
            };

            if options.verbose && !options.quiet {
                writeln!(out, "answer: {reply}")?;
            }
            self.answer(&item, &reply)?;
            answered += 1;
        }

        if !options.quiet {
            writeln!(out, "==========")?;
        }
        let leftover = source.remaining();
        if leftover > 0 {
            writeln!(out, "there are unused answers")?;
            info!("{leftover} answers were not used");
        }
        Ok(RunOutcome::Completed { answered, leftover })
    }

    /// Compare the session's settings with expected results.
    pub fn compare_results(&self, expected: &Settings) -> Comparison {
        Comparison::new(&self.settings, expected)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn into_settings(self) -> Settings {
        self.settings
    }

    pub fn document(&self) -> &[Node] {
        &self.document
    }

    pub fn includes(&self) -> &IncludeCache {
        &self.includes
    }

    pub fn resolver(&self) -> &Resolver {
        &self.files
    }

    /// Fields of the top-level document that no item understood.
    pub fn unknown_fields(&self) -> &[String] {
        &self.unknown_fields
    }
}
