//! Guided interviews that collect validated, nested settings.
//!
//! An interview is a document of items: questions and notices that ask for
//! values, plus branches, includes, sets, updates and resets that shape the
//! flow. Questline walks the document, presents one item at a time, checks
//! each answer and commits it under a dotted key in a hierarchical
//! [`Settings`] store.
//!
//! ```no_run
//! use questline::{Interview, RunOptions, ScriptedAnswers};
//! use questline::config::AnswersConfig;
//!
//! let mut interview = Interview::builder().load("provision.yaml".as_ref())?;
//! interview.check()?;
//!
//! let mut answers =
//!     ScriptedAnswers::from_file("provision.answers".as_ref(), &AnswersConfig::default())?;
//! interview.run(&mut answers, &mut std::io::stdout(), RunOptions::default())?;
//! println!("{}", interview.settings());
//! # Ok::<(), questline::InterviewError>(())
//! ```
//!
//! # Documents
//!
//! A document is YAML by default; `.json` and `.toml` files are read by
//! extension. Every item has a `kind`:
//!
//! | Kind | Effect |
//! |------|--------|
//! | `question` | asks for a value, stored under its key |
//! | `notice` | shows text, stores its default once acknowledged |
//! | `set` | stores `value` without asking |
//! | `update` | adds `value` (default 1) to an integer counter |
//! | `reset` | deletes keys by name or regex, then optionally sets one |
//! | `branch` | nested items, entered when `match_key` matches |
//! | `include` | replaced by the items of another document |
//!
//! Keys are dotted paths. `section` is prepended and `parameterize` appends
//! the integer value of another setting, so the same question can fill
//! `disks.size.0`, `disks.size.1` and so on as a counter moves.
//!
//! # The walk
//!
//! Each call to [`Interview::next`] scans the document depth-first from the
//! root and returns the first item still waiting for a value. Non-interactive
//! items are applied on the way. A commit can change a branch condition that
//! was already evaluated, so commits other than updates restart the scan.
//! The number of consecutive restarts is capped (see
//! [`InterviewBuilder::max_restarts`]).
//!
//! # Answers
//!
//! [`Interview::answer`] converts a reply to the item's `type`, validates it
//! (`required`, `values`, `regexp`, `range`) and commits it. An empty reply
//! takes the default. [`Interview::run`] drives the whole loop from an
//! [`AnswerSource`]: [`ScriptedAnswers`] for answers files, or the terminal
//! (`ConsoleAnswers`, behind the `cli` feature).
//!
//! # Configuration
//!
//! The `questline` binary reads an [`InterviewConfig`] with
//! [confique](https://docs.rs/confique): compiled defaults, the platform
//! config file, an explicit `--config` file and `QUESTLINE__*` environment
//! variables, later layers winning. See the [`config`] module.
//!
//! # Persistence
//!
//! Settings can be saved and reloaded as YAML, JSON or TOML (see
//! [`persist`]). Writing to an existing TOML file edits it in place with
//! `toml_edit`, keeping its comments.
//!
//! # Error handling
//!
//! All fallible operations return [`InterviewError`]. Messages name the walk
//! path, key or file involved.

pub mod answers;
pub mod config;
pub mod document;
pub mod error;
pub mod persist;
pub mod types;

mod builder;
#[cfg(feature = "cli")]
mod cli;
#[cfg(feature = "cli")]
mod console;
mod file;
mod interview;
mod item;
mod ops;
mod settings;
mod validate;
mod walk;

#[cfg(test)]
mod fixtures;

pub use answers::{AnswerSource, InterruptChoice, ScriptedAnswers};
pub use builder::InterviewBuilder;
#[cfg(feature = "cli")]
pub use cli::{Cli, Status};
pub use config::InterviewConfig;
#[cfg(feature = "cli")]
pub use console::ConsoleAnswers;
pub use document::{Format, Node};
pub use error::InterviewError;
pub use file::Resolver;
pub use interview::Interview;
pub use item::{Item, fqkey};
pub use ops::{Comparison, ItemView, KeyComparison, RunOptions, RunOutcome};
pub use settings::{Items, Settings};
pub use types::{DirSelector, Kind, SortOrder, ValueType, WalkPath};
pub use walk::{IncludeCache, Scan, Walker, check};
