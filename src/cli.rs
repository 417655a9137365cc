//! Command-line front end.
//!
//! Compiled only with the `cli` Cargo feature (on by default). [`Cli`] is the
//! clap derive type parsed by the `questline` binary; [`Cli::execute`] runs
//! one invocation against the library API: load the tool configuration, load
//! and check the interview, run it with scripted or typed answers, then
//! compare and save the outcome.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use log::info;

use crate::answers::{AnswerSource, ScriptedAnswers};
use crate::config::{self, InterviewConfig};
use crate::console::ConsoleAnswers;
use crate::error::InterviewError;
use crate::interview::Interview;
use crate::ops::{RunOptions, RunOutcome};
use crate::persist;

/// Run a guided interview and collect its settings.
#[derive(Debug, Parser)]
#[command(name = "questline", version)]
pub struct Cli {
    /// Interview document (YAML; `.json` and `.toml` by extension).
    #[arg(required_unless_present = "config_template")]
    pub interview: Option<PathBuf>,

    /// Scripted answers file. Without it, answers are typed at the terminal.
    pub answers: Option<PathBuf>,

    /// Expected settings to compare the outcome against.
    pub results: Option<PathBuf>,

    /// Don't print items as they are asked.
    #[arg(short, long)]
    pub quiet: bool,

    /// Print item details and info-level logs.
    #[arg(short, long)]
    pub verbose: bool,

    /// Write the final settings to this file (format by extension).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Resume from previously saved settings.
    #[arg(short, long)]
    pub settings: Option<PathBuf>,

    /// Tool configuration file, layered over the platform one.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Validate the interview document and exit.
    #[arg(long)]
    pub check: bool,

    /// Print a commented configuration template and exit.
    #[arg(long)]
    pub config_template: bool,
}

/// How an invocation ended, short of an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// Template printed or document checked; nothing was asked.
    Done,
    Completed { answered: usize, matched: Option<bool> },
    Aborted { answered: usize },
}

impl Status {
    pub fn is_success(&self) -> bool {
        !matches!(self, Status::Aborted { .. })
    }
}

impl Cli {
    /// Run against stdout with the configuration found on this machine.
    pub fn execute(self) -> Result<Status, InterviewError> {
        let config = config::load(self.config.as_deref())?;
        let mut stdout = io::stdout();
        self.execute_with(&config, &mut stdout)
    }

    /// Run with an already loaded configuration, printing to `out`.
    pub fn execute_with<W: Write>(
        self,
        config: &InterviewConfig,
        out: &mut W,
    ) -> Result<Status, InterviewError> {
        if self.config_template {
            write!(out, "{}", config::template())?;
            return Ok(Status::Done);
        }
        let Some(document) = self.interview.as_deref() else {
            return Err(InterviewError::InvalidValue {
                key: "interview".into(),
                reason: "no interview document given".into(),
            });
        };

        let mut builder = Interview::builder().config(config);
        if let Some(path) = &self.settings {
            builder = builder.settings(persist::load_settings(path)?);
            info!("Resuming from {}", path.display());
        }
        let mut interview = builder.load(document)?;
        interview.check()?;
        if self.check {
            writeln!(out, "{}: ok", document.display())?;
            return Ok(Status::Done);
        }

        let mut source: Box<dyn AnswerSource> = match &self.answers {
            Some(path) => Box::new(ScriptedAnswers::from_file(path, &config.answers)?),
            None => Box::new(ConsoleAnswers::stdout()),
        };
        let options = RunOptions {
            verbose: self.verbose,
            quiet: self.quiet,
        };
        let outcome = interview.run(source.as_mut(), out, options)?;

        let mut matched = None;
        if let Some(path) = &self.results {
            let comparison = interview.compare_results(&persist::load_settings(path)?);
            write!(out, "{comparison}")?;
            matched = Some(comparison.is_match());
        }
        if let Some(path) = &self.output {
            persist::write_settings(path, interview.settings())?;
            info!("Settings written to {}", path.display());
        }

        Ok(match outcome {
            RunOutcome::Completed { answered, .. } => Status::Completed { answered, matched },
            RunOutcome::Aborted { answered } => Status::Aborted { answered },
        })
    }
}
