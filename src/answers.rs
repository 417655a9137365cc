//! Where answers come from.
//!
//! A run pulls one reply per presented item from an [`AnswerSource`]. The
//! scripted source reads an answers file: every line starting with the
//! answer prefix (`answer:` by default) is one reply, separator lines
//! (`=====`) are ignored, and everything else is kept as context for the
//! next reply.
//!
//! ```text
//! ===== host
//! Hostname?
//! answer: node01
//! answer:
//! ```
//!
//! The second reply is empty, so that item takes its default.

use std::collections::VecDeque;
use std::path::Path;

use log::debug;

use crate::config::AnswersConfig;
use crate::error::InterviewError;
use crate::item::Item;

/// What to do after an interrupt while waiting for an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptChoice {
    /// Print the current settings, then stop.
    Inspect,
    /// Stop without printing.
    Abort,
}

/// A supplier of replies for presented items.
pub trait AnswerSource {
    /// The reply for `item`. Fails with
    /// [`Interrupted`](InterviewError::Interrupted) when the user cancels and
    /// [`AnswersExhausted`](InterviewError::AnswersExhausted) when there is
    /// nothing left to read.
    fn next_answer(&mut self, item: &Item) -> Result<String, InterviewError>;

    /// Called once after [`next_answer`](Self::next_answer) was interrupted.
    fn on_interrupt(&mut self) -> Result<InterruptChoice, InterviewError> {
        Ok(InterruptChoice::Abort)
    }

    /// Replies still unread when the interview finished.
    fn remaining(&self) -> usize {
        0
    }
}

/// Replies read ahead of time from an answers file.
#[derive(Debug, Clone, Default)]
pub struct ScriptedAnswers {
    lines: VecDeque<String>,
    prefix: String,
    separator: String,
    context: Vec<String>,
}

impl ScriptedAnswers {
    pub fn from_lines<I, S>(lines: I, config: &AnswersConfig) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            lines: lines
                .into_iter()
                .map(|line| line.as_ref().trim().to_string())
                .collect(),
            prefix: config.prefix.clone(),
            separator: config.separator.clone(),
            context: Vec::new(),
        }
    }

    pub fn from_file(path: &Path, config: &AnswersConfig) -> Result<Self, InterviewError> {
        let content = std::fs::read_to_string(path).map_err(|e| InterviewError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self::from_lines(content.lines(), config))
    }

    /// Non-answer lines seen before the last reply.
    pub fn context(&self) -> &[String] {
        &self.context
    }
}

impl AnswerSource for ScriptedAnswers {
    fn next_answer(&mut self, item: &Item) -> Result<String, InterviewError> {
        self.context.clear();
        while let Some(line) = self.lines.pop_front() {
            if let Some(reply) = line.strip_prefix(self.prefix.as_str()) {
                let reply = reply.trim().to_string();
                debug!("Scripted answer for {}: {reply:?}", item.fqkey());
                return Ok(reply);
            }
            if !line.starts_with(self.separator.as_str()) {
                self.context.push(line);
            }
        }
        Err(InterviewError::AnswersExhausted)
    }

    fn remaining(&self) -> usize {
        self.lines.iter().filter(|line| !line.is_empty()).count()
    }
}
