//! Interactive answers typed at the terminal.
//!
//! Input is read in raw mode so that hidden items can be masked and Ctrl-C
//! reaches the interview as [`Interrupted`](InterviewError::Interrupted)
//! instead of killing the process.

use std::io::{self, Write};
use std::path::PathBuf;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

use crate::answers::{AnswerSource, InterruptChoice};
use crate::error::InterviewError;
use crate::item::Item;
use crate::ops::format_value;

/// Reads replies from the keyboard, writing prompts to `out`.
pub struct ConsoleAnswers<W: Write> {
    out: W,
}

impl ConsoleAnswers<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> ConsoleAnswers<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    fn read_line(&mut self, masked: bool) -> Result<String, InterviewError> {
        self.out.flush()?;
        let _raw = RawMode::enable().map_err(console_error)?;
        let mut editor = LineEditor::new(masked);

        loop {
            let Event::Key(key) = event::read().map_err(console_error)? else {
                continue;
            };
            match editor.feed(&key) {
                Step::Echo(text) => {
                    self.out.write_all(text.as_bytes())?;
                    self.out.flush()?;
                }
                Step::Submit => {
                    self.out.write_all(b"\r\n")?;
                    return Ok(editor.line.trim().to_string());
                }
                Step::Interrupt => {
                    self.out.write_all(b"\r\n")?;
                    return Err(InterviewError::Interrupted);
                }
                Step::EndOfInput => {
                    self.out.write_all(b"\r\n")?;
                    return Err(InterviewError::AnswersExhausted);
                }
            }
        }
    }
}

impl<W: Write> AnswerSource for ConsoleAnswers<W> {
    fn next_answer(&mut self, item: &Item) -> Result<String, InterviewError> {
        write!(self.out, "{}", prompt(item))?;
        self.read_line(item.hidden())
    }

    fn on_interrupt(&mut self) -> Result<InterruptChoice, InterviewError> {
        write!(self.out, "CTRL-C to exit, ENTER to print settings")?;
        self.read_line(true).map(|_| InterruptChoice::Inspect)
    }
}

/// `answer [default]: `, or a bare `answer: ` for hidden items.
pub fn prompt(item: &Item) -> String {
    if item.hidden() {
        return "answer: ".to_string();
    }
    let default = item.default().map(format_value).unwrap_or_default();
    format!("answer [{default}]: ")
}

/// Terminal input failures, as opposed to failed writes to `out`.
fn console_error(source: io::Error) -> InterviewError {
    InterviewError::IoError {
        path: PathBuf::from("<console>"),
        source,
    }
}

/// Raw mode for as long as the guard lives.
struct RawMode;

impl RawMode {
    fn enable() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(RawMode)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Step {
    /// Keep reading; print this (possibly empty) text.
    Echo(String),
    Submit,
    Interrupt,
    EndOfInput,
}

/// Line editing on key events: printable characters, backspace, Enter,
/// Ctrl-C and Ctrl-D on an empty line.
struct LineEditor {
    line: String,
    masked: bool,
}

impl LineEditor {
    fn new(masked: bool) -> Self {
        Self {
            line: String::new(),
            masked,
        }
    }

    fn feed(&mut self, key: &KeyEvent) -> Step {
        if key.kind == KeyEventKind::Release {
            return Step::Echo(String::new());
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => Step::Interrupt,
            KeyCode::Char('d') if ctrl && self.line.is_empty() => Step::EndOfInput,
            KeyCode::Enter => Step::Submit,
            KeyCode::Backspace => match self.line.pop() {
                Some(_) if !self.masked => Step::Echo("\x08 \x08".into()),
                _ => Step::Echo(String::new()),
            },
            KeyCode::Char(c) if !ctrl => {
                self.line.push(c);
                Step::Echo(if self.masked { String::new() } else { c.to_string() })
            }
            _ => Step::Echo(String::new()),
        }
    }
}
