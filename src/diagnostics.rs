use std::{fmt, io, path::PathBuf};

use thiserror::Error;

use crate::value::Value;

/// Message produced by the parser or the compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        for note in &self.notes {
            write!(f, "\n  note: {note}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostic {}

/// Every failure the drivers can report. None of them escape a driver; they
/// are printed and turned into an [`crate::Outcome`].
#[derive(Debug, Error)]
pub enum GustError {
    #[error("Parse error: {0}")]
    Parse(Diagnostic),
    #[error("Unexpected end of source")]
    UnexpectedEnd,
    #[error("Compiler error: {0}")]
    Compile(Diagnostic),
    #[error("VM crash: {0}")]
    Crash(String),
    #[error("VM error: {0}")]
    Runtime(Value),
    #[error("Could not open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, GustError>;
