//! Front-end for the gust scripting language: incremental reading of source
//! text from files or a terminal, and the batch and REPL drivers that compile
//! and run it one top-level form at a time.

pub mod ast;
pub mod batch;
pub mod cli;
pub mod compiler;
pub mod diagnostics;
pub mod environment;
pub mod executor;
pub mod feed;
pub mod lexer;
pub mod logger;
pub mod parser;
pub mod reader;
pub mod repl;
pub mod runtime;
pub mod stdlib;
pub mod value;

pub use diagnostics::{Diagnostic, GustError};
pub use repl::Repl;
pub use runtime::Vm;

/// How a driver finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    Aborted,
}

impl Outcome {
    pub fn is_success(self) -> bool {
        self == Outcome::Done
    }
}
