use std::{ffi::OsString, path::PathBuf};

use clap::{CommandFactory, Parser};

#[derive(Parser, Debug)]
#[command(
    name = "gust",
    about = "Run gust source files, then optionally drop into a REPL",
    disable_help_flag = true,
    disable_version_flag = true
)]
struct Args {
    /// Shows this information
    #[arg(short = 'h', long)]
    help: bool,
    /// Show more output
    #[arg(short = 'V', long)]
    verbose: bool,
    /// Launch a REPL after all files are processed
    #[arg(short = 'r', long)]
    repl: bool,
    /// Don't use ANSI color codes in the REPL
    #[arg(short = 'c', long = "nocolor")]
    no_color: bool,
    /// Print the version number and exit
    #[arg(short = 'v', long)]
    version: bool,
    /// Files to run, in order
    files: Vec<PathBuf>,
}

/// Process configuration, fixed once the arguments are read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flags {
    pub help: bool,
    pub version: bool,
    pub verbose: bool,
    pub repl: bool,
    pub no_color: bool,
    pub unknown: bool,
    pub files: Vec<PathBuf>,
}

/// What the process should do, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ShowHelp,
    ShowVersion,
    Run,
}

impl Flags {
    /// Parses a full argument list, program name first. Anything clap rejects
    /// marks the flags as unknown instead of failing.
    pub fn from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        match Args::try_parse_from(args) {
            Ok(args) => Self {
                help: args.help,
                version: args.version,
                verbose: args.verbose,
                repl: args.repl,
                no_color: args.no_color,
                unknown: false,
                files: args.files,
            },
            Err(_) => Self {
                unknown: true,
                ..Self::default()
            },
        }
    }

    pub fn action(&self) -> Action {
        if self.help || self.unknown {
            Action::ShowHelp
        } else if self.version {
            Action::ShowVersion
        } else {
            Action::Run
        }
    }

    /// The REPL runs when no files were given or it was asked for.
    pub fn wants_repl(&self) -> bool {
        self.files.is_empty() || self.repl
    }
}

pub fn help_text() -> String {
    Args::command().render_help().to_string()
}

pub fn version_text() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
