use std::{
    io::{self, Write},
    sync::{
        atomic::{AtomicBool, Ordering},
        OnceLock,
    },
};

/// Process-wide diagnostic log. Silent unless `--verbose` switched it on;
/// lines go to stderr so they never mix with program output.
#[derive(Debug, Default)]
pub struct Logger {
    verbose: AtomicBool,
}

impl Logger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_verbose(&self, verbose: bool) {
        self.verbose.store(verbose, Ordering::Relaxed);
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose.load(Ordering::Relaxed)
    }

    pub fn log(&self, msg: &str) {
        if self.is_verbose() {
            let _ = writeln!(io::stderr().lock(), "[gust] {msg}");
        }
    }
}

static LOGGER: OnceLock<Logger> = OnceLock::new();

pub fn global() -> &'static Logger {
    LOGGER.get_or_init(Logger::new)
}

pub fn init(verbose: bool) {
    global().set_verbose(verbose);
}

pub fn verbose() -> bool {
    global().is_verbose()
}

pub fn log_debug(msg: &str) {
    global().log(msg);
}
