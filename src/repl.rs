use std::io::{self, Write};

use crossterm::style::Stylize;
use rustyline::{error::ReadlineError, DefaultEditor};

use crate::{
    ast::Form,
    diagnostics::GustError,
    executor,
    feed::{self, Drained},
    logger,
    reader::{LineCursor, LineSource},
    runtime::Vm,
    Outcome,
};

const PROMPT: &str = ">>>";

/// Line source backed by a line editor, used when stdin is a terminal.
pub struct EditorLines {
    editor: DefaultEditor,
}

impl EditorLines {
    pub fn new() -> io::Result<Self> {
        let editor = DefaultEditor::new().map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        Ok(Self { editor })
    }
}

impl LineSource for EditorLines {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<Vec<u8>>> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    self.editor.add_history_entry(line.as_str()).ok();
                }
                let mut bytes = line.into_bytes();
                bytes.push(b'\n');
                Ok(Some(bytes))
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(ReadlineError::Io(err)) => Err(err),
            Err(err) => Err(io::Error::new(io::ErrorKind::Other, err)),
        }
    }
}

enum ReplState {
    /// Prompting and reading happen inside the cursor whenever it runs dry.
    Feeding,
    Executing(Form),
    Terminated,
}

/// Interactive loop: prompt, read, evaluate, print. Only end of input stops it.
pub struct Repl<'vm, L, W> {
    vm: &'vm mut Vm,
    cursor: LineCursor<L>,
    out: W,
    color: bool,
}

impl<'vm, L: LineSource, W: Write> Repl<'vm, L, W> {
    pub fn new(vm: &'vm mut Vm, source: L, out: W, color: bool) -> Self {
        let prompt = if color {
            format!("{} ", PROMPT.yellow())
        } else {
            format!("{PROMPT} ")
        };
        Self {
            vm,
            cursor: LineCursor::new(source, prompt),
            out,
            color,
        }
    }

    pub fn run(&mut self) -> io::Result<Outcome> {
        logger::log_debug("repl started");
        let mut state = ReplState::Feeding;
        loop {
            state = match state {
                ReplState::Feeding => match feed::next_form(&mut self.cursor) {
                    Ok(Drained::Form(form)) => ReplState::Executing(form),
                    Ok(Drained::Finished) => ReplState::Terminated,
                    Err(err) => {
                        // A bad line never carries over into the next session.
                        self.cursor.discard();
                        self.report(&err)?;
                        ReplState::Feeding
                    }
                },
                ReplState::Executing(form) => {
                    match executor::execute(self.vm, &form) {
                        Ok(value) => {
                            let rendered = self.vm.render(&value);
                            if self.color {
                                writeln!(self.out, "{}", rendered.cyan())?;
                            } else {
                                writeln!(self.out, "{rendered}")?;
                            }
                        }
                        Err(err) => self.report(&err)?,
                    }
                    ReplState::Feeding
                }
                ReplState::Terminated => {
                    logger::log_debug("repl reached end of input");
                    self.out.flush()?;
                    return Ok(Outcome::Done);
                }
            };
        }
    }

    fn report(&mut self, err: &GustError) -> io::Result<()> {
        logger::log_debug(&format!("repl error: {err:?}"));
        writeln!(self.out, "{err}")
    }
}
