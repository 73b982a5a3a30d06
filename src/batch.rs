//! Batch mode: run every form of one file, in order, until the file ends
//! cleanly or something goes wrong.

use std::{
    fs::File,
    io::{self, Read, Write},
    path::Path,
};

use crate::{
    ast::Form,
    diagnostics::GustError,
    executor,
    feed::{self, Drained},
    logger,
    reader::ChunkReader,
    runtime::Vm,
    Outcome,
};

enum BatchState {
    Reading,
    Executing(Form),
    Done,
    Aborted(GustError),
}

/// Opens `path` and runs it. A file that cannot be opened is reported on its
/// own rather than as an empty source.
pub fn run_file<W: Write>(vm: &mut Vm, path: &Path, out: &mut W) -> io::Result<Outcome> {
    logger::log_debug(&format!("running {}", path.display()));
    let file = match File::open(path) {
        Ok(file) => file,
        Err(source) => {
            let err = GustError::Open {
                path: path.to_path_buf(),
                source,
            };
            writeln!(out, "{err}")?;
            return Ok(Outcome::Aborted);
        }
    };
    let outcome = run_source(vm, file, out)?;
    logger::log_debug(&format!("{} finished: {outcome:?}", path.display()));
    Ok(outcome)
}

/// Runs every form read from `input`. Results are kept only as the previous
/// result binding; the first failure is printed to `out` and stops the run.
pub fn run_source<R: Read, W: Write>(vm: &mut Vm, input: R, out: &mut W) -> io::Result<Outcome> {
    let mut cursor = ChunkReader::new(input);
    let mut executed = 0usize;
    let mut state = BatchState::Reading;
    loop {
        state = match state {
            BatchState::Reading => match feed::next_form(&mut cursor) {
                Ok(Drained::Form(form)) => BatchState::Executing(form),
                Ok(Drained::Finished) => BatchState::Done,
                Err(err) => BatchState::Aborted(err),
            },
            BatchState::Executing(form) => match executor::execute(vm, &form) {
                Ok(value) => {
                    executed += 1;
                    if logger::verbose() {
                        logger::log_debug(&format!("form {executed}: {form} => {value:?}"));
                    }
                    BatchState::Reading
                }
                Err(err) => BatchState::Aborted(err),
            },
            BatchState::Done => return Ok(Outcome::Done),
            BatchState::Aborted(err) => {
                logger::log_debug(&format!("aborted after {executed} forms"));
                writeln!(out, "{err}")?;
                return Ok(Outcome::Aborted);
            }
        };
    }
}
