use std::{
    io::{self, IsTerminal, Write},
    process::ExitCode,
};

use gust::{
    batch,
    cli::{self, Action, Flags},
    logger,
    reader::StreamLines,
    repl::EditorLines,
    Outcome, Repl, Vm,
};

fn main() -> ExitCode {
    let flags = Flags::from_args(std::env::args_os());
    match flags.action() {
        Action::ShowHelp => {
            println!("{}", cli::help_text());
            ExitCode::SUCCESS
        }
        Action::ShowVersion => {
            println!("{}", cli::version_text());
            ExitCode::SUCCESS
        }
        Action::Run => match run(&flags) {
            Ok(outcome) if outcome.is_success() => ExitCode::SUCCESS,
            Ok(_) => ExitCode::FAILURE,
            Err(err) => {
                eprintln!("I/O error: {err}");
                ExitCode::FAILURE
            }
        },
    }
}

/// Runs the files, then the REPL if asked for. The outcome is the one of the
/// last driver invoked.
fn run(flags: &Flags) -> io::Result<Outcome> {
    logger::init(flags.verbose);
    let mut vm = Vm::new();
    logger::log_debug(&format!(
        "standard environment loaded with {} bindings",
        vm.globals().borrow().len()
    ));

    let mut outcome = Outcome::Done;
    let mut stdout = io::stdout();
    for path in &flags.files {
        outcome = batch::run_file(&mut vm, path, &mut stdout)?;
    }
    stdout.flush()?;

    if flags.wants_repl() {
        let color = !flags.no_color;
        outcome = if io::stdin().is_terminal() {
            Repl::new(&mut vm, EditorLines::new()?, io::stdout(), color).run()?
        } else {
            let lines = StreamLines::new(io::stdin().lock(), io::stdout());
            Repl::new(&mut vm, lines, io::stdout(), color).run()?
        };
    }
    Ok(outcome)
}
