//! Incremental s-expression reader.
//!
//! A [`Parser`] is a session: it is fed arbitrary byte slices and reports how
//! many bytes it took. It stops taking bytes as soon as one top-level form is
//! complete or the input is malformed, so whatever follows a form stays with
//! the caller for the next session. Because every decision is made one byte at
//! a time, the forms produced never depend on how the input was chunked.

use crate::{
    ast::Form,
    diagnostics::Diagnostic,
    lexer,
};

/// Deepest nesting of lists, arrays, tables and quotes a form may have.
pub const MAX_NESTING_DEPTH: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserStatus {
    /// Inside a form; more bytes are needed.
    Pending,
    /// A top-level form is ready to be extracted.
    Full,
    /// Clean boundary, nothing half-read.
    Root,
    /// Malformed input; the session must be discarded.
    Error,
}

#[derive(Debug)]
enum Frame {
    List(Vec<Form>),
    Array(Vec<Form>),
    Table(Vec<Form>),
    Quote,
}

impl Frame {
    fn push(&mut self, form: Form) {
        match self {
            Frame::List(items) | Frame::Array(items) | Frame::Table(items) => items.push(form),
            Frame::Quote => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lexeme {
    Between,
    Atom,
    String { escaped: bool },
    Comment,
}

#[derive(Debug)]
pub struct Parser {
    stack: Vec<Frame>,
    lexeme: Lexeme,
    token: Vec<u8>,
    form: Option<Form>,
    error: Option<Diagnostic>,
    offset: usize,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Self {
            stack: Vec::new(),
            lexeme: Lexeme::Between,
            token: Vec::new(),
            form: None,
            error: None,
            offset: 0,
        }
    }

    pub fn status(&self) -> ParserStatus {
        if self.error.is_some() {
            ParserStatus::Error
        } else if self.form.is_some() {
            ParserStatus::Full
        } else if self.stack.is_empty() && matches!(self.lexeme, Lexeme::Between | Lexeme::Comment) {
            ParserStatus::Root
        } else {
            ParserStatus::Pending
        }
    }

    pub fn error(&self) -> Option<&Diagnostic> {
        self.error.as_ref()
    }

    pub fn take_error(&mut self) -> Option<Diagnostic> {
        self.error.take()
    }

    /// Takes the completed form. The session goes back to accumulating.
    pub fn extract_form(&mut self) -> Option<Form> {
        self.form.take()
    }

    /// Feeds `bytes` and returns how many were consumed. Consumption stops
    /// early once a form is complete or an error is found; the delimiter that
    /// ends a top-level atom is left unconsumed.
    pub fn feed(&mut self, bytes: &[u8]) -> usize {
        let mut consumed = 0;
        for &byte in bytes {
            if self.form.is_some() || self.error.is_some() {
                break;
            }
            // Offsets count from the first byte of the form itself.
            if self.status() == ParserStatus::Root {
                self.offset = 0;
            }
            if !self.step(byte) {
                break;
            }
            consumed += 1;
            self.offset += 1;
        }
        consumed
    }

    /// Processes one byte. Returns whether the byte was taken.
    fn step(&mut self, byte: u8) -> bool {
        match self.lexeme {
            Lexeme::Comment => {
                if byte == b'\n' {
                    self.lexeme = Lexeme::Between;
                }
                true
            }
            Lexeme::String { escaped: true } => {
                match lexer::escape(byte) {
                    Some(decoded) => self.token.push(decoded),
                    None => {
                        self.fail(format!("unknown escape `\\{}` in string", byte as char));
                        return false;
                    }
                }
                self.lexeme = Lexeme::String { escaped: false };
                true
            }
            Lexeme::String { escaped: false } => {
                match byte {
                    b'\\' => self.lexeme = Lexeme::String { escaped: true },
                    b'"' => {
                        self.lexeme = Lexeme::Between;
                        let bytes = std::mem::take(&mut self.token);
                        match String::from_utf8(bytes) {
                            Ok(text) => self.complete(Form::String(text)),
                            Err(_) => self.fail("invalid UTF-8 in string literal"),
                        }
                    }
                    _ => self.token.push(byte),
                }
                true
            }
            Lexeme::Atom => {
                if !lexer::is_delimiter(byte) {
                    self.token.push(byte);
                    return true;
                }
                if !lexer::is_whitespace(byte) && !lexer::is_closing(byte) {
                    let atom = String::from_utf8_lossy(&self.token).into_owned();
                    self.fail(format!(
                        "expected whitespace after `{atom}`, found `{}`",
                        byte as char
                    ));
                    return false;
                }
                self.lexeme = Lexeme::Between;
                let bytes = std::mem::take(&mut self.token);
                match lexer::atom(&bytes) {
                    Ok(form) => self.complete(form),
                    Err(message) => {
                        self.fail(message);
                        return false;
                    }
                }
                if self.form.is_some() {
                    return false;
                }
                self.step(byte)
            }
            Lexeme::Between => {
                self.between(byte);
                true
            }
        }
    }

    fn between(&mut self, byte: u8) {
        match byte {
            _ if lexer::is_whitespace(byte) => {}
            b'#' => self.lexeme = Lexeme::Comment,
            b'"' => self.lexeme = Lexeme::String { escaped: false },
            b'\'' | b'(' | b'[' | b'{' if self.stack.len() >= MAX_NESTING_DEPTH => {
                self.fail("form nested too deeply");
            }
            b'\'' => self.stack.push(Frame::Quote),
            b'(' => self.stack.push(Frame::List(Vec::new())),
            b'[' => self.stack.push(Frame::Array(Vec::new())),
            b'{' => self.stack.push(Frame::Table(Vec::new())),
            b')' | b']' | b'}' => self.close(byte),
            _ => {
                self.lexeme = Lexeme::Atom;
                self.token.push(byte);
            }
        }
    }

    fn close(&mut self, byte: u8) {
        let form = match (self.stack.pop(), byte) {
            (Some(Frame::List(items)), b')') => Form::List(items),
            (Some(Frame::Array(items)), b']') => Form::Array(items),
            (Some(Frame::Table(items)), b'}') => {
                if items.len() % 2 != 0 {
                    self.fail("table literal needs an even number of forms");
                    return;
                }
                let mut entries = Vec::with_capacity(items.len() / 2);
                let mut iter = items.into_iter();
                while let (Some(key), Some(value)) = (iter.next(), iter.next()) {
                    entries.push((key, value));
                }
                Form::Table(entries)
            }
            (Some(Frame::Quote), _) => {
                self.fail(format!("nothing to quote before `{}`", byte as char));
                return;
            }
            (Some(_), _) => {
                self.fail(format!("mismatched delimiter `{}`", byte as char));
                return;
            }
            (None, _) => {
                self.fail(format!("unexpected closing delimiter `{}`", byte as char));
                return;
            }
        };
        self.complete(form);
    }

    /// Hands a finished form to the enclosing frame, unwinding quotes.
    fn complete(&mut self, mut form: Form) {
        loop {
            match self.stack.last_mut() {
                Some(Frame::Quote) => {
                    self.stack.pop();
                    form = Form::List(vec![Form::symbol("quote"), form]);
                }
                Some(frame) => {
                    frame.push(form);
                    return;
                }
                None => {
                    self.form = Some(form);
                    return;
                }
            }
        }
    }

    fn fail(&mut self, message: impl Into<String>) {
        self.error = Some(
            Diagnostic::new(message).with_note(format!("at byte {} of this form", self.offset)),
        );
    }
}

/// Reads every form in `source` with a fresh session per form, the way the
/// drivers do. Stops at the first error.
pub fn parse_all(source: &[u8]) -> Result<Vec<Form>, Diagnostic> {
    let mut forms = Vec::new();
    let mut rest = source;
    loop {
        let mut session = Parser::new();
        let consumed = session.feed(rest);
        rest = &rest[consumed..];
        if rest.is_empty() && session.status() == ParserStatus::Pending {
            session.feed(b"\n");
        }
        match session.status() {
            ParserStatus::Full => forms.extend(session.extract_form()),
            ParserStatus::Root => return Ok(forms),
            ParserStatus::Error => {
                return Err(session
                    .take_error()
                    .unwrap_or_else(|| Diagnostic::new("malformed input")));
            }
            ParserStatus::Pending => return Err(Diagnostic::new("unexpected end of source")),
        }
    }
}
