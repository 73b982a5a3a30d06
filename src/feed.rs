//! The feed-and-drain loop: pulls bytes from an [`InputCursor`] into a parser
//! session until one form is complete.

use crate::{
    ast::Form,
    diagnostics::{Diagnostic, GustError, Result},
    parser::{Parser, ParserStatus},
    reader::InputCursor,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Drained {
    /// One complete top-level form. Bytes after it stay in the cursor.
    Form(Form),
    /// The source ended on a clean boundary; no forms remain.
    Finished,
}

/// Runs a fresh parser session over `cursor` and returns at most one form.
///
/// When the source runs dry mid-form a synthetic newline is fed so that a
/// trailing atom can still complete; if the session is still incomplete after
/// that the source ended unexpectedly.
pub fn next_form<C: InputCursor + ?Sized>(cursor: &mut C) -> Result<Drained> {
    let mut session = Parser::new();
    loop {
        match session.status() {
            ParserStatus::Full => return Ok(extract(&mut session)),
            ParserStatus::Error => return Err(parse_error(&mut session)),
            ParserStatus::Root | ParserStatus::Pending => {}
        }

        if cursor.pending().is_empty() {
            if cursor.refill()? {
                continue;
            }
            if session.status() == ParserStatus::Pending {
                session.feed(b"\n");
            }
            return match session.status() {
                ParserStatus::Full => Ok(extract(&mut session)),
                ParserStatus::Root => Ok(Drained::Finished),
                ParserStatus::Error => Err(parse_error(&mut session)),
                ParserStatus::Pending => Err(GustError::UnexpectedEnd),
            };
        }

        // May legitimately be zero when a delimiter completes a form.
        let consumed = session.feed(cursor.pending());
        cursor.consume(consumed);
    }
}

fn extract(session: &mut Parser) -> Drained {
    match session.extract_form() {
        Some(form) => Drained::Form(form),
        None => Drained::Finished,
    }
}

fn parse_error(session: &mut Parser) -> GustError {
    GustError::Parse(
        session
            .take_error()
            .unwrap_or_else(|| Diagnostic::new("malformed input")),
    )
}
