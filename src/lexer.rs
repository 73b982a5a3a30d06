//! Byte classification and atom decoding shared by the incremental parser.

use crate::ast::Form;

pub fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r' | b'\x0b' | b'\x0c' | b',')
}

pub fn is_opening(byte: u8) -> bool {
    matches!(byte, b'(' | b'[' | b'{')
}

pub fn is_closing(byte: u8) -> bool {
    matches!(byte, b')' | b']' | b'}')
}

/// Bytes that may not appear inside an atom.
pub fn is_delimiter(byte: u8) -> bool {
    is_whitespace(byte) || is_opening(byte) || is_closing(byte) || matches!(byte, b'"' | b'\'' | b'#')
}

/// Decodes a finished atom: a number, one of the literal keywords, or a symbol.
pub fn atom(bytes: &[u8]) -> Result<Form, String> {
    let text = std::str::from_utf8(bytes).map_err(|_| "invalid UTF-8 in symbol".to_string())?;
    match text {
        "nil" => return Ok(Form::Nil),
        "true" => return Ok(Form::Bool(true)),
        "false" => return Ok(Form::Bool(false)),
        _ => {}
    }
    if looks_numeric(text) {
        return number(text);
    }
    Ok(Form::Symbol(text.to_string()))
}

fn looks_numeric(text: &str) -> bool {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    let digits = digits.strip_prefix('.').unwrap_or(digits);
    digits.as_bytes().first().is_some_and(u8::is_ascii_digit)
}

fn number(text: &str) -> Result<Form, String> {
    let cleaned: String = text.chars().filter(|ch| *ch != '_').collect();
    if let Ok(n) = cleaned.parse::<i64>() {
        return Ok(Form::Int(n));
    }
    let is_float_syntax = cleaned
        .chars()
        .all(|ch| ch.is_ascii_digit() || matches!(ch, '.' | 'e' | 'E' | '+' | '-'));
    if is_float_syntax {
        if let Ok(n) = cleaned.parse::<f64>() {
            return Ok(Form::Float(n));
        }
    }
    Err(format!("malformed number `{text}`"))
}

/// Maps the byte after a backslash inside a string literal.
pub fn escape(byte: u8) -> Option<u8> {
    match byte {
        b'n' => Some(b'\n'),
        b't' => Some(b'\t'),
        b'r' => Some(b'\r'),
        b'0' => Some(b'\0'),
        b'"' => Some(b'"'),
        b'\\' => Some(b'\\'),
        _ => None,
    }
}
