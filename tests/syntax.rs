use gust::{
    ast::Form,
    parser::{self, Parser, ParserStatus, MAX_NESTING_DEPTH},
};

fn sym(name: &str) -> Form {
    Form::symbol(name)
}

fn list(items: Vec<Form>) -> Form {
    Form::List(items)
}

/// Splits `source` into pieces of `size` bytes and feeds them one after the
/// other, starting a fresh session after each completed form.
fn parse_in_chunks(source: &[u8], size: usize) -> Result<Vec<Form>, String> {
    let mut forms = Vec::new();
    let mut session = Parser::new();
    for chunk in source.chunks(size) {
        let mut rest = chunk;
        loop {
            let consumed = session.feed(rest);
            rest = &rest[consumed..];
            match session.status() {
                ParserStatus::Full => {
                    forms.extend(session.extract_form());
                    session = Parser::new();
                }
                ParserStatus::Error => {
                    return Err(session.error().map(|d| d.message.clone()).unwrap_or_default());
                }
                ParserStatus::Root | ParserStatus::Pending => {}
            }
            if rest.is_empty() {
                break;
            }
        }
    }
    if session.status() == ParserStatus::Pending {
        session.feed(b"\n");
    }
    match session.status() {
        ParserStatus::Full => forms.extend(session.extract_form()),
        ParserStatus::Root => {}
        _ => return Err("unexpected end of source".into()),
    }
    Ok(forms)
}

#[test]
fn reads_nested_forms() {
    let forms = parser::parse_all(b"(+ 1 (* 2 3.5)) [a \"b\"] {x 1 y nil}").expect("parses");
    assert_eq!(
        forms,
        vec![
            list(vec![
                sym("+"),
                Form::Int(1),
                list(vec![sym("*"), Form::Int(2), Form::Float(3.5)]),
            ]),
            Form::Array(vec![sym("a"), Form::String("b".into())]),
            Form::Table(vec![(sym("x"), Form::Int(1)), (sym("y"), Form::Nil)]),
        ]
    );
}

#[test]
fn quote_wraps_following_form() {
    let forms = parser::parse_all(b"'(1 2) ''x").expect("parses");
    assert_eq!(
        forms,
        vec![
            list(vec![sym("quote"), list(vec![Form::Int(1), Form::Int(2)])]),
            list(vec![sym("quote"), list(vec![sym("quote"), sym("x")])]),
        ]
    );
}

#[test]
fn comments_and_escapes() {
    let forms = parser::parse_all(b"# heading\n\"a\\n\\\"b\\\"\" # trailing").expect("parses");
    assert_eq!(forms, vec![Form::String("a\n\"b\"".into())]);
}

#[test]
fn status_moves_through_pending_to_full() {
    let mut session = Parser::new();
    assert_eq!(session.status(), ParserStatus::Root);
    assert_eq!(session.feed(b"(+ 1"), 4);
    assert_eq!(session.status(), ParserStatus::Pending);
    assert_eq!(session.feed(b" 2)"), 3);
    assert_eq!(session.status(), ParserStatus::Full);
    assert_eq!(session.feed(b"more"), 0);
    assert!(session.extract_form().is_some());
    assert_eq!(session.status(), ParserStatus::Root);
}

#[test]
fn top_level_atom_leaves_its_delimiter() {
    let mut session = Parser::new();
    assert_eq!(session.feed(b"42\n"), 2);
    assert_eq!(session.extract_form(), Some(Form::Int(42)));
}

#[test]
fn synthetic_newline_completes_trailing_atom() {
    let mut session = Parser::new();
    session.feed(b"abc");
    assert_eq!(session.status(), ParserStatus::Pending);
    assert_eq!(session.feed(b"\n"), 0);
    assert_eq!(session.extract_form(), Some(sym("abc")));
}

#[test]
fn stops_after_first_form_in_a_chunk() {
    let mut session = Parser::new();
    let input = b"(a) (b)";
    let consumed = session.feed(input);
    assert_eq!(consumed, 3);
    assert_eq!(session.extract_form(), Some(list(vec![sym("a")])));
    assert_eq!(&input[consumed..], b" (b)");
}

#[test]
fn rejects_malformed_input() {
    for (source, needle) in [
        (&b")"[..], "unexpected closing delimiter"),
        (&b"(1]"[..], "mismatched delimiter"),
        (&b"bogus("[..], "expected whitespace after `bogus`"),
        (&b"12abc "[..], "malformed number"),
        (&b"{a}"[..], "even number of forms"),
        (&b"\"\\q\""[..], "unknown escape"),
        (&b"'"[..], "unexpected end of source"),
    ] {
        let err = parser::parse_all(source).expect_err("should fail");
        assert!(
            err.message.contains(needle),
            "{:?}: `{}` does not mention `{needle}`",
            String::from_utf8_lossy(source),
            err.message
        );
    }
}

#[test]
fn error_status_is_sticky() {
    let mut session = Parser::new();
    session.feed(b")");
    assert_eq!(session.status(), ParserStatus::Error);
    assert_eq!(session.feed(b"(ok)"), 0);
    assert!(session.error().is_some());
}

#[test]
fn unterminated_list_is_pending_at_end() {
    let err = parser::parse_all(b"(+ 1 2").expect_err("incomplete");
    assert!(err.message.contains("unexpected end of source"));
}

#[test]
fn chunk_boundaries_never_change_the_forms() {
    let source = "(def greeting \"héllo, wörld\")\n\
                  (fn square [x] (* x x)) # comment ( with parens\n\
                  [1 2.5 -3 'sym {k \"v\"}] nil true\n\
                  12345 symbol-with-dashes\n\
                  (print (str greeting \" \\\"quoted\\\"\"))"
        .as_bytes();
    let whole = parse_in_chunks(source, source.len()).expect("whole input parses");
    assert_eq!(whole.len(), 8);
    for size in 1..=17 {
        let split = parse_in_chunks(source, size).expect("chunked input parses");
        assert_eq!(split, whole, "chunk size {size}");
    }
}

#[test]
fn nesting_is_bounded() {
    let at_limit = format!("{}{}", "[".repeat(MAX_NESTING_DEPTH), "]".repeat(MAX_NESTING_DEPTH));
    let forms = parser::parse_all(at_limit.as_bytes()).expect("limit itself is allowed");
    assert_eq!(forms.len(), 1);

    for open in ["(", "[", "{", "'"] {
        let deep = open.repeat(MAX_NESTING_DEPTH + 1);
        let err = parser::parse_all(deep.as_bytes()).expect_err("too deep");
        assert_eq!(err.message, "form nested too deeply", "opening with {open}");
    }

    let err = parser::parse_all("(".repeat(20_000).as_bytes()).expect_err("too deep");
    assert_eq!(err.message, "form nested too deeply");
}

#[test]
fn error_position_counts_from_start_of_form() {
    let err = parser::parse_all(b"  \n# leading comment\nbogus(").expect_err("should fail");
    assert_eq!(err.notes, vec!["at byte 5 of this form".to_string()]);

    let mut session = Parser::new();
    assert_eq!(session.feed(b"\n\n"), 2);
    session.feed(b"(a ]");
    assert_eq!(session.status(), ParserStatus::Error);
    let err = session.take_error().expect("error recorded");
    assert_eq!(err.notes, vec!["at byte 3 of this form".to_string()]);
}
