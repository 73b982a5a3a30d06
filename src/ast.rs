use std::fmt;

/// One complete top-level syntax unit produced by the parser.
#[derive(Debug, Clone, PartialEq)]
pub enum Form {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Symbol(String),
    List(Vec<Form>),
    Array(Vec<Form>),
    Table(Vec<(Form, Form)>),
}

impl Form {
    pub fn symbol(name: impl Into<String>) -> Self {
        Form::Symbol(name.into())
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Form::Symbol(name) => Some(name),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Form::Nil => "nil",
            Form::Bool(_) => "bool",
            Form::Int(_) => "int",
            Form::Float(_) => "float",
            Form::String(_) => "string",
            Form::Symbol(_) => "symbol",
            Form::List(_) => "list",
            Form::Array(_) => "array",
            Form::Table(_) => "table",
        }
    }
}

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Form::Nil => write!(f, "nil"),
            Form::Bool(b) => write!(f, "{b}"),
            Form::Int(n) => write!(f, "{n}"),
            Form::Float(n) => write!(f, "{n:?}"),
            Form::String(s) => write!(f, "{s:?}"),
            Form::Symbol(s) => write!(f, "{s}"),
            Form::List(items) => write_seq(f, "(", items, ")"),
            Form::Array(items) => write_seq(f, "[", items, "]"),
            Form::Table(entries) => {
                write!(f, "{{")?;
                for (idx, (key, value)) in entries.iter().enumerate() {
                    if idx > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{key} {value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

fn write_seq(f: &mut fmt::Formatter<'_>, open: &str, items: &[Form], close: &str) -> fmt::Result {
    write!(f, "{open}")?;
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            write!(f, " ")?;
        }
        write!(f, "{item}")?;
    }
    write!(f, "{close}")
}
