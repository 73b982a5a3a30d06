use std::{fmt, rc::Rc};

use indexmap::IndexMap;

use crate::{
    ast::Form,
    compiler::Node,
    environment::EnvironmentRef,
    runtime::Fault,
};

#[derive(Clone)]
pub struct Value(pub Rc<ValueKind>);

impl Value {
    pub fn new(kind: ValueKind) -> Self {
        Self(Rc::new(kind))
    }

    pub fn nil() -> Self {
        Self::new(ValueKind::Nil)
    }

    pub fn bool(value: bool) -> Self {
        Self::new(ValueKind::Bool(value))
    }

    pub fn int(value: i64) -> Self {
        Self::new(ValueKind::Int(value))
    }

    pub fn float(value: f64) -> Self {
        Self::new(ValueKind::Float(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(ValueKind::String(value.into()))
    }

    pub fn symbol(value: impl Into<String>) -> Self {
        Self::new(ValueKind::Symbol(value.into()))
    }

    pub fn array(values: Vec<Value>) -> Self {
        Self::new(ValueKind::Array(values))
    }

    pub fn table(entries: IndexMap<String, Value>) -> Self {
        Self::new(ValueKind::Table(entries))
    }

    /// Quoted data: the form itself, turned into runtime values.
    pub fn from_form(form: &Form) -> Self {
        match form {
            Form::Nil => Value::nil(),
            Form::Bool(b) => Value::bool(*b),
            Form::Int(n) => Value::int(*n),
            Form::Float(n) => Value::float(*n),
            Form::String(s) => Value::string(s.clone()),
            Form::Symbol(s) => Value::symbol(s.clone()),
            Form::List(items) | Form::Array(items) => {
                Value::array(items.iter().map(Value::from_form).collect())
            }
            Form::Table(entries) => Value::table(
                entries
                    .iter()
                    .map(|(key, value)| (form_key(key), Value::from_form(value)))
                    .collect(),
            ),
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(&*self.0, ValueKind::Nil)
    }

    pub fn is_truthy(&self) -> bool {
        !matches!(&*self.0, ValueKind::Nil | ValueKind::Bool(false))
    }

    pub fn type_name(&self) -> &'static str {
        match &*self.0 {
            ValueKind::Nil => "nil",
            ValueKind::Bool(_) => "bool",
            ValueKind::Int(_) => "int",
            ValueKind::Float(_) => "float",
            ValueKind::String(_) => "string",
            ValueKind::Symbol(_) => "symbol",
            ValueKind::Array(_) => "array",
            ValueKind::Table(_) => "table",
            ValueKind::Function(_) | ValueKind::NativeFunction(_) => "function",
        }
    }

    /// Key used when the value indexes a table.
    pub fn table_key(&self) -> Option<String> {
        match &*self.0 {
            ValueKind::String(s) | ValueKind::Symbol(s) => Some(s.clone()),
            ValueKind::Int(n) => Some(n.to_string()),
            ValueKind::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match &*self.0 {
            ValueKind::Int(n) => Some(*n),
            _ => None,
        }
    }
}

fn form_key(form: &Form) -> String {
    match form {
        Form::String(s) | Form::Symbol(s) => s.clone(),
        other => other.to_string(),
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (&*self.0, &*other.0) {
            (ValueKind::Nil, ValueKind::Nil) => true,
            (ValueKind::Bool(a), ValueKind::Bool(b)) => a == b,
            (ValueKind::Int(a), ValueKind::Int(b)) => a == b,
            (ValueKind::Float(a), ValueKind::Float(b)) => a == b,
            (ValueKind::Int(a), ValueKind::Float(b)) | (ValueKind::Float(b), ValueKind::Int(a)) => {
                *a as f64 == *b
            }
            (ValueKind::String(a), ValueKind::String(b)) => a == b,
            (ValueKind::Symbol(a), ValueKind::Symbol(b)) => a == b,
            (ValueKind::Array(a), ValueKind::Array(b)) => a == b,
            (ValueKind::Table(a), ValueKind::Table(b)) => {
                a.len() == b.len() && a.iter().all(|(key, value)| b.get(key) == Some(value))
            }
            (ValueKind::Function(_), ValueKind::Function(_))
            | (ValueKind::NativeFunction(_), ValueKind::NativeFunction(_)) => {
                Rc::ptr_eq(&self.0, &other.0)
            }
            _ => false,
        }
    }
}

/// Readable description, used by the REPL to show results.
impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            ValueKind::String(s) => write!(f, "{s:?}"),
            ValueKind::Float(n) => write!(f, "{n:?}"),
            ValueKind::Array(values) => {
                write!(f, "[")?;
                for (idx, value) in values.iter().enumerate() {
                    if idx > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{value:?}")?;
                }
                write!(f, "]")
            }
            ValueKind::Table(map) => {
                write!(f, "{{")?;
                for (idx, (key, value)) in map.iter().enumerate() {
                    if idx > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{key:?} {value:?}")?;
                }
                write!(f, "}}")
            }
            _ => write!(f, "{self}"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            ValueKind::Nil => write!(f, "nil"),
            ValueKind::Bool(b) => write!(f, "{b}"),
            ValueKind::Int(n) => write!(f, "{n}"),
            ValueKind::Float(n) => write!(f, "{n}"),
            ValueKind::String(s) => write!(f, "{s}"),
            ValueKind::Symbol(s) => write!(f, "{s}"),
            ValueKind::Array(values) => {
                write!(f, "[")?;
                for (idx, value) in values.iter().enumerate() {
                    if idx > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{value}")?;
                }
                write!(f, "]")
            }
            ValueKind::Table(map) => {
                write!(f, "{{")?;
                for (idx, (key, value)) in map.iter().enumerate() {
                    if idx > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{key} {value}")?;
                }
                write!(f, "}}")
            }
            ValueKind::Function(fun) => write!(
                f,
                "<fn {}>",
                fun.name.as_deref().unwrap_or("anonymous")
            ),
            ValueKind::NativeFunction(fun) => write!(f, "<native fn {}>", fun.name),
        }
    }
}

pub enum ValueKind {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Symbol(String),
    Array(Vec<Value>),
    Table(IndexMap<String, Value>),
    Function(Closure),
    NativeFunction(NativeFunction),
}

pub struct Closure {
    pub name: Option<String>,
    pub params: Vec<String>,
    pub body: Rc<[Node]>,
    pub env: EnvironmentRef,
}

/// `usize::MAX` arity marks a variadic native.
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub callback: fn(&[Value]) -> Result<Value, Fault>,
}

impl NativeFunction {
    pub fn call(&self, args: &[Value]) -> Result<Value, Fault> {
        if self.arity != usize::MAX && args.len() != self.arity {
            return Err(Fault::error(format!(
                "function `{}` expected {} arguments but received {}",
                self.name,
                self.arity,
                args.len()
            )));
        }
        (self.callback)(args)
    }
}
