//! Turns a parsed [`Form`] into an executable [`Unit`].
//!
//! Compilation resolves special forms, checks their shape, and makes sure
//! every symbol refers to a binding that will exist when the unit runs. The
//! result is a tree of [`Node`]s the VM walks directly.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::{
    ast::Form,
    diagnostics::Diagnostic,
    environment::{Environment, EnvironmentRef},
    value::Value,
};

pub const SPECIAL_FORMS: &[&str] = &["quote", "if", "do", "def", "var", "set", "fn", "while"];

#[derive(Debug, Clone)]
pub enum Node {
    Constant(Value),
    Lookup(String),
    If {
        condition: Box<Node>,
        then_branch: Box<Node>,
        else_branch: Option<Box<Node>>,
    },
    Do(Vec<Node>),
    Define {
        name: String,
        value: Box<Node>,
        mutable: bool,
    },
    Assign {
        name: String,
        value: Box<Node>,
    },
    Function {
        name: Option<String>,
        params: Vec<String>,
        body: Rc<[Node]>,
    },
    While {
        condition: Box<Node>,
        body: Vec<Node>,
    },
    Call {
        callee: Box<Node>,
        args: Vec<Node>,
    },
    Array(Vec<Node>),
    Table(Vec<(Node, Node)>),
}

/// One compiled top-level form.
#[derive(Debug, Clone)]
pub struct Unit {
    pub body: Node,
}

pub fn compile(form: &Form, env: &EnvironmentRef) -> Result<Unit, Diagnostic> {
    let mut compiler = Compiler {
        globals: Rc::clone(env),
        scopes: vec![IndexMap::new()],
    };
    let body = compiler.compile(form)?;
    Ok(Unit { body })
}

/// Names declared while compiling, innermost scope last. The first scope
/// holds globals introduced by this unit, which do not exist yet.
struct Compiler {
    globals: EnvironmentRef,
    scopes: Vec<IndexMap<String, bool>>,
}

impl Compiler {
    fn compile(&mut self, form: &Form) -> Result<Node, Diagnostic> {
        match form {
            Form::Nil => Ok(Node::Constant(Value::nil())),
            Form::Bool(b) => Ok(Node::Constant(Value::bool(*b))),
            Form::Int(n) => Ok(Node::Constant(Value::int(*n))),
            Form::Float(n) => Ok(Node::Constant(Value::float(*n))),
            Form::String(s) => Ok(Node::Constant(Value::string(s.clone()))),
            Form::Symbol(name) => self.lookup(name),
            Form::Array(items) => Ok(Node::Array(self.compile_all(items)?)),
            Form::Table(entries) => {
                let mut nodes = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    nodes.push((self.compile_key(key)?, self.compile(value)?));
                }
                Ok(Node::Table(nodes))
            }
            Form::List(items) => self.compile_list(items),
        }
    }

    fn compile_all(&mut self, forms: &[Form]) -> Result<Vec<Node>, Diagnostic> {
        forms.iter().map(|form| self.compile(form)).collect()
    }

    /// Bare symbols in key position are taken literally.
    fn compile_key(&mut self, key: &Form) -> Result<Node, Diagnostic> {
        match key {
            Form::Symbol(name) => Ok(Node::Constant(Value::symbol(name.clone()))),
            other => self.compile(other),
        }
    }

    fn compile_list(&mut self, items: &[Form]) -> Result<Node, Diagnostic> {
        let Some((head, args)) = items.split_first() else {
            return Err(Diagnostic::new("empty form has no callee")
                .with_note("use '() or [] for an empty array"));
        };
        match head.as_symbol() {
            Some("quote") => {
                let [quoted] = expect_args::<1>("quote", args)?;
                Ok(Node::Constant(Value::from_form(quoted)))
            }
            Some("if") => self.compile_if(args),
            Some("do") => self.compile_body(args),
            Some(keyword @ ("def" | "var")) => self.compile_define(keyword, args),
            Some("set") => self.compile_set(args),
            Some("fn") => self.compile_fn(args),
            Some("while") => {
                let Some((condition, body)) = args.split_first() else {
                    return Err(Diagnostic::new("`while` needs a condition"));
                };
                Ok(Node::While {
                    condition: Box::new(self.compile(condition)?),
                    body: self.compile_all(body)?,
                })
            }
            _ => Ok(Node::Call {
                callee: Box::new(self.compile(head)?),
                args: self.compile_all(args)?,
            }),
        }
    }

    fn compile_if(&mut self, args: &[Form]) -> Result<Node, Diagnostic> {
        let (condition, then_branch, else_branch) = match args {
            [condition, then_branch] => (condition, then_branch, None),
            [condition, then_branch, else_branch] => (condition, then_branch, Some(else_branch)),
            _ => {
                return Err(Diagnostic::new(format!(
                    "`if` expects 2 or 3 arguments but received {}",
                    args.len()
                )));
            }
        };
        Ok(Node::If {
            condition: Box::new(self.compile(condition)?),
            then_branch: Box::new(self.compile(then_branch)?),
            else_branch: match else_branch {
                Some(form) => Some(Box::new(self.compile(form)?)),
                None => None,
            },
        })
    }

    fn compile_body(&mut self, forms: &[Form]) -> Result<Node, Diagnostic> {
        match forms {
            [] => Ok(Node::Constant(Value::nil())),
            [single] => self.compile(single),
            _ => Ok(Node::Do(self.compile_all(forms)?)),
        }
    }

    fn compile_define(&mut self, keyword: &str, args: &[Form]) -> Result<Node, Diagnostic> {
        let [target, value] = expect_args::<2>(keyword, args)?;
        let name = self.binding_name(keyword, target)?;
        let mutable = keyword == "var";
        // Declared first so the value may refer to itself.
        self.declare(&name, mutable);
        Ok(Node::Define {
            value: Box::new(self.compile(value)?),
            name,
            mutable,
        })
    }

    fn compile_set(&mut self, args: &[Form]) -> Result<Node, Diagnostic> {
        let [target, value] = expect_args::<2>("set", args)?;
        let name = self.binding_name("set", target)?;
        match self.resolve(&name) {
            Some(true) => {}
            Some(false) => {
                return Err(Diagnostic::new(format!("cannot set immutable binding `{name}`"))
                    .with_note("declare it with `var` to make it mutable"));
            }
            None => return Err(Diagnostic::new(format!("undefined symbol `{name}`"))),
        }
        Ok(Node::Assign {
            value: Box::new(self.compile(value)?),
            name,
        })
    }

    fn compile_fn(&mut self, args: &[Form]) -> Result<Node, Diagnostic> {
        let (name, rest) = match args.split_first() {
            Some((Form::Symbol(name), rest)) => (Some(name.clone()), rest),
            _ => (None, args),
        };
        let Some((Form::Array(param_forms), body)) = rest.split_first() else {
            return Err(Diagnostic::new("`fn` expects a parameter array")
                .with_note("write (fn [a b] body) or (fn name [a b] body)"));
        };
        let mut params: Vec<String> = Vec::with_capacity(param_forms.len());
        for param in param_forms {
            let param = self.binding_name("fn", param)?;
            if params.contains(&param) {
                return Err(Diagnostic::new(format!("duplicate parameter `{param}`")));
            }
            params.push(param);
        }

        let mut scope = IndexMap::new();
        if let Some(name) = &name {
            scope.insert(name.clone(), false);
        }
        for param in &params {
            scope.insert(param.clone(), true);
        }
        self.scopes.push(scope);
        let body = self.compile_all(body);
        self.scopes.pop();

        Ok(Node::Function {
            name,
            params,
            body: body?.into(),
        })
    }

    fn binding_name(&self, context: &str, form: &Form) -> Result<String, Diagnostic> {
        match form {
            Form::Symbol(name) if SPECIAL_FORMS.contains(&name.as_str()) => Err(Diagnostic::new(
                format!("cannot rebind special form `{name}`"),
            )),
            Form::Symbol(name) => Ok(name.clone()),
            other => Err(Diagnostic::new(format!(
                "`{context}` expects a symbol but found {} `{other}`",
                other.kind_name()
            ))),
        }
    }

    fn declare(&mut self, name: &str, mutable: bool) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), mutable);
        }
    }

    /// Mutability of the binding `name` resolves to, if it resolves at all.
    fn resolve(&self, name: &str) -> Option<bool> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
            .or_else(|| Environment::lookup(&self.globals, name))
    }

    fn lookup(&self, name: &str) -> Result<Node, Diagnostic> {
        if SPECIAL_FORMS.contains(&name) {
            return Err(Diagnostic::new(format!(
                "special form `{name}` cannot be used as a value"
            )));
        }
        match self.resolve(name) {
            Some(_) => Ok(Node::Lookup(name.to_string())),
            None => Err(Diagnostic::new(format!("undefined symbol `{name}`"))),
        }
    }
}

fn expect_args<'a, const N: usize>(
    keyword: &str,
    args: &'a [Form],
) -> Result<&'a [Form; N], Diagnostic> {
    args.try_into().map_err(|_| {
        Diagnostic::new(format!(
            "`{keyword}` expects {N} argument{} but received {}",
            if N == 1 { "" } else { "s" },
            args.len()
        ))
    })
}
