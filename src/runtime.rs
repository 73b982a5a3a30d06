use std::rc::Rc;

use indexmap::IndexMap;

use crate::{
    compiler::{Node, Unit},
    diagnostics::GustError,
    environment::{Environment, EnvironmentRef},
    value::{Closure, Value, ValueKind},
};

/// Name the previous result is bound to before each form is compiled.
pub const PREVIOUS_RESULT: &str = "_";

/// Deepest chain of nested calls before the VM gives up.
pub const MAX_CALL_DEPTH: usize = 256;

/// Why a unit stopped before producing a value.
#[derive(Debug)]
pub enum Fault {
    /// The program raised an error value.
    Error(Value),
    /// The VM itself cannot continue.
    Crash(String),
}

impl Fault {
    pub fn error(message: impl Into<String>) -> Self {
        Fault::Error(Value::string(message))
    }
}

impl From<Fault> for GustError {
    fn from(fault: Fault) -> Self {
        match fault {
            Fault::Error(value) => GustError::Runtime(value),
            Fault::Crash(message) => GustError::Crash(message),
        }
    }
}

/// The virtual machine: the global environment, the previous result, and the
/// evaluator for compiled units. Dropping it releases everything it owns.
pub struct Vm {
    globals: EnvironmentRef,
    previous: Value,
    depth: usize,
}

impl Drop for Vm {
    /// Global closures capture the globals, so the bindings are emptied
    /// outside the borrow to break the cycle.
    fn drop(&mut self) {
        let globals = std::mem::take(&mut *self.globals.borrow_mut());
        drop(globals);
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl Vm {
    /// Creates a VM with the standard library installed.
    pub fn new() -> Self {
        let globals = Environment::new();
        crate::stdlib::install(&globals);
        Self {
            globals,
            previous: Value::nil(),
            depth: 0,
        }
    }

    pub fn globals(&self) -> &EnvironmentRef {
        &self.globals
    }

    pub fn previous(&self) -> &Value {
        &self.previous
    }

    pub fn set_previous(&mut self, value: Value) {
        self.previous = value;
    }

    /// Exposes the previous result under [`PREVIOUS_RESULT`].
    pub fn bind_previous(&mut self) {
        self.globals
            .borrow_mut()
            .define(PREVIOUS_RESULT, self.previous.clone(), false);
    }

    pub fn global(&self, name: &str) -> Option<Value> {
        Environment::get(&self.globals, name)
    }

    pub fn run(&mut self, unit: &Unit) -> Result<Value, Fault> {
        self.depth = 0;
        let env = Rc::clone(&self.globals);
        self.evaluate(&unit.body, &env)
    }

    pub fn render(&self, value: &Value) -> String {
        format!("{value:?}")
    }

    fn evaluate(&mut self, node: &Node, env: &EnvironmentRef) -> Result<Value, Fault> {
        match node {
            Node::Constant(value) => Ok(value.clone()),
            Node::Lookup(name) => Environment::get(env, name)
                .ok_or_else(|| Fault::error(format!("undefined symbol `{name}`"))),
            Node::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition, env)?.is_truthy() {
                    self.evaluate(then_branch, env)
                } else if let Some(branch) = else_branch {
                    self.evaluate(branch, env)
                } else {
                    Ok(Value::nil())
                }
            }
            Node::Do(nodes) => self.evaluate_body(nodes, env),
            Node::Define {
                name,
                value,
                mutable,
            } => {
                let value = self.evaluate(value, env)?;
                env.borrow_mut().define(name.clone(), value.clone(), *mutable);
                Ok(value)
            }
            Node::Assign { name, value } => {
                let value = self.evaluate(value, env)?;
                if Environment::assign(env, name, value.clone()) {
                    Ok(value)
                } else {
                    Err(Fault::error(format!("undefined symbol `{name}`")))
                }
            }
            Node::Function { name, params, body } => Ok(Value::new(ValueKind::Function(Closure {
                name: name.clone(),
                params: params.clone(),
                body: Rc::clone(body),
                env: Rc::clone(env),
            }))),
            Node::While { condition, body } => {
                while self.evaluate(condition, env)?.is_truthy() {
                    for node in body {
                        self.evaluate(node, env)?;
                    }
                }
                Ok(Value::nil())
            }
            Node::Call { callee, args } => {
                let callee = self.evaluate(callee, env)?;
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.evaluate(arg, env)?);
                }
                self.call(&callee, &values)
            }
            Node::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.evaluate(item, env)?);
                }
                Ok(Value::array(values))
            }
            Node::Table(entries) => {
                let mut table = IndexMap::with_capacity(entries.len());
                for (key, value) in entries {
                    let key_value = self.evaluate(key, env)?;
                    let key = key_value.table_key().ok_or_else(|| {
                        Fault::error(format!(
                            "{} cannot be used as a table key",
                            key_value.type_name()
                        ))
                    })?;
                    table.insert(key, self.evaluate(value, env)?);
                }
                Ok(Value::table(table))
            }
        }
    }

    fn evaluate_body(&mut self, nodes: &[Node], env: &EnvironmentRef) -> Result<Value, Fault> {
        let mut last = Value::nil();
        for node in nodes {
            last = self.evaluate(node, env)?;
        }
        Ok(last)
    }

    fn call(&mut self, callee: &Value, args: &[Value]) -> Result<Value, Fault> {
        match &*callee.0 {
            ValueKind::NativeFunction(fun) => fun.call(args),
            ValueKind::Function(fun) => {
                if args.len() != fun.params.len() {
                    return Err(Fault::error(format!(
                        "function `{}` expected {} arguments but received {}",
                        fun.name.as_deref().unwrap_or("anonymous"),
                        fun.params.len(),
                        args.len()
                    )));
                }
                if self.depth >= MAX_CALL_DEPTH {
                    return Err(Fault::Crash("stack overflow".into()));
                }
                let frame = Environment::with_parent(Rc::clone(&fun.env));
                {
                    let mut scope = frame.borrow_mut();
                    if let Some(name) = &fun.name {
                        scope.define(name.clone(), callee.clone(), false);
                    }
                    for (name, value) in fun.params.iter().zip(args) {
                        scope.define(name.clone(), value.clone(), true);
                    }
                }
                self.depth += 1;
                let result = self.evaluate_body(&fun.body, &frame);
                self.depth -= 1;
                result
            }
            _ => Err(Fault::error(format!(
                "{} `{callee:?}` is not callable",
                callee.type_name()
            ))),
        }
    }
}
