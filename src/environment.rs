use std::{cell::RefCell, rc::Rc};

use indexmap::IndexMap;

use crate::value::Value;

pub type EnvironmentRef = Rc<RefCell<Environment>>;

#[derive(Default)]
pub struct Environment {
    parent: Option<EnvironmentRef>,
    bindings: IndexMap<String, Binding>,
}

impl Environment {
    pub fn new() -> EnvironmentRef {
        Rc::new(RefCell::new(Self::default()))
    }

    pub fn with_parent(parent: EnvironmentRef) -> EnvironmentRef {
        Rc::new(RefCell::new(Self {
            parent: Some(parent),
            bindings: IndexMap::new(),
        }))
    }

    pub fn define(&mut self, name: impl Into<String>, value: Value, mutable: bool) {
        self.bindings.insert(name.into(), Binding { value, mutable });
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Walks the scope chain. Returns `false` if no binding with that name
    /// exists; mutability has already been checked by the compiler.
    pub fn assign(env: &EnvironmentRef, name: &str, value: Value) -> bool {
        if let Some(binding) = env.borrow_mut().bindings.get_mut(name) {
            binding.value = value;
            return true;
        }
        let parent = env.borrow().parent.clone();
        match parent {
            Some(parent) => Environment::assign(&parent, name, value),
            None => false,
        }
    }

    pub fn get(env: &EnvironmentRef, name: &str) -> Option<Value> {
        if let Some(binding) = env.borrow().bindings.get(name) {
            return Some(binding.value.clone());
        }
        let parent = env.borrow().parent.clone();
        parent.and_then(|parent| Environment::get(&parent, name))
    }

    /// Mutability of the nearest binding called `name`, if any.
    pub fn lookup(env: &EnvironmentRef, name: &str) -> Option<bool> {
        if let Some(binding) = env.borrow().bindings.get(name) {
            return Some(binding.mutable);
        }
        let parent = env.borrow().parent.clone();
        parent.and_then(|parent| Environment::lookup(&parent, name))
    }
}

#[derive(Clone)]
pub struct Binding {
    pub value: Value,
    pub mutable: bool,
}
