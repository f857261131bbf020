//! Lexical environments
//!
//! Each block, function and catch clause gets its own [`Scope`]; closures keep the
//! scope they were created in alive through [`Env`].

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::fault::Fault;
use super::value::Value;

pub type Env<'a> = Rc<RefCell<Scope<'a>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Var,
    Let,
    Const,
    Function,
    Param,
}

struct Binding<'a> {
    value: Value<'a>,
    kind: BindingKind,
}

pub struct Scope<'a> {
    bindings: FxHashMap<Rc<str>, Binding<'a>>,
    parent: Option<Env<'a>>,
    /// Function bodies (and the global scope) own `var` declarations.
    var_scope: bool,
    /// `None` for blocks and arrow functions, which see the enclosing `this`.
    this: Option<Value<'a>>,
}

impl<'a> Scope<'a> {
    pub fn global() -> Env<'a> {
        Rc::new(RefCell::new(Scope {
            bindings: FxHashMap::default(),
            parent: None,
            var_scope: true,
            this: Some(Value::Undefined),
        }))
    }

    pub fn block(parent: &Env<'a>) -> Env<'a> {
        Rc::new(RefCell::new(Scope {
            bindings: FxHashMap::default(),
            parent: Some(parent.clone()),
            var_scope: false,
            this: None,
        }))
    }

    /// `this_value` is `None` for arrow functions, which see the enclosing `this`.
    pub fn function(parent: &Env<'a>, this_value: Option<Value<'a>>) -> Env<'a> {
        Rc::new(RefCell::new(Scope {
            bindings: FxHashMap::default(),
            parent: Some(parent.clone()),
            var_scope: true,
            this: this_value,
        }))
    }

    /// Drops every binding; used to break closure/scope reference cycles.
    pub fn clear(&mut self) {
        self.bindings.clear();
        self.this = None;
    }
}

pub fn declare<'a>(
    env: &Env<'a>,
    name: &str,
    value: Value<'a>,
    kind: BindingKind,
) -> Result<(), Fault<'a>> {
    if kind == BindingKind::Var {
        let target = function_scope_of(env);
        let mut scope = target.borrow_mut();
        match scope.bindings.get_mut(name) {
            Some(existing) if matches!(existing.kind, BindingKind::Let | BindingKind::Const) => {
                return Err(Fault::syntax_error(format!(
                    "Identifier '{}' has already been declared",
                    name
                )));
            }
            Some(existing) => existing.value = value,
            None => {
                scope
                    .bindings
                    .insert(Rc::from(name), Binding { value, kind });
            }
        }
        return Ok(());
    }

    let mut scope = env.borrow_mut();
    if let Some(existing) = scope.bindings.get(name) {
        let lexical = matches!(kind, BindingKind::Let | BindingKind::Const);
        let existing_lexical = matches!(existing.kind, BindingKind::Let | BindingKind::Const);
        if lexical || existing_lexical {
            return Err(Fault::syntax_error(format!(
                "Identifier '{}' has already been declared",
                name
            )));
        }
    }
    scope
        .bindings
        .insert(Rc::from(name), Binding { value, kind });
    Ok(())
}

/// Declares `name` as `undefined` in the nearest function scope unless present.
pub fn hoist_var<'a>(env: &Env<'a>, name: &str) {
    let target = function_scope_of(env);
    let mut scope = target.borrow_mut();
    if !scope.bindings.contains_key(name) {
        scope.bindings.insert(
            Rc::from(name),
            Binding {
                value: Value::Undefined,
                kind: BindingKind::Var,
            },
        );
    }
}

pub fn lookup<'a>(env: &Env<'a>, name: &str) -> Option<Value<'a>> {
    let mut current = env.clone();
    loop {
        let next = {
            let scope = current.borrow();
            if let Some(binding) = scope.bindings.get(name) {
                return Some(binding.value.clone());
            }
            scope.parent.clone()
        };
        current = next?;
    }
}

pub fn assign<'a>(env: &Env<'a>, name: &str, value: Value<'a>) -> Result<(), Fault<'a>> {
    let mut current = env.clone();
    loop {
        let next = {
            let mut scope = current.borrow_mut();
            if let Some(binding) = scope.bindings.get_mut(name) {
                if binding.kind == BindingKind::Const {
                    return Err(Fault::type_error("Assignment to constant variable."));
                }
                binding.value = value;
                return Ok(());
            }
            scope.parent.clone()
        };
        match next {
            Some(parent) => current = parent,
            None => return Err(Fault::reference_error(format!("{} is not defined", name))),
        }
    }
}

pub fn this_value<'a>(env: &Env<'a>) -> Value<'a> {
    let mut current = env.clone();
    loop {
        let next = {
            let scope = current.borrow();
            if let Some(this) = &scope.this {
                return this.clone();
            }
            scope.parent.clone()
        };
        match next {
            Some(parent) => current = parent,
            None => return Value::Undefined,
        }
    }
}

fn function_scope_of<'a>(env: &Env<'a>) -> Env<'a> {
    let mut current = env.clone();
    loop {
        let next = {
            let scope = current.borrow();
            if scope.var_scope {
                None
            } else {
                scope.parent.clone()
            }
        };
        match next {
            Some(parent) => current = parent,
            None => return current,
        }
    }
}
