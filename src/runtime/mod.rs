//! Execution Runtime
//!
//! A tree-walking interpreter over the parsed executable unit. The only host
//! binding it ever receives is the rendering capability passed to the unit;
//! everything else the unit can reach is a pure language intrinsic.
//!
//! Values borrow the program's arena (`'a`), so an [`Interpreter`] never
//! outlives the cycle that parsed its program.

mod builtins;
mod expressions;
mod fault;
mod property;
mod react;
mod scope;
mod statements;
mod value;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use oxc_ast::ast::{FunctionBody, FormalParameters, Program, Statement};

use builtins::{call_intrinsic, call_method, install_globals};
use scope::{Env, Scope};
use statements::Flow;

pub use fault::{ErrorKind, Fault};
pub use react::{capability, run_effects, unmount_missing, HookStore};
pub use value::{format_number, Element, Object, Value, FRAGMENT_SYMBOL};

pub(crate) use value::Callable;

const NATIVE_UNITS_PER_STEP: u64 = 16;

/// Resource limits for one executed unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_call_depth: usize,
    pub max_steps: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_call_depth: 128,
            max_steps: 1_000_000,
        }
    }
}

pub struct Interpreter<'a> {
    globals: Env<'a>,
    limits: Limits,
    depth: usize,
    steps: u64,
    /// Source text of the running program, for "x is not a function" messages.
    source: &'a str,
    pub hooks: HookStore<'a>,
    /// Every environment a closure captured; emptied on drop so closure/scope
    /// reference cycles do not leak.
    captured: Vec<Weak<RefCell<Scope<'a>>>>,
}

impl<'a> Interpreter<'a> {
    pub fn new(limits: Limits) -> Result<Self, Fault<'a>> {
        let globals = Scope::global();
        install_globals(&globals)?;
        Ok(Self {
            globals,
            limits,
            depth: 0,
            steps: 0,
            source: "",
            hooks: HookStore::default(),
            captured: Vec::new(),
        })
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Runs a script and yields the value of its last expression statement.
    pub fn run_program(&mut self, program: &'a Program<'a>) -> Result<Value<'a>, Fault<'a>> {
        self.source = program.source_text;
        let env = self.globals.clone();
        self.hoist_vars(&program.body, &env);
        self.hoist_functions(&program.body, &env)?;

        let mut completion = Value::Undefined;
        for statement in &program.body {
            if let Statement::ExpressionStatement(expression) = statement {
                self.tick()?;
                completion = self.eval_expression(&expression.expression, &env)?;
                continue;
            }
            match self.exec_statement(statement, &env, None)? {
                Flow::Normal => {}
                Flow::Return(_) => return Err(Fault::syntax_error("Illegal return statement")),
                Flow::Break(_) | Flow::Continue(_) => {
                    return Err(Fault::syntax_error("Illegal break statement"))
                }
            }
        }
        Ok(completion)
    }

    /// Calls any callable value with an explicit `this` and arguments.
    pub fn call(
        &mut self,
        callee: &Value<'a>,
        this: Value<'a>,
        args: Vec<Value<'a>>,
    ) -> Result<Value<'a>, Fault<'a>> {
        let Value::Function(callable) = callee else {
            return Err(Fault::type_error(format!(
                "{} is not a function",
                property::describe(callee)
            )));
        };
        if self.depth >= self.limits.max_call_depth {
            return Err(Fault::range_error("Maximum call stack size exceeded"));
        }
        self.tick()?;

        self.depth += 1;
        let result = match callable.as_ref() {
            Callable::Closure(closure) => self.call_closure(closure, this, args),
            Callable::Intrinsic(intrinsic) => call_intrinsic(self, *intrinsic, args),
            Callable::Method { receiver, name } => call_method(self, receiver, name, args),
            Callable::StateSetter { instance, slot } => {
                react::set_state(self, instance, *slot, args)
            }
            Callable::Dispatch { instance, slot } => react::dispatch(self, instance, *slot, args),
        };
        self.depth -= 1;
        result
    }

    fn call_closure(
        &mut self,
        closure: &value::Closure<'a>,
        this: Value<'a>,
        args: Vec<Value<'a>>,
    ) -> Result<Value<'a>, Fault<'a>> {
        let this = if closure.arrow { None } else { Some(this) };
        let env = Scope::function(&closure.env, this);
        self.bind_parameters(closure.params, args, &env)?;

        let statements = &closure.body.statements;
        if closure.concise {
            if let Some(Statement::ExpressionStatement(expression)) = statements.first() {
                return self.eval_expression(&expression.expression, &env);
            }
        }

        self.hoist_vars(statements, &env);
        match self.exec_statements(statements, &env)? {
            Flow::Return(value) => Ok(value),
            _ => Ok(Value::Undefined),
        }
    }

    /// Creates a closure over `env` and remembers the environment for teardown.
    pub(crate) fn make_closure(
        &mut self,
        name: Option<Rc<str>>,
        params: &'a FormalParameters<'a>,
        body: &'a FunctionBody<'a>,
        concise: bool,
        arrow: bool,
        env: &Env<'a>,
    ) -> Value<'a> {
        if self.captured.len() % 1024 == 1023 {
            self.captured.retain(|weak| weak.strong_count() > 0);
        }
        self.captured.push(Rc::downgrade(env));
        Value::function(Callable::Closure(value::Closure {
            name,
            params,
            body,
            concise,
            arrow,
            env: env.clone(),
        }))
    }

    /// Counts one unit of work against the step budget.
    pub(crate) fn tick(&mut self) -> Result<(), Fault<'a>> {
        self.spend(1)
    }

    /// Counts native work (elements or bytes copied, visited or produced) against
    /// the step budget, [`NATIVE_UNITS_PER_STEP`] units to a step.
    pub(crate) fn charge(&mut self, units: usize) -> Result<(), Fault<'a>> {
        self.spend((units as u64).div_ceil(NATIVE_UNITS_PER_STEP))
    }

    fn spend(&mut self, steps: u64) -> Result<(), Fault<'a>> {
        self.steps = self.steps.saturating_add(steps);
        if self.steps > self.limits.max_steps {
            return Err(Fault::new(ErrorKind::Error, "Execution step limit exceeded"));
        }
        Ok(())
    }

    pub(crate) fn source_slice(&self, start: u32, end: u32) -> &'a str {
        self.source
            .get(start as usize..end as usize)
            .unwrap_or_default()
    }
}

impl Drop for Interpreter<'_> {
    fn drop(&mut self) {
        self.hooks.clear();
        for weak in self.captured.drain(..) {
            if let Some(env) = weak.upgrade() {
                if let Ok(mut scope) = env.try_borrow_mut() {
                    scope.clear();
                }
            }
        }
        if let Ok(mut globals) = self.globals.try_borrow_mut() {
            globals.clear();
        }
    }
}
