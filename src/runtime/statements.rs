//! Statement execution, hoisting and binding patterns.

use std::rc::Rc;

use oxc_ast::ast::{
    BindingPattern, Expression, ForStatement, ForStatementInit, ForStatementLeft,
    FormalParameters, Function, Statement, SwitchStatement, TryStatement, VariableDeclaration,
    VariableDeclarationKind,
};

use super::fault::Fault;
use super::property::{get_property, iterate, own_keys};
use super::scope::{assign, declare, hoist_var, lookup, BindingKind, Env, Scope};
use super::value::{strict_equals, Object, Value};
use super::Interpreter;

/// How a statement completed.
pub enum Flow<'a> {
    Normal,
    Return(Value<'a>),
    Break(Option<Rc<str>>),
    Continue(Option<Rc<str>>),
}

/// What a loop does with the flow its body produced.
enum LoopControl<'a> {
    Next,
    Exit,
    Propagate(Flow<'a>),
}

fn loop_control<'a>(flow: Flow<'a>, label: Option<&str>) -> LoopControl<'a> {
    match flow {
        Flow::Normal => LoopControl::Next,
        Flow::Break(None) => LoopControl::Exit,
        Flow::Continue(None) => LoopControl::Next,
        Flow::Break(Some(target)) if Some(target.as_ref()) == label => LoopControl::Exit,
        Flow::Continue(Some(target)) if Some(target.as_ref()) == label => LoopControl::Next,
        other => LoopControl::Propagate(other),
    }
}

fn binding_kind<'a>(kind: VariableDeclarationKind) -> Result<BindingKind, Fault<'a>> {
    match kind {
        VariableDeclarationKind::Var => Ok(BindingKind::Var),
        VariableDeclarationKind::Let => Ok(BindingKind::Let),
        VariableDeclarationKind::Const => Ok(BindingKind::Const),
        VariableDeclarationKind::Using | VariableDeclarationKind::AwaitUsing => {
            Err(Fault::unsupported("`using` declarations"))
        }
    }
}

impl<'a> Interpreter<'a> {
    // ═══════════════════════════════════════════════════════════════════════════
    // BLOCKS & HOISTING
    // ═══════════════════════════════════════════════════════════════════════════

    pub(crate) fn exec_statements(
        &mut self,
        statements: &'a [Statement<'a>],
        env: &Env<'a>,
    ) -> Result<Flow<'a>, Fault<'a>> {
        self.hoist_functions(statements, env)?;
        for statement in statements {
            match self.exec_statement(statement, env, None)? {
                Flow::Normal => {}
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal)
    }

    /// Function declarations are initialized on entry to their block.
    pub(crate) fn hoist_functions(
        &mut self,
        statements: &'a [Statement<'a>],
        env: &Env<'a>,
    ) -> Result<(), Fault<'a>> {
        for statement in statements {
            if let Statement::FunctionDeclaration(function) = statement {
                if let Some(closure) = self.function_value(function, env)? {
                    if let Some(id) = &function.id {
                        declare(env, id.name.as_str(), closure, BindingKind::Function)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// `var` declarations anywhere in a function body belong to the function scope.
    pub(crate) fn hoist_vars(&mut self, statements: &'a [Statement<'a>], env: &Env<'a>) {
        for statement in statements {
            self.hoist_vars_in(statement, env);
        }
    }

    fn hoist_vars_in(&mut self, statement: &'a Statement<'a>, env: &Env<'a>) {
        match statement {
            Statement::VariableDeclaration(declaration) => hoist_declaration(declaration, env),
            Statement::BlockStatement(block) => self.hoist_vars(&block.body, env),
            Statement::IfStatement(stmt) => {
                self.hoist_vars_in(&stmt.consequent, env);
                if let Some(alternate) = &stmt.alternate {
                    self.hoist_vars_in(alternate, env);
                }
            }
            Statement::ForStatement(stmt) => {
                if let Some(ForStatementInit::VariableDeclaration(declaration)) = &stmt.init {
                    hoist_declaration(declaration, env);
                }
                self.hoist_vars_in(&stmt.body, env);
            }
            Statement::ForInStatement(stmt) => {
                if let ForStatementLeft::VariableDeclaration(declaration) = &stmt.left {
                    hoist_declaration(declaration, env);
                }
                self.hoist_vars_in(&stmt.body, env);
            }
            Statement::ForOfStatement(stmt) => {
                if let ForStatementLeft::VariableDeclaration(declaration) = &stmt.left {
                    hoist_declaration(declaration, env);
                }
                self.hoist_vars_in(&stmt.body, env);
            }
            Statement::WhileStatement(stmt) => self.hoist_vars_in(&stmt.body, env),
            Statement::DoWhileStatement(stmt) => self.hoist_vars_in(&stmt.body, env),
            Statement::LabeledStatement(stmt) => self.hoist_vars_in(&stmt.body, env),
            Statement::SwitchStatement(stmt) => {
                for case in &stmt.cases {
                    self.hoist_vars(&case.consequent, env);
                }
            }
            Statement::TryStatement(stmt) => {
                self.hoist_vars(&stmt.block.body, env);
                if let Some(handler) = &stmt.handler {
                    self.hoist_vars(&handler.body.body, env);
                }
                if let Some(finalizer) = &stmt.finalizer {
                    self.hoist_vars(&finalizer.body, env);
                }
            }
            _ => {}
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // STATEMENTS
    // ═══════════════════════════════════════════════════════════════════════════

    /// `label` is set when the statement is the body of a labeled statement.
    pub(crate) fn exec_statement(
        &mut self,
        statement: &'a Statement<'a>,
        env: &Env<'a>,
        label: Option<&str>,
    ) -> Result<Flow<'a>, Fault<'a>> {
        self.tick()?;
        match statement {
            Statement::ExpressionStatement(stmt) => {
                self.eval_expression(&stmt.expression, env)?;
                Ok(Flow::Normal)
            }
            Statement::VariableDeclaration(declaration) => {
                self.exec_variable_declaration(declaration, env)?;
                Ok(Flow::Normal)
            }
            Statement::FunctionDeclaration(_)
            | Statement::EmptyStatement(_)
            | Statement::DebuggerStatement(_) => Ok(Flow::Normal),
            Statement::BlockStatement(block) => {
                let scope = Scope::block(env);
                self.exec_statements(&block.body, &scope)
            }
            Statement::ReturnStatement(stmt) => {
                let value = match &stmt.argument {
                    Some(argument) => self.eval_expression(argument, env)?,
                    None => Value::Undefined,
                };
                Ok(Flow::Return(value))
            }
            Statement::IfStatement(stmt) => {
                if self.eval_expression(&stmt.test, env)?.truthy() {
                    self.exec_statement(&stmt.consequent, env, None)
                } else if let Some(alternate) = &stmt.alternate {
                    self.exec_statement(alternate, env, None)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Statement::ThrowStatement(stmt) => {
                let value = self.eval_expression(&stmt.argument, env)?;
                Err(Fault::Thrown(value))
            }
            Statement::BreakStatement(stmt) => Ok(Flow::Break(
                stmt.label.as_ref().map(|l| Rc::from(l.name.as_str())),
            )),
            Statement::ContinueStatement(stmt) => Ok(Flow::Continue(
                stmt.label.as_ref().map(|l| Rc::from(l.name.as_str())),
            )),
            Statement::LabeledStatement(stmt) => {
                let name = stmt.label.name.as_str();
                match self.exec_statement(&stmt.body, env, Some(name))? {
                    Flow::Break(Some(target)) if target.as_ref() == name => Ok(Flow::Normal),
                    other => Ok(other),
                }
            }
            Statement::WhileStatement(stmt) => {
                loop {
                    self.tick()?;
                    if !self.eval_expression(&stmt.test, env)?.truthy() {
                        break;
                    }
                    let flow = self.exec_statement(&stmt.body, env, None)?;
                    match loop_control(flow, label) {
                        LoopControl::Next => {}
                        LoopControl::Exit => break,
                        LoopControl::Propagate(flow) => return Ok(flow),
                    }
                }
                Ok(Flow::Normal)
            }
            Statement::DoWhileStatement(stmt) => {
                loop {
                    self.tick()?;
                    let flow = self.exec_statement(&stmt.body, env, None)?;
                    match loop_control(flow, label) {
                        LoopControl::Next => {}
                        LoopControl::Exit => break,
                        LoopControl::Propagate(flow) => return Ok(flow),
                    }
                    if !self.eval_expression(&stmt.test, env)?.truthy() {
                        break;
                    }
                }
                Ok(Flow::Normal)
            }
            Statement::ForStatement(stmt) => self.exec_for(stmt, env, label),
            Statement::ForOfStatement(stmt) => {
                if stmt.r#await {
                    return Err(Fault::unsupported("`for await` loops"));
                }
                let iterable = self.eval_expression(&stmt.right, env)?;
                let items = iterate(self, &iterable)?;
                self.exec_for_each(&stmt.left, items, &stmt.body, env, label)
            }
            Statement::ForInStatement(stmt) => {
                let target = self.eval_expression(&stmt.right, env)?;
                let keys = own_keys(&target).into_iter().map(Value::String).collect();
                self.exec_for_each(&stmt.left, keys, &stmt.body, env, label)
            }
            Statement::SwitchStatement(stmt) => self.exec_switch(stmt, env, label),
            Statement::TryStatement(stmt) => self.exec_try(stmt, env),
            Statement::ClassDeclaration(_) => Err(Fault::unsupported("Classes")),
            Statement::WithStatement(_) => Err(Fault::unsupported("`with` statements")),
            Statement::ImportDeclaration(_)
            | Statement::ExportAllDeclaration(_)
            | Statement::ExportDefaultDeclaration(_)
            | Statement::ExportNamedDeclaration(_) => {
                Err(Fault::unsupported("Import and export declarations"))
            }
            // Type-only declarations carry no runtime behaviour.
            _ => Ok(Flow::Normal),
        }
    }

    fn exec_variable_declaration(
        &mut self,
        declaration: &'a VariableDeclaration<'a>,
        env: &Env<'a>,
    ) -> Result<(), Fault<'a>> {
        let kind = binding_kind(declaration.kind)?;
        for declarator in &declaration.declarations {
            let value = match &declarator.init {
                Some(init) => {
                    let name = match &declarator.id {
                        BindingPattern::BindingIdentifier(id) => Some(id.name.as_str()),
                        _ => None,
                    };
                    self.eval_named(init, name, env)?
                }
                // `var x;` must not reset a hoisted value.
                None if kind == BindingKind::Var => continue,
                None => Value::Undefined,
            };
            self.bind_pattern(&declarator.id, value, kind, env)?;
        }
        Ok(())
    }

    fn exec_for(
        &mut self,
        stmt: &'a ForStatement<'a>,
        env: &Env<'a>,
        label: Option<&str>,
    ) -> Result<Flow<'a>, Fault<'a>> {
        let loop_env = Scope::block(env);
        let mut per_iteration: Vec<&'a str> = Vec::new();
        let mut per_iteration_kind = BindingKind::Let;
        match &stmt.init {
            Some(ForStatementInit::VariableDeclaration(declaration)) => {
                let kind = binding_kind(declaration.kind)?;
                if kind != BindingKind::Var {
                    per_iteration_kind = kind;
                    for declarator in &declaration.declarations {
                        collect_bound_names(&declarator.id, &mut per_iteration);
                    }
                }
                self.exec_variable_declaration(declaration, &loop_env)?;
            }
            Some(init) => {
                if let Some(expression) = init.as_expression() {
                    self.eval_expression(expression, &loop_env)?;
                }
            }
            None => {}
        }

        loop {
            self.tick()?;
            // Each iteration sees its own copy of the loop's lexical bindings.
            let scope = if per_iteration.is_empty() {
                loop_env.clone()
            } else {
                let iteration_env = Scope::block(env);
                for name in &per_iteration {
                    let current = lookup(&loop_env, name).unwrap_or(Value::Undefined);
                    declare(&iteration_env, name, current, per_iteration_kind)?;
                }
                iteration_env
            };

            if let Some(test) = &stmt.test {
                if !self.eval_expression(test, &scope)?.truthy() {
                    break;
                }
            }
            let flow = self.exec_statement(&stmt.body, &scope, None)?;
            if per_iteration_kind == BindingKind::Let {
                for name in &per_iteration {
                    let current = lookup(&scope, name).unwrap_or(Value::Undefined);
                    assign(&loop_env, name, current)?;
                }
            }
            match loop_control(flow, label) {
                LoopControl::Next => {}
                LoopControl::Exit => break,
                LoopControl::Propagate(flow) => return Ok(flow),
            }
            if let Some(update) = &stmt.update {
                self.eval_expression(update, &loop_env)?;
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_for_each(
        &mut self,
        left: &'a ForStatementLeft<'a>,
        items: Vec<Value<'a>>,
        body: &'a Statement<'a>,
        env: &Env<'a>,
        label: Option<&str>,
    ) -> Result<Flow<'a>, Fault<'a>> {
        for item in items {
            self.tick()?;
            let iteration_env = Scope::block(env);
            match left {
                ForStatementLeft::VariableDeclaration(declaration) => {
                    let kind = binding_kind(declaration.kind)?;
                    if let Some(declarator) = declaration.declarations.first() {
                        self.bind_pattern(&declarator.id, item, kind, &iteration_env)?;
                    }
                }
                other => match other.as_assignment_target() {
                    Some(target) => self.assign_target(target, item, &iteration_env)?,
                    None => return Err(Fault::syntax_error("Invalid left-hand side in for loop")),
                },
            }
            let flow = self.exec_statement(body, &iteration_env, None)?;
            match loop_control(flow, label) {
                LoopControl::Next => {}
                LoopControl::Exit => break,
                LoopControl::Propagate(flow) => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_switch(
        &mut self,
        stmt: &'a SwitchStatement<'a>,
        env: &Env<'a>,
        label: Option<&str>,
    ) -> Result<Flow<'a>, Fault<'a>> {
        let discriminant = self.eval_expression(&stmt.discriminant, env)?;
        let scope = Scope::block(env);

        let mut start = None;
        for (index, case) in stmt.cases.iter().enumerate() {
            if let Some(test) = &case.test {
                let candidate = self.eval_expression(test, &scope)?;
                if strict_equals(&discriminant, &candidate) {
                    start = Some(index);
                    break;
                }
            }
        }
        let start = start.or_else(|| stmt.cases.iter().position(|case| case.test.is_none()));
        let Some(start) = start else {
            return Ok(Flow::Normal);
        };

        for case in stmt.cases.iter().skip(start) {
            self.hoist_functions(&case.consequent, &scope)?;
            for statement in &case.consequent {
                match self.exec_statement(statement, &scope, None)? {
                    Flow::Normal => {}
                    Flow::Break(None) => return Ok(Flow::Normal),
                    Flow::Break(Some(target)) if Some(target.as_ref()) == label => {
                        return Ok(Flow::Normal)
                    }
                    other => return Ok(other),
                }
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_try(
        &mut self,
        stmt: &'a TryStatement<'a>,
        env: &Env<'a>,
    ) -> Result<Flow<'a>, Fault<'a>> {
        let block_env = Scope::block(env);
        let mut result = self.exec_statements(&stmt.block.body, &block_env);

        if let Some(handler) = &stmt.handler {
            result = match result {
                Err(fault) => {
                    let catch_env = Scope::block(env);
                    if let Some(param) = &handler.param {
                        self.bind_pattern(
                            &param.pattern,
                            fault.into_value(),
                            BindingKind::Let,
                            &catch_env,
                        )?;
                    }
                    self.exec_statements(&handler.body.body, &catch_env)
                }
                completed => completed,
            };
        }

        if let Some(finalizer) = &stmt.finalizer {
            let finally_env = Scope::block(env);
            match self.exec_statements(&finalizer.body, &finally_env)? {
                Flow::Normal => {}
                overriding => return Ok(overriding),
            }
        }
        result
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // FUNCTIONS & PATTERNS
    // ═══════════════════════════════════════════════════════════════════════════

    /// The closure for a function declaration or expression; `None` for
    /// body-less overload signatures.
    pub(crate) fn function_value(
        &mut self,
        function: &'a Function<'a>,
        env: &Env<'a>,
    ) -> Result<Option<Value<'a>>, Fault<'a>> {
        if function.generator {
            return Err(Fault::unsupported("Generator functions"));
        }
        if function.r#async {
            return Err(Fault::unsupported("Async functions"));
        }
        let Some(body) = function.body.as_deref() else {
            return Ok(None);
        };
        let name = function.id.as_ref().map(|id| Rc::from(id.name.as_str()));
        Ok(Some(self.make_closure(
            name,
            &function.params,
            body,
            false,
            false,
            env,
        )))
    }

    pub(crate) fn bind_parameters(
        &mut self,
        params: &'a FormalParameters<'a>,
        args: Vec<Value<'a>>,
        env: &Env<'a>,
    ) -> Result<(), Fault<'a>> {
        let mut args = args.into_iter();
        for param in &params.items {
            let mut value = args.next().unwrap_or(Value::Undefined);
            if let (Value::Undefined, Some(initializer)) = (&value, &param.initializer) {
                value = self.eval_expression(initializer, env)?;
            }
            self.bind_pattern(&param.pattern, value, BindingKind::Param, env)?;
        }
        if let Some(rest) = &params.rest {
            let remaining = Value::array(args.collect());
            self.bind_pattern(&rest.rest.argument, remaining, BindingKind::Param, env)?;
        }
        Ok(())
    }

    /// Declares every name in `pattern`, destructuring `value` as needed.
    pub(crate) fn bind_pattern(
        &mut self,
        pattern: &'a BindingPattern<'a>,
        value: Value<'a>,
        kind: BindingKind,
        env: &Env<'a>,
    ) -> Result<(), Fault<'a>> {
        match pattern {
            BindingPattern::BindingIdentifier(id) => declare(env, id.name.as_str(), value, kind),
            BindingPattern::AssignmentPattern(assignment) => {
                let value = match value {
                    Value::Undefined => {
                        let name = match &assignment.left {
                            BindingPattern::BindingIdentifier(id) => Some(id.name.as_str()),
                            _ => None,
                        };
                        self.eval_named(&assignment.right, name, env)?
                    }
                    other => other,
                };
                self.bind_pattern(&assignment.left, value, kind, env)
            }
            BindingPattern::ObjectPattern(object) => {
                if value.is_nullish() {
                    let property = object
                        .properties
                        .first()
                        .and_then(|p| p.key.static_name())
                        .map(|name| format!("property '{}' of ", name))
                        .unwrap_or_default();
                    return Err(Fault::type_error(format!(
                        "Cannot destructure {}'{}' as it is {}.",
                        property,
                        value.to_js_string(),
                        value.to_js_string()
                    )));
                }
                let mut used = Vec::with_capacity(object.properties.len());
                for property in &object.properties {
                    let key = self.property_key(&property.key, property.computed, env)?;
                    let item = get_property(&value, &key)?;
                    used.push(key);
                    self.bind_pattern(&property.value, item, kind, env)?;
                }
                if let Some(rest) = &object.rest {
                    let mut remaining = Object::default();
                    for key in own_keys(&value) {
                        if !used.contains(&key) {
                            remaining.set(&key, get_property(&value, &key)?);
                        }
                    }
                    self.bind_pattern(&rest.argument, Value::object(remaining), kind, env)?;
                }
                Ok(())
            }
            BindingPattern::ArrayPattern(array) => {
                let items = iterate(self, &value)?;
                for (index, element) in array.elements.iter().enumerate() {
                    if let Some(element) = element {
                        let item = items.get(index).cloned().unwrap_or(Value::Undefined);
                        self.bind_pattern(element, item, kind, env)?;
                    }
                }
                if let Some(rest) = &array.rest {
                    let remaining = items.iter().skip(array.elements.len()).cloned().collect();
                    self.bind_pattern(&rest.argument, Value::array(remaining), kind, env)?;
                }
                Ok(())
            }
        }
    }

    /// Evaluates `expression`, naming anonymous functions after their binding.
    pub(crate) fn eval_named(
        &mut self,
        expression: &'a Expression<'a>,
        name: Option<&str>,
        env: &Env<'a>,
    ) -> Result<Value<'a>, Fault<'a>> {
        let Some(name) = name else {
            return self.eval_expression(expression, env);
        };
        match expression {
            Expression::ArrowFunctionExpression(arrow) => {
                if arrow.r#async {
                    return Err(Fault::unsupported("Async functions"));
                }
                Ok(self.make_closure(
                    Some(Rc::from(name)),
                    &arrow.params,
                    &arrow.body,
                    arrow.expression,
                    true,
                    env,
                ))
            }
            Expression::FunctionExpression(function) if function.id.is_none() => {
                if function.generator {
                    return Err(Fault::unsupported("Generator functions"));
                }
                if function.r#async {
                    return Err(Fault::unsupported("Async functions"));
                }
                match function.body.as_deref() {
                    Some(body) => Ok(self.make_closure(
                        Some(Rc::from(name)),
                        &function.params,
                        body,
                        false,
                        false,
                        env,
                    )),
                    None => Ok(Value::Undefined),
                }
            }
            other => self.eval_expression(other, env),
        }
    }
}

fn hoist_declaration<'a>(declaration: &'a VariableDeclaration<'a>, env: &Env<'a>) {
    if declaration.kind != VariableDeclarationKind::Var {
        return;
    }
    let mut names = Vec::new();
    for declarator in &declaration.declarations {
        collect_bound_names(&declarator.id, &mut names);
    }
    for name in names {
        hoist_var(env, name);
    }
}

fn collect_bound_names<'a>(pattern: &'a BindingPattern<'a>, names: &mut Vec<&'a str>) {
    match pattern {
        BindingPattern::BindingIdentifier(id) => names.push(id.name.as_str()),
        BindingPattern::AssignmentPattern(assignment) => {
            collect_bound_names(&assignment.left, names)
        }
        BindingPattern::ObjectPattern(object) => {
            for property in &object.properties {
                collect_bound_names(&property.value, names);
            }
            if let Some(rest) = &object.rest {
                collect_bound_names(&rest.argument, names);
            }
        }
        BindingPattern::ArrayPattern(array) => {
            for element in array.elements.iter().flatten() {
                collect_bound_names(element, names);
            }
            if let Some(rest) = &array.rest {
                collect_bound_names(&rest.argument, names);
            }
        }
    }
}
