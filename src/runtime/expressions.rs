//! Expression evaluation.

use std::rc::Rc;

use oxc_ast::ast::{
    Argument, ArrayExpressionElement, AssignmentExpression, AssignmentTarget,
    AssignmentTargetMaybeDefault, AssignmentTargetProperty, CallExpression, ChainElement,
    ComputedMemberExpression, Expression, NewExpression, ObjectExpression, ObjectPropertyKind,
    PropertyKey, PropertyKind, SimpleAssignmentTarget, StaticMemberExpression, TemplateLiteral,
    UnaryExpression, UpdateExpression,
};
use oxc_span::GetSpan;
use oxc_syntax::operator::{
    AssignmentOperator, BinaryOperator, LogicalOperator, UnaryOperator, UpdateOperator,
};

use super::builtins::Intrinsic;
use super::fault::{ErrorKind, Fault};
use super::property::{delete_property, get_property, iterate, own_keys, set_property};
use super::scope::{assign, declare, lookup, this_value, BindingKind, Env, Scope};
use super::value::{check_string_length, loose_equals, strict_equals, Callable, Object, Value};
use super::Interpreter;

/// Where an assignment writes.
enum Reference<'a> {
    Binding(&'a str),
    Property(Value<'a>, Rc<str>),
}

impl<'a> Interpreter<'a> {
    pub(crate) fn eval_expression(
        &mut self,
        expression: &'a Expression<'a>,
        env: &Env<'a>,
    ) -> Result<Value<'a>, Fault<'a>> {
        match expression {
            Expression::BooleanLiteral(lit) => Ok(Value::Bool(lit.value)),
            Expression::NullLiteral(_) => Ok(Value::Null),
            Expression::NumericLiteral(lit) => Ok(Value::Number(lit.value)),
            Expression::StringLiteral(lit) => Ok(Value::string(lit.value.as_str())),
            Expression::TemplateLiteral(template) => self.eval_template(template, env),
            Expression::Identifier(ident) => {
                let name = ident.name.as_str();
                match lookup(env, name) {
                    Some(value) => Ok(value),
                    None if name == "undefined" => Ok(Value::Undefined),
                    None => Err(Fault::reference_error(format!("{} is not defined", name))),
                }
            }
            Expression::ThisExpression(_) => Ok(this_value(env)),
            Expression::ArrayExpression(array) => {
                let mut items = Vec::with_capacity(array.elements.len());
                for element in &array.elements {
                    match element {
                        ArrayExpressionElement::SpreadElement(spread) => {
                            let value = self.eval_expression(&spread.argument, env)?;
                            items.extend(iterate(self, &value)?);
                        }
                        ArrayExpressionElement::Elision(_) => items.push(Value::Undefined),
                        other => match other.as_expression() {
                            Some(expression) => items.push(self.eval_expression(expression, env)?),
                            None => items.push(Value::Undefined),
                        },
                    }
                }
                Ok(Value::array(items))
            }
            Expression::ObjectExpression(object) => self.eval_object(object, env),
            Expression::ArrowFunctionExpression(arrow) => {
                if arrow.r#async {
                    return Err(Fault::unsupported("Async functions"));
                }
                Ok(self.make_closure(
                    None,
                    &arrow.params,
                    &arrow.body,
                    arrow.expression,
                    true,
                    env,
                ))
            }
            Expression::FunctionExpression(function) => match &function.id {
                // A named function expression can refer to itself by name.
                Some(id) => {
                    let own_scope = Scope::block(env);
                    let closure = self
                        .function_value(function, &own_scope)?
                        .unwrap_or(Value::Undefined);
                    declare(&own_scope, id.name.as_str(), closure.clone(), BindingKind::Function)?;
                    Ok(closure)
                }
                None => Ok(self
                    .function_value(function, env)?
                    .unwrap_or(Value::Undefined)),
            },
            Expression::AssignmentExpression(assignment) => self.eval_assignment(assignment, env),
            Expression::BinaryExpression(binary) => {
                let left = self.eval_expression(&binary.left, env)?;
                let right = self.eval_expression(&binary.right, env)?;
                binary_op(binary.operator, &left, &right)
            }
            Expression::LogicalExpression(logical) => {
                let left = self.eval_expression(&logical.left, env)?;
                let short_circuit = match logical.operator {
                    LogicalOperator::Or => left.truthy(),
                    LogicalOperator::And => !left.truthy(),
                    LogicalOperator::Coalesce => !left.is_nullish(),
                };
                if short_circuit {
                    Ok(left)
                } else {
                    self.eval_expression(&logical.right, env)
                }
            }
            Expression::ConditionalExpression(conditional) => {
                if self.eval_expression(&conditional.test, env)?.truthy() {
                    self.eval_expression(&conditional.consequent, env)
                } else {
                    self.eval_expression(&conditional.alternate, env)
                }
            }
            Expression::UnaryExpression(unary) => self.eval_unary(unary, env),
            Expression::UpdateExpression(update) => self.eval_update(update, env),
            Expression::SequenceExpression(sequence) => {
                let mut last = Value::Undefined;
                for expression in &sequence.expressions {
                    last = self.eval_expression(expression, env)?;
                }
                Ok(last)
            }
            Expression::ParenthesizedExpression(inner) => {
                self.eval_expression(&inner.expression, env)
            }
            Expression::StaticMemberExpression(member) => Ok(self
                .eval_static_member(member, env)?
                .unwrap_or(Value::Undefined)),
            Expression::ComputedMemberExpression(member) => Ok(self
                .eval_computed_member(member, env)?
                .unwrap_or(Value::Undefined)),
            Expression::CallExpression(call) => {
                Ok(self.eval_call(call, env)?.unwrap_or(Value::Undefined))
            }
            Expression::ChainExpression(chain) => {
                let value = match &chain.expression {
                    ChainElement::CallExpression(call) => self.eval_call(call, env)?,
                    ChainElement::StaticMemberExpression(member) => {
                        self.eval_static_member(member, env)?
                    }
                    ChainElement::ComputedMemberExpression(member) => {
                        self.eval_computed_member(member, env)?
                    }
                    ChainElement::TSNonNullExpression(inner) => {
                        self.eval_chain_part(&inner.expression, env)?
                    }
                    ChainElement::PrivateFieldExpression(_) => {
                        return Err(Fault::unsupported("Private fields"))
                    }
                };
                Ok(value.unwrap_or(Value::Undefined))
            }
            Expression::NewExpression(new) => self.eval_new(new, env),
            Expression::TSAsExpression(inner) => self.eval_expression(&inner.expression, env),
            Expression::TSSatisfiesExpression(inner) => {
                self.eval_expression(&inner.expression, env)
            }
            Expression::TSNonNullExpression(inner) => self.eval_expression(&inner.expression, env),
            Expression::TSTypeAssertion(inner) => self.eval_expression(&inner.expression, env),
            Expression::TSInstantiationExpression(inner) => {
                self.eval_expression(&inner.expression, env)
            }
            Expression::RegExpLiteral(_) => Err(Fault::unsupported("Regular expression literals")),
            Expression::BigIntLiteral(_) => Err(Fault::unsupported("BigInt literals")),
            Expression::TaggedTemplateExpression(_) => Err(Fault::unsupported("Tagged templates")),
            Expression::ClassExpression(_) | Expression::Super(_) => {
                Err(Fault::unsupported("Classes"))
            }
            Expression::AwaitExpression(_) => Err(Fault::unsupported("Async functions")),
            Expression::YieldExpression(_) => Err(Fault::unsupported("Generator functions")),
            Expression::ImportExpression(_) | Expression::MetaProperty(_) => {
                Err(Fault::unsupported("Module expressions"))
            }
            Expression::JSXElement(_) | Expression::JSXFragment(_) => {
                Err(Fault::unsupported("Untranspiled JSX elements"))
            }
            _ => Err(Fault::unsupported("Private fields and engine intrinsics")),
        }
    }

    fn eval_template(
        &mut self,
        template: &'a TemplateLiteral<'a>,
        env: &Env<'a>,
    ) -> Result<Value<'a>, Fault<'a>> {
        let mut out = String::new();
        for (index, quasi) in template.quasis.iter().enumerate() {
            let text = quasi.value.cooked.as_ref().unwrap_or(&quasi.value.raw);
            out.push_str(text.as_str());
            if let Some(expression) = template.expressions.get(index) {
                out.push_str(&self.eval_expression(expression, env)?.try_to_js_string()?);
                check_string_length(out.len())?;
            }
        }
        Ok(Value::string(out))
    }

    fn eval_object(
        &mut self,
        object: &'a ObjectExpression<'a>,
        env: &Env<'a>,
    ) -> Result<Value<'a>, Fault<'a>> {
        let mut result = Object::default();
        for property in &object.properties {
            match property {
                ObjectPropertyKind::ObjectProperty(prop) => {
                    if !matches!(prop.kind, PropertyKind::Init) {
                        return Err(Fault::unsupported("Getters and setters"));
                    }
                    let key = self.property_key(&prop.key, prop.computed, env)?;
                    let value = self.eval_named(&prop.value, Some(key.as_ref()), env)?;
                    result.set(key, value);
                }
                ObjectPropertyKind::SpreadProperty(spread) => {
                    let source = self.eval_expression(&spread.argument, env)?;
                    for key in own_keys(&source) {
                        let value = get_property(&source, &key)?;
                        result.set(key, value);
                    }
                }
            }
        }
        Ok(Value::object(result))
    }

    pub(crate) fn property_key(
        &mut self,
        key: &'a PropertyKey<'a>,
        computed: bool,
        env: &Env<'a>,
    ) -> Result<Rc<str>, Fault<'a>> {
        if !computed {
            if let Some(name) = key.static_name() {
                return Ok(Rc::from(name.as_ref()));
            }
        }
        match key.as_expression() {
            Some(expression) => Ok(self.eval_expression(expression, env)?.to_property_key()),
            None => Err(Fault::unsupported("Private fields")),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // MEMBERS & CALLS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Evaluates one link of a possibly optional chain; `None` means the chain
    /// short-circuited on a nullish value.
    fn eval_chain_part(
        &mut self,
        expression: &'a Expression<'a>,
        env: &Env<'a>,
    ) -> Result<Option<Value<'a>>, Fault<'a>> {
        match expression {
            Expression::StaticMemberExpression(member) => self.eval_static_member(member, env),
            Expression::ComputedMemberExpression(member) => {
                self.eval_computed_member(member, env)
            }
            Expression::CallExpression(call) => self.eval_call(call, env),
            Expression::TSNonNullExpression(inner) => self.eval_chain_part(&inner.expression, env),
            other => self.eval_expression(other, env).map(Some),
        }
    }

    fn eval_static_member(
        &mut self,
        member: &'a StaticMemberExpression<'a>,
        env: &Env<'a>,
    ) -> Result<Option<Value<'a>>, Fault<'a>> {
        let Some(object) = self.eval_chain_part(&member.object, env)? else {
            return Ok(None);
        };
        if member.optional && object.is_nullish() {
            return Ok(None);
        }
        get_property(&object, member.property.name.as_str()).map(Some)
    }

    fn eval_computed_member(
        &mut self,
        member: &'a ComputedMemberExpression<'a>,
        env: &Env<'a>,
    ) -> Result<Option<Value<'a>>, Fault<'a>> {
        let Some(object) = self.eval_chain_part(&member.object, env)? else {
            return Ok(None);
        };
        if member.optional && object.is_nullish() {
            return Ok(None);
        }
        let key = self.eval_expression(&member.expression, env)?.to_property_key();
        get_property(&object, &key).map(Some)
    }

    fn eval_call(
        &mut self,
        call: &'a CallExpression<'a>,
        env: &Env<'a>,
    ) -> Result<Option<Value<'a>>, Fault<'a>> {
        let (callee, this) = match &call.callee {
            Expression::StaticMemberExpression(member) => {
                let Some(object) = self.eval_chain_part(&member.object, env)? else {
                    return Ok(None);
                };
                if member.optional && object.is_nullish() {
                    return Ok(None);
                }
                let method = get_property(&object, member.property.name.as_str())?;
                (method, object)
            }
            Expression::ComputedMemberExpression(member) => {
                let Some(object) = self.eval_chain_part(&member.object, env)? else {
                    return Ok(None);
                };
                if member.optional && object.is_nullish() {
                    return Ok(None);
                }
                let key = self.eval_expression(&member.expression, env)?.to_property_key();
                let method = get_property(&object, &key)?;
                (method, object)
            }
            other => match self.eval_chain_part(other, env)? {
                Some(callee) => (callee, Value::Undefined),
                None => return Ok(None),
            },
        };
        if call.optional && callee.is_nullish() {
            return Ok(None);
        }

        let args = self.eval_arguments(&call.arguments, env)?;
        if !callee.is_callable() {
            let span = call.callee.span();
            return Err(Fault::type_error(format!(
                "{} is not a function",
                self.source_slice(span.start, span.end)
            )));
        }
        self.call(&callee, this, args).map(Some)
    }

    fn eval_arguments(
        &mut self,
        arguments: &'a [Argument<'a>],
        env: &Env<'a>,
    ) -> Result<Vec<Value<'a>>, Fault<'a>> {
        let mut args = Vec::with_capacity(arguments.len());
        for argument in arguments {
            match argument {
                Argument::SpreadElement(spread) => {
                    let value = self.eval_expression(&spread.argument, env)?;
                    args.extend(iterate(self, &value)?);
                }
                other => {
                    if let Some(expression) = other.as_expression() {
                        args.push(self.eval_expression(expression, env)?);
                    }
                }
            }
        }
        Ok(args)
    }

    fn eval_new(
        &mut self,
        new: &'a NewExpression<'a>,
        env: &Env<'a>,
    ) -> Result<Value<'a>, Fault<'a>> {
        let callee = self.eval_expression(&new.callee, env)?;
        let args = self.eval_arguments(&new.arguments, env)?;
        let span = new.callee.span();
        let callee_text = self.source_slice(span.start, span.end);
        let not_constructor =
            || Fault::type_error(format!("{} is not a constructor", callee_text));
        let Value::Function(callable) = &callee else {
            return Err(not_constructor());
        };
        match callable.as_ref() {
            Callable::Intrinsic(intrinsic) if intrinsic.is_constructor() => {
                self.call(&callee, Value::Undefined, args)
            }
            Callable::Closure(closure) if !closure.arrow => {
                let instance = Value::object(Object::default());
                let result = self.call(&callee, instance.clone(), args)?;
                match result {
                    Value::Object(_) | Value::Array(_) | Value::Function(_) => Ok(result),
                    _ => Ok(instance),
                }
            }
            _ => Err(not_constructor()),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // OPERATORS
    // ═══════════════════════════════════════════════════════════════════════════

    fn eval_unary(
        &mut self,
        unary: &'a UnaryExpression<'a>,
        env: &Env<'a>,
    ) -> Result<Value<'a>, Fault<'a>> {
        match unary.operator {
            UnaryOperator::Typeof => {
                if let Expression::Identifier(ident) = &unary.argument {
                    return Ok(match lookup(env, ident.name.as_str()) {
                        Some(value) => Value::string(value.type_of()),
                        None => Value::string("undefined"),
                    });
                }
                let value = self.eval_expression(&unary.argument, env)?;
                Ok(Value::string(value.type_of()))
            }
            UnaryOperator::Delete => match &unary.argument {
                Expression::StaticMemberExpression(member) => {
                    let object = self.eval_expression(&member.object, env)?;
                    delete_property(&object, member.property.name.as_str()).map(Value::Bool)
                }
                Expression::ComputedMemberExpression(member) => {
                    let object = self.eval_expression(&member.object, env)?;
                    let key = self.eval_expression(&member.expression, env)?.to_property_key();
                    delete_property(&object, &key).map(Value::Bool)
                }
                other => {
                    self.eval_expression(other, env)?;
                    Ok(Value::Bool(true))
                }
            },
            operator => {
                let value = self.eval_expression(&unary.argument, env)?;
                Ok(match operator {
                    UnaryOperator::UnaryPlus => Value::Number(value.to_number()),
                    UnaryOperator::UnaryNegation => Value::Number(-value.to_number()),
                    UnaryOperator::LogicalNot => Value::Bool(!value.truthy()),
                    UnaryOperator::BitwiseNot => Value::Number(f64::from(!to_int32(&value))),
                    _ => Value::Undefined,
                })
            }
        }
    }

    fn eval_update(
        &mut self,
        update: &'a UpdateExpression<'a>,
        env: &Env<'a>,
    ) -> Result<Value<'a>, Fault<'a>> {
        let reference = self.resolve_reference(&update.argument, env)?;
        let old = self.read_reference(&reference, env)?.to_number();
        let new = match update.operator {
            UpdateOperator::Increment => old + 1.0,
            UpdateOperator::Decrement => old - 1.0,
        };
        self.write_reference(&reference, Value::Number(new), env)?;
        Ok(Value::Number(if update.prefix { new } else { old }))
    }

    fn eval_assignment(
        &mut self,
        assignment: &'a AssignmentExpression<'a>,
        env: &Env<'a>,
    ) -> Result<Value<'a>, Fault<'a>> {
        if assignment.operator == AssignmentOperator::Assign {
            let name = match &assignment.left {
                AssignmentTarget::AssignmentTargetIdentifier(ident) => Some(ident.name.as_str()),
                _ => None,
            };
            let value = self.eval_named(&assignment.right, name, env)?;
            self.assign_target(&assignment.left, value.clone(), env)?;
            return Ok(value);
        }

        let Some(target) = assignment.left.as_simple_assignment_target() else {
            return Err(Fault::syntax_error("Invalid left-hand side in assignment"));
        };
        let reference = self.resolve_reference(target, env)?;
        let current = self.read_reference(&reference, env)?;

        let value = if let Some(logical) = assignment.operator.to_logical_operator() {
            let keep = match logical {
                LogicalOperator::Or => current.truthy(),
                LogicalOperator::And => !current.truthy(),
                LogicalOperator::Coalesce => !current.is_nullish(),
            };
            if keep {
                return Ok(current);
            }
            self.eval_expression(&assignment.right, env)?
        } else {
            let right = self.eval_expression(&assignment.right, env)?;
            match assignment.operator.to_binary_operator() {
                Some(operator) => binary_op(operator, &current, &right)?,
                None => right,
            }
        };
        self.write_reference(&reference, value.clone(), env)?;
        Ok(value)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // ASSIGNMENT TARGETS
    // ═══════════════════════════════════════════════════════════════════════════

    fn resolve_reference(
        &mut self,
        target: &'a SimpleAssignmentTarget<'a>,
        env: &Env<'a>,
    ) -> Result<Reference<'a>, Fault<'a>> {
        match target {
            SimpleAssignmentTarget::AssignmentTargetIdentifier(ident) => {
                Ok(Reference::Binding(ident.name.as_str()))
            }
            SimpleAssignmentTarget::StaticMemberExpression(member) => {
                let object = self.eval_expression(&member.object, env)?;
                Ok(Reference::Property(
                    object,
                    Rc::from(member.property.name.as_str()),
                ))
            }
            SimpleAssignmentTarget::ComputedMemberExpression(member) => {
                let object = self.eval_expression(&member.object, env)?;
                let key = self.eval_expression(&member.expression, env)?.to_property_key();
                Ok(Reference::Property(object, key))
            }
            _ => Err(Fault::syntax_error("Invalid left-hand side in assignment")),
        }
    }

    fn read_reference(
        &mut self,
        reference: &Reference<'a>,
        env: &Env<'a>,
    ) -> Result<Value<'a>, Fault<'a>> {
        match reference {
            Reference::Binding(name) => lookup(env, name)
                .ok_or_else(|| Fault::reference_error(format!("{} is not defined", name))),
            Reference::Property(object, key) => get_property(object, key),
        }
    }

    fn write_reference(
        &mut self,
        reference: &Reference<'a>,
        value: Value<'a>,
        env: &Env<'a>,
    ) -> Result<(), Fault<'a>> {
        match reference {
            Reference::Binding(name) => assign(env, name, value),
            Reference::Property(object, key) => set_property(object, key, value),
        }
    }

    /// Plain and destructuring assignment to an existing target.
    pub(crate) fn assign_target(
        &mut self,
        target: &'a AssignmentTarget<'a>,
        value: Value<'a>,
        env: &Env<'a>,
    ) -> Result<(), Fault<'a>> {
        match target {
            AssignmentTarget::ArrayAssignmentTarget(array) => {
                let items = iterate(self, &value)?;
                for (index, element) in array.elements.iter().enumerate() {
                    if let Some(element) = element {
                        let item = items.get(index).cloned().unwrap_or(Value::Undefined);
                        self.assign_maybe_default(element, item, env)?;
                    }
                }
                if let Some(rest) = &array.rest {
                    let remaining = items.iter().skip(array.elements.len()).cloned().collect();
                    self.assign_target(&rest.target, Value::array(remaining), env)?;
                }
                Ok(())
            }
            AssignmentTarget::ObjectAssignmentTarget(object) => {
                if value.is_nullish() {
                    return Err(Fault::type_error(format!(
                        "Cannot destructure '{}' as it is {}.",
                        value.to_js_string(),
                        value.to_js_string()
                    )));
                }
                let mut used: Vec<Rc<str>> = Vec::new();
                for property in &object.properties {
                    match property {
                        AssignmentTargetProperty::AssignmentTargetPropertyIdentifier(prop) => {
                            let name = prop.binding.name.as_str();
                            let mut item = get_property(&value, name)?;
                            if let (Value::Undefined, Some(init)) = (&item, &prop.init) {
                                item = self.eval_named(init, Some(name), env)?;
                            }
                            used.push(Rc::from(name));
                            assign(env, name, item)?;
                        }
                        AssignmentTargetProperty::AssignmentTargetPropertyProperty(prop) => {
                            let key = self.property_key(&prop.name, prop.computed, env)?;
                            let item = get_property(&value, &key)?;
                            used.push(key);
                            self.assign_maybe_default(&prop.binding, item, env)?;
                        }
                    }
                }
                if let Some(rest) = &object.rest {
                    let mut remaining = Object::default();
                    for key in own_keys(&value) {
                        if !used.contains(&key) {
                            remaining.set(&key, get_property(&value, &key)?);
                        }
                    }
                    self.assign_target(&rest.target, Value::object(remaining), env)?;
                }
                Ok(())
            }
            other => match other.as_simple_assignment_target() {
                Some(simple) => {
                    let reference = self.resolve_reference(simple, env)?;
                    self.write_reference(&reference, value, env)
                }
                None => Err(Fault::syntax_error("Invalid left-hand side in assignment")),
            },
        }
    }

    fn assign_maybe_default(
        &mut self,
        target: &'a AssignmentTargetMaybeDefault<'a>,
        value: Value<'a>,
        env: &Env<'a>,
    ) -> Result<(), Fault<'a>> {
        match target {
            AssignmentTargetMaybeDefault::AssignmentTargetWithDefault(with_default) => {
                let value = match value {
                    Value::Undefined => self.eval_expression(&with_default.init, env)?,
                    other => other,
                };
                self.assign_target(&with_default.binding, value, env)
            }
            other => match other.as_assignment_target() {
                Some(target) => self.assign_target(target, value, env),
                None => Err(Fault::syntax_error("Invalid destructuring assignment target")),
            },
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BINARY OPERATORS
// ═══════════════════════════════════════════════════════════════════════════════

fn to_int32(value: &Value<'_>) -> i32 {
    let n = value.to_number();
    if !n.is_finite() {
        return 0;
    }
    (n.trunc() as i64) as i32
}

/// Objects and arrays take part in `+` through their string form.
fn is_string_like(value: &Value<'_>) -> bool {
    matches!(
        value,
        Value::String(_) | Value::Array(_) | Value::Object(_) | Value::Element(_) | Value::Function(_)
    )
}

pub(crate) fn binary_op<'a>(
    operator: BinaryOperator,
    left: &Value<'a>,
    right: &Value<'a>,
) -> Result<Value<'a>, Fault<'a>> {
    let value = match operator {
        BinaryOperator::Addition => {
            if is_string_like(left) || is_string_like(right) {
                let left = left.try_to_js_string()?;
                let right = right.try_to_js_string()?;
                check_string_length(left.len() + right.len())?;
                Value::string(left + &right)
            } else {
                Value::Number(left.to_number() + right.to_number())
            }
        }
        BinaryOperator::Subtraction => Value::Number(left.to_number() - right.to_number()),
        BinaryOperator::Multiplication => Value::Number(left.to_number() * right.to_number()),
        BinaryOperator::Division => Value::Number(left.to_number() / right.to_number()),
        BinaryOperator::Remainder => Value::Number(left.to_number() % right.to_number()),
        BinaryOperator::Exponential => Value::Number(left.to_number().powf(right.to_number())),
        BinaryOperator::Equality => Value::Bool(loose_equals(left, right)),
        BinaryOperator::Inequality => Value::Bool(!loose_equals(left, right)),
        BinaryOperator::StrictEquality => Value::Bool(strict_equals(left, right)),
        BinaryOperator::StrictInequality => Value::Bool(!strict_equals(left, right)),
        BinaryOperator::LessThan => compare(left, right, |o| o.is_lt()),
        BinaryOperator::LessEqualThan => compare(left, right, |o| o.is_le()),
        BinaryOperator::GreaterThan => compare(left, right, |o| o.is_gt()),
        BinaryOperator::GreaterEqualThan => compare(left, right, |o| o.is_ge()),
        BinaryOperator::ShiftLeft => {
            Value::Number(f64::from(to_int32(left).wrapping_shl(shift_count(right))))
        }
        BinaryOperator::ShiftRight => {
            Value::Number(f64::from(to_int32(left).wrapping_shr(shift_count(right))))
        }
        BinaryOperator::ShiftRightZeroFill => Value::Number(f64::from(
            (to_int32(left) as u32).wrapping_shr(shift_count(right)),
        )),
        BinaryOperator::BitwiseOR => Value::Number(f64::from(to_int32(left) | to_int32(right))),
        BinaryOperator::BitwiseXOR => Value::Number(f64::from(to_int32(left) ^ to_int32(right))),
        BinaryOperator::BitwiseAnd => Value::Number(f64::from(to_int32(left) & to_int32(right))),
        BinaryOperator::In => {
            if !matches!(right, Value::Object(_) | Value::Array(_) | Value::Element(_)) {
                return Err(Fault::type_error(format!(
                    "Cannot use 'in' operator to search for '{}' in {}",
                    left.to_js_string(),
                    right.to_js_string()
                )));
            }
            let key = left.to_property_key();
            Value::Bool(match right {
                Value::Object(object) => object.borrow().contains(&key),
                Value::Array(items) => {
                    key.as_ref() == "length"
                        || key
                            .parse::<usize>()
                            .map(|index| index < items.borrow().len())
                            .unwrap_or(false)
                }
                _ => matches!(key.as_ref(), "type" | "props" | "key"),
            })
        }
        BinaryOperator::Instanceof => Value::Bool(instance_of(left, right)?),
    };
    Ok(value)
}

fn shift_count(value: &Value<'_>) -> u32 {
    (to_int32(value) as u32) & 31
}

fn compare<'a>(
    left: &Value<'a>,
    right: &Value<'a>,
    accept: fn(std::cmp::Ordering) -> bool,
) -> Value<'a> {
    if let (Value::String(a), Value::String(b)) = (left, right) {
        return Value::Bool(accept(a.cmp(b)));
    }
    match left.to_number().partial_cmp(&right.to_number()) {
        Some(ordering) => Value::Bool(accept(ordering)),
        None => Value::Bool(false),
    }
}

fn instance_of<'a>(left: &Value<'a>, right: &Value<'a>) -> Result<bool, Fault<'a>> {
    let Value::Function(callable) = right else {
        return Err(Fault::type_error(
            "Right-hand side of 'instanceof' is not callable",
        ));
    };
    let Value::Object(object) = left else {
        return Ok(false);
    };
    let object = object.borrow();
    match callable.as_ref() {
        Callable::Intrinsic(Intrinsic::ErrorConstructor(kind)) => {
            if !object.is_error {
                return Ok(false);
            }
            let name = object.get("name").map(|n| n.to_js_string()).unwrap_or_default();
            Ok(*kind == ErrorKind::Error || name == kind.name())
        }
        _ => Ok(false),
    }
}
