//! Property access
//!
//! Reads and writes on every value kind, with the host language's messages for
//! `undefined`/`null` receivers.

use std::rc::Rc;

use super::builtins::has_method;
use super::fault::Fault;
use super::value::{array_length, Callable, Value, MAX_DENSE_LENGTH};
use super::Interpreter;

pub fn get_property<'a>(target: &Value<'a>, key: &str) -> Result<Value<'a>, Fault<'a>> {
    match target {
        Value::Undefined | Value::Null => Err(Fault::type_error(format!(
            "Cannot read properties of {} (reading '{}')",
            target.to_js_string(),
            key
        ))),
        Value::Object(object) => Ok(object.borrow().get(key).cloned().unwrap_or(Value::Undefined)),
        Value::Array(items) => {
            if key == "length" {
                return Ok(Value::Number(items.borrow().len() as f64));
            }
            if let Some(index) = array_index(key) {
                return Ok(items.borrow().get(index).cloned().unwrap_or(Value::Undefined));
            }
            Ok(method_or_undefined(target, key))
        }
        Value::String(s) => {
            if key == "length" {
                return Ok(Value::Number(s.chars().count() as f64));
            }
            if let Some(index) = array_index(key) {
                return Ok(s
                    .chars()
                    .nth(index)
                    .map(|c| Value::string(c.to_string()))
                    .unwrap_or(Value::Undefined));
            }
            Ok(method_or_undefined(target, key))
        }
        Value::Function(callable) => match key {
            "name" => Ok(Value::string(callable.name())),
            _ => Ok(Value::Undefined),
        },
        Value::Element(element) => match key {
            "type" => Ok(element.kind.clone()),
            "props" => Ok(Value::Object(element.props.clone())),
            "key" => Ok(element
                .key
                .as_ref()
                .map(|k| Value::String(k.clone()))
                .unwrap_or(Value::Null)),
            _ => Ok(Value::Undefined),
        },
        Value::Number(_) | Value::Bool(_) => Ok(method_or_undefined(target, key)),
        Value::Symbol(_) => Ok(Value::Undefined),
    }
}

pub fn set_property<'a>(target: &Value<'a>, key: &str, value: Value<'a>) -> Result<(), Fault<'a>> {
    match target {
        Value::Undefined | Value::Null => Err(Fault::type_error(format!(
            "Cannot set properties of {} (setting '{}')",
            target.to_js_string(),
            key
        ))),
        Value::Object(object) => {
            object.borrow_mut().set(key, value);
            Ok(())
        }
        Value::Array(items) => {
            let mut items = items.borrow_mut();
            if key == "length" {
                let length = array_length(value.to_number())?;
                if length > items.len() {
                    dense_limit(length)?;
                }
                items.resize(length, Value::Undefined);
            } else if let Some(index) = array_index(key) {
                if index >= items.len() {
                    dense_limit(index + 1)?;
                    items.resize(index + 1, Value::Undefined);
                }
                items[index] = value;
            }
            Ok(())
        }
        // Writes to primitives and frozen element props are silently dropped.
        _ => Ok(()),
    }
}

pub fn delete_property<'a>(target: &Value<'a>, key: &str) -> Result<bool, Fault<'a>> {
    match target {
        Value::Undefined | Value::Null => Err(Fault::type_error(format!(
            "Cannot convert undefined or null to object (deleting '{}')",
            key
        ))),
        Value::Object(object) => {
            object.borrow_mut().remove(key);
            Ok(true)
        }
        Value::Array(items) => {
            if let Some(index) = array_index(key) {
                if let Some(slot) = items.borrow_mut().get_mut(index) {
                    *slot = Value::Undefined;
                }
            }
            Ok(true)
        }
        _ => Ok(true),
    }
}

/// Elements produced by `for…of`, spread and `Array.from`, charged to the
/// step budget before they are copied.
pub fn iterate<'a>(interp: &mut Interpreter<'a>, value: &Value<'a>) -> Result<Vec<Value<'a>>, Fault<'a>> {
    match value {
        Value::Array(items) => {
            interp.charge(items.borrow().len())?;
            Ok(items.borrow().to_vec())
        }
        Value::String(s) => {
            interp.charge(s.len())?;
            Ok(s.chars().map(|c| Value::string(c.to_string())).collect())
        }
        other => Err(Fault::type_error(format!(
            "{} is not iterable",
            describe(other)
        ))),
    }
}

/// Arrays are stored densely, so growth stops well short of the language's
/// own length limit.
fn dense_limit<'a>(length: usize) -> Result<(), Fault<'a>> {
    if length > MAX_DENSE_LENGTH {
        return Err(Fault::range_error("Invalid array length"));
    }
    Ok(())
}

/// Own enumerable keys, as `Object.keys` and `for…in` see them.
pub fn own_keys<'a>(value: &Value<'a>) -> Vec<Rc<str>> {
    match value {
        Value::Object(object) => object.borrow().keys().cloned().collect(),
        Value::Array(items) => (0..items.borrow().len())
            .map(|i| Rc::from(i.to_string()))
            .collect(),
        Value::String(s) => (0..s.chars().count())
            .map(|i| Rc::from(i.to_string()))
            .collect(),
        Value::Element(_) => vec![Rc::from("type"), Rc::from("key"), Rc::from("props")],
        _ => Vec::new(),
    }
}

/// Short description used in "x is not iterable"-style messages.
pub fn describe(value: &Value<'_>) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s),
        Value::Object(_) | Value::Element(_) => "object".to_string(),
        Value::Array(_) => "array".to_string(),
        Value::Function(callable) => format!("function {}", callable.name()),
        other => other.to_js_string(),
    }
}

fn array_index(key: &str) -> Option<usize> {
    if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    key.parse::<usize>().ok()
}

fn method_or_undefined<'a>(receiver: &Value<'a>, key: &str) -> Value<'a> {
    if has_method(receiver, key) {
        Value::function(Callable::Method {
            receiver: receiver.clone(),
            name: Rc::from(key),
        })
    } else {
        Value::Undefined
    }
}
