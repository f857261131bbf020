//! Runtime values
//!
//! Values borrow the parsed program (`'a`) through closures; everything else is
//! reference counted so arrays, objects and elements share identity the way the
//! executed code expects.

use std::cell::RefCell;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use oxc_ast::ast::{FormalParameters, FunctionBody};

use super::builtins::Intrinsic;
use super::fault::Fault;
use super::scope::Env;

pub type ArrayRef<'a> = Rc<RefCell<Items<'a>>>;
pub type ObjectRef<'a> = Rc<RefCell<Object<'a>>>;

/// Identity of the fragment type exposed as `React.Fragment`.
pub const FRAGMENT_SYMBOL: &str = "react.fragment";

/// Longest string the runtime builds, in bytes.
pub const MAX_STRING_LENGTH: usize = (1 << 29) - 24;

/// Largest array length the language allows.
pub const MAX_ARRAY_LENGTH: f64 = 4_294_967_295.0;

/// Longest array a single write may grow to.
pub const MAX_DENSE_LENGTH: usize = 1 << 24;

/// Deepest array nesting that stringification and flattening follow.
pub const MAX_NESTING_DEPTH: usize = 1024;

#[derive(Clone)]
pub enum Value<'a> {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Symbol(&'static str),
    Array(ArrayRef<'a>),
    Object(ObjectRef<'a>),
    Function(Rc<Callable<'a>>),
    Element(Rc<Element<'a>>),
}

pub type KeyOf<'a> = for<'s> fn(&'s (Rc<str>, Value<'a>)) -> &'s Rc<str>;

/// Property names in insertion order.
pub type Keys<'s, 'a> = std::iter::Map<std::slice::Iter<'s, (Rc<str>, Value<'a>)>, KeyOf<'a>>;

/// Array storage. Dropping it tears nested arrays, objects and elements down
/// iteratively, so arbitrarily deep values never recurse in `drop`.
#[derive(Clone, Default)]
pub struct Items<'a>(Vec<Value<'a>>);

/// Insertion-ordered property bag.
#[derive(Clone, Default)]
pub struct Object<'a> {
    properties: Vec<(Rc<str>, Value<'a>)>,
    /// Set for objects built by the error constructors and for caught faults.
    pub is_error: bool,
}

pub enum Callable<'a> {
    Closure(Closure<'a>),
    Intrinsic(Intrinsic),
    /// A built-in method read off a primitive, array or number, e.g. `items.map`.
    Method { receiver: Value<'a>, name: Rc<str> },
    StateSetter { instance: Rc<str>, slot: usize },
    Dispatch { instance: Rc<str>, slot: usize },
}

pub struct Closure<'a> {
    pub name: Option<Rc<str>>,
    pub params: &'a FormalParameters<'a>,
    pub body: &'a FunctionBody<'a>,
    /// Arrow function whose body is a single expression.
    pub concise: bool,
    pub arrow: bool,
    pub env: Env<'a>,
}

/// The value produced by `React.createElement`.
pub struct Element<'a> {
    pub kind: Value<'a>,
    pub key: Option<Rc<str>>,
    pub props: ObjectRef<'a>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONSTRUCTORS
// ═══════════════════════════════════════════════════════════════════════════════

impl<'a> Value<'a> {
    pub fn string(value: impl AsRef<str>) -> Self {
        Value::String(Rc::from(value.as_ref()))
    }

    pub fn array(items: Vec<Value<'a>>) -> Self {
        Value::Array(Rc::new(RefCell::new(Items(items))))
    }

    pub fn object(object: Object<'a>) -> Self {
        Value::Object(Rc::new(RefCell::new(object)))
    }

    pub fn function(callable: Callable<'a>) -> Self {
        Value::Function(Rc::new(callable))
    }

    pub fn intrinsic(intrinsic: Intrinsic) -> Self {
        Value::function(Callable::Intrinsic(intrinsic))
    }

    /// `{ name, message }` with the error flag set.
    pub fn error_object(name: &str, message: &str) -> Self {
        let mut object = Object::default();
        object.set("name", Value::string(name));
        object.set("message", Value::string(message));
        object.is_error = true;
        Value::object(object)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONVERSIONS
// ═══════════════════════════════════════════════════════════════════════════════

impl<'a> Value<'a> {
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Array(_) | Value::Object(_) | Value::Element(_) => "object",
            Value::Function(_) => "function",
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::String(s) => string_to_number(s),
            Value::Array(_) => string_to_number(&self.to_js_string()),
            _ => f64::NAN,
        }
    }

    /// The language's `ToString` conversion. Output past the string length
    /// limit or the nesting limit is cut off; see [`Value::try_to_js_string`].
    pub fn to_js_string(&self) -> String {
        let mut out = String::new();
        let _ = self.write_js_string(&mut out, &mut Vec::new());
        out
    }

    /// `ToString` that fails the way the language does on oversized or too
    /// deeply nested results.
    pub fn try_to_js_string(&self) -> Result<String, Fault<'a>> {
        let mut out = String::new();
        self.write_js_string(&mut out, &mut Vec::new())
            .map_err(Overflow::into_fault)?;
        Ok(out)
    }

    fn write_js_string(
        &self,
        out: &mut String,
        open: &mut Vec<*const RefCell<Items<'a>>>,
    ) -> Result<(), Overflow> {
        match self {
            Value::Array(items) => write_joined(items, ",", out, open),
            other => {
                out.push_str(&other.scalar_string());
                Overflow::check(out)
            }
        }
    }

    fn scalar_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.to_string(),
            Value::Symbol(name) => format!("Symbol({})", name),
            Value::Object(object) => {
                let object = object.borrow();
                if object.is_error {
                    let name = object
                        .get("name")
                        .map(|v| v.to_js_string())
                        .unwrap_or_else(|| "Error".to_string());
                    let message = object
                        .get("message")
                        .map(|v| v.to_js_string())
                        .unwrap_or_default();
                    if message.is_empty() {
                        name
                    } else {
                        format!("{}: {}", name, message)
                    }
                } else {
                    "[object Object]".to_string()
                }
            }
            Value::Function(callable) => format!("function {}() {{ [code] }}", callable.name()),
            Value::Array(_) | Value::Element(_) => "[object Object]".to_string(),
        }
    }

    pub fn to_property_key(&self) -> Rc<str> {
        match self {
            Value::String(s) => s.clone(),
            other => Rc::from(other.to_js_string()),
        }
    }
}

impl<'a> Callable<'a> {
    pub fn name(&self) -> String {
        match self {
            Callable::Closure(closure) => closure
                .name
                .as_deref()
                .map(str::to_string)
                .unwrap_or_default(),
            Callable::Intrinsic(intrinsic) => intrinsic.name().to_string(),
            Callable::Method { name, .. } => name.to_string(),
            Callable::StateSetter { .. } | Callable::Dispatch { .. } => "bound dispatchSetState".to_string(),
        }
    }
}

fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        return i64::from_str_radix(hex, 16)
            .map(|n| n as f64)
            .unwrap_or(f64::NAN);
    }
    // Rust accepts "inf"/"nan" spellings the language does not.
    if trimmed.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// `Number.prototype.toString()` for finite and non-finite values.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.abs() >= 1e21 || n.abs() < 1e-6 {
        let formatted = format!("{:e}", n);
        return match formatted.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
            _ => formatted,
        };
    }
    format!("{}", n)
}

/// `Array.prototype.join`: nullish items print empty and an array already
/// being joined further up prints empty instead of recursing.
pub fn join_array<'a>(items: &ArrayRef<'a>, separator: &str) -> Result<String, Fault<'a>> {
    let mut out = String::new();
    write_joined(items, separator, &mut out, &mut Vec::new()).map_err(Overflow::into_fault)?;
    Ok(out)
}

fn write_joined<'a>(
    items: &ArrayRef<'a>,
    separator: &str,
    out: &mut String,
    open: &mut Vec<*const RefCell<Items<'a>>>,
) -> Result<(), Overflow> {
    let id = Rc::as_ptr(items);
    if open.contains(&id) {
        return Ok(());
    }
    if open.len() >= MAX_NESTING_DEPTH {
        return Err(Overflow::Depth);
    }
    open.push(id);
    let result = items.borrow().iter().enumerate().try_for_each(|(index, item)| {
        if index > 0 {
            out.push_str(separator);
            Overflow::check(out)?;
        }
        if item.is_nullish() {
            Ok(())
        } else {
            item.write_js_string(out, open)
        }
    });
    open.pop();
    result
}

enum Overflow {
    Length,
    Depth,
}

impl Overflow {
    fn check(out: &str) -> Result<(), Overflow> {
        if out.len() > MAX_STRING_LENGTH {
            Err(Overflow::Length)
        } else {
            Ok(())
        }
    }

    fn into_fault<'a>(self) -> Fault<'a> {
        match self {
            Overflow::Length => Fault::range_error("Invalid string length"),
            Overflow::Depth => Fault::range_error("Maximum call stack size exceeded"),
        }
    }
}

/// Fails with `Invalid string length` when `len` bytes exceed the limit.
pub fn check_string_length<'a>(len: usize) -> Result<(), Fault<'a>> {
    if len > MAX_STRING_LENGTH {
        return Err(Overflow::Length.into_fault());
    }
    Ok(())
}

/// Validates a requested array length and converts it to an index bound.
pub fn array_length<'a>(length: f64) -> Result<usize, Fault<'a>> {
    if !(0.0..=MAX_ARRAY_LENGTH).contains(&length) || length.fract() != 0.0 {
        return Err(Fault::range_error("Invalid array length"));
    }
    Ok(length as usize)
}

// ═══════════════════════════════════════════════════════════════════════════════
// TEARDOWN
// ═══════════════════════════════════════════════════════════════════════════════

impl<'a> Items<'a> {
    pub fn into_vec(mut self) -> Vec<Value<'a>> {
        std::mem::take(&mut self.0)
    }
}

impl<'a> From<Vec<Value<'a>>> for Items<'a> {
    fn from(items: Vec<Value<'a>>) -> Self {
        Items(items)
    }
}

impl<'a> Deref for Items<'a> {
    type Target = Vec<Value<'a>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Items<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl Drop for Items<'_> {
    fn drop(&mut self) {
        dismantle(std::mem::take(&mut self.0));
    }
}

impl Drop for Object<'_> {
    fn drop(&mut self) {
        dismantle(self.properties.drain(..).map(|(_, value)| value).collect());
    }
}

/// Drops `pending`, unpacking every container this was the last owner of
/// onto the same work list.
fn dismantle(mut pending: Vec<Value<'_>>) {
    while let Some(value) = pending.pop() {
        match value {
            Value::Array(items) => {
                if let Ok(cell) = Rc::try_unwrap(items) {
                    pending.append(&mut cell.into_inner().0);
                }
            }
            Value::Object(object) => {
                if let Ok(cell) = Rc::try_unwrap(object) {
                    let mut object = cell.into_inner();
                    pending.extend(object.properties.drain(..).map(|(_, value)| value));
                }
            }
            Value::Element(element) => {
                if let Ok(element) = Rc::try_unwrap(element) {
                    pending.push(element.kind);
                    pending.push(Value::Object(element.props));
                }
            }
            _ => {}
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EQUALITY
// ═══════════════════════════════════════════════════════════════════════════════

pub fn strict_equals<'a>(left: &Value<'a>, right: &Value<'a>) -> bool {
    match (left, right) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Symbol(a), Value::Symbol(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
        (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
        (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
        (Value::Element(a), Value::Element(b)) => Rc::ptr_eq(a, b),
        _ => false,
    }
}

pub fn loose_equals<'a>(left: &Value<'a>, right: &Value<'a>) -> bool {
    match (left, right) {
        (a, b) if a.is_nullish() && b.is_nullish() => true,
        (a, b) if a.is_nullish() || b.is_nullish() => false,
        (Value::Number(_), Value::String(_))
        | (Value::String(_), Value::Number(_))
        | (Value::Bool(_), _)
        | (_, Value::Bool(_)) => left.to_number() == right.to_number(),
        (Value::Array(_) | Value::Object(_), Value::String(_) | Value::Number(_)) => {
            loose_equals(&Value::string(left.to_js_string()), right)
        }
        (Value::String(_) | Value::Number(_), Value::Array(_) | Value::Object(_)) => {
            loose_equals(left, &Value::string(right.to_js_string()))
        }
        _ => strict_equals(left, right),
    }
}

/// `Object.is`, used for hook dependency and state comparisons.
pub fn same_value<'a>(left: &Value<'a>, right: &Value<'a>) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => {
            (a.is_nan() && b.is_nan()) || (a == b && a.is_sign_negative() == b.is_sign_negative())
        }
        _ => strict_equals(left, right),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// OBJECTS
// ═══════════════════════════════════════════════════════════════════════════════

impl<'a> Object<'a> {
    pub fn get(&self, key: &str) -> Option<&Value<'a>> {
        self.properties
            .iter()
            .find(|(name, _)| name.as_ref() == key)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.properties.iter().any(|(name, _)| name.as_ref() == key)
    }

    pub fn set(&mut self, key: impl AsRef<str>, value: Value<'a>) {
        let key = key.as_ref();
        if let Some(slot) = self
            .properties
            .iter_mut()
            .find(|(name, _)| name.as_ref() == key)
        {
            slot.1 = value;
        } else {
            self.properties.push((Rc::from(key), value));
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value<'a>> {
        let index = self
            .properties
            .iter()
            .position(|(name, _)| name.as_ref() == key)?;
        Some(self.properties.remove(index).1)
    }

    pub fn keys(&self) -> Keys<'_, 'a> {
        self.properties.iter().map(Self::key_of as KeyOf<'a>)
    }

    fn key_of<'s>(entry: &'s (Rc<str>, Value<'a>)) -> &'s Rc<str> {
        &entry.0
    }

    pub fn entries(&self) -> impl Iterator<Item = (&Rc<str>, &Value<'a>)> {
        self.properties.iter().map(|(name, value)| (name, value))
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn clear(&mut self) {
        self.properties.clear();
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{:?}", s),
            Value::Function(callable) => write!(f, "[Function {}]", callable.name()),
            Value::Element(_) => write!(f, "[Element]"),
            Value::Object(object) => {
                let object = object.borrow();
                let keys: Vec<&str> = object.keys().map(|k| k.as_ref()).collect();
                write!(f, "{{{}}}", keys.join(", "))
            }
            other => write!(f, "{}", other.to_js_string()),
        }
    }
}
