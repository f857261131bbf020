//! Language intrinsics
//!
//! The pure built-ins the executed unit may use: `Math`, `JSON.stringify`,
//! `Object.*`, `Array.*`, the primitive conversions, the error constructors and
//! the methods of arrays, strings and numbers. None of them reach the host.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::rc::Rc;

use lazy_static::lazy_static;
use serde::ser::{Error as _, SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use super::fault::{ErrorKind, Fault};
use super::property::{get_property, iterate, own_keys, set_property};
use super::scope::{declare, BindingKind, Env};
use super::value::{
    array_length, check_string_length, format_number, join_array, same_value, strict_equals,
    Object, Value, MAX_DENSE_LENGTH, MAX_NESTING_DEPTH, MAX_STRING_LENGTH,
};
use super::{react, Interpreter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intrinsic {
    MathAbs,
    MathCeil,
    MathFloor,
    MathRound,
    MathTrunc,
    MathSign,
    MathMax,
    MathMin,
    MathPow,
    MathSqrt,
    JsonStringify,
    ObjectKeys,
    ObjectValues,
    ObjectEntries,
    ObjectAssign,
    ObjectFreeze,
    ObjectFromEntries,
    ArrayIsArray,
    ArrayFrom,
    ArrayOf,
    StringConvert,
    NumberConvert,
    BooleanConvert,
    ParseInt,
    ParseFloat,
    IsNaN,
    IsFinite,
    ErrorConstructor(ErrorKind),
    CreateElement,
    UseState,
    UseReducer,
    UseEffect,
    UseLayoutEffect,
    UseMemo,
    UseCallback,
    UseRef,
}

impl Intrinsic {
    pub fn name(self) -> &'static str {
        match self {
            Intrinsic::MathAbs => "abs",
            Intrinsic::MathCeil => "ceil",
            Intrinsic::MathFloor => "floor",
            Intrinsic::MathRound => "round",
            Intrinsic::MathTrunc => "trunc",
            Intrinsic::MathSign => "sign",
            Intrinsic::MathMax => "max",
            Intrinsic::MathMin => "min",
            Intrinsic::MathPow => "pow",
            Intrinsic::MathSqrt => "sqrt",
            Intrinsic::JsonStringify => "stringify",
            Intrinsic::ObjectKeys => "keys",
            Intrinsic::ObjectValues => "values",
            Intrinsic::ObjectEntries => "entries",
            Intrinsic::ObjectAssign => "assign",
            Intrinsic::ObjectFreeze => "freeze",
            Intrinsic::ObjectFromEntries => "fromEntries",
            Intrinsic::ArrayIsArray => "isArray",
            Intrinsic::ArrayFrom => "from",
            Intrinsic::ArrayOf => "of",
            Intrinsic::StringConvert => "String",
            Intrinsic::NumberConvert => "Number",
            Intrinsic::BooleanConvert => "Boolean",
            Intrinsic::ParseInt => "parseInt",
            Intrinsic::ParseFloat => "parseFloat",
            Intrinsic::IsNaN => "isNaN",
            Intrinsic::IsFinite => "isFinite",
            Intrinsic::ErrorConstructor(kind) => kind.name(),
            Intrinsic::CreateElement => "createElement",
            Intrinsic::UseState => "useState",
            Intrinsic::UseReducer => "useReducer",
            Intrinsic::UseEffect => "useEffect",
            Intrinsic::UseLayoutEffect => "useLayoutEffect",
            Intrinsic::UseMemo => "useMemo",
            Intrinsic::UseCallback => "useCallback",
            Intrinsic::UseRef => "useRef",
        }
    }

    /// Whether `new` may be applied to this intrinsic.
    pub fn is_constructor(self) -> bool {
        matches!(
            self,
            Intrinsic::ErrorConstructor(_)
                | Intrinsic::StringConvert
                | Intrinsic::NumberConvert
                | Intrinsic::BooleanConvert
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// GLOBALS
// ═══════════════════════════════════════════════════════════════════════════════

/// Declares every intrinsic binding in the global scope.
pub fn install_globals<'a>(env: &Env<'a>) -> Result<(), Fault<'a>> {
    let mut math = namespace(&[
        Intrinsic::MathAbs,
        Intrinsic::MathCeil,
        Intrinsic::MathFloor,
        Intrinsic::MathRound,
        Intrinsic::MathTrunc,
        Intrinsic::MathSign,
        Intrinsic::MathMax,
        Intrinsic::MathMin,
        Intrinsic::MathPow,
        Intrinsic::MathSqrt,
    ]);
    math.set("PI", Value::Number(std::f64::consts::PI));
    math.set("E", Value::Number(std::f64::consts::E));

    let globals = vec![
        ("NaN", Value::Number(f64::NAN)),
        ("Infinity", Value::Number(f64::INFINITY)),
        ("Math", Value::object(math)),
        ("JSON", Value::object(namespace(&[Intrinsic::JsonStringify]))),
        (
            "Object",
            Value::object(namespace(&[
                Intrinsic::ObjectKeys,
                Intrinsic::ObjectValues,
                Intrinsic::ObjectEntries,
                Intrinsic::ObjectAssign,
                Intrinsic::ObjectFreeze,
                Intrinsic::ObjectFromEntries,
            ])),
        ),
        (
            "Array",
            Value::object(namespace(&[
                Intrinsic::ArrayIsArray,
                Intrinsic::ArrayFrom,
                Intrinsic::ArrayOf,
            ])),
        ),
        ("String", Value::intrinsic(Intrinsic::StringConvert)),
        ("Number", Value::intrinsic(Intrinsic::NumberConvert)),
        ("Boolean", Value::intrinsic(Intrinsic::BooleanConvert)),
        ("parseInt", Value::intrinsic(Intrinsic::ParseInt)),
        ("parseFloat", Value::intrinsic(Intrinsic::ParseFloat)),
        ("isNaN", Value::intrinsic(Intrinsic::IsNaN)),
        ("isFinite", Value::intrinsic(Intrinsic::IsFinite)),
        (
            "Error",
            Value::intrinsic(Intrinsic::ErrorConstructor(ErrorKind::Error)),
        ),
        (
            "TypeError",
            Value::intrinsic(Intrinsic::ErrorConstructor(ErrorKind::TypeError)),
        ),
        (
            "RangeError",
            Value::intrinsic(Intrinsic::ErrorConstructor(ErrorKind::RangeError)),
        ),
    ];

    for (name, value) in globals {
        declare(env, name, value, BindingKind::Const)?;
    }
    Ok(())
}

fn namespace<'a>(members: &[Intrinsic]) -> Object<'a> {
    let mut object = Object::default();
    for intrinsic in members {
        object.set(intrinsic.name(), Value::intrinsic(*intrinsic));
    }
    object
}

fn nth<'a>(args: &[Value<'a>], index: usize) -> Value<'a> {
    args.get(index).cloned().unwrap_or(Value::Undefined)
}

// ═══════════════════════════════════════════════════════════════════════════════
// INTRINSIC CALLS
// ═══════════════════════════════════════════════════════════════════════════════

pub fn call_intrinsic<'a>(
    interp: &mut Interpreter<'a>,
    intrinsic: Intrinsic,
    args: Vec<Value<'a>>,
) -> Result<Value<'a>, Fault<'a>> {
    let number = |index: usize| nth(&args, index).to_number();

    let value = match intrinsic {
        Intrinsic::MathAbs => Value::Number(number(0).abs()),
        Intrinsic::MathCeil => Value::Number(number(0).ceil()),
        Intrinsic::MathFloor => Value::Number(number(0).floor()),
        Intrinsic::MathRound => Value::Number((number(0) + 0.5).floor()),
        Intrinsic::MathTrunc => Value::Number(number(0).trunc()),
        Intrinsic::MathSign => {
            let n = number(0);
            Value::Number(if n.is_nan() || n == 0.0 { n } else { n.signum() })
        }
        Intrinsic::MathMax => Value::Number(fold_numbers(&args, f64::NEG_INFINITY, f64::max)),
        Intrinsic::MathMin => Value::Number(fold_numbers(&args, f64::INFINITY, f64::min)),
        Intrinsic::MathPow => Value::Number(number(0).powf(number(1))),
        Intrinsic::MathSqrt => Value::Number(number(0).sqrt()),
        Intrinsic::JsonStringify => json_stringify(&nth(&args, 0), &nth(&args, 2))?,
        Intrinsic::ObjectKeys => {
            let keys = own_keys(&nth(&args, 0));
            interp.charge(keys.len())?;
            Value::array(keys.into_iter().map(Value::String).collect())
        }
        Intrinsic::ObjectValues => {
            let target = nth(&args, 0);
            let keys = own_keys(&target);
            interp.charge(keys.len())?;
            let mut values = Vec::new();
            for key in keys {
                values.push(get_property(&target, &key)?);
            }
            Value::array(values)
        }
        Intrinsic::ObjectEntries => {
            let target = nth(&args, 0);
            let keys = own_keys(&target);
            interp.charge(keys.len())?;
            let mut entries = Vec::new();
            for key in keys {
                let value = get_property(&target, &key)?;
                entries.push(Value::array(vec![Value::String(key), value]));
            }
            Value::array(entries)
        }
        Intrinsic::ObjectAssign => {
            let target = nth(&args, 0);
            if target.is_nullish() {
                return Err(Fault::type_error(
                    "Cannot convert undefined or null to object",
                ));
            }
            for source in args.iter().skip(1) {
                for key in own_keys(source) {
                    let value = get_property(source, &key)?;
                    set_property(&target, &key, value)?;
                }
            }
            target
        }
        Intrinsic::ObjectFreeze => nth(&args, 0),
        Intrinsic::ObjectFromEntries => {
            let mut object = Object::default();
            for entry in iterate(interp, &nth(&args, 0))? {
                let key = get_property(&entry, "0")?.to_property_key();
                object.set(key, get_property(&entry, "1")?);
            }
            Value::object(object)
        }
        Intrinsic::ArrayIsArray => Value::Bool(matches!(nth(&args, 0), Value::Array(_))),
        Intrinsic::ArrayFrom => {
            let source = nth(&args, 0);
            let items = match &source {
                Value::Object(object) => {
                    let length = object
                        .borrow()
                        .get("length")
                        .map(|v| v.to_number())
                        .unwrap_or(0.0);
                    let length = if length.is_nan() || length <= 0.0 {
                        0
                    } else {
                        array_length(length.trunc())?
                    };
                    let mut items = Vec::new();
                    for index in 0..length {
                        interp.tick()?;
                        items.push(get_property(&source, &index.to_string())?);
                    }
                    items
                }
                other => iterate(interp, other)?,
            };
            let mapper = nth(&args, 1);
            if mapper.is_callable() {
                let mut mapped = Vec::with_capacity(items.len());
                for (index, item) in items.into_iter().enumerate() {
                    mapped.push(interp.call(
                        &mapper,
                        Value::Undefined,
                        vec![item, Value::Number(index as f64)],
                    )?);
                }
                Value::array(mapped)
            } else {
                Value::array(items)
            }
        }
        Intrinsic::ArrayOf => Value::array(args),
        Intrinsic::StringConvert => match args.first() {
            None => Value::string(""),
            Some(Value::Symbol(name)) => Value::string(format!("Symbol({})", name)),
            Some(value) => Value::string(value.try_to_js_string()?),
        },
        Intrinsic::NumberConvert => match args.first() {
            None => Value::Number(0.0),
            Some(value) => Value::Number(value.to_number()),
        },
        Intrinsic::BooleanConvert => Value::Bool(nth(&args, 0).truthy()),
        Intrinsic::ParseInt => Value::Number(parse_int(
            &nth(&args, 0).to_js_string(),
            &nth(&args, 1),
        )),
        Intrinsic::ParseFloat => Value::Number(parse_float(&nth(&args, 0).to_js_string())),
        Intrinsic::IsNaN => Value::Bool(number(0).is_nan()),
        Intrinsic::IsFinite => Value::Bool(number(0).is_finite()),
        Intrinsic::ErrorConstructor(kind) => {
            let message = match nth(&args, 0) {
                Value::Undefined => String::new(),
                other => other.to_js_string(),
            };
            Value::error_object(kind.name(), &message)
        }
        Intrinsic::CreateElement
        | Intrinsic::UseState
        | Intrinsic::UseReducer
        | Intrinsic::UseEffect
        | Intrinsic::UseLayoutEffect
        | Intrinsic::UseMemo
        | Intrinsic::UseCallback
        | Intrinsic::UseRef => react::call_capability(interp, intrinsic, args)?,
    };
    Ok(value)
}

fn fold_numbers(args: &[Value<'_>], initial: f64, pick: fn(f64, f64) -> f64) -> f64 {
    let mut result = initial;
    for arg in args {
        let n = arg.to_number();
        if n.is_nan() {
            return f64::NAN;
        }
        result = pick(result, n);
    }
    result
}

fn parse_int(text: &str, radix: &Value<'_>) -> f64 {
    let mut rest = text.trim_start();
    let mut sign = 1.0;
    if let Some(stripped) = rest.strip_prefix('-') {
        sign = -1.0;
        rest = stripped;
    } else if let Some(stripped) = rest.strip_prefix('+') {
        rest = stripped;
    }

    let mut radix = match radix {
        Value::Undefined => 10,
        other => other.to_number() as u32,
    };
    if radix == 0 {
        radix = 10;
    }
    if radix == 16 || radix == 10 {
        if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
            rest = hex;
            radix = 16;
        }
    }
    if !(2..=36).contains(&radix) {
        return f64::NAN;
    }

    let digits: String = rest.chars().take_while(|c| c.is_digit(radix)).collect();
    if digits.is_empty() {
        return f64::NAN;
    }
    let mut result = 0.0;
    for digit in digits.chars().filter_map(|c| c.to_digit(radix)) {
        result = result * f64::from(radix) + f64::from(digit);
    }
    sign * result
}

fn parse_float(text: &str) -> f64 {
    lazy_static! {
        static ref FLOAT_PREFIX: regex::Regex =
            regex::Regex::new(r"^[+-]?(Infinity|\d+\.?\d*(?:[eE][+-]?\d+)?|\.\d+(?:[eE][+-]?\d+)?)")
                .unwrap();
    }
    let trimmed = text.trim_start();
    match FLOAT_PREFIX.find(trimmed) {
        Some(found) => {
            let matched = found.as_str();
            if matched.ends_with("Infinity") {
                if matched.starts_with('-') {
                    f64::NEG_INFINITY
                } else {
                    f64::INFINITY
                }
            } else {
                matched.parse().unwrap_or(f64::NAN)
            }
        }
        None => f64::NAN,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// JSON
// ═══════════════════════════════════════════════════════════════════════════════

const MAX_JSON_DEPTH: usize = 64;

struct Json<'v, 'a> {
    value: &'v Value<'a>,
    depth: usize,
}

impl<'a> Json<'_, 'a> {
    fn nested<'w>(&self, value: &'w Value<'a>) -> Json<'w, 'a> {
        Json {
            value,
            depth: self.depth + 1,
        }
    }
}

fn skipped_in_objects(value: &Value<'_>) -> bool {
    matches!(
        value,
        Value::Undefined | Value::Function(_) | Value::Symbol(_)
    )
}

impl Serialize for Json<'_, '_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.depth > MAX_JSON_DEPTH {
            return Err(S::Error::custom("Converting circular structure to JSON"));
        }
        match self.value {
            Value::Undefined | Value::Null | Value::Function(_) | Value::Symbol(_) => {
                serializer.serialize_unit()
            }
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => {
                if !n.is_finite() {
                    serializer.serialize_unit()
                } else if n.fract() == 0.0 && n.abs() < 9.0e15 {
                    serializer.serialize_i64(*n as i64)
                } else {
                    serializer.serialize_f64(*n)
                }
            }
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(items) => {
                let items = items.borrow();
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items.iter() {
                    seq.serialize_element(&self.nested(item))?;
                }
                seq.end()
            }
            Value::Object(object) => {
                let object = object.borrow();
                let mut map = serializer.serialize_map(None)?;
                for (key, value) in object.entries() {
                    if skipped_in_objects(value) {
                        continue;
                    }
                    map.serialize_entry(key.as_ref(), &self.nested(value))?;
                }
                map.end()
            }
            Value::Element(element) => {
                let kind = match &element.kind {
                    Value::String(tag) => Value::String(tag.clone()),
                    _ => Value::Null,
                };
                let key = element
                    .key
                    .as_ref()
                    .map(|k| Value::String(k.clone()))
                    .unwrap_or(Value::Null);
                let props = Value::Object(element.props.clone());
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("type", &self.nested(&kind))?;
                map.serialize_entry("key", &self.nested(&key))?;
                map.serialize_entry("props", &self.nested(&props))?;
                map.end()
            }
        }
    }
}

fn json_stringify<'a>(value: &Value<'a>, space: &Value<'a>) -> Result<Value<'a>, Fault<'a>> {
    if skipped_in_objects(value) {
        return Ok(Value::Undefined);
    }
    let indent = match space {
        Value::Number(n) if *n >= 1.0 => " ".repeat((*n as usize).min(10)),
        Value::String(s) => s.chars().take(10).collect(),
        _ => String::new(),
    };
    let root = Json { value, depth: 0 };
    let mut buffer = BoundedBuffer::default();
    let result = if indent.is_empty() {
        let mut serializer = serde_json::Serializer::new(&mut buffer);
        root.serialize(&mut serializer)
    } else {
        let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        root.serialize(&mut serializer)
    };
    result.map_err(|e| {
        if e.is_io() {
            Fault::range_error("Invalid string length")
        } else {
            Fault::type_error(e.to_string())
        }
    })?;
    Ok(Value::string(String::from_utf8_lossy(&buffer.0)))
}

/// Output sink that refuses to grow past the string length limit.
#[derive(Default)]
struct BoundedBuffer(Vec<u8>);

impl std::io::Write for BoundedBuffer {
    fn write(&mut self, bytes: &[u8]) -> std::io::Result<usize> {
        if self.0.len() + bytes.len() > MAX_STRING_LENGTH {
            return Err(std::io::Error::new(
                std::io::ErrorKind::OutOfMemory,
                "Invalid string length",
            ));
        }
        self.0.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// METHODS
// ═══════════════════════════════════════════════════════════════════════════════

lazy_static! {
    static ref ARRAY_METHODS: HashSet<&'static str> = [
        "map", "filter", "forEach", "reduce", "find", "findIndex", "some", "every",
        "includes", "indexOf", "join", "slice", "concat", "push", "pop", "shift",
        "unshift", "reverse", "sort", "flat", "flatMap", "at", "toString",
    ]
    .into_iter()
    .collect();
    static ref STRING_METHODS: HashSet<&'static str> = [
        "toUpperCase", "toLowerCase", "trim", "trimStart", "trimEnd", "split",
        "includes", "startsWith", "endsWith", "indexOf", "slice", "substring",
        "charAt", "replace", "replaceAll", "repeat", "padStart", "padEnd",
        "concat", "at", "toString",
    ]
    .into_iter()
    .collect();
    static ref NUMBER_METHODS: HashSet<&'static str> =
        ["toFixed", "toString", "toLocaleString"].into_iter().collect();
}

pub fn has_method(receiver: &Value<'_>, name: &str) -> bool {
    match receiver {
        Value::Array(_) => ARRAY_METHODS.contains(name),
        Value::String(_) => STRING_METHODS.contains(name),
        Value::Number(_) => NUMBER_METHODS.contains(name),
        Value::Bool(_) => name == "toString",
        _ => false,
    }
}

pub fn call_method<'a>(
    interp: &mut Interpreter<'a>,
    receiver: &Value<'a>,
    name: &str,
    args: Vec<Value<'a>>,
) -> Result<Value<'a>, Fault<'a>> {
    match receiver {
        Value::Array(_) => array_method(interp, receiver, name, args),
        Value::String(s) => string_method(interp, s.clone(), name, args),
        Value::Number(n) => number_method(*n, name, &args),
        Value::Bool(b) if name == "toString" => Ok(Value::string(b.to_string())),
        other => Err(Fault::type_error(format!(
            "{}.{} is not a function",
            other.type_of(),
            name
        ))),
    }
}

/// Resolves a possibly negative, possibly missing index against `len`.
fn relative_index(arg: Option<&Value<'_>>, len: usize, default: usize) -> usize {
    match arg {
        None | Some(Value::Undefined) => default,
        Some(value) => {
            let n = value.to_number();
            let n = if n.is_nan() { 0.0 } else { n.trunc() };
            if n < 0.0 {
                (len as f64 + n).max(0.0) as usize
            } else {
                (n as usize).min(len)
            }
        }
    }
}

fn same_value_zero<'a>(left: &Value<'a>, right: &Value<'a>) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
        _ => same_value(left, right),
    }
}

fn array_method<'a>(
    interp: &mut Interpreter<'a>,
    receiver: &Value<'a>,
    name: &str,
    args: Vec<Value<'a>>,
) -> Result<Value<'a>, Fault<'a>> {
    let Value::Array(array) = receiver else {
        return Ok(Value::Undefined);
    };
    match name {
        "push" => {
            let mut array = array.borrow_mut();
            if array.len() + args.len() > MAX_DENSE_LENGTH {
                return Err(Fault::range_error("Invalid array length"));
            }
            array.extend(args);
            return Ok(Value::Number(array.len() as f64));
        }
        "pop" => return Ok(array.borrow_mut().pop().unwrap_or(Value::Undefined)),
        "shift" => {
            let mut array = array.borrow_mut();
            interp.charge(array.len())?;
            return Ok(if array.is_empty() {
                Value::Undefined
            } else {
                array.remove(0)
            });
        }
        "unshift" => {
            let mut array = array.borrow_mut();
            interp.charge(array.len() + args.len())?;
            for (offset, arg) in args.into_iter().enumerate() {
                array.insert(offset, arg);
            }
            return Ok(Value::Number(array.len() as f64));
        }
        "reverse" => {
            array.borrow_mut().reverse();
            return Ok(receiver.clone());
        }
        "join" | "toString" => {
            let separator = match args.first() {
                Some(sep) if name == "join" && !matches!(sep, Value::Undefined) => {
                    sep.try_to_js_string()?
                }
                _ => ",".to_string(),
            };
            interp.charge(array.borrow().len())?;
            return Ok(Value::string(join_array(array, &separator)?));
        }
        _ => {}
    }

    // Callbacks may mutate the array, so they always see a snapshot.
    interp.charge(array.borrow().len())?;
    let items = array.borrow().to_vec();
    let callback = nth(&args, 0);
    let this_arg = nth(&args, 1);
    let needs_callback = matches!(
        name,
        "map" | "filter" | "forEach" | "reduce" | "find" | "findIndex" | "some" | "every"
            | "flatMap"
    );
    if needs_callback && !callback.is_callable() {
        return Err(Fault::type_error(format!(
            "{} is not a function",
            callback.to_js_string()
        )));
    }

    let visit = |interp: &mut Interpreter<'a>,
                     index: usize,
                     item: &Value<'a>|
     -> Result<Value<'a>, Fault<'a>> {
        interp.call(
            &callback,
            this_arg.clone(),
            vec![item.clone(), Value::Number(index as f64), receiver.clone()],
        )
    };

    let value = match name {
        "map" => {
            let mut mapped = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                mapped.push(visit(interp, index, item)?);
            }
            Value::array(mapped)
        }
        "filter" => {
            let mut kept = Vec::new();
            for (index, item) in items.iter().enumerate() {
                if visit(interp, index, item)?.truthy() {
                    kept.push(item.clone());
                }
            }
            Value::array(kept)
        }
        "forEach" => {
            for (index, item) in items.iter().enumerate() {
                visit(interp, index, item)?;
            }
            Value::Undefined
        }
        "find" | "findIndex" => {
            let mut found = None;
            for (index, item) in items.iter().enumerate() {
                if visit(interp, index, item)?.truthy() {
                    found = Some(index);
                    break;
                }
            }
            match (name, found) {
                ("find", Some(index)) => items[index].clone(),
                ("find", None) => Value::Undefined,
                (_, Some(index)) => Value::Number(index as f64),
                (_, None) => Value::Number(-1.0),
            }
        }
        "some" => {
            let mut any = false;
            for (index, item) in items.iter().enumerate() {
                if visit(interp, index, item)?.truthy() {
                    any = true;
                    break;
                }
            }
            Value::Bool(any)
        }
        "every" => {
            let mut all = true;
            for (index, item) in items.iter().enumerate() {
                if !visit(interp, index, item)?.truthy() {
                    all = false;
                    break;
                }
            }
            Value::Bool(all)
        }
        "reduce" => {
            let mut iter = items.iter().enumerate();
            let mut accumulator = match args.get(1) {
                Some(initial) => initial.clone(),
                None => match iter.next() {
                    Some((_, first)) => first.clone(),
                    None => {
                        return Err(Fault::type_error(
                            "Reduce of empty array with no initial value",
                        ))
                    }
                },
            };
            for (index, item) in iter {
                accumulator = interp.call(
                    &callback,
                    Value::Undefined,
                    vec![
                        accumulator,
                        item.clone(),
                        Value::Number(index as f64),
                        receiver.clone(),
                    ],
                )?;
            }
            accumulator
        }
        "flatMap" => {
            let mut flattened = Vec::new();
            for (index, item) in items.iter().enumerate() {
                match visit(interp, index, item)? {
                    Value::Array(inner) => {
                        let inner = inner.borrow();
                        interp.charge(inner.len())?;
                        flattened.extend(inner.iter().cloned());
                    }
                    other => flattened.push(other),
                }
            }
            Value::array(flattened)
        }
        "includes" => Value::Bool(items.iter().any(|item| same_value_zero(item, &callback))),
        "indexOf" => Value::Number(
            items
                .iter()
                .position(|item| strict_equals(item, &callback))
                .map(|i| i as f64)
                .unwrap_or(-1.0),
        ),
        "slice" => {
            let start = relative_index(args.first(), items.len(), 0);
            let end = relative_index(args.get(1), items.len(), items.len());
            Value::array(if start < end {
                items[start..end].to_vec()
            } else {
                Vec::new()
            })
        }
        "concat" => {
            let mut joined = items;
            for arg in args {
                match arg {
                    Value::Array(inner) => {
                        let inner = inner.borrow();
                        interp.charge(inner.len())?;
                        joined.extend(inner.iter().cloned());
                    }
                    other => joined.push(other),
                }
                if joined.len() > MAX_DENSE_LENGTH {
                    return Err(Fault::range_error("Invalid array length"));
                }
            }
            Value::array(joined)
        }
        "sort" => {
            let comparator = if callback.is_callable() {
                Some(callback.clone())
            } else {
                None
            };
            let (defined, undefined): (Vec<_>, Vec<_>) = items
                .into_iter()
                .partition(|item| !matches!(item, Value::Undefined));
            let mut sorted = merge_sort(interp, defined, comparator.as_ref())?;
            sorted.extend(undefined);
            *array.borrow_mut() = sorted.into();
            receiver.clone()
        }
        "flat" => {
            let depth = match args.first() {
                None | Some(Value::Undefined) => 1,
                Some(value) => value.to_number().max(0.0) as usize,
            };
            let mut flattened = Vec::new();
            flatten_into(interp, &items, depth, 0, &mut flattened)?;
            Value::array(flattened)
        }
        "at" => {
            let n = callback.to_number();
            let n = if n.is_nan() { 0.0 } else { n.trunc() };
            let index = if n < 0.0 { items.len() as f64 + n } else { n };
            if index < 0.0 {
                Value::Undefined
            } else {
                items.get(index as usize).cloned().unwrap_or(Value::Undefined)
            }
        }
        _ => Value::Undefined,
    };
    Ok(value)
}

fn flatten_into<'a>(
    interp: &mut Interpreter<'a>,
    items: &[Value<'a>],
    depth: usize,
    level: usize,
    out: &mut Vec<Value<'a>>,
) -> Result<(), Fault<'a>> {
    if level >= MAX_NESTING_DEPTH {
        return Err(Fault::range_error("Maximum call stack size exceeded"));
    }
    interp.charge(items.len())?;
    for item in items {
        match item {
            Value::Array(inner) if depth > 0 => {
                flatten_into(interp, &inner.borrow(), depth - 1, level + 1, out)?
            }
            other => out.push(other.clone()),
        }
    }
    Ok(())
}

/// Stable merge sort that tolerates inconsistent comparators.
fn merge_sort<'a>(
    interp: &mut Interpreter<'a>,
    mut items: Vec<Value<'a>>,
    comparator: Option<&Value<'a>>,
) -> Result<Vec<Value<'a>>, Fault<'a>> {
    if items.len() <= 1 {
        return Ok(items);
    }
    let right = items.split_off(items.len() / 2);
    let left = merge_sort(interp, items, comparator)?;
    let right = merge_sort(interp, right, comparator)?;

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    while let (Some(l), Some(r)) = (left.peek(), right.peek()) {
        let order = compare_for_sort(interp, l, r, comparator)?;
        let next = if order == Ordering::Greater {
            right.next()
        } else {
            left.next()
        };
        merged.extend(next);
    }
    merged.extend(left);
    merged.extend(right);
    Ok(merged)
}

fn compare_for_sort<'a>(
    interp: &mut Interpreter<'a>,
    left: &Value<'a>,
    right: &Value<'a>,
    comparator: Option<&Value<'a>>,
) -> Result<Ordering, Fault<'a>> {
    match comparator {
        Some(compare) => {
            let result = interp
                .call(compare, Value::Undefined, vec![left.clone(), right.clone()])?
                .to_number();
            Ok(if result < 0.0 {
                Ordering::Less
            } else if result > 0.0 {
                Ordering::Greater
            } else {
                Ordering::Equal
            })
        }
        None => {
            interp.tick()?;
            Ok(left.try_to_js_string()?.cmp(&right.try_to_js_string()?))
        }
    }
}

fn string_method<'a>(
    interp: &mut Interpreter<'a>,
    text: Rc<str>,
    name: &str,
    args: Vec<Value<'a>>,
) -> Result<Value<'a>, Fault<'a>> {
    interp.charge(text.len())?;
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    let arg_string = |index: usize| nth(&args, index).to_js_string();

    let value = match name {
        "toUpperCase" => Value::string(text.to_uppercase()),
        "toLowerCase" => Value::string(text.to_lowercase()),
        "trim" => Value::string(text.trim()),
        "trimStart" => Value::string(text.trim_start()),
        "trimEnd" => Value::string(text.trim_end()),
        "toString" => Value::String(text.clone()),
        "split" => {
            let parts: Vec<Value<'a>> = match args.first() {
                None | Some(Value::Undefined) => vec![Value::String(text.clone())],
                Some(separator) => {
                    let separator = separator.to_js_string();
                    if separator.is_empty() {
                        chars.iter().map(|c| Value::string(c.to_string())).collect()
                    } else {
                        text.split(separator.as_str()).map(Value::string).collect()
                    }
                }
            };
            interp.charge(parts.len())?;
            let parts = match args.get(1) {
                Some(limit) if !matches!(limit, Value::Undefined) => {
                    let limit = limit.to_number().max(0.0) as usize;
                    parts.into_iter().take(limit).collect()
                }
                _ => parts,
            };
            Value::array(parts)
        }
        "includes" => Value::Bool(text.contains(arg_string(0).as_str())),
        "startsWith" => Value::Bool(text.starts_with(arg_string(0).as_str())),
        "endsWith" => Value::Bool(text.ends_with(arg_string(0).as_str())),
        "indexOf" => {
            let needle = arg_string(0);
            Value::Number(
                text.find(needle.as_str())
                    .map(|byte| text[..byte].chars().count() as f64)
                    .unwrap_or(-1.0),
            )
        }
        "slice" => {
            let start = relative_index(args.first(), len, 0);
            let end = relative_index(args.get(1), len, len);
            Value::string(if start < end {
                chars[start..end].iter().collect::<String>()
            } else {
                String::new()
            })
        }
        "substring" => {
            let clamp = |arg: Option<&Value<'a>>, default: usize| match arg {
                None | Some(Value::Undefined) => default,
                Some(value) => {
                    let n = value.to_number();
                    if n.is_nan() || n < 0.0 {
                        0
                    } else {
                        (n as usize).min(len)
                    }
                }
            };
            let mut start = clamp(args.first(), 0);
            let mut end = clamp(args.get(1), len);
            if start > end {
                std::mem::swap(&mut start, &mut end);
            }
            Value::string(chars[start..end].iter().collect::<String>())
        }
        "charAt" => {
            let index = nth(&args, 0).to_number();
            let index = if index.is_nan() { 0.0 } else { index };
            Value::string(
                chars
                    .get(index as usize)
                    .filter(|_| index >= 0.0)
                    .map(|c| c.to_string())
                    .unwrap_or_default(),
            )
        }
        "at" => {
            let n = nth(&args, 0).to_number();
            let n = if n.is_nan() { 0.0 } else { n.trunc() };
            let index = if n < 0.0 { len as f64 + n } else { n };
            if index < 0.0 {
                Value::Undefined
            } else {
                chars
                    .get(index as usize)
                    .map(|c| Value::string(c.to_string()))
                    .unwrap_or(Value::Undefined)
            }
        }
        "replace" | "replaceAll" => {
            let pattern = arg_string(0);
            let replacement = nth(&args, 1);
            let mut out = String::new();
            // `last` ends the previous match; `from` is where the next search starts.
            let mut last = 0;
            let mut from = 0;
            while let Some(found) = text[from..].find(pattern.as_str()).map(|byte| from + byte) {
                out.push_str(&text[last..found]);
                let substitute = if replacement.is_callable() {
                    let offset = text[..found].chars().count();
                    interp
                        .call(
                            &replacement,
                            Value::Undefined,
                            vec![
                                Value::string(&pattern),
                                Value::Number(offset as f64),
                                Value::String(text.clone()),
                            ],
                        )?
                        .try_to_js_string()?
                } else {
                    replacement.try_to_js_string()?
                };
                out.push_str(&substitute);
                check_string_length(out.len())?;
                last = found + pattern.len();
                if name == "replace" {
                    break;
                }
                from = if pattern.is_empty() {
                    match text[found..].chars().next() {
                        Some(c) => found + c.len_utf8(),
                        None => break,
                    }
                } else {
                    last
                };
            }
            out.push_str(&text[last..]);
            Value::string(out)
        }
        "repeat" => {
            let count = nth(&args, 0).to_number();
            if count < 0.0 || count.is_infinite() {
                return Err(Fault::range_error(format!(
                    "Invalid count value: {}",
                    format_number(count)
                )));
            }
            let count = if count.is_nan() { 0 } else { count as usize };
            let Some(total) = text.len().checked_mul(count) else {
                return Err(Fault::range_error("Invalid string length"));
            };
            check_string_length(total)?;
            interp.charge(total)?;
            Value::string(text.repeat(count))
        }
        "padStart" | "padEnd" => {
            let target = nth(&args, 0).to_number();
            let target = if target.is_nan() { 0 } else { target.max(0.0) as usize };
            let filler = match args.get(1) {
                None | Some(Value::Undefined) => " ".to_string(),
                Some(value) => value.to_js_string(),
            };
            if target <= len || filler.is_empty() {
                Value::String(text.clone())
            } else {
                check_string_length(target)?;
                interp.charge(target)?;
                let padding: String = filler.chars().cycle().take(target - len).collect();
                if name == "padStart" {
                    Value::string(format!("{}{}", padding, text))
                } else {
                    Value::string(format!("{}{}", text, padding))
                }
            }
        }
        "concat" => {
            let mut joined = text.to_string();
            for arg in &args {
                joined.push_str(&arg.to_js_string());
            }
            Value::string(joined)
        }
        _ => Value::Undefined,
    };
    Ok(value)
}

fn number_method<'a>(n: f64, name: &str, args: &[Value<'a>]) -> Result<Value<'a>, Fault<'a>> {
    let value = match name {
        "toFixed" => {
            let digits = nth(args, 0).to_number();
            let digits = if digits.is_nan() { 0.0 } else { digits.trunc() };
            if !(0.0..=100.0).contains(&digits) {
                return Err(Fault::range_error(
                    "toFixed() digits argument must be between 0 and 100",
                ));
            }
            if !n.is_finite() || n.abs() >= 1e21 {
                Value::string(format_number(n))
            } else {
                let sign = if n < 0.0 { "-" } else { "" };
                Value::string(format!("{}{}", sign, to_fixed(n.abs(), digits as usize)))
            }
        }
        "toString" => match nth(args, 0) {
            Value::Undefined => Value::string(format_number(n)),
            radix => {
                let radix = radix.to_number();
                if !(2.0..=36.0).contains(&radix) {
                    return Err(Fault::range_error(
                        "toString() radix must be between 2 and 36",
                    ));
                }
                Value::string(integer_to_radix(n, radix as u32))
            }
        },
        "toLocaleString" => Value::string(to_locale_string(n, &nth(args, 1))?),
        _ => Value::Undefined,
    };
    Ok(value)
}

/// Fixed-point digits of a non-negative `n`, rounding half up on its exact
/// binary value the way `toFixed` does.
fn to_fixed(n: f64, digits: usize) -> String {
    // Every finite double has a terminating expansion within 1074 places.
    let exact = format!("{:.1100}", n);
    let (integer, fraction) = exact.split_once('.').unwrap_or((exact.as_str(), ""));
    let (kept, dropped) = fraction.split_at(digits.min(fraction.len()));

    let mut number: Vec<u8> = integer.bytes().chain(kept.bytes()).collect();
    if dropped.as_bytes().first().is_some_and(|&d| d >= b'5') {
        let mut carry = true;
        for digit in number.iter_mut().rev() {
            if *digit == b'9' {
                *digit = b'0';
            } else {
                *digit += 1;
                carry = false;
                break;
            }
        }
        if carry {
            number.insert(0, b'1');
        }
    }

    let split = number.len() - kept.len();
    let mut out = String::from_utf8_lossy(&number[..split]).into_owned();
    if !kept.is_empty() {
        out.push('.');
        out.push_str(&String::from_utf8_lossy(&number[split..]));
    }
    out
}

fn integer_to_radix(n: f64, radix: u32) -> String {
    if radix == 10 || !n.is_finite() || n.fract() != 0.0 {
        return format_number(n);
    }
    let negative = n < 0.0;
    let mut rest = n.abs() as u64;
    if rest == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while rest > 0 {
        let digit = (rest % u64::from(radix)) as u32;
        digits.extend(std::char::from_digit(digit, radix));
        rest /= u64::from(radix);
    }
    if negative {
        digits.push('-');
    }
    digits.iter().rev().collect()
}

/// `toLocaleString` for the `en-US` locale, honouring the fraction-digit,
/// currency and percent options.
fn to_locale_string<'a>(n: f64, options: &Value<'a>) -> Result<String, Fault<'a>> {
    let option = |key: &str| -> Result<Value<'a>, Fault<'a>> {
        match options {
            Value::Object(_) => get_property(options, key),
            _ => Ok(Value::Undefined),
        }
    };

    let style = option("style")?.to_js_string();
    let (mut min_fraction, mut max_fraction) = match style.as_str() {
        "currency" => (2, 2),
        "percent" => (0, 0),
        _ => (0, 3),
    };
    if let Value::Number(min) = option("minimumFractionDigits")? {
        min_fraction = min.clamp(0.0, 20.0) as usize;
        max_fraction = max_fraction.max(min_fraction);
    }
    if let Value::Number(max) = option("maximumFractionDigits")? {
        max_fraction = max.clamp(0.0, 20.0) as usize;
        min_fraction = min_fraction.min(max_fraction);
    }

    if n.is_nan() {
        return Ok("NaN".to_string());
    }
    if n.is_infinite() {
        return Ok(if n > 0.0 { "∞" } else { "-∞" }.to_string());
    }

    let scaled = if style == "percent" { n * 100.0 } else { n };
    let fixed = to_fixed(scaled.abs(), max_fraction);
    let (integer, fraction) = match fixed.split_once('.') {
        Some((integer, fraction)) => (integer.to_string(), fraction.to_string()),
        None => (fixed.clone(), String::new()),
    };
    let mut fraction = fraction;
    while fraction.len() > min_fraction && fraction.ends_with('0') {
        fraction.pop();
    }

    let mut grouped = String::new();
    for (index, digit) in integer.chars().enumerate() {
        if index > 0 && (integer.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let mut body = grouped;
    if !fraction.is_empty() {
        body.push('.');
        body.push_str(&fraction);
    }

    let negative = scaled < 0.0 && body.chars().any(|c| c.is_ascii_digit() && c != '0');
    let sign = if negative { "-" } else { "" };
    Ok(match style.as_str() {
        "currency" => {
            let symbol = match option("currency")?.to_js_string().as_str() {
                "EUR" => "€".to_string(),
                "GBP" => "£".to_string(),
                "JPY" => "¥".to_string(),
                "USD" | "undefined" => "$".to_string(),
                other => format!("{}\u{a0}", other),
            };
            format!("{}{}{}", sign, symbol, body)
        }
        "percent" => format!("{}{}%", sign, body),
        _ => format!("{}{}", sign, body),
    })
}
