//! Runtime faults
//!
//! A [`Fault`] is anything that unwinds the executed program: errors raised by the
//! runtime itself (with the host language's messages) and values thrown by user
//! code. The pipeline only ever looks at [`Fault::message`].

use std::fmt;

use super::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Error,
    TypeError,
    ReferenceError,
    RangeError,
    SyntaxError,
}

impl ErrorKind {
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Error => "Error",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::ReferenceError => "ReferenceError",
            ErrorKind::RangeError => "RangeError",
            ErrorKind::SyntaxError => "SyntaxError",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Fault<'a> {
    #[error("{message}")]
    Native { kind: ErrorKind, message: String },
    #[error("{}", thrown_message(.0))]
    Thrown(Value<'a>),
}

impl<'a> Fault<'a> {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Fault::Native {
            kind,
            message: message.into(),
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeError, message)
    }

    pub fn reference_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ReferenceError, message)
    }

    pub fn range_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RangeError, message)
    }

    pub fn syntax_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SyntaxError, message)
    }

    pub fn unsupported(construct: &str) -> Self {
        Self::syntax_error(format!("{} are not supported in the playground", construct))
    }

    /// The text shown in the preview for this fault.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// The value a `catch` clause binds.
    pub fn into_value(self) -> Value<'a> {
        match self {
            Fault::Native { kind, message } => Value::error_object(kind.name(), &message),
            Fault::Thrown(value) => value,
        }
    }
}

/// Error objects contribute their `message`; anything else its string form.
fn thrown_message(value: &Value<'_>) -> String {
    if let Value::Object(object) = value {
        if let Some(message) = object.borrow().get("message") {
            return message.to_js_string();
        }
    }
    value.to_js_string()
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
