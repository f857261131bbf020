//! Executable Unit
//!
//! Wraps a [`CompiledUnit`] in a function whose only parameter is the
//! rendering capability, runs it, and extracts the top-level binding named
//! `Component`. The unit sees nothing from the host except `React`.

use oxc_allocator::Allocator;
use oxc_ast::ast::Program;
use oxc_parser::Parser;
use oxc_span::SourceType;

use crate::pipeline::RenderError;
use crate::runtime::{capability, Interpreter, Value};
use crate::transpile::{CompiledUnit, VIRTUAL_FILE_NAME};

/// Names destructured from `React` ahead of the component code.
pub const INJECTED_HOOKS: &[&str] = &[
    "useState",
    "useEffect",
    "useMemo",
    "useCallback",
    "useRef",
    "useReducer",
    "useLayoutEffect",
    "Fragment",
];

pub struct ExecutableUnit<'a> {
    program: &'a Program<'a>,
}

/// The callable extracted from a unit; valid for the cycle that produced it.
#[derive(Debug, Clone)]
pub struct ComponentHandle<'a> {
    pub value: Value<'a>,
}

impl<'a> ExecutableUnit<'a> {
    /// Builds the wrapper source and parses it into `allocator`.
    pub fn construct(allocator: &'a Allocator, compiled: &CompiledUnit) -> Result<Self, RenderError> {
        let source: &'a str = allocator.alloc_str(&wrap(&compiled.code));
        let ret = Parser::new(allocator, source, SourceType::default().with_module(false)).parse();
        if let Some(error) = ret.errors.first() {
            return Err(RenderError::Transpile(format!(
                "{}: {}",
                VIRTUAL_FILE_NAME, error
            )));
        }
        Ok(Self {
            program: allocator.alloc(ret.program),
        })
    }

    /// Runs the unit with the rendering capability and returns `Component`.
    pub fn run(&self, interp: &mut Interpreter<'a>) -> Result<ComponentHandle<'a>, RenderError> {
        let unit = interp
            .run_program(self.program)
            .map_err(|fault| RenderError::Runtime(fault.message()))?;
        let component = interp
            .call(&unit, Value::Undefined, vec![capability()])
            .map_err(|fault| RenderError::Runtime(fault.message()))?;
        if !component.is_callable() {
            return Err(RenderError::Binding);
        }
        Ok(ComponentHandle { value: component })
    }
}

/// The unit body: the hook names are bound in an outer scope so component
/// code may shadow them.
fn wrap(code: &str) -> String {
    format!(
        "(function (React) {{\n  const {{ {} }} = React;\n  return (function () {{\n{}\n  return typeof Component === \"undefined\" ? undefined : Component;\n  }})();\n}})",
        INJECTED_HOOKS.join(", "),
        code
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapper_shape() {
        let wrapped = wrap("function Component() {}");
        assert!(wrapped.starts_with("(function (React) {"));
        assert!(wrapped.contains("const { useState, useEffect,"));
        assert!(wrapped.contains("typeof Component === \"undefined\""));
    }
}
