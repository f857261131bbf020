//! Transpile Stage
//!
//! TSX source → plain JavaScript. JSX is lowered to `React.createElement`
//! calls by [`JsxLowerer`]; TypeScript syntax is erased by the oxc
//! TypeScript transform; the result is printed back to text with oxc_codegen.

use std::path::Path;

use oxc_allocator::Allocator;
use oxc_ast_visit::VisitMut;
use oxc_codegen::Codegen;
use oxc_parser::Parser;
use oxc_semantic::SemanticBuilder;
use oxc_span::SourceType;
use oxc_transformer::{TransformOptions, Transformer};
use tracing::debug;

use crate::jsx_lowerer::{JsxLowerer, ModuleStripper};
use crate::pipeline::RenderError;

/// Virtual file name used in diagnostics.
pub const VIRTUAL_FILE_NAME: &str = "component.tsx";

/// Plain JavaScript produced from one version of the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledUnit {
    pub code: String,
}

pub fn transpile(source: &str) -> Result<CompiledUnit, RenderError> {
    let allocator = Allocator::default();
    let source_type = SourceType::default()
        .with_module(true)
        .with_typescript(true)
        .with_jsx(true);

    let ret = Parser::new(&allocator, source, source_type).parse();
    if let Some(error) = ret.errors.first() {
        let offset = error
            .labels
            .as_ref()
            .and_then(|labels| labels.first())
            .map(|label| label.offset());
        return Err(RenderError::Transpile(format_diagnostic(
            source,
            &error.to_string(),
            offset,
        )));
    }
    let mut program = ret.program;

    // 1. Drop `export` keywords and `react` imports
    let mut stripper = ModuleStripper::new(&allocator);
    stripper.visit_program(&mut program);
    if let Some(error) = stripper.errors.first() {
        return Err(RenderError::Transpile(format_diagnostic(source, error, None)));
    }

    // 2. Lower JSX to React.createElement calls
    let mut jsx_lowerer = JsxLowerer::new(&allocator);
    jsx_lowerer.visit_program(&mut program);

    // 3. Erase TypeScript
    let scoping = SemanticBuilder::new().build(&program).semantic.into_scoping();
    let options = TransformOptions::default();
    let transformed = Transformer::new(&allocator, Path::new(VIRTUAL_FILE_NAME), &options)
        .build_with_scoping(scoping, &mut program);
    if let Some(error) = transformed.errors.first() {
        return Err(RenderError::Transpile(format_diagnostic(
            source,
            &error.to_string(),
            None,
        )));
    }

    let code = Codegen::new().build(&program).code;
    debug!(bytes = code.len(), "transpiled component source");
    Ok(CompiledUnit { code })
}

/// `component.tsx: Unexpected token (3:14)`, with a 1-based line and 0-based
/// column when the diagnostic carries a location.
fn format_diagnostic(source: &str, message: &str, offset: Option<usize>) -> String {
    match offset {
        Some(offset) => {
            let (line, column) = line_column(source, offset);
            format!("{}: {} ({}:{})", VIRTUAL_FILE_NAME, message, line, column)
        }
        None => format!("{}: {}", VIRTUAL_FILE_NAME, message),
    }
}

fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let mut end = offset.min(source.len());
    while !source.is_char_boundary(end) {
        end -= 1;
    }
    let before = &source[..end];
    let line = before.matches('\n').count() + 1;
    let column = before
        .rfind('\n')
        .map(|newline| before[newline + 1..].chars().count())
        .unwrap_or_else(|| before.chars().count());
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_column() {
        assert_eq!(line_column("abc", 0), (1, 0));
        assert_eq!(line_column("abc\ndef", 5), (2, 1));
        assert_eq!(line_column("a\n", 99), (2, 0));
    }

    #[test]
    fn test_diagnostic_prefix() {
        let message = format_diagnostic("x", "Unexpected token", Some(0));
        assert_eq!(message, "component.tsx: Unexpected token (1:0)");
        assert_eq!(
            format_diagnostic("x", "Boom", None),
            "component.tsx: Boom"
        );
    }
}
