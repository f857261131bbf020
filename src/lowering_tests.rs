#[cfg(test)]
mod tests {
    use crate::jsx_lowerer::{clean_jsx_text, decode_entities};
    use crate::pipeline::RenderError;
    use crate::transpile::transpile;

    fn compile(source: &str) -> String {
        match transpile(source) {
            Ok(unit) => unit.code,
            Err(e) => panic!("transpile failed: {}", e),
        }
    }

    #[test]
    fn test_host_element_lowering() {
        let code = compile("const el = <h1 className=\"title\">Hi</h1>;");
        assert!(code.contains("React.createElement("), "{}", code);
        assert!(code.contains("\"h1\""), "{}", code);
        assert!(code.contains("className"), "{}", code);
        assert!(code.contains("\"Hi\""), "{}", code);
        assert!(!code.contains("<h1"), "{}", code);
    }

    #[test]
    fn test_component_reference_is_not_quoted() {
        let code = compile("const el = <Card.Header title={x} />;");
        assert!(code.contains("React.createElement(Card.Header"), "{}", code);
        assert!(!code.contains("\"Card"), "{}", code);
    }

    #[test]
    fn test_props_without_attributes_are_null() {
        let code = compile("const el = <br />;");
        assert!(code.contains("React.createElement(\"br\", null)"), "{}", code);
    }

    #[test]
    fn test_fragment_lowering() {
        let code = compile("const el = <><i /></>;");
        assert!(code.contains("React.createElement(React.Fragment, null"), "{}", code);
    }

    #[test]
    fn test_spread_and_hyphenated_attributes() {
        let code = compile("const el = <div {...rest} data-id=\"7\" aria-label=\"x\" />;");
        assert!(code.contains("...rest"), "{}", code);
        assert!(code.contains("\"data-id\""), "{}", code);
        assert!(code.contains("\"aria-label\""), "{}", code);
    }

    #[test]
    fn test_custom_elements_are_strings() {
        let code = compile("const el = <my-widget />;");
        assert!(code.contains("\"my-widget\""), "{}", code);
    }

    #[test]
    fn test_types_are_erased() {
        let code = compile(
            "interface P { a: number }\ntype T = string;\nconst x: number = (1 as number);\nfunction f<T>(v: T): T { return v!; }",
        );
        assert!(!code.contains("interface"), "{}", code);
        assert!(!code.contains(": number"), "{}", code);
        assert!(!code.contains(" as "), "{}", code);
        assert!(code.contains("function f(v)"), "{}", code);
    }

    #[test]
    fn test_exports_are_unwrapped() {
        let code = compile(
            "import React from 'react';\nexport const a = 1;\nexport default function Component() { return null; }",
        );
        assert!(!code.contains("import"), "{}", code);
        assert!(!code.contains("export"), "{}", code);
        assert!(code.contains("const a = 1"), "{}", code);
        assert!(code.contains("function Component()"), "{}", code);
    }

    #[test]
    fn test_reexports_are_rejected() {
        let err = transpile("export * from './other';").expect_err("re-export");
        assert!(matches!(err, RenderError::Transpile(_)));
        assert!(err.to_string().starts_with("component.tsx: "));
    }

    #[test]
    fn test_syntax_error_location() {
        let err = transpile("const a = 1;\nconst = 2;").expect_err("syntax error");
        let message = err.to_string();
        assert!(message.starts_with("component.tsx: "), "{}", message);
        assert!(message.contains("(2:"), "{}", message);
    }

    #[test]
    fn test_jsx_text_whitespace() {
        assert_eq!(clean_jsx_text("Hello"), Some("Hello".to_string()));
        assert_eq!(clean_jsx_text("\n    \n  "), None);
        assert_eq!(
            clean_jsx_text("\n  Hello\n  world  \n"),
            Some("Hello world".to_string())
        );
        assert_eq!(clean_jsx_text("  a  "), Some("  a  ".to_string()));
    }

    #[test]
    fn test_entity_decoding() {
        assert_eq!(decode_entities("a &amp; b"), "a & b");
        assert_eq!(decode_entities("&rarr; &#65;&#x42;"), "→ AB");
        assert_eq!(decode_entities("&nbsp;"), "\u{a0}");
        assert_eq!(decode_entities("&bogus;"), "&bogus;");
    }
}
