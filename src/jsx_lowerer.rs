//! JSX/Module Lowering for the Component Playground

use std::collections::HashMap;

use lazy_static::lazy_static;
use oxc_allocator::{Allocator, Box as oxc_box, CloneIn};
use oxc_ast::ast::*;
use oxc_ast::AstBuilder;
use oxc_ast_visit::walk_mut::walk_expression;
use oxc_ast_visit::VisitMut;
use oxc_span::SPAN;
use regex::{Captures, Regex};

// ═══════════════════════════════════════════════════════════════════════════════
// JSX LOWERER
// Transforms JSX elements into React.createElement() calls (classic runtime)
// ═══════════════════════════════════════════════════════════════════════════════

pub struct JsxLowerer<'a> {
    pub ast: AstBuilder<'a>,
}

impl<'a> JsxLowerer<'a> {
    pub fn new(allocator: &'a Allocator) -> Self {
        Self {
            ast: AstBuilder::new(allocator),
        }
    }

    fn lower_jsx_element(&mut self, element: &JSXElement<'a>) -> Expression<'a> {
        let element_type = self.element_type(&element.opening_element.name);

        let mut props = self.ast.vec();
        for item in &element.opening_element.attributes {
            match item {
                JSXAttributeItem::Attribute(attr) => {
                    let name = match &attr.name {
                        JSXAttributeName::Identifier(id) => id.name.to_string(),
                        JSXAttributeName::NamespacedName(ns) => {
                            format!("{}:{}", ns.namespace.name, ns.name.name)
                        }
                    };

                    let value = match &attr.value {
                        Some(JSXAttributeValue::StringLiteral(s)) => {
                            let decoded = decode_entities(s.value.as_str());
                            let atom = self.ast.allocator.alloc_str(&decoded);
                            self.ast.expression_string_literal(SPAN, atom, None)
                        }
                        Some(JSXAttributeValue::Element(el)) => self.lower_jsx_element(el),
                        Some(JSXAttributeValue::ExpressionContainer(container)) => {
                            self.lower_jsx_expression(&container.expression)
                        }
                        Some(JSXAttributeValue::Fragment(frag)) => self.lower_jsx_fragment(frag),
                        None => self.ast.expression_boolean_literal(SPAN, true),
                    };

                    props.push(self.ast.object_property_kind_object_property(
                        SPAN,
                        PropertyKind::Init,
                        self.property_key(&name),
                        value,
                        false,
                        false,
                        false,
                    ));
                }
                JSXAttributeItem::SpreadAttribute(spread) => {
                    let mut spread_expr = spread.argument.clone_in(self.ast.allocator);
                    self.visit_expression(&mut spread_expr);
                    props.push(self.ast.object_property_kind_spread_property(SPAN, spread_expr));
                }
            }
        }

        let props_expr = if props.is_empty() {
            self.ast.expression_null_literal(SPAN)
        } else {
            self.ast.expression_object(SPAN, props)
        };

        self.create_element_call(element_type, props_expr, &element.children)
    }

    fn lower_jsx_fragment(&mut self, fragment: &JSXFragment<'a>) -> Expression<'a> {
        let fragment_type = self.react_member("Fragment");
        let props = self.ast.expression_null_literal(SPAN);
        self.create_element_call(fragment_type, props, &fragment.children)
    }

    /// `React.createElement(type, props, ...children)`
    fn create_element_call(
        &mut self,
        element_type: Expression<'a>,
        props: Expression<'a>,
        children: &oxc_allocator::Vec<'a, JSXChild<'a>>,
    ) -> Expression<'a> {
        let mut args = self.ast.vec();
        args.push(Argument::from(element_type));
        args.push(Argument::from(props));

        for child in children {
            match child {
                JSXChild::Text(t) => {
                    if let Some(text) = clean_jsx_text(t.value.as_str()) {
                        let atom = self.ast.allocator.alloc_str(&text);
                        args.push(Argument::from(
                            self.ast.expression_string_literal(SPAN, atom, None),
                        ));
                    }
                }
                JSXChild::Element(el) => {
                    args.push(Argument::from(self.lower_jsx_element(el)));
                }
                JSXChild::Fragment(frag) => {
                    args.push(Argument::from(self.lower_jsx_fragment(frag)));
                }
                JSXChild::ExpressionContainer(container) => {
                    // `{/* comment */}` contributes nothing
                    if container.expression.as_expression().is_some() {
                        args.push(Argument::from(
                            self.lower_jsx_expression(&container.expression),
                        ));
                    }
                }
                JSXChild::Spread(spread) => {
                    let mut arg = spread.expression.clone_in(self.ast.allocator);
                    self.visit_expression(&mut arg);
                    args.push(self.ast.argument_spread_element(SPAN, arg));
                }
            }
        }

        let callee = self.react_member("createElement");
        self.ast.expression_call(
            SPAN,
            callee,
            None::<oxc_box<TSTypeParameterInstantiation>>,
            args,
            false,
        )
    }

    fn react_member(&self, name: &'static str) -> Expression<'a> {
        Expression::from(self.ast.member_expression_static(
            SPAN,
            self.ast.expression_identifier(SPAN, "React"),
            self.ast.identifier_name(SPAN, name),
            false,
        ))
    }

    fn property_key(&self, name: &str) -> PropertyKey<'a> {
        let atom = self.ast.allocator.alloc_str(name);
        if is_identifier_name(name) {
            self.ast.property_key_static_identifier(SPAN, atom)
        } else {
            PropertyKey::StringLiteral(self.ast.alloc_string_literal(SPAN, atom, None))
        }
    }

    /// Lowercase and namespaced tags are intrinsic (string) types; anything
    /// else refers to a binding in scope.
    fn element_type(&self, name: &JSXElementName<'a>) -> Expression<'a> {
        match name {
            JSXElementName::Identifier(id) => {
                let atom = self.ast.allocator.alloc_str(id.name.as_str());
                self.ast.expression_string_literal(SPAN, atom, None)
            }
            JSXElementName::IdentifierReference(id) => {
                let name = id.name.as_str();
                if is_intrinsic_tag(name) {
                    self.ast.expression_string_literal(SPAN, id.name, None)
                } else {
                    self.ast.expression_identifier(SPAN, id.name)
                }
            }
            JSXElementName::NamespacedName(ns) => {
                let full = format!("{}:{}", ns.namespace.name, ns.name.name);
                let atom = self.ast.allocator.alloc_str(&full);
                self.ast.expression_string_literal(SPAN, atom, None)
            }
            JSXElementName::MemberExpression(me) => self.member_type(me),
            JSXElementName::ThisExpression(_) => self.ast.expression_this(SPAN),
        }
    }

    fn member_type(&self, me: &JSXMemberExpression<'a>) -> Expression<'a> {
        let object = match &me.object {
            JSXMemberExpressionObject::IdentifierReference(id) => {
                self.ast.expression_identifier(SPAN, id.name)
            }
            JSXMemberExpressionObject::MemberExpression(inner) => self.member_type(inner),
            JSXMemberExpressionObject::ThisExpression(_) => self.ast.expression_this(SPAN),
        };
        Expression::from(self.ast.member_expression_static(
            SPAN,
            object,
            self.ast.identifier_name(SPAN, me.property.name),
            false,
        ))
    }

    fn lower_jsx_expression(&mut self, jsx_expr: &JSXExpression<'a>) -> Expression<'a> {
        if let Some(mut e) = jsx_expr
            .as_expression()
            .map(|e| e.clone_in(self.ast.allocator))
        {
            self.visit_expression(&mut e);
            e
        } else {
            self.ast.expression_identifier(SPAN, "undefined")
        }
    }
}

impl<'a> VisitMut<'a> for JsxLowerer<'a> {
    fn visit_expression(&mut self, expr: &mut Expression<'a>) {
        match expr {
            Expression::JSXElement(element) => {
                let lowered = self.lower_jsx_element(element);
                *expr = lowered;
            }
            Expression::JSXFragment(fragment) => {
                let lowered = self.lower_jsx_fragment(fragment);
                *expr = lowered;
            }
            _ => {
                walk_expression(self, expr);
            }
        }
    }
}

fn is_intrinsic_tag(name: &str) -> bool {
    name.starts_with(|c: char| c.is_ascii_lowercase()) || name.contains('-')
}

fn is_identifier_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

// ═══════════════════════════════════════════════════════════════════════════════
// JSX TEXT
// ═══════════════════════════════════════════════════════════════════════════════

/// Applies the JSX whitespace rules to a text child: each line is trimmed
/// (the first keeps its leading space, the last its trailing space), blank
/// lines are dropped and the rest are joined with a single space. Returns
/// `None` when nothing remains.
pub fn clean_jsx_text(raw: &str) -> Option<String> {
    let lines: Vec<&str> = raw.split("\r\n").flat_map(|l| l.split(['\n', '\r'])).collect();
    let last_non_empty = lines
        .iter()
        .rposition(|line| line.chars().any(|c| c != ' ' && c != '\t'));

    let mut out = String::new();
    for (index, line) in lines.iter().enumerate() {
        let mut trimmed = line.replace('\t', " ");
        if index != 0 {
            trimmed = trimmed.trim_start_matches(' ').to_string();
        }
        if index != lines.len() - 1 {
            trimmed = trimmed.trim_end_matches(' ').to_string();
        }
        if trimmed.is_empty() {
            continue;
        }
        out.push_str(&trimmed);
        if Some(index) != last_non_empty {
            out.push(' ');
        }
    }

    if out.is_empty() {
        None
    } else {
        Some(decode_entities(&out))
    }
}

lazy_static! {
    static ref ENTITY: Regex =
        Regex::new(r"&(?:#[xX]([0-9a-fA-F]+)|#([0-9]+)|([A-Za-z][A-Za-z0-9]*));").unwrap();
    static ref NAMED_ENTITIES: HashMap<&'static str, char> = [
        ("amp", '&'),
        ("lt", '<'),
        ("gt", '>'),
        ("quot", '"'),
        ("apos", '\''),
        ("nbsp", '\u{a0}'),
        ("copy", '©'),
        ("reg", '®'),
        ("trade", '™'),
        ("hellip", '…'),
        ("mdash", '—'),
        ("ndash", '–'),
        ("lsquo", '‘'),
        ("rsquo", '’'),
        ("ldquo", '“'),
        ("rdquo", '”'),
        ("laquo", '«'),
        ("raquo", '»'),
        ("bull", '•'),
        ("middot", '·'),
        ("times", '×'),
        ("divide", '÷'),
        ("plusmn", '±'),
        ("deg", '°'),
        ("euro", '€'),
        ("pound", '£'),
        ("yen", '¥'),
        ("cent", '¢'),
        ("sect", '§'),
        ("para", '¶'),
        ("larr", '←'),
        ("rarr", '→'),
        ("uarr", '↑'),
        ("darr", '↓'),
        ("harr", '↔'),
        ("lArr", '⇐'),
        ("rArr", '⇒'),
        ("check", '✓'),
        ("hearts", '♥'),
        ("star", '☆'),
        ("infin", '∞'),
        ("ne", '≠'),
        ("le", '≤'),
        ("ge", '≥'),
        ("frac12", '½'),
        ("frac14", '¼'),
        ("frac34", '¾'),
        ("shy", '\u{ad}'),
        ("zwj", '\u{200d}'),
        ("zwnj", '\u{200c}'),
    ]
    .into_iter()
    .collect();
}

/// Decodes HTML character references; unknown names are left untouched.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    ENTITY
        .replace_all(text, |caps: &Captures| {
            let decoded = if let Some(hex) = caps.get(1) {
                u32::from_str_radix(hex.as_str(), 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = caps.get(2) {
                dec.as_str().parse::<u32>().ok().and_then(char::from_u32)
            } else {
                caps.get(3)
                    .and_then(|name| NAMED_ENTITIES.get(name.as_str()).copied())
            };
            match decoded {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

// ═══════════════════════════════════════════════════════════════════════════════
// MODULE STRIPPER
// Drops `export` keywords and `react` imports; other imports are errors
// ═══════════════════════════════════════════════════════════════════════════════

pub struct ModuleStripper<'a> {
    pub ast: AstBuilder<'a>,
    pub errors: Vec<String>,
}

impl<'a> ModuleStripper<'a> {
    pub fn new(allocator: &'a Allocator) -> Self {
        Self {
            ast: AstBuilder::new(allocator),
            errors: Vec::new(),
        }
    }

    fn strip(&mut self, statement: Statement<'a>) -> Option<Statement<'a>> {
        match statement {
            Statement::ImportDeclaration(import) => {
                let source = import.source.value.as_str();
                if source != "react" && import.import_kind.is_value() {
                    self.errors.push(format!(
                        "Cannot import from '{}': module imports are not supported in the playground",
                        source
                    ));
                }
                None
            }
            Statement::ExportNamedDeclaration(export) => {
                if export.source.is_some() {
                    self.errors.push(
                        "Re-exports are not supported in the playground".to_string(),
                    );
                }
                export.unbox().declaration.map(Statement::from)
            }
            Statement::ExportDefaultDeclaration(export) => match export.unbox().declaration {
                ExportDefaultDeclarationKind::FunctionDeclaration(function) => {
                    Some(Statement::FunctionDeclaration(function))
                }
                ExportDefaultDeclarationKind::ClassDeclaration(class) => {
                    Some(Statement::ClassDeclaration(class))
                }
                ExportDefaultDeclarationKind::TSInterfaceDeclaration(_) => None,
                kind => Expression::try_from(kind)
                    .ok()
                    .map(|expression| self.ast.statement_expression(SPAN, expression)),
            },
            Statement::ExportAllDeclaration(_) => {
                self.errors
                    .push("Re-exports are not supported in the playground".to_string());
                None
            }
            Statement::TSExportAssignment(_) | Statement::TSNamespaceExportDeclaration(_) => None,
            other => Some(other),
        }
    }
}

impl<'a> VisitMut<'a> for ModuleStripper<'a> {
    fn visit_program(&mut self, program: &mut Program<'a>) {
        let body = std::mem::replace(&mut program.body, self.ast.vec());
        for statement in body {
            if let Some(kept) = self.strip(statement) {
                program.body.push(kept);
            }
        }
    }
}
