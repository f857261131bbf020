//! View Materialization
//!
//! Mounts the component returned by the executable unit and renders the
//! element tree it produces into an owned [`View`]. Function components are
//! called with their props under a hook frame keyed by tree position and type;
//! renders repeat until no state update is pending.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use lazy_static::lazy_static;
use tracing::{debug, warn};

use crate::pipeline::RenderOptions;
use crate::runtime::{
    format_number, run_effects, unmount_missing, Element, ErrorKind, Fault,
    Interpreter, Object, Value, FRAGMENT_SYMBOL,
};
use crate::unit::ComponentHandle;
use crate::view::{Attribute, ElementNode, View, ViewNode};

const TOO_MANY_RERENDERS: &str =
    "Too many re-renders. React limits the number of renders to prevent an infinite loop.";

lazy_static! {
    static ref VOID_TAGS: HashSet<&'static str> = [
        "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
        "source", "track", "wbr",
    ]
    .into_iter()
    .collect();

    static ref ATTRIBUTE_NAMES: HashMap<&'static str, &'static str> = [
        ("className", "class"),
        ("htmlFor", "for"),
        ("tabIndex", "tabindex"),
        ("readOnly", "readonly"),
        ("maxLength", "maxlength"),
        ("minLength", "minlength"),
        ("colSpan", "colspan"),
        ("rowSpan", "rowspan"),
        ("autoComplete", "autocomplete"),
        ("autoFocus", "autofocus"),
        ("autoPlay", "autoplay"),
        ("contentEditable", "contenteditable"),
        ("crossOrigin", "crossorigin"),
        ("dateTime", "datetime"),
        ("encType", "enctype"),
        ("formAction", "formaction"),
        ("noValidate", "novalidate"),
        ("spellCheck", "spellcheck"),
        ("srcSet", "srcset"),
        ("useMap", "usemap"),
        ("acceptCharset", "accept-charset"),
        ("httpEquiv", "http-equiv"),
        ("defaultValue", "value"),
        ("defaultChecked", "checked"),
        ("strokeWidth", "stroke-width"),
        ("strokeLinecap", "stroke-linecap"),
        ("strokeLinejoin", "stroke-linejoin"),
        ("strokeDasharray", "stroke-dasharray"),
        ("strokeOpacity", "stroke-opacity"),
        ("fillRule", "fill-rule"),
        ("fillOpacity", "fill-opacity"),
        ("clipRule", "clip-rule"),
        ("clipPath", "clip-path"),
        ("stopColor", "stop-color"),
        ("textAnchor", "text-anchor"),
        ("xlinkHref", "xlink:href"),
    ]
    .into_iter()
    .collect();

    /// CSS properties whose numeric values take no `px` suffix.
    static ref UNITLESS_CSS: HashSet<&'static str> = [
        "animationIterationCount", "aspectRatio", "borderImageOutset", "borderImageSlice",
        "borderImageWidth", "boxFlex", "boxFlexGroup", "boxOrdinalGroup", "columnCount",
        "columns", "flex", "flexGrow", "flexPositive", "flexShrink", "flexNegative",
        "flexOrder", "gridArea", "gridRow", "gridRowEnd", "gridRowSpan", "gridRowStart",
        "gridColumn", "gridColumnEnd", "gridColumnSpan", "gridColumnStart", "fontWeight",
        "lineClamp", "lineHeight", "opacity", "order", "orphans", "scale", "tabSize",
        "widows", "zIndex", "zoom", "fillOpacity", "floodOpacity", "stopOpacity",
        "strokeDasharray", "strokeDashoffset", "strokeMiterlimit", "strokeOpacity",
        "strokeWidth",
    ]
    .into_iter()
    .collect();
}

/// Renders `component` to a view, repeating passes while state updates are
/// pending and running effects between them.
pub fn materialize<'a>(
    interp: &mut Interpreter<'a>,
    component: &ComponentHandle<'a>,
    options: &RenderOptions,
) -> Result<View, Fault<'a>> {
    let root = Value::Element(Rc::new(Element {
        kind: component.value.clone(),
        key: None,
        props: Rc::new(std::cell::RefCell::new(Object::default())),
    }));

    for pass in 1..=options.max_render_passes {
        interp.hooks.start_pass();
        let mut nodes = Vec::new();
        {
            let mut renderer = Renderer {
                interp: &mut *interp,
                max_depth: options.max_call_depth,
            };
            renderer.render_node(&root, "0", 0, &mut nodes)?;
        }
        if interp.hooks.is_dirty() {
            debug!(pass, "state updated during render, rendering again");
            continue;
        }

        unmount_missing(interp)?;
        if options.run_effects {
            run_effects(interp)?;
            if interp.hooks.is_dirty() {
                debug!(pass, "state updated by an effect, rendering again");
                continue;
            }
        }
        return Ok(View::new(nodes));
    }
    Err(Fault::new(ErrorKind::Error, TOO_MANY_RERENDERS))
}

struct Renderer<'i, 'a> {
    interp: &'i mut Interpreter<'a>,
    max_depth: usize,
}

impl<'i, 'a> Renderer<'i, 'a> {
    fn render_node(
        &mut self,
        value: &Value<'a>,
        path: &str,
        depth: usize,
        out: &mut Vec<ViewNode>,
    ) -> Result<(), Fault<'a>> {
        match value {
            Value::Undefined | Value::Null | Value::Bool(_) => Ok(()),
            Value::String(text) => {
                out.push(ViewNode::text(text.as_ref()));
                Ok(())
            }
            Value::Number(n) => {
                out.push(ViewNode::text(format_number(*n)));
                Ok(())
            }
            Value::Array(items) => {
                if depth >= self.max_depth {
                    return Err(Fault::range_error("Maximum call stack size exceeded"));
                }
                self.interp.charge(items.borrow().len())?;
                let items = items.borrow().to_vec();
                for (index, child) in items.iter().enumerate() {
                    let segment = match child {
                        Value::Element(element) => match &element.key {
                            Some(key) => format!("k:{}", key),
                            None => index.to_string(),
                        },
                        _ => index.to_string(),
                    };
                    self.render_node(child, &format!("{}/{}", path, segment), depth + 1, out)?;
                }
                Ok(())
            }
            Value::Element(element) => self.render_element(element, path, depth, out),
            Value::Object(object) => {
                let keys: Vec<String> = object.borrow().keys().map(|k| k.to_string()).collect();
                Err(Fault::new(
                    ErrorKind::Error,
                    format!(
                        "Objects are not valid as a React child (found: object with keys {{{}}}). If you meant to render a collection of children, use an array instead.",
                        keys.join(", ")
                    ),
                ))
            }
            Value::Function(_) | Value::Symbol(_) => {
                warn!(child = ?value, "dropping child that is not renderable");
                Ok(())
            }
        }
    }

    fn render_element(
        &mut self,
        element: &Rc<Element<'a>>,
        path: &str,
        depth: usize,
        out: &mut Vec<ViewNode>,
    ) -> Result<(), Fault<'a>> {
        if depth >= self.max_depth {
            return Err(Fault::range_error("Maximum call stack size exceeded"));
        }
        let children = element
            .props
            .borrow()
            .get("children")
            .cloned()
            .unwrap_or(Value::Undefined);

        match &element.kind {
            Value::String(tag) => {
                let tag = tag.to_string();
                if VOID_TAGS.contains(tag.as_str()) && !children.is_nullish() {
                    return Err(Fault::new(
                        ErrorKind::Error,
                        format!(
                            "{} is a void element tag and must neither have `children` nor use `dangerouslySetInnerHTML`.",
                            tag
                        ),
                    ));
                }
                let attributes = attributes(&element.props.borrow())?;
                let mut child_nodes = Vec::new();
                self.render_node(&children, &format!("{}/{}", path, tag), depth + 1, &mut child_nodes)?;
                out.push(ViewNode::Element(ElementNode {
                    tag,
                    attributes,
                    children: child_nodes,
                }));
                Ok(())
            }
            Value::Symbol(symbol) if *symbol == FRAGMENT_SYMBOL => {
                self.render_node(&children, &format!("{}/#fragment", path), depth + 1, out)
            }
            Value::Function(callable) => {
                let name = match callable.name() {
                    name if name.is_empty() => "Anonymous".to_string(),
                    name => name,
                };
                let instance: Rc<str> = Rc::from(format!(
                    "{}/{}@{:p}",
                    path,
                    name,
                    Rc::as_ptr(callable)
                ));

                self.interp.hooks.begin_component(instance.clone());
                let props = Value::Object(element.props.clone());
                let rendered = match self.interp.call(&element.kind, Value::Undefined, vec![props]) {
                    Ok(rendered) => rendered,
                    Err(fault) => {
                        self.interp.hooks.abort_component();
                        return Err(fault);
                    }
                };
                self.interp.hooks.end_component()?;

                self.render_node(&rendered, &instance, depth + 1, out)?;
                self.interp.hooks.complete_instance(&instance);
                Ok(())
            }
            other => Err(Fault::new(ErrorKind::Error, invalid_type_message(other))),
        }
    }
}

fn invalid_type_message(kind: &Value<'_>) -> String {
    let got = match kind {
        Value::Undefined => "undefined. You likely forgot to export your component from the file it's defined in, or you might have mixed up default and named imports.".to_string(),
        Value::Null => "null.".to_string(),
        Value::Object(object) => {
            let keys: Vec<String> = object.borrow().keys().map(|k| k.to_string()).collect();
            format!("object with keys {{{}}}.", keys.join(", "))
        }
        other => format!("{}.", other.type_of()),
    };
    format!(
        "Element type is invalid: expected a string (for built-in components) or a class/function (for composite components) but got: {}",
        got
    )
}

// ═══════════════════════════════════════════════════════════════════════════════
// ATTRIBUTES
// ═══════════════════════════════════════════════════════════════════════════════

fn attributes<'a>(props: &Object<'a>) -> Result<Vec<Attribute>, Fault<'a>> {
    let mut out = Vec::new();
    for (name, value) in props.entries() {
        let name = name.as_ref();
        if matches!(
            name,
            "children" | "key" | "ref" | "dangerouslySetInnerHTML" | "suppressHydrationWarning"
        ) {
            continue;
        }
        if name == "style" {
            match value {
                Value::Object(style) => {
                    let css = style_to_css(&style.borrow());
                    if !css.is_empty() {
                        out.push(Attribute {
                            name: "style".to_string(),
                            value: css,
                        });
                    }
                }
                Value::Undefined | Value::Null => {}
                _ => {
                    return Err(Fault::new(
                        ErrorKind::Error,
                        "The `style` prop expects a mapping from style properties to values, not a string. For example, style={{marginRight: spacing + 'em'}} when using JSX.",
                    ))
                }
            }
            continue;
        }

        let stringly_boolean = name.starts_with("aria-") || name.starts_with("data-");
        let value = match value {
            Value::Undefined | Value::Null | Value::Function(_) | Value::Symbol(_) => continue,
            Value::Bool(b) if stringly_boolean => b.to_string(),
            Value::Bool(true) => String::new(),
            Value::Bool(false) => continue,
            Value::Number(n) => format_number(*n),
            other => other.to_js_string(),
        };
        let name = ATTRIBUTE_NAMES
            .get(name)
            .map(|renamed| renamed.to_string())
            .unwrap_or_else(|| name.to_string());
        out.push(Attribute { name, value });
    }
    Ok(out)
}

/// `{ fontSize: 12, color: "red" }` → `font-size: 12px; color: red`
pub fn style_to_css(style: &Object<'_>) -> String {
    let mut declarations = Vec::new();
    for (property, value) in style.entries() {
        let text = match value {
            Value::Undefined | Value::Null | Value::Bool(_) => continue,
            Value::String(s) if s.is_empty() => continue,
            Value::Number(n) if *n != 0.0 && !is_unitless(property) => {
                format!("{}px", format_number(*n))
            }
            other => other.to_js_string(),
        };
        declarations.push(format!("{}: {}", css_property_name(property), text.trim()));
    }
    declarations.join("; ")
}

fn is_unitless(property: &str) -> bool {
    property.starts_with("--") || UNITLESS_CSS.contains(property)
}

/// `backgroundColor` → `background-color`, `WebkitTransition` →
/// `-webkit-transition`, `msFlex` → `-ms-flex`; custom properties unchanged.
pub fn css_property_name(property: &str) -> String {
    if property.starts_with("--") {
        return property.to_string();
    }
    let mut out = String::with_capacity(property.len() + 4);
    if property.starts_with("ms") && property[2..].starts_with(|c: char| c.is_ascii_uppercase()) {
        out.push('-');
    }
    for c in property.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_property_name() {
        assert_eq!(css_property_name("backgroundColor"), "background-color");
        assert_eq!(css_property_name("WebkitTransition"), "-webkit-transition");
        assert_eq!(css_property_name("msFlex"), "-ms-flex");
        assert_eq!(css_property_name("--brand"), "--brand");
        assert_eq!(css_property_name("color"), "color");
    }

    #[test]
    fn test_style_to_css() {
        let mut style = Object::default();
        style.set("color", Value::string("red"));
        style.set("fontSize", Value::Number(12.0));
        style.set("lineHeight", Value::Number(1.5));
        style.set("margin", Value::Number(0.0));
        style.set("display", Value::Null);
        assert_eq!(
            style_to_css(&style),
            "color: red; font-size: 12px; line-height: 1.5; margin: 0"
        );
    }

    #[test]
    fn test_attributes_rename_and_omit() {
        let mut props = Object::default();
        props.set("className", Value::string("card"));
        props.set("htmlFor", Value::string("name"));
        props.set("disabled", Value::Bool(true));
        props.set("hidden", Value::Bool(false));
        props.set("aria-hidden", Value::Bool(true));
        props.set("tabIndex", Value::Number(0.0));
        props.set("children", Value::string("x"));
        let attrs = attributes(&props).unwrap();
        let pairs: Vec<(&str, &str)> = attrs
            .iter()
            .map(|a| (a.name.as_str(), a.value.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("class", "card"),
                ("for", "name"),
                ("disabled", ""),
                ("aria-hidden", "true"),
                ("tabindex", "0"),
            ]
        );
    }
}
