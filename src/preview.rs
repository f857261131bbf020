//! Preview Surface
//!
//! Turns the latest [`RenderResult`] into something a host can show: HTML for
//! browser hosts (built as an html5ever DOM and serialized, so escaping is the
//! serializer's job) and a plain-text layout for the terminal playground.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use html5ever::serialize::{serialize, SerializeOpts, TraversalScope};
use html5ever::{Attribute as HtmlAttribute, LocalName, Namespace, QualName};
use lazy_static::lazy_static;
use markup5ever_rcdom::{Handle, Node, NodeData, SerializableHandle};
use tendril::StrTendril;

use crate::pipeline::RenderResult;
use crate::view::{ElementNode, View, ViewNode};

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

lazy_static! {
    static ref BLOCK_TAGS: HashSet<&'static str> = [
        "address", "article", "aside", "blockquote", "dd", "details", "dialog", "div", "dl",
        "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4",
        "h5", "h6", "header", "main", "nav", "ol", "p", "pre", "section", "summary", "table",
        "tbody", "thead", "tfoot", "ul",
    ]
    .into_iter()
    .collect();
}

// ═══════════════════════════════════════════════════════════════════════════════
// HTML
// ═══════════════════════════════════════════════════════════════════════════════

/// `Success` → the view in a scrollable container; `Failure` → the message as
/// red preformatted text.
pub fn render_html(result: &RenderResult) -> String {
    let document = Node::new(NodeData::Document);
    let container = match result {
        RenderResult::Success(view) => {
            let container = element(
                "div",
                &[("class", "preview-surface"), ("style", "overflow: auto")],
            );
            for node in &view.nodes {
                append(&container, view_node(node));
            }
            container
        }
        RenderResult::Failure(message) => {
            let pre = element("pre", &[("class", "text-red-500")]);
            append(&pre, text(message));
            pre
        }
    };
    append(&document, container);
    serialize_children(&document)
}

/// Serializes just the view, without the preview container.
pub fn view_to_html(view: &View) -> String {
    let document = Node::new(NodeData::Document);
    for node in &view.nodes {
        append(&document, view_node(node));
    }
    serialize_children(&document)
}

fn serialize_children(document: &Handle) -> String {
    let mut out = Vec::new();
    let handle = SerializableHandle::from(document.clone());
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::ChildrenOnly(None),
        ..Default::default()
    };
    // Writing into a Vec cannot fail.
    if serialize(&mut out, &handle, opts).is_err() {
        return String::new();
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn view_node(node: &ViewNode) -> Handle {
    match node {
        ViewNode::Text(t) => text(&t.value),
        ViewNode::Element(el) => {
            let attrs: Vec<(&str, &str)> = el
                .attributes
                .iter()
                .map(|attr| (attr.name.as_str(), attr.value.as_str()))
                .collect();
            let handle = element(&el.tag, &attrs);
            for child in &el.children {
                append(&handle, view_node(child));
            }
            handle
        }
    }
}

fn element(tag: &str, attrs: &[(&str, &str)]) -> Handle {
    let attrs = attrs
        .iter()
        .map(|(name, value)| HtmlAttribute {
            name: QualName::new(None, Namespace::from(""), LocalName::from(*name)),
            value: StrTendril::from_slice(value),
        })
        .collect();
    Node::new(NodeData::Element {
        name: QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from(tag)),
        attrs: RefCell::new(attrs),
        template_contents: RefCell::new(None),
        mathml_annotation_xml_integration_point: false,
    })
}

fn text(value: &str) -> Handle {
    Node::new(NodeData::Text {
        contents: RefCell::new(StrTendril::from_slice(value)),
    })
}

fn append(parent: &Handle, child: Handle) {
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().push(child);
}

// ═══════════════════════════════════════════════════════════════════════════════
// TEXT LAYOUT
// ═══════════════════════════════════════════════════════════════════════════════

/// Lays the view out as plain text: block elements start new lines, table
/// rows become `cell | cell` lines, list items get a bullet.
pub fn render_text(view: &View) -> String {
    let mut layout = TextLayout::default();
    for node in &view.nodes {
        layout.node(node);
    }
    layout.finish()
}

#[derive(Default)]
struct TextLayout {
    lines: Vec<String>,
    current: String,
}

impl TextLayout {
    fn node(&mut self, node: &ViewNode) {
        match node {
            ViewNode::Text(t) => self.push_text(&t.value),
            ViewNode::Element(el) => self.element(el),
        }
    }

    fn element(&mut self, el: &ElementNode) {
        match el.tag.as_str() {
            "br" => self.break_line(),
            "hr" => {
                self.break_line();
                self.lines.push("─".repeat(24));
            }
            "tr" => {
                self.break_line();
                let cells: Vec<String> = el
                    .children
                    .iter()
                    .filter_map(|child| match child {
                        ViewNode::Element(cell) => Some(collapse(&cell.text_content())),
                        ViewNode::Text(_) => None,
                    })
                    .collect();
                self.lines.push(cells.join(" | "));
            }
            "li" => {
                self.break_line();
                self.current.push_str("• ");
                self.children(el);
                self.break_line();
            }
            "img" => {
                if let Some(alt) = el.attribute("alt") {
                    self.push_text(&format!("[{}]", alt));
                }
            }
            "input" | "textarea" => {
                let shown = el
                    .attribute("value")
                    .or_else(|| el.attribute("placeholder"))
                    .unwrap_or_default();
                self.push_text(&format!("[{}]", shown));
            }
            "button" => {
                self.push_text("[ ");
                self.children(el);
                self.push_text(" ]");
            }
            "script" | "style" | "head" | "title" => {}
            tag if BLOCK_TAGS.contains(tag) => {
                self.break_line();
                self.children(el);
                self.break_line();
            }
            _ => self.children(el),
        }
    }

    fn children(&mut self, el: &ElementNode) {
        for child in &el.children {
            self.node(child);
        }
    }

    fn push_text(&mut self, value: &str) {
        for c in value.chars() {
            if c.is_whitespace() {
                if !self.current.is_empty() && !self.current.ends_with(' ') {
                    self.current.push(' ');
                }
            } else {
                self.current.push(c);
            }
        }
    }

    fn break_line(&mut self) {
        let line = self.current.trim();
        if !line.is_empty() {
            self.lines.push(line.to_string());
        }
        self.current.clear();
    }

    fn finish(mut self) -> String {
        self.break_line();
        self.lines.join("\n")
    }
}

fn collapse(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Indented element tree, one node per line.
pub fn render_tree(view: &View) -> String {
    let mut out = String::new();
    for node in &view.nodes {
        tree_node(node, 0, &mut out);
    }
    out
}

fn tree_node(node: &ViewNode, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    match node {
        ViewNode::Text(t) => {
            let text = collapse(&t.value);
            if !text.is_empty() {
                out.push_str(&format!("{}\"{}\"\n", indent, text));
            }
        }
        ViewNode::Element(el) => {
            let attrs: String = el
                .attributes
                .iter()
                .map(|attr| format!(" {}=\"{}\"", attr.name, attr.value))
                .collect();
            out.push_str(&format!("{}<{}{}>\n", indent, el.tag, attrs));
            for child in &el.children {
                tree_node(child, depth + 1, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{Attribute, TextNode};

    fn el(tag: &str, attributes: Vec<Attribute>, children: Vec<ViewNode>) -> ViewNode {
        ViewNode::Element(ElementNode {
            tag: tag.to_string(),
            attributes,
            children,
        })
    }

    fn txt(value: &str) -> ViewNode {
        ViewNode::Text(TextNode {
            value: value.to_string(),
        })
    }

    #[test]
    fn test_failure_html_is_escaped() {
        let html = render_html(&RenderResult::Failure("a < b & c".to_string()));
        assert_eq!(html, "<pre class=\"text-red-500\">a &lt; b &amp; c</pre>");
    }

    #[test]
    fn test_success_html_wraps_view() {
        let view = View::new(vec![el("h1", vec![], vec![txt("Hi")])]);
        let html = render_html(&RenderResult::Success(view));
        assert_eq!(
            html,
            "<div class=\"preview-surface\" style=\"overflow: auto\"><h1>Hi</h1></div>"
        );
    }

    #[test]
    fn test_void_elements_serialize_without_close_tag() {
        let view = View::new(vec![el(
            "div",
            vec![],
            vec![
                txt("a"),
                el("br", vec![], vec![]),
                el(
                    "input",
                    vec![Attribute {
                        name: "value".to_string(),
                        value: "x\"y".to_string(),
                    }],
                    vec![],
                ),
            ],
        )]);
        assert_eq!(view_to_html(&view), "<div>a<br><input value=\"x&quot;y\"></div>");
    }

    #[test]
    fn test_text_layout() {
        let row = |a: &str, b: &str| {
            el(
                "tr",
                vec![],
                vec![el("td", vec![], vec![txt(a)]), el("td", vec![], vec![txt(b)])],
            )
        };
        let view = View::new(vec![el(
            "div",
            vec![],
            vec![
                el("h1", vec![], vec![txt("Invoice")]),
                el("table", vec![], vec![el("tbody", vec![], vec![row("Item", "$10"), row("Tax", "$1")])]),
                el(
                    "ul",
                    vec![],
                    vec![el("li", vec![], vec![txt("one")]), el("li", vec![], vec![txt("  two  ")])],
                ),
                txt("Total:"),
                el("span", vec![], vec![txt(" $11")]),
            ],
        )]);
        assert_eq!(
            render_text(&view),
            "Invoice\nItem | $10\nTax | $1\n• one\n• two\nTotal: $11"
        );
    }

    #[test]
    fn test_tree_outline() {
        let view = View::new(vec![el(
            "p",
            vec![Attribute {
                name: "class".to_string(),
                value: "note".to_string(),
            }],
            vec![txt("hello   world")],
        )]);
        assert_eq!(render_tree(&view), "<p class=\"note\">\n  \"hello world\"\n");
    }
}
