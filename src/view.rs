//! View Model for the Preview Surface
//!
//! A [`View`] is the materialized output of a successful render cycle: an owned
//! tree of host elements and text. It holds no references into the executed
//! program, so it outlives the cycle (and the arena) that produced it.

use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// VIEW TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct View {
    pub nodes: Vec<ViewNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ViewNode {
    Element(ElementNode),
    Text(TextNode),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementNode {
    pub tag: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<ViewNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextNode {
    pub value: String,
}

impl View {
    pub fn new(nodes: Vec<ViewNode>) -> Self {
        Self { nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Concatenated text of every text node, in document order.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            node.collect_text(&mut out);
        }
        out
    }

    /// Depth-first search for the first element with the given tag.
    pub fn find_element(&self, tag: &str) -> Option<&ElementNode> {
        self.nodes.iter().find_map(|node| node.find_element(tag))
    }

    /// Number of elements with the given tag anywhere in the tree.
    pub fn count_elements(&self, tag: &str) -> usize {
        self.nodes.iter().map(|node| node.count_elements(tag)).sum()
    }
}

impl ViewNode {
    pub fn text(value: impl Into<String>) -> Self {
        ViewNode::Text(TextNode {
            value: value.into(),
        })
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            ViewNode::Text(text) => out.push_str(&text.value),
            ViewNode::Element(element) => {
                for child in &element.children {
                    child.collect_text(out);
                }
            }
        }
    }

    fn find_element(&self, tag: &str) -> Option<&ElementNode> {
        match self {
            ViewNode::Text(_) => None,
            ViewNode::Element(element) if element.tag == tag => Some(element),
            ViewNode::Element(element) => element
                .children
                .iter()
                .find_map(|child| child.find_element(tag)),
        }
    }

    fn count_elements(&self, tag: &str) -> usize {
        match self {
            ViewNode::Text(_) => 0,
            ViewNode::Element(element) => {
                let own = usize::from(element.tag == tag);
                own + element
                    .children
                    .iter()
                    .map(|child| child.count_elements(tag))
                    .sum::<usize>()
            }
        }
    }
}

impl ElementNode {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.collect_text(&mut out);
        }
        out
    }
}
