// ABOUTME: Hand-rolled HTML5 serializer for node subtrees.
// ABOUTME: Handles void elements, raw-text elements, and text/attribute escaping.

use ego_tree::{NodeId, NodeRef, Tree};

use crate::node::Node;

/// Elements serialized without children or an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose text children are emitted without escaping.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Serializes the subtree rooted at `id` (outer HTML). Document and fragment
/// roots serialize as their children.
pub fn serialize_node(tree: &Tree<Node>, id: NodeId) -> String {
    let mut out = String::new();
    if let Some(node) = tree.get(id) {
        write_node(&node, &mut out);
    }
    out
}

/// Serializes only the children of `id` (inner HTML).
pub fn serialize_children(tree: &Tree<Node>, id: NodeId) -> String {
    let mut out = String::new();
    if let Some(node) = tree.get(id) {
        for child in node.children() {
            write_node(&child, &mut out);
        }
    }
    out
}

fn write_node(node: &NodeRef<'_, Node>, out: &mut String) {
    match node.value() {
        Node::Document | Node::Fragment => {
            for child in node.children() {
                write_node(&child, out);
            }
        }
        Node::Doctype(doctype) => {
            out.push_str("<!DOCTYPE ");
            out.push_str(&doctype.name);
            if !doctype.public_id.is_empty() {
                out.push_str(" PUBLIC \"");
                out.push_str(&doctype.public_id);
                out.push('"');
                if !doctype.system_id.is_empty() {
                    out.push_str(" \"");
                    out.push_str(&doctype.system_id);
                    out.push('"');
                }
            } else if !doctype.system_id.is_empty() {
                out.push_str(" SYSTEM \"");
                out.push_str(&doctype.system_id);
                out.push('"');
            }
            out.push('>');
        }
        Node::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        Node::Text(text) => escape_text(text, out),
        Node::Element(el) => {
            out.push('<');
            out.push_str(&el.name);
            for attr in el.attrs() {
                out.push(' ');
                out.push_str(&attr.name);
                out.push_str("=\"");
                escape_attribute(&attr.value, out);
                out.push('"');
            }
            out.push('>');
            if VOID_ELEMENTS.contains(&el.name.as_str()) {
                return;
            }
            if RAW_TEXT_ELEMENTS.contains(&el.name.as_str()) {
                for child in node.children() {
                    if let Node::Text(text) = child.value() {
                        out.push_str(text);
                    }
                }
            } else {
                for child in node.children() {
                    write_node(&child, out);
                }
            }
            out.push_str("</");
            out.push_str(&el.name);
            out.push('>');
        }
    }
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn escape_attribute(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}
