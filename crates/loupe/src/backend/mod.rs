// ABOUTME: Backend adapter contract plus the default html5ever-based implementation.
// ABOUTME: Converts text to a node tree and node trees back to text; selections stay backend-agnostic.

//! Pluggable parse/render backends.
//!
//! A selection delegates all text-to-tree and tree-to-text work to a
//! [`Backend`]. The query and mutation logic never depends on which concrete
//! parser or serializer is installed, so swapping grammars is a construction
//! choice, not a type-hierarchy choice. [`HtmlBackend`] is the default:
//! html5ever for parsing, a hand-rolled HTML5 serializer for rendering.

mod serializer;
mod sink;

use ego_tree::{NodeId, Tree};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{namespace_url, ns, LocalName, ParseOpts, QualName};

use crate::document::Document;
use crate::error::Result;
use crate::node::Node;

pub use serializer::{serialize_children, serialize_node};

/// The pair of conversions a selection needs from its markup grammar.
pub trait Backend {
    /// Parses `content` into a new document tree.
    ///
    /// `is_document` selects full-document mode; fragment mode must not
    /// synthesize the structural wrappers (`html`/`head`/`body`) a
    /// full-document parse would add. `context` names the insertion-target
    /// element for context-sensitive fragments (`tr`, `option`, ...).
    fn parse(
        &self,
        content: &str,
        options: &crate::options::Options,
        is_document: bool,
        context: Option<&str>,
    ) -> Result<Document>;

    /// Serializes `nodes` (subtrees of `tree`), concatenated in slot order.
    fn render(&self, tree: &Tree<Node>, nodes: &[NodeId]) -> String;
}

/// Default backend: html5ever parsing into the ego-tree arena.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlBackend;

impl HtmlBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Backend for HtmlBackend {
    fn parse(
        &self,
        content: &str,
        options: &crate::options::Options,
        is_document: bool,
        context: Option<&str>,
    ) -> Result<Document> {
        tracing::debug!(bytes = content.len(), is_document, "parsing html");
        let mut tree = if is_document {
            html5ever::parse_document(sink::DomSink::new(), ParseOpts::default())
                .one(StrTendril::from(content))
        } else {
            let context_name = QualName::new(
                None,
                ns!(html),
                LocalName::from(context.unwrap_or("body")),
            );
            html5ever::parse_fragment(
                sink::DomSink::new(),
                ParseOpts::default(),
                context_name,
                Vec::new(),
            )
            .one(StrTendril::from(content))
        };
        if !is_document {
            lift_fragment(&mut tree);
        }
        if !options.keep_whitespace {
            drop_whitespace_text(&mut tree);
        }
        Ok(Document::new(tree))
    }

    fn render(&self, tree: &Tree<Node>, nodes: &[NodeId]) -> String {
        tracing::debug!(nodes = nodes.len(), "rendering html");
        let mut out = String::new();
        for id in nodes {
            out.push_str(&serialize_node(tree, *id));
        }
        out
    }
}

/// Fragment parses come back as `document > html > actual nodes`; lift the
/// actual nodes to the root and retag it as a fragment so no synthesized
/// wrapper is observable.
fn lift_fragment(tree: &mut Tree<Node>) {
    *tree.root_mut().value() = Node::Fragment;
    let root_id = tree.root().id();
    let wrapper = tree
        .root()
        .children()
        .find(|c| c.value().as_element().is_some_and(|e| e.name == "html"))
        .map(|c| c.id());
    let Some(wrapper) = wrapper else { return };
    let children: Vec<NodeId> = match tree.get(wrapper) {
        Some(node) => node.children().map(|c| c.id()).collect(),
        None => return,
    };
    for child in children {
        if let Some(mut root) = tree.get_mut(root_id) {
            root.append_id(child);
        }
    }
    if let Some(mut wrapper) = tree.get_mut(wrapper) {
        wrapper.detach();
    }
}

fn drop_whitespace_text(tree: &mut Tree<Node>) {
    let blank: Vec<NodeId> = tree
        .root()
        .descendants()
        .filter(|n| n.value().as_text().is_some_and(|t| t.trim().is_empty()))
        .map(|n| n.id())
        .collect();
    for id in blank {
        if let Some(mut node) = tree.get_mut(id) {
            node.detach();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;

    fn parse(content: &str, is_document: bool) -> Document {
        HtmlBackend::new()
            .parse(content, &Options::default(), is_document, None)
            .unwrap()
    }

    #[test]
    fn test_document_parse_has_html_structure() {
        let doc = parse("<p>Hello</p>", true);
        let tree = doc.tree();
        assert_eq!(tree.root().value(), &Node::Document);
        let html = tree
            .root()
            .children()
            .find(|c| c.value().is_element())
            .unwrap();
        assert_eq!(html.value().as_element().unwrap().name, "html");
    }

    #[test]
    fn test_fragment_parse_has_no_wrappers() {
        let doc = parse("<p>Hello</p><span>x</span>", false);
        let tree = doc.tree();
        assert_eq!(tree.root().value(), &Node::Fragment);
        let tags: Vec<String> = tree
            .root()
            .children()
            .filter_map(|c| c.value().as_element().map(|e| e.name.clone()))
            .collect();
        assert_eq!(tags, vec!["p", "span"]);
    }

    #[test]
    fn test_fragment_context_preserves_table_rows() {
        let doc = HtmlBackend::new()
            .parse("<tr><td>1</td></tr>", &Options::default(), false, Some("tbody"))
            .unwrap();
        let tree = doc.tree();
        let first = tree.root().first_child().unwrap();
        assert_eq!(first.value().as_element().unwrap().name, "tr");
    }

    #[test]
    fn test_whitespace_text_dropped_when_configured() {
        let opts = Options::builder().keep_whitespace(false).build();
        let doc = HtmlBackend::new()
            .parse("<ul>\n  <li>a</li>\n  <li>b</li>\n</ul>", &opts, false, None)
            .unwrap();
        let tree = doc.tree();
        let ul = tree.root().first_child().unwrap();
        assert!(ul.children().all(|c| c.value().is_element()));
    }

    #[test]
    fn test_render_roundtrip_canonical_fragment() {
        let input = r#"<div class="box"><p>Hi &amp; bye</p><br><img src="x.png"></div>"#;
        let doc = parse(input, false);
        let tree = doc.tree();
        let nodes: Vec<NodeId> = tree.root().children().map(|c| c.id()).collect();
        assert_eq!(HtmlBackend::new().render(&tree, &nodes), input);
    }

    #[test]
    fn test_text_merging_across_character_references() {
        let doc = parse("a&amp;b", false);
        let tree = doc.tree();
        let texts: Vec<&str> = tree
            .root()
            .children()
            .filter_map(|c| c.value().as_text())
            .collect();
        assert_eq!(texts, vec!["a&b"]);
    }
}
