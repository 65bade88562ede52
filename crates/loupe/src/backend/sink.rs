// ABOUTME: html5ever TreeSink that builds the ego-tree arena directly during parsing.
// ABOUTME: Handles are arena NodeIds; element QualNames are kept aside for tree-builder callbacks.

use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::HashMap;

use ego_tree::{NodeId, Tree};
use html5ever::tendril::StrTendril;
use html5ever::tree_builder::{ElemName, ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{local_name, namespace_url, ns, Attribute, LocalName, QualName};

use crate::node::{Attr, Doctype, Element, Node};

/// Builds a `Tree<Node>` while html5ever drives the parse.
pub(crate) struct DomSink {
    tree: RefCell<Tree<Node>>,
    /// Tree-builder callbacks (fragment context, adoption agency) ask for the
    /// qualified name of elements we created; our Node keeps only the local
    /// name, so the full names live here for the duration of the parse.
    names: RefCell<HashMap<NodeId, QualName>>,
}

impl DomSink {
    pub(crate) fn new() -> Self {
        Self {
            tree: RefCell::new(Tree::new(Node::Document)),
            names: RefCell::new(HashMap::new()),
        }
    }
}

/// Owned element name handed back to the tree builder.
#[derive(Debug)]
pub(crate) struct SinkElemName(QualName);

impl ElemName for SinkElemName {
    fn ns(&self) -> &html5ever::Namespace {
        &self.0.ns
    }

    fn local_name(&self) -> &LocalName {
        &self.0.local
    }
}

impl TreeSink for DomSink {
    type Handle = NodeId;
    type Output = Tree<Node>;
    type ElemName<'a>
        = SinkElemName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        self.tree.into_inner()
    }

    fn parse_error(&self, _msg: Cow<'static, str>) {
        // html5ever recovers on its own; errors are not surfaced.
    }

    fn get_document(&self) -> Self::Handle {
        self.tree.borrow().root().id()
    }

    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn same_node(&self, a: &Self::Handle, b: &Self::Handle) -> bool {
        a == b
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> SinkElemName {
        let name = self
            .names
            .borrow()
            .get(target)
            .cloned()
            .unwrap_or_else(|| QualName::new(None, ns!(html), local_name!("")));
        SinkElemName(name)
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        let attrs = attrs
            .into_iter()
            .map(|attr| Attr {
                name: attr.name.local.to_string(),
                value: attr.value.to_string(),
            })
            .collect();
        let element = Element::new(name.local.to_string(), attrs);
        let id = self.tree.borrow_mut().orphan(Node::Element(element)).id();
        self.names.borrow_mut().insert(id, name);
        id
    }

    fn create_comment(&self, text: StrTendril) -> Self::Handle {
        self.tree
            .borrow_mut()
            .orphan(Node::Comment(text.to_string()))
            .id()
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> Self::Handle {
        // Processing instructions do not survive; an empty comment keeps the
        // handle valid.
        self.tree
            .borrow_mut()
            .orphan(Node::Comment(String::new()))
            .id()
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let mut tree = self.tree.borrow_mut();
        match child {
            NodeOrText::AppendNode(node) => {
                if let Some(mut parent) = tree.get_mut(*parent) {
                    parent.append_id(node);
                }
            }
            NodeOrText::AppendText(text) => {
                // Merge with a trailing text node, matching html5ever's
                // expectation that adjacent character runs coalesce.
                let last = tree.get(*parent).and_then(|p| p.last_child()).map(|c| c.id());
                if let Some(last) = last {
                    if let Some(mut node) = tree.get_mut(last) {
                        if let Node::Text(existing) = node.value() {
                            existing.push_str(&text);
                            return;
                        }
                    }
                }
                let text_node = tree.orphan(Node::Text(text.to_string())).id();
                if let Some(mut parent) = tree.get_mut(*parent) {
                    parent.append_id(text_node);
                }
            }
        }
    }

    fn append_before_sibling(&self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        let mut tree = self.tree.borrow_mut();
        let node = match new_node {
            NodeOrText::AppendNode(node) => node,
            NodeOrText::AppendText(text) => tree.orphan(Node::Text(text.to_string())).id(),
        };
        if let Some(mut sibling) = tree.get_mut(*sibling) {
            sibling.insert_id_before(node);
        }
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        let has_parent = self
            .tree
            .borrow()
            .get(*element)
            .and_then(|n| n.parent())
            .is_some();
        if has_parent {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    ) {
        let mut tree = self.tree.borrow_mut();
        tree.root_mut().append(Node::Doctype(Doctype {
            name: name.to_string(),
            public_id: public_id.to_string(),
            system_id: system_id.to_string(),
        }));
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        // Template contents are not split into a separate fragment; children
        // hang off the element itself.
        *target
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Attribute>) {
        let mut tree = self.tree.borrow_mut();
        let Some(mut node) = tree.get_mut(*target) else {
            return;
        };
        if let Some(el) = node.value().as_element_mut() {
            for attr in attrs {
                let name = attr.name.local.to_string();
                if !el.has_attr(&name) {
                    el.set_attr(&name, &attr.value);
                }
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        let mut tree = self.tree.borrow_mut();
        if let Some(mut node) = tree.get_mut(*target) {
            node.detach();
        }
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let mut tree = self.tree.borrow_mut();
        let children: Vec<NodeId> = match tree.get(*node) {
            Some(n) => n.children().map(|c| c.id()).collect(),
            None => return,
        };
        for child in children {
            if let Some(mut parent) = tree.get_mut(*new_parent) {
                parent.append_id(child);
            }
        }
    }
}
