// ABOUTME: The core Selection container: an ordered, index-addressable set of node handles.
// ABOUTME: Carries root/options/backend context and the three backend-extension hooks.

use std::fmt;
use std::ops::{Index, RangeBounds};
use std::rc::Rc;

use ego_tree::NodeId;

use crate::backend::{Backend, HtmlBackend};
use crate::document::Document;
use crate::error::{Error, Result};
use crate::options::Options;

/// An ordered, index-addressable collection of node handles into a shared
/// document tree, plus the context every derived selection inherits: the
/// document, the root back-reference, the resolved options, and the backend
/// strategy used for parsing and rendering.
///
/// A selection is a snapshot of handles, not a live view: tree mutations made
/// through one selection are visible through any other selection referencing
/// the same nodes, but no selection's slot list changes behind its back.
/// Operations are grouped by capability (attributes, traversal, manipulation,
/// css, forms) in the [`crate::api`] modules; each is an `impl Selection`
/// block, so a name collision between capability modules fails to compile
/// instead of silently shadowing.
///
/// Construction through [`crate::load`] is the usual path; this constructor is
/// for wrapping an existing node list.
#[derive(Clone)]
pub struct Selection {
    nodes: Vec<NodeId>,
    doc: Document,
    backend: Rc<dyn Backend>,
    options: Options,
    /// Handle of the tree root this selection was derived from. `None` only
    /// for a selection that itself wraps the root.
    root: Option<NodeId>,
    /// The selection this one was derived from, for chain unwinding.
    prev: Option<Rc<Selection>>,
}

impl Selection {
    /// Marker identifying values produced by this library.
    pub const SIGNATURE: &'static str = "[loupe selection]";

    /// Wraps an existing node list. `nodes` become the slots `0..len`
    /// positionally; an empty list is valid and yields an empty, chain-safe
    /// selection. `root` should be the document root handle, or `None` when
    /// the new selection itself represents the root.
    pub fn new(nodes: Vec<NodeId>, doc: Document, root: Option<NodeId>, options: Options) -> Self {
        Self::with_backend(nodes, doc, root, options, Rc::new(HtmlBackend::new()))
    }

    /// Like [`Selection::new`] with an explicit backend strategy.
    pub fn with_backend(
        nodes: Vec<NodeId>,
        doc: Document,
        root: Option<NodeId>,
        options: Options,
        backend: Rc<dyn Backend>,
    ) -> Self {
        Self {
            nodes,
            doc,
            backend,
            options,
            root,
            prev: None,
        }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the selection holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The node handle in slot `index`, if within bounds.
    pub fn get(&self, index: usize) -> Option<NodeId> {
        self.nodes.get(index).copied()
    }

    /// All slots in order.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Iterates slots in order. The iterator borrows the selection without
    /// consuming it, so iteration is restartable.
    pub fn iter(&self) -> std::iter::Copied<std::slice::Iter<'_, NodeId>> {
        self.nodes.iter().copied()
    }

    /// Removes a contiguous slot range, returning the removed handles.
    /// Remaining slots renumber contiguously from 0. This edits the
    /// selection's own slot list only, never the tree.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds, like `Vec::drain`.
    pub fn splice<R: RangeBounds<usize>>(&mut self, range: R) -> Vec<NodeId> {
        self.nodes.drain(range).collect()
    }

    /// The library signature marker, for identifying selection values without
    /// inspecting node layout.
    pub fn signature(&self) -> &'static str {
        Self::SIGNATURE
    }

    /// The document this selection points into.
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// The resolved options this selection and its derivations carry.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// A selection wrapping the document root this one was derived from, or
    /// `None` when this selection is itself the root wrapper.
    pub fn root(&self) -> Option<Selection> {
        self.root.map(|id| Selection {
            nodes: vec![id],
            doc: self.doc.clone(),
            backend: self.backend.clone(),
            options: self.options.clone(),
            root: None,
            prev: None,
        })
    }

    /// Ends the most recent traversal, returning the selection this one was
    /// derived from, or an empty selection at the start of a chain.
    pub fn end(&self) -> Selection {
        match &self.prev {
            Some(prev) => (**prev).clone(),
            None => self.make(Vec::new()),
        }
    }

    // --- backend-extension hooks -------------------------------------------

    /// Construct-new-selection hook: wraps `nodes` in a selection of the same
    /// document, backend, and options, with the root propagated and this
    /// selection recorded for [`Selection::end`].
    pub fn make(&self, nodes: Vec<NodeId>) -> Selection {
        Selection {
            nodes,
            doc: self.doc.clone(),
            backend: self.backend.clone(),
            options: self.options.clone(),
            root: self.root.or_else(|| Some(self.doc.root_id())),
            prev: Some(Rc::new(self.clone())),
        }
    }

    /// Parse hook: turns raw content into a new document tree through this
    /// selection's backend and options. Backend failures propagate unchanged.
    pub fn parse(&self, content: &str, is_document: bool, context: Option<&str>) -> Result<Document> {
        self.backend.parse(content, &self.options, is_document, context)
    }

    /// Render hook: serializes this selection's nodes, concatenated in slot
    /// order.
    pub fn render(&self) -> String {
        let tree = self.doc.tree();
        self.backend.render(&tree, &self.nodes)
    }

    /// Parses `html` as a fragment and moves the resulting nodes into this
    /// selection's tree, returning their handles (still orphaned, in source
    /// order). Insertion operations place them.
    pub(crate) fn graft(&self, html: &str, context: Option<&str>) -> Result<Vec<NodeId>> {
        let parsed = self.backend.parse(html, &self.options, false, context)?;
        let fragment = parsed
            .into_tree()
            .ok_or_else(|| Error::parse("freshly parsed fragment is unexpectedly shared"))?;
        let mut tree = self.doc.tree_mut();
        let fragment_root = tree.extend_tree(fragment).id();
        if let Some(mut root) = tree.get_mut(fragment_root) {
            root.detach();
        }
        let children = match tree.get(fragment_root) {
            Some(node) => node.children().map(|c| c.id()).collect(),
            None => Vec::new(),
        };
        Ok(children)
    }
}

impl Index<usize> for Selection {
    type Output = NodeId;

    fn index(&self, index: usize) -> &NodeId {
        &self.nodes[index]
    }
}

impl<'a> IntoIterator for &'a Selection {
    type Item = NodeId;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, NodeId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selection")
            .field("signature", &Self::SIGNATURE)
            .field("nodes", &self.nodes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Element, Node};
    use ego_tree::Tree;

    fn doc_with_three() -> (Document, Vec<NodeId>) {
        let mut tree = Tree::new(Node::Fragment);
        let ids = ["a", "b", "c"]
            .iter()
            .map(|tag| {
                tree.root_mut()
                    .append(Node::Element(Element::new(*tag, vec![])))
                    .id()
            })
            .collect();
        (Document::new(tree), ids)
    }

    #[test]
    fn test_construction_copies_slots_positionally() {
        let (doc, ids) = doc_with_three();
        let sel = Selection::new(ids.clone(), doc, None, Options::default());
        assert_eq!(sel.len(), 3);
        for (i, id) in ids.iter().enumerate() {
            assert_eq!(sel.get(i), Some(*id));
            assert_eq!(sel[i], *id);
        }
        assert_eq!(sel.get(3), None);
    }

    #[test]
    fn test_empty_construction() {
        let (doc, _) = doc_with_three();
        let sel = Selection::new(Vec::new(), doc, None, Options::default());
        assert_eq!(sel.len(), 0);
        assert!(sel.is_empty());
        assert_eq!(sel.get(0), None);
    }

    #[test]
    fn test_iteration_is_restartable() {
        let (doc, ids) = doc_with_three();
        let sel = Selection::new(ids, doc, None, Options::default());
        let first: Vec<NodeId> = sel.iter().collect();
        let second: Vec<NodeId> = sel.iter().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_splice_renumbers_contiguously() {
        let (doc, ids) = doc_with_three();
        let mut sel = Selection::new(ids.clone(), doc, None, Options::default());
        let removed = sel.splice(1..2);
        assert_eq!(removed, vec![ids[1]]);
        assert_eq!(sel.len(), 2);
        assert_eq!(sel.get(0), Some(ids[0]));
        assert_eq!(sel.get(1), Some(ids[2]));
    }

    #[test]
    fn test_make_propagates_context() {
        let (doc, ids) = doc_with_three();
        let options = Options::builder().quirks(true).build();
        let root_id = doc.root_id();
        let sel = Selection::new(ids.clone(), doc, None, options.clone());
        assert!(sel.root().is_none());

        let derived = sel.make(vec![ids[1]]);
        assert_eq!(derived.signature(), Selection::SIGNATURE);
        assert_eq!(derived.options(), &options);
        let derived_root = derived.root().expect("derived selections have a root");
        assert_eq!(derived_root.nodes(), &[root_id]);
        assert_eq!(derived.end().nodes(), sel.nodes());
    }

    #[test]
    fn test_end_without_prev_is_empty() {
        let (doc, ids) = doc_with_three();
        let sel = Selection::new(ids, doc, None, Options::default());
        assert!(sel.end().is_empty());
    }
}
