// ABOUTME: Shared-ownership wrapper around the ego-tree arena holding a parsed document.
// ABOUTME: Provides node lookup, subtree duplication, cross-tree copying, and document-order sorting.

use std::cell::{Ref, RefCell, RefMut};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use ego_tree::{NodeId, Tree};

use crate::node::Node;

/// A parsed document: an arena tree of [`Node`]s behind shared ownership.
///
/// Cloning a `Document` is cheap and aliases the same tree, so a mutation made
/// through any clone (or any selection holding a clone) is immediately visible
/// through every other one. There is no isolation or snapshotting; callers
/// that need a stable view derive their selections after the mutations they
/// intend to make.
#[derive(Debug, Clone)]
pub struct Document {
    tree: Rc<RefCell<Tree<Node>>>,
}

impl Document {
    /// Wraps an already-built tree.
    pub fn new(tree: Tree<Node>) -> Self {
        Self {
            tree: Rc::new(RefCell::new(tree)),
        }
    }

    /// Creates an empty fragment document.
    pub fn empty() -> Self {
        Self::new(Tree::new(Node::Fragment))
    }

    /// Borrows the underlying tree.
    ///
    /// The borrow must be released before any mutating operation runs, so
    /// never hold the returned guard across a call that takes `tree_mut`.
    pub fn tree(&self) -> Ref<'_, Tree<Node>> {
        self.tree.borrow()
    }

    /// Mutably borrows the underlying tree.
    pub fn tree_mut(&self) -> RefMut<'_, Tree<Node>> {
        self.tree.borrow_mut()
    }

    /// The arena id of the tree root (the Document or Fragment node).
    pub fn root_id(&self) -> NodeId {
        self.tree.borrow().root().id()
    }

    /// Returns true when both handles alias the same tree.
    pub fn same_tree(&self, other: &Document) -> bool {
        Rc::ptr_eq(&self.tree, &other.tree)
    }

    /// Unwraps the tree when this handle is the sole owner. Freshly parsed
    /// documents always are; a `None` here means the caller leaked a clone.
    pub fn into_tree(self) -> Option<Tree<Node>> {
        Rc::try_unwrap(self.tree).ok().map(RefCell::into_inner)
    }

    /// Deep-copies the subtree rooted at `id`, returning the orphaned copy's
    /// id. Used by insertion operations that target multiple nodes.
    pub(crate) fn duplicate(&self, id: NodeId) -> Option<NodeId> {
        let mut tree = self.tree_mut();
        duplicate_in(&mut tree, id)
    }

    /// Deep-copies the subtree rooted at `src_id` in `src` into this
    /// document's tree, returning the orphaned copy's id. Supports insertion
    /// of nodes that belong to a different document.
    pub(crate) fn copy_from(&self, src: &Document, src_id: NodeId) -> Option<NodeId> {
        let src_tree = src.tree();
        let mut dst_tree = self.tree_mut();
        copy_between(&src_tree, src_id, &mut dst_tree)
    }

    /// Sorts `ids` into document order and drops duplicates. Detached nodes
    /// (not reachable from the root) sort after attached ones, keeping their
    /// relative order.
    pub(crate) fn order_in_document(&self, ids: &mut Vec<NodeId>) {
        let tree = self.tree();
        let position: HashMap<NodeId, usize> = tree
            .root()
            .descendants()
            .enumerate()
            .map(|(i, node)| (node.id(), i))
            .collect();
        ids.sort_by_key(|id| position.get(id).copied().unwrap_or(usize::MAX));
        // Detached ids share the MAX sort key, so equal ids need not be
        // adjacent; dedupe through a seen-set instead of Vec::dedup.
        let mut seen = HashSet::with_capacity(ids.len());
        ids.retain(|id| seen.insert(*id));
    }

    /// Concatenated text of all text nodes in the subtree rooted at `id`.
    pub(crate) fn subtree_text(&self, id: NodeId) -> String {
        let tree = self.tree();
        let Some(node) = tree.get(id) else {
            return String::new();
        };
        let mut out = String::new();
        for desc in node.descendants() {
            if let Node::Text(t) = desc.value() {
                out.push_str(t);
            }
        }
        out
    }
}

fn duplicate_in(tree: &mut Tree<Node>, id: NodeId) -> Option<NodeId> {
    let value = tree.get(id)?.value().clone();
    let copy = tree.orphan(value).id();
    let children: Vec<NodeId> = tree.get(id)?.children().map(|c| c.id()).collect();
    for child in children {
        if let Some(child_copy) = duplicate_in(tree, child) {
            if let Some(mut parent) = tree.get_mut(copy) {
                parent.append_id(child_copy);
            }
        }
    }
    Some(copy)
}

fn copy_between(src: &Tree<Node>, src_id: NodeId, dst: &mut Tree<Node>) -> Option<NodeId> {
    let value = src.get(src_id)?.value().clone();
    let copy = dst.orphan(value).id();
    let children: Vec<NodeId> = src.get(src_id)?.children().map(|c| c.id()).collect();
    for child in children {
        if let Some(child_copy) = copy_between(src, child, dst) {
            if let Some(mut parent) = dst.get_mut(copy) {
                parent.append_id(child_copy);
            }
        }
    }
    Some(copy)
}
