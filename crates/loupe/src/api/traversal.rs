// ABOUTME: Tree traversal operations: selector search, relative navigation, and slot slicing.
// ABOUTME: Selection-producing results are deduplicated, emitted in document order, and chainable.

use std::ops::{Bound, RangeBounds};

use ego_tree::NodeId;

use crate::error::Result;
use crate::matcher::{get_or_compile, Matcher};
use crate::selection::Selection;

impl Selection {
    /// Finds descendants matching a CSS selector string. The selector is
    /// compiled through the shared cache; invalid selectors are an error.
    pub fn select(&self, css: &str) -> Result<Selection> {
        Ok(self.find(&get_or_compile(css)?))
    }

    /// Finds descendant elements of every slot that satisfy `matcher`,
    /// deduplicated and in document order.
    pub fn find<M: Matcher>(&self, matcher: &M) -> Selection {
        let mut out = Vec::new();
        {
            let tree = self.document().tree();
            for id in self.iter() {
                let Some(node) = tree.get(id) else { continue };
                for desc in node.descendants().skip(1) {
                    if desc.value().is_element() && matcher.matches(&desc, self.options()) {
                        out.push(desc.id());
                    }
                }
            }
        }
        self.document().order_in_document(&mut out);
        self.make(out)
    }

    /// Keeps the slots that satisfy `matcher`.
    pub fn filter<M: Matcher>(&self, matcher: &M) -> Selection {
        let kept = self.retain_slots(matcher, true);
        self.make(kept)
    }

    /// Drops the slots that satisfy `matcher`.
    pub fn not<M: Matcher>(&self, matcher: &M) -> Selection {
        let kept = self.retain_slots(matcher, false);
        self.make(kept)
    }

    /// True if any slot satisfies `matcher`.
    pub fn is<M: Matcher>(&self, matcher: &M) -> bool {
        let tree = self.document().tree();
        self.iter().any(|id| {
            tree.get(id)
                .map(|n| matcher.matches(&n, self.options()))
                .unwrap_or(false)
        })
    }

    fn retain_slots<M: Matcher>(&self, matcher: &M, want_match: bool) -> Vec<NodeId> {
        let tree = self.document().tree();
        self.iter()
            .filter(|id| {
                tree.get(*id)
                    .map(|n| matcher.matches(&n, self.options()))
                    .unwrap_or(false)
                    == want_match
            })
            .collect()
    }

    /// Element children of every slot.
    pub fn children(&self) -> Selection {
        self.collect_related(|node, out| {
            out.extend(
                node.children()
                    .filter(|c| c.value().is_element())
                    .map(|c| c.id()),
            );
        })
    }

    /// All child nodes of every slot, including text and comments.
    pub fn contents(&self) -> Selection {
        self.collect_related(|node, out| {
            out.extend(node.children().map(|c| c.id()));
        })
    }

    /// Parent node of every slot.
    pub fn parent(&self) -> Selection {
        self.collect_related(|node, out| {
            out.extend(node.parent().map(|p| p.id()));
        })
    }

    /// Ancestor elements of every slot, in document order (outermost first).
    pub fn parents(&self) -> Selection {
        self.collect_related(|node, out| {
            out.extend(
                node.ancestors()
                    .filter(|a| a.value().is_element())
                    .map(|a| a.id()),
            );
        })
    }

    /// For every slot, the nearest self-or-ancestor element satisfying
    /// `matcher`.
    pub fn closest<M: Matcher>(&self, matcher: &M) -> Selection {
        let options = self.options().clone();
        self.collect_related(move |node, out| {
            let hit = std::iter::once(*node)
                .chain(node.ancestors())
                .filter(|n| n.value().is_element())
                .find(|n| matcher.matches(n, &options));
            out.extend(hit.map(|n| n.id()));
        })
    }

    /// The immediately following element sibling of every slot.
    pub fn next(&self) -> Selection {
        self.collect_related(|node, out| {
            out.extend(
                node.next_siblings()
                    .find(|s| s.value().is_element())
                    .map(|s| s.id()),
            );
        })
    }

    /// The immediately preceding element sibling of every slot.
    pub fn prev(&self) -> Selection {
        self.collect_related(|node, out| {
            out.extend(
                node.prev_siblings()
                    .find(|s| s.value().is_element())
                    .map(|s| s.id()),
            );
        })
    }

    /// All following element siblings of every slot.
    pub fn next_all(&self) -> Selection {
        self.collect_related(|node, out| {
            out.extend(
                node.next_siblings()
                    .filter(|s| s.value().is_element())
                    .map(|s| s.id()),
            );
        })
    }

    /// All preceding element siblings of every slot.
    pub fn prev_all(&self) -> Selection {
        self.collect_related(|node, out| {
            out.extend(
                node.prev_siblings()
                    .filter(|s| s.value().is_element())
                    .map(|s| s.id()),
            );
        })
    }

    /// All element siblings of every slot, the slot itself excluded.
    pub fn siblings(&self) -> Selection {
        self.collect_related(|node, out| {
            let Some(parent) = node.parent() else { return };
            out.extend(
                parent
                    .children()
                    .filter(|c| c.value().is_element() && c.id() != node.id())
                    .map(|c| c.id()),
            );
        })
    }

    /// The slot at `index`; negative indexes count from the end.
    pub fn eq(&self, index: isize) -> Selection {
        let len = self.len() as isize;
        let index = if index < 0 { index + len } else { index };
        if index < 0 || index >= len {
            return self.make(Vec::new());
        }
        self.make(vec![self[index as usize]])
    }

    /// The first slot.
    pub fn first(&self) -> Selection {
        self.eq(0)
    }

    /// The last slot.
    pub fn last(&self) -> Selection {
        self.eq(-1)
    }

    /// The slots within `range`, clamped to the selection's bounds.
    pub fn slice<R: RangeBounds<usize>>(&self, range: R) -> Selection {
        let len = self.len();
        let start = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => s + 1,
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&e) => e + 1,
            Bound::Excluded(&e) => e,
            Bound::Unbounded => len,
        };
        let end = end.min(len);
        let start = start.min(end);
        self.make(self.nodes()[start..end].to_vec())
    }

    /// Union of this selection and `other`, deduplicated in document order.
    /// `other` must reference the same document; foreign selections are
    /// ignored.
    pub fn add(&self, other: &Selection) -> Selection {
        let mut ids: Vec<NodeId> = self.iter().collect();
        if self.document().same_tree(other.document()) {
            ids.extend(other.iter());
        }
        self.document().order_in_document(&mut ids);
        self.make(ids)
    }

    /// Shared shape of the relative-navigation operations: gather related
    /// ids per slot, then dedupe into document order and wrap through the
    /// construct-new-selection hook.
    fn collect_related<F>(&self, mut gather: F) -> Selection
    where
        F: FnMut(&ego_tree::NodeRef<'_, crate::node::Node>, &mut Vec<NodeId>),
    {
        let mut out = Vec::new();
        {
            let tree = self.document().tree();
            for id in self.iter() {
                if let Some(node) = tree.get(id) {
                    gather(&node, &mut out);
                }
            }
        }
        self.document().order_in_document(&mut out);
        self.make(out)
    }
}
