// ABOUTME: Tree manipulation operations: insertion, removal, replacement, and text/html accessors.
// ABOUTME: Edits act on the shared tree and are visible through every selection referencing the nodes.

use ego_tree::NodeId;

use crate::document::Document;
use crate::error::Result;
use crate::matcher::Matcher;
use crate::node::Node;
use crate::selection::Selection;

#[derive(Clone, Copy)]
enum Placement {
    Append,
    Prepend,
    Before,
    After,
}

impl Selection {
    /// Appends `content`'s nodes as the last children of every slot. With
    /// multiple targets, all but the last receive deep copies; the last
    /// receives the original nodes (moved from wherever they were). Content
    /// from a different document is always deep-copied.
    pub fn append(&self, content: &Selection) -> &Self {
        self.insert(content.nodes(), content.document(), Placement::Append);
        self
    }

    /// Parses `html` as a fragment and appends the result to every slot. The
    /// first target's tag name is used as the fragment context so
    /// context-sensitive content (table rows, options) parses correctly.
    pub fn append_html(&self, html: &str) -> Result<&Self> {
        let context = self.own_tag();
        let ids = self.graft(html, context.as_deref())?;
        self.insert(&ids, self.document(), Placement::Append);
        Ok(self)
    }

    /// Prepends `content`'s nodes as the first children of every slot.
    pub fn prepend(&self, content: &Selection) -> &Self {
        self.insert(content.nodes(), content.document(), Placement::Prepend);
        self
    }

    /// Parses `html` as a fragment and prepends the result to every slot.
    pub fn prepend_html(&self, html: &str) -> Result<&Self> {
        let context = self.own_tag();
        let ids = self.graft(html, context.as_deref())?;
        self.insert(&ids, self.document(), Placement::Prepend);
        Ok(self)
    }

    /// Inserts `content`'s nodes immediately before every slot.
    pub fn before(&self, content: &Selection) -> &Self {
        self.insert(content.nodes(), content.document(), Placement::Before);
        self
    }

    /// Parses `html` as a fragment and inserts it before every slot.
    pub fn before_html(&self, html: &str) -> Result<&Self> {
        let context = self.parent_tag();
        let ids = self.graft(html, context.as_deref())?;
        self.insert(&ids, self.document(), Placement::Before);
        Ok(self)
    }

    /// Inserts `content`'s nodes immediately after every slot.
    pub fn after(&self, content: &Selection) -> &Self {
        self.insert(content.nodes(), content.document(), Placement::After);
        self
    }

    /// Parses `html` as a fragment and inserts it after every slot.
    pub fn after_html(&self, html: &str) -> Result<&Self> {
        let context = self.parent_tag();
        let ids = self.graft(html, context.as_deref())?;
        self.insert(&ids, self.document(), Placement::After);
        Ok(self)
    }

    /// Detaches every slot from the tree. The selection keeps referencing the
    /// detached nodes, so they can be re-inserted elsewhere.
    pub fn remove(&self) -> &Self {
        let mut tree = self.document().tree_mut();
        for id in self.iter() {
            if let Some(mut node) = tree.get_mut(id) {
                node.detach();
            }
        }
        self
    }

    /// Detaches the slots satisfying `matcher` from the tree and splices them
    /// out of this selection, renumbering the remaining slots.
    pub fn prune<M: Matcher>(&mut self, matcher: &M) -> &mut Self {
        let mut index = 0;
        while index < self.len() {
            let id = self[index];
            let matched = {
                let tree = self.document().tree();
                tree.get(id)
                    .map(|n| matcher.matches(&n, self.options()))
                    .unwrap_or(false)
            };
            if matched {
                {
                    let mut tree = self.document().tree_mut();
                    if let Some(mut node) = tree.get_mut(id) {
                        node.detach();
                    }
                }
                self.splice(index..index + 1);
            } else {
                index += 1;
            }
        }
        self
    }

    /// Removes all children of every slot.
    pub fn empty(&self) -> &Self {
        let mut tree = self.document().tree_mut();
        for id in self.iter() {
            let children: Vec<NodeId> = match tree.get(id) {
                Some(node) => node.children().map(|c| c.id()).collect(),
                None => continue,
            };
            for child in children {
                if let Some(mut child) = tree.get_mut(child) {
                    child.detach();
                }
            }
        }
        self
    }

    /// Replaces every slot with `content`'s nodes. The slots end up detached;
    /// the selection keeps referencing them.
    pub fn replace_with(&self, content: &Selection) -> &Self {
        self.insert(content.nodes(), content.document(), Placement::Before);
        self.remove()
    }

    /// Parses `html` as a fragment and replaces every slot with it.
    pub fn replace_with_html(&self, html: &str) -> Result<&Self> {
        let context = self.parent_tag();
        let ids = self.graft(html, context.as_deref())?;
        self.insert(&ids, self.document(), Placement::Before);
        Ok(self.remove())
    }

    /// Concatenated text of all text nodes under every slot, in slot order.
    pub fn text(&self) -> String {
        self.iter()
            .map(|id| self.document().subtree_text(id))
            .collect()
    }

    /// Replaces the children of every slot with a single text node. The text
    /// is stored raw; escaping happens at render time.
    pub fn set_text(&self, text: &str) -> &Self {
        self.empty();
        let mut tree = self.document().tree_mut();
        for id in self.iter() {
            if let Some(mut node) = tree.get_mut(id) {
                node.append(Node::Text(text.to_string()));
            }
        }
        self
    }

    /// Inner HTML of the first slot, serialized through the render backend.
    pub fn html(&self) -> Option<String> {
        let first = self.get(0)?;
        let tree = self.document().tree();
        Some(crate::backend::serialize_children(&tree, first))
    }

    /// Parses `html` as a fragment and replaces the children of every slot
    /// with it.
    pub fn set_html(&self, html: &str) -> Result<&Self> {
        let context = self.own_tag();
        let ids = self.graft(html, context.as_deref())?;
        self.empty();
        self.insert(&ids, self.document(), Placement::Append);
        Ok(self)
    }

    /// Outer HTML of the whole selection, concatenated in slot order (the
    /// render hook).
    pub fn to_html(&self) -> String {
        self.render()
    }

    /// Places `content_ids` relative to every target slot. Originals go to
    /// the last target; earlier targets get deep copies so each target ends
    /// up with the full content.
    fn insert(&self, content_ids: &[NodeId], content_doc: &Document, placement: Placement) {
        if self.is_empty() || content_ids.is_empty() {
            return;
        }
        let same_doc = self.document().same_tree(content_doc);
        let last = self.len() - 1;
        for (i, target) in self.iter().enumerate() {
            // Sibling placement needs a parent; root and detached slots are
            // skipped rather than panicking in the tree arena.
            if matches!(placement, Placement::Before | Placement::After) {
                let has_parent = self
                    .document()
                    .tree()
                    .get(target)
                    .and_then(|n| n.parent())
                    .is_some();
                if !has_parent {
                    continue;
                }
            }
            let ids: Vec<NodeId> = if same_doc && i == last {
                content_ids.to_vec()
            } else if same_doc {
                content_ids
                    .iter()
                    .filter_map(|&id| self.document().duplicate(id))
                    .collect()
            } else {
                content_ids
                    .iter()
                    .filter_map(|&id| self.document().copy_from(content_doc, id))
                    .collect()
            };
            let mut tree = self.document().tree_mut();
            match placement {
                Placement::Append => {
                    for id in ids {
                        if let Some(mut node) = tree.get_mut(target) {
                            node.append_id(id);
                        }
                    }
                }
                Placement::Prepend => {
                    for id in ids.into_iter().rev() {
                        if let Some(mut node) = tree.get_mut(target) {
                            node.prepend_id(id);
                        }
                    }
                }
                Placement::Before => {
                    for id in ids {
                        if let Some(mut node) = tree.get_mut(target) {
                            node.insert_id_before(id);
                        }
                    }
                }
                Placement::After => {
                    for id in ids.into_iter().rev() {
                        if let Some(mut node) = tree.get_mut(target) {
                            node.insert_id_after(id);
                        }
                    }
                }
            }
        }
    }

    /// Tag name of the first element slot, as fragment-parse context for
    /// child insertion.
    fn own_tag(&self) -> Option<String> {
        let tree = self.document().tree();
        self.iter().find_map(|id| {
            tree.get(id)?
                .value()
                .as_element()
                .map(|el| el.name.clone())
        })
    }

    /// Tag name of the first slot's parent element, as fragment-parse context
    /// for sibling insertion.
    fn parent_tag(&self) -> Option<String> {
        let tree = self.document().tree();
        self.iter().find_map(|id| {
            tree.get(id)?
                .parent()?
                .value()
                .as_element()
                .map(|el| el.name.clone())
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::matcher::Selector;
    use crate::load_fragment;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_append_html_and_render() {
        let root = load_fragment("<ul><li>a</li></ul>").unwrap();
        let ul = root.select("ul").unwrap();
        ul.append_html("<li>b</li><li>c</li>").unwrap();
        assert_eq!(ul.html().unwrap(), "<li>a</li><li>b</li><li>c</li>");
    }

    #[test]
    fn test_prepend_keeps_content_order() {
        let root = load_fragment("<div><p>old</p></div>").unwrap();
        let div = root.select("div").unwrap();
        div.prepend_html("<a>1</a><b>2</b>").unwrap();
        assert_eq!(div.html().unwrap(), "<a>1</a><b>2</b><p>old</p>");
    }

    #[test]
    fn test_before_and_after() {
        let root = load_fragment("<div><p>mid</p></div>").unwrap();
        let p = root.select("p").unwrap();
        p.before_html("<i>pre</i>").unwrap();
        p.after_html("<i>post</i><i>script</i>").unwrap();
        assert_eq!(
            root.select("div").unwrap().html().unwrap(),
            "<i>pre</i><p>mid</p><i>post</i><i>script</i>"
        );
    }

    #[test]
    fn test_multi_target_append_clones_for_all_but_last() {
        let root = load_fragment("<div id=\"x\"></div><div id=\"y\"></div>").unwrap();
        let divs = root.select("div").unwrap();
        divs.append_html("<span>s</span>").unwrap();
        assert_eq!(root.select("span").unwrap().len(), 2);
        assert_eq!(root.select("#x span").unwrap().len(), 1);
        assert_eq!(root.select("#y span").unwrap().len(), 1);
    }

    #[test]
    fn test_append_moves_existing_nodes() {
        let root = load_fragment("<div id=\"src\"><p>move me</p></div><div id=\"dst\"></div>").unwrap();
        let p = root.select("p").unwrap();
        root.select("#dst").unwrap().append(&p);
        assert_eq!(root.select("#src p").unwrap().len(), 0);
        assert_eq!(root.select("#dst p").unwrap().text(), "move me");
    }

    #[test]
    fn test_remove_detaches_but_keeps_slots() {
        let root = load_fragment("<div><p>a</p><p>b</p></div>").unwrap();
        let ps = root.select("p").unwrap();
        ps.remove();
        assert_eq!(ps.len(), 2);
        assert_eq!(root.select("p").unwrap().len(), 0);
        // Detached nodes can be re-inserted.
        root.select("div").unwrap().append(&ps);
        assert_eq!(root.select("p").unwrap().len(), 2);
    }

    #[test]
    fn test_prune_splices_matching_slots() {
        let root = load_fragment("<div><p class=\"ad\">x</p><p>keep</p><p class=\"ad\">y</p></div>").unwrap();
        let mut ps = root.select("p").unwrap();
        let ad = Selector::parse(".ad").unwrap();
        ps.prune(&ad);
        assert_eq!(ps.len(), 1);
        assert_eq!(ps.text(), "keep");
        assert_eq!(root.select("p").unwrap().len(), 1);
    }

    #[test]
    fn test_empty_and_set_text() {
        let root = load_fragment("<div><p>a</p>b</div>").unwrap();
        let div = root.select("div").unwrap();
        div.empty();
        assert_eq!(div.html().unwrap(), "");

        div.set_text("1 < 2");
        assert_eq!(div.text(), "1 < 2");
        assert_eq!(div.to_html(), "<div>1 &lt; 2</div>");
    }

    #[test]
    fn test_replace_with_html() {
        let root = load_fragment("<div><b>bold</b></div>").unwrap();
        let b = root.select("b").unwrap();
        b.replace_with_html("<em>soft</em>").unwrap();
        assert_eq!(root.select("div").unwrap().html().unwrap(), "<em>soft</em>");
        // The replaced node is detached, still referenced by the selection.
        assert_eq!(b.text(), "bold");
    }

    #[test]
    fn test_set_html_with_table_context() {
        let root = load_fragment("<table><tbody></tbody></table>").unwrap();
        let tbody = root.select("tbody").unwrap();
        tbody.set_html("<tr><td>cell</td></tr>").unwrap();
        assert_eq!(root.select("td").unwrap().text(), "cell");
    }

    #[test]
    fn test_mutation_visible_through_other_selection() {
        let root = load_fragment("<div><p>shared</p></div>").unwrap();
        let via_div = root.select("div").unwrap().children();
        let via_p = root.select("p").unwrap();
        via_p.set_text("changed");
        assert_eq!(via_div.text(), "changed");
    }

    #[test]
    fn test_sibling_insertion_skips_parentless_slots() {
        // The root selection has no parent to insert next to.
        let root = load_fragment("<p>x</p>").unwrap();
        root.before_html("<i>y</i>").unwrap();
        root.after_html("<i>z</i>").unwrap();
        root.replace_with_html("<i>w</i>").unwrap();
        assert_eq!(root.to_html(), "<p>x</p>");

        // Detached nodes likewise.
        let doc = load_fragment("<div><p>a</p></div>").unwrap();
        let p = doc.select("p").unwrap();
        p.remove();
        p.before_html("<i>pre</i>").unwrap();
        assert_eq!(doc.to_html(), "<div></div>");
        assert_eq!(p.to_html(), "<p>a</p>");
    }

    #[test]
    fn test_empty_selection_manipulation_is_safe() {
        let root = load_fragment("<div></div>").unwrap();
        let none = root.select("p").unwrap();
        none.remove().empty().set_text("x");
        assert_eq!(none.to_html(), "");
        assert_eq!(none.html(), None);
        none.append_html("<i>y</i>").unwrap();
        assert_eq!(root.select("i").unwrap().len(), 0);
    }
}
