// ABOUTME: Attribute and class-list operations over a selection.
// ABOUTME: Getters read the first element slot; setters apply to every element slot.

use crate::selection::Selection;

impl Selection {
    /// Value of `name` on the first element in the selection. Later slots are
    /// not consulted, matching the first-node convention of DOM-query APIs.
    pub fn attr(&self, name: &str) -> Option<String> {
        let tree = self.document().tree();
        let first = self
            .iter()
            .find(|id| tree.get(*id).is_some_and(|n| n.value().is_element()))?;
        tree.get(first)?
            .value()
            .as_element()
            .and_then(|el| el.attr(name))
            .map(str::to_string)
    }

    /// True if any element in the selection carries the attribute.
    pub fn has_attr(&self, name: &str) -> bool {
        let tree = self.document().tree();
        self.iter().any(|id| {
            tree.get(id)
                .and_then(|n| n.value().as_element().map(|el| el.has_attr(name)))
                .unwrap_or(false)
        })
    }

    /// Sets `name` to `value` on every element in the selection.
    pub fn set_attr(&self, name: &str, value: &str) -> &Self {
        let mut tree = self.document().tree_mut();
        for id in self.iter() {
            if let Some(mut node) = tree.get_mut(id) {
                if let Some(el) = node.value().as_element_mut() {
                    el.set_attr(name, value);
                }
            }
        }
        self
    }

    /// Removes `name` from every element in the selection.
    pub fn remove_attr(&self, name: &str) -> &Self {
        let mut tree = self.document().tree_mut();
        for id in self.iter() {
            if let Some(mut node) = tree.get_mut(id) {
                if let Some(el) = node.value().as_element_mut() {
                    el.remove_attr(name);
                }
            }
        }
        self
    }

    /// Value of the `data-<name>` attribute on the first element.
    pub fn data(&self, name: &str) -> Option<String> {
        self.attr(&format!("data-{name}"))
    }

    /// True if any element in the selection has the class. Honors the
    /// configuration's quirks flag.
    pub fn has_class(&self, class: &str) -> bool {
        let quirks = self.options().quirks;
        let tree = self.document().tree();
        self.iter().any(|id| {
            tree.get(id)
                .and_then(|n| n.value().as_element().map(|el| el.has_class(class, quirks)))
                .unwrap_or(false)
        })
    }

    /// Adds the whitespace-separated `classes` to every element.
    pub fn add_class(&self, classes: &str) -> &Self {
        let mut tree = self.document().tree_mut();
        for id in self.iter() {
            if let Some(mut node) = tree.get_mut(id) {
                if let Some(el) = node.value().as_element_mut() {
                    el.add_classes(classes);
                }
            }
        }
        self
    }

    /// Removes the whitespace-separated `classes` from every element. Honors
    /// the configuration's quirks flag.
    pub fn remove_class(&self, classes: &str) -> &Self {
        let quirks = self.options().quirks;
        let mut tree = self.document().tree_mut();
        for id in self.iter() {
            if let Some(mut node) = tree.get_mut(id) {
                if let Some(el) = node.value().as_element_mut() {
                    el.remove_classes(classes, quirks);
                }
            }
        }
        self
    }

    /// Per element and per class: adds the class if absent, removes it if
    /// present.
    pub fn toggle_class(&self, classes: &str) -> &Self {
        let quirks = self.options().quirks;
        let mut tree = self.document().tree_mut();
        for id in self.iter() {
            if let Some(mut node) = tree.get_mut(id) {
                if let Some(el) = node.value().as_element_mut() {
                    for class in classes.split_whitespace() {
                        if el.has_class(class, quirks) {
                            el.remove_classes(class, quirks);
                        } else {
                            el.add_classes(class);
                        }
                    }
                }
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use crate::load_fragment;

    #[test]
    fn test_attr_get_set_remove() {
        let root = load_fragment(r#"<a href="/one">x</a><a href="/two">y</a>"#).unwrap();
        let links = root.select("a").unwrap();
        assert_eq!(links.attr("href").as_deref(), Some("/one"));
        assert_eq!(links.attr("target"), None);

        links.set_attr("target", "_blank");
        assert!(links.has_attr("target"));
        assert_eq!(links.eq(1).attr("target").as_deref(), Some("_blank"));

        links.remove_attr("target");
        assert!(!links.has_attr("target"));
    }

    #[test]
    fn test_data_attribute() {
        let root = load_fragment(r#"<div data-role="card"></div>"#).unwrap();
        assert_eq!(root.select("div").unwrap().data("role").as_deref(), Some("card"));
    }

    #[test]
    fn test_class_operations() {
        let root = load_fragment(r#"<p class="a">1</p><p>2</p>"#).unwrap();
        let ps = root.select("p").unwrap();
        assert!(ps.has_class("a"));
        assert!(!ps.has_class("b"));

        ps.add_class("b c");
        assert_eq!(ps.eq(1).attr("class").as_deref(), Some("b c"));

        ps.remove_class("b");
        assert!(!ps.has_class("b"));

        ps.toggle_class("a");
        // First p had it (removed), second did not (added).
        assert_eq!(ps.eq(0).attr("class").as_deref(), Some("c"));
        assert_eq!(ps.eq(1).attr("class").as_deref(), Some("c a"));
    }

    #[test]
    fn test_class_toggle_honors_quirks() {
        let options = crate::Options::builder().quirks(true).build();
        let root =
            crate::load_fragment_with_options(r#"<p class="Hero"></p>"#, options).unwrap();
        let p = root.select("p").unwrap();
        p.toggle_class("hero");
        assert_eq!(p.attr("class").as_deref(), Some(""));
        p.toggle_class("hero");
        assert!(p.has_class("HERO"));
    }

    #[test]
    fn test_empty_selection_is_safe() {
        let root = load_fragment("<div></div>").unwrap();
        let none = root.select("span").unwrap();
        assert_eq!(none.attr("id"), None);
        assert!(!none.has_class("x"));
        none.set_attr("id", "y").add_class("x").toggle_class("x");
        assert_eq!(none.len(), 0);
    }
}
