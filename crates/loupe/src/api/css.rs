// ABOUTME: Inline-style operations over the `style` attribute.
// ABOUTME: Declarations are parsed on read and re-serialized on write; order is preserved.

use crate::selection::Selection;

impl Selection {
    /// Value of the inline-style declaration `name` on the first element in
    /// the selection.
    pub fn css(&self, name: &str) -> Option<String> {
        let style = self.attr("style")?;
        parse_style(&style)
            .into_iter()
            .find(|(prop, _)| prop == name)
            .map(|(_, value)| value)
    }

    /// All inline-style declarations of the first element, in declaration
    /// order.
    pub fn styles(&self) -> Vec<(String, String)> {
        self.attr("style")
            .map(|style| parse_style(&style))
            .unwrap_or_default()
    }

    /// Sets the inline-style declaration `name` to `value` on every element in
    /// the selection, replacing an existing declaration of the same property
    /// in place.
    pub fn set_css(&self, name: &str, value: &str) -> &Self {
        let mut tree = self.document().tree_mut();
        for id in self.iter() {
            if let Some(mut node) = tree.get_mut(id) {
                if let Some(el) = node.value().as_element_mut() {
                    let mut decls = parse_style(el.attr("style").unwrap_or(""));
                    match decls.iter_mut().find(|(prop, _)| prop == name) {
                        Some((_, existing)) => *existing = value.to_string(),
                        None => decls.push((name.to_string(), value.to_string())),
                    }
                    el.set_attr("style", &write_style(&decls));
                }
            }
        }
        self
    }

    /// Removes the inline-style declaration `name` from every element. An
    /// element whose style becomes empty loses the attribute entirely.
    pub fn remove_css(&self, name: &str) -> &Self {
        let mut tree = self.document().tree_mut();
        for id in self.iter() {
            if let Some(mut node) = tree.get_mut(id) {
                if let Some(el) = node.value().as_element_mut() {
                    let mut decls = parse_style(el.attr("style").unwrap_or(""));
                    decls.retain(|(prop, _)| prop != name);
                    if decls.is_empty() {
                        el.remove_attr("style");
                    } else {
                        el.set_attr("style", &write_style(&decls));
                    }
                }
            }
        }
        self
    }
}

/// Splits a style attribute into (property, value) pairs. Declarations without
/// a colon and empty segments are dropped.
fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (prop, value) = decl.split_once(':')?;
            let prop = prop.trim();
            if prop.is_empty() {
                return None;
            }
            Some((prop.to_string(), value.trim().to_string()))
        })
        .collect()
}

fn write_style(decls: &[(String, String)]) -> String {
    decls
        .iter()
        .map(|(prop, value)| format!("{prop}: {value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use crate::load_fragment;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_css_read() {
        let root = load_fragment(r#"<div style="color: red; margin:0"></div>"#).unwrap();
        let div = root.select("div").unwrap();
        assert_eq!(div.css("color").as_deref(), Some("red"));
        assert_eq!(div.css("margin").as_deref(), Some("0"));
        assert_eq!(div.css("padding"), None);
        assert_eq!(
            div.styles(),
            vec![
                ("color".to_string(), "red".to_string()),
                ("margin".to_string(), "0".to_string()),
            ]
        );
    }

    #[test]
    fn test_set_css_updates_in_place() {
        let root = load_fragment(r#"<div style="color: red; margin: 0"></div>"#).unwrap();
        let div = root.select("div").unwrap();
        div.set_css("color", "blue").set_css("padding", "1em");
        assert_eq!(
            div.attr("style").as_deref(),
            Some("color: blue; margin: 0; padding: 1em")
        );
    }

    #[test]
    fn test_remove_css_drops_empty_attribute() {
        let root = load_fragment(r#"<div style="color: red"></div>"#).unwrap();
        let div = root.select("div").unwrap();
        div.remove_css("color");
        assert_eq!(div.attr("style"), None);
    }

    #[test]
    fn test_set_css_without_prior_style() {
        let root = load_fragment("<p>x</p>").unwrap();
        let p = root.select("p").unwrap();
        p.set_css("display", "none");
        assert_eq!(p.attr("style").as_deref(), Some("display: none"));
    }

    #[test]
    fn test_malformed_declarations_are_skipped() {
        let root = load_fragment(r#"<div style="color red; ; width: 10px"></div>"#).unwrap();
        let div = root.select("div").unwrap();
        assert_eq!(div.css("color"), None);
        assert_eq!(div.css("width").as_deref(), Some("10px"));
    }
}
