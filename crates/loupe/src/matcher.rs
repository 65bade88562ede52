// ABOUTME: Selector-matching contract consumed by traversal plus the default compiled implementation.
// ABOUTME: Supports selector groups, compound selectors, and the four CSS combinators, with a thread-safe cache.

//! Node matching for traversal operations.
//!
//! Traversal never hard-codes a selector engine; it consumes anything
//! implementing [`Matcher`]. The default implementation is [`Selector`], a
//! compiled CSS-style selector covering tag/universal/id/class/attribute
//! simple selectors, the descendant/child/sibling combinators, and selector
//! groups. Pseudo-classes are a parse error.
//!
//! Selector compilation is expensive relative to matching, so compiled
//! selectors are cached by source string; invalid selectors cache their error.

use std::collections::HashMap;
use std::sync::RwLock;

use ego_tree::NodeRef;
use once_cell::sync::Lazy;

use crate::error::{Error, Result};
use crate::node::Node;
use crate::options::Options;

/// The contract a selector engine must satisfy to plug into traversal.
///
/// `options` is the configuration of the selection being traversed; the
/// default engine reads its `quirks` flag. Closures of the same shape
/// implement the trait, so ad-hoc predicates work anywhere a selector does.
pub trait Matcher {
    /// Returns true if `element` satisfies this matcher.
    fn matches(&self, element: &NodeRef<'_, Node>, options: &Options) -> bool;
}

impl<F> Matcher for F
where
    F: Fn(&NodeRef<'_, Node>, &Options) -> bool,
{
    fn matches(&self, element: &NodeRef<'_, Node>, options: &Options) -> bool {
        self(element, options)
    }
}

/// How an attribute test compares against its expected value.
#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrOp {
    /// `[attr]`
    Exists,
    /// `[attr=v]`
    Equals,
    /// `[attr~=v]` whitespace-separated word match
    Includes,
    /// `[attr|=v]` exact or dash-prefixed match
    DashMatch,
    /// `[attr^=v]`
    Prefix,
    /// `[attr$=v]`
    Suffix,
    /// `[attr*=v]`
    Substring,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrTest {
    name: String,
    op: AttrOp,
    value: String,
}

impl AttrTest {
    fn matches(&self, actual: Option<&str>, quirks: bool) -> bool {
        let Some(actual) = actual else { return false };
        if self.op == AttrOp::Exists {
            return true;
        }
        let (actual, expected) = if quirks {
            (actual.to_ascii_lowercase(), self.value.to_ascii_lowercase())
        } else {
            (actual.to_string(), self.value.clone())
        };
        match self.op {
            AttrOp::Exists => true,
            AttrOp::Equals => actual == expected,
            AttrOp::Includes => actual.split_whitespace().any(|w| w == expected),
            AttrOp::DashMatch => {
                actual == expected
                    || actual
                        .strip_prefix(&expected)
                        .is_some_and(|rest| rest.starts_with('-'))
            }
            AttrOp::Prefix => !expected.is_empty() && actual.starts_with(&expected),
            AttrOp::Suffix => !expected.is_empty() && actual.ends_with(&expected),
            AttrOp::Substring => !expected.is_empty() && actual.contains(&expected),
        }
    }
}

/// One compound selector: everything between combinators.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrTest>,
}

impl Compound {
    fn matches(&self, node: &NodeRef<'_, Node>, options: &Options) -> bool {
        let Some(el) = node.value().as_element() else {
            return false;
        };
        if let Some(tag) = &self.tag {
            if !el.name.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if el.attr("id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self
            .classes
            .iter()
            .all(|c| el.has_class(c, options.quirks))
        {
            return false;
        }
        self.attrs
            .iter()
            .all(|t| t.matches(el.attr(&t.name), options.quirks))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
    NextSibling,
    SubsequentSibling,
}

/// One complex selector: compounds left-to-right, each linked to its left
/// neighbor by a combinator (the first entry's combinator is unused).
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    parts: Vec<(Combinator, Compound)>,
}

impl Complex {
    fn matches(&self, node: &NodeRef<'_, Node>, options: &Options) -> bool {
        matches_parts(&self.parts, node, options)
    }
}

fn matches_parts(
    parts: &[(Combinator, Compound)],
    node: &NodeRef<'_, Node>,
    options: &Options,
) -> bool {
    let Some(((combinator, compound), rest)) = parts.split_last() else {
        return true;
    };
    if !compound.matches(node, options) {
        return false;
    }
    if rest.is_empty() {
        return true;
    }
    match combinator {
        Combinator::Child => node
            .parent()
            .filter(|p| p.value().is_element())
            .is_some_and(|p| matches_parts(rest, &p, options)),
        Combinator::Descendant => node
            .ancestors()
            .filter(|a| a.value().is_element())
            .any(|a| matches_parts(rest, &a, options)),
        Combinator::NextSibling => node
            .prev_siblings()
            .find(|s| s.value().is_element())
            .is_some_and(|s| matches_parts(rest, &s, options)),
        Combinator::SubsequentSibling => node
            .prev_siblings()
            .filter(|s| s.value().is_element())
            .any(|s| matches_parts(rest, &s, options)),
    }
}

/// A compiled CSS-style selector: one or more complex selectors separated by
/// commas. A node matches if any group matches.
///
/// TODO: pseudo-classes (`:not`, `:nth-child`) show up in real-world selector
/// lists; reject them for now and grow the tokenizer when needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    groups: Vec<Complex>,
}

impl Selector {
    /// Compiles selector text, returning a recoverable error for anything the
    /// grammar does not cover.
    pub fn parse(css: &str) -> Result<Selector> {
        SelectorParser::new(css).parse()
    }
}

impl Matcher for Selector {
    fn matches(&self, element: &NodeRef<'_, Node>, options: &Options) -> bool {
        self.groups.iter().any(|g| g.matches(element, options))
    }
}

/// Thread-safe cache of compiled selectors.
///
/// Read-heavy: most accesses are hits under the shared lock, misses compile
/// once under the exclusive lock. Failed compilations are cached too, so a
/// bad selector in a hot loop costs one parse, not one per call.
static SELECTOR_CACHE: Lazy<RwLock<HashMap<String, Result<Selector>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Gets or compiles a selector, caching the outcome either way.
pub fn get_or_compile(css: &str) -> Result<Selector> {
    {
        let cache = SELECTOR_CACHE.read().unwrap();
        if let Some(cached) = cache.get(css) {
            return cached.clone();
        }
    }

    let compiled = Selector::parse(css);
    let mut cache = SELECTOR_CACHE.write().unwrap();
    // Double-check after acquiring the write lock (another thread may have
    // inserted).
    if let Some(cached) = cache.get(css) {
        return cached.clone();
    }
    cache.insert(css.to_string(), compiled.clone());
    compiled
}

struct SelectorParser<'a> {
    input: &'a str,
    rest: &'a str,
}

impl<'a> SelectorParser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, rest: input }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::selector(self.input, message)
    }

    fn peek(&self) -> Option<char> {
        self.rest.chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let mut chars = self.rest.chars();
        let c = chars.next();
        self.rest = chars.as_str();
        c
    }

    fn skip_whitespace(&mut self) -> bool {
        let before = self.rest.len();
        self.rest = self.rest.trim_start();
        before != self.rest.len()
    }

    fn parse(mut self) -> Result<Selector> {
        let mut groups = Vec::new();
        loop {
            self.skip_whitespace();
            groups.push(self.parse_complex()?);
            self.skip_whitespace();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(c) => return Err(self.error(format!("unexpected `{c}`"))),
                None => break,
            }
        }
        Ok(Selector { groups })
    }

    fn parse_complex(&mut self) -> Result<Complex> {
        let mut parts = vec![(Combinator::Descendant, self.parse_compound()?)];
        loop {
            let had_space = self.skip_whitespace();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => Combinator::Child,
                Some('+') => Combinator::NextSibling,
                Some('~') => Combinator::SubsequentSibling,
                Some(_) if had_space => Combinator::Descendant,
                Some(c) => return Err(self.error(format!("unexpected `{c}`"))),
            };
            if combinator != Combinator::Descendant {
                self.bump();
                self.skip_whitespace();
            }
            parts.push((combinator, self.parse_compound()?));
        }
        Ok(Complex { parts })
    }

    fn parse_compound(&mut self) -> Result<Compound> {
        let mut compound = Compound::default();
        let mut consumed = false;
        loop {
            match self.peek() {
                Some('*') if !consumed => {
                    self.bump();
                }
                Some('#') => {
                    self.bump();
                    compound.id = Some(self.parse_ident()?);
                }
                Some('.') => {
                    self.bump();
                    compound.classes.push(self.parse_ident()?);
                }
                Some('[') => {
                    self.bump();
                    compound.attrs.push(self.parse_attr_test()?);
                }
                Some(':') => {
                    return Err(self.error("pseudo-classes are not supported"));
                }
                Some(c) if is_ident_char(c) && !consumed => {
                    compound.tag = Some(self.parse_ident()?.to_ascii_lowercase());
                }
                _ => break,
            }
            consumed = true;
        }
        if !consumed {
            return Err(self.error("expected a selector"));
        }
        Ok(compound)
    }

    fn parse_ident(&mut self) -> Result<String> {
        let end = self
            .rest
            .char_indices()
            .find(|(_, c)| !is_ident_char(*c))
            .map(|(i, _)| i)
            .unwrap_or(self.rest.len());
        if end == 0 {
            return Err(self.error("expected an identifier"));
        }
        let ident = &self.rest[..end];
        self.rest = &self.rest[end..];
        Ok(ident.to_string())
    }

    fn parse_attr_test(&mut self) -> Result<AttrTest> {
        self.skip_whitespace();
        let name = self.parse_ident()?.to_ascii_lowercase();
        self.skip_whitespace();
        let op = match self.peek() {
            Some(']') => {
                self.bump();
                return Ok(AttrTest {
                    name,
                    op: AttrOp::Exists,
                    value: String::new(),
                });
            }
            Some('=') => {
                self.bump();
                AttrOp::Equals
            }
            Some(c @ ('~' | '|' | '^' | '$' | '*')) => {
                self.bump();
                if self.bump() != Some('=') {
                    return Err(self.error(format!("expected `=` after `{c}`")));
                }
                match c {
                    '~' => AttrOp::Includes,
                    '|' => AttrOp::DashMatch,
                    '^' => AttrOp::Prefix,
                    '$' => AttrOp::Suffix,
                    _ => AttrOp::Substring,
                }
            }
            _ => return Err(self.error("expected `]` or an attribute operator")),
        };
        self.skip_whitespace();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                let end = self
                    .rest
                    .find(quote)
                    .ok_or_else(|| self.error("unterminated attribute value"))?;
                let value = self.rest[..end].to_string();
                self.rest = &self.rest[end + 1..];
                value
            }
            _ => self.parse_ident()?,
        };
        self.skip_whitespace();
        if self.bump() != Some(']') {
            return Err(self.error("expected `]`"));
        }
        Ok(AttrTest { name, op, value })
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Attr, Element};
    use ego_tree::Tree;

    fn tree_with(html_shape: &[(&str, &str, Option<usize>)]) -> Tree<Node> {
        // (tag, "name=value name2=value2" attrs, parent index or None for root child)
        let mut tree = Tree::new(Node::Fragment);
        let mut ids = Vec::new();
        for (tag, attrs, parent) in html_shape {
            let attrs = attrs
                .split_whitespace()
                .filter_map(|kv| kv.split_once('='))
                .map(|(k, v)| Attr {
                    name: k.to_string(),
                    value: v.replace('_', " "),
                })
                .collect();
            let value = Node::Element(Element::new(*tag, attrs));
            let id = match parent {
                Some(i) => tree.get_mut(ids[*i]).unwrap().append(value).id(),
                None => tree.root_mut().append(value).id(),
            };
            ids.push(id);
        }
        tree
    }

    fn assert_matches(css: &str, tree: &Tree<Node>, index: usize, expected: bool) {
        let selector = Selector::parse(css).unwrap();
        let node = tree
            .root()
            .descendants()
            .filter(|n| n.value().is_element())
            .nth(index)
            .unwrap();
        assert_eq!(
            selector.matches(&node, &Options::default()),
            expected,
            "selector `{css}` on element #{index}"
        );
    }

    #[test]
    fn test_tag_id_class() {
        let tree = tree_with(&[("div", "id=main class=box_wide", None)]);
        assert_matches("div", &tree, 0, true);
        assert_matches("DIV", &tree, 0, true);
        assert_matches("span", &tree, 0, false);
        assert_matches("#main", &tree, 0, true);
        assert_matches(".box", &tree, 0, true);
        assert_matches(".wide", &tree, 0, true);
        assert_matches("div#main.box.wide", &tree, 0, true);
        assert_matches(".narrow", &tree, 0, false);
        assert_matches("*", &tree, 0, true);
    }

    #[test]
    fn test_attribute_operators() {
        let tree = tree_with(&[("a", "href=https://example.com/page rel=nofollow_external", None)]);
        assert_matches("[href]", &tree, 0, true);
        assert_matches("[target]", &tree, 0, false);
        assert_matches(r#"a[href="https://example.com/page"]"#, &tree, 0, true);
        assert_matches(r#"a[href^="https://"]"#, &tree, 0, true);
        assert_matches(r#"a[href$="/page"]"#, &tree, 0, true);
        assert_matches(r#"a[href*="example"]"#, &tree, 0, true);
        assert_matches("a[rel~=external]", &tree, 0, true);
        assert_matches("a[rel~=ext]", &tree, 0, false);
    }

    #[test]
    fn test_combinators() {
        let tree = tree_with(&[
            ("section", "", None),
            ("div", "", Some(0)),
            ("p", "", Some(1)),
            ("span", "", Some(1)),
        ]);
        assert_matches("section p", &tree, 2, true);
        assert_matches("section > p", &tree, 2, false);
        assert_matches("div > p", &tree, 2, true);
        assert_matches("p + span", &tree, 3, true);
        assert_matches("p ~ span", &tree, 3, true);
        assert_matches("span + p", &tree, 2, false);
    }

    #[test]
    fn test_selector_groups() {
        let tree = tree_with(&[("em", "", None)]);
        assert_matches("strong, em", &tree, 0, true);
        assert_matches("strong, b", &tree, 0, false);
    }

    #[test]
    fn test_quirks_mode_class_matching() {
        let tree = tree_with(&[("div", "class=Hero", None)]);
        let selector = Selector::parse(".hero").unwrap();
        let node = tree.root().first_child().unwrap();
        assert!(!selector.matches(&node, &Options::default()));
        let quirks = Options::builder().quirks(true).build();
        assert!(selector.matches(&node, &quirks));
    }

    #[test]
    fn test_invalid_selectors() {
        assert!(Selector::parse("[[[invalid").is_err());
        assert!(Selector::parse("").is_err());
        assert!(Selector::parse("div >").is_err());
        assert!(Selector::parse("p:first-child").is_err());
        assert!(Selector::parse("a[href=").is_err());
    }

    #[test]
    fn test_cache_returns_same_outcome() {
        assert!(get_or_compile("div.cached").is_ok());
        assert!(get_or_compile("div.cached").is_ok());
        assert!(get_or_compile("[[[bad").is_err());
        assert!(get_or_compile("[[[bad").is_err());
    }
}
