// ABOUTME: Crate root: load factories plus re-exports of the selection surface.
// ABOUTME: Wires the default HTML backend to the shared document tree and the root selection.

//! Chainable HTML querying and manipulation over a shared document tree.
//!
//! [`load`] parses markup and hands back a root [`Selection`]; every derived
//! selection aliases the same tree, so mutations made anywhere are visible
//! everywhere. Parsing and rendering go through a pluggable [`Backend`], and
//! CSS-style matching through the [`Matcher`] contract, with a compiled
//! [`Selector`] as the built-in implementation.
//!
//! ```
//! let doc = loupe::load("<ul><li>one</li><li>two</li></ul>")?;
//! let items = doc.select("li")?;
//! assert_eq!(items.len(), 2);
//! items.add_class("item");
//! assert_eq!(items.first().text(), "one");
//! # Ok::<(), loupe::Error>(())
//! ```

pub mod api;
pub mod backend;
pub mod document;
pub mod error;
pub mod matcher;
pub mod node;
pub mod options;
pub mod selection;

use std::rc::Rc;

pub use crate::api::forms::FormField;
pub use crate::backend::{Backend, HtmlBackend};
pub use crate::document::Document;
pub use crate::error::{Error, Result};
pub use crate::matcher::{Matcher, Selector};
pub use crate::node::{Attr, Element, Node};
pub use crate::options::{Options, OptionsBuilder};
pub use crate::selection::Selection;

/// Parses `html` as a full document with default options and returns a
/// selection wrapping the document root.
pub fn load(html: &str) -> Result<Selection> {
    load_with_options(html, Options::default())
}

/// Like [`load`] with explicit options.
pub fn load_with_options(html: &str, options: Options) -> Result<Selection> {
    load_impl(html, options, true)
}

/// Parses `html` as a fragment: the result contains exactly the given nodes,
/// without the `html`/`head`/`body` wrappers a document parse synthesizes.
pub fn load_fragment(html: &str) -> Result<Selection> {
    load_impl(html, Options::default(), false)
}

/// Fragment parse with explicit options.
pub fn load_fragment_with_options(html: &str, options: Options) -> Result<Selection> {
    load_impl(html, options, false)
}

fn load_impl(html: &str, options: Options, is_document: bool) -> Result<Selection> {
    let backend: Rc<dyn Backend> = Rc::new(HtmlBackend::new());
    let doc = backend.parse(html, &options, is_document, None)?;
    let root = doc.root_id();
    Ok(Selection::with_backend(
        vec![root],
        doc,
        None,
        options,
        backend,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_load_document_wraps_root() {
        let doc = load("<p>hi</p>").unwrap();
        assert_eq!(doc.len(), 1);
        assert!(doc.root().is_none());
        assert_eq!(doc.select("p").unwrap().text(), "hi");
    }

    #[test]
    fn test_load_fragment_renders_without_wrappers() {
        let frag = load_fragment("<p>hi</p>").unwrap();
        assert_eq!(frag.select("p").unwrap().to_html(), "<p>hi</p>");
        assert!(frag.select("html").unwrap().is_empty());
    }

    #[test]
    fn test_options_propagate_to_derived_selections() {
        let options = Options::builder().quirks(true).build();
        let frag = load_fragment_with_options(r#"<p class="Big"></p>"#, options).unwrap();
        let p = frag.select("p").unwrap();
        assert!(p.options().quirks);
        assert!(p.has_class("big"));
    }

    #[test]
    fn test_invalid_selector_surfaces_error() {
        let frag = load_fragment("<p></p>").unwrap();
        let err = frag.select("p:first-child").unwrap_err();
        assert!(err.is_selector());
    }
}
