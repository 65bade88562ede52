// ABOUTME: Configuration options threaded through selections and backend hooks.
// ABOUTME: OptionsBuilder provides a fluent API for constructing resolved Options values.

/// Resolved configuration for a document and every selection derived from it.
///
/// The selection container threads this value through construction and the
/// backend hooks without interpreting individual fields: the parse backend
/// reads `keep_whitespace`, the selector matcher reads `quirks`. A selection's
/// options are fixed for its lifetime and inherited unchanged by derived
/// selections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Keep whitespace-only text nodes produced by the parser.
    pub keep_whitespace: bool,
    /// Match class names and attribute values ASCII case-insensitively,
    /// the way quirks-mode documents do.
    pub quirks: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            keep_whitespace: true,
            quirks: false,
        }
    }
}

impl Options {
    /// Starts a builder with default options.
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder::new()
    }
}

/// Builder for [`Options`].
#[derive(Debug, Clone, Default)]
pub struct OptionsBuilder {
    opts: Options,
}

impl OptionsBuilder {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self {
            opts: Options::default(),
        }
    }

    /// Keep or drop whitespace-only text nodes during parsing.
    pub fn keep_whitespace(mut self, keep: bool) -> Self {
        self.opts.keep_whitespace = keep;
        self
    }

    /// Enable quirks-mode selector matching.
    pub fn quirks(mut self, quirks: bool) -> Self {
        self.opts.quirks = quirks;
        self
    }

    /// Build the resolved options.
    pub fn build(self) -> Options {
        self.opts
    }
}
