// ABOUTME: Error types for selection operations.
// ABOUTME: Provides the Error enum with Selector and Parse variants plus convenience constructors.

use thiserror::Error;

/// Errors that can occur while building or querying a selection.
///
/// The container itself has no recoverable-error states; everything here is
/// raised by a collaborator (the selector compiler or a parse backend) and
/// propagated unchanged to the caller of the triggering operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// The selector text could not be compiled.
    #[error("invalid selector `{selector}`: {message}")]
    Selector { selector: String, message: String },

    /// A backend failed to turn content into a node tree.
    #[error("failed to parse content: {0}")]
    Parse(String),
}

impl Error {
    /// Creates a Selector error for the given selector source.
    pub fn selector(selector: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Selector {
            selector: selector.into(),
            message: message.into(),
        }
    }

    /// Creates a Parse error with a custom message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }

    /// Returns true if this is a Selector error.
    pub fn is_selector(&self) -> bool {
        matches!(self, Error::Selector { .. })
    }

    /// Returns true if this is a Parse error.
    pub fn is_parse(&self) -> bool {
        matches!(self, Error::Parse(_))
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
