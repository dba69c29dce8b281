//! Menu processing error types.

use thiserror::Error;

/// Errors raised while processing a menu for a request.
///
/// Both variants are programmer or configuration errors: a menu item with a
/// bad URL pattern, or a dynamic title/children callable that failed. They are
/// never caught inside the engine and abort the current pass.
#[derive(Debug, Error)]
pub enum MenuError {
    /// The item's `url` is not a valid regular expression.
    #[error("menu item url '{url}' is not a valid pattern: {source}")]
    InvalidPattern {
        url: String,
        #[source]
        source: regex::Error,
    },

    /// A dynamic title or children callable returned an error.
    #[error("menu item '{item}': failed to resolve {what}: {source}")]
    Resolve {
        item: String,
        what: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

/// Result type alias using MenuError.
pub type MenuResult<T> = Result<T, MenuError>;
