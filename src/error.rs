//! Build error types.

use thiserror::Error;

/// Fatal errors raised while building a site.
///
/// None of these are recovered from: the first one aborts the remaining
/// phases. Items already handed to the writer stay written.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Invalid build-wide configuration (time zone, sort policy, ...).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A pipeline-controlling attribute has the wrong type or is empty.
    #[error("Invalid value for attribute `{attribute}` in item `{path}`: expected {expected}")]
    AttributeValue {
        attribute: &'static str,
        expected: &'static str,
        path: String,
    },

    /// A generated item reuses an id already present in the store.
    #[error("A previous item exists with the same id `{id}` (generator `{generator}`)")]
    Conflict { id: String, generator: String },

    /// Failure reported by a collaborator or an event listener.
    #[error(transparent)]
    Collaborator(#[from] anyhow::Error),
}

impl BuildError {
    pub(crate) fn attribute(attribute: &'static str, expected: &'static str, path: &str) -> Self {
        Self::AttributeValue {
            attribute,
            expected,
            path: path.to_owned(),
        }
    }
}
