//! Error types for the gix-backed adapters.
//!
//! Mirrors `couples_core::error::CoreError`'s shape: a single rich enum,
//! `thiserror`-derived. Every public entry point converts an
//! [`AdapterError`] into a [`couples_core::CoreError::Adapter`] at the
//! trait boundary, since the core's trait methods return `CoreError`.

use thiserror::Error;

/// Errors internal to the gix-backed adapters, before being folded into
/// [`couples_core::CoreError`] at the trait boundary.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The underlying `gix` backend returned an unclassified error.
    #[error("git backend error: {message}")]
    Backend {
        /// Freeform error description from `gix`.
        message: String,
    },

    /// A requested object (commit, tree, blob) could not be found.
    #[error("not found: {message}")]
    NotFound {
        /// Human-readable description of what was missing.
        message: String,
    },
}

impl AdapterError {
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }
}

impl From<AdapterError> for couples_core::CoreError {
    fn from(err: AdapterError) -> Self {
        couples_core::CoreError::adapter(err.to_string())
    }
}
