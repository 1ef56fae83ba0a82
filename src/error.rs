//! Error types for the coupling engine.
//!
//! Follows the same shape as `maw_git::GitError`: a single rich enum per
//! concern, `thiserror`-derived, `#[from]` for I/O. No panics are expected
//! on well-formed input — every fallible path returns a `Result`.

use thiserror::Error;

/// Errors surfaced by the core engine (state machine, aggregator, matrix
/// builder, metrics computer).
#[derive(Debug, Error)]
pub enum CoreError {
    /// Propagated from a `TreeDiffAdapter`, `IdentityAdapter`, or
    /// `CommitHandle` implementation (e.g. blob read failure).
    #[error("adapter error: {message}")]
    Adapter {
        /// Freeform context from the adapter.
        message: String,
    },

    /// I/O error during spill or checkpoint persistence.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure during spill or checkpoint
    /// persistence.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// A Report's `FilesMatrix` had the wrong dynamic shape while parsing
    /// for metrics computation.
    #[error("invalid files/people matrix")]
    InvalidMatrix,

    /// A Report's `Files`/`ReversedPeopleDict` had the wrong dynamic shape
    /// while parsing for metrics computation.
    #[error("invalid names list")]
    InvalidNames,

    /// An unsupported serialization format was requested.
    #[error("unsupported format: {format}")]
    UnsupportedFormat {
        /// The format string that was requested.
        format: String,
    },

    /// Checkpoint save/load failure.
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] crate::checkpoint::CheckpointError),
}

impl CoreError {
    /// Wrap an adapter-originated error with a message.
    #[must_use]
    pub fn adapter(message: impl Into<String>) -> Self {
        Self::Adapter {
            message: message.into(),
        }
    }
}
