//! Streaming logical-coupling (evolutionary coupling) analyzer over a
//! repository's commit history.
//!
//! This crate defines the collaborator interfaces repository access sits
//! behind ([`adapter`]) and implements the streaming engine that turns a
//! commit stream into a coupling report and its derived metrics, entirely
//! independent of any particular git backend. `couples-git` is one
//! concrete implementation of [`adapter`], backed by `gix`; nothing here
//! depends on it.
//!
//! # Crate layout
//!
//! - [`adapter`] — the `CommitHandle` / `TreeDiffAdapter` / `IdentityAdapter`
//!   traits repository access sits behind.
//! - [`model`] — the in-memory vocabulary (`CommitData`, `TickData`,
//!   `WorkingState`, ...) shared across the rest of the crate.
//! - [`state_machine`] — per-commit classification into a `CommitData`.
//! - [`aggregator`] — the `Analyzer`: accumulation, spill/collect, tick
//!   flushing, and fork/merge.
//! - [`spill`] — pluggable spill-storage backends for the aggregator.
//! - [`matrix`] — `finalize`: terminal working state to [`matrix::Report`].
//! - [`checkpoint`] — chunk-boundary checkpoint save/load.
//! - [`metrics`] — derives the four user-facing metrics from a `Report`.
//! - [`config`] — tunable constants and the `AggregatorConfig` knob struct.
//! - [`error`] — the `CoreError` enum returned by fallible operations.

pub mod adapter;
pub mod aggregator;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod matrix;
pub mod metrics;
pub mod model;
pub mod spill;
pub mod state_machine;

pub use adapter::{AuthorSlot, CommitHandle, IdentityAdapter, IdentityFacts, TreeDiffAdapter};
pub use aggregator::Analyzer;
pub use config::AggregatorConfig;
pub use error::CoreError;
pub use matrix::{finalize, finalize_with_names, parse_report, Report};
pub use metrics::{compute as compute_metrics, ComputedMetrics};
pub use model::{Change, CommitData, CommitId, RenamePair, TickData, WorkingState};
