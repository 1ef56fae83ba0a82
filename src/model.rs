//! Core data model: the vocabulary shared between the adapters, the state
//! machine, the aggregator, and the final report.
//!
//! These types intentionally know nothing about git, gix, or any other
//! backend — they are the in-memory shapes the streaming engine operates
//! on. See [`crate::adapter`] for the traits that feed them.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::adapter::CommitHandle;

/// An opaque string key identifying a tracked file.
///
/// Ordering is lexicographic for the final sequence but otherwise
/// irrelevant during accumulation.
pub type PathKey = String;

/// A commit identifier, opaque to the core engine (typically a hex hash).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommitId(String);

impl CommitId {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CommitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An author index in `[0, PeopleNumber]`. The sentinel value
/// `PeopleNumber` (i.e. `people_number`, the length of the dict at the
/// time of capacity growth) denotes "author missing/unknown".
pub type AuthorId = usize;

/// The kind of change carried by a single tree-diff entry.
///
/// `Insert` carries only the new path, `Delete` only the old path, and
/// `Modify` both — `from != to` in `Modify` iff the change is also a
/// rename.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Change {
    Insert { to: PathKey },
    Delete { from: PathKey },
    Modify { from: PathKey, to: PathKey },
}

/// A rename observed while classifying a `Modify` change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenamePair {
    pub from_name: PathKey,
    pub to_name: PathKey,
}

/// Per-commit payload emitted by the [`crate::state_machine`].
///
/// `coupling_files` may contain duplicates — deduplication before pairing
/// is the aggregator's responsibility (spec: "order-insensitive but
/// deduplication is the caller's responsibility").
#[derive(Clone, Debug, Default)]
pub struct CommitData {
    pub coupling_files: Vec<PathKey>,
    pub author_files: BTreeMap<PathKey, i64>,
    pub renames: Vec<RenamePair>,
    pub commit_counted: bool,
    pub author: AuthorId,
}

/// The body of a [`TickData`] when the tick accumulated anything.
#[derive(Clone, Debug, Default)]
pub struct TickPayload {
    pub files: BTreeMap<PathKey, BTreeMap<PathKey, i64>>,
    pub people: Vec<BTreeMap<PathKey, i64>>,
    pub people_commits: Vec<i64>,
    pub renames: Vec<RenamePair>,
}

impl TickPayload {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
            && self.people.iter().all(BTreeMap::is_empty)
            && self.people_commits.iter().all(|c| *c == 0)
            && self.renames.is_empty()
    }
}

/// A time bucket emitted by the aggregator.
///
/// `data` is `None` ("null") when nothing was accumulated since the
/// previous flush.
#[derive(Clone, Debug)]
pub struct TickData {
    pub tick: usize,
    pub data: Option<TickPayload>,
}

/// The mutable state owned by a single analyzer instance.
///
/// This is exactly what [`crate::aggregator::Analyzer::fork`] clones
/// independently and what [`crate::aggregator::Analyzer::merge_from`]
/// combines back onto the receiver, and what [`crate::checkpoint`]
/// persists the relevant slice of.
#[derive(Clone, Default)]
pub struct WorkingState {
    /// Sparse file x file co-occurrence matrix, accumulated.
    pub files: BTreeMap<PathKey, BTreeMap<PathKey, i64>>,
    /// `AuthorId -> (Path -> touch count)`.
    pub people: Vec<BTreeMap<PathKey, i64>>,
    /// `AuthorId -> commit count`.
    pub people_commits: Vec<i64>,
    /// Merge-commit identifiers already observed (merge-dedup, spec §4.1).
    pub merges: BTreeSet<CommitId>,
    /// Accumulated renames.
    pub renames: Vec<RenamePair>,
    /// Paths ever seen (drives merge-mode filtering, spec §4.1).
    pub seen_files: BTreeSet<PathKey>,
    /// The number of known (non-sentinel) authors observed so far. The
    /// missing-author sentinel always resolves to this value, so it stays
    /// stable across commits instead of drifting every time an unknown
    /// author is seen.
    pub people_number: usize,
    /// The most recently processed commit, kept only to read file line
    /// counts in `finalize`. Stored as a trait object handle (not a
    /// borrowed tree) per the "last commit" design note: the adapter
    /// exposes `count_lines` so we never hold a borrow across the fork's
    /// lifetime.
    pub last_commit: Option<Arc<dyn CommitHandle>>,
}

impl std::fmt::Debug for WorkingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkingState")
            .field("files_len", &self.files.len())
            .field("people_len", &self.people.len())
            .field("people_commits", &self.people_commits)
            .field("merges_len", &self.merges.len())
            .field("renames_len", &self.renames.len())
            .field("seen_files_len", &self.seen_files.len())
            .field("people_number", &self.people_number)
            .field("last_commit", &self.last_commit.as_ref().map(|c| c.hash()))
            .finish()
    }
}

impl WorkingState {
    /// Ensure `people`/`people_commits` have at least `author + 1` slots,
    /// extending with fresh empty maps / zeroes as needed (spec §4.1 step
    /// 3, "capacity grow" — never a fatal error).
    pub fn ensure_capacity(&mut self, author: AuthorId) {
        if self.people.len() <= author {
            self.people.resize(author + 1, BTreeMap::new());
        }
        if self.people_commits.len() <= author {
            self.people_commits.resize(author + 1, 0);
        }
    }

    /// Resolve a commit's author into a concrete slot, per spec §4.1 steps
    /// 2-3: a known author index grows `people_number` when it is new;
    /// the missing sentinel always resolves to the current
    /// `people_number`, keeping it stable across commits.
    pub fn resolve_author(&mut self, author: crate::adapter::AuthorSlot) -> AuthorId {
        use crate::adapter::AuthorSlot;
        let id = match author {
            AuthorSlot::Known(id) => {
                if id >= self.people_number {
                    self.people_number = id + 1;
                }
                id
            }
            AuthorSlot::Missing => self.people_number,
        };
        self.ensure_capacity(id);
        id
    }

    /// Clear the ephemeral, chunk-scoped parts of the state: `merges` and
    /// `last_commit` (spec §4.7 `Hibernate`).
    pub fn hibernate(&mut self) {
        self.merges.clear();
        self.last_commit = None;
    }

    /// Ensure `merges` is a fresh, empty set at chunk start (spec §4.7
    /// `Boot`). `seen_files` persists across chunks by design — only
    /// `merges`/`last_commit` are chunk-ephemeral.
    pub fn boot(&mut self) {
        self.merges.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_capacity_grows_both_vectors() {
        let mut state = WorkingState::default();
        state.ensure_capacity(3);
        assert_eq!(state.people.len(), 4);
        assert_eq!(state.people_commits.len(), 4);
    }

    #[test]
    fn ensure_capacity_is_idempotent() {
        let mut state = WorkingState::default();
        state.ensure_capacity(3);
        state.people[1].insert("a.go".to_string(), 5);
        state.ensure_capacity(1);
        assert_eq!(state.people.len(), 4);
        assert_eq!(state.people[1]["a.go"], 5);
    }

    #[test]
    fn hibernate_clears_merges_and_last_commit() {
        let mut state = WorkingState::default();
        state.merges.insert(CommitId::new("a".repeat(40)));
        state.hibernate();
        assert!(state.merges.is_empty());
        assert!(state.last_commit.is_none());
    }

    #[test]
    fn tick_payload_empty_detection() {
        let mut payload = TickPayload::default();
        assert!(payload.is_empty());
        payload
            .files
            .entry("a.go".into())
            .or_default()
            .insert("a.go".into(), 1);
        assert!(!payload.is_empty());
    }
}
