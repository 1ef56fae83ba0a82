//! The three collaborator interfaces repository access sits behind.
//!
//! Per the system's scope, commit iteration, tree diffing, blob reading,
//! and author identification are "external collaborators via their
//! interfaces" — this module defines those interfaces, not their
//! implementations. `couples-git` is one concrete implementation, backed
//! by `gix`; nothing in this crate depends on it.

use crate::error::CoreError;
use crate::model::{Change, CommitId};

/// A lightweight handle to a single commit.
///
/// Deliberately *not* a borrowed reference to a repository-native commit
/// object: `count_lines` lets the core retain only a cheap handle for the
/// lifetime of a fork, rather than threading a lifetime-tied borrow
/// through the whole analyzer (see design note "Last commit for line
/// counting").
///
/// Must be `Send + Sync`: the fork/merge model processes disjoint commit
/// ranges on separate worker threads, and a `last_commit` handle can move
/// from a worker thread onto the merge receiver.
pub trait CommitHandle: Send + Sync {
    /// The commit's own identifier.
    fn hash(&self) -> CommitId;

    /// Number of parent commits (0 for a root commit, 2+ for an octopus
    /// merge).
    fn num_parents(&self) -> usize;

    /// Count newlines in the blob at `path` as it exists in this commit's
    /// tree, in fixed-size buffers (spec: `BlobReadBufferSize = 32 KiB`).
    ///
    /// Returns `Ok(None)` if `path` is absent from this commit's tree —
    /// this is not an error; callers record 0 lines for such files and
    /// continue (spec §7 partial-failure policy).
    fn count_lines(&self, path: &str) -> Result<Option<u32>, CoreError>;

    /// Expose the concrete handle for backend-specific adapters (e.g. a
    /// `TreeDiffAdapter` that needs the underlying repository handle,
    /// not just `hash`/`num_parents`/`count_lines`) to downcast via
    /// [`std::any::Any`].
    fn as_any(&self) -> &dyn std::any::Any;
}

/// Supplies the per-commit change list.
///
/// Implementations decide how a merge commit's "all files" change-list is
/// synthesized (see `couples-git`'s `GixTreeDiffAdapter` for the
/// conventional treatment); the core only consumes whatever action/path
/// tuples come back and applies merge-mode filtering via `seen_files`.
pub trait TreeDiffAdapter: Send + Sync {
    fn changes(&self, commit: &dyn CommitHandle, is_merge: bool) -> Result<Vec<Change>, CoreError>;
}

/// The result of resolving a commit's author.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthorSlot {
    /// A known author index in `[0, people_count)`.
    Known(usize),
    /// No identity could be attached to this commit.
    Missing,
}

/// Up-front facts an `IdentityAdapter` may supply at configure time
/// (spec §6: `FactIdentityDetectorPeopleCount` /
/// `FactIdentityDetectorReversedPeopleDict`). When absent, `PeopleNumber`
/// is learned incrementally as unseen authors are encountered.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdentityFacts {
    pub people_count: Option<usize>,
    pub reversed_people_dict: Option<Vec<String>>,
}

/// Supplies the per-commit author index.
pub trait IdentityAdapter: Send + Sync {
    fn author_of(&self, commit: &dyn CommitHandle) -> AuthorSlot;

    /// Up-front facts, if known ahead of time. Default: learn incrementally.
    fn facts(&self) -> IdentityFacts {
        IdentityFacts::default()
    }
}
