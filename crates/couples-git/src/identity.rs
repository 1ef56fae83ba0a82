//! The gix-backed [`IdentityAdapter`] implementation.
//!
//! Authors are resolved by `"name <email>"` identity string, assigned a
//! stable index the first time they're seen. A `Mutex`-guarded map keeps
//! this `Send + Sync` without requiring `&mut self` on `author_of` (the
//! trait is shared across fork/merge worker threads, each with their own
//! adapter instance in the common case, but a single shared instance is
//! also a valid caller choice).

use std::sync::Mutex;

use couples_core::adapter::{AuthorSlot, CommitHandle, IdentityAdapter, IdentityFacts};

use crate::commit::GixCommitHandle;

/// Assigns and remembers a stable `AuthorId` per distinct `"name <email>"`
/// identity string, in first-seen order.
pub struct GixIdentityAdapter {
    known: Mutex<Vec<String>>,
}

impl GixIdentityAdapter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            known: Mutex::new(Vec::new()),
        }
    }

    /// Seed the adapter with an author list whose index is already
    /// authoritative (e.g. restored from a checkpoint's
    /// `reversed_people_dict`).
    #[must_use]
    pub fn with_known_authors(authors: Vec<String>) -> Self {
        Self {
            known: Mutex::new(authors),
        }
    }

    /// A snapshot of the identities seen so far, in index order —
    /// suitable as `reversed_people_dict`.
    #[must_use]
    pub fn reversed_people_dict(&self) -> Vec<String> {
        self.known.lock().expect("identity lock poisoned").clone()
    }
}

impl Default for GixIdentityAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityAdapter for GixIdentityAdapter {
    fn author_of(&self, commit: &dyn CommitHandle) -> AuthorSlot {
        let Some(handle) = commit.as_any().downcast_ref::<GixCommitHandle>() else {
            return AuthorSlot::Missing;
        };
        let Ok(gix_commit) = handle.repo().find_commit(handle.id()) else {
            return AuthorSlot::Missing;
        };
        let Ok(decoded) = gix_commit.decode() else {
            return AuthorSlot::Missing;
        };
        let author = decoded.author();
        let identity = format!("{} <{}>", author.name, author.email);

        let mut known = self.known.lock().expect("identity lock poisoned");
        if let Some(id) = known.iter().position(|name| *name == identity) {
            return AuthorSlot::Known(id);
        }
        known.push(identity);
        AuthorSlot::Known(known.len() - 1)
    }

    fn facts(&self) -> IdentityFacts {
        let known = self.known.lock().expect("identity lock poisoned");
        IdentityFacts {
            people_count: Some(known.len()),
            reversed_people_dict: Some(known.clone()),
        }
    }
}
