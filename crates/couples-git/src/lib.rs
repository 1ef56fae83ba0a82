//! The `gix`-backed adapter implementation for `couples-core`.
//!
//! This crate defines no public trait of its own — it implements
//! `couples_core::adapter`'s three collaborator traits
//! (`CommitHandle`, `TreeDiffAdapter`, `IdentityAdapter`) over `gix`.
//! Nothing in `couples-core` depends on this crate; a driver wires them
//! together.
//!
//! # Crate layout
//!
//! - [`commit`] — [`commit::GixCommitHandle`], the `CommitHandle` impl.
//! - [`diff`] — [`diff::GixTreeDiffAdapter`], the `TreeDiffAdapter` impl,
//!   including the merge-commit synthetic all-files treatment.
//! - [`identity`] — [`identity::GixIdentityAdapter`], the `IdentityAdapter`
//!   impl, assigning stable author indices by `"name <email>"` identity.
//! - [`walk`] — [`walk::walk_history`], a commit walker producing the
//!   oldest-first traversal order merge-dedup depends on.
//! - [`error`] — [`error::AdapterError`], folded into `CoreError::Adapter`
//!   at the trait boundary.

pub mod commit;
pub mod diff;
pub mod error;
pub mod identity;
pub mod walk;

pub use commit::GixCommitHandle;
pub use diff::GixTreeDiffAdapter;
pub use error::AdapterError;
pub use identity::GixIdentityAdapter;
pub use walk::walk_history;
