//! Per-commit classification (spec §4.1).
//!
//! [`classify_commit`] is the pure transformation from a commit's raw
//! tree-diff changes into a [`CommitData`] record. It mutates only the
//! ephemeral/identity-tracking parts of [`WorkingState`] (`merges`,
//! `seen_files`, the `people`/`people_commits` capacity) — the actual
//! co-occurrence accumulation is the aggregator's job (spec §4.2).

use tracing::trace;

use crate::adapter::{AuthorSlot, CommitHandle};
use crate::model::{AuthorId, Change, CommitData, RenamePair, WorkingState};

/// Classify one commit's changes into a [`CommitData`] record, per spec
/// §4.1.
///
/// `changes` is whatever the `TreeDiffAdapter` returned for this commit
/// (already reflecting the adapter's own merge-commit treatment, e.g. a
/// synthetic all-files insert list). `is_merge` is the driver-supplied
/// flag used for merge-dedup and merge-mode filtering.
pub fn classify_commit(
    state: &mut WorkingState,
    commit: &dyn CommitHandle,
    is_merge: bool,
    changes: &[Change],
    author: AuthorSlot,
) -> CommitData {
    // 1. Merge dedup.
    let should_count = if commit.num_parents() > 1 {
        let hash = commit.hash();
        if state.merges.contains(&hash) {
            trace!(commit = %hash, "merge commit already seen, not counted");
            false
        } else {
            state.merges.insert(hash);
            true
        }
    } else {
        true
    };

    // 2-3. Author resolution (missing sentinel remaps to the stable
    //    `people_number` slot) and capacity grow.
    let author_id: AuthorId = state.resolve_author(author);

    // 4. Commit counting is recorded here; the aggregator performs the
    //    actual increment when it consumes the CommitData.
    let commit_counted = should_count;

    // 5. Classify changes.
    let mut coupling_files = Vec::new();
    let mut author_files = std::collections::BTreeMap::new();
    let mut renames = Vec::new();

    let mut touch_insert = |state: &mut WorkingState,
                             to: &str,
                             coupling_files: &mut Vec<String>,
                             author_files: &mut std::collections::BTreeMap<String, i64>| {
        let unseen = !state.seen_files.contains(to);
        if !is_merge || unseen {
            coupling_files.push(to.to_string());
            *author_files.entry(to.to_string()).or_insert(0) += 1;
        }
        state.seen_files.insert(to.to_string());
    };

    for change in changes {
        match change {
            Change::Insert { to } => {
                touch_insert(state, to, &mut coupling_files, &mut author_files);
            }
            Change::Delete { from } => {
                if !is_merge {
                    *author_files.entry(from.clone()).or_insert(0) += 1;
                }
            }
            Change::Modify { from, to } => {
                if from != to {
                    renames.push(RenamePair {
                        from_name: from.clone(),
                        to_name: to.clone(),
                    });
                }
                touch_insert(state, to, &mut coupling_files, &mut author_files);
            }
        }
    }

    CommitData {
        coupling_files,
        author_files,
        renames,
        commit_counted,
        author: author_id,
    }
}
