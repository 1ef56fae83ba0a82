//! A commit walker producing the traversal order the core's merge-dedup
//! requires: parents reached before the merge commits that reference them
//! (spec §5, "Ordering").

use std::sync::Arc;

use crate::commit::GixCommitHandle;
use crate::error::AdapterError;

/// Walk the history reachable from `start` (typically `HEAD`), oldest
/// first, yielding `(handle, is_merge)` pairs.
///
/// # Errors
/// Propagates `gix`'s revision-walk failures.
pub fn walk_history(
    repo: Arc<gix::Repository>,
    start: gix::ObjectId,
) -> Result<Vec<(GixCommitHandle, bool)>, AdapterError> {
    let platform = repo
        .rev_walk(std::iter::once(start))
        .sorting(gix::revision::walk::Sorting::ByCommitTimeNewestFirst)
        .all()
        .map_err(|e| AdapterError::backend(format!("rev-walk setup: {e}")))?;

    let mut newest_first = Vec::new();
    for info in platform {
        let info = info.map_err(|e| AdapterError::backend(format!("rev-walk step: {e}")))?;
        let num_parents = info.parent_ids.len();
        newest_first.push((info.id, num_parents > 1));
    }

    newest_first.reverse();
    Ok(newest_first
        .into_iter()
        .map(|(id, is_merge)| (GixCommitHandle::new(Arc::clone(&repo), id), is_merge))
        .collect())
}
