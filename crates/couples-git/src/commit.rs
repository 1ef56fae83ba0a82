//! The gix-backed [`CommitHandle`] implementation.

use std::sync::Arc;

use tracing::trace;

use couples_core::adapter::CommitHandle;
use couples_core::error::CoreError;
use couples_core::model::CommitId;

use crate::error::AdapterError;

/// A lightweight handle to a single commit, backed by a shared
/// `gix::Repository` and the commit's own object id.
///
/// Deliberately does not store a borrowed `gix::Commit<'repo>` — per the
/// "last commit for line counting" design, only `repo` (cheaply clonable)
/// and the commit's raw id are kept, so a handle can freely move across
/// fork/merge worker threads and outlive any single tree traversal.
pub struct GixCommitHandle {
    repo: Arc<gix::Repository>,
    id: gix::ObjectId,
}

impl GixCommitHandle {
    #[must_use]
    pub fn new(repo: Arc<gix::Repository>, id: gix::ObjectId) -> Self {
        Self { repo, id }
    }

    #[must_use]
    pub fn id(&self) -> gix::ObjectId {
        self.id
    }

    pub(crate) fn repo(&self) -> &gix::Repository {
        &self.repo
    }

    fn commit(&self) -> Result<gix::Commit<'_>, AdapterError> {
        self.repo
            .find_commit(self.id)
            .map_err(|e| AdapterError::not_found(format!("commit {}: {e}", self.id)))
    }
}

impl CommitHandle for GixCommitHandle {
    fn hash(&self) -> CommitId {
        CommitId::new(self.id.to_string())
    }

    fn num_parents(&self) -> usize {
        self.commit().map(|c| c.parent_ids().count()).unwrap_or(0)
    }

    fn count_lines(&self, path: &str) -> Result<Option<u32>, CoreError> {
        trace!(path, commit = %self.id, "reading blob for line count");
        let commit = self.commit()?;
        let tree = commit
            .tree()
            .map_err(|e| AdapterError::backend(format!("tree of {}: {e}", self.id)))?;

        let Some(entry) = tree
            .lookup_entry_by_path(path)
            .map_err(|e| AdapterError::backend(format!("lookup '{path}': {e}")))?
        else {
            return Ok(None);
        };

        if !entry.mode().is_blob() {
            return Ok(None);
        }

        let blob = self
            .repo
            .find_blob(entry.id())
            .map_err(|e| AdapterError::not_found(format!("blob for '{path}': {e}")))?;

        Ok(Some(count_newlines(blob.data.as_slice())))
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// Count newlines over fixed-size buffers (spec: `BlobReadBufferSize = 32
/// KiB`), matching `couples_core::config::BLOB_READ_BUFFER_SIZE`.
fn count_newlines(data: &[u8]) -> u32 {
    let buffer_size = couples_core::config::BLOB_READ_BUFFER_SIZE;
    let mut count: u32 = 0;
    for chunk in data.chunks(buffer_size) {
        count += u32::try_from(bytecount(chunk)).unwrap_or(u32::MAX);
    }
    count
}

fn bytecount(chunk: &[u8]) -> usize {
    chunk.iter().filter(|&&b| b == b'\n').count()
}
