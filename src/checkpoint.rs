//! Checkpoint persistence (spec §4.7): the minimum state needed to resume
//! processing the next commit chunk.
//!
//! Mirrors `maw_core::oplog::checkpoint`'s pattern of a thin, explicitly
//! serializable snapshot struct distinct from the live working state —
//! `CheckpointData` here, not [`crate::model::WorkingState`] itself.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::model::{CommitId, WorkingState};

const CHECKPOINT_FILE_NAME: &str = "couples_state.json";

/// Failures from saving or loading a checkpoint.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// The four fields spec §4.7 says survive a checkpoint; everything else
/// in [`WorkingState`] is the aggregator's job to drain at chunk
/// boundaries.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckpointData {
    pub seen_files: Vec<String>,
    pub merges: Vec<String>,
    pub people_number: usize,
    pub reversed_people_dict: Vec<String>,
}

impl CheckpointData {
    /// Snapshot the checkpoint-relevant slice of a [`WorkingState`],
    /// sorting/deduplicating `seen_files` and `merges` as spec §4.7
    /// requires.
    #[must_use]
    pub fn from_state(state: &WorkingState, reversed_people_dict: Vec<String>) -> Self {
        Self {
            seen_files: state.seen_files.iter().cloned().collect(),
            merges: state.merges.iter().map(ToString::to_string).collect(),
            people_number: state.people_number,
            reversed_people_dict,
        }
    }

    /// Restore the checkpointed fields onto `state`, leaving
    /// `files`/`people`/`people_commits` untouched (the aggregator owns
    /// those, per spec §4.7).
    pub fn apply_to(&self, state: &mut WorkingState) {
        state.seen_files = self.seen_files.iter().cloned().collect();
        state.merges = self.merges.iter().cloned().map(CommitId::new).collect();
        state.people_number = self.people_number;
        state.ensure_capacity(self.people_number.saturating_sub(1));
    }

    /// A coarse byte estimate (spec §4.7): `100 + 60·|seen_files| +
    /// 44·|merges| + 50·|people_dict|`.
    #[must_use]
    pub fn checkpoint_size(&self) -> usize {
        100 + 60 * self.seen_files.len() + 44 * self.merges.len() + 50 * self.reversed_people_dict.len()
    }
}

/// Write `data` as `<dir>/couples_state.json`.
///
/// # Errors
/// Propagates I/O and serialization failures.
pub fn save_checkpoint(dir: &Path, data: &CheckpointData) -> Result<(), CheckpointError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(CHECKPOINT_FILE_NAME);
    let bytes = serde_json::to_vec_pretty(data)?;
    std::fs::write(&path, bytes)?;
    debug!(path = %path.display(), size = data.checkpoint_size(), "saved checkpoint");
    Ok(())
}

/// Read `<dir>/couples_state.json`.
///
/// # Errors
/// Propagates I/O and deserialization failures.
pub fn load_checkpoint(dir: &Path) -> Result<CheckpointData, CheckpointError> {
    let path = dir.join(CHECKPOINT_FILE_NAME);
    let bytes = std::fs::read(&path)?;
    let data = serde_json::from_slice(&bytes)?;
    debug!(path = %path.display(), "loaded checkpoint");
    Ok(data)
}
