//! Spill storage backends for the aggregator (spec §4.2, §9).
//!
//! The spec leaves the persistent-storage format unspecified beyond
//! "append-only shards, keyed by monotonically increasing spill-id". We
//! supplement with a small [`SpillStore`] trait (the seam, same idiom as
//! `maw_git::GitRepo`) plus two implementations: an in-memory one for
//! tests and a file-backed one for real use.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::CoreError;
use crate::model::PathKey;

/// One shard's worth of the `files` co-occurrence map.
pub type Shard = BTreeMap<PathKey, BTreeMap<PathKey, i64>>;

/// A pluggable backing store for spilled `files` shards.
///
/// Shards are append-only and keyed by a caller-assigned monotonic id.
/// Implementations must not share state across distinct `SpillStore`
/// instances (spec §5: "spill storage is keyed per-aggregator instance
/// and must not be shared across instances").
pub trait SpillStore: Send {
    /// Persist one shard, returning its assigned id.
    fn write_shard(&mut self, shard: &Shard) -> Result<u64, CoreError>;

    /// Read back every shard written so far, in write order.
    fn read_shards(&mut self) -> Result<Vec<Shard>, CoreError>;

    /// Release any resources (file handles, temp directories). Must be
    /// idempotent.
    fn close(&mut self) -> Result<(), CoreError>;
}

/// An in-memory spill store, useful for tests and for callers that only
/// want bounded peak memory via explicit flush points rather than true
/// disk offload.
#[derive(Default)]
pub struct InMemorySpillStore {
    shards: Vec<Shard>,
    closed: bool,
}

impl InMemorySpillStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SpillStore for InMemorySpillStore {
    fn write_shard(&mut self, shard: &Shard) -> Result<u64, CoreError> {
        self.shards.push(shard.clone());
        Ok(self.shards.len() as u64 - 1)
    }

    fn read_shards(&mut self) -> Result<Vec<Shard>, CoreError> {
        Ok(self.shards.clone())
    }

    fn close(&mut self) -> Result<(), CoreError> {
        self.closed = true;
        Ok(())
    }
}

/// A file-backed spill store: each shard is one `serde_json`-encoded file
/// named `shard-<id>.json` under `dir`.
pub struct FileSpillStore {
    dir: PathBuf,
    next_id: u64,
    closed: bool,
}

impl FileSpillStore {
    /// Open (creating if necessary) a spill directory.
    ///
    /// # Errors
    /// Returns [`CoreError::Io`] if `dir` cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        let mut next_id = 0;
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            if let Some(id) = shard_id_from_filename(&entry.file_name()) {
                next_id = next_id.max(id + 1);
            }
        }
        Ok(Self {
            dir,
            next_id,
            closed: false,
        })
    }

    fn shard_path(&self, id: u64) -> PathBuf {
        self.dir.join(format!("shard-{id}.json"))
    }
}

fn shard_id_from_filename(name: &std::ffi::OsStr) -> Option<u64> {
    let name = name.to_str()?;
    let rest = name.strip_prefix("shard-")?.strip_suffix(".json")?;
    rest.parse().ok()
}

impl SpillStore for FileSpillStore {
    fn write_shard(&mut self, shard: &Shard) -> Result<u64, CoreError> {
        let id = self.next_id;
        self.next_id += 1;
        let path = self.shard_path(id);
        let bytes = serde_json::to_vec(shard)?;
        std::fs::write(path, bytes)?;
        Ok(id)
    }

    fn read_shards(&mut self) -> Result<Vec<Shard>, CoreError> {
        let mut ids: Vec<u64> = std::fs::read_dir(&self.dir)?
            .filter_map(|e| e.ok())
            .filter_map(|e| shard_id_from_filename(&e.file_name()))
            .collect();
        ids.sort_unstable();
        ids.into_iter()
            .map(|id| {
                let bytes = std::fs::read(self.shard_path(id))?;
                Ok(serde_json::from_slice(&bytes)?)
            })
            .collect()
    }

    fn close(&mut self) -> Result<(), CoreError> {
        self.closed = true;
        Ok(())
    }
}

impl Drop for FileSpillStore {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// `merge_file_couplings` (spec §4.5): combine `incoming` onto `existing`,
/// key by key, `combined[k] = existing[k] + v` for every `(k, v)` in
/// `incoming`; keys only in `existing` pass through unchanged.
pub fn merge_file_couplings(existing: &mut Shard, incoming: &Shard) {
    for (path, inner) in incoming {
        let entry = existing.entry(path.clone()).or_default();
        for (other, count) in inner {
            *entry.entry(other.clone()).or_insert(0) += count;
        }
    }
}
