//! The aggregator (spec §4.2): consumes [`CommitData`], accumulates the
//! sparse working state, optionally spills to storage, and emits
//! [`TickData`] at tick boundaries.
//!
//! This module also owns the top-level [`Analyzer`] type, which ties the
//! state machine (spec §4.1), the aggregator proper, and fork/merge
//! (spec §4.4) together around one [`WorkingState`].

use std::sync::Arc;

use tracing::{debug, trace};

use crate::adapter::{AuthorSlot, CommitHandle, IdentityAdapter, TreeDiffAdapter};
use crate::config::AggregatorConfig;
use crate::error::CoreError;
use crate::model::{CommitData, TickData, TickPayload, WorkingState};
use crate::spill::{merge_file_couplings, InMemorySpillStore, SpillStore};
use crate::state_machine::classify_commit;

/// The streaming co-occurrence engine.
///
/// Owns one [`WorkingState`], a pluggable [`SpillStore`], and the
/// aggregator's tuning knobs. A single instance is single-threaded; use
/// [`Analyzer::fork`] / [`Analyzer::merge_from`] for parallelism across
/// disjoint commit ranges (spec §5).
pub struct Analyzer {
    state: WorkingState,
    spill: Box<dyn SpillStore>,
    config: AggregatorConfig,
    tick_index: usize,
    commits_since_tick: usize,
}

impl Analyzer {
    /// Build an analyzer with an in-memory spill store and the given
    /// config.
    #[must_use]
    pub fn new(config: AggregatorConfig) -> Self {
        Self::with_spill_store(config, Box::new(InMemorySpillStore::new()))
    }

    /// Build an analyzer with an explicit spill store (e.g.
    /// [`crate::spill::FileSpillStore`]).
    #[must_use]
    pub fn with_spill_store(config: AggregatorConfig, spill: Box<dyn SpillStore>) -> Self {
        Self {
            state: WorkingState::default(),
            spill,
            config,
            tick_index: 0,
            commits_since_tick: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> &WorkingState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut WorkingState {
        &mut self.state
    }

    #[must_use]
    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Full per-commit pipeline: resolve changes/author via the adapters,
    /// classify (spec §4.1), then accumulate (spec §4.2 `add`).
    ///
    /// # Errors
    /// Propagates adapter failures.
    pub fn consume(
        &mut self,
        commit: Arc<dyn CommitHandle>,
        is_merge: bool,
        tree_diff: &dyn TreeDiffAdapter,
        identity: &dyn IdentityAdapter,
    ) -> Result<(), CoreError> {
        let changes = tree_diff.changes(commit.as_ref(), is_merge)?;
        let author = identity.author_of(commit.as_ref());
        let data = classify_commit(&mut self.state, commit.as_ref(), is_merge, &changes, author);
        self.state.last_commit = Some(commit);
        self.add(data)
    }

    /// Absorb one [`CommitData`] record into the working state (spec
    /// §4.2 `add`).
    ///
    /// # Errors
    /// Propagates I/O errors from an auto-triggered spill.
    pub fn add(&mut self, data: CommitData) -> Result<(), CoreError> {
        trace!(author = data.author, files = data.coupling_files.len(), "add");

        if data.coupling_files.len() <= self.config.k_max {
            let unique: std::collections::BTreeSet<&String> = data.coupling_files.iter().collect();
            for &a in &unique {
                for &b in &unique {
                    *self
                        .state
                        .files
                        .entry(a.clone())
                        .or_default()
                        .entry(b.clone())
                        .or_insert(0) += 1;
                }
            }
        }

        self.state.ensure_capacity(data.author);
        let bucket = &mut self.state.people[data.author];
        for (path, count) in &data.author_files {
            *bucket.entry(path.clone()).or_insert(0) += count;
        }

        if data.commit_counted {
            self.state.people_commits[data.author] += 1;
        }

        self.state.renames.extend(data.renames);
        self.commits_since_tick += 1;

        if let Some(budget) = self.config.spill_budget {
            if self.estimated_state_size() > budget {
                self.spill()?;
            }
        }

        Ok(())
    }

    /// Commits absorbed by `add` since the last [`Analyzer::flush_tick`].
    #[must_use]
    pub fn commits_since_tick(&self) -> usize {
        self.commits_since_tick
    }

    /// Whether `config.tick_size` commits have accumulated since the last
    /// flush, i.e. the caller should call [`Analyzer::flush_tick`] to honor
    /// the configured tick boundary. Always `false` when `tick_size` is
    /// `None` (the whole stream is a single tick).
    #[must_use]
    pub fn tick_boundary_reached(&self) -> bool {
        self.config
            .tick_size
            .is_some_and(|tick_size| self.commits_since_tick >= tick_size)
    }

    /// Detach the current `files`/`people`/`people_commits`/`renames`
    /// into a [`TickData`], resetting the in-memory accumulators to
    /// empty (spec §4.2 `flush_tick`).
    pub fn flush_tick(&mut self) -> TickData {
        let tick = self.tick_index;
        self.tick_index += 1;
        self.commits_since_tick = 0;

        let payload = TickPayload {
            files: std::mem::take(&mut self.state.files),
            people: std::mem::take(&mut self.state.people),
            people_commits: std::mem::take(&mut self.state.people_commits),
            renames: std::mem::take(&mut self.state.renames),
        };

        let data = if payload.is_empty() { None } else { Some(payload) };
        TickData { tick, data }
    }

    /// Write the current `files` map to the spill store, emptying the
    /// in-memory map. Idempotent on an empty state (returns 0).
    ///
    /// # Errors
    /// Propagates the spill store's I/O failures.
    pub fn spill(&mut self) -> Result<u64, CoreError> {
        if self.state.files.is_empty() {
            return Ok(0);
        }
        let shard = std::mem::take(&mut self.state.files);
        let freed = estimate_shard_size(&shard);
        self.spill.write_shard(&shard)?;
        debug!(freed, "spilled files shard");
        Ok(freed)
    }

    /// Read back every spilled shard and merge it into the in-memory
    /// `files` map.
    ///
    /// # Errors
    /// Propagates the spill store's I/O failures.
    pub fn collect(&mut self) -> Result<(), CoreError> {
        let shards = self.spill.read_shards()?;
        debug!(shard_count = shards.len(), "collecting spilled shards");
        for shard in shards {
            merge_file_couplings(&mut self.state.files, &shard);
        }
        Ok(())
    }

    /// A coarse byte estimate of the in-memory working set, used to
    /// decide when to auto-spill.
    #[must_use]
    pub fn estimated_state_size(&self) -> u64 {
        estimate_shard_size(&self.state.files)
            + self
                .state
                .people
                .iter()
                .map(|m| m.len() as u64 * 48)
                .sum::<u64>()
    }

    /// Release spill-storage resources. Idempotent.
    ///
    /// # Errors
    /// Propagates the spill store's close failure.
    pub fn close(&mut self) -> Result<(), CoreError> {
        self.spill.close()
    }

    /// Fork into `n` independent analyzers, each with fresh working state
    /// (fresh in-memory spill store) but the same config (spec §4.4
    /// `fork`).
    #[must_use]
    pub fn fork(&self, n: usize) -> Vec<Analyzer> {
        debug!(n, people_number = self.state.people_number, "fork");
        (0..n)
            .map(|_| {
                let mut clone = Analyzer::new(self.config.clone());
                clone.state.people_number = self.state.people_number;
                clone
            })
            .collect()
    }

    /// Deterministically merge `branches` onto `self` (spec §4.4
    /// `merge`): pointwise addition of `files`/`people`/`people_commits`,
    /// set union of `merges`, concatenation of `renames`, and the last
    /// non-null `last_commit` wins.
    pub fn merge_from(&mut self, branches: Vec<Analyzer>) {
        debug!(branch_count = branches.len(), "merge");
        for branch in branches {
            merge_file_couplings(&mut self.state.files, &branch.state.files);

            if self.state.people.len() < branch.state.people.len() {
                self.state
                    .people
                    .resize(branch.state.people.len(), Default::default());
            }
            for (i, bucket) in branch.state.people.into_iter().enumerate() {
                for (path, count) in bucket {
                    *self.state.people[i].entry(path).or_insert(0) += count;
                }
            }

            if self.state.people_commits.len() < branch.state.people_commits.len() {
                self.state
                    .people_commits
                    .resize(branch.state.people_commits.len(), 0);
            }
            for (i, count) in branch.state.people_commits.into_iter().enumerate() {
                self.state.people_commits[i] += count;
            }

            self.state.people_number = self.state.people_number.max(branch.state.people_number);
            self.state.merges.extend(branch.state.merges);
            self.state.renames.extend(branch.state.renames);
            self.state.seen_files.extend(branch.state.seen_files);

            if branch.state.last_commit.is_some() {
                self.state.last_commit = branch.state.last_commit;
            }
        }
    }
}

/// Coarse byte estimator for a `files`-shaped sparse map: a handful of
/// bytes of map/string overhead per entry, enough to drive an auto-spill
/// decision without walking every string's actual length.
fn estimate_shard_size(shard: &crate::spill::Shard) -> u64 {
    shard
        .iter()
        .map(|(k, inner)| (k.len() as u64 + 24) + inner.len() as u64 * 40)
        .sum()
}
