//! Tunable constants and knobs for the aggregator.
//!
//! A plain, serde-(de)serializable data struct. Loading it from a config
//! file and wiring CLI flags onto it is the excluded driver's job (spec
//! §1); this crate only defines the shape.

use serde::{Deserialize, Serialize};

/// The largest commit-context for which coupling is counted (spec:
/// `CouplesMaximumMeaningfulContextSize`).
pub const K_MAX: usize = 1000;

/// Co-change count at which a pair is considered "highly coupled" (spec:
/// `CouplingThresholdHigh`).
pub const COUPLING_THRESHOLD_HIGH: i64 = 10;

/// Buffer size used when counting newlines in a blob (spec:
/// `BlobReadBufferSize`).
pub const BLOB_READ_BUFFER_SIZE: usize = 32 * 1024;

/// Aggregator tuning knobs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Maximum coupling-context size before a commit's context is
    /// discarded entirely (coupling not updated; author touches still
    /// proceed normally).
    pub k_max: usize,
    /// Co-change count threshold for "highly coupled" in the aggregate
    /// metric.
    pub coupling_threshold_high: i64,
    /// Buffer size for blob line counting.
    pub blob_read_buffer_size: usize,
    /// Auto-spill threshold in estimated bytes. `None` disables
    /// auto-spill; the caller must call `spill()` explicitly if desired.
    pub spill_budget: Option<u64>,
    /// Commits per tick. `None` means the whole stream is a single tick
    /// (only flushed once, at the caller's discretion). When set, the
    /// caller is expected to poll [`crate::aggregator::Analyzer::tick_boundary_reached`]
    /// after each `add` and call `flush_tick` once it returns `true` — the
    /// aggregator never force-flushes on its own, since the caller may
    /// want to inspect the accumulated tick before it's drained.
    pub tick_size: Option<usize>,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            k_max: K_MAX,
            coupling_threshold_high: COUPLING_THRESHOLD_HIGH,
            blob_read_buffer_size: BLOB_READ_BUFFER_SIZE,
            spill_budget: None,
            tick_size: None,
        }
    }
}
