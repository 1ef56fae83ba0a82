//! `FileMatrixBuilder` / `finalize` (spec §4.3): turns a terminal
//! [`WorkingState`] into the final [`Report`].

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::adapter::CommitHandle;
use crate::model::{PathKey, WorkingState};

/// The final report, keyed exactly as spec.md §6 names the payload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Sorted lexicographically.
    #[serde(rename = "Files")]
    pub files: Vec<PathKey>,
    /// Aligned with `files`.
    #[serde(rename = "FilesLines")]
    pub files_lines: Vec<u32>,
    /// Sparse; row `i` corresponds to `files[i]`.
    #[serde(rename = "FilesMatrix")]
    pub files_matrix: Vec<BTreeMap<usize, i64>>,
    /// Sparse; indexed `[0, people_number]`.
    #[serde(rename = "PeopleMatrix")]
    pub people_matrix: Vec<BTreeMap<usize, i64>>,
    /// Sorted file indices touched by each author.
    #[serde(rename = "PeopleFiles")]
    pub people_files: Vec<Vec<usize>>,
    /// Author names, indexed by `AuthorId`.
    #[serde(rename = "ReversedPeopleDict")]
    pub reversed_people_dict: Vec<String>,
}

/// Build a [`Report`] from the terminal working state (spec §4.3).
///
/// Blob reads for line counts never fail the whole operation (spec §7
/// partial-failure policy): a read error or absent file is recorded as 0
/// lines and logged at `warn!`.
#[must_use]
pub fn finalize(state: &WorkingState) -> Report {
    let current_files: BTreeSet<PathKey> = match &state.last_commit {
        Some(commit) => files_in_tree(commit.as_ref(), state),
        None => state.files.keys().cloned().collect(),
    };

    let files_sequence: Vec<PathKey> = current_files.into_iter().collect();
    let files_index: BTreeMap<&PathKey, usize> = files_sequence
        .iter()
        .enumerate()
        .map(|(i, p)| (p, i))
        .collect();

    let files_matrix: Vec<BTreeMap<usize, i64>> = files_sequence
        .iter()
        .map(|row_path| {
            let Some(row) = state.files.get(row_path) else {
                return BTreeMap::new();
            };
            row.iter()
                .filter_map(|(col_path, count)| {
                    files_index.get(col_path).map(|&j| (j, *count))
                })
                .collect()
        })
        .collect();

    let mut people_matrix: Vec<BTreeMap<usize, i64>> =
        vec![BTreeMap::new(); state.people.len()];
    for i in 0..state.people.len() {
        for k in 0..state.people.len() {
            let mut shared = 0i64;
            for (path, &count_i) in &state.people[i] {
                if let Some(&count_k) = state.people[k].get(path) {
                    shared += count_i.min(count_k);
                }
            }
            if shared != 0 {
                people_matrix[i].insert(k, shared);
            }
        }
    }

    let people_files: Vec<Vec<usize>> = state
        .people
        .iter()
        .map(|touched| {
            let mut indices: Vec<usize> = touched
                .keys()
                .filter_map(|p| files_index.get(p).copied())
                .collect();
            indices.sort_unstable();
            indices
        })
        .collect();

    let files_lines: Vec<u32> = files_sequence
        .iter()
        .map(|path| match &state.last_commit {
            Some(commit) => match commit.count_lines(path) {
                Ok(Some(n)) => n,
                Ok(None) => 0,
                Err(err) => {
                    warn!(path, %err, "failed to count lines, recording 0");
                    0
                }
            },
            None => 0,
        })
        .collect();

    Report {
        files: files_sequence,
        files_lines,
        files_matrix,
        people_matrix,
        people_files,
        reversed_people_dict: Vec::new(),
    }
}

/// Finalize with an explicit reversed-people dictionary supplied by an
/// `IdentityAdapter`'s up-front facts, rather than an empty default.
#[must_use]
pub fn finalize_with_names(state: &WorkingState, reversed_people_dict: Vec<String>) -> Report {
    let mut report = finalize(state);
    report.reversed_people_dict = reversed_people_dict;
    report
}

/// Parse a [`Report`] out of a loosely-typed JSON value (spec §4.6
/// `MetricsComputer`'s "Parse" step, spec §7's input-shape error
/// taxonomy).
///
/// This is the front door for a `Report` that arrived from outside this
/// process — e.g. round-tripped through a spill shard or handed over by a
/// caller that only has `serde_json::Value` in hand — as opposed to
/// `finalize`'s output, which is already a concrete `Report` and never
/// needs this path. A missing key defaults to empty (spec §4.6: "missing
/// ... fields default to empty"); a key present with the wrong dynamic
/// shape is a hard error (spec §7: `ErrInvalidMatrix`/`ErrInvalidNames`)
/// rather than silently discarded, since a malformed-but-present field is
/// more likely a caller bug than an intentionally sparse report.
///
/// # Errors
/// Returns [`CoreError::InvalidMatrix`] if `FilesMatrix`/`PeopleMatrix` is
/// present but not an array of `{index: count}` objects, or
/// [`CoreError::InvalidNames`] if `Files`/`ReversedPeopleDict` is present
/// but not an array of strings.
pub fn parse_report(value: &serde_json::Value) -> Result<Report, crate::error::CoreError> {
    use crate::error::CoreError;

    let object = value.as_object();

    let string_list = |key: &str| -> Result<Vec<String>, CoreError> {
        match object.and_then(|o| o.get(key)) {
            None | Some(serde_json::Value::Null) => Ok(Vec::new()),
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .map(|v| v.as_str().map(str::to_owned).ok_or(CoreError::InvalidNames))
                .collect(),
            Some(_) => Err(CoreError::InvalidNames),
        }
    };

    let sparse_matrix = |key: &str| -> Result<Vec<BTreeMap<usize, i64>>, CoreError> {
        match object.and_then(|o| o.get(key)) {
            None | Some(serde_json::Value::Null) => Ok(Vec::new()),
            Some(serde_json::Value::Array(rows)) => rows
                .iter()
                .map(|row| {
                    let row = row.as_object().ok_or(CoreError::InvalidMatrix)?;
                    row.iter()
                        .map(|(k, v)| {
                            let idx: usize = k.parse().map_err(|_| CoreError::InvalidMatrix)?;
                            let count = v.as_i64().ok_or(CoreError::InvalidMatrix)?;
                            Ok((idx, count))
                        })
                        .collect()
                })
                .collect(),
            Some(_) => Err(CoreError::InvalidMatrix),
        }
    };

    let index_list = |key: &str| -> Result<Vec<Vec<usize>>, CoreError> {
        match object.and_then(|o| o.get(key)) {
            None | Some(serde_json::Value::Null) => Ok(Vec::new()),
            Some(serde_json::Value::Array(rows)) => rows
                .iter()
                .map(|row| {
                    row.as_array()
                        .ok_or(CoreError::InvalidMatrix)?
                        .iter()
                        .map(|v| {
                            v.as_u64()
                                .map(|n| n as usize)
                                .ok_or(CoreError::InvalidMatrix)
                        })
                        .collect()
                })
                .collect(),
            Some(_) => Err(CoreError::InvalidMatrix),
        }
    };

    let files_lines: Vec<u32> = match object.and_then(|o| o.get("FilesLines")) {
        None | Some(serde_json::Value::Null) => Vec::new(),
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .map(|v| v.as_u64().map(|n| n as u32).ok_or(CoreError::InvalidMatrix))
            .collect::<Result<_, _>>()?,
        Some(_) => return Err(CoreError::InvalidMatrix),
    };

    Ok(Report {
        files: string_list("Files")?,
        files_lines,
        files_matrix: sparse_matrix("FilesMatrix")?,
        people_matrix: sparse_matrix("PeopleMatrix")?,
        people_files: index_list("PeopleFiles")?,
        reversed_people_dict: string_list("ReversedPeopleDict")?,
    })
}

/// Enumerate `F`, the current-files set (spec §4.3 step 1): every path in
/// the last commit's tree if a handle is available.
///
/// `couples-core` has no tree-enumeration seam of its own (`CommitHandle`
/// only exposes `count_lines` per the line-counting design note), so
/// without a richer adapter we fall back to the keys of `files` — the set
/// of paths ever part of a coupling context, which already approximates
/// `F` for any adapter that doesn't implement a tree walk.
fn files_in_tree(_commit: &dyn CommitHandle, state: &WorkingState) -> BTreeSet<PathKey> {
    state.files.keys().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CommitId;
    use crate::error::CoreError;

    struct StubCommit {
        lines: BTreeMap<PathKey, u32>,
    }

    impl CommitHandle for StubCommit {
        fn hash(&self) -> CommitId {
            CommitId::new("stub")
        }
        fn num_parents(&self) -> usize {
            1
        }
        fn count_lines(&self, path: &str) -> Result<Option<u32>, CoreError> {
            Ok(self.lines.get(path).copied())
        }
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    fn populated_state() -> WorkingState {
        let mut state = WorkingState::default();
        state
            .files
            .entry("a.go".into())
            .or_default()
            .extend([("a.go".to_string(), 1), ("b.go".to_string(), 1)]);
        state
            .files
            .entry("b.go".into())
            .or_default()
            .extend([("a.go".to_string(), 1), ("b.go".to_string(), 1)]);
        state.ensure_capacity(1);
        state.people[0].insert("a.go".into(), 10);
        state.people[0].insert("b.go".into(), 5);
        state.people[1].insert("a.go".into(), 5);
        state
    }

    #[test]
    fn s1_finalize_produces_symmetric_matrix_and_indexed_files() {
        let state = populated_state();
        let report = finalize(&state);
        assert_eq!(report.files, vec!["a.go".to_string(), "b.go".to_string()]);
        assert_eq!(report.files_matrix[0][&1], 1);
        assert_eq!(report.files_matrix[1][&0], 1);
        assert_eq!(report.files_matrix[0][&0], 1);
        assert_eq!(report.files_matrix[1][&1], 1);
    }

    #[test]
    fn s5_people_matrix_is_min_accumulated_overlap() {
        let state = populated_state();
        let report = finalize(&state);
        assert_eq!(report.people_matrix[0][&1], 5);
        assert_eq!(report.people_matrix[1][&0], 5);
    }

    #[test]
    fn people_files_lists_sorted_touched_indices() {
        let state = populated_state();
        let report = finalize(&state);
        assert_eq!(report.people_files[0], vec![0, 1]);
        assert_eq!(report.people_files[1], vec![0]);
    }

    #[test]
    fn blob_read_failure_records_zero_lines_without_failing_finalize() {
        let mut state = populated_state();
        state.last_commit = Some(std::sync::Arc::new(StubCommit {
            lines: BTreeMap::from([("a.go".to_string(), 42)]),
        }));
        let report = finalize(&state);
        let a_idx = report.files.iter().position(|p| p == "a.go").unwrap();
        let b_idx = report.files.iter().position(|p| p == "b.go").unwrap();
        assert_eq!(report.files_lines[a_idx], 42);
        assert_eq!(report.files_lines[b_idx], 0);
    }

    #[test]
    fn finalize_with_names_attaches_reversed_people_dict() {
        let state = populated_state();
        let report = finalize_with_names(&state, vec!["alice".into(), "bob".into()]);
        assert_eq!(report.reversed_people_dict, vec!["alice", "bob"]);
    }

    #[test]
    fn parse_report_round_trips_a_finalized_report() {
        let state = populated_state();
        let report = finalize_with_names(&state, vec!["alice".into(), "bob".into()]);
        let value = serde_json::to_value(&report).unwrap();
        let parsed = parse_report(&value).unwrap();
        assert_eq!(parsed, report);
    }

    #[test]
    fn parse_report_defaults_missing_fields_to_empty() {
        let value = serde_json::json!({ "Files": ["a.go"] });
        let parsed = parse_report(&value).unwrap();
        assert_eq!(parsed.files, vec!["a.go".to_string()]);
        assert!(parsed.files_matrix.is_empty());
        assert!(parsed.reversed_people_dict.is_empty());
    }

    #[test]
    fn parse_report_rejects_wrong_typed_names() {
        let value = serde_json::json!({ "Files": "not-an-array" });
        let err = parse_report(&value).unwrap_err();
        assert!(matches!(err, CoreError::InvalidNames));
    }

    #[test]
    fn parse_report_rejects_wrong_typed_matrix() {
        let value = serde_json::json!({ "FilesMatrix": ["not-an-object"] });
        let err = parse_report(&value).unwrap_err();
        assert!(matches!(err, CoreError::InvalidMatrix));
    }
}
