//! `MetricsComputer` (spec §4.6): derives the four user-facing metrics
//! from a finalized [`Report`].
//!
//! Field names are snake_case per spec §6's `ComputedMetrics
//! serialization` contract, distinct from the `Report`'s PascalCase keys.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::AggregatorConfig;
use crate::matrix::Report;

/// One file-file coupling pair (spec §4.6 `FileCouplingMetric`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FileCouplingPair {
    pub file1: String,
    pub file2: String,
    pub co_changes: i64,
    pub coupling_strength: f64,
}

/// One developer-developer coupling pair (spec §4.6
/// `DeveloperCouplingMetric`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DeveloperCouplingPair {
    pub developer1: String,
    pub developer2: String,
    pub shared_file_changes: i64,
    pub coupling_strength: f64,
}

/// One file's ownership summary (spec §4.6 `FileOwnershipMetric`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FileOwnership {
    pub file: String,
    pub lines: u32,
    pub contributors: Vec<usize>,
}

/// The `{1, 2-3, 4-5, 6+}` ownership bucket labels (spec §4.6
/// `BucketOwnership`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OwnershipBuckets {
    #[serde(rename = "Single owner")]
    pub single_owner: usize,
    #[serde(rename = "2-3 owners")]
    pub two_to_three_owners: usize,
    #[serde(rename = "4-5 owners")]
    pub four_to_five_owners: usize,
    #[serde(rename = "6+ owners")]
    pub six_plus_owners: usize,
}

/// Aggregate summary over the whole file-coupling matrix (spec §4.6
/// `AggregateMetric`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AggregateMetric {
    pub total_files: usize,
    pub total_developers: usize,
    pub total_co_changes: i64,
    pub avg_coupling_strength: f64,
    pub highly_coupled_pairs: usize,
}

/// Everything [`compute`] derives from a [`Report`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ComputedMetrics {
    pub file_coupling: Vec<FileCouplingPair>,
    pub developer_coupling: Vec<DeveloperCouplingPair>,
    pub file_ownership: Vec<FileOwnership>,
    pub aggregate: AggregateMetric,
}

/// Derive all four metrics from `report` (spec §4.6), using
/// `config.coupling_threshold_high` for the "highly coupled" cutoff.
#[must_use]
pub fn compute(report: &Report, config: &AggregatorConfig) -> ComputedMetrics {
    ComputedMetrics {
        file_coupling: file_coupling(report),
        developer_coupling: developer_coupling(report),
        file_ownership: file_ownership(report),
        aggregate: aggregate(report, config),
    }
}

/// `co_changes / max(co_changes, diag)` — spec.md's own worked formula
/// (resolved Open Question, see design notes).
fn normalized_strength(co_changes: i64, diag: i64) -> f64 {
    if co_changes == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let ratio = co_changes as f64 / co_changes.max(diag) as f64;
    ratio
}

fn file_coupling(report: &Report) -> Vec<FileCouplingPair> {
    let n = report.files.len();
    let mut pairs = Vec::new();
    for (i, row) in report.files_matrix.iter().enumerate() {
        if i >= n {
            continue;
        }
        let diag_i = row.get(&i).copied().unwrap_or(0);
        for (&j, &co_changes) in row {
            if j <= i || j >= n || co_changes <= 0 {
                continue;
            }
            pairs.push(FileCouplingPair {
                file1: report.files[i].clone(),
                file2: report.files[j].clone(),
                co_changes,
                coupling_strength: normalized_strength(co_changes, diag_i),
            });
        }
    }
    pairs.sort_by(|a, b| b.co_changes.cmp(&a.co_changes));
    pairs
}

fn dev_name(report: &Report, id: usize) -> String {
    report
        .reversed_people_dict
        .get(id)
        .cloned()
        .unwrap_or_default()
}

fn developer_coupling(report: &Report) -> Vec<DeveloperCouplingPair> {
    let mut pairs = Vec::new();
    for (i, row) in report.people_matrix.iter().enumerate() {
        let diag_i = row.get(&i).copied().unwrap_or(0);
        for (&k, &shared) in row {
            if k <= i || shared <= 0 {
                continue;
            }
            pairs.push(DeveloperCouplingPair {
                developer1: dev_name(report, i),
                developer2: dev_name(report, k),
                shared_file_changes: shared,
                coupling_strength: normalized_strength(shared, diag_i),
            });
        }
    }
    pairs.sort_by(|a, b| b.shared_file_changes.cmp(&a.shared_file_changes));
    pairs
}

fn file_ownership(report: &Report) -> Vec<FileOwnership> {
    let mut contributors_by_file: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (author_id, touched) in report.people_files.iter().enumerate() {
        for &file_idx in touched {
            if file_idx < report.files.len() {
                contributors_by_file.entry(file_idx).or_default().push(author_id);
            }
        }
    }

    report
        .files
        .iter()
        .enumerate()
        .map(|(i, file)| FileOwnership {
            file: file.clone(),
            lines: report.files_lines.get(i).copied().unwrap_or(0),
            contributors: contributors_by_file.get(&i).cloned().unwrap_or_default(),
        })
        .collect()
}

fn aggregate(report: &Report, config: &AggregatorConfig) -> AggregateMetric {
    let n = report.files.len();
    let mut total_co_changes = 0i64;
    let mut pair_count = 0usize;
    let mut highly_coupled_pairs = 0usize;

    for (i, row) in report.files_matrix.iter().enumerate() {
        if i >= n {
            continue;
        }
        for (&j, &co_changes) in row {
            if j <= i || j >= n || co_changes <= 0 {
                continue;
            }
            total_co_changes += co_changes;
            pair_count += 1;
            if co_changes >= config.coupling_threshold_high {
                highly_coupled_pairs += 1;
            }
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let avg_coupling_strength = if pair_count == 0 {
        0.0
    } else {
        total_co_changes as f64 / pair_count as f64
    };

    AggregateMetric {
        total_files: report.files.len(),
        total_developers: report.reversed_people_dict.len(),
        total_co_changes,
        avg_coupling_strength,
        highly_coupled_pairs,
    }
}

/// Bucket the ownership list into `{1, 2-3, 4-5, >=6}` contributor bins
/// (spec §4.6 `BucketOwnership`).
#[must_use]
pub fn bucket_ownership(ownership: &[FileOwnership]) -> OwnershipBuckets {
    let mut buckets = OwnershipBuckets::default();
    for entry in ownership {
        match entry.contributors.len() {
            0 | 1 => buckets.single_owner += 1,
            2 | 3 => buckets.two_to_three_owners += 1,
            4 | 5 => buckets.four_to_five_owners += 1,
            _ => buckets.six_plus_owners += 1,
        }
    }
    buckets
}

/// Retain only the top `limit` developers by diagonal value
/// (`people_matrix[i][i]`), remapping matrix indices and preserving
/// symmetry (spec §4.6 `FilterTopDevs`).
#[must_use]
pub fn filter_top_developers(report: &Report, limit: usize) -> Report {
    if report.people_matrix.len() <= limit {
        return report.clone();
    }

    let mut by_diag: Vec<usize> = (0..report.people_matrix.len()).collect();
    by_diag.sort_by_key(|&i| std::cmp::Reverse(report.people_matrix[i].get(&i).copied().unwrap_or(0)));
    let mut kept: Vec<usize> = by_diag.into_iter().take(limit).collect();
    kept.sort_unstable();

    let remap: BTreeMap<usize, usize> = kept.iter().enumerate().map(|(new, &old)| (old, new)).collect();

    let people_matrix = kept
        .iter()
        .map(|&old_i| {
            report.people_matrix[old_i]
                .iter()
                .filter_map(|(old_k, &v)| remap.get(old_k).map(|&new_k| (new_k, v)))
                .collect()
        })
        .collect();

    let people_files = kept
        .iter()
        .map(|&old_i| report.people_files.get(old_i).cloned().unwrap_or_default())
        .collect();

    let reversed_people_dict = kept
        .iter()
        .map(|&old_i| dev_name(report, old_i))
        .collect();

    Report {
        people_matrix,
        people_files,
        reversed_people_dict,
        ..report.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: &[&[(usize, i64)]]) -> Vec<BTreeMap<usize, i64>> {
        rows.iter()
            .map(|row| row.iter().copied().collect())
            .collect()
    }

    #[test]
    fn s4_file_coupling_sorted_descending_by_co_changes() {
        let report = Report {
            files: vec!["f1".into(), "f2".into(), "f3".into()],
            files_lines: vec![0, 0, 0],
            files_matrix: matrix(&[
                &[(0, 2), (1, 1), (2, 2)],
                &[(0, 1), (1, 1), (2, 1)],
                &[(0, 2), (1, 1), (2, 2)],
            ]),
            people_matrix: vec![],
            people_files: vec![],
            reversed_people_dict: vec![],
        };
        let pairs = file_coupling(&report);
        assert_eq!(pairs[0].file1, "f1");
        assert_eq!(pairs[0].file2, "f3");
        assert_eq!(pairs[0].co_changes, 2);
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn s5_developer_coupling_strength_uses_max_normalization() {
        let report = Report {
            files: vec![],
            files_lines: vec![],
            files_matrix: vec![],
            people_matrix: matrix(&[&[(0, 10), (1, 5)], &[(0, 5), (1, 5)]]),
            people_files: vec![vec![], vec![]],
            reversed_people_dict: vec!["alice".into(), "bob".into()],
        };
        let pairs = developer_coupling(&report);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].developer1, "alice");
        assert_eq!(pairs[0].developer2, "bob");
        assert_eq!(pairs[0].shared_file_changes, 5);
        assert!((pairs[0].coupling_strength - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_dict_entry_keeps_row_with_empty_name() {
        let report = Report {
            files: vec![],
            files_lines: vec![],
            files_matrix: vec![],
            people_matrix: matrix(&[&[(0, 1), (1, 1)], &[(0, 1), (1, 1)]]),
            people_files: vec![vec![], vec![]],
            reversed_people_dict: vec!["alice".into()],
        };
        let pairs = developer_coupling(&report);
        assert_eq!(pairs[0].developer1, "alice");
        assert_eq!(pairs[0].developer2, "");
    }

    #[test]
    fn aggregate_counts_highly_coupled_pairs_at_threshold() {
        let report = Report {
            files: vec!["a".into(), "b".into(), "c".into()],
            files_lines: vec![0, 0, 0],
            files_matrix: matrix(&[
                &[(0, 1), (1, 10)],
                &[(0, 10), (1, 1), (2, 3)],
                &[(1, 3), (2, 1)],
            ]),
            people_matrix: vec![],
            people_files: vec![],
            reversed_people_dict: vec!["x".into()],
        };
        let metrics = aggregate(&report, &AggregatorConfig::default());
        assert_eq!(metrics.total_files, 3);
        assert_eq!(metrics.total_developers, 1);
        assert_eq!(metrics.total_co_changes, 13);
        assert_eq!(metrics.highly_coupled_pairs, 1);
        assert!((metrics.avg_coupling_strength - 6.5).abs() < f64::EPSILON);
    }

    #[test]
    fn file_ownership_inverts_people_files_and_reports_lines() {
        let report = Report {
            files: vec!["a".into(), "b".into()],
            files_lines: vec![10, 20],
            files_matrix: vec![],
            people_matrix: vec![],
            people_files: vec![vec![0], vec![0, 1]],
            reversed_people_dict: vec!["alice".into(), "bob".into()],
        };
        let ownership = file_ownership(&report);
        assert_eq!(ownership[0].contributors, vec![0, 1]);
        assert_eq!(ownership[1].contributors, vec![1]);
        assert_eq!(ownership[0].lines, 10);
    }

    #[test]
    fn bucket_ownership_sorts_into_expected_bins() {
        let ownership = vec![
            FileOwnership { file: "a".into(), lines: 0, contributors: vec![0] },
            FileOwnership { file: "b".into(), lines: 0, contributors: vec![0, 1] },
            FileOwnership { file: "c".into(), lines: 0, contributors: vec![0, 1, 2, 3] },
            FileOwnership { file: "d".into(), lines: 0, contributors: vec![0, 1, 2, 3, 4, 5] },
        ];
        let buckets = bucket_ownership(&ownership);
        assert_eq!(buckets.single_owner, 1);
        assert_eq!(buckets.two_to_three_owners, 1);
        assert_eq!(buckets.four_to_five_owners, 1);
        assert_eq!(buckets.six_plus_owners, 1);
    }

    #[test]
    fn filter_top_developers_keeps_highest_diagonal_and_remaps_indices() {
        let report = Report {
            files: vec![],
            files_lines: vec![],
            files_matrix: vec![],
            people_matrix: matrix(&[
                &[(0, 1), (1, 1), (2, 1)],
                &[(0, 1), (1, 9), (2, 2)],
                &[(0, 1), (1, 2), (2, 3)],
            ]),
            people_files: vec![vec![], vec![], vec![]],
            reversed_people_dict: vec!["a".into(), "b".into(), "c".into()],
        };
        let filtered = filter_top_developers(&report, 2);
        assert_eq!(filtered.reversed_people_dict, vec!["b", "c"]);
        assert_eq!(filtered.people_matrix[0][&0], 9);
        assert_eq!(filtered.people_matrix[0][&1], 2);
        assert_eq!(filtered.people_matrix[1][&0], 2);
    }

    #[test]
    fn filter_top_developers_is_noop_under_limit() {
        let report = Report {
            files: vec![],
            files_lines: vec![],
            files_matrix: vec![],
            people_matrix: matrix(&[&[(0, 1)]]),
            people_files: vec![vec![]],
            reversed_people_dict: vec!["a".into()],
        };
        let filtered = filter_top_developers(&report, 5);
        assert_eq!(filtered, report);
    }
}
