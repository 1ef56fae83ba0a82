//! End-to-end tests against a throwaway repository built with the real
//! `git` binary (mirrors `maw-git/tests`' use of `tempfile` + a real
//! repository rather than an in-memory double).

use std::io::Write as _;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;

use couples_core::adapter::{CommitHandle, IdentityAdapter, TreeDiffAdapter};
use couples_core::model::Change;

use couples_git::{walk_history, GixCommitHandle, GixIdentityAdapter, GixTreeDiffAdapter};

fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args(args)
        .current_dir(dir)
        .status()
        .expect("git invocation");
    assert!(status.success(), "git {args:?} failed");
}

fn init_identity(dir: &Path) {
    git(dir, &["init", "-q"]);
    git(dir, &["config", "user.email", "a@example.com"]);
    git(dir, &["config", "user.name", "A"]);
}

fn write_file(dir: &Path, name: &str, contents: &str) {
    let path = dir.join(name);
    std::fs::File::create(path)
        .unwrap()
        .write_all(contents.as_bytes())
        .unwrap();
}

fn commit_all(dir: &Path, message: &str) {
    git(dir, &["add", "."]);
    git(dir, &["commit", "-q", "-m", message]);
}

#[test]
fn walk_history_visits_commits_oldest_first() {
    let tmp = tempfile::tempdir().unwrap();
    init_identity(tmp.path());
    write_file(tmp.path(), "a.go", "line one\nline two\n");
    commit_all(tmp.path(), "first");
    write_file(tmp.path(), "b.go", "content\n");
    commit_all(tmp.path(), "second");

    let repo = Arc::new(gix::open(tmp.path()).unwrap());
    let head = repo.head_id().unwrap().detach();
    let history = walk_history(Arc::clone(&repo), head).unwrap();

    assert_eq!(history.len(), 2);
    assert!(!history[0].1);
    assert!(!history[1].1);
}

#[test]
fn tree_diff_adapter_reports_insert_for_root_commit() {
    let tmp = tempfile::tempdir().unwrap();
    init_identity(tmp.path());
    write_file(tmp.path(), "a.go", "one\ntwo\n");
    commit_all(tmp.path(), "first");

    let repo = Arc::new(gix::open(tmp.path()).unwrap());
    let head = repo.head_id().unwrap().detach();
    let handle = GixCommitHandle::new(Arc::clone(&repo), head);

    let diff = GixTreeDiffAdapter::new();
    let changes = diff.changes(&handle, false).unwrap();
    assert!(changes
        .iter()
        .any(|c| matches!(c, Change::Insert { to } if to == "a.go")));
}

#[test]
fn tree_diff_adapter_reports_modify_on_second_commit() {
    let tmp = tempfile::tempdir().unwrap();
    init_identity(tmp.path());
    write_file(tmp.path(), "a.go", "one\n");
    commit_all(tmp.path(), "first");
    write_file(tmp.path(), "a.go", "one\ntwo\n");
    commit_all(tmp.path(), "second");

    let repo = Arc::new(gix::open(tmp.path()).unwrap());
    let head = repo.head_id().unwrap().detach();
    let handle = GixCommitHandle::new(Arc::clone(&repo), head);

    let diff = GixTreeDiffAdapter::new();
    let changes = diff.changes(&handle, false).unwrap();
    assert!(changes
        .iter()
        .any(|c| matches!(c, Change::Modify { to, .. } if to == "a.go")));
}

#[test]
fn tree_diff_adapter_distinguishes_added_from_deleted_paths() {
    let tmp = tempfile::tempdir().unwrap();
    init_identity(tmp.path());
    write_file(tmp.path(), "keep.go", "kept\n");
    write_file(tmp.path(), "gone.go", "removed\n");
    commit_all(tmp.path(), "first");

    std::fs::remove_file(tmp.path().join("gone.go")).unwrap();
    write_file(tmp.path(), "added.go", "new\n");
    commit_all(tmp.path(), "second");

    let repo = Arc::new(gix::open(tmp.path()).unwrap());
    let head = repo.head_id().unwrap().detach();
    let handle = GixCommitHandle::new(Arc::clone(&repo), head);

    let diff = GixTreeDiffAdapter::new();
    let changes = diff.changes(&handle, false).unwrap();

    assert!(
        changes
            .iter()
            .any(|c| matches!(c, Change::Insert { to } if to == "added.go")),
        "added.go must be classified Insert, not Delete: {changes:?}"
    );
    assert!(
        changes
            .iter()
            .any(|c| matches!(c, Change::Delete { from } if from == "gone.go")),
        "gone.go must be classified Delete, not Insert: {changes:?}"
    );
    assert!(
        !changes.iter().any(
            |c| matches!(c, Change::Insert { to } if to == "gone.go")
                || matches!(c, Change::Delete { from } if from == "added.go")
        ),
        "diff direction must not be inverted: {changes:?}"
    );
}

#[test]
fn commit_handle_counts_lines_and_reports_none_for_missing_path() {
    let tmp = tempfile::tempdir().unwrap();
    init_identity(tmp.path());
    write_file(tmp.path(), "a.go", "one\ntwo\nthree\n");
    commit_all(tmp.path(), "first");

    let repo = Arc::new(gix::open(tmp.path()).unwrap());
    let head = repo.head_id().unwrap().detach();
    let handle = GixCommitHandle::new(repo, head);

    assert_eq!(handle.count_lines("a.go").unwrap(), Some(3));
    assert_eq!(handle.count_lines("missing.go").unwrap(), None);
}

#[test]
fn identity_adapter_assigns_stable_indices_by_author_identity() {
    let tmp = tempfile::tempdir().unwrap();
    init_identity(tmp.path());
    write_file(tmp.path(), "a.go", "x\n");
    commit_all(tmp.path(), "first");
    write_file(tmp.path(), "b.go", "y\n");
    commit_all(tmp.path(), "second");

    let repo = Arc::new(gix::open(tmp.path()).unwrap());
    let head = repo.head_id().unwrap().detach();
    let history = walk_history(Arc::clone(&repo), head).unwrap();

    let identity = GixIdentityAdapter::new();
    let ids: Vec<_> = history
        .iter()
        .map(|(handle, _)| identity.author_of(handle))
        .collect();

    // Same author on both commits must resolve to the same slot.
    assert_eq!(ids[0], ids[1]);
    assert_eq!(identity.reversed_people_dict().len(), 1);
}
