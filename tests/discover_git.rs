//! Discovery against real git repositories.

use std::fs;
use std::path::Path;
use std::process::Command;

use module_renamer::analyzer::{self, DiscoverOptions};
use module_renamer::confirm::Policy;
use module_renamer::snapshot::{GitRepo, SnapshotProvider};
use module_renamer::{Error, Rename, mapping};
use tempfile::TempDir;

fn git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(["-c", "user.name=Test"])
        .args(["-c", "user.email=test@example.com"])
        .args(args)
        .output()
        .expect("git must be installed to run these tests");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

fn commit_files(dir: &Path, files: &[(&str, &str)], message: &str) {
    for (path, text) in files {
        let full = dir.join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, text).unwrap();
    }
    git(dir, &["add", "--all"]);
    git(dir, &["commit", "-q", "--allow-empty", "-m", message]);
}

/// A repository with `master` holding `origin` and `feature` (checked out)
/// holding `working`, both written to `app/main.py`.
fn repo_with(origin: &str, working: &str) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    git(dir.path(), &["init", "-q"]);
    git(dir.path(), &["symbolic-ref", "HEAD", "refs/heads/master"]);
    commit_files(
        dir.path(),
        &[("app/__init__.py", ""), ("app/main.py", origin)],
        "origin",
    );
    git(dir.path(), &["checkout", "-q", "-b", "feature"]);
    commit_files(dir.path(), &[("app/main.py", working)], "working");
    dir
}

fn options() -> DiscoverOptions {
    DiscoverOptions {
        origin: "master".to_string(),
        working: None,
        excludes: Vec::new(),
    }
}

fn pairs(mapping: &[Rename]) -> Vec<(&str, &str)> {
    mapping
        .iter()
        .map(|r| (r.old.as_str(), r.new.as_str()))
        .collect()
}

#[test]
fn unrelated_changes_produce_an_empty_mapping() {
    let dir = repo_with(
        "from a.b import c\nfrom d.e import f\n",
        "from g.h import i\nfrom j.k import l\n",
    );
    let repo = GitRepo::open(dir.path()).unwrap();

    let discovery = analyzer::discover(&repo, &options(), &Policy::Abort).unwrap();
    assert!(discovery.mapping.is_empty());
    assert_eq!(repo.current().unwrap(), "feature");
}

#[test]
fn simple_move_is_discovered() {
    let dir = repo_with(
        "from a.b import c\nfrom d.e import f\n",
        "from x.x import c\nfrom j.k import l\n",
    );
    let repo = GitRepo::open(dir.path()).unwrap();

    let discovery = analyzer::discover(&repo, &options(), &Policy::Abort).unwrap();
    assert_eq!(pairs(&discovery.mapping), vec![("a.b.c", "x.x.c")]);
    assert_eq!(discovery.working, "feature");
    assert_eq!(repo.current().unwrap(), "feature");
    assert_eq!(
        fs::read_to_string(dir.path().join("app/main.py")).unwrap(),
        "from x.x import c\nfrom j.k import l\n"
    );
}

#[test]
fn declined_conflict_aborts_and_restores_branch() {
    let dir = repo_with(
        "from a.b import c\nfrom b import c\n",
        "from x.x import c\nfrom y import c\n",
    );
    let repo = GitRepo::open(dir.path()).unwrap();

    let err = analyzer::discover(&repo, &options(), &Policy::Abort).unwrap_err();
    assert!(matches!(err, Error::ConflictAborted(ref names) if names == &["a.b.c", "b.c"]));
    assert_eq!(repo.current().unwrap(), "feature");
}

#[test]
fn accepted_conflict_keeps_only_unambiguous_moves() {
    let dir = repo_with(
        "from a.b import c\nfrom b import c\nfrom m import n\n",
        "from x.x import c\nfrom y import c\nfrom w import n\n",
    );
    let repo = GitRepo::open(dir.path()).unwrap();

    let discovery = analyzer::discover(&repo, &options(), &Policy::Proceed).unwrap();
    assert_eq!(pairs(&discovery.mapping), vec![("m.n", "w.n")]);
    assert_eq!(discovery.conflicts, vec!["a.b.c", "b.c"]);
    assert_eq!(discovery.diagnostics.dropped, 4);
}

#[test]
fn dirty_tree_is_refused_before_any_checkout() {
    let dir = repo_with("from a.b import c\n", "from x.x import c\n");
    fs::write(dir.path().join("scratch.py"), "import os\n").unwrap();
    let repo = GitRepo::open(dir.path()).unwrap();

    let err = analyzer::discover(&repo, &options(), &Policy::Abort).unwrap_err();
    assert!(matches!(err, Error::DirtyWorkingTree(_)));
    assert_eq!(repo.current().unwrap(), "feature");
}

#[test]
fn same_branch_is_refused() {
    let dir = repo_with("from a.b import c\n", "from x.x import c\n");
    git(dir.path(), &["checkout", "-q", "master"]);
    let repo = GitRepo::open(dir.path()).unwrap();

    let err = analyzer::discover(&repo, &options(), &Policy::Abort).unwrap_err();
    assert!(matches!(err, Error::SameSnapshot(ref name) if name == "master"));
}

#[test]
fn unknown_branch_is_a_git_error() {
    let dir = repo_with("from a.b import c\n", "from x.x import c\n");
    let repo = GitRepo::open(dir.path()).unwrap();

    let err = analyzer::discover(
        &repo,
        &DiscoverOptions {
            origin: "does-not-exist".to_string(),
            ..options()
        },
        &Policy::Abort,
    )
    .unwrap_err();
    assert!(matches!(err, Error::Git { .. }));
    assert_eq!(repo.current().unwrap(), "feature");
}

#[test]
fn opening_outside_a_repository_fails() {
    let dir = tempfile::tempdir().unwrap();
    let err = GitRepo::open(dir.path()).unwrap_err();
    assert!(matches!(err, Error::Git { .. }));
}

#[test]
fn discovered_mapping_survives_the_artifact() {
    let dir = repo_with(
        "from a.b import c\nfrom d.e import f\n",
        "from x.x import c\nfrom j.k import l\n",
    );
    let out = tempfile::tempdir().unwrap();
    let path = out.path().join("list_output.py");
    let repo = GitRepo::open(dir.path()).unwrap();

    let discovery = analyzer::discover(&repo, &options(), &Policy::Abort).unwrap();
    mapping::write(&path, &discovery.mapping).unwrap();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "imports_to_move = [('a.b.c', 'x.x.c')]\n"
    );
    assert_eq!(mapping::read(&path).unwrap(), discovery.mapping);
}

#[test]
fn cli_writes_the_mapping_file() {
    let dir = repo_with(
        "from a.b import c\nfrom d.e import f\n",
        "from x.x import c\nfrom j.k import l\n",
    );
    let out = tempfile::tempdir().unwrap();
    let path = out.path().join("moves.py");

    let output = Command::new(env!("CARGO_BIN_EXE_renamer"))
        .arg("analyze")
        .arg(dir.path())
        .arg("--output-file")
        .arg(&path)
        .output()
        .unwrap();

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "{stderr}");
    assert!(stderr.contains("Generating the file"));
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "imports_to_move = [('a.b.c', 'x.x.c')]\n"
    );
}

#[test]
fn cli_conflict_with_no_exits_non_zero_without_output() {
    let dir = repo_with(
        "from a.b import c\nfrom b import c\n",
        "from x.x import c\nfrom y import c\n",
    );
    let out = tempfile::tempdir().unwrap();
    let path = out.path().join("moves.py");

    let output = Command::new(env!("CARGO_BIN_EXE_renamer"))
        .arg("analyze")
        .arg(dir.path())
        .arg("--output-file")
        .arg(&path)
        .arg("--no")
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(!path.exists());
}
