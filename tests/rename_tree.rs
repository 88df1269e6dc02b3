//! Rewriting whole trees with a mapping file.

use std::fs;
use std::path::Path;
use std::process::Command;

use module_renamer::rewriter::{self, RewriteOptions};
use module_renamer::{Rename, mapping, report};

fn write(root: &Path, path: &str, text: &str) {
    let full = root.join(path);
    fs::create_dir_all(full.parent().unwrap()).unwrap();
    fs::write(full, text).unwrap();
}

fn read(root: &Path, path: &str) -> String {
    fs::read_to_string(root.join(path)).unwrap()
}

#[test]
fn rewrites_moved_import_and_nothing_else() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "pkg/main.py",
        "from a.b import c\nfrom d.e import f\n",
    );

    let outcomes = rewriter::rewrite_tree(
        &[dir.path().to_path_buf()],
        &[Rename::new("a.b.c", "x.x.c")],
        &RewriteOptions::default(),
    )
    .unwrap();
    let report = report::aggregate(outcomes);

    assert!(report.is_success());
    assert_eq!(
        read(dir.path(), "pkg/main.py"),
        "from x.x import c\nfrom d.e import f\n"
    );
}

#[test]
fn formatting_and_unrelated_imports_are_preserved() {
    let dir = tempfile::tempdir().unwrap();
    let source = "\
#!/usr/bin/env python
# -*- coding: utf-8 -*-
\"\"\"Module docstring mentioning a.b.\"\"\"
import a.bc
from ab import c
from a.b import (  # keep this comment
    c,
    d as dee,
)


def f():
    return 'a.b'
";
    write(dir.path(), "mod.py", source);

    let outcomes = rewriter::rewrite_tree(
        &[dir.path().to_path_buf()],
        &[Rename::new("a.b", "z")],
        &RewriteOptions::default(),
    )
    .unwrap();
    assert!(report::aggregate(outcomes).is_success());

    insta::assert_snapshot!(read(dir.path(), "mod.py"), @r#"
    #!/usr/bin/env python
    # -*- coding: utf-8 -*-
    """Module docstring mentioning a.b."""
    import a.bc
    from ab import c
    from z import (  # keep this comment
        c,
        d as dee,
    )


    def f():
        return 'a.b'
    "#);
}

#[test]
fn files_without_matches_are_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let source = "import os\r\nfrom a.bc import c  \r\n\r\n\r\n";
    write(dir.path(), "crlf.py", source);

    let outcomes = rewriter::rewrite_tree(
        &[dir.path().to_path_buf()],
        &[Rename::new("a.b.c", "x.x.c"), Rename::new("a.b", "q")],
        &RewriteOptions::default(),
    )
    .unwrap();
    let report = report::aggregate(outcomes);

    assert_eq!(report.unchanged, 1);
    assert_eq!(read(dir.path(), "crlf.py"), source);
}

#[test]
fn several_trees_share_one_mapping() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    write(first.path(), "one.py", "from a.b import c\n");
    write(second.path(), "two.py", "import a.b.c\n");

    let outcomes = rewriter::rewrite_tree(
        &[first.path().to_path_buf(), second.path().to_path_buf()],
        &[Rename::new("a.b.c", "x.x.c")],
        &RewriteOptions {
            jobs: 1,
            ..RewriteOptions::default()
        },
    )
    .unwrap();
    let report = report::aggregate(outcomes);

    assert_eq!(report.rewritten.len(), 2);
    assert_eq!(read(first.path(), "one.py"), "from x.x import c\n");
    assert_eq!(read(second.path(), "two.py"), "import x.x.c\n");
}

#[test]
fn many_files_with_a_small_pool() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..64 {
        let path = format!("pkg/m{i:02}.py");
        write(dir.path(), &path, "from a.b import c\n");
    }

    let outcomes = rewriter::rewrite_tree(
        &[dir.path().to_path_buf()],
        &[Rename::new("a.b.c", "x.x.c")],
        &RewriteOptions {
            jobs: 4,
            ..RewriteOptions::default()
        },
    )
    .unwrap();
    let report = report::aggregate(outcomes);

    assert_eq!(report.rewritten.len(), 64);
    assert!(report.rewritten.windows(2).all(|w| w[0] < w[1]));
    for i in 0..64 {
        let path = format!("pkg/m{i:02}.py");
        assert_eq!(read(dir.path(), &path), "from x.x import c\n");
    }
}

#[test]
fn cli_rename_applies_mapping_file() {
    let tree = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write(
        tree.path(),
        "app/views.py",
        "from a.b import c\nfrom d.e import f\n",
    );
    write(tree.path(), "app/untouched.py", "import json\n");
    let mapping_path = out.path().join("list_output.py");
    mapping::write(&mapping_path, &[Rename::new("a.b.c", "x.x.c")]).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_renamer"))
        .arg("rename")
        .arg(tree.path())
        .arg(&mapping_path)
        .output()
        .unwrap();

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "{stderr}");
    assert_eq!(
        read(tree.path(), "app/views.py"),
        "from x.x import c\nfrom d.e import f\n"
    );
    assert_eq!(read(tree.path(), "app/untouched.py"), "import json\n");
}

#[test]
fn cli_rename_reports_every_failure_and_finishes_the_rest() {
    let tree = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write(tree.path(), "good.py", "from a.b import c\n");
    write(tree.path(), "broken_one.py", "from a.b import (c\n");
    write(
        tree.path(),
        "broken_two.py",
        "s = 'unterminated\nfrom a.b import c\n",
    );
    let mapping_path = out.path().join("list_output.py");
    let artifact = "imports_to_move = [(\"a.b.c\", \"x.x.c\"),]\n";
    fs::write(&mapping_path, artifact).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_renamer"))
        .arg("rename")
        .arg(tree.path())
        .arg(&mapping_path)
        .arg("--json")
        .output()
        .unwrap();

    assert!(!output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["files_scanned"], 3);
    assert_eq!(report["failures"].as_array().unwrap().len(), 2);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("broken_one.py"));
    assert!(stderr.contains("broken_two.py"));
    assert_eq!(read(tree.path(), "good.py"), "from x.x import c\n");
    assert_eq!(read(tree.path(), "broken_one.py"), "from a.b import (c\n");
}

#[test]
fn cli_rename_rejects_malformed_mapping() {
    let tree = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write(tree.path(), "good.py", "from a.b import c\n");
    let mapping_path = out.path().join("list_output.py");
    fs::write(&mapping_path, "moves = []\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_renamer"))
        .arg("rename")
        .arg(tree.path())
        .arg(&mapping_path)
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("imports_to_move"));
    assert_eq!(read(tree.path(), "good.py"), "from a.b import c\n");
}
