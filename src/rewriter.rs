//! File rewriting for applying a rename mapping.
//!
//! Every file under the target roots is handed to a bounded rayon pool. Each
//! worker parses its file, applies the mapping pair by pair, and replaces the
//! file atomically when anything changed. A failing file never stops its
//! siblings; its error travels back as a [`RewriteOutcome`].

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use glob::Pattern;
use log::{debug, info, trace};
use rayon::prelude::*;

use crate::error::{Error, FileError};
use crate::mapping::Rename;
use crate::report::{FileStatus, RewriteOutcome};
use crate::scanner;
use crate::syntax::SourceFile;

/// Ceiling on concurrently processed files.
pub const DEFAULT_JOBS: usize = 30;

/// A single text replacement with position information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    start: usize,
    end: usize,
    new_text: String,
}

impl Replacement {
    pub fn new(start: usize, end: usize, new_text: String) -> Self {
        Self {
            start,
            end,
            new_text,
        }
    }
}

/// Applies replacements to source content, returning the modified string.
///
/// Sorts replacements by start offset (descending) and applies each in turn.
/// This ensures earlier replacements don't invalidate later offsets.
pub fn apply_replacements(content: &str, mut replacements: Vec<Replacement>) -> String {
    replacements.sort_by(|a, b| b.start.cmp(&a.start));

    let mut result = content.to_string();
    for rep in replacements {
        if rep.start <= rep.end && rep.end <= result.len() {
            result.replace_range(rep.start..rep.end, &rep.new_text);
        }
    }

    result
}

/// Applies every pair of `mapping`, in order, to Python `source`.
///
/// Pairs whose old name is not imported by the source are skipped. Any other
/// rename failure aborts the whole file.
pub fn rewrite_source(source: &str, mapping: &[Rename]) -> Result<String, FileError> {
    let mut file = SourceFile::parse(source)?;

    for rename in mapping {
        match file.rename(&rename.old, &rename.new) {
            Ok(()) => trace!("renamed {} -> {}", rename.old, rename.new),
            Err(err) if err.is_not_found() => {}
            Err(source) => {
                return Err(FileError::Rename {
                    old: rename.old.clone(),
                    new: rename.new.clone(),
                    source,
                });
            }
        }
    }

    Ok(file.into_text())
}

/// Rewrites one file in place. The file is either left byte-identical or
/// replaced as a whole; a partially edited file is never written.
pub fn rewrite_file(path: &Path, mapping: &[Rename]) -> Result<FileStatus, FileError> {
    let source = fs::read_to_string(path).map_err(FileError::Read)?;
    let rewritten = rewrite_source(&source, mapping)?;

    if rewritten == source {
        return Ok(FileStatus::Unchanged);
    }

    persist(path, &rewritten).map_err(FileError::Write)?;
    debug!("rewrote {}", path.display());
    Ok(FileStatus::Rewritten)
}

/// Writes `contents` next to `path` and renames it over the original, keeping
/// the original permissions.
fn persist(path: &Path, contents: &str) -> io::Result<()> {
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.as_file().set_permissions(fs::metadata(path)?.permissions())?;
    tmp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

/// Options for a batch rewrite.
#[derive(Debug, Clone)]
pub struct RewriteOptions {
    /// Maximum number of files processed at once.
    pub jobs: usize,
    pub excludes: Vec<Pattern>,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            jobs: DEFAULT_JOBS,
            excludes: Vec::new(),
        }
    }
}

/// Rewrites `files` on a pool of at most `jobs` threads.
///
/// Outcomes come back in the order of `files`, whatever order the workers
/// finished in.
pub fn rewrite_files(
    files: &[PathBuf],
    mapping: &[Rename],
    jobs: usize,
) -> Result<Vec<RewriteOutcome>, Error> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs.max(1))
        .thread_name(|i| format!("rewrite-{i}"))
        .build()?;

    Ok(pool.install(|| {
        files
            .par_iter()
            .map(|path| RewriteOutcome {
                path: path.clone(),
                result: rewrite_file(path, mapping),
            })
            .collect()
    }))
}

/// Collects every Python file under `roots` and rewrites it with `mapping`.
pub fn rewrite_tree(
    roots: &[PathBuf],
    mapping: &[Rename],
    options: &RewriteOptions,
) -> Result<Vec<RewriteOutcome>, Error> {
    let files = scanner::collect_python_files(roots, &options.excludes)?;
    info!(
        "applying {} rename(s) to {} file(s) with up to {} worker(s)",
        mapping.len(),
        files.len(),
        options.jobs
    );
    rewrite_files(&files, mapping, options.jobs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::aggregate;

    fn rep(start: usize, end: usize, text: &str) -> Replacement {
        Replacement::new(start, end, text.to_string())
    }

    fn mapping(pairs: &[(&str, &str)]) -> Vec<Rename> {
        pairs.iter().map(|(old, new)| Rename::new(*old, *new)).collect()
    }

    #[test]
    fn replaces_multiple_ranges_regardless_of_order() {
        let content = "from a import b\nfrom c import d\n";
        let result = apply_replacements(content, vec![rep(5, 6, "x.y"), rep(21, 22, "z")]);
        assert_eq!(result, "from x.y import b\nfrom z import d\n");
    }

    #[test]
    fn handles_different_length_replacements_and_insertions() {
        let content = "import a, b";
        let result = apply_replacements(
            content,
            vec![rep(11, 11, "\nimport c"), rep(7, 8, "very.long.name")],
        );
        assert_eq!(result, "import very.long.name, b\nimport c");
    }

    #[test]
    fn empty_changes_returns_original() {
        let content = "import os\n";
        assert_eq!(apply_replacements(content, Vec::new()), content);
    }

    #[test]
    fn out_of_bounds_replacements_are_ignored() {
        assert_eq!(apply_replacements("abc", vec![rep(2, 10, "z")]), "abc");
    }

    #[test]
    fn rewrite_source_applies_pairs_in_order() {
        let source = "from a.b import c\nfrom d.e import f\n";
        let result = rewrite_source(
            source,
            &mapping(&[("q.r", "s.r"), ("a.b.c", "x.x.c"), ("x.x.c", "y.c")]),
        )
        .unwrap();
        assert_eq!(result, "from y import c\nfrom d.e import f\n");
    }

    #[test]
    fn rewrite_source_without_matches_is_byte_identical() {
        let source = "import os  \n\n\n# a.b.c\nfrom a.bc import c\t\n";
        let result =
            rewrite_source(source, &mapping(&[("a.b.c", "x.x.c"), ("a.b", "z")])).unwrap();
        assert_eq!(result, source);
    }

    #[test]
    fn rewrite_source_keeps_byte_order_mark() {
        let source = "\u{feff}from a import b\n";
        let result = rewrite_source(source, &mapping(&[("a.b", "z.b")])).unwrap();
        assert_eq!(result, "\u{feff}from z import b\n");
    }

    #[test]
    fn rewrite_source_reports_invalid_target() {
        let err = rewrite_source("import a\n", &mapping(&[("a", "not valid")])).unwrap_err();
        assert!(matches!(err, FileError::Rename { .. }));
        assert_eq!(
            err.to_string(),
            "renaming 'a' to 'not valid' failed: 'not valid' is not a valid qualified name"
        );
    }

    #[test]
    fn rewrite_file_only_writes_when_changed() {
        let dir = tempfile::tempdir().unwrap();
        let changed = dir.path().join("changed.py");
        let untouched = dir.path().join("untouched.py");
        fs::write(&changed, "from a.b import c\n").unwrap();
        fs::write(&untouched, "import os\n").unwrap();
        let before = fs::metadata(&untouched).unwrap().modified().unwrap();

        let pairs = mapping(&[("a.b.c", "x.x.c")]);
        assert_eq!(
            rewrite_file(&changed, &pairs).unwrap(),
            FileStatus::Rewritten
        );
        assert_eq!(
            rewrite_file(&untouched, &pairs).unwrap(),
            FileStatus::Unchanged
        );

        assert_eq!(fs::read_to_string(&changed).unwrap(), "from x.x import c\n");
        assert_eq!(fs::read_to_string(&untouched).unwrap(), "import os\n");
        assert_eq!(
            fs::metadata(&untouched).unwrap().modified().unwrap(),
            before
        );
    }

    #[test]
    fn rewrite_file_leaves_unparsable_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.py");
        fs::write(&broken, "from a.b import c\ns = 'oops\n").unwrap();

        let err = rewrite_file(&broken, &mapping(&[("a.b.c", "x.x.c")])).unwrap_err();
        assert!(matches!(err, FileError::Parse(_)));
        assert_eq!(
            fs::read_to_string(&broken).unwrap(),
            "from a.b import c\ns = 'oops\n"
        );
    }

    #[test]
    fn rewrite_tree_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("pkg");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join("good.py"), "from a.b import c\n").unwrap();
        fs::write(pkg.join("bad.py"), "from a.b import (c\n").unwrap();
        fs::write(pkg.join("other.py"), "import json\n").unwrap();
        fs::write(pkg.join("notes.txt"), "from a.b import c\n").unwrap();

        let outcomes = rewrite_tree(
            &[dir.path().to_path_buf()],
            &mapping(&[("a.b.c", "x.x.c")]),
            &RewriteOptions {
                jobs: 2,
                ..RewriteOptions::default()
            },
        )
        .unwrap();
        let report = aggregate(outcomes);

        assert_eq!(report.files_scanned, 3);
        assert_eq!(report.rewritten, vec![pkg.join("good.py")]);
        assert_eq!(report.unchanged, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures.0[0].path, pkg.join("bad.py"));

        assert_eq!(
            fs::read_to_string(pkg.join("good.py")).unwrap(),
            "from x.x import c\n"
        );
        assert_eq!(
            fs::read_to_string(pkg.join("notes.txt")).unwrap(),
            "from a.b import c\n"
        );
    }
}
