//! Python file scanner and import extractor.
//!
//! Recursively walks directories to collect `.py` files, skipping hidden
//! entries, `__pycache__` directories and anything matching an exclude
//! pattern. Each file is parsed into a syntax tree and every import statement
//! is flattened into [`QualifiedImport`] values.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use glob::Pattern;
use log::debug;
use rayon::prelude::*;
use serde::Serialize;
use walkdir::WalkDir;

use crate::error::{Error, FailedFiles, FileError, FileFailure};
use crate::syntax::{Import, ParseError, SourceFile};

/// One imported symbol as written in source.
///
/// `module` is empty for `import x` and keeps its leading dots for relative
/// imports (`from ..pkg import x` has module `..pkg`). `name` is the imported
/// symbol, which is itself dotted for `import a.b.c`, or `*` for wildcards.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct QualifiedImport {
    pub module: String,
    pub name: String,
}

impl QualifiedImport {
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.name == "*"
    }

    /// The fully dotted name: `module.name`, or just `name` for a bare import.
    pub fn qualified_name(&self) -> String {
        if self.module.is_empty() {
            self.name.clone()
        } else if self.module.ends_with('.') {
            format!("{}{}", self.module, self.name)
        } else {
            format!("{}.{}", self.module, self.name)
        }
    }
}

impl fmt::Display for QualifiedImport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name())
    }
}

/// Every distinct import found in a snapshot. No per-file attribution.
pub type ImportSet = HashSet<QualifiedImport>;

/// Compiles exclude globs given on the command line.
pub fn compile_excludes(patterns: &[String]) -> Result<Vec<Pattern>, Error> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|source| Error::Pattern {
                pattern: pattern.clone(),
                source,
            })
        })
        .collect()
}

/// Collects all `.py` files under `paths`, sorted by path within each root.
pub fn collect_python_files(
    paths: &[PathBuf],
    excludes: &[Pattern],
) -> Result<Vec<PathBuf>, Error> {
    let mut files = Vec::new();

    for path in paths {
        let walker = WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_skipped(e, path, excludes));

        for entry in walker {
            let entry = entry.map_err(|source| Error::Walk {
                path: path.clone(),
                source,
            })?;
            if entry.file_type().is_file()
                && entry.path().extension().is_some_and(|ext| ext == "py")
            {
                files.push(entry.into_path());
            }
        }
    }

    Ok(files)
}

fn is_skipped(entry: &walkdir::DirEntry, root: &Path, excludes: &[Pattern]) -> bool {
    let name = entry.file_name().to_string_lossy();
    if name.starts_with('.') || (name == "__pycache__" && entry.file_type().is_dir()) {
        return true;
    }

    let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
    excludes
        .iter()
        .any(|pattern| pattern.matches(&name) || pattern.matches_path(relative))
}

/// Extracts every import from Python source.
pub fn imports_in_source(source: &str) -> Result<Vec<QualifiedImport>, ParseError> {
    let file = SourceFile::parse(source)?;
    let mut imports = Vec::new();

    for import in file.imports() {
        match import {
            Import::Plain(stmt) => {
                for alias in stmt.aliases() {
                    if let Some(name) = alias.dotted_name() {
                        imports.push(QualifiedImport::new("", name.dotted()));
                    }
                }
            }
            Import::From(stmt) => {
                let module = stmt
                    .module_path()
                    .map(|path| path.qualified())
                    .unwrap_or_default();
                for alias in stmt.aliases() {
                    let name = match alias.dotted_name() {
                        Some(name) => name.dotted(),
                        None if alias.is_wildcard() => "*".to_string(),
                        None => continue,
                    };
                    imports.push(QualifiedImport::new(module.clone(), name));
                }
            }
        }
    }

    Ok(imports)
}

/// Reads and parses `file`, returning its imports.
pub fn extract_imports(file: &Path) -> Result<Vec<QualifiedImport>, FileError> {
    let source = std::fs::read_to_string(file).map_err(FileError::Read)?;
    Ok(imports_in_source(&source)?)
}

/// Extracts the imports of every file into one set.
///
/// Files that cannot be read or parsed are returned separately so the caller
/// can report all of them at once.
pub fn collect_imports(files: &[PathBuf]) -> (ImportSet, FailedFiles) {
    let results: Vec<_> = files
        .par_iter()
        .map(|path| (path, extract_imports(path)))
        .collect();

    let mut imports = ImportSet::new();
    let mut failures = FailedFiles::default();
    for (path, result) in results {
        match result {
            Ok(found) => {
                debug!("{}: {} import(s)", path.display(), found.len());
                imports.extend(found);
            }
            Err(err) => failures.0.push(FileFailure {
                path: path.clone(),
                cause: err.to_string(),
            }),
        }
    }

    (imports, failures)
}
