//! module-renamer: discover moved Python modules and rewrite imports to match.
//!
//! The library covers two pipelines:
//!
//! 1. **Discovery**: check out two git branches in turn, extract the imports
//!    of every `.py` file, and infer which qualified names moved between them.
//!    The result is a mapping artifact (`imports_to_move = [...]`).
//! 2. **Rewrite**: apply a mapping to every `.py` file of one or more trees,
//!    changing only the import statements that refer to a moved name and
//!    leaving every other byte of the file untouched.
//!
//! # Example
//!
//! ```no_run
//! use module_renamer::{analyzer, confirm::Policy, mapping, report, rewriter, snapshot::GitRepo};
//! use std::path::{Path, PathBuf};
//!
//! let repo = GitRepo::open(Path::new("./project")).unwrap();
//! let options = analyzer::DiscoverOptions {
//!     origin: "master".to_string(),
//!     working: None,
//!     excludes: Vec::new(),
//! };
//! let discovery = analyzer::discover(&repo, &options, &Policy::Abort).unwrap();
//! mapping::write(Path::new("list_output.py"), &discovery.mapping).unwrap();
//!
//! let outcomes = rewriter::rewrite_tree(
//!     &[PathBuf::from("./other_project")],
//!     &discovery.mapping,
//!     &rewriter::RewriteOptions::default(),
//! )
//! .unwrap();
//! let report = report::aggregate(outcomes);
//! println!("{} file(s) rewritten", report.rewritten.len());
//! ```

pub mod analyzer;
pub mod confirm;
pub mod error;
pub mod mapping;
pub mod report;
pub mod rewriter;
pub mod scanner;
pub mod snapshot;
pub mod syntax;

// Re-export commonly used types at crate root
pub use analyzer::{Diagnostics, Discovery};
pub use error::{Error, FailedFiles, FileError};
pub use mapping::{Rename, RenameMapping};
pub use report::{BatchReport, RewriteOutcome};
pub use scanner::{ImportSet, QualifiedImport};
pub use syntax::SourceFile;
