//! Error types shared by the discovery and rewrite pipelines.

use std::fmt;
use std::io;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::syntax::{ParseError, RenameError};

/// Run-level failures. Any of these stops the run with nothing written.
#[derive(Debug, Error)]
pub enum Error {
    #[error("the repository at {} has uncommitted or untracked changes, please clean it first", .0.display())]
    DirtyWorkingTree(PathBuf),

    #[error(
        "origin and working branch are both '{0}'; switch to the branch holding your changes, \
         or pass --branch and --compare-with"
    )]
    SameSnapshot(String),

    #[error("aborted because these imports moved to more than one place: {}", .0.join(", "))]
    ConflictAborted(Vec<String>),

    #[error("failed to run git: {0}")]
    GitSpawn(#[source] io::Error),

    #[error("git {args} failed: {stderr}")]
    Git { args: String, stderr: String },

    #[error("failed to walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("invalid exclude pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid mapping file {}: {source}", path.display())]
    Mapping {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("confirmation prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("failed to start the worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("could not read imports on '{snapshot}': {failures}")]
    Extract {
        snapshot: String,
        failures: FailedFiles,
    },

    #[error("{0}")]
    Batch(FailedFiles),
}

/// Failure to process a single file. Never escapes the worker that hit it;
/// it is reported through [`crate::report::RewriteOutcome`] instead.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("read failed: {0}")]
    Read(#[source] io::Error),

    #[error("parse error at {0}")]
    Parse(#[from] ParseError),

    #[error("renaming '{old}' to '{new}' failed: {source}")]
    Rename {
        old: String,
        new: String,
        #[source]
        source: RenameError,
    },

    #[error("write failed: {0}")]
    Write(#[source] io::Error),
}

/// A file that could not be processed, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub cause: String,
}

/// Every file that failed during one batch, in a stable order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FailedFiles(pub Vec<FileFailure>);

impl FailedFiles {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileFailure> {
        self.0.iter()
    }
}

impl fmt::Display for FailedFiles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} file(s) failed:", self.0.len())?;
        for failure in &self.0 {
            write!(f, "\n  {}: {}", failure.path.display(), failure.cause)?;
        }
        Ok(())
    }
}
