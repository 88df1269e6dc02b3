//! Per-file rewrite outcomes and their aggregation into a batch report.

use std::path::PathBuf;

use serde::Serialize;

use crate::error::{Error, FailedFiles, FileError, FileFailure};

/// What happened to a file that was processed successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// No rename applied, the file was left alone.
    Unchanged,
    /// At least one rename applied and the new content was written.
    Rewritten,
}

/// The result of one rewrite worker for one file.
#[derive(Debug)]
pub struct RewriteOutcome {
    pub path: PathBuf,
    pub result: Result<FileStatus, FileError>,
}

/// Summary of a whole rewrite batch.
#[derive(Debug, Default, Serialize)]
pub struct BatchReport {
    pub files_scanned: usize,
    pub rewritten: Vec<PathBuf>,
    pub unchanged: usize,
    pub failures: FailedFiles,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Turns a report with failures into a single error listing every
    /// failed file.
    pub fn into_result(self) -> Result<Self, Error> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::Batch(self.failures))
        }
    }
}

/// Folds every outcome into one report. Failures are collected, never
/// short-circuited, and listed in path order for reproducible output.
pub fn aggregate(outcomes: impl IntoIterator<Item = RewriteOutcome>) -> BatchReport {
    let mut report = BatchReport::default();

    for outcome in outcomes {
        report.files_scanned += 1;
        match outcome.result {
            Ok(FileStatus::Rewritten) => report.rewritten.push(outcome.path),
            Ok(FileStatus::Unchanged) => report.unchanged += 1,
            Err(err) => report.failures.0.push(FileFailure {
                path: outcome.path,
                cause: err.to_string(),
            }),
        }
    }

    report.rewritten.sort();
    report.failures.0.sort_by(|a, b| a.path.cmp(&b.path));
    report
}
