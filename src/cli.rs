//! Command-line interface definitions.
//!
//! Defines the argument parser and subcommands using clap's derive API.
//! Each subcommand corresponds to a distinct operation: discovering moved
//! imports between two branches, applying a mapping to source trees, or
//! listing the files that would be processed.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Discover moved Python modules between two branches and rewrite imports.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    /// Print more diagnostics to stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compare two branches and write the list of moved imports.
    Analyze {
        /// Root of the git project to analyze.
        project_path: PathBuf,

        /// Branch the imports are moving away from.
        #[arg(long, default_value = "master")]
        compare_with: String,

        /// Branch holding the moves. Defaults to the current branch.
        #[arg(long)]
        branch: Option<String>,

        /// Where to write the mapping file.
        #[arg(long, default_value = "list_output.py")]
        output_file: PathBuf,

        /// Drop conflicting imports without asking.
        #[arg(long, conflicts_with = "no")]
        yes: bool,

        /// Abort on conflicting imports without asking.
        #[arg(long)]
        no: bool,

        /// Also print the result as JSON on stdout.
        #[arg(long)]
        json: bool,

        /// Glob patterns for directories/files to exclude (e.g., "migrations", "*_pb2.py").
        /// Entries starting with `.` and `__pycache__` directories are always excluded.
        #[arg(short, long)]
        exclude: Vec<String>,
    },

    /// Rewrite the imports of one or more projects using a mapping file.
    Rename {
        /// Projects to rewrite, followed by the mapping file.
        #[arg(required = true, num_args = 2.., value_name = "PATH")]
        paths: Vec<PathBuf>,

        /// Maximum number of files rewritten concurrently.
        #[arg(
            short,
            long,
            default_value_t = module_renamer::rewriter::DEFAULT_JOBS,
            value_parser = parse_jobs
        )]
        jobs: usize,

        /// Glob patterns for directories/files to exclude.
        #[arg(short, long)]
        exclude: Vec<String>,

        /// Print the batch report as JSON on stdout.
        #[arg(long)]
        json: bool,
    },

    /// List files that would be processed without reading them.
    Scan {
        /// Paths to scan. Defaults to current directory.
        paths: Vec<PathBuf>,

        /// Glob patterns for directories/files to exclude.
        #[arg(short, long)]
        exclude: Vec<String>,
    },
}

fn parse_jobs(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("at least one worker is needed".to_string()),
        Ok(jobs) => Ok(jobs),
        Err(err) => Err(format!("Invalid worker count '{}': {}", s, err)),
    }
}
