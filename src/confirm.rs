//! Conflict confirmation.
//!
//! When the same import appears to have moved to several places the user has
//! to decide between dropping every conflicting pair and aborting. The
//! decision is injected so headless runs and tests can supply a fixed answer.

use colored::Colorize;
use dialoguer::Confirm;

use crate::error::Error;

/// Decides what happens to a mapping that contains conflicts.
pub trait ConfirmConflicts {
    /// Returns `true` to proceed without the conflicting pairs, `false` to
    /// abort the run.
    fn confirm(&self, conflicts: &[String]) -> Result<bool, Error>;
}

/// A fixed answer for non-interactive runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    Proceed,
    Abort,
}

impl ConfirmConflicts for Policy {
    fn confirm(&self, _conflicts: &[String]) -> Result<bool, Error> {
        Ok(*self == Policy::Proceed)
    }
}

/// Asks on the terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct Prompt;

impl ConfirmConflicts for Prompt {
    fn confirm(&self, conflicts: &[String]) -> Result<bool, Error> {
        eprintln!("{}", conflict_listing(conflicts));
        let proceed = Confirm::new()
            .with_prompt(
                "Do you want to generate the file without these imports? \
                 Otherwise this script will be aborted.",
            )
            .default(false)
            .interact()?;
        Ok(proceed)
    }
}

/// Human readable explanation of `conflicts`.
pub fn conflict_listing(conflicts: &[String]) -> String {
    let mut text = format!(
        "{} some objects with the same name were moved to different paths.\n\
         Renaming them would be ambiguous. These imports have conflicts:",
        "warn:".yellow().bold()
    );
    for conflict in conflicts {
        text.push_str(&format!("\n  {} {}", "->".yellow(), conflict));
    }
    text
}
