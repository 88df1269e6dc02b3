//! Move discovery.
//!
//! Compares the imports of two snapshots and infers which qualified names
//! moved between them, then resolves ambiguous moves with the user.
//!
//! # Matching heuristic
//!
//! Nothing records where a symbol came from, so a move is inferred purely from
//! names: an import that disappeared from one module and an import of the same
//! name that appeared under another module, in the same transition, are taken
//! to be one symbol that moved.
//!
//! False positives:
//! - a symbol deleted from `A` while an unrelated symbol with the same name was
//!   added to `B` looks like a move from `A` to `B`;
//! - two different symbols sharing a name and moving at once look like a
//!   single symbol moving to two places. These show up as conflicts.
//!
//! False negatives:
//! - a symbol that was also renamed while moving is never matched;
//! - a move whose old import is still present somewhere in the working
//!   snapshot (or whose new import already existed in the origin) is invisible
//!   because unchanged imports are discarded first;
//! - moves only ever seen through a wildcard import on the working side.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use glob::Pattern;
use log::{debug, info, warn};
use serde::Serialize;

use crate::confirm::ConfirmConflicts;
use crate::error::Error;
use crate::mapping::{Rename, RenameMapping};
use crate::scanner::{self, ImportSet, QualifiedImport};
use crate::snapshot::{self, SnapshotProvider};

/// Splits the imports that changed between snapshots into those only present
/// in `origin` and those only present in `working`.
///
/// Imports present on both sides are the common case and never take part in
/// move detection.
pub fn split_changed<'a>(
    origin: &'a ImportSet,
    working: &'a ImportSet,
) -> (Vec<&'a QualifiedImport>, Vec<&'a QualifiedImport>) {
    let mut origin_only: Vec<_> = origin.difference(working).collect();
    let mut working_only: Vec<_> = working.difference(origin).collect();
    origin_only.sort();
    working_only.sort();
    (origin_only, working_only)
}

/// Pairs every vanished import with every appeared import of the same name
/// under a different module. See the module docs for what this misses.
pub fn find_moved(
    origin_only: &[&QualifiedImport],
    working_only: &[&QualifiedImport],
) -> BTreeSet<Rename> {
    let mut by_name: HashMap<&str, Vec<&QualifiedImport>> = HashMap::new();
    for import in working_only
        .iter()
        .copied()
        .filter(|import| !import.is_wildcard())
    {
        by_name
            .entry(import.name.as_str())
            .or_default()
            .push(import);
    }

    let mut moved = BTreeSet::new();
    for origin in origin_only {
        let Some(candidates) = by_name.get(origin.name.as_str()) else {
            continue;
        };
        for working in candidates {
            if origin.module != working.module {
                let rename = Rename::new(origin.qualified_name(), working.qualified_name());
                moved.insert(rename);
            }
        }
    }
    moved
}

/// Candidate renames implied by the change from `origin` to `working`.
pub fn diff(origin: &ImportSet, working: &ImportSet) -> BTreeSet<Rename> {
    let (origin_only, working_only) = split_changed(origin, working);
    debug!(
        "{} import(s) only on origin, {} only on working",
        origin_only.len(),
        working_only.len()
    );
    find_moved(&origin_only, &working_only)
}

/// Old names that appear to have moved to more than one place, sorted.
pub fn find_conflicts(candidates: &BTreeSet<Rename>) -> Vec<String> {
    let mut destinations: BTreeMap<&str, usize> = BTreeMap::new();
    for candidate in candidates {
        *destinations.entry(candidate.old.as_str()).or_default() += 1;
    }
    destinations
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(old, _)| old.to_string())
        .collect()
}

/// Turns candidates into the final mapping, asking `confirm` when some old
/// names are ambiguous.
///
/// Proceeding drops every pair whose old or new name is conflicted, not just
/// the extra destinations. Declining aborts with
/// [`Error::ConflictAborted`].
pub fn resolve(
    candidates: BTreeSet<Rename>,
    confirm: &dyn ConfirmConflicts,
) -> Result<RenameMapping, Error> {
    let conflicts = find_conflicts(&candidates);
    if conflicts.is_empty() {
        return Ok(candidates.into_iter().collect());
    }

    warn!("{} import(s) moved to more than one place", conflicts.len());
    if !confirm.confirm(&conflicts)? {
        return Err(Error::ConflictAborted(conflicts));
    }

    let conflicted: BTreeSet<&str> = conflicts.iter().map(String::as_str).collect();
    Ok(candidates
        .into_iter()
        .filter(|c| !conflicted.contains(c.old.as_str()) && !conflicted.contains(c.new.as_str()))
        .collect())
}

/// Which snapshots to compare.
#[derive(Debug, Clone)]
pub struct DiscoverOptions {
    /// Snapshot the imports are moving away from.
    pub origin: String,
    /// Snapshot holding the moves. Defaults to the one checked out.
    pub working: Option<String>,
    pub excludes: Vec<Pattern>,
}

/// Counts gathered during discovery.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Diagnostics {
    pub origin_files: usize,
    pub working_files: usize,
    pub origin_imports: usize,
    pub working_imports: usize,
    pub candidates: usize,
    pub dropped: usize,
}

/// Result of a discovery run.
#[derive(Debug, Clone, Serialize)]
pub struct Discovery {
    pub origin: String,
    pub working: String,
    pub mapping: RenameMapping,
    pub conflicts: Vec<String>,
    pub diagnostics: Diagnostics,
}

/// Runs the whole discovery pipeline against `provider`.
///
/// The tree must be clean. Each snapshot is checked out in turn and the
/// previously checked out one is restored afterwards, even on failure.
pub fn discover<P>(
    provider: &P,
    options: &DiscoverOptions,
    confirm: &dyn ConfirmConflicts,
) -> Result<Discovery, Error>
where
    P: SnapshotProvider + ?Sized,
{
    if provider.is_dirty()? {
        return Err(Error::DirtyWorkingTree(provider.root().to_path_buf()));
    }

    let working = match &options.working {
        Some(working) => working.clone(),
        None => provider.current()?,
    };
    if working == options.origin {
        return Err(Error::SameSnapshot(working));
    }

    let (origin_imports, origin_files) =
        snapshot_imports(provider, &options.origin, &options.excludes)?;
    let (working_imports, working_files) =
        snapshot_imports(provider, &working, &options.excludes)?;

    let candidates = diff(&origin_imports, &working_imports);
    let conflicts = find_conflicts(&candidates);
    let candidate_count = candidates.len();
    let mapping = resolve(candidates, confirm)?;

    info!(
        "{} move(s) found between '{}' and '{working}'",
        mapping.len(),
        options.origin
    );

    Ok(Discovery {
        origin: options.origin.clone(),
        working,
        diagnostics: Diagnostics {
            origin_files,
            working_files,
            origin_imports: origin_imports.len(),
            working_imports: working_imports.len(),
            candidates: candidate_count,
            dropped: candidate_count - mapping.len(),
        },
        mapping,
        conflicts,
    })
}

/// Checks out `name` and collects the imports of all its files.
fn snapshot_imports<P>(
    provider: &P,
    name: &str,
    excludes: &[Pattern],
) -> Result<(ImportSet, usize), Error>
where
    P: SnapshotProvider + ?Sized,
{
    let checkout = snapshot::switch_to(provider, name)?;
    let files = checkout.provider().list_files(excludes)?;
    info!("reading imports of {} file(s) on '{name}'", files.len());

    let (imports, failures) = scanner::collect_imports(&files);
    if !failures.is_empty() {
        return Err(Error::Extract {
            snapshot: name.to_string(),
            failures,
        });
    }

    debug!("'{name}' has {} distinct import(s)", imports.len());
    Ok((imports, files.len()))
}
