//! Snapshot access.
//!
//! A snapshot is a named, checkout-able state of the project tree. The
//! discovery pipeline only needs three things from it: the current snapshot's
//! name, whether the tree is clean, and switching to another snapshot. The
//! git-backed provider shells out to `git` for each of them.

use std::path::{Path, PathBuf};
use std::process::Command;

use glob::Pattern;
use log::{debug, warn};

use crate::error::Error;
use crate::scanner;

pub trait SnapshotProvider {
    /// Directory whose files make up a snapshot.
    fn root(&self) -> &Path;

    /// Name of the snapshot currently checked out.
    fn current(&self) -> Result<String, Error>;

    /// True when the tree has modified or untracked files.
    fn is_dirty(&self) -> Result<bool, Error>;

    fn checkout(&self, name: &str) -> Result<(), Error>;

    /// Python files of the snapshot currently checked out.
    fn list_files(&self, excludes: &[Pattern]) -> Result<Vec<PathBuf>, Error> {
        scanner::collect_python_files(&[self.root().to_path_buf()], excludes)
    }
}

/// Switches to `name` and returns a guard that switches back on drop.
///
/// Fails without touching the tree when it is dirty.
pub fn switch_to<'a, P>(provider: &'a P, name: &str) -> Result<Checkout<'a, P>, Error>
where
    P: SnapshotProvider + ?Sized,
{
    if provider.is_dirty()? {
        return Err(Error::DirtyWorkingTree(provider.root().to_path_buf()));
    }

    let previous = provider.current()?;
    if previous != name {
        debug!("checking out '{name}' (was '{previous}')");
        provider.checkout(name)?;
    }

    Ok(Checkout { provider, previous })
}

/// Restores the previously checked out snapshot when dropped.
#[must_use = "dropping the guard immediately switches back"]
pub struct Checkout<'a, P: SnapshotProvider + ?Sized> {
    provider: &'a P,
    previous: String,
}

impl<P: SnapshotProvider + ?Sized> Checkout<'_, P> {
    pub fn provider(&self) -> &P {
        self.provider
    }
}

impl<P: SnapshotProvider + ?Sized> Drop for Checkout<'_, P> {
    fn drop(&mut self) {
        let current = match self.provider.current() {
            Ok(current) => current,
            Err(err) => {
                warn!("could not determine the current branch: {err}");
                return;
            }
        };
        if current == self.previous {
            return;
        }
        debug!("switching back to '{}'", self.previous);
        if let Err(err) = self.provider.checkout(&self.previous) {
            warn!("could not switch back to '{}': {err}", self.previous);
        }
    }
}

/// A git working tree.
#[derive(Debug, Clone)]
pub struct GitRepo {
    root: PathBuf,
}

impl GitRepo {
    /// Opens the git working tree containing `path`. The snapshot root stays
    /// `path` itself, so a subdirectory of a repository can be analyzed.
    pub fn open(path: &Path) -> Result<Self, Error> {
        let repo = Self {
            root: path.to_path_buf(),
        };
        let toplevel = repo.git(&["rev-parse", "--show-toplevel"])?;
        debug!("git repository at {toplevel}");
        Ok(repo)
    }

    fn git(&self, args: &[&str]) -> Result<String, Error> {
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.root)
            .args(args)
            .output()
            .map_err(Error::GitSpawn)?;

        if !output.status.success() {
            return Err(Error::Git {
                args: args.join(" "),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl SnapshotProvider for GitRepo {
    fn root(&self) -> &Path {
        &self.root
    }

    fn current(&self) -> Result<String, Error> {
        self.git(&["rev-parse", "--abbrev-ref", "HEAD"])
    }

    fn is_dirty(&self) -> Result<bool, Error> {
        Ok(!self.git(&["status", "--porcelain"])?.is_empty())
    }

    fn checkout(&self, name: &str) -> Result<(), Error> {
        self.git(&["checkout", "--quiet", name]).map(drop)
    }
}
