//! Advisory locking for the install critical section.

use fansync_common::{Error, Result};
use nix::fcntl::{Flock, FlockArg};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Exclusive lock serializing installers that race on one target path.
///
/// Backed by `flock(2)` on `<target>.lock` next to the target binary.
/// Acquisition blocks until the current holder releases; the lock is
/// released on drop. The lock file itself persists between runs.
pub struct InstallLock {
    path: PathBuf,
    _flock: Flock<File>,
}

impl InstallLock {
    /// Block until the exclusive lock for `target` is held.
    pub fn acquire(target: &Path) -> Result<Self> {
        let path = lock_path(target);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&path)
            .map_err(|e| Error::from_io(e, &path))?;
        debug!("acquiring install lock {}", path.display());
        let flock = Flock::lock(file, FlockArg::LockExclusive)
            .map_err(|(_, errno)| Error::Io(std::io::Error::from(errno)))?;
        debug!("install lock held");
        Ok(Self {
            path,
            _flock: flock,
        })
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn lock_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".lock");
    target.with_file_name(name)
}
