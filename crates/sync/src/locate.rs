//! Bundle location: find the most recent bundle under a root directory.

use fansync_bundle::BundleName;
use fansync_common::{Error, Result, Timestamp};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Locate the most recently exported bundle under `root`.
///
/// Candidates are subdirectories whose names parse as
/// `<prefix>-<timestamp>`. Ordering is by `(timestamp, full name)`
/// descending; the secondary name ordering makes selection deterministic
/// even if two candidates ever carried the same timestamp.
///
/// Fails with `PathNotFound` if `root` cannot be read and `NoBundles` if
/// nothing matches.
pub fn locate_latest(root: &Path, prefix: &str) -> Result<PathBuf> {
    let entries = std::fs::read_dir(root).map_err(|e| Error::from_io(e, root))?;

    let mut best: Option<(Timestamp, String)> = None;
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        let Ok(parsed) = BundleName::parse(&name, prefix) else {
            debug!("skipping non-bundle entry {name}");
            continue;
        };
        let key = (parsed.timestamp(), name);
        if best.as_ref().map_or(true, |b| key > *b) {
            best = Some(key);
        }
    }

    match best {
        Some((ts, name)) => {
            debug!("latest bundle is {name} (exported {ts})");
            Ok(root.join(name))
        }
        None => Err(Error::NoBundles(root.to_path_buf())),
    }
}
