//! Binary installation: verify, back up, replace.
//!
//! The replace sequence is a locked two-phase commit. The new binary is
//! staged next to the target, the previous binary is backed up, then one
//! atomic rename commits the install. Concurrent installers serialize on
//! the advisory lock, so each one's backup captures the true prior target.

use crate::lock::InstallLock;
use fansync_bundle::{ChecksumManifest, MANIFEST_FILE, METADATA_FILE};
use fansync_common::{hash, Error, Result, Timestamp};
use serde::Serialize;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Outcome of a successful install.
#[derive(Debug, Clone, Serialize)]
pub struct Installed {
    /// The target path now holding the new binary.
    pub installed_path: PathBuf,
    /// Backup of the previously installed binary, if one existed.
    pub backup_path: Option<PathBuf>,
    /// SHA-256 of the installed binary (observational only).
    pub sha256: String,
    /// Whether a checksum manifest was present and verified.
    pub verified: bool,
}

/// Install the binary held in `bundle_dir` onto `target`.
///
/// If the bundle carries a checksum manifest, every listed file is verified
/// before anything is written near the target; a mismatch aborts with
/// `Verification` and leaves the installed binary untouched. A bundle
/// without a manifest installs anyway, loudly unverified.
pub fn install_from_bundle(bundle_dir: &Path, target: &Path) -> Result<Installed> {
    if !bundle_dir.is_dir() {
        return Err(Error::PathNotFound(bundle_dir.to_path_buf()));
    }
    let binary = find_binary(bundle_dir)?;
    info!(
        "installing {} from bundle {}",
        binary.display(),
        bundle_dir.display()
    );

    let verified = match ChecksumManifest::load(bundle_dir)? {
        Some(manifest) => {
            info!("verifying bundle against {MANIFEST_FILE}");
            if let Err(e) = manifest.verify(bundle_dir) {
                error!("verification failed: {e}");
                return Err(e);
            }
            info!("checksum verification passed");
            true
        }
        None => {
            warn!(
                "no {MANIFEST_FILE} in {}; installing UNVERIFIED",
                bundle_dir.display()
            );
            false
        }
    };

    let (backup_path, sha256) = replace(&binary, target)?;
    Ok(Installed {
        installed_path: target.to_path_buf(),
        backup_path,
        sha256,
        verified,
    })
}

/// Install a raw binary file onto `target`, skipping verification.
///
/// The caller is assumed to have already trusted the file.
pub fn install_from_file(source: &Path, target: &Path) -> Result<Installed> {
    if !source.is_file() {
        return Err(Error::PathNotFound(source.to_path_buf()));
    }
    info!("installing {} directly, no verification", source.display());

    let (backup_path, sha256) = replace(source, target)?;
    Ok(Installed {
        installed_path: target.to_path_buf(),
        backup_path,
        sha256,
        verified: false,
    })
}

/// The bundled binary is the unique regular file that is neither the
/// metadata record nor the checksum manifest.
fn find_binary(bundle_dir: &Path) -> Result<PathBuf> {
    let mut candidates = Vec::new();
    for entry in std::fs::read_dir(bundle_dir).map_err(|e| Error::from_io(e, bundle_dir))? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        if name == METADATA_FILE || name == MANIFEST_FILE {
            continue;
        }
        candidates.push(entry.path());
    }
    match candidates.len() {
        0 => {
            error!("bundle {} contains no binary artifact", bundle_dir.display());
            Err(Error::PathNotFound(bundle_dir.to_path_buf()))
        }
        1 => Ok(candidates.remove(0)),
        _ => Err(Error::InvalidBundle(format!(
            "{} candidate binaries in {}",
            candidates.len(),
            bundle_dir.display()
        ))),
    }
}

/// Locked backup-then-replace of `target` with `source`.
///
/// Ordering invariant: the backup completes before the target is touched;
/// the overwrite itself is a single atomic rename of the staged copy.
fn replace(source: &Path, target: &Path) -> Result<(Option<PathBuf>, String)> {
    if !source.is_file() {
        return Err(Error::PathNotFound(source.to_path_buf()));
    }
    let parent = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if !parent.is_dir() {
        return Err(Error::PathNotFound(parent));
    }
    if target.file_name().is_none() {
        return Err(Error::Usage(format!(
            "target {} has no file name",
            target.display()
        )));
    }

    let _lock = InstallLock::acquire(target)?;

    // Stage alongside the target so the commit is one rename on the same
    // filesystem.
    let staged = suffixed(target, &format!(".tmp-{}", std::process::id()));
    debug!("staging new binary at {}", staged.display());
    std::fs::copy(source, &staged).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::PathNotFound(source.to_path_buf()),
        _ => Error::from_io(e, &staged),
    })?;
    std::fs::set_permissions(&staged, std::fs::Permissions::from_mode(0o755))
        .map_err(|e| Error::from_io(e, &staged))?;
    if nix::unistd::Uid::effective().is_root() {
        std::os::unix::fs::chown(&staged, Some(0), Some(0))
            .map_err(|e| Error::from_io(e, &staged))?;
    }

    let backup = if target.symlink_metadata().is_ok() {
        let backup = next_backup_path(target, Timestamp::now());
        info!(
            "backing up {} to {}",
            target.display(),
            backup.display()
        );
        std::fs::copy(target, &backup).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::PathNotFound(target.to_path_buf()),
            _ => Error::from_io(e, &backup),
        })?;
        info!("backup complete");
        Some(backup)
    } else {
        debug!("no existing binary at {}, skipping backup", target.display());
        None
    };

    std::fs::rename(&staged, target).map_err(|e| Error::from_io(e, target))?;

    let sha256 = hash::sha256_file(target).map_err(|e| Error::from_io(e, target))?;
    info!("installed {} (sha256 {})", target.display(), sha256);
    Ok((backup, sha256))
}

/// `<target>.bak-<timestamp>`, uniquified with a numeric suffix when a
/// same-second reinstall would otherwise overwrite an earlier backup.
fn next_backup_path(target: &Path, timestamp: Timestamp) -> PathBuf {
    let base = format!(".bak-{}", timestamp.to_compact());
    let mut candidate = suffixed(target, &base);
    let mut n = 0u32;
    while candidate.symlink_metadata().is_ok() {
        n += 1;
        candidate = suffixed(target, &format!("{base}.{n}"));
    }
    candidate
}

fn suffixed(target: &Path, suffix: &str) -> PathBuf {
    let mut name = target
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(suffix);
    target.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffixed_keeps_directory() {
        assert_eq!(
            suffixed(Path::new("/usr/local/bin/fan-curve-app"), ".bak-x"),
            Path::new("/usr/local/bin/fan-curve-app.bak-x")
        );
    }

    #[test]
    fn test_next_backup_path_uniquifies() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("bin");
        let ts = Timestamp::parse_compact("20240101-000000").unwrap();

        let first = next_backup_path(&target, ts);
        assert_eq!(
            first.file_name().unwrap().to_str().unwrap(),
            "bin.bak-20240101-000000"
        );

        std::fs::write(&first, b"taken").unwrap();
        let second = next_backup_path(&target, ts);
        assert_eq!(
            second.file_name().unwrap().to_str().unwrap(),
            "bin.bak-20240101-000000.1"
        );
    }

    #[test]
    fn test_find_binary_rejects_empty_bundle() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(METADATA_FILE), "x=y\n").unwrap();
        assert!(matches!(
            find_binary(dir.path()),
            Err(Error::PathNotFound(_))
        ));
    }

    #[test]
    fn test_find_binary_rejects_ambiguous_bundle() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a"), b"1").unwrap();
        std::fs::write(dir.path().join("b"), b"2").unwrap();
        assert!(matches!(
            find_binary(dir.path()),
            Err(Error::InvalidBundle(_))
        ));
    }

    #[test]
    fn test_find_binary_ignores_bundle_records() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(METADATA_FILE), "x=y\n").unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), "").unwrap();
        std::fs::write(dir.path().join("fan-curve-app"), b"\x7fELF").unwrap();
        let found = find_binary(dir.path()).unwrap();
        assert_eq!(found.file_name().unwrap(), "fan-curve-app");
    }
}
