//! Bundle export: package one binary plus metadata and a checksum manifest
//! into a new, immutable, timestamp-named directory.

use fansync_bundle::{BundleMetadata, BundleName, ChecksumManifest};
use fansync_common::{hash, Error, Result, Timestamp};
use serde::Serialize;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Outcome of a successful export.
#[derive(Debug, Clone, Serialize)]
pub struct Exported {
    /// The freshly created bundle directory.
    pub bundle_dir: PathBuf,
    /// File name of the binary inside the bundle.
    pub binary: String,
    /// SHA-256 of the bundled binary, as recorded in the manifest.
    pub sha256: String,
}

/// Export `source_binary` into a new bundle under `dest_root`.
///
/// The bundle is named `<prefix>-<timestamp>` from the current time; see
/// [`export_at`] for the underlying steps.
pub fn export(dest_root: &Path, source_binary: &Path, prefix: &str) -> Result<Exported> {
    export_at(dest_root, source_binary, prefix, Timestamp::now())
}

/// Export with an explicit timestamp.
///
/// Creates the bundle directory (refusing to reuse an existing one, so two
/// exports in the same second fail closed), copies the binary with mode
/// `rwxr-xr-x`, writes the metadata record and the checksum manifest.
/// Never mutates the source binary or any prior bundle.
pub fn export_at(
    dest_root: &Path,
    source_binary: &Path,
    prefix: &str,
    timestamp: Timestamp,
) -> Result<Exported> {
    if !dest_root.is_dir() {
        return Err(Error::PathNotFound(dest_root.to_path_buf()));
    }
    if !source_binary.is_file() {
        return Err(Error::PathNotFound(source_binary.to_path_buf()));
    }
    let binary = source_binary
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            Error::Other(format!(
                "source binary has no usable file name: {}",
                source_binary.display()
            ))
        })?
        .to_string();

    let name = BundleName::new(prefix, timestamp);
    let bundle_dir = dest_root.join(name.to_string());
    info!(
        "exporting {} to {}",
        source_binary.display(),
        bundle_dir.display()
    );

    match std::fs::create_dir(&bundle_dir) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            return Err(Error::BundleExists(bundle_dir));
        }
        Err(e) => return Err(Error::from_io(e, &bundle_dir)),
    }

    let bundled = bundle_dir.join(&binary);
    std::fs::copy(source_binary, &bundled)
        .map_err(|e| Error::from_io(e, source_binary))?;
    std::fs::set_permissions(&bundled, std::fs::Permissions::from_mode(0o755))
        .map_err(|e| Error::from_io(e, &bundled))?;
    debug!("copied binary as {}", bundled.display());

    let metadata = BundleMetadata {
        source_host: hostname(),
        timestamp,
        source_path: std::fs::canonicalize(source_binary)
            .map_err(|e| Error::from_io(e, source_binary))?,
    };
    metadata.write(&bundle_dir)?;
    debug!("wrote metadata record");

    let sha256 = hash::sha256_file(&bundled).map_err(|e| Error::from_io(e, &bundled))?;
    let mut manifest = ChecksumManifest::new();
    manifest.insert(&binary, &sha256);
    manifest.write(&bundle_dir)?;

    info!("bundle ready at {} (sha256 {})", bundle_dir.display(), sha256);
    Ok(Exported {
        bundle_dir,
        binary,
        sha256,
    })
}

fn hostname() -> String {
    nix::unistd::gethostname()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}
