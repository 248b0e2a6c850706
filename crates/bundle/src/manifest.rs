//! The checksum manifest.
//!
//! `SHA256SUMS.txt` maps file names to SHA-256 hashes in the standard
//! `sha256sum` verification format, one `<hex>  <filename>` line per file,
//! so `sha256sum -c SHA256SUMS.txt` works inside a bundle directory.

use fansync_common::{Error, Result};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// File name of the checksum manifest inside a bundle.
pub const MANIFEST_FILE: &str = "SHA256SUMS.txt";

/// One manifest line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub sha256: String,
    pub filename: String,
}

/// A parsed checksum manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChecksumManifest {
    entries: Vec<ManifestEntry>,
}

impl ChecksumManifest {
    /// An empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry.
    pub fn insert(&mut self, filename: &str, sha256: &str) {
        self.entries.push(ManifestEntry {
            sha256: sha256.to_string(),
            filename: filename.to_string(),
        });
    }

    /// Entries in file order.
    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    /// Expected hash for a file name, if listed.
    pub fn expected(&self, filename: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.filename == filename)
            .map(|e| e.sha256.as_str())
    }

    /// Read and parse the manifest from a bundle directory.
    ///
    /// Returns `Ok(None)` if the file is absent; absence is tolerated at
    /// this layer, the installer decides what it means.
    pub fn load(bundle_dir: &Path) -> Result<Option<Self>> {
        let path = bundle_dir.join(MANIFEST_FILE);
        match std::fs::read_to_string(&path) {
            Ok(content) => content.parse().map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the manifest into a bundle directory.
    pub fn write(&self, bundle_dir: &Path) -> Result<()> {
        std::fs::write(bundle_dir.join(MANIFEST_FILE), self.to_string())?;
        Ok(())
    }

    /// Verify every listed file against the content of `dir`.
    ///
    /// Fails with `Verification` on the first mismatch; a listed file that
    /// cannot be read at all is reported the same way.
    pub fn verify(&self, dir: &Path) -> Result<()> {
        for entry in &self.entries {
            let path = dir.join(&entry.filename);
            let actual = fansync_common::hash::sha256_file(&path).map_err(|_| {
                Error::Verification {
                    file: entry.filename.clone(),
                    expected: entry.sha256.clone(),
                    actual: "<unreadable>".to_string(),
                }
            })?;
            if !actual.eq_ignore_ascii_case(&entry.sha256) {
                return Err(Error::Verification {
                    file: entry.filename.clone(),
                    expected: entry.sha256.clone(),
                    actual,
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for ChecksumManifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{}  {}", entry.sha256, entry.filename)?;
        }
        Ok(())
    }
}

impl FromStr for ChecksumManifest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut manifest = Self::new();
        for line in s.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (hash, rest) = line
                .split_once(char::is_whitespace)
                .ok_or_else(|| Error::Manifest(format!("malformed line: {line}")))?;
            if hash.len() != 64 || !hash.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(Error::Manifest(format!("not a sha256 hash: {hash}")));
            }
            // sha256sum writes "  " for text mode and " *" for binary mode.
            let filename = rest.trim_start().trim_start_matches('*');
            if filename.is_empty() {
                return Err(Error::Manifest(format!("missing filename: {line}")));
            }
            manifest.insert(filename, hash);
        }
        Ok(manifest)
    }
}
