//! The bundle metadata record.
//!
//! `metadata.txt` is a plain `key=value` file recording where and when the
//! bundle was exported. It is informational only: the installer never
//! consults it for control flow.

use fansync_common::{Error, Result, Timestamp};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// File name of the metadata record inside a bundle.
pub const METADATA_FILE: &str = "metadata.txt";

/// Export provenance for a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleMetadata {
    /// Hostname of the machine the export ran on.
    pub source_host: String,
    /// Export time, second resolution.
    pub timestamp: Timestamp,
    /// Absolute path of the original binary on the source machine.
    pub source_path: PathBuf,
}

impl BundleMetadata {
    /// Read and parse `metadata.txt` from a bundle directory.
    ///
    /// Returns `Ok(None)` if the file is absent.
    pub fn load(bundle_dir: &Path) -> Result<Option<Self>> {
        let path = bundle_dir.join(METADATA_FILE);
        match std::fs::read_to_string(&path) {
            Ok(content) => content.parse().map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the record as `metadata.txt` into a bundle directory.
    pub fn write(&self, bundle_dir: &Path) -> Result<()> {
        std::fs::write(bundle_dir.join(METADATA_FILE), self.to_string())?;
        Ok(())
    }
}

impl fmt::Display for BundleMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "source_host={}", self.source_host)?;
        writeln!(f, "timestamp={}", self.timestamp.to_iso8601())?;
        writeln!(f, "source_path={}", self.source_path.display())
    }
}

impl FromStr for BundleMetadata {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut source_host = None;
        let mut timestamp = None;
        let mut source_path = None;

        for line in s.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| Error::Metadata(format!("malformed line: {line}")))?;
            match key.trim() {
                "source_host" => source_host = Some(value.trim().to_string()),
                "timestamp" => {
                    let dt = chrono::DateTime::parse_from_rfc3339(value.trim())
                        .map_err(|e| Error::Metadata(format!("bad timestamp: {e}")))?;
                    timestamp = Some(Timestamp::from_datetime(dt.with_timezone(&chrono::Utc)));
                }
                "source_path" => source_path = Some(PathBuf::from(value.trim())),
                // Unknown keys are tolerated for forward compatibility.
                _ => {}
            }
        }

        Ok(Self {
            source_host: source_host
                .ok_or_else(|| Error::Metadata("missing source_host".to_string()))?,
            timestamp: timestamp
                .ok_or_else(|| Error::Metadata("missing timestamp".to_string()))?,
            source_path: source_path
                .ok_or_else(|| Error::Metadata("missing source_path".to_string()))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BundleMetadata {
        BundleMetadata {
            source_host: "build-box".to_string(),
            timestamp: Timestamp::parse_compact("20240103-123456").unwrap(),
            source_path: PathBuf::from("/home/dev/fan-curve-app/target/release/fan-curve-app"),
        }
    }

    #[test]
    fn test_display_format() {
        let text = sample().to_string();
        assert_eq!(
            text,
            "source_host=build-box\n\
             timestamp=2024-01-03T12:34:56Z\n\
             source_path=/home/dev/fan-curve-app/target/release/fan-curve-app\n"
        );
    }

    #[test]
    fn test_roundtrip() {
        let meta = sample();
        let parsed: BundleMetadata = meta.to_string().parse().unwrap();
        assert_eq!(parsed, meta);
    }

    #[test]
    fn test_unknown_keys_and_comments_tolerated() {
        let text = "# exported by fansync\nsource_host=a\ntimestamp=2024-01-01T00:00:00Z\nsource_path=/bin/true\nexporter_version=0.1.0\n";
        let parsed: BundleMetadata = text.parse().unwrap();
        assert_eq!(parsed.source_host, "a");
    }

    #[test]
    fn test_missing_key_fails() {
        let text = "source_host=a\nsource_path=/bin/true\n";
        assert!(text.parse::<BundleMetadata>().is_err());
    }

    #[test]
    fn test_load_absent_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(BundleMetadata::load(dir.path()).unwrap(), None);
    }

    #[test]
    fn test_write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let meta = sample();
        meta.write(dir.path()).unwrap();
        assert_eq!(BundleMetadata::load(dir.path()).unwrap(), Some(meta));
    }
}
