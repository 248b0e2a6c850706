//! Bundle directory naming.

use fansync_common::{Error, Result, Timestamp};
use std::fmt;

/// A parsed bundle directory name: `<prefix>-<YYYYMMDD-HHMMSS>`.
///
/// The timestamp part is fixed width and zero padded, so lexicographic
/// order of names with the same prefix equals chronological order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleName {
    prefix: String,
    timestamp: Timestamp,
}

impl BundleName {
    /// Create a name for a new bundle.
    pub fn new(prefix: &str, timestamp: Timestamp) -> Self {
        Self {
            prefix: prefix.to_string(),
            timestamp,
        }
    }

    /// Parse a directory name against an expected prefix.
    ///
    /// Returns `InvalidBundleName` if the name does not start with
    /// `<prefix>-` or the remainder is not a valid compact timestamp.
    pub fn parse(name: &str, prefix: &str) -> Result<Self> {
        let rest = name
            .strip_prefix(prefix)
            .and_then(|r| r.strip_prefix('-'))
            .ok_or_else(|| Error::InvalidBundleName(name.to_string()))?;
        let timestamp = Timestamp::parse_compact(rest)
            .ok_or_else(|| Error::InvalidBundleName(name.to_string()))?;
        Ok(Self {
            prefix: prefix.to_string(),
            timestamp,
        })
    }

    /// The embedded export timestamp.
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// The name prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl fmt::Display for BundleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.prefix, self.timestamp.to_compact())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_roundtrip() {
        let ts = Timestamp::parse_compact("20240103-000000").unwrap();
        let name = BundleName::new("pkg", ts);
        assert_eq!(name.to_string(), "pkg-20240103-000000");
        assert_eq!(BundleName::parse("pkg-20240103-000000", "pkg").unwrap(), name);
    }

    #[test]
    fn test_prefix_with_dashes() {
        let name = BundleName::parse("fan-curve-app-20240101-120000", "fan-curve-app").unwrap();
        assert_eq!(name.prefix(), "fan-curve-app");
        assert_eq!(name.timestamp().to_compact(), "20240101-120000");
    }

    #[test]
    fn test_rejects_wrong_prefix() {
        assert!(BundleName::parse("other-20240101-120000", "pkg").is_err());
    }

    #[test]
    fn test_rejects_bad_timestamp() {
        assert!(BundleName::parse("pkg-20240101", "pkg").is_err());
        assert!(BundleName::parse("pkg-notadate-000000", "pkg").is_err());
        assert!(BundleName::parse("pkg-", "pkg").is_err());
        assert!(BundleName::parse("pkg", "pkg").is_err());
    }
}
