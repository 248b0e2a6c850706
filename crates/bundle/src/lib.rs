//! On-disk bundle format: naming, metadata record, checksum manifest.
//!
//! A bundle is an immutable directory named `<prefix>-<YYYYMMDD-HHMMSS>`
//! holding one executable artifact, a plain-text metadata record and a
//! `sha256sum`-compatible checksum manifest. The formats are deliberately
//! plain text so a bundle can be inspected (or produced) with coreutils on
//! a machine that has no fansync installed.

pub mod manifest;
pub mod metadata;
pub mod name;

pub use manifest::{ChecksumManifest, MANIFEST_FILE};
pub use metadata::{BundleMetadata, METADATA_FILE};
pub use name::BundleName;

/// Default bundle name prefix.
pub const DEFAULT_PREFIX: &str = "fan-curve-app";

/// Default source binary, as produced by `cargo build --release` in the
/// fan-curve-app tree.
pub const DEFAULT_SOURCE_BINARY: &str = "target/release/fan-curve-app";

/// Well-known install location of the active binary.
pub const DEFAULT_INSTALL_PATH: &str = "/usr/local/bin/fan-curve-app";
