//! fansync operations: bundle export, bundle location, binary install.

pub mod export;
pub mod install;
pub mod locate;
pub mod lock;

pub use export::{export, export_at, Exported};
pub use install::{install_from_bundle, install_from_file, Installed};
pub use locate::locate_latest;
pub use lock::InstallLock;
