//! Common utilities and types shared across fansync crates.

pub mod error;
pub mod hash;
pub mod timestamp;

pub use error::{Error, Result};
pub use timestamp::Timestamp;
