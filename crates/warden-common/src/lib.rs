//! # warden-common
//!
//! Shared permission flags, entity models, configuration, and error handling used by
//! every Warden crate. No I/O lives here, only values and the rules for combining them.

pub mod config;
pub mod error;
pub mod models;
pub mod permissions;
pub mod validation;

pub use error::{WardenError, WardenResult};
pub use permissions::{ALL_PERMISSIONS, Permissions};
