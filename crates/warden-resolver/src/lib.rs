//! # warden-resolver
//!
//! Effective permission resolution for guild members.
//!
//! - [`calculator`]: the pure permission math (role folding, channel overwrites)
//! - [`backoff`]: bounded, rate-limit-aware retry driver for remote calls
//! - [`source`]: cache and remote directory contracts
//! - [`cache`]: an in-memory [`source::ResourceCache`]
//! - [`fetch`]: cache-first orchestration feeding the calculator
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use warden_resolver::{MemoryCache, PermissionFetcher, ResourceCache, ResourceDirectory};
//! # async fn run(directory: Arc<dyn ResourceDirectory>, member: warden_common::models::Member)
//! # -> warden_common::WardenResult<()> {
//! let cache: Arc<dyn ResourceCache> = Arc::new(MemoryCache::new());
//! let fetcher = PermissionFetcher::new(Some(cache), directory);
//! let perms = fetcher.fetch_permissions(&member, None).await?;
//! println!("{perms:?}");
//! # Ok(())
//! # }
//! ```

pub mod backoff;
pub mod cache;
pub mod calculator;
pub mod fetch;
pub mod source;

pub use backoff::Backoff;
pub use cache::MemoryCache;
pub use calculator::{calculate_everyone_permissions, calculate_permissions};
pub use fetch::PermissionFetcher;
pub use source::{ResourceCache, ResourceDirectory};
