//! Entity snapshots consumed by the permission resolvers.
//!
//! These are read-only views of what a cache or remote directory returned. The resolvers
//! only combine their fields and never create, update, or delete them.

pub mod channel;
pub mod guild;
pub mod member;
pub mod role;

/// Re-export all model types for convenience.
pub use channel::*;
pub use guild::*;
pub use member::*;
pub use role::*;
