//! # ProtoGraph Shared
//!
//! Common types used across all ProtoGraph crates.

pub mod config;
pub mod context;
pub mod error;
pub mod paging;

// Re-exports
pub use config::*;
pub use context::*;
pub use error::*;
pub use paging::*;
