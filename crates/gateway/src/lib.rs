//! # ProtoGraph Gateway
//!
//! Aggregates the account, catalog and order services behind one
//! query/mutation interface and resolves relationships between them.
//!
//! ## Structure
//!
//! - `backends` - all-or-nothing connection group
//! - `query` - operations and nested selections
//! - `resolver` - fan-out and merge into composite responses
//! - `response` - payload nodes and field-level errors
//! - `http` - axum routes

pub mod backends;
pub mod http;
pub mod query;
pub mod resolver;
pub mod response;

#[cfg(test)]
pub(crate) mod testing;

pub use backends::Backends;
pub use query::{AccountSelection, LineRequest, Operation, OrderSelection};
pub use resolver::{Gateway, DEFAULT_NESTED_TIMEOUT};
pub use response::{FieldError, Nested, Path, PathSegment, Response};
