//! Persistence Adapters - Storage contract implementations
//!
//! These implement the `Store` / `OrderStore` traits from the domain crate.

pub mod in_memory;
pub mod postgres;
