//! Domain Models - Account, Product and Order records
//!
//! Records are plain values. Components exchange them by copy and refer to
//! each other only through opaque string ids.

pub mod account;
pub mod order;
pub mod product;

/// A persisted record with an immutable, globally unique id
pub trait Record: Clone + Send + Sync + 'static {
    /// Entity kind, used in `NotFound` errors and logs
    const KIND: &'static str;

    fn id(&self) -> &str;
}
