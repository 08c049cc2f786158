//! Domain Services - the only authority for business rules
//!
//! Each service validates input, applies its rules and then delegates to a
//! storage port. Nothing else talks to storage directly.

pub mod account;
pub mod catalog;
pub mod order;
mod records;

pub use account::{AccountInput, AccountService, AccountUpdate};
pub use catalog::{CatalogService, ProductInput};
pub use order::{OrderInput, OrderService};
