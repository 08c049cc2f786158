//! # ProtoGraph Domain Layer
//!
//! Entities, the storage contract and the per-domain business rules.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Domain Layer (This Crate)                    │
//! │  ┌─────────────────────────────────────────────────────────────┐│
//! │  │  model/      - Account, Product, Order records              ││
//! │  │  repository/ - Storage contract (traits, not impls)         ││
//! │  │  ports       - Credential hashing and id generation         ││
//! │  │  service/    - Domain services (validation + rules)         ││
//! │  └─────────────────────────────────────────────────────────────┘│
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Concrete storage engines, hash algorithms and id schemes are adapters;
//! swapping one never changes this crate.

pub mod model;
pub mod ports;
pub mod repository;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use model::{
    account::Account,
    order::{Order, OrderedProduct},
    product::Product,
    Record,
};

pub use ports::{CredentialHasher, HashError, IdGenerator};

pub use repository::{OrderStore, RepositoryError, Store};

pub use service::{
    AccountInput, AccountService, AccountUpdate, CatalogService, OrderInput, OrderService,
    ProductInput,
};
