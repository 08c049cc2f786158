//! Storage Contract - the "ports" every domain service persists through
//!
//! ```text
//! Domain Layer          │  Adapter Layer
//! ──────────────────────┼────────────────────────
//! trait Store<T>        │  InMemoryStore<T>
//!   put / get_by_id     │  PostgresStore
//! trait OrderStore      │
//! ```

pub mod order_store;
pub mod store;

pub use order_store::OrderStore;
pub use store::{RepositoryError, Store};
