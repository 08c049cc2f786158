//! # ProtoGraph Adapter Layer
//!
//! Implementations of the domain ports (Hexagonal Architecture adapters).
//!
//! ## Structure
//!
//! - `repository/` - Storage contract implementations (in-memory, PostgreSQL)
//! - `credentials` - argon2 credential hasher
//! - `ids` - ULID id generator

pub mod credentials;
pub mod ids;
pub mod repository;

pub use credentials::Argon2Hasher;
pub use ids::UlidGenerator;
pub use repository::in_memory::InMemoryStore;
pub use repository::postgres::PostgresStore;
